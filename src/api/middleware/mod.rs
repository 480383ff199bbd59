//! Middleware components for request processing.
//!
//! This module contains middleware for logging, request ID tracking,
//! error handling, and the tenant extractor.

mod error_handler;
mod logging;
mod request_id;
mod tenant;

pub use error_handler::{error_to_status_code, fallback_handler, global_error_handler};
pub use logging::logging_middleware;
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
pub use tenant::{TENANT_HEADER, Tenant};
