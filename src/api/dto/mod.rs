//! Data Transfer Objects for API requests and responses.
//!
//! DTOs are organized by domain:
//! - `response` - The `{ success, data?, error? }` envelope
//! - `cache` - Raw cache endpoint bodies
//! - `analytics` - Analytics request bodies
//! - `health` - Health check bodies

mod analytics;
mod cache;
mod health;
mod response;

pub use analytics::{AbcItemRequest, AbcRequest, ForecastRequest};
pub use cache::{
    BatchEntry, BatchGetRequest, BatchGetResponse, BatchSetRequest, BatchSetResponse,
    CounterResponse, DeletedResponse, ExistsResponse, IncrementRequest, KeyResponse,
    LockedPutRequest, LockedWriteResponse, MAX_BATCH_SIZE, PutEntryRequest,
};
pub use health::{ComponentHealth, HealthResponse, HealthStatus, ProbeResponse};
pub use response::ApiResponse;
