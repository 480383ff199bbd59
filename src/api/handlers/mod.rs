//! HTTP request handlers for API endpoints.
//!
//! This module contains all request handlers organized by resource type.

pub mod analytics;
pub mod cache;
pub mod health;
