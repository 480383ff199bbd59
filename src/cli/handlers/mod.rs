//! Command handlers for CLI operations

pub mod check_cache;
pub mod serve;

pub use check_cache::CheckCacheCommandHandler;
pub use serve::ServeCommandHandler;
