//! # Ghostflow API
//!
//! The server surface: batch ingestion with per-device rate limiting,
//! the pattern-detector and ghost-executor endpoints, the approval
//! endpoint, and the JSON envelope every response uses.

pub mod envelope;
pub mod error;
pub mod http;
pub mod rate_limit;
pub mod state;

pub use error::ApiError;
pub use http::routes::create_router;
pub use rate_limit::DeviceRateLimiter;
pub use state::AppState;
