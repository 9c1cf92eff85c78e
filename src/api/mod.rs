mod access_log;
mod error;
pub mod handlers;
mod limit;
mod router;

pub use error::{ApiError, ApiErrorBody};
pub use limit::RateLimiter;
pub use router::build_router;
