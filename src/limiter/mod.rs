// Limiter module - token-bucket admission gate for outbound API calls
pub mod token_bucket;

pub use token_bucket::{AcquireError, LimiterError, RateLimiter, RatePermit};
