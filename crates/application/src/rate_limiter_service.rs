//! Token bucket rate limiting ports and application service.

mod config;
mod ports;
mod service;

pub use config::TokenBucketRule;
pub use ports::{ConsumeOutcome, TokenBucketStore};
pub use service::RateLimiterService;
