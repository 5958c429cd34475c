//! Rate limiter adapters.
//!
//! Implementations of the RateLimiter port for different backends.
//!
//! ## Available Adapters
//!
//! - `InMemoryRateLimiter` - Per-process counters for tests and single-server
//! - `RedisRateLimiter` - Shared counters for multi-server deployments
//!
//! ## Usage
//!
//! ```ignore
//! use scribe_api::adapters::rate_limiter::{InMemoryRateLimiter, RateLimitConfig};
//!
//! let limiter = InMemoryRateLimiter::new(RateLimitConfig::from(&settings));
//! let limiter = RedisRateLimiter::connect("redis://127.0.0.1/", config).await?;
//! ```

mod config;
mod in_memory;
mod redis;

pub use config::{RateLimitConfig, TierRateLimits};
pub use in_memory::InMemoryRateLimiter;
pub use redis::RedisRateLimiter;
