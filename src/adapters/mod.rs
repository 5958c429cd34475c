//! Adapters - Implementations of port interfaces.
//!
//! - `supabase` - hosted auth service and REST data store
//! - `memory` - in-process fakes of every port, used by tests
//! - `rate_limiter` - in-memory and Redis fixed-window counters
//! - `http` - axum routes, middleware and the error boundary

pub mod http;
pub mod memory;
pub mod rate_limiter;
pub mod supabase;
