//! Resource Coordinators
//!
//! Advisory, TTL-bounded leases shared by parallel documentation batches:
//!
//! | Coordinator | Resource | TTL |
//! |-------------|----------|-----|
//! | [`ModelBalancer`] | AI model | 60s |
//! | [`RateLimiter`] | AI provider | 120s |
//!
//! Both are thin wrappers over one [`LeaseTable`].

pub mod acquire;
pub mod balancer;
pub mod lease;
pub mod rate_limiter;

pub use acquire::{AcquirePolicy, acquire};
pub use balancer::ModelBalancer;
pub use lease::{Lease, LeaseMap, LeaseState, LeaseTable};
pub use rate_limiter::RateLimiter;
