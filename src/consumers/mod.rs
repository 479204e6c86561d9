//! Built-in consumer implementations.

/// Consumer that fans records out to per-key aggregation workers.
pub mod router;

pub use router::{Router, RoutingStrategy};
