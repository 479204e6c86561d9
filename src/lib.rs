//! # statweave
//!
//! Streaming per-key `min/mean/max` over large `key;value` files.
//!
//! statweave reads its input once, line by line, and never holds the file in
//! memory. Records flow through a small task graph:
//!
//! - a **reader** ([`producers::RecordReader`]) turning lines into records,
//! - a **router** ([`consumers::Router`]) creating one aggregation worker per
//!   routing key on first sight and forwarding each record to it,
//! - **workers** ([`worker::AggregationWorker`]) folding their records into
//!   running statistics,
//! - a **collector** ([`collector::Collector`]) draining every worker's result in
//!   key order once the reader has signalled completion.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use statweave::{Config, Pipeline};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), statweave::PipelineError> {
//! let report = Pipeline::new(Config::new("measurements.txt"))?
//!   .run(CancellationToken::new())
//!   .await?;
//! println!("{}", report.summary); // {Paris=5.5/5.5/5.5, Tokyo=10.0/15.0/20.0}
//! # Ok(())
//! # }
//! ```

// Documentation enforcement - treat missing docs as errors
#![deny(missing_docs)]

/// Command-line surface.
pub mod cli;
/// Drains worker results into the final summary.
pub mod collector;
/// Run configuration.
pub mod config;
/// Core consumer trait.
pub mod consumer;
/// Built-in consumers (the router).
pub mod consumers;
/// Error types and per-record error strategies.
pub mod error;
/// Input side of stream components.
pub mod input;
/// Output side of stream components.
pub mod output;
/// Wires a whole run together.
pub mod pipeline;
/// Core producer trait.
pub mod producer;
/// Built-in producers (the record reader).
pub mod producers;
/// Per-phase timing profile.
pub mod profile;
/// Parsed `key;value` records.
pub mod record;
/// Running statistics and display rounding.
pub mod stats;
/// Final result set.
pub mod summary;
/// Per-key aggregation workers.
pub mod worker;

pub use config::Config;
pub use consumer::{Consumer, ConsumerConfig};
pub use error::{ErrorAction, ErrorStrategy, PipelineError};
pub use input::Input;
pub use output::Output;
pub use pipeline::{Pipeline, RunReport, RunStats};
pub use producer::{Producer, ProducerConfig};
pub use summary::Summary;

#[cfg(test)]
mod cli_test;
#[cfg(test)]
mod error_test;
#[cfg(test)]
mod router_test;
#[cfg(test)]
mod worker_test;
