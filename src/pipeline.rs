//! # Pipeline
//!
//! Wires the reader, router, workers and collector of one run together:
//!
//! ```text
//! RecordReader ──mpsc──▶ Router ──mpsc per key──▶ AggregationWorker × N
//!                                                        │ oneshot per worker
//!                                                        ▼
//!                                                    Collector ──▶ Summary
//! ```
//!
//! The reader's completion signal is awaited before anything is collected.
//! Only then is the router joined, which yields the final key universe as a
//! [`WorkerRegistry`](crate::worker::WorkerRegistry); no key can be missed
//! because the router has finished creating workers by the time the registry
//! exists.
//!
//! ## Example
//!
//! ```rust,no_run
//! use statweave::config::Config;
//! use statweave::pipeline::Pipeline;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), statweave::error::PipelineError> {
//! let pipeline = Pipeline::new(Config::new("measurements.txt"))?;
//! let report = pipeline.run(CancellationToken::new()).await?;
//! println!("{}", report.summary);
//! # Ok(())
//! # }
//! ```

use crate::collector::Collector;
use crate::config::Config;
use crate::consumer::Consumer;
use crate::consumers::Router;
use crate::error::{PipelineError, PipelineStage};
use crate::producers::{ReadOutcome, ReadStats, ReaderHandle, RecordReader};
use crate::profile::Profile;
use crate::summary::Summary;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};

/// Counters of a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
  /// Records routed to a worker.
  pub records: u64,
  /// Malformed lines skipped.
  pub malformed: u64,
  /// Records skipped for an invalid value.
  pub rejected: u64,
  /// Workers started.
  pub workers: usize,
  /// Distinct keys in the summary.
  pub keys: usize,
}

/// Everything a successful run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
  /// The per-key result set.
  pub summary: Summary,
  /// Run counters.
  pub stats: RunStats,
  /// Phase timings.
  pub profile: Profile,
}

/// One configured aggregation run.
pub struct Pipeline {
  config: Config,
}

impl Pipeline {
  /// Validates `config` and prepares a run.
  pub fn new(config: Config) -> Result<Self, PipelineError> {
    config.validate()?;
    Ok(Self { config })
  }

  /// The configuration this pipeline runs with.
  pub fn config(&self) -> &Config {
    &self.config
  }

  /// Runs the pipeline to completion.
  ///
  /// Cancelling `cancel` stops the reader, closes every inbox and makes the run
  /// return [`PipelineError::Cancelled`] once all tasks have exited. Internal
  /// failures cancel a child token, never `cancel` itself.
  pub async fn run(&self, cancel: CancellationToken) -> Result<RunReport, PipelineError> {
    let span = info_span!("pipeline", input = %self.config.input.display());
    self.run_inner(cancel.child_token()).instrument(span).await
  }

  async fn run_inner(&self, cancel: CancellationToken) -> Result<RunReport, PipelineError> {
    let started = Instant::now();
    let config = &self.config;

    let (tx, rx) = mpsc::channel(config.reader_capacity);
    let reader = RecordReader::new(&config.input)
      .with_delimiter(config.delimiter)
      .with_error_strategy(config.malformed.strategy())
      .with_cancellation(cancel.clone());
    let ReaderHandle { task, completion } = reader.spawn(tx);

    let mut router = Router::new(config.inbox_capacity, config.routing)
      .with_worker_error_strategy(config.invalid_value.strategy())
      .with_cancellation(cancel.clone());
    let router_task = tokio::spawn(async move {
      router.consume(Box::pin(ReceiverStream::new(rx))).await;
      let routed = router.routed();
      (routed, router.into_registry())
    });

    // Completion barrier: nothing is collected before the reader has finished.
    let read_outcome: ReadOutcome = match completion.await {
      Ok(outcome) => outcome,
      Err(_) => match task.await {
        Err(e) => Err(PipelineError::task_failed(PipelineStage::Reader, e)),
        Ok(()) => Err(PipelineError::Cancelled),
      },
    };
    let read_elapsed = started.elapsed();
    if matches!(&read_outcome, Err(e) if !e.is_cancelled()) {
      cancel.cancel();
    }

    let (routed, registry) = router_task
      .await
      .map_err(|e| PipelineError::task_failed(PipelineStage::Router, e))?;
    let route_elapsed = started.elapsed() - read_elapsed;
    let workers = registry.len();

    let collected = Collector::new(config.rounding).collect(registry).await;
    let collect_elapsed = started.elapsed() - read_elapsed - route_elapsed;

    let read_stats: ReadStats = match read_outcome {
      Ok(stats) => stats,
      Err(e) if !e.is_cancelled() => return Err(e),
      Err(cancelled) => {
        // Prefer the worker failure that triggered the cancellation, if any.
        return Err(collected.err().unwrap_or(cancelled));
      }
    };
    let (summary, collect_stats) = collected?;

    let stats = RunStats {
      records: routed,
      malformed: read_stats.malformed,
      rejected: collect_stats.rejected,
      workers,
      keys: collect_stats.keys,
    };
    let profile = Profile {
      read: read_elapsed,
      route: route_elapsed,
      collect: collect_elapsed,
      total: started.elapsed(),
      records: stats.records,
      workers: stats.workers,
      keys: stats.keys,
    };
    info!(
      records = stats.records,
      malformed = stats.malformed,
      rejected = stats.rejected,
      workers = stats.workers,
      keys = stats.keys,
      elapsed_ms = profile.total.as_millis() as u64,
      "Run complete"
    );

    Ok(RunReport {
      summary,
      stats,
      profile,
    })
  }
}
