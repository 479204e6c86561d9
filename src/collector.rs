//! # Collector
//!
//! Drains every worker's outbox in routing-key order and builds the [`Summary`].
//!
//! The collector must only be handed a [`WorkerRegistry`] after routing is
//! complete. The registry is produced by consuming the router, so holding one
//! already proves no new routing key can appear.

use crate::error::{PipelineError, PipelineStage};
use crate::stats::Rounding;
use crate::summary::Summary;
use crate::worker::{WorkerOutcome, WorkerRegistry, WorkerSlot};
use tracing::debug;

/// Totals gathered while draining the outboxes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectStats {
  /// Workers drained.
  pub workers: usize,
  /// Distinct exact keys.
  pub keys: usize,
  /// Records folded across all workers.
  pub records: u64,
  /// Records dropped for an invalid value.
  pub rejected: u64,
}

/// Gathers worker results into a [`Summary`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Collector {
  rounding: Rounding,
}

impl Collector {
  /// Creates a collector that rounds with `rounding`.
  pub fn new(rounding: Rounding) -> Self {
    Self { rounding }
  }

  /// Waits for every worker result and renders them.
  ///
  /// Every outbox is drained even after a failure so no worker is left behind.
  /// The first error that is not [`PipelineError::Cancelled`] wins; a run that
  /// only saw cancellations reports `Cancelled`.
  pub async fn collect(
    &self,
    registry: WorkerRegistry,
  ) -> Result<(Summary, CollectStats), PipelineError> {
    let mut entries = Vec::new();
    let mut stats = CollectStats::default();
    let mut failure: Option<PipelineError> = None;

    for (routing_key, slot) in registry.into_sorted() {
      stats.workers += 1;
      match Self::await_slot(&routing_key, slot).await {
        Ok(report) => {
          stats.records += report.records;
          stats.rejected += report.rejected;
          for acc in report.stats {
            entries.push((acc.key.clone(), acc.display(self.rounding)));
          }
        }
        Err(e) => {
          if failure.as_ref().map_or(true, PipelineError::is_cancelled) {
            failure = Some(e);
          }
        }
      }
    }

    if let Some(e) = failure {
      return Err(e);
    }

    stats.keys = entries.len();
    debug!(
      workers = stats.workers,
      keys = stats.keys,
      records = stats.records,
      "Collected all worker results"
    );
    Ok((Summary::from_sorted(entries), stats))
  }

  async fn await_slot(routing_key: &str, slot: WorkerSlot) -> WorkerOutcome {
    match slot.outbox.await {
      Ok(outcome) => outcome,
      // The worker dropped its outbox without a deposit: it panicked or was aborted.
      Err(_) => match slot.task.await {
        Err(e) => Err(PipelineError::task_failed(PipelineStage::Worker, e)),
        Ok(()) => Err(PipelineError::WorkerLost(routing_key.to_string())),
      },
    }
  }
}
