//! # Aggregation Workers
//!
//! One [`AggregationWorker`] runs per routing key. It drains its inbox, folds
//! every record into a [`StatAccumulator`] for the record's exact key, and when
//! the inbox closes deposits a [`WorkerReport`] into its single-use outbox.
//!
//! Several exact keys can share a worker when the router partitions coarsely;
//! folding stays per exact key, so sharing never mixes statistics.
//!
//! ## Lifecycle
//!
//! ```text
//! Router ──mpsc──▶ inbox ──▶ AggregationWorker ──oneshot──▶ outbox ──▶ Collector
//! ```
//!
//! - The router creates the handle and spawns the worker before forwarding the
//!   first record.
//! - Dropping the handle's sender closes the inbox; that is the only way a worker
//!   learns to finalize.
//! - On cancellation the worker deposits [`PipelineError::Cancelled`] instead of a
//!   report. Under a `Stop` strategy an invalid value is deposited as
//!   [`PipelineError::InvalidValue`] and the shared token is cancelled so the rest
//!   of the run winds down.

use crate::consumer::{Consumer, ConsumerConfig};
use crate::error::{ErrorAction, ErrorContext, ErrorStrategy, PipelineError, StreamError};
use crate::input::Input;
use crate::record::Record;
use crate::stats::StatAccumulator;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::collections::HashMap;
use std::pin::Pin;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// The final result of one worker.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerReport {
  /// The routing key the worker served.
  pub routing_key: String,
  /// One accumulator per exact key, sorted by key.
  pub stats: Vec<StatAccumulator>,
  /// Records folded.
  pub records: u64,
  /// Records dropped because their value did not parse.
  pub rejected: u64,
}

/// What a worker deposits into its outbox.
pub type WorkerOutcome = Result<WorkerReport, PipelineError>;

/// The router's side of one worker: the inbox sender plus the outbox.
pub struct WorkerHandle {
  inbox: Option<mpsc::Sender<Record>>,
  slot: WorkerSlot,
}

impl WorkerHandle {
  /// Returns the inbox sender, or `None` once the inbox was closed.
  pub fn inbox(&self) -> Option<&mpsc::Sender<Record>> {
    self.inbox.as_ref()
  }

  /// Closes the inbox. The worker finalizes once it has drained what is queued.
  pub fn close(&mut self) {
    self.inbox = None;
  }

  /// Closes the inbox and keeps only the result side.
  pub fn into_slot(mut self) -> WorkerSlot {
    self.close();
    self.slot
  }
}

/// The result side of one worker: its outbox and its task.
pub struct WorkerSlot {
  /// Receives the worker's outcome exactly once.
  pub outbox: oneshot::Receiver<WorkerOutcome>,
  /// The worker task, joined only to tell a panic apart from a lost result.
  pub task: JoinHandle<()>,
}

/// The final universe of routing keys and their result slots.
///
/// Built by the router once routing is complete; read-only from then on.
#[derive(Default)]
pub struct WorkerRegistry {
  slots: HashMap<String, WorkerSlot>,
}

impl WorkerRegistry {
  /// Number of workers.
  pub fn len(&self) -> usize {
    self.slots.len()
  }

  /// Whether no worker was ever started.
  pub fn is_empty(&self) -> bool {
    self.slots.is_empty()
  }

  /// All routing keys, sorted lexicographically.
  pub fn routing_keys(&self) -> Vec<String> {
    let mut keys: Vec<String> = self.slots.keys().cloned().collect();
    keys.sort_unstable();
    keys
  }

  /// Consumes the registry, yielding slots in routing-key order.
  pub fn into_sorted(self) -> Vec<(String, WorkerSlot)> {
    let mut slots: Vec<(String, WorkerSlot)> = self.slots.into_iter().collect();
    slots.sort_unstable_by(|a, b| a.0.cmp(&b.0));
    slots
  }
}

impl FromIterator<(String, WorkerSlot)> for WorkerRegistry {
  fn from_iter<I: IntoIterator<Item = (String, WorkerSlot)>>(iter: I) -> Self {
    Self {
      slots: iter.into_iter().collect(),
    }
  }
}

/// Folds the records of one routing key.
pub struct AggregationWorker {
  routing_key: String,
  error_strategy: ErrorStrategy<Record>,
  cancel: CancellationToken,
  stats: HashMap<String, StatAccumulator>,
  records: u64,
  rejected: u64,
  failure: Option<PipelineError>,
  config: ConsumerConfig,
}

impl AggregationWorker {
  /// Creates an idle worker for `routing_key`.
  pub fn new(routing_key: impl Into<String>) -> Self {
    let routing_key = routing_key.into();
    Self {
      config: ConsumerConfig::default().with_name(format!("worker[{routing_key}]")),
      routing_key,
      error_strategy: ErrorStrategy::default(),
      cancel: CancellationToken::new(),
      stats: HashMap::new(),
      records: 0,
      rejected: 0,
      failure: None,
    }
  }

  /// Sets the strategy applied to values that do not parse.
  #[must_use]
  pub fn with_error_strategy(mut self, strategy: ErrorStrategy<Record>) -> Self {
    self.error_strategy = strategy;
    self
  }

  /// Shares the run's cancellation token with this worker.
  #[must_use]
  pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
    self.cancel = cancel;
    self
  }

  /// Spawns the worker and returns the router's handle to it.
  pub fn spawn(self, inbox_capacity: usize) -> WorkerHandle {
    let (inbox_tx, inbox_rx) = mpsc::channel(inbox_capacity);
    let (outbox_tx, outbox_rx) = oneshot::channel();
    let task = tokio::spawn(self.run(inbox_rx, outbox_tx));
    WorkerHandle {
      inbox: Some(inbox_tx),
      slot: WorkerSlot {
        outbox: outbox_rx,
        task,
      },
    }
  }

  async fn run(mut self, inbox: mpsc::Receiver<Record>, outbox: oneshot::Sender<WorkerOutcome>) {
    self.consume(Box::pin(ReceiverStream::new(inbox))).await;
    let routing_key = self.routing_key.clone();
    let outcome = self.finish();
    if let Err(e) = &outcome {
      debug!(routing_key = %routing_key, error = %e, "Worker stopped without a report");
    }
    // The collector may already have given up on this slot.
    let _ = outbox.send(outcome);
  }

  /// Folds one record.
  ///
  /// Returns `Err` only when the value is invalid and the strategy says stop.
  pub fn fold(&mut self, record: Record) -> Result<(), PipelineError> {
    let value = match record.raw_value.parse::<f64>() {
      Ok(value) if value.is_finite() => value,
      _ => return self.reject(record),
    };

    self.records += 1;
    match self.stats.get_mut(&record.key) {
      Some(acc) => acc.fold(value),
      None => {
        self
          .stats
          .insert(record.key.clone(), StatAccumulator::new(record.key, value));
      }
    }
    Ok(())
  }

  fn reject(&mut self, record: Record) -> Result<(), PipelineError> {
    let (key, value) = (record.key.clone(), record.raw_value.clone());
    let info = self.component_info();
    let error = StreamError::new(
      Box::new(PipelineError::InvalidValue {
        key: key.clone(),
        value: value.clone(),
      }),
      ErrorContext {
        timestamp: chrono::Utc::now(),
        item: Some(record),
        component_name: info.name.clone(),
        component_type: info.type_name.clone(),
      },
      info,
    );

    match self.error_strategy.action_for(&error) {
      ErrorAction::Skip => {
        self.rejected += 1;
        warn!(
          component = %error.component.name,
          key = %key,
          value = %value,
          "Skipping record with invalid value"
        );
        Ok(())
      }
      ErrorAction::Stop => Err(PipelineError::InvalidValue { key, value }),
    }
  }

  /// Seals the worker, producing its outcome.
  pub fn finish(self) -> WorkerOutcome {
    if let Some(failure) = self.failure {
      return Err(failure);
    }
    let mut stats: Vec<StatAccumulator> = self.stats.into_values().collect();
    stats.sort_unstable_by(|a, b| a.key.cmp(&b.key));
    debug!(
      routing_key = %self.routing_key,
      keys = stats.len(),
      records = self.records,
      rejected = self.rejected,
      "Worker finished"
    );
    Ok(WorkerReport {
      routing_key: self.routing_key,
      stats,
      records: self.records,
      rejected: self.rejected,
    })
  }
}

impl Input for AggregationWorker {
  type Input = Record;
  type InputStream = Pin<Box<dyn Stream<Item = Record> + Send>>;
}

#[async_trait]
impl Consumer for AggregationWorker {
  /// Folds records until the inbox closes, the run is cancelled, or a value
  /// fails under a `Stop` strategy.
  async fn consume(&mut self, mut stream: Self::InputStream) {
    loop {
      let next = tokio::select! {
        biased;
        _ = self.cancel.cancelled() => {
          self.failure = Some(PipelineError::Cancelled);
          return;
        }
        next = stream.next() => next,
      };
      let Some(record) = next else {
        return;
      };
      if let Err(e) = self.fold(record) {
        self.failure = Some(e);
        self.cancel.cancel();
        return;
      }
    }
  }

  fn set_config_impl(&mut self, config: ConsumerConfig) {
    self.config = config;
  }

  fn get_config_impl(&self) -> &ConsumerConfig {
    &self.config
  }
}
