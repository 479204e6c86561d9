use crate::consumer::{Consumer, ConsumerConfig};
use crate::error::ErrorStrategy;
use crate::input::Input;
use crate::record::Record;
use crate::worker::{AggregationWorker, WorkerHandle, WorkerRegistry};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::collections::HashMap;
use std::pin::Pin;
use tokio::sync::mpsc::error::SendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// How a record's key maps to the worker that folds it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum RoutingStrategy {
  /// One worker per exact key.
  #[default]
  Key,
  /// One worker per first character of the key.
  FirstChar,
}

impl RoutingStrategy {
  /// The routing key for `key`, borrowed from it.
  pub fn routing_key<'a>(&self, key: &'a str) -> &'a str {
    match self {
      RoutingStrategy::Key => key,
      RoutingStrategy::FirstChar => match key.chars().next() {
        Some(first) => &key[..first.len_utf8()],
        None => key,
      },
    }
  }
}

/// A consumer that fans the record stream out to per-key workers.
///
/// The router is the sole owner of the `routing key → worker` map while the
/// stream is being consumed. A worker is spawned the first time its routing key
/// is seen, before its first record is forwarded. When the stream ends every
/// inbox is closed; [`into_registry`](Router::into_registry) then hands the
/// result slots to the collector.
///
/// Forwarding waits while an inbox is full. That is the run's only backpressure.
pub struct Router {
  inbox_capacity: usize,
  routing: RoutingStrategy,
  worker_strategy: ErrorStrategy<Record>,
  cancel: CancellationToken,
  workers: HashMap<String, WorkerHandle>,
  routed: u64,
  config: ConsumerConfig,
}

impl Router {
  /// Creates a router whose workers get inboxes of `inbox_capacity` records.
  pub fn new(inbox_capacity: usize, routing: RoutingStrategy) -> Self {
    Self {
      inbox_capacity,
      routing,
      worker_strategy: ErrorStrategy::default(),
      cancel: CancellationToken::new(),
      workers: HashMap::new(),
      routed: 0,
      config: ConsumerConfig::default().with_name("router".to_string()),
    }
  }

  /// Sets the strategy every spawned worker applies to invalid values.
  #[must_use]
  pub fn with_worker_error_strategy(mut self, strategy: ErrorStrategy<Record>) -> Self {
    self.worker_strategy = strategy;
    self
  }

  /// Shares the run's cancellation token with the router and its workers.
  #[must_use]
  pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
    self.cancel = cancel;
    self
  }

  /// Records forwarded to a worker so far.
  pub fn routed(&self) -> u64 {
    self.routed
  }

  /// Number of workers started so far.
  pub fn worker_count(&self) -> usize {
    self.workers.len()
  }

  /// Closes every inbox and hands over the result slots.
  pub fn into_registry(self) -> WorkerRegistry {
    self
      .workers
      .into_iter()
      .map(|(key, handle)| (key, handle.into_slot()))
      .collect()
  }

  /// Forwards one record, spawning its worker on first sight of the routing key.
  ///
  /// Returns `false` if the run was cancelled while waiting on a full inbox.
  async fn route(&mut self, record: Record) -> bool {
    let routing_key = self.routing.routing_key(&record.key);
    if !self.workers.contains_key(routing_key) {
      let handle = AggregationWorker::new(routing_key)
        .with_error_strategy(self.worker_strategy.clone())
        .with_cancellation(self.cancel.clone())
        .spawn(self.inbox_capacity);
      debug!(routing_key, "Spawned aggregation worker");
      self.workers.insert(routing_key.to_string(), handle);
    }

    let Some(inbox) = self.workers.get(routing_key).and_then(WorkerHandle::inbox) else {
      return true;
    };
    let sent = tokio::select! {
      biased;
      _ = self.cancel.cancelled() => return false,
      sent = inbox.send(record) => sent,
    };
    match sent {
      Ok(()) => self.routed += 1,
      // The worker already stopped on an error of its own; the collector reports it.
      Err(SendError(record)) => trace!(key = %record.key, "Worker inbox closed, dropping record"),
    }
    true
  }

  fn close_inboxes(&mut self) {
    for handle in self.workers.values_mut() {
      handle.close();
    }
  }
}

impl Input for Router {
  type Input = Record;
  type InputStream = Pin<Box<dyn Stream<Item = Record> + Send>>;
}

#[async_trait]
impl Consumer for Router {
  /// Routes every record of `stream`, then closes every inbox.
  async fn consume(&mut self, mut stream: Self::InputStream) {
    loop {
      let next = tokio::select! {
        biased;
        _ = self.cancel.cancelled() => None,
        next = stream.next() => next,
      };
      let Some(record) = next else {
        break;
      };
      if !self.route(record).await {
        break;
      }
    }

    self.close_inboxes();
    debug!(
      workers = self.workers.len(),
      routed = self.routed,
      "Router closed all inboxes"
    );
  }

  fn set_config_impl(&mut self, config: ConsumerConfig) {
    self.config = config;
  }

  fn get_config_impl(&self) -> &ConsumerConfig {
    &self.config
  }
}
