use crate::error::{ErrorAction, ErrorStrategy, PipelineError};
use crate::record::Record;
use crate::stats::StatAccumulator;
use crate::worker::{AggregationWorker, WorkerRegistry};
use tokio_util::sync::CancellationToken;

#[test]
fn test_fold_keeps_exact_keys_apart() {
  let mut worker = AggregationWorker::new("T");
  worker.fold(Record::new("Tokyo", "10.0")).unwrap();
  worker.fold(Record::new("Toronto", "-3.5")).unwrap();
  worker.fold(Record::new("Tokyo", "20.0")).unwrap();

  let report = worker.finish().unwrap();
  assert_eq!(report.routing_key, "T");
  assert_eq!(report.records, 3);
  assert_eq!(report.rejected, 0);

  let keys: Vec<&str> = report.stats.iter().map(|acc| acc.key.as_str()).collect();
  assert_eq!(keys, vec!["Tokyo", "Toronto"]);

  let tokyo: &StatAccumulator = &report.stats[0];
  assert_eq!((tokyo.min, tokyo.max, tokyo.count), (10.0, 20.0, 2));
  assert_eq!(tokyo.mean(), 15.0);
}

#[test]
fn test_fold_skips_invalid_values_by_default() {
  let mut worker = AggregationWorker::new("Tokyo");
  worker.fold(Record::new("Tokyo", "abc")).unwrap();
  worker.fold(Record::new("Tokyo", " 1.0")).unwrap();
  worker.fold(Record::new("Tokyo", "NaN")).unwrap();
  worker.fold(Record::new("Tokyo", "inf")).unwrap();
  worker.fold(Record::new("Tokyo", "4.0")).unwrap();

  let report = worker.finish().unwrap();
  assert_eq!(report.records, 1);
  assert_eq!(report.rejected, 4);
  assert_eq!(report.stats.len(), 1);
  assert_eq!(report.stats[0].sum, 4.0);
}

#[test]
fn test_fold_stop_strategy_returns_invalid_value() {
  let mut worker = AggregationWorker::new("Tokyo").with_error_strategy(ErrorStrategy::Stop);
  worker.fold(Record::new("Tokyo", "1.0")).unwrap();

  match worker.fold(Record::new("Tokyo", "x")) {
    Err(PipelineError::InvalidValue { key, value }) => {
      assert_eq!(key, "Tokyo");
      assert_eq!(value, "x");
    }
    other => panic!("Expected InvalidValue, got {:?}", other),
  }
}

#[test]
fn test_fold_custom_strategy_sees_record() {
  let strategy = ErrorStrategy::<Record>::new_custom(|error| match &error.context.item {
    Some(record) if record.raw_value.is_empty() => ErrorAction::Skip,
    _ => ErrorAction::Stop,
  });
  let mut worker = AggregationWorker::new("k").with_error_strategy(strategy);

  assert!(worker.fold(Record::new("k", "")).is_ok());
  assert!(worker.fold(Record::new("k", "oops")).is_err());
}

#[test]
fn test_finish_without_records_is_empty_report() {
  let report = AggregationWorker::new("k").finish().unwrap();
  assert!(report.stats.is_empty());
  assert_eq!(report.records, 0);
}

#[tokio::test]
async fn test_spawned_worker_reports_after_inbox_closes() {
  let mut handle = AggregationWorker::new("Paris").spawn(2);
  let inbox = handle.inbox().unwrap().clone();
  for value in ["5.0", "6.0", "7.0"] {
    inbox.send(Record::new("Paris", value)).await.unwrap();
  }
  drop(inbox);
  handle.close();
  assert!(handle.inbox().is_none());

  let slot = handle.into_slot();
  let report = slot.outbox.await.unwrap().unwrap();
  assert_eq!(report.records, 3);
  assert_eq!(report.stats[0].mean(), 6.0);
  slot.task.await.unwrap();
}

#[tokio::test]
async fn test_spawned_worker_stops_and_cancels_on_invalid_value() {
  let cancel = CancellationToken::new();
  let handle = AggregationWorker::new("Paris")
    .with_error_strategy(ErrorStrategy::Stop)
    .with_cancellation(cancel.clone())
    .spawn(4);
  let inbox = handle.inbox().unwrap().clone();
  inbox.send(Record::new("Paris", "bad")).await.unwrap();
  drop(inbox);

  let slot = handle.into_slot();
  let outcome = slot.outbox.await.unwrap();
  assert!(matches!(outcome, Err(PipelineError::InvalidValue { .. })));
  assert!(cancel.is_cancelled());
}

#[tokio::test]
async fn test_spawned_worker_deposits_cancelled() {
  let cancel = CancellationToken::new();
  let handle = AggregationWorker::new("Paris")
    .with_cancellation(cancel.clone())
    .spawn(4);
  // A live sender keeps the inbox open; only the token ends the worker.
  let _inbox = handle.inbox().unwrap().clone();
  let slot = handle.into_slot();
  cancel.cancel();

  let outcome = slot.outbox.await.unwrap();
  assert!(matches!(outcome, Err(PipelineError::Cancelled)));
}

#[tokio::test]
async fn test_registry_sorts_routing_keys() {
  let registry: WorkerRegistry = ["b", "a", "c"]
    .into_iter()
    .map(|key| {
      let slot = AggregationWorker::new(key).spawn(1).into_slot();
      (key.to_string(), slot)
    })
    .collect();

  assert_eq!(registry.len(), 3);
  assert_eq!(registry.routing_keys(), vec!["a", "b", "c"]);

  let mut drained = Vec::new();
  for (key, slot) in registry.into_sorted() {
    let report = slot.outbox.await.unwrap().unwrap();
    assert_eq!(report.routing_key, key);
    drained.push(key);
  }
  assert_eq!(drained, vec!["a", "b", "c"]);
}

#[test]
fn test_empty_registry() {
  let registry = WorkerRegistry::default();
  assert!(registry.is_empty());
  assert!(registry.routing_keys().is_empty());
}
