use crate::collector::Collector;
use crate::consumer::Consumer;
use crate::consumers::{Router, RoutingStrategy};
use crate::error::{ErrorStrategy, PipelineError};
use crate::record::Record;
use crate::stats::Rounding;
use futures::stream;
use tokio_util::sync::CancellationToken;

fn records(pairs: &[(&str, &str)]) -> Vec<Record> {
  pairs.iter().map(|(k, v)| Record::new(*k, *v)).collect()
}

#[test]
fn test_routing_key_by_key() {
  assert_eq!(RoutingStrategy::Key.routing_key("Tokyo"), "Tokyo");
}

#[test]
fn test_routing_key_by_first_char() {
  assert_eq!(RoutingStrategy::FirstChar.routing_key("Tokyo"), "T");
  assert_eq!(RoutingStrategy::FirstChar.routing_key("Østersund"), "Ø");
  assert_eq!(RoutingStrategy::FirstChar.routing_key(""), "");
}

#[tokio::test]
async fn test_router_spawns_one_worker_per_key() {
  let mut router = Router::new(4, RoutingStrategy::Key);
  let input = records(&[("Tokyo", "10"), ("Paris", "5.5"), ("Tokyo", "20")]);

  router.consume(Box::pin(stream::iter(input))).await;

  assert_eq!(router.routed(), 3);
  assert_eq!(router.worker_count(), 2);
  let registry = router.into_registry();
  assert_eq!(registry.routing_keys(), vec!["Paris", "Tokyo"]);
}

#[tokio::test]
async fn test_router_first_char_shares_workers() {
  let mut router = Router::new(4, RoutingStrategy::FirstChar);
  let input = records(&[("Tokyo", "10"), ("Toronto", "1"), ("Paris", "5.5")]);

  router.consume(Box::pin(stream::iter(input))).await;

  assert_eq!(router.worker_count(), 2);
  let registry = router.into_registry();
  assert_eq!(registry.routing_keys(), vec!["P", "T"]);

  let (summary, stats) = Collector::new(Rounding::HalfUp)
    .collect(registry)
    .await
    .unwrap();
  assert_eq!(stats.workers, 2);
  assert_eq!(stats.keys, 3);
  assert_eq!(
    summary.to_string(),
    "{Paris=5.5/5.5/5.5, Tokyo=10.0/10.0/10.0, Toronto=1.0/1.0/1.0}"
  );
}

#[tokio::test]
async fn test_router_applies_backpressure_with_tiny_inboxes() {
  let mut router = Router::new(1, RoutingStrategy::Key);
  let input: Vec<Record> = (0..500)
    .map(|i| Record::new(format!("k{}", i % 7), format!("{}", i)))
    .collect();

  router.consume(Box::pin(stream::iter(input))).await;

  assert_eq!(router.routed(), 500);
  let (summary, stats) = Collector::new(Rounding::HalfUp)
    .collect(router.into_registry())
    .await
    .unwrap();
  assert_eq!(summary.len(), 7);
  assert_eq!(stats.records, 500);
}

#[tokio::test]
async fn test_router_with_empty_stream() {
  let mut router = Router::new(4, RoutingStrategy::Key);
  router.consume(Box::pin(stream::empty())).await;

  assert_eq!(router.worker_count(), 0);
  assert!(router.into_registry().is_empty());
}

#[tokio::test]
async fn test_router_stops_when_cancelled() {
  let cancel = CancellationToken::new();
  cancel.cancel();
  let mut router = Router::new(4, RoutingStrategy::Key).with_cancellation(cancel);

  router
    .consume(Box::pin(stream::iter(records(&[("a", "1")]))))
    .await;

  assert_eq!(router.routed(), 0);
}

#[tokio::test]
async fn test_router_passes_strategy_to_workers() {
  let cancel = CancellationToken::new();
  let mut router = Router::new(4, RoutingStrategy::Key)
    .with_worker_error_strategy(ErrorStrategy::Stop)
    .with_cancellation(cancel.clone());

  router
    .consume(Box::pin(stream::iter(records(&[("a", "1"), ("b", "nope")]))))
    .await;

  let result = Collector::new(Rounding::HalfUp)
    .collect(router.into_registry())
    .await;
  assert!(matches!(result, Err(PipelineError::InvalidValue { .. })));
  assert!(cancel.is_cancelled());
}

#[test]
fn test_router_config_name() {
  let router = Router::new(1, RoutingStrategy::Key);
  assert_eq!(router.config().name(), "router");

  let router = router.with_name("fanout".to_string());
  assert_eq!(router.component_info().name, "fanout");
}
