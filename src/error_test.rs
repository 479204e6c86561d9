use crate::error::{
  ComponentInfo, ConfigError, ErrorAction, ErrorContext, ErrorStrategy, PipelineError,
  PipelineStage, StreamError,
};
use std::error::Error;
use std::path::PathBuf;

fn stream_error(item: Option<String>) -> StreamError<String> {
  StreamError::new(
    Box::<dyn Error + Send + Sync>::from("bad line"),
    ErrorContext {
      item,
      component_name: "reader".to_string(),
      component_type: "RecordReader".to_string(),
      ..ErrorContext::default()
    },
    ComponentInfo::new("reader".to_string(), "RecordReader".to_string()),
  )
}

#[test]
fn test_error_strategy_default_is_skip() {
  assert_eq!(ErrorStrategy::<String>::default(), ErrorStrategy::Skip);
}

#[test]
fn test_error_strategy_stop_action() {
  let error = stream_error(None);
  assert_eq!(ErrorStrategy::Stop.action_for(&error), ErrorAction::Stop);
}

#[test]
fn test_error_strategy_skip_action() {
  let error = stream_error(None);
  assert_eq!(ErrorStrategy::Skip.action_for(&error), ErrorAction::Skip);
}

#[test]
fn test_error_strategy_custom_sees_item() {
  let strategy = ErrorStrategy::<String>::new_custom(|error| match &error.context.item {
    Some(line) if line.starts_with('#') => ErrorAction::Skip,
    _ => ErrorAction::Stop,
  });

  assert_eq!(
    strategy.action_for(&stream_error(Some("# comment".to_string()))),
    ErrorAction::Skip
  );
  assert_eq!(
    strategy.action_for(&stream_error(Some("garbage".to_string()))),
    ErrorAction::Stop
  );
}

#[test]
fn test_error_strategy_clone_and_eq() {
  let custom = ErrorStrategy::<String>::new_custom(|_| ErrorAction::Skip);
  assert_eq!(custom.clone(), custom);
  assert_ne!(ErrorStrategy::<String>::Stop, ErrorStrategy::Skip);
  assert_eq!(format!("{:?}", custom), "ErrorStrategy::Custom");
}

#[test]
fn test_stream_error_display_and_source() {
  let error = stream_error(None);
  assert_eq!(error.to_string(), "Error in reader (RecordReader): bad line");
  assert_eq!(error.source().map(|e| e.to_string()), Some("bad line".to_string()));
}

#[test]
fn test_pipeline_error_messages() {
  let open = PipelineError::Open {
    path: PathBuf::from("missing.txt"),
    source: std::io::Error::from(std::io::ErrorKind::NotFound),
  };
  assert!(open.to_string().starts_with("failed to open missing.txt"));

  let malformed = PipelineError::MalformedRecord {
    line: 3,
    content: "Tokyo".to_string(),
  };
  assert_eq!(malformed.to_string(), "malformed record at line 3: \"Tokyo\"");

  let invalid = PipelineError::InvalidValue {
    key: "Tokyo".to_string(),
    value: "abc".to_string(),
  };
  assert_eq!(invalid.to_string(), "invalid value \"abc\" for key \"Tokyo\"");

  assert_eq!(PipelineError::Cancelled.to_string(), "pipeline cancelled");
}

#[test]
fn test_pipeline_error_from_config_error() {
  let error: PipelineError = ConfigError::ZeroCapacity {
    name: "inbox capacity",
  }
  .into();
  assert_eq!(error.to_string(), "inbox capacity must be at least 1");
}

#[test]
fn test_is_cancelled() {
  assert!(PipelineError::Cancelled.is_cancelled());
  assert!(!PipelineError::WorkerLost("T".to_string()).is_cancelled());
}

#[test]
fn test_pipeline_stage_display() {
  assert_eq!(PipelineStage::Reader.to_string(), "reader");
  assert_eq!(PipelineStage::Router.to_string(), "router");
  assert_eq!(PipelineStage::Worker.to_string(), "worker");
}
