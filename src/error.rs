//! # Error Handling
//!
//! Two layers of errors flow through a statweave run:
//!
//! - **Per-record errors** (a malformed line, an unparsable value) are reported to the
//!   owning component as a [`StreamError`]. The component's [`ErrorStrategy`] turns
//!   that into an [`ErrorAction`]: skip the record and keep going, or stop.
//! - **Fatal errors** end the whole run and surface as a [`PipelineError`]: the input
//!   cannot be opened or read, a per-record error hit a `Stop` strategy, a worker
//!   disappeared, or the run was cancelled.
//!
//! ## Error Strategies
//!
//! - **Stop**: abort the run on the first bad record
//! - **Skip**: drop the record, log a warning, continue (the default)
//! - **Custom**: user-defined handler deciding per error
//!
//! ## Example
//!
//! ```rust
//! use statweave::error::{ErrorAction, ErrorStrategy};
//!
//! let strategy = ErrorStrategy::<String>::new_custom(|error| {
//!   if error.component.name == "reader" {
//!     ErrorAction::Skip
//!   } else {
//!     ErrorAction::Stop
//!   }
//! });
//! assert!(matches!(strategy, ErrorStrategy::Custom(_)));
//! ```

use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Action to take when a per-record error occurs.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorAction {
  /// Stop the run. The error becomes a [`PipelineError`].
  Stop,
  /// Drop the offending record and continue with the next one.
  Skip,
}

// Type alias for the custom error handler function
type CustomErrorHandler<T> = Arc<dyn Fn(&StreamError<T>) -> ErrorAction + Send + Sync>;

/// Strategy for handling per-record errors in a component.
///
/// # Example
///
/// ```rust
/// use statweave::error::ErrorStrategy;
///
/// // Abort on the first bad record
/// let strategy = ErrorStrategy::<String>::Stop;
///
/// // Skip bad records and continue
/// let strategy = ErrorStrategy::<String>::Skip;
/// ```
pub enum ErrorStrategy<T> {
  /// Stop processing when an error occurs.
  Stop,
  /// Skip items that cause errors and continue processing.
  ///
  /// Useful for data cleaning scenarios where invalid records can be
  /// safely ignored.
  Skip,
  /// Custom error handling logic.
  Custom(CustomErrorHandler<T>),
}

impl<T> Clone for ErrorStrategy<T> {
  fn clone(&self) -> Self {
    match self {
      ErrorStrategy::Stop => ErrorStrategy::Stop,
      ErrorStrategy::Skip => ErrorStrategy::Skip,
      ErrorStrategy::Custom(handler) => ErrorStrategy::Custom(handler.clone()),
    }
  }
}

impl<T> fmt::Debug for ErrorStrategy<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ErrorStrategy::Stop => write!(f, "ErrorStrategy::Stop"),
      ErrorStrategy::Skip => write!(f, "ErrorStrategy::Skip"),
      ErrorStrategy::Custom(_) => write!(f, "ErrorStrategy::Custom"),
    }
  }
}

impl<T> PartialEq for ErrorStrategy<T> {
  fn eq(&self, other: &Self) -> bool {
    matches!(
      (self, other),
      (ErrorStrategy::Stop, ErrorStrategy::Stop)
        | (ErrorStrategy::Skip, ErrorStrategy::Skip)
        | (ErrorStrategy::Custom(_), ErrorStrategy::Custom(_))
    )
  }
}

impl<T> Default for ErrorStrategy<T> {
  fn default() -> Self {
    ErrorStrategy::Skip
  }
}

impl<T> ErrorStrategy<T> {
  /// Creates a custom error handling strategy with a user-defined handler function.
  ///
  /// # Arguments
  ///
  /// * `f` - A function that takes a `StreamError` and returns an `ErrorAction`.
  pub fn new_custom<F>(f: F) -> Self
  where
    F: Fn(&StreamError<T>) -> ErrorAction + Send + Sync + 'static,
  {
    Self::Custom(Arc::new(f))
  }

  /// Resolves the action for `error` under this strategy.
  pub fn action_for(&self, error: &StreamError<T>) -> ErrorAction {
    match self {
      ErrorStrategy::Stop => ErrorAction::Stop,
      ErrorStrategy::Skip => ErrorAction::Skip,
      ErrorStrategy::Custom(handler) => handler(error),
    }
  }
}

/// A per-record error observed by a component.
///
/// Carries the original error, the item that caused it and the component that saw it.
#[derive(Debug)]
pub struct StreamError<T> {
  /// The original error that occurred.
  pub source: Box<dyn StdError + Send + Sync>,
  /// Context about when and where the error occurred.
  pub context: ErrorContext<T>,
  /// Information about the component that encountered the error.
  pub component: ComponentInfo,
}

impl<T> StreamError<T> {
  /// Creates a new `StreamError` with the given source error, context, and component information.
  pub fn new(
    source: Box<dyn StdError + Send + Sync>,
    context: ErrorContext<T>,
    component: ComponentInfo,
  ) -> Self {
    Self {
      source,
      context,
      component,
    }
  }
}

impl<T: fmt::Debug> fmt::Display for StreamError<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "Error in {} ({}): {}",
      self.component.name, self.component.type_name, self.source
    )
  }
}

impl<T: fmt::Debug> StdError for StreamError<T> {
  fn source(&self) -> Option<&(dyn StdError + 'static)> {
    Some(self.source.as_ref())
  }
}

/// Context information about when and where an error occurred.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorContext<T> {
  /// The timestamp when the error occurred.
  pub timestamp: chrono::DateTime<chrono::Utc>,
  /// The item being processed when the error occurred, if available.
  pub item: Option<T>,
  /// The name of the component that encountered the error.
  pub component_name: String,
  /// The type of the component that encountered the error.
  pub component_type: String,
}

impl<T> Default for ErrorContext<T> {
  fn default() -> Self {
    Self {
      timestamp: chrono::Utc::now(),
      item: None,
      component_name: "default".to_string(),
      component_type: "default".to_string(),
    }
  }
}

/// The stage of a run in which a fatal error originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
  /// The record reader.
  Reader,
  /// The router.
  Router,
  /// An aggregation worker.
  Worker,
}

impl fmt::Display for PipelineStage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      PipelineStage::Reader => "reader",
      PipelineStage::Router => "router",
      PipelineStage::Worker => "worker",
    };
    f.write_str(name)
  }
}

/// Information about a pipeline component.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentInfo {
  /// The name of the component.
  pub name: String,
  /// The type name of the component.
  pub type_name: String,
}

impl Default for ComponentInfo {
  fn default() -> Self {
    Self {
      name: "default".to_string(),
      type_name: "default".to_string(),
    }
  }
}

impl ComponentInfo {
  /// Creates a new `ComponentInfo` with the given name and type name.
  pub fn new(name: String, type_name: String) -> Self {
    Self { name, type_name }
  }
}

/// Invalid run configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
  /// A channel capacity of zero was requested.
  #[error("{name} must be at least 1")]
  ZeroCapacity {
    /// The offending setting.
    name: &'static str,
  },
  /// The delimiter can never appear inside a line.
  #[error("delimiter {0:?} cannot be a line terminator")]
  InvalidDelimiter(char),
}

/// A fatal error that ends a run without output.
#[derive(Error, Debug)]
pub enum PipelineError {
  /// The input source could not be opened.
  #[error("failed to open {path}: {source}")]
  Open {
    /// Path of the input file.
    path: PathBuf,
    /// Underlying I/O error.
    source: std::io::Error,
  },
  /// Reading from an opened input failed.
  #[error("failed to read {path}: {source}")]
  Read {
    /// Path of the input file.
    path: PathBuf,
    /// Underlying I/O error.
    source: std::io::Error,
  },
  /// A line did not split into exactly two fields and the reader strategy said stop.
  #[error("malformed record at line {line}: {content:?}")]
  MalformedRecord {
    /// 1-based line number.
    line: u64,
    /// The raw line.
    content: String,
  },
  /// A value was not a finite decimal number and the worker strategy said stop.
  #[error("invalid value {value:?} for key {key:?}")]
  InvalidValue {
    /// Key of the offending record.
    key: String,
    /// The raw value field.
    value: String,
  },
  /// A worker ended without depositing its result.
  #[error("worker for routing key {0:?} exited without a result")]
  WorkerLost(String),
  /// A stage's task panicked or was aborted.
  #[error("{stage} task failed: {message}")]
  TaskFailed {
    /// Stage that owned the task.
    stage: PipelineStage,
    /// Join error description.
    message: String,
  },
  /// The run was cancelled before it completed.
  #[error("pipeline cancelled")]
  Cancelled,
  /// The profile report could not be written.
  #[error("failed to write profile {path}: {source}")]
  Profile {
    /// Path of the profile file.
    path: PathBuf,
    /// Underlying I/O error.
    source: std::io::Error,
  },
  /// The configuration was rejected.
  #[error(transparent)]
  Config(#[from] ConfigError),
}

impl PipelineError {
  /// Whether this error only reports that the run was cancelled.
  ///
  /// Cancellation is a consequence of another failure more often than a cause,
  /// so callers picking one error out of many prefer any other variant.
  pub fn is_cancelled(&self) -> bool {
    matches!(self, PipelineError::Cancelled)
  }

  pub(crate) fn task_failed(stage: PipelineStage, err: tokio::task::JoinError) -> Self {
    PipelineError::TaskFailed {
      stage,
      message: err.to_string(),
    }
  }
}
