//! # Producer Trait
//!
//! This module defines the `Producer` trait for components that start a stream.
//! In a statweave run the only producer is the
//! [`RecordReader`](crate::producers::RecordReader), which turns an input file
//! into a stream of records.
//!
//! ## Key Concepts
//!
//! - **Producer**: A component that yields a stream of items
//! - **ProducerConfig**: Configuration including error strategy and component name
//! - **Error Strategy**: How per-item errors are handled (Stop, Skip, Custom)

use crate::error::{ComponentInfo, ErrorAction, ErrorContext, ErrorStrategy, StreamError};
use crate::output::Output;
use async_trait::async_trait;

/// Configuration for producers, including error handling strategy and naming.
///
/// `T` is the raw item type errors are reported against (for the record reader,
/// the unparsed line).
#[derive(Debug, Clone, PartialEq)]
pub struct ProducerConfig<T> {
  /// The error handling strategy to use when errors occur.
  pub error_strategy: ErrorStrategy<T>,
  /// Optional name for identifying this producer in logs.
  pub name: Option<String>,
}

impl<T> Default for ProducerConfig<T> {
  fn default() -> Self {
    Self {
      error_strategy: ErrorStrategy::default(),
      name: None,
    }
  }
}

impl<T> ProducerConfig<T> {
  /// Sets the error handling strategy for this producer configuration.
  #[must_use]
  pub fn with_error_strategy(mut self, strategy: ErrorStrategy<T>) -> Self {
    self.error_strategy = strategy;
    self
  }

  /// Sets the name for this producer configuration.
  #[must_use]
  pub fn with_name(mut self, name: String) -> Self {
    self.name = Some(name);
    self
  }

  /// Returns the current error handling strategy.
  pub fn error_strategy(&self) -> ErrorStrategy<T> {
    self.error_strategy.clone()
  }

  /// Returns the current name, if set.
  pub fn name(&self) -> Option<String> {
    self.name.clone()
  }
}

/// Trait for components that produce data streams.
///
/// Producers are the starting point of a run. The stream they return is lazy,
/// finite and not restartable: calling [`produce`](Producer::produce) opens the
/// source anew.
#[async_trait]
pub trait Producer: Output {
  /// The raw item type per-item errors carry in their context.
  type Item: std::fmt::Debug + Clone + Send + Sync + 'static;

  /// Produces a stream of items.
  fn produce(&mut self) -> Self::OutputStream;

  /// Sets the configuration for this producer.
  fn set_config(&mut self, config: ProducerConfig<Self::Item>) {
    self.set_config_impl(config);
  }

  /// Returns a reference to the producer's configuration.
  fn config(&self) -> &ProducerConfig<Self::Item> {
    self.get_config_impl()
  }

  /// Returns a mutable reference to the producer's configuration.
  fn config_mut(&mut self) -> &mut ProducerConfig<Self::Item> {
    self.get_config_mut_impl()
  }

  /// Sets the name for this producer.
  #[must_use]
  fn with_name(mut self, name: String) -> Self
  where
    Self: Sized,
  {
    let config = self.get_config_impl().clone();
    self.set_config(config.with_name(name));
    self
  }

  /// Determines the [`ErrorAction`] for `error` from the configured strategy.
  fn handle_error(&self, error: &StreamError<Self::Item>) -> ErrorAction {
    self.config().error_strategy.action_for(error)
  }

  /// Creates an error context for the item that caused an error.
  fn create_error_context(&self, item: Option<Self::Item>) -> ErrorContext<Self::Item> {
    let info = self.component_info();
    ErrorContext {
      timestamp: chrono::Utc::now(),
      item,
      component_name: info.name,
      component_type: info.type_name,
    }
  }

  /// Returns information about the component for error reporting.
  fn component_info(&self) -> ComponentInfo {
    ComponentInfo {
      name: self
        .config()
        .name()
        .unwrap_or_else(|| "producer".to_string()),
      type_name: std::any::type_name::<Self>().to_string(),
    }
  }

  /// Stores the configuration.
  fn set_config_impl(&mut self, config: ProducerConfig<Self::Item>);

  /// Returns a reference to the stored configuration.
  fn get_config_impl(&self) -> &ProducerConfig<Self::Item>;

  /// Returns a mutable reference to the stored configuration.
  fn get_config_mut_impl(&mut self) -> &mut ProducerConfig<Self::Item>;
}
