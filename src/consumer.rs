//! # Consumer Trait
//!
//! This module defines the `Consumer` trait for components that drain a stream.
//! In a statweave run the [`Router`](crate::consumers::Router) is the consumer of
//! the reader's record stream: it drains it and fans each record out to a
//! per-key worker.

use crate::error::ComponentInfo;
use crate::input::Input;
use async_trait::async_trait;

/// Configuration for a consumer component.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsumerConfig {
  /// The name of this consumer component.
  pub name: String,
}

impl ConsumerConfig {
  /// Sets the name for this consumer configuration.
  #[must_use]
  pub fn with_name(mut self, name: String) -> Self {
    self.name = name;
    self
  }

  /// Returns the current name.
  pub fn name(&self) -> &str {
    &self.name
  }
}

/// Trait for components that consume data streams.
///
/// `consume` returns once the input stream is exhausted (or the consumer
/// decides to stop early); whatever the consumer built up stays on `self`.
#[async_trait]
pub trait Consumer: Input {
  /// Consumes the input stream to completion.
  async fn consume(&mut self, stream: Self::InputStream);

  /// Sets the configuration for this consumer.
  fn set_config(&mut self, config: ConsumerConfig) {
    self.set_config_impl(config);
  }

  /// Returns a reference to the consumer's configuration.
  fn config(&self) -> &ConsumerConfig {
    self.get_config_impl()
  }

  /// Sets the name for this consumer.
  #[must_use]
  fn with_name(mut self, name: String) -> Self
  where
    Self: Sized,
  {
    let config = self.get_config_impl().clone();
    self.set_config(config.with_name(name));
    self
  }

  /// Returns information about the component for logging.
  fn component_info(&self) -> ComponentInfo {
    let name = if self.config().name().is_empty() {
      "consumer".to_string()
    } else {
      self.config().name().to_string()
    };
    ComponentInfo {
      name,
      type_name: std::any::type_name::<Self>().to_string(),
    }
  }

  /// Stores the configuration.
  fn set_config_impl(&mut self, config: ConsumerConfig);

  /// Returns a reference to the stored configuration.
  fn get_config_impl(&self) -> &ConsumerConfig;
}
