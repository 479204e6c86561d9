//! # Run Configuration
//!
//! Everything a run needs is gathered once into a [`Config`] at startup and
//! passed down by reference; no component reads process state on its own.

use crate::consumers::RoutingStrategy;
use crate::error::{ConfigError, ErrorStrategy};
use crate::record::DEFAULT_DELIMITER;
use crate::stats::Rounding;
use std::path::PathBuf;

/// Default capacity of the reader → router channel.
pub const DEFAULT_READER_CAPACITY: usize = 100_000;
/// Default capacity of each worker inbox.
pub const DEFAULT_INBOX_CAPACITY: usize = 10_000;

/// What to do with a record that cannot be used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ErrorPolicy {
  /// Log a warning, drop the record, keep going.
  #[default]
  Skip,
  /// End the run with an error and no output.
  Abort,
}

impl ErrorPolicy {
  /// The component error strategy for this policy.
  pub fn strategy<T>(self) -> ErrorStrategy<T> {
    match self {
      ErrorPolicy::Skip => ErrorStrategy::Skip,
      ErrorPolicy::Abort => ErrorStrategy::Stop,
    }
  }
}

/// Configuration of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
  /// The input file.
  pub input: PathBuf,
  /// Where to write the timing profile, if anywhere.
  pub profile: Option<PathBuf>,
  /// Field separator.
  pub delimiter: char,
  /// Capacity of the reader → router channel.
  pub reader_capacity: usize,
  /// Capacity of each worker inbox.
  ///
  /// Larger inboxes cost memory per worker but let the router block less often.
  pub inbox_capacity: usize,
  /// How keys map to workers.
  pub routing: RoutingStrategy,
  /// Policy for lines that do not split into two fields.
  pub malformed: ErrorPolicy,
  /// Policy for values that are not decimal numbers.
  pub invalid_value: ErrorPolicy,
  /// How figures are rounded for display.
  pub rounding: Rounding,
}

impl Config {
  /// A configuration with defaults for everything but the input path.
  pub fn new(input: impl Into<PathBuf>) -> Self {
    Self {
      input: input.into(),
      profile: None,
      delimiter: DEFAULT_DELIMITER,
      reader_capacity: DEFAULT_READER_CAPACITY,
      inbox_capacity: DEFAULT_INBOX_CAPACITY,
      routing: RoutingStrategy::default(),
      malformed: ErrorPolicy::default(),
      invalid_value: ErrorPolicy::default(),
      rounding: Rounding::default(),
    }
  }

  /// Sets the profile output path.
  #[must_use]
  pub fn with_profile(mut self, path: impl Into<PathBuf>) -> Self {
    self.profile = Some(path.into());
    self
  }

  /// Sets the field separator.
  #[must_use]
  pub fn with_delimiter(mut self, delimiter: char) -> Self {
    self.delimiter = delimiter;
    self
  }

  /// Sets the reader → router channel capacity.
  #[must_use]
  pub fn with_reader_capacity(mut self, capacity: usize) -> Self {
    self.reader_capacity = capacity;
    self
  }

  /// Sets the per-worker inbox capacity.
  #[must_use]
  pub fn with_inbox_capacity(mut self, capacity: usize) -> Self {
    self.inbox_capacity = capacity;
    self
  }

  /// Sets the routing strategy.
  #[must_use]
  pub fn with_routing(mut self, routing: RoutingStrategy) -> Self {
    self.routing = routing;
    self
  }

  /// Sets the policy for malformed lines.
  #[must_use]
  pub fn with_malformed_policy(mut self, policy: ErrorPolicy) -> Self {
    self.malformed = policy;
    self
  }

  /// Sets the policy for invalid values.
  #[must_use]
  pub fn with_invalid_value_policy(mut self, policy: ErrorPolicy) -> Self {
    self.invalid_value = policy;
    self
  }

  /// Sets the rounding mode.
  #[must_use]
  pub fn with_rounding(mut self, rounding: Rounding) -> Self {
    self.rounding = rounding;
    self
  }

  /// Checks the settings that would make a run impossible.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.reader_capacity == 0 {
      return Err(ConfigError::ZeroCapacity {
        name: "reader capacity",
      });
    }
    if self.inbox_capacity == 0 {
      return Err(ConfigError::ZeroCapacity {
        name: "inbox capacity",
      });
    }
    if matches!(self.delimiter, '\n' | '\r') {
      return Err(ConfigError::InvalidDelimiter(self.delimiter));
    }
    Ok(())
  }
}
