//! Command-line arguments, parsed with clap and turned into a [`Config`].

use crate::config::{Config, ErrorPolicy, DEFAULT_INBOX_CAPACITY, DEFAULT_READER_CAPACITY};
use crate::consumers::RoutingStrategy;
use crate::record::DEFAULT_DELIMITER;
use crate::stats::Rounding;
use clap::Parser;
use std::path::PathBuf;

/// Per-key min/mean/max over a `key;value` file.
#[derive(Debug, Parser)]
#[command(name = "statweave")]
#[command(about = "Streaming per-key min/mean/max over key;value files")]
#[command(version)]
pub struct Cli {
  /// Write a per-phase timing profile to this file
  #[arg(long, value_name = "FILE")]
  pub cpuprofile: Option<PathBuf>,

  /// Field separator between key and value
  #[arg(long, default_value_t = DEFAULT_DELIMITER)]
  pub delimiter: char,

  /// Capacity of the reader to router channel
  #[arg(long, default_value_t = DEFAULT_READER_CAPACITY)]
  pub reader_capacity: usize,

  /// Capacity of each worker inbox
  #[arg(long, default_value_t = DEFAULT_INBOX_CAPACITY)]
  pub inbox_capacity: usize,

  /// How keys are assigned to workers
  #[arg(long, value_enum, default_value_t = RoutingStrategy::Key)]
  pub routing: RoutingStrategy,

  /// What to do with lines that are not exactly `key;value`
  #[arg(long, value_enum, default_value_t = ErrorPolicy::Skip)]
  pub on_malformed: ErrorPolicy,

  /// What to do with values that are not decimal numbers
  #[arg(long, value_enum, default_value_t = ErrorPolicy::Skip)]
  pub on_invalid_value: ErrorPolicy,

  /// Rounding applied to printed figures
  #[arg(long, value_enum, default_value_t = Rounding::HalfUp)]
  pub rounding: Rounding,

  /// Input file, one `key;value` record per line
  pub input: PathBuf,
}

impl Cli {
  /// Builds the run configuration.
  pub fn into_config(self) -> Config {
    let config = Config::new(self.input)
      .with_delimiter(self.delimiter)
      .with_reader_capacity(self.reader_capacity)
      .with_inbox_capacity(self.inbox_capacity)
      .with_routing(self.routing)
      .with_malformed_policy(self.on_malformed)
      .with_invalid_value_policy(self.on_invalid_value)
      .with_rounding(self.rounding);
    match self.cpuprofile {
      Some(path) => config.with_profile(path),
      None => config,
    }
  }
}
