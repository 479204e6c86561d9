use crate::cli::Cli;
use crate::config::{ErrorPolicy, DEFAULT_INBOX_CAPACITY, DEFAULT_READER_CAPACITY};
use crate::consumers::RoutingStrategy;
use crate::stats::Rounding;
use clap::{CommandFactory, Parser};
use std::path::PathBuf;

#[test]
fn test_cli_definition_is_valid() {
  Cli::command().debug_assert();
}

#[test]
fn test_defaults() {
  let config = Cli::try_parse_from(["statweave", "measurements.txt"])
    .unwrap()
    .into_config();

  assert_eq!(config.input, PathBuf::from("measurements.txt"));
  assert_eq!(config.profile, None);
  assert_eq!(config.delimiter, ';');
  assert_eq!(config.reader_capacity, DEFAULT_READER_CAPACITY);
  assert_eq!(config.inbox_capacity, DEFAULT_INBOX_CAPACITY);
  assert_eq!(config.routing, RoutingStrategy::Key);
  assert_eq!(config.malformed, ErrorPolicy::Skip);
  assert_eq!(config.invalid_value, ErrorPolicy::Skip);
  assert_eq!(config.rounding, Rounding::HalfUp);
}

#[test]
fn test_cpuprofile_flag() {
  let config = Cli::try_parse_from(["statweave", "--cpuprofile", "run.prof", "in.txt"])
    .unwrap()
    .into_config();
  assert_eq!(config.profile, Some(PathBuf::from("run.prof")));
}

#[test]
fn test_all_options() {
  let cli = Cli::try_parse_from([
    "statweave",
    "--delimiter",
    ",",
    "--reader-capacity",
    "16",
    "--inbox-capacity",
    "4",
    "--routing",
    "first-char",
    "--on-malformed",
    "abort",
    "--on-invalid-value",
    "abort",
    "--rounding",
    "ceil",
    "in.csv",
  ])
  .unwrap();
  let config = cli.into_config();

  assert_eq!(config.delimiter, ',');
  assert_eq!(config.reader_capacity, 16);
  assert_eq!(config.inbox_capacity, 4);
  assert_eq!(config.routing, RoutingStrategy::FirstChar);
  assert_eq!(config.malformed, ErrorPolicy::Abort);
  assert_eq!(config.invalid_value, ErrorPolicy::Abort);
  assert_eq!(config.rounding, Rounding::Ceil);
}

#[test]
fn test_input_is_required() {
  assert!(Cli::try_parse_from(["statweave"]).is_err());
}

#[test]
fn test_unknown_routing_is_rejected() {
  assert!(Cli::try_parse_from(["statweave", "--routing", "hash", "in.txt"]).is_err());
}
