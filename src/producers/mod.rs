//! Built-in producer implementations.

/// Producer that reads `key;value` records from a file.
pub mod record_reader;

pub use record_reader::{ReadOutcome, ReadStats, ReaderHandle, RecordReader};
