//! Per-phase timing profile written by `--cpuprofile`.

use crate::error::PipelineError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Wall-clock timings of one run.
///
/// `read`, `route` and `collect` are consecutive, non-overlapping phases; their
/// sum never exceeds `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Profile {
  /// From the start of the run until the reader's completion signal.
  pub read: Duration,
  /// From the reader's completion until the router had closed every inbox.
  pub route: Duration,
  /// Time spent draining outboxes.
  pub collect: Duration,
  /// Whole run.
  pub total: Duration,
  /// Records routed.
  pub records: u64,
  /// Workers started.
  pub workers: usize,
  /// Distinct keys in the summary.
  pub keys: usize,
}

impl fmt::Display for Profile {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "phase\tmillis")?;
    writeln!(f, "read\t{:.3}", millis(self.read))?;
    writeln!(f, "route\t{:.3}", millis(self.route))?;
    writeln!(f, "collect\t{:.3}", millis(self.collect))?;
    writeln!(f, "total\t{:.3}", millis(self.total))?;
    writeln!(f, "records\t{}", self.records)?;
    writeln!(f, "workers\t{}", self.workers)?;
    writeln!(f, "keys\t{}", self.keys)
  }
}

fn millis(d: Duration) -> f64 {
  d.as_secs_f64() * 1_000.0
}

/// An open profile file.
///
/// Created before the run so an unwritable path fails fast, written after it.
pub struct ProfileSink {
  path: PathBuf,
  file: File,
}

impl ProfileSink {
  /// Creates (or truncates) the profile file.
  pub async fn create(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
    let path = path.as_ref().to_path_buf();
    match File::create(&path).await {
      Ok(file) => Ok(Self { path, file }),
      Err(source) => Err(PipelineError::Profile { path, source }),
    }
  }

  /// Writes `profile` and flushes it to disk.
  pub async fn write(mut self, profile: &Profile) -> Result<(), PipelineError> {
    let rendered = profile.to_string();
    let written = async {
      self.file.write_all(rendered.as_bytes()).await?;
      self.file.flush().await
    }
    .await;
    written.map_err(|source| PipelineError::Profile {
      path: self.path,
      source,
    })
  }
}
