use crate::error::{ComponentInfo, ErrorAction, ErrorStrategy, PipelineError, StreamError};
use crate::output::Output;
use crate::producer::{Producer, ProducerConfig};
use crate::record::{Record, DEFAULT_DELIMITER};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::path::PathBuf;
use std::pin::Pin;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Counters reported by the reader once its stream is exhausted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
  /// Records handed to the router.
  pub records: u64,
  /// Malformed lines skipped under the `Skip` strategy.
  pub malformed: u64,
}

fn trim_line_terminator(line: &[u8]) -> &[u8] {
  let line = line.strip_suffix(b"\n").unwrap_or(line);
  line.strip_suffix(b"\r").unwrap_or(line)
}

/// What the reader's completion signal carries.
pub type ReadOutcome = Result<ReadStats, PipelineError>;

/// A spawned reader: its task and its one-shot completion signal.
pub struct ReaderHandle {
  /// The reader task.
  pub task: JoinHandle<()>,
  /// Fires exactly once, after the last record was handed off and the
  /// outbound channel was closed.
  pub completion: oneshot::Receiver<ReadOutcome>,
}

/// A producer that reads `key;value` records from a file, line by line.
///
/// Blank lines are ignored. A line that does not split into exactly two fields
/// is yielded as [`PipelineError::MalformedRecord`]; whether that ends the run
/// is decided by the configured error strategy when the reader is
/// [spawned](RecordReader::spawn).
pub struct RecordReader {
  /// The path to the file to read from.
  pub path: PathBuf,
  /// Field separator.
  pub delimiter: char,
  /// Configuration for the producer, including error handling strategy.
  pub config: ProducerConfig<String>,
  cancel: CancellationToken,
}

impl RecordReader {
  /// Creates a new `RecordReader` for the file at `path`.
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      delimiter: DEFAULT_DELIMITER,
      config: ProducerConfig::default(),
      cancel: CancellationToken::new(),
    }
  }

  /// Sets the field separator.
  #[must_use]
  pub fn with_delimiter(mut self, delimiter: char) -> Self {
    self.delimiter = delimiter;
    self
  }

  /// Sets the error handling strategy applied to malformed lines.
  #[must_use]
  pub fn with_error_strategy(mut self, strategy: ErrorStrategy<String>) -> Self {
    self.config_mut().error_strategy = strategy;
    self
  }

  /// Stops the stream at the next line once `cancel` fires.
  #[must_use]
  pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
    self.cancel = cancel;
    self
  }

  /// Runs the reader on its own task, forwarding records into `tx`.
  ///
  /// The completion signal is sent after `tx` has been dropped, so once it is
  /// observed the router's input is guaranteed to end.
  pub fn spawn(mut self, tx: mpsc::Sender<Record>) -> ReaderHandle {
    let (done_tx, done_rx) = oneshot::channel();
    let task = tokio::spawn(async move {
      let outcome = self.forward(tx).await;
      if let Err(e) = &outcome {
        if !e.is_cancelled() {
          error!(
            component = %self.component_info().name,
            path = %self.path.display(),
            error = %e,
            "Reader failed"
          );
        }
      }
      let _ = done_tx.send(outcome);
    });
    ReaderHandle {
      task,
      completion: done_rx,
    }
  }

  async fn forward(&mut self, tx: mpsc::Sender<Record>) -> ReadOutcome {
    let mut stream = self.produce();
    let mut stats = ReadStats::default();

    while let Some(item) = stream.next().await {
      match item {
        Ok(record) => {
          let sent = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = tx.send(record) => sent.is_ok(),
          };
          if !sent {
            return Err(PipelineError::Cancelled);
          }
          stats.records += 1;
        }
        Err(PipelineError::MalformedRecord { line, content }) => {
          let error = StreamError::new(
            Box::new(PipelineError::MalformedRecord {
              line,
              content: content.clone(),
            }),
            self.create_error_context(Some(content.clone())),
            self.component_info(),
          );
          match self.handle_error(&error) {
            ErrorAction::Skip => {
              stats.malformed += 1;
              warn!(
                component = %error.component.name,
                line,
                content = %content,
                "Skipping malformed record"
              );
            }
            ErrorAction::Stop => return Err(PipelineError::MalformedRecord { line, content }),
          }
        }
        Err(e) => return Err(e),
      }
    }

    debug!(
      records = stats.records,
      malformed = stats.malformed,
      "Reader reached end of input"
    );
    Ok(stats)
  }
}

impl Output for RecordReader {
  type Output = Result<Record, PipelineError>;
  type OutputStream = Pin<Box<dyn Stream<Item = Self::Output> + Send>>;
}

#[async_trait]
impl Producer for RecordReader {
  type Item = String;

  /// Produces the records of the file in order.
  ///
  /// Lines end at `\n` or `\r\n`. A line that is not valid UTF-8 is yielded as
  /// [`PipelineError::MalformedRecord`] (with a lossy rendering of its bytes).
  /// A file that cannot be opened yields a single [`PipelineError::Open`]; a read
  /// failure yields [`PipelineError::Read`] and ends the stream. Cancellation
  /// yields [`PipelineError::Cancelled`].
  fn produce(&mut self) -> Self::OutputStream {
    let path = self.path.clone();
    let delimiter = self.delimiter;
    let cancel = self.cancel.clone();

    Box::pin(async_stream::stream! {
      match File::open(&path).await {
        Ok(file) => {
          let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);
          let mut buf: Vec<u8> = Vec::with_capacity(128);
          let mut line_no: u64 = 0;

          loop {
            if cancel.is_cancelled() {
              yield Err(PipelineError::Cancelled);
              break;
            }
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
              Ok(0) => break,
              Ok(_) => {
                line_no += 1;
                let bytes = trim_line_terminator(&buf);
                if bytes.is_empty() {
                  continue;
                }
                // Bytes that are not UTF-8 make the line malformed, never the read.
                let parsed = std::str::from_utf8(bytes)
                  .ok()
                  .and_then(|line| Record::parse(line, delimiter));
                match parsed {
                  Some(record) => {
                    yield Ok(record);
                  }
                  None => {
                    let content = String::from_utf8_lossy(bytes).into_owned();
                    yield Err(PipelineError::MalformedRecord { line: line_no, content });
                  }
                }
              }
              Err(source) => {
                yield Err(PipelineError::Read { path: path.clone(), source });
                break;
              }
            }
          }
        }
        Err(source) => {
          yield Err(PipelineError::Open { path: path.clone(), source });
        }
      }
    })
  }

  fn set_config_impl(&mut self, config: ProducerConfig<String>) {
    self.config = config;
  }

  fn get_config_impl(&self) -> &ProducerConfig<String> {
    &self.config
  }

  fn get_config_mut_impl(&mut self) -> &mut ProducerConfig<String> {
    &mut self.config
  }

  fn component_info(&self) -> ComponentInfo {
    ComponentInfo {
      name: self
        .config
        .name()
        .unwrap_or_else(|| "record_reader".to_string()),
      type_name: std::any::type_name::<Self>().to_string(),
    }
  }
}
