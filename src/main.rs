use clap::Parser;
use statweave::cli::Cli;
use statweave::profile::ProfileSink;
use statweave::{Pipeline, PipelineError, RunReport};
use std::io::Write;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  match run(cli).await {
    Ok(report) => {
      let mut stdout = std::io::stdout().lock();
      match writeln!(stdout, "{}", report.summary) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
          eprintln!("statweave: failed to write output: {e}");
          ExitCode::FAILURE
        }
      }
    }
    Err(e) => {
      eprintln!("statweave: {e}");
      ExitCode::FAILURE
    }
  }
}

async fn run(cli: Cli) -> Result<RunReport, PipelineError> {
  let config = cli.into_config();
  let pipeline = Pipeline::new(config)?;

  let profile = match &pipeline.config().profile {
    Some(path) => Some(ProfileSink::create(path).await?),
    None => None,
  };

  let cancel = CancellationToken::new();
  let on_signal = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      warn!("Interrupted, cancelling run");
      on_signal.cancel();
    }
  });

  let report = pipeline.run(cancel).await?;
  if let Some(sink) = profile {
    sink.write(&report.profile).await?;
  }
  Ok(report)
}
