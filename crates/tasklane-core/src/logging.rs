use std::io::IsTerminal;

use anyhow::anyhow;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Level used when `RUST_LOG` is unset. Quiet wins over verbose.
pub fn default_directive(
  verbose: u8,
  quiet: u8
) -> &'static str {
  match (quiet, verbose) {
    | (2.., _) => "error",
    | (1, _) => "warn",
    | (0, 3..) => "trace",
    | (0, 2) => "tasklane_core=debug,info",
    | (0, 1) => "info",
    | (0, 0) => "warn"
  }
}

/// Installs the stderr fmt subscriber. A subscriber that is already set
/// (tests, embedding shells) is left in place.
pub fn init_tracing(
  verbose: u8,
  quiet: u8
) -> anyhow::Result<()> {
  let env_filter =
    EnvFilter::try_from_default_env()
      .or_else(|_| {
        EnvFilter::try_new(default_directive(
          verbose, quiet
        ))
      })
      .map_err(|e| {
        anyhow!("invalid RUST_LOG filter: {e}")
      })?;

  let installed = tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_writer(std::io::stderr)
    .with_target(true)
    .with_ansi(std::io::stderr().is_terminal())
    .try_init();

  if let Err(err) = installed {
    debug!(error = %err, "tracing subscriber already set");
  }
  Ok(())
}
