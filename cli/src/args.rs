//! Command-line interface for `flaky`.
//!
//! Usage:
//!   flaky url --delay 2000 --fail-rate 30 --error-code 503
//!   flaky invoke --payload '{"message": "hi"}'
//!   flaky codes

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use flaky_core::{Configuration, ErrorCode};

// ---------------------------------------------------------------------------
// Cli
// ---------------------------------------------------------------------------

#[derive(Debug, Parser)]
#[command(name = "flaky", about = "Build and call a deliberately unreliable endpoint")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML settings file. Defaults to ./flaky.toml or ./config/flaky.toml
    /// when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base address of the flaky server, without the /flaky path.
    #[arg(long, global = true, env = "FLAKY_BASE_URL")]
    pub base_url: Option<String>,

    /// Transport timeout for `invoke`, e.g. "10s" or "1500ms".
    #[arg(long, global = true, value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the endpoint URL for the chosen parameters.
    Url(EndpointArgs),

    /// Call the endpoint once and print the classified result.
    Invoke(EndpointArgs),

    /// List the supported error codes.
    Codes,
}

// ---------------------------------------------------------------------------
// EndpointArgs
// ---------------------------------------------------------------------------

/// Endpoint parameters. Each flag overrides the settings file.
#[derive(Debug, Default, Args)]
pub struct EndpointArgs {
    /// Server-side delay in milliseconds, clamped to 0..=5000.
    #[arg(long)]
    pub delay: Option<u32>,

    /// Failure probability in percent, clamped to 0..=100.
    #[arg(long)]
    pub fail_rate: Option<u32>,

    /// Status returned on a simulated failure.
    #[arg(long, value_parser = parse_error_code)]
    pub error_code: Option<ErrorCode>,

    /// JSON text the server should echo back on success.
    #[arg(long, conflicts_with_all = ["payload_file", "no_payload"])]
    pub payload: Option<String>,

    /// Read the echo payload from a file.
    #[arg(long, conflicts_with = "no_payload")]
    pub payload_file: Option<PathBuf>,

    /// Send no echo payload, even if the settings file has one.
    #[arg(long)]
    pub no_payload: bool,
}

impl EndpointArgs {
    /// Overlay these flags on `config`, clamping numeric values.
    ///
    /// A payload file that is not valid UTF-8 is reported and dropped; the
    /// endpoint is then built without a `response` parameter.
    pub fn apply(&self, config: &mut Configuration) -> anyhow::Result<()> {
        if let Some(delay) = self.delay {
            config.set_delay_ms(delay);
        }
        if let Some(fail_rate) = self.fail_rate {
            config.set_fail_rate_percent(fail_rate);
        }
        if let Some(code) = self.error_code {
            config.error_code = code;
        }

        if self.no_payload {
            config.custom_payload_text = None;
        } else if let Some(text) = &self.payload {
            config.custom_payload_text = Some(text.clone());
        } else if let Some(path) = &self.payload_file {
            let bytes = std::fs::read(path)
                .with_context(|| format!("failed to read payload file {}", path.display()))?;
            if let Err(e) = config.set_payload_bytes(&bytes) {
                tracing::warn!(path = %path.display(), error = %e, "payload omitted");
            }
        }
        Ok(())
    }
}

fn parse_error_code(s: &str) -> Result<ErrorCode, String> {
    let code: u16 = s.parse().map_err(|_| format!("not a status code: {s}"))?;
    ErrorCode::try_from(code).map_err(|e| {
        let supported: Vec<String> = ErrorCode::ALL.iter().map(ToString::to_string).collect();
        format!("{e} (supported: {})", supported.join(", "))
    })
}
