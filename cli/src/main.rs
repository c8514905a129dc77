//! `flaky`: build and call a deliberately unreliable endpoint.
//!
//! Usage:
//!   flaky url [--delay MS] [--fail-rate PCT] [--error-code CODE] [--payload JSON]
//!   flaky invoke [same flags] [--timeout 10s]
//!   flaky codes

use std::process::ExitCode;

use clap::Parser;
use tracing::info;

use flaky_core::{
    Configuration, ErrorCode, FlakyClient, InvocationResult, ResultState, Session, UreqTransport,
};

mod args;
mod logger;
mod settings;

use args::{Cli, Command, EndpointArgs};
use settings::Settings;

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let _guard = logger::init();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        settings.base_url = base_url;
    }
    if cli.timeout.is_some() {
        settings.timeout = cli.timeout;
    }

    match cli.command {
        Command::Codes => {
            for code in ErrorCode::ALL {
                println!("{code}  {}", code.reason());
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Url(args) => {
            let config = configuration(&settings, &args)?;
            println!("{}", flaky_core::build(&settings.base_url, &config));
            Ok(ExitCode::SUCCESS)
        }
        Command::Invoke(args) => {
            let config = configuration(&settings, &args)?;
            invoke(&settings, &config).await
        }
    }
}

fn configuration(settings: &Settings, args: &EndpointArgs) -> anyhow::Result<Configuration> {
    let mut config = settings.endpoint.clone();
    args.apply(&mut config)?;
    Ok(config)
}

async fn invoke(settings: &Settings, config: &Configuration) -> anyhow::Result<ExitCode> {
    let transport = UreqTransport::with_timeout(settings.timeout);
    let session = Session::new(FlakyClient::new(&settings.base_url), transport);

    info!(url = %session.endpoint(config), "invoking");
    let result = session.invoke(config).await?;

    eprintln!("{}", summary(&result));
    println!("{}", serde_json::to_string_pretty(&result.body)?);

    match session.state() {
        ResultState::Succeeded(_) => Ok(ExitCode::SUCCESS),
        _ => Ok(ExitCode::FAILURE),
    }
}

fn summary(result: &InvocationResult) -> String {
    let status = result
        .http_status
        .map_or_else(|| "-".to_string(), |s| s.to_string());
    let latency = result
        .latency_ms
        .map_or_else(|| "-".to_string(), |ms| format!("{ms} ms"));
    format!("{}: status {status}, latency {latency}", result.outcome)
}
