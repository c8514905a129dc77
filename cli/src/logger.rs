//! Logging setup for the `flaky` binary.
//!
//! Logs go to stderr through a non-blocking writer; stdout carries only the
//! URL or result the user asked for.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. Keep the returned guard alive until exit
/// so buffered lines are flushed.
pub fn init() -> tracing_appender::non_blocking::WorkerGuard {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("flaky=info,flaky_core=info"));

    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(writer))
        .with(filter)
        .init();

    guard
}
