use tracing_subscriber::{prelude::*, EnvFilter};

/// Used when neither `--log-level` nor `RUST_LOG` is set. Operator facing output goes through
/// `virtmove_progress`, logs only show up when something goes wrong.
const DEFAULT_FILTER: &str = "warn";

/// Logs to stderr, so stdout only carries progress output.
pub(crate) fn init_tracing_registry(log_level: Option<&str>) {
    let env_filter = log_level
        .map(|log_level| EnvFilter::builder().parse_lossy(log_level))
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}
