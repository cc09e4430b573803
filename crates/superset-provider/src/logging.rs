// Logging setup
//
// The engine captures the plugin's stderr, so logs go there through a
// `tracing_subscriber::fmt` subscriber. `RUST_LOG` wins over verbosity.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::TryInitError;

fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn env_filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)))
}

/// Install the global subscriber. Panics if one is already set; use
/// [`try_init_logging`] where that can happen.
pub fn init_logging(verbosity: u8) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbosity))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Like [`init_logging`], but reports an existing subscriber as an error.
pub fn try_init_logging(verbosity: u8) -> Result<(), TryInitError> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(env_filter(verbosity))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()
}

/// JSON lines instead of human-readable output, for engines that parse
/// plugin logs.
pub fn try_init_json_logging(verbosity: u8) -> Result<(), TryInitError> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(env_filter(verbosity))
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .try_init()
}
