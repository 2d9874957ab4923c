use tracing_subscriber::EnvFilter;

use layergraph_core::config::LogConfig;

/// Install the global `fmt` subscriber.
///
/// `RUST_LOG` wins over `config.filter`. Returns `false` when a global
/// subscriber was already installed.
pub fn init(config: &LogConfig) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter)),
        )
        .with_target(false)
        .try_init()
        .is_ok()
}
