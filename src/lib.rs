pub mod api; // HTTP client + error decoding
pub mod assets; // drugs.json / metrics.json generators
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod models;
pub mod render;
pub mod session;

#[cfg(test)]
mod testing;

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
///
/// Logs go to stderr so command output on stdout stays clean.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("{} v{}", config::APP_NAME, config::APP_VERSION);
}
