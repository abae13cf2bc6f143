pub mod api;
pub mod config;
pub mod create;
pub mod events;
pub mod factory;
pub mod market;

use tracing_subscriber::EnvFilter;

/// Log to stderr. `RUST_LOG` wins over the configured level.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
