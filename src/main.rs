//! TourHub Notifier, the notification delivery engine of the tourism site
//!
//! Main entry point: loads configuration, initializes logging and hands
//! over to the API crate, which wires the engine and serves HTTP.

use tracing_subscriber::{EnvFilter, fmt};

use tourhub_core::config::AppConfig;
use tourhub_core::config::logging::LoggingConfig;

#[tokio::main]
async fn main() {
    let env = std::env::var("TOURHUB_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.logging);

    tracing::info!(
        "Starting TourHub Notifier v{} (env: {})",
        env!("CARGO_PKG_VERSION"),
        env
    );

    if let Err(e) = tourhub_api::run_server(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging; `RUST_LOG` overrides the configured level.
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}
