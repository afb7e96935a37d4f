use std::sync::Arc;

use tracing::error;

use txledger::config::{load_config, print_schema, DEFAULT_CONFIG_PATH};
use txledger::startup;
use txledger::utils::logger::init_logging;

#[tokio::main]
async fn main() {
    if std::env::args().skip(1).any(|arg| arg == "--print-schema") {
        if let Err(e) = print_schema() {
            eprintln!("Error printing configuration schema: {}", e);
            std::process::exit(1);
        }
        return;
    }

    let config_path =
        std::env::var("TXLEDGER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = match load_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Error initializing logging: {}", e);
        std::process::exit(1);
    }

    // Without its store the service cannot do anything useful, so every
    // startup failure ends the process.
    if let Err(e) = startup::run(Arc::new(config)).await {
        error!("Fatal startup error: {}", e);
        std::process::exit(1);
    }
}
