use std::sync::Arc;

use metricotron::config::{load_config, print_schema};
use metricotron::startup;
use metricotron::utils::logger::init_logging;
use tracing::error;

#[tokio::main]
async fn main() {
    if std::env::args().any(|arg| arg == "--schema") {
        print_schema();
        return;
    }

    let config = Arc::new(load_config());
    init_logging(&config.logging);

    if let Err(e) = startup::run(config).await {
        error!("Server failed to start: {}", e);
        std::process::exit(1);
    }
}
