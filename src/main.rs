//! MySQL Admin Server - Main entry point.
//!
//! Serves the JSON API for a browser-based MySQL admin tool. Database
//! credentials come from user logins at runtime, so no connection
//! configuration is needed at startup.

use mysql_admin_server::config::Config;
use mysql_admin_server::session::SessionStore;
use mysql_admin_server::transport::HttpServer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse_args();
    init_tracing(&config);

    info!(
        host = %config.http_host,
        port = config.http_port,
        "Starting MySQL Admin Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let sessions = SessionStore::new();
    let server = HttpServer::new(&config, sessions);

    if let Err(e) = server.run().await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
