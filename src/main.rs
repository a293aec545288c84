use std::sync::Arc;

use clap::Parser;
use tracing::info;

use pollbox::cli::{Cli, Command};
use pollbox::config::ServerConfig;
use pollbox::polls::PollStore;
use pollbox::{logging, server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Start {
        host: None,
        port: None,
    }) {
        Command::Start { host, port } => start(host, port).await,
        Command::Version => {
            println!(
                "pollbox {} ({}, built {})",
                env!("CARGO_PKG_VERSION"),
                env!("POLLBOX_GIT_HASH"),
                env!("POLLBOX_BUILD_DATE")
            );
            Ok(())
        }
    }
}

async fn start(
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let mut config = ServerConfig::from_env();
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    let store = Arc::new(PollStore::new());
    let app = server::router(store);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!(addr = %listener.local_addr()?, "pollbox listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("pollbox stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for ctrl-c");
    }
}
