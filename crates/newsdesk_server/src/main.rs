//! newsdesk server entry point.

use clap::Parser;
use log::{error, info};
use newsdesk_core::db::open_db;
use newsdesk_server::{serve, AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    config.init_logging().map_err(anyhow::Error::msg)?;

    let conn = open_db(&config.db_path)?;
    let state = AppState::new(conn);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!(
        "event=server_start module=server status=ok bind={} db_path={}",
        listener.local_addr()?,
        config.db_path.display()
    );

    serve(listener, state, shutdown_signal()).await?;
    info!("event=server_stop module=server status=ok");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(
            "event=server_signal module=server status=error error_code=signal_install_failed error={}",
            err
        );
        std::future::pending::<()>().await;
    }
}
