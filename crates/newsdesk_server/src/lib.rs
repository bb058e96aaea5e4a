//! HTTP surface for the newsdesk article store.
//!
//! # Responsibility
//! - Map `/news` routes onto `newsdesk_core` service operations.
//! - Own process-level wiring: configuration, shared state, serving.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::ApiError;
pub use routes::router;
pub use state::AppState;

use std::future::Future;
use tokio::net::TcpListener;

/// Serves the article API on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
