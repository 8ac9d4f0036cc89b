//! HTTP/JSON API over the account service.

mod dto;
mod handlers;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::application::AccountService;

pub use dto::*;
pub use handlers::AppState;

/// Build the `/api/accounts` router.
pub fn router(service: AccountService) -> Router {
    let account_routes = Router::new()
        .route("/", get(handlers::list_accounts).post(handlers::create_account))
        .route("/transfer", post(handlers::transfer))
        .route(
            "/:id",
            get(handlers::get_account).delete(handlers::delete_account),
        )
        .route("/:id/deposit", put(handlers::deposit))
        .route("/:id/withdraw", put(handlers::withdraw))
        .route("/:id/transactions", get(handlers::list_transactions));

    Router::new()
        .nest("/api/accounts", account_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(service))
}

/// Serve the API until Ctrl-C.
pub async fn serve(service: AccountService, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}
