//! # HTTP Front-ends
//!
//! Two axum applications over the same [`Container`](crate::connector::api::Container):
//! - `rest`: JSON API with explicit, token-addressed sessions and SSE streaming
//! - `web`: browser backend whose session is bound to a `session_id` cookie

mod error;
mod state;

pub mod rest;
pub mod web;

pub use error::ApiError;
pub use state::AppState;

use std::net::SocketAddr;

use anyhow::Result;
use tracing::info;

/// Bind `addr` and serve `app` until the process is stopped.
pub async fn serve(app: axum::Router, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
