//! HTTP front door for phone shortcuts and automations.

pub mod response;
pub mod routes;
pub mod state;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::header;
use tailcode_shared::config::Config;
use tokio::net::TcpListener;
use tower_http::{sensitive_headers::SetSensitiveHeadersLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::notify::Notifier;
use crate::ssh::SshTransport;
use crate::tailscale::TailscaleCli;
use crate::util::shutdown::SHUTDOWN;
use crate::wol::UdpBroadcaster;
use state::AppState;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8765;

pub async fn serve(config: Config, host: &str, port: u16, token: Option<String>) -> Result<()> {
    let notifier = Notifier::from_config(&config.notifications)?;
    let broadcaster = UdpBroadcaster::new(config.wol.broadcast.clone(), config.wol.port);
    let transport = SshTransport::from_config(&config.ssh);

    if token.is_none() {
        warn!("TAILCODE_TOKEN is not set, webhook POST routes are unauthenticated");
    }

    let state = AppState {
        config: Arc::new(config),
        token,
        liveness: Arc::new(TailscaleCli),
        transport: Arc::new(transport),
        broadcaster: Arc::new(broadcaster),
        notifier: Arc::new(notifier),
    };

    let app = routes::build_router(state)
        .layer(SetSensitiveHeadersLayer::new(std::iter::once(
            header::AUTHORIZATION,
        )))
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind webhook server on {host}:{port}"))?;
    info!("Webhook server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async { SHUTDOWN.cancelled().await })
        .await
        .context("Webhook server failed")?;

    info!("Webhook server stopped");
    Ok(())
}
