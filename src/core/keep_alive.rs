//! Liveness endpoint for free hosting tiers
//!
//! A tiny HTTP server answering an external uptime pinger, plus an optional
//! self-ping loop that keeps the host from idling the process.
//!
//! Endpoints:
//! - `/`        - static "alive" text
//! - `/health`  - JSON with status, uptime and version
//! - `/metrics` - Prometheus metrics in text format

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::Instant;

use crate::core::metrics;

/// Body returned by `GET /`
pub const ALIVE_TEXT: &str = "Music Bot is alive!";

#[derive(Clone)]
struct AppState {
    start_time: Instant,
}

/// Builds the router with all liveness routes
pub fn router() -> Router {
    let state = AppState {
        start_time: Instant::now(),
    };

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(Arc::new(state))
}

/// Binds `0.0.0.0:<port>` and serves the liveness routes until the process exits
pub async fn start_keep_alive_server(port: u16) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(&addr).await?;

    log::info!("🌐 Keep-alive server listening on http://{}", addr);
    log::info!("  /        - alive text");
    log::info!("  /health  - health check (JSON)");
    log::info!("  /metrics - Prometheus metrics");

    serve(listener).await
}

/// Serves the liveness routes on an already bound listener
pub async fn serve(listener: TcpListener) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    axum::serve(listener, router()).await?;
    Ok(())
}

/// Requests `url` every `every` so the host sees inbound traffic.
///
/// Failures are logged and the loop keeps going.
pub fn spawn_self_ping(url: String, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let client = match reqwest::Client::builder().timeout(Duration::from_secs(30)).build() {
            Ok(client) => client,
            Err(e) => {
                log::error!("Failed to build self-ping client: {}", e);
                return;
            }
        };

        let mut interval = tokio::time::interval(every);
        // First tick fires immediately; skip it so the server has time to start.
        interval.tick().await;

        loop {
            interval.tick().await;
            match client.get(&url).send().await {
                Ok(resp) => log::debug!("Self-ping {} -> {}", url, resp.status()),
                Err(e) => log::warn!("⚠️  Self-ping to {} failed: {}", url, e),
            }
        }
    })
}

async fn root_handler() -> &'static str {
    ALIVE_TEXT
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let uptime = state.start_time.elapsed();

    let health_status = serde_json::json!({
        "status": "healthy",
        "uptime_seconds": uptime.as_secs(),
        "uptime_human": format_uptime(uptime),
        "service": "melodora",
        "version": env!("CARGO_PKG_VERSION"),
    });

    (StatusCode::OK, axum::Json(health_status))
}

async fn metrics_handler() -> Response {
    match metrics::encode_text() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            log::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
                .into_response()
        }
    }
}

/// Format duration as human-readable string
pub fn format_uptime(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let days = total_secs / 86400;
    let hours = (total_secs % 86400) / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if days > 0 {
        format!("{}d {}h {}m {}s", days, hours, minutes, seconds)
    } else if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
