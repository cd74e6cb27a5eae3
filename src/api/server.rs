//! HTTP server setup and routing
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | GET  | `/health` | health check |
//! | GET  | `/api/lessons` | lesson list with annotated counts |
//! | GET  | `/api/lesson/:lesson_id` | lesson view |
//! | POST | `/api/annotation/:lesson_id/:segment_id` | save annotation |
//! | GET  | `/api/annotations` | full store snapshot |
//! | GET  | `/api/export` | export join |

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::handlers;
use crate::core::AnnotatorContext;

/// Build the router with all routes attached to `ctx`
pub fn build_router(ctx: AnnotatorContext) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/lessons", get(handlers::list_lessons))
        .route("/api/lesson/:lesson_id", get(handlers::get_lesson))
        .route(
            "/api/annotation/:lesson_id/:segment_id",
            post(handlers::save_annotation),
        )
        .route("/api/annotations", get(handlers::get_all_annotations))
        .route("/api/export", get(handlers::export_annotations))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        // The review UI may be served from a different origin
        .layer(CorsLayer::permissive())
}

/// Serve the API on `address` until the process is stopped
pub async fn run(ctx: AnnotatorContext, address: &str) -> Result<()> {
    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind to {}", address))?;

    info!(
        "Serving {} lessons with {} store on http://{}",
        ctx.catalog().len(),
        ctx.store().name(),
        listener.local_addr().context("Failed to read bound address")?
    );

    axum::serve(listener, build_router(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!("Unable to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await
        }
    }
}
