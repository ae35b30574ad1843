//! HTTP surface of the ledger.
//!
//! A thin axum layer over [`AccountingService`]: request parsing and schema
//! validation happen here, business rules stay in the application layer.
//! CORS allows all origins, methods and headers.

mod routes;

use anyhow::{Context, Result};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::signal::unix::{SignalKind, signal};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::application::{AccountingService, AppError};
use crate::config::Config;

pub use routes::*;

/// Build the application router over the given service.
pub fn router(service: AccountingService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(home_handler))
        .route("/points/{user_id}", get(points_handler))
        .route("/add_points", post(add_points_handler))
        .route("/referral", post(referral_handler))
        .layer(cors)
        .with_state(service)
}

/// Bind and serve until ctrl-c or SIGTERM.
pub async fn serve(config: &Config, service: AccountingService) -> Result<()> {
    let app = router(service);

    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::StoreUnavailable(err) = &self {
            error!("Store failure: {err}");
        }

        let status = match self {
            // Self-referral keeps the 200-with-error-body shape of the
            // public contract; clients match on the `error` field.
            AppError::SelfReferral => StatusCode::OK,
            AppError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
