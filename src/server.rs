// ABOUTME: HTTP server assembly for the support relay
// ABOUTME: Builds the axum router with CORS and tracing layers and serves it with graceful shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{CorsConfig, ServerConfig};
use crate::errors::{AppError, AppResult};
use crate::middleware::{create_request_span, setup_cors};
use crate::relay::AssistantRelay;
use crate::routes::{ChatRoutes, HealthRoutes};

/// Build the complete router
#[must_use]
pub fn build_router(relay: Arc<AssistantRelay>, cors: &CorsConfig) -> Router {
    Router::new()
        .merge(ChatRoutes::routes(relay))
        .merge(HealthRoutes::routes())
        .layer(
            TraceLayer::new_for_http().make_span_with(create_request_span::<axum::body::Body>),
        )
        .layer(setup_cors(cors))
}

/// Relay HTTP server
pub struct RelayServer {
    config: ServerConfig,
    relay: Arc<AssistantRelay>,
}

impl RelayServer {
    /// Create a server for a configured relay
    #[must_use]
    pub fn new(config: ServerConfig, relay: Arc<AssistantRelay>) -> Self {
        Self { config, relay }
    }

    /// Bind and serve until Ctrl-C or SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot bind or the server fails
    pub async fn run(self) -> AppResult<()> {
        let address = format!("{}:{}", self.config.host, self.config.http_port);
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|e| AppError::internal(format!("Failed to bind {address}: {e}")))?;

        let router = build_router(self.relay, &self.config.cors);
        info!("Support relay listening on http://{address}");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

        info!("Support relay stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}
