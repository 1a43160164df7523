//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router with all registry handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Serve with graceful shutdown

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::chain::TransactionVerifier;
use crate::config::RegistryConfig;
use crate::http::handlers;
use crate::http::request::request_id_middleware;
use crate::ledger::PaymentLedger;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<PaymentLedger>,
    pub verifier: Arc<dyn TransactionVerifier>,
    pub config: Arc<RegistryConfig>,
}

/// Build the registry router over the given state.
pub fn build_router(state: AppState) -> Router {
    let request_timeout = Duration::from_secs(state.config.listener.request_timeout_secs);
    Router::new()
        .route("/", get(handlers::health))
        .route("/packages", get(handlers::list_packages).post(handlers::upsert_rule))
        .route("/packages/{name}/rules", get(handlers::get_rules))
        .route("/packages/{name}/donations", get(handlers::get_donations))
        .route("/payments/status", get(handlers::payment_status))
        .route("/payments/mark-paid", post(handlers::mark_paid))
        .route("/payments/verify", post(handlers::verify_payment))
        .route("/stats", get(handlers::get_stats))
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}

/// HTTP server for the registry API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server over shared services.
    pub fn new(state: AppState) -> Self {
        Self {
            router: build_router(state),
        }
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Registry API listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Registry API stopped");
        Ok(())
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
