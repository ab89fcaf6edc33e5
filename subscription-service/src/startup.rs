//! Application startup and lifecycle management.

use crate::config::SubscriptionConfig;
use crate::handlers;
use crate::services::{init_metrics, Database};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::metrics::metrics_middleware;
use service_core::middleware::tracing::{make_request_span, request_id_middleware};
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: SubscriptionConfig,
    pub db: Arc<Database>,
}

/// Build the HTTP router over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_handler))
        .route(
            "/subscription",
            post(handlers::create_subscription).put(handlers::update_subscription),
        )
        .route("/subscription/all", get(handlers::list_subscriptions))
        .route("/subscription/invoice", post(handlers::subscriptions_invoice))
        .route(
            "/subscription/:id",
            get(handlers::get_subscription).delete(handlers::delete_subscription),
        )
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<axum::body::Body>))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    address: SocketAddr,
    listener: TcpListener,
    shutdown_grace: Duration,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: SubscriptionConfig) -> Result<Self, AppError> {
        Self::build_internal(config, true).await
    }

    /// Build the application without running migrations.
    /// Use this in tests when migrations are already applied by the test harness.
    pub async fn build_without_migrations(config: SubscriptionConfig) -> Result<Self, AppError> {
        Self::build_internal(config, false).await
    }

    async fn build_internal(
        config: SubscriptionConfig,
        run_migrations: bool,
    ) -> Result<Self, AppError> {
        init_metrics();

        let db = Database::new(
            config.database.connect_options(),
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            e
        })?;

        if run_migrations {
            db.run_migrations().await.map_err(|e| {
                tracing::error!(error = %e, "Failed to run migrations");
                e
            })?;
        }

        let listener = TcpListener::bind(&config.common.server_url)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, addr = %config.common.server_url, "Failed to bind HTTP listener");
                AppError::from(e)
            })?;
        let address = listener.local_addr()?;

        tracing::info!(address = %address, "Subscription service listener bound");

        Ok(Self {
            address,
            listener,
            shutdown_grace: config.shutdown_grace,
            state: AppState {
                config,
                db: Arc::new(db),
            },
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn port(&self) -> u16 {
        self.address.port()
    }

    /// Get a reference to the database.
    pub fn db(&self) -> &Database {
        &self.state.db
    }

    /// Run the application until the process is killed.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.run_with_graceful_shutdown(std::future::pending()).await
    }

    /// Serve until `signal` resolves, then stop accepting connections and give
    /// in-flight requests the configured grace period before closing the pool.
    pub async fn run_with_graceful_shutdown<F>(self, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Self {
            address,
            listener,
            shutdown_grace,
            state,
        } = self;

        let db = state.db.clone();
        let token = CancellationToken::new();

        let server = axum::serve(listener, router(state))
            .with_graceful_shutdown({
                let token = token.clone();
                async move { token.cancelled().await }
            })
            .into_future();

        let deadline = async {
            signal.await;
            tracing::info!(grace_seconds = shutdown_grace.as_secs(), "Draining in-flight requests");
            token.cancel();
            tokio::time::sleep(shutdown_grace).await;
        };

        tracing::info!(
            service = "subscription-service",
            version = env!("CARGO_PKG_VERSION"),
            address = %address,
            "Service ready to accept connections"
        );

        let outcome = tokio::select! {
            result = server => result.map_err(|e| {
                tracing::error!(error = %e, "HTTP server error");
                std::io::Error::other(format!("HTTP server error: {}", e))
            }),
            _ = deadline => {
                tracing::warn!("Grace period elapsed, dropping remaining connections");
                Ok(())
            }
        };

        db.close().await;
        outcome
    }
}
