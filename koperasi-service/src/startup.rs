//! Application startup and lifecycle management.

use crate::config::KoperasiConfig;
use crate::handlers;
use crate::middleware::auth_middleware;
use crate::services::metrics::{ERRORS_TOTAL, HTTP_REQUESTS_TOTAL};
use crate::services::{init_metrics, Database, JwtService};
use axum::{
    extract::Request,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use koperasi_core::error::AppError;
use koperasi_core::middleware::tracing::request_id_middleware;
use secrecy::ExposeSecret;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<KoperasiConfig>,
    pub db: Arc<Database>,
    pub jwt: JwtService,
}

/// Count every request by path template and response status.
async fn track_metrics(req: Request, next: Next) -> impl IntoResponse {
    let path = req.uri().path().to_string();
    let response = next.run(req).await;
    let status = response.status();

    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&path, status.as_str()])
        .inc();
    if status.is_server_error() {
        ERRORS_TOTAL.with_label_values(&["http_5xx"]).inc();
    }

    response
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: KoperasiConfig) -> Result<Self, AppError> {
        Self::build_internal(config, true).await
    }

    /// Build the application without running migrations.
    /// Use this in tests when migrations are already applied by the test harness.
    pub async fn build_without_migrations(config: KoperasiConfig) -> Result<Self, AppError> {
        Self::build_internal(config, false).await
    }

    async fn build_internal(config: KoperasiConfig, run_migrations: bool) -> Result<Self, AppError> {
        init_metrics();

        let db = Database::new(
            config.database.url.expose_secret(),
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

        let jwt = JwtService::new(&config.auth);

        let host = config
            .server
            .host
            .parse()
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid KOPERASI_HOST: {}", e)))?;
        let addr = SocketAddr::new(host, config.server.port);

        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port = port, "Koperasi service listener bound");

        let state = AppState {
            config: Arc::new(config),
            db: Arc::new(db),
            jwt,
        };

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get a reference to the database.
    pub fn db(&self) -> &Database {
        &self.state.db
    }

    fn router(state: AppState) -> Router {
        // Everything behind the auth middleware carries typed claims.
        let api = Router::new()
            .route("/me", get(handlers::auth::me))
            .route("/me/member", get(handlers::auth::my_member))
            .route("/users", post(handlers::members::create_user))
            .route(
                "/members",
                get(handlers::members::list_members).post(handlers::members::create_member),
            )
            .route("/members/:id", get(handlers::members::get_member))
            .route(
                "/members/:id/deactivate",
                post(handlers::members::deactivate_member),
            )
            .route(
                "/items",
                get(handlers::items::list_items).post(handlers::items::create_item),
            )
            .route(
                "/items/:id",
                get(handlers::items::get_item).put(handlers::items::update_item),
            )
            .route(
                "/items/:id/deactivate",
                post(handlers::items::deactivate_item),
            )
            .route(
                "/sales",
                get(handlers::sales::list_sales).post(handlers::sales::post_sale),
            )
            .route("/sales/:id", get(handlers::sales::get_sale))
            .route("/sales/:id/settle", post(handlers::sales::settle_sale))
            .route("/sales/:id/cancel", post(handlers::sales::cancel_sale))
            .route(
                "/debt-payments",
                get(handlers::debt::list_debt_payments).post(handlers::debt::create_debt_payment),
            )
            .route(
                "/debt-payments/:id/approve",
                post(handlers::debt::approve_debt_payment),
            )
            .route(
                "/debt-payments/:id/reject",
                post(handlers::debt::reject_debt_payment),
            )
            .route(
                "/deposits",
                get(handlers::deposits::list_deposits).post(handlers::deposits::create_deposit),
            )
            .route(
                "/deposits/:id/approve",
                post(handlers::deposits::approve_deposit),
            )
            .route(
                "/opnames",
                get(handlers::opname::list_opnames).post(handlers::opname::create_opname),
            )
            .route(
                "/opnames/:id/approve",
                post(handlers::opname::approve_opname),
            )
            .route("/opnames/:id/reject", post(handlers::opname::reject_opname))
            .route(
                "/shu/distributions",
                get(handlers::shu::list_shu_distributions).post(handlers::shu::distribute_shu),
            )
            .route("/shu/topup", post(handlers::shu::shu_topup))
            .route("/reports/summary", get(handlers::reports::sales_summary))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            ));

        Router::new()
            .route("/health", get(handlers::health::health))
            .route("/ready", get(handlers::health::ready))
            .route("/metrics", get(handlers::health::metrics))
            .route("/auth/login", post(handlers::auth::login))
            .merge(api)
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn(track_metrics))
            .layer(middleware::from_fn(request_id_middleware))
            .with_state(state)
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = Self::router(self.state.clone());

        tracing::info!(
            service = "koperasi-service",
            version = env!("CARGO_PKG_VERSION"),
            port = self.port,
            "Service ready to accept connections"
        );

        axum::serve(self.listener, router).await.map_err(|e| {
            tracing::error!(error = %e, "HTTP server error");
            std::io::Error::other(format!("HTTP server error: {}", e))
        })
    }
}
