use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

mod config;
mod db;
mod error;
mod handlers;
mod models;
mod seed;
mod services;

use crate::config::Config;
use crate::db::{InMemoryStore, PgStore, Store};
use crate::services::{CatalogService, ReturnRequestService};

/// Shared application state, cheap to clone (services hold their stores behind Arc).
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub returns: ReturnRequestService,
    pub catalog: CatalogService,
}

impl AppState {
    pub fn new<S>(store: Arc<S>) -> Self
    where
        S: Store + 'static,
    {
        Self {
            returns: ReturnRequestService::with_ledger(store.clone()),
            catalog: CatalogService::new(store.clone()),
            store,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (ignored in production where env vars are injected)
    dotenv::dotenv().ok();

    // Structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,return_service=debug")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;

    let state = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to PostgreSQL...");
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(database_url)
                .await?;
            info!("Database connection pool established.");

            info!("Running migrations...");
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Migrations complete.");

            AppState::new(Arc::new(PgStore::new(pool)))
        }
        None => {
            warn!("DATABASE_URL not set, using the in-memory store (data is lost on restart)");
            AppState::new(Arc::new(InMemoryStore::new()))
        }
    };

    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Listening on http://{}", addr);
    info!("Quick-start: POST http://{}/api/seed?count=20  →  then POST http://{}/api/returns", addr, addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        // ── Health ──────────────────────────────────────────────────────────
        .route("/health", get(handlers::health))

        // ── Return requests ─────────────────────────────────────────────────
        .route(
            "/api/returns",
            get(handlers::returns::list_return_requests)
                .post(handlers::returns::open_return_request),
        )
        .route("/api/returns/:id", get(handlers::returns::get_return_request))
        .route(
            "/api/returns/:id/serial-number",
            put(handlers::returns::update_serial_number),
        )
        .route(
            "/api/returns/:id/technical-review",
            post(handlers::returns::technical_review),
        )
        .route(
            "/api/returns/:id/close",
            post(handlers::returns::close_return_request),
        )
        .route(
            "/api/users/:user_id/returns",
            get(handlers::returns::list_user_return_requests),
        )

        // ── Catalog ─────────────────────────────────────────────────────────
        .route(
            "/api/products",
            get(handlers::catalog::list_products).post(handlers::catalog::create_product),
        )
        .route("/api/products/:id", put(handlers::catalog::update_product))
        .route(
            "/api/products/:id/items",
            get(handlers::catalog::list_items).post(handlers::catalog::create_item),
        )
        .route(
            "/api/products/:id/policies",
            get(handlers::catalog::list_policies).post(handlers::catalog::create_policy),
        )
        .route(
            "/api/items/:serial_number/status",
            put(handlers::catalog::update_item_status),
        )

        // ── Seed ────────────────────────────────────────────────────────────
        .route("/api/seed", post(handlers::seed::seed_data))

        // ── Middleware ──────────────────────────────────────────────────────
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
