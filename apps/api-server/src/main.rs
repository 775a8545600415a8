//! api-server — HTTP API for the point-of-sale item catalog.
//!
//! Serves the catalog over JSON and supports local dev with:
//! - Storage: In-memory or SQLite (file) when the `sqlite` feature is enabled (default).
//! - Seeding: optional JSON file of items created at startup (`SEED_PATH`).
//! - CORS: Configurable via CORS_ALLOW_ORIGIN (origin string) for the cashier frontend.
//!
//! Run:
//! ```bash
//! # pretty logs (default); PORT optional
//! cargo run -p api-server
//!
//! # throwaway in-memory catalog seeded from a file
//! STORAGE_PROVIDER=memory SEED_PATH=./seed/items.json cargo run -p api-server
//! ```
//!
//! Configuration: See `config.rs` for all environment variables.

mod config;
mod dto;
mod seed;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use domain::adapters::memory_store::InMemoryCatalogStore;
use domain::{CatalogError, CatalogService, CatalogStore, ItemId};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dto::{ItemIn, ItemOut};

type Catalog = CatalogService<Arc<dyn CatalogStore>>;

#[derive(Clone)]
struct AppState {
    catalog: Arc<Catalog>,
}

impl AppState {
    fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self {
            catalog: Arc::new(CatalogService::new(store)),
        }
    }
}

#[tokio::main]
async fn main() {
    // Load and validate config first (fail fast on misconfiguration)
    let cfg = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&cfg);
    cfg.warn_if_ephemeral();

    let store = match build_store(&cfg) {
        Ok(s) => s,
        Err(e) => {
            error!(err = %e, "failed to open catalog store");
            std::process::exit(1);
        }
    };
    let state = AppState::new(store);

    if let Some(path) = &cfg.seed_path {
        match seed::seed_from_file(&*state.catalog, path.as_path()) {
            Ok(report) => info!(
                path = %path.display(),
                created = report.created,
                skipped = report.skipped,
                "catalog seeded"
            ),
            Err(e) => {
                error!(err = %e, "seeding failed");
                std::process::exit(1);
            }
        }
    }

    // Request ID header name
    let x_request_id = axum::http::HeaderName::from_static("x-request-id");

    let mut app = router(state)
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid));

    // CORS - already validated in Config::from_env()
    let cors = if cfg.cors_allow_origin == HeaderValue::from_static("*") {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list([cfg.cors_allow_origin.clone()]))
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([axum::http::header::CONTENT_TYPE])
    };
    app = app.layer(cors);

    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(%addr, err = %e, "failed to bind");
            std::process::exit(1);
        }
    };
    info!(%addr, "api-server listening");
    if let Err(e) = axum::serve(listener, app).await {
        error!(err = %e, "server error");
        std::process::exit(1);
    }
}

fn init_tracing(cfg: &config::Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    match cfg.log_format {
        config::LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(fmt::time::SystemTime)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
        config::LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
    }
}

// Construct the store selected by config and feature flags.
fn build_store(cfg: &config::Config) -> Result<Arc<dyn CatalogStore>, CatalogError> {
    match cfg.storage_provider {
        #[cfg(feature = "sqlite")]
        config::StorageProvider::Sqlite => {
            info!(db_path = %cfg.db_path.display(), "using sqlite catalog store");
            let store = sqlite_adapter::SqliteCatalogStore::open_creating_dir(&cfg.db_path)?;
            Ok(Arc::new(store))
        }
        _ => {
            info!("using in-memory catalog store");
            Ok(Arc::new(InMemoryCatalogStore::new()))
        }
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/items", get(list_items).post(create_item))
        .route(
            "/api/items/:id",
            get(get_item).put(update_item).delete(delete_item),
        )
        .with_state(state)
}

/// Map a catalog error to a JSON error response, logging server-side failures.
fn error_response(op: &'static str, err: &CatalogError) -> Response {
    match err {
        CatalogError::NotFound => (
            StatusCode::NOT_FOUND,
            Json(http_common::json_err("not_found")),
        )
            .into_response(),
        CatalogError::AlreadyExists => {
            warn!(op, "conflict");
            (StatusCode::CONFLICT, Json(http_common::json_err("conflict"))).into_response()
        }
        CatalogError::Invalid(msg) => {
            warn!(op, reason = %msg, "rejected");
            (
                StatusCode::BAD_REQUEST,
                Json(http_common::json_error_with_message("invalid_request", msg)),
            )
                .into_response()
        }
        CatalogError::StorageUnavailable(_) => {
            error!(op, err = ?err, "storage error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(http_common::json_err("storage_unavailable")),
            )
                .into_response()
        }
    }
}

async fn list_items(State(state): State<AppState>) -> impl IntoResponse {
    match state.catalog.list() {
        Ok(items) => {
            info!(count = items.len(), "list items ok");
            let out: Vec<ItemOut> = items.into_iter().map(ItemOut::from).collect();
            (StatusCode::OK, Json(out)).into_response()
        }
        Err(e) => error_response("list_items", &e),
    }
}

async fn get_item(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let id = match ItemId::new(id) {
        Ok(id) => id,
        Err(e) => return error_response("get_item", &e),
    };
    match state.catalog.get(&id) {
        Ok(Some(item)) => (StatusCode::OK, Json(ItemOut::from(item))).into_response(),
        Ok(None) => {
            warn!(item_id = %id, "item 404");
            error_response("get_item", &CatalogError::NotFound)
        }
        Err(e) => error_response("get_item", &e),
    }
}

async fn create_item(State(state): State<AppState>, Json(body): Json<ItemIn>) -> impl IntoResponse {
    let new_item = match body.into_new_item() {
        Ok(i) => i,
        Err(e) => return error_response("create_item", &e),
    };
    match state.catalog.create(new_item) {
        Ok(item) => {
            info!(item_id = %item.id, "item created");
            (StatusCode::CREATED, Json(ItemOut::from(item))).into_response()
        }
        Err(e) => error_response("create_item", &e),
    }
}

async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ItemIn>,
) -> impl IntoResponse {
    if body.id != id {
        return error_response(
            "update_item",
            &CatalogError::Invalid("id in body does not match path".into()),
        );
    }
    let new_item = match body.into_new_item() {
        Ok(i) => i,
        Err(e) => return error_response("update_item", &e),
    };
    match state.catalog.update(new_item) {
        Ok(item) => {
            info!(item_id = %item.id, "item updated");
            (StatusCode::OK, Json(ItemOut::from(item))).into_response()
        }
        Err(e) => error_response("update_item", &e),
    }
}

async fn delete_item(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let id = match ItemId::new(id) {
        Ok(id) => id,
        Err(e) => return error_response("delete_item", &e),
    };
    match state.catalog.delete(&id) {
        Ok(()) => {
            info!(item_id = %id, "item deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => error_response("delete_item", &e),
    }
}
