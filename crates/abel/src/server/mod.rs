mod admin;
mod assets;
mod auth;
mod error;
mod labels;
mod operators;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{any, get, post};
use axum::{Json, Router};
use serde::Serialize;
use tokio::sync::RwLock;
use tower_http::cors::{AllowOrigin, CorsLayer};

use abel_core::ledger::AssetLedger;
use abel_core::registry::SnapshotFile;
use abel_core::{LabelingError, Registry};

use self::error::{map_labeling_error, AppError};

// ==============================================================================
// Application State
// ==============================================================================

pub struct AppState {
    pub registry: Arc<RwLock<Registry>>,
    pub ledger: Arc<dyn AssetLedger>,
    /// `None` keeps the registry in memory only.
    pub snapshot: Option<SnapshotFile>,
    pub api_token: String,
}

type SharedState = Arc<AppState>;

impl AppState {
    /// Run one registry mutation under the write lock, persisting the result
    /// before it becomes visible when a snapshot file is configured.
    async fn commit<T>(
        &self,
        op: impl FnOnce(&mut Registry) -> Result<T, LabelingError>,
    ) -> Result<T, AppError> {
        let mut registry = self.registry.write().await;
        let result = match &self.snapshot {
            Some(file) => file.commit(&mut *registry, op),
            None => op(&mut *registry),
        };
        result.map_err(map_labeling_error)
    }
}

/// Membership answer of the `has_*` routes.
#[derive(Serialize)]
pub(super) struct CountResponse {
    count: u8,
}

impl From<bool> for CountResponse {
    fn from(present: bool) -> Self {
        Self {
            count: u8::from(present),
        }
    }
}

// ==============================================================================
// Router
// ==============================================================================

pub fn build_router(state: AppState, origin: &str) -> eyre::Result<Router> {
    // Only reflect the allowed origin when the request's Origin header
    // actually matches.
    let allowed: axum::http::HeaderValue = origin
        .parse()
        .map_err(|_| eyre::eyre!("invalid CORS origin `{origin}`"))?;
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate({
            let allowed = allowed.clone();
            move |request_origin: &axum::http::HeaderValue, _| *request_origin == allowed
        }))
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::HeaderName::from_static(auth::API_TOKEN_HEADER),
            axum::http::header::HeaderName::from_static(auth::CALLER_HEADER),
        ]);

    let shared = Arc::new(state);

    let public_api = Router::new().route("/api/v1/health", get(health));

    let batch_routes = Router::new()
        .route("/api/v1/assets/labels", post(assets::add_label_to_assets))
        .route("/api/v1/assets/lookup", post(assets::lookup_assets))
        .route("/api/v1/assets/micro", post(assets::micro_views))
        .route("/api/v1/assets/small", post(assets::small_views))
        .layer(DefaultBodyLimit::max(assets::BATCH_BODY_LIMIT));

    let protected_api = Router::new()
        .route(
            "/api/v1/admin",
            get(admin::get_admin).post(admin::change_admin),
        )
        .route(
            "/api/v1/labels",
            get(labels::list_labels).post(labels::add_label),
        )
        .route(
            "/api/v1/labels/{id}",
            get(labels::get_label)
                .put(labels::change_label)
                .delete(labels::remove_label),
        )
        .route("/api/v1/labels/{id}/exists", get(labels::has_label))
        .route(
            "/api/v1/operators/{operator}/labels",
            get(operators::get_operator_labels).post(operators::add_operator_to_label),
        )
        .route(
            "/api/v1/operators/{operator}/labels/{label}",
            get(operators::has_operator_label).delete(operators::remove_operator_from_label),
        )
        .route(
            "/api/v1/assets/{asset}/labels",
            get(assets::get_asset_labels).post(assets::add_label_to_asset),
        )
        .route(
            "/api/v1/assets/{asset}/labels/{label}",
            get(assets::has_asset_label).delete(assets::remove_label_from_asset),
        )
        .merge(batch_routes);

    Ok(Router::new()
        .merge(public_api)
        .merge(protected_api)
        .route("/api", any(api_not_found))
        .route("/api/{*path}", any(api_not_found))
        .layer(cors)
        .with_state(shared))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn api_not_found() -> AppError {
    AppError::NotFound("API route not found".to_string())
}
