use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use abel_core::Principal;

use super::auth::{check_auth, parse_principal, resolve_caller};
use super::error::AppError;
use super::SharedState;

#[derive(Serialize)]
pub(super) struct AdminResponse {
    admin: Principal,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct ChangeAdminRequest {
    new_admin: String,
}

pub(super) async fn get_admin(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<AdminResponse>, AppError> {
    check_auth(&state.api_token, &headers)?;
    let registry = state.registry.read().await;
    Ok(Json(AdminResponse {
        admin: registry.admin().clone(),
    }))
}

pub(super) async fn change_admin(
    State(state): State<SharedState>,
    headers: HeaderMap,
    req: Result<Json<ChangeAdminRequest>, JsonRejection>,
) -> Result<Json<AdminResponse>, AppError> {
    let caller = resolve_caller(&state.api_token, &headers)?;
    let Json(req) = req.map_err(|e| AppError::BadRequest(e.to_string()))?;
    let new_admin = parse_principal(&req.new_admin)?;

    state
        .commit(|registry| registry.change_admin(&caller, new_admin.clone()))
        .await?;
    Ok(Json(AdminResponse { admin: new_admin }))
}
