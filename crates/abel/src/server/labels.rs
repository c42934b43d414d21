use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use abel_core::{LabelDescriptor, LabelId};

use super::auth::{check_auth, resolve_caller};
use super::error::{map_labeling_error, AppError};
use super::{CountResponse, SharedState};

// ==============================================================================
// DTOs
// ==============================================================================

#[derive(Serialize)]
pub(super) struct LabelResponse {
    id: LabelId,
    name: String,
    url: String,
    num_assets: u64,
    num_operators: u64,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct AddLabelRequest {
    id: String,
    name: String,
    url: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct ChangeLabelRequest {
    name: String,
    url: String,
}

// ==============================================================================
// Handlers
// ==============================================================================

pub(super) async fn list_labels(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<Vec<LabelResponse>>, AppError> {
    check_auth(&state.api_token, &headers)?;
    let registry = state.registry.read().await;
    Ok(Json(
        registry
            .list_labels()
            .map(|(id, descriptor)| label_to_response(id, descriptor))
            .collect(),
    ))
}

pub(super) async fn add_label(
    State(state): State<SharedState>,
    headers: HeaderMap,
    req: Result<Json<AddLabelRequest>, JsonRejection>,
) -> Result<Json<LabelResponse>, AppError> {
    let caller = resolve_caller(&state.api_token, &headers)?;
    let Json(req) = req.map_err(|e| AppError::BadRequest(e.to_string()))?;

    state
        .commit(|registry| {
            let id = registry.add_label(&caller, &req.id, req.name, req.url)?;
            let descriptor = registry.get_label(id.as_str())?;
            Ok(label_to_response(&id, descriptor))
        })
        .await
        .map(Json)
}

pub(super) async fn get_label(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<LabelResponse>, AppError> {
    check_auth(&state.api_token, &headers)?;
    let registry = state.registry.read().await;
    let descriptor = registry.get_label(&id).map_err(map_labeling_error)?;
    let id = LabelId::parse(&id).map_err(map_labeling_error)?;
    Ok(Json(label_to_response(&id, descriptor)))
}

pub(super) async fn change_label(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    req: Result<Json<ChangeLabelRequest>, JsonRejection>,
) -> Result<Json<LabelResponse>, AppError> {
    let caller = resolve_caller(&state.api_token, &headers)?;
    let Json(req) = req.map_err(|e| AppError::BadRequest(e.to_string()))?;

    state
        .commit(|registry| {
            registry.change_label(&caller, &id, req.name, req.url)?;
            let label = LabelId::parse(&id)?;
            let descriptor = registry.get_label(&id)?;
            Ok(label_to_response(&label, descriptor))
        })
        .await
        .map(Json)
}

pub(super) async fn remove_label(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let caller = resolve_caller(&state.api_token, &headers)?;
    state
        .commit(|registry| registry.remove_label(&caller, &id))
        .await?;

    Ok(Json(serde_json::json!({ "status": "deleted" })))
}

pub(super) async fn has_label(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<CountResponse>, AppError> {
    check_auth(&state.api_token, &headers)?;
    let registry = state.registry.read().await;
    let present = registry.has_label(&id).map_err(map_labeling_error)?;
    Ok(Json(CountResponse::from(present)))
}

// ==============================================================================
// Helpers
// ==============================================================================

fn label_to_response(id: &LabelId, descriptor: &LabelDescriptor) -> LabelResponse {
    LabelResponse {
        id: id.clone(),
        name: descriptor.name.clone(),
        url: descriptor.url.clone(),
        num_assets: descriptor.num_assets,
        num_operators: descriptor.num_operators,
    }
}
