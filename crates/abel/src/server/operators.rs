use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use abel_core::LabelId;

use super::auth::{check_auth, parse_principal, resolve_caller};
use super::error::{map_labeling_error, AppError};
use super::{CountResponse, SharedState};

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct AddOperatorRequest {
    label: String,
}

/// Labels `operator` may act on, in the order they were granted.
pub(super) async fn get_operator_labels(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(operator): Path<String>,
) -> Result<Json<Vec<LabelId>>, AppError> {
    check_auth(&state.api_token, &headers)?;
    let operator = parse_principal(&operator)?;
    let registry = state.registry.read().await;
    Ok(Json(registry.get_operator_labels(&operator).to_vec()))
}

pub(super) async fn add_operator_to_label(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(operator): Path<String>,
    req: Result<Json<AddOperatorRequest>, JsonRejection>,
) -> Result<Json<Vec<LabelId>>, AppError> {
    let caller = resolve_caller(&state.api_token, &headers)?;
    let Json(req) = req.map_err(|e| AppError::BadRequest(e.to_string()))?;
    let operator = parse_principal(&operator)?;

    state
        .commit(|registry| {
            registry.add_operator_to_label(&caller, operator.clone(), &req.label)?;
            Ok(registry.get_operator_labels(&operator).to_vec())
        })
        .await
        .map(Json)
}

pub(super) async fn has_operator_label(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path((operator, label)): Path<(String, String)>,
) -> Result<Json<CountResponse>, AppError> {
    check_auth(&state.api_token, &headers)?;
    let operator = parse_principal(&operator)?;
    let registry = state.registry.read().await;
    let present = registry
        .has_operator_label(&operator, &label)
        .map_err(map_labeling_error)?;
    Ok(Json(CountResponse::from(present)))
}

pub(super) async fn remove_operator_from_label(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path((operator, label)): Path<(String, String)>,
) -> Result<Json<Vec<LabelId>>, AppError> {
    let caller = resolve_caller(&state.api_token, &headers)?;
    let operator = parse_principal(&operator)?;

    state
        .commit(|registry| {
            registry.remove_operator_from_label(&caller, &operator, &label)?;
            Ok(registry.get_operator_labels(&operator).to_vec())
        })
        .await
        .map(Json)
}
