use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use abel_core::ledger::{resolve_assets, AssetLedger, AssetParams};
use abel_core::{AssetId, LabelId, Principal};

use super::auth::{check_auth, resolve_caller};
use super::error::{map_core_error, map_labeling_error, AppError};
use super::{AppState, CountResponse, SharedState};

/// Largest batch accepted by the multi-asset routes. Each asset in a labeling
/// batch costs one ledger lookup.
pub(super) const HARD_MAX_BATCH: usize = 1_000;
pub(super) const BATCH_BODY_LIMIT: usize = 256 * 1024;

// ==============================================================================
// DTOs
// ==============================================================================

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct AddAssetLabelRequest {
    label: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct BatchLabelRequest {
    assets: Vec<AssetId>,
    label: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct LookupRequest {
    assets: Vec<AssetId>,
}

/// Smallest asset view: enough to format an amount.
#[derive(Serialize)]
pub(super) struct AssetMicro {
    id: AssetId,
    unit_name: String,
    decimals: u32,
}

/// Asset view with display names, supply, control flags and labels.
#[derive(Serialize)]
pub(super) struct AssetSmall {
    id: AssetId,
    name: String,
    unit_name: String,
    decimals: u32,
    total: u64,
    has_freeze: bool,
    has_clawback: bool,
    labels: Vec<LabelId>,
}

// ==============================================================================
// Handlers
// ==============================================================================

pub(super) async fn get_asset_labels(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(asset): Path<String>,
) -> Result<Json<Vec<LabelId>>, AppError> {
    check_auth(&state.api_token, &headers)?;
    let asset = parse_asset(&asset)?;
    let registry = state.registry.read().await;
    Ok(Json(registry.get_asset_labels(asset).to_vec()))
}

pub(super) async fn add_label_to_asset(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(asset): Path<String>,
    req: Result<Json<AddAssetLabelRequest>, JsonRejection>,
) -> Result<Json<Vec<LabelId>>, AppError> {
    let caller = resolve_caller(&state.api_token, &headers)?;
    let Json(req) = req.map_err(|e| AppError::BadRequest(e.to_string()))?;
    let asset = parse_asset(&asset)?;

    // Ledger lookups happen before the write lock is taken, and only for
    // callers allowed to label with `req.label`.
    check_labeling(&state, &caller, &req.label).await?;
    let oracle = resolve_assets(state.ledger.as_ref(), &[asset])
        .await
        .map_err(map_core_error)?;

    state
        .commit(|registry| {
            registry.add_label_to_asset(&caller, &oracle, asset, &req.label)?;
            Ok(registry.get_asset_labels(asset).to_vec())
        })
        .await
        .map(Json)
}

pub(super) async fn add_label_to_assets(
    State(state): State<SharedState>,
    headers: HeaderMap,
    req: Result<Json<BatchLabelRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let caller = resolve_caller(&state.api_token, &headers)?;
    let Json(req) = req.map_err(|e| AppError::BadRequest(e.to_string()))?;
    check_batch_len(req.assets.len())?;

    check_labeling(&state, &caller, &req.label).await?;
    let oracle = resolve_assets(state.ledger.as_ref(), &req.assets)
        .await
        .map_err(map_core_error)?;

    state
        .commit(|registry| registry.add_label_to_assets(&caller, &oracle, &req.assets, &req.label))
        .await?;

    Ok(Json(serde_json::json!({
        "label": req.label,
        "labeled": req.assets.len(),
    })))
}

pub(super) async fn has_asset_label(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path((asset, label)): Path<(String, String)>,
) -> Result<Json<CountResponse>, AppError> {
    check_auth(&state.api_token, &headers)?;
    let asset = parse_asset(&asset)?;
    let registry = state.registry.read().await;
    let present = registry
        .has_asset_label(asset, &label)
        .map_err(map_labeling_error)?;
    Ok(Json(CountResponse::from(present)))
}

pub(super) async fn remove_label_from_asset(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path((asset, label)): Path<(String, String)>,
) -> Result<Json<Vec<LabelId>>, AppError> {
    let caller = resolve_caller(&state.api_token, &headers)?;
    let asset = parse_asset(&asset)?;

    state
        .commit(|registry| {
            registry.remove_label_from_asset(&caller, asset, &label)?;
            Ok(registry.get_asset_labels(asset).to_vec())
        })
        .await
        .map(Json)
}

/// Label sequences for each requested asset, in request order.
pub(super) async fn lookup_assets(
    State(state): State<SharedState>,
    headers: HeaderMap,
    req: Result<Json<LookupRequest>, JsonRejection>,
) -> Result<Json<Vec<Vec<LabelId>>>, AppError> {
    check_auth(&state.api_token, &headers)?;
    let Json(req) = req.map_err(|e| AppError::BadRequest(e.to_string()))?;
    check_batch_len(req.assets.len())?;

    let registry = state.registry.read().await;
    Ok(Json(
        registry
            .get_assets_labels(&req.assets)
            .into_iter()
            .map(<[LabelId]>::to_vec)
            .collect(),
    ))
}

/// Micro views in request order. Assets unknown to the ledger are `null`.
pub(super) async fn micro_views(
    State(state): State<SharedState>,
    headers: HeaderMap,
    req: Result<Json<LookupRequest>, JsonRejection>,
) -> Result<Json<Vec<Option<AssetMicro>>>, AppError> {
    check_auth(&state.api_token, &headers)?;
    let Json(req) = req.map_err(|e| AppError::BadRequest(e.to_string()))?;
    check_batch_len(req.assets.len())?;

    let params = fetch_params(&state, &req.assets).await?;
    Ok(Json(
        req.assets
            .iter()
            .zip(params)
            .map(|(&id, params)| {
                params.map(|p| AssetMicro {
                    id,
                    unit_name: p.unit_name,
                    decimals: p.decimals,
                })
            })
            .collect(),
    ))
}

/// Small views in request order. Assets unknown to the ledger are `null`.
pub(super) async fn small_views(
    State(state): State<SharedState>,
    headers: HeaderMap,
    req: Result<Json<LookupRequest>, JsonRejection>,
) -> Result<Json<Vec<Option<AssetSmall>>>, AppError> {
    check_auth(&state.api_token, &headers)?;
    let Json(req) = req.map_err(|e| AppError::BadRequest(e.to_string()))?;
    check_batch_len(req.assets.len())?;

    let params = fetch_params(&state, &req.assets).await?;
    let registry = state.registry.read().await;
    Ok(Json(
        req.assets
            .iter()
            .zip(params)
            .map(|(&id, params)| {
                params.map(|p| AssetSmall {
                    id,
                    name: p.name,
                    unit_name: p.unit_name,
                    decimals: p.decimals,
                    total: p.total,
                    has_freeze: p.has_freeze,
                    has_clawback: p.has_clawback,
                    labels: registry.get_asset_labels(id).to_vec(),
                })
            })
            .collect(),
    ))
}

// ==============================================================================
// Helpers
// ==============================================================================

async fn fetch_params(
    state: &AppState,
    assets: &[AssetId],
) -> Result<Vec<Option<AssetParams>>, AppError> {
    let params = state
        .ledger
        .assets_params(assets)
        .await
        .map_err(map_core_error)?;
    if params.len() != assets.len() {
        return Err(AppError::BadGateway(format!(
            "ledger answered {} of {} asset lookups",
            params.len(),
            assets.len()
        )));
    }
    Ok(params)
}

/// Length, authorization and label existence under the read lock. The same
/// checks run again inside the committed mutation.
async fn check_labeling(state: &AppState, caller: &Principal, label: &str) -> Result<(), AppError> {
    let registry = state.registry.read().await;
    registry
        .check_asset_labeling(caller, label)
        .map(drop)
        .map_err(map_labeling_error)
}

fn parse_asset(raw: &str) -> Result<AssetId, AppError> {
    raw.parse::<u64>()
        .map(AssetId)
        .map_err(|_| AppError::BadRequest(format!("invalid asset id `{raw}`")))
}

fn check_batch_len(len: usize) -> Result<(), AppError> {
    if len > HARD_MAX_BATCH {
        return Err(AppError::BadRequest(format!(
            "batch of {len} assets exceeds the limit of {HARD_MAX_BATCH}"
        )));
    }
    Ok(())
}
