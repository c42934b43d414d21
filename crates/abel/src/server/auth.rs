use axum::http::HeaderMap;

use abel_core::Principal;

use super::error::AppError;

pub(super) const API_TOKEN_HEADER: &str = "x-api-token";
/// Principal resolved by the upstream identity layer.
pub(super) const CALLER_HEADER: &str = "x-abel-caller";

pub(super) fn check_auth(expected_token: &str, headers: &HeaderMap) -> Result<(), AppError> {
    let token = headers
        .get(API_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if token != expected_token {
        return Err(AppError::Unauthorized(
            "invalid or missing X-API-Token".to_string(),
        ));
    }
    Ok(())
}

/// Check the API token and return the calling principal of a mutation.
pub(super) fn resolve_caller(
    expected_token: &str,
    headers: &HeaderMap,
) -> Result<Principal, AppError> {
    check_auth(expected_token, headers)?;
    headers
        .get(CALLER_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(Principal::parse)
        .ok_or_else(|| AppError::BadRequest("missing X-Abel-Caller header".to_string()))
}

pub(super) fn parse_principal(raw: &str) -> Result<Principal, AppError> {
    Principal::parse(raw).ok_or_else(|| AppError::BadRequest("principal must not be empty".into()))
}
