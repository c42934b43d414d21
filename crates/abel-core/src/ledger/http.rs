//! Asset ledger client for algod-compatible REST endpoints.
//!
//! Looks assets up with `GET {base}/v2/assets/{id}`: a success status means
//! the asset exists, `404` means it does not (never created or destroyed).
//! The success body carries the asset parameters.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, trace};

use crate::error::CoreError;
use crate::types::AssetId;

use super::{AssetLedger, AssetParams};

const API_TOKEN_HEADER: &str = "X-Algo-API-Token";

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

pub struct HttpLedgerClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    limiter: Option<DirectRateLimiter>,
    max_concurrency: usize,
}

impl HttpLedgerClient {
    /// Create a client for an `http://` or `https://` node URL.
    ///
    /// If `requests_per_second` is set, every outbound lookup waits for the
    /// rate limiter. Batched lookups keep at most `max_concurrency` requests
    /// in flight.
    pub fn new(
        base_url: &str,
        token: Option<&str>,
        requests_per_second: Option<u32>,
        max_concurrency: usize,
    ) -> Result<Self, CoreError> {
        if max_concurrency == 0 {
            return Err(CoreError::Ledger(
                "ledger concurrency must be at least 1".to_owned(),
            ));
        }
        let base_url = parse_base_url(base_url)?;

        let limiter = match requests_per_second {
            None => None,
            Some(limit) => {
                let limit = NonZeroU32::new(limit).ok_or_else(|| {
                    CoreError::Ledger("requests_per_second must be at least 1".to_owned())
                })?;
                Some(RateLimiter::direct(Quota::per_second(limit)))
            }
        };

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(max_concurrency)
            .build()
            .map_err(|e| CoreError::Ledger(format!("build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            token: token.map(str::to_owned),
            limiter,
            max_concurrency,
        })
    }

    fn asset_url(&self, asset: AssetId) -> String {
        format!("{}/v2/assets/{asset}", self.base_url)
    }

    /// Check the node's `/health` endpoint.
    pub async fn check_health(&self) -> Result<(), CoreError> {
        let url = format!("{}/health", self.base_url);
        let mut builder = self.client.get(&url);
        if let Some(token) = &self.token {
            builder = builder.header(API_TOKEN_HEADER, token);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| CoreError::Ledger(format!("request {url}: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::Ledger(format!("{url} returned {status}")));
        }
        Ok(())
    }

    async fn fetch_asset(&self, asset: AssetId) -> Result<(StatusCode, String), CoreError> {
        self.wait_for_rate_limit().await;
        let url = self.asset_url(asset);
        debug!(%asset, %url, "ledger asset lookup");

        let mut builder = self.client.get(&url);
        if let Some(token) = &self.token {
            builder = builder.header(API_TOKEN_HEADER, token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| CoreError::Ledger(format!("request asset {asset}: {e}")))?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        trace!(%asset, %status, body = %body, "ledger asset response");
        Ok((status, body))
    }

    async fn wait_for_rate_limit(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}

#[async_trait]
impl AssetLedger for HttpLedgerClient {
    async fn asset_params(&self, asset: AssetId) -> Result<Option<AssetParams>, CoreError> {
        let (status, body) = self.fetch_asset(asset).await?;
        parse_asset_params(asset, status, &body)
    }

    async fn asset_exists(&self, asset: AssetId) -> Result<bool, CoreError> {
        let (status, body) = self.fetch_asset(asset).await?;
        classify_lookup(asset, status, &body)
    }

    async fn assets_exist(&self, assets: &[AssetId]) -> Result<Vec<bool>, CoreError> {
        if assets.is_empty() {
            return Ok(Vec::new());
        }
        // `buffered` keeps answers in request order.
        futures::stream::iter(assets.iter().copied())
            .map(|asset| self.asset_exists(asset))
            .buffered(self.max_concurrency)
            .try_collect()
            .await
    }

    async fn assets_params(
        &self,
        assets: &[AssetId],
    ) -> Result<Vec<Option<AssetParams>>, CoreError> {
        if assets.is_empty() {
            return Ok(Vec::new());
        }
        futures::stream::iter(assets.iter().copied())
            .map(|asset| self.asset_params(asset))
            .buffered(self.max_concurrency)
            .try_collect()
            .await
    }
}

// ==============================================================================
// Response Decoding
// ==============================================================================

#[derive(Deserialize)]
struct AlgodAsset {
    params: AlgodAssetParams,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct AlgodAssetParams {
    #[serde(default)]
    name: String,
    #[serde(default)]
    unit_name: String,
    decimals: u32,
    total: u64,
    #[serde(default)]
    freeze: Option<String>,
    #[serde(default)]
    clawback: Option<String>,
}

impl From<AlgodAssetParams> for AssetParams {
    fn from(raw: AlgodAssetParams) -> Self {
        Self {
            name: raw.name,
            unit_name: raw.unit_name,
            decimals: raw.decimals,
            total: raw.total,
            has_freeze: raw.freeze.is_some_and(|addr| !addr.is_empty()),
            has_clawback: raw.clawback.is_some_and(|addr| !addr.is_empty()),
        }
    }
}

fn parse_asset_params(
    asset: AssetId,
    status: StatusCode,
    body: &str,
) -> Result<Option<AssetParams>, CoreError> {
    if !classify_lookup(asset, status, body)? {
        return Ok(None);
    }
    let decoded: AlgodAsset = serde_json::from_str(body)
        .map_err(|e| CoreError::Ledger(format!("decode asset {asset}: {e}")))?;
    Ok(Some(decoded.params.into()))
}

fn parse_base_url(raw: &str) -> Result<String, CoreError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| CoreError::Ledger(format!("invalid ledger URL `{raw}`: {e}")))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(CoreError::Ledger(format!(
                "unsupported ledger URL scheme `{other}`; expected http or https"
            )))
        }
    }
    Ok(url.as_str().trim_end_matches('/').to_owned())
}

fn classify_lookup(asset: AssetId, status: StatusCode, body: &str) -> Result<bool, CoreError> {
    if status.is_success() {
        return Ok(true);
    }
    if status == StatusCode::NOT_FOUND {
        return Ok(false);
    }
    Err(CoreError::Ledger(format!(
        "asset {asset} lookup returned {status}: {}",
        body.trim()
    )))
}
