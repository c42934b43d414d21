//! Asset existence and parameter lookups.
//!
//! The registry consults a synchronous [`AssetOracle`] while it holds the
//! write lock. Hosts resolve one up front from an asynchronous
//! [`AssetLedger`] via [`resolve_assets`], covering exactly the assets the
//! call declares. [`AssetParams`] feed the read-only asset views.

mod http;
#[cfg(test)]
pub mod mock;

pub use http::HttpLedgerClient;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::AssetId;

/// Answers whether an asset currently exists on the resource ledger.
///
/// "Does not exist" and "cannot be checked" are both `false`.
pub trait AssetOracle {
    fn asset_exists(&self, asset: AssetId) -> bool;
}

/// Existence answers resolved ahead of a registry call. Assets that were not
/// resolved are reported as absent.
#[derive(Debug, Clone, Default)]
pub struct ResolvedAssets {
    known: HashMap<AssetId, bool>,
}

impl ResolvedAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, asset: AssetId, exists: bool) {
        self.known.insert(asset, exists);
    }
}

impl FromIterator<(AssetId, bool)> for ResolvedAssets {
    fn from_iter<I: IntoIterator<Item = (AssetId, bool)>>(iter: I) -> Self {
        Self {
            known: iter.into_iter().collect(),
        }
    }
}

impl AssetOracle for ResolvedAssets {
    fn asset_exists(&self, asset: AssetId) -> bool {
        self.known.get(&asset).copied().unwrap_or(false)
    }
}

/// Display parameters of a ledger asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetParams {
    pub name: String,
    pub unit_name: String,
    pub decimals: u32,
    pub total: u64,
    pub has_freeze: bool,
    pub has_clawback: bool,
}

/// Remote view of the asset ledger.
#[async_trait]
pub trait AssetLedger: Send + Sync {
    /// Parameters of `asset`, or `None` if it does not exist.
    async fn asset_params(&self, asset: AssetId) -> Result<Option<AssetParams>, CoreError>;

    /// Whether `asset` exists right now. Transport failures are errors, not
    /// `false`, so callers can distinguish an outage from a deleted asset.
    async fn asset_exists(&self, asset: AssetId) -> Result<bool, CoreError> {
        Ok(self.asset_params(asset).await?.is_some())
    }

    /// Look up parameters of many assets, answers in request order.
    async fn assets_params(
        &self,
        assets: &[AssetId],
    ) -> Result<Vec<Option<AssetParams>>, CoreError> {
        let mut results = Vec::with_capacity(assets.len());
        for asset in assets {
            results.push(self.asset_params(*asset).await?);
        }
        Ok(results)
    }

    /// Look up many assets. Implementations may issue requests concurrently.
    async fn assets_exist(&self, assets: &[AssetId]) -> Result<Vec<bool>, CoreError> {
        let mut results = Vec::with_capacity(assets.len());
        for asset in assets {
            results.push(self.asset_exists(*asset).await?);
        }
        Ok(results)
    }
}

/// Resolve the existence of every asset a call will touch.
pub async fn resolve_assets(
    ledger: &dyn AssetLedger,
    assets: &[AssetId],
) -> Result<ResolvedAssets, CoreError> {
    let answers = ledger.assets_exist(assets).await?;
    if answers.len() != assets.len() {
        return Err(CoreError::Ledger(format!(
            "ledger answered {} of {} asset lookups",
            answers.len(),
            assets.len()
        )));
    }
    Ok(assets.iter().copied().zip(answers).collect())
}
