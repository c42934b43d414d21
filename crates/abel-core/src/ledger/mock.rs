use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::CoreError;
use crate::types::AssetId;

use super::{AssetLedger, AssetParams};

/// An in-memory asset ledger for tests, populated via the builder pattern.
pub struct MockLedger {
    assets: HashMap<AssetId, AssetParams>,
    unavailable: bool,
}

impl MockLedger {
    pub fn builder() -> MockLedgerBuilder {
        MockLedgerBuilder {
            assets: HashMap::new(),
            unavailable: false,
        }
    }
}

pub struct MockLedgerBuilder {
    assets: HashMap<AssetId, AssetParams>,
    unavailable: bool,
}

impl MockLedgerBuilder {
    /// An asset with placeholder parameters derived from its id.
    pub fn with_asset(self, asset: AssetId) -> Self {
        let params = AssetParams {
            name: format!("Asset {asset}"),
            unit_name: format!("A{asset}"),
            decimals: 0,
            total: 1,
            has_freeze: false,
            has_clawback: false,
        };
        self.with_params(asset, params)
    }

    pub fn with_params(mut self, asset: AssetId, params: AssetParams) -> Self {
        self.assets.insert(asset, params);
        self
    }

    /// Every lookup fails with a ledger error.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn build(self) -> MockLedger {
        MockLedger {
            assets: self.assets,
            unavailable: self.unavailable,
        }
    }
}

#[async_trait]
impl AssetLedger for MockLedger {
    async fn asset_params(&self, asset: AssetId) -> Result<Option<AssetParams>, CoreError> {
        if self.unavailable {
            return Err(CoreError::Ledger("mock ledger unavailable".into()));
        }
        Ok(self.assets.get(&asset).cloned())
    }
}
