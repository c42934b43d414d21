//! Shared test helpers for `abel-core` unit tests.
//!
//! Builders for principals, label ids and asset lists, plus a fixed
//! [`AssetOracle`] so that tests across modules share one source of truth
//! for dummy data.

use std::collections::HashSet;

use crate::ledger::AssetOracle;
use crate::types::{AssetId, LabelId, Principal};

pub fn principal(name: &str) -> Principal {
    Principal::parse(name).expect("test principal must be non-empty")
}

pub fn label(id: &str) -> LabelId {
    LabelId::parse(id).expect("test label id must have valid length")
}

pub fn assets(ids: &[u64]) -> Vec<AssetId> {
    ids.iter().copied().map(AssetId).collect()
}

/// An oracle that knows a fixed set of assets.
pub struct StaticOracle {
    existing: HashSet<AssetId>,
}

impl StaticOracle {
    pub fn with(ids: &[u64]) -> Self {
        Self {
            existing: ids.iter().copied().map(AssetId).collect(),
        }
    }
}

impl AssetOracle for StaticOracle {
    fn asset_exists(&self, asset: AssetId) -> bool {
        self.existing.contains(&asset)
    }
}
