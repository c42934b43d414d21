//! Domain types for Abel's labeling model.
//!
//! Contains the identifier newtypes (`LabelId`, `Principal`, `AssetId`) and
//! the label descriptor returned by read accessors.

use serde::{Deserialize, Serialize};

use crate::error::LabelingError;

// ==============================================================================
// Label Identifier
// ==============================================================================

/// Required byte length of every label identifier.
pub const LABEL_ID_LEN: usize = 2;

/// A fixed-length label identifier (exactly [`LABEL_ID_LEN`] bytes).
///
/// The only way to build one from untrusted input is [`LabelId::parse`], so
/// holding a `LabelId` means the length guard has already passed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelId(String);

impl LabelId {
    pub fn parse(raw: &str) -> Result<Self, LabelingError> {
        if raw.len() != LABEL_ID_LEN {
            return Err(LabelingError::InvalidIdentifierLength {
                id: raw.to_string(),
                expected: LABEL_ID_LEN,
                actual: raw.len(),
            });
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `false` only for values that bypassed [`LabelId::parse`], e.g. a
    /// hand-edited snapshot file.
    pub(crate) fn has_valid_len(&self) -> bool {
        self.0.len() == LABEL_ID_LEN
    }
}

impl std::fmt::Display for LabelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ==============================================================================
// Principal
// ==============================================================================

/// A resolved caller or operator identity (an account address).
///
/// Authentication happens upstream; the registry only compares principals
/// for equality. Always non-blank and free of surrounding whitespace,
/// including when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal(String);

impl Principal {
    /// Returns `None` for empty or whitespace-only input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Principal {
    type Error = String;

    /// Strict form of [`Principal::parse`]: padded input is rejected rather
    /// than trimmed.
    fn try_from(raw: String) -> Result<Self, Self::Error> {
        match Self::parse(&raw) {
            Some(principal) if principal.0 == raw => Ok(principal),
            Some(_) => Err(format!("principal `{raw}` has surrounding whitespace")),
            None => Err("principal must not be blank".to_string()),
        }
    }
}

impl From<Principal> for String {
    fn from(principal: Principal) -> Self {
        principal.0
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ==============================================================================
// Asset Identifier
// ==============================================================================

/// A ledger asset index.
///
/// `#[serde(transparent)]` keeps the JSON representation a bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub u64);

impl From<u64> for AssetId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<AssetId> for u64 {
    fn from(id: AssetId) -> Self {
        id.0
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// ==============================================================================
// Label Descriptor
// ==============================================================================

/// Metadata and reference counters of a live label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDescriptor {
    pub name: String,
    pub url: String,
    pub num_assets: u64,
    pub num_operators: u64,
}

impl LabelDescriptor {
    pub fn new(name: String, url: String) -> Self {
        Self {
            name,
            url,
            num_assets: 0,
            num_operators: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.num_assets == 0 && self.num_operators == 0
    }
}
