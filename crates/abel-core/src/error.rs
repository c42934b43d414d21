use crate::auth::Action;
use crate::types::{AssetId, LabelId, Principal};

/// Ambient failures outside the labeling state machine: ledger transport,
/// snapshot decoding, filesystem.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("asset ledger failure: {0}")]
    Ledger(String),

    #[error("snapshot JSON error: {0}")]
    SnapshotJson(#[from] serde_json::Error),

    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The record or relation an `AlreadyExists` / `NotFound` error refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    Label(LabelId),
    Operator {
        operator: Principal,
        label: LabelId,
    },
    AssetLabel {
        asset: AssetId,
        label: LabelId,
    },
    Asset(AssetId),
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Label(label) => write!(f, "label {label}"),
            Self::Operator { operator, label } => {
                write!(f, "operator {operator} of label {label}")
            }
            Self::AssetLabel { asset, label } => write!(f, "label {label} on asset {asset}"),
            Self::Asset(asset) => write!(f, "asset {asset}"),
        }
    }
}

/// Errors raised by registry operations. Every error leaves the registry
/// unchanged.
#[derive(Debug, thiserror::Error)]
pub enum LabelingError {
    #[error("{caller} is not authorized to {action}")]
    Unauthorized { caller: Principal, action: Action },

    #[error("{0} already exists")]
    AlreadyExists(Subject),

    #[error("{0} not found")]
    NotFound(Subject),

    #[error("label id `{id}` must be exactly {expected} bytes, got {actual}")]
    InvalidIdentifierLength {
        id: String,
        expected: usize,
        actual: usize,
    },

    #[error("label {label} still has {operators} operator(s) and {assets} asset(s) attached")]
    NotEmpty {
        label: LabelId,
        operators: u64,
        assets: u64,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}
