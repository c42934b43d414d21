//! The asset labeling registry.
//!
//! [`Registry`] owns the admin principal, the label records with their
//! reference counters, and two ordered relation indexes (operator → labels,
//! asset → labels). [`SnapshotFile`] persists it as JSON.

mod labels;
mod relation;
mod snapshot;
mod store;

pub use labels::LabelRegistry;
pub use relation::RelationIndex;
pub use snapshot::{AssetEntry, OperatorEntry, RegistrySnapshot, SnapshotFile};
pub use store::{AssetIndex, OperatorIndex, Registry};
