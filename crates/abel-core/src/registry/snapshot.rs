//! JSON snapshots of a whole [`Registry`] and their on-disk file.
//!
//! Loading re-checks every registry invariant, so a hand-edited or truncated
//! file is refused instead of producing a registry with drifted counters.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{CoreError, LabelingError};
use crate::types::{AssetId, LabelDescriptor, LabelId, Principal};

use super::labels::LabelRegistry;
use super::store::{AssetIndex, OperatorIndex, Registry};

// ==============================================================================
// Snapshot Types
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub admin: Principal,
    pub labels: BTreeMap<LabelId, LabelDescriptor>,
    #[serde(default)]
    pub operators: Vec<OperatorEntry>,
    #[serde(default)]
    pub assets: Vec<AssetEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorEntry {
    pub operator: Principal,
    pub labels: Vec<LabelId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEntry {
    pub asset: AssetId,
    pub labels: Vec<LabelId>,
}

#[derive(Default)]
struct RefCounts {
    operators: u64,
    assets: u64,
}

impl Registry {
    /// Capture the registry with entries sorted by key, so equal registries
    /// produce identical files.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let mut operators: Vec<OperatorEntry> = self
            .operators
            .iter()
            .map(|(operator, labels)| OperatorEntry {
                operator: operator.clone(),
                labels: labels.to_vec(),
            })
            .collect();
        operators.sort_by(|a, b| a.operator.cmp(&b.operator));

        let mut assets: Vec<AssetEntry> = self
            .assets
            .iter()
            .map(|(asset, labels)| AssetEntry {
                asset: *asset,
                labels: labels.to_vec(),
            })
            .collect();
        assets.sort_by_key(|entry| entry.asset);

        RegistrySnapshot {
            admin: self.admin.clone(),
            labels: self
                .labels
                .iter()
                .map(|(id, descriptor)| (id.clone(), descriptor.clone()))
                .collect(),
            operators,
            assets,
        }
    }

    /// Rebuild a registry, refusing snapshots that break an invariant.
    pub fn from_snapshot(snapshot: RegistrySnapshot) -> Result<Self, CoreError> {
        let mut labels = LabelRegistry::default();
        let mut counts: HashMap<LabelId, RefCounts> = HashMap::new();
        for (id, descriptor) in snapshot.labels {
            if !id.has_valid_len() {
                return Err(corrupt(format!("label id `{id}` has invalid length")));
            }
            counts.insert(id.clone(), RefCounts::default());
            labels.insert(id, descriptor).map_err(|e| corrupt(e.to_string()))?;
        }

        let mut operators = OperatorIndex::default();
        let mut seen_operators = HashSet::new();
        for entry in snapshot.operators {
            if !seen_operators.insert(entry.operator.clone()) {
                return Err(corrupt(format!("operator {} listed twice", entry.operator)));
            }
            for label in entry.labels {
                let count = counts.get_mut(&label).ok_or_else(|| {
                    corrupt(format!("operator {} references unknown label {label}", entry.operator))
                })?;
                if operators.contains(&entry.operator, &label) {
                    return Err(corrupt(format!(
                        "operator {} holds label {label} twice",
                        entry.operator
                    )));
                }
                count.operators += 1;
                operators.push(entry.operator.clone(), label);
            }
        }

        let mut assets = AssetIndex::default();
        let mut seen_assets = HashSet::new();
        for entry in snapshot.assets {
            if !seen_assets.insert(entry.asset) {
                return Err(corrupt(format!("asset {} listed twice", entry.asset)));
            }
            for label in entry.labels {
                let count = counts.get_mut(&label).ok_or_else(|| {
                    corrupt(format!("asset {} references unknown label {label}", entry.asset))
                })?;
                if assets.contains(&entry.asset, &label) {
                    return Err(corrupt(format!(
                        "asset {} holds label {label} twice",
                        entry.asset
                    )));
                }
                count.assets += 1;
                assets.push(entry.asset, label);
            }
        }

        for (id, descriptor) in labels.iter() {
            let count = counts.get(id).map_or((0, 0), |c| (c.operators, c.assets));
            if (descriptor.num_operators, descriptor.num_assets) != count {
                return Err(corrupt(format!(
                    "label {id} counters ({} operators, {} assets) disagree with indexes ({} operators, {} assets)",
                    descriptor.num_operators, descriptor.num_assets, count.0, count.1
                )));
            }
        }

        Ok(Self {
            admin: snapshot.admin,
            labels,
            operators,
            assets,
        })
    }
}

fn corrupt(message: String) -> CoreError {
    CoreError::CorruptSnapshot(message)
}

// ==============================================================================
// Snapshot File
// ==============================================================================

/// A registry snapshot persisted as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the registry, or `None` when the file does not exist yet.
    pub fn load(&self) -> Result<Option<Registry>, CoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(CoreError::Io(err)),
        };
        let snapshot: RegistrySnapshot = serde_json::from_str(&content)?;
        Registry::from_snapshot(snapshot).map(Some)
    }

    /// Write via a temporary sibling file renamed into place, so readers
    /// never observe a partial snapshot.
    pub fn save(&self, registry: &Registry) -> Result<(), CoreError> {
        let dir = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        let bytes = serde_json::to_vec_pretty(&registry.snapshot())?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| CoreError::Io(e.error))?;
        Ok(())
    }

    /// Apply `op` to a staged copy, persist it, then swap it in. On any
    /// error both `registry` and the file keep their previous state.
    pub fn commit<T>(
        &self,
        registry: &mut Registry,
        op: impl FnOnce(&mut Registry) -> Result<T, LabelingError>,
    ) -> Result<T, LabelingError> {
        let mut staged = registry.clone();
        let out = op(&mut staged)?;
        self.save(&staged)?;
        *registry = staged;
        Ok(out)
    }
}
