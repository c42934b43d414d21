//! Ordered per-key label sequences backing the operator and asset indexes.

use std::collections::HashMap;
use std::hash::Hash;

use crate::types::LabelId;

/// Maps a key (operator principal or asset) to the labels it holds, in
/// insertion order and without duplicates.
///
/// The index never touches label counters; [`super::Registry`] updates the
/// matching counter in the same call as every `push` / `remove`.
#[derive(Debug, Clone)]
pub struct RelationIndex<K> {
    entries: HashMap<K, Vec<LabelId>>,
}

impl<K> Default for RelationIndex<K> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> RelationIndex<K> {
    /// Labels held by `key`, empty when the key has none.
    pub fn labels_of(&self, key: &K) -> &[LabelId] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, key: &K, label: &LabelId) -> bool {
        self.labels_of(key).contains(label)
    }

    /// Number of keys holding at least one label.
    pub fn key_count(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &[LabelId])> {
        self.entries
            .iter()
            .map(|(key, labels)| (key, labels.as_slice()))
    }

    /// Append `label` to `key`'s sequence. Callers check `contains` first.
    pub(crate) fn push(&mut self, key: K, label: LabelId) {
        let labels = self.entries.entry(key).or_default();
        debug_assert!(!labels.contains(&label), "duplicate relation entry");
        labels.push(label);
    }

    /// Remove `label` from `key`'s sequence, keeping the order of the rest.
    /// Returns `false` when the relation did not hold.
    pub(crate) fn remove(&mut self, key: &K, label: &LabelId) -> bool {
        let Some(labels) = self.entries.get_mut(key) else {
            return false;
        };
        let Some(pos) = labels.iter().position(|held| held == label) else {
            return false;
        };
        labels.remove(pos);
        if labels.is_empty() {
            self.entries.remove(key);
        }
        true
    }
}
