//! Label records and their reference counters.

use std::collections::BTreeMap;

use crate::error::{LabelingError, Subject};
use crate::types::{LabelDescriptor, LabelId};

/// Live labels keyed by id, iterated in id order.
#[derive(Debug, Clone, Default)]
pub struct LabelRegistry {
    labels: BTreeMap<LabelId, LabelDescriptor>,
}

impl LabelRegistry {
    pub fn get(&self, id: &LabelId) -> Result<&LabelDescriptor, LabelingError> {
        self.labels
            .get(id)
            .ok_or_else(|| LabelingError::NotFound(Subject::Label(id.clone())))
    }

    pub fn contains(&self, id: &LabelId) -> bool {
        self.labels.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LabelId, &LabelDescriptor)> {
        self.labels.iter()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    pub(crate) fn insert(
        &mut self,
        id: LabelId,
        descriptor: LabelDescriptor,
    ) -> Result<(), LabelingError> {
        if self.labels.contains_key(&id) {
            return Err(LabelingError::AlreadyExists(Subject::Label(id)));
        }
        self.labels.insert(id, descriptor);
        Ok(())
    }

    pub(crate) fn update_meta(
        &mut self,
        id: &LabelId,
        name: String,
        url: String,
    ) -> Result<(), LabelingError> {
        let record = self.get_mut(id)?;
        record.name = name;
        record.url = url;
        Ok(())
    }

    /// Delete an unreferenced label.
    pub(crate) fn remove(&mut self, id: &LabelId) -> Result<LabelDescriptor, LabelingError> {
        let record = self.get(id)?;
        if !record.is_empty() {
            return Err(LabelingError::NotEmpty {
                label: id.clone(),
                operators: record.num_operators,
                assets: record.num_assets,
            });
        }
        self.labels
            .remove(id)
            .ok_or_else(|| LabelingError::NotFound(Subject::Label(id.clone())))
    }

    // ========================================================================
    // Reference counters
    // ========================================================================

    pub(crate) fn retain_operator(&mut self, id: &LabelId) -> Result<(), LabelingError> {
        self.get_mut(id)?.num_operators += 1;
        Ok(())
    }

    pub(crate) fn release_operator(&mut self, id: &LabelId) -> Result<(), LabelingError> {
        let record = self.get_mut(id)?;
        debug_assert!(record.num_operators > 0, "operator counter underflow");
        record.num_operators = record.num_operators.saturating_sub(1);
        Ok(())
    }

    pub(crate) fn retain_assets(&mut self, id: &LabelId, count: u64) -> Result<(), LabelingError> {
        self.get_mut(id)?.num_assets += count;
        Ok(())
    }

    pub(crate) fn release_asset(&mut self, id: &LabelId) -> Result<(), LabelingError> {
        let record = self.get_mut(id)?;
        debug_assert!(record.num_assets > 0, "asset counter underflow");
        record.num_assets = record.num_assets.saturating_sub(1);
        Ok(())
    }

    fn get_mut(&mut self, id: &LabelId) -> Result<&mut LabelDescriptor, LabelingError> {
        self.labels
            .get_mut(id)
            .ok_or_else(|| LabelingError::NotFound(Subject::Label(id.clone())))
    }
}
