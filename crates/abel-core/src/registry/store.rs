//! The labeling state machine.
//!
//! Owns the admin principal, the label registry, and the operator and asset
//! indexes. Every mutation validates the label id, resolves authorization,
//! checks its preconditions, and only then writes, updating the relation and
//! the label's counter in the same call. A returned error means nothing was
//! written.

use std::collections::HashSet;

use tracing::info;

use crate::auth::{self, Action, AuthView, Target};
use crate::error::{LabelingError, Subject};
use crate::ledger::AssetOracle;
use crate::types::{AssetId, LabelDescriptor, LabelId, Principal};

use super::labels::LabelRegistry;
use super::relation::RelationIndex;

pub type OperatorIndex = RelationIndex<Principal>;
pub type AssetIndex = RelationIndex<AssetId>;

#[derive(Debug, Clone)]
pub struct Registry {
    pub(super) admin: Principal,
    pub(super) labels: LabelRegistry,
    pub(super) operators: OperatorIndex,
    pub(super) assets: AssetIndex,
}

impl Registry {
    /// A fresh registry administered by the deploying principal.
    pub fn new(admin: Principal) -> Self {
        Self {
            admin,
            labels: LabelRegistry::default(),
            operators: OperatorIndex::default(),
            assets: AssetIndex::default(),
        }
    }

    fn authorize(
        &self,
        caller: &Principal,
        action: Action,
        target: Target<'_>,
    ) -> Result<(), LabelingError> {
        let view = AuthView {
            admin: &self.admin,
            operators: &self.operators,
        };
        auth::authorize(view, caller, action, target)
    }

    // ========================================================================
    // Admin
    // ========================================================================

    pub fn admin(&self) -> &Principal {
        &self.admin
    }

    pub fn change_admin(
        &mut self,
        caller: &Principal,
        new_admin: Principal,
    ) -> Result<(), LabelingError> {
        self.authorize(caller, Action::ChangeAdmin, Target::none())?;
        info!(old = %self.admin, new = %new_admin, "admin changed");
        self.admin = new_admin;
        Ok(())
    }

    // ========================================================================
    // Labels
    // ========================================================================

    pub fn add_label(
        &mut self,
        caller: &Principal,
        id: &str,
        name: String,
        url: String,
    ) -> Result<LabelId, LabelingError> {
        let id = LabelId::parse(id)?;
        self.authorize(caller, Action::AddLabel, Target::label(&id))?;
        self.labels
            .insert(id.clone(), LabelDescriptor::new(name, url))?;
        info!(label = %id, "label added");
        Ok(id)
    }

    pub fn change_label(
        &mut self,
        caller: &Principal,
        id: &str,
        name: String,
        url: String,
    ) -> Result<(), LabelingError> {
        let id = LabelId::parse(id)?;
        self.authorize(caller, Action::ChangeLabel, Target::label(&id))?;
        self.labels.update_meta(&id, name, url)?;
        info!(label = %id, "label changed");
        Ok(())
    }

    /// Remove a label with no operators and no assets attached.
    pub fn remove_label(&mut self, caller: &Principal, id: &str) -> Result<(), LabelingError> {
        let id = LabelId::parse(id)?;
        self.authorize(caller, Action::RemoveLabel, Target::label(&id))?;
        self.labels.remove(&id)?;
        info!(label = %id, "label removed");
        Ok(())
    }

    pub fn get_label(&self, id: &str) -> Result<&LabelDescriptor, LabelingError> {
        let id = LabelId::parse(id)?;
        self.labels.get(&id)
    }

    pub fn has_label(&self, id: &str) -> Result<bool, LabelingError> {
        let id = LabelId::parse(id)?;
        Ok(self.labels.contains(&id))
    }

    pub fn list_labels(&self) -> impl Iterator<Item = (&LabelId, &LabelDescriptor)> {
        self.labels.iter()
    }

    // ========================================================================
    // Operators
    // ========================================================================

    pub fn add_operator_to_label(
        &mut self,
        caller: &Principal,
        operator: Principal,
        label: &str,
    ) -> Result<(), LabelingError> {
        let label = LabelId::parse(label)?;
        self.authorize(caller, Action::AddOperator, Target::operator(&operator, &label))?;
        self.labels.get(&label)?;
        if self.operators.contains(&operator, &label) {
            return Err(LabelingError::AlreadyExists(Subject::Operator {
                operator,
                label,
            }));
        }

        self.labels.retain_operator(&label)?;
        info!(%operator, %label, by = %caller, "operator added");
        self.operators.push(operator, label);
        Ok(())
    }

    pub fn remove_operator_from_label(
        &mut self,
        caller: &Principal,
        operator: &Principal,
        label: &str,
    ) -> Result<(), LabelingError> {
        let label = LabelId::parse(label)?;
        self.authorize(caller, Action::RemoveOperator, Target::operator(operator, &label))?;
        self.labels.get(&label)?;
        if !self.operators.contains(operator, &label) {
            return Err(LabelingError::NotFound(Subject::Operator {
                operator: operator.clone(),
                label,
            }));
        }

        self.labels.release_operator(&label)?;
        self.operators.remove(operator, &label);
        info!(%operator, %label, by = %caller, "operator removed");
        Ok(())
    }

    pub fn get_operator_labels(&self, operator: &Principal) -> &[LabelId] {
        self.operators.labels_of(operator)
    }

    pub fn has_operator_label(
        &self,
        operator: &Principal,
        label: &str,
    ) -> Result<bool, LabelingError> {
        let label = LabelId::parse(label)?;
        Ok(self.operators.contains(operator, &label))
    }

    // ========================================================================
    // Assets
    // ========================================================================

    pub fn add_label_to_asset(
        &mut self,
        caller: &Principal,
        oracle: &dyn AssetOracle,
        asset: AssetId,
        label: &str,
    ) -> Result<(), LabelingError> {
        self.add_label_to_assets(caller, oracle, &[asset], label)
    }

    /// The asset-independent checks of `add_label_to_assets`: identifier
    /// length, authorization, label existence.
    ///
    /// Hosts run this before resolving assets against a remote ledger, so a
    /// rejected caller never triggers ledger lookups.
    pub fn check_asset_labeling(
        &self,
        caller: &Principal,
        label: &str,
    ) -> Result<LabelId, LabelingError> {
        let label = LabelId::parse(label)?;
        self.authorize(caller, Action::AddLabelToAsset, Target::label(&label))?;
        self.labels.get(&label)?;
        Ok(label)
    }

    /// Attach `label` to every asset in `assets`, or to none of them.
    ///
    /// All preconditions are checked for the whole batch before the first
    /// write. An asset listed twice fails as `AlreadyExists`.
    pub fn add_label_to_assets(
        &mut self,
        caller: &Principal,
        oracle: &dyn AssetOracle,
        assets: &[AssetId],
        label: &str,
    ) -> Result<(), LabelingError> {
        let label = self.check_asset_labeling(caller, label)?;

        let mut staged = HashSet::with_capacity(assets.len());
        for &asset in assets {
            if !oracle.asset_exists(asset) {
                return Err(LabelingError::NotFound(Subject::Asset(asset)));
            }
            if self.assets.contains(&asset, &label) || !staged.insert(asset) {
                return Err(LabelingError::AlreadyExists(Subject::AssetLabel {
                    asset,
                    label,
                }));
            }
        }

        self.labels.retain_assets(&label, assets.len() as u64)?;
        for &asset in assets {
            self.assets.push(asset, label.clone());
        }
        info!(%label, count = assets.len(), by = %caller, "label attached to assets");
        Ok(())
    }

    pub fn remove_label_from_asset(
        &mut self,
        caller: &Principal,
        asset: AssetId,
        label: &str,
    ) -> Result<(), LabelingError> {
        let label = LabelId::parse(label)?;
        self.labels.get(&label)?;
        self.authorize(caller, Action::RemoveLabelFromAsset, Target::label(&label))?;
        if !self.assets.contains(&asset, &label) {
            return Err(LabelingError::NotFound(Subject::AssetLabel { asset, label }));
        }

        self.labels.release_asset(&label)?;
        self.assets.remove(&asset, &label);
        info!(%asset, %label, by = %caller, "label detached from asset");
        Ok(())
    }

    pub fn get_asset_labels(&self, asset: AssetId) -> &[LabelId] {
        self.assets.labels_of(&asset)
    }

    /// Label sequences for many assets, in request order.
    pub fn get_assets_labels(&self, assets: &[AssetId]) -> Vec<&[LabelId]> {
        assets
            .iter()
            .map(|asset| self.assets.labels_of(asset))
            .collect()
    }

    pub fn has_asset_label(&self, asset: AssetId, label: &str) -> Result<bool, LabelingError> {
        let label = LabelId::parse(label)?;
        Ok(self.assets.contains(&asset, &label))
    }
}
