//! Authorization resolver.
//!
//! Every mutating registry operation maps to an [`Action`]. [`POLICY`] lists,
//! per action, the roles that may perform it; [`authorize`] computes the
//! caller's roles against the current admin and operator index and checks
//! them against the table. Roles are recomputed on every call.

use serde::Serialize;

use crate::error::LabelingError;
use crate::registry::OperatorIndex;
use crate::types::{LabelId, Principal};

// ==============================================================================
// Actions and Roles
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ChangeAdmin,
    AddLabel,
    ChangeLabel,
    RemoveLabel,
    AddOperator,
    RemoveOperator,
    AddLabelToAsset,
    RemoveLabelFromAsset,
}

impl Action {
    pub const ALL: [Action; 8] = [
        Self::ChangeAdmin,
        Self::AddLabel,
        Self::ChangeLabel,
        Self::RemoveLabel,
        Self::AddOperator,
        Self::RemoveOperator,
        Self::AddLabelToAsset,
        Self::RemoveLabelFromAsset,
    ];
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ChangeAdmin => write!(f, "change admin"),
            Self::AddLabel => write!(f, "add label"),
            Self::ChangeLabel => write!(f, "change label"),
            Self::RemoveLabel => write!(f, "remove label"),
            Self::AddOperator => write!(f, "add operator to label"),
            Self::RemoveOperator => write!(f, "remove operator from label"),
            Self::AddLabelToAsset => write!(f, "add label to asset"),
            Self::RemoveLabelFromAsset => write!(f, "remove label from asset"),
        }
    }
}

/// A relationship between the caller and the operation's target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Caller is the current admin.
    Admin,
    /// Caller is an operator of the target label.
    LabelOperator,
    /// Caller is the target operator principal.
    TargetSelf,
}

/// Roles permitted to perform each action. Anything not listed is denied.
pub const POLICY: &[(Action, &[Role])] = &[
    (Action::ChangeAdmin, &[Role::Admin]),
    (Action::AddLabel, &[Role::Admin]),
    (Action::ChangeLabel, &[Role::Admin]),
    (Action::RemoveLabel, &[Role::Admin]),
    (Action::AddOperator, &[Role::Admin, Role::LabelOperator]),
    (Action::RemoveOperator, &[Role::Admin, Role::TargetSelf]),
    (Action::AddLabelToAsset, &[Role::LabelOperator]),
    (Action::RemoveLabelFromAsset, &[Role::LabelOperator]),
];

pub fn allowed_roles(action: Action) -> &'static [Role] {
    POLICY
        .iter()
        .find(|(candidate, _)| *candidate == action)
        .map(|(_, roles)| *roles)
        .unwrap_or(&[])
}

// ==============================================================================
// Resolver
// ==============================================================================

/// What the operation touches, as far as authorization is concerned.
#[derive(Debug, Clone, Copy, Default)]
pub struct Target<'a> {
    pub label: Option<&'a LabelId>,
    pub operator: Option<&'a Principal>,
}

impl<'a> Target<'a> {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn label(label: &'a LabelId) -> Self {
        Self {
            label: Some(label),
            operator: None,
        }
    }

    pub fn operator(operator: &'a Principal, label: &'a LabelId) -> Self {
        Self {
            label: Some(label),
            operator: Some(operator),
        }
    }
}

/// Current state the resolver reads from.
#[derive(Clone, Copy)]
pub struct AuthView<'a> {
    pub admin: &'a Principal,
    pub operators: &'a OperatorIndex,
}

impl AuthView<'_> {
    pub fn holds(&self, caller: &Principal, role: Role, target: Target<'_>) -> bool {
        match role {
            Role::Admin => caller == self.admin,
            Role::LabelOperator => target
                .label
                .is_some_and(|label| self.operators.contains(caller, label)),
            Role::TargetSelf => target.operator == Some(caller),
        }
    }
}

/// Approve or deny `caller` performing `action` on `target`.
pub fn authorize(
    view: AuthView<'_>,
    caller: &Principal,
    action: Action,
    target: Target<'_>,
) -> Result<(), LabelingError> {
    let allowed = allowed_roles(action)
        .iter()
        .any(|role| view.holds(caller, *role, target));

    if !allowed {
        tracing::debug!(caller = %caller, %action, "authorization denied");
        return Err(LabelingError::Unauthorized {
            caller: caller.clone(),
            action,
        });
    }
    Ok(())
}
