//! # Lifecycle Mutation Rules
//!
//! Pure decision functions over the current persisted state and a
//! proposed change set. The same rule evaluates full and partial
//! updates — the two differ only in how [`ProposedChange`] is computed,
//! never in how it is validated.
//!
//! Every state is mapped to its rule explicitly; adding a state will not
//! compile until a rule is chosen for it.

use thiserror::Error;

use crate::device::{Device, DeviceState};

/// A typed business-rule denial. The `Display` text is the reason
/// surfaced verbatim to callers.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleViolation {
    /// Name and brand edits are locked while a device is in use.
    #[error("Cannot update name or brand when device state is IN_USE")]
    InUseFieldsLocked,
    /// In-use devices may not be removed.
    #[error("Cannot delete device with state IN_USE")]
    InUseDelete,
}

/// The proposed change set of an update, reduced to the two facts the
/// rules care about.
///
/// Change detection is equality-based, not identity-based: re-supplying
/// a value identical to the current one counts as unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProposedChange {
    pub name_changed: bool,
    pub brand_changed: bool,
}

impl ProposedChange {
    /// Change set for a full update: every field is supplied, so a field
    /// changes exactly when the supplied value differs from the current one.
    pub fn full(current: &Device, name: &str, brand: &str) -> Self {
        Self {
            name_changed: name != current.name,
            brand_changed: brand != current.brand,
        }
    }

    /// Change set for a partial update: an absent field is unchanged, a
    /// present field changes only when it differs from the current value.
    pub fn partial(current: &Device, name: Option<&str>, brand: Option<&str>) -> Self {
        Self {
            name_changed: name.is_some_and(|n| n != current.name),
            brand_changed: brand.is_some_and(|b| b != current.brand),
        }
    }
}

/// Per-state update rule.
type UpdateRule = fn(ProposedChange) -> Result<(), RuleViolation>;

fn allow(_change: ProposedChange) -> Result<(), RuleViolation> {
    Ok(())
}

fn deny_identity_edits(change: ProposedChange) -> Result<(), RuleViolation> {
    if change.name_changed || change.brand_changed {
        Err(RuleViolation::InUseFieldsLocked)
    } else {
        Ok(())
    }
}

/// Map a state to its update rule. Exhaustive on purpose — no wildcard arm.
fn update_rule(state: DeviceState) -> UpdateRule {
    match state {
        DeviceState::Available => allow,
        DeviceState::InUse => deny_identity_edits,
        DeviceState::Inactive => allow,
    }
}

/// Decide whether an update with the given change set is permitted for a
/// device currently in `state`. State changes themselves are always
/// permitted, including staying `IN_USE`.
pub fn check_update(state: DeviceState, change: ProposedChange) -> Result<(), RuleViolation> {
    update_rule(state)(change)
}

/// Decide whether a device currently in `state` may be deleted.
pub fn check_delete(state: DeviceState) -> Result<(), RuleViolation> {
    match state {
        DeviceState::Available | DeviceState::Inactive => Ok(()),
        DeviceState::InUse => Err(RuleViolation::InUseDelete),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(state: DeviceState) -> Device {
        Device::new("MacBook Pro 16", "Apple", state).unwrap()
    }

    const ALL_CHANGES: [ProposedChange; 4] = [
        ProposedChange { name_changed: false, brand_changed: false },
        ProposedChange { name_changed: true, brand_changed: false },
        ProposedChange { name_changed: false, brand_changed: true },
        ProposedChange { name_changed: true, brand_changed: true },
    ];

    #[test]
    fn available_and_inactive_allow_every_change() {
        for state in [DeviceState::Available, DeviceState::Inactive] {
            for change in ALL_CHANGES {
                assert_eq!(check_update(state, change), Ok(()), "{state} {change:?}");
            }
        }
    }

    #[test]
    fn in_use_denies_name_or_brand_changes() {
        for change in ALL_CHANGES {
            let result = check_update(DeviceState::InUse, change);
            if change.name_changed || change.brand_changed {
                assert_eq!(result, Err(RuleViolation::InUseFieldsLocked));
            } else {
                assert_eq!(result, Ok(()));
            }
        }
    }

    #[test]
    fn full_change_set_uses_equality_not_presence() {
        let current = device(DeviceState::InUse);

        // Re-supplying identical values counts as unchanged.
        let unchanged = ProposedChange::full(&current, "MacBook Pro 16", "Apple");
        assert_eq!(
            unchanged,
            ProposedChange { name_changed: false, brand_changed: false }
        );

        let renamed = ProposedChange::full(&current, "MacBook Pro 14", "Apple");
        assert!(renamed.name_changed);
        assert!(!renamed.brand_changed);
    }

    #[test]
    fn partial_change_set_treats_absent_as_unchanged() {
        let current = device(DeviceState::InUse);

        let absent = ProposedChange::partial(&current, None, None);
        assert_eq!(
            absent,
            ProposedChange { name_changed: false, brand_changed: false }
        );

        let same_value = ProposedChange::partial(&current, Some("MacBook Pro 16"), None);
        assert!(!same_value.name_changed);

        let rebranded = ProposedChange::partial(&current, None, Some("Lenovo"));
        assert!(rebranded.brand_changed);
        assert!(!rebranded.name_changed);
    }

    #[test]
    fn full_and_partial_agree_when_both_fields_supplied() {
        let current = device(DeviceState::Available);
        let full = ProposedChange::full(&current, "X1 Carbon", "Apple");
        let partial = ProposedChange::partial(&current, Some("X1 Carbon"), Some("Apple"));
        assert_eq!(full, partial);
    }

    #[test]
    fn delete_blocked_only_for_in_use() {
        assert_eq!(check_delete(DeviceState::Available), Ok(()));
        assert_eq!(check_delete(DeviceState::Inactive), Ok(()));
        assert_eq!(
            check_delete(DeviceState::InUse),
            Err(RuleViolation::InUseDelete)
        );
    }

    #[test]
    fn violation_reasons_are_caller_facing() {
        assert_eq!(
            RuleViolation::InUseFieldsLocked.to_string(),
            "Cannot update name or brand when device state is IN_USE"
        );
        assert_eq!(
            RuleViolation::InUseDelete.to_string(),
            "Cannot delete device with state IN_USE"
        );
    }
}
