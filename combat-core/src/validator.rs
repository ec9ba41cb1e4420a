//! Pre-resolution screening: may this combatant attempt this action now?
//!
//! The validator is pure. It reports AP shortfall severity but does not
//! decide whether an overdraw is allowed; the engine does that when it spends.

use crate::catalog::{ActionCatalog, ActionType};
use crate::combatant::Combatant;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// How far an action's cost exceeds the AP available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverdrawLevel {
    #[default]
    None,
    Minor,
    Moderate,
    Major,
}

impl OverdrawLevel {
    pub fn from_shortfall(shortfall: i32) -> Self {
        match shortfall {
            i32::MIN..=0 => OverdrawLevel::None,
            1 => OverdrawLevel::Minor,
            2 => OverdrawLevel::Moderate,
            _ => OverdrawLevel::Major,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCheck {
    pub can_act: bool,
    pub reason: Option<String>,
    pub required_ap: i32,
    pub available_ap: i32,
    pub overdraw_level: OverdrawLevel,
}

impl ActionCheck {
    pub(crate) fn denied(reason: impl Into<String>, required_ap: i32, available_ap: i32) -> Self {
        Self {
            can_act: false,
            reason: Some(reason.into()),
            required_ap,
            available_ap,
            overdraw_level: OverdrawLevel::None,
        }
    }

    /// Denied only because AP ran short; the engine may still let it through.
    pub fn is_ap_shortfall(&self) -> bool {
        !self.can_act && self.overdraw_level != OverdrawLevel::None
    }
}

fn is_recover(action_name: &str) -> bool {
    action_name
        .trim()
        .eq_ignore_ascii_case(ActionType::Recover.name())
}

/// Screen `action_name` for `combatant`.
///
/// Checks, in order: consciousness, incapacitating effects, catalog lookup,
/// presence of an AP budget, and AP sufficiency. `recover` is exempt from
/// all but the catalog lookup.
pub fn can_perform_action(
    combatant: &Combatant,
    action_name: &str,
    catalog: &ActionCatalog,
) -> ActionCheck {
    let recover = is_recover(action_name);
    let available_ap = combatant.current_ap().unwrap_or(0);
    let known_cost = catalog.cost_of(action_name);

    if !recover {
        if !combatant.is_conscious() {
            return ActionCheck::denied("Unconscious", known_cost.unwrap_or(0), available_ap);
        }
        if let Some(effect) = combatant.incapacitating_effect() {
            return ActionCheck::denied(
                effect.kind.name(),
                known_cost.unwrap_or(0),
                available_ap,
            );
        }
    }

    let Some(required_ap) = known_cost else {
        warn!(
            combatant = %combatant.id,
            action = action_name,
            "action not found in catalog"
        );
        return ActionCheck::denied(format!("Unknown action: {action_name}"), 0, available_ap);
    };

    let Some(budget) = combatant.ap else {
        if recover {
            return ActionCheck {
                can_act: true,
                reason: None,
                required_ap: 0,
                available_ap: 0,
                overdraw_level: OverdrawLevel::None,
            };
        }
        return ActionCheck::denied("No action points", required_ap, 0);
    };

    let overdraw_level = OverdrawLevel::from_shortfall(required_ap - budget.current_ap);
    let can_act = recover || budget.current_ap >= required_ap;

    ActionCheck {
        can_act,
        reason: (!can_act).then(|| {
            format!(
                "Insufficient AP: need {required_ap}, have {}",
                budget.current_ap
            )
        }),
        required_ap,
        available_ap: budget.current_ap,
        overdraw_level,
    }
}

/// Typed convenience over [`can_perform_action`].
pub fn check_action(combatant: &Combatant, action: ActionType, catalog: &ActionCatalog) -> ActionCheck {
    can_perform_action(combatant, action.name(), catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ap::ActionPointBudget;
    use crate::combatant::{StatusEffect, StatusEffectKind};

    fn fighter() -> Combatant {
        Combatant::new("fighter", "Fighter", 20, 16)
    }

    #[test]
    fn test_affordable_action() {
        let check = can_perform_action(&fighter(), "basic_attack", &ActionCatalog::default());
        assert!(check.can_act);
        assert_eq!(check.reason, None);
        assert_eq!(check.required_ap, 2);
        assert_eq!(check.available_ap, 3);
        assert_eq!(check.overdraw_level, OverdrawLevel::None);
    }

    #[test]
    fn test_unconscious_blocks_everything_but_recover() {
        let catalog = ActionCatalog::default();
        let downed = fighter().with_hp(0);

        let check = can_perform_action(&downed, "defend", &catalog);
        assert!(!check.can_act);
        assert_eq!(check.reason.as_deref(), Some("Unconscious"));

        assert!(can_perform_action(&downed, "recover", &catalog).can_act);
        assert!(can_perform_action(&downed, "Recover", &catalog).can_act);
    }

    #[test]
    fn test_incapacitating_effect_named_in_reason() {
        let catalog = ActionCatalog::default();
        let stunned = fighter().with_effect(StatusEffect::new(StatusEffectKind::Stunned, "Slam"));

        let check = can_perform_action(&stunned, "move", &catalog);
        assert!(!check.can_act);
        assert_eq!(check.reason.as_deref(), Some("stunned"));
        assert!(can_perform_action(&stunned, "recover", &catalog).can_act);

        let prone = fighter().with_effect(StatusEffect::new(StatusEffectKind::Prone, "Shove"));
        assert!(can_perform_action(&prone, "move", &catalog).can_act);
    }

    #[test]
    fn test_unknown_action() {
        let check = can_perform_action(&fighter(), "backflip", &ActionCatalog::default());
        assert!(!check.can_act);
        assert_eq!(check.reason.as_deref(), Some("Unknown action: backflip"));
    }

    #[test]
    fn test_case_insensitive_cost_lookup() {
        let check = can_perform_action(&fighter(), "FULL_ATTACK", &ActionCatalog::default());
        assert!(check.can_act);
        assert_eq!(check.required_ap, 3);
    }

    #[test]
    fn test_no_budget_only_recover() {
        let catalog = ActionCatalog::default();
        let c = fighter().without_ap();
        let check = can_perform_action(&c, "basic_attack", &catalog);
        assert!(!check.can_act);
        assert_eq!(check.available_ap, 0);

        let check = can_perform_action(&c, "recover", &catalog);
        assert!(check.can_act);
        assert_eq!(check.required_ap, 0);
    }

    #[test]
    fn test_overdraw_levels() {
        let catalog = ActionCatalog::default();
        let with_ap = |ap: i32| {
            fighter().with_ap(ActionPointBudget {
                max_ap: 3,
                current_ap: ap,
                spent_this_turn: 3 - ap,
            })
        };

        let minor = can_perform_action(&with_ap(1), "basic_attack", &catalog);
        assert!(!minor.can_act);
        assert!(minor.is_ap_shortfall());
        assert_eq!(minor.overdraw_level, OverdrawLevel::Minor);

        let moderate = can_perform_action(&with_ap(0), "basic_attack", &catalog);
        assert_eq!(moderate.overdraw_level, OverdrawLevel::Moderate);

        let major = can_perform_action(&with_ap(0), "full_attack", &catalog);
        assert_eq!(major.overdraw_level, OverdrawLevel::Major);

        let exact = can_perform_action(&with_ap(2), "basic_attack", &catalog);
        assert!(exact.can_act);
        assert_eq!(exact.overdraw_level, OverdrawLevel::None);
    }

    #[test]
    fn test_recover_allowed_with_negative_ap() {
        let c = fighter().with_ap(ActionPointBudget {
            max_ap: 3,
            current_ap: -2,
            spent_this_turn: 5,
        });
        let check = check_action(&c, ActionType::Recover, &ActionCatalog::default());
        assert!(check.can_act);
    }
}
