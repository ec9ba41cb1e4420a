//! Outcome records for resolved actions.
//!
//! An `ActionResult` is the only channel through which the engine reports
//! what an action changed. Numeric fields are `None` when they do not apply
//! to the action, and every one of them is `None` on an invalid-target
//! result.

use crate::catalog::ActionType;
use crate::combatant::CombatantId;
use crate::dice::RollResult;
use serde::{Deserialize, Serialize};

/// Effect tag carried by every invalid-target result.
pub const INVALID_TARGET: &str = "invalid_target";

/// One attack roll within an attacking action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackRoll {
    pub total: i32,
    pub natural: Option<u32>,
    pub target_ac: i32,
    pub hit: bool,
    pub critical: bool,
    pub damage: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    /// `None` when the submitted name matched no known action.
    pub action_type: Option<ActionType>,
    pub action_name: String,
    pub actor_id: CombatantId,
    pub target_id: Option<CombatantId>,
    pub success: bool,
    pub ap_cost: Option<i32>,
    /// Set when paying for this action drove the actor's AP negative.
    #[serde(default)]
    pub overdrawn: bool,
    pub damage: Option<i32>,
    pub healing: Option<i32>,
    /// Total of the first attack roll.
    pub attack_roll: Option<i32>,
    pub critical: Option<bool>,
    pub ac_bonus: Option<i32>,
    pub distance_feet: Option<u32>,
    /// Skill check, recovery check, or the actor's side of a contest.
    pub check_roll: Option<i32>,
    /// The target's side of a contest.
    pub opposed_roll: Option<i32>,
    #[serde(default)]
    pub attacks: Vec<AttackRoll>,
    #[serde(default)]
    pub rolls: Vec<RollResult>,
    #[serde(default)]
    pub effects_applied: Vec<String>,
    #[serde(default)]
    pub effects_removed: Vec<String>,
    pub description: String,
}

impl ActionResult {
    /// An empty, unsuccessful record for `action` to be filled in by a handler.
    pub fn new(action: ActionType, actor_id: CombatantId, target_id: Option<CombatantId>) -> Self {
        Self::unresolved(Some(action), action.name().to_string(), actor_id, target_id)
    }

    /// The uniform null-shaped record for anything that could not be resolved
    /// against a target: missing, unconscious, defeated, or an unknown action.
    pub fn invalid_target(
        action_name: impl Into<String>,
        actor_id: CombatantId,
        target_id: Option<CombatantId>,
        description: impl Into<String>,
    ) -> Self {
        let action_name = action_name.into();
        let mut result =
            Self::unresolved(action_name.parse().ok(), action_name, actor_id, target_id);
        result.effects_applied.push(INVALID_TARGET.to_string());
        result.description = description.into();
        result
    }

    fn unresolved(
        action_type: Option<ActionType>,
        action_name: String,
        actor_id: CombatantId,
        target_id: Option<CombatantId>,
    ) -> Self {
        Self {
            action_type,
            action_name,
            actor_id,
            target_id,
            success: false,
            ap_cost: None,
            overdrawn: false,
            damage: None,
            healing: None,
            attack_roll: None,
            critical: None,
            ac_bonus: None,
            distance_feet: None,
            check_roll: None,
            opposed_roll: None,
            attacks: Vec::new(),
            rolls: Vec::new(),
            effects_applied: Vec::new(),
            effects_removed: Vec::new(),
            description: String::new(),
        }
    }

    pub fn is_invalid_target(&self) -> bool {
        !self.success && self.effects_applied.iter().any(|e| e == INVALID_TARGET)
    }

    pub(crate) fn applied(&mut self, tag: impl Into<String>) {
        self.effects_applied.push(tag.into());
    }

    pub(crate) fn removed(&mut self, tag: impl Into<String>) {
        self.effects_removed.push(tag.into());
    }
}
