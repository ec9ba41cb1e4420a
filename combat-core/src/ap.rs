//! Action points: the per-turn resource every combat action is paid from.
//!
//! Spending is never blocked. A budget may be overdrawn into negative
//! `current_ap`; `spend_ap` reports the overdraw and the turn-transition logic
//! uses the negative balance to end the turn early.

use serde::{Deserialize, Serialize};

/// AP scaling knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApConfig {
    /// AP every combatant has at level 0.
    pub base_ap: i32,
    /// One bonus AP per this many levels. Zero disables the bonus.
    pub level_bonus_interval: u32,
}

impl ApConfig {
    pub fn new(base_ap: i32, level_bonus_interval: u32) -> Self {
        Self {
            base_ap,
            level_bonus_interval,
        }
    }

    /// `base_ap + floor(level / level_bonus_interval)`.
    pub fn calculate_max_ap(&self, level: u32) -> i32 {
        let bonus = level.checked_div(self.level_bonus_interval).unwrap_or(0);
        self.base_ap + bonus as i32
    }

    /// A full budget for a combatant of the given level.
    pub fn budget_for_level(&self, level: u32) -> ActionPointBudget {
        ActionPointBudget::new(self.calculate_max_ap(level))
    }
}

impl Default for ApConfig {
    fn default() -> Self {
        Self {
            base_ap: 3,
            level_bonus_interval: 5,
        }
    }
}

/// Max AP for a level using the default scaling.
pub fn calculate_max_ap(level: u32) -> i32 {
    ApConfig::default().calculate_max_ap(level)
}

/// A combatant's AP for the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPointBudget {
    pub max_ap: i32,
    pub current_ap: i32,
    pub spent_this_turn: i32,
}

impl ActionPointBudget {
    pub fn new(max_ap: i32) -> Self {
        Self {
            max_ap,
            current_ap: max_ap,
            spent_this_turn: 0,
        }
    }

    pub fn can_afford_action(&self, cost: i32) -> bool {
        self.current_ap >= cost
    }

    /// Deduct `cost` unconditionally.
    ///
    /// Returns `false` when the cost exceeded the balance before the
    /// deduction; the balance is then negative.
    pub fn spend_ap(&mut self, cost: i32) -> bool {
        let affordable = self.can_afford_action(cost);
        self.current_ap -= cost;
        self.spent_this_turn += cost;
        affordable
    }

    pub fn reset_turn(&mut self) {
        self.current_ap = self.max_ap;
        self.spent_this_turn = 0;
    }

    pub fn is_exhausted(&self) -> bool {
        self.current_ap <= 0
    }

    pub fn is_overdrawn(&self) -> bool {
        self.current_ap < 0
    }
}
