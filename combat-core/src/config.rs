//! Engine configuration.

use crate::ap::ApConfig;
use crate::catalog::ActionCatalog;
use crate::error::CombatError;
use serde::{Deserialize, Serialize};

/// Static configuration for a combat engine.
///
/// Every field has a default, so a JSON document only needs the values it
/// changes:
///
/// ```
/// use combat_core::CombatConfig;
///
/// let config = CombatConfig::from_json(r#"{ "ap": { "base_ap": 4 } }"#).unwrap();
/// assert_eq!(config.ap.base_ap, 4);
/// assert_eq!(config.ap.level_bonus_interval, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// AP scaling by level.
    pub ap: ApConfig,

    /// Action costs, categories and granted effects.
    pub catalog: ActionCatalog,

    /// AC added against attacks while the target is Defending.
    pub defend_ac_bonus: i32,

    /// Feet covered by `move`; `dash` doubles it.
    pub base_speed_feet: u32,

    /// Attack rolls made by `full_attack`.
    pub full_attack_count: u32,

    /// DC for hide and search checks.
    pub check_dc: i32,

    /// DC for the recover check.
    pub recover_dc: i32,
}

impl CombatConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, CombatError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_ap(mut self, base_ap: i32, level_bonus_interval: u32) -> Self {
        self.ap = ApConfig::new(base_ap, level_bonus_interval);
        self
    }

    pub fn with_catalog(mut self, catalog: ActionCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_defend_ac_bonus(mut self, bonus: i32) -> Self {
        self.defend_ac_bonus = bonus;
        self
    }

    pub fn with_base_speed(mut self, feet: u32) -> Self {
        self.base_speed_feet = feet;
        self
    }

    pub fn with_full_attack_count(mut self, count: u32) -> Self {
        self.full_attack_count = count;
        self
    }

    pub fn with_check_dc(mut self, dc: i32) -> Self {
        self.check_dc = dc;
        self
    }

    pub fn with_recover_dc(mut self, dc: i32) -> Self {
        self.recover_dc = dc;
        self
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            ap: ApConfig::default(),
            catalog: ActionCatalog::default(),
            defend_ac_bonus: 2,
            base_speed_feet: 30,
            full_attack_count: 2,
            check_dc: 12,
            recover_dc: 10,
        }
    }
}
