//! Action catalog: the closed set of combat actions and their AP costs.
//!
//! `ActionType` is the compile-time list of actions the engine knows how to
//! resolve. `ActionCatalog` is the configurable side: it maps action names to
//! an AP cost, a category and the status effects the action grants.

use crate::combatant::StatusEffectKind;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Every action the engine can resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    BasicAttack,
    FullAttack,
    ComplexSpell,
    SimpleSpell,
    Defend,
    Move,
    Dash,
    Disengage,
    Hide,
    Search,
    Help,
    Grapple,
    Shove,
    ReadyAction,
    BonusAction,
    SpecialAbility,
    Heal,
    Recover,
}

impl ActionType {
    pub const ALL: [ActionType; 18] = [
        ActionType::BasicAttack,
        ActionType::FullAttack,
        ActionType::ComplexSpell,
        ActionType::SimpleSpell,
        ActionType::Defend,
        ActionType::Move,
        ActionType::Dash,
        ActionType::Disengage,
        ActionType::Hide,
        ActionType::Search,
        ActionType::Help,
        ActionType::Grapple,
        ActionType::Shove,
        ActionType::ReadyAction,
        ActionType::BonusAction,
        ActionType::SpecialAbility,
        ActionType::Heal,
        ActionType::Recover,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ActionType::BasicAttack => "basic_attack",
            ActionType::FullAttack => "full_attack",
            ActionType::ComplexSpell => "complex_spell",
            ActionType::SimpleSpell => "simple_spell",
            ActionType::Defend => "defend",
            ActionType::Move => "move",
            ActionType::Dash => "dash",
            ActionType::Disengage => "disengage",
            ActionType::Hide => "hide",
            ActionType::Search => "search",
            ActionType::Help => "help",
            ActionType::Grapple => "grapple",
            ActionType::Shove => "shove",
            ActionType::ReadyAction => "ready_action",
            ActionType::BonusAction => "bonus_action",
            ActionType::SpecialAbility => "special_ability",
            ActionType::Heal => "heal",
            ActionType::Recover => "recover",
        }
    }

    /// Whether the action can only be resolved against a target.
    pub fn requires_target(&self) -> bool {
        matches!(
            self,
            ActionType::BasicAttack
                | ActionType::FullAttack
                | ActionType::ComplexSpell
                | ActionType::SimpleSpell
                | ActionType::Help
                | ActionType::Grapple
                | ActionType::Shove
        )
    }

    pub fn is_attack(&self) -> bool {
        matches!(
            self,
            ActionType::BasicAttack
                | ActionType::FullAttack
                | ActionType::ComplexSpell
                | ActionType::SimpleSpell
        )
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a name matches no `ActionType`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAction(pub String);

impl fmt::Display for UnknownAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown action: {}", self.0)
    }
}

impl std::error::Error for UnknownAction {}

impl FromStr for ActionType {
    type Err = UnknownAction;

    /// Case-insensitive; spaces and hyphens are accepted in place of `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        ActionType::ALL
            .into_iter()
            .find(|a| a.name() == normalized)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

/// How much of a turn an action occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    Free,
    Simple,
    Standard,
}

/// Cost and side effects of one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDefinition {
    pub cost: i32,
    pub category: ActionCategory,
    #[serde(default)]
    pub grants: Vec<StatusEffectKind>,
}

impl ActionDefinition {
    pub fn new(cost: i32, category: ActionCategory) -> Self {
        Self {
            cost,
            category,
            grants: Vec::new(),
        }
    }

    pub fn granting(mut self, effect: StatusEffectKind) -> Self {
        self.grants.push(effect);
        self
    }
}

lazy_static! {
    static ref DEFAULT_ENTRIES: BTreeMap<String, ActionDefinition> = {
        use ActionCategory::*;
        use StatusEffectKind as E;

        let table = [
            (ActionType::BasicAttack, ActionDefinition::new(2, Standard)),
            (ActionType::FullAttack, ActionDefinition::new(3, Standard)),
            (ActionType::ComplexSpell, ActionDefinition::new(3, Standard)),
            (ActionType::SimpleSpell, ActionDefinition::new(2, Standard)),
            (ActionType::Defend, ActionDefinition::new(1, Simple).granting(E::Defending)),
            (ActionType::Move, ActionDefinition::new(1, Simple)),
            (ActionType::Dash, ActionDefinition::new(2, Standard).granting(E::Dashing)),
            (ActionType::Disengage, ActionDefinition::new(1, Simple).granting(E::Disengaged)),
            (ActionType::Hide, ActionDefinition::new(1, Simple).granting(E::Hidden)),
            (ActionType::Search, ActionDefinition::new(1, Simple)),
            (ActionType::Help, ActionDefinition::new(1, Simple).granting(E::Helped)),
            (ActionType::Grapple, ActionDefinition::new(2, Standard).granting(E::Grappled)),
            (ActionType::Shove, ActionDefinition::new(2, Standard).granting(E::Prone)),
            (ActionType::ReadyAction, ActionDefinition::new(1, Simple).granting(E::Readied)),
            (ActionType::BonusAction, ActionDefinition::new(1, Simple).granting(E::Used)),
            (ActionType::SpecialAbility, ActionDefinition::new(2, Standard).granting(E::Used)),
            (ActionType::Heal, ActionDefinition::new(2, Standard)),
            (ActionType::Recover, ActionDefinition::new(0, Free)),
        ];

        table
            .into_iter()
            .map(|(action, def)| (action.name().to_string(), def))
            .collect()
    };
}

/// Name-keyed action table supplied as configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionCatalog {
    entries: BTreeMap<String, ActionDefinition>,
}

impl ActionCatalog {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn with_action(mut self, name: impl Into<String>, definition: ActionDefinition) -> Self {
        self.insert(name, definition);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, definition: ActionDefinition) {
        self.entries.insert(name.into(), definition);
    }

    /// Exact name match first, then a case-insensitive scan.
    pub fn lookup(&self, name: &str) -> Option<(&str, &ActionDefinition)> {
        if let Some((key, def)) = self.entries.get_key_value(name) {
            return Some((key.as_str(), def));
        }
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(key, def)| (key.as_str(), def))
    }

    pub fn cost_of(&self, name: &str) -> Option<i32> {
        self.lookup(name).map(|(_, def)| def.cost)
    }

    pub fn definition(&self, action: ActionType) -> Option<&ActionDefinition> {
        self.lookup(action.name()).map(|(_, def)| def)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ActionCatalog {
    fn default() -> Self {
        Self {
            entries: DEFAULT_ENTRIES.clone(),
        }
    }
}
