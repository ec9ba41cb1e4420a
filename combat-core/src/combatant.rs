//! Combatant state: identity, combat stats, AP budget and status effects.
//!
//! Consciousness is derived, never stored: a combatant is conscious while
//! `hp > 0` and no `Unconscious` effect is active. `hp <= 0` alone means
//! defeated.

use crate::ap::{ActionPointBudget, ApConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Identifier of a combatant, resolved by the caller from a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombatantId(pub String);

impl CombatantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CombatantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for CombatantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Unique identifier for combat sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Status Effects
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusEffectKind {
    Defending,
    Dashing,
    Disengaged,
    Hidden,
    Helped,
    Grappled,
    Prone,
    Readied,
    Used,
    Blinded,
    Frightened,
    Poisoned,
    Restrained,
    Stunned,
    Paralyzed,
    Incapacitated,
    Unconscious,
}

impl StatusEffectKind {
    pub fn name(&self) -> &'static str {
        match self {
            StatusEffectKind::Defending => "defending",
            StatusEffectKind::Dashing => "dashing",
            StatusEffectKind::Disengaged => "disengaged",
            StatusEffectKind::Hidden => "hidden",
            StatusEffectKind::Helped => "helped",
            StatusEffectKind::Grappled => "grappled",
            StatusEffectKind::Prone => "prone",
            StatusEffectKind::Readied => "readied",
            StatusEffectKind::Used => "used",
            StatusEffectKind::Blinded => "blinded",
            StatusEffectKind::Frightened => "frightened",
            StatusEffectKind::Poisoned => "poisoned",
            StatusEffectKind::Restrained => "restrained",
            StatusEffectKind::Stunned => "stunned",
            StatusEffectKind::Paralyzed => "paralyzed",
            StatusEffectKind::Incapacitated => "incapacitated",
            StatusEffectKind::Unconscious => "unconscious",
        }
    }

    /// Effects that stop every action except `recover`.
    pub fn is_incapacitating(&self) -> bool {
        matches!(
            self,
            StatusEffectKind::Stunned
                | StatusEffectKind::Paralyzed
                | StatusEffectKind::Incapacitated
                | StatusEffectKind::Unconscious
        )
    }

    /// Rounds an effect lasts when granted by an action; `None` lasts until removed.
    pub fn default_duration(&self) -> Option<u32> {
        match self {
            StatusEffectKind::Defending
            | StatusEffectKind::Dashing
            | StatusEffectKind::Disengaged
            | StatusEffectKind::Helped
            | StatusEffectKind::Readied
            | StatusEffectKind::Used => Some(1),
            _ => None,
        }
    }
}

impl fmt::Display for StatusEffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An effect attached to a combatant, with tracking info.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub kind: StatusEffectKind,
    pub remaining_rounds: Option<u32>,
    pub source: String,
    pub description: String,
}

impl StatusEffect {
    pub fn new(kind: StatusEffectKind, source: impl Into<String>) -> Self {
        Self {
            kind,
            remaining_rounds: kind.default_duration(),
            source: source.into(),
            description: String::new(),
        }
    }

    pub fn with_duration(mut self, rounds: u32) -> Self {
        self.remaining_rounds = Some(rounds);
        self
    }

    pub fn until_removed(mut self) -> Self {
        self.remaining_rounds = None;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

// ============================================================================
// Combatant
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub hp: i32,
    pub max_hp: i32,
    pub ac: i32,
    pub initiative: i32,
    pub level: u32,
    pub is_npc: bool,
    /// Added to attack rolls and contested checks.
    pub attack_bonus: i32,
    /// Weapon damage on a hit, in dice notation.
    pub damage_dice: String,
    #[serde(default)]
    pub status_effects: Vec<StatusEffect>,
    pub ap: Option<ActionPointBudget>,
}

impl Combatant {
    /// A level 1 combatant at full HP with a default AP budget.
    pub fn new(id: impl Into<CombatantId>, name: impl Into<String>, max_hp: i32, ac: i32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            hp: max_hp,
            max_hp,
            ac,
            initiative: 0,
            level: 1,
            is_npc: false,
            attack_bonus: proficiency_bonus(1),
            damage_dice: "1d6".to_string(),
            status_effects: Vec::new(),
            ap: Some(ApConfig::default().budget_for_level(1)),
        }
    }

    pub fn npc(mut self) -> Self {
        self.is_npc = true;
        self
    }

    pub fn with_hp(mut self, hp: i32) -> Self {
        self.hp = hp;
        self
    }

    pub fn with_initiative(mut self, initiative: i32) -> Self {
        self.initiative = initiative;
        self
    }

    /// Sets the level and rescales attack bonus and AP with default scaling.
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self.attack_bonus = proficiency_bonus(level);
        if self.ap.is_some() {
            self.ap = Some(ApConfig::default().budget_for_level(level));
        }
        self
    }

    pub fn with_ap_config(mut self, config: &ApConfig) -> Self {
        self.ap = Some(config.budget_for_level(self.level));
        self
    }

    pub fn with_ap(mut self, budget: ActionPointBudget) -> Self {
        self.ap = Some(budget);
        self
    }

    pub fn without_ap(mut self) -> Self {
        self.ap = None;
        self
    }

    pub fn with_attack_bonus(mut self, bonus: i32) -> Self {
        self.attack_bonus = bonus;
        self
    }

    pub fn with_damage_dice(mut self, dice: impl Into<String>) -> Self {
        self.damage_dice = dice.into();
        self
    }

    pub fn with_effect(mut self, effect: StatusEffect) -> Self {
        self.add_effect(effect);
        self
    }

    pub fn is_defeated(&self) -> bool {
        self.hp <= 0
    }

    pub fn is_conscious(&self) -> bool {
        !self.is_defeated() && !self.has_effect(StatusEffectKind::Unconscious)
    }

    pub fn has_effect(&self, kind: StatusEffectKind) -> bool {
        self.status_effects.iter().any(|e| e.kind == kind)
    }

    /// The first active effect that prevents acting, if any.
    pub fn incapacitating_effect(&self) -> Option<&StatusEffect> {
        self.status_effects
            .iter()
            .find(|e| e.kind.is_incapacitating())
    }

    /// Adds an effect, replacing any existing effect of the same kind.
    pub fn add_effect(&mut self, effect: StatusEffect) {
        self.status_effects.retain(|e| e.kind != effect.kind);
        self.status_effects.push(effect);
    }

    pub fn remove_effect(&mut self, kind: StatusEffectKind) -> bool {
        let before = self.status_effects.len();
        self.status_effects.retain(|e| e.kind != kind);
        self.status_effects.len() != before
    }

    /// Counts down timed effects; returns the kinds that expired.
    pub fn tick_effects(&mut self) -> Vec<StatusEffectKind> {
        let mut expired = Vec::new();
        self.status_effects.retain_mut(|effect| match effect.remaining_rounds {
            Some(rounds) if rounds <= 1 => {
                expired.push(effect.kind);
                false
            }
            Some(ref mut rounds) => {
                *rounds -= 1;
                true
            }
            None => true,
        });
        expired
    }

    /// Applies damage; HP does not go below zero. Returns the damage dealt.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let dealt = amount.max(0).min(self.hp.max(0));
        self.hp -= dealt;
        dealt
    }

    /// Heals up to `max_hp`. Returns the HP actually restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = (self.hp.max(0) + amount.max(0)).min(self.max_hp);
        (self.hp - before).max(0)
    }

    pub fn current_ap(&self) -> Option<i32> {
        self.ap.map(|b| b.current_ap)
    }

    /// Called when this combatant's turn begins.
    pub fn start_turn(&mut self) -> Vec<StatusEffectKind> {
        if let Some(budget) = self.ap.as_mut() {
            budget.reset_turn();
        }
        self.tick_effects()
    }
}

/// D&D proficiency bonus by level.
pub fn proficiency_bonus(level: u32) -> i32 {
    2 + (level.max(1) as i32 - 1) / 4
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goblin() -> Combatant {
        Combatant::new("goblin", "Goblin", 7, 13).npc()
    }

    #[test]
    fn test_conscious_is_derived_from_hp() {
        let mut g = goblin();
        assert!(g.is_conscious());
        g.hp = 0;
        assert!(!g.is_conscious());
        assert!(g.is_defeated());
    }

    #[test]
    fn test_unconscious_effect_without_damage() {
        let g = goblin().with_effect(StatusEffect::new(StatusEffectKind::Unconscious, "Sleep"));
        assert!(!g.is_conscious());
        assert!(!g.is_defeated());
        assert_eq!(
            g.incapacitating_effect().map(|e| e.kind),
            Some(StatusEffectKind::Unconscious)
        );
    }

    #[test]
    fn test_damage_and_heal_clamp() {
        let mut g = goblin();
        assert_eq!(g.take_damage(10), 7);
        assert_eq!(g.hp, 0);
        assert_eq!(g.heal(3), 3);
        assert_eq!(g.heal(100), 4);
        assert_eq!(g.hp, 7);
    }

    #[test]
    fn test_add_effect_replaces_same_kind() {
        let mut g = goblin();
        g.add_effect(StatusEffect::new(StatusEffectKind::Prone, "Shove"));
        g.add_effect(StatusEffect::new(StatusEffectKind::Prone, "Trip").with_duration(2));
        assert_eq!(g.status_effects.len(), 1);
        assert_eq!(g.status_effects[0].source, "Trip");
        assert!(g.remove_effect(StatusEffectKind::Prone));
        assert!(!g.remove_effect(StatusEffectKind::Prone));
    }

    #[test]
    fn test_tick_effects_expires_timed() {
        let mut g = goblin()
            .with_effect(StatusEffect::new(StatusEffectKind::Defending, "Defend"))
            .with_effect(StatusEffect::new(StatusEffectKind::Stunned, "Slam").with_duration(2))
            .with_effect(StatusEffect::new(StatusEffectKind::Grappled, "Grapple"));

        assert_eq!(g.tick_effects(), vec![StatusEffectKind::Defending]);
        assert!(g.has_effect(StatusEffectKind::Stunned));
        assert_eq!(g.tick_effects(), vec![StatusEffectKind::Stunned]);
        assert!(g.has_effect(StatusEffectKind::Grappled));
    }

    #[test]
    fn test_level_scales_ap_and_bonus() {
        let c = Combatant::new("pc", "Hero", 30, 15).with_level(10);
        assert_eq!(c.current_ap(), Some(5));
        assert_eq!(c.attack_bonus, 4);
        assert_eq!(proficiency_bonus(1), 2);
        assert_eq!(proficiency_bonus(5), 3);
        assert_eq!(proficiency_bonus(17), 6);
    }

    #[test]
    fn test_start_turn_resets_ap() {
        let mut c = Combatant::new("pc", "Hero", 20, 16);
        c.ap.as_mut().unwrap().spend_ap(4);
        c.start_turn();
        assert_eq!(c.current_ap(), Some(3));
        assert_eq!(c.ap.unwrap().spent_this_turn, 0);
    }
}
