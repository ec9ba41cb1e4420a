//! Testing utilities for combat encounters.
//!
//! This module provides tools for integration testing:
//! - Sample combatants and sessions
//! - `ScriptedAgent` standing in for the agent that proposes actions
//! - `TestHarness` for scripted encounters on a seeded engine
//! - Assertion helpers for verifying combat state

use crate::combatant::{Combatant, CombatantId, StatusEffectKind};
use crate::config::CombatConfig;
use crate::engine::{CombatEngine, ProposedAction, TurnReport};
use crate::error::CombatError;
use crate::session::{CombatOutcome, CombatSession};

/// A level 1 fighter: HP 20, AC 16, 3 AP.
pub fn sample_fighter() -> Combatant {
    Combatant::new("fighter", "Fighter", 20, 16)
        .with_initiative(15)
        .with_attack_bonus(5)
        .with_damage_dice("1d8+3")
}

/// A goblin: HP 7, AC 13.
pub fn sample_goblin() -> Combatant {
    Combatant::new("goblin", "Goblin", 7, 13)
        .with_initiative(12)
        .with_attack_bonus(4)
        .with_damage_dice("1d6+2")
        .npc()
}

/// Fighter against goblin, already started. The fighter acts first.
pub fn duel_session() -> CombatSession {
    let mut session = CombatSession::new("goblin ambush", vec![sample_fighter(), sample_goblin()])
        .unwrap_or_else(|e| panic!("sample duel is valid: {e}"));
    session.start();
    session
}

/// Fighter and cleric against two goblins, already started.
pub fn party_session() -> CombatSession {
    let roster = vec![
        sample_fighter(),
        Combatant::new("cleric", "Cleric", 16, 18)
            .with_initiative(8)
            .with_damage_dice("1d6+1"),
        sample_goblin(),
        Combatant::new("goblin_archer", "Goblin Archer", 7, 13)
            .with_initiative(10)
            .with_attack_bonus(4)
            .with_damage_dice("1d6+2")
            .npc(),
    ];
    let mut session = CombatSession::new("goblin warren", roster)
        .unwrap_or_else(|e| panic!("sample party is valid: {e}"));
    session.start();
    session
}

/// Engine with the default configuration and a fixed seed.
pub fn seeded_engine(seed: u64) -> CombatEngine {
    CombatEngine::seeded(CombatConfig::default(), seed)
}

/// One scripted turn: the actions proposed and whether to end the turn.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTurn {
    pub actions: Vec<ProposedAction>,
    pub end_turn: bool,
}

impl ScriptedTurn {
    pub fn new(actions: Vec<ProposedAction>) -> Self {
        Self {
            actions,
            end_turn: false,
        }
    }

    /// Propose the actions, then end the turn regardless of AP left.
    pub fn ending(actions: Vec<ProposedAction>) -> Self {
        Self {
            actions,
            end_turn: true,
        }
    }
}

/// An agent that proposes scripted turns in order.
///
/// Once the script runs out it passes every turn.
#[derive(Debug, Default)]
pub struct ScriptedAgent {
    turns: Vec<ScriptedTurn>,
    next: usize,
}

impl ScriptedAgent {
    pub fn new(turns: Vec<ScriptedTurn>) -> Self {
        Self { turns, next: 0 }
    }

    pub fn queue(&mut self, turn: ScriptedTurn) {
        self.turns.push(turn);
    }

    pub fn next_turn(&mut self) -> ScriptedTurn {
        match self.turns.get(self.next) {
            Some(turn) => {
                self.next += 1;
                turn.clone()
            }
            None => ScriptedTurn::ending(Vec::new()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.turns.len().saturating_sub(self.next)
    }
}

/// Test harness for running combat scenarios.
pub struct TestHarness {
    pub session: CombatSession,
    pub engine: CombatEngine,
    pub agent: ScriptedAgent,
}

impl TestHarness {
    /// Fighter against goblin on a fixed seed.
    pub fn new() -> Self {
        Self::with_session(duel_session(), 42)
    }

    pub fn with_session(session: CombatSession, seed: u64) -> Self {
        Self {
            session,
            engine: seeded_engine(seed),
            agent: ScriptedAgent::default(),
        }
    }

    /// Queue a turn that keeps going while AP remains.
    pub fn expect_turn(&mut self, actions: Vec<ProposedAction>) -> &mut Self {
        self.agent.queue(ScriptedTurn::new(actions));
        self
    }

    /// Queue a turn that ends after its actions.
    pub fn expect_turn_ending(&mut self, actions: Vec<ProposedAction>) -> &mut Self {
        self.agent.queue(ScriptedTurn::ending(actions));
        self
    }

    /// Resolve the next scripted turn for whoever is on turn.
    pub fn play_turn(&mut self) -> Result<TurnReport, CombatError> {
        let turn = self.agent.next_turn();
        self.engine
            .run_turn(&mut self.session, &turn.actions, turn.end_turn)
    }

    pub fn current_actor(&self) -> CombatantId {
        self.session.resolve_current_character().clone()
    }

    pub fn hp(&self, id: &str) -> Option<i32> {
        self.session.combatant(&CombatantId::from(id)).map(|c| c.hp)
    }

    pub fn ap(&self, id: &str) -> Option<i32> {
        self.session
            .combatant(&CombatantId::from(id))
            .and_then(Combatant::current_ap)
    }

    pub fn has_effect(&self, id: &str, kind: StatusEffectKind) -> bool {
        self.session
            .combatant(&CombatantId::from(id))
            .is_some_and(|c| c.has_effect(kind))
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

#[track_caller]
pub fn assert_hp(harness: &TestHarness, id: &str, expected: i32) {
    let actual = harness.hp(id);
    assert_eq!(actual, Some(expected), "Expected {id} at {expected} HP, got {actual:?}");
}

#[track_caller]
pub fn assert_ap(harness: &TestHarness, id: &str, expected: i32) {
    let actual = harness.ap(id);
    assert_eq!(actual, Some(expected), "Expected {id} at {expected} AP, got {actual:?}");
}

#[track_caller]
pub fn assert_current_actor(harness: &TestHarness, id: &str) {
    let actual = harness.current_actor();
    assert_eq!(actual.as_str(), id, "Expected {id} on turn, got {actual}");
}

#[track_caller]
pub fn assert_has_effect(harness: &TestHarness, id: &str, kind: StatusEffectKind) {
    assert!(
        harness.has_effect(id, kind),
        "Expected {id} to have {}",
        kind.name()
    );
}

#[track_caller]
pub fn assert_outcome(harness: &TestHarness, expected: Option<CombatOutcome>) {
    assert_eq!(harness.session.outcome(), expected, "Unexpected combat outcome");
}
