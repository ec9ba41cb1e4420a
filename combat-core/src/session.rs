//! Combat session: the roster, the turn order, and the round counter.
//!
//! Turn order is fixed when the session is built. Combatants who are not
//! conscious stay in the order and are skipped when resolving or advancing
//! the turn.

use crate::combatant::{Combatant, CombatantId, SessionId};
use crate::error::CombatError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Lifecycle of an encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CombatStatus {
    #[default]
    NotStarted,
    InProgress,
    Ended,
}

/// How an encounter finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatOutcome {
    PlayersVictory,
    PlayersDefeat,
    /// Ended manually before either side was defeated.
    Terminated,
}

impl CombatOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CombatOutcome::PlayersVictory => "players_victory",
            CombatOutcome::PlayersDefeat => "players_defeat",
            CombatOutcome::Terminated => "terminated",
        }
    }
}

/// Result of [`CombatSession::advance_turn`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnAdvance {
    pub next_character: CombatantId,
    pub new_round: bool,
    pub round_number: u32,
    pub order_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatSession {
    pub session_id: SessionId,
    pub scene_id: String,
    status: CombatStatus,
    outcome: Option<CombatOutcome>,
    round_number: u32,
    turn_order: Vec<CombatantId>,
    current_turn_index: usize,
    combatants: HashMap<CombatantId, Combatant>,
}

impl CombatSession {
    /// Build a session ordered by initiative, highest first.
    ///
    /// Equal initiative keeps roster order.
    pub fn new(scene_id: impl Into<String>, roster: Vec<Combatant>) -> Result<Self, CombatError> {
        let mut ordered: Vec<&Combatant> = roster.iter().collect();
        ordered.sort_by(|a, b| b.initiative.cmp(&a.initiative));
        let turn_order = ordered.into_iter().map(|c| c.id.clone()).collect();
        Self::with_turn_order(scene_id, roster, turn_order)
    }

    /// Build a session with a turn order computed elsewhere.
    pub fn with_turn_order(
        scene_id: impl Into<String>,
        roster: Vec<Combatant>,
        turn_order: Vec<CombatantId>,
    ) -> Result<Self, CombatError> {
        if roster.is_empty() {
            return Err(CombatError::EmptyRoster);
        }

        let mut combatants = HashMap::with_capacity(roster.len());
        for combatant in roster {
            let id = combatant.id.clone();
            if combatants.insert(id.clone(), combatant).is_some() {
                return Err(CombatError::DuplicateCombatant(id));
            }
        }

        let session = Self {
            session_id: SessionId::new(),
            scene_id: scene_id.into(),
            status: CombatStatus::NotStarted,
            outcome: None,
            round_number: 1,
            turn_order,
            current_turn_index: 0,
            combatants,
        };
        session.check_invariants()?;
        Ok(session)
    }

    pub fn with_session_id(mut self, session_id: SessionId) -> Self {
        self.session_id = session_id;
        self
    }

    /// Verify the structural invariants of the session.
    ///
    /// Sessions built through the constructors always pass; this guards
    /// sessions that arrive from deserialization.
    pub fn check_invariants(&self) -> Result<(), CombatError> {
        if self.turn_order.is_empty() {
            return Err(CombatError::EmptyRoster);
        }
        if self.current_turn_index >= self.turn_order.len() {
            return Err(CombatError::TurnIndexOutOfRange {
                index: self.current_turn_index,
                len: self.turn_order.len(),
            });
        }

        let mut seen = HashSet::with_capacity(self.turn_order.len());
        for id in &self.turn_order {
            if !seen.insert(id) {
                return Err(CombatError::DuplicateCombatant(id.clone()));
            }
            if !self.combatants.contains_key(id) {
                return Err(CombatError::UnknownCombatant(id.clone()));
            }
        }
        if seen.len() != self.combatants.len() {
            return Err(CombatError::TurnOrderMismatch(format!(
                "{} combatants but {} in turn order",
                self.combatants.len(),
                seen.len()
            )));
        }
        if self.round_number == 0 {
            return Err(CombatError::TurnOrderMismatch(
                "round number must start at 1".to_string(),
            ));
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn status(&self) -> CombatStatus {
        self.status
    }

    pub fn outcome(&self) -> Option<CombatOutcome> {
        self.outcome
    }

    pub fn is_active(&self) -> bool {
        self.status == CombatStatus::InProgress
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn turn_order(&self) -> &[CombatantId] {
        &self.turn_order
    }

    pub fn current_turn_index(&self) -> usize {
        self.current_turn_index
    }

    pub fn combatant(&self, id: &CombatantId) -> Option<&Combatant> {
        self.combatants.get(id)
    }

    pub fn combatant_mut(&mut self, id: &CombatantId) -> Option<&mut Combatant> {
        self.combatants.get_mut(id)
    }

    /// Combatants in turn order.
    pub fn combatants(&self) -> impl Iterator<Item = &Combatant> {
        self.turn_order.iter().filter_map(|id| self.combatants.get(id))
    }

    fn is_conscious_at(&self, index: usize) -> bool {
        self.combatants
            .get(&self.turn_order[index])
            .is_some_and(Combatant::is_conscious)
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Begin the encounter and open the first conscious combatant's turn.
    pub fn start(&mut self) -> CombatantId {
        self.status = CombatStatus::InProgress;
        self.round_number = 1;
        self.current_turn_index = self.resolve_current_index();
        let first = self.turn_order[self.current_turn_index].clone();
        if let Some(combatant) = self.combatants.get_mut(&first) {
            combatant.start_turn();
        }
        info!(
            session = %self.session_id,
            scene = %self.scene_id,
            combatants = self.turn_order.len(),
            first = %first,
            "combat started"
        );
        first
    }

    pub fn end(&mut self, outcome: CombatOutcome) {
        self.status = CombatStatus::Ended;
        self.outcome = Some(outcome);
        info!(
            session = %self.session_id,
            outcome = outcome.as_str(),
            round = self.round_number,
            "combat ended"
        );
    }

    // ------------------------------------------------------------------------
    // Turns
    // ------------------------------------------------------------------------

    fn resolve_current_index(&self) -> usize {
        let len = self.turn_order.len();
        (0..len)
            .map(|offset| (self.current_turn_index + offset) % len)
            .find(|&index| self.is_conscious_at(index))
            .unwrap_or(self.current_turn_index)
    }

    /// The combatant whose turn it is, skipping anyone not conscious.
    ///
    /// The stored index is not moved. If nobody is conscious the stored
    /// index is returned as-is.
    pub fn resolve_current_character(&self) -> &CombatantId {
        &self.turn_order[self.resolve_current_index()]
    }

    /// Point the stored turn index at `actor_id`'s slot in the order.
    ///
    /// The stored index can lag behind the acting combatant when the one it
    /// names went down before acting.
    pub fn move_turn_to(&mut self, actor_id: &CombatantId) -> Result<usize, CombatError> {
        let index = self
            .turn_order
            .iter()
            .position(|id| id == actor_id)
            .ok_or_else(|| CombatError::UnknownCombatant(actor_id.clone()))?;
        self.current_turn_index = index;
        Ok(index)
    }

    /// True once the actor has no AP left (exactly zero or overdrawn).
    ///
    /// A combatant without an AP budget, or not in the session, has nothing
    /// left to spend.
    pub fn should_end_turn(&self, actor_id: &CombatantId) -> bool {
        self.combatants
            .get(actor_id)
            .and_then(Combatant::current_ap)
            .map_or(true, |ap| ap <= 0)
    }

    /// Pass the turn to the next conscious combatant.
    ///
    /// Wrapping past the end of the order starts a new round. When the
    /// current combatant is the only conscious one, the index stays put and
    /// no new round is reported.
    pub fn advance_turn(&mut self) -> TurnAdvance {
        let len = self.turn_order.len();
        let from = self.current_turn_index;

        let next = (1..=len)
            .map(|step| (from + step, (from + step) % len))
            .find(|&(_, index)| index != from && self.is_conscious_at(index));

        let new_round = match next {
            Some((raw, index)) => {
                self.current_turn_index = index;
                raw >= len
            }
            None => false,
        };

        if new_round {
            self.round_number += 1;
            info!(session = %self.session_id, round = self.round_number, "new round");
        }

        let next_character = self.turn_order[self.current_turn_index].clone();
        if let Some(combatant) = self.combatants.get_mut(&next_character) {
            if combatant.is_conscious() {
                let expired = combatant.start_turn();
                if !expired.is_empty() {
                    debug!(combatant = %next_character, ?expired, "status effects expired");
                }
            }
        }

        debug!(
            session = %self.session_id,
            next = %next_character,
            round = self.round_number,
            new_round,
            "turn advanced"
        );

        TurnAdvance {
            next_character,
            new_round,
            round_number: self.round_number,
            order_index: self.current_turn_index,
        }
    }

    /// Which side, if any, has been wiped out.
    ///
    /// Uses `hp` only. A side with no members is never considered defeated.
    pub fn check_victory_conditions(&self) -> Option<CombatOutcome> {
        let side_down = |npc: bool| {
            let mut side = self.combatants.values().filter(|c| c.is_npc == npc).peekable();
            side.peek().is_some() && side.all(Combatant::is_defeated)
        };

        if side_down(true) {
            Some(CombatOutcome::PlayersVictory)
        } else if side_down(false) {
            Some(CombatOutcome::PlayersDefeat)
        } else {
            None
        }
    }
}
