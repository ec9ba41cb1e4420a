//! Errors for conditions that indicate caller bugs or corrupted state.
//!
//! Game outcomes such as a failed validation or an invalid target are not
//! errors; they come back as `ActionCheck` and `ActionResult` values.

use crate::combatant::{CombatantId, SessionId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CombatError {
    #[error("Combat requires at least one combatant")]
    EmptyRoster,

    #[error("Combatant {0} appears more than once")]
    DuplicateCombatant(CombatantId),

    #[error("Combatant {0} is not in this combat")]
    UnknownCombatant(CombatantId),

    #[error("Turn order does not match the roster: {0}")]
    TurnOrderMismatch(String),

    #[error("Turn index {index} is out of range for {len} combatants")]
    TurnIndexOutOfRange { index: usize, len: usize },

    #[error("Combat session {0} not found")]
    SessionNotFound(SessionId),

    #[error("Combat session {0} is already registered")]
    SessionExists(SessionId),

    #[error("Combat session {0} is not in progress")]
    SessionNotActive(SessionId),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}
