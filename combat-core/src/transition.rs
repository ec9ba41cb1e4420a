//! Decides whether the acting combatant keeps the turn after a batch of
//! actions, or hands it to the next combatant.

use crate::combatant::CombatantId;
use crate::error::CombatError;
use crate::session::CombatSession;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionReason {
    /// AP is exactly zero.
    ApExhausted,
    /// AP went negative through an overdraw.
    ApOverdrawn,
    /// An action in the batch failed, or the actor can no longer act.
    ActionFailed,
    /// The caller ended the turn.
    ExplicitEnd,
    /// AP remains and nothing ended the turn.
    TurnContinues,
}

impl TransitionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionReason::ApExhausted => "ap_exhausted",
            TransitionReason::ApOverdrawn => "ap_overdrawn",
            TransitionReason::ActionFailed => "action_failed",
            TransitionReason::ExplicitEnd => "explicit_end",
            TransitionReason::TurnContinues => "turn_continues",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnTransitionResult {
    pub current_actor: CombatantId,
    pub next_combatant: CombatantId,
    pub reason: TransitionReason,
    pub new_round: bool,
    pub round_number: u32,
    pub order_index: usize,
}

impl TurnTransitionResult {
    pub fn turn_passed(&self) -> bool {
        self.reason != TransitionReason::TurnContinues
    }
}

/// Resolve the turn transition for `actor` after its actions resolved.
///
/// A `hint` is taken as the reason as given (`TurnContinues` counts as no
/// hint). Without one the reason comes from the actor's AP: zero is
/// `ApExhausted`, negative is `ApOverdrawn`. With AP left, an action that
/// could not be resolved or an actor who is no longer conscious ends the
/// turn as `ActionFailed`; otherwise the same combatant keeps acting.
///
/// The turn passes from the actor's own slot in the order.
pub fn resolve_turn_transition(
    session: &mut CombatSession,
    actor: &CombatantId,
    hint: Option<TransitionReason>,
    action_failed: bool,
) -> Result<TurnTransitionResult, CombatError> {
    let combatant = session
        .combatant(actor)
        .ok_or_else(|| CombatError::UnknownCombatant(actor.clone()))?;
    let ap = combatant.current_ap().unwrap_or(0);
    let conscious = combatant.is_conscious();

    let reason = match hint {
        Some(reason) if reason != TransitionReason::TurnContinues => reason,
        _ => {
            if ap < 0 {
                TransitionReason::ApOverdrawn
            } else if ap == 0 {
                TransitionReason::ApExhausted
            } else if action_failed || !conscious {
                TransitionReason::ActionFailed
            } else {
                TransitionReason::TurnContinues
            }
        }
    };
    session.move_turn_to(actor)?;

    let result = if reason == TransitionReason::TurnContinues {
        TurnTransitionResult {
            current_actor: actor.clone(),
            next_combatant: actor.clone(),
            reason,
            new_round: false,
            round_number: session.round_number(),
            order_index: session.current_turn_index(),
        }
    } else {
        let advance = session.advance_turn();
        TurnTransitionResult {
            current_actor: actor.clone(),
            next_combatant: advance.next_character,
            reason,
            new_round: advance.new_round,
            round_number: advance.round_number,
            order_index: advance.order_index,
        }
    };

    debug!(
        actor = %actor,
        next = %result.next_combatant,
        reason = reason.as_str(),
        "turn transition"
    );
    Ok(result)
}
