//! Turn-based combat engine for narrative tabletop play.
//!
//! This crate provides:
//! - Initiative ordering, rounds and turn passing
//! - Action points with tracked overdraw
//! - An action catalog and pre-resolution validation
//! - Action resolution with dice, status effects and HP
//! - HP-based victory detection
//! - A keyed repository of concurrent sessions
//!
//! # Quick Start
//!
//! ```
//! use combat_core::{CombatConfig, CombatEngine, CombatSession, Combatant, ProposedAction};
//!
//! let roster = vec![
//!     Combatant::new("fighter", "Fighter", 20, 16).with_initiative(15),
//!     Combatant::new("goblin", "Goblin", 7, 13).with_initiative(12).npc(),
//! ];
//! let mut session = CombatSession::new("goblin ambush", roster)?;
//! session.start();
//!
//! let mut engine = CombatEngine::seeded(CombatConfig::default(), 7);
//! let attack = ProposedAction::new("fighter", "basic_attack").targeting("goblin");
//! let report = engine.run_turn(&mut session, &[attack], false)?;
//!
//! assert_eq!(report.entries.len(), 1);
//! assert_eq!(session.combatant(&"fighter".into()).unwrap().current_ap(), Some(1));
//! # Ok::<(), combat_core::CombatError>(())
//! ```

pub mod ap;
pub mod catalog;
pub mod combatant;
pub mod config;
pub mod dice;
pub mod engine;
pub mod error;
pub mod record;
pub mod repository;
pub mod session;
pub mod testing;
pub mod transition;
pub mod validator;

// Primary public API
pub use ap::{calculate_max_ap, ActionPointBudget, ApConfig};
pub use catalog::{ActionCatalog, ActionCategory, ActionDefinition, ActionType, UnknownAction};
pub use combatant::{Combatant, CombatantId, SessionId, StatusEffect, StatusEffectKind};
pub use config::CombatConfig;
pub use dice::{Advantage, DiceError, DiceExpression, RollResult, MAX_DICE_PER_GROUP};
pub use engine::{
    validate_target, ActionParams, CombatEngine, ProposedAction, TurnEntry, TurnReport,
};
pub use error::CombatError;
pub use record::{ActionResult, AttackRoll, INVALID_TARGET};
pub use repository::{SessionHandle, SessionRepository};
pub use session::{CombatOutcome, CombatSession, CombatStatus, TurnAdvance};
pub use transition::{resolve_turn_transition, TransitionReason, TurnTransitionResult};
pub use validator::{can_perform_action, check_action, ActionCheck, OverdrawLevel};
