//! Combat engine: resolves actions against a combat session.
//!
//! This module implements the resolution pipeline:
//! 1. An external agent proposes what a combatant does (`ProposedAction`)
//! 2. The validator screens it (consciousness, effects, AP)
//! 3. The engine validates the target, charges AP and runs the handler
//! 4. The handler mutates the session in place and reports an `ActionResult`
//! 5. The turn transition decides who acts next
//!
//! Resolution is synchronous. Given the same seed and inputs it replays the
//! same rolls and the same state.

use crate::catalog::ActionType;
use crate::combatant::{Combatant, CombatantId, StatusEffect, StatusEffectKind};
use crate::config::CombatConfig;
use crate::dice::{Advantage, DiceExpression, RollResult};
use crate::error::CombatError;
use crate::record::{ActionResult, AttackRoll};
use crate::session::{CombatOutcome, CombatSession};
use crate::transition::{resolve_turn_transition, TransitionReason, TurnTransitionResult};
use crate::validator::{can_perform_action, ActionCheck};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const SIMPLE_SPELL_DICE: &str = "1d10";
const COMPLEX_SPELL_DICE: &str = "3d6";
const HEALING_DICE: &str = "2d4+2";

/// Optional knobs for a single action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionParams {
    /// Overrides the weapon or spell damage.
    pub damage_dice: Option<String>,
    /// Overrides the healing roll.
    pub healing_dice: Option<String>,
    /// Distance for move/dash before dash doubling.
    pub distance_feet: Option<u32>,
    /// Number of rolls for a full attack.
    pub attacks: Option<u32>,
    /// DC for hide and search.
    pub dc: Option<i32>,
    /// Extra advantage or disadvantage from the narrative.
    pub advantage: Advantage,
    /// Free text attached to marker effects (what was readied, which ability).
    pub note: Option<String>,
}

impl ActionParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_damage_dice(mut self, dice: impl Into<String>) -> Self {
        self.damage_dice = Some(dice.into());
        self
    }

    pub fn with_healing_dice(mut self, dice: impl Into<String>) -> Self {
        self.healing_dice = Some(dice.into());
        self
    }

    pub fn with_distance(mut self, feet: u32) -> Self {
        self.distance_feet = Some(feet);
        self
    }

    pub fn with_attacks(mut self, attacks: u32) -> Self {
        self.attacks = Some(attacks);
        self
    }

    pub fn with_dc(mut self, dc: i32) -> Self {
        self.dc = Some(dc);
        self
    }

    pub fn with_advantage(mut self, advantage: Advantage) -> Self {
        self.advantage = advantage;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// One action proposed for the combatant on turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedAction {
    pub actor: CombatantId,
    /// Action name as proposed; matched against the catalog.
    pub action: String,
    pub target: Option<CombatantId>,
    /// The free-text intent behind the action.
    #[serde(default)]
    pub intent: String,
    #[serde(default)]
    pub params: ActionParams,
}

impl ProposedAction {
    pub fn new(actor: impl Into<CombatantId>, action: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            action: action.into(),
            target: None,
            intent: String::new(),
            params: ActionParams::default(),
        }
    }

    pub fn targeting(mut self, target: impl Into<CombatantId>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = intent.into();
        self
    }

    pub fn with_params(mut self, params: ActionParams) -> Self {
        self.params = params;
        self
    }
}

/// A proposal, the validator's verdict on it, and its outcome if it ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnEntry {
    pub proposal: ProposedAction,
    pub check: ActionCheck,
    pub result: Option<ActionResult>,
}

/// Everything that happened while resolving one batch for one combatant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReport {
    pub actor: CombatantId,
    pub entries: Vec<TurnEntry>,
    /// Proposals left unresolved because the turn or the encounter ended.
    pub skipped: Vec<ProposedAction>,
    /// `None` when the encounter was decided during this batch.
    pub transition: Option<TurnTransitionResult>,
    pub outcome: Option<CombatOutcome>,
}

impl TurnReport {
    pub fn results(&self) -> impl Iterator<Item = &ActionResult> {
        self.entries.iter().filter_map(|e| e.result.as_ref())
    }
}

/// Check that `target_id` can be targeted.
///
/// The error string is the description used for the invalid-target result,
/// so every targeting action reports the same text.
pub fn validate_target<'a>(
    session: &'a CombatSession,
    target_id: &CombatantId,
    allow_unconscious: bool,
) -> Result<&'a Combatant, String> {
    let Some(target) = session.combatant(target_id) else {
        return Err(not_in_combat(session, target_id));
    };
    if target.is_defeated() {
        return Err(format!(
            "{} is not a valid target: target is defeated",
            target.name
        ));
    }
    if !allow_unconscious && !target.is_conscious() {
        return Err(format!(
            "{} is not a valid target: target is unconscious",
            target.name
        ));
    }
    Ok(target)
}

fn not_in_combat(session: &CombatSession, id: &CombatantId) -> String {
    let live: Vec<&str> = session
        .combatants()
        .filter(|c| !c.is_defeated())
        .map(|c| c.name.as_str())
        .collect();
    format!("{id} not in combat. Combatants: {}", live.join(", "))
}

/// Short HP readout appended to damage and healing descriptions.
fn hp_status(combatant: &Combatant) -> String {
    let (hp, max) = (combatant.hp, combatant.max_hp);
    if combatant.is_defeated() {
        format!(" (HP: 0/{max} - {} falls!)", combatant.name)
    } else if hp <= max / 4 {
        format!(" (HP: {hp}/{max} - critically wounded)")
    } else if hp <= max / 2 {
        format!(" (HP: {hp}/{max} - bloodied)")
    } else {
        format!(" (HP: {hp}/{max})")
    }
}

/// Stack roll modifiers: any advantage against any disadvantage is a
/// straight roll, however many sources each side has.
fn stack_advantage(sources: &[Advantage]) -> Advantage {
    let side = |kind: Advantage| {
        sources
            .iter()
            .filter(|&&source| source == kind)
            .fold(Advantage::Normal, |acc, &source| acc.combine(source))
    };
    side(Advantage::Advantage).combine(side(Advantage::Disadvantage))
}

/// An action paired with its validated target, if it takes one.
enum Plan {
    Attack(ActionType, CombatantId),
    Defend,
    Move(ActionType),
    Disengage,
    Hide,
    Search,
    Help(CombatantId),
    Contest(ActionType, CombatantId),
    Marker(ActionType),
    Heal(CombatantId),
    Recover,
}

impl Plan {
    fn target(&self) -> Option<&CombatantId> {
        match self {
            Plan::Attack(_, target)
            | Plan::Help(target)
            | Plan::Contest(_, target)
            | Plan::Heal(target) => Some(target),
            Plan::Defend
            | Plan::Move(_)
            | Plan::Disengage
            | Plan::Hide
            | Plan::Search
            | Plan::Marker(_)
            | Plan::Recover => None,
        }
    }
}

/// The mechanics resolver.
pub struct CombatEngine<R = StdRng> {
    config: CombatConfig,
    rng: R,
}

impl CombatEngine<StdRng> {
    pub fn new(config: CombatConfig) -> Self {
        Self {
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// An engine whose rolls replay identically for the same seed.
    pub fn seeded(config: CombatConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for CombatEngine<StdRng> {
    fn default() -> Self {
        Self::new(CombatConfig::default())
    }
}

impl<R: Rng> CombatEngine<R> {
    pub fn with_rng(config: CombatConfig, rng: R) -> Self {
        Self { config, rng }
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Entry points
    // ------------------------------------------------------------------------

    /// Resolve an action given by name. Unknown names produce the
    /// invalid-target result.
    pub fn process_named_action(
        &mut self,
        session: &mut CombatSession,
        actor_id: &CombatantId,
        action_name: &str,
        target_id: Option<&CombatantId>,
        params: &ActionParams,
    ) -> ActionResult {
        match action_name.parse::<ActionType>() {
            Ok(action) => self.process_action(session, actor_id, action, target_id, params),
            Err(unknown) => {
                warn!(actor = %actor_id, action = action_name, "unknown action type");
                ActionResult::invalid_target(
                    action_name,
                    actor_id.clone(),
                    target_id.cloned(),
                    unknown.to_string(),
                )
            }
        }
    }

    /// Resolve one action and apply it to the session.
    ///
    /// Target problems return the invalid-target result and charge nothing.
    /// Otherwise the catalog cost is charged first, even if that overdraws
    /// the actor, and the action's handler runs.
    pub fn process_action(
        &mut self,
        session: &mut CombatSession,
        actor_id: &CombatantId,
        action: ActionType,
        target_id: Option<&CombatantId>,
        params: &ActionParams,
    ) -> ActionResult {
        let invalid = |target: Option<&CombatantId>, description: String| {
            warn!(actor = %actor_id, action = %action, %description, "invalid target");
            ActionResult::invalid_target(action.name(), actor_id.clone(), target.cloned(), description)
        };

        if session.combatant(actor_id).is_none() {
            return invalid(target_id, not_in_combat(session, actor_id));
        }

        let plan = match self.plan(session, actor_id, action, target_id) {
            Ok(plan) => plan,
            Err((target, description)) => return invalid(target.as_ref(), description),
        };
        let target = plan.target().cloned();

        let Some(cost) = self.config.catalog.definition(action).map(|d| d.cost) else {
            warn!(action = %action, "action missing from catalog");
            return ActionResult::invalid_target(
                action.name(),
                actor_id.clone(),
                target,
                format!("Unknown action: {action}"),
            );
        };

        let mut result = ActionResult::new(action, actor_id.clone(), target);
        result.ap_cost = Some(cost);
        if let Some(budget) = session.combatant_mut(actor_id).and_then(|c| c.ap.as_mut()) {
            if !budget.spend_ap(cost) {
                result.overdrawn = true;
                warn!(
                    actor = %actor_id,
                    action = %action,
                    cost,
                    remaining = budget.current_ap,
                    "AP overdrawn"
                );
            }
        }

        match &plan {
            Plan::Attack(action, target) => {
                self.resolve_attack(session, *action, actor_id, target, params, &mut result)
            }
            Plan::Defend => self.resolve_defend(session, actor_id, &mut result),
            Plan::Move(action) => self.resolve_move(session, *action, actor_id, params, &mut result),
            Plan::Disengage => self.resolve_disengage(session, actor_id, &mut result),
            Plan::Hide => self.resolve_hide(session, actor_id, params, &mut result),
            Plan::Search => self.resolve_search(session, actor_id, params, &mut result),
            Plan::Help(target) => self.resolve_help(session, actor_id, target, &mut result),
            Plan::Contest(action, target) => {
                self.resolve_contest(session, *action, actor_id, target, params, &mut result)
            }
            Plan::Marker(action) => {
                self.resolve_marker(session, *action, actor_id, params, &mut result)
            }
            Plan::Heal(target) => self.resolve_heal(session, actor_id, target, params, &mut result),
            Plan::Recover => self.resolve_recover(session, actor_id, params, &mut result),
        }

        debug!(
            actor = %actor_id,
            action = %action,
            target = ?result.target_id,
            cost,
            success = result.success,
            "action resolved"
        );
        result
    }

    /// Resolve a batch of proposals for the combatant currently on turn.
    ///
    /// Proposals run strictly in order. An action the actor cannot afford
    /// still runs as an overdraw; any other validation failure is recorded
    /// and skipped. Validation failures, invalid targets and unknown actions
    /// count as failed actions for the turn transition; a miss does not.
    /// Once the actor's AP is spent, or one side is defeated, the rest of
    /// the batch is left unresolved. A decided encounter is
    /// ended; otherwise the turn transition is resolved, with `end_turn`
    /// forcing the turn to pass.
    pub fn run_turn(
        &mut self,
        session: &mut CombatSession,
        actions: &[ProposedAction],
        end_turn: bool,
    ) -> Result<TurnReport, CombatError> {
        if !session.is_active() {
            return Err(CombatError::SessionNotActive(session.session_id));
        }

        let actor = session.resolve_current_character().clone();
        let mut report = TurnReport {
            actor: actor.clone(),
            entries: Vec::with_capacity(actions.len()),
            skipped: Vec::new(),
            transition: None,
            outcome: None,
        };
        let mut any_failed = false;

        for (index, proposal) in actions.iter().enumerate() {
            let turn_spent = !report.entries.is_empty() && session.should_end_turn(&actor);
            if turn_spent || session.check_victory_conditions().is_some() {
                report.skipped.extend(actions[index..].iter().cloned());
                break;
            }

            if proposal.actor != actor {
                any_failed = true;
                report.entries.push(TurnEntry {
                    proposal: proposal.clone(),
                    check: ActionCheck::denied(format!("Not {}'s turn", proposal.actor), 0, 0),
                    result: None,
                });
                continue;
            }

            let combatant = session
                .combatant(&actor)
                .ok_or_else(|| CombatError::UnknownCombatant(actor.clone()))?;
            let check = can_perform_action(combatant, &proposal.action, &self.config.catalog);

            if !check.can_act && !check.is_ap_shortfall() {
                debug!(actor = %actor, action = %proposal.action, reason = ?check.reason, "action rejected");
                any_failed = true;
                report.entries.push(TurnEntry {
                    proposal: proposal.clone(),
                    check,
                    result: None,
                });
                continue;
            }

            let result = self.process_named_action(
                session,
                &actor,
                &proposal.action,
                proposal.target.as_ref(),
                &proposal.params,
            );
            // A miss or a lost contest is an outcome; only unresolvable actions fail.
            any_failed |= result.is_invalid_target();
            report.entries.push(TurnEntry {
                proposal: proposal.clone(),
                check,
                result: Some(result),
            });
        }

        if let Some(outcome) = session.check_victory_conditions() {
            debug!(actor = %actor, outcome = outcome.as_str(), "encounter decided");
            session.end(outcome);
            report.outcome = Some(outcome);
            return Ok(report);
        }

        let hint = end_turn.then_some(TransitionReason::ExplicitEnd);
        report.transition = Some(resolve_turn_transition(session, &actor, hint, any_failed)?);
        Ok(report)
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    /// Pair `action` with its target, checking the target the same way for
    /// every action that takes one. Errors carry the target as submitted and
    /// the description for the invalid-target result.
    fn plan(
        &self,
        session: &CombatSession,
        actor_id: &CombatantId,
        action: ActionType,
        target_id: Option<&CombatantId>,
    ) -> Result<Plan, (Option<CombatantId>, String)> {
        let required = || -> Result<CombatantId, (Option<CombatantId>, String)> {
            let Some(target_id) = target_id else {
                return Err((None, format!("{action} requires a target")));
            };
            let rejected = |description: String| (Some(target_id.clone()), description);
            if target_id == actor_id {
                return Err(rejected(format!(
                    "{} cannot use {action} on itself",
                    Self::name_of(session, actor_id)
                )));
            }
            validate_target(session, target_id, false).map_err(rejected)?;
            Ok(target_id.clone())
        };

        Ok(match action {
            ActionType::BasicAttack
            | ActionType::FullAttack
            | ActionType::SimpleSpell
            | ActionType::ComplexSpell => Plan::Attack(action, required()?),
            ActionType::Grapple | ActionType::Shove => Plan::Contest(action, required()?),
            ActionType::Help => {
                let ally = required()?;
                let same_side = match (session.combatant(actor_id), session.combatant(&ally)) {
                    (Some(actor), Some(target)) => actor.is_npc == target.is_npc,
                    _ => false,
                };
                if !same_side {
                    let description = format!(
                        "{} is not a valid target: target is not an ally",
                        Self::name_of(session, &ally)
                    );
                    return Err((Some(ally), description));
                }
                Plan::Help(ally)
            }
            ActionType::Heal => {
                let target_id = target_id.unwrap_or(actor_id);
                validate_target(session, target_id, true)
                    .map_err(|description| (Some(target_id.clone()), description))?;
                Plan::Heal(target_id.clone())
            }
            ActionType::Defend => Plan::Defend,
            ActionType::Move | ActionType::Dash => Plan::Move(action),
            ActionType::Disengage => Plan::Disengage,
            ActionType::Hide => Plan::Hide,
            ActionType::Search => Plan::Search,
            ActionType::ReadyAction | ActionType::BonusAction | ActionType::SpecialAbility => {
                Plan::Marker(action)
            }
            ActionType::Recover => Plan::Recover,
        })
    }

    fn expression(&self, notation: &str) -> DiceExpression {
        DiceExpression::parse(notation).unwrap_or_else(|err| {
            warn!(notation, %err, "bad dice notation, rolling a flat 1");
            DiceExpression::flat(1)
        })
    }

    fn d20(&mut self, modifier: i32, advantage: Advantage) -> RollResult {
        DiceExpression::d20(modifier).roll_with_advantage(advantage, &mut self.rng)
    }

    /// Apply the catalog's granted effects for `action` to `recipient`.
    fn grant(
        &self,
        session: &mut CombatSession,
        action: ActionType,
        recipient: &CombatantId,
        source: &str,
        note: Option<&str>,
        result: &mut ActionResult,
    ) {
        let Some(definition) = self.config.catalog.definition(action) else {
            return;
        };
        let Some(combatant) = session.combatant_mut(recipient) else {
            return;
        };
        for &kind in &definition.grants {
            let mut effect = StatusEffect::new(kind, source);
            if let Some(note) = note {
                effect = effect.with_description(note);
            }
            combatant.add_effect(effect);
            result.applied(kind.name());
        }
    }

    fn name_of(session: &CombatSession, id: &CombatantId) -> String {
        session
            .combatant(id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    // ------------------------------------------------------------------------
    // Handlers
    // ------------------------------------------------------------------------

    fn resolve_attack(
        &mut self,
        session: &mut CombatSession,
        action: ActionType,
        actor_id: &CombatantId,
        target_id: &CombatantId,
        params: &ActionParams,
        result: &mut ActionResult,
    ) {
        let (Some(attacker), Some(target)) = (session.combatant(actor_id), session.combatant(target_id))
        else {
            return;
        };

        let attacker_name = attacker.name.clone();
        let target_name = target.name.clone();
        let attack_bonus = attacker.attack_bonus;
        let helped = attacker.has_effect(StatusEffectKind::Helped);
        let hidden = attacker.has_effect(StatusEffectKind::Hidden);
        let attacker_prone = attacker.has_effect(StatusEffectKind::Prone);
        let target_prone = target.has_effect(StatusEffectKind::Prone);
        let target_ac = if target.has_effect(StatusEffectKind::Defending) {
            target.ac + self.config.defend_ac_bonus
        } else {
            target.ac
        };

        let notation = match (&params.damage_dice, action) {
            (Some(dice), _) => dice.clone(),
            (None, ActionType::SimpleSpell) => SIMPLE_SPELL_DICE.to_string(),
            (None, ActionType::ComplexSpell) => COMPLEX_SPELL_DICE.to_string(),
            (None, _) => attacker.damage_dice.clone(),
        };
        let damage_dice = self.expression(&notation);

        let swings = if action == ActionType::FullAttack {
            params.attacks.unwrap_or(self.config.full_attack_count).max(1)
        } else {
            1
        };

        let mut total_damage = 0;
        for swing in 0..swings {
            let advantage = stack_advantage(&[
                params.advantage,
                if swing == 0 && (helped || hidden) {
                    Advantage::Advantage
                } else {
                    Advantage::Normal
                },
                if target_prone {
                    Advantage::Advantage
                } else {
                    Advantage::Normal
                },
                if attacker_prone {
                    Advantage::Disadvantage
                } else {
                    Advantage::Normal
                },
            ]);
            let attack = self.d20(attack_bonus, advantage);
            let critical = attack.is_critical();
            let hit = !attack.is_fumble() && (critical || attack.total >= target_ac);

            let mut roll = AttackRoll {
                total: attack.total,
                natural: attack.natural,
                target_ac,
                hit,
                critical,
                damage: 0,
            };
            result.rolls.push(attack);

            if hit {
                let dice = if critical {
                    damage_dice.doubled().unwrap_or_else(|err| {
                        warn!(%err, "critical dice out of range, rolling normal damage");
                        damage_dice.clone()
                    })
                } else {
                    damage_dice.clone()
                };
                let damage_roll = dice.roll(&mut self.rng);
                if let Some(target) = session.combatant_mut(target_id) {
                    roll.damage = target.take_damage(damage_roll.total.max(1));
                }
                result.rolls.push(damage_roll);
            }

            total_damage += roll.damage;
            result.attacks.push(roll);

            if session.combatant(target_id).is_some_and(Combatant::is_defeated) {
                break;
            }
        }

        if let Some(attacker) = session.combatant_mut(actor_id) {
            if helped && attacker.remove_effect(StatusEffectKind::Helped) {
                result.removed(StatusEffectKind::Helped.name());
            }
            if hidden && attacker.remove_effect(StatusEffectKind::Hidden) {
                result.removed(StatusEffectKind::Hidden.name());
            }
        }

        let hits = result.attacks.iter().filter(|a| a.hit).count();
        let any_critical = result.attacks.iter().any(|a| a.critical);
        result.success = hits > 0;
        result.damage = Some(total_damage);
        result.attack_roll = result.attacks.first().map(|a| a.total);
        result.critical = Some(any_critical);

        let Some(target) = session.combatant(target_id) else {
            return;
        };
        if target.is_defeated() {
            result.applied(StatusEffectKind::Unconscious.name());
        }

        let verb = if matches!(action, ActionType::SimpleSpell | ActionType::ComplexSpell) {
            "casts at"
        } else {
            "attacks"
        };
        result.description = if result.attacks.len() == 1 {
            let roll = &result.attacks[0];
            if roll.hit {
                format!(
                    "{attacker_name} {verb} {target_name} and hits{} for {total_damage} damage (roll {} vs AC {target_ac}){}",
                    if roll.critical { " critically" } else { "" },
                    roll.total,
                    hp_status(target)
                )
            } else {
                format!(
                    "{attacker_name} {verb} {target_name} and misses (roll {} vs AC {target_ac})",
                    roll.total
                )
            }
        } else {
            format!(
                "{attacker_name} {verb} {target_name} {} times: {hits} hit for {total_damage} damage{}",
                result.attacks.len(),
                hp_status(target)
            )
        };
    }

    fn resolve_defend(
        &mut self,
        session: &mut CombatSession,
        actor_id: &CombatantId,
        result: &mut ActionResult,
    ) {
        let name = Self::name_of(session, actor_id);
        self.grant(session, ActionType::Defend, actor_id, &name, None, result);
        result.success = true;
        result.ac_bonus = Some(self.config.defend_ac_bonus);
        result.description = format!(
            "{name} takes a defensive stance (+{} AC until their next turn)",
            self.config.defend_ac_bonus
        );
    }

    fn resolve_move(
        &mut self,
        session: &mut CombatSession,
        action: ActionType,
        actor_id: &CombatantId,
        params: &ActionParams,
        result: &mut ActionResult,
    ) {
        let name = Self::name_of(session, actor_id);
        let Some(actor) = session.combatant_mut(actor_id) else {
            return;
        };

        if actor.has_effect(StatusEffectKind::Grappled) {
            result.applied("movement_blocked");
            result.distance_feet = Some(0);
            result.description = format!("{name} is grappled and cannot move");
            return;
        }

        if actor.remove_effect(StatusEffectKind::Prone) {
            result.removed(StatusEffectKind::Prone.name());
        }

        let base = params.distance_feet.unwrap_or(self.config.base_speed_feet);
        let (distance, verb) = if action == ActionType::Dash {
            (base * 2, "dashes")
        } else {
            (base, "moves")
        };

        self.grant(session, action, actor_id, &name, None, result);
        result.success = true;
        result.distance_feet = Some(distance);
        result.description = format!("{name} {verb} {distance} feet");
    }

    fn resolve_disengage(
        &mut self,
        session: &mut CombatSession,
        actor_id: &CombatantId,
        result: &mut ActionResult,
    ) {
        let name = Self::name_of(session, actor_id);
        self.grant(session, ActionType::Disengage, actor_id, &name, None, result);
        result.success = true;
        result.description = format!("{name} disengages, slipping out of reach");
    }

    fn resolve_hide(
        &mut self,
        session: &mut CombatSession,
        actor_id: &CombatantId,
        params: &ActionParams,
        result: &mut ActionResult,
    ) {
        let Some(actor) = session.combatant(actor_id) else {
            return;
        };
        let name = actor.name.clone();
        let bonus = actor.attack_bonus;
        let dc = params.dc.unwrap_or(self.config.check_dc);

        let roll = self.d20(bonus, params.advantage);
        let total = roll.total;
        let passed = roll.meets_dc(dc);
        result.check_roll = Some(total);
        result.rolls.push(roll);

        if passed {
            self.grant(session, ActionType::Hide, actor_id, &name, None, result);
            result.success = true;
            result.description = format!("{name} slips out of sight (stealth {total} vs DC {dc})");
        } else {
            result.applied("hide_failed");
            result.description = format!("{name} fails to hide (stealth {total} vs DC {dc})");
        }
    }

    fn resolve_search(
        &mut self,
        session: &mut CombatSession,
        actor_id: &CombatantId,
        params: &ActionParams,
        result: &mut ActionResult,
    ) {
        let Some(actor) = session.combatant(actor_id) else {
            return;
        };
        let name = actor.name.clone();
        let bonus = actor.attack_bonus;
        let side = actor.is_npc;
        let dc = params.dc.unwrap_or(self.config.check_dc);

        let roll = self.d20(bonus, params.advantage);
        let total = roll.total;
        let passed = roll.meets_dc(dc);
        result.check_roll = Some(total);
        result.rolls.push(roll);

        if !passed {
            result.applied("search_failed");
            result.description = format!("{name} searches but finds nothing (perception {total} vs DC {dc})");
            return;
        }

        let hidden: Vec<CombatantId> = session
            .combatants()
            .filter(|c| c.is_npc != side && c.has_effect(StatusEffectKind::Hidden))
            .map(|c| c.id.clone())
            .collect();

        let mut revealed = Vec::with_capacity(hidden.len());
        for id in &hidden {
            if let Some(found) = session.combatant_mut(id) {
                found.remove_effect(StatusEffectKind::Hidden);
                revealed.push(found.name.clone());
                result.removed(StatusEffectKind::Hidden.name());
            }
        }

        result.success = true;
        result.description = if revealed.is_empty() {
            format!("{name} searches the area; nobody is hiding (perception {total} vs DC {dc})")
        } else {
            format!(
                "{name} spots {} (perception {total} vs DC {dc})",
                revealed.join(", ")
            )
        };
    }

    fn resolve_help(
        &mut self,
        session: &mut CombatSession,
        actor_id: &CombatantId,
        target_id: &CombatantId,
        result: &mut ActionResult,
    ) {
        let name = Self::name_of(session, actor_id);
        let ally = Self::name_of(session, target_id);
        self.grant(session, ActionType::Help, target_id, &name, None, result);
        result.success = true;
        result.description = format!("{name} helps {ally}, granting advantage on their next attack");
    }

    fn resolve_contest(
        &mut self,
        session: &mut CombatSession,
        action: ActionType,
        actor_id: &CombatantId,
        target_id: &CombatantId,
        params: &ActionParams,
        result: &mut ActionResult,
    ) {
        let (Some(actor), Some(target)) = (session.combatant(actor_id), session.combatant(target_id))
        else {
            return;
        };
        let name = actor.name.clone();
        let target_name = target.name.clone();
        let (ours, theirs) = (actor.attack_bonus, target.attack_bonus);

        let attempt = self.d20(ours, params.advantage);
        let resist = self.d20(theirs, Advantage::Normal);
        let (attempt_total, resist_total) = (attempt.total, resist.total);
        result.check_roll = Some(attempt_total);
        result.opposed_roll = Some(resist_total);
        result.rolls.push(attempt);
        result.rolls.push(resist);

        // Ties go to the defender.
        if attempt_total > resist_total {
            self.grant(session, action, target_id, &name, None, result);
            result.success = true;
            let outcome = if action == ActionType::Grapple {
                "grapples"
            } else {
                "shoves down"
            };
            result.description =
                format!("{name} {outcome} {target_name} ({attempt_total} vs {resist_total})");
        } else {
            result.applied(format!("{action}_failed"));
            result.description = format!(
                "{name} tries to {action} {target_name} but fails ({attempt_total} vs {resist_total})"
            );
        }
    }

    fn resolve_marker(
        &mut self,
        session: &mut CombatSession,
        action: ActionType,
        actor_id: &CombatantId,
        params: &ActionParams,
        result: &mut ActionResult,
    ) {
        let name = Self::name_of(session, actor_id);
        self.grant(session, action, actor_id, &name, params.note.as_deref(), result);
        result.success = true;

        let what = match action {
            ActionType::ReadyAction => "readies an action",
            ActionType::BonusAction => "uses a bonus action",
            _ => "uses a special ability",
        };
        result.description = match &params.note {
            Some(note) => format!("{name} {what}: {note}"),
            None => format!("{name} {what}"),
        };
    }

    fn resolve_heal(
        &mut self,
        session: &mut CombatSession,
        actor_id: &CombatantId,
        target_id: &CombatantId,
        params: &ActionParams,
        result: &mut ActionResult,
    ) {
        let healer = Self::name_of(session, actor_id);
        let notation = params.healing_dice.as_deref().unwrap_or(HEALING_DICE);
        let roll = self.expression(notation).roll(&mut self.rng);
        let amount = roll.total.max(0);
        result.rolls.push(roll);

        let Some(target) = session.combatant_mut(target_id) else {
            return;
        };
        let healed = target.heal(amount);
        result.success = true;
        result.healing = Some(healed);

        let status = hp_status(target);
        result.description = if target_id == actor_id {
            format!("{healer} heals {healed} hit points{status}")
        } else {
            format!("{healer} heals {} for {healed} hit points{status}", target.name)
        };
    }

    fn resolve_recover(
        &mut self,
        session: &mut CombatSession,
        actor_id: &CombatantId,
        params: &ActionParams,
        result: &mut ActionResult,
    ) {
        let dc = self.config.recover_dc;
        let roll = self.d20(0, params.advantage);
        let total = roll.total;
        let passed = roll.meets_dc(dc);
        result.check_roll = Some(total);
        result.rolls.push(roll);

        let Some(actor) = session.combatant_mut(actor_id) else {
            return;
        };

        if !passed {
            result.applied("recover_failed");
            result.description = format!("{} struggles but cannot recover ({total} vs DC {dc})", actor.name);
            return;
        }

        let incapacitating: Vec<StatusEffectKind> = actor
            .status_effects
            .iter()
            .map(|e| e.kind)
            .filter(StatusEffectKind::is_incapacitating)
            .collect();
        for kind in incapacitating {
            actor.remove_effect(kind);
            result.removed(kind.name());
        }

        if actor.is_defeated() {
            let missing = 1 - actor.hp;
            let restored = actor.heal(missing);
            result.healing = Some(restored);
            result.applied("recovered");
        }

        result.success = true;
        result.description = format!("{} recovers ({total} vs DC {dc}){}", actor.name, hp_status(actor));
    }
}
