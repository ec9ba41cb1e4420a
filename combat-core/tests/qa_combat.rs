//! QA tests for full combat flows through the public API.
//!
//! Every test runs on a seeded engine, so rolls replay identically.
//! Run with: `cargo test -p combat-core --test qa_combat`

use combat_core::testing::{
    assert_ap, assert_current_actor, assert_has_effect, assert_outcome, duel_session,
    party_session, sample_fighter, seeded_engine, TestHarness,
};
use combat_core::{
    ActionParams, Advantage, CombatError, CombatOutcome, CombatSession, CombatStatus, Combatant,
    CombatantId, OverdrawLevel, ProposedAction, StatusEffect, StatusEffectKind, TransitionReason,
    INVALID_TARGET,
};

fn id(s: &str) -> CombatantId {
    CombatantId::from(s)
}

// =============================================================================
// TEST 1: Spending AP and overdrawing
// =============================================================================

#[test]
fn test_attack_then_overdraw_passes_turn() {
    let roster = vec![
        sample_fighter(),
        Combatant::new("goblin", "Goblin", 100, 13).with_initiative(12).npc(),
    ];
    let mut session = CombatSession::new("goblin ambush", roster).unwrap();
    session.start();
    let mut harness = TestHarness::with_session(session, 3);

    harness.expect_turn(vec![ProposedAction::new("fighter", "basic_attack").targeting("goblin")]);
    let first = harness.play_turn().unwrap();
    assert_eq!(first.entries[0].result.as_ref().unwrap().ap_cost, Some(2));
    assert_ap(&harness, "fighter", 1);

    // Hit or miss, the fighter still has AP and keeps the turn.
    let transition = first.transition.unwrap();
    assert_eq!(transition.reason, TransitionReason::TurnContinues);
    assert_current_actor(&harness, "fighter");

    harness.expect_turn(vec![ProposedAction::new("fighter", "basic_attack").targeting("goblin")]);
    let second = harness.play_turn().unwrap();

    let check = &second.entries[0].check;
    assert!(!check.can_act);
    assert_eq!(check.overdraw_level, OverdrawLevel::Minor);
    assert_eq!(check.reason.as_deref(), Some("Insufficient AP: need 2, have 1"));

    let result = second.entries[0].result.as_ref().unwrap();
    assert!(result.overdrawn);
    assert_ap(&harness, "fighter", -1);

    let transition = second.transition.unwrap();
    assert_eq!(transition.reason, TransitionReason::ApOverdrawn);
    assert_eq!(transition.next_combatant, id("goblin"));
    assert_current_actor(&harness, "goblin");
    assert_ap(&harness, "goblin", 3);
}

#[test]
fn test_batch_stops_once_ap_is_spent() {
    let mut session = duel_session();
    let mut engine = seeded_engine(9);
    let batch = vec![
        ProposedAction::new("fighter", "defend"),
        ProposedAction::new("fighter", "dash"),
        ProposedAction::new("fighter", "move"),
        ProposedAction::new("fighter", "hide"),
    ];

    let report = engine.run_turn(&mut session, &batch, false).unwrap();
    assert_eq!(report.entries.len(), 2);
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(report.transition.unwrap().reason, TransitionReason::ApExhausted);
    assert_eq!(session.resolve_current_character(), &id("goblin"));
}

// =============================================================================
// TEST 2: Target validation
// =============================================================================

#[test]
fn test_unknown_target_reports_the_same_way_for_every_action() {
    let targeted = [
        "basic_attack",
        "full_attack",
        "simple_spell",
        "complex_spell",
        "grapple",
        "shove",
        "help",
        "heal",
    ];

    let descriptions: Vec<String> = targeted
        .iter()
        .map(|action| {
            let mut session = duel_session();
            let mut engine = seeded_engine(1);
            let result = engine.process_named_action(
                &mut session,
                &id("fighter"),
                action,
                Some(&id("dragon")),
                &ActionParams::default(),
            );

            assert!(!result.success, "{action} should fail");
            assert_eq!(result.effects_applied, vec![INVALID_TARGET.to_string()]);
            assert_eq!(result.damage, None);
            assert_eq!(result.healing, None);
            assert_eq!(result.ap_cost, None);
            assert_eq!(session.combatant(&id("fighter")).unwrap().current_ap(), Some(3));
            result.description
        })
        .collect();

    for description in &descriptions {
        assert_eq!(description, &descriptions[0]);
    }
    assert!(descriptions[0].contains("dragon not in combat"));
    assert!(descriptions[0].contains("Fighter"));
    assert!(descriptions[0].contains("Goblin"));
}

#[test]
fn test_heal_can_reach_unconscious_ally() {
    let mut session = party_session();
    session.combatant_mut(&id("fighter")).unwrap().add_effect(
        StatusEffect::new(StatusEffectKind::Unconscious, "Sleep").until_removed(),
    );

    let mut engine = seeded_engine(4);
    let result = engine.process_named_action(
        &mut session,
        &id("cleric"),
        "heal",
        Some(&id("fighter")),
        &ActionParams::default(),
    );
    assert!(!result.is_invalid_target());
    assert!(result.success);

    let shove = engine.process_named_action(
        &mut session,
        &id("goblin"),
        "shove",
        Some(&id("fighter")),
        &ActionParams::default(),
    );
    assert!(shove.is_invalid_target());
    assert!(shove.description.contains("target is unconscious"));
}

// =============================================================================
// TEST 3: Turn order
// =============================================================================

#[test]
fn test_turns_wrap_and_skip_unconscious() {
    let mut session = party_session();
    session.combatant_mut(&id("goblin")).unwrap().add_effect(
        StatusEffect::new(StatusEffectKind::Unconscious, "Sleep").until_removed(),
    );
    let mut engine = seeded_engine(2);

    let pass = |engine: &mut combat_core::CombatEngine, session: &mut CombatSession| {
        engine
            .run_turn(session, &[], true)
            .unwrap()
            .transition
            .unwrap()
    };

    let first = pass(&mut engine, &mut session);
    assert_eq!(first.current_actor, id("fighter"));
    assert_eq!(first.next_combatant, id("goblin_archer"));
    assert!(!first.new_round);

    let second = pass(&mut engine, &mut session);
    assert_eq!(second.next_combatant, id("cleric"));

    let third = pass(&mut engine, &mut session);
    assert_eq!(third.next_combatant, id("fighter"));
    assert!(third.new_round);
    assert_eq!(third.round_number, 2);
    assert_eq!(session.round_number(), 2);
}

#[test]
fn test_incapacitated_actor_cannot_act_but_can_recover() {
    let mut session = duel_session();
    session
        .combatant_mut(&id("fighter"))
        .unwrap()
        .add_effect(StatusEffect::new(StatusEffectKind::Paralyzed, "Ghoul claw").with_duration(2));
    let mut engine = seeded_engine(6);

    let report = engine
        .run_turn(
            &mut session,
            &[ProposedAction::new("fighter", "basic_attack").targeting("goblin")],
            false,
        )
        .unwrap();
    assert_eq!(report.entries[0].check.reason.as_deref(), Some("paralyzed"));
    assert!(report.entries[0].result.is_none());
    assert_eq!(report.transition.unwrap().reason, TransitionReason::ActionFailed);

    // Back on the fighter's turn, recover is always allowed.
    engine.run_turn(&mut session, &[], true).unwrap();
    let report = engine
        .run_turn(
            &mut session,
            &[ProposedAction::new("fighter", "recover")
                .with_params(ActionParams::new().with_advantage(Advantage::Advantage))],
            false,
        )
        .unwrap();
    assert!(report.entries[0].check.can_act);
    let result = report.entries[0].result.as_ref().unwrap();
    assert_eq!(result.ap_cost, Some(0));
}

// =============================================================================
// TEST 4: Victory
// =============================================================================

#[test]
fn test_victory_uses_hp_only() {
    let mut session = duel_session();
    session.combatant_mut(&id("goblin")).unwrap().add_effect(
        StatusEffect::new(StatusEffectKind::Unconscious, "Sleep").until_removed(),
    );
    assert_eq!(session.check_victory_conditions(), None);

    session.combatant_mut(&id("goblin")).unwrap().hp = 0;
    assert_eq!(
        session.check_victory_conditions(),
        Some(CombatOutcome::PlayersVictory)
    );

    let mut session = duel_session();
    session.combatant_mut(&id("fighter")).unwrap().take_damage(50);
    assert_eq!(
        session.check_victory_conditions(),
        Some(CombatOutcome::PlayersDefeat)
    );
}

#[test]
fn test_one_sided_roster_is_never_decided() {
    let roster = vec![sample_fighter(), Combatant::new("cleric", "Cleric", 16, 18)];
    let mut session = CombatSession::new("sparring", roster).unwrap();
    session.start();
    assert_eq!(session.check_victory_conditions(), None);
}

#[test]
fn test_encounter_plays_out_to_a_result() {
    let mut harness = TestHarness::new();

    for _ in 0..200 {
        if !harness.session.is_active() {
            break;
        }
        let actor = harness.current_actor();
        let target = if actor.as_str() == "fighter" { "goblin" } else { "fighter" };
        harness.expect_turn_ending(vec![
            ProposedAction::new(actor.clone(), "basic_attack").targeting(target)
        ]);
        harness.play_turn().unwrap();
    }

    assert_eq!(harness.session.status(), CombatStatus::Ended);
    let outcome = harness.session.outcome();
    assert!(outcome.is_some());
    assert_outcome(&harness, outcome);

    let err = harness.play_turn().unwrap_err();
    assert!(matches!(err, CombatError::SessionNotActive(_)));
}

#[test]
fn test_defend_lasts_until_next_turn() {
    let mut harness = TestHarness::new();
    harness
        .expect_turn_ending(vec![ProposedAction::new("fighter", "defend")])
        .expect_turn_ending(vec![]);

    harness.play_turn().unwrap();
    assert_has_effect(&harness, "fighter", StatusEffectKind::Defending);

    harness.play_turn().unwrap();
    assert_current_actor(&harness, "fighter");
    assert!(!harness.has_effect("fighter", StatusEffectKind::Defending));
}
