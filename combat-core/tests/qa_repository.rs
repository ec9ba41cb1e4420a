//! QA tests for the session repository.
//!
//! Run with: `cargo test -p combat-core --test qa_repository`

use combat_core::testing::{duel_session, party_session, seeded_engine};
use combat_core::{
    CombatError, CombatSession, ProposedAction, SessionId, SessionRepository,
};

#[tokio::test]
async fn test_insert_and_get() {
    let repo = SessionRepository::new();
    assert!(repo.is_empty().await);

    let session = duel_session();
    let id = session.session_id;
    repo.insert(session).await.unwrap();

    assert_eq!(repo.len().await, 1);
    assert_eq!(repo.ids().await, vec![id]);

    let handle = repo.get(id).await.unwrap();
    let session = handle.lock().await;
    assert_eq!(session.scene_id, "goblin ambush");
}

#[tokio::test]
async fn test_duplicate_and_missing_sessions() {
    let repo = SessionRepository::new();
    let session = duel_session();
    let id = session.session_id;
    repo.insert(session.clone()).await.unwrap();

    let err = repo.insert(session).await.unwrap_err();
    assert!(matches!(err, CombatError::SessionExists(existing) if existing == id));

    let missing = SessionId::new();
    let err = repo.get(missing).await.unwrap_err();
    assert!(matches!(err, CombatError::SessionNotFound(_)));
    assert!(repo.archive(missing).await.is_err());
}

#[tokio::test]
async fn test_archive_returns_final_state() {
    let repo = SessionRepository::new();
    let session = duel_session();
    let id = session.session_id;
    let handle = repo.insert(session).await.unwrap();

    {
        let mut session = handle.lock().await;
        let mut engine = seeded_engine(5);
        engine
            .run_turn(&mut session, &[ProposedAction::new("fighter", "defend")], true)
            .unwrap();
    }

    let archived = repo.archive(id).await.unwrap();
    assert_eq!(archived.resolve_current_character().as_str(), "goblin");
    assert!(repo.is_empty().await);
    assert!(repo.get(id).await.is_err());
}

#[tokio::test]
async fn test_sessions_resolve_independently() {
    let repo = SessionRepository::new();
    let duel = repo.insert(duel_session()).await.unwrap();
    let party = repo.insert(party_session()).await.unwrap();

    let tasks: Vec<_> = [(duel, 1u64), (party, 2u64)]
        .into_iter()
        .map(|(handle, seed)| {
            tokio::spawn(async move {
                let mut session = handle.lock().await;
                let mut engine = seeded_engine(seed);
                for _ in 0..4 {
                    if !session.is_active() {
                        break;
                    }
                    engine.run_turn(&mut session, &[], true).unwrap();
                }
                session.round_number()
            })
        })
        .collect();

    for task in tasks {
        let round = task.await.unwrap();
        assert!(round >= 2);
    }
    assert_eq!(repo.len().await, 2);
}

#[tokio::test]
async fn test_insert_rejects_corrupted_sessions() {
    let mut value = serde_json::to_value(duel_session()).unwrap();
    value["current_turn_index"] = serde_json::json!(9);
    let corrupted: CombatSession = serde_json::from_value(value).unwrap();

    let repo = SessionRepository::new();
    let err = repo.insert(corrupted).await.unwrap_err();
    assert!(matches!(
        err,
        CombatError::TurnIndexOutOfRange { index: 9, len: 2 }
    ));
    assert!(repo.is_empty().await);
}
