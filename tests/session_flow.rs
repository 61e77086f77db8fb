use std::sync::Arc;

use dj_games_back::{
    config::AppConfig,
    dao::session_store::{MemorySessionStore, SessionStore},
    dto::{
        session::{CreateSessionRequest, PatchSessionRequest},
        template::CreateTemplateRequest,
    },
    error::ServiceError,
    services::{call_service, card_service, pull_list_service, session_service, template_service},
    state::{
        AppState, SharedState,
        game::{BingoColumn, CallAction, CallDetails, CallStatus},
        pull_list::PlainTextRenderer,
        state_machine::SessionStatus,
    },
};
use serde_json::{Value, json};
use uuid::Uuid;

async fn state_with_store() -> (SharedState, Arc<MemorySessionStore>) {
    let state = AppState::new(AppConfig::default());
    let store = Arc::new(MemorySessionStore::new());
    state.set_session_store(store.clone()).await;
    (state, store)
}

fn bingo_items(count: usize) -> Vec<Value> {
    (1..=count)
        .map(|i| {
            json!({
                "title": format!("Track {i}"),
                "artist": format!("Artist {i}"),
                "album": format!("Album {i}"),
            })
        })
        .collect()
}

fn tune_items(count: usize) -> Vec<Value> {
    (1..=count)
        .map(|i| {
            json!({
                "title": format!("Tune {i}"),
                "artist": format!("Band {i}"),
                "source_label": format!("Crate {i}"),
                "details": {
                    "game": "name_that_tune",
                    "snippet_start_seconds": 65,
                    "snippet_duration_seconds": 10,
                },
            })
        })
        .collect()
}

fn create_request(body: Value) -> CreateSessionRequest {
    serde_json::from_value(body).unwrap()
}

async fn create_tune_session(state: &SharedState, items: usize, rounds: u32) -> Uuid {
    session_service::create_session(
        state,
        create_request(json!({
            "title": "Tuesday tunes",
            "game": "name_that_tune",
            "items": tune_items(items),
            "round_count": rounds,
        })),
    )
    .await
    .unwrap()
    .id
}

#[tokio::test]
async fn bingo_session_lifecycle() {
    let (state, _store) = state_with_store().await;

    let session = session_service::create_session(
        &state,
        create_request(json!({
            "title": "Friday bingo",
            "game": "bingo",
            "items": bingo_items(30),
            "card_count": 3,
            "target_gap_seconds": 60,
        })),
    )
    .await
    .unwrap();
    assert_eq!(session.status, SessionStatus::Pending);
    assert_eq!(session.current_call_index, 0);
    assert_eq!(session.remaining_seconds, 60);
    assert_eq!(session.code.len(), 5);

    let deck = card_service::list_cards(&state, session.id).await.unwrap();
    assert_eq!(deck.cards.len(), 3);
    for card in &deck.cards {
        assert_eq!(card.cells.len(), 25);
        assert_eq!(card.cells.iter().filter(|cell| cell.free).count(), 1);
        assert!(card.cells[12].free);
    }

    let advanced = session_service::advance_session(&state, session.id)
        .await
        .unwrap();
    assert_eq!(advanced.session.status, SessionStatus::Running);
    assert_eq!(advanced.session.current_call_index, 1);
    assert!(advanced.session.started_at.is_some());
    assert_eq!(advanced.call.status, CallStatus::Called);
    assert!(matches!(
        advanced.call.details,
        CallDetails::Bingo {
            column: BingoColumn::B,
            ..
        }
    ));

    let paused = session_service::pause_session(&state, session.id)
        .await
        .unwrap();
    assert_eq!(paused.status, SessionStatus::Paused);
    let snapshot = paused.paused_remaining_seconds.unwrap();
    assert!((59..=60).contains(&snapshot));
    assert_eq!(paused.remaining_seconds, snapshot);

    let resumed = session_service::resume_session(&state, session.id)
        .await
        .unwrap();
    assert_eq!(resumed.status, SessionStatus::Running);
    assert!(resumed.paused_remaining_seconds.is_none());
    assert!(snapshot - resumed.remaining_seconds <= 1);

    let completed = session_service::complete_session(&state, session.id)
        .await
        .unwrap();
    assert_eq!(completed.status, SessionStatus::Completed);
    assert!(completed.ended_at.is_some());

    for result in [
        session_service::advance_session(&state, session.id)
            .await
            .map(|_| ()),
        session_service::pause_session(&state, session.id)
            .await
            .map(|_| ()),
        session_service::complete_session(&state, session.id)
            .await
            .map(|_| ()),
    ] {
        assert!(matches!(result, Err(ServiceError::InvalidState(_))));
    }
}

#[tokio::test]
async fn resume_requires_a_paused_session() {
    let (state, _store) = state_with_store().await;
    let id = create_tune_session(&state, 3, 1).await;
    let result = session_service::resume_session(&state, id).await;
    assert!(matches!(result, Err(ServiceError::InvalidState(_))));
}

#[tokio::test]
async fn advancing_past_the_last_call_leaves_session_untouched() {
    let (state, store) = state_with_store().await;
    let id = create_tune_session(&state, 2, 1).await;

    session_service::advance_session(&state, id).await.unwrap();
    session_service::advance_session(&state, id).await.unwrap();
    let before = store.find_session(id).await.unwrap().unwrap();

    let result = session_service::advance_session(&state, id).await;
    assert!(matches!(result, Err(ServiceError::InvalidState(_))));

    let after = store.find_session(id).await.unwrap().unwrap();
    assert_eq!(before, after);
    assert_eq!(after.current_call_index, 2);
}

#[tokio::test]
async fn call_actions_follow_call_status() {
    let (state, _store) = state_with_store().await;
    let id = create_tune_session(&state, 4, 2).await;

    let early = call_service::apply_call_action(&state, id, 1, CallAction::Reveal).await;
    assert!(matches!(early, Err(ServiceError::InvalidState(_))));

    let skipped = call_service::apply_call_action(&state, id, 2, CallAction::Skip)
        .await
        .unwrap();
    assert_eq!(skipped.status, CallStatus::Skipped);

    session_service::advance_session(&state, id).await.unwrap();
    let revealed = call_service::apply_call_action(&state, id, 1, CallAction::Reveal)
        .await
        .unwrap();
    assert_eq!(revealed.status, CallStatus::Revealed);
    assert!(revealed.revealed_at.is_some());

    let scored = call_service::apply_call_action(&state, id, 1, CallAction::Score)
        .await
        .unwrap();
    assert_eq!(scored.status, CallStatus::Scored);
    assert!(scored.scored_at.is_some());

    let late_skip = call_service::apply_call_action(&state, id, 1, CallAction::Skip).await;
    assert!(matches!(late_skip, Err(ServiceError::InvalidState(_))));

    let next = session_service::advance_session(&state, id).await.unwrap();
    assert_eq!(next.call.call_index, 3);
    assert_eq!(next.call.round_number, Some(2));

    let missing = call_service::apply_call_action(&state, id, 99, CallAction::Reveal).await;
    assert!(matches!(missing, Err(ServiceError::NotFound(_))));

    let calls = call_service::list_calls(&state, id).await.unwrap();
    let statuses: Vec<_> = calls.iter().map(|call| call.status).collect();
    assert_eq!(
        statuses,
        vec![
            CallStatus::Scored,
            CallStatus::Skipped,
            CallStatus::Called,
            CallStatus::Pending
        ]
    );
}

#[tokio::test]
async fn sessions_are_built_from_templates() {
    let (state, _store) = state_with_store().await;

    let template: CreateTemplateRequest = serde_json::from_value(json!({
        "name": "Soul crate",
        "game": "bingo",
        "items": bingo_items(24),
    }))
    .unwrap();
    let template = template_service::create_template(&state, template)
        .await
        .unwrap();
    assert_eq!(template.items.len(), 24);

    let listed = template_service::list_templates(&state).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].item_count, 24);

    let session = session_service::create_session(
        &state,
        create_request(json!({
            "title": "From template",
            "game": "bingo",
            "template_id": template.id,
            "card_count": 2,
        })),
    )
    .await
    .unwrap();
    assert_eq!(session.template_id, Some(template.id));

    let unknown = session_service::create_session(
        &state,
        create_request(json!({
            "title": "Missing",
            "game": "bingo",
            "template_id": Uuid::new_v4(),
        })),
    )
    .await;
    assert!(matches!(unknown, Err(ServiceError::NotFound(_))));

    let both = session_service::create_session(
        &state,
        create_request(json!({
            "title": "Ambiguous",
            "game": "bingo",
            "template_id": template.id,
            "items": bingo_items(24),
        })),
    )
    .await;
    assert!(matches!(both, Err(ServiceError::InvalidInput(_))));
}

#[tokio::test]
async fn blackout_session_needs_a_full_pool() {
    let (state, _store) = state_with_store().await;
    let result = session_service::create_session(
        &state,
        create_request(json!({
            "title": "Blackout",
            "game": "bingo",
            "items": bingo_items(24),
            "card_variant": "blackout",
        })),
    )
    .await;
    assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
    assert!(session_service::list_sessions(&state).await.unwrap().is_empty());
}

#[tokio::test]
async fn round_games_reject_foreign_details() {
    let (state, _store) = state_with_store().await;
    let result = session_service::create_session(
        &state,
        create_request(json!({
            "title": "Wrong game",
            "game": "genre_imposter",
            "items": tune_items(3),
        })),
    )
    .await;
    assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
}

#[tokio::test]
async fn pull_list_is_grouped_by_round() {
    let (state, _store) = state_with_store().await;
    let id = create_tune_session(&state, 4, 2).await;

    let list = pull_list_service::pull_list(&state, id).await.unwrap();
    assert_eq!(list.rows.len(), 4);
    assert_eq!(list.rows[0].detail.as_deref(), Some("Snippet: 1:05 +10s"));
    assert_eq!(list.rows[3].round_number, Some(2));

    let (content_type, text) = pull_list_service::render_pull_list(&state, id, &PlainTextRenderer)
        .await
        .unwrap();
    assert!(content_type.starts_with("text/plain"));
    assert!(text.starts_with("Tuesday tunes\nName That Tune\n"));
    assert!(text.contains("Round 2"));
    assert!(text.contains("  1. Band 1 - Tune 1 [Crate 1]"));
}

#[tokio::test]
async fn patch_updates_settings_until_completed() {
    let (state, _store) = state_with_store().await;
    let id = create_tune_session(&state, 3, 1).await;

    let patched = session_service::patch_session(
        &state,
        id,
        PatchSessionRequest {
            title: Some("Renamed".into()),
            target_gap_seconds: Some(2),
            show_countdown: Some(false),
            ..PatchSessionRequest::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(patched.title, "Renamed");
    assert_eq!(patched.target_gap_seconds, 10);
    assert!(!patched.show_countdown);

    session_service::complete_session(&state, id).await.unwrap();
    let late = session_service::patch_session(&state, id, PatchSessionRequest::default()).await;
    assert!(matches!(late, Err(ServiceError::InvalidState(_))));
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let (state, _store) = state_with_store().await;
    let id = Uuid::new_v4();
    assert!(matches!(
        session_service::get_session(&state, id).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        session_service::pause_session(&state, id).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        call_service::list_calls(&state, id).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn degraded_mode_rejects_storage_operations() {
    let state = AppState::new(AppConfig::default());
    let result = session_service::list_sessions(&state).await;
    assert!(matches!(result, Err(ServiceError::Degraded)));
}

#[tokio::test]
async fn advance_broadcasts_session_and_call_updates() {
    let (state, _store) = state_with_store().await;
    let id = create_tune_session(&state, 2, 1).await;
    let mut receiver = state.public_sse().subscribe();

    session_service::advance_session(&state, id).await.unwrap();

    let first = receiver.recv().await.unwrap();
    assert_eq!(first.event.as_deref(), Some("session.updated"));
    let payload: Value = serde_json::from_str(&first.data).unwrap();
    assert_eq!(payload["session"]["current_call_index"], 1);

    let second = receiver.recv().await.unwrap();
    assert_eq!(second.event.as_deref(), Some("call.updated"));
    let payload: Value = serde_json::from_str(&second.data).unwrap();
    assert_eq!(payload["call"]["status"], "called");
}
