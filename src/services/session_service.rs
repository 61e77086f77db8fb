use std::time::SystemTime;

use rand::Rng;
use tracing::info;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::{
        models::{CallEntity, CardEntity, SessionEntity, TeamEntity, TemplateItemEntity},
        session_store::SessionStore,
    },
    dto::session::{AdvanceResponse, CreateSessionRequest, PatchSessionRequest, SessionResponse},
    error::ServiceError,
    services::{card_service::resolve_card_count, sse_events},
    state::{
        SharedState,
        cards::{CardVariant, LabelMode, PickMode, build_cards, build_pick_list, generate_session_code},
        clock::{self, ClockState},
        game::{BingoColumn, CallDetails, CallStatus, GameKind},
        scoring::{MIN_TEAM_COUNT, ScoringRules, normalize_team_names},
        state_machine::{SessionEvent, compute_transition},
    },
};

/// Everything a new session writes to the store.
#[derive(Debug)]
pub(crate) struct SessionPlan {
    pub session: SessionEntity,
    pub calls: Vec<CallEntity>,
    pub cards: Vec<CardEntity>,
    pub teams: Vec<TeamEntity>,
}

/// Settings resolved from a create request against the configuration.
#[derive(Debug, Clone)]
pub(crate) struct SessionSettings {
    pub title: String,
    pub game: GameKind,
    pub template_id: Option<Uuid>,
    pub target_gap_seconds: u32,
    pub round_count: u32,
    pub pick_mode: PickMode,
    pub card_count: u32,
    pub card_variant: CardVariant,
    pub label_mode: LabelMode,
    pub show_title: bool,
    pub show_round: bool,
    pub show_countdown: bool,
    pub team_names: Vec<String>,
    pub scoring: ScoringRules,
}

impl SessionSettings {
    fn resolve(
        config: &AppConfig,
        request: &CreateSessionRequest,
        template_id: Option<Uuid>,
    ) -> Result<Self, ServiceError> {
        let game = request.game;
        let card_count = if game == GameKind::Bingo {
            resolve_card_count(config, request.card_count)?
        } else {
            0
        };

        let team_names = normalize_team_names(request.team_names.as_deref().unwrap_or_default());
        if !team_names.is_empty() {
            if game == GameKind::Bingo {
                return Err(ServiceError::InvalidInput(
                    "bingo sessions are not scored per team".into(),
                ));
            }
            if team_names.len() < MIN_TEAM_COUNT {
                return Err(ServiceError::InvalidInput(format!(
                    "a scored session needs at least {MIN_TEAM_COUNT} distinct team names"
                )));
            }
        }
        let defaults = ScoringRules::default();
        let scoring = ScoringRules {
            points_correct: request.points_correct.unwrap_or(defaults.points_correct),
            bonus_points: request.bonus_points.unwrap_or(defaults.bonus_points),
        };

        Ok(Self {
            title: request.title.trim().to_string(),
            game,
            template_id,
            target_gap_seconds: config.target_gap_seconds(request.target_gap_seconds),
            round_count: request.round_count.unwrap_or(config.default_round_count),
            pick_mode: request.pick_mode.unwrap_or_default(),
            card_count,
            card_variant: request.card_variant.unwrap_or_default(),
            label_mode: request.label_mode.unwrap_or_default(),
            show_title: request.show_title.unwrap_or(true),
            show_round: request.show_round.unwrap_or(game.uses_rounds()),
            show_countdown: request.show_countdown.unwrap_or(true),
            team_names,
            scoring,
        })
    }
}

/// Check that round-based games carry answer data for their own game on every item.
fn ensure_items_match_game(game: GameKind, items: &[TemplateItemEntity]) -> Result<(), ServiceError> {
    if items.is_empty() {
        return Err(ServiceError::InvalidInput("a session needs at least one item".into()));
    }
    if game == GameKind::Bingo {
        return Ok(());
    }

    for item in items {
        match &item.details {
            Some(details) if details.kind() == game => {}
            Some(details) => {
                return Err(ServiceError::InvalidInput(format!(
                    "item `{}` carries {} details, expected {}",
                    item.title,
                    details.kind().title(),
                    game.title()
                )));
            }
            None => {
                return Err(ServiceError::InvalidInput(format!(
                    "item `{}` is missing {} details",
                    item.title,
                    game.title()
                )));
            }
        }
    }
    Ok(())
}

/// Round a 0-based pick belongs to when `total` picks are split into `round_count` rounds.
///
/// Rounds differ in size by at most one call and none is left empty.
fn round_for(position: usize, total: usize, round_count: u32) -> u32 {
    let total = total.max(1);
    let rounds = (round_count.max(1) as usize).min(total);
    (position * rounds / total) as u32 + 1
}

/// Order the items, lay out calls and cards, and build the session row.
pub(crate) fn plan_session<R: Rng + ?Sized>(
    settings: SessionSettings,
    items: Vec<TemplateItemEntity>,
    now: SystemTime,
    rng: &mut R,
) -> Result<SessionPlan, ServiceError> {
    ensure_items_match_game(settings.game, &items)?;

    let session_id = Uuid::new_v4();
    let game = settings.game;

    let cards = if game == GameKind::Bingo {
        build_cards(
            &items,
            settings.card_count,
            settings.card_variant,
            settings.label_mode,
            rng,
        )?
        .into_iter()
        .map(|card| CardEntity { session_id, card })
        .collect()
    } else {
        Vec::new()
    };

    let picks = build_pick_list(&items, settings.pick_mode, rng);
    let total = picks.len();
    let round_count = if game.uses_rounds() {
        settings.round_count.clamp(1, total as u32)
    } else {
        1
    };

    let calls = picks
        .into_iter()
        .enumerate()
        .map(|(position, item)| {
            let call_index = position as u32 + 1;
            let (round_number, details) = match (game, item.details) {
                (GameKind::Bingo, _) => (
                    None,
                    CallDetails::Bingo {
                        column: BingoColumn::for_call_index(call_index),
                        album: item.album.clone(),
                    },
                ),
                (_, Some(details)) => (Some(round_for(position, total, round_count)), details),
                (_, None) => {
                    return Err(ServiceError::InvalidInput(format!(
                        "item `{}` is missing {} details",
                        item.title,
                        game.title()
                    )));
                }
            };
            Ok(CallEntity {
                id: Uuid::new_v4(),
                session_id,
                call_index,
                round_number,
                item_id: item.id,
                artist: item.artist,
                title: item.title,
                source_label: item.source_label,
                host_notes: item.host_notes,
                status: CallStatus::Pending,
                details,
                called_at: None,
                revealed_at: None,
                scored_at: None,
            })
        })
        .collect::<Result<Vec<_>, ServiceError>>()?;

    let session = SessionEntity {
        id: session_id,
        code: generate_session_code(rng),
        title: settings.title,
        game,
        template_id: settings.template_id,
        clock: ClockState::pending(settings.target_gap_seconds),
        current_call_index: 0,
        current_round: None,
        round_count,
        scoring: settings.scoring,
        pick_mode: settings.pick_mode,
        card_variant: settings.card_variant,
        label_mode: settings.label_mode,
        show_title: settings.show_title,
        show_round: settings.show_round,
        show_countdown: settings.show_countdown,
        created_at: now,
        updated_at: now,
        started_at: None,
        ended_at: None,
    };

    let teams = settings
        .team_names
        .into_iter()
        .enumerate()
        .map(|(position, team_name)| TeamEntity {
            session_id,
            team_id: position as u32 + 1,
            team_name,
            created_at: now,
        })
        .collect();

    Ok(SessionPlan {
        session,
        calls,
        cards,
        teams,
    })
}

/// Fetch a session or fail with not found.
pub(crate) async fn load_session(
    store: &dyn SessionStore,
    session_id: Uuid,
) -> Result<SessionEntity, ServiceError> {
    store
        .find_session(session_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("session `{session_id}` not found")))
}

/// Create a session from a stored template or an inline item list.
pub async fn create_session(
    state: &SharedState,
    request: CreateSessionRequest,
) -> Result<SessionResponse, ServiceError> {
    let store = state.require_session_store().await?;

    let (template_id, items) = match (request.template_id, request.items.as_ref()) {
        (Some(template_id), None) => {
            let template = store.find_template(template_id).await?.ok_or_else(|| {
                ServiceError::NotFound(format!("template `{template_id}` not found"))
            })?;
            (Some(template_id), template.items)
        }
        (None, Some(items)) => (
            None,
            items.iter().cloned().map(TemplateItemEntity::from).collect(),
        ),
        _ => {
            return Err(ServiceError::InvalidInput(
                "provide exactly one of `template_id` or `items`".into(),
            ));
        }
    };

    let settings = SessionSettings::resolve(state.config(), &request, template_id)?;
    let now = SystemTime::now();
    let plan = plan_session(settings, items, now, &mut rand::rng())?;

    let SessionPlan {
        session,
        calls,
        cards,
        teams,
    } = plan;
    let call_count = calls.len();
    let card_count = cards.len();
    let team_count = teams.len();

    // The session row goes last so a partial write never exposes a session without its rows.
    store.save_calls(calls).await?;
    if !cards.is_empty() {
        store.save_cards(cards).await?;
    }
    if !teams.is_empty() {
        store.save_teams(teams).await?;
    }
    store.save_session(session.clone()).await?;

    info!(
        session_id = %session.id,
        code = %session.code,
        game = ?session.game,
        call_count,
        card_count,
        team_count,
        "session created"
    );

    Ok(SessionResponse::from_entity(&session, now))
}

/// Session row with the countdown evaluated now.
pub async fn get_session(
    state: &SharedState,
    session_id: Uuid,
) -> Result<SessionResponse, ServiceError> {
    let store = state.require_session_store().await?;
    let session = load_session(store.as_ref(), session_id).await?;
    Ok(SessionResponse::from_entity(&session, SystemTime::now()))
}

/// Every session, oldest first.
pub async fn list_sessions(state: &SharedState) -> Result<Vec<SessionResponse>, ServiceError> {
    let store = state.require_session_store().await?;
    let now = SystemTime::now();
    let sessions = store.list_sessions().await?;
    Ok(sessions
        .iter()
        .map(|session| SessionResponse::from_entity(session, now))
        .collect())
}

/// Serialized read-modify-write of one session row.
async fn mutate_session<F>(
    state: &SharedState,
    session_id: Uuid,
    mutate: F,
) -> Result<SessionResponse, ServiceError>
where
    F: FnOnce(&mut SessionEntity, SystemTime, &AppConfig) -> Result<(), ServiceError> + Send,
{
    let store = state.require_session_store().await?;
    let session = state
        .run_session_transition(session_id, move || async move {
            let mut session = load_session(store.as_ref(), session_id).await?;
            let now = SystemTime::now();
            mutate(&mut session, now, state.config())?;
            session.updated_at = now;
            store.save_session(session.clone()).await?;
            Ok(session)
        })
        .await?;

    sse_events::broadcast_session_updated(state, &session);
    Ok(SessionResponse::from_entity(&session, SystemTime::now()))
}

/// Freeze the countdown, capturing the remaining seconds.
pub async fn pause_session(
    state: &SharedState,
    session_id: Uuid,
) -> Result<SessionResponse, ServiceError> {
    let response = mutate_session(state, session_id, |session, now, _| {
        compute_transition(session.status(), SessionEvent::Pause)?;
        session.clock = clock::pause(&session.clock, now);
        Ok(())
    })
    .await?;
    info!(%session_id, remaining_seconds = response.remaining_seconds, "session paused");
    Ok(response)
}

/// Continue the countdown from the captured snapshot.
pub async fn resume_session(
    state: &SharedState,
    session_id: Uuid,
) -> Result<SessionResponse, ServiceError> {
    let response = mutate_session(state, session_id, |session, now, _| {
        compute_transition(session.status(), SessionEvent::Resume)?;
        session.clock = clock::resume(&session.clock, now);
        Ok(())
    })
    .await?;
    info!(%session_id, remaining_seconds = response.remaining_seconds, "session resumed");
    Ok(response)
}

/// Mark the session completed.
pub async fn complete_session(
    state: &SharedState,
    session_id: Uuid,
) -> Result<SessionResponse, ServiceError> {
    let response = mutate_session(state, session_id, |session, now, _| {
        compute_transition(session.status(), SessionEvent::Complete)?;
        session.clock = clock::complete(&session.clock);
        session.ended_at = Some(now);
        Ok(())
    })
    .await?;
    info!(%session_id, "session completed");
    Ok(response)
}

/// Update the title, countdown length or display toggles.
pub async fn patch_session(
    state: &SharedState,
    session_id: Uuid,
    patch: PatchSessionRequest,
) -> Result<SessionResponse, ServiceError> {
    mutate_session(state, session_id, move |session, _, config| {
        if session.status().is_completed() {
            return Err(ServiceError::InvalidState(format!(
                "session `{session_id}` is completed"
            )));
        }
        if let Some(title) = patch.title {
            session.title = title.trim().to_string();
        }
        if let Some(gap) = patch.target_gap_seconds {
            session.clock.target_gap_seconds = config.target_gap_seconds(Some(gap));
        }
        if let Some(show_title) = patch.show_title {
            session.show_title = show_title;
        }
        if let Some(show_round) = patch.show_round {
            session.show_round = show_round;
        }
        if let Some(show_countdown) = patch.show_countdown {
            session.show_countdown = show_countdown;
        }
        Ok(())
    })
    .await
}

/// Make the next call and restart the countdown.
///
/// The next call is the first one after `current_call_index` that is not skipped, so calls the
/// host skipped ahead of time are passed over instead of being called anyway. When nothing is
/// left the session is left untouched and the request fails with a conflict.
///
/// The call is written before the session row. If the session write fails the pointer has not
/// moved, and the next advance makes the same call again.
pub async fn advance_session(
    state: &SharedState,
    session_id: Uuid,
) -> Result<AdvanceResponse, ServiceError> {
    let store = state.require_session_store().await?;

    let (session, call) = state
        .run_session_transition(session_id, move || async move {
            let mut session = load_session(store.as_ref(), session_id).await?;
            compute_transition(session.status(), SessionEvent::Advance)?;

            let calls = store.list_calls(session_id).await?;
            let Some(mut call) = calls.into_iter().find(|call| {
                call.call_index > session.current_call_index && call.status != CallStatus::Skipped
            }) else {
                return Err(ServiceError::InvalidState(format!(
                    "no more calls in session `{session_id}`"
                )));
            };

            let now = SystemTime::now();
            call.status = CallStatus::Called;
            call.called_at = Some(now);

            session.clock = clock::restart(&session.clock, now);
            session.current_call_index = call.call_index;
            session.current_round = call.round_number;
            session.started_at.get_or_insert(now);
            session.updated_at = now;

            store.save_call(call.clone()).await?;
            store.save_session(session.clone()).await?;
            Ok((session, call))
        })
        .await?;

    info!(%session_id, call_index = call.call_index, "session advanced");
    sse_events::broadcast_session_updated(state, &session);
    sse_events::broadcast_call_updated(state, &call);

    Ok(AdvanceResponse {
        session: SessionResponse::from_entity(&session, SystemTime::now()),
        call: (&call).into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn settings(game: GameKind) -> SessionSettings {
        SessionSettings {
            title: "Friday night".into(),
            game,
            template_id: None,
            target_gap_seconds: 45,
            round_count: 3,
            pick_mode: PickMode::Setlist,
            card_count: 4,
            card_variant: CardVariant::Standard,
            label_mode: LabelMode::TrackArtist,
            show_title: true,
            show_round: true,
            show_countdown: true,
            team_names: Vec::new(),
            scoring: ScoringRules::default(),
        }
    }

    fn item(index: usize, details: Option<CallDetails>) -> TemplateItemEntity {
        TemplateItemEntity {
            id: Uuid::new_v4(),
            title: format!("Track {index}"),
            artist: format!("Artist {index}"),
            album: Some(format!("Album {index}")),
            source_label: None,
            host_notes: None,
            details,
        }
    }

    fn tune() -> Option<CallDetails> {
        Some(CallDetails::NameThatTune {
            snippet_start_seconds: 10,
            snippet_duration_seconds: 5,
        })
    }

    #[test]
    fn rounds_split_evenly_without_empty_rounds() {
        let rounds: Vec<u32> = (0..7).map(|position| round_for(position, 7, 3)).collect();
        assert_eq!(rounds, vec![1, 1, 1, 2, 2, 3, 3]);
        let rounds: Vec<u32> = (0..5).map(|position| round_for(position, 5, 4)).collect();
        assert_eq!(rounds, vec![1, 1, 2, 3, 4]);
        assert_eq!(round_for(0, 2, 5), 1);
        assert_eq!(round_for(1, 2, 5), 2);
    }

    #[test]
    fn stored_round_count_matches_last_call_round() {
        let mut rng = StdRng::seed_from_u64(11);
        for (total, requested) in [(5, 4), (7, 3), (9, 4), (3, 3), (2, 6)] {
            let items: Vec<_> = (0..total).map(|i| item(i, tune())).collect();
            let mut settings = settings(GameKind::NameThatTune);
            settings.round_count = requested;
            let plan = plan_session(settings, items, SystemTime::now(), &mut rng).unwrap();
            let last_round = plan
                .calls
                .iter()
                .filter_map(|call| call.round_number)
                .max()
                .unwrap();
            assert_eq!(plan.session.round_count, last_round, "{total} calls in {requested} rounds");
        }
    }

    #[test]
    fn bingo_plan_has_cards_and_cycling_columns() {
        let items: Vec<_> = (0..30).map(|i| item(i, None)).collect();
        let mut rng = StdRng::seed_from_u64(7);
        let plan = plan_session(settings(GameKind::Bingo), items, SystemTime::now(), &mut rng)
            .unwrap();

        assert_eq!(plan.cards.len(), 4);
        assert_eq!(plan.calls.len(), 30);
        assert_eq!(plan.session.round_count, 1);
        assert_eq!(plan.session.code.len(), 5);
        assert_eq!(plan.session.status(), crate::state::state_machine::SessionStatus::Pending);
        let sixth = &plan.calls[5];
        assert_eq!(sixth.call_index, 6);
        assert_eq!(sixth.round_number, None);
        assert!(matches!(
            sixth.details,
            CallDetails::Bingo {
                column: BingoColumn::B,
                ..
            }
        ));
        assert!(plan.calls.iter().all(|call| call.session_id == plan.session.id));
        assert!(plan.cards.iter().all(|card| card.session_id == plan.session.id));
    }

    #[test]
    fn bingo_plan_rejects_small_pool() {
        let items: Vec<_> = (0..10).map(|i| item(i, None)).collect();
        let mut rng = StdRng::seed_from_u64(7);
        let result = plan_session(settings(GameKind::Bingo), items, SystemTime::now(), &mut rng);
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
    }

    #[test]
    fn round_game_requires_matching_details() {
        let mut rng = StdRng::seed_from_u64(1);
        let missing = vec![item(0, tune()), item(1, None)];
        assert!(matches!(
            plan_session(settings(GameKind::NameThatTune), missing, SystemTime::now(), &mut rng),
            Err(ServiceError::InvalidInput(_))
        ));

        let wrong = vec![item(0, Some(CallDetails::CrateCategories {
            crate_tag: None,
            release_year: None,
        }))];
        assert!(matches!(
            plan_session(settings(GameKind::NameThatTune), wrong, SystemTime::now(), &mut rng),
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[test]
    fn round_game_plan_numbers_rounds() {
        let items: Vec<_> = (0..6).map(|i| item(i, tune())).collect();
        let mut rng = StdRng::seed_from_u64(3);
        let plan = plan_session(settings(GameKind::NameThatTune), items, SystemTime::now(), &mut rng)
            .unwrap();
        let rounds: Vec<_> = plan.calls.iter().map(|call| call.round_number).collect();
        assert_eq!(
            rounds,
            vec![Some(1), Some(1), Some(2), Some(2), Some(3), Some(3)]
        );
        assert!(plan.cards.is_empty());
        assert_eq!(plan.calls[0].title, "Track 0");
    }

    #[test]
    fn round_count_never_exceeds_call_count() {
        let items: Vec<_> = (0..2).map(|i| item(i, tune())).collect();
        let mut rng = StdRng::seed_from_u64(3);
        let plan = plan_session(settings(GameKind::NameThatTune), items, SystemTime::now(), &mut rng)
            .unwrap();
        assert_eq!(plan.session.round_count, 2);
    }

    #[test]
    fn teams_are_numbered_in_order() {
        let items: Vec<_> = (0..4).map(|i| item(i, tune())).collect();
        let mut settings = settings(GameKind::NameThatTune);
        settings.team_names = vec!["Crate Diggers".into(), "Wax Poetic".into()];
        let mut rng = StdRng::seed_from_u64(5);
        let plan = plan_session(settings, items, SystemTime::now(), &mut rng).unwrap();

        let teams: Vec<_> = plan
            .teams
            .iter()
            .map(|team| (team.team_id, team.team_name.as_str()))
            .collect();
        assert_eq!(teams, vec![(1, "Crate Diggers"), (2, "Wax Poetic")]);
        assert!(plan.teams.iter().all(|team| team.session_id == plan.session.id));
        assert_eq!(plan.session.current_round, None);
    }

    fn create_request(game: &str, extra: serde_json::Value) -> CreateSessionRequest {
        let mut body = serde_json::json!({ "title": "Quiz", "game": game });
        if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
            body.extend(extra.clone());
        }
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn team_settings_are_checked() {
        let config = AppConfig::default();

        let bingo = create_request("bingo", serde_json::json!({ "team_names": ["A", "B"] }));
        assert!(matches!(
            SessionSettings::resolve(&config, &bingo, None),
            Err(ServiceError::InvalidInput(_))
        ));

        let lonely = create_request(
            "name_that_tune",
            serde_json::json!({ "team_names": ["Solo", " Solo ", ""] }),
        );
        assert!(matches!(
            SessionSettings::resolve(&config, &lonely, None),
            Err(ServiceError::InvalidInput(_))
        ));

        let scored = create_request(
            "name_that_tune",
            serde_json::json!({ "team_names": ["A", "B"], "bonus_points": 0 }),
        );
        let settings = SessionSettings::resolve(&config, &scored, None).unwrap();
        assert_eq!(settings.team_names, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(
            settings.scoring,
            ScoringRules {
                points_correct: 2,
                bonus_points: 0
            }
        );
    }

    #[tokio::test]
    async fn missing_sessions_leave_no_gates_behind() {
        let state = crate::state::AppState::new(AppConfig::default());
        state
            .set_session_store(std::sync::Arc::new(crate::dao::session_store::MemorySessionStore::new()))
            .await;

        for _ in 0..1000 {
            let result = pause_session(&state, Uuid::new_v4()).await;
            assert!(matches!(result, Err(ServiceError::NotFound(_))));
        }
        assert_eq!(state.tracked_session_gates(), 0);
    }
}
