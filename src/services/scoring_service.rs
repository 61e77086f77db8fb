use std::{collections::HashSet, time::SystemTime};

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::{CallEntity, ScoreEntity, SessionEntity},
    dto::{
        call::CallResponse,
        scoring::{LeaderboardResponse, ScoreRequest, ScoreResponse, TeamResponse, TeamScoreResponse},
    },
    error::ServiceError,
    services::{session_service::load_session, sse_events},
    state::{
        SharedState,
        game::{CallAction, CallStatus, GameKind},
        scoring::{ScoreTarget, leaderboard},
    },
};

const DEFAULT_SCORER: &str = "host";

fn ensure_team_game(session: &SessionEntity) -> Result<(), ServiceError> {
    if session.game == GameKind::Bingo {
        return Err(ServiceError::InvalidState(format!(
            "session `{}` is a bingo session and has no team scores",
            session.id
        )));
    }
    Ok(())
}

fn resolve_target(request: &ScoreRequest) -> Result<ScoreTarget, ServiceError> {
    match (request.call_index, request.round_number) {
        (Some(call_index), None) => Ok(ScoreTarget::Call { call_index }),
        (None, Some(round_number)) => Ok(ScoreTarget::Round { round_number }),
        _ => Err(ServiceError::InvalidInput(
            "provide exactly one of `call_index` or `round_number`".into(),
        )),
    }
}

/// Calls closed by scoring `target`, already moved to [`CallStatus::Scored`].
///
/// A call must have been played; a round must contain at least one played call. Calls that
/// were scored earlier are kept as they are so a correction does not fail.
fn close_calls(
    session: &SessionEntity,
    calls: Vec<CallEntity>,
    target: ScoreTarget,
    now: SystemTime,
) -> Result<Vec<CallEntity>, ServiceError> {
    let session_id = session.id;
    let played = |call: &CallEntity| {
        matches!(
            call.status,
            CallStatus::Called | CallStatus::Revealed | CallStatus::Scored
        )
    };

    let mut closed: Vec<CallEntity> = match target {
        ScoreTarget::Call { call_index } => {
            let call = calls
                .into_iter()
                .find(|call| call.call_index == call_index)
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "call {call_index} of session `{session_id}` not found"
                    ))
                })?;
            if !played(&call) {
                return Err(ServiceError::InvalidState(format!(
                    "call {call_index} is {:?} and cannot be scored",
                    call.status
                )));
            }
            vec![call]
        }
        ScoreTarget::Round { round_number } => {
            if round_number > session.round_count {
                return Err(ServiceError::NotFound(format!(
                    "round {round_number} of session `{session_id}` not found"
                )));
            }
            let round: Vec<CallEntity> = calls
                .into_iter()
                .filter(|call| call.round_number == Some(round_number) && played(call))
                .collect();
            if round.is_empty() {
                return Err(ServiceError::InvalidState(format!(
                    "round {round_number} has no played calls yet"
                )));
            }
            round
        }
    };

    for call in closed.iter_mut() {
        if call.status == CallStatus::Scored {
            continue;
        }
        call.status = call.status.apply(CallAction::Score)?;
        call.revealed_at.get_or_insert(now);
        call.scored_at = Some(now);
    }
    Ok(closed)
}

/// Teams of a session in team-number order.
pub async fn list_teams(
    state: &SharedState,
    session_id: Uuid,
) -> Result<Vec<TeamResponse>, ServiceError> {
    let store = state.require_session_store().await?;
    load_session(store.as_ref(), session_id).await?;
    let teams = store.list_teams(session_id).await?;
    Ok(teams.iter().map(TeamResponse::from).collect())
}

/// Record awards for a call or a round and close the scored calls.
pub async fn score_session(
    state: &SharedState,
    session_id: Uuid,
    request: ScoreRequest,
) -> Result<ScoreResponse, ServiceError> {
    let target = resolve_target(&request)?;
    let store = state.require_session_store().await?;

    let (scores, calls, board) = state
        .run_session_transition(session_id, move || async move {
            let session = load_session(store.as_ref(), session_id).await?;
            ensure_team_game(&session)?;

            let teams = store.list_teams(session_id).await?;
            if teams.is_empty() {
                return Err(ServiceError::InvalidState(format!(
                    "session `{session_id}` was created without teams"
                )));
            }
            let known: HashSet<u32> = teams.iter().map(|team| team.team_id).collect();
            let mut seen = HashSet::new();
            for award in &request.awards {
                if !known.contains(&award.team_id) {
                    return Err(ServiceError::InvalidInput(format!(
                        "team {} is not part of session `{session_id}`",
                        award.team_id
                    )));
                }
                if !seen.insert(award.team_id) {
                    return Err(ServiceError::InvalidInput(format!(
                        "team {} is scored twice",
                        award.team_id
                    )));
                }
            }

            let now = SystemTime::now();
            let calls = close_calls(&session, store.list_calls(session_id).await?, target, now)?;

            let scored_by = request
                .scored_by
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .unwrap_or(DEFAULT_SCORER)
                .to_string();
            let scores: Vec<ScoreEntity> = request
                .awards
                .into_iter()
                .map(|award| ScoreEntity {
                    session_id,
                    team_id: award.team_id,
                    target,
                    awarded_points: session.scoring.points_for(
                        award.correct,
                        award.bonus,
                        award.awarded_points,
                    ),
                    correct: award.correct,
                    bonus: award.bonus,
                    notes: award
                        .notes
                        .map(|notes| notes.trim().to_string())
                        .filter(|notes| !notes.is_empty()),
                    scored_by: scored_by.clone(),
                    scored_at: now,
                })
                .collect();

            store.save_scores(scores.clone()).await?;
            store.save_calls(calls.clone()).await?;

            let board = leaderboard(&teams, &store.list_scores(session_id).await?);
            Ok((scores, calls, board))
        })
        .await?;

    info!(
        %session_id,
        target = %target.storage_key(),
        awards = scores.len(),
        "scores recorded"
    );
    for call in &calls {
        sse_events::broadcast_call_updated(state, call);
    }
    sse_events::broadcast_leaderboard_updated(state, session_id, &board);

    Ok(ScoreResponse {
        target,
        scores: scores.iter().map(TeamScoreResponse::from).collect(),
        calls: calls.iter().map(CallResponse::from).collect(),
        leaderboard: board,
    })
}

/// Standings of every team, best first.
pub async fn session_leaderboard(
    state: &SharedState,
    session_id: Uuid,
) -> Result<LeaderboardResponse, ServiceError> {
    let store = state.require_session_store().await?;
    let session = load_session(store.as_ref(), session_id).await?;
    ensure_team_game(&session)?;

    let teams = store.list_teams(session_id).await?;
    let scores = store.list_scores(session_id).await?;
    Ok(LeaderboardResponse {
        session_id,
        leaderboard: leaderboard(&teams, &scores),
    })
}
