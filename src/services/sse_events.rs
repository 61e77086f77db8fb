use std::time::SystemTime;

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dao::models::{CallEntity, SessionEntity},
    dto::{
        session::SessionResponse,
        sse::{CallUpdatedEvent, LeaderboardUpdatedEvent, ServerEvent, SessionUpdatedEvent},
    },
    state::{SharedState, scoring::LeaderboardRow},
};

const EVENT_SESSION_UPDATED: &str = "session.updated";
const EVENT_CALL_UPDATED: &str = "call.updated";
const EVENT_LEADERBOARD_UPDATED: &str = "leaderboard.updated";

/// Broadcast the latest session row so jumbotrons can resync their countdown.
pub fn broadcast_session_updated(state: &SharedState, session: &SessionEntity) {
    let payload = SessionUpdatedEvent {
        session: SessionResponse::from_entity(session, SystemTime::now()),
    };
    send_public_event(state, EVENT_SESSION_UPDATED, &payload);
}

/// Broadcast a call whose status changed.
pub fn broadcast_call_updated(state: &SharedState, call: &CallEntity) {
    let payload = CallUpdatedEvent { call: call.into() };
    send_public_event(state, EVENT_CALL_UPDATED, &payload);
}

/// Broadcast the standings after teams were scored.
pub fn broadcast_leaderboard_updated(
    state: &SharedState,
    session_id: Uuid,
    leaderboard: &[LeaderboardRow],
) {
    let payload = LeaderboardUpdatedEvent {
        session_id,
        leaderboard: leaderboard.to_vec(),
    };
    send_public_event(state, EVENT_LEADERBOARD_UPDATED, &payload);
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}
