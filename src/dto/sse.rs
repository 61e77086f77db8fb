use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::{call::CallResponse, session::SessionResponse},
    state::scoring::LeaderboardRow,
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Identifier of the SSE stream.
    pub stream: String,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast after any change to a session row (pause, resume, advance, complete, patch).
pub struct SessionUpdatedEvent {
    pub session: SessionResponse,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast after a call changed status.
pub struct CallUpdatedEvent {
    pub call: CallResponse,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast after teams were scored on a call or a round.
pub struct LeaderboardUpdatedEvent {
    pub session_id: Uuid,
    pub leaderboard: Vec<LeaderboardRow>,
}
