use serde::Serialize;
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::CallEntity,
    dto::format_optional_time,
    state::game::{CallDetails, CallStatus},
};

/// One call of a session as seen by the host console.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CallResponse {
    pub id: Uuid,
    pub session_id: Uuid,
    pub call_index: u32,
    pub round_number: Option<u32>,
    pub item_id: Uuid,
    pub artist: String,
    pub title: String,
    pub source_label: Option<String>,
    pub host_notes: Option<String>,
    pub status: CallStatus,
    pub details: CallDetails,
    pub called_at: Option<String>,
    pub revealed_at: Option<String>,
    pub scored_at: Option<String>,
}

impl From<&CallEntity> for CallResponse {
    fn from(call: &CallEntity) -> Self {
        Self {
            id: call.id,
            session_id: call.session_id,
            call_index: call.call_index,
            round_number: call.round_number,
            item_id: call.item_id,
            artist: call.artist.clone(),
            title: call.title.clone(),
            source_label: call.source_label.clone(),
            host_notes: call.host_notes.clone(),
            status: call.status,
            details: call.details.clone(),
            called_at: format_optional_time(call.called_at),
            revealed_at: format_optional_time(call.revealed_at),
            scored_at: format_optional_time(call.scored_at),
        }
    }
}
