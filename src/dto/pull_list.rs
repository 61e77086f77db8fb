use serde::Serialize;
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::{game::GameKind, pull_list::PullListRow};

/// One line of the DJ's pull list.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct PullListRowResponse {
    pub call_index: u32,
    pub round_number: Option<u32>,
    pub artist: String,
    pub title: String,
    pub source_label: Option<String>,
    /// Game-specific answer summary, e.g. `Column: B | Album: Talking Book`.
    pub detail: Option<String>,
    pub host_notes: Option<String>,
}

impl From<PullListRow> for PullListRowResponse {
    fn from(row: PullListRow) -> Self {
        Self {
            call_index: row.call_index,
            round_number: row.round_number,
            artist: row.artist,
            title: row.title,
            source_label: row.source_label,
            detail: row.detail,
            host_notes: row.host_notes,
        }
    }
}

/// Pull list of a session in call order.
#[derive(Debug, Serialize, ToSchema)]
pub struct PullListResponse {
    pub session_id: Uuid,
    pub title: String,
    pub game: GameKind,
    pub rows: Vec<PullListRowResponse>,
}
