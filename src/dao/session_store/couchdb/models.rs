use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::warn;
use uuid::Uuid;

use super::error::{CouchDaoError, DocIdProblem};
use crate::{
    dao::models::{
        CallEntity, CardEntity, ScoreEntity, SessionEntity, TeamEntity, TemplateEntity,
        TemplateItemEntity,
    },
    state::{
        cards::{BingoCard, BingoCell, CardVariant, LabelMode, PickMode},
        clock::ClockState,
        game::{CallDetails, CallStatus, GameKind},
        scoring::{ScoreTarget, ScoringRules},
        state_machine::SessionStatus,
    },
};

pub const END_SUFFIX: &str = "\u{ffff}";

/// Document families sharing the database, each under its own id prefix.
///
/// Template and session ids are `<prefix><uuid>`. Rows owned by a session are
/// `<prefix><session>:<number:010>` so an `_all_docs` range scan returns them in order; scores
/// append the target key after the team number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocKind {
    Template,
    Session,
    Call,
    Card,
    Team,
    Score,
}

impl DocKind {
    pub fn prefix(self) -> &'static str {
        match self {
            DocKind::Template => "template::",
            DocKind::Session => "session::",
            DocKind::Call => "call::",
            DocKind::Card => "card::",
            DocKind::Team => "team::",
            DocKind::Score => "score::",
        }
    }

    fn invalid(self, doc_id: &str, problem: DocIdProblem) -> CouchDaoError {
        CouchDaoError::InvalidDocId {
            doc_id: doc_id.to_string(),
            kind: self,
            problem,
        }
    }
}

impl fmt::Display for DocKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix().trim_end_matches(':'))
    }
}

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    pub id: String,
    #[serde(default)]
    pub doc: Option<Value>,
}

/// Envelope shared by every document type: CouchDB id + revision around a body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchDocument<B> {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub body: B,
}

impl<B> CouchDocument<B> {
    pub fn new(id: String, body: B) -> Self {
        Self {
            id,
            rev: None,
            body,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateBody {
    pub name: String,
    #[serde(default)]
    pub game: Option<GameKind>,
    pub items: Vec<TemplateItemEntity>,
    pub created_at: String,
}

impl From<TemplateEntity> for CouchDocument<TemplateBody> {
    fn from(value: TemplateEntity) -> Self {
        CouchDocument::new(
            entity_doc_id(DocKind::Template, value.id),
            TemplateBody {
                name: value.name,
                game: value.game,
                items: value.items,
                created_at: encode_time(value.created_at),
            },
        )
    }
}

impl TryFrom<CouchDocument<TemplateBody>> for TemplateEntity {
    type Error = CouchDaoError;

    fn try_from(doc: CouchDocument<TemplateBody>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_entity_id(DocKind::Template, &doc.id)?,
            created_at: decode_required_time(&doc.id, &doc.body.created_at),
            name: doc.body.name,
            game: doc.body.game,
            items: doc.body.items,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionBody {
    pub code: String,
    pub title: String,
    pub game: GameKind,
    #[serde(default)]
    pub template_id: Option<Uuid>,
    pub status: SessionStatus,
    pub target_gap_seconds: u32,
    #[serde(default)]
    pub countdown_started_at: Option<String>,
    #[serde(default)]
    pub paused_at: Option<String>,
    #[serde(default)]
    pub paused_remaining_seconds: Option<u32>,
    pub current_call_index: u32,
    #[serde(default)]
    pub current_round: Option<u32>,
    pub round_count: u32,
    #[serde(default)]
    pub scoring: ScoringRules,
    pub pick_mode: PickMode,
    pub card_variant: CardVariant,
    pub label_mode: LabelMode,
    pub show_title: bool,
    pub show_round: bool,
    pub show_countdown: bool,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub ended_at: Option<String>,
}

impl From<SessionEntity> for CouchDocument<SessionBody> {
    fn from(value: SessionEntity) -> Self {
        let clock = value.clock;
        CouchDocument::new(
            entity_doc_id(DocKind::Session, value.id),
            SessionBody {
                code: value.code,
                title: value.title,
                game: value.game,
                template_id: value.template_id,
                status: clock.status,
                target_gap_seconds: clock.target_gap_seconds,
                countdown_started_at: clock.countdown_started_at.map(encode_time),
                paused_at: clock.paused_at.map(encode_time),
                paused_remaining_seconds: clock.paused_remaining_seconds,
                current_call_index: value.current_call_index,
                current_round: value.current_round,
                round_count: value.round_count,
                scoring: value.scoring,
                pick_mode: value.pick_mode,
                card_variant: value.card_variant,
                label_mode: value.label_mode,
                show_title: value.show_title,
                show_round: value.show_round,
                show_countdown: value.show_countdown,
                created_at: encode_time(value.created_at),
                updated_at: encode_time(value.updated_at),
                started_at: value.started_at.map(encode_time),
                ended_at: value.ended_at.map(encode_time),
            },
        )
    }
}

impl TryFrom<CouchDocument<SessionBody>> for SessionEntity {
    type Error = CouchDaoError;

    fn try_from(doc: CouchDocument<SessionBody>) -> Result<Self, Self::Error> {
        let id = parse_entity_id(DocKind::Session, &doc.id)?;
        let body = doc.body;
        Ok(Self {
            id,
            code: body.code,
            title: body.title,
            game: body.game,
            template_id: body.template_id,
            clock: ClockState {
                status: body.status,
                target_gap_seconds: body.target_gap_seconds,
                countdown_started_at: decode_time(&doc.id, body.countdown_started_at.as_deref()),
                paused_at: decode_time(&doc.id, body.paused_at.as_deref()),
                paused_remaining_seconds: body.paused_remaining_seconds,
            },
            current_call_index: body.current_call_index,
            current_round: body.current_round,
            round_count: body.round_count,
            scoring: body.scoring,
            pick_mode: body.pick_mode,
            card_variant: body.card_variant,
            label_mode: body.label_mode,
            show_title: body.show_title,
            show_round: body.show_round,
            show_countdown: body.show_countdown,
            created_at: decode_required_time(&doc.id, &body.created_at),
            updated_at: decode_required_time(&doc.id, &body.updated_at),
            started_at: decode_time(&doc.id, body.started_at.as_deref()),
            ended_at: decode_time(&doc.id, body.ended_at.as_deref()),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallBody {
    pub call_id: Uuid,
    pub session_id: Uuid,
    pub call_index: u32,
    #[serde(default)]
    pub round_number: Option<u32>,
    pub item_id: Uuid,
    pub artist: String,
    pub title: String,
    #[serde(default)]
    pub source_label: Option<String>,
    #[serde(default)]
    pub host_notes: Option<String>,
    pub status: CallStatus,
    pub details: CallDetails,
    #[serde(default)]
    pub called_at: Option<String>,
    #[serde(default)]
    pub revealed_at: Option<String>,
    #[serde(default)]
    pub scored_at: Option<String>,
}

impl From<CallEntity> for CouchDocument<CallBody> {
    fn from(value: CallEntity) -> Self {
        CouchDocument::new(
            owned_doc_id(DocKind::Call, value.session_id, value.call_index),
            CallBody {
                call_id: value.id,
                session_id: value.session_id,
                call_index: value.call_index,
                round_number: value.round_number,
                item_id: value.item_id,
                artist: value.artist,
                title: value.title,
                source_label: value.source_label,
                host_notes: value.host_notes,
                status: value.status,
                details: value.details,
                called_at: value.called_at.map(encode_time),
                revealed_at: value.revealed_at.map(encode_time),
                scored_at: value.scored_at.map(encode_time),
            },
        )
    }
}

impl TryFrom<CouchDocument<CallBody>> for CallEntity {
    type Error = CouchDaoError;

    fn try_from(doc: CouchDocument<CallBody>) -> Result<Self, Self::Error> {
        check_owned_id(DocKind::Call, &doc.id, doc.body.session_id, doc.body.call_index)?;
        let body = doc.body;
        Ok(Self {
            id: body.call_id,
            session_id: body.session_id,
            call_index: body.call_index,
            round_number: body.round_number,
            item_id: body.item_id,
            artist: body.artist,
            title: body.title,
            source_label: body.source_label,
            host_notes: body.host_notes,
            status: body.status,
            details: body.details,
            called_at: decode_time(&doc.id, body.called_at.as_deref()),
            revealed_at: decode_time(&doc.id, body.revealed_at.as_deref()),
            scored_at: decode_time(&doc.id, body.scored_at.as_deref()),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardBody {
    pub session_id: Uuid,
    pub card_number: u32,
    pub cells: Vec<BingoCell>,
}

impl From<CardEntity> for CouchDocument<CardBody> {
    fn from(value: CardEntity) -> Self {
        CouchDocument::new(
            owned_doc_id(DocKind::Card, value.session_id, value.card.card_number),
            CardBody {
                session_id: value.session_id,
                card_number: value.card.card_number,
                cells: value.card.cells,
            },
        )
    }
}

impl TryFrom<CouchDocument<CardBody>> for CardEntity {
    type Error = CouchDaoError;

    fn try_from(doc: CouchDocument<CardBody>) -> Result<Self, Self::Error> {
        check_owned_id(DocKind::Card, &doc.id, doc.body.session_id, doc.body.card_number)?;
        Ok(Self {
            session_id: doc.body.session_id,
            card: BingoCard {
                card_number: doc.body.card_number,
                cells: doc.body.cells,
            },
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamBody {
    pub session_id: Uuid,
    pub team_id: u32,
    pub team_name: String,
    pub created_at: String,
}

impl From<TeamEntity> for CouchDocument<TeamBody> {
    fn from(value: TeamEntity) -> Self {
        CouchDocument::new(
            owned_doc_id(DocKind::Team, value.session_id, value.team_id),
            TeamBody {
                session_id: value.session_id,
                team_id: value.team_id,
                team_name: value.team_name,
                created_at: encode_time(value.created_at),
            },
        )
    }
}

impl TryFrom<CouchDocument<TeamBody>> for TeamEntity {
    type Error = CouchDaoError;

    fn try_from(doc: CouchDocument<TeamBody>) -> Result<Self, Self::Error> {
        check_owned_id(DocKind::Team, &doc.id, doc.body.session_id, doc.body.team_id)?;
        Ok(Self {
            created_at: decode_required_time(&doc.id, &doc.body.created_at),
            session_id: doc.body.session_id,
            team_id: doc.body.team_id,
            team_name: doc.body.team_name,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBody {
    pub session_id: Uuid,
    pub team_id: u32,
    pub target: ScoreTarget,
    pub awarded_points: u32,
    pub correct: bool,
    pub bonus: bool,
    #[serde(default)]
    pub notes: Option<String>,
    pub scored_by: String,
    pub scored_at: String,
}

impl From<ScoreEntity> for CouchDocument<ScoreBody> {
    fn from(value: ScoreEntity) -> Self {
        CouchDocument::new(
            score_doc_id(value.session_id, value.team_id, &value.target),
            ScoreBody {
                session_id: value.session_id,
                team_id: value.team_id,
                target: value.target,
                awarded_points: value.awarded_points,
                correct: value.correct,
                bonus: value.bonus,
                notes: value.notes,
                scored_by: value.scored_by,
                scored_at: encode_time(value.scored_at),
            },
        )
    }
}

impl TryFrom<CouchDocument<ScoreBody>> for ScoreEntity {
    type Error = CouchDaoError;

    fn try_from(doc: CouchDocument<ScoreBody>) -> Result<Self, Self::Error> {
        if doc.id != score_doc_id(doc.body.session_id, doc.body.team_id, &doc.body.target) {
            return Err(DocKind::Score.invalid(&doc.id, DocIdProblem::BodyMismatch));
        }
        let body = doc.body;
        Ok(Self {
            scored_at: decode_required_time(&doc.id, &body.scored_at),
            session_id: body.session_id,
            team_id: body.team_id,
            target: body.target,
            awarded_points: body.awarded_points,
            correct: body.correct,
            bonus: body.bonus,
            notes: body.notes,
            scored_by: body.scored_by,
        })
    }
}

pub fn entity_doc_id(kind: DocKind, id: Uuid) -> String {
    format!("{}{id}", kind.prefix())
}

/// Range-scan prefix of every `kind` document owned by a session.
pub fn owned_prefix(kind: DocKind, session_id: Uuid) -> String {
    format!("{}{session_id}:", kind.prefix())
}

/// Zero-padded so `_all_docs` key order matches number order.
pub fn owned_doc_id(kind: DocKind, session_id: Uuid, number: u32) -> String {
    format!("{}{number:010}", owned_prefix(kind, session_id))
}

pub fn score_doc_id(session_id: Uuid, team_id: u32, target: &ScoreTarget) -> String {
    format!(
        "{}:{}",
        owned_doc_id(DocKind::Score, session_id, team_id),
        target.storage_key()
    )
}

pub fn parse_entity_id(kind: DocKind, doc_id: &str) -> Result<Uuid, CouchDaoError> {
    let raw = doc_id
        .strip_prefix(kind.prefix())
        .ok_or_else(|| kind.invalid(doc_id, DocIdProblem::WrongPrefix))?;
    Uuid::parse_str(raw).map_err(|_| kind.invalid(doc_id, DocIdProblem::InvalidSession))
}

/// Split `<prefix><session>:<number>` into its session and number.
pub fn parse_owned_id(kind: DocKind, doc_id: &str) -> Result<(Uuid, u32), CouchDaoError> {
    let rest = doc_id
        .strip_prefix(kind.prefix())
        .ok_or_else(|| kind.invalid(doc_id, DocIdProblem::WrongPrefix))?;
    let (session, number) = rest
        .split_once(':')
        .ok_or_else(|| kind.invalid(doc_id, DocIdProblem::InvalidNumber))?;
    let session_id =
        Uuid::parse_str(session).map_err(|_| kind.invalid(doc_id, DocIdProblem::InvalidSession))?;
    let number = number
        .parse::<u32>()
        .map_err(|_| kind.invalid(doc_id, DocIdProblem::InvalidNumber))?;
    Ok((session_id, number))
}

fn check_owned_id(
    kind: DocKind,
    doc_id: &str,
    session_id: Uuid,
    number: u32,
) -> Result<(), CouchDaoError> {
    if parse_owned_id(kind, doc_id)? == (session_id, number) {
        Ok(())
    } else {
        Err(kind.invalid(doc_id, DocIdProblem::BodyMismatch))
    }
}

fn encode_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

/// Unparsable timestamps read back as absent; the clock then falls back to the full gap.
fn decode_time(doc_id: &str, raw: Option<&str>) -> Option<SystemTime> {
    let raw = raw?;
    match OffsetDateTime::parse(raw, &Rfc3339) {
        Ok(parsed) => Some(parsed.into()),
        Err(err) => {
            warn!(doc_id, value = raw, error = %err, "ignoring unparsable timestamp");
            None
        }
    }
}

fn decode_required_time(doc_id: &str, raw: &str) -> SystemTime {
    decode_time(doc_id, Some(raw)).unwrap_or(SystemTime::UNIX_EPOCH)
}
