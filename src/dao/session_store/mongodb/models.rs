use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::MongoDaoError;
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

pub const SESSION_COLLECTION_NAME: &str = "sessions";
pub const CALL_COLLECTION_NAME: &str = "calls";
pub const CARD_COLLECTION_NAME: &str = "cards";
pub const TEMPLATE_COLLECTION_NAME: &str = "templates";
pub const TEAM_COLLECTION_NAME: &str = "teams";
pub const SCORE_COLLECTION_NAME: &str = "scores";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTemplateDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    game: Option<GameKind>,
    items: Vec<TemplateItemEntity>,
    created_at: DateTime,
}

impl From<TemplateEntity> for MongoTemplateDocument {
    fn from(value: TemplateEntity) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            game: value.game,
            items: value.items,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoTemplateDocument> for TemplateEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoTemplateDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(TEMPLATE_COLLECTION_NAME, &value.id, &value.id)?,
            name: value.name,
            game: value.game,
            items: value.items,
            created_at: value.created_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSessionDocument {
    #[serde(rename = "_id")]
    id: String,
    code: String,
    title: String,
    game: GameKind,
    template_id: Option<String>,
    status: SessionStatus,
    target_gap_seconds: u32,
    countdown_started_at: Option<DateTime>,
    paused_at: Option<DateTime>,
    paused_remaining_seconds: Option<u32>,
    current_call_index: u32,
    #[serde(default)]
    current_round: Option<u32>,
    round_count: u32,
    #[serde(default)]
    scoring: ScoringRules,
    pick_mode: PickMode,
    card_variant: CardVariant,
    label_mode: LabelMode,
    show_title: bool,
    show_round: bool,
    show_countdown: bool,
    created_at: DateTime,
    updated_at: DateTime,
    started_at: Option<DateTime>,
    ended_at: Option<DateTime>,
}

impl From<SessionEntity> for MongoSessionDocument {
    fn from(value: SessionEntity) -> Self {
        let clock = value.clock;
        Self {
            id: value.id.to_string(),
            code: value.code,
            title: value.title,
            game: value.game,
            template_id: value.template_id.map(|id| id.to_string()),
            status: clock.status,
            target_gap_seconds: clock.target_gap_seconds,
            countdown_started_at: clock.countdown_started_at.map(DateTime::from_system_time),
            paused_at: clock.paused_at.map(DateTime::from_system_time),
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
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
            started_at: value.started_at.map(DateTime::from_system_time),
            ended_at: value.ended_at.map(DateTime::from_system_time),
        }
    }
}

impl TryFrom<MongoSessionDocument> for SessionEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoSessionDocument) -> Result<Self, Self::Error> {
        let id = parse_id(SESSION_COLLECTION_NAME, &value.id, &value.id)?;
        let template_id = value
            .template_id
            .as_deref()
            .map(|raw| parse_id(SESSION_COLLECTION_NAME, &value.id, raw))
            .transpose()?;
        Ok(Self {
            id,
            code: value.code,
            title: value.title,
            game: value.game,
            template_id,
            clock: ClockState {
                status: value.status,
                target_gap_seconds: value.target_gap_seconds,
                countdown_started_at: value.countdown_started_at.map(DateTime::to_system_time),
                paused_at: value.paused_at.map(DateTime::to_system_time),
                paused_remaining_seconds: value.paused_remaining_seconds,
            },
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
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
            started_at: value.started_at.map(DateTime::to_system_time),
            ended_at: value.ended_at.map(DateTime::to_system_time),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoCallDocument {
    #[serde(rename = "_id")]
    id: String,
    call_id: String,
    session_id: String,
    call_index: u32,
    round_number: Option<u32>,
    item_id: String,
    artist: String,
    title: String,
    source_label: Option<String>,
    host_notes: Option<String>,
    status: CallStatus,
    details: CallDetails,
    called_at: Option<DateTime>,
    revealed_at: Option<DateTime>,
    scored_at: Option<DateTime>,
}

impl From<CallEntity> for MongoCallDocument {
    fn from(value: CallEntity) -> Self {
        Self {
            id: owned_key(value.session_id, value.call_index),
            call_id: value.id.to_string(),
            session_id: value.session_id.to_string(),
            call_index: value.call_index,
            round_number: value.round_number,
            item_id: value.item_id.to_string(),
            artist: value.artist,
            title: value.title,
            source_label: value.source_label,
            host_notes: value.host_notes,
            status: value.status,
            details: value.details,
            called_at: value.called_at.map(DateTime::from_system_time),
            revealed_at: value.revealed_at.map(DateTime::from_system_time),
            scored_at: value.scored_at.map(DateTime::from_system_time),
        }
    }
}

impl TryFrom<MongoCallDocument> for CallEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoCallDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(CALL_COLLECTION_NAME, &value.id, &value.call_id)?,
            session_id: parse_id(CALL_COLLECTION_NAME, &value.id, &value.session_id)?,
            call_index: value.call_index,
            round_number: value.round_number,
            item_id: parse_id(CALL_COLLECTION_NAME, &value.id, &value.item_id)?,
            artist: value.artist,
            title: value.title,
            source_label: value.source_label,
            host_notes: value.host_notes,
            status: value.status,
            details: value.details,
            called_at: value.called_at.map(DateTime::to_system_time),
            revealed_at: value.revealed_at.map(DateTime::to_system_time),
            scored_at: value.scored_at.map(DateTime::to_system_time),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoCardDocument {
    #[serde(rename = "_id")]
    id: String,
    session_id: String,
    card_number: u32,
    cells: Vec<BingoCell>,
}

impl From<CardEntity> for MongoCardDocument {
    fn from(value: CardEntity) -> Self {
        Self {
            id: owned_key(value.session_id, value.card.card_number),
            session_id: value.session_id.to_string(),
            card_number: value.card.card_number,
            cells: value.card.cells,
        }
    }
}

impl TryFrom<MongoCardDocument> for CardEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoCardDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            session_id: parse_id(CARD_COLLECTION_NAME, &value.id, &value.session_id)?,
            card: BingoCard {
                card_number: value.card_number,
                cells: value.cells,
            },
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTeamDocument {
    #[serde(rename = "_id")]
    id: String,
    session_id: String,
    team_id: u32,
    team_name: String,
    created_at: DateTime,
}

impl From<TeamEntity> for MongoTeamDocument {
    fn from(value: TeamEntity) -> Self {
        Self {
            id: owned_key(value.session_id, value.team_id),
            session_id: value.session_id.to_string(),
            team_id: value.team_id,
            team_name: value.team_name,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoTeamDocument> for TeamEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoTeamDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            session_id: parse_id(TEAM_COLLECTION_NAME, &value.id, &value.session_id)?,
            team_id: value.team_id,
            team_name: value.team_name,
            created_at: value.created_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoScoreDocument {
    #[serde(rename = "_id")]
    id: String,
    session_id: String,
    team_id: u32,
    target: ScoreTarget,
    awarded_points: u32,
    correct: bool,
    bonus: bool,
    notes: Option<String>,
    scored_by: String,
    scored_at: DateTime,
}

impl From<ScoreEntity> for MongoScoreDocument {
    fn from(value: ScoreEntity) -> Self {
        Self {
            id: score_key(value.session_id, value.team_id, &value.target),
            session_id: value.session_id.to_string(),
            team_id: value.team_id,
            target: value.target,
            awarded_points: value.awarded_points,
            correct: value.correct,
            bonus: value.bonus,
            notes: value.notes,
            scored_by: value.scored_by,
            scored_at: DateTime::from_system_time(value.scored_at),
        }
    }
}

impl TryFrom<MongoScoreDocument> for ScoreEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoScoreDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            session_id: parse_id(SCORE_COLLECTION_NAME, &value.id, &value.session_id)?,
            team_id: value.team_id,
            target: value.target,
            awarded_points: value.awarded_points,
            correct: value.correct,
            bonus: value.bonus,
            notes: value.notes,
            scored_by: value.scored_by,
            scored_at: value.scored_at.to_system_time(),
        })
    }
}

/// Composite key of a score (`<session>:<team>:<target>`).
pub fn score_key(session_id: Uuid, team_id: u32, target: &ScoreTarget) -> String {
    format!("{session_id}:{team_id}:{}", target.storage_key())
}

/// Composite key of a row owned by a session (`<session>:<index>`).
pub fn owned_key(session_id: Uuid, index: u32) -> String {
    format!("{session_id}:{index}")
}

pub fn doc_id(id: impl ToString) -> Document {
    doc! {"_id": id.to_string()}
}

pub fn session_filter(session_id: Uuid) -> Document {
    doc! {"session_id": session_id.to_string()}
}

fn parse_id(collection: &'static str, doc_id: &str, raw: &str) -> Result<Uuid, MongoDaoError> {
    Uuid::parse_str(raw).map_err(|err| MongoDaoError::Corrupted {
        collection,
        id: doc_id.to_owned(),
        reason: format!("invalid UUID `{raw}`: {err}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    #[test]
    fn session_document_keeps_clock_fields() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let entity = SessionEntity {
            id: Uuid::new_v4(),
            code: "K7M2Q".into(),
            title: "Thursday".into(),
            game: GameKind::NameThatTune,
            template_id: Some(Uuid::new_v4()),
            clock: ClockState {
                status: SessionStatus::Paused,
                target_gap_seconds: 60,
                countdown_started_at: Some(now),
                paused_at: Some(now + Duration::from_secs(20)),
                paused_remaining_seconds: Some(40),
            },
            current_call_index: 3,
            current_round: Some(2),
            round_count: 2,
            scoring: ScoringRules {
                points_correct: 3,
                bonus_points: 2,
            },
            pick_mode: PickMode::Shuffle,
            card_variant: CardVariant::Standard,
            label_mode: LabelMode::TrackOnly,
            show_title: false,
            show_round: true,
            show_countdown: true,
            created_at: now,
            updated_at: now,
            started_at: Some(now),
            ended_at: None,
        };

        let document = MongoSessionDocument::from(entity.clone());
        let back = SessionEntity::try_from(document).unwrap();
        assert_eq!(back, entity);
    }

    #[test]
    fn score_document_is_keyed_by_team_and_target() {
        let session_id = Uuid::new_v4();
        let entity = ScoreEntity {
            session_id,
            team_id: 2,
            target: ScoreTarget::Round { round_number: 3 },
            awarded_points: 4,
            correct: true,
            bonus: true,
            notes: Some("named the sample".into()),
            scored_by: "host".into(),
            scored_at: SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000),
        };

        let document = MongoScoreDocument::from(entity.clone());
        assert_eq!(document.id, format!("{session_id}:2:round-0000000003"));
        assert_eq!(ScoreEntity::try_from(document).unwrap(), entity);
    }

    #[test]
    fn malformed_id_is_reported_as_corruption() {
        let err = parse_id(SESSION_COLLECTION_NAME, "bad", "not-a-uuid").unwrap_err();
        assert!(matches!(err, MongoDaoError::Corrupted { .. }));
    }
}
