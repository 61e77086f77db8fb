use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::SessionEntity,
    dto::{
        call::CallResponse, format_optional_time, format_system_time, template::ItemInput,
        validation::validate_not_blank,
    },
    state::{
        cards::{CardVariant, LabelMode, PickMode},
        clock::remaining_seconds,
        game::GameKind,
        scoring::{MAX_AWARD_POINTS, ScoringRules},
        state_machine::SessionStatus,
    },
};

/// Payload used to start a new game session.
///
/// Calls come either from a stored template (`template_id`) or from an inline `items` list;
/// exactly one of the two must be provided.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateSessionRequest {
    #[validate(custom(function = "validate_not_blank"), length(max = 120))]
    pub title: String,
    pub game: GameKind,
    #[serde(default)]
    pub template_id: Option<Uuid>,
    #[serde(default)]
    #[validate(nested)]
    pub items: Option<Vec<ItemInput>>,
    /// Seconds between calls; clamped to the configured minimum.
    #[serde(default)]
    pub target_gap_seconds: Option<u32>,
    #[serde(default)]
    #[validate(range(min = 1, max = 50))]
    pub round_count: Option<u32>,
    #[serde(default)]
    pub pick_mode: Option<PickMode>,
    /// Number of bingo cards to print (bingo only).
    #[serde(default)]
    #[validate(range(min = 1))]
    pub card_count: Option<u32>,
    #[serde(default)]
    pub card_variant: Option<CardVariant>,
    #[serde(default)]
    pub label_mode: Option<LabelMode>,
    #[serde(default)]
    pub show_title: Option<bool>,
    #[serde(default)]
    pub show_round: Option<bool>,
    #[serde(default)]
    pub show_countdown: Option<bool>,
    /// Teams playing a round-based game; blanks and repeats are dropped.
    #[serde(default)]
    #[validate(length(max = 32))]
    pub team_names: Option<Vec<String>>,
    /// Points a correct answer earns unless the host overrides it.
    #[serde(default)]
    #[validate(range(max = MAX_AWARD_POINTS))]
    pub points_correct: Option<u32>,
    /// Points the game's bonus adds on top of a correct answer.
    #[serde(default)]
    #[validate(range(max = MAX_AWARD_POINTS))]
    pub bonus_points: Option<u32>,
}

/// Partial update of a running session's presentation settings.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct PatchSessionRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank"), length(max = 120))]
    pub title: Option<String>,
    #[serde(default)]
    pub target_gap_seconds: Option<u32>,
    #[serde(default)]
    pub show_title: Option<bool>,
    #[serde(default)]
    pub show_round: Option<bool>,
    #[serde(default)]
    pub show_countdown: Option<bool>,
}

/// Session row plus the countdown evaluated at request time.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionResponse {
    pub id: Uuid,
    pub code: String,
    pub title: String,
    pub game: GameKind,
    pub template_id: Option<Uuid>,
    pub status: SessionStatus,
    pub target_gap_seconds: u32,
    /// Seconds left before the next call is due.
    pub remaining_seconds: u32,
    pub countdown_started_at: Option<String>,
    pub paused_at: Option<String>,
    pub paused_remaining_seconds: Option<u32>,
    pub current_call_index: u32,
    /// Round of the latest call, absent before the first call and for bingo.
    pub current_round: Option<u32>,
    pub round_count: u32,
    pub scoring: ScoringRules,
    pub pick_mode: PickMode,
    pub card_variant: CardVariant,
    pub label_mode: LabelMode,
    pub show_title: bool,
    pub show_round: bool,
    pub show_countdown: bool,
    pub created_at: String,
    pub updated_at: String,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
}

impl SessionResponse {
    /// Project a stored session, computing the countdown against `now`.
    pub fn from_entity(session: &SessionEntity, now: SystemTime) -> Self {
        Self {
            id: session.id,
            code: session.code.clone(),
            title: session.title.clone(),
            game: session.game,
            template_id: session.template_id,
            status: session.status(),
            target_gap_seconds: session.clock.target_gap_seconds,
            remaining_seconds: remaining_seconds(session, now),
            countdown_started_at: format_optional_time(session.clock.countdown_started_at),
            paused_at: format_optional_time(session.clock.paused_at),
            paused_remaining_seconds: session.clock.paused_remaining_seconds,
            current_call_index: session.current_call_index,
            current_round: session.current_round,
            round_count: session.round_count,
            scoring: session.scoring,
            pick_mode: session.pick_mode,
            card_variant: session.card_variant,
            label_mode: session.label_mode,
            show_title: session.show_title,
            show_round: session.show_round,
            show_countdown: session.show_countdown,
            created_at: format_system_time(session.created_at),
            updated_at: format_system_time(session.updated_at),
            started_at: format_optional_time(session.started_at),
            ended_at: format_optional_time(session.ended_at),
        }
    }
}

/// Result of advancing a session: the updated row and the call that was just made.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdvanceResponse {
    pub session: SessionResponse,
    pub call: CallResponse,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::clock::ClockState;
    use std::time::Duration;

    #[test]
    fn response_reports_remaining_seconds_at_request_time() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let mut clock = ClockState::pending(60);
        clock.status = SessionStatus::Running;
        clock.countdown_started_at = Some(now - Duration::from_secs(20));
        let session = SessionEntity {
            id: Uuid::new_v4(),
            code: "ABCDE".into(),
            title: "Friday bingo".into(),
            game: GameKind::Bingo,
            template_id: None,
            clock,
            current_call_index: 1,
            current_round: None,
            round_count: 1,
            scoring: ScoringRules::default(),
            pick_mode: PickMode::Setlist,
            card_variant: CardVariant::Standard,
            label_mode: LabelMode::TrackArtist,
            show_title: true,
            show_round: false,
            show_countdown: true,
            created_at: now,
            updated_at: now,
            started_at: Some(now),
            ended_at: None,
        };

        let response = SessionResponse::from_entity(&session, now);
        assert_eq!(response.remaining_seconds, 40);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "running");
        assert!(json.get("paused_at").is_none());
        assert!(json.get("ended_at").is_none());
        assert!(json.get("current_round").is_none());
        assert_eq!(json["scoring"]["points_correct"], 2);
    }

    #[test]
    fn patch_rejects_blank_title() {
        let patch = PatchSessionRequest {
            title: Some(" ".into()),
            ..PatchSessionRequest::default()
        };
        assert!(patch.validate().is_err());
        assert!(PatchSessionRequest::default().validate().is_ok());
    }

    #[test]
    fn scoring_points_are_capped() {
        let request: CreateSessionRequest = serde_json::from_value(serde_json::json!({
            "title": "Quiz night",
            "game": "name_that_tune",
            "points_correct": 9
        }))
        .unwrap();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("points_correct"));
    }
}
