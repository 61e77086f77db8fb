use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{ScoreEntity, TeamEntity},
    dto::{call::CallResponse, format_system_time},
    state::scoring::{LeaderboardRow, MAX_AWARD_POINTS, ScoreTarget},
};

/// Points handed to one team.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct AwardInput {
    pub team_id: u32,
    #[serde(default)]
    pub correct: bool,
    /// Game-specific extra: named the original artist, spotted the imposter's reason, ...
    #[serde(default)]
    pub bonus: bool,
    /// Overrides the session's scoring rules for this team.
    #[serde(default)]
    #[validate(range(max = MAX_AWARD_POINTS))]
    pub awarded_points: Option<u32>,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

/// Score every listed team on a single call or on a whole round.
///
/// Exactly one of `call_index` or `round_number` must be set. Scoring the same team on the same
/// target again replaces the earlier award.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ScoreRequest {
    #[serde(default)]
    #[validate(range(min = 1))]
    pub call_index: Option<u32>,
    #[serde(default)]
    #[validate(range(min = 1))]
    pub round_number: Option<u32>,
    #[validate(length(min = 1, max = 32), nested)]
    pub awards: Vec<AwardInput>,
    #[serde(default)]
    #[validate(length(max = 80))]
    pub scored_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeamResponse {
    pub team_id: u32,
    pub team_name: String,
    pub created_at: String,
}

impl From<&TeamEntity> for TeamResponse {
    fn from(team: &TeamEntity) -> Self {
        Self {
            team_id: team.team_id,
            team_name: team.team_name.clone(),
            created_at: format_system_time(team.created_at),
        }
    }
}

/// A stored award.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeamScoreResponse {
    pub team_id: u32,
    pub target: ScoreTarget,
    pub awarded_points: u32,
    pub correct: bool,
    pub bonus: bool,
    pub notes: Option<String>,
    pub scored_by: String,
    pub scored_at: String,
}

impl From<&ScoreEntity> for TeamScoreResponse {
    fn from(score: &ScoreEntity) -> Self {
        Self {
            team_id: score.team_id,
            target: score.target,
            awarded_points: score.awarded_points,
            correct: score.correct,
            bonus: score.bonus,
            notes: score.notes.clone(),
            scored_by: score.scored_by.clone(),
            scored_at: format_system_time(score.scored_at),
        }
    }
}

/// Awards just written, the calls they closed and the standings after them.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoreResponse {
    pub target: ScoreTarget,
    pub scores: Vec<TeamScoreResponse>,
    pub calls: Vec<CallResponse>,
    pub leaderboard: Vec<LeaderboardRow>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    pub session_id: Uuid,
    pub leaderboard: Vec<LeaderboardRow>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn score_request_checks_awards() {
        let empty: ScoreRequest =
            serde_json::from_value(json!({ "call_index": 1, "awards": [] })).unwrap();
        let errors = empty.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("awards"));

        let greedy: ScoreRequest = serde_json::from_value(json!({
            "round_number": 1,
            "awards": [{ "team_id": 1, "correct": true, "awarded_points": 8 }]
        }))
        .unwrap();
        assert!(greedy.validate().is_err());

        let fine: ScoreRequest = serde_json::from_value(json!({
            "call_index": 2,
            "awards": [{ "team_id": 1, "correct": true, "bonus": true }]
        }))
        .unwrap();
        assert!(fine.validate().is_ok());
    }
}
