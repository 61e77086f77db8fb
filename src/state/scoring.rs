//! Team scoring: point awards per call or per round, and the leaderboard built from them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dao::models::{ScoreEntity, TeamEntity};

/// Largest number of points a single award may carry.
pub const MAX_AWARD_POINTS: u32 = 5;

/// Fewest teams a team-scored session can start with.
pub const MIN_TEAM_COUNT: usize = 2;

/// What an award is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreTarget {
    /// A single call.
    Call {
        /// 1-based call index.
        call_index: u32,
    },
    /// Every played call of a round.
    Round {
        /// 1-based round number.
        round_number: u32,
    },
}

impl ScoreTarget {
    /// Stable textual key used in composite storage ids.
    pub fn storage_key(&self) -> String {
        match self {
            ScoreTarget::Call { call_index } => format!("call-{call_index:010}"),
            ScoreTarget::Round { round_number } => format!("round-{round_number:010}"),
        }
    }
}

/// Default points a session hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ScoringRules {
    /// Points for a correct answer.
    pub points_correct: u32,
    /// Extra points for the game's bonus (named the original artist, the imposter reason, ...).
    pub bonus_points: u32,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            points_correct: 2,
            bonus_points: 1,
        }
    }
}

impl ScoringRules {
    /// Points for one team. An explicit amount wins; otherwise a correct answer earns
    /// `points_correct` and the bonus only counts on top of a correct answer.
    pub fn points_for(&self, correct: bool, bonus: bool, explicit: Option<u32>) -> u32 {
        let points = explicit.unwrap_or_else(|| {
            if !correct {
                return 0;
            }
            let extra = if bonus { self.bonus_points } else { 0 };
            self.points_correct.saturating_add(extra)
        });
        points.min(MAX_AWARD_POINTS)
    }
}

/// Trim team names, drop blanks and repeats, keeping the first occurrence order.
pub fn normalize_team_names(names: &[String]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(names.len());
    for name in names.iter().map(|name| name.trim()).filter(|name| !name.is_empty()) {
        if !unique.iter().any(|seen| seen == name) {
            unique.push(name.to_string());
        }
    }
    unique
}

/// Standing of one team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LeaderboardRow {
    /// Team number within the session.
    pub team_id: u32,
    /// Display name.
    pub team_name: String,
    /// Sum of awarded points.
    pub total_points: u32,
    /// Awards marked correct.
    pub correct_answers: u32,
    /// Awards that earned the bonus.
    pub bonus_hits: u32,
    /// Calls and rounds the team was scored on.
    pub scored_targets: u32,
}

/// Aggregate awards per team, best first.
///
/// Ties fall back to correct answers, then bonus hits, then team name. Awards for teams that
/// are not listed are ignored.
pub fn leaderboard(teams: &[TeamEntity], scores: &[ScoreEntity]) -> Vec<LeaderboardRow> {
    let mut rows: HashMap<u32, LeaderboardRow> = teams
        .iter()
        .map(|team| {
            (
                team.team_id,
                LeaderboardRow {
                    team_id: team.team_id,
                    team_name: team.team_name.clone(),
                    total_points: 0,
                    correct_answers: 0,
                    bonus_hits: 0,
                    scored_targets: 0,
                },
            )
        })
        .collect();

    for score in scores {
        let Some(row) = rows.get_mut(&score.team_id) else {
            continue;
        };
        row.total_points = row.total_points.saturating_add(score.awarded_points);
        row.correct_answers += u32::from(score.correct);
        row.bonus_hits += u32::from(score.bonus);
        row.scored_targets += 1;
    }

    let mut ordered: Vec<LeaderboardRow> = rows.into_values().collect();
    ordered.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then(b.correct_answers.cmp(&a.correct_answers))
            .then(b.bonus_hits.cmp(&a.bonus_hits))
            .then_with(|| a.team_name.cmp(&b.team_name))
    });
    ordered
}
