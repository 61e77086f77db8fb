use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::state::{
    cards::{BingoCard, CardItem, CardVariant, LabelMode, PickMode},
    clock::{ClockState, Countdown},
    game::{CallDetails, CallStatus, GameKind},
    scoring::{ScoreTarget, ScoringRules},
    state_machine::SessionStatus,
};

/// Named, ordered list of items a session is materialized from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateEntity {
    /// Stable identifier for the template.
    pub id: Uuid,
    /// Human readable template name.
    pub name: String,
    /// Game the template was prepared for, if any.
    pub game: Option<GameKind>,
    /// Items in setlist order.
    pub items: Vec<TemplateItemEntity>,
    /// Creation time.
    pub created_at: SystemTime,
}

/// Reference data for one playable track.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateItemEntity {
    /// Stable identifier for the item.
    pub id: Uuid,
    /// Track title.
    pub title: String,
    /// Artist name.
    pub artist: String,
    /// Album the track comes from.
    pub album: Option<String>,
    /// Where the DJ pulls the record from (crate, sleeve number, ...).
    pub source_label: Option<String>,
    /// Free-form notes for the host.
    pub host_notes: Option<String>,
    /// Game-specific answer data.
    pub details: Option<CallDetails>,
}

impl CardItem for TemplateItemEntity {
    fn item_id(&self) -> Uuid {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn artist(&self) -> &str {
        &self.artist
    }
}

/// One instance of a game being played.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionEntity {
    /// Stable identifier for the session.
    pub id: Uuid,
    /// Short code players type to join the jumbotron view.
    pub code: String,
    /// Display title.
    pub title: String,
    /// Game being played.
    pub game: GameKind,
    /// Template the calls were built from.
    pub template_id: Option<Uuid>,
    /// Countdown and lifecycle status.
    pub clock: ClockState,
    /// Index of the last call made; 0 before the first call.
    pub current_call_index: u32,
    /// Round of the last call made; absent before the first call and for bingo.
    pub current_round: Option<u32>,
    /// Number of rounds calls are split into.
    pub round_count: u32,
    /// Default points handed to teams.
    pub scoring: ScoringRules,
    /// How template items were ordered.
    pub pick_mode: PickMode,
    /// Card layout (bingo only).
    pub card_variant: CardVariant,
    /// Card label style (bingo only).
    pub label_mode: LabelMode,
    /// Show the call title on the jumbotron.
    pub show_title: bool,
    /// Show the round number on the jumbotron.
    pub show_round: bool,
    /// Show the countdown on the jumbotron.
    pub show_countdown: bool,
    /// Creation time.
    pub created_at: SystemTime,
    /// Last mutation time.
    pub updated_at: SystemTime,
    /// First advance.
    pub started_at: Option<SystemTime>,
    /// Completion time.
    pub ended_at: Option<SystemTime>,
}

impl SessionEntity {
    /// Current lifecycle status.
    pub fn status(&self) -> SessionStatus {
        self.clock.status
    }
}

impl Countdown for SessionEntity {
    fn status(&self) -> SessionStatus {
        self.clock.status
    }

    fn target_gap_seconds(&self) -> u32 {
        self.clock.target_gap_seconds
    }

    fn countdown_started_at(&self) -> Option<SystemTime> {
        self.clock.countdown_started_at
    }

    fn paused_remaining_seconds(&self) -> Option<u32> {
        self.clock.paused_remaining_seconds
    }
}

/// One playable item within a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallEntity {
    /// Stable identifier for the call.
    pub id: Uuid,
    /// Owning session.
    pub session_id: Uuid,
    /// 1-based position within the session.
    pub call_index: u32,
    /// Round the call belongs to; absent for bingo.
    pub round_number: Option<u32>,
    /// Template item the call was built from.
    pub item_id: Uuid,
    /// Artist name.
    pub artist: String,
    /// Track title.
    pub title: String,
    /// Where the DJ pulls the record from.
    pub source_label: Option<String>,
    /// Free-form notes for the host.
    pub host_notes: Option<String>,
    /// Host-facing status.
    pub status: CallStatus,
    /// Game-specific answer data.
    pub details: CallDetails,
    /// When the call was made.
    pub called_at: Option<SystemTime>,
    /// When the answer was revealed.
    pub revealed_at: Option<SystemTime>,
    /// When points were handed out.
    pub scored_at: Option<SystemTime>,
}

/// Stored bingo card of a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardEntity {
    /// Owning session.
    pub session_id: Uuid,
    /// Card layout.
    pub card: BingoCard,
}

/// Team playing a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamEntity {
    /// Owning session.
    pub session_id: Uuid,
    /// 1-based team number within the session.
    pub team_id: u32,
    /// Display name.
    pub team_name: String,
    /// Creation time.
    pub created_at: SystemTime,
}

/// Points one team earned on a call or a round. At most one row per team and target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreEntity {
    /// Owning session.
    pub session_id: Uuid,
    /// Team the points went to.
    pub team_id: u32,
    /// Call or round the points were earned on.
    pub target: ScoreTarget,
    /// Points handed out.
    pub awarded_points: u32,
    /// The team answered correctly.
    pub correct: bool,
    /// The team earned the game's bonus.
    pub bonus: bool,
    /// Host remarks.
    pub notes: Option<String>,
    /// Who entered the score.
    pub scored_by: String,
    /// When the score was last written.
    pub scored_at: SystemTime,
}
