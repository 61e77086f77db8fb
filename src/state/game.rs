//! Game catalogue: the kinds of DJ games, their per-call answer payloads and call statuses.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Letters heading the five bingo columns, left to right.
pub const BINGO_COLUMNS: [BingoColumn; 5] = [
    BingoColumn::B,
    BingoColumn::I,
    BingoColumn::N,
    BingoColumn::G,
    BingoColumn::O,
];

/// Every DJ game a session can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    /// Music Bingo: players mark tracks on 5x5 cards.
    Bingo,
    /// Three spins per round, one does not fit the category.
    GenreImposter,
    /// Teams guess whether the spin is the original recording or a cover.
    OriginalOrCover,
    /// Pick the real lyric among decoys.
    WrongLyricChallenge,
    /// Rounds of tracks grouped under a crate category.
    CrateCategories,
    /// Classic snippet identification.
    NameThatTune,
    /// Guess the artist from staged clues.
    ArtistAlias,
}

impl GameKind {
    /// Human readable title used on printed pull lists.
    pub fn title(self) -> &'static str {
        match self {
            GameKind::Bingo => "Music Bingo",
            GameKind::GenreImposter => "Genre Imposter",
            GameKind::OriginalOrCover => "Original or Cover",
            GameKind::WrongLyricChallenge => "Wrong Lyric Challenge",
            GameKind::CrateCategories => "Crate Categories",
            GameKind::NameThatTune => "Name That Tune",
            GameKind::ArtistAlias => "Artist Alias",
        }
    }

    /// Whether the game is played in numbered rounds.
    pub fn uses_rounds(self) -> bool {
        !matches!(self, GameKind::Bingo)
    }
}

/// Column heading of a bingo card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum BingoColumn {
    /// First column.
    B,
    /// Second column.
    I,
    /// Centre column, hosting the free cell on standard cards.
    N,
    /// Fourth column.
    G,
    /// Last column.
    O,
}

impl BingoColumn {
    /// Column letter for a 1-based call index, cycling through `B I N G O`.
    pub fn for_call_index(call_index: u32) -> Self {
        let slot = (call_index.max(1) - 1) as usize % BINGO_COLUMNS.len();
        BINGO_COLUMNS[slot]
    }

    /// Column letter for a 0-based grid column.
    pub fn for_grid_column(col: usize) -> Self {
        BINGO_COLUMNS[col % BINGO_COLUMNS.len()]
    }

    /// Single-letter label.
    pub fn as_str(self) -> &'static str {
        match self {
            BingoColumn::B => "B",
            BingoColumn::I => "I",
            BingoColumn::N => "N",
            BingoColumn::G => "G",
            BingoColumn::O => "O",
        }
    }
}

/// Game-specific answer data attached to a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum CallDetails {
    /// Bingo call.
    Bingo {
        /// Column the call is announced under.
        column: BingoColumn,
        /// Album the track comes from, when known.
        #[serde(default)]
        album: Option<String>,
    },
    /// Genre Imposter spin.
    GenreImposter {
        /// Label printed on the record.
        #[serde(default)]
        record_label: Option<String>,
        /// True for the one spin that does not fit the round's category.
        is_imposter: bool,
    },
    /// Original or Cover spin.
    OriginalOrCover {
        /// Artist of the original recording.
        original_artist: String,
        /// Release year of the spin.
        #[serde(default)]
        release_year: Option<i32>,
        /// True when the spin is a cover.
        is_cover: bool,
    },
    /// Wrong Lyric Challenge question.
    WrongLyricChallenge {
        /// The real lyric.
        correct_lyric: String,
        /// Decoy lyrics shown alongside the real one.
        decoy_lyrics: Vec<String>,
        /// 1-based slot holding the correct lyric on the answer card.
        answer_slot: u8,
        /// Cue the DJ drops the needle on.
        #[serde(default)]
        dj_cue_hint: Option<String>,
    },
    /// Crate Categories track.
    CrateCategories {
        /// Category tag of the crate the track was pulled from.
        #[serde(default)]
        crate_tag: Option<String>,
        /// Release year.
        #[serde(default)]
        release_year: Option<i32>,
    },
    /// Name That Tune snippet.
    NameThatTune {
        /// Offset of the snippet within the track.
        snippet_start_seconds: u32,
        /// Length of the snippet.
        snippet_duration_seconds: u32,
    },
    /// Artist Alias clue card.
    ArtistAlias {
        /// Stage 1 clue.
        clue_era: String,
        /// Stage 2 clue.
        clue_collaborator: String,
        /// Stage 3 clue.
        clue_label_region: String,
    },
}

impl CallDetails {
    /// Game the payload belongs to.
    pub fn kind(&self) -> GameKind {
        match self {
            CallDetails::Bingo { .. } => GameKind::Bingo,
            CallDetails::GenreImposter { .. } => GameKind::GenreImposter,
            CallDetails::OriginalOrCover { .. } => GameKind::OriginalOrCover,
            CallDetails::WrongLyricChallenge { .. } => GameKind::WrongLyricChallenge,
            CallDetails::CrateCategories { .. } => GameKind::CrateCategories,
            CallDetails::NameThatTune { .. } => GameKind::NameThatTune,
            CallDetails::ArtistAlias { .. } => GameKind::ArtistAlias,
        }
    }
}

/// Lifecycle of a single call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    /// Not reached yet.
    Pending,
    /// Played / asked by the host.
    Called,
    /// Answer shown to the room.
    Revealed,
    /// Points handed out.
    Scored,
    /// Dropped by the host.
    Skipped,
}

/// Host actions on an individual call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CallAction {
    /// Show the answer.
    Reveal,
    /// Record that points were handed out.
    Score,
    /// Drop the call.
    Skip,
}

/// Raised when a call action does not apply to the call's current status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {action:?} a call that is {from:?}")]
pub struct InvalidCallAction {
    /// Status the call was in.
    pub from: CallStatus,
    /// Rejected action.
    pub action: CallAction,
}

impl CallStatus {
    /// Compute the status reached by applying `action`.
    pub fn apply(self, action: CallAction) -> Result<CallStatus, InvalidCallAction> {
        match (self, action) {
            (CallStatus::Called, CallAction::Reveal) => Ok(CallStatus::Revealed),
            (CallStatus::Called | CallStatus::Revealed, CallAction::Score) => {
                Ok(CallStatus::Scored)
            }
            (CallStatus::Pending | CallStatus::Called, CallAction::Skip) => Ok(CallStatus::Skipped),
            (from, action) => Err(InvalidCallAction { from, action }),
        }
    }
}
