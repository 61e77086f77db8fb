//! Printable call sheets.

use indexmap::IndexMap;
use serde::Serialize;

use crate::dao::models::CallEntity;
use crate::state::game::{CallDetails, GameKind};

const DETAIL_SEPARATOR: &str = " | ";

/// One printable line of a pull list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullListRow {
    /// 1-based position of the call.
    pub call_index: u32,
    /// Round the call belongs to.
    pub round_number: Option<u32>,
    /// Artist name.
    pub artist: String,
    /// Track title.
    pub title: String,
    /// Where the record lives.
    pub source_label: Option<String>,
    /// Game-specific answer summary.
    pub detail: Option<String>,
    /// Host notes.
    pub host_notes: Option<String>,
}

/// Shape calls into pull-list rows ordered by call index.
pub fn pull_list_rows(calls: &[CallEntity]) -> Vec<PullListRow> {
    let mut rows: Vec<PullListRow> = calls
        .iter()
        .map(|call| PullListRow {
            call_index: call.call_index,
            round_number: call.round_number,
            artist: call.artist.clone(),
            title: call.title.clone(),
            source_label: non_blank(call.source_label.as_deref()),
            detail: detail_line(&call.details),
            host_notes: non_blank(call.host_notes.as_deref()),
        })
        .collect();
    rows.sort_by_key(|row| row.call_index);
    rows
}

/// Per-game answer summary joined with `" | "`; `None` when nothing is worth printing.
pub fn detail_line(details: &CallDetails) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    match details {
        CallDetails::Bingo { column, album } => {
            parts.push(format!("Column: {}", column.as_str()));
            push_labelled(&mut parts, "Album", album.as_deref());
        }
        CallDetails::GenreImposter {
            record_label,
            is_imposter,
        } => {
            parts.push(if *is_imposter { "Imposter" } else { "Fits category" }.to_owned());
            push_labelled(&mut parts, "Label", record_label.as_deref());
        }
        CallDetails::OriginalOrCover {
            original_artist,
            release_year,
            is_cover,
        } => {
            if *is_cover {
                parts.push("Cover".to_owned());
                push_labelled(&mut parts, "Original artist", Some(original_artist.as_str()));
            } else {
                parts.push("Original".to_owned());
            }
            if let Some(year) = release_year {
                parts.push(format!("Year: {year}"));
            }
        }
        CallDetails::WrongLyricChallenge {
            correct_lyric,
            answer_slot,
            dj_cue_hint,
            ..
        } => {
            if !correct_lyric.trim().is_empty() {
                parts.push(format!("Answer: {} (slot {answer_slot})", correct_lyric.trim()));
            }
            push_labelled(&mut parts, "Cue", dj_cue_hint.as_deref());
        }
        CallDetails::CrateCategories {
            crate_tag,
            release_year,
        } => {
            push_labelled(&mut parts, "Category", crate_tag.as_deref());
            if let Some(year) = release_year {
                parts.push(format!("Year: {year}"));
            }
        }
        CallDetails::NameThatTune {
            snippet_start_seconds,
            snippet_duration_seconds,
        } => {
            parts.push(format!(
                "Snippet: {}:{:02} +{}s",
                snippet_start_seconds / 60,
                snippet_start_seconds % 60,
                snippet_duration_seconds
            ));
        }
        CallDetails::ArtistAlias {
            clue_era,
            clue_collaborator,
            clue_label_region,
        } => {
            push_labelled(&mut parts, "Era", Some(clue_era.as_str()));
            push_labelled(&mut parts, "Collaborator", Some(clue_collaborator.as_str()));
            push_labelled(&mut parts, "Label/Region", Some(clue_label_region.as_str()));
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(DETAIL_SEPARATOR))
    }
}

fn push_labelled(parts: &mut Vec<String>, label: &str, value: Option<&str>) {
    if let Some(value) = non_blank(value) {
        parts.push(format!("{label}: {value}"));
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

/// Turns pull-list rows into a printable document.
pub trait PullListRenderer {
    /// MIME type of the rendered document.
    fn content_type(&self) -> &'static str;
    /// Render the document.
    fn render(&self, title: &str, game: GameKind, rows: &[PullListRow]) -> String;
}

/// Plain text sheet, one block per round.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextRenderer;

impl PullListRenderer for PlainTextRenderer {
    fn content_type(&self) -> &'static str {
        "text/plain; charset=utf-8"
    }

    fn render(&self, title: &str, game: GameKind, rows: &[PullListRow]) -> String {
        let mut rounds: IndexMap<Option<u32>, Vec<&PullListRow>> = IndexMap::new();
        for row in rows {
            rounds.entry(row.round_number).or_default().push(row);
        }

        let mut out = format!("{title}\n{}\n", game.title());
        for (round, rows) in rounds {
            out.push('\n');
            if let Some(round) = round {
                out.push_str(&format!("Round {round}\n"));
            }
            for row in rows {
                out.push_str(&format!("{:>3}. {} - {}", row.call_index, row.artist, row.title));
                if let Some(source) = &row.source_label {
                    out.push_str(&format!(" [{source}]"));
                }
                out.push('\n');
                if let Some(detail) = &row.detail {
                    out.push_str(&format!("     {detail}\n"));
                }
                if let Some(notes) = &row.host_notes {
                    out.push_str(&format!("     Notes: {notes}\n"));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::game::{BingoColumn, CallStatus};
    use uuid::Uuid;

    fn call(call_index: u32, round_number: Option<u32>, details: CallDetails) -> CallEntity {
        CallEntity {
            id: Uuid::new_v4(),
            session_id: Uuid::nil(),
            call_index,
            round_number,
            item_id: Uuid::new_v4(),
            artist: format!("Artist {call_index}"),
            title: format!("Title {call_index}"),
            source_label: None,
            host_notes: None,
            status: CallStatus::Pending,
            details,
            called_at: None,
            revealed_at: None,
            scored_at: None,
        }
    }

    #[test]
    fn bingo_detail_lists_column_and_album() {
        let details = CallDetails::Bingo {
            column: BingoColumn::G,
            album: Some("Rumours".into()),
        };
        assert_eq!(
            detail_line(&details).as_deref(),
            Some("Column: G | Album: Rumours")
        );
    }

    #[test]
    fn cover_detail_names_original_artist() {
        let cover = CallDetails::OriginalOrCover {
            original_artist: "Prince".into(),
            release_year: Some(1990),
            is_cover: true,
        };
        assert_eq!(
            detail_line(&cover).as_deref(),
            Some("Cover | Original artist: Prince | Year: 1990")
        );

        let original = CallDetails::OriginalOrCover {
            original_artist: "Prince".into(),
            release_year: None,
            is_cover: false,
        };
        assert_eq!(detail_line(&original).as_deref(), Some("Original"));
    }

    #[test]
    fn empty_parts_are_skipped() {
        let details = CallDetails::CrateCategories {
            crate_tag: Some("  ".into()),
            release_year: None,
        };
        assert_eq!(detail_line(&details), None);
    }

    #[test]
    fn snippet_offset_is_minutes_and_seconds() {
        let details = CallDetails::NameThatTune {
            snippet_start_seconds: 75,
            snippet_duration_seconds: 8,
        };
        assert_eq!(detail_line(&details).as_deref(), Some("Snippet: 1:15 +8s"));
    }

    #[test]
    fn rows_are_ordered_by_call_index() {
        let details = CallDetails::GenreImposter {
            record_label: None,
            is_imposter: false,
        };
        let calls = vec![
            call(3, Some(1), details.clone()),
            call(1, Some(1), details.clone()),
            call(2, Some(1), details),
        ];
        let indices: Vec<u32> = pull_list_rows(&calls)
            .iter()
            .map(|row| row.call_index)
            .collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[test]
    fn text_renderer_groups_by_round() {
        let details = CallDetails::GenreImposter {
            record_label: Some("Motown".into()),
            is_imposter: true,
        };
        let calls = vec![
            call(1, Some(1), details.clone()),
            call(2, Some(2), details),
        ];
        let text = PlainTextRenderer.render(
            "Friday Night",
            GameKind::GenreImposter,
            &pull_list_rows(&calls),
        );
        assert!(text.starts_with("Friday Night\nGenre Imposter\n"));
        let round_one = text.find("Round 1").unwrap();
        let round_two = text.find("Round 2").unwrap();
        assert!(round_one < round_two);
        assert!(text.contains("  1. Artist 1 - Title 1\n     Imposter | Label: Motown\n"));
    }
}
