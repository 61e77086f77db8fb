//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::state::game::CallDetails;

/// Rejects strings that are empty once trimmed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("value must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Checks the internal consistency of a game payload.
///
/// ```ignore
/// // slot 3 with two decoys: ok (three answers on the card)
/// // slot 4 with two decoys: err
/// ```
pub fn validate_call_details(details: &CallDetails) -> Result<(), ValidationError> {
    match details {
        CallDetails::WrongLyricChallenge {
            correct_lyric,
            decoy_lyrics,
            answer_slot,
            ..
        } => {
            validate_not_blank(correct_lyric)?;
            let slots = decoy_lyrics.len() + 1;
            if *answer_slot == 0 || usize::from(*answer_slot) > slots {
                let mut err = ValidationError::new("answer_slot_range");
                err.message =
                    Some(format!("answer slot must be between 1 and {slots} (got {answer_slot})").into());
                return Err(err);
            }
            Ok(())
        }
        CallDetails::NameThatTune {
            snippet_duration_seconds,
            ..
        } if *snippet_duration_seconds == 0 => {
            let mut err = ValidationError::new("snippet_duration");
            err.message = Some("snippet duration must be positive".into());
            Err(err)
        }
        CallDetails::OriginalOrCover {
            original_artist, ..
        } => validate_not_blank(original_artist),
        CallDetails::ArtistAlias {
            clue_era,
            clue_collaborator,
            clue_label_region,
        } => {
            validate_not_blank(clue_era)?;
            validate_not_blank(clue_collaborator)?;
            validate_not_blank(clue_label_region)
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lyric(decoys: usize, answer_slot: u8) -> CallDetails {
        CallDetails::WrongLyricChallenge {
            correct_lyric: "Is this the real life".into(),
            decoy_lyrics: (0..decoys).map(|i| format!("decoy {i}")).collect(),
            answer_slot,
            dj_cue_hint: None,
        }
    }

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("Superstition").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank("   ").is_err());
    }

    #[test]
    fn test_answer_slot_must_fit_card() {
        assert!(validate_call_details(&lyric(2, 1)).is_ok());
        assert!(validate_call_details(&lyric(2, 3)).is_ok());
        assert!(validate_call_details(&lyric(2, 0)).is_err());
        assert!(validate_call_details(&lyric(2, 4)).is_err());
    }

    #[test]
    fn test_snippet_needs_duration() {
        let ok = CallDetails::NameThatTune {
            snippet_start_seconds: 30,
            snippet_duration_seconds: 5,
        };
        let empty = CallDetails::NameThatTune {
            snippet_start_seconds: 30,
            snippet_duration_seconds: 0,
        };
        assert!(validate_call_details(&ok).is_ok());
        assert!(validate_call_details(&empty).is_err());
    }

    #[test]
    fn test_alias_clues_required() {
        let details = CallDetails::ArtistAlias {
            clue_era: "80s".into(),
            clue_collaborator: " ".into(),
            clue_label_region: "Motown / Detroit".into(),
        };
        assert!(validate_call_details(&details).is_err());
    }
}
