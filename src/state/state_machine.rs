use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Created, nothing called yet.
    Pending,
    /// Countdown ticking towards the next call.
    Running,
    /// Countdown frozen by the host.
    Paused,
    /// Game over; the row is kept for history only.
    Completed,
}

impl SessionStatus {
    /// Whether the session accepts further host actions.
    pub fn is_completed(self) -> bool {
        matches!(self, SessionStatus::Completed)
    }
}

/// Host-driven events applied to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Freeze the countdown.
    Pause,
    /// Restart the countdown from the frozen snapshot.
    Resume,
    /// Call the next item and restart the countdown.
    Advance,
    /// End the game.
    Complete,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while {from:?}")]
pub struct InvalidTransition {
    /// The status the session was in when the event was received.
    pub from: SessionStatus,
    /// The event that cannot be applied from this status.
    pub event: SessionEvent,
}

/// Compute the status reached by applying `event` to a session currently in `from`.
pub fn compute_transition(
    from: SessionStatus,
    event: SessionEvent,
) -> Result<SessionStatus, InvalidTransition> {
    let next = match (from, event) {
        (SessionStatus::Completed, event) => return Err(InvalidTransition { from, event }),
        (
            SessionStatus::Pending | SessionStatus::Running | SessionStatus::Paused,
            SessionEvent::Pause,
        ) => SessionStatus::Paused,
        (SessionStatus::Paused, SessionEvent::Resume) => SessionStatus::Running,
        (_, SessionEvent::Advance) => SessionStatus::Running,
        (_, SessionEvent::Complete) => SessionStatus::Completed,
        (from, event) => return Err(InvalidTransition { from, event }),
    };

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_happy_path_through_session() {
        let mut status = SessionStatus::Pending;
        for (event, expected) in [
            (SessionEvent::Advance, SessionStatus::Running),
            (SessionEvent::Pause, SessionStatus::Paused),
            (SessionEvent::Resume, SessionStatus::Running),
            (SessionEvent::Advance, SessionStatus::Running),
            (SessionEvent::Complete, SessionStatus::Completed),
        ] {
            status = compute_transition(status, event).unwrap();
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn pause_is_idempotent() {
        assert_eq!(
            compute_transition(SessionStatus::Paused, SessionEvent::Pause),
            Ok(SessionStatus::Paused)
        );
    }

    #[test]
    fn advance_from_paused_restarts_running() {
        assert_eq!(
            compute_transition(SessionStatus::Paused, SessionEvent::Advance),
            Ok(SessionStatus::Running)
        );
    }

    #[test]
    fn resume_requires_paused() {
        for from in [SessionStatus::Pending, SessionStatus::Running] {
            let err = compute_transition(from, SessionEvent::Resume).unwrap_err();
            assert_eq!(err.from, from);
            assert_eq!(err.event, SessionEvent::Resume);
        }
    }

    #[test]
    fn completed_rejects_everything() {
        for event in [
            SessionEvent::Pause,
            SessionEvent::Resume,
            SessionEvent::Advance,
            SessionEvent::Complete,
        ] {
            assert!(compute_transition(SessionStatus::Completed, event).is_err());
        }
    }
}
