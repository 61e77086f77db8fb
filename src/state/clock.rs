//! Session Clock: derives the "seconds until next call" countdown from persisted fields.
//!
//! Nothing ticks on the server. Every read recomputes the remaining time from the stored
//! start instant, and every transition rewrites the stored fields so that the next read
//! lands on the expected value.

use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::state::state_machine::SessionStatus;

/// Read-only view of the fields the countdown is reconstructed from.
pub trait Countdown {
    /// Lifecycle status.
    fn status(&self) -> SessionStatus;
    /// Fixed interval between two calls.
    fn target_gap_seconds(&self) -> u32;
    /// Instant the running countdown started at.
    fn countdown_started_at(&self) -> Option<SystemTime>;
    /// Remaining seconds captured when the countdown was paused.
    fn paused_remaining_seconds(&self) -> Option<u32>;
}

/// Persisted countdown state of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockState {
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Fixed interval between two calls.
    pub target_gap_seconds: u32,
    /// Instant the running countdown started at.
    pub countdown_started_at: Option<SystemTime>,
    /// Instant the countdown was frozen at.
    pub paused_at: Option<SystemTime>,
    /// Remaining seconds captured at pause time.
    pub paused_remaining_seconds: Option<u32>,
}

impl ClockState {
    /// Fresh clock for a session that has not called anything yet.
    pub fn pending(target_gap_seconds: u32) -> Self {
        Self {
            status: SessionStatus::Pending,
            target_gap_seconds,
            countdown_started_at: None,
            paused_at: None,
            paused_remaining_seconds: None,
        }
    }
}

impl Countdown for ClockState {
    fn status(&self) -> SessionStatus {
        self.status
    }

    fn target_gap_seconds(&self) -> u32 {
        self.target_gap_seconds
    }

    fn countdown_started_at(&self) -> Option<SystemTime> {
        self.countdown_started_at
    }

    fn paused_remaining_seconds(&self) -> Option<u32> {
        self.paused_remaining_seconds
    }
}

/// Seconds left before the next call, as seen at `now`.
pub fn remaining_seconds<C: Countdown + ?Sized>(clock: &C, now: SystemTime) -> u32 {
    if clock.status() == SessionStatus::Paused {
        if let Some(snapshot) = clock.paused_remaining_seconds() {
            return snapshot;
        }
    }

    let target = clock.target_gap_seconds();
    let Some(started) = clock.countdown_started_at() else {
        return target;
    };

    // A start instant ahead of `now` (clock skew between writers) counts as no time elapsed.
    let elapsed = now
        .duration_since(started)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0);
    let elapsed = u32::try_from(elapsed).unwrap_or(u32::MAX);
    target.saturating_sub(elapsed)
}

/// Freeze the countdown, capturing the remaining seconds.
pub fn pause(clock: &ClockState, now: SystemTime) -> ClockState {
    if clock.status == SessionStatus::Paused && clock.paused_remaining_seconds.is_some() {
        return clock.clone();
    }

    ClockState {
        status: SessionStatus::Paused,
        paused_at: Some(now),
        paused_remaining_seconds: Some(remaining_seconds(clock, now)),
        ..clock.clone()
    }
}

/// Restart the countdown so that it continues from the captured snapshot.
pub fn resume(clock: &ClockState, now: SystemTime) -> ClockState {
    let target = clock.target_gap_seconds;
    let remaining = clock.paused_remaining_seconds.unwrap_or(target).max(1);
    let already_elapsed = Duration::from_secs(u64::from(target.saturating_sub(remaining)));
    let started = now.checked_sub(already_elapsed).unwrap_or(now);

    ClockState {
        status: SessionStatus::Running,
        countdown_started_at: Some(started),
        paused_at: None,
        paused_remaining_seconds: None,
        ..clock.clone()
    }
}

/// Start a fresh full-length countdown at `now`.
pub fn restart(clock: &ClockState, now: SystemTime) -> ClockState {
    ClockState {
        status: SessionStatus::Running,
        countdown_started_at: Some(now),
        paused_at: None,
        paused_remaining_seconds: None,
        ..clock.clone()
    }
}

/// Stop the clock for good.
pub fn complete(clock: &ClockState) -> ClockState {
    ClockState {
        status: SessionStatus::Completed,
        paused_at: None,
        paused_remaining_seconds: None,
        ..clock.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000 + secs)
    }

    fn running(target: u32, started: SystemTime) -> ClockState {
        ClockState {
            status: SessionStatus::Running,
            countdown_started_at: Some(started),
            ..ClockState::pending(target)
        }
    }

    #[test]
    fn pending_clock_reports_full_gap() {
        let clock = ClockState::pending(45);
        assert_eq!(remaining_seconds(&clock, at(0)), 45);
    }

    #[test]
    fn running_clock_counts_down() {
        let clock = running(60, at(0));
        assert_eq!(remaining_seconds(&clock, at(20)), 40);
        assert_eq!(remaining_seconds(&clock, at(59)), 1);
    }

    #[test]
    fn partial_seconds_are_floored() {
        let clock = running(60, at(0));
        let now = at(20) + Duration::from_millis(999);
        assert_eq!(remaining_seconds(&clock, now), 40);
    }

    #[test]
    fn remaining_never_increases_and_stops_at_zero() {
        let clock = running(30, at(0));
        let mut previous = u32::MAX;
        for secs in 0..90 {
            let remaining = remaining_seconds(&clock, at(secs));
            assert!(remaining <= previous);
            previous = remaining;
        }
        assert_eq!(previous, 0);
    }

    #[test]
    fn future_start_counts_as_no_elapsed_time() {
        let clock = running(45, at(100));
        assert_eq!(remaining_seconds(&clock, at(10)), 45);
    }

    #[test]
    fn paused_snapshot_wins_over_stale_start() {
        let clock = ClockState {
            status: SessionStatus::Paused,
            countdown_started_at: Some(at(0)),
            paused_at: Some(at(5)),
            paused_remaining_seconds: Some(12),
            target_gap_seconds: 45,
        };
        assert_eq!(remaining_seconds(&clock, at(1_000)), 12);
    }

    #[test]
    fn paused_without_snapshot_falls_back_to_start() {
        let clock = ClockState {
            status: SessionStatus::Paused,
            ..running(60, at(0))
        };
        assert_eq!(remaining_seconds(&clock, at(15)), 45);
    }

    #[test]
    fn pause_captures_remaining() {
        let paused = pause(&running(60, at(0)), at(20));
        assert_eq!(paused.status, SessionStatus::Paused);
        assert_eq!(paused.paused_remaining_seconds, Some(40));
        assert_eq!(paused.paused_at, Some(at(20)));
        assert_eq!(remaining_seconds(&paused, at(500)), 40);
    }

    #[test]
    fn pausing_twice_keeps_first_snapshot() {
        let first = pause(&running(60, at(0)), at(20));
        let second = pause(&first, at(50));
        assert_eq!(second, first);
    }

    #[test]
    fn resume_continues_from_snapshot() {
        let paused = pause(&running(60, at(0)), at(20));
        let resumed = resume(&paused, at(300));
        assert_eq!(resumed.status, SessionStatus::Running);
        assert_eq!(resumed.paused_remaining_seconds, None);
        assert_eq!(resumed.paused_at, None);
        assert_eq!(resumed.countdown_started_at, Some(at(280)));
        assert_eq!(remaining_seconds(&resumed, at(300)), 40);
    }

    #[test]
    fn pause_then_immediate_resume_keeps_remaining() {
        let clock = running(45, at(0));
        for secs in [0, 7, 30, 44] {
            let before = remaining_seconds(&clock, at(secs));
            let resumed = resume(&pause(&clock, at(secs)), at(secs));
            let after = remaining_seconds(&resumed, at(secs));
            assert!(before.abs_diff(after) <= 1, "{before} vs {after}");
        }
    }

    #[test]
    fn resume_floors_snapshot_at_one_second() {
        let paused = pause(&running(10, at(0)), at(30));
        assert_eq!(paused.paused_remaining_seconds, Some(0));
        let resumed = resume(&paused, at(40));
        assert_eq!(remaining_seconds(&resumed, at(40)), 1);
    }

    #[test]
    fn resume_without_snapshot_restarts_full_gap() {
        let clock = ClockState {
            status: SessionStatus::Paused,
            ..ClockState::pending(45)
        };
        let resumed = resume(&clock, at(10));
        assert_eq!(resumed.countdown_started_at, Some(at(10)));
        assert_eq!(remaining_seconds(&resumed, at(10)), 45);
    }

    #[test]
    fn resume_saturates_when_snapshot_exceeds_gap() {
        let clock = ClockState {
            status: SessionStatus::Paused,
            paused_remaining_seconds: Some(90),
            ..ClockState::pending(30)
        };
        let resumed = resume(&clock, at(10));
        assert_eq!(resumed.countdown_started_at, Some(at(10)));
        assert_eq!(remaining_seconds(&resumed, at(10)), 30);
    }

    #[test]
    fn restart_resets_to_full_gap() {
        let paused = pause(&running(60, at(0)), at(20));
        let restarted = restart(&paused, at(100));
        assert_eq!(restarted.status, SessionStatus::Running);
        assert_eq!(restarted.paused_remaining_seconds, None);
        assert_eq!(remaining_seconds(&restarted, at(100)), 60);
    }

    #[test]
    fn complete_clears_snapshot() {
        let paused = pause(&running(60, at(0)), at(20));
        let done = complete(&paused);
        assert_eq!(done.status, SessionStatus::Completed);
        assert_eq!(done.paused_remaining_seconds, None);
        assert_eq!(done.paused_at, None);
    }
}
