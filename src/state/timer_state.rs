//! Timer phases and the persisted/observable state records

use serde::{Deserialize, Serialize};

/// Phase of the pomodoro state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimerPhase {
    /// Timer was not started, or was stopped during a pomodoro or break.
    Stop,
    /// Pomodoro in progress.
    Run,
    /// Break in progress. Can only be entered by completing a pomodoro.
    Break,
}

/// Durable record of the timer, written whenever the externally visible
/// phase or the cycle counter changes and read back once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedTimerState {
    /// Phase the machine was in when last saved.
    pub phase: TimerPhase,
    /// Phase as of the last listener notification, `None` until the first
    /// notification (and again after a stale period is discarded).
    pub last_observed_phase: Option<TimerPhase>,
    /// Epoch milliseconds at which the current period began; `-1` after a
    /// stale period is discarded, meaningless while stopped.
    pub start_time_millis: i64,
    /// Completed pomodoro count since the last reset.
    pub completed_cycles: u32,
}

impl PersistedTimerState {
    /// Record for a timer that has never run.
    pub fn new() -> Self {
        Self {
            phase: TimerPhase::Stop,
            last_observed_phase: None,
            start_time_millis: 0,
            completed_cycles: 0,
        }
    }
}

impl Default for PersistedTimerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Atomic view of the engine handed to change listeners and watch
/// subscribers.
///
/// `last_observed_phase` holds the value from before the notification that
/// produced this snapshot, so a receiver can tell a fresh transition (say, a
/// break that just started) from a repeated progress update of the same
/// period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimerSnapshot {
    pub phase: TimerPhase,
    pub last_observed_phase: Option<TimerPhase>,
    /// Epoch milliseconds at which the current period began.
    pub start_time_millis: i64,
    /// Elapsed whole seconds within the current period, clamped to
    /// `progress_max_seconds`.
    pub progress_seconds: u64,
    /// Length of the current period in whole seconds.
    pub progress_max_seconds: u64,
    pub completed_cycles: u32,
    /// True when the user interrupted the period, as opposed to it timing
    /// out naturally.
    pub was_manually_stopped: bool,
}

impl TimerSnapshot {
    /// Whether this snapshot was produced by a phase change rather than a
    /// progress update within the same phase.
    pub fn phase_changed(&self) -> bool {
        self.last_observed_phase != Some(self.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_serializes_with_stable_names() {
        assert_eq!(serde_json::to_string(&TimerPhase::Stop).unwrap(), "\"STOP\"");
        assert_eq!(serde_json::to_string(&TimerPhase::Run).unwrap(), "\"RUN\"");
        assert_eq!(serde_json::to_string(&TimerPhase::Break).unwrap(), "\"BREAK\"");
    }

    #[test]
    fn persisted_state_round_trips() {
        let record = PersistedTimerState {
            phase: TimerPhase::Break,
            last_observed_phase: Some(TimerPhase::Run),
            start_time_millis: 1_700_000_000_000,
            completed_cycles: 3,
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: PersistedTimerState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn default_record_is_fresh() {
        let record = PersistedTimerState::default();
        assert_eq!(record.phase, TimerPhase::Stop);
        assert_eq!(record.last_observed_phase, None);
        assert_eq!(record.start_time_millis, 0);
        assert_eq!(record.completed_cycles, 0);
    }

    #[test]
    fn phase_changed_detects_fresh_transitions() {
        let snapshot = TimerSnapshot {
            phase: TimerPhase::Break,
            last_observed_phase: Some(TimerPhase::Run),
            start_time_millis: 0,
            progress_seconds: 0,
            progress_max_seconds: 300,
            completed_cycles: 1,
            was_manually_stopped: false,
        };
        assert!(snapshot.phase_changed());

        let repeat = TimerSnapshot {
            last_observed_phase: Some(TimerPhase::Break),
            ..snapshot
        };
        assert!(!repeat.phase_changed());
    }
}
