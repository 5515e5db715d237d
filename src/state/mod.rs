//! State management module
//!
//! This module contains the timer state machine and the types it
//! persists and publishes.

pub mod engine;
pub mod timer_state;

// Re-export main types
pub use engine::TimerEngine;
pub use timer_state::{PersistedTimerState, TimerPhase, TimerSnapshot};
