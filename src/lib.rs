//! Pomodoro Core - A pomodoro timer state machine with restart persistence
//!
//! This library provides the timing state machine behind a pomodoro app:
//! a mutex-guarded engine that moves between stopped, running, and break
//! phases, persists enough state to survive restarts, and notifies
//! registered listeners on every change.
//!
//! ```no_run
//! use std::sync::Arc;
//! use pomodoro_core::{JsonFileStore, TickDriver, TimerConfig, TimerEngine, now_millis};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let settings = Arc::new(TimerConfig::new());
//! let store = Arc::new(JsonFileStore::new("timer-state.json"));
//! let engine = Arc::new(TimerEngine::new(settings, store, now_millis()));
//!
//! engine.subscribe("tray-icon", |snapshot| {
//!     if snapshot.phase_changed() {
//!         println!("timer is now {:?}", snapshot.phase);
//!     }
//! });
//!
//! let driver = TickDriver::spawn(engine.clone());
//! engine.on_user_toggle(now_millis());
//! // ... hand the engine to the UI ...
//! driver.shutdown().await;
//! # }
//! ```

pub mod config;
pub mod persistence;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::{TimerConfig, TimerSettings};
pub use persistence::{JsonFileStore, MemoryStore, StateStore};
pub use state::{PersistedTimerState, TimerEngine, TimerPhase, TimerSnapshot};
pub use tasks::{TickDriver, TICK_INTERVAL};
pub use utils::now_millis;
