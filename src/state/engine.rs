//! Pomodoro timer state machine
//!
//! A single mutex guards every mutation, so ticks, user toggles, and
//! accessors can arrive from any thread in any interleaving. Listeners
//! run synchronously inside the lock and receive a snapshot of the
//! state that triggered them; a panicking listener is isolated and
//! never takes the engine down with it.

use std::{
    collections::HashMap,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::TimerSettings;
use crate::persistence::StateStore;
use super::{PersistedTimerState, TimerPhase, TimerSnapshot};

type ListenerFn = Box<dyn Fn(&TimerSnapshot) + Send>;

/// Everything the engine mutates, kept behind one lock.
struct EngineInner {
    phase: TimerPhase,
    last_observed_phase: Option<TimerPhase>,
    /// Wall-clock start of the current period, or -1 when stopped.
    start_time_millis: i64,
    /// Length of the current period. Zero while stopped.
    progress_max_millis: u64,
    /// Whole seconds elapsed in the current period, clamped to the max.
    progress_seconds: u64,
    completed_cycles: u32,
    was_manually_stopped: bool,
    listeners: HashMap<String, ListenerFn>,
}

/// Pomodoro timer engine with restart persistence and change notifications
///
/// The engine owns no clock and no thread. Callers feed it wall-clock
/// time through [`on_tick`](Self::on_tick) and
/// [`on_user_toggle`](Self::on_user_toggle); a driver such as
/// [`TickDriver`](crate::tasks::TickDriver) typically supplies the ticks.
pub struct TimerEngine {
    settings: Arc<dyn TimerSettings>,
    store: Arc<dyn StateStore>,
    inner: Mutex<EngineInner>,
    /// Channel for broadcasting timer updates
    updates_tx: watch::Sender<TimerSnapshot>,
    /// Keep the receiver alive to prevent channel closure
    _updates_rx: watch::Receiver<TimerSnapshot>,
}

impl TimerEngine {
    /// Builds an engine from whatever the store has, resuming a period
    /// that was interrupted by a restart.
    ///
    /// A persisted RUN or BREAK is picked up where it left off unless
    /// the gap since its start exceeds the configured resume timeout,
    /// in which case the engine starts out stopped. Completed cycles
    /// survive either way. Load failures fall back to a fresh state.
    pub fn new(
        settings: Arc<dyn TimerSettings>,
        store: Arc<dyn StateStore>,
        now_millis: i64,
    ) -> Self {
        let record = store.load().unwrap_or_else(|e| {
            warn!("Failed to load timer state, starting fresh: {:#}", e);
            PersistedTimerState::new()
        });

        let mut inner = EngineInner {
            phase: record.phase,
            last_observed_phase: record.last_observed_phase,
            start_time_millis: record.start_time_millis,
            progress_max_millis: 0,
            progress_seconds: 0,
            completed_cycles: record.completed_cycles,
            was_manually_stopped: false,
            listeners: HashMap::new(),
        };

        let mut discarded_stale = false;
        if inner.phase != TimerPhase::Stop {
            let gap = now_millis - inner.start_time_millis;
            if gap > settings.resume_timeout_millis() as i64 {
                debug!(
                    "Discarding persisted {:?} period started {}ms ago, past the {}ms resume timeout",
                    inner.phase,
                    gap,
                    settings.resume_timeout_millis()
                );
                inner.phase = TimerPhase::Stop;
                inner.last_observed_phase = None;
                inner.start_time_millis = -1;
                discarded_stale = true;
            } else {
                inner.progress_max_millis = period_length_millis(settings.as_ref(), inner.phase);
                inner.progress_seconds =
                    clamped_progress(now_millis, inner.start_time_millis, inner.progress_max_millis);
                info!(
                    "Resuming {:?} period, {}s of {}s elapsed",
                    inner.phase,
                    inner.progress_seconds,
                    inner.progress_max_millis / 1000
                );
            }
        }

        if discarded_stale {
            persist_state(store.as_ref(), &inner);
        }

        let (updates_tx, updates_rx) = watch::channel(snapshot_of(&inner));

        Self {
            settings,
            store,
            inner: Mutex::new(inner),
            updates_tx,
            _updates_rx: updates_rx,
        }
    }

    /// Handles the single user control: stopped timers start a
    /// pomodoro, running pomodoros and breaks stop.
    pub fn on_user_toggle(&self, now_millis: i64) {
        let mut inner = self.lock_inner();
        match inner.phase {
            TimerPhase::Stop => {
                inner.phase = TimerPhase::Run;
                inner.start_time_millis = now_millis;
                inner.progress_max_millis = self.settings.pomodoro_length_millis();
                inner.was_manually_stopped = false;
                info!("Pomodoro started");
            }
            TimerPhase::Run | TimerPhase::Break => {
                inner.phase = TimerPhase::Stop;
                inner.was_manually_stopped = true;
                info!("Timer manually stopped");
            }
        }
        self.advance(&mut inner, now_millis);
    }

    /// Advances the state machine to `now_millis`. Drivers call this
    /// roughly twice a second; calling it with the same time twice is
    /// harmless.
    pub fn on_tick(&self, now_millis: i64) {
        let mut inner = self.lock_inner();
        self.advance(&mut inner, now_millis);
    }

    /// Clears the completed-cycle counter.
    pub fn reset_cycles(&self) {
        let mut inner = self.lock_inner();
        inner.completed_cycles = 0;
        info!("Completed cycle counter reset");
        persist_state(self.store.as_ref(), &inner);
    }

    /// Registers a listener under a key, replacing any previous
    /// listener with the same key. Listeners run inside the engine
    /// lock and must not call back into the engine.
    pub fn subscribe<F>(&self, key: impl Into<String>, listener: F)
    where
        F: Fn(&TimerSnapshot) + Send + 'static,
    {
        let mut inner = self.lock_inner();
        inner.listeners.insert(key.into(), Box::new(listener));
    }

    /// Removes the listener registered under `key`, if any.
    pub fn unsubscribe(&self, key: &str) {
        let mut inner = self.lock_inner();
        inner.listeners.remove(key);
    }

    /// Get a receiver for timer updates
    pub fn watch_updates(&self) -> watch::Receiver<TimerSnapshot> {
        self.updates_tx.subscribe()
    }

    pub fn phase(&self) -> TimerPhase {
        self.lock_inner().phase
    }

    pub fn last_observed_phase(&self) -> Option<TimerPhase> {
        self.lock_inner().last_observed_phase
    }

    pub fn progress_seconds(&self) -> u64 {
        self.lock_inner().progress_seconds
    }

    pub fn progress_max_seconds(&self) -> u64 {
        self.lock_inner().progress_max_millis / 1000
    }

    pub fn completed_cycles(&self) -> u32 {
        self.lock_inner().completed_cycles
    }

    /// Whether the most recent stop came from the user rather than a
    /// break running out.
    pub fn was_manually_stopped(&self) -> bool {
        self.lock_inner().was_manually_stopped
    }

    /// Returns a copy of the current state, coherent across all fields.
    pub fn snapshot(&self) -> TimerSnapshot {
        snapshot_of(&self.lock_inner())
    }

    // A panicking listener must not wedge the engine, so poisoned
    // locks are recovered rather than propagated.
    fn lock_inner(&self) -> MutexGuard<'_, EngineInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Recomputes progress, applies due phase transitions, and
    /// publishes the result. Called with the lock already held.
    fn advance(&self, inner: &mut EngineInner, now_millis: i64) {
        match inner.phase {
            TimerPhase::Run => {
                inner.progress_seconds =
                    clamped_progress(now_millis, inner.start_time_millis, inner.progress_max_millis);
                if now_millis >= inner.start_time_millis + inner.progress_max_millis as i64 {
                    inner.phase = TimerPhase::Break;
                    inner.start_time_millis = now_millis;
                    inner.progress_max_millis = self.settings.break_length_millis();
                    inner.progress_seconds =
                        clamped_progress(now_millis, inner.start_time_millis, inner.progress_max_millis);
                    inner.completed_cycles += 1;
                    debug!("Pomodoro complete, starting break (cycle {})", inner.completed_cycles);
                }
            }
            TimerPhase::Break => {
                inner.progress_seconds =
                    clamped_progress(now_millis, inner.start_time_millis, inner.progress_max_millis);
                if now_millis >= inner.start_time_millis + inner.progress_max_millis as i64 {
                    inner.phase = TimerPhase::Stop;
                    inner.was_manually_stopped = false;
                    debug!("Break complete, timer stopped");
                }
            }
            TimerPhase::Stop => {
                if inner.last_observed_phase == Some(TimerPhase::Stop) {
                    return;
                }
            }
        }

        let snapshot = snapshot_of(inner);
        for (key, listener) in &inner.listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(&snapshot))).is_err() {
                error!("Timer listener '{}' panicked during notification", key);
            }
        }
        if let Err(e) = self.updates_tx.send(snapshot) {
            warn!("Failed to send timer update: {}", e);
        }

        if inner.last_observed_phase != Some(inner.phase) {
            inner.last_observed_phase = Some(inner.phase);
            persist_state(self.store.as_ref(), inner);
        }
    }
}

/// Writes the durable slice of the state to the store. Persistence is
/// best effort; failures are logged and the engine keeps running.
fn persist_state(store: &dyn StateStore, inner: &EngineInner) {
    let record = PersistedTimerState {
        phase: inner.phase,
        last_observed_phase: inner.last_observed_phase,
        start_time_millis: inner.start_time_millis,
        completed_cycles: inner.completed_cycles,
    };
    if let Err(e) = store.save(&record) {
        warn!("Failed to save timer state: {:#}", e);
    }
}

fn snapshot_of(inner: &EngineInner) -> TimerSnapshot {
    TimerSnapshot {
        phase: inner.phase,
        last_observed_phase: inner.last_observed_phase,
        start_time_millis: inner.start_time_millis,
        progress_seconds: inner.progress_seconds,
        progress_max_seconds: inner.progress_max_millis / 1000,
        completed_cycles: inner.completed_cycles,
        was_manually_stopped: inner.was_manually_stopped,
    }
}

/// Whole seconds between `start_millis` and `now_millis`, clamped to
/// `[0, max_millis / 1000]` so progress never runs backwards past the
/// period bounds.
fn clamped_progress(now_millis: i64, start_millis: i64, max_millis: u64) -> u64 {
    ((now_millis - start_millis) / 1000).clamp(0, (max_millis / 1000) as i64) as u64
}

fn period_length_millis(settings: &dyn TimerSettings, phase: TimerPhase) -> u64 {
    match phase {
        TimerPhase::Run => settings.pomodoro_length_millis(),
        TimerPhase::Break => settings.break_length_millis(),
        TimerPhase::Stop => 0,
    }
}
