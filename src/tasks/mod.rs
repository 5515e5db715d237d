//! Background tasks module
//!
//! This module contains background tasks that run alongside the timer engine.

pub mod ticker;

// Re-export main types
pub use ticker::{TickDriver, TICK_INTERVAL};
