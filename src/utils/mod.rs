//! Utility functions module
//!
//! This module contains utility functions used throughout the application.

pub mod clock;

// Re-export main functions
pub use clock::now_millis;
