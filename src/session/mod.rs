//! Translation session helpers
//!
//! This module contains:
//! - Keyboard shortcuts per session phase

pub mod shortcuts;
