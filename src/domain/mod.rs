//! Pure domain types with minimal dependencies
//!
//! Types here should have no framework dependencies (cosmic, iced, etc.)
//! so the selection logic can be exercised without a display.

pub mod geometry;
pub mod selection;

pub use geometry::*;
pub use selection::*;
