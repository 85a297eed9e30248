//! Screen capture for a translation session
//!
//! This module consolidates:
//! - Screenshot image type (image.rs)
//! - One-shot capture of every output (snapshot.rs)
//! - Cropping a logical selection out of a captured output (crop.rs)

pub mod crop;
pub mod image;
pub mod snapshot;

pub use crop::{CroppedImage, crop_logical};
pub use image::ScreenshotImage;
pub use snapshot::{OutputSnapshot, ScreenSnapshot, capture_snapshot};
