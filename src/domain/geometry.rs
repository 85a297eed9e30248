//! Geometric types for selection regions and coordinates

use std::num::NonZeroU32;

/// A position in overlay-local logical coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Clamp the point so it lies on or inside `bounds`
    pub fn clamp_to(self, bounds: Rect) -> Point {
        Point {
            x: self.x.clamp(bounds.left, bounds.right.max(bounds.left)),
            y: self.y.clamp(bounds.top, bounds.bottom.max(bounds.top)),
        }
    }
}

/// Logical Size and Position of a rectangle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    /// Create a new rectangle from coordinates
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Rectangle at the origin with the given size
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    /// Normalized rectangle spanned by two opposite corners, in any order
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            left: a.x.min(b.x),
            top: a.y.min(b.y),
            right: a.x.max(b.x),
            bottom: a.y.max(b.y),
        }
    }

    /// Calculate the intersection of two rectangles
    pub fn intersect(&self, other: Rect) -> Option<Rect> {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right.min(other.right);
        let bottom = self.bottom.min(other.bottom);
        if left < right && top < bottom {
            Some(Rect {
                left,
                top,
                right,
                bottom,
            })
        } else {
            None
        }
    }

    /// Get the width of the rectangle
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    /// Get the height of the rectangle
    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// True when the rectangle covers no area
    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Convert to dimensions (NonZeroU32 width and height)
    pub fn dimensions(self) -> Option<RectDimension> {
        let width = NonZeroU32::new((self.width()).unsigned_abs())?;
        let height = NonZeroU32::new((self.height()).unsigned_abs())?;
        Some(RectDimension { width, height })
    }

    /// Scale a logical rectangle into pixel space.
    ///
    /// Edges are rounded outwards so a fractional scale never drops a
    /// partially covered pixel row or column.
    pub fn scale(&self, scale_x: f32, scale_y: f32) -> Rect {
        Rect {
            left: (self.left as f32 * scale_x).floor() as i32,
            top: (self.top as f32 * scale_y).floor() as i32,
            right: (self.right as f32 * scale_x).ceil() as i32,
            bottom: (self.bottom as f32 * scale_y).ceil() as i32,
        }
    }
}

/// Non-zero dimensions of a rectangle
#[derive(Clone, Copy, Debug)]
pub struct RectDimension {
    pub width: NonZeroU32,
    pub height: NonZeroU32,
}

impl RectDimension {
    /// Get the width as u32
    pub fn width(&self) -> u32 {
        self.width.get()
    }

    /// Get the height as u32
    pub fn height(&self) -> u32 {
        self.height.get()
    }
}

/// Strips of `bounds` left uncovered by `hole`.
///
/// Returns the whole surface when there is no hole, otherwise up to four
/// bands (top, bottom, left, right) around the clipped hole.
pub fn scrim_bands(bounds: Rect, hole: Option<Rect>) -> Vec<Rect> {
    let Some(hole) = hole.and_then(|h| h.intersect(bounds)) else {
        return vec![bounds];
    };

    [
        Rect::new(bounds.left, bounds.top, bounds.right, hole.top),
        Rect::new(bounds.left, hole.bottom, bounds.right, bounds.bottom),
        Rect::new(bounds.left, hole.top, hole.left, hole.bottom),
        Rect::new(hole.right, hole.top, bounds.right, hole.bottom),
    ]
    .into_iter()
    .filter(|band| !band.is_empty())
    .collect()
}
