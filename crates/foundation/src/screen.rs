use serde::{Deserialize, Serialize};

/// A position in viewport pixels, origin at the top-left corner.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: ScreenPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: f64,
    pub height: f64,
}

impl ScreenSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Edge insets in pixels, as used for camera padding.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Padding {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Padding {
    pub fn new(top: f64, bottom: f64, left: f64, right: f64) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }
}

/// Axis-aligned pixel rectangle.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScreenRect {
    pub min: ScreenPoint,
    pub max: ScreenPoint,
}

impl ScreenRect {
    pub fn from_size(size: ScreenSize) -> Self {
        Self {
            min: ScreenPoint::new(0.0, 0.0),
            max: ScreenPoint::new(size.width, size.height),
        }
    }

    /// Shrinks the rectangle by `padding`. Over-sized insets collapse to an
    /// empty rectangle instead of inverting.
    pub fn inset(&self, padding: Padding) -> Self {
        let min_x = self.min.x + padding.left;
        let min_y = self.min.y + padding.top;
        let max_x = (self.max.x - padding.right).max(min_x);
        let max_y = (self.max.y - padding.bottom).max(min_y);
        Self {
            min: ScreenPoint::new(min_x, min_y),
            max: ScreenPoint::new(max_x, max_y),
        }
    }

    pub fn center(&self) -> ScreenPoint {
        ScreenPoint::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    pub fn contains(&self, p: ScreenPoint) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}
