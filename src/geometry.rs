//! Surface Geometry
//!
//! Points, sizes and the proximity/clamping math used by the playground.

use serde::{Deserialize, Serialize};

/// A position on the play surface, in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Point halfway between `self` and `other`
    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

/// Width and height of a token or of the surface itself
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Per-axis multipliers applied to the token size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisFactors {
    pub x: f32,
    pub y: f32,
}

impl AxisFactors {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn scale(&self, size: Size) -> Size {
        Size::new(size.width * self.x, size.height * self.y)
    }
}

/// Two tokens intersect when both axis distances are strictly below the
/// scaled token size.
pub fn intersects(a: Point, b: Point, token: Size, factors: AxisFactors) -> bool {
    let reach = factors.scale(token);
    (a.x - b.x).abs() < reach.width && (a.y - b.y).abs() < reach.height
}

/// Clamp a token position so the scaled token stays on the surface.
///
/// Each axis is clamped to `[0, surface - token * factor]`. A surface smaller
/// than the token collapses the range to `0`.
pub fn clamp_to_surface(pos: Point, surface: Size, token: Size, factors: AxisFactors) -> Point {
    let reach = factors.scale(token);
    let max_x = (surface.width - reach.width).max(0.0);
    let max_y = (surface.height - reach.height).max(0.0);
    Point::new(pos.x.clamp(0.0, max_x), pos.y.clamp(0.0, max_y))
}
