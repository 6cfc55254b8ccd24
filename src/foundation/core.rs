use std::{fmt, str::FromStr};

use crate::foundation::error::{MascotError, MascotResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Width of the canonical canvas every geometric offset is expressed in.
pub const CANVAS_WIDTH: u32 = 1080;
/// Height of the canonical canvas.
pub const CANVAS_HEIGHT: u32 = 1080;
/// Export resolution multiplier used when the caller does not pick one.
pub const CANVAS_EXPORT_SCALE: f64 = 1.0;
/// Maximum absolute user offset (canonical pixels) on either axis.
pub const OFFSET_LIMIT: f64 = 20.0;
/// Maximum absolute user rotation in degrees.
pub const ROTATION_LIMIT: f64 = 10.0;

/// Logical canvas dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in canonical pixels.
    pub width: u32,
    /// Height in canonical pixels.
    pub height: u32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::CANONICAL
    }
}

impl Canvas {
    /// The shared preview/export coordinate space.
    pub const CANONICAL: Self = Self {
        width: CANVAS_WIDTH,
        height: CANVAS_HEIGHT,
    };

    /// Build a canvas, rejecting zero-sized dimensions.
    pub fn new(width: u32, height: u32) -> MascotResult<Self> {
        if width == 0 || height == 0 {
            return Err(MascotError::validation("canvas width/height must be > 0"));
        }
        Ok(Self { width, height })
    }

    /// Center point in canonical coordinates.
    pub fn center(self) -> Point {
        Point::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }

    /// Full canvas rectangle.
    pub fn rect(self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    /// The half of the canvas a bilateral layer is clipped to.
    pub fn half_rect(self, side: Side) -> Rect {
        let w = f64::from(self.width);
        let h = f64::from(self.height);
        match side {
            Side::Left => Rect::new(0.0, 0.0, w / 2.0, h),
            Side::Right => Rect::new(w / 2.0, 0.0, w, h),
        }
    }

    /// Pixel size of a raster surface at `scale`, rounded up.
    pub fn scaled_size(self, scale: f64) -> MascotResult<(u32, u32)> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(MascotError::validation("export scale must be finite and > 0"));
        }
        let w = (f64::from(self.width) * scale).ceil();
        let h = (f64::from(self.height) * scale).ceil();
        if w > f64::from(u32::MAX) || h > f64::from(u32::MAX) {
            return Err(MascotError::validation("scaled canvas size overflows u32"));
        }
        Ok(((w as u32).max(1), (h as u32).max(1)))
    }
}

/// Which half of a bilateral category a layer represents.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Left half; the authored side of symmetric art.
    Left,
    /// Right half; drawn as a mirror of the left-authored art.
    Right,
}

impl Side {
    /// Both sides in emission order.
    pub const BOTH: [Self; 2] = [Self::Left, Self::Right];

    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Camera-facing angle for preview and export.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    /// Facing the viewer.
    #[default]
    Front,
    /// Full profile.
    Side,
    /// Three-quarter view.
    HalfSide,
    /// Seen from behind.
    Back,
}

impl Direction {
    /// All directions in display order.
    pub const ALL: [Self; 4] = [Self::Front, Self::Side, Self::HalfSide, Self::Back];

    /// Stable kebab-case name, also used as a catalog key.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Side => "side",
            Self::HalfSide => "half-side",
            Self::Back => "back",
        }
    }

    /// Whether the final raster (and the preview container) is mirrored horizontally.
    pub fn mirrors_raster(self) -> bool {
        matches!(self, Self::Back)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = MascotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| MascotError::validation(format!("unknown direction '{s}'")))
    }
}

/// User-authored geometric adjustment for a category.
///
/// `x`/`y` are canonical pixels, `rotate` is degrees. Symmetric categories apply it as authored
/// on the left side and mirrored on the right side.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PartTransform {
    /// Horizontal offset.
    #[serde(default)]
    pub x: f64,
    /// Vertical offset.
    #[serde(default)]
    pub y: f64,
    /// Rotation in degrees, clockwise in screen space.
    #[serde(default)]
    pub rotate: f64,
}

impl PartTransform {
    /// The identity transform.
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        rotate: 0.0,
    };

    /// Build a transform from components.
    pub fn new(x: f64, y: f64, rotate: f64) -> Self {
        Self { x, y, rotate }
    }

    /// Mirror across the vertical center line: `(-x, y, -rotate)`.
    pub fn mirrored(self) -> Self {
        Self {
            x: -self.x,
            y: self.y,
            rotate: -self.rotate,
        }
    }

    /// Clamp offsets to `±offset_limit` and rotation to `±rotation_limit`.
    ///
    /// Non-finite components collapse to zero.
    pub fn clamped(self, offset_limit: f64, rotation_limit: f64) -> Self {
        fn clamp(v: f64, limit: f64) -> f64 {
            if v.is_finite() { v.clamp(-limit, limit) } else { 0.0 }
        }
        Self {
            x: clamp(self.x, offset_limit),
            y: clamp(self.y, offset_limit),
            rotate: clamp(self.rotate, rotation_limit),
        }
    }

    /// Whether every component is zero.
    pub fn is_identity(self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.rotate == 0.0
    }

    /// Affine that translates by the offset and rotates about `pivot`.
    pub fn to_affine_about(self, pivot: Point) -> Affine {
        let p = pivot.to_vec2();
        // T(pivot + offset) * R(rot) * T(-pivot)
        Affine::translate(p + Vec2::new(self.x, self.y))
            * Affine::rotate(self.rotate.to_radians())
            * Affine::translate(-p)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
