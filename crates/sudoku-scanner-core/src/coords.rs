//! Pixel <-> normalized coordinate conversions.
//!
//! Normalized coordinates are fractions of the image width/height of the image
//! a point refers to. Neither direction clamps: a corner reported exactly on
//! the right edge maps to `x == 1.0`, and slightly out-of-range inputs map
//! back to where they came from.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::Quad;

/// Pixel dimensions of the image a set of coordinates refers to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `true` when either side is zero; such an image has no coordinate space.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn normalize(self, pixel: Point2<f64>) -> Point2<f64> {
        to_normalized(pixel, self.width as f64, self.height as f64)
    }

    #[inline]
    pub fn denormalize(self, normalized: Point2<f64>) -> Point2<f64> {
        to_pixel(normalized, self.width as f64, self.height as f64)
    }

    /// Normalize all four corners of a pixel-space quad.
    pub fn normalize_quad(self, pixel: &Quad) -> Quad {
        pixel.map(|p| self.normalize(p))
    }

    /// Map all four corners of a normalized quad into pixel space.
    pub fn denormalize_quad(self, normalized: &Quad) -> Quad {
        normalized.map(|p| self.denormalize(p))
    }
}

/// `(x / width, y / height)`.
///
/// `width` and `height` must be positive.
#[inline]
pub fn to_normalized(pixel: Point2<f64>, width: f64, height: f64) -> Point2<f64> {
    Point2::new(pixel.x / width, pixel.y / height)
}

/// `(x * width, y * height)`, the inverse of [`to_normalized`].
#[inline]
pub fn to_pixel(normalized: Point2<f64>, width: f64, height: f64) -> Point2<f64> {
    Point2::new(normalized.x * width, normalized.y * height)
}
