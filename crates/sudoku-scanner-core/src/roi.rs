//! Percentage-based region-of-interest windowing.
//!
//! The ROI is a square of side `size * w_fit`, horizontally centered and
//! shifted up from the vertical center by `offset * h_fit`, where
//! `(w_fit, h_fit)` is the largest rectangle of the requested aspect ratio
//! anchored on one image axis:
//!
//! - `aspect_ratio > height / width`: the fitted rectangle takes the full
//!   image height, `w_fit = height / aspect_ratio`;
//! - otherwise it takes the full image width, `h_fit = width * aspect_ratio`.
//!
//! Both fractions refer to the fitted rectangle, not to the raw image.

use serde::{Deserialize, Serialize};

use crate::ImageSize;

/// ROI request expressed as fractions of a fitted reference rectangle.
///
/// Any field `<= 0` (or NaN) means "no cropping requested".
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoiParams {
    /// Side of the square window as a fraction of the fitted width.
    pub size: f64,
    /// Upward shift of the window as a fraction of the fitted height.
    pub offset: f64,
    /// Target height / width ratio of the fitted rectangle.
    pub aspect_ratio: f64,
}

impl RoiParams {
    pub fn new(size: f64, offset: f64, aspect_ratio: f64) -> Self {
        Self {
            size,
            offset,
            aspect_ratio,
        }
    }

    /// Cropping is requested only when all three fields are strictly positive.
    pub fn requests_crop(&self) -> bool {
        self.size > 0.0 && self.offset > 0.0 && self.aspect_ratio > 0.0
    }
}

/// Integer pixel window; `x..x + width` by `y..y + height`, end exclusive.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RoiRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl RoiRect {
    pub fn x_end(&self) -> u32 {
        self.x + self.width
    }

    pub fn y_end(&self) -> u32 {
        self.y + self.height
    }

    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.width, self.height)
    }
}

/// Why no usable window could be produced.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RoiError {
    #[error("cannot place a ROI in an empty image ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("degenerate ROI window x={x_start}..{x_end}, y={y_start}..{y_end}")]
    Degenerate {
        x_start: u32,
        x_end: u32,
        y_start: u32,
        y_end: u32,
    },
}

/// Compute the crop window for `image`.
///
/// Returns `Ok(None)` when `params` does not request cropping. A window that
/// collapses to zero width or height is an error, never an empty crop.
///
/// Bounds follow the integer pipeline of the original scanner: the image
/// half-extent is an integer division, the start is truncated before the end
/// is derived from it, and the end is clipped to `extent - 1`. Every
/// returned window satisfies `x < x_end <= width` and `y < y_end <= height`.
pub fn compute_roi(image: ImageSize, params: &RoiParams) -> Result<Option<RoiRect>, RoiError> {
    if !params.requests_crop() {
        return Ok(None);
    }
    if image.is_empty() {
        return Err(RoiError::EmptyImage {
            width: image.width,
            height: image.height,
        });
    }

    let img_w = image.width as f64;
    let img_h = image.height as f64;

    let fit_height = params.aspect_ratio > img_h / img_w;
    let (fit_w, fit_h) = if fit_height {
        (img_h / params.aspect_ratio, img_h)
    } else {
        (img_w, img_w * params.aspect_ratio)
    };

    let roi_size = params.size * fit_w;
    let roi_offset = params.offset * fit_h;

    let half_w = (image.width / 2) as f64;
    let half_h = (image.height / 2) as f64;

    let x_start = (half_w - roi_size / 2.0).max(0.0) as u32;
    let x_end = (x_start as f64 + roi_size).min(img_w - 1.0) as u32;
    let y_start = (half_h - roi_size / 2.0 - roi_offset).max(0.0) as u32;
    let y_end = (y_start as f64 + roi_size).min(img_h - 1.0) as u32;

    log::debug!(
        "roi: image={}x{} fit_height={} fit={:.1}x{:.1} window=({},{})..({},{})",
        image.width,
        image.height,
        fit_height,
        fit_w,
        fit_h,
        x_start,
        y_start,
        x_end,
        y_end
    );

    if x_end <= x_start || y_end <= y_start {
        return Err(RoiError::Degenerate {
            x_start,
            x_end,
            y_start,
            y_end,
        });
    }

    Ok(Some(RoiRect {
        x: x_start,
        y: y_start,
        width: x_end - x_start,
        height: y_end - y_start,
    }))
}
