//! Core types for the sudoku grid scanner boundary.
//!
//! This crate is purely geometric. It does not decode images or implement
//! any grid-finding algorithm; it defines:
//! - pixel <-> normalized coordinate conversion ([`ImageSize`]),
//! - the percentage-based ROI window ([`compute_roi`]),
//! - the four-corner [`Quad`],
//! - the [`GridDetector`] / [`GridExtractor`] collaborator contracts.

mod coords;
mod external;
mod image;
mod logger;
mod quad;
mod roi;

pub use coords::{to_normalized, to_pixel, ImageSize};
pub use external::{CollaboratorError, GridDetector, GridExtractor};
pub use image::RgbImageView;
pub use quad::Quad;
pub use roi::{compute_roi, RoiError, RoiParams, RoiRect};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{
    init_from_env, init_with_level, level_from_verbosity, InitError as LoggerInitError, LOG_ENV_VAR,
};

pub use nalgebra::Point2;
