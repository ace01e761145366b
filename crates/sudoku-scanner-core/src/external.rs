//! Contracts for the computer-vision collaborators the scanner drives.
//!
//! Corner finding, perspective rectification and digit classification are
//! not implemented here. The scanner only hands pixels in and takes corners
//! or cell codes out.

use std::path::Path;

use crate::{Quad, RgbImageView};

/// Failure reported by an external collaborator.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{stage} failed: {message}")]
pub struct CollaboratorError {
    pub stage: &'static str,
    pub message: String,
}

impl CollaboratorError {
    pub fn detection(message: impl Into<String>) -> Self {
        Self {
            stage: "grid detection",
            message: message.into(),
        }
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        Self {
            stage: "grid extraction",
            message: message.into(),
        }
    }
}

/// Finds the outer corners of a puzzle grid.
pub trait GridDetector {
    /// Return the grid corners in pixel space of `image`.
    ///
    /// The corner roles (top-left, top-right, bottom-left, bottom-right) are
    /// trusted as returned; callers do not re-order or validate them.
    fn detect(&self, image: &RgbImageView<'_>) -> Result<Quad, CollaboratorError>;
}

/// Rectifies a grid and classifies its cells.
pub trait GridExtractor {
    /// Return one code per cell, row-major.
    ///
    /// `corners` are in pixel space of `image`. `model_path` is the classifier
    /// model location from the scanner configuration, if one was set.
    fn extract(
        &self,
        image: &RgbImageView<'_>,
        corners: &Quad,
        model_path: Option<&Path>,
    ) -> Result<Vec<i32>, CollaboratorError>;
}

impl<T: GridDetector + ?Sized> GridDetector for &T {
    fn detect(&self, image: &RgbImageView<'_>) -> Result<Quad, CollaboratorError> {
        (**self).detect(image)
    }
}

impl<T: GridExtractor + ?Sized> GridExtractor for &T {
    fn extract(
        &self,
        image: &RgbImageView<'_>,
        corners: &Quad,
        model_path: Option<&Path>,
    ) -> Result<Vec<i32>, CollaboratorError> {
        (**self).extract(image, corners, model_path)
    }
}

impl<T: GridDetector + ?Sized> GridDetector for Box<T> {
    fn detect(&self, image: &RgbImageView<'_>) -> Result<Quad, CollaboratorError> {
        (**self).detect(image)
    }
}

impl<T: GridExtractor + ?Sized> GridExtractor for Box<T> {
    fn extract(
        &self,
        image: &RgbImageView<'_>,
        corners: &Quad,
        model_path: Option<&Path>,
    ) -> Result<Vec<i32>, CollaboratorError> {
        (**self).extract(image, corners, model_path)
    }
}
