//! File-backed grid detection and extraction.
//!
//! [`GridScanner::detect_grid`] may crop the photo to its ROI and writes the
//! crop back over the source file; [`GridScanner::extract_grid`] then reads
//! that cropped file. Normalized coordinates are always relative to the file
//! as it is on disk at the time of the call.
//!
//! Two concurrent `detect_grid` calls on the same path race on the in-place
//! crop; callers serialize access per path.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, ImageReader};
use sudoku_scanner_core::{
    compute_roi, CollaboratorError, GridDetector, GridExtractor, ImageSize, Quad, RgbImageView,
    RoiError, RoiParams, RoiRect,
};

use crate::config::ScannerConfig;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the scanner.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    #[error("failed to load image {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("image {path} has no pixels ({width}x{height})")]
    EmptyImage {
        path: PathBuf,
        width: u32,
        height: u32,
    },

    #[error("invalid ROI: {0}")]
    InvalidRoi(#[from] RoiError),

    #[error("failed to write cropped image {path}: {source}")]
    ImageWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error("extractor returned {got} cells, configured maximum is {max}")]
    TooManyCells { got: usize, max: usize },
}

impl ScanError {
    /// `true` for the failures `detect_grid` answers with the whole-image quad.
    pub fn is_unusable_image(&self) -> bool {
        matches!(self, Self::ImageLoad { .. } | Self::EmptyImage { .. })
    }
}

/// A decoded photo plus the container format it was read from, so a crop can
/// be written back in the same format.
#[derive(Clone, Debug)]
pub struct LoadedImage {
    image: DynamicImage,
    format: Option<ImageFormat>,
}

impl LoadedImage {
    /// Decode `path`, sniffing the format from content before the extension.
    pub fn open(path: &Path) -> Result<Self, ScanError> {
        let load_err = |source| ScanError::ImageLoad {
            path: path.to_path_buf(),
            source,
        };
        let reader = ImageReader::open(path)
            .and_then(|r| r.with_guessed_format())
            .map_err(|e| load_err(image::ImageError::IoError(e)))?;
        let format = reader.format();
        let image = reader.decode().map_err(load_err)?;
        Self::from_decoded(path, image, format)
    }

    /// Wrap an image already decoded from `path`.
    ///
    /// Zero-sized images are reported as [`ScanError::EmptyImage`]. Decoders
    /// that refuse zero dimensions themselves surface as
    /// [`ScanError::ImageLoad`] from [`LoadedImage::open`] instead.
    pub fn from_decoded(
        path: &Path,
        image: DynamicImage,
        format: Option<ImageFormat>,
    ) -> Result<Self, ScanError> {
        let loaded = Self { image, format };
        let size = loaded.size();
        if size.is_empty() {
            return Err(ScanError::EmptyImage {
                path: path.to_path_buf(),
                width: size.width,
                height: size.height,
            });
        }
        Ok(loaded)
    }

    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.image.width(), self.image.height())
    }

    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    pub fn to_rgb8(&self) -> image::RgbImage {
        self.image.to_rgb8()
    }

    /// Replace the image with the `rect` window of itself.
    pub fn crop(&mut self, rect: RoiRect) {
        self.image = self.image.crop_imm(rect.x, rect.y, rect.width, rect.height);
    }

    /// Encode to `path` in the format the image was read from, falling back to
    /// the extension of `path`.
    pub fn save(&self, path: &Path) -> Result<(), ScanError> {
        let res = match self.format {
            Some(format) => self.image.save_with_format(path, format),
            None => self.image.save(path),
        };
        res.map_err(|source| ScanError::ImageWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Convert an `image::RgbImage` into the lightweight core view type.
pub fn rgb_view(img: &image::RgbImage) -> RgbImageView<'_> {
    RgbImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Crop `image` to the ROI described by `roi` and overwrite `path` with it.
///
/// Returns the applied window, or `None` when `roi` requests no cropping (the
/// file is then left alone). A degenerate window fails before anything is
/// written.
pub fn apply_roi(
    path: &Path,
    image: &mut LoadedImage,
    roi: &RoiParams,
) -> Result<Option<RoiRect>, ScanError> {
    let Some(rect) = compute_roi(image.size(), roi)? else {
        return Ok(None);
    };
    image.crop(rect);
    image.save(path)?;
    log::debug!(
        "cropped {} to {}x{} at ({}, {})",
        path.display(),
        rect.width,
        rect.height,
        rect.x,
        rect.y
    );
    Ok(Some(rect))
}

/// Drives an external grid detector and extractor over image files.
pub struct GridScanner<D, E> {
    config: ScannerConfig,
    detector: D,
    extractor: E,
}

impl<D: GridDetector, E: GridExtractor> GridScanner<D, E> {
    pub fn new(config: ScannerConfig, detector: D, extractor: E) -> Self {
        Self {
            config,
            detector,
            extractor,
        }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    /// Locate the puzzle grid in the photo at `path`.
    ///
    /// Returns the corners normalized to the image as it is on disk when the
    /// call returns (i.e. after the ROI crop, if one was requested).
    ///
    /// An unreadable or zero-sized image is not an error: the result is
    /// [`Quad::whole_image`]. A degenerate ROI, a failed write of the crop or
    /// a detector failure are errors.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, path, roi), fields(path = %path.display()))
    )]
    pub fn detect_grid(&self, path: &Path, roi: &RoiParams) -> Result<Quad, ScanError> {
        self.detect_opened(path, LoadedImage::open(path), roi)
    }

    fn detect_opened(
        &self,
        path: &Path,
        opened: Result<LoadedImage, ScanError>,
        roi: &RoiParams,
    ) -> Result<Quad, ScanError> {
        let mut image = match opened {
            Ok(image) => image,
            Err(e) if e.is_unusable_image() => {
                log::warn!("{e}; assuming the whole image is the grid");
                return Ok(Quad::whole_image());
            }
            Err(e) => return Err(e),
        };

        apply_roi(path, &mut image, roi)?;

        let size = image.size();
        let rgb = image.to_rgb8();
        let pixel_quad = self.detector.detect(&rgb_view(&rgb))?;
        let quad = size.normalize_quad(&pixel_quad);
        log::debug!("grid corners (normalized): {:?}", quad.to_flat());
        Ok(quad)
    }

    /// Classify the cells of the grid bounded by the normalized `corners`.
    ///
    /// Unlike detection there is no fallback: an unreadable image is an error.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, path, corners), fields(path = %path.display()))
    )]
    pub fn extract_grid(&self, path: &Path, corners: &Quad) -> Result<Vec<i32>, ScanError> {
        let image = LoadedImage::open(path)?;
        let size = image.size();
        let pixel_quad = size.denormalize_quad(corners);

        let rgb = image.to_rgb8();
        let cells = self
            .extractor
            .extract(&rgb_view(&rgb), &pixel_quad, self.config.model_path())?;
        if cells.len() > self.config.max_cells {
            return Err(ScanError::TooManyCells {
                got: cells.len(),
                max: self.config.max_cells,
            });
        }
        Ok(cells)
    }
}
