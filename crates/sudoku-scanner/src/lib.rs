//! Boundary layer of a mobile sudoku scanning pipeline.
//!
//! This crate provides:
//! - re-exports of the geometry and contracts in `sudoku-scanner-core`
//! - [`ScannerConfig`], the explicit configuration handed to a scanner
//! - (feature `image`) [`scan::GridScanner`], which loads a photo, optionally
//!   crops it in place to a percentage-based ROI, and drives the external grid
//!   detector/extractor with normalized coordinates on the outside and pixel
//!   coordinates on the inside.
//!
//! ## Quickstart
//!
//! ```no_run
//! use std::path::Path;
//! use sudoku_scanner::scan::GridScanner;
//! use sudoku_scanner::{
//!     CollaboratorError, GridDetector, GridExtractor, Quad, RgbImageView, RoiParams,
//!     ScannerConfig,
//! };
//!
//! struct MyDetector;
//! impl GridDetector for MyDetector {
//!     fn detect(&self, image: &RgbImageView<'_>) -> Result<Quad, CollaboratorError> {
//!         let size = image.size();
//!         Ok(size.denormalize_quad(&Quad::whole_image()))
//!     }
//! }
//!
//! struct MyExtractor;
//! impl GridExtractor for MyExtractor {
//!     fn extract(
//!         &self,
//!         _image: &RgbImageView<'_>,
//!         _corners: &Quad,
//!         _model: Option<&Path>,
//!     ) -> Result<Vec<i32>, CollaboratorError> {
//!         Ok(vec![0; 81])
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let scanner = GridScanner::new(ScannerConfig::default(), MyDetector, MyExtractor);
//! let photo = Path::new("capture.jpg");
//! let quad = scanner.detect_grid(photo, &RoiParams::new(0.8, 0.05, 16.0 / 9.0))?;
//! let cells = scanner.extract_grid(photo, &quad)?;
//! println!("{} cells", cells.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `sudoku_scanner::core`: coordinates, ROI windowing, quads, collaborator traits.
//! - `sudoku_scanner::config`: [`ScannerConfig`] and its JSON loading.
//! - `sudoku_scanner::scan` (feature `image`): file-backed orchestration.
//!
//! C bindings live in `crates/sudoku-scanner-ffi`.

pub use sudoku_scanner_core as core;

pub use sudoku_scanner_core::{
    compute_roi, init_from_env, init_with_level, CollaboratorError, GridDetector, GridExtractor,
    ImageSize, LoggerInitError, Point2, Quad, RgbImageView, RoiError, RoiParams, RoiRect,
};

pub mod config;

pub use config::{ConfigError, ScannerConfig};

#[cfg(feature = "image")]
pub mod scan;
