//! C ABI for the sudoku grid scanner.
//!
//! # Ownership
//!
//! Every record returned by this library is heap-allocated here and owned by
//! the caller from the moment the call returns. Each one must be released
//! exactly once with its matching function:
//!
//! | created by                         | released by                       |
//! |------------------------------------|-----------------------------------|
//! | `sudoku_create_coordinate`         | `sudoku_free_coordinate`          |
//! | `sudoku_create_detection_result`   | `sudoku_free_detection_result`    |
//! | `sudoku_detect_grid`               | `sudoku_free_detection_result`    |
//! | `sudoku_extract_grid`              | `sudoku_free_extraction_result`   |
//! | `sudoku_scanner_new`               | `sudoku_scanner_free`             |
//!
//! Not releasing a record leaks it. Releasing it twice, or reading it after
//! release, is undefined behavior.
//!
//! `sudoku_create_detection_result` takes ownership of its four coordinates.
//! After it returns non-null, those coordinates belong to the detection result
//! and must not be released individually; releasing the detection result
//! releases them. When it returns null the caller still owns them.
//!
//! Debug builds check these rules: a release of a pointer that is not a live
//! record of the right kind is logged, not performed, and counted in
//! `sudoku_scanner_ownership_violations()`.
//!
//! # Coordinates
//!
//! Corners passed to and returned from `sudoku_detect_grid` /
//! `sudoku_extract_grid` are normalized to `[0, 1]` relative to the image file
//! as it is on disk at the time of the call. `sudoku_detect_grid` with a ROI
//! request overwrites the file with the cropped image.
//!
//! # Thread Safety
//!
//! A scanner handle must be used from one thread at a time, and no two calls
//! may target the same image path concurrently.

mod records;
mod scanner;

use std::ffi::{c_char, CStr};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::ptr;

use sudoku_scanner::scan::ScanError;
use sudoku_scanner::{Quad, RoiParams, ScannerConfig};

pub use records::{Coordinate, DetectionResult, ExtractionResult};
pub use scanner::{DetectFn, ExtractFn, ScannerCallbacks, SudokuScanner};

/// Outcome of a scanner call.
#[repr(C)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScanStatus {
    Ok = 0,
    /// Null handle/out pointer, or a path that is null or not UTF-8.
    InvalidArgument = 1,
    /// The image could not be read or has no pixels.
    ImageLoadFailure = 2,
    /// The requested ROI collapses to an empty window.
    InvalidRoi = 3,
    /// The cropped image could not be written back.
    ImageWriteFailure = 4,
    /// The detect or extract callback reported failure.
    CollaboratorFailure = 5,
    /// The extractor produced more cells than configured.
    TooManyCells = 6,
    /// A Rust panic was caught at the boundary.
    Panic = 7,
}

impl From<&ScanError> for ScanStatus {
    fn from(e: &ScanError) -> Self {
        match e {
            ScanError::ImageLoad { .. } | ScanError::EmptyImage { .. } => Self::ImageLoadFailure,
            ScanError::InvalidRoi(_) => Self::InvalidRoi,
            ScanError::ImageWrite { .. } => Self::ImageWriteFailure,
            ScanError::Collaborator(_) => Self::CollaboratorFailure,
            ScanError::TooManyCells { .. } => Self::TooManyCells,
        }
    }
}

unsafe fn path_arg(path: *const c_char) -> Option<PathBuf> {
    if path.is_null() {
        return None;
    }
    CStr::from_ptr(path).to_str().ok().map(PathBuf::from)
}

/// Run `f`, turning errors and panics into a status and storing the record on
/// success.
unsafe fn deliver<T: records::Record>(
    op: &str,
    out: *mut *mut T,
    f: impl FnOnce() -> Result<Box<T>, ScanError>,
) -> ScanStatus {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(record)) => {
            *out = records::into_raw(record);
            ScanStatus::Ok
        }
        Ok(Err(e)) => {
            log::error!("{op}: {e}");
            ScanStatus::from(&e)
        }
        Err(_) => {
            log::error!("{op}: panic caught at the C boundary");
            ScanStatus::Panic
        }
    }
}

/// Install the stderr logger. `verbosity`: 0 off, 1 error, 2 warn, 3 info,
/// 4 debug, 5+ trace. Returns `false` if another logger is already installed.
#[no_mangle]
pub extern "C" fn sudoku_scanner_init_logging(verbosity: u32) -> bool {
    sudoku_scanner::init_with_level(sudoku_scanner::core::level_from_verbosity(verbosity)).is_ok()
}

/// Number of ownership violations detected so far (always 0 in release builds).
#[no_mangle]
pub extern "C" fn sudoku_scanner_ownership_violations() -> usize {
    records::violations()
}

/// Create a scanner.
///
/// `config_json` is null or a JSON object such as
/// `{"model_path": "/data/digits.tflite", "max_cells": 81}`. Returns null if
/// the config does not parse or either callback is missing.
///
/// # Safety
/// - `config_json` must be null or a valid null-terminated string
/// - the callbacks must be safe to call with `callbacks.user_data` for the
///   whole life of the scanner
#[no_mangle]
pub unsafe extern "C" fn sudoku_scanner_new(
    config_json: *const c_char,
    callbacks: ScannerCallbacks,
) -> *mut SudokuScanner {
    let config = if config_json.is_null() {
        ScannerConfig::default()
    } else {
        let parsed = CStr::from_ptr(config_json)
            .to_str()
            .map_err(|e| e.to_string())
            .and_then(|s| ScannerConfig::from_json_str(s).map_err(|e| e.to_string()));
        match parsed {
            Ok(config) => config,
            Err(e) => {
                log::error!("sudoku_scanner_new: {e}");
                return ptr::null_mut();
            }
        }
    };

    match SudokuScanner::new(config, callbacks) {
        Some(scanner) => records::into_raw(Box::new(scanner)),
        None => {
            log::error!("sudoku_scanner_new: detect and extract callbacks are required");
            ptr::null_mut()
        }
    }
}

/// Release a scanner. Null is a no-op.
///
/// # Safety
/// `scanner` must come from `sudoku_scanner_new` and not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn sudoku_scanner_free(scanner: *mut SudokuScanner) {
    records::release(scanner);
}

/// Allocate a coordinate owned by the caller.
#[no_mangle]
pub extern "C" fn sudoku_create_coordinate(x: f64, y: f64) -> *mut Coordinate {
    records::into_raw(Box::new(Coordinate { x, y }))
}

/// Release a coordinate. Null is a no-op.
///
/// # Safety
/// `coordinate` must come from `sudoku_create_coordinate`, must not have been
/// moved into a detection result, and must not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn sudoku_free_coordinate(coordinate: *mut Coordinate) {
    records::release(coordinate);
}

/// Assemble a detection result from four coordinates, taking ownership of
/// them.
///
/// Returns null (and takes nothing) if any pointer is null or repeated.
///
/// # Safety
/// Each pointer must come from `sudoku_create_coordinate` and still be owned
/// by the caller.
#[no_mangle]
pub unsafe extern "C" fn sudoku_create_detection_result(
    top_left: *mut Coordinate,
    top_right: *mut Coordinate,
    bottom_left: *mut Coordinate,
    bottom_right: *mut Coordinate,
) -> *mut DetectionResult {
    records::assemble_detection_result(top_left, top_right, bottom_left, bottom_right)
}

/// Release a detection result and its four coordinates. Null is a no-op.
///
/// # Safety
/// `result` must come from `sudoku_create_detection_result` or
/// `sudoku_detect_grid` and not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn sudoku_free_detection_result(result: *mut DetectionResult) {
    records::release(result);
}

/// Release an extraction result and its cell buffer. Null is a no-op.
///
/// # Safety
/// `result` must come from `sudoku_extract_grid` and not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn sudoku_free_extraction_result(result: *mut ExtractionResult) {
    records::release(result);
}

/// Detect the puzzle grid in the image at `path`.
///
/// If `roi_size`, `roi_offset` and `aspect_ratio` are all positive, the image
/// is first cropped to that ROI and the crop overwrites `path`. On
/// `ScanStatus::Ok`, `*out` receives normalized corners relative to the image
/// now on disk. An unreadable or empty image is not an error: the result is
/// the whole-image quad `(0,0) (1,0) (0,1) (1,1)`.
///
/// `*out` is set to null on any other status.
///
/// # Safety
/// - `scanner` must be a valid pointer from `sudoku_scanner_new`
/// - `path` must be a valid null-terminated string
/// - `out` must be a valid writable pointer
#[no_mangle]
pub unsafe extern "C" fn sudoku_detect_grid(
    scanner: *const SudokuScanner,
    path: *const c_char,
    roi_size: f64,
    roi_offset: f64,
    aspect_ratio: f64,
    out: *mut *mut DetectionResult,
) -> ScanStatus {
    if out.is_null() {
        return ScanStatus::InvalidArgument;
    }
    *out = ptr::null_mut();
    let (Some(scanner), Some(path)) = (scanner.as_ref(), path_arg(path)) else {
        return ScanStatus::InvalidArgument;
    };
    let roi = RoiParams::new(roi_size, roi_offset, aspect_ratio);

    deliver("sudoku_detect_grid", out, || {
        let quad = scanner.inner.detect_grid(&path, &roi)?;
        Ok(DetectionResult::from_quad(&quad))
    })
}

/// Classify the cells of the grid bounded by the normalized corners.
///
/// On `ScanStatus::Ok`, `*out` receives one code per cell as produced by the
/// extract callback. An unreadable image is `ScanStatus::ImageLoadFailure`.
///
/// # Safety
/// - `scanner` must be a valid pointer from `sudoku_scanner_new`
/// - `path` must be a valid null-terminated string
/// - `out` must be a valid writable pointer
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn sudoku_extract_grid(
    scanner: *const SudokuScanner,
    path: *const c_char,
    top_left_x: f64,
    top_left_y: f64,
    top_right_x: f64,
    top_right_y: f64,
    bottom_left_x: f64,
    bottom_left_y: f64,
    bottom_right_x: f64,
    bottom_right_y: f64,
    out: *mut *mut ExtractionResult,
) -> ScanStatus {
    if out.is_null() {
        return ScanStatus::InvalidArgument;
    }
    *out = ptr::null_mut();
    let (Some(scanner), Some(path)) = (scanner.as_ref(), path_arg(path)) else {
        return ScanStatus::InvalidArgument;
    };
    let corners = Quad::from_flat([
        top_left_x,
        top_left_y,
        top_right_x,
        top_right_y,
        bottom_left_x,
        bottom_left_y,
        bottom_right_x,
        bottom_right_y,
    ]);

    deliver("sudoku_extract_grid", out, || {
        let cells = scanner.inner.extract_grid(&path, &corners)?;
        Ok(ExtractionResult::from_cells(cells))
    })
}
