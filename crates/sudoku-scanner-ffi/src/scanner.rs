//! Grid collaborators backed by host-supplied C callbacks.

use std::ffi::{c_char, c_void, CString};
use std::path::Path;
use std::ptr;

use sudoku_scanner::scan::GridScanner;
use sudoku_scanner::{CollaboratorError, GridDetector, GridExtractor, Quad, RgbImageView};

/// Find the grid corners in an RGB8 image.
///
/// `pixels` is row-major, `width * height * 3` bytes. On success the callback
/// writes 8 doubles to `out_corners` (top-left, top-right, bottom-left,
/// bottom-right; x then y; pixel space) and returns `true`.
pub type DetectFn = unsafe extern "C" fn(
    user_data: *mut c_void,
    pixels: *const u8,
    width: u32,
    height: u32,
    out_corners: *mut f64,
) -> bool;

/// Classify the cells of the grid bounded by `corners` (8 doubles, same
/// layout as [`DetectFn`], pixel space).
///
/// `model_path` is null when no model is configured. The callback writes at
/// most `capacity` codes to `out_cells` and returns how many it wrote, or a
/// negative value on failure.
pub type ExtractFn = unsafe extern "C" fn(
    user_data: *mut c_void,
    pixels: *const u8,
    width: u32,
    height: u32,
    corners: *const f64,
    model_path: *const c_char,
    out_cells: *mut i32,
    capacity: usize,
) -> isize;

/// Host implementations of the grid detector and extractor.
///
/// `user_data` is passed back untouched to both callbacks and must outlive
/// the scanner created from it.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct ScannerCallbacks {
    pub user_data: *mut c_void,
    pub detect: Option<DetectFn>,
    pub extract: Option<ExtractFn>,
}

pub(crate) struct CallbackDetector {
    detect: DetectFn,
    user_data: *mut c_void,
}

impl GridDetector for CallbackDetector {
    fn detect(&self, image: &RgbImageView<'_>) -> Result<Quad, CollaboratorError> {
        let mut corners = [0.0_f64; 8];
        // SAFETY: validity of the callback and user data is the contract of
        // `sudoku_scanner_new`; the buffers live for the whole call.
        let ok = unsafe {
            (self.detect)(
                self.user_data,
                image.data.as_ptr(),
                image.width as u32,
                image.height as u32,
                corners.as_mut_ptr(),
            )
        };
        if !ok {
            return Err(CollaboratorError::detection("detect callback reported failure"));
        }
        Ok(Quad::from_flat(corners))
    }
}

pub(crate) struct CallbackExtractor {
    extract: ExtractFn,
    user_data: *mut c_void,
    capacity: usize,
}

impl GridExtractor for CallbackExtractor {
    fn extract(
        &self,
        image: &RgbImageView<'_>,
        corners: &Quad,
        model_path: Option<&Path>,
    ) -> Result<Vec<i32>, CollaboratorError> {
        let corners = corners.to_flat();
        let model = model_path.map(model_cstring).transpose()?;
        let model_ptr = model.as_ref().map_or(ptr::null(), |m| m.as_ptr());
        let mut cells = vec![0_i32; self.capacity];

        // SAFETY: see `CallbackDetector::detect`.
        let written = unsafe {
            (self.extract)(
                self.user_data,
                image.data.as_ptr(),
                image.width as u32,
                image.height as u32,
                corners.as_ptr(),
                model_ptr,
                cells.as_mut_ptr(),
                cells.len(),
            )
        };

        let Ok(written) = usize::try_from(written) else {
            return Err(CollaboratorError::extraction(format!(
                "extract callback reported failure ({written})"
            )));
        };
        if written > self.capacity {
            return Err(CollaboratorError::extraction(format!(
                "extract callback wrote {written} cells into a buffer of {}",
                self.capacity
            )));
        }
        cells.truncate(written);
        Ok(cells)
    }
}

fn model_cstring(path: &Path) -> Result<CString, CollaboratorError> {
    let s = path
        .to_str()
        .ok_or_else(|| CollaboratorError::extraction("model path is not valid UTF-8"))?;
    CString::new(s)
        .map_err(|_| CollaboratorError::extraction("model path contains an interior NUL"))
}

/// Opaque scanner handle owned by the host.
pub struct SudokuScanner {
    pub(crate) inner: GridScanner<CallbackDetector, CallbackExtractor>,
}

impl SudokuScanner {
    pub(crate) fn new(
        config: sudoku_scanner::ScannerConfig,
        callbacks: ScannerCallbacks,
    ) -> Option<Self> {
        let detector = CallbackDetector {
            detect: callbacks.detect?,
            user_data: callbacks.user_data,
        };
        let extractor = CallbackExtractor {
            extract: callbacks.extract?,
            user_data: callbacks.user_data,
            capacity: config.max_cells,
        };
        Some(Self {
            inner: GridScanner::new(config, detector, extractor),
        })
    }
}
