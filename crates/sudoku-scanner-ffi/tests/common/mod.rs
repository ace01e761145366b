#![allow(dead_code)]

use std::ffi::{c_char, c_void, CStr, CString};
use std::path::{Path, PathBuf};
use std::ptr;
use std::sync::Mutex;

use sudoku_scanner_ffi::{sudoku_scanner_new, ScannerCallbacks, SudokuScanner};
use tempfile::TempDir;

/// Host side of the callbacks; records what the scanner handed over.
#[derive(Default)]
pub struct Host {
    pub fail_detect: bool,
    pub detect_sizes: Mutex<Vec<(u32, u32)>>,
    pub extract_corners: Mutex<Vec<[f64; 8]>>,
    pub models: Mutex<Vec<Option<String>>>,
}

/// Reports an inset rectangle: 10 px from the sides, 20 px from top/bottom.
pub unsafe extern "C" fn inset_detect(
    user_data: *mut c_void,
    _pixels: *const u8,
    width: u32,
    height: u32,
    out_corners: *mut f64,
) -> bool {
    let host = &*(user_data as *const Host);
    if host.fail_detect {
        return false;
    }
    host.detect_sizes.lock().unwrap().push((width, height));
    let (w, h) = (width as f64, height as f64);
    let corners = [
        10.0,
        20.0,
        w - 10.0,
        20.0,
        10.0,
        h - 20.0,
        w - 10.0,
        h - 20.0,
    ];
    ptr::copy_nonoverlapping(corners.as_ptr(), out_corners, corners.len());
    true
}

/// Writes codes `i % 10` for up to 81 cells.
pub unsafe extern "C" fn digits_extract(
    user_data: *mut c_void,
    _pixels: *const u8,
    _width: u32,
    _height: u32,
    corners: *const f64,
    model_path: *const c_char,
    out_cells: *mut i32,
    capacity: usize,
) -> isize {
    let host = &*(user_data as *const Host);
    let mut seen = [0.0; 8];
    ptr::copy_nonoverlapping(corners, seen.as_mut_ptr(), seen.len());
    host.extract_corners.lock().unwrap().push(seen);
    let model = (!model_path.is_null())
        .then(|| CStr::from_ptr(model_path).to_string_lossy().into_owned());
    host.models.lock().unwrap().push(model);

    let n = capacity.min(81);
    for i in 0..n {
        *out_cells.add(i) = (i % 10) as i32;
    }
    n as isize
}

pub fn callbacks(host: &Host) -> ScannerCallbacks {
    ScannerCallbacks {
        user_data: host as *const Host as *mut c_void,
        detect: Some(inset_detect),
        extract: Some(digits_extract),
    }
}

pub fn new_scanner(host: &Host, config_json: Option<&CStr>) -> *mut SudokuScanner {
    let config = config_json.map_or(ptr::null(), CStr::as_ptr);
    let scanner = unsafe { sudoku_scanner_new(config, callbacks(host)) };
    assert!(!scanner.is_null(), "scanner creation failed");
    scanner
}

/// Pixel (x, y) = [x % 256, y % 256, 0].
pub fn write_png(dir: &TempDir, w: u32, h: u32) -> PathBuf {
    let img = image::RgbImage::from_fn(w, h, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 0])
    });
    let path = dir.path().join("capture.png");
    img.save(&path).unwrap();
    path
}

pub fn c_path(path: &Path) -> CString {
    CString::new(path.to_str().unwrap()).unwrap()
}
