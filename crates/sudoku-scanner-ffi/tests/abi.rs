mod common;

use std::ptr;

use common::{c_path, new_scanner, write_png, Host};
use sudoku_scanner_ffi::*;
use tempfile::TempDir;

fn corners(det: *const DetectionResult) -> [f64; 8] {
    unsafe {
        let d = &*det;
        [
            (*d.top_left).x,
            (*d.top_left).y,
            (*d.top_right).x,
            (*d.top_right).y,
            (*d.bottom_left).x,
            (*d.bottom_left).y,
            (*d.bottom_right).x,
            (*d.bottom_right).y,
        ]
    }
}

#[test]
fn coordinate_is_created_and_released() {
    let before = sudoku_scanner_ownership_violations();
    let c = sudoku_create_coordinate(0.25, 0.75);
    assert!(!c.is_null());
    assert_eq!(unsafe { *c }, Coordinate { x: 0.25, y: 0.75 });
    unsafe { sudoku_free_coordinate(c) };
    unsafe { sudoku_free_coordinate(ptr::null_mut()) };
    assert_eq!(sudoku_scanner_ownership_violations(), before);
}

#[test]
fn detection_result_takes_its_coordinates() {
    let before = sudoku_scanner_ownership_violations();
    let tl = sudoku_create_coordinate(0.0, 0.0);
    let tr = sudoku_create_coordinate(1.0, 0.0);
    let bl = sudoku_create_coordinate(0.0, 1.0);
    let br = sudoku_create_coordinate(1.0, 1.0);

    let det = unsafe { sudoku_create_detection_result(tl, tr, bl, br) };
    assert!(!det.is_null());
    unsafe {
        assert_eq!((*det).top_right, tr);
        assert_eq!((*det).bottom_left, bl);
    }
    assert_eq!(corners(det), [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);

    // Only the result is released; it tears down the coordinates too.
    unsafe { sudoku_free_detection_result(det) };
    assert_eq!(sudoku_scanner_ownership_violations(), before);
}

#[test]
fn rejected_assembly_leaves_ownership_with_caller() {
    let before = sudoku_scanner_ownership_violations();
    let a = sudoku_create_coordinate(0.0, 0.0);
    let b = sudoku_create_coordinate(1.0, 0.0);
    let c = sudoku_create_coordinate(0.0, 1.0);

    let det = unsafe { sudoku_create_detection_result(a, b, c, ptr::null_mut()) };
    assert!(det.is_null());

    unsafe {
        sudoku_free_coordinate(a);
        sudoku_free_coordinate(b);
        sudoku_free_coordinate(c);
    }
    assert_eq!(sudoku_scanner_ownership_violations(), before);
}

#[test]
fn detect_missing_file_returns_whole_image_quad() {
    let host = Host::default();
    let scanner = new_scanner(&host, None);
    let path = c"/nonexistent/capture.jpg";

    let mut out = ptr::null_mut();
    let status = unsafe { sudoku_detect_grid(scanner, path.as_ptr(), 0.5, 0.1, 0.75, &mut out) };

    assert_eq!(status, ScanStatus::Ok);
    assert!(!out.is_null());
    assert_eq!(corners(out), [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    assert!(host.detect_sizes.lock().unwrap().is_empty());

    unsafe {
        sudoku_free_detection_result(out);
        sudoku_scanner_free(scanner);
    }
}

#[test]
fn detect_with_roi_crops_file_and_normalizes_to_crop() {
    let dir = TempDir::new().unwrap();
    let path = write_png(&dir, 1000, 800);
    let host = Host::default();
    let scanner = new_scanner(&host, None);

    let mut out = ptr::null_mut();
    let status = unsafe {
        sudoku_detect_grid(scanner, c_path(&path).as_ptr(), 0.5, 0.1, 0.75, &mut out)
    };

    assert_eq!(status, ScanStatus::Ok);
    assert_eq!(image::image_dimensions(&path).unwrap(), (500, 500));
    assert_eq!(*host.detect_sizes.lock().unwrap(), vec![(500, 500)]);
    let c = corners(out);
    assert_eq!(c[0], 10.0 / 500.0);
    assert_eq!(c[1], 20.0 / 500.0);
    assert_eq!(c[6], 490.0 / 500.0);
    assert_eq!(c[7], 480.0 / 500.0);

    unsafe {
        sudoku_free_detection_result(out);
        sudoku_scanner_free(scanner);
    }
}

#[test]
fn detect_degenerate_roi_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = write_png(&dir, 100, 100);
    let before = std::fs::read(&path).unwrap();
    let host = Host::default();
    let scanner = new_scanner(&host, None);

    let mut out = ptr::null_mut();
    let status = unsafe {
        sudoku_detect_grid(scanner, c_path(&path).as_ptr(), 0.001, 0.1, 1.0, &mut out)
    };

    assert_eq!(status, ScanStatus::InvalidRoi);
    assert!(out.is_null());
    assert_eq!(std::fs::read(&path).unwrap(), before);
    unsafe { sudoku_scanner_free(scanner) };
}

#[test]
fn detect_callback_failure_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = write_png(&dir, 64, 64);
    let host = Host {
        fail_detect: true,
        ..Host::default()
    };
    let scanner = new_scanner(&host, None);

    let mut out = ptr::null_mut();
    let status =
        unsafe { sudoku_detect_grid(scanner, c_path(&path).as_ptr(), 0.0, 0.0, 0.0, &mut out) };

    assert_eq!(status, ScanStatus::CollaboratorFailure);
    assert!(out.is_null());
    unsafe { sudoku_scanner_free(scanner) };
}

#[test]
fn extract_denormalizes_corners_and_passes_model() {
    let dir = TempDir::new().unwrap();
    let path = write_png(&dir, 400, 400);
    let host = Host::default();
    let scanner = new_scanner(&host, Some(cr#"{"model_path": "/models/digits.tflite"}"#));

    let mut out = ptr::null_mut();
    let status = unsafe {
        sudoku_extract_grid(
            scanner,
            c_path(&path).as_ptr(),
            0.0,
            0.0,
            1.0,
            0.0,
            0.0,
            1.0,
            1.0,
            1.0,
            &mut out,
        )
    };

    assert_eq!(status, ScanStatus::Ok);
    let result = unsafe { &*out };
    assert_eq!(result.len, 81);
    assert_eq!(result.as_slice()[..12], [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 0, 1]);
    assert_eq!(
        host.extract_corners.lock().unwrap()[0],
        [0.0, 0.0, 400.0, 0.0, 0.0, 400.0, 400.0, 400.0]
    );
    assert_eq!(
        host.models.lock().unwrap()[0].as_deref(),
        Some("/models/digits.tflite")
    );

    unsafe {
        sudoku_free_extraction_result(out);
        sudoku_scanner_free(scanner);
    }
}

#[test]
fn extract_respects_configured_capacity() {
    let dir = TempDir::new().unwrap();
    let path = write_png(&dir, 40, 40);
    let host = Host::default();
    let scanner = new_scanner(&host, Some(cr#"{"max_cells": 16}"#));

    let mut out = ptr::null_mut();
    let status = unsafe {
        sudoku_extract_grid(
            scanner,
            c_path(&path).as_ptr(),
            0.0,
            0.0,
            1.0,
            0.0,
            0.0,
            1.0,
            1.0,
            1.0,
            &mut out,
        )
    };

    assert_eq!(status, ScanStatus::Ok);
    assert_eq!(unsafe { (*out).len }, 16);
    assert_eq!(host.models.lock().unwrap()[0], None);
    unsafe {
        sudoku_free_extraction_result(out);
        sudoku_scanner_free(scanner);
    }
}

#[test]
fn extract_missing_file_is_an_error() {
    let host = Host::default();
    let scanner = new_scanner(&host, None);

    let mut out = ptr::null_mut();
    let status = unsafe {
        sudoku_extract_grid(
            scanner,
            c"/nonexistent/capture.jpg".as_ptr(),
            0.0,
            0.0,
            1.0,
            0.0,
            0.0,
            1.0,
            1.0,
            1.0,
            &mut out,
        )
    };

    assert_eq!(status, ScanStatus::ImageLoadFailure);
    assert!(out.is_null());
    assert!(host.extract_corners.lock().unwrap().is_empty());
    unsafe { sudoku_scanner_free(scanner) };
}

#[test]
fn scanner_rejects_bad_config() {
    let host = Host::default();
    for json in [c"{", cr#"{"max_cells": 0}"#, cr#"{"max_cells": "many"}"#] {
        let scanner = unsafe { sudoku_scanner_new(json.as_ptr(), common::callbacks(&host)) };
        assert!(scanner.is_null());
    }
}

#[test]
fn logging_can_be_installed() {
    assert!(sudoku_scanner_init_logging(1));
    assert!(sudoku_scanner_init_logging(2));
}
