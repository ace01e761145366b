//! Heap records handed across the C boundary.
//!
//! This module is the only place that turns a `Box` into a raw pointer or a
//! raw pointer back into a `Box`. Everywhere else records are ordinary owned
//! Rust values released on scope exit.
//!
//! Debug builds keep a ledger of every live top-level record. Releasing a
//! pointer the ledger does not know about (a second release, a coordinate that
//! already belongs to a detection result, a pointer of the wrong record kind)
//! is logged, counted, and *not* freed. Release builds trust the caller.
//!
//! Debug builds also never hand a released allocation back to the allocator,
//! so a stale pointer cannot alias a record created later.

use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};

use sudoku_scanner::{Point2, Quad};

/// A point, in normalized or pixel space depending on where it came from.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl From<Point2<f64>> for Coordinate {
    fn from(p: Point2<f64>) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<Coordinate> for Point2<f64> {
    fn from(c: Coordinate) -> Self {
        Point2::new(c.x, c.y)
    }
}

/// Four owned grid corners. Releasing the result releases the corners.
#[repr(C)]
#[derive(Debug)]
pub struct DetectionResult {
    pub top_left: *mut Coordinate,
    pub top_right: *mut Coordinate,
    pub bottom_left: *mut Coordinate,
    pub bottom_right: *mut Coordinate,
}

impl DetectionResult {
    pub(crate) fn from_quad(quad: &Quad) -> Box<Self> {
        let own = |p: Point2<f64>| Box::into_raw(Box::new(Coordinate::from(p)));
        Box::new(Self {
            top_left: own(quad.top_left),
            top_right: own(quad.top_right),
            bottom_left: own(quad.bottom_left),
            bottom_right: own(quad.bottom_right),
        })
    }

    /// Read the corners back as a [`Quad`].
    ///
    /// # Safety
    /// All four corner pointers must be valid (true for every record produced
    /// by this crate and not yet released).
    pub unsafe fn quad(&self) -> Option<Quad> {
        Some(Quad::new(
            (*self.top_left.as_ref()?).into(),
            (*self.top_right.as_ref()?).into(),
            (*self.bottom_left.as_ref()?).into(),
            (*self.bottom_right.as_ref()?).into(),
        ))
    }

    fn corners(&self) -> [*mut Coordinate; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_left,
            self.bottom_right,
        ]
    }
}

impl Drop for DetectionResult {
    fn drop(&mut self) {
        for p in self.corners() {
            if !p.is_null() {
                // SAFETY: corners are uniquely owned by this record.
                unsafe { dispose(p) };
            }
        }
    }
}

/// One classification code per grid cell, row-major.
#[repr(C)]
#[derive(Debug)]
pub struct ExtractionResult {
    pub cells: *mut i32,
    pub len: usize,
}

impl ExtractionResult {
    pub(crate) fn from_cells(cells: Vec<i32>) -> Box<Self> {
        let boxed = cells.into_boxed_slice();
        let len = boxed.len();
        let cells = Box::into_raw(boxed) as *mut i32;
        Box::new(Self { cells, len })
    }

    pub fn as_slice(&self) -> &[i32] {
        if self.cells.is_null() {
            return &[];
        }
        // SAFETY: `cells`/`len` come from a boxed slice owned by this record.
        unsafe { std::slice::from_raw_parts(self.cells, self.len) }
    }
}

impl Drop for ExtractionResult {
    fn drop(&mut self) {
        if !self.cells.is_null() {
            // SAFETY: reconstructs the boxed slice built in `from_cells`.
            let cells = ptr::slice_from_raw_parts_mut(self.cells, self.len);
            drop(unsafe { Box::from_raw(cells) });
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum RecordKind {
    Coordinate,
    DetectionResult,
    ExtractionResult,
    Scanner,
}

/// Values that may cross the boundary as an owned raw pointer.
pub(crate) trait Record {
    const KIND: RecordKind;
}

impl Record for Coordinate {
    const KIND: RecordKind = RecordKind::Coordinate;
}

impl Record for DetectionResult {
    const KIND: RecordKind = RecordKind::DetectionResult;
}

impl Record for ExtractionResult {
    const KIND: RecordKind = RecordKind::ExtractionResult;
}

impl Record for crate::SudokuScanner {
    const KIND: RecordKind = RecordKind::Scanner;
}

static VIOLATIONS: AtomicUsize = AtomicUsize::new(0);

/// Number of ownership violations caught by the ledger so far.
pub fn violations() -> usize {
    VIOLATIONS.load(Ordering::Relaxed)
}

fn report_violation(what: &str, addr: usize, kind: RecordKind) {
    VIOLATIONS.fetch_add(1, Ordering::Relaxed);
    log::error!("ownership violation: {what} {kind:?} at {addr:#x}");
}

#[cfg(debug_assertions)]
mod ledger {
    use std::collections::BTreeMap;
    use std::sync::{Mutex, MutexGuard};

    use super::RecordKind;

    static LIVE: Mutex<BTreeMap<usize, RecordKind>> = Mutex::new(BTreeMap::new());

    fn live() -> MutexGuard<'static, BTreeMap<usize, RecordKind>> {
        LIVE.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(super) fn register(addr: usize, kind: RecordKind) {
        live().insert(addr, kind);
    }

    /// Remove `addr` if it is live with `kind`.
    pub(super) fn remove(addr: usize, kind: RecordKind) -> bool {
        let mut live = live();
        match live.get(&addr) {
            Some(k) if *k == kind => {
                live.remove(&addr);
                true
            }
            _ => false,
        }
    }

    /// Remove all of `addrs` if every one is live with `kind`; otherwise
    /// remove none and return the first offender.
    pub(super) fn remove_all(addrs: &[usize], kind: RecordKind) -> Result<(), usize> {
        let mut live = live();
        if let Some(bad) = addrs.iter().find(|a| live.get(*a) != Some(&kind)) {
            return Err(*bad);
        }
        for a in addrs {
            live.remove(a);
        }
        Ok(())
    }

    #[cfg(test)]
    pub(super) fn is_live(addr: usize) -> bool {
        live().contains_key(&addr)
    }
}

#[cfg(not(debug_assertions))]
mod ledger {
    use super::RecordKind;

    pub(super) fn register(_addr: usize, _kind: RecordKind) {}

    pub(super) fn remove(_addr: usize, _kind: RecordKind) -> bool {
        true
    }

    pub(super) fn remove_all(_addrs: &[usize], _kind: RecordKind) -> Result<(), usize> {
        Ok(())
    }
}

/// Hand ownership of `record` to the caller.
pub(crate) fn into_raw<T: Record>(record: Box<T>) -> *mut T {
    let p = Box::into_raw(record);
    ledger::register(p as usize, T::KIND);
    p
}

/// Take back and drop a record previously returned by [`into_raw`].
///
/// Null is a no-op.
///
/// # Safety
/// `p` must come from [`into_raw`] with the same `T` and not have been
/// released or consumed before.
pub(crate) unsafe fn release<T: Record>(p: *mut T) {
    if p.is_null() {
        return;
    }
    if !ledger::remove(p as usize, T::KIND) {
        report_violation("release of non-live", p as usize, T::KIND);
        return;
    }
    dispose(p);
}

/// Drop the value behind a pointer from `Box::into_raw`.
///
/// Debug builds keep the allocation itself.
///
/// # Safety
/// `p` must come from `Box::into_raw` and be disposed of at most once.
unsafe fn dispose<T>(p: *mut T) {
    #[cfg(debug_assertions)]
    ptr::drop_in_place(p);
    #[cfg(not(debug_assertions))]
    drop(Box::from_raw(p));
}

/// Move four caller-owned coordinates into a new detection result.
///
/// Returns null, consuming nothing, if any pointer is null, the same pointer
/// is passed twice, or (debug builds) a pointer is not a live coordinate.
///
/// # Safety
/// Each pointer must come from [`into_raw`] as a `Coordinate` and not have
/// been released or consumed before.
pub(crate) unsafe fn assemble_detection_result(
    top_left: *mut Coordinate,
    top_right: *mut Coordinate,
    bottom_left: *mut Coordinate,
    bottom_right: *mut Coordinate,
) -> *mut DetectionResult {
    let corners = [top_left, top_right, bottom_left, bottom_right];
    if corners.iter().any(|p| p.is_null()) {
        log::error!("detection result needs four non-null coordinates");
        return ptr::null_mut();
    }
    for i in 0..corners.len() {
        if corners[i + 1..].contains(&corners[i]) {
            report_violation(
                "duplicate corner in",
                corners[i] as usize,
                RecordKind::DetectionResult,
            );
            return ptr::null_mut();
        }
    }

    let addrs = corners.map(|p| p as usize);
    if let Err(bad) = ledger::remove_all(&addrs, RecordKind::Coordinate) {
        report_violation("consume of non-live", bad, RecordKind::Coordinate);
        return ptr::null_mut();
    }

    into_raw(Box::new(DetectionResult {
        top_left,
        top_right,
        bottom_left,
        bottom_right,
    }))
}

#[cfg(all(test, debug_assertions))]
mod tests {
    use super::*;

    #[test]
    fn release_clears_ledger_entry() {
        let p = into_raw(Box::new(Coordinate { x: 1.0, y: 2.0 }));
        assert!(ledger::is_live(p as usize));
        unsafe { release(p) };
        assert!(!ledger::is_live(p as usize));
    }

    #[test]
    fn assembly_consumes_corners() {
        let c: Vec<_> = (0..4)
            .map(|i| into_raw(Box::new(Coordinate { x: i as f64, y: 0.0 })))
            .collect();
        let det = unsafe { assemble_detection_result(c[0], c[1], c[2], c[3]) };
        assert!(!det.is_null());
        for p in &c {
            assert!(!ledger::is_live(*p as usize));
        }
        assert!(ledger::is_live(det as usize));

        let quad = unsafe { (*det).quad() }.unwrap();
        assert_eq!(quad.bottom_right, Point2::new(3.0, 0.0));
        unsafe { release(det) };
        assert!(!ledger::is_live(det as usize));
    }

    #[test]
    fn rejected_assembly_leaves_corners_live() {
        let a = into_raw(Box::new(Coordinate { x: 0.0, y: 0.0 }));
        let b = into_raw(Box::new(Coordinate { x: 1.0, y: 0.0 }));
        let det = unsafe { assemble_detection_result(a, b, a, ptr::null_mut()) };
        assert!(det.is_null());
        assert!(ledger::is_live(a as usize));
        assert!(ledger::is_live(b as usize));
        unsafe {
            release(a);
            release(b);
        }
    }

    #[test]
    fn released_address_is_not_reissued() {
        let first = into_raw(Box::new(Coordinate { x: 3.0, y: 4.0 }));
        unsafe { release(first) };
        let second = into_raw(Box::new(Coordinate { x: 5.0, y: 6.0 }));
        assert_ne!(first, second);

        let before = violations();
        unsafe { release(first) };
        assert!(violations() > before);
        assert!(ledger::is_live(second as usize));
        assert_eq!(unsafe { *second }, Coordinate { x: 5.0, y: 6.0 });
        unsafe { release(second) };
    }

    #[test]
    fn extraction_result_round_trips_cells() {
        let r = ExtractionResult::from_cells(vec![5, 0, 9]);
        assert_eq!(r.len, 3);
        assert_eq!(r.as_slice(), &[5, 0, 9]);
        let empty = ExtractionResult::from_cells(Vec::new());
        assert!(empty.as_slice().is_empty());
    }

    #[test]
    fn from_quad_copies_corners() {
        let det = DetectionResult::from_quad(&Quad::whole_image());
        let quad = unsafe { det.quad() }.unwrap();
        assert_eq!(quad, Quad::whole_image());
        assert_eq!(unsafe { *det.top_right }, Coordinate { x: 1.0, y: 0.0 });
    }
}
