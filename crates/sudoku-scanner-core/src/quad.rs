use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Four grid corners in a fixed semantic order.
///
/// No convexity or bounds invariant is enforced; whatever produced the corners
/// is trusted to report a sensible shape. Whether the points are in pixel or
/// normalized space is a convention of the caller, see [`crate::ImageSize`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    pub top_left: Point2<f64>,
    pub top_right: Point2<f64>,
    pub bottom_left: Point2<f64>,
    pub bottom_right: Point2<f64>,
}

impl Quad {
    pub fn new(
        top_left: Point2<f64>,
        top_right: Point2<f64>,
        bottom_left: Point2<f64>,
        bottom_right: Point2<f64>,
    ) -> Self {
        Self {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
        }
    }

    /// The normalized quad covering the whole image:
    /// `(0,0), (1,0), (0,1), (1,1)`.
    ///
    /// Returned by grid detection when the image cannot be used at all.
    pub fn whole_image() -> Self {
        Self::new(
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(1.0, 1.0),
        )
    }

    /// Corners ordered top-left, top-right, bottom-left, bottom-right.
    pub fn corners(&self) -> [Point2<f64>; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_left,
            self.bottom_right,
        ]
    }

    /// Corners flattened to `[tl.x, tl.y, tr.x, tr.y, bl.x, bl.y, br.x, br.y]`.
    pub fn to_flat(&self) -> [f64; 8] {
        let mut out = [0.0; 8];
        for (i, p) in self.corners().iter().enumerate() {
            out[2 * i] = p.x;
            out[2 * i + 1] = p.y;
        }
        out
    }

    /// Inverse of [`Quad::to_flat`].
    pub fn from_flat(v: [f64; 8]) -> Self {
        Self::new(
            Point2::new(v[0], v[1]),
            Point2::new(v[2], v[3]),
            Point2::new(v[4], v[5]),
            Point2::new(v[6], v[7]),
        )
    }

    /// Apply `f` to every corner, keeping the order.
    pub fn map(&self, mut f: impl FnMut(Point2<f64>) -> Point2<f64>) -> Self {
        Self::new(
            f(self.top_left),
            f(self.top_right),
            f(self.bottom_left),
            f(self.bottom_right),
        )
    }
}
