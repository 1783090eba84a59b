//! Triangle rasterization.

use crate::common::*;
use crate::geometry::*;

/// A triangle in screen space. `x` and `y` are pixel coordinates, `z` is the
/// camera space depth.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScreenTriangle {
    /// Vertices.
    pub v: [Point3f; 3],
}

impl ScreenTriangle {
    /// Returns a new `ScreenTriangle`.
    ///
    /// * `v0` - First vertex.
    /// * `v1` - Second vertex.
    /// * `v2` - Third vertex.
    pub fn new(v0: Point3f, v1: Point3f, v2: Point3f) -> Self {
        Self { v: [v0, v1, v2] }
    }

    /// Returns twice the signed screen space area.
    pub fn signed_area2(&self) -> Float {
        let [a, b, c] = self.v;
        (b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)
    }

    /// Returns true if the triangle covers no pixels: zero area or non-finite
    /// coordinates.
    pub fn is_degenerate(&self) -> bool {
        let finite = self
            .v
            .iter()
            .all(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite());
        !finite || self.signed_area2() == 0.0
    }
}

/// Edge function of `(a, b)` evaluated at `(px, py)`.
#[inline]
fn edge(a: &Point3f, b: &Point3f, px: Float, py: Float) -> Float {
    (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
}

/// True if the edge from `a` to `b` is a top or left edge for a triangle with
/// positive orientation; pixel centres exactly on such an edge are covered so
/// triangles sharing an edge never both cover a pixel.
#[inline]
fn is_top_left(a: &Point3f, b: &Point3f) -> bool {
    (a.y == b.y && b.x < a.x) || b.y > a.y
}

/// Scan-convert a triangle, calling `emit(x, y, depth)` for every pixel whose
/// centre it covers, with the depth interpolated at that centre. Degenerate
/// triangles emit nothing. Both windings are accepted.
///
/// * `tri`    - The triangle.
/// * `width`  - Image width in pixels.
/// * `height` - Image height in pixels.
/// * `emit`   - Receives covered pixels.
pub fn rasterize_triangle<F>(tri: &ScreenTriangle, width: usize, height: usize, mut emit: F)
where
    F: FnMut(usize, usize, Float),
{
    if tri.is_degenerate() || width == 0 || height == 0 {
        return;
    }

    // Use a consistent (positive) orientation.
    let [mut a, mut b, c] = tri.v;
    if tri.signed_area2() < 0.0 {
        std::mem::swap(&mut a, &mut b);
    }
    let area = edge(&a, &b, c.x, c.y);

    let x_min = max(0.0, min(a.x, min(b.x, c.x)).floor()) as usize;
    let y_min = max(0.0, min(a.y, min(b.y, c.y)).floor()) as usize;
    let x_max = min((width - 1) as Float, max(a.x, max(b.x, c.x)).ceil());
    let y_max = min((height - 1) as Float, max(a.y, max(b.y, c.y)).ceil());
    if x_max < 0.0 || y_max < 0.0 {
        return;
    }
    let (x_max, y_max) = (x_max as usize, y_max as usize);

    let covers = |w: Float, top_left: bool| w > 0.0 || (w == 0.0 && top_left);
    let tl = [is_top_left(&b, &c), is_top_left(&c, &a), is_top_left(&a, &b)];

    for y in y_min..=y_max {
        let py = y as Float + 0.5;
        for x in x_min..=x_max {
            let px = x as Float + 0.5;
            let w0 = edge(&b, &c, px, py);
            let w1 = edge(&c, &a, px, py);
            let w2 = edge(&a, &b, px, py);
            if covers(w0, tl[0]) && covers(w1, tl[1]) && covers(w2, tl[2]) {
                let depth = (w0 * a.z + w1 * b.z + w2 * c.z) / area;
                emit(x, y, depth);
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
