//! 1D Distribution.

use crate::common::*;

/// A piecewise-constant 1D function with its CDF, used to pick items in
/// proportion to a weight (e.g. triangles by area).
#[derive(Clone, Debug)]
pub struct Distribution1D {
    /// Piecewise-constant function.
    func: Vec<Float>,

    /// CDF for `func`, `func.len() + 1` entries.
    cdf: Vec<Float>,

    /// Integral of `func`.
    func_int: Float,
}

impl Distribution1D {
    /// Returns a new `Distribution1D` for given piecewise-constant function. An
    /// all-zero (or empty) function is sampled uniformly.
    ///
    /// - `f` - Piecewise-constant 1D function.
    pub fn new(f: Vec<Float>) -> Self {
        let n = f.len();

        // Compute integral of step function at `x_i`
        let mut cdf: Vec<Float> = Vec::with_capacity(n + 1);
        cdf.push(0.0);
        for i in 1..n + 1 {
            cdf.push(cdf[i - 1] + f[i - 1] / n as Float);
        }

        // Transform step function integral into CDF.
        let func_int = cdf[n];
        if func_int == 0.0 {
            for (i, v) in cdf.iter_mut().enumerate().skip(1) {
                *v = i as Float / n as Float;
            }
        } else {
            for v in cdf.iter_mut().skip(1) {
                *v /= func_int;
            }
        }

        Self { func: f, cdf, func_int }
    }

    /// Returns the number of sample points for the piecewise-constant function.
    pub fn count(&self) -> usize {
        self.func.len()
    }

    /// Returns the integral of the function.
    pub fn integral(&self) -> Float {
        self.func_int
    }

    /// Return a sample from the discrete distribution given a random sample.
    /// Returns the offset, its probability and `u` remapped to `[0, 1)` within
    /// the chosen segment.
    ///
    /// - `u` - The random sample.
    pub fn sample_discrete(&self, u: Float) -> (usize, Float, Float) {
        debug_assert!(self.count() > 0);

        // Find surrounding CDF segments and `offset`.
        let offset = find_interval(self.cdf.len(), |index| self.cdf[index] <= u);
        let pdf = self.discrete_pdf(offset);
        let width = self.cdf[offset + 1] - self.cdf[offset];
        let u_remapped = if width > 0.0 {
            clamp((u - self.cdf[offset]) / width, 0.0, ONE_MINUS_EPSILON)
        } else {
            0.0
        };
        (offset, pdf, u_remapped)
    }

    /// Return the PDF for sampling a given value from the discrete PDF.
    ///
    /// * `index` - Sample index.
    pub fn discrete_pdf(&self, index: usize) -> Float {
        if self.func_int > 0.0 {
            self.func[index] / (self.func_int * self.count() as Float)
        } else {
            1.0 / self.count() as Float
        }
    }
}

/// Returns the largest index `i` in `[0, size - 2]` for which `pred(i)` holds,
/// assuming `pred` is true then false over the range.
///
/// * `size` - Number of entries.
/// * `pred` - The predicate.
fn find_interval<P>(size: usize, pred: P) -> usize
where
    P: Fn(usize) -> bool,
{
    let (mut first, mut len) = (0, size);
    while len > 0 {
        let half = len >> 1;
        let middle = first + half;
        if pred(middle) {
            first = middle + 1;
            len -= half + 1;
        } else {
            len = half;
        }
    }
    clamp(first as isize - 1, 0, size as isize - 2) as usize
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
