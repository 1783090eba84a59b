//! Singular Value Decomposition

use crate::error::SvdError;

/// Maximum number of Jacobi sweeps before giving up on convergence.
const MAX_SWEEPS: usize = 60;

/// Relative size of the off-diagonal term below which a column pair counts as
/// orthogonal.
const ORTHOGONALITY_EPSILON: f64 = 1e-13;

/// Singular value decomposition `A = U * diag(S) * V^T` of an `m x n` matrix
/// with `m >= n`, computed with one-sided Jacobi rotations. `U` is `m x n`
/// with orthonormal columns, `V` is `n x n` orthogonal and singular values are
/// sorted in decreasing order.
#[derive(Clone, Debug)]
pub struct SVD {
    /// Rows.
    m: usize,

    /// Columns.
    n: usize,

    /// Left singular vectors, row-major `m x n`.
    u: Vec<f64>,

    /// Singular values.
    s: Vec<f64>,

    /// Right singular vectors, row-major `n x n`.
    v: Vec<f64>,
}

impl SVD {
    /// Decompose a row-major `rows x cols` matrix.
    ///
    /// * `a`    - Matrix entries in row-major order.
    /// * `rows` - Number of rows.
    /// * `cols` - Number of columns.
    pub fn new(a: &[f64], rows: usize, cols: usize) -> Result<Self, SvdError> {
        if rows < cols {
            return Err(SvdError::NotEnoughRows { rows, cols });
        }
        if a.len() != rows * cols {
            return Err(SvdError::DimensionMismatch {
                expected: rows * cols,
                got: a.len(),
            });
        }

        let (m, n) = (rows, cols);
        let mut u = a.to_vec();
        let mut v = vec![0.0; n * n];
        for i in 0..n {
            v[i * n + i] = 1.0;
        }

        let mut sweep = 0;
        loop {
            let mut rotated = false;
            for p in 0..n {
                for q in p + 1..n {
                    let (mut alpha, mut beta, mut gamma) = (0.0, 0.0, 0.0);
                    for i in 0..m {
                        let (up, uq) = (u[i * n + p], u[i * n + q]);
                        alpha += up * up;
                        beta += uq * uq;
                        gamma += up * uq;
                    }
                    if gamma.abs() <= ORTHOGONALITY_EPSILON * (alpha * beta).sqrt() || gamma == 0.0 {
                        continue;
                    }
                    rotated = true;

                    let zeta = (beta - alpha) / (2.0 * gamma);
                    let t = zeta.signum() / (zeta.abs() + (1.0 + zeta * zeta).sqrt());
                    let c = 1.0 / (1.0 + t * t).sqrt();
                    let s = c * t;
                    rotate_columns(&mut u, n, p, q, c, s);
                    rotate_columns(&mut v, n, p, q, c, s);
                }
            }

            sweep += 1;
            if !rotated {
                break;
            }
            if sweep == MAX_SWEEPS {
                warn!("SVD did not converge after {} sweeps", MAX_SWEEPS);
                break;
            }
        }

        // Column norms are the singular values; normalize U's columns.
        let mut s = vec![0.0; n];
        for (j, sj) in s.iter_mut().enumerate() {
            let norm = (0..m).map(|i| u[i * n + j] * u[i * n + j]).sum::<f64>().sqrt();
            *sj = norm;
            if norm > 0.0 {
                for i in 0..m {
                    u[i * n + j] /= norm;
                }
            }
        }

        // Sort by decreasing singular value.
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&i, &j| s[j].total_cmp(&s[i]));
        let s = order.iter().map(|&j| s[j]).collect();
        let u = permute_columns(&u, m, n, &order);
        let v = permute_columns(&v, n, n, &order);

        Ok(Self { m, n, u, s, v })
    }

    /// Returns the number of rows of the decomposed matrix.
    pub fn rows(&self) -> usize {
        self.m
    }

    /// Returns the number of columns of the decomposed matrix.
    pub fn cols(&self) -> usize {
        self.n
    }

    /// Returns the singular values in decreasing order.
    pub fn singular_values(&self) -> &[f64] {
        &self.s
    }

    /// Returns entry `(i, j)` of `U`.
    ///
    /// * `i` - Row.
    /// * `j` - Column.
    pub fn u(&self, i: usize, j: usize) -> f64 {
        self.u[i * self.n + j]
    }

    /// Returns entry `(i, j)` of `V`.
    ///
    /// * `i` - Row.
    /// * `j` - Column.
    pub fn v(&self, i: usize, j: usize) -> f64 {
        self.v[i * self.n + j]
    }

    /// Returns the number of singular values at or above `tolerance` times the
    /// largest one.
    ///
    /// * `tolerance` - Relative cutoff.
    pub fn rank(&self, tolerance: f64) -> usize {
        let cutoff = self.cutoff(tolerance);
        self.s.iter().filter(|&&s| s > 0.0 && s >= cutoff).count()
    }

    /// Returns the least squares solution `x` of `A x = b` with the smallest
    /// norm. Singular values below `tolerance` times the largest one are
    /// treated as zero.
    ///
    /// * `b`         - Right hand side, one entry per row.
    /// * `tolerance` - Relative cutoff for small singular values.
    pub fn solve(&self, b: &[f64], tolerance: f64) -> Result<Vec<f64>, SvdError> {
        if b.len() != self.m {
            return Err(SvdError::DimensionMismatch {
                expected: self.m,
                got: b.len(),
            });
        }

        let cutoff = self.cutoff(tolerance);
        let mut x = vec![0.0; self.n];
        for (j, &s) in self.s.iter().enumerate() {
            if s <= 0.0 || s < cutoff {
                continue;
            }
            let ub: f64 = (0..self.m).map(|i| self.u(i, j) * b[i]).sum();
            let coeff = ub / s;
            for (k, xk) in x.iter_mut().enumerate() {
                *xk += coeff * self.v(k, j);
            }
        }
        Ok(x)
    }

    /// Absolute cutoff for a relative tolerance.
    fn cutoff(&self, tolerance: f64) -> f64 {
        self.s.first().copied().unwrap_or(0.0) * tolerance.max(0.0)
    }
}

/// Apply a Givens rotation to columns `p` and `q` of a row-major matrix.
fn rotate_columns(a: &mut [f64], cols: usize, p: usize, q: usize, c: f64, s: f64) {
    for row in a.chunks_exact_mut(cols) {
        let (ap, aq) = (row[p], row[q]);
        row[p] = c * ap - s * aq;
        row[q] = s * ap + c * aq;
    }
}

/// Returns a row-major matrix with its columns reordered.
fn permute_columns(a: &[f64], rows: usize, cols: usize, order: &[usize]) -> Vec<f64> {
    let mut out = vec![0.0; rows * cols];
    for i in 0..rows {
        for (j, &src) in order.iter().enumerate() {
            out[i * cols + j] = a[i * cols + src];
        }
    }
    out
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
