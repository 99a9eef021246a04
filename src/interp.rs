//! Scattered-data surface interpolation.
//!
//! Horizon conformance consumes elevation surfaces through the
//! [`SurfaceInterpolator`] seam; [`RbfSurface`] is the built-in provider, a
//! linear radial basis fit with diagonal smoothing matching the validated
//! reference behavior.

use log::debug;

use crate::error::MeshError;
use crate::geometry::Point3;

/// Smoothing applied when fitting imported flow-model surfaces.
pub const DEFAULT_SMOOTHING: f64 = 100.0;

/// An elevation surface `z = f(x, y)` sampled by the conformance routines.
pub trait SurfaceInterpolator {
    fn eval(&self, x: f64, y: f64) -> f64;
}

/// Adapter making any closure over (x, y) usable as a surface.
pub struct FnSurface<F>(pub F);

impl<F: Fn(f64, f64) -> f64> SurfaceInterpolator for FnSurface<F> {
    fn eval(&self, x: f64, y: f64) -> f64 {
        (self.0)(x, y)
    }
}

/// Radial basis surface with the linear kernel `phi(r) = r` and diagonal
/// smoothing: the fit solves `(Phi - smooth * I) w = z` over the sample
/// points, and evaluation is `sum_j w_j * r_j`.
#[derive(Clone, Debug)]
pub struct RbfSurface {
    centers: Vec<[f64; 2]>,
    weights: Vec<f64>,
}

impl RbfSurface {
    /// Fit a surface through `points` (x, y, z samples).
    ///
    /// `smooth = 0` gives exact interpolation; positive values relax the fit
    /// toward a smoother surface. Fails on an empty sample set or a singular
    /// fit system (e.g. duplicate sample locations with zero smoothing).
    pub fn fit(points: &[Point3], smooth: f64) -> Result<Self, MeshError> {
        if points.is_empty() {
            return Err(MeshError::Interpolation(
                "cannot fit a surface through zero sample points".into(),
            ));
        }
        let n = points.len();
        debug!("fitting rbf surface through {n} points, smooth={smooth}");

        let centers: Vec<[f64; 2]> = points.iter().map(|p| [p[0], p[1]]).collect();
        let mut matrix = vec![0.0f64; n * n];
        for i in 0..n {
            for j in 0..n {
                let dx = centers[i][0] - centers[j][0];
                let dy = centers[i][1] - centers[j][1];
                matrix[i * n + j] = (dx * dx + dy * dy).sqrt();
            }
            matrix[i * n + i] -= smooth;
        }
        let rhs: Vec<f64> = points.iter().map(|p| p[2]).collect();
        let weights = solve_dense(matrix, rhs, n)?;
        Ok(Self { centers, weights })
    }

    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }
}

impl SurfaceInterpolator for RbfSurface {
    fn eval(&self, x: f64, y: f64) -> f64 {
        self.centers
            .iter()
            .zip(&self.weights)
            .map(|(c, w)| {
                let dx = x - c[0];
                let dy = y - c[1];
                w * (dx * dx + dy * dy).sqrt()
            })
            .sum()
    }
}

/// Gaussian elimination with partial pivoting on a row-major dense system.
fn solve_dense(mut a: Vec<f64>, mut b: Vec<f64>, n: usize) -> Result<Vec<f64>, MeshError> {
    for col in 0..n {
        let mut pivot = col;
        let mut best = a[col * n + col].abs();
        for row in (col + 1)..n {
            let candidate = a[row * n + col].abs();
            if candidate > best {
                best = candidate;
                pivot = row;
            }
        }
        if best < f64::EPSILON {
            return Err(MeshError::Interpolation(format!(
                "singular fit system at column {col}"
            )));
        }
        if pivot != col {
            for k in 0..n {
                a.swap(col * n + k, pivot * n + k);
            }
            b.swap(col, pivot);
        }
        for row in (col + 1)..n {
            let factor = a[row * n + col] / a[col * n + col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row * n + k] -= factor * a[col * n + k];
            }
            b[row] -= factor * b[col];
        }
    }
    let mut x = vec![0.0f64; n];
    for row in (0..n).rev() {
        let mut acc = b[row];
        for k in (row + 1)..n {
            acc -= a[row * n + k] * x[k];
        }
        x[row] = acc / a[row * n + row];
    }
    Ok(x)
}
