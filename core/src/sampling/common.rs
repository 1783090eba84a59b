//! Common sampling functions.

use crate::common::*;
use crate::geometry::*;
use crate::rng::*;

/// Uniformly sample a direction from a sphere.
///
/// * `u` - The random sample point.
pub fn uniform_sample_sphere(u: &Point2f) -> Vector3f {
    let z = 1.0 - 2.0 * u[0];
    let r = max(0.0, 1.0 - z * z).sqrt();
    let phi = TWO_PI * u[1];
    Vector3f::new(r * phi.cos(), r * phi.sin(), z)
}

/// Sample a point on a unit disk by mapping concentric squares to concentric
/// circles.
///
/// * `u` - The random sample point.
pub fn concentric_sample_disk(u: &Point2f) -> Point2f {
    // Map uniform random numbers to [-1,1]^2.
    let ox = 2.0 * u[0] - 1.0;
    let oy = 2.0 * u[1] - 1.0;

    // Handle degeneracy at the origin.
    if ox == 0.0 && oy == 0.0 {
        return Point2f::new(0.0, 0.0);
    }

    let (r, theta) = if abs(ox) > abs(oy) {
        (ox, PI_OVER_FOUR * (oy / ox))
    } else {
        (oy, PI_OVER_TWO - PI_OVER_FOUR * (ox / oy))
    };
    Point2f::new(r * theta.cos(), r * theta.sin())
}

/// Uniformly sample a direction from a cone of directions about the `(0, 0, 1)`
/// axis.
///
/// * `u`             - The random sample point.
/// * `cos_theta_max` - Cosine of the cone's half angle.
pub fn uniform_sample_cone(u: &Point2f, cos_theta_max: Float) -> Vector3f {
    let cos_theta = lerp(u[0], 1.0, cos_theta_max);
    let sin_theta = max(0.0, 1.0 - cos_theta * cos_theta).sqrt();
    let phi = u[1] * TWO_PI;
    Vector3f::new(phi.cos() * sin_theta, phi.sin() * sin_theta, cos_theta)
}

/// Uniformly sample barycentric coordinates on a triangle.
///
/// * `u` - The random sample point.
pub fn uniform_sample_triangle(u: &Point2f) -> Point2f {
    let su0 = u[0].sqrt();
    Point2f::new(1.0 - su0, u[1] * su0)
}

/// Sample a direction on the `+z` hemisphere using cosine-weighted sampling.
///
/// * `u` - The random sample point.
#[inline]
pub fn cosine_sample_hemisphere(u: &Point2f) -> Vector3f {
    let d = concentric_sample_disk(u);
    let z = max(0.0, 1.0 - d.x * d.x - d.y * d.y).sqrt();
    Vector3f::new(d.x, d.y, z)
}

/// Returns a jittered sample point inside one stratum of an `n x n` grid over
/// the unit square. Strata are visited in row order and wrap after `n * n`.
///
/// * `index` - Stratum index.
/// * `n`     - Number of strata per axis.
/// * `rng`   - Source of the jitter.
pub fn stratified_sample_2d(index: usize, n: usize, rng: &mut RNG) -> Point2f {
    let n = n.max(1);
    let cell = index % (n * n);
    let inv_n = 1.0 / n as Float;
    let sx = ((cell % n) as Float + rng.uniform_float()) * inv_n;
    let sy = ((cell / n) as Float + rng.uniform_float()) * inv_n;
    Point2f::new(min(sx, ONE_MINUS_EPSILON), min(sy, ONE_MINUS_EPSILON))
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;
    use proptest::prelude::*;

    #[test]
    fn stratified_sample_lands_in_its_stratum() {
        let mut rng = RNG::new(5);
        for index in 0..16 {
            let p = stratified_sample_2d(index, 4, &mut rng);
            assert_eq!((p.x * 4.0) as usize, index % 4);
            assert_eq!((p.y * 4.0) as usize, index / 4);
        }
    }

    proptest! {
        #[test]
        fn sphere_samples_are_unit(u0 in 0.0..1.0f32, u1 in 0.0..1.0f32) {
            let v = uniform_sample_sphere(&Point2f::new(u0, u1));
            prop_assert!(approx_eq!(Float, v.length(), 1.0, epsilon = 0.0001));
        }

        #[test]
        fn cone_samples_stay_in_cone(u0 in 0.0..1.0f32, u1 in 0.0..1.0f32, cos_max in 0.0..0.99f32) {
            let v = uniform_sample_cone(&Point2f::new(u0, u1), cos_max);
            prop_assert!(v.z >= cos_max - 0.0001);
        }

        #[test]
        fn cosine_samples_in_upper_hemisphere(u0 in 0.0..1.0f32, u1 in 0.0..1.0f32) {
            let v = cosine_sample_hemisphere(&Point2f::new(u0, u1));
            prop_assert!(v.z >= 0.0);
            prop_assert!(approx_eq!(Float, v.length(), 1.0, epsilon = 0.001));
        }

        #[test]
        fn triangle_barycentrics_are_valid(u0 in 0.0..1.0f32, u1 in 0.0..1.0f32) {
            let b = uniform_sample_triangle(&Point2f::new(u0, u1));
            prop_assert!(b.x >= 0.0 && b.y >= 0.0 && b.x + b.y <= 1.0 + 0.0001);
        }
    }
}
