//! Potential sampling and azimuthal averaging
//!
//! Reconstructs an axisymmetric (r, z) potential map from the solver's
//! cartesian array: trilinear interpolation between the 8 surrounding grid
//! points, averaged over azimuth. The trap is mirror symmetric, so only the
//! first angular quadrant is sampled and the stored octant is unfolded into
//! the full (±r, ±z) plane afterwards. The unfold emits each center row and
//! column exactly once; a stacking that repeats the z = 0 row would
//! double-weight it in downstream least-squares fits.

use std::f64::consts::PI;

use nalgebra::DMatrix;

use crate::error::{Error, Result};
use crate::pa::PotentialArray;

/// Half-extent of the averaged region around the trap center, meters.
pub const AVERAGED_AREA_LENGTH: f64 = 10e-3;

/// Default sample count per half-axis of the averaged map.
pub const DEFAULT_MAP_SAMPLES: usize = 50;

/// Default number of azimuthal samples for a given grid density.
pub fn default_theta_samples(pts: usize) -> usize {
    (pts as f64 * PI / 2.0) as usize
}

/// Point queries against a sampled potential array.
pub struct FieldSampler<'a> {
    pa: &'a PotentialArray,
}

impl<'a> FieldSampler<'a> {
    pub fn new(pa: &'a PotentialArray) -> Self {
        Self { pa }
    }

    /// Trilinear interpolation at a continuous cartesian coordinate.
    ///
    /// The coordinate must map inside a full 8-point neighborhood; clamping
    /// would silently bend the field near the border, so an out-of-range
    /// query is a configuration error instead.
    pub fn potential_at(&self, x: f64, y: f64, z: f64) -> Result<f64> {
        let fx = x / self.pa.step[0];
        let fy = y / self.pa.step[1];
        let fz = z / self.pa.step[2];
        let oob = || Error::OutOfBounds { x, y, z };

        if fx < 0.0 || fy < 0.0 || fz < 0.0 {
            return Err(oob());
        }
        let (i, j, k) = (fx.floor() as usize, fy.floor() as usize, fz.floor() as usize);
        if i + 1 >= self.pa.nx || j + 1 >= self.pa.ny || k + 1 >= self.pa.nz {
            return Err(oob());
        }

        let (a, b, g) = (fx - i as f64, fy - j as f64, fz - k as f64);
        let p = |di: usize, dj: usize, dk: usize| self.pa.potential(i + di, j + dj, k + dk);

        Ok(a * b * g * p(1, 1, 1)
            + a * (1.0 - b) * g * p(1, 0, 1)
            + a * b * (1.0 - g) * p(1, 1, 0)
            + a * (1.0 - b) * (1.0 - g) * p(1, 0, 0)
            + (1.0 - a) * b * g * p(0, 1, 1)
            + (1.0 - a) * (1.0 - b) * g * p(0, 0, 1)
            + (1.0 - a) * b * (1.0 - g) * p(0, 1, 0)
            + (1.0 - a) * (1.0 - b) * (1.0 - g) * p(0, 0, 0))
    }

    /// Interpolated potential at cylindrical `(r, theta, z)`.
    pub fn potential_cylindrical(&self, r: f64, theta: f64, z: f64) -> Result<f64> {
        self.potential_at(r * theta.cos(), r * theta.sin(), z)
    }

    /// Azimuthal mean of the potential at fixed `(r, z)`.
    fn averaged_point(&self, r: f64, z: f64, num_theta: usize) -> Result<f64> {
        let mut sum = 0.0;
        for n in 0..num_theta {
            let theta = PI / 2.0 * n as f64 / (num_theta - 1) as f64;
            sum += self.potential_cylindrical(r, theta, z)?;
        }
        Ok(sum / num_theta as f64)
    }

    /// Axisymmetric potential map over `[0, max_r] x [0, max_z]`, unfolded
    /// into the full plane.
    pub fn averaged_map(
        &self,
        r_pts: usize,
        z_pts: usize,
        max_r: f64,
        max_z: f64,
        num_theta: usize,
    ) -> Result<AxisymmetricMap> {
        if r_pts < 2 || z_pts < 2 || num_theta < 2 {
            return Err(Error::InvalidConfig {
                parameter: "averaged_map sampling",
                value: format!("r_pts={r_pts}, z_pts={z_pts}, num_theta={num_theta}"),
                reason: "at least two samples per dimension are required",
            });
        }

        // Octant map: rows follow z, columns follow r.
        let mut phi = DMatrix::zeros(z_pts, r_pts);
        for iz in 0..z_pts {
            let z = max_z * iz as f64 / (z_pts - 1) as f64;
            for ir in 0..r_pts {
                let r = max_r * ir as f64 / (r_pts - 1) as f64;
                phi[(iz, ir)] = self.averaged_point(r, z, num_theta)?;
            }
        }

        Ok(unfold_octant(&phi, max_r, max_z))
    }
}

/// An azimuthally averaged potential over the full (±r, ±z) plane.
#[derive(Debug, Clone)]
pub struct AxisymmetricMap {
    /// Signed radius at each sample; rows share z, columns share r.
    pub rs: DMatrix<f64>,
    pub zs: DMatrix<f64>,
    pub phi: DMatrix<f64>,
}

/// Mirror the non-negative octant map across both axes.
fn unfold_octant(phi: &DMatrix<f64>, max_r: f64, max_z: f64) -> AxisymmetricMap {
    let (nz, nr) = phi.shape();
    let rows = 2 * nz - 1;
    let cols = 2 * nr - 1;
    let mut rs = DMatrix::zeros(rows, cols);
    let mut zs = DMatrix::zeros(rows, cols);
    let mut full = DMatrix::zeros(rows, cols);

    for t in 0..rows {
        let iz = t.abs_diff(nz - 1);
        let sz = if t < nz - 1 { -1.0 } else { 1.0 };
        for u in 0..cols {
            let ir = u.abs_diff(nr - 1);
            let sr = if u < nr - 1 { -1.0 } else { 1.0 };
            rs[(t, u)] = sr * max_r * ir as f64 / (nr - 1) as f64;
            zs[(t, u)] = sz * max_z * iz as f64 / (nz - 1) as f64;
            full[(t, u)] = phi[(iz, ir)];
        }
    }

    AxisymmetricMap { rs, zs, phi: full }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{BoundingExtents, Grid};
    use approx::assert_relative_eq;

    /// Array filled from an analytic potential, sampled at the grid nodes.
    fn synthetic_pa(f: impl Fn(f64, f64, f64) -> f64) -> PotentialArray {
        let grid = Grid::new(BoundingExtents::cube(20e-3), 40, None, false).unwrap();
        let mut pa = PotentialArray::empty(&grid);
        for k in 0..grid.shape.z {
            for j in 0..grid.shape.y {
                for i in 0..grid.shape.x {
                    let [x, y, z] = grid.cartesian_point(i, j, k);
                    pa.set_potential(i, j, k, f(x, y, z));
                }
            }
        }
        pa
    }

    #[test]
    fn interpolation_is_exact_on_nodes_and_linear_fields() {
        let pa = synthetic_pa(|x, y, z| 2.0 * x - 3.0 * y + 0.5 * z + 1.0);
        let sampler = FieldSampler::new(&pa);
        let step = pa.step[0];
        // On a node.
        let v = sampler.potential_at(3.0 * step, 2.0 * step, 5.0 * step).unwrap();
        assert_relative_eq!(v, 2.0 * 3.0 * step - 3.0 * 2.0 * step + 0.5 * 5.0 * step + 1.0, epsilon = 1e-12);
        // Between nodes: trilinear reproduces any affine field exactly.
        let (x, y, z) = (3.3 * step, 2.7 * step, 5.5 * step);
        let v = sampler.potential_at(x, y, z).unwrap();
        assert_relative_eq!(v, 2.0 * x - 3.0 * y + 0.5 * z + 1.0, epsilon = 1e-12);
    }

    #[test]
    fn out_of_bounds_query_is_an_error() {
        let pa = synthetic_pa(|_, _, _| 0.0);
        let sampler = FieldSampler::new(&pa);
        assert!(sampler.potential_at(-1e-3, 0.0, 0.0).is_err());
        let far = pa.nx as f64 * pa.step[0];
        assert!(sampler.potential_at(far, 0.0, 0.0).is_err());
    }

    #[test]
    fn azimuthal_average_of_axisymmetric_field_matches_direct_value() {
        // Phi = x^2 + y^2 = r^2 is already axisymmetric.
        let pa = synthetic_pa(|x, y, _| x * x + y * y);
        let sampler = FieldSampler::new(&pa);
        let r = 4e-3;
        let avg = sampler.averaged_point(r, 2e-3, 32).unwrap();
        // Trilinear interpolation of r^2 carries an O(step^2) bias; compare
        // against the interpolated value on one ray instead of r^2 itself.
        let direct = sampler.potential_cylindrical(r, 0.0, 2e-3).unwrap();
        assert_relative_eq!(avg, direct, max_relative = 1e-2);
    }

    #[test]
    fn default_map_resolution_spans_the_full_plane() {
        let pa = synthetic_pa(|_, _, _| 1.0);
        let sampler = FieldSampler::new(&pa);
        let map = sampler
            .averaged_map(DEFAULT_MAP_SAMPLES, DEFAULT_MAP_SAMPLES, 8e-3, 8e-3, 8)
            .unwrap();
        assert_eq!(
            map.phi.shape(),
            (2 * DEFAULT_MAP_SAMPLES - 1, 2 * DEFAULT_MAP_SAMPLES - 1)
        );
    }

    #[test]
    fn unfolded_map_is_even_in_both_axes() {
        let pa = synthetic_pa(|x, y, z| x * x + y * y + 2.0 * z * z);
        let sampler = FieldSampler::new(&pa);
        let map = sampler.averaged_map(12, 10, 8e-3, 8e-3, 24).unwrap();
        let (rows, cols) = map.phi.shape();
        assert_eq!((rows, cols), (19, 23));
        for t in 0..rows {
            for u in 0..cols {
                assert_relative_eq!(
                    map.phi[(t, u)],
                    map.phi[(rows - 1 - t, cols - 1 - u)],
                    epsilon = 1e-12
                );
            }
        }
        // Corner coordinates carry the signs.
        assert_relative_eq!(map.rs[(0, 0)], -8e-3, epsilon = 1e-12);
        assert_relative_eq!(map.zs[(0, 0)], -8e-3, epsilon = 1e-12);
        assert_relative_eq!(map.rs[(rows - 1, cols - 1)], 8e-3, epsilon = 1e-12);
    }
}
