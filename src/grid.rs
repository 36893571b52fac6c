//! Bounded, mirror-symmetric model lattice
//!
//! The grid covers the non-negative octant only; the solver file records the
//! x/y/z mirror flags, so physical space is eight copies of this lattice.
//! The model border is inflated beyond the trap border and then snapped so
//! that an exact integer number of steps spans each axis.

use crate::error::{Error, Result};

/// Characteristic physical envelope of a trap (half-lengths, meters).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingExtents {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl BoundingExtents {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn cube(size: f64) -> Self {
        Self::new(size, size, size)
    }

    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    fn is_positive(&self) -> bool {
        self.x > 0.0 && self.y > 0.0 && self.z > 0.0
    }
}

/// Grid cell counts per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl GridShape {
    pub fn voxels(&self) -> usize {
        self.x * self.y * self.z
    }
}

/// Default inflation of the model border beyond the trap border.
pub const DEFAULT_INFLATION: f64 = 1.5;

/// The discretized model volume.
#[derive(Debug, Clone)]
pub struct Grid {
    pub trap_border: BoundingExtents,
    pub model_border: BoundingExtents,
    pub shape: GridShape,
    /// Uniform grid step (meters), identical on all axes.
    pub step: f64,
    /// Requested point density along x; kept for the azimuthal sampler.
    pub pts: usize,
    cylindrical: bool,
    xs: Vec<f64>,
    ys: Vec<f64>,
    zs: Vec<f64>,
    /// Per-(i,j) radius and azimuth, x fastest. Present iff cylindrical.
    rs: Vec<f64>,
    thetas: Vec<f64>,
}

impl Grid {
    /// Build a grid from the trap border and a points-per-x-axis density.
    ///
    /// `model_border` defaults to `trap_border * 1.5`. The raw step is
    /// `model_border.x / pts`; each axis count is the ceiling of
    /// border/step, and the border is then recomputed as `count * step` so
    /// no partial cell remains.
    pub fn new(
        trap_border: BoundingExtents,
        pts: usize,
        model_border: Option<BoundingExtents>,
        cylindrical: bool,
    ) -> Result<Self> {
        if !trap_border.is_positive() {
            return Err(Error::InvalidConfig {
                parameter: "trap_border",
                value: format!("{:?}", trap_border),
                reason: "all extents must be positive",
            });
        }
        if pts == 0 {
            return Err(Error::InvalidConfig {
                parameter: "pts",
                value: pts.to_string(),
                reason: "grid resolution must be positive",
            });
        }
        let border = model_border.unwrap_or_else(|| trap_border.scaled(DEFAULT_INFLATION));
        if border.x < trap_border.x || border.y < trap_border.y || border.z < trap_border.z {
            return Err(Error::InvalidConfig {
                parameter: "model_border",
                value: format!("{:?}", border),
                reason: "model border must enclose the trap border",
            });
        }

        let step = border.x / pts as f64;
        let shape = GridShape {
            x: (border.x / step).ceil() as usize,
            y: (border.y / step).ceil() as usize,
            z: (border.z / step).ceil() as usize,
        };
        // Snap the border to an exact multiple of the step.
        let model_border = BoundingExtents::new(
            shape.x as f64 * step,
            shape.y as f64 * step,
            shape.z as f64 * step,
        );

        let axis = |n: usize| (0..n).map(|i| i as f64 * step).collect::<Vec<_>>();
        let xs = axis(shape.x);
        let ys = axis(shape.y);
        let zs = axis(shape.z);

        let (mut rs, mut thetas) = (Vec::new(), Vec::new());
        if cylindrical {
            rs.reserve(shape.x * shape.y);
            thetas.reserve(shape.x * shape.y);
            for y in &ys {
                for x in &xs {
                    rs.push((x * x + y * y).sqrt());
                    thetas.push(y.atan2(*x));
                }
            }
        }

        Ok(Self {
            trap_border,
            model_border,
            shape,
            step,
            pts,
            cylindrical,
            xs,
            ys,
            zs,
            rs,
            thetas,
        })
    }

    pub fn is_cylindrical(&self) -> bool {
        self.cylindrical
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    pub fn zs(&self) -> &[f64] {
        &self.zs
    }

    /// Predicate coordinates for a grid node: `(x, y, z)` for cartesian
    /// grids, `(r, theta, z)` for cylindrical ones (from the cache).
    #[inline]
    pub fn point(&self, i: usize, j: usize, k: usize) -> [f64; 3] {
        if self.cylindrical {
            let idx = j * self.shape.x + i;
            [self.rs[idx], self.thetas[idx], self.zs[k]]
        } else {
            [self.xs[i], self.ys[j], self.zs[k]]
        }
    }

    /// Cartesian coordinates of a node regardless of symmetry.
    #[inline]
    pub fn cartesian_point(&self, i: usize, j: usize, k: usize) -> [f64; 3] {
        [self.xs[i], self.ys[j], self.zs[k]]
    }

    /// Characteristic trap length `d = sqrt((z0^2 + r0^2/2)/2)`.
    pub fn characteristic_d(&self) -> f64 {
        let r0 = self.trap_border.x;
        let z0 = self.trap_border.z;
        (0.5 * (z0 * z0 + 0.5 * r0 * r0)).sqrt()
    }
}
