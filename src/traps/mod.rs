//! Trap variants and volume classification
//!
//! A variant supplies two half-space predicates (endcap surface, everything
//! else) and channel-assignment rules; the rest of the pipeline never
//! branches on the shape. New shapes implement [`TrapVariant`] and nothing
//! else changes.

mod cubic;
mod cylindrical;
mod hyperbolic;

pub use cubic::CubicTrap;
pub use cylindrical::CylindricalTrap;
pub use hyperbolic::HyperbolicTrap;

use std::f64::consts::PI;

use tracing::{debug, info};

use crate::channel::{ChannelSet, DETECTION, EXCITATION, TRAPPING};
use crate::error::Result;
use crate::grid::{BoundingExtents, Grid};
use crate::pa::PotentialArray;
use crate::shell::{self, ShellState};

/// How the predicate coordinates are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSystem {
    /// Predicates see `(x, y, z)`.
    Cartesian,
    /// Predicates see `(r, theta, z)`; the azimuth axis is never perturbed.
    Cylindrical,
}

/// Default shell thickness in grid steps.
pub const DEFAULT_SHELL_WIDTH_FACTOR: f64 = 1.6;

/// Capability set of one trap shape.
pub trait TrapVariant {
    fn name(&self) -> &'static str;

    /// Characteristic half-lengths of the trap.
    fn trap_border(&self) -> BoundingExtents;

    /// Override when the shape needs more surrounding vacuum than the
    /// default 1.5x inflation.
    fn model_border(&self) -> Option<BoundingExtents> {
        None
    }

    fn coordinates(&self) -> CoordinateSystem;

    fn shell_width_factor(&self) -> f64 {
        DEFAULT_SHELL_WIDTH_FACTOR
    }

    fn channels(&self) -> ChannelSet;

    /// Inner surface of the axially confining electrode: `true` beyond it.
    fn is_endcap_region(&self, coords: [f64; 3]) -> bool;

    /// Inner surface of every non-endcap electrode: `true` beyond it.
    fn is_other_region(&self, coords: [f64; 3]) -> bool;

    fn endcap_channel(&self, _coords: [f64; 3]) -> u8 {
        TRAPPING
    }

    /// Sector assignment for non-endcap electrodes. The default drives the
    /// first octant of azimuth and senses on the rest.
    fn other_channel(&self, coords: [f64; 3]) -> u8 {
        let theta = coords[1];
        if (0.0..=PI / 4.0).contains(&theta) {
            EXCITATION
        } else {
            DETECTION
        }
    }

    /// Per-variant replacement for a channel's default adjust voltage.
    fn adjust_voltage(&self, _channel: u8) -> Option<f64> {
        None
    }
}

/// Build the model grid a variant asks for.
pub fn grid_for(trap: &dyn TrapVariant, pts: usize) -> Result<Grid> {
    Grid::new(
        trap.trap_border(),
        pts,
        trap.model_border(),
        trap.coordinates() == CoordinateSystem::Cylindrical,
    )
}

/// Turns a variant's half-space predicates into per-voxel channel labels,
/// with the endcap predicate taking precedence over the generic one.
pub struct ElectrodeClassifier<'a> {
    trap: &'a dyn TrapVariant,
    width: f64,
    other_axes: &'static [usize],
}

impl<'a> ElectrodeClassifier<'a> {
    pub fn new(trap: &'a dyn TrapVariant, grid_step: f64) -> Self {
        // The endcap is always cut along z; side electrodes along both
        // transverse axes, or along r alone under cylindrical symmetry.
        let other_axes: &[usize] = match trap.coordinates() {
            CoordinateSystem::Cartesian => &[0, 1],
            CoordinateSystem::Cylindrical => &[0],
        };
        Self {
            trap,
            width: grid_step * trap.shell_width_factor(),
            other_axes,
        }
    }

    fn endcap_state(&self, coords: [f64; 3]) -> ShellState {
        shell::classify(coords, |c| self.trap.is_endcap_region(c), &[2], self.width)
    }

    fn other_state(&self, coords: [f64; 3]) -> ShellState {
        shell::classify(
            coords,
            |c| self.trap.is_other_region(c),
            self.other_axes,
            self.width,
        )
    }

    /// Channel id for an electrode voxel, `None` for vacuum. A point counts
    /// for a category only when it is on that category's shell and not past
    /// the competing category's shell.
    pub fn classify(&self, coords: [f64; 3]) -> Option<u8> {
        let endcap = self.endcap_state(coords);
        let other = self.other_state(coords);
        if endcap == ShellState::OnShell && other.within_trap() {
            return Some(self.trap.endcap_channel(coords));
        }
        if other == ShellState::OnShell && endcap.within_trap() {
            return Some(self.trap.other_channel(coords));
        }
        None
    }
}

/// Scan the whole model volume and emit the labeled geometry array.
pub fn build_geometry(trap: &dyn TrapVariant, grid: &Grid) -> PotentialArray {
    let classifier = ElectrodeClassifier::new(trap, grid.step);
    let mut pa = PotentialArray::empty(grid);
    info!(
        trap = trap.name(),
        nx = grid.shape.x,
        ny = grid.shape.y,
        nz = grid.shape.z,
        "classifying electrode volume"
    );
    for k in 0..grid.shape.z {
        for i in 0..grid.shape.x {
            for j in 0..grid.shape.y {
                if let Some(channel) = classifier.classify(grid.point(i, j, k)) {
                    pa.set_electrode(i, j, k, channel);
                }
            }
        }
    }
    debug!(electrodes = pa.electrode_count(), "volume classified");
    pa
}
