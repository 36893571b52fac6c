//! Cubic trap: six plates at `|x|, |y|, |z| = size`

use crate::channel::{ChannelSet, DETECTION, EXCITATION};
use crate::grid::BoundingExtents;

use super::{CoordinateSystem, TrapVariant};

/// Cube of half-side `size` with endcaps at `z = +/-size`, detection plates
/// on x and excitation plates on y.
#[derive(Debug, Clone)]
pub struct CubicTrap {
    size: f64,
}

impl CubicTrap {
    pub fn new(size: f64) -> Self {
        Self { size }
    }
}

impl TrapVariant for CubicTrap {
    fn name(&self) -> &'static str {
        "cubic"
    }

    fn trap_border(&self) -> BoundingExtents {
        BoundingExtents::cube(self.size)
    }

    fn coordinates(&self) -> CoordinateSystem {
        CoordinateSystem::Cartesian
    }

    fn channels(&self) -> ChannelSet {
        ChannelSet::trapped()
    }

    fn is_endcap_region(&self, coords: [f64; 3]) -> bool {
        coords[2] >= self.size
    }

    fn is_other_region(&self, coords: [f64; 3]) -> bool {
        coords[0] >= self.size || coords[1] >= self.size
    }

    fn other_channel(&self, coords: [f64; 3]) -> u8 {
        if coords[0] >= self.size {
            DETECTION
        } else {
            EXCITATION
        }
    }
}
