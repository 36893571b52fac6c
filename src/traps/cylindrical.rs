//! Cylindrical trap: a tube of radius `a` capped at `|z| = z0`

use crate::channel::ChannelSet;
use crate::grid::BoundingExtents;

use super::{CoordinateSystem, TrapVariant};

#[derive(Debug, Clone)]
pub struct CylindricalTrap {
    z0: f64,
    a: f64,
}

impl CylindricalTrap {
    pub fn new(z0: f64, a: f64) -> Self {
        Self { z0, a }
    }
}

impl TrapVariant for CylindricalTrap {
    fn name(&self) -> &'static str {
        "cylindrical"
    }

    fn trap_border(&self) -> BoundingExtents {
        BoundingExtents::new(self.a, self.a, self.z0)
    }

    fn coordinates(&self) -> CoordinateSystem {
        CoordinateSystem::Cylindrical
    }

    fn channels(&self) -> ChannelSet {
        ChannelSet::trapped()
    }

    fn is_endcap_region(&self, coords: [f64; 3]) -> bool {
        coords[2] >= self.z0
    }

    fn is_other_region(&self, coords: [f64; 3]) -> bool {
        let r = coords[0];
        r * r >= self.a * self.a
    }
}
