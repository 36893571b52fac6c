//! Hyperbolic trap: the classical `2z^2 - r^2` endcap and ring surfaces

use crate::channel::{ChannelSet, DETECTION, EXCITATION, TRAPPING};
use crate::grid::BoundingExtents;

use super::{CoordinateSystem, TrapVariant};

/// Endcaps on `2z^2 - r^2 = 2 z0^2`, ring on `r^2 - 2z^2 = a^2`, both
/// truncated at `r_max = 1.5 a`. The hyperbolae open wide, so the model
/// border is 3x the characteristic lengths instead of the default 1.5x.
#[derive(Debug, Clone)]
pub struct HyperbolicTrap {
    z0: f64,
    a: f64,
    r_max: f64,
}

impl HyperbolicTrap {
    pub fn new(z0: f64, a: f64) -> Self {
        Self {
            z0,
            a,
            r_max: 1.5 * a,
        }
    }
}

impl TrapVariant for HyperbolicTrap {
    fn name(&self) -> &'static str {
        "hyperbolic"
    }

    fn trap_border(&self) -> BoundingExtents {
        BoundingExtents::new(self.a, self.a, self.z0)
    }

    fn model_border(&self) -> Option<BoundingExtents> {
        Some(BoundingExtents::new(3.0 * self.a, 3.0 * self.a, 3.0 * self.z0))
    }

    fn coordinates(&self) -> CoordinateSystem {
        CoordinateSystem::Cylindrical
    }

    fn channels(&self) -> ChannelSet {
        ChannelSet::trapped()
    }

    fn is_endcap_region(&self, coords: [f64; 3]) -> bool {
        let [r, _, z] = coords;
        if r > self.r_max {
            return false;
        }
        2.0 * z * z - r * r >= 2.0 * self.z0 * self.z0
    }

    fn is_other_region(&self, coords: [f64; 3]) -> bool {
        let [r, _, z] = coords;
        if r > self.r_max {
            return false;
        }
        r * r - 2.0 * z * z >= self.a * self.a
    }

    fn adjust_voltage(&self, channel: u8) -> Option<f64> {
        // Empirically tuned trapping voltage for this geometry family.
        match channel {
            EXCITATION | DETECTION => Some(0.0),
            TRAPPING => Some(3.0 * 0.223 * 0.988),
            _ => None,
        }
    }
}
