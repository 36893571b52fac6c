//! Harmonic decomposition and axial-frequency dispersion
//!
//! Fits the averaged trap potential to the first even axial harmonics
//! (in coordinates normalized by the characteristic trap dimension `d`),
//! then scans the ion-cloud region for the spread of reduced-cyclotron
//! frequencies. The inverse of that spread is the time an excited ion
//! cloud needs to smear into a comet-shaped arc.

use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::sampler::AxisymmetricMap;

/// Atomic mass unit, kg.
pub const ATOMIC_MASS_KG: f64 = 1.6605e-27;
/// Elementary charge, C.
pub const ELEMENTARY_CHARGE_C: f64 = 1.602_176_62e-19;

/// Sample count per axis in the frequency scan.
const SCAN_PTS: usize = 100;

/// Even harmonic basis in normalized cylindrical coordinates.
pub fn y2(r: f64, z: f64) -> f64 {
    z * z - r * r / 2.0
}

pub fn y4(r: f64, z: f64) -> f64 {
    let (r2, z2) = (r * r, z * z);
    8.0 * z2 * z2 - 24.0 * z2 * r2 + 3.0 * r2 * r2
}

pub fn y6(r: f64, z: f64) -> f64 {
    let (r2, z2) = (r * r, z * z);
    16.0 * z2 * z2 * z2 - 120.0 * z2 * z2 * r2 + 90.0 * z2 * r2 * r2 - 5.0 * r2 * r2 * r2
}

/// Axial curvature of each basis term, up to the shared 1/d^2 factor.
fn dy2(_r: f64, _z: f64) -> f64 {
    1.0
}

fn dy4(r: f64, z: f64) -> f64 {
    48.0 * z * z - 12.0 * r * r
}

fn dy6(r: f64, z: f64) -> f64 {
    let (r2, z2) = (r * r, z * z);
    240.0 * z2 * z2 - 360.0 * z2 * r2 + 30.0 * r2 * r2
}

/// Fitted expansion coefficients of the trapping potential.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Harmonics {
    pub a0: f64,
    pub a20: f64,
    pub a40: f64,
    pub a60: f64,
}

impl Harmonics {
    /// Least-squares fit of the averaged map, coordinates normalized by `d`.
    pub fn fit(map: &AxisymmetricMap, d: f64) -> Result<Self> {
        let n = map.phi.len();
        let mut design = DMatrix::zeros(n, 4);
        let mut rhs = DVector::zeros(n);
        for (row, ((r, z), phi)) in map
            .rs
            .iter()
            .zip(map.zs.iter())
            .zip(map.phi.iter())
            .enumerate()
        {
            let (rn, zn) = (r / d, z / d);
            design[(row, 0)] = 1.0;
            design[(row, 1)] = y2(rn, zn);
            design[(row, 2)] = y4(rn, zn);
            design[(row, 3)] = y6(rn, zn);
            rhs[row] = *phi;
        }

        let svd = design.svd(true, true);
        let coeffs = svd
            .solve(&rhs, 1e-12)
            .map_err(|e| Error::LeastSquares(e.to_string()))?;
        Ok(Self {
            a0: coeffs[0],
            a20: coeffs[1],
            a40: coeffs[2],
            a60: coeffs[3],
        })
    }

    /// Potential reconstructed from the fit at normalized `(r, z)`.
    pub fn evaluate(&self, r: f64, z: f64) -> f64 {
        self.a0 + self.a20 * y2(r, z) + self.a40 * y4(r, z) + self.a60 * y6(r, z)
    }
}

/// Ion species and magnetic field of the measurement.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct IonParams {
    pub mass_amu: f64,
    pub charge_e: f64,
    pub b_field_t: f64,
}

impl Default for IonParams {
    fn default() -> Self {
        Self {
            mass_amu: 500.0,
            charge_e: 1.0,
            b_field_t: 7.0,
        }
    }
}

impl IonParams {
    pub fn mass_kg(&self) -> f64 {
        self.mass_amu * ATOMIC_MASS_KG
    }

    pub fn charge_c(&self) -> f64 {
        self.charge_e * ELEMENTARY_CHARGE_C
    }

    /// Free cyclotron frequency, rad/s.
    pub fn cyclotron_frequency(&self) -> f64 {
        self.charge_c() * self.b_field_t / self.mass_kg()
    }
}

/// Excited-cloud extent scanned for the frequency spread (meters).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CloudRegion {
    /// Mean excitation radius of the cloud center.
    pub r_excitation: f64,
    /// Radial half-width of the cloud around that center.
    pub r_cloud: f64,
    /// Axial half-extent of the cloud.
    pub z_cloud: f64,
}

impl Default for CloudRegion {
    fn default() -> Self {
        Self {
            r_excitation: 6e-3,
            r_cloud: 2e-3,
            z_cloud: 8e-3,
        }
    }
}

/// Extremes of the reduced-cyclotron frequency over the cloud region.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FrequencySpread {
    pub min: f64,
    pub max: f64,
}

impl FrequencySpread {
    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

/// Reduced-cyclotron frequency of an ion at normalized `(r, z)`, rad/s.
///
/// Returns a non-finite value where the local curvature pushes the ion
/// out of the stable regime; callers decide how to treat those points.
fn reduced_cyclotron(h: &Harmonics, ion: &IonParams, d: f64, r: f64, z: f64) -> f64 {
    let half_wc = ion.cyclotron_frequency() / 2.0;
    let curvature = h.a20 * dy2(r, z) + h.a40 * dy4(r, z) + h.a60 * dy6(r, z);
    // The 1/d^2 from the coordinate normalization rescales the whole
    // frequency, not the curvature term under the root.
    let axial = ion.charge_c() / ion.mass_kg() * curvature;
    (half_wc + (half_wc * half_wc - axial).sqrt()) / (d * d)
}

/// Scan the cloud region for the frequency extremes.
pub fn frequency_spread(
    h: &Harmonics,
    ion: &IonParams,
    cloud: &CloudRegion,
    d: f64,
) -> Result<FrequencySpread> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut skipped = 0usize;

    for ir in 0..SCAN_PTS {
        let frac = ir as f64 / (SCAN_PTS - 1) as f64;
        let r = (cloud.r_excitation - cloud.r_cloud
            + 2.0 * cloud.r_cloud * frac)
            / d;
        for iz in 0..SCAN_PTS {
            let frac = iz as f64 / (SCAN_PTS - 1) as f64;
            let z = (-cloud.z_cloud + 2.0 * cloud.z_cloud * frac) / d;
            let w = reduced_cyclotron(h, ion, d, r, z);
            if !w.is_finite() {
                skipped += 1;
                continue;
            }
            min = min.min(w);
            max = max.max(w);
        }
    }

    if skipped > 0 {
        debug!(skipped, "unstable points excluded from frequency scan");
    }
    if !min.is_finite() || !max.is_finite() {
        return Err(Error::NoStableOrbit {
            region: format!("{cloud:?}"),
        });
    }
    Ok(FrequencySpread { min, max })
}

/// Time for an initially compact cloud to spread over a full turn of
/// relative phase. `None` when the trap is perfectly harmonic over
/// the cloud and the phases never decohere.
pub fn comet_formation_time(spread: &FrequencySpread) -> Option<f64> {
    let width = spread.width();
    if width == 0.0 {
        return None;
    }
    Some(2.0 * std::f64::consts::PI / width)
}
