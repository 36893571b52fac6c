//! penning-cell: Penning-trap electrode geometry and field post-processing
//!
//! This crate provides:
//! - Voxelized electrode geometry for cubic, cylindrical and hyperbolic traps
//! - Reading and writing the solver's binary potential-array format
//! - Driving the external field solver (refine, voltage fast-adjust)
//! - Segmentation of electrodes into connected components and radial
//!   "explosion" of the assembly for inspection renders
//! - Azimuthal averaging, harmonic fits and comet-formation-time estimates
//!
//! All geometry is in meters. Potential arrays keep the solver's own
//! conventions (x-fastest voxel order, electrode encoding above the
//! maximum voltage), so files round-trip unchanged.

pub mod channel;
pub mod error;
pub mod explode;
pub mod grid;
pub mod harmonics;
pub mod pa;
pub mod sampler;
pub mod segment;
pub mod shell;
pub mod solver;
pub mod traps;

pub use channel::{Channel, ChannelSet};
pub use error::{Error, Result};
pub use explode::explode;
pub use grid::{BoundingExtents, Grid, GridShape};
pub use harmonics::{
    comet_formation_time, frequency_spread, CloudRegion, FrequencySpread, Harmonics, IonParams,
};
pub use pa::{ArraySymmetry, FieldKind, MirrorFlags, PotentialArray};
pub use sampler::{AxisymmetricMap, FieldSampler};
pub use segment::{find_components, Component};
pub use solver::{FieldStage, Solver};
pub use traps::{build_geometry, grid_for, CoordinateSystem, TrapVariant};
