//! Error taxonomy for trap construction and post-processing

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Degenerate input caught before any grid or file is built.
    #[error("invalid configuration: {parameter} = {value} ({reason})")]
    InvalidConfig {
        parameter: &'static str,
        value: String,
        reason: &'static str,
    },

    /// The external solver exited with a nonzero status.
    #[error("solver {step} failed with status {status}")]
    Solver { step: &'static str, status: String },

    /// The solver finished but the expected result file never appeared.
    #[error("solver {step} produced no output file at {path}")]
    SolverOutputMissing { step: &'static str, path: PathBuf },

    /// A field query outside the interpolation-safe region of the array.
    #[error("field query at ({x}, {y}, {z}) is outside the sampled array")]
    OutOfBounds { x: f64, y: f64, z: f64 },

    /// A potential-array file that does not match the expected layout.
    #[error("malformed potential array {path}: {reason}")]
    Format { path: PathBuf, reason: String },

    /// The least-squares solve could not be completed.
    #[error("harmonic least-squares solve failed: {0}")]
    LeastSquares(String),

    /// Every sampled point of the frequency scan was dynamically unstable.
    #[error("no stable ion orbit anywhere in the scanned cloud region ({region})")]
    NoStableOrbit { region: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
