//! External field solver invocation
//!
//! The solver is a black box: it reads the unrefined geometry array,
//! relaxes the field (`refine`), and rescales the per-channel base solutions
//! to a concrete voltage assignment (`fastadj`). Both calls block; a nonzero
//! exit status or a missing output file is fatal for the current trap
//! configuration and is never retried here.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::info;

use crate::error::{Error, Result};

const NO_GUI_FLAG: &str = "--nogui";
const REFINE_CMD: &str = "refine";
const ADJUST_CMD: &str = "fastadj";

/// Which result file a base name currently refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStage {
    /// Geometry only, as written by the classifier.
    Unrefined,
    /// Solver output before any voltage assignment.
    Refined,
    /// Solver output for a concrete voltage assignment.
    Adjusted,
}

impl FieldStage {
    /// File extension the solver uses for this stage.
    pub fn extension(self) -> &'static str {
        match self {
            FieldStage::Unrefined => "pa#",
            // Refine and fast-adjust both live in the `.pa0` file; the
            // adjusted stage overwrites the refined one in place.
            FieldStage::Refined | FieldStage::Adjusted => "pa0",
        }
    }

    /// Path of the stage file for a trap base name (no extension).
    pub fn path_for(self, base: &Path) -> PathBuf {
        let mut name = base.file_name().unwrap_or_default().to_os_string();
        name.push(".");
        name.push(self.extension());
        base.with_file_name(name)
    }
}

/// Handle on the external solver executable.
#[derive(Debug, Clone)]
pub struct Solver {
    exe: PathBuf,
}

impl Solver {
    pub fn new(exe: impl Into<PathBuf>) -> Result<Self> {
        let exe = exe.into();
        if !exe.exists() {
            return Err(Error::InvalidConfig {
                parameter: "solver",
                value: exe.display().to_string(),
                reason: "solver executable not found",
            });
        }
        Ok(Self { exe })
    }

    /// Refine the unrefined geometry `{base}.pa#` into `{base}.pa0`.
    pub fn refine(&self, base: &Path) -> Result<PathBuf> {
        let input = FieldStage::Unrefined.path_for(base);
        self.run(REFINE_CMD, &[input.as_os_str().to_owned()])?;
        self.expect_output(REFINE_CMD, FieldStage::Refined.path_for(base))
    }

    /// Apply a `channel=voltage,...` assignment to the refined array.
    pub fn fast_adjust(&self, base: &Path, assignments: &str) -> Result<PathBuf> {
        let refined = FieldStage::Refined.path_for(base);
        if !refined.exists() {
            return Err(Error::SolverOutputMissing {
                step: ADJUST_CMD,
                path: refined,
            });
        }
        self.run(
            ADJUST_CMD,
            &[refined.as_os_str().to_owned(), assignments.into()],
        )?;
        self.expect_output(ADJUST_CMD, FieldStage::Adjusted.path_for(base))
    }

    fn run(&self, step: &'static str, args: &[std::ffi::OsString]) -> Result<()> {
        let mut cmd = Command::new(&self.exe);
        cmd.arg(NO_GUI_FLAG).arg(step).args(args);
        info!(?cmd, "invoking field solver");
        let status = cmd.status()?;
        if !status.success() {
            return Err(Error::Solver {
                step,
                status: status.to_string(),
            });
        }
        Ok(())
    }

    fn expect_output(&self, step: &'static str, path: PathBuf) -> Result<PathBuf> {
        if !path.exists() {
            return Err(Error::SolverOutputMissing { step, path });
        }
        info!(path = %path.display(), "solver output ready");
        Ok(path)
    }
}
