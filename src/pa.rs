//! Potential array file ("PA")
//!
//! The geometry/result file the external field solver understands. One raw
//! little-endian `f64` per voxel, x fastest; an electrode point stores its
//! channel id (or, after refine, its potential) offset by `2 * max_voltage`
//! so that vacuum and electrode values never overlap. The header layout is
//! fixed by the solver and must round-trip unchanged.
//!
//! Header, little endian:
//! `mode:i32 (-1)`, `symmetry:i32`, `max_voltage:f64`, `nx:i32`, `ny:i32`,
//! `nz:i32`, `mirror:i32` (bit 0 = x, 1 = y, 2 = z), `field:i32`, `ng:i32`,
//! `dx:f64`, `dy:f64`, `dz:f64`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::grid::Grid;

pub const PA_MODE: i32 = -1;
pub const DEFAULT_MAX_VOLTAGE: f64 = 100_000.0;
/// Scaling factor for magnetic arrays; carried but unused for electrostatic.
pub const DEFAULT_NG: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArraySymmetry {
    Planar,
    Cylindrical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Electrostatic,
    Magnetic,
}

/// Which axes the stored octant is mirrored across.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirrorFlags {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl MirrorFlags {
    pub const XYZ: Self = Self { x: true, y: true, z: true };

    fn to_bits(self) -> i32 {
        (self.x as i32) | (self.y as i32) << 1 | (self.z as i32) << 2
    }

    fn from_bits(bits: i32) -> Self {
        Self {
            x: bits & 1 != 0,
            y: bits & 2 != 0,
            z: bits & 4 != 0,
        }
    }
}

/// A sampled scalar field plus electrode labeling on the model grid.
#[derive(Debug, Clone)]
pub struct PotentialArray {
    pub symmetry: ArraySymmetry,
    pub field: FieldKind,
    pub mirror: MirrorFlags,
    pub max_voltage: f64,
    pub ng: i32,
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    /// Grid unit size per axis, meters.
    pub step: [f64; 3],
    data: Vec<f64>,
}

impl PotentialArray {
    /// Empty (all vacuum, zero potential) array over a model grid. The grid
    /// stores the non-negative octant, so all three mirror flags are set.
    pub fn empty(grid: &Grid) -> Self {
        let shape = grid.shape;
        Self {
            symmetry: ArraySymmetry::Planar,
            field: FieldKind::Electrostatic,
            mirror: MirrorFlags::XYZ,
            max_voltage: DEFAULT_MAX_VOLTAGE,
            ng: DEFAULT_NG,
            nx: shape.x,
            ny: shape.y,
            nz: shape.z,
            step: [grid.step; 3],
            data: vec![0.0; shape.voxels()],
        }
    }

    #[inline]
    fn index(&self, i: usize, j: usize, k: usize) -> usize {
        k * self.ny * self.nx + j * self.nx + i
    }

    #[inline]
    pub fn in_bounds(&self, i: usize, j: usize, k: usize) -> bool {
        i < self.nx && j < self.ny && k < self.nz
    }

    /// Raw stored value (electrode offset included).
    pub fn raw(&self, i: usize, j: usize, k: usize) -> f64 {
        self.data[self.index(i, j, k)]
    }

    pub fn is_electrode(&self, i: usize, j: usize, k: usize) -> bool {
        self.raw(i, j, k) > self.max_voltage
    }

    /// Potential (or, on an unrefined array, channel id) with the electrode
    /// offset removed.
    pub fn potential(&self, i: usize, j: usize, k: usize) -> f64 {
        let raw = self.raw(i, j, k);
        if raw > self.max_voltage {
            raw - 2.0 * self.max_voltage
        } else {
            raw
        }
    }

    /// Channel id of an electrode voxel, `None` for vacuum.
    pub fn channel(&self, i: usize, j: usize, k: usize) -> Option<u8> {
        self.is_electrode(i, j, k)
            .then(|| self.potential(i, j, k).round() as u8)
    }

    /// Mark a voxel as electrode on the given channel.
    pub fn set_electrode(&mut self, i: usize, j: usize, k: usize, channel: u8) {
        let idx = self.index(i, j, k);
        self.data[idx] = channel as f64 + 2.0 * self.max_voltage;
    }

    pub fn set_potential(&mut self, i: usize, j: usize, k: usize, value: f64) {
        let idx = self.index(i, j, k);
        self.data[idx] = value;
    }

    /// Reset every voxel to vacuum, keeping the metadata.
    pub fn clear_points(&mut self) {
        self.data.fill(0.0);
    }

    pub fn electrode_count(&self) -> usize {
        self.data.iter().filter(|&&v| v > self.max_voltage).count()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        w.write_all(&PA_MODE.to_le_bytes())?;
        w.write_all(&(matches!(self.symmetry, ArraySymmetry::Cylindrical) as i32).to_le_bytes())?;
        w.write_all(&self.max_voltage.to_le_bytes())?;
        w.write_all(&(self.nx as i32).to_le_bytes())?;
        w.write_all(&(self.ny as i32).to_le_bytes())?;
        w.write_all(&(self.nz as i32).to_le_bytes())?;
        w.write_all(&self.mirror.to_bits().to_le_bytes())?;
        w.write_all(&(matches!(self.field, FieldKind::Magnetic) as i32).to_le_bytes())?;
        w.write_all(&self.ng.to_le_bytes())?;
        for s in self.step {
            w.write_all(&s.to_le_bytes())?;
        }
        for v in &self.data {
            w.write_all(&v.to_le_bytes())?;
        }
        w.flush()?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let mut r = BufReader::new(File::open(path)?);
        let format_err = |reason: String| Error::Format {
            path: path.to_path_buf(),
            reason,
        };

        let mode = read_i32(&mut r)?;
        if mode != PA_MODE {
            return Err(format_err(format!("unexpected mode {mode}, expected {PA_MODE}")));
        }
        let symmetry = match read_i32(&mut r)? {
            0 => ArraySymmetry::Planar,
            1 => ArraySymmetry::Cylindrical,
            other => return Err(format_err(format!("unknown symmetry tag {other}"))),
        };
        let max_voltage = read_f64(&mut r)?;
        let nx = read_dim(&mut r, path, "nx")?;
        let ny = read_dim(&mut r, path, "ny")?;
        let nz = read_dim(&mut r, path, "nz")?;
        let mirror = MirrorFlags::from_bits(read_i32(&mut r)?);
        let field = match read_i32(&mut r)? {
            0 => FieldKind::Electrostatic,
            1 => FieldKind::Magnetic,
            other => return Err(format_err(format!("unknown field tag {other}"))),
        };
        let ng = read_i32(&mut r)?;
        let step = [read_f64(&mut r)?, read_f64(&mut r)?, read_f64(&mut r)?];

        let total = nx * ny * nz;
        let mut data = Vec::with_capacity(total);
        for _ in 0..total {
            data.push(read_f64(&mut r)?);
        }
        // Trailing bytes mean the header dimensions lied.
        let mut probe = [0u8; 1];
        if r.read(&mut probe)? != 0 {
            return Err(format_err(format!(
                "file longer than {nx}x{ny}x{nz} declared points"
            )));
        }

        Ok(Self {
            symmetry,
            field,
            mirror,
            max_voltage,
            ng,
            nx,
            ny,
            nz,
            step,
            data,
        })
    }
}

fn read_i32<R: Read>(r: &mut R) -> Result<i32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_f64<R: Read>(r: &mut R) -> Result<f64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

fn read_dim<R: Read>(r: &mut R, path: &Path, name: &str) -> Result<usize> {
    let v = read_i32(r)?;
    if v <= 0 {
        return Err(Error::Format {
            path: path.to_path_buf(),
            reason: format!("non-positive dimension {name} = {v}"),
        });
    }
    Ok(v as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::BoundingExtents;

    fn small_grid() -> Grid {
        Grid::new(BoundingExtents::cube(1.0), 4, None, false).unwrap()
    }

    #[test]
    fn electrode_offset_encoding() {
        let grid = small_grid();
        let mut pa = PotentialArray::empty(&grid);
        assert!(!pa.is_electrode(1, 1, 1));
        pa.set_electrode(1, 1, 1, 3);
        assert!(pa.is_electrode(1, 1, 1));
        assert_eq!(pa.channel(1, 1, 1), Some(3));
        assert_eq!(pa.potential(1, 1, 1), 3.0);
        assert_eq!(pa.channel(0, 0, 0), None);
    }

    #[test]
    fn save_load_round_trip() {
        let grid = small_grid();
        let mut pa = PotentialArray::empty(&grid);
        pa.set_electrode(0, 1, 2, 1);
        pa.set_electrode(2, 2, 2, 4);
        pa.set_potential(1, 0, 0, -12.5);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.pa#");
        pa.save(&path).unwrap();

        let loaded = PotentialArray::load(&path).unwrap();
        assert_eq!(loaded.nx, pa.nx);
        assert_eq!(loaded.mirror, MirrorFlags::XYZ);
        assert_eq!(loaded.step, pa.step);
        assert_eq!(loaded.channel(0, 1, 2), Some(1));
        assert_eq!(loaded.channel(2, 2, 2), Some(4));
        assert_eq!(loaded.potential(1, 0, 0), -12.5);
        assert_eq!(loaded.electrode_count(), 2);
    }

    #[test]
    fn truncated_file_is_a_format_error() {
        let grid = small_grid();
        let pa = PotentialArray::empty(&grid);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trunc.pa#");
        pa.save(&path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 9]).unwrap();
        assert!(PotentialArray::load(&path).is_err());
    }
}
