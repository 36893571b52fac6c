//! Shell classification ("cut electrode")
//!
//! Trap variants describe each electrode by its inner surface only, as a
//! half-space predicate: `true` means the point is beyond that surface. A
//! zero-thickness surface has no meaning on a voxel grid, so the predicate is
//! cut into a constant-thickness shell: a point counts as electrode when it
//! satisfies the predicate but stops satisfying it after stepping back by one
//! shell width along some subset of the perturbation axes.

/// Where a point sits relative to one electrode's cut shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellState {
    /// The predicate is false: the point is in the trap interior.
    InsideTrap,
    /// Within one shell width of the boundary crossing.
    OnShell,
    /// Beyond the shell, outside the trap.
    OutsideShell,
}

/// Classify `coords` against a half-space `boundary` predicate.
///
/// `axes` are the coordinate indices to perturb (0/1/2); the scan subtracts
/// `width` along every non-empty subset of them, so a boundary crossed
/// diagonally is still caught. One axis for a pure z-cap, two for a cartesian
/// side wall, one radial axis under cylindrical symmetry.
pub fn classify<P>(coords: [f64; 3], boundary: P, axes: &[usize], width: f64) -> ShellState
where
    P: Fn([f64; 3]) -> bool,
{
    if !boundary(coords) {
        return ShellState::InsideTrap;
    }
    debug_assert!(!axes.is_empty() && axes.len() <= 3);
    for mask in 1u32..(1 << axes.len()) {
        let mut probe = coords;
        for (bit, &axis) in axes.iter().enumerate() {
            if mask & (1 << bit) != 0 {
                probe[axis] -= width;
            }
        }
        if !boundary(probe) {
            return ShellState::OnShell;
        }
    }
    ShellState::OutsideShell
}

impl ShellState {
    /// Inside or on the shell, i.e. not past the electrode.
    pub fn within_trap(self) -> bool {
        !matches!(self, ShellState::OutsideShell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const Z0: f64 = 1.0;
    fn cap(c: [f64; 3]) -> bool {
        c[2] >= Z0
    }

    #[test]
    fn three_states_along_one_axis() {
        let w = 0.1;
        assert_eq!(classify([0.0, 0.0, 0.5], cap, &[2], w), ShellState::InsideTrap);
        assert_eq!(classify([0.0, 0.0, 1.05], cap, &[2], w), ShellState::OnShell);
        assert_eq!(
            classify([0.0, 0.0, 1.5], cap, &[2], w),
            ShellState::OutsideShell
        );
    }

    #[test]
    fn shell_thickness_matches_width() {
        let w = 0.25;
        // Just inside the shell and just beyond it.
        assert_eq!(classify([0.0, 0.0, Z0 + w * 0.99], cap, &[2], w), ShellState::OnShell);
        assert_eq!(
            classify([0.0, 0.0, Z0 + w * 1.01], cap, &[2], w),
            ShellState::OutsideShell
        );
    }

    #[test]
    fn diagonal_subset_catches_corner() {
        // Corner boundary: beyond either wall of a unit square.
        let wall = |c: [f64; 3]| c[0] >= 1.0 || c[1] >= 1.0;
        let w = 0.2;
        // Diagonally past the corner: neither single-axis probe leaves the
        // wall region, the two-axis probe does.
        let p = [1.1, 1.1, 0.0];
        assert_eq!(classify(p, wall, &[0, 1], w), ShellState::OnShell);
        assert_eq!(classify(p, wall, &[0], w), ShellState::OutsideShell);
    }

    #[test]
    fn monotone_with_distance() {
        // Moving strictly further out along the perturbation axis never goes
        // back from OutsideShell to OnShell.
        let w = 0.15;
        let mut saw_outside = false;
        for n in 0..400 {
            let z = 1.0 + n as f64 * 0.01;
            match classify([0.0, 0.0, z], cap, &[2], w) {
                ShellState::OutsideShell => saw_outside = true,
                ShellState::OnShell => assert!(!saw_outside, "shell reappeared at z={z}"),
                ShellState::InsideTrap => unreachable!(),
            }
        }
        assert!(saw_outside);
    }
}
