//! Connected-component segmentation of the electrode volume
//!
//! Partitions electrode voxels into maximal same-channel components under
//! 26-connectivity. Traversal is an explicit work queue with a visited set
//! and a gray (already enqueued) set; large components would overflow the
//! stack under recursion.

use std::collections::{HashSet, VecDeque};

use tracing::debug;

use crate::pa::PotentialArray;

/// Components smaller than this are classification noise and are dropped.
pub const MIN_COMPONENT_SIZE: usize = 20;

/// Signed voxel index; negative values address mirror images of the stored
/// non-negative octant.
pub type Voxel = (i64, i64, i64);

/// One electrode: a connected same-channel set of voxels.
#[derive(Debug, Clone)]
pub struct Component {
    pub voxels: HashSet<Voxel>,
    pub channel: u8,
}

impl Component {
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }
}

/// Channel of a (possibly mirrored) voxel, `None` for vacuum or out of range.
fn channel_at(pa: &PotentialArray, v: Voxel) -> Option<u8> {
    let (i, j, k) = (v.0.unsigned_abs() as usize, v.1.unsigned_abs() as usize, v.2.unsigned_abs() as usize);
    if !pa.in_bounds(i, j, k) {
        return None;
    }
    pa.channel(i, j, k)
}

/// Find all electrode components of the array.
///
/// With `mirrored` set, traversal additionally seeds from the eight
/// sign-mirrored images of every stored voxel, recovering full-space
/// components from the octant representation.
pub fn find_components(pa: &PotentialArray, min_size: usize, mirrored: bool) -> Vec<Component> {
    let mut visited: HashSet<Voxel> = HashSet::new();
    let mut components = Vec::new();

    let mut try_seed = |seed: Voxel, visited: &mut HashSet<Voxel>, out: &mut Vec<Component>| {
        if visited.contains(&seed) {
            return;
        }
        let Some(channel) = channel_at(pa, seed) else {
            return;
        };
        let voxels = flood_fill(pa, seed, channel, visited);
        if voxels.len() >= min_size {
            out.push(Component { voxels, channel });
        } else {
            debug!(size = voxels.len(), channel, "dropping noise component");
        }
    };

    for k in 0..pa.nz as i64 {
        for i in 0..pa.nx as i64 {
            for j in 0..pa.ny as i64 {
                try_seed((i, j, k), &mut visited, &mut components);
            }
        }
    }

    if mirrored {
        for k in 0..pa.nz as i64 {
            for i in 0..pa.nx as i64 {
                for j in 0..pa.ny as i64 {
                    for &si in &[-1, 1] {
                        for &sj in &[-1, 1] {
                            for &sk in &[-1, 1] {
                                try_seed((i * si, j * sj, k * sk), &mut visited, &mut components);
                            }
                        }
                    }
                }
            }
        }
    }

    components
}

/// Breadth-first fill of one same-channel component starting at `seed`.
/// Voxels of other channels act as walls: they are neither visited nor
/// enqueued, so they can later seed their own component.
fn flood_fill(
    pa: &PotentialArray,
    seed: Voxel,
    channel: u8,
    visited: &mut HashSet<Voxel>,
) -> HashSet<Voxel> {
    let mut component = HashSet::new();
    let mut gray: HashSet<Voxel> = HashSet::new();
    let mut queue: VecDeque<Voxel> = VecDeque::new();
    gray.insert(seed);
    queue.push_back(seed);

    while let Some(v) = queue.pop_front() {
        if visited.contains(&v) {
            continue;
        }
        match channel_at(pa, v) {
            Some(c) if c == channel => {}
            _ => continue,
        }
        visited.insert(v);
        component.insert(v);

        for di in -1..=1 {
            for dj in -1..=1 {
                for dk in -1..=1 {
                    if di == 0 && dj == 0 && dk == 0 {
                        continue;
                    }
                    let n = (v.0 + di, v.1 + dj, v.2 + dk);
                    if !visited.contains(&n) && gray.insert(n) {
                        queue.push_back(n);
                    }
                }
            }
        }
    }

    component
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{BoundingExtents, Grid};

    fn blank(n: usize) -> PotentialArray {
        let grid = Grid::new(BoundingExtents::cube(1.0), n, None, false).unwrap();
        PotentialArray::empty(&grid)
    }

    /// Fill an axis-aligned box of voxels with one channel.
    fn fill_box(pa: &mut PotentialArray, lo: [usize; 3], hi: [usize; 3], channel: u8) {
        for k in lo[2]..=hi[2] {
            for j in lo[1]..=hi[1] {
                for i in lo[0]..=hi[0] {
                    pa.set_electrode(i, j, k, channel);
                }
            }
        }
    }

    #[test]
    fn separate_boxes_become_separate_components() {
        let mut pa = blank(20);
        fill_box(&mut pa, [0, 0, 0], [2, 2, 2], 1);
        fill_box(&mut pa, [10, 10, 10], [12, 12, 12], 2);
        let comps = find_components(&pa, 1, false);
        assert_eq!(comps.len(), 2);
        let total: usize = comps.iter().map(Component::len).sum();
        assert_eq!(total, 27 * 2);
    }

    #[test]
    fn touching_boxes_of_different_channels_stay_apart() {
        let mut pa = blank(20);
        fill_box(&mut pa, [0, 0, 0], [3, 3, 3], 1);
        fill_box(&mut pa, [4, 0, 0], [7, 3, 3], 2);
        let comps = find_components(&pa, 1, false);
        assert_eq!(comps.len(), 2);
        let channels: HashSet<u8> = comps.iter().map(|c| c.channel).collect();
        assert_eq!(channels, HashSet::from([1, 2]));
    }

    #[test]
    fn diagonal_contact_is_connected() {
        let mut pa = blank(20);
        pa.set_electrode(5, 5, 5, 3);
        pa.set_electrode(6, 6, 6, 3);
        let comps = find_components(&pa, 1, false);
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].len(), 2);
    }

    #[test]
    fn noise_below_threshold_is_dropped() {
        let mut pa = blank(20);
        fill_box(&mut pa, [0, 0, 0], [2, 2, 2], 1); // 27 voxels
        pa.set_electrode(15, 15, 15, 1); // isolated speck
        let comps = find_components(&pa, MIN_COMPONENT_SIZE, false);
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].len(), 27);
    }

    #[test]
    fn partition_law() {
        let mut pa = blank(16);
        fill_box(&mut pa, [0, 0, 0], [4, 4, 1], 1);
        fill_box(&mut pa, [8, 8, 8], [12, 12, 9], 2);
        let comps = find_components(&pa, 1, false);

        let mut seen: HashSet<Voxel> = HashSet::new();
        let mut electrode_total = 0;
        for comp in &comps {
            for v in &comp.voxels {
                assert!(seen.insert(*v), "voxel {v:?} in two components");
            }
        }
        for k in 0..pa.nz {
            for j in 0..pa.ny {
                for i in 0..pa.nx {
                    if pa.is_electrode(i, j, k) {
                        electrode_total += 1;
                    }
                }
            }
        }
        assert_eq!(seen.len(), electrode_total);
    }

    #[test]
    fn mirror_seeding_recovers_sign_images() {
        let mut pa = blank(16);
        fill_box(&mut pa, [3, 3, 3], [5, 5, 5], 1);
        let base_only = find_components(&pa, 1, false);
        assert_eq!(base_only.len(), 1);

        // With mirror seeding the eight sign images appear as well; the
        // stored octant is visited first, so each image is its own
        // component with the base channel.
        let comps = find_components(&pa, 1, true);
        assert_eq!(comps.len(), 8);
        assert!(comps.iter().all(|c| c.channel == 1 && c.len() == 27));
        assert!(comps
            .iter()
            .any(|c| c.voxels.contains(&(-3, -3, -3))));
    }
}
