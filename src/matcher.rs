//! Nearest-slice search between two independently sampled volumes.
//!
//! Matching uses only the volumes' affines: a source slice is paired with the
//! target slice whose representative voxel lies closest in world space.
//! Nothing here touches a [`MappingStore`](crate::mapping::MappingStore);
//! callers decide what to record.

use nalgebra::Point3;
use tracing::debug;

use crate::common::SliceAxis;
use crate::error::Result;
use crate::geometry::VolumeGeometry;
use crate::position::SlicePosition;

/// Best target slice for a source position and its residual distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceMatch {
    pub index: usize,
    pub distance_mm: f64,
}

/// Finds the target slice closest to `source_world`.
///
/// Linear scan over every target slice; ties keep the lowest index.
pub fn find_best_match(
    source_world: &Point3<f64>,
    target: &VolumeGeometry,
    target_axis: SliceAxis,
) -> Result<SliceMatch> {
    let mut best = SliceMatch {
        index: 0,
        distance_mm: f64::INFINITY,
    };
    for t in 0..target.slice_count(target_axis) {
        let candidate = SlicePosition::compute(target, t, target_axis)?;
        let distance = candidate.distance_to(source_world);
        // strict comparison: an equal distance later on never wins
        if distance < best.distance_mm {
            best = SliceMatch {
                index: t,
                distance_mm: distance,
            };
        }
    }
    Ok(best)
}

/// Matches one source slice against the target volume.
pub fn match_slice(
    source: &VolumeGeometry,
    source_index: usize,
    target: &VolumeGeometry,
    axis: SliceAxis,
) -> Result<SliceMatch> {
    let position = SlicePosition::compute(source, source_index, axis)?;
    let found = find_best_match(&position.world, target, axis)?;
    debug!(
        source_index,
        world_mm = position.along_axis(),
        target_index = found.index,
        distance_mm = found.distance_mm,
        "matched slice"
    );
    Ok(found)
}

/// Matches every source slice along `axis`.
///
/// Each source slice is independent, so this is the search half of a
/// "match all" sweep; the results are written to a store afterwards.
pub fn match_all(
    source: &VolumeGeometry,
    target: &VolumeGeometry,
    axis: SliceAxis,
) -> Result<Vec<(usize, SliceMatch)>> {
    (0..source.slice_count(axis))
        .map(|i| match_slice(source, i, target, axis).map(|m| (i, m)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Matrix4;

    fn z_spaced(depth: usize, spacing: f64, origin: f64) -> VolumeGeometry {
        let mut affine = Matrix4::identity();
        affine[(2, 2)] = spacing;
        affine[(2, 3)] = origin;
        VolumeGeometry::new([4, 4, depth], affine).unwrap()
    }

    #[test]
    fn finds_nearest_slice() {
        let target = z_spaced(20, 0.5, 0.0);
        // in-plane midpoint of target is (2, 2)
        let found = find_best_match(&Point3::new(2.0, 2.0, 3.1), &target, SliceAxis::SI).unwrap();
        assert_eq!(found.index, 6);
        assert!((found.distance_mm - 0.1).abs() < 1e-12);
    }

    #[test]
    fn ties_keep_lowest_index() {
        let target = z_spaced(4, 1.0, 0.0);
        // exactly halfway between slices 1 and 2
        let found = find_best_match(&Point3::new(2.0, 2.0, 1.5), &target, SliceAxis::SI).unwrap();
        assert_eq!(found.index, 1);
        assert_eq!(found.distance_mm, 0.5);
    }

    #[test]
    fn clamps_to_edge_when_outside_target() {
        let target = z_spaced(5, 1.0, 0.0);
        let found = find_best_match(&Point3::new(2.0, 2.0, 100.0), &target, SliceAxis::SI).unwrap();
        assert_eq!(found.index, 4);
        assert_eq!(found.distance_mm, 96.0);
    }

    #[test]
    fn volume_matches_itself() {
        let geom = z_spaced(9, 2.5, -7.0);
        for (i, m) in match_all(&geom, &geom, SliceAxis::SI).unwrap() {
            assert_eq!(m.index, i);
            assert_eq!(m.distance_mm, 0.0);
        }
    }

    #[test]
    fn invalid_source_index_is_reported() {
        let geom = z_spaced(3, 1.0, 0.0);
        assert!(match_slice(&geom, 3, &geom, SliceAxis::SI).is_err());
    }
}
