use nalgebra::Point3;

use crate::common::SliceAxis;
use crate::error::Result;
use crate::geometry::VolumeGeometry;

/// Physical location of one slice of a volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlicePosition {
    pub index: usize,
    pub axis: SliceAxis,
    /// world coordinate (mm) of the slice's representative voxel
    pub world: Point3<f64>,
}

impl SlicePosition {
    pub fn compute(geometry: &VolumeGeometry, index: usize, axis: SliceAxis) -> Result<Self> {
        let world = geometry.voxel_to_world(index, axis)?;
        Ok(Self { index, axis, world })
    }

    /// World coordinate component on the slicing axis, the single number
    /// shown to users next to a slice.
    pub fn along_axis(&self) -> f64 {
        self.world[self.axis.to_usize()]
    }

    /// Euclidean distance in mm to another world point.
    pub fn distance_to(&self, other: &Point3<f64>) -> f64 {
        nalgebra::distance(&self.world, other)
    }
}

/// Positions of every slice of `geometry` along `axis`, in index order.
pub fn slice_positions(geometry: &VolumeGeometry, axis: SliceAxis) -> Result<Vec<SlicePosition>> {
    (0..geometry.slice_count(axis))
        .map(|i| SlicePosition::compute(geometry, i, axis))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Matrix4;

    #[test]
    fn positions_follow_slice_spacing() {
        let mut affine = Matrix4::identity();
        affine[(2, 2)] = 1.5;
        affine[(2, 3)] = -3.0;
        let geom = VolumeGeometry::new([8, 8, 4], affine).unwrap();
        let positions = slice_positions(&geom, SliceAxis::SI).unwrap();
        let along: Vec<f64> = positions.iter().map(SlicePosition::along_axis).collect();
        assert_eq!(along, vec![-3.0, -1.5, 0.0, 1.5]);
        assert_eq!(positions[2].index, 2);
    }

    #[test]
    fn distance_is_euclidean() {
        let geom = VolumeGeometry::new([4, 4, 4], Matrix4::identity()).unwrap();
        let pos = SlicePosition::compute(&geom, 0, SliceAxis::SI).unwrap();
        // representative voxel is (2, 2, 0)
        let d = pos.distance_to(&Point3::new(5.0, 6.0, 0.0));
        assert_eq!(d, 5.0);
    }
}
