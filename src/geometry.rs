//! Shape and voxel-to-world transform of a 3D volume.

use nalgebra::{Matrix4, Point3, Point4};

use crate::common::SliceAxis;
use crate::error::{RbsyncError, Result};

/// Grid shape and voxel→world affine of a loaded volume.
///
/// The affine maps homogeneous voxel indices `(i, j, k, 1)` to physical
/// coordinates in millimetres. It is fixed at construction. Whether shape and
/// affine actually describe the same image is up to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeGeometry {
    shape: [usize; 3],
    affine: Matrix4<f64>,
}

impl VolumeGeometry {
    pub fn new(shape: [usize; 3], affine: Matrix4<f64>) -> Result<Self> {
        for axis in SliceAxis::ALL {
            if shape[axis.to_usize()] == 0 {
                return Err(RbsyncError::EmptyDimension { axis });
            }
        }
        Ok(Self { shape, affine })
    }

    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    pub fn affine(&self) -> &Matrix4<f64> {
        &self.affine
    }

    /// Number of slices along `axis`.
    pub fn slice_count(&self, axis: SliceAxis) -> usize {
        self.shape[axis.to_usize()]
    }

    /// Voxel standing in for a whole slice: the slicing axis set to `index`,
    /// every other axis at `floor(dim / 2)`.
    pub fn representative_voxel(&self, index: usize, axis: SliceAxis) -> Result<Point4<f64>> {
        let count = self.slice_count(axis);
        if index >= count {
            return Err(RbsyncError::InvalidIndex { index, count });
        }
        let mut voxel = Point4::new(
            (self.shape[0] / 2) as f64,
            (self.shape[1] / 2) as f64,
            (self.shape[2] / 2) as f64,
            1.0,
        );
        voxel[axis.to_usize()] = index as f64;
        Ok(voxel)
    }

    /// Physical position (mm) of slice `index` along `axis`.
    ///
    /// This samples a single point at the in-plane midpoint rather than
    /// averaging over the slice plane, so it differs from the true plane
    /// centroid when the affine carries shear.
    pub fn voxel_to_world(&self, index: usize, axis: SliceAxis) -> Result<Point3<f64>> {
        let voxel = self.representative_voxel(index, axis)?;
        let world = self.affine * voxel;
        let w = if world[3] != 0.0 { world[3] } else { 1.0 };
        Ok(Point3::new(world[0] / w, world[1] / w, world[2] / w))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scaled(spacing: [f64; 3], origin: [f64; 3]) -> Matrix4<f64> {
        let mut affine = Matrix4::identity();
        for i in 0..3 {
            affine[(i, i)] = spacing[i];
            affine[(i, 3)] = origin[i];
        }
        affine
    }

    #[test]
    fn identity_affine_returns_voxel_coordinates() {
        let geom = VolumeGeometry::new([10, 20, 5], Matrix4::identity()).unwrap();
        let p = geom.voxel_to_world(3, SliceAxis::SI).unwrap();
        assert_eq!(p, Point3::new(5.0, 10.0, 3.0));
        let p = geom.voxel_to_world(7, SliceAxis::AP).unwrap();
        assert_eq!(p, Point3::new(7.0, 10.0, 2.0));
    }

    #[test]
    fn odd_dimensions_use_floor_midpoint() {
        let geom = VolumeGeometry::new([11, 7, 3], Matrix4::identity()).unwrap();
        let p = geom.voxel_to_world(0, SliceAxis::LR).unwrap();
        assert_eq!(p, Point3::new(5.0, 0.0, 1.0));
    }

    #[test]
    fn applies_spacing_and_origin() {
        let geom = VolumeGeometry::new([4, 4, 10], scaled([0.5, 0.5, 2.0], [-1.0, -1.0, -10.0]))
            .unwrap();
        let p = geom.voxel_to_world(4, SliceAxis::SI).unwrap();
        assert_eq!(p, Point3::new(0.0, 0.0, -2.0));
    }

    #[test]
    fn homogeneous_scale_is_normalized() {
        let mut affine = Matrix4::identity();
        affine[(3, 3)] = 2.0;
        let geom = VolumeGeometry::new([2, 2, 4], affine).unwrap();
        let p = geom.voxel_to_world(2, SliceAxis::SI).unwrap();
        assert_eq!(p, Point3::new(0.5, 0.5, 1.0));
    }

    #[test]
    fn rejects_out_of_range_index() {
        let geom = VolumeGeometry::new([4, 4, 10], Matrix4::identity()).unwrap();
        let err = geom.voxel_to_world(10, SliceAxis::SI).unwrap_err();
        assert!(matches!(
            err,
            RbsyncError::InvalidIndex {
                index: 10,
                count: 10
            }
        ));
    }

    #[test]
    fn rejects_zero_extent() {
        let err = VolumeGeometry::new([4, 0, 10], Matrix4::identity()).unwrap_err();
        assert!(matches!(
            err,
            RbsyncError::EmptyDimension {
                axis: SliceAxis::LR
            }
        ));
    }
}
