//! Writing matched slice pairs out as single-slice NIfTI files.
//!
//! Each slice keeps a one-voxel extent along the slicing axis and gets an
//! affine whose origin is moved onto that slice, so the pair overlays in
//! world space when opened in a NIfTI viewer.

use nalgebra::{Matrix4, Point4};
use ndarray::{Array3, Axis};
use nifti::writer::WriterOptions;
use nifti::NiftiHeader;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::common::SliceAxis;
use crate::error::{RbsyncError, Result};
use crate::volume::LoadedVolume;

/// Copies slice `index` out of `img`, keeping it 3D.
pub fn extract_slice(img: &Array3<f64>, index: usize, axis: SliceAxis) -> Result<Array3<f64>> {
    let a = axis.to_usize();
    let count = img.shape()[a];
    if index >= count {
        return Err(RbsyncError::InvalidIndex { index, count });
    }
    let slice = img.index_axis(Axis(a), index);
    // add back the missing axis
    Ok(slice.insert_axis(Axis(a)).to_owned())
}

/// Affine for a single slice cut out of a volume with `affine`.
pub fn slice_affine(affine: &Matrix4<f64>, index: usize, axis: SliceAxis) -> Matrix4<f64> {
    let mut voxel = Point4::new(0.0, 0.0, 0.0, 1.0);
    voxel[axis.to_usize()] = index as f64;
    let origin = affine * voxel;
    let mut shifted = *affine;
    for i in 0..3 {
        shifted[(i, 3)] = origin[i];
    }
    shifted
}

/// Slice `index` of `volume` together with the header to write it with.
pub fn prepare_slice(
    volume: &LoadedVolume,
    index: usize,
    axis: SliceAxis,
) -> Result<(Array3<f64>, NiftiHeader)> {
    let slice = extract_slice(&volume.data, index, axis)?;
    let mut slice_header: NiftiHeader = volume.header.clone();
    slice_header.set_affine(&slice_affine(volume.geometry.affine(), index, axis));
    if slice_header.sform_code == 0 {
        slice_header.sform_code = 2;
    }
    // voxel values were already scaled on load
    slice_header.scl_slope = 1.0;
    slice_header.scl_inter = 0.0;
    Ok((slice, slice_header))
}

/// File name for slice `index` of a volume called `basename`.
pub fn slice_filename(basename: &str, axis: SliceAxis, index: usize) -> String {
    format!("{basename}_axis-{axis}_slice-{index:03}.nii")
}

/// Writes an MRI slice and its atlas counterpart next to each other in
/// `output_dir`, creating the directory if needed. Both indices are checked
/// before anything is written.
pub fn write_slice_pair(
    source: (&LoadedVolume, &str),
    target: (&LoadedVolume, &str),
    source_index: usize,
    target_index: usize,
    axis: SliceAxis,
    output_dir: &Path,
) -> Result<(PathBuf, PathBuf)> {
    let (source_slice, source_header) = prepare_slice(source.0, source_index, axis)?;
    let (target_slice, target_header) = prepare_slice(target.0, target_index, axis)?;
    fs::create_dir_all(output_dir)?;
    let source_path = output_dir.join(slice_filename(source.1, axis, source_index));
    let target_path = output_dir.join(slice_filename(target.1, axis, target_index));
    WriterOptions::new(&source_path)
        .reference_header(&source_header)
        .write_nifti(&source_slice)?;
    WriterOptions::new(&target_path)
        .reference_header(&target_header)
        .write_nifti(&target_slice)?;
    info!(
        source = %source_path.display(),
        target = %target_path.display(),
        "wrote slice pair"
    );
    Ok((source_path, target_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::VolumeGeometry;
    use crate::volume::load_volume;
    use tempfile::TempDir;

    #[test]
    fn extracted_slice_keeps_three_dimensions() {
        let img = Array3::<f64>::from_shape_fn((4, 5, 6), |(i, j, k)| (i * 100 + j * 10 + k) as f64);
        let slice = extract_slice(&img, 2, SliceAxis::LR).unwrap();
        assert_eq!(slice.shape(), &[4, 1, 6]);
        assert_eq!(slice[[3, 0, 5]], 325.0);
        assert!(extract_slice(&img, 6, SliceAxis::SI).is_err());
    }

    #[test]
    fn slice_affine_moves_origin() {
        let mut affine = Matrix4::identity();
        affine[(2, 2)] = 2.0;
        affine[(2, 3)] = -10.0;
        let shifted = slice_affine(&affine, 3, SliceAxis::SI);
        assert_eq!(shifted[(2, 3)], -4.0);
        assert_eq!(shifted[(2, 2)], 2.0);
        assert_eq!(shifted[(0, 3)], 0.0);
    }

    fn small_volume() -> LoadedVolume {
        let data = Array3::<f64>::from_shape_fn((3, 3, 4), |(_, _, k)| k as f64);
        LoadedVolume {
            geometry: VolumeGeometry::new([3, 3, 4], Matrix4::identity()).unwrap(),
            data,
            header: NiftiHeader::default(),
        }
    }

    #[test]
    fn writes_pair_that_reloads() {
        let dir = TempDir::new().unwrap();
        let volume = small_volume();
        let (mri, atlas) = write_slice_pair(
            (&volume, "mri"),
            (&volume, "atlas"),
            1,
            2,
            SliceAxis::SI,
            &dir.path().join("pairs"),
        )
        .unwrap();
        assert!(mri.ends_with("mri_axis-SI_slice-001.nii"));
        let reloaded = load_volume(&atlas).unwrap();
        assert_eq!(reloaded.geometry.shape(), [3, 3, 1]);
        assert_eq!(reloaded.data[[0, 0, 0]], 2.0);
    }

    #[test]
    fn bad_atlas_index_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let volume = small_volume();
        let out = dir.path().join("pairs");
        let err = write_slice_pair(
            (&volume, "mri"),
            (&volume, "atlas"),
            1,
            99,
            SliceAxis::SI,
            &out,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RbsyncError::InvalidIndex {
                index: 99,
                count: 4
            }
        ));
        assert!(!out.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
