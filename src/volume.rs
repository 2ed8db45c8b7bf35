//! Reading NIfTI volumes into geometry (and optionally voxel data).

use ndarray::{Array3, Axis, Ix3};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use std::path::Path;
use tracing::info;

use crate::error::{RbsyncError, Result};
use crate::geometry::VolumeGeometry;

/// A volume read fully into memory.
#[derive(Debug, Clone)]
pub struct LoadedVolume {
    pub geometry: VolumeGeometry,
    pub data: Array3<f64>,
    pub header: NiftiHeader,
}

/// Geometry described by a NIfTI header.
///
/// Only the three spatial dimensions count; a 4D series (one volume per
/// diffusion direction or time point) shares a single affine.
pub fn geometry_from_header(header: &NiftiHeader) -> Result<VolumeGeometry> {
    let dim = header.dim;
    let ndim = dim[0] as usize;
    if !(3..=7).contains(&ndim) {
        return Err(RbsyncError::NotThreeDimensional { ndim });
    }
    let shape = [dim[1] as usize, dim[2] as usize, dim[3] as usize];
    VolumeGeometry::new(shape, header.affine::<f64>())
}

/// Reads only the header of a NIfTI file.
pub fn load_geometry<P: AsRef<Path>>(path: P) -> Result<VolumeGeometry> {
    let path = path.as_ref();
    let header = NiftiHeader::from_file(path)?;
    let geometry = geometry_from_header(&header)?;
    info!(path = %path.display(), shape = ?geometry.shape(), "loaded volume geometry");
    Ok(geometry)
}

/// Reads header and voxel data of a NIfTI file. For 4D and higher files
/// the first volume is kept.
pub fn load_volume<P: AsRef<Path>>(path: P) -> Result<LoadedVolume> {
    let path = path.as_ref();
    let obj = ReaderOptions::new().read_file(path)?;
    let header = obj.header().clone();
    let geometry = geometry_from_header(&header)?;
    let mut img = obj.into_volume().into_ndarray::<f64>()?;
    // keep volume 0 of every non-spatial dimension
    while img.ndim() > 3 {
        let last = img.ndim() - 1;
        img = img.index_axis_move(Axis(last), 0);
    }
    let ndim = img.ndim();
    let data = img
        .into_dimensionality::<Ix3>()
        .map_err(|_| RbsyncError::NotThreeDimensional { ndim })?;
    info!(path = %path.display(), shape = ?geometry.shape(), "loaded volume");
    Ok(LoadedVolume {
        geometry,
        data,
        header,
    })
}
