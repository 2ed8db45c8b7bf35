//! Error types for slice matching and mapping export.

use std::path::PathBuf;
use thiserror::Error;

use crate::common::SliceAxis;

/// Errors that can occur while matching slices or exporting a mapping.
///
/// None of these are fatal to a session: the operation that failed leaves
/// geometry and mapping state untouched.
#[derive(Debug, Error)]
pub enum RbsyncError {
    /// Slice index outside `[0, count)`.
    #[error("slice index {index} out of bounds for {count} slices")]
    InvalidIndex { index: usize, count: usize },

    /// Manual adjustment or confirmation before any match exists.
    #[error("MRI slice {source_index} has no correspondence yet; auto-match it first")]
    NoBaseline { source_index: usize },

    /// Export requested with nothing mapped.
    #[error("no mapping to export; match slices first")]
    EmptyMapping,

    /// A volume with zero extent along an axis.
    #[error("volume has zero extent along axis {axis}")]
    EmptyDimension { axis: SliceAxis },

    #[error("volume must be 3D, found {ndim} dimensions")]
    NotThreeDimensional { ndim: usize },

    #[error("unknown slice axis '{0}' (expected AP, LR, SI or 0, 1, 2)")]
    UnknownAxis(String),

    #[error("cannot infer export format from {0}; use .json or .csv")]
    UnknownFormat(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("nifti error: {0}")]
    Nifti(#[from] nifti::error::NiftiError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, RbsyncError>;
