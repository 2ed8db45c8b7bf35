//! Slice correspondence between a sparse MRI scan and a reference atlas.
//!
//! Slices are paired purely through each volume's voxel→world affine: every
//! MRI slice is matched to the atlas slice whose representative voxel lies
//! closest in physical space. Matches can then be reviewed, nudged, and
//! confirmed, and the resulting mapping exported as JSON or CSV.

pub mod common;
pub mod error;
pub mod export;
pub mod geometry;
pub mod logging;
pub mod mapping;
pub mod matcher;
pub mod position;
pub mod preview;
pub mod session;
pub mod volume;

pub use common::SliceAxis;
pub use error::{RbsyncError, Result};
pub use export::{export, ExportFormat, MappingExport};
pub use geometry::VolumeGeometry;
pub use mapping::{MappingEntry, MappingStore, MatchStatus};
pub use matcher::{find_best_match, match_all, SliceMatch};
pub use position::SlicePosition;
pub use session::Session;
