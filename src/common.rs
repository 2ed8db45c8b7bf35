use std::fmt;
use std::str::FromStr;

use crate::error::RbsyncError;

// set up enums and structs
/// Anatomical direction that slices are taken along.
///
/// Each variant maps onto one voxel-index axis of the volume; the mapping
/// is fixed for a whole matching session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SliceAxis {
    /// anterior-posterior, voxel axis 0
    AP,
    /// left-right, voxel axis 1
    LR,
    /// superior-inferior, voxel axis 2
    SI,
}

impl SliceAxis {
    pub const ALL: [SliceAxis; 3] = [SliceAxis::AP, SliceAxis::LR, SliceAxis::SI];

    pub fn to_usize(&self) -> usize {
        match self {
            SliceAxis::AP => 0,
            SliceAxis::LR => 1,
            SliceAxis::SI => 2,
        }
    }

    pub fn from_usize(val: usize) -> Option<Self> {
        match val {
            0 => Some(SliceAxis::AP),
            1 => Some(SliceAxis::LR),
            2 => Some(SliceAxis::SI),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SliceAxis::AP => "AP",
            SliceAxis::LR => "LR",
            SliceAxis::SI => "SI",
        }
    }
}

impl Default for SliceAxis {
    fn default() -> Self {
        // axial slices are the usual thick-slice acquisition
        SliceAxis::SI
    }
}

impl fmt::Display for SliceAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Accepts either the anatomical name (`AP`, `LR`, `SI`, any case) or the
/// voxel axis number (`0`, `1`, `2`).
impl FromStr for SliceAxis {
    type Err = RbsyncError;

    fn from_str(val: &str) -> Result<Self, Self::Err> {
        match val.trim().to_ascii_uppercase().as_str() {
            "AP" | "0" => Ok(SliceAxis::AP),
            "LR" | "1" => Ok(SliceAxis::LR),
            "SI" | "2" => Ok(SliceAxis::SI),
            _ => Err(RbsyncError::UnknownAxis(val.to_string())),
        }
    }
}
