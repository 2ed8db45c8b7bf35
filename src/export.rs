//! Serialization of a slice mapping to JSON or CSV.
//!
//! The JSON record carries the slicing axis and both volume shapes alongside
//! the mapping so the file can be checked against the volumes later:
//!
//! ```json
//! {
//!   "axis": 2,
//!   "axis_name": "SI",
//!   "mri_shape": [64, 64, 11],
//!   "atlas_shape": [512, 512, 512],
//!   "mapping": { "0": 128, "1": 154 }
//! }
//! ```
//!
//! The CSV table only holds the pairs, one row per mapped slice.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use tracing::info;

use crate::common::SliceAxis;
use crate::error::{RbsyncError, Result};
use crate::geometry::VolumeGeometry;
use crate::mapping::MappingStore;

pub const CSV_HEADER: [&str; 2] = ["MRI_Slice_Index", "Atlas_Slice_Index"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    /// Picks the format from a `.json` or `.csv` file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => Ok(ExportFormat::Json),
            Some("csv") => Ok(ExportFormat::Csv),
            _ => Err(RbsyncError::UnknownFormat(path.to_path_buf())),
        }
    }
}

/// Snapshot of a mapping ready to be written out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingExport {
    pub axis: usize,
    pub axis_name: String,
    pub mri_shape: [usize; 3],
    pub atlas_shape: [usize; 3],
    /// source slice → target slice; keys are written as strings
    pub mapping: BTreeMap<usize, usize>,
}

/// Builds the export record for every mapped slice in `store`.
///
/// Fails with [`RbsyncError::EmptyMapping`] rather than producing a file
/// with no correspondences in it.
pub fn export(
    store: &MappingStore,
    source: &VolumeGeometry,
    target: &VolumeGeometry,
    axis: SliceAxis,
) -> Result<MappingExport> {
    let mapping: BTreeMap<usize, usize> = store.pairs().into_iter().collect();
    if mapping.is_empty() {
        return Err(RbsyncError::EmptyMapping);
    }
    Ok(MappingExport {
        axis: axis.to_usize(),
        axis_name: axis.name().to_string(),
        mri_shape: source.shape(),
        atlas_shape: target.shape(),
        mapping,
    })
}

impl MappingExport {
    /// Pairs in ascending source order.
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        self.mapping.iter().map(|(&s, &t)| (s, t)).collect()
    }

    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(CSV_HEADER)?;
        for (source_index, target_index) in &self.mapping {
            wtr.write_record([source_index.to_string(), target_index.to_string()])?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    pub fn read_json<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Reads the pairs back out of a CSV export. The table carries no
    /// axis or shapes, so only the pairs can be recovered.
    pub fn read_csv_pairs<R: Read>(reader: R) -> Result<Vec<(usize, usize)>> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut pairs = Vec::new();
        for row in rdr.deserialize() {
            let pair: (usize, usize) = row?;
            pairs.push(pair);
        }
        Ok(pairs)
    }

    /// Writes the record to `path`, creating or truncating the file.
    pub fn write_to_path(&self, path: &Path, format: ExportFormat) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        match format {
            ExportFormat::Json => {
                self.write_json(&mut writer)?;
                writeln!(writer)?;
            }
            ExportFormat::Csv => self.write_csv(&mut writer)?,
        }
        writer.flush()?;
        info!(
            path = %path.display(),
            correspondences = self.mapping.len(),
            "exported mapping"
        );
        Ok(())
    }
}
