//! Per-slice correspondence state.
//!
//! A [`MappingStore`] records, for each source (MRI) slice, which target
//! (atlas) slice it corresponds to and how that value was obtained. Entries
//! start out automatic and become confirmed once a user accepts or adjusts
//! them. A store is only ever replaced wholesale, never pruned.

use std::collections::BTreeMap;
use tracing::info;

use crate::error::{RbsyncError, Result};

/// How a correspondence was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchStatus {
    #[default]
    Unset,
    /// computed by nearest-distance search, not yet reviewed
    Auto,
    /// accepted or set by hand
    Confirmed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Unset => "unset",
            MatchStatus::Auto => "auto",
            MatchStatus::Confirmed => "confirmed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappingEntry {
    pub source_index: usize,
    pub target_index: Option<usize>,
    pub status: MatchStatus,
    /// residual of the last auto-match, cleared by manual adjustment
    pub distance_mm: Option<f64>,
}

impl MappingEntry {
    pub fn unset(source_index: usize) -> Self {
        Self {
            source_index,
            target_index: None,
            status: MatchStatus::Unset,
            distance_mm: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MappingStore {
    source_slice_count: usize,
    target_slice_count: usize,
    entries: BTreeMap<usize, MappingEntry>,
}

impl MappingStore {
    /// Empty store for `source_slice_count` source slices, each mappable to
    /// one of `target_slice_count` target slices.
    pub fn new(source_slice_count: usize, target_slice_count: usize) -> Self {
        Self {
            source_slice_count,
            target_slice_count,
            entries: BTreeMap::new(),
        }
    }

    pub fn source_slice_count(&self) -> usize {
        self.source_slice_count
    }

    pub fn target_slice_count(&self) -> usize {
        self.target_slice_count
    }

    fn check_source(&self, index: usize) -> Result<()> {
        if index >= self.source_slice_count {
            return Err(RbsyncError::InvalidIndex {
                index,
                count: self.source_slice_count,
            });
        }
        Ok(())
    }

    /// Records an automatic match, overwriting whatever was there.
    pub fn auto_match(
        &mut self,
        source_index: usize,
        target_index: usize,
        distance_mm: f64,
    ) -> Result<&MappingEntry> {
        self.check_source(source_index)?;
        if target_index >= self.target_slice_count {
            return Err(RbsyncError::InvalidIndex {
                index: target_index,
                count: self.target_slice_count,
            });
        }
        let entry = MappingEntry {
            source_index,
            target_index: Some(target_index),
            status: MatchStatus::Auto,
            distance_mm: Some(distance_mm),
        };
        self.entries.insert(source_index, entry);
        Ok(&self.entries[&source_index])
    }

    /// Moves an existing correspondence by `delta` target slices, clamped to
    /// the target volume. The result counts as confirmed.
    pub fn adjust(&mut self, source_index: usize, delta: i64) -> Result<&MappingEntry> {
        self.check_source(source_index)?;
        let max_index = self.target_slice_count.saturating_sub(1) as i64;
        let entry = self
            .entries
            .get_mut(&source_index)
            .filter(|e| e.status != MatchStatus::Unset)
            .ok_or(RbsyncError::NoBaseline { source_index })?;
        let current = entry
            .target_index
            .ok_or(RbsyncError::NoBaseline { source_index })? as i64;
        let new_index = current.saturating_add(delta).clamp(0, max_index) as usize;
        entry.target_index = Some(new_index);
        entry.status = MatchStatus::Confirmed;
        entry.distance_mm = None;
        info!(source_index, target_index = new_index, "adjusted correspondence");
        Ok(entry)
    }

    /// Accepts the current correspondence as is. Already confirmed entries
    /// are left alone.
    pub fn confirm(&mut self, source_index: usize) -> Result<&MappingEntry> {
        self.check_source(source_index)?;
        let entry = self
            .entries
            .get_mut(&source_index)
            .filter(|e| e.status != MatchStatus::Unset && e.target_index.is_some())
            .ok_or(RbsyncError::NoBaseline { source_index })?;
        if entry.status == MatchStatus::Auto {
            entry.status = MatchStatus::Confirmed;
            info!(
                source_index,
                target_index = ?entry.target_index,
                "confirmed correspondence"
            );
        }
        Ok(entry)
    }

    pub fn get(&self, source_index: usize) -> Option<&MappingEntry> {
        self.entries
            .get(&source_index)
            .filter(|e| e.status != MatchStatus::Unset)
    }

    /// Status of a slice, `Unset` when nothing has been recorded.
    pub fn status(&self, source_index: usize) -> MatchStatus {
        self.get(source_index)
            .map_or(MatchStatus::Unset, |e| e.status)
    }

    /// Every mapped slice in ascending source order.
    pub fn all_entries(&self) -> Vec<(usize, MappingEntry)> {
        self.entries
            .iter()
            .filter(|(_, e)| e.status != MatchStatus::Unset)
            .map(|(&i, e)| (i, *e))
            .collect()
    }

    /// `(source_index, target_index)` pairs of every mapped slice, ascending.
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        self.all_entries()
            .into_iter()
            .filter_map(|(i, e)| e.target_index.map(|t| (i, t)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.all_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn confirmed_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.status == MatchStatus::Confirmed)
            .count()
    }
}
