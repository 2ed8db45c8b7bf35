//! Matching session: the state behind an interactive slice-matching tool.
//!
//! A [`Session`] owns the geometry of one MRI (source) volume and one atlas
//! (target) volume, the slicing axis, the mapping store, and the slice the
//! user is currently looking at. Front ends drive it and render
//! [`Session::correspondence_label`]; no matching logic lives outside it.

use tracing::{info, warn};

use crate::common::SliceAxis;
use crate::error::{RbsyncError, Result};
use crate::export::{self, MappingExport};
use crate::geometry::VolumeGeometry;
use crate::mapping::{MappingEntry, MappingStore, MatchStatus};
use crate::matcher::{self, SliceMatch};

#[derive(Debug, Clone)]
pub struct Session {
    source: VolumeGeometry,
    target: VolumeGeometry,
    axis: SliceAxis,
    store: MappingStore,
    current: usize,
}

impl Session {
    pub fn new(source: VolumeGeometry, target: VolumeGeometry, axis: SliceAxis) -> Self {
        let store = MappingStore::new(source.slice_count(axis), target.slice_count(axis));
        info!(
            axis = %axis,
            mri_shape = ?source.shape(),
            atlas_shape = ?target.shape(),
            slices = source.slice_count(axis),
            "session started"
        );
        Self {
            source,
            target,
            axis,
            store,
            current: 0,
        }
    }

    fn reset(&mut self) {
        self.store = MappingStore::new(
            self.source.slice_count(self.axis),
            self.target.slice_count(self.axis),
        );
        self.current = 0;
    }

    /// Replaces the MRI volume. The mapping starts over.
    pub fn load_source(&mut self, source: VolumeGeometry) {
        self.source = source;
        self.reset();
        info!(shape = ?self.source.shape(), "loaded MRI, mapping reset");
    }

    /// Replaces the atlas volume. The mapping starts over.
    pub fn load_target(&mut self, target: VolumeGeometry) {
        self.target = target;
        self.reset();
        info!(shape = ?self.target.shape(), "loaded atlas, mapping reset");
    }

    /// Switches the slicing axis; a mapping only makes sense for one axis,
    /// so it is discarded.
    pub fn set_axis(&mut self, axis: SliceAxis) {
        if axis != self.axis {
            self.axis = axis;
            self.reset();
            info!(axis = %axis, "changed axis, mapping reset");
        }
    }

    pub fn axis(&self) -> SliceAxis {
        self.axis
    }

    pub fn source(&self) -> &VolumeGeometry {
        &self.source
    }

    pub fn target(&self) -> &VolumeGeometry {
        &self.target
    }

    pub fn store(&self) -> &MappingStore {
        &self.store
    }

    pub fn slice_count(&self) -> usize {
        self.source.slice_count(self.axis)
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn select(&mut self, index: usize) -> Result<()> {
        let count = self.slice_count();
        if index >= count {
            return Err(RbsyncError::InvalidIndex { index, count });
        }
        self.current = index;
        Ok(())
    }

    /// Stored entry for the current slice, or an unset placeholder.
    pub fn current_entry(&self) -> MappingEntry {
        self.store
            .get(self.current)
            .copied()
            .unwrap_or_else(|| MappingEntry::unset(self.current))
    }

    /// What auto-matching the current slice would give, without storing it.
    pub fn preview_current(&self) -> Result<SliceMatch> {
        matcher::match_slice(&self.source, self.current, &self.target, self.axis)
    }

    pub fn auto_match(&mut self, source_index: usize) -> Result<MappingEntry> {
        let found = matcher::match_slice(&self.source, source_index, &self.target, self.axis)?;
        let entry = *self
            .store
            .auto_match(source_index, found.index, found.distance_mm)?;
        info!(
            mri = source_index,
            atlas = found.index,
            distance_mm = found.distance_mm,
            "auto-matched"
        );
        Ok(entry)
    }

    pub fn auto_match_current(&mut self) -> Result<MappingEntry> {
        self.auto_match(self.current)
    }

    /// Matches every MRI slice. All searches run before the store is
    /// touched, so a failure leaves the mapping as it was.
    pub fn auto_match_all(&mut self) -> Result<usize> {
        let matches = matcher::match_all(&self.source, &self.target, self.axis)?;
        for (source_index, found) in &matches {
            self.store
                .auto_match(*source_index, found.index, found.distance_mm)?;
        }
        info!(
            slices = matches.len(),
            "auto-matched all slices; review and adjust as needed"
        );
        Ok(matches.len())
    }

    pub fn adjust_current(&mut self, delta: i64) -> Result<MappingEntry> {
        let current = self.current;
        match self.store.adjust(current, delta) {
            Ok(entry) => Ok(*entry),
            Err(e) => {
                warn!(mri = current, "{e}");
                Err(e)
            }
        }
    }

    pub fn confirm_current(&mut self) -> Result<MappingEntry> {
        Ok(*self.store.confirm(self.current)?)
    }

    /// One-line summary of the current slice for display, e.g.
    /// `MRI slice 3 → Atlas slice 47 (auto, 0.02 mm)`. Unstored slices show
    /// the would-be match followed by `?`.
    pub fn correspondence_label(&self) -> String {
        let entry = self.current_entry();
        match (entry.status, entry.target_index) {
            (MatchStatus::Unset, _) | (_, None) => match self.preview_current() {
                Ok(found) => format!("MRI slice {} → Atlas slice {} ?", self.current, found.index),
                Err(_) => format!("MRI slice {} → Atlas slice ?", self.current),
            },
            (status, Some(target)) => match entry.distance_mm {
                Some(d) => format!(
                    "MRI slice {} → Atlas slice {} ({}, {:.2} mm)",
                    self.current,
                    target,
                    status.as_str(),
                    d
                ),
                None => format!(
                    "MRI slice {} → Atlas slice {} ({})",
                    self.current,
                    target,
                    status.as_str()
                ),
            },
        }
    }

    pub fn export(&self) -> Result<MappingExport> {
        export::export(&self.store, &self.source, &self.target, self.axis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Matrix4;

    fn geom(depth: usize, spacing: f64) -> VolumeGeometry {
        let mut affine = Matrix4::identity();
        affine[(2, 2)] = spacing;
        VolumeGeometry::new([8, 8, depth], affine).unwrap()
    }

    fn session() -> Session {
        // in-plane midpoints coincide, so only z matters
        Session::new(geom(5, 2.0), geom(40, 0.25), SliceAxis::SI)
    }

    #[test]
    fn auto_match_all_fills_store() {
        let mut s = session();
        assert_eq!(s.auto_match_all().unwrap(), 5);
        assert_eq!(s.store().pairs(), vec![(0, 0), (1, 8), (2, 16), (3, 24), (4, 32)]);
        assert!(s
            .store()
            .all_entries()
            .iter()
            .all(|(_, e)| e.status == MatchStatus::Auto));
    }

    #[test]
    fn label_tracks_state() {
        let mut s = session();
        s.select(1).unwrap();
        assert_eq!(s.correspondence_label(), "MRI slice 1 → Atlas slice 8 ?");
        s.auto_match_current().unwrap();
        assert_eq!(
            s.correspondence_label(),
            "MRI slice 1 → Atlas slice 8 (auto, 0.00 mm)"
        );
        s.adjust_current(-3).unwrap();
        assert_eq!(
            s.correspondence_label(),
            "MRI slice 1 → Atlas slice 5 (confirmed)"
        );
    }

    #[test]
    fn adjust_before_match_is_refused() {
        let mut s = session();
        assert!(matches!(
            s.adjust_current(1),
            Err(RbsyncError::NoBaseline { source_index: 0 })
        ));
        assert!(s.store().is_empty());
        assert_eq!(s.current_entry().status, MatchStatus::Unset);
    }

    #[test]
    fn select_checks_bounds() {
        let mut s = session();
        assert!(s.select(4).is_ok());
        assert!(matches!(
            s.select(5),
            Err(RbsyncError::InvalidIndex { index: 5, count: 5 })
        ));
        assert_eq!(s.current(), 4);
    }

    #[test]
    fn reload_and_axis_change_reset_mapping() {
        let mut s = session();
        s.auto_match_all().unwrap();
        s.select(3).unwrap();
        s.load_target(geom(80, 0.125));
        assert!(s.store().is_empty());
        assert_eq!(s.current(), 0);
        assert_eq!(s.store().target_slice_count(), 80);

        s.auto_match_all().unwrap();
        s.set_axis(SliceAxis::SI);
        assert!(!s.store().is_empty());
        s.set_axis(SliceAxis::AP);
        assert!(s.store().is_empty());
        assert_eq!(s.slice_count(), 8);
    }

    #[test]
    fn export_requires_matches() {
        let mut s = session();
        assert!(matches!(s.export(), Err(RbsyncError::EmptyMapping)));
        s.auto_match_current().unwrap();
        s.confirm_current().unwrap();
        let record = s.export().unwrap();
        assert_eq!(record.pairs(), vec![(0, 0)]);
        assert_eq!(record.axis_name, "SI");
    }
}
