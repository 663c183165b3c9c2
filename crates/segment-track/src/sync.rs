use crate::config::SyncConfig;
use crate::error::{IngestError, TrackError};
use crate::id::{IdGenerator, UuidIdGen};
use crate::ingest::build_track;
use crate::track::{NodeId, SegmentTrack};
use crate::types::{FlatSegment, Segment, SegmentRecord};

/// A row whose identity was regenerated by the last mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Touched {
    pub node: NodeId,
    pub identity: String,
}

/// Everything a subscriber needs after one mutation: the rebuilt flat view
/// and the rows that must be redrawn. Rows absent from `touched` kept their
/// identity and can be reused as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncUpdate {
    /// Increases by one on every rebuild.
    pub revision: u64,
    pub segments: Vec<FlatSegment>,
    pub touched: Vec<Touched>,
}

/// Receives one [`SyncUpdate`] per mutation, after the flat view is rebuilt.
pub trait TrackListener: Send {
    fn on_change(&mut self, update: &SyncUpdate);
}

impl<F> TrackListener for F
where
    F: FnMut(&SyncUpdate) + Send,
{
    fn on_change(&mut self, update: &SyncUpdate) {
        self(update)
    }
}

/// Owns a [`SegmentTrack`] and keeps its flat view and row identities in
/// step with every edit.
///
/// Each editing operation runs as one unit: identity touch, structural
/// change, flat-view rebuild, listener notification. Hosts that share a
/// synchronizer across threads should hold a single lock around each call.
pub struct TrackSynchronizer {
    track: SegmentTrack,
    id_gen: Box<dyn IdGenerator>,
    config: SyncConfig,
    flat: Vec<FlatSegment>,
    revision: u64,
    pending: Vec<NodeId>,
    listeners: Vec<Box<dyn TrackListener>>,
}

impl TrackSynchronizer {
    pub fn new(track: SegmentTrack) -> Self {
        Self::with_config(track, UuidIdGen, SyncConfig::default())
    }

    pub fn with_config(
        track: SegmentTrack,
        id_gen: impl IdGenerator + 'static,
        config: SyncConfig,
    ) -> Self {
        let mut sync = Self {
            track: SegmentTrack::new(),
            id_gen: Box::new(id_gen),
            config,
            flat: Vec::new(),
            revision: 0,
            pending: Vec::new(),
            listeners: Vec::new(),
        };
        sync.replace_track(track);
        sync
    }

    /// Build the track from external records. Identities come from `id_gen`.
    pub fn from_records(
        records: &[SegmentRecord],
        mut id_gen: impl IdGenerator + 'static,
        config: SyncConfig,
    ) -> Result<Self, IngestError> {
        let track = build_track(records, &mut id_gen)?;
        Ok(Self::with_config(track, id_gen, config))
    }

    pub fn track(&self) -> &SegmentTrack {
        &self.track
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn flat_view(&self) -> &[FlatSegment] {
        &self.flat
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn segment(&self, node: NodeId) -> Result<&Segment, TrackError> {
        self.track.get(node)
    }

    pub fn subscribe(&mut self, listener: impl TrackListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    // ── Core ────────────────────────────────────────────────────────────────

    /// Re-derive the flat view from the track, then notify listeners.
    pub fn rebuild_flat_view(&mut self) -> SyncUpdate {
        self.flat = self.track.iter().map(|(_, s)| FlatSegment::from(s)).collect();
        self.revision += 1;

        let mut touched: Vec<Touched> = Vec::new();
        for node in std::mem::take(&mut self.pending) {
            if touched.iter().any(|t| t.node == node) {
                continue;
            }
            // Removed rows have nothing left to redraw.
            if let Ok(segment) = self.track.get(node) {
                touched.push(Touched {
                    node,
                    identity: segment.identity.clone(),
                });
            }
        }

        let update = SyncUpdate {
            revision: self.revision,
            segments: self.flat.clone(),
            touched,
        };

        tracing::debug!(
            revision = update.revision,
            segments = update.segments.len(),
            touched = update.touched.len(),
            "flat_view_rebuilt"
        );

        for listener in &mut self.listeners {
            listener.on_change(&update);
        }
        update
    }

    /// Give `node` (and, with `include_neighbors`, its immediate neighbours)
    /// a fresh identity, marking those rows for redraw.
    pub fn touch(&mut self, node: NodeId, include_neighbors: bool) -> Result<(), TrackError> {
        let (prev, next) = {
            let n = self.track.node(node)?;
            (n.prev(), n.next())
        };

        self.refresh_identity(node)?;
        if include_neighbors {
            for neighbor in [prev, next].into_iter().flatten() {
                self.refresh_identity(neighbor)?;
            }
        }
        Ok(())
    }

    // ── Editing operations ──────────────────────────────────────────────────

    /// Insert a placeholder right after `node`, spanning the gap up to the
    /// next segment.
    pub fn append_after(&mut self, node: NodeId) -> Result<SyncUpdate, TrackError> {
        self.touch(node, true)?;

        let start = self.track.get(node)?.end_ms;
        let end = self
            .track
            .max_offset(node)?
            .unwrap_or(start.saturating_add(self.config.open_span_ms))
            .max(start);

        let placeholder = self.placeholder(start, end, self.config.placeholder_after_text.clone());
        let id = self.track.insert_after(placeholder, node)?;
        self.pending.push(id);

        tracing::debug!(anchor = ?node, node = ?id, start, end, "segment_appended_after");
        Ok(self.rebuild_flat_view())
    }

    /// Insert a placeholder right before `node`, spanning the gap back to the
    /// previous segment.
    pub fn append_before(&mut self, node: NodeId) -> Result<SyncUpdate, TrackError> {
        self.touch(node, true)?;

        let end = self.track.get(node)?.start_ms;
        let start = self
            .track
            .min_offset(node)?
            .unwrap_or(end.saturating_sub(self.config.open_span_ms).max(0))
            .min(end);

        let placeholder =
            self.placeholder(start, end, self.config.placeholder_before_text.clone());
        let id = self.track.insert_before(placeholder, node)?;
        self.pending.push(id);

        tracing::debug!(anchor = ?node, node = ?id, start, end, "segment_appended_before");
        Ok(self.rebuild_flat_view())
    }

    /// Remove `node`, refreshing its neighbours first so they redraw without
    /// the removed row's context.
    pub fn remove_segment(&mut self, node: NodeId) -> Result<SyncUpdate, TrackError> {
        self.touch(node, true)?;
        let removed = self.track.remove(node)?;

        tracing::debug!(node = ?node, text = %removed.text, "segment_removed");
        Ok(self.rebuild_flat_view())
    }

    /// Flip edit mode. Only the node itself is redrawn.
    pub fn toggle_edit_mode(&mut self, node: NodeId) -> Result<SyncUpdate, TrackError> {
        let segment = self.track.get_mut(node)?;
        segment.edit_mode = !segment.edit_mode;
        self.touch(node, false)?;
        Ok(self.rebuild_flat_view())
    }

    /// Overwrite both bounds. No clamping happens here; use
    /// [`Self::clamp_to_neighbors`] first when the input comes from a gesture.
    pub fn update_timestamps(
        &mut self,
        node: NodeId,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<SyncUpdate, TrackError> {
        let segment = self.track.get_mut(node)?;
        segment.start_ms = start_ms;
        segment.end_ms = end_ms;
        self.touch(node, true)?;
        Ok(self.rebuild_flat_view())
    }

    pub fn update_text(
        &mut self,
        node: NodeId,
        text: impl Into<String>,
    ) -> Result<SyncUpdate, TrackError> {
        self.track.get_mut(node)?.text = text.into();
        self.touch(node, true)?;
        Ok(self.rebuild_flat_view())
    }

    /// Restrict a proposed `[start, end]` to the range left free by the
    /// neighbours of `node`, keeping `start <= end`.
    pub fn clamp_to_neighbors(
        &self,
        node: NodeId,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<(i64, i64), TrackError> {
        let min = self.track.min_offset(node)?.unwrap_or(0);
        // Neighbours that already overlap leave no room; collapse to `min`.
        let max = self.track.max_offset(node)?.unwrap_or(i64::MAX).max(min);

        let start = start_ms.clamp(min, max);
        let end = end_ms.clamp(start, max);
        Ok((start, end))
    }

    /// Force a rebuild, optionally touching `node` and its neighbours first.
    pub fn reset(&mut self, node: Option<NodeId>) -> Result<SyncUpdate, TrackError> {
        if let Some(node) = node {
            self.touch(node, true)?;
        }
        Ok(self.rebuild_flat_view())
    }

    /// Swap in a whole new track, e.g. when another transcript is loaded.
    /// Every row of the new track counts as touched.
    pub fn replace_track(&mut self, track: SegmentTrack) -> SyncUpdate {
        self.track = track;
        self.pending = self.track.iter().map(|(id, _)| id).collect();
        self.rebuild_flat_view()
    }

    /// Build a new track from `records` and swap it in. On failure the
    /// current track is left untouched.
    pub fn load_records(&mut self, records: &[SegmentRecord]) -> Result<SyncUpdate, IngestError> {
        let track = build_track(records, self.id_gen.as_mut())?;
        Ok(self.replace_track(track))
    }

    // ── Internal ────────────────────────────────────────────────────────────

    fn refresh_identity(&mut self, node: NodeId) -> Result<(), TrackError> {
        let identity = self.id_gen.next_id();
        self.track.get_mut(node)?.identity = identity;
        self.pending.push(node);
        Ok(())
    }

    fn placeholder(&mut self, start_ms: i64, end_ms: i64, text: String) -> Segment {
        Segment {
            identity: self.id_gen.next_id(),
            start_ms,
            end_ms,
            text,
            score: self.config.placeholder_score,
            words: Vec::new(),
            edit_mode: false,
        }
    }
}

impl std::fmt::Debug for TrackSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackSynchronizer")
            .field("track", &self.track)
            .field("config", &self.config)
            .field("revision", &self.revision)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::id::SequentialIdGen;
    use crate::track::tests::{assert_links, seg};

    fn sync_of(spans: &[(&str, i64, i64)]) -> (TrackSynchronizer, Vec<NodeId>) {
        let mut track = SegmentTrack::new();
        let ids = spans
            .iter()
            .map(|&(t, s, e)| track.push_back(seg(t, s, e)))
            .collect();
        let sync =
            TrackSynchronizer::with_config(track, SequentialIdGen::new(), SyncConfig::default());
        (sync, ids)
    }

    fn texts(sync: &TrackSynchronizer) -> Vec<&str> {
        sync.flat_view().iter().map(|s| s.text.as_str()).collect()
    }

    fn identities(sync: &TrackSynchronizer) -> HashMap<NodeId, String> {
        sync.track()
            .iter()
            .map(|(id, s)| (id, s.identity.clone()))
            .collect()
    }

    #[test]
    fn append_after_fills_gap_to_next_segment() {
        let (mut sync, ids) = sync_of(&[("a", 0, 1000), ("b", 1000, 2000)]);

        let update = sync.append_after(ids[0]).unwrap();

        assert_eq!(sync.track().len(), 3);
        assert_eq!(texts(&sync), ["a", "placeholder text added after", "b"]);
        assert_eq!(update.segments[1].start, "00:00:01.000");
        assert_eq!(update.segments[1].end, "00:00:01.000");
        assert_links(sync.track());
    }

    #[test]
    fn append_after_tail_uses_open_span() {
        let (mut sync, ids) = sync_of(&[("a", 0, 1000)]);

        sync.append_after(ids[0]).unwrap();

        let tail = sync.track().tail().unwrap();
        let placeholder = sync.segment(tail).unwrap();
        assert_eq!((placeholder.start_ms, placeholder.end_ms), (1000, 2000));
        assert_eq!(placeholder.score, 1.0);
    }

    #[test]
    fn append_before_fills_gap_to_previous_segment() {
        let (mut sync, ids) = sync_of(&[("a", 0, 800), ("b", 1000, 2000)]);

        sync.append_before(ids[1]).unwrap();

        assert_eq!(texts(&sync), ["a", "placeholder text added before", "b"]);
        let middle = sync.track().next(ids[0]).unwrap().unwrap();
        let placeholder = sync.segment(middle).unwrap();
        assert_eq!((placeholder.start_ms, placeholder.end_ms), (800, 1000));
    }

    #[test]
    fn append_before_head_stops_at_zero() {
        let (mut sync, ids) = sync_of(&[("a", 400, 1000)]);

        sync.append_before(ids[0]).unwrap();

        let head = sync.track().head().unwrap();
        let placeholder = sync.segment(head).unwrap();
        assert_eq!((placeholder.start_ms, placeholder.end_ms), (0, 400));
    }

    #[test]
    fn remove_segment_routes_by_position() {
        let (mut sync, ids) = sync_of(&[("a", 0, 1), ("b", 1, 2), ("c", 2, 3), ("d", 3, 4)]);

        sync.remove_segment(ids[1]).unwrap();
        assert_eq!(texts(&sync), ["a", "c", "d"]);
        sync.remove_segment(ids[0]).unwrap();
        assert_eq!(texts(&sync), ["c", "d"]);
        sync.remove_segment(ids[3]).unwrap();
        assert_eq!(texts(&sync), ["c"]);
        assert_links(sync.track());
    }

    fn touched_nodes(update: &SyncUpdate) -> Vec<NodeId> {
        update.touched.iter().map(|t| t.node).collect()
    }

    fn assert_touched_identities_current(sync: &TrackSynchronizer, update: &SyncUpdate) {
        for t in &update.touched {
            assert_eq!(sync.segment(t.node).unwrap().identity, t.identity);
        }
    }

    #[test]
    fn remove_segment_refreshes_surviving_neighbours() {
        let (mut sync, ids) = sync_of(&[("a", 0, 1), ("b", 1, 2), ("c", 2, 3), ("d", 3, 4)]);
        let before = identities(&sync);

        let update = sync.remove_segment(ids[1]).unwrap();
        let after = identities(&sync);

        assert_ne!(before[&ids[0]], after[&ids[0]]);
        assert_ne!(before[&ids[2]], after[&ids[2]]);
        assert_eq!(before[&ids[3]], after[&ids[3]]);
        assert_eq!(touched_nodes(&update), [ids[0], ids[2]]);
        assert_touched_identities_current(&sync, &update);
    }

    #[test]
    fn append_after_reports_anchor_neighbours_and_placeholder() {
        let (mut sync, ids) = sync_of(&[("a", 0, 1), ("b", 1, 2), ("c", 2, 3), ("d", 3, 4)]);
        let before = identities(&sync);

        let update = sync.append_after(ids[1]).unwrap();
        let placeholder = sync.track().next(ids[1]).unwrap().unwrap();

        assert_eq!(
            touched_nodes(&update),
            [ids[1], ids[0], ids[2], placeholder]
        );
        assert_eq!(before[&ids[3]], identities(&sync)[&ids[3]]);
        assert_touched_identities_current(&sync, &update);
    }

    #[test]
    fn append_before_reports_anchor_neighbours_and_placeholder() {
        let (mut sync, ids) = sync_of(&[("a", 0, 1), ("b", 1, 2), ("c", 2, 3), ("d", 3, 4)]);
        let before = identities(&sync);

        let update = sync.append_before(ids[1]).unwrap();
        let placeholder = sync.track().prev(ids[1]).unwrap().unwrap();

        assert_eq!(
            touched_nodes(&update),
            [ids[1], ids[0], ids[2], placeholder]
        );
        assert_eq!(before[&ids[3]], identities(&sync)[&ids[3]]);
        assert_touched_identities_current(&sync, &update);
    }

    #[test]
    fn open_span_saturates_at_timeline_limits() {
        let mut track = SegmentTrack::new();
        let a = track.push_back(seg("a", 5, i64::MAX - 10));
        let config = SyncConfig {
            open_span_ms: i64::MAX,
            ..SyncConfig::default()
        };
        let mut sync = TrackSynchronizer::with_config(track, SequentialIdGen::new(), config);

        sync.append_after(a).unwrap();
        sync.append_before(a).unwrap();

        let spans: Vec<_> = sync
            .track()
            .iter()
            .map(|(_, s)| (s.start_ms, s.end_ms))
            .collect();
        assert_eq!(
            spans,
            [(0, 5), (5, i64::MAX - 10), (i64::MAX - 10, i64::MAX)]
        );
    }

    #[test]
    fn removing_last_segment_empties_flat_view() {
        let (mut sync, ids) = sync_of(&[("a", 0, 1000)]);

        let update = sync.remove_segment(ids[0]).unwrap();

        assert_eq!(sync.track().len(), 0);
        assert!(update.segments.is_empty());
        assert!(update.touched.is_empty());
    }

    #[test]
    fn touch_refreshes_node_and_neighbours_only() {
        let (mut sync, ids) = sync_of(&[("a", 0, 1), ("b", 1, 2), ("c", 2, 3), ("d", 3, 4)]);
        let before = identities(&sync);

        sync.touch(ids[1], true).unwrap();
        let after = identities(&sync);

        for &changed in &ids[0..3] {
            assert_ne!(before[&changed], after[&changed]);
        }
        assert_eq!(before[&ids[3]], after[&ids[3]]);
    }

    #[test]
    fn toggle_edit_mode_only_touches_itself() {
        let (mut sync, ids) = sync_of(&[("a", 0, 1), ("b", 1, 2), ("c", 2, 3)]);
        let before = identities(&sync);

        let update = sync.toggle_edit_mode(ids[1]).unwrap();
        let after = identities(&sync);

        assert!(sync.segment(ids[1]).unwrap().edit_mode);
        assert_ne!(before[&ids[1]], after[&ids[1]]);
        assert_eq!(before[&ids[0]], after[&ids[0]]);
        assert_eq!(before[&ids[2]], after[&ids[2]]);
        assert_eq!(update.touched.len(), 1);
        assert_eq!(update.touched[0].node, ids[1]);
    }

    #[test]
    fn update_text_and_timestamps_reach_flat_view() {
        let (mut sync, ids) = sync_of(&[("a", 0, 1000), ("b", 1000, 2000)]);

        sync.update_text(ids[0], "hello").unwrap();
        let update = sync.update_timestamps(ids[1], 1200, 1800).unwrap();

        assert_eq!(update.segments[0].text, "hello");
        assert_eq!(update.segments[1].start, "00:00:01.200");
        assert_eq!(update.segments[1].end, "00:00:01.800");
        let touched: Vec<_> = update.touched.iter().map(|t| t.node).collect();
        assert_eq!(touched, [ids[1], ids[0]]);
    }

    #[test]
    fn clamp_keeps_edits_inside_neighbours() {
        let (sync, ids) = sync_of(&[("a", 0, 1000), ("b", 1000, 2000), ("c", 2500, 3000)]);

        assert_eq!(sync.clamp_to_neighbors(ids[1], 500, 2700).unwrap(), (1000, 2500));
        assert_eq!(sync.clamp_to_neighbors(ids[1], 2600, 100).unwrap(), (2500, 2500));
        assert_eq!(sync.clamp_to_neighbors(ids[0], -50, 400).unwrap(), (0, 400));
        assert_eq!(sync.clamp_to_neighbors(ids[2], 2600, 9000).unwrap(), (2600, 9000));
    }

    #[test]
    fn stale_and_foreign_nodes_fail_without_side_effects() {
        let (mut sync, ids) = sync_of(&[("a", 0, 1), ("b", 1, 2), ("c", 2, 3)]);
        let (_, other) = sync_of(&[("x", 0, 1)]);
        sync.remove_segment(ids[1]).unwrap();
        let revision = sync.revision();

        assert_eq!(
            sync.update_text(ids[1], "zombie"),
            Err(TrackError::StaleNode(ids[1]))
        );
        assert_eq!(
            sync.append_after(other[0]),
            Err(TrackError::ForeignNode(other[0]))
        );
        assert_eq!(sync.revision(), revision);
        assert_eq!(texts(&sync), ["a", "c"]);
    }

    #[test]
    fn listeners_see_every_rebuild() {
        let (mut sync, ids) = sync_of(&[("a", 0, 1000), ("b", 1000, 2000)]);
        let seen: Arc<Mutex<Vec<u64>>> = Arc::default();

        let sink = seen.clone();
        sync.subscribe(move |update: &SyncUpdate| {
            sink.lock().unwrap().push(update.revision);
        });

        sync.append_after(ids[0]).unwrap();
        sync.toggle_edit_mode(ids[1]).unwrap();

        let start = sync.revision() - 1;
        assert_eq!(*seen.lock().unwrap(), [start, start + 1]);
    }

    #[test]
    fn load_records_replaces_track_and_marks_every_row() {
        let (mut sync, _) = sync_of(&[("a", 0, 1000)]);
        let records = crate::ingest::parse_records(
            r#"[
                {"score": 1, "start": "00:00:00.000", "end": "00:00:01.000", "text": "x"},
                {"score": 1, "start": 1000, "end": 2000, "text": "y"}
            ]"#,
        )
        .unwrap();

        let update = sync.load_records(&records).unwrap();

        assert_eq!(texts(&sync), ["x", "y"]);
        assert_eq!(update.touched.len(), 2);
    }

    #[test]
    fn failed_load_keeps_current_track() {
        let (mut sync, _) = sync_of(&[("a", 0, 1000)]);

        assert!(sync.load_records(&[]).is_err());
        assert_eq!(texts(&sync), ["a"]);
    }

    #[test]
    fn reset_touches_and_rebuilds() {
        let (mut sync, ids) = sync_of(&[("a", 0, 1000), ("b", 1000, 2000)]);
        let revision = sync.revision();

        let update = sync.reset(Some(ids[0])).unwrap();
        assert_eq!(update.revision, revision + 1);
        assert_eq!(update.touched.len(), 2);

        let update = sync.reset(None).unwrap();
        assert!(update.touched.is_empty());
    }
}
