//! # Segment Track
//!
//! An ordered, doubly linked chain of [`Segment`]s stored in a slot arena.
//! Links are [`NodeId`] handles rather than references, so the track owns
//! every node and traversal never fights the borrow checker.
//!
//! The track enforces **structural** integrity only: link consistency, size
//! bookkeeping, and handle membership. Temporal ordering between neighbours
//! is the caller's job; [`SegmentTrack::min_offset`] and
//! [`SegmentTrack::max_offset`] exist so callers can clamp edits cheaply.
//!
//! Handles carry the owning track's tag and the slot generation, so a handle
//! from another track is reported as [`TrackError::ForeignNode`] and a handle
//! to a removed node as [`TrackError::StaleNode`].

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::TrackError;
use crate::types::Segment;

static NEXT_TRACK_TAG: AtomicU64 = AtomicU64::new(1);

/// Handle to a node inside one specific [`SegmentTrack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    track: u64,
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone)]
pub struct SegmentNode {
    pub segment: Segment,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

impl SegmentNode {
    pub fn prev(&self) -> Option<NodeId> {
        self.prev
    }

    pub fn next(&self) -> Option<NodeId> {
        self.next
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<SegmentNode>,
}

#[derive(Debug)]
pub struct SegmentTrack {
    tag: u64,
    slots: Vec<Slot>,
    free: Vec<u32>,
    head: Option<NodeId>,
    tail: Option<NodeId>,
    size: usize,
}

impl SegmentTrack {
    pub fn new() -> Self {
        Self {
            tag: NEXT_TRACK_TAG.fetch_add(1, Ordering::Relaxed),
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            size: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    pub fn tail(&self) -> Option<NodeId> {
        self.tail
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.slot_index(id).is_ok()
    }

    pub fn node(&self, id: NodeId) -> Result<&SegmentNode, TrackError> {
        let idx = self.slot_index(id)?;
        self.slots[idx].node.as_ref().ok_or(TrackError::StaleNode(id))
    }

    pub fn get(&self, id: NodeId) -> Result<&Segment, TrackError> {
        self.node(id).map(|n| &n.segment)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut Segment, TrackError> {
        self.node_mut(id).map(|n| &mut n.segment)
    }

    pub fn prev(&self, id: NodeId) -> Result<Option<NodeId>, TrackError> {
        self.node(id).map(|n| n.prev)
    }

    pub fn next(&self, id: NodeId) -> Result<Option<NodeId>, TrackError> {
        self.node(id).map(|n| n.next)
    }

    // ── Structural mutation ─────────────────────────────────────────────────

    /// Append at the tail. Used when building a track from ingested records.
    pub fn push_back(&mut self, segment: Segment) -> NodeId {
        let id = self.alloc(segment, self.tail, None);
        match self.tail {
            Some(tail) => self.link_next(tail, Some(id)),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.size += 1;
        id
    }

    /// Splice `segment` in immediately after `anchor`.
    pub fn insert_after(
        &mut self,
        segment: Segment,
        anchor: NodeId,
    ) -> Result<NodeId, TrackError> {
        let old_next = self.node(anchor)?.next;

        let id = self.alloc(segment, Some(anchor), old_next);
        self.link_next(anchor, Some(id));
        match old_next {
            Some(next) => self.link_prev(next, Some(id)),
            None => self.tail = Some(id),
        }
        self.size += 1;
        Ok(id)
    }

    /// Splice `segment` in immediately before `anchor`.
    pub fn insert_before(
        &mut self,
        segment: Segment,
        anchor: NodeId,
    ) -> Result<NodeId, TrackError> {
        let old_prev = self.node(anchor)?.prev;

        let id = self.alloc(segment, old_prev, Some(anchor));
        self.link_prev(anchor, Some(id));
        match old_prev {
            Some(prev) => self.link_next(prev, Some(id)),
            None => self.head = Some(id),
        }
        self.size += 1;
        Ok(id)
    }

    /// Detach the head and return its segment.
    pub fn remove_front(&mut self) -> Result<Segment, TrackError> {
        let head = self.head.ok_or(TrackError::Empty)?;
        let node = self.release(head)?;

        self.head = node.next;
        match node.next {
            Some(next) => self.link_prev(next, None),
            None => self.tail = None,
        }
        self.size -= 1;
        Ok(node.segment)
    }

    /// Detach the tail and return its segment.
    pub fn remove_back(&mut self) -> Result<Segment, TrackError> {
        let tail = self.tail.ok_or(TrackError::Empty)?;
        let node = self.release(tail)?;

        self.tail = node.prev;
        match node.prev {
            Some(prev) => self.link_next(prev, None),
            None => self.head = None,
        }
        self.size -= 1;
        Ok(node.segment)
    }

    /// Unlink a node that has both neighbours. Head and tail must go through
    /// [`Self::remove_front`] / [`Self::remove_back`], which also maintain the
    /// track's endpoints.
    pub fn remove_interior(&mut self, id: NodeId) -> Result<Segment, TrackError> {
        let (prev, next) = match self.node(id)? {
            SegmentNode {
                prev: Some(prev),
                next: Some(next),
                ..
            } => (*prev, *next),
            _ => return Err(TrackError::NotInterior(id)),
        };

        let node = self.release(id)?;
        self.link_next(prev, Some(next));
        self.link_prev(next, Some(prev));
        self.size -= 1;
        Ok(node.segment)
    }

    /// Remove any node, routing endpoints to the front/back primitives.
    pub fn remove(&mut self, id: NodeId) -> Result<Segment, TrackError> {
        let node = self.node(id)?;
        match (node.prev, node.next) {
            (None, _) => self.remove_front(),
            (_, None) => self.remove_back(),
            _ => self.remove_interior(id),
        }
    }

    // ── Queries ─────────────────────────────────────────────────────────────

    /// Forward iteration from head to tail. Call again to restart.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            track: self,
            cursor: self.head,
            remaining: self.size,
            forward: true,
        }
    }

    /// Backward iteration from tail to head.
    pub fn iter_rev(&self) -> Iter<'_> {
        Iter {
            track: self,
            cursor: self.tail,
            remaining: self.size,
            forward: false,
        }
    }

    /// Earliest start `id` may be moved to: the previous segment's end, or
    /// `None` when `id` is the head.
    pub fn min_offset(&self, id: NodeId) -> Result<Option<i64>, TrackError> {
        match self.node(id)?.prev {
            Some(prev) => Ok(Some(self.get(prev)?.end_ms)),
            None => Ok(None),
        }
    }

    /// Latest end `id` may be moved to: the next segment's start, or `None`
    /// when `id` is the tail.
    pub fn max_offset(&self, id: NodeId) -> Result<Option<i64>, TrackError> {
        match self.node(id)?.next {
            Some(next) => Ok(Some(self.get(next)?.start_ms)),
            None => Ok(None),
        }
    }

    /// Playback cue lookup: the first node whose `[start, end)` contains `ms`.
    pub fn segment_at(&self, ms: i64) -> Option<NodeId> {
        self.iter()
            .find(|(_, s)| s.start_ms <= ms && ms < s.end_ms)
            .map(|(id, _)| id)
    }

    // ── Internal ────────────────────────────────────────────────────────────

    fn slot_index(&self, id: NodeId) -> Result<usize, TrackError> {
        if id.track != self.tag {
            return Err(TrackError::ForeignNode(id));
        }
        let idx = id.index as usize;
        match self.slots.get(idx) {
            Some(slot) if slot.generation == id.generation && slot.node.is_some() => Ok(idx),
            _ => Err(TrackError::StaleNode(id)),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut SegmentNode, TrackError> {
        let idx = self.slot_index(id)?;
        self.slots[idx].node.as_mut().ok_or(TrackError::StaleNode(id))
    }

    fn alloc(&mut self, segment: Segment, prev: Option<NodeId>, next: Option<NodeId>) -> NodeId {
        let node = SegmentNode {
            segment,
            prev,
            next,
        };

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId {
                track: self.tag,
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            track: self.tag,
            index,
            generation: 0,
        }
    }

    /// Vacate the slot and invalidate outstanding handles to it. The returned
    /// node still holds its old links; callers re-link its neighbours.
    fn release(&mut self, id: NodeId) -> Result<SegmentNode, TrackError> {
        let idx = self.slot_index(id)?;
        let slot = &mut self.slots[idx];
        let node = slot.node.take().ok_or(TrackError::StaleNode(id))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Ok(node)
    }

    // Links are only rewritten for handles the track itself produced, so a
    // missing slot here would mean the chain is already corrupt.
    fn link_next(&mut self, id: NodeId, next: Option<NodeId>) {
        if let Ok(node) = self.node_mut(id) {
            node.next = next;
        }
    }

    fn link_prev(&mut self, id: NodeId, prev: Option<NodeId>) {
        if let Ok(node) = self.node_mut(id) {
            node.prev = prev;
        }
    }
}

impl Default for SegmentTrack {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Iter<'a> {
    track: &'a SegmentTrack,
    cursor: Option<NodeId>,
    remaining: usize,
    forward: bool,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (NodeId, &'a Segment);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let node = self.track.node(id).ok()?;
        self.cursor = if self.forward { node.next } else { node.prev };
        self.remaining = self.remaining.saturating_sub(1);
        Some((id, &node.segment))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

impl<'a> IntoIterator for &'a SegmentTrack {
    type Item = (NodeId, &'a Segment);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
