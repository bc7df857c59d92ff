// Copyright 2026 the Reprise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The shared display-list handle.

use alloc::sync::Arc;
use alloc::vec::Vec;

use kurbo::{Affine, Rect};

use crate::cookie::Cookie;
use crate::device::Device;
use crate::geometry::union_into;
use crate::node::{NodeHeader, Slot};
use crate::player::{self, RunOutcome};
use crate::store::NodeStore;
use crate::trace::Tracer;

/// The node range spanned by one marked-content item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagRange {
    /// Marked-content id.
    pub id: i32,
    /// Tag name.
    pub tag: Arc<str>,
    /// Ordinal of the `begin_marked_content` node.
    pub start: usize,
    /// Ordinal of the closing `end_layer` node, once recorded.
    pub end: Option<usize>,
}

#[derive(Clone, Debug)]
pub(crate) struct ListData {
    pub(crate) mediabox: Rect,
    pub(crate) store: NodeStore,
    /// Union of the visible content recorded outside any tile.
    pub(crate) bounds: Option<Rect>,
    pub(crate) tags: Vec<TagRange>,
}

/// A recorded stream of drawing calls.
///
/// Cloning a `DisplayList` takes another reference to the same recording and
/// dropping one releases it; the recording is freed with its last handle. A
/// list is only ever written through a
/// [`Recorder`](crate::recorder::Recorder), which hands it back frozen, so any
/// number of threads may replay the same list at once.
#[derive(Clone, Debug)]
pub struct DisplayList(Arc<ListData>);

impl DisplayList {
    /// Creates an empty list covering `mediabox`.
    #[must_use]
    pub fn new(mediabox: Rect) -> Self {
        Self(Arc::new(ListData {
            mediabox,
            store: NodeStore::new(),
            bounds: None,
            tags: Vec::new(),
        }))
    }

    pub(crate) fn from_data(data: ListData) -> Self {
        Self(Arc::new(data))
    }

    /// Takes the list's contents, copying them if other handles share them.
    pub(crate) fn into_data(self) -> ListData {
        Arc::unwrap_or_clone(self.0)
    }

    pub(crate) fn data(&self) -> &ListData {
        &self.0
    }

    /// The declared page area.
    #[must_use]
    pub fn mediabox(&self) -> Rect {
        self.0.mediabox
    }

    /// The mediabox grown to cover everything the list draws.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        let content = self.0.bounds.unwrap_or(Rect::ZERO);
        union_into(union_into(None, self.0.mediabox), content).unwrap_or(self.0.mediabox)
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.store.node_count() == 0
    }

    /// Number of recorded nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.store.node_count()
    }

    /// Number of slots the nodes occupy.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.0.store.slots().len()
    }

    /// Marked-content items in the order they were opened.
    #[must_use]
    pub fn tags(&self) -> &[TagRange] {
        &self.0.tags
    }

    /// Iterates over the node headers in recording order.
    #[must_use]
    pub fn nodes(&self) -> Nodes<'_> {
        Nodes {
            slots: self.0.store.slots(),
            offset: 0,
            index: 0,
            remaining: self.len(),
        }
    }

    /// Number of live handles to this recording.
    #[must_use]
    pub fn strong_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    /// Returns `true` if both handles refer to the same recording.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Replays the list into `device`.
    ///
    /// `ctm` is applied on top of every recorded transform and `scissor`
    /// (in device space) bounds what is considered visible. Pass
    /// [`INFINITE_RECT`](crate::geometry::INFINITE_RECT) to replay everything.
    pub fn run(
        &self,
        device: &mut dyn Device,
        ctm: Affine,
        scissor: Rect,
        cookie: Option<&Cookie>,
    ) -> RunOutcome {
        player::run(self, device, ctm, scissor, cookie, &mut Tracer::none())
    }

    /// Like [`run`](Self::run), reporting to `tracer`.
    pub fn run_traced(
        &self,
        device: &mut dyn Device,
        ctm: Affine,
        scissor: Rect,
        cookie: Option<&Cookie>,
        tracer: &mut Tracer<'_>,
    ) -> RunOutcome {
        player::run(self, device, ctm, scissor, cookie, tracer)
    }
}

/// A node's position and header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeRef {
    /// Ordinal of the node.
    pub index: usize,
    /// Slot offset of the header.
    pub offset: usize,
    /// The header.
    pub header: NodeHeader,
}

/// An iterator over the nodes of a list.
///
/// Created by [`DisplayList::nodes`]. Steps by each header's `size` without
/// decoding any blocks.
#[derive(Debug)]
pub struct Nodes<'a> {
    slots: &'a [Slot],
    offset: usize,
    index: usize,
    remaining: usize,
}

impl Iterator for Nodes<'_> {
    type Item = NodeRef;

    fn next(&mut self) -> Option<NodeRef> {
        let slot = self.slots.get(self.offset)?;
        let Slot::Header(header) = slot else {
            panic!("malformed display list node at slot {}: {slot:?}", self.offset);
        };
        let node = NodeRef {
            index: self.index,
            offset: self.offset,
            header: *header,
        };
        self.offset += usize::from(header.size);
        self.index += 1;
        self.remaining = self.remaining.saturating_sub(1);
        Some(node)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Nodes<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Device as _;
    use crate::node::Command;
    use crate::payload::FillRule;
    use crate::recorder::Recorder;
    use crate::testing::{black, rect_path, sample_page};

    #[test]
    fn new_list_is_empty() {
        let mediabox = Rect::new(0.0, 0.0, 612.0, 792.0);
        let list = DisplayList::new(mediabox);
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
        assert_eq!(list.slot_count(), 0);
        assert_eq!(list.bounds(), mediabox);
        assert_eq!(list.nodes().count(), 0);
        assert!(list.tags().is_empty());
    }

    #[test]
    fn stepping_visits_every_node_once() {
        let list = sample_page();
        let nodes: Vec<_> = list.nodes().collect();
        assert_eq!(nodes.len(), list.len());
        assert_eq!(list.nodes().len(), list.len());
        let mut expected_offset = 0;
        for (i, node) in nodes.iter().enumerate() {
            assert_eq!(node.index, i);
            assert_eq!(node.offset, expected_offset);
            expected_offset += usize::from(node.header.size);
        }
        assert_eq!(expected_offset, list.slot_count(), "no gap or overlap at the end");
    }

    #[test]
    fn clone_and_drop_track_references() {
        let list = DisplayList::new(Rect::ZERO);
        let other = list.clone();
        assert_eq!(list.strong_count(), 2);
        assert!(list.ptr_eq(&other));
        drop(other);
        assert_eq!(list.strong_count(), 1);
    }

    #[test]
    fn bounds_cover_content_outside_the_mediabox() {
        let mediabox = Rect::new(0.0, 0.0, 100.0, 100.0);
        let mut rec = Recorder::new(DisplayList::new(mediabox));
        let path = rect_path(90.0, 90.0, 150.0, 120.0);
        rec.fill_path(&path, FillRule::NonZero, Affine::IDENTITY, &black());
        let list = rec.finish().unwrap();
        assert_eq!(list.bounds(), Rect::new(0.0, 0.0, 150.0, 120.0));
        assert_eq!(list.mediabox(), mediabox);
        let first = list.nodes().next().unwrap();
        assert_eq!(first.header.command, Command::FillPath);
    }
}
