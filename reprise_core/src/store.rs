// Copyright 2026 the Reprise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Append-only slot storage backing a display list.

use alloc::vec::Vec;

use kurbo::Rect;

use crate::error::ListError;
use crate::node::Slot;
use crate::trace::GrowEvent;

/// Slot capacity reserved by the first append unless configured otherwise.
pub const INITIAL_CAPACITY: usize = 256;

/// Where an appended node landed.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Appended {
    /// Slot offset of the node's header.
    pub(crate) offset: usize,
    /// Set if the append had to reallocate.
    pub(crate) grew: Option<GrowEvent>,
}

/// Flat, growable sequence of encoded nodes.
///
/// Nodes are addressed by slot offset. Offsets stay valid for the life of the
/// store: growth moves the slots to a larger allocation but never reorders or
/// removes them. Capacity starts at `initial_capacity` and doubles whenever an
/// append does not fit.
#[derive(Clone, Debug)]
pub(crate) struct NodeStore {
    slots: Vec<Slot>,
    nodes: usize,
    initial_capacity: usize,
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStore {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            nodes: 0,
            initial_capacity: INITIAL_CAPACITY,
        }
    }

    pub(crate) fn set_initial_capacity(&mut self, capacity: usize) {
        self.initial_capacity = capacity.max(1);
    }

    pub(crate) fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub(crate) fn node_count(&self) -> usize {
        self.nodes
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Moves one encoded node from `node` to the end of the store.
    ///
    /// On failure nothing is appended and `node` is left as it was.
    pub(crate) fn append(&mut self, node: &mut Vec<Slot>) -> Result<Appended, ListError> {
        debug_assert!(
            matches!(node.first(), Some(Slot::Header(h)) if usize::from(h.size) == node.len()),
            "node size must match its slot count"
        );
        let offset = self.slots.len();
        let needed = offset
            .checked_add(node.len())
            .ok_or(ListError::AllocationFailure {
                requested: usize::MAX,
            })?;
        let grew = self.grow_to(needed)?;
        self.slots.append(node);
        self.nodes += 1;
        Ok(Appended { offset, grew })
    }

    /// Makes room for `needed` slots in total, doubling capacity as needed.
    fn grow_to(&mut self, needed: usize) -> Result<Option<GrowEvent>, ListError> {
        let from = self.slots.capacity();
        if needed <= from {
            return Ok(None);
        }
        let mut to = from.max(self.initial_capacity);
        while to < needed {
            to = to
                .checked_mul(2)
                .ok_or(ListError::AllocationFailure { requested: needed })?;
        }
        self.slots
            .try_reserve_exact(to - self.slots.len())
            .map_err(|_| ListError::AllocationFailure { requested: to })?;
        Ok(Some(GrowEvent {
            from,
            to: self.slots.capacity(),
        }))
    }

    /// Overwrites the rect block at `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot` does not hold a rect block.
    pub(crate) fn set_rect(&mut self, slot: usize, rect: Rect) {
        match self.slots.get_mut(slot) {
            Some(Slot::Rect(r)) => *r = rect,
            other => panic!("slot {slot} is not a rect block: {other:?}"),
        }
    }

    /// Returns the header of the node at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is not the start of a node.
    #[cfg(test)]
    pub(crate) fn header(&self, offset: usize) -> crate::node::NodeHeader {
        match self.slots.get(offset) {
            Some(Slot::Header(h)) => *h,
            other => panic!("malformed display list node at slot {offset}: {other:?}"),
        }
    }
}
