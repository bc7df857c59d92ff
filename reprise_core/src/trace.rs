// Copyright 2026 the Reprise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for recording and replay.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! recorder and the player call as they work. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! [`RunSummaryBuilder`] counts what a replay did with each node and produces
//! a [`RunSummary`] at the end.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates the per-node [`RecordEvent`] and
//!   [`NodeCulledEvent`] plus the corresponding `TraceSink` methods.

use kurbo::{Affine, Rect};

#[cfg(feature = "trace-rich")]
use crate::node::Command;
use crate::player::RunOutcome;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted for every node the recorder appends.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct RecordEvent {
    /// Ordinal of the node in the list.
    pub index: usize,
    /// Recorded operation.
    pub command: Command,
    /// Slots the node occupies.
    pub size: u16,
}

/// Emitted when the node store reallocates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GrowEvent {
    /// Slot capacity before growing.
    pub from: usize,
    /// Slot capacity after growing.
    pub to: usize,
}

/// Emitted when a recording finishes successfully.
#[derive(Clone, Copy, Debug)]
pub struct RecordSummary {
    /// Nodes recorded.
    pub nodes: usize,
    /// Slots used.
    pub slots: usize,
    /// Slot capacity at the end.
    pub capacity: usize,
    /// How many times the store grew.
    pub grows: u32,
    /// Bounds of the recorded list.
    pub bounds: Rect,
}

/// Emitted when a replay starts.
#[derive(Clone, Copy, Debug)]
pub struct RunBeginEvent {
    /// Nodes in the list being replayed.
    pub nodes: usize,
    /// Caller transform.
    pub ctm: Affine,
    /// Caller scissor.
    pub scissor: Rect,
}

/// Emitted when the player skips a node.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct NodeCulledEvent {
    /// Ordinal of the node in the list.
    pub index: usize,
    /// The skipped operation.
    pub command: Command,
    /// The node's rect in device space.
    pub rect: Rect,
    /// Whether the node lay inside an already culled scope.
    pub nested: bool,
}

/// Per-replay summary produced by [`RunSummaryBuilder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// Nodes in the list.
    pub nodes: usize,
    /// Nodes decoded before the replay ended.
    pub visited: usize,
    /// Calls issued to the target device.
    pub issued: usize,
    /// Nodes skipped by culling or tile caching.
    pub culled: usize,
    /// How the replay ended.
    pub outcome: RunOutcome,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the recorder and the player.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called for every appended node (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_record(&mut self, e: &RecordEvent) {
        _ = e;
    }

    /// Called when the node store grows.
    fn on_grow(&mut self, e: &GrowEvent) {
        _ = e;
    }

    /// Called when a recording finishes.
    fn on_record_summary(&mut self, s: &RecordSummary) {
        _ = s;
    }

    /// Called when a replay starts.
    fn on_run_begin(&mut self, e: &RunBeginEvent) {
        _ = e;
    }

    /// Called for every skipped node (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_node_culled(&mut self, e: &NodeCulledEvent) {
        _ = e;
    }

    /// Called with a per-replay summary.
    fn on_run_summary(&mut self, s: &RunSummary) {
        _ = s;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`RecordEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn record(&mut self, e: &RecordEvent) {
        if let Some(s) = &mut self.sink {
            s.on_record(e);
        }
    }

    /// Emits a [`GrowEvent`].
    #[inline]
    pub fn grow(&mut self, e: &GrowEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_grow(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RecordSummary`].
    #[inline]
    pub fn record_summary(&mut self, s: &RecordSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_record_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits a [`RunBeginEvent`].
    #[inline]
    pub fn run_begin(&mut self, e: &RunBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_run_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`NodeCulledEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn node_culled(&mut self, e: &NodeCulledEvent) {
        if let Some(s) = &mut self.sink {
            s.on_node_culled(e);
        }
    }

    /// Emits a [`RunSummary`].
    #[inline]
    pub fn run_summary(&mut self, s: &RunSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_run_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }
}

// ---------------------------------------------------------------------------
// RunSummaryBuilder
// ---------------------------------------------------------------------------

/// Counts node outcomes during a replay and produces a [`RunSummary`].
#[derive(Clone, Copy, Debug)]
pub struct RunSummaryBuilder {
    nodes: usize,
    visited: usize,
    issued: usize,
    culled: usize,
}

impl RunSummaryBuilder {
    /// Starts a summary for a list of `nodes` nodes.
    #[must_use]
    pub fn new(nodes: usize) -> Self {
        Self {
            nodes,
            visited: 0,
            issued: 0,
            culled: 0,
        }
    }

    /// Records that a node was decoded.
    pub fn visit(&mut self) {
        self.visited += 1;
    }

    /// Records that a call reached the target device.
    pub fn issue(&mut self) {
        self.issued += 1;
    }

    /// Records that a node was skipped.
    pub fn cull(&mut self) {
        self.culled += 1;
    }

    /// Consumes the builder and produces the final [`RunSummary`].
    #[must_use]
    pub fn finish(self, outcome: RunOutcome) -> RunSummary {
        RunSummary {
            nodes: self.nodes,
            visited: self.visited,
            issued: self.issued,
            culled: self.culled,
            outcome,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_grow(&GrowEvent { from: 0, to: 256 });
        sink.on_run_begin(&RunBeginEvent {
            nodes: 3,
            ctm: Affine::IDENTITY,
            scissor: Rect::ZERO,
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.grow(&GrowEvent { from: 256, to: 512 });
        tracer.run_summary(&RunSummaryBuilder::new(0).finish(RunOutcome::Complete));
    }

    #[test]
    fn summary_builder_counts() {
        let mut builder = RunSummaryBuilder::new(4);
        for _ in 0..3 {
            builder.visit();
        }
        builder.issue();
        builder.issue();
        builder.cull();
        let summary = builder.finish(RunOutcome::Aborted);
        assert_eq!(summary.nodes, 4);
        assert_eq!(summary.visited, 3);
        assert_eq!(summary.issued, 2);
        assert_eq!(summary.culled, 1);
        assert_eq!(summary.outcome, RunOutcome::Aborted);
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct GrowLog {
            sizes: Vec<usize>,
        }
        impl TraceSink for GrowLog {
            fn on_grow(&mut self, e: &GrowEvent) {
                self.sizes.push(e.to);
            }
        }

        let mut sink = GrowLog { sizes: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        tracer.grow(&GrowEvent { from: 0, to: 256 });
        tracer.grow(&GrowEvent { from: 256, to: 512 });
        drop(tracer);
        assert_eq!(sink.sizes, &[256, 512]);
    }
}
