// Copyright 2026 the Reprise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use reprise_core::trace::{
    GrowEvent, NodeCulledEvent, RecordEvent, RecordSummary, RunBeginEvent, RunSummary, TraceSink,
};

use crate::{fmt_affine, fmt_rect};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the destination, consuming the sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_record(&mut self, e: &RecordEvent) {
        let _ = writeln!(
            self.writer,
            "[record] #{} {:?} slots={}",
            e.index, e.command, e.size,
        );
    }

    fn on_grow(&mut self, e: &GrowEvent) {
        let _ = writeln!(self.writer, "[grow] {} -> {} slots", e.from, e.to);
    }

    fn on_record_summary(&mut self, s: &RecordSummary) {
        let _ = writeln!(
            self.writer,
            "[record:done] nodes={} slots={} capacity={} grows={} bounds={}",
            s.nodes,
            s.slots,
            s.capacity,
            s.grows,
            fmt_rect(s.bounds),
        );
    }

    fn on_run_begin(&mut self, e: &RunBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[run:begin] nodes={} ctm={} scissor={}",
            e.nodes,
            fmt_affine(e.ctm),
            fmt_rect(e.scissor),
        );
    }

    fn on_node_culled(&mut self, e: &NodeCulledEvent) {
        let why = if e.nested { "nested" } else { "outside" };
        let _ = writeln!(
            self.writer,
            "[cull] #{} {:?} rect={} ({why})",
            e.index,
            e.command,
            fmt_rect(e.rect),
        );
    }

    fn on_run_summary(&mut self, s: &RunSummary) {
        let _ = writeln!(
            self.writer,
            "[run:done] visited={}/{} issued={} culled={} outcome={:?}",
            s.visited, s.nodes, s.issued, s.culled, s.outcome,
        );
    }
}
