// Copyright 2026 the Reprise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Differentially encoded display lists.
//!
//! `reprise_core` records a stream of drawing calls once and replays it any
//! number of times, against any [`Device`](device::Device), under any
//! transform and scissor. It is `no_std` compatible (with `alloc`).
//!
//! # Architecture
//!
//! ```text
//!   producer (interpreter, layout, ...)
//!       │  Device calls
//!       ▼
//!   Recorder ──► Encoder ──► NodeStore (slots)
//!       │                        │
//!       └── finish() ──► DisplayList (shared, frozen)
//!                                │
//!              ┌─────────────────┴─────────────────┐
//!              ▼                                   ▼
//!   DisplayList::run()                Image::from_display_list()
//!       │  Decoder, scissor stack,        │  drawn as an image
//!       │  cookie                         │  by any target
//!       ▼                                 ▼
//!   target Device                     DisplayList::run()
//! ```
//!
//! **[`node`]**: the node codec. Each node is a header plus only the state
//! blocks that differ from the node before it.
//!
//! **[`store`]**: the growable slot array nodes are appended to.
//!
//! **[`recorder`]**: a [`Device`](device::Device) that encodes calls into a
//! list, checks scope nesting, and tightens clip rects to their content.
//!
//! **[`player`]**: walks a list, rebuilds absolute state, culls against a
//! scissor stack, and re-issues the calls.
//!
//! **[`list`]**: the shared [`DisplayList`](list::DisplayList) handle and its
//! node iterator.
//!
//! **[`image`]**: images, including ones whose pixels are a display list.
//!
//! **[`device`]**, **[`payload`]**, **[`color`]**, **[`geometry`]**: the
//! drawing-call vocabulary.
//!
//! **[`cookie`]**: cooperative abort and progress for replays.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) and event types for
//! recording and replay instrumentation, with a zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-node
//!   record and cull events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;
#[cfg(test)]
extern crate std;

pub mod color;
pub mod cookie;
pub mod device;
pub mod error;
pub mod geometry;
pub mod image;
pub mod list;
pub mod node;
pub mod payload;
pub mod player;
pub mod recorder;
pub mod store;
pub mod trace;

#[cfg(test)]
mod testing;
