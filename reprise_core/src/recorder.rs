// Copyright 2026 the Reprise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The list device: turns drawing calls into encoded nodes.
//!
//! A [`Recorder`] takes a [`DisplayList`] by value, implements [`Device`], and
//! hands the list back frozen from [`Recorder::finish`]. Every call is diffed
//! against the state the previous node left behind (see [`crate::node`]), so
//! a run of fills that only change their path costs one path block each.
//!
//! # Scopes
//!
//! Clip-like scopes (clips, soft masks, groups, tiles) and structural scopes
//! (layers, marked-content items) live on separate stacks, so a layer may
//! straddle a clip boundary but a `pop_clip` can never close a group. A call
//! sequence that cannot nest is latched as a [`StructuralViolation`]: the
//! offending call is dropped, every later call is ignored, and `finish`
//! reports the error.
//!
//! # Clip tightening
//!
//! With [`RecorderConfig::tighten_clips`] set, the rect stored with a clip,
//! mask, or group is rewritten at its matching pop to the part of the scope
//! that content was actually drawn into. A replay whose scissor misses that
//! rect skips the whole scope without decoding its content into calls.
//! Content inside tiles never contributes, since a tile repeats it.

use alloc::sync::Arc;
use alloc::vec::Vec;

use kurbo::{Affine, Rect};

use crate::color::{BlendMode, ColorParams, ColorSpace, DefaultColorSpaces};
use crate::device::{Device, Paint, RenderFlags};
use crate::error::{ListError, ScopeKind, StructuralViolation};
use crate::geometry::{INFINITE_RECT, intersect, is_infinite, union_into};
use crate::image::Image;
use crate::list::{DisplayList, ListData, TagRange};
use crate::node::{Command, Decoder, Encoder, NodeFlags, Payload, Slot, Update};
use crate::payload::{FillRule, Path, Shade, StrokeState, Text};
use crate::store::INITIAL_CAPACITY;
#[cfg(feature = "trace-rich")]
use crate::trace::RecordEvent;
use crate::trace::{RecordSummary, Tracer};

/// Nesting limit of [`RecorderConfig::legacy`].
pub const LEGACY_MAX_DEPTH: usize = 96;

/// Recorder settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecorderConfig {
    /// Deepest allowed nesting of scopes of any kind, or `None` for no limit.
    pub max_depth: Option<usize>,
    /// Slot capacity reserved by the first append.
    pub initial_capacity: usize,
    /// Shrink clip, mask, and group rects to the content drawn inside them.
    pub tighten_clips: bool,
}

impl RecorderConfig {
    /// No nesting limit. This is the default.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            max_depth: None,
            initial_capacity: INITIAL_CAPACITY,
            tighten_clips: true,
        }
    }

    /// Rejects nesting deeper than `max_depth`.
    #[must_use]
    pub const fn bounded(max_depth: usize) -> Self {
        Self {
            max_depth: Some(max_depth),
            ..Self::unbounded()
        }
    }

    /// The fixed stack depth of older list devices.
    #[must_use]
    pub const fn legacy() -> Self {
        Self::bounded(LEGACY_MAX_DEPTH)
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[derive(Clone, Copy, Debug)]
struct ClipFrame {
    kind: ScopeKind,
    /// Store slot of the push node's rect block, when it is to be tightened.
    rect_slot: Option<usize>,
    /// Area the scope can affect.
    clip: Rect,
    /// Union of what was drawn inside.
    content: Option<Rect>,
}

#[derive(Clone, Copy, Debug)]
enum StructFrame {
    Layer,
    /// Index into the list's tags.
    Tag(usize),
}

/// A [`Device`] that records into a [`DisplayList`].
#[derive(Debug)]
pub struct Recorder<'t> {
    data: ListData,
    encoder: Encoder,
    scratch: Vec<Slot>,
    config: RecorderConfig,
    clips: Vec<ClipFrame>,
    structure: Vec<StructFrame>,
    tiled: usize,
    grows: u32,
    error: Option<ListError>,
    tracer: Tracer<'t>,
}

impl<'t> Recorder<'t> {
    /// Starts recording at the end of `list` with the default configuration.
    ///
    /// If other handles still share `list`, its contents are copied first so
    /// they never observe the new nodes.
    #[must_use]
    pub fn new(list: DisplayList) -> Self {
        Self::with_config(list, RecorderConfig::default())
    }

    /// Starts recording with the given configuration.
    #[must_use]
    pub fn with_config(list: DisplayList, config: RecorderConfig) -> Self {
        Self::with_tracer(list, config, Tracer::none())
    }

    /// Starts recording, reporting to `tracer`.
    #[must_use]
    pub fn with_tracer(list: DisplayList, config: RecorderConfig, tracer: Tracer<'t>) -> Self {
        let mut data = list.into_data();
        data.store.set_initial_capacity(config.initial_capacity);
        let encoder = if data.store.node_count() == 0 {
            Encoder::new()
        } else {
            let mut state = Decoder::new();
            let slots = data.store.slots();
            let mut offset = 0;
            while offset < slots.len() {
                offset += usize::from(state.decode(&slots[offset..]).header.size);
            }
            Encoder::resume(&state)
        };
        Self {
            data,
            encoder,
            scratch: Vec::new(),
            config,
            clips: Vec::new(),
            structure: Vec::new(),
            tiled: 0,
            grows: 0,
            error: None,
            tracer,
        }
    }

    /// The first error, if recording has failed.
    #[must_use]
    pub fn error(&self) -> Option<&ListError> {
        self.error.as_ref()
    }

    /// Number of scopes currently open.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.clips.len() + self.structure.len()
    }

    /// Number of nodes in the list so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.store.node_count()
    }

    /// Returns `true` if the list has no nodes yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ends recording and returns the frozen list.
    ///
    /// # Errors
    ///
    /// Returns the first error latched while recording, or
    /// [`StructuralViolation::Unbalanced`] if scopes are still open.
    pub fn finish(mut self) -> Result<DisplayList, ListError> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        let open = self.depth();
        if open > 0 {
            let err = ListError::from(StructuralViolation::Unbalanced { open });
            log::warn!("display list recording failed: {err}");
            return Err(err);
        }
        let nodes = self.data.store.node_count();
        let slots = self.data.store.slots().len();
        let capacity = self.data.store.capacity();
        let list = DisplayList::from_data(self.data);
        self.tracer.record_summary(&RecordSummary {
            nodes,
            slots,
            capacity,
            grows: self.grows,
            bounds: list.bounds(),
        });
        log::debug!("recorded {nodes} nodes in {slots} slots");
        Ok(list)
    }

    // -- Internals --

    fn fail(&mut self, err: impl Into<ListError>) {
        let err = err.into();
        log::warn!("display list recording failed: {err}");
        self.error = Some(err);
    }

    /// Encodes and appends one node. Returns the store slot of its rect
    /// block (if any), or `None` if recording has failed.
    fn emit(
        &mut self,
        command: Command,
        flags: NodeFlags,
        update: &Update<'_>,
        payload: Option<Payload>,
    ) -> Option<Option<usize>> {
        if self.error.is_some() {
            return None;
        }
        let encoded = self
            .encoder
            .encode(command, flags, update, payload, &mut self.scratch);
        match self.data.store.append(&mut self.scratch) {
            Ok(appended) => {
                if let Some(grow) = appended.grew {
                    self.grows += 1;
                    log::trace!("node store grew from {} to {} slots", grow.from, grow.to);
                    self.tracer.grow(&grow);
                }
                #[cfg(feature = "trace-rich")]
                self.tracer.record(&RecordEvent {
                    index: self.data.store.node_count() - 1,
                    command,
                    size: encoded.header.size,
                });
                Some(encoded.rect_offset.map(|o| appended.offset + o))
            }
            Err(err) => {
                self.fail(err);
                None
            }
        }
    }

    fn add_content(&mut self, rect: Rect) {
        if self.tiled > 0 {
            return;
        }
        match self.clips.last_mut() {
            Some(frame) => frame.content = union_into(frame.content, rect),
            None if !is_infinite(rect) => self.data.bounds = union_into(self.data.bounds, rect),
            None => {}
        }
    }

    fn draw(
        &mut self,
        command: Command,
        flags: NodeFlags,
        update: &Update<'_>,
        payload: Option<Payload>,
    ) {
        if self.emit(command, flags, update, payload).is_some() {
            self.add_content(update.rect.unwrap_or(Rect::ZERO));
        }
    }

    /// Fails with `DepthExceeded` if one more scope would pass the limit.
    fn check_depth(&mut self) -> bool {
        if self.error.is_some() {
            return false;
        }
        match self.config.max_depth {
            Some(limit) if self.depth() >= limit => {
                self.fail(StructuralViolation::DepthExceeded { limit });
                false
            }
            _ => true,
        }
    }

    fn push_scope(
        &mut self,
        kind: ScopeKind,
        command: Command,
        flags: NodeFlags,
        mut update: Update<'_>,
        payload: Option<Payload>,
    ) {
        if !self.check_depth() {
            return;
        }
        let tighten = self.config.tighten_clips && self.tiled == 0 && kind != ScopeKind::Tile;
        update.force_rect = tighten;
        let Some(rect_slot) = self.emit(command, flags, &update, payload) else {
            return;
        };
        // The rect slot may be rewritten later; later nodes must not lean on it.
        self.encoder.forget_rect();
        self.clips.push(ClipFrame {
            kind,
            rect_slot: rect_slot.filter(|_| tighten),
            clip: update.rect.unwrap_or(INFINITE_RECT),
            content: None,
        });
    }

    /// Validates and records a pop of a `kind` scope, returning its frame.
    fn pop_scope(&mut self, command: Command, kind: ScopeKind) -> Option<ClipFrame> {
        if self.error.is_some() {
            return None;
        }
        match self.clips.last() {
            None => {
                self.fail(StructuralViolation::PopWithoutPush { command });
                return None;
            }
            Some(top) if top.kind != kind => {
                let open = top.kind;
                self.fail(StructuralViolation::Mismatch { command, open });
                return None;
            }
            Some(_) => {}
        }
        self.emit(command, NodeFlags::empty(), &Update::default(), None)?;
        self.clips.pop()
    }

    fn close_scope(&mut self, frame: ClipFrame) {
        let visible = frame
            .content
            .map_or(Rect::ZERO, |content| intersect(frame.clip, content));
        if let Some(slot) = frame.rect_slot {
            self.data.store.set_rect(slot, visible);
        }
        self.add_content(visible);
    }

    fn push_structure(&mut self, command: Command, payload: Payload, tag: Option<(Arc<str>, i32)>) {
        if !self.check_depth() {
            return;
        }
        let start = self.len();
        if self
            .emit(command, NodeFlags::empty(), &Update::default(), Some(payload))
            .is_none()
        {
            return;
        }
        let frame = match tag {
            Some((tag, id)) => {
                self.data.tags.push(TagRange {
                    id,
                    tag,
                    start,
                    end: None,
                });
                StructFrame::Tag(self.data.tags.len() - 1)
            }
            None => StructFrame::Layer,
        };
        self.structure.push(frame);
    }
}

fn paint_update<'a>(paint: &'a Paint<'_>, rect: Rect, ctm: Affine) -> Update<'a> {
    Update {
        rect: Some(rect),
        color: Some((paint.colorspace, paint.color)),
        alpha: Some(paint.alpha),
        ctm: Some(ctm),
        ..Update::default()
    }
}

impl Device for Recorder<'_> {
    fn fill_path(&mut self, path: &Path, rule: FillRule, ctm: Affine, paint: &Paint<'_>) {
        let update = Update {
            path: Some(path),
            ..paint_update(paint, path.bounds(None, ctm), ctm)
        };
        let flags = NodeFlags::from_fill_rule(rule).with_color_params(paint.params);
        self.draw(Command::FillPath, flags, &update, None);
    }

    fn stroke_path(&mut self, path: &Path, stroke: &StrokeState, ctm: Affine, paint: &Paint<'_>) {
        let update = Update {
            path: Some(path),
            stroke: Some(stroke),
            ..paint_update(paint, path.bounds(Some(stroke), ctm), ctm)
        };
        let flags = NodeFlags::empty().with_color_params(paint.params);
        self.draw(Command::StrokePath, flags, &update, None);
    }

    fn clip_path(&mut self, path: &Path, rule: FillRule, ctm: Affine, scissor: Rect) {
        let update = Update {
            rect: Some(intersect(path.bounds(None, ctm), scissor)),
            path: Some(path),
            ctm: Some(ctm),
            ..Update::default()
        };
        let flags = NodeFlags::from_fill_rule(rule);
        self.push_scope(ScopeKind::Clip, Command::ClipPath, flags, update, None);
    }

    fn clip_stroke_path(&mut self, path: &Path, stroke: &StrokeState, ctm: Affine, scissor: Rect) {
        let update = Update {
            rect: Some(intersect(path.bounds(Some(stroke), ctm), scissor)),
            path: Some(path),
            stroke: Some(stroke),
            ctm: Some(ctm),
            ..Update::default()
        };
        self.push_scope(ScopeKind::Clip, Command::ClipStrokePath, NodeFlags::empty(), update, None);
    }

    fn fill_text(&mut self, text: &Text, ctm: Affine, paint: &Paint<'_>) {
        let update = paint_update(paint, text.bounds(None, ctm), ctm);
        let flags = NodeFlags::empty().with_color_params(paint.params);
        self.draw(Command::FillText, flags, &update, Some(Payload::Text(text.clone())));
    }

    fn stroke_text(&mut self, text: &Text, stroke: &StrokeState, ctm: Affine, paint: &Paint<'_>) {
        let update = Update {
            stroke: Some(stroke),
            ..paint_update(paint, text.bounds(Some(stroke), ctm), ctm)
        };
        let flags = NodeFlags::empty().with_color_params(paint.params);
        self.draw(Command::StrokeText, flags, &update, Some(Payload::Text(text.clone())));
    }

    fn clip_text(&mut self, text: &Text, ctm: Affine, scissor: Rect) {
        let update = Update {
            rect: Some(intersect(text.bounds(None, ctm), scissor)),
            ctm: Some(ctm),
            ..Update::default()
        };
        let payload = Some(Payload::Text(text.clone()));
        self.push_scope(ScopeKind::Clip, Command::ClipText, NodeFlags::empty(), update, payload);
    }

    fn clip_stroke_text(&mut self, text: &Text, stroke: &StrokeState, ctm: Affine, scissor: Rect) {
        let update = Update {
            rect: Some(intersect(text.bounds(Some(stroke), ctm), scissor)),
            stroke: Some(stroke),
            ctm: Some(ctm),
            ..Update::default()
        };
        let payload = Some(Payload::Text(text.clone()));
        let flags = NodeFlags::empty();
        self.push_scope(ScopeKind::Clip, Command::ClipStrokeText, flags, update, payload);
    }

    fn ignore_text(&mut self, text: &Text, ctm: Affine) {
        let update = Update {
            rect: Some(text.bounds(None, ctm)),
            ctm: Some(ctm),
            ..Update::default()
        };
        let payload = Some(Payload::Text(text.clone()));
        self.draw(Command::IgnoreText, NodeFlags::empty(), &update, payload);
    }

    fn fill_shade(&mut self, shade: &Shade, ctm: Affine, alpha: f32, params: ColorParams) {
        let update = Update {
            rect: Some(shade.bounds(ctm)),
            alpha: Some(alpha),
            ctm: Some(ctm),
            ..Update::default()
        };
        let flags = NodeFlags::empty().with_color_params(params);
        self.draw(Command::FillShade, flags, &update, Some(Payload::Shade(shade.clone())));
    }

    fn fill_image(&mut self, image: &Image, ctm: Affine, alpha: f32, params: ColorParams) {
        let update = Update {
            rect: Some(image.bounds(ctm)),
            alpha: Some(alpha),
            ctm: Some(ctm),
            ..Update::default()
        };
        let flags = NodeFlags::empty().with_color_params(params);
        self.draw(Command::FillImage, flags, &update, Some(Payload::Image(image.clone())));
    }

    fn fill_image_mask(&mut self, image: &Image, ctm: Affine, paint: &Paint<'_>) {
        let update = paint_update(paint, image.bounds(ctm), ctm);
        let flags = NodeFlags::empty().with_color_params(paint.params);
        self.draw(Command::FillImageMask, flags, &update, Some(Payload::Image(image.clone())));
    }

    fn clip_image_mask(&mut self, image: &Image, ctm: Affine, scissor: Rect) {
        let update = Update {
            rect: Some(intersect(image.bounds(ctm), scissor)),
            ctm: Some(ctm),
            ..Update::default()
        };
        let payload = Some(Payload::Image(image.clone()));
        let flags = NodeFlags::empty();
        self.push_scope(ScopeKind::Clip, Command::ClipImageMask, flags, update, payload);
    }

    fn pop_clip(&mut self) {
        if let Some(frame) = self.pop_scope(Command::PopClip, ScopeKind::Clip) {
            self.close_scope(frame);
        }
    }

    fn begin_mask(
        &mut self,
        area: Rect,
        luminosity: bool,
        colorspace: &ColorSpace,
        backdrop: &[f32],
        params: ColorParams,
    ) {
        let update = Update {
            rect: Some(area),
            color: Some((colorspace, backdrop)),
            ..Update::default()
        };
        let mut flags = NodeFlags::empty().with_color_params(params);
        flags.set(NodeFlags::LUMINOSITY, luminosity);
        self.push_scope(ScopeKind::MaskDefinition, Command::BeginMask, flags, update, None);
    }

    fn end_mask(&mut self) {
        if self.error.is_some() {
            return;
        }
        let command = Command::EndMask;
        match self.clips.last() {
            None => {
                self.fail(StructuralViolation::PopWithoutPush { command });
                return;
            }
            Some(top) if top.kind != ScopeKind::MaskDefinition => {
                let open = top.kind;
                self.fail(StructuralViolation::Mismatch { command, open });
                return;
            }
            Some(_) => {}
        }
        if self
            .emit(command, NodeFlags::empty(), &Update::default(), None)
            .is_none()
        {
            return;
        }
        // The mask now clips whatever follows, up to the next pop_clip.
        if let Some(top) = self.clips.last_mut() {
            top.kind = ScopeKind::Clip;
            top.content = None;
        }
    }

    fn begin_group(
        &mut self,
        area: Rect,
        colorspace: Option<&ColorSpace>,
        isolated: bool,
        knockout: bool,
        blend: BlendMode,
        alpha: f32,
    ) {
        let update = Update {
            rect: Some(area),
            alpha: Some(alpha),
            ..Update::default()
        };
        let mut flags = NodeFlags::empty();
        flags.set(NodeFlags::ISOLATED, isolated);
        flags.set(NodeFlags::KNOCKOUT, knockout);
        let payload = Payload::Group {
            colorspace: colorspace.cloned(),
            blend,
        };
        self.push_scope(ScopeKind::Group, Command::BeginGroup, flags, update, Some(payload));
    }

    fn end_group(&mut self) {
        if let Some(frame) = self.pop_scope(Command::EndGroup, ScopeKind::Group) {
            self.close_scope(frame);
        }
    }

    fn begin_tile(
        &mut self,
        area: Rect,
        view: Rect,
        xstep: f64,
        ystep: f64,
        ctm: Affine,
        id: u64,
    ) -> bool {
        let update = Update {
            rect: Some(area),
            ctm: Some(ctm),
            ..Update::default()
        };
        let payload = Payload::Tile {
            view,
            xstep,
            ystep,
            id,
        };
        if self.error.is_some() {
            return false;
        }
        // The tile paints its area; what it repeats does not count.
        self.add_content(area);
        let before = self.clips.len();
        let flags = NodeFlags::empty();
        self.push_scope(ScopeKind::Tile, Command::BeginTile, flags, update, Some(payload));
        if self.clips.len() > before {
            self.tiled += 1;
        }
        false
    }

    fn end_tile(&mut self) {
        if self.pop_scope(Command::EndTile, ScopeKind::Tile).is_some() {
            self.tiled -= 1;
        }
    }

    fn render_flags(&mut self, set: RenderFlags, clear: RenderFlags) {
        let payload = Payload::RenderFlags { set, clear };
        _ = self.emit(Command::RenderFlags, NodeFlags::empty(), &Update::default(), Some(payload));
    }

    fn set_default_colorspaces(&mut self, defaults: &DefaultColorSpaces) {
        let payload = Payload::DefaultColorSpaces(Arc::new(defaults.clone()));
        let update = Update::default();
        _ = self.emit(Command::DefaultColorSpaces, NodeFlags::empty(), &update, Some(payload));
    }

    fn begin_layer(&mut self, name: &str) {
        self.push_structure(Command::BeginLayer, Payload::Layer(name.into()), None);
    }

    fn begin_marked_content(&mut self, tag: &str, mcid: i32) {
        let tag: Arc<str> = tag.into();
        let payload = Payload::MarkedContent {
            tag: tag.clone(),
            mcid,
        };
        self.push_structure(Command::BeginMarkedContent, payload, Some((tag, mcid)));
    }

    fn end_layer(&mut self) {
        if self.error.is_some() {
            return;
        }
        if self.structure.is_empty() {
            self.fail(StructuralViolation::PopWithoutPush {
                command: Command::EndLayer,
            });
            return;
        }
        let end = self.len();
        if self
            .emit(Command::EndLayer, NodeFlags::empty(), &Update::default(), None)
            .is_none()
        {
            return;
        }
        if let Some(StructFrame::Tag(i)) = self.structure.pop() {
            self.data.tags[i].end = Some(end);
        }
    }
}
