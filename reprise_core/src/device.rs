// Copyright 2026 the Reprise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The drawing-device contract.
//!
//! A [`Device`] receives one call per drawing operation. The content
//! interpreter drives a device while parsing a page; the
//! [`Recorder`](crate::recorder::Recorder) is a device that turns those calls
//! into a display list, and [`DisplayList::run`](crate::list::DisplayList::run)
//! re-issues them against any other device.
//!
//! # Nesting
//!
//! Several calls open a scope that a later call closes:
//!
//! | Opens | Closed by |
//! |---|---|
//! | `clip_path`, `clip_stroke_path`, `clip_text`, `clip_stroke_text`, `clip_image_mask` | `pop_clip` |
//! | `begin_mask` | `end_mask`, then the mask acts as a clip until `pop_clip` |
//! | `begin_group` | `end_group` |
//! | `begin_tile` | `end_tile` |
//! | `begin_layer`, `begin_marked_content` | `end_layer` |
//!
//! Every method has a no-op default, so a device only implements the calls it
//! cares about.

use kurbo::{Affine, Rect};

use crate::color::{BlendMode, ColorParams, ColorSpace, DefaultColorSpaces};
use crate::image::Image;
use crate::payload::{FillRule, Path, Shade, StrokeState, Text};

bitflags::bitflags! {
    /// Device hints toggled by [`Device::render_flags`].
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct RenderFlags: u32 {
        /// Snap tile and image edges to the pixel grid the way tiles are.
        const GRIDFIT_AS_TILED = 1 << 0;
    }
}

/// Color, opacity, and conversion parameters for a painting call.
#[derive(Clone, Copy, Debug)]
pub struct Paint<'a> {
    /// The colorspace `color` is expressed in.
    pub colorspace: &'a ColorSpace,
    /// Color components; at least `colorspace.n()` values.
    pub color: &'a [f32],
    /// Constant opacity.
    pub alpha: f32,
    /// Color conversion parameters.
    pub params: ColorParams,
}

impl<'a> Paint<'a> {
    /// Creates an opaque paint with default color parameters.
    #[must_use]
    pub fn new(colorspace: &'a ColorSpace, color: &'a [f32]) -> Self {
        Self {
            colorspace,
            color,
            alpha: 1.0,
            params: ColorParams::default(),
        }
    }

    /// Returns a copy with the given opacity.
    #[must_use]
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self { alpha, ..self }
    }

    /// Returns a copy with the given color parameters.
    #[must_use]
    pub fn with_params(self, params: ColorParams) -> Self {
        Self { params, ..self }
    }
}

/// Receives drawing calls.
pub trait Device {
    /// Fills a path.
    fn fill_path(&mut self, path: &Path, rule: FillRule, ctm: Affine, paint: &Paint<'_>) {
        _ = (path, rule, ctm, paint);
    }

    /// Strokes a path.
    fn stroke_path(&mut self, path: &Path, stroke: &StrokeState, ctm: Affine, paint: &Paint<'_>) {
        _ = (path, stroke, ctm, paint);
    }

    /// Pushes a clip to the interior of a path.
    fn clip_path(&mut self, path: &Path, rule: FillRule, ctm: Affine, scissor: Rect) {
        _ = (path, rule, ctm, scissor);
    }

    /// Pushes a clip to the stroked outline of a path.
    fn clip_stroke_path(&mut self, path: &Path, stroke: &StrokeState, ctm: Affine, scissor: Rect) {
        _ = (path, stroke, ctm, scissor);
    }

    /// Fills glyphs.
    fn fill_text(&mut self, text: &Text, ctm: Affine, paint: &Paint<'_>) {
        _ = (text, ctm, paint);
    }

    /// Strokes glyph outlines.
    fn stroke_text(&mut self, text: &Text, stroke: &StrokeState, ctm: Affine, paint: &Paint<'_>) {
        _ = (text, stroke, ctm, paint);
    }

    /// Pushes a clip to the glyph shapes.
    fn clip_text(&mut self, text: &Text, ctm: Affine, scissor: Rect) {
        _ = (text, ctm, scissor);
    }

    /// Pushes a clip to the stroked glyph outlines.
    fn clip_stroke_text(&mut self, text: &Text, stroke: &StrokeState, ctm: Affine, scissor: Rect) {
        _ = (text, stroke, ctm, scissor);
    }

    /// Reports invisible text (for selection and extraction).
    fn ignore_text(&mut self, text: &Text, ctm: Affine) {
        _ = (text, ctm);
    }

    /// Paints a shading.
    fn fill_shade(&mut self, shade: &Shade, ctm: Affine, alpha: f32, params: ColorParams) {
        _ = (shade, ctm, alpha, params);
    }

    /// Paints an image into the unit square mapped by `ctm`.
    fn fill_image(&mut self, image: &Image, ctm: Affine, alpha: f32, params: ColorParams) {
        _ = (image, ctm, alpha, params);
    }

    /// Paints a solid color through an image used as a stencil.
    fn fill_image_mask(&mut self, image: &Image, ctm: Affine, paint: &Paint<'_>) {
        _ = (image, ctm, paint);
    }

    /// Pushes a clip to an image used as a stencil.
    fn clip_image_mask(&mut self, image: &Image, ctm: Affine, scissor: Rect) {
        _ = (image, ctm, scissor);
    }

    /// Pops the innermost clip (including an applied soft mask).
    fn pop_clip(&mut self) {}

    /// Starts defining a soft mask over `area`.
    ///
    /// `backdrop` is the color outside the mask's content, in `colorspace`.
    fn begin_mask(
        &mut self,
        area: Rect,
        luminosity: bool,
        colorspace: &ColorSpace,
        backdrop: &[f32],
        params: ColorParams,
    ) {
        _ = (area, luminosity, colorspace, backdrop, params);
    }

    /// Finishes the soft mask definition; the mask now clips until
    /// [`pop_clip`](Self::pop_clip).
    fn end_mask(&mut self) {}

    /// Opens a transparency group.
    fn begin_group(
        &mut self,
        area: Rect,
        colorspace: Option<&ColorSpace>,
        isolated: bool,
        knockout: bool,
        blend: BlendMode,
        alpha: f32,
    ) {
        _ = (area, colorspace, isolated, knockout, blend, alpha);
    }

    /// Closes the innermost transparency group.
    fn end_group(&mut self) {}

    /// Opens a tiling pattern cell.
    ///
    /// `area` is the device-space region to fill, `view` the cell in pattern
    /// space, and `ctm` maps pattern space to device space. A nonzero `id`
    /// lets the device cache rendered cells; returning `true` means the cell
    /// is already cached and its content may be skipped (the matching
    /// [`end_tile`](Self::end_tile) still follows).
    fn begin_tile(
        &mut self,
        area: Rect,
        view: Rect,
        xstep: f64,
        ystep: f64,
        ctm: Affine,
        id: u64,
    ) -> bool {
        _ = (area, view, xstep, ystep, ctm, id);
        false
    }

    /// Closes the innermost tile.
    fn end_tile(&mut self) {}

    /// Sets and clears device hints.
    fn render_flags(&mut self, set: RenderFlags, clear: RenderFlags) {
        _ = (set, clear);
    }

    /// Replaces the default colorspaces for subsequent calls.
    fn set_default_colorspaces(&mut self, defaults: &DefaultColorSpaces) {
        _ = defaults;
    }

    /// Opens an optional-content layer.
    fn begin_layer(&mut self, name: &str) {
        _ = name;
    }

    /// Opens a marked-content item (a structural tag).
    fn begin_marked_content(&mut self, tag: &str, mcid: i32) {
        _ = (tag, mcid);
    }

    /// Closes the innermost layer or marked-content item.
    fn end_layer(&mut self) {}
}

/// A [`Device`] that ignores every call.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullDevice;

impl Device for NullDevice {}
