// Copyright 2026 the Reprise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared fixtures for unit tests.

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use kurbo::{Affine, BezPath, Rect, Shape as _, Stroke};

use crate::color::{BlendMode, ColorParams, ColorSpace, DefaultColorSpaces};
use crate::cookie::Cookie;
use crate::device::{Device, Paint, RenderFlags};
use crate::geometry::INFINITE_RECT;
use crate::image::Image;
use crate::list::DisplayList;
use crate::payload::{
    FillRule, Font, Glyph, Path, Shade, Shading, ShadingKind, StrokeState, Text, TextRun,
};
use crate::recorder::Recorder;

pub(crate) static GRAY: ColorSpace = ColorSpace::DeviceGray;
pub(crate) static RGB: ColorSpace = ColorSpace::DeviceRgb;

pub(crate) fn black() -> Paint<'static> {
    Paint::new(&GRAY, &[0.0])
}

pub(crate) fn red() -> Paint<'static> {
    Paint::new(&RGB, &[1.0, 0.0, 0.0])
}

pub(crate) fn rect_path(x0: f64, y0: f64, x1: f64, y1: f64) -> Path {
    Path::new(Rect::new(x0, y0, x1, y1).to_path(0.1))
}

/// A right triangle with the same bounding box as `rect_path`.
pub(crate) fn triangle(x0: f64, y0: f64, x1: f64, y1: f64) -> Path {
    let mut p = BezPath::new();
    p.move_to((x0, y0));
    p.line_to((x1, y0));
    p.line_to((x0, y1));
    p.close_path();
    Path::new(p)
}

pub(crate) fn hello() -> Text {
    let font = Arc::new(Font {
        name: "Sans".into(),
        bbox: Rect::new(0.0, -0.2, 0.6, 0.8),
    });
    Text::new(vec![TextRun {
        font,
        trm: Affine::scale(12.0),
        glyphs: vec![
            Glyph {
                id: 43,
                x: 0.0,
                y: 0.0,
            },
            Glyph {
                id: 72,
                x: 7.0,
                y: 0.0,
            },
        ],
    }])
}

pub(crate) fn mesh(bounds: Rect) -> Shade {
    Shade::new(Shading {
        colorspace: ColorSpace::DeviceRgb,
        bbox: None,
        kind: ShadingKind::Mesh { bounds },
    })
}

/// A page touching most commands: a background, a clipped pair of paths, a
/// group, a tagged text run, and a tile.
pub(crate) fn sample_page() -> DisplayList {
    let mut rec = Recorder::new(DisplayList::new(Rect::new(0.0, 0.0, 200.0, 200.0)));
    let stroke = StrokeState::new(Stroke::new(2.0));
    rec.fill_path(
        &rect_path(0.0, 0.0, 200.0, 200.0),
        FillRule::NonZero,
        Affine::IDENTITY,
        &Paint::new(&GRAY, &[1.0]),
    );
    rec.clip_path(
        &rect_path(10.0, 10.0, 190.0, 190.0),
        FillRule::EvenOdd,
        Affine::IDENTITY,
        INFINITE_RECT,
    );
    rec.fill_path(
        &triangle(20.0, 20.0, 80.0, 80.0),
        FillRule::NonZero,
        Affine::translate((5.0, 5.0)),
        &red(),
    );
    rec.stroke_path(
        &rect_path(20.0, 20.0, 80.0, 80.0),
        &stroke,
        Affine::IDENTITY,
        &red().with_alpha(0.5),
    );
    rec.pop_clip();
    rec.begin_group(
        Rect::new(100.0, 100.0, 180.0, 180.0),
        Some(&RGB),
        true,
        false,
        BlendMode::Multiply,
        0.8,
    );
    rec.fill_shade(
        &mesh(Rect::new(100.0, 100.0, 180.0, 180.0)),
        Affine::IDENTITY,
        1.0,
        ColorParams::default(),
    );
    rec.end_group();
    rec.begin_marked_content("P", 0);
    rec.fill_text(&hello(), Affine::translate((20.0, 150.0)), &black());
    rec.end_layer();
    rec.begin_tile(
        Rect::new(0.0, 180.0, 200.0, 200.0),
        Rect::new(0.0, 0.0, 10.0, 10.0),
        10.0,
        10.0,
        Affine::IDENTITY,
        1,
    );
    rec.fill_path(
        &rect_path(0.0, 0.0, 5.0, 5.0),
        FillRule::NonZero,
        Affine::IDENTITY,
        &black(),
    );
    rec.end_tile();
    rec.finish().unwrap()
}

/// One call seen by [`Log`].
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Call {
    pub(crate) name: &'static str,
    pub(crate) ctm: Affine,
    /// Device-space bounds for drawing calls, the scissor for clips, the area
    /// for masks, groups and tiles.
    pub(crate) rect: Rect,
    pub(crate) color: Vec<f32>,
    pub(crate) alpha: f32,
}

/// A device that logs every call.
#[derive(Debug, Default)]
pub(crate) struct Log<'c> {
    pub(crate) calls: Vec<Call>,
    /// Answer `begin_tile` with "cached".
    pub(crate) cache_tiles: bool,
    /// Abort `cookie` once this many calls have arrived.
    pub(crate) abort_after: Option<(usize, &'c Cookie)>,
}

impl Log<'_> {
    pub(crate) fn names(&self) -> Vec<&'static str> {
        self.calls.iter().map(|c| c.name).collect()
    }

    fn push(&mut self, name: &'static str, ctm: Affine, rect: Rect) {
        self.push_paint(name, ctm, rect, &[], 1.0);
    }

    fn push_paint(
        &mut self,
        name: &'static str,
        ctm: Affine,
        rect: Rect,
        color: &[f32],
        alpha: f32,
    ) {
        self.calls.push(Call {
            name,
            ctm,
            rect,
            color: color.to_vec(),
            alpha,
        });
        if let Some((n, cookie)) = self.abort_after {
            if self.calls.len() >= n {
                cookie.abort();
            }
        }
    }
}

impl Device for Log<'_> {
    fn fill_path(&mut self, path: &Path, _: FillRule, ctm: Affine, paint: &Paint<'_>) {
        self.push_paint("fill_path", ctm, path.bounds(None, ctm), paint.color, paint.alpha);
    }

    fn stroke_path(&mut self, path: &Path, stroke: &StrokeState, ctm: Affine, paint: &Paint<'_>) {
        let rect = path.bounds(Some(stroke), ctm);
        self.push_paint("stroke_path", ctm, rect, paint.color, paint.alpha);
    }

    fn clip_path(&mut self, _: &Path, _: FillRule, ctm: Affine, scissor: Rect) {
        self.push("clip_path", ctm, scissor);
    }

    fn clip_stroke_path(&mut self, _: &Path, _: &StrokeState, ctm: Affine, scissor: Rect) {
        self.push("clip_stroke_path", ctm, scissor);
    }

    fn fill_text(&mut self, text: &Text, ctm: Affine, paint: &Paint<'_>) {
        self.push_paint("fill_text", ctm, text.bounds(None, ctm), paint.color, paint.alpha);
    }

    fn stroke_text(&mut self, text: &Text, stroke: &StrokeState, ctm: Affine, paint: &Paint<'_>) {
        let rect = text.bounds(Some(stroke), ctm);
        self.push_paint("stroke_text", ctm, rect, paint.color, paint.alpha);
    }

    fn clip_text(&mut self, _: &Text, ctm: Affine, scissor: Rect) {
        self.push("clip_text", ctm, scissor);
    }

    fn clip_stroke_text(&mut self, _: &Text, _: &StrokeState, ctm: Affine, scissor: Rect) {
        self.push("clip_stroke_text", ctm, scissor);
    }

    fn ignore_text(&mut self, text: &Text, ctm: Affine) {
        self.push("ignore_text", ctm, text.bounds(None, ctm));
    }

    fn fill_shade(&mut self, shade: &Shade, ctm: Affine, alpha: f32, _: ColorParams) {
        self.push_paint("fill_shade", ctm, shade.bounds(ctm), &[], alpha);
    }

    fn fill_image(&mut self, image: &Image, ctm: Affine, alpha: f32, _: ColorParams) {
        self.push_paint("fill_image", ctm, image.bounds(ctm), &[], alpha);
    }

    fn fill_image_mask(&mut self, image: &Image, ctm: Affine, paint: &Paint<'_>) {
        let rect = image.bounds(ctm);
        self.push_paint("fill_image_mask", ctm, rect, paint.color, paint.alpha);
    }

    fn clip_image_mask(&mut self, _: &Image, ctm: Affine, scissor: Rect) {
        self.push("clip_image_mask", ctm, scissor);
    }

    fn pop_clip(&mut self) {
        self.push("pop_clip", Affine::IDENTITY, Rect::ZERO);
    }

    fn begin_mask(
        &mut self,
        area: Rect,
        _: bool,
        _: &ColorSpace,
        backdrop: &[f32],
        _: ColorParams,
    ) {
        self.push_paint("begin_mask", Affine::IDENTITY, area, backdrop, 1.0);
    }

    fn end_mask(&mut self) {
        self.push("end_mask", Affine::IDENTITY, Rect::ZERO);
    }

    fn begin_group(
        &mut self,
        area: Rect,
        _: Option<&ColorSpace>,
        _: bool,
        _: bool,
        _: BlendMode,
        alpha: f32,
    ) {
        self.push_paint("begin_group", Affine::IDENTITY, area, &[], alpha);
    }

    fn end_group(&mut self) {
        self.push("end_group", Affine::IDENTITY, Rect::ZERO);
    }

    fn begin_tile(&mut self, area: Rect, _: Rect, _: f64, _: f64, ctm: Affine, _: u64) -> bool {
        self.push("begin_tile", ctm, area);
        self.cache_tiles
    }

    fn end_tile(&mut self) {
        self.push("end_tile", Affine::IDENTITY, Rect::ZERO);
    }

    fn render_flags(&mut self, _: RenderFlags, _: RenderFlags) {
        self.push("render_flags", Affine::IDENTITY, Rect::ZERO);
    }

    fn set_default_colorspaces(&mut self, _: &DefaultColorSpaces) {
        self.push("set_default_colorspaces", Affine::IDENTITY, Rect::ZERO);
    }

    fn begin_layer(&mut self, _: &str) {
        self.push("begin_layer", Affine::IDENTITY, Rect::ZERO);
    }

    fn begin_marked_content(&mut self, _: &str, _: i32) {
        self.push("begin_marked_content", Affine::IDENTITY, Rect::ZERO);
    }

    fn end_layer(&mut self) {
        self.push("end_layer", Affine::IDENTITY, Rect::ZERO);
    }
}
