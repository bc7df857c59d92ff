// Copyright 2026 the Reprise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Captures device calls as values.
//!
//! [`CaptureDevice`] stores each call it receives as a [`Call`]. Two replays
//! of the same list can be compared with `==`, and a capture can be written
//! out as JSON with [`CaptureDevice::to_json`] for inspection or golden-file
//! diffs.

use std::io::{self, Write};

use kurbo::{Affine, Rect};
use reprise_core::color::{BlendMode, ColorParams, ColorSpace, DefaultColorSpaces};
use reprise_core::device::{Device, Paint, RenderFlags};
use reprise_core::geometry::is_infinite;
use reprise_core::image::{Image, ImageSource};
use reprise_core::payload::{FillRule, Path, Shade, StrokeState, Text};
use serde_json::{Value, json};

/// An owned copy of a [`Paint`].
#[derive(Clone, Debug, PartialEq)]
pub struct CapturedPaint {
    /// Colorspace name.
    pub colorspace: String,
    /// Color components.
    pub color: Vec<f32>,
    /// Opacity.
    pub alpha: f32,
    /// Conversion parameters.
    pub params: ColorParams,
}

impl From<&Paint<'_>> for CapturedPaint {
    fn from(paint: &Paint<'_>) -> Self {
        Self {
            colorspace: paint.colorspace.name().to_owned(),
            color: paint.color.to_vec(),
            alpha: paint.alpha,
            params: paint.params,
        }
    }
}

/// One captured device call.
///
/// Paths, text, and shadings are captured by their device-space bounds,
/// images by their size and source kind.
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs, reason = "fields mirror the `Device` method parameters")]
pub enum Call {
    FillPath {
        rule: FillRule,
        ctm: Affine,
        bounds: Rect,
        paint: CapturedPaint,
    },
    StrokePath {
        line_width: f64,
        ctm: Affine,
        bounds: Rect,
        paint: CapturedPaint,
    },
    ClipPath {
        rule: FillRule,
        ctm: Affine,
        scissor: Rect,
    },
    ClipStrokePath {
        line_width: f64,
        ctm: Affine,
        scissor: Rect,
    },
    FillText {
        ctm: Affine,
        bounds: Rect,
        paint: CapturedPaint,
    },
    StrokeText {
        line_width: f64,
        ctm: Affine,
        bounds: Rect,
        paint: CapturedPaint,
    },
    ClipText {
        ctm: Affine,
        scissor: Rect,
    },
    ClipStrokeText {
        line_width: f64,
        ctm: Affine,
        scissor: Rect,
    },
    IgnoreText {
        ctm: Affine,
        bounds: Rect,
    },
    FillShade {
        ctm: Affine,
        bounds: Rect,
        alpha: f32,
        params: ColorParams,
    },
    FillImage {
        width: u32,
        height: u32,
        from_list: bool,
        ctm: Affine,
        alpha: f32,
        params: ColorParams,
    },
    FillImageMask {
        width: u32,
        height: u32,
        ctm: Affine,
        paint: CapturedPaint,
    },
    ClipImageMask {
        width: u32,
        height: u32,
        ctm: Affine,
        scissor: Rect,
    },
    PopClip,
    BeginMask {
        area: Rect,
        luminosity: bool,
        colorspace: String,
        backdrop: Vec<f32>,
        params: ColorParams,
    },
    EndMask,
    BeginGroup {
        area: Rect,
        colorspace: Option<String>,
        isolated: bool,
        knockout: bool,
        blend: BlendMode,
        alpha: f32,
    },
    EndGroup,
    BeginTile {
        area: Rect,
        view: Rect,
        xstep: f64,
        ystep: f64,
        ctm: Affine,
        id: u64,
    },
    EndTile,
    RenderFlags {
        set: RenderFlags,
        clear: RenderFlags,
    },
    SetDefaultColorSpaces {
        gray: String,
        rgb: String,
        cmyk: String,
    },
    BeginLayer {
        name: String,
    },
    BeginMarkedContent {
        tag: String,
        mcid: i32,
    },
    EndLayer,
}

impl Call {
    /// The `Device` method name this call came from.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::FillPath { .. } => "fill_path",
            Self::StrokePath { .. } => "stroke_path",
            Self::ClipPath { .. } => "clip_path",
            Self::ClipStrokePath { .. } => "clip_stroke_path",
            Self::FillText { .. } => "fill_text",
            Self::StrokeText { .. } => "stroke_text",
            Self::ClipText { .. } => "clip_text",
            Self::ClipStrokeText { .. } => "clip_stroke_text",
            Self::IgnoreText { .. } => "ignore_text",
            Self::FillShade { .. } => "fill_shade",
            Self::FillImage { .. } => "fill_image",
            Self::FillImageMask { .. } => "fill_image_mask",
            Self::ClipImageMask { .. } => "clip_image_mask",
            Self::PopClip => "pop_clip",
            Self::BeginMask { .. } => "begin_mask",
            Self::EndMask => "end_mask",
            Self::BeginGroup { .. } => "begin_group",
            Self::EndGroup => "end_group",
            Self::BeginTile { .. } => "begin_tile",
            Self::EndTile => "end_tile",
            Self::RenderFlags { .. } => "render_flags",
            Self::SetDefaultColorSpaces { .. } => "set_default_colorspaces",
            Self::BeginLayer { .. } => "begin_layer",
            Self::BeginMarkedContent { .. } => "begin_marked_content",
            Self::EndLayer => "end_layer",
        }
    }

    /// Renders the call as a JSON object with a `"call"` key naming it.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut value = match self {
            Self::FillPath {
                rule,
                ctm,
                bounds,
                paint,
            } => json!({
                "rule": format!("{rule:?}"),
                "ctm": affine_json(*ctm),
                "bounds": rect_json(*bounds),
                "paint": paint_json(paint),
            }),
            Self::StrokePath {
                line_width,
                ctm,
                bounds,
                paint,
            }
            | Self::StrokeText {
                line_width,
                ctm,
                bounds,
                paint,
            } => json!({
                "line_width": line_width,
                "ctm": affine_json(*ctm),
                "bounds": rect_json(*bounds),
                "paint": paint_json(paint),
            }),
            Self::ClipPath { rule, ctm, scissor } => json!({
                "rule": format!("{rule:?}"),
                "ctm": affine_json(*ctm),
                "scissor": rect_json(*scissor),
            }),
            Self::ClipStrokePath {
                line_width,
                ctm,
                scissor,
            }
            | Self::ClipStrokeText {
                line_width,
                ctm,
                scissor,
            } => json!({
                "line_width": line_width,
                "ctm": affine_json(*ctm),
                "scissor": rect_json(*scissor),
            }),
            Self::FillText { ctm, bounds, paint } => json!({
                "ctm": affine_json(*ctm),
                "bounds": rect_json(*bounds),
                "paint": paint_json(paint),
            }),
            Self::ClipText { ctm, scissor } => json!({
                "ctm": affine_json(*ctm),
                "scissor": rect_json(*scissor),
            }),
            Self::IgnoreText { ctm, bounds } => json!({
                "ctm": affine_json(*ctm),
                "bounds": rect_json(*bounds),
            }),
            Self::FillShade {
                ctm,
                bounds,
                alpha,
                params,
            } => json!({
                "ctm": affine_json(*ctm),
                "bounds": rect_json(*bounds),
                "alpha": alpha,
                "params": params_json(*params),
            }),
            Self::FillImage {
                width,
                height,
                from_list,
                ctm,
                alpha,
                params,
            } => json!({
                "width": width,
                "height": height,
                "from_list": from_list,
                "ctm": affine_json(*ctm),
                "alpha": alpha,
                "params": params_json(*params),
            }),
            Self::FillImageMask {
                width,
                height,
                ctm,
                paint,
            } => json!({
                "width": width,
                "height": height,
                "ctm": affine_json(*ctm),
                "paint": paint_json(paint),
            }),
            Self::ClipImageMask {
                width,
                height,
                ctm,
                scissor,
            } => json!({
                "width": width,
                "height": height,
                "ctm": affine_json(*ctm),
                "scissor": rect_json(*scissor),
            }),
            Self::BeginMask {
                area,
                luminosity,
                colorspace,
                backdrop,
                params,
            } => json!({
                "area": rect_json(*area),
                "luminosity": luminosity,
                "colorspace": colorspace,
                "backdrop": backdrop,
                "params": params_json(*params),
            }),
            Self::BeginGroup {
                area,
                colorspace,
                isolated,
                knockout,
                blend,
                alpha,
            } => json!({
                "area": rect_json(*area),
                "colorspace": colorspace,
                "isolated": isolated,
                "knockout": knockout,
                "blend": format!("{blend:?}"),
                "alpha": alpha,
            }),
            Self::BeginTile {
                area,
                view,
                xstep,
                ystep,
                ctm,
                id,
            } => json!({
                "area": rect_json(*area),
                "view": rect_json(*view),
                "xstep": xstep,
                "ystep": ystep,
                "ctm": affine_json(*ctm),
                "id": id,
            }),
            Self::RenderFlags { set, clear } => json!({
                "set": set.bits(),
                "clear": clear.bits(),
            }),
            Self::SetDefaultColorSpaces { gray, rgb, cmyk } => json!({
                "gray": gray,
                "rgb": rgb,
                "cmyk": cmyk,
            }),
            Self::BeginLayer { name } => json!({ "name": name }),
            Self::BeginMarkedContent { tag, mcid } => json!({ "tag": tag, "mcid": mcid }),
            Self::PopClip | Self::EndMask | Self::EndGroup | Self::EndTile | Self::EndLayer => {
                json!({})
            }
        };
        if let Value::Object(map) = &mut value {
            map.insert("call".to_owned(), Value::from(self.name()));
        }
        value
    }
}

fn affine_json(ctm: Affine) -> Value {
    json!(ctm.as_coeffs())
}

/// Infinite rects become `null`, since JSON has no infinity.
fn rect_json(rect: Rect) -> Value {
    if is_infinite(rect) {
        Value::Null
    } else {
        json!([rect.x0, rect.y0, rect.x1, rect.y1])
    }
}

fn params_json(params: ColorParams) -> Value {
    json!({
        "intent": format!("{:?}", params.intent),
        "black_point": params.black_point,
        "overprint": params.overprint,
        "overprint_mode": params.overprint_mode,
    })
}

fn paint_json(paint: &CapturedPaint) -> Value {
    json!({
        "colorspace": paint.colorspace,
        "color": paint.color,
        "alpha": paint.alpha,
        "params": params_json(paint.params),
    })
}

/// A device that records every call it receives.
#[derive(Clone, Debug, Default)]
pub struct CaptureDevice {
    calls: Vec<Call>,
    cache_tiles: bool,
}

impl CaptureDevice {
    /// Creates an empty capture.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `begin_tile` report every tile as cached.
    #[must_use]
    pub fn with_cached_tiles(mut self) -> Self {
        self.cache_tiles = true;
        self
    }

    /// The calls captured so far.
    #[must_use]
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Takes the captured calls.
    #[must_use]
    pub fn into_calls(self) -> Vec<Call> {
        self.calls
    }

    /// Renders the capture as a JSON array, one object per call.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Array(self.calls.iter().map(Call::to_json).collect())
    }

    /// Writes [`to_json`](Self::to_json) to `writer`, pretty-printed.
    pub fn write_json(&self, writer: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *writer, &self.to_json())?;
        writeln!(writer)
    }
}

fn image_size(image: &Image) -> (u32, u32) {
    (image.width(), image.height())
}

impl Device for CaptureDevice {
    fn fill_path(&mut self, path: &Path, rule: FillRule, ctm: Affine, paint: &Paint<'_>) {
        self.calls.push(Call::FillPath {
            rule,
            ctm,
            bounds: path.bounds(None, ctm),
            paint: paint.into(),
        });
    }

    fn stroke_path(&mut self, path: &Path, stroke: &StrokeState, ctm: Affine, paint: &Paint<'_>) {
        self.calls.push(Call::StrokePath {
            line_width: stroke.width,
            ctm,
            bounds: path.bounds(Some(stroke), ctm),
            paint: paint.into(),
        });
    }

    fn clip_path(&mut self, _: &Path, rule: FillRule, ctm: Affine, scissor: Rect) {
        self.calls.push(Call::ClipPath { rule, ctm, scissor });
    }

    fn clip_stroke_path(&mut self, _: &Path, stroke: &StrokeState, ctm: Affine, scissor: Rect) {
        self.calls.push(Call::ClipStrokePath {
            line_width: stroke.width,
            ctm,
            scissor,
        });
    }

    fn fill_text(&mut self, text: &Text, ctm: Affine, paint: &Paint<'_>) {
        self.calls.push(Call::FillText {
            ctm,
            bounds: text.bounds(None, ctm),
            paint: paint.into(),
        });
    }

    fn stroke_text(&mut self, text: &Text, stroke: &StrokeState, ctm: Affine, paint: &Paint<'_>) {
        self.calls.push(Call::StrokeText {
            line_width: stroke.width,
            ctm,
            bounds: text.bounds(Some(stroke), ctm),
            paint: paint.into(),
        });
    }

    fn clip_text(&mut self, _: &Text, ctm: Affine, scissor: Rect) {
        self.calls.push(Call::ClipText { ctm, scissor });
    }

    fn clip_stroke_text(&mut self, _: &Text, stroke: &StrokeState, ctm: Affine, scissor: Rect) {
        self.calls.push(Call::ClipStrokeText {
            line_width: stroke.width,
            ctm,
            scissor,
        });
    }

    fn ignore_text(&mut self, text: &Text, ctm: Affine) {
        self.calls.push(Call::IgnoreText {
            ctm,
            bounds: text.bounds(None, ctm),
        });
    }

    fn fill_shade(&mut self, shade: &Shade, ctm: Affine, alpha: f32, params: ColorParams) {
        self.calls.push(Call::FillShade {
            ctm,
            bounds: shade.bounds(ctm),
            alpha,
            params,
        });
    }

    fn fill_image(&mut self, image: &Image, ctm: Affine, alpha: f32, params: ColorParams) {
        let (width, height) = image_size(image);
        self.calls.push(Call::FillImage {
            width,
            height,
            from_list: matches!(image.source(), ImageSource::DisplayList(_)),
            ctm,
            alpha,
            params,
        });
    }

    fn fill_image_mask(&mut self, image: &Image, ctm: Affine, paint: &Paint<'_>) {
        let (width, height) = image_size(image);
        self.calls.push(Call::FillImageMask {
            width,
            height,
            ctm,
            paint: paint.into(),
        });
    }

    fn clip_image_mask(&mut self, image: &Image, ctm: Affine, scissor: Rect) {
        let (width, height) = image_size(image);
        self.calls.push(Call::ClipImageMask {
            width,
            height,
            ctm,
            scissor,
        });
    }

    fn pop_clip(&mut self) {
        self.calls.push(Call::PopClip);
    }

    fn begin_mask(
        &mut self,
        area: Rect,
        luminosity: bool,
        colorspace: &ColorSpace,
        backdrop: &[f32],
        params: ColorParams,
    ) {
        self.calls.push(Call::BeginMask {
            area,
            luminosity,
            colorspace: colorspace.name().to_owned(),
            backdrop: backdrop.to_vec(),
            params,
        });
    }

    fn end_mask(&mut self) {
        self.calls.push(Call::EndMask);
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
        self.calls.push(Call::BeginGroup {
            area,
            colorspace: colorspace.map(|cs| cs.name().to_owned()),
            isolated,
            knockout,
            blend,
            alpha,
        });
    }

    fn end_group(&mut self) {
        self.calls.push(Call::EndGroup);
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
        self.calls.push(Call::BeginTile {
            area,
            view,
            xstep,
            ystep,
            ctm,
            id,
        });
        self.cache_tiles
    }

    fn end_tile(&mut self) {
        self.calls.push(Call::EndTile);
    }

    fn render_flags(&mut self, set: RenderFlags, clear: RenderFlags) {
        self.calls.push(Call::RenderFlags { set, clear });
    }

    fn set_default_colorspaces(&mut self, defaults: &DefaultColorSpaces) {
        self.calls.push(Call::SetDefaultColorSpaces {
            gray: defaults.gray.name().to_owned(),
            rgb: defaults.rgb.name().to_owned(),
            cmyk: defaults.cmyk.name().to_owned(),
        });
    }

    fn begin_layer(&mut self, name: &str) {
        self.calls.push(Call::BeginLayer {
            name: name.to_owned(),
        });
    }

    fn begin_marked_content(&mut self, tag: &str, mcid: i32) {
        self.calls.push(Call::BeginMarkedContent {
            tag: tag.to_owned(),
            mcid,
        });
    }

    fn end_layer(&mut self) {
        self.calls.push(Call::EndLayer);
    }
}
