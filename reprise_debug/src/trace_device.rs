// Copyright 2026 the Reprise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A device that prints every call it receives.
//!
//! [`TraceDevice`] writes one line per call, indented by the number of open
//! scopes, so a replay reads like an outline of the page:
//!
//! ```text
//! clip_path rule=EvenOdd ctm=[1 0 0 1 0 0] scissor=10,10,190,190
//!   fill_path rule=NonZero ctm=[1 0 0 1 5 5] DeviceRGB [1 0 0] alpha=1
//! pop_clip
//! ```

use std::io::Write;

use kurbo::{Affine, Rect};
use reprise_core::color::{BlendMode, ColorParams, ColorSpace, DefaultColorSpaces};
use reprise_core::device::{Device, Paint, RenderFlags};
use reprise_core::image::{Image, ImageSource};
use reprise_core::payload::{FillRule, Path, Shade, StrokeState, Text};

use crate::{fmt_affine, fmt_rect};

/// Writes one indented line per device call.
pub struct TraceDevice<W: Write = Box<dyn Write>> {
    writer: W,
    depth: usize,
}

impl<W: Write> std::fmt::Debug for TraceDevice<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceDevice")
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

impl TraceDevice {
    /// Creates a device that writes to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }
}

impl<W: Write> TraceDevice<W> {
    /// Creates a device that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer, depth: 0 }
    }

    /// Number of scopes currently open.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the destination, consuming the device.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn line(&mut self, text: std::fmt::Arguments<'_>) {
        let _ = writeln!(self.writer, "{:indent$}{text}", "", indent = self.depth * 2);
    }

    fn open(&mut self, text: std::fmt::Arguments<'_>) {
        self.line(text);
        self.depth += 1;
    }

    fn close(&mut self, name: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(format_args!("{name}"));
    }
}

fn fmt_paint(paint: &Paint<'_>) -> String {
    let color: Vec<String> = paint.color.iter().map(f32::to_string).collect();
    format!(
        "{} [{}] alpha={}",
        paint.colorspace.name(),
        color.join(" "),
        paint.alpha
    )
}

fn fmt_image(image: &Image) -> String {
    let source = match image.source() {
        ImageSource::Pixels(_) => "pixels",
        ImageSource::DisplayList(_) => "list",
    };
    format!("{}x{} {source}", image.width(), image.height())
}

impl<W: Write> Device for TraceDevice<W> {
    fn fill_path(&mut self, _: &Path, rule: FillRule, ctm: Affine, paint: &Paint<'_>) {
        self.line(format_args!(
            "fill_path rule={rule:?} ctm={} {}",
            fmt_affine(ctm),
            fmt_paint(paint)
        ));
    }

    fn stroke_path(&mut self, _: &Path, stroke: &StrokeState, ctm: Affine, paint: &Paint<'_>) {
        self.line(format_args!(
            "stroke_path width={} ctm={} {}",
            stroke.width,
            fmt_affine(ctm),
            fmt_paint(paint)
        ));
    }

    fn clip_path(&mut self, _: &Path, rule: FillRule, ctm: Affine, scissor: Rect) {
        self.open(format_args!(
            "clip_path rule={rule:?} ctm={} scissor={}",
            fmt_affine(ctm),
            fmt_rect(scissor)
        ));
    }

    fn clip_stroke_path(&mut self, _: &Path, stroke: &StrokeState, ctm: Affine, scissor: Rect) {
        self.open(format_args!(
            "clip_stroke_path width={} ctm={} scissor={}",
            stroke.width,
            fmt_affine(ctm),
            fmt_rect(scissor)
        ));
    }

    fn fill_text(&mut self, text: &Text, ctm: Affine, paint: &Paint<'_>) {
        self.line(format_args!(
            "fill_text runs={} ctm={} {}",
            text.runs().len(),
            fmt_affine(ctm),
            fmt_paint(paint)
        ));
    }

    fn stroke_text(&mut self, text: &Text, stroke: &StrokeState, ctm: Affine, paint: &Paint<'_>) {
        self.line(format_args!(
            "stroke_text runs={} width={} ctm={} {}",
            text.runs().len(),
            stroke.width,
            fmt_affine(ctm),
            fmt_paint(paint)
        ));
    }

    fn clip_text(&mut self, text: &Text, ctm: Affine, scissor: Rect) {
        self.open(format_args!(
            "clip_text runs={} ctm={} scissor={}",
            text.runs().len(),
            fmt_affine(ctm),
            fmt_rect(scissor)
        ));
    }

    fn clip_stroke_text(&mut self, text: &Text, _: &StrokeState, ctm: Affine, scissor: Rect) {
        self.open(format_args!(
            "clip_stroke_text runs={} ctm={} scissor={}",
            text.runs().len(),
            fmt_affine(ctm),
            fmt_rect(scissor)
        ));
    }

    fn ignore_text(&mut self, text: &Text, ctm: Affine) {
        self.line(format_args!(
            "ignore_text runs={} ctm={}",
            text.runs().len(),
            fmt_affine(ctm)
        ));
    }

    fn fill_shade(&mut self, shade: &Shade, ctm: Affine, alpha: f32, _: ColorParams) {
        self.line(format_args!(
            "fill_shade {} ctm={} alpha={alpha}",
            shade.colorspace.name(),
            fmt_affine(ctm)
        ));
    }

    fn fill_image(&mut self, image: &Image, ctm: Affine, alpha: f32, _: ColorParams) {
        self.line(format_args!(
            "fill_image {} ctm={} alpha={alpha}",
            fmt_image(image),
            fmt_affine(ctm)
        ));
    }

    fn fill_image_mask(&mut self, image: &Image, ctm: Affine, paint: &Paint<'_>) {
        self.line(format_args!(
            "fill_image_mask {} ctm={} {}",
            fmt_image(image),
            fmt_affine(ctm),
            fmt_paint(paint)
        ));
    }

    fn clip_image_mask(&mut self, image: &Image, ctm: Affine, scissor: Rect) {
        self.open(format_args!(
            "clip_image_mask {} ctm={} scissor={}",
            fmt_image(image),
            fmt_affine(ctm),
            fmt_rect(scissor)
        ));
    }

    fn pop_clip(&mut self) {
        self.close("pop_clip");
    }

    fn begin_mask(
        &mut self,
        area: Rect,
        luminosity: bool,
        colorspace: &ColorSpace,
        backdrop: &[f32],
        _: ColorParams,
    ) {
        let kind = if luminosity { "luminosity" } else { "alpha" };
        self.open(format_args!(
            "begin_mask {kind} area={} {} {backdrop:?}",
            fmt_rect(area),
            colorspace.name()
        ));
    }

    fn end_mask(&mut self) {
        // The mask stays open as a clip until `pop_clip`.
        self.depth = self.depth.saturating_sub(1);
        self.open(format_args!("end_mask"));
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
        self.open(format_args!(
            "begin_group area={} cs={} isolated={isolated} knockout={knockout} \
             blend={blend:?} alpha={alpha}",
            fmt_rect(area),
            colorspace.map_or("none", ColorSpace::name),
        ));
    }

    fn end_group(&mut self) {
        self.close("end_group");
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
        self.open(format_args!(
            "begin_tile id={id} area={} view={} step={xstep},{ystep} ctm={}",
            fmt_rect(area),
            fmt_rect(view),
            fmt_affine(ctm)
        ));
        false
    }

    fn end_tile(&mut self) {
        self.close("end_tile");
    }

    fn render_flags(&mut self, set: RenderFlags, clear: RenderFlags) {
        self.line(format_args!("render_flags set={set:?} clear={clear:?}"));
    }

    fn set_default_colorspaces(&mut self, defaults: &DefaultColorSpaces) {
        self.line(format_args!(
            "set_default_colorspaces gray={} rgb={} cmyk={}",
            defaults.gray.name(),
            defaults.rgb.name(),
            defaults.cmyk.name()
        ));
    }

    fn begin_layer(&mut self, name: &str) {
        self.open(format_args!("begin_layer {name:?}"));
    }

    fn begin_marked_content(&mut self, tag: &str, mcid: i32) {
        self.open(format_args!("begin_marked_content {tag:?} mcid={mcid}"));
    }

    fn end_layer(&mut self) {
        self.close("end_layer");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Shape as _;
    use reprise_core::geometry::INFINITE_RECT;
    use reprise_core::list::DisplayList;
    use reprise_core::recorder::Recorder;

    fn square() -> Path {
        Path::new(Rect::new(10.0, 10.0, 20.0, 20.0).to_path(0.1))
    }

    fn output(device: TraceDevice<Vec<u8>>) -> String {
        String::from_utf8(device.into_inner()).unwrap()
    }

    #[test]
    fn nesting_indents_lines() {
        let rgb = ColorSpace::DeviceRgb;
        let mut dev = TraceDevice::with_writer(Vec::new());
        dev.clip_path(&square(), FillRule::EvenOdd, Affine::IDENTITY, INFINITE_RECT);
        dev.begin_layer("ink");
        dev.fill_path(
            &square(),
            FillRule::NonZero,
            Affine::translate((5.0, 5.0)),
            &Paint::new(&rgb, &[1.0, 0.0, 0.0]),
        );
        dev.end_layer();
        dev.pop_clip();
        assert_eq!(dev.depth(), 0);
        assert_eq!(
            output(dev),
            "clip_path rule=EvenOdd ctm=[1 0 0 1 0 0] scissor=inf\n\
             \x20 begin_layer \"ink\"\n\
             \x20   fill_path rule=NonZero ctm=[1 0 0 1 5 5] DeviceRGB [1 0 0] alpha=1\n\
             \x20 end_layer\n\
             pop_clip\n"
        );
    }

    #[test]
    fn mask_stays_open_until_pop() {
        let gray = ColorSpace::DeviceGray;
        let mut dev = TraceDevice::with_writer(Vec::new());
        let area = Rect::new(0.0, 0.0, 1.0, 1.0);
        dev.begin_mask(area, true, &gray, &[0.0], ColorParams::default());
        assert_eq!(dev.depth(), 1);
        dev.end_mask();
        assert_eq!(dev.depth(), 1);
        dev.pop_clip();
        assert_eq!(dev.depth(), 0);
        let text = output(dev);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "end_mask");
        assert_eq!(lines[2], "pop_clip");
    }

    #[test]
    fn stray_pop_does_not_underflow() {
        let mut dev = TraceDevice::with_writer(Vec::new());
        dev.end_group();
        assert_eq!(dev.depth(), 0);
        assert_eq!(output(dev), "end_group\n");
    }

    #[test]
    fn replay_through_trace_device() {
        let gray = ColorSpace::DeviceGray;
        let mut rec = Recorder::new(DisplayList::new(Rect::new(0.0, 0.0, 100.0, 100.0)));
        rec.begin_group(
            Rect::new(0.0, 0.0, 50.0, 50.0),
            None,
            true,
            false,
            BlendMode::Screen,
            0.5,
        );
        rec.fill_path(
            &square(),
            FillRule::NonZero,
            Affine::IDENTITY,
            &Paint::new(&gray, &[0.5]),
        );
        rec.end_group();
        let list = rec.finish().unwrap();

        let mut dev = TraceDevice::with_writer(Vec::new());
        list.run(&mut dev, Affine::IDENTITY, INFINITE_RECT, None);
        let text = output(dev);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3, "got: {text}");
        assert!(lines[0].starts_with("begin_group area=10,10,20,20"), "got: {text}");
        assert!(lines[0].contains("blend=Screen alpha=0.5"), "got: {text}");
        assert_eq!(lines[1], "  fill_path rule=NonZero ctm=[1 0 0 1 0 0] DeviceGray [0.5] alpha=1");
        assert_eq!(lines[2], "end_group");
    }
}
