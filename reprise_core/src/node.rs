// Copyright 2026 the Reprise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node codec: differential encoding of graphics state into slots.
//!
//! A display list is a flat sequence of [`Slot`]s. Each node starts with a
//! [`NodeHeader`] slot followed by zero or more blocks, always in this order:
//!
//! ```text
//! header, rect, colorspace, color, alpha, ctm (ad, bc, ef), stroke, path, payload
//! ```
//!
//! A block is present only when the header says so, and the header says so
//! only when the value differs from the one the previous node left behind.
//! [`NodeHeader::size`] counts the header plus every block, so stepping from
//! one node to the next never needs to interpret the blocks.
//!
//! # Colorspace shortcuts
//!
//! Switching to a device space whose color is that space's canonical default
//! costs no color block: [`ColorSpaceMode`] names both the space and the
//! default. Switching to any other space emits a colorspace block and resets
//! the running color to all zeros; a color block follows only if the wanted
//! color differs from the implied one.
//!
//! # Matrix pairs
//!
//! The transform is diffed in three independent pairs, `(a, d)`, `(b, c)`
//! and `(e, f)`, so a pure translation costs one matrix block instead of
//! three.
//!
//! Decoding is the exact inverse: [`Decoder::decode`] applied to the nodes
//! produced by [`Encoder::encode`], in order, reproduces every absolute value
//! the encoder saw.

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;

use kurbo::{Affine, Rect};

use crate::color::{
    BlendMode, ColorParams, ColorSpace, DefaultColorSpaces, MAX_COLORS, RenderingIntent,
};
use crate::device::RenderFlags;
use crate::image::Image;
use crate::payload::{FillRule, Path, Shade, StrokeState, Text};

/// The operation a node records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    /// `fill_path`.
    FillPath,
    /// `stroke_path`.
    StrokePath,
    /// `clip_path` (push).
    ClipPath,
    /// `clip_stroke_path` (push).
    ClipStrokePath,
    /// `fill_text`.
    FillText,
    /// `stroke_text`.
    StrokeText,
    /// `clip_text` (push).
    ClipText,
    /// `clip_stroke_text` (push).
    ClipStrokeText,
    /// `ignore_text`.
    IgnoreText,
    /// `fill_shade`.
    FillShade,
    /// `fill_image`.
    FillImage,
    /// `fill_image_mask`.
    FillImageMask,
    /// `clip_image_mask` (push).
    ClipImageMask,
    /// `pop_clip` (pop).
    PopClip,
    /// `begin_mask` (push).
    BeginMask,
    /// `end_mask`.
    EndMask,
    /// `begin_group` (push).
    BeginGroup,
    /// `end_group` (pop).
    EndGroup,
    /// `begin_tile` (push).
    BeginTile,
    /// `end_tile` (pop).
    EndTile,
    /// `render_flags`.
    RenderFlags,
    /// `set_default_colorspaces`.
    DefaultColorSpaces,
    /// `begin_layer` (push).
    BeginLayer,
    /// `begin_marked_content` (push).
    BeginMarkedContent,
    /// `end_layer` (pop).
    EndLayer,
}

impl Command {
    /// Returns `true` for the commands that push a clip, mask, or group
    /// scope (the ones the player can cull as a whole subtree).
    #[must_use]
    pub const fn is_clip_push(self) -> bool {
        matches!(
            self,
            Self::ClipPath
                | Self::ClipStrokePath
                | Self::ClipText
                | Self::ClipStrokeText
                | Self::ClipImageMask
                | Self::BeginMask
                | Self::BeginGroup
        )
    }
}

/// How the colorspace changed at a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ColorSpaceMode {
    /// Unchanged.
    #[default]
    Unchanged,
    /// Device gray, color defaults to `0`.
    GrayZero,
    /// Device gray, color defaults to `1`.
    GrayOne,
    /// Device RGB, color defaults to `0, 0, 0`.
    RgbZero,
    /// Device RGB, color defaults to `1, 1, 1`.
    RgbOne,
    /// Device CMYK, color defaults to `0, 0, 0, 0`.
    CmykZero,
    /// Device CMYK, color defaults to `0, 0, 0, 1`.
    CmykOne,
    /// A colorspace block follows; color defaults to all zeros.
    Explicit,
}

impl ColorSpaceMode {
    /// Picks the cheapest mode for switching to `cs` with `color`.
    fn select(cs: &ColorSpace, color: &[f32]) -> Self {
        match cs {
            ColorSpace::DeviceGray if color == [1.0] => Self::GrayOne,
            ColorSpace::DeviceGray => Self::GrayZero,
            ColorSpace::DeviceRgb if color == [1.0, 1.0, 1.0] => Self::RgbOne,
            ColorSpace::DeviceRgb => Self::RgbZero,
            ColorSpace::DeviceCmyk if color == [0.0, 0.0, 0.0, 1.0] => Self::CmykOne,
            ColorSpace::DeviceCmyk => Self::CmykZero,
            ColorSpace::Custom(_) => Self::Explicit,
        }
    }

    /// The device space this mode implies, if any.
    fn device_space(self) -> Option<ColorSpace> {
        match self {
            Self::GrayZero | Self::GrayOne => Some(ColorSpace::DeviceGray),
            Self::RgbZero | Self::RgbOne => Some(ColorSpace::DeviceRgb),
            Self::CmykZero | Self::CmykOne => Some(ColorSpace::DeviceCmyk),
            Self::Unchanged | Self::Explicit => None,
        }
    }

    /// The color this mode leaves behind before any color block applies.
    fn default_color(self) -> [f32; MAX_COLORS] {
        let mut color = [0.0; MAX_COLORS];
        match self {
            Self::GrayOne => color[0] = 1.0,
            Self::RgbOne => color[..3].fill(1.0),
            Self::CmykOne => color[3] = 1.0,
            _ => {}
        }
        color
    }
}

/// How the alpha changed at a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AlphaMode {
    /// Unchanged.
    #[default]
    Unchanged,
    /// Fully opaque (`1.0`).
    Opaque,
    /// Fully transparent (`0.0`).
    Transparent,
    /// An alpha block follows.
    Explicit,
}

bitflags::bitflags! {
    /// Which matrix pairs a node rewrites.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct CtmChanges: u8 {
        /// `a` and `d` (scale).
        const AD = 1 << 0;
        /// `b` and `c` (rotation and skew).
        const BC = 1 << 1;
        /// `e` and `f` (translation).
        const EF = 1 << 2;
    }
}

bitflags::bitflags! {
    /// Command-specific flags.
    ///
    /// Painting commands pack their [`ColorParams`] here so the parameters
    /// cost no block of their own.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u16 {
        /// Even-odd fill rule (path fills and clips).
        const EVEN_ODD = 1 << 0;
        /// Luminosity soft mask (`begin_mask`).
        const LUMINOSITY = 1 << 1;
        /// Isolated group.
        const ISOLATED = 1 << 2;
        /// Knockout group.
        const KNOCKOUT = 1 << 3;
        /// Black point compensation.
        const BLACK_POINT = 1 << 4;
        /// Overprint.
        const OVERPRINT = 1 << 5;
        /// Overprint mode.
        const OVERPRINT_MODE = 1 << 6;
        /// Low bit of the rendering intent.
        const INTENT_LO = 1 << 7;
        /// High bit of the rendering intent.
        const INTENT_HI = 1 << 8;
    }
}

impl NodeFlags {
    /// Flags for a fill rule.
    #[must_use]
    pub fn from_fill_rule(rule: FillRule) -> Self {
        match rule {
            FillRule::EvenOdd => Self::EVEN_ODD,
            FillRule::NonZero => Self::empty(),
        }
    }

    /// Returns the packed fill rule.
    #[must_use]
    pub fn fill_rule(self) -> FillRule {
        if self.contains(Self::EVEN_ODD) {
            FillRule::EvenOdd
        } else {
            FillRule::NonZero
        }
    }

    /// Packs color parameters into the flags.
    #[must_use]
    pub fn with_color_params(mut self, params: ColorParams) -> Self {
        let intent = params.intent.to_bits();
        self.set(Self::INTENT_LO, intent & 1 != 0);
        self.set(Self::INTENT_HI, intent & 2 != 0);
        self.set(Self::BLACK_POINT, params.black_point);
        self.set(Self::OVERPRINT, params.overprint);
        self.set(Self::OVERPRINT_MODE, params.overprint_mode);
        self
    }

    /// Unpacks color parameters.
    #[must_use]
    pub fn color_params(self) -> ColorParams {
        let intent = u8::from(self.contains(Self::INTENT_LO))
            | (u8::from(self.contains(Self::INTENT_HI)) << 1);
        ColorParams {
            intent: RenderingIntent::from_bits(intent),
            black_point: self.contains(Self::BLACK_POINT),
            overprint: self.contains(Self::OVERPRINT),
            overprint_mode: self.contains(Self::OVERPRINT_MODE),
        }
    }
}

/// The first slot of every node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeHeader {
    /// Recorded operation.
    pub command: Command,
    /// Slots occupied by this node, header included.
    pub size: u16,
    /// A rect block is present.
    pub rect: bool,
    /// A path block is present.
    pub path: bool,
    /// Colorspace change.
    pub colorspace: ColorSpaceMode,
    /// A color block is present.
    pub color: bool,
    /// Alpha change.
    pub alpha: AlphaMode,
    /// Matrix pairs present.
    pub ctm: CtmChanges,
    /// A stroke block is present.
    pub stroke: bool,
    /// Command-specific flags.
    pub flags: NodeFlags,
}

impl NodeHeader {
    fn new(command: Command, flags: NodeFlags) -> Self {
        Self {
            command,
            size: 1,
            rect: false,
            path: false,
            colorspace: ColorSpaceMode::Unchanged,
            color: false,
            alpha: AlphaMode::Unchanged,
            ctm: CtmChanges::empty(),
            stroke: false,
            flags,
        }
    }

    /// Returns `true` if no state field changed at this node.
    #[must_use]
    pub fn is_state_unchanged(&self) -> bool {
        !self.rect
            && !self.path
            && self.colorspace == ColorSpaceMode::Unchanged
            && !self.color
            && self.alpha == AlphaMode::Unchanged
            && self.ctm.is_empty()
            && !self.stroke
    }
}

/// Command-specific trailing data.
#[derive(Clone, Debug)]
pub(crate) enum Payload {
    Text(Text),
    Image(Image),
    Shade(Shade),
    Group {
        colorspace: Option<ColorSpace>,
        blend: BlendMode,
    },
    Tile {
        view: Rect,
        xstep: f64,
        ystep: f64,
        id: u64,
    },
    RenderFlags {
        set: RenderFlags,
        clear: RenderFlags,
    },
    DefaultColorSpaces(Arc<DefaultColorSpaces>),
    Layer(Arc<str>),
    MarkedContent {
        tag: Arc<str>,
        mcid: i32,
    },
}

/// One fixed-size cell of the node store.
#[derive(Clone, Debug)]
pub(crate) enum Slot {
    Header(NodeHeader),
    Rect(Rect),
    ColorSpace(ColorSpace),
    Color(Box<[f32]>),
    Alpha(f32),
    Matrix([f64; 2]),
    Stroke(StrokeState),
    Path(Path),
    Payload(Payload),
}

/// The state a node wants to establish. `None` leaves a field as it was.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Update<'a> {
    pub(crate) rect: Option<Rect>,
    /// Emit the rect block even if unchanged, so it can be patched later.
    pub(crate) force_rect: bool,
    pub(crate) path: Option<&'a Path>,
    pub(crate) color: Option<(&'a ColorSpace, &'a [f32])>,
    pub(crate) alpha: Option<f32>,
    pub(crate) ctm: Option<Affine>,
    pub(crate) stroke: Option<&'a StrokeState>,
}

/// What the encoder wrote for one node.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Encoded {
    pub(crate) header: NodeHeader,
    /// Offset of the rect block within the node, if one was written.
    pub(crate) rect_offset: Option<usize>,
}

/// Write-side cache of the last emitted value of every state field.
#[derive(Clone, Debug)]
pub(crate) struct Encoder {
    rect: Option<Rect>,
    colorspace: Option<ColorSpace>,
    color: [f32; MAX_COLORS],
    alpha: f32,
    ctm: Affine,
    stroke: Option<StrokeState>,
    path: Option<Path>,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    pub(crate) fn new() -> Self {
        Self {
            rect: None,
            colorspace: None,
            color: [0.0; MAX_COLORS],
            alpha: 1.0,
            ctm: Affine::IDENTITY,
            stroke: None,
            path: None,
        }
    }

    /// Continues encoding after nodes that left `state` behind.
    pub(crate) fn resume(state: &Decoder) -> Self {
        Self {
            rect: None,
            colorspace: Some(state.colorspace.clone()),
            color: state.color,
            alpha: state.alpha,
            ctm: state.ctm,
            stroke: state.stroke.clone(),
            path: state.path.clone(),
        }
    }

    /// Makes the next node carry its own rect.
    pub(crate) fn forget_rect(&mut self) {
        self.rect = None;
    }

    /// Encodes one node into `out`, replacing its contents.
    pub(crate) fn encode(
        &mut self,
        command: Command,
        flags: NodeFlags,
        update: &Update<'_>,
        payload: Option<Payload>,
        out: &mut Vec<Slot>,
    ) -> Encoded {
        let mut header = NodeHeader::new(command, flags);
        let mut rect_offset = None;
        out.clear();
        out.push(Slot::Header(header));

        if let Some(rect) = update.rect {
            if update.force_rect || self.rect != Some(rect) {
                header.rect = true;
                rect_offset = Some(out.len());
                out.push(Slot::Rect(rect));
                self.rect = Some(rect);
            }
        }

        if let Some((cs, color)) = update.color {
            let n = cs.n();
            let mut wanted = [0.0; MAX_COLORS];
            let given = color.len().min(n);
            wanted[..given].copy_from_slice(&color[..given]);

            if self.colorspace.as_ref() != Some(cs) {
                let mode = ColorSpaceMode::select(cs, &wanted[..n]);
                header.colorspace = mode;
                if mode == ColorSpaceMode::Explicit {
                    out.push(Slot::ColorSpace(cs.clone()));
                }
                self.colorspace = Some(cs.clone());
                self.color = mode.default_color();
            }
            if self.color[..n] != wanted[..n] {
                header.color = true;
                out.push(Slot::Color(wanted[..n].into()));
                self.color = wanted;
            }
        }

        if let Some(alpha) = update.alpha {
            if alpha != self.alpha {
                header.alpha = if alpha == 1.0 {
                    AlphaMode::Opaque
                } else if alpha == 0.0 {
                    AlphaMode::Transparent
                } else {
                    out.push(Slot::Alpha(alpha));
                    AlphaMode::Explicit
                };
                self.alpha = alpha;
            }
        }

        if let Some(ctm) = update.ctm {
            let [a, b, c, d, e, f] = ctm.as_coeffs();
            let [pa, pb, pc, pd, pe, pf] = self.ctm.as_coeffs();
            if a != pa || d != pd {
                header.ctm |= CtmChanges::AD;
                out.push(Slot::Matrix([a, d]));
            }
            if b != pb || c != pc {
                header.ctm |= CtmChanges::BC;
                out.push(Slot::Matrix([b, c]));
            }
            if e != pe || f != pf {
                header.ctm |= CtmChanges::EF;
                out.push(Slot::Matrix([e, f]));
            }
            self.ctm = ctm;
        }

        if let Some(stroke) = update.stroke {
            if self.stroke.as_ref() != Some(stroke) {
                header.stroke = true;
                out.push(Slot::Stroke(stroke.clone()));
                self.stroke = Some(stroke.clone());
            }
        }

        if let Some(path) = update.path {
            if self.path.as_ref() != Some(path) {
                header.path = true;
                out.push(Slot::Path(path.clone()));
                self.path = Some(path.clone());
            }
        }

        if let Some(payload) = payload {
            out.push(Slot::Payload(payload));
        }

        header.size = u16::try_from(out.len()).unwrap_or(u16::MAX);
        out[0] = Slot::Header(header);
        Encoded {
            header,
            rect_offset,
        }
    }
}

/// A decoded node: its header and its trailing payload, if any.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Decoded<'s> {
    pub(crate) header: NodeHeader,
    pub(crate) payload: Option<&'s Payload>,
}

/// Read-side running state, rebuilt by walking nodes forward.
#[derive(Clone, Debug)]
pub(crate) struct Decoder {
    pub(crate) rect: Rect,
    pub(crate) colorspace: ColorSpace,
    pub(crate) color: [f32; MAX_COLORS],
    pub(crate) alpha: f32,
    pub(crate) ctm: Affine,
    pub(crate) stroke: Option<StrokeState>,
    pub(crate) path: Option<Path>,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    pub(crate) fn new() -> Self {
        Self {
            rect: Rect::ZERO,
            colorspace: ColorSpace::DeviceGray,
            color: [0.0; MAX_COLORS],
            alpha: 1.0,
            ctm: Affine::IDENTITY,
            stroke: None,
            path: None,
        }
    }

    /// The running color, trimmed to the running colorspace.
    pub(crate) fn color(&self) -> &[f32] {
        &self.color[..self.colorspace.n()]
    }

    /// Applies the node starting at `slots[0]` and returns it.
    ///
    /// # Panics
    ///
    /// Panics if the slots do not follow the layout the header describes.
    /// Only the encoder writes slots, so this indicates a bug in this crate.
    pub(crate) fn decode<'s>(&mut self, slots: &'s [Slot]) -> Decoded<'s> {
        let Some(Slot::Header(header)) = slots.first() else {
            malformed("header", slots.first());
        };
        let header = *header;
        let mut blocks = slots[1..usize::from(header.size).min(slots.len())].iter();

        if header.rect {
            match blocks.next() {
                Some(Slot::Rect(r)) => self.rect = *r,
                other => malformed("rect", other),
            }
        }

        if header.colorspace != ColorSpaceMode::Unchanged {
            self.colorspace = match header.colorspace.device_space() {
                Some(cs) => cs,
                None => match blocks.next() {
                    Some(Slot::ColorSpace(cs)) => cs.clone(),
                    other => malformed("colorspace", other),
                },
            };
            self.color = header.colorspace.default_color();
        }

        if header.color {
            match blocks.next() {
                Some(Slot::Color(c)) => {
                    self.color = [0.0; MAX_COLORS];
                    self.color[..c.len()].copy_from_slice(c);
                }
                other => malformed("color", other),
            }
        }

        match header.alpha {
            AlphaMode::Unchanged => {}
            AlphaMode::Opaque => self.alpha = 1.0,
            AlphaMode::Transparent => self.alpha = 0.0,
            AlphaMode::Explicit => match blocks.next() {
                Some(Slot::Alpha(a)) => self.alpha = *a,
                other => malformed("alpha", other),
            },
        }

        if !header.ctm.is_empty() {
            let mut m = self.ctm.as_coeffs();
            let pairs = [
                (CtmChanges::AD, (0, 3)),
                (CtmChanges::BC, (1, 2)),
                (CtmChanges::EF, (4, 5)),
            ];
            for (pair, (i, j)) in pairs {
                if header.ctm.contains(pair) {
                    match blocks.next() {
                        Some(Slot::Matrix([x, y])) => {
                            m[i] = *x;
                            m[j] = *y;
                        }
                        other => malformed("matrix", other),
                    }
                }
            }
            self.ctm = Affine::new(m);
        }

        if header.stroke {
            match blocks.next() {
                Some(Slot::Stroke(s)) => self.stroke = Some(s.clone()),
                other => malformed("stroke", other),
            }
        }

        if header.path {
            match blocks.next() {
                Some(Slot::Path(p)) => self.path = Some(p.clone()),
                other => malformed("path", other),
            }
        }

        let payload = match blocks.next() {
            Some(Slot::Payload(p)) => Some(p),
            None => None,
            other => malformed("payload", other),
        };

        Decoded { header, payload }
    }
}

#[cold]
fn malformed(expected: &str, found: Option<&Slot>) -> ! {
    panic!("malformed display list node: expected {expected} block, found {found:?}")
}
