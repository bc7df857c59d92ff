// Copyright 2026 the Reprise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared payload values carried through a display list.
//!
//! Paths, stroke states, text runs, and shadings are produced by the content
//! interpreter and never inspected beyond their bounds. Each is a cheap handle
//! over an [`Arc`], so recording a call and replaying it many times never
//! copies the payload itself.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::ops::Deref;

use kurbo::{Affine, BezPath, Join, Point, Rect, Shape as _, Stroke};

use crate::color::ColorSpace;
use crate::geometry::{INFINITE_RECT, transform_rect, union_into};

/// Winding rule used to fill or clip a path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FillRule {
    /// Nonzero winding.
    #[default]
    NonZero,
    /// Even-odd.
    EvenOdd,
}

/// A shared path.
#[derive(Clone, Debug)]
pub struct Path(Arc<BezPath>);

impl Path {
    /// Wraps a path for sharing.
    #[must_use]
    pub fn new(path: BezPath) -> Self {
        Self(Arc::new(path))
    }

    /// Returns `true` if both handles point at the same allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Returns the device-space bounds of the path under `ctm`, optionally
    /// widened for stroking.
    #[must_use]
    pub fn bounds(&self, stroke: Option<&StrokeState>, ctm: Affine) -> Rect {
        let mut rect = self.0.bounding_box();
        if let Some(stroke) = stroke {
            let expand = stroke.expansion();
            rect = rect.inflate(expand, expand);
        }
        transform_rect(ctm, rect)
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.0 == *other.0
    }
}

impl Deref for Path {
    type Target = BezPath;

    fn deref(&self) -> &BezPath {
        &self.0
    }
}

impl From<BezPath> for Path {
    fn from(path: BezPath) -> Self {
        Self::new(path)
    }
}

/// A shared stroke style.
#[derive(Clone, Debug)]
pub struct StrokeState(Arc<Stroke>);

impl StrokeState {
    /// Wraps a stroke style for sharing.
    #[must_use]
    pub fn new(stroke: Stroke) -> Self {
        Self(Arc::new(stroke))
    }

    /// Returns `true` if both handles point at the same allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// How far a stroke can reach past the path's control box, in user space.
    fn expansion(&self) -> f64 {
        let half = self.0.width.abs() * 0.5;
        if self.0.join == Join::Miter {
            half * self.0.miter_limit.max(1.0)
        } else {
            half
        }
    }
}

impl PartialEq for StrokeState {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.0 == *other.0
    }
}

impl Deref for StrokeState {
    type Target = Stroke;

    fn deref(&self) -> &Stroke {
        &self.0
    }
}

impl From<Stroke> for StrokeState {
    fn from(stroke: Stroke) -> Self {
        Self::new(stroke)
    }
}

/// A font as far as the display list is concerned: a name and the union of
/// its glyph boxes in unit font space.
#[derive(Clone, Debug, PartialEq)]
pub struct Font {
    /// Font name, for diagnostics and for the target device.
    pub name: Arc<str>,
    /// Glyph bounding box in unit font space.
    pub bbox: Rect,
}

/// One positioned glyph in text space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Glyph {
    /// Glyph id within the font.
    pub id: u32,
    /// Origin x in text space.
    pub x: f64,
    /// Origin y in text space.
    pub y: f64,
}

/// A run of glyphs sharing one font and text-rendering matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    /// The font.
    pub font: Arc<Font>,
    /// Maps unit font space to text space (font size, skew, ...).
    pub trm: Affine,
    /// Glyphs in drawing order.
    pub glyphs: Vec<Glyph>,
}

/// A shared block of text.
#[derive(Clone, Debug)]
pub struct Text(Arc<[TextRun]>);

impl Text {
    /// Wraps a list of runs for sharing.
    #[must_use]
    pub fn new(runs: Vec<TextRun>) -> Self {
        Self(runs.into())
    }

    /// Returns the runs.
    #[must_use]
    pub fn runs(&self) -> &[TextRun] {
        &self.0
    }

    /// Returns the device-space bounds of every glyph under `ctm`, optionally
    /// widened for stroking.
    #[must_use]
    pub fn bounds(&self, stroke: Option<&StrokeState>, ctm: Affine) -> Rect {
        let mut acc = None;
        for run in self.0.iter() {
            for glyph in &run.glyphs {
                let glyph_space = Affine::translate((glyph.x, glyph.y)) * run.trm;
                acc = union_into(acc, transform_rect(glyph_space, run.font.bbox));
            }
        }
        let Some(mut rect) = acc else {
            return Rect::ZERO;
        };
        if let Some(stroke) = stroke {
            let expand = stroke.expansion();
            rect = rect.inflate(expand, expand);
        }
        transform_rect(ctm, rect)
    }

    /// Returns `true` if both handles point at the same allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// The geometry of a shading.
#[derive(Clone, Debug, PartialEq)]
pub enum ShadingKind {
    /// Function-based shading over a domain rectangle.
    Function {
        /// Domain in shading space.
        domain: Rect,
    },
    /// Axial (linear) gradient.
    Axial {
        /// Start point.
        start: Point,
        /// End point.
        end: Point,
        /// Whether to extend before the start and past the end.
        extend: [bool; 2],
    },
    /// Radial gradient between two circles.
    Radial {
        /// Start circle center.
        start: Point,
        /// Start circle radius.
        start_radius: f64,
        /// End circle center.
        end: Point,
        /// End circle radius.
        end_radius: f64,
        /// Whether to extend before the start and past the end.
        extend: [bool; 2],
    },
    /// Triangle or patch mesh.
    Mesh {
        /// Bounds of every mesh vertex in shading space.
        bounds: Rect,
    },
}

/// A shading description.
#[derive(Clone, Debug, PartialEq)]
pub struct Shading {
    /// Colorspace of the shading's color values.
    pub colorspace: ColorSpace,
    /// Optional clipping box in shading space.
    pub bbox: Option<Rect>,
    /// Geometry.
    pub kind: ShadingKind,
}

/// A shared shading.
#[derive(Clone, Debug)]
pub struct Shade(Arc<Shading>);

impl Shade {
    /// Wraps a shading for sharing.
    #[must_use]
    pub fn new(shading: Shading) -> Self {
        Self(Arc::new(shading))
    }

    /// Returns the device-space area the shading can paint under `ctm`.
    ///
    /// Shadings without a box and without bounded geometry cover everything.
    #[must_use]
    pub fn bounds(&self, ctm: Affine) -> Rect {
        let own = match self.0.kind {
            ShadingKind::Mesh { bounds } => Some(bounds),
            ShadingKind::Function { domain } => Some(domain),
            ShadingKind::Axial { .. } | ShadingKind::Radial { .. } => None,
        };
        let rect = match (self.0.bbox, own) {
            (Some(bbox), Some(own)) => bbox.intersect(own),
            (Some(r), None) | (None, Some(r)) => r,
            (None, None) => INFINITE_RECT,
        };
        transform_rect(ctm, rect)
    }

    /// Returns `true` if both handles point at the same allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for Shade {
    type Target = Shading;

    fn deref(&self) -> &Shading {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn square(size: f64) -> Path {
        let mut p = BezPath::new();
        p.move_to((0.0, 0.0));
        p.line_to((size, 0.0));
        p.line_to((size, size));
        p.line_to((0.0, size));
        p.close_path();
        Path::new(p)
    }

    #[test]
    fn path_equality_is_by_value() {
        let a = square(10.0);
        let b = square(10.0);
        assert!(!a.ptr_eq(&b));
        assert_eq!(a, b);
        assert_ne!(a, square(11.0));
    }

    #[test]
    fn stroke_widens_path_bounds() {
        let path = square(10.0);
        let mut stroke = Stroke::new(4.0);
        stroke.join = Join::Round;
        let r = path.bounds(Some(&StrokeState::new(stroke)), Affine::IDENTITY);
        assert_eq!(r, Rect::new(-2.0, -2.0, 12.0, 12.0));
    }

    #[test]
    fn miter_join_uses_limit() {
        let path = square(10.0);
        let mut stroke = Stroke::new(2.0);
        stroke.join = Join::Miter;
        stroke.miter_limit = 3.0;
        let r = path.bounds(Some(&StrokeState::new(stroke)), Affine::IDENTITY);
        assert_eq!(r, Rect::new(-3.0, -3.0, 13.0, 13.0));
    }

    #[test]
    fn text_bounds_cover_every_glyph() {
        let font = Arc::new(Font {
            name: "Test".into(),
            bbox: Rect::new(0.0, -0.25, 1.0, 1.0),
        });
        let text = Text::new(vec![TextRun {
            font,
            trm: Affine::scale(10.0),
            glyphs: vec![
                Glyph {
                    id: 1,
                    x: 0.0,
                    y: 0.0,
                },
                Glyph {
                    id: 2,
                    x: 20.0,
                    y: 0.0,
                },
            ],
        }]);
        let r = text.bounds(None, Affine::IDENTITY);
        assert_eq!(r, Rect::new(0.0, -2.5, 30.0, 10.0));
    }

    #[test]
    fn empty_text_has_empty_bounds() {
        let text = Text::new(vec![]);
        assert_eq!(text.bounds(None, Affine::IDENTITY), Rect::ZERO);
    }

    #[test]
    fn unbounded_shade_is_infinite() {
        let shade = Shade::new(Shading {
            colorspace: ColorSpace::DeviceRgb,
            bbox: None,
            kind: ShadingKind::Axial {
                start: Point::ZERO,
                end: Point::new(1.0, 0.0),
                extend: [true, true],
            },
        });
        assert_eq!(shade.bounds(Affine::scale(3.0)), INFINITE_RECT);
    }

    #[test]
    fn mesh_shade_is_clipped_by_bbox() {
        let shade = Shade::new(Shading {
            colorspace: ColorSpace::DeviceGray,
            bbox: Some(Rect::new(0.0, 0.0, 5.0, 5.0)),
            kind: ShadingKind::Mesh {
                bounds: Rect::new(2.0, 2.0, 10.0, 10.0),
            },
        });
        assert_eq!(shade.bounds(Affine::IDENTITY), Rect::new(2.0, 2.0, 5.0, 5.0));
    }
}
