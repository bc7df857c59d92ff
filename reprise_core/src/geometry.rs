// Copyright 2026 the Reprise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangle helpers shared by the recorder and the player.
//!
//! Display lists use [`kurbo::Rect`] for every bounding box. Two special
//! values matter here:
//!
//! - **Infinite**: [`INFINITE_RECT`], meaning "unbounded" (an unclipped
//!   shading, a caller that wants no scissoring).
//! - **Empty**: any rect without positive width *and* height, including
//!   rects with `NaN` edges.
//!
//! `kurbo` has no notion of either, and multiplying an infinite edge by a zero
//! matrix coefficient yields `NaN`, so transforms go through
//! [`transform_rect`] instead of [`Affine::transform_rect_bbox`] directly.

use kurbo::{Affine, Rect};

/// The unbounded rectangle.
pub const INFINITE_RECT: Rect = Rect::new(
    f64::NEG_INFINITY,
    f64::NEG_INFINITY,
    f64::INFINITY,
    f64::INFINITY,
);

/// Returns `true` if `rect` covers no area.
#[inline]
#[must_use]
pub fn is_empty(rect: Rect) -> bool {
    !(rect.x0 < rect.x1 && rect.y0 < rect.y1)
}

/// Returns `true` if any edge of `rect` is infinite.
#[inline]
#[must_use]
pub fn is_infinite(rect: Rect) -> bool {
    rect.x0 == f64::NEG_INFINITY
        || rect.y0 == f64::NEG_INFINITY
        || rect.x1 == f64::INFINITY
        || rect.y1 == f64::INFINITY
}

/// Maps `rect` through `ctm` and returns the axis-aligned bounds.
///
/// Infinite rects stay infinite and empty rects stay empty.
#[must_use]
pub fn transform_rect(ctm: Affine, rect: Rect) -> Rect {
    if is_infinite(rect) || is_empty(rect) {
        return rect;
    }
    ctm.transform_rect_bbox(rect)
}

/// Intersects two rects; disjoint inputs produce an empty rect.
#[inline]
#[must_use]
pub fn intersect(a: Rect, b: Rect) -> Rect {
    a.intersect(b)
}

/// Unions `rect` into an optional accumulator, ignoring empty inputs.
#[must_use]
pub fn union_into(acc: Option<Rect>, rect: Rect) -> Option<Rect> {
    if is_empty(rect) {
        return acc;
    }
    Some(match acc {
        Some(acc) => acc.union(rect),
        None => rect,
    })
}
