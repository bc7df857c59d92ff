// Copyright 2026 the Reprise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Image payloads, including images backed by a display list.
//!
//! Images are drawn in the unit square; the transform passed with a
//! `fill_image` call maps that square to the page. A [`ListImage`] defers
//! rasterization of a recorded list until someone actually samples the
//! image: it only carries the list, its declared size, and the matrix that
//! maps the list's content onto the unit square.

use alloc::sync::Arc;

use kurbo::{Affine, Rect};

use crate::color::ColorSpace;
use crate::geometry::transform_rect;
use crate::list::DisplayList;

/// Where an image's samples come from.
#[derive(Clone, Debug)]
pub enum ImageSource {
    /// Decoded samples, laid out by the producer.
    Pixels(Arc<[u8]>),
    /// A display list rendered on demand.
    DisplayList(ListImage),
}

#[derive(Debug)]
struct ImageData {
    width: u32,
    height: u32,
    colorspace: Option<ColorSpace>,
    source: ImageSource,
}

/// A shared image.
#[derive(Clone, Debug)]
pub struct Image(Arc<ImageData>);

impl Image {
    /// Creates an image from decoded samples.
    ///
    /// `colorspace` is `None` for stencil masks.
    #[must_use]
    pub fn from_pixels(
        width: u32,
        height: u32,
        colorspace: Option<ColorSpace>,
        pixels: Arc<[u8]>,
    ) -> Self {
        Self(Arc::new(ImageData {
            width,
            height,
            colorspace,
            source: ImageSource::Pixels(pixels),
        }))
    }

    /// Wraps a display list as an image.
    ///
    /// `width` and `height` are the conceptual size of the image; the pixel
    /// size reported by [`width`](Self::width)/[`height`](Self::height) is
    /// that size rounded up. `transform` maps the list's content onto the
    /// unit square. The image holds its own reference to `list`.
    #[must_use]
    pub fn from_display_list(
        width: f64,
        height: f64,
        transform: Affine,
        list: DisplayList,
    ) -> Self {
        let list_image = ListImage {
            list,
            width,
            height,
            transform,
        };
        Self(Arc::new(ImageData {
            width: pixel_extent(width),
            height: pixel_extent(height),
            colorspace: None,
            source: ImageSource::DisplayList(list_image),
        }))
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.0.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.0.height
    }

    /// The image's colorspace, if it has one.
    #[must_use]
    pub fn colorspace(&self) -> Option<&ColorSpace> {
        self.0.colorspace.as_ref()
    }

    /// Where the samples come from.
    #[must_use]
    pub fn source(&self) -> &ImageSource {
        &self.0.source
    }

    /// Returns the list-backed view of this image, if it is one.
    #[must_use]
    pub fn as_list_image(&self) -> Option<&ListImage> {
        match &self.0.source {
            ImageSource::DisplayList(l) => Some(l),
            ImageSource::Pixels(_) => None,
        }
    }

    /// Device-space bounds of the unit square under `ctm`.
    #[must_use]
    pub fn bounds(&self, ctm: Affine) -> Rect {
        transform_rect(ctm, Rect::new(0.0, 0.0, 1.0, 1.0))
    }

    /// Returns `true` if both handles point at the same allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A display list presented as an image.
#[derive(Clone, Debug)]
pub struct ListImage {
    list: DisplayList,
    width: f64,
    height: f64,
    transform: Affine,
}

impl ListImage {
    /// The wrapped list.
    #[must_use]
    pub fn list(&self) -> &DisplayList {
        &self.list
    }

    /// The matrix that maps the list's content onto the unit square.
    #[must_use]
    pub fn transform(&self) -> Affine {
        self.transform
    }

    /// Declared width.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Declared height.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Returns the transform that maps the list's content into an
    /// `image_ctm`-placed unit square, ready to hand to
    /// [`DisplayList::run`].
    #[must_use]
    pub fn placement(&self, image_ctm: Affine) -> Affine {
        image_ctm * self.transform
    }
}

fn pixel_extent(v: f64) -> u32 {
    if v.is_nan() || v <= 0.0 {
        return 0;
    }
    #[expect(
        clippy::cast_possible_truncation,
        reason = "float to int casts saturate, which is the intent"
    )]
    let whole = v as u32;
    if f64::from(whole) < v {
        whole.saturating_add(1)
    } else {
        whole
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_image_holds_a_reference() {
        let list = DisplayList::new(Rect::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(list.strong_count(), 1);
        let image = Image::from_display_list(100.0, 50.5, Affine::scale(0.01), list.clone());
        assert_eq!(list.strong_count(), 2);
        assert_eq!(image.width(), 100);
        assert_eq!(image.height(), 51);
        drop(image);
        assert_eq!(list.strong_count(), 1);
    }

    #[test]
    fn list_image_exposes_list_and_transform() {
        let list = DisplayList::new(Rect::new(0.0, 0.0, 10.0, 10.0));
        let t = Affine::scale(0.1);
        let image = Image::from_display_list(10.0, 10.0, t, list.clone());
        let li = image.as_list_image().unwrap();
        assert!(li.list().ptr_eq(&list));
        assert_eq!(li.transform(), t);
        assert_eq!(li.placement(Affine::scale(200.0)), Affine::scale(200.0) * t);
    }

    #[test]
    fn pixel_images_are_not_list_backed() {
        let image = Image::from_pixels(2, 2, Some(ColorSpace::DeviceGray), Arc::from([0_u8; 4]));
        assert!(image.as_list_image().is_none());
        assert_eq!(image.colorspace(), Some(&ColorSpace::DeviceGray));
    }

    #[test]
    fn degenerate_sizes_clamp_to_zero() {
        assert_eq!(pixel_extent(-3.0), 0);
        assert_eq!(pixel_extent(f64::NAN), 0);
        assert_eq!(pixel_extent(0.2), 1);
    }
}
