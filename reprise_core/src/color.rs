// Copyright 2026 the Reprise Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Colorspace handles, color parameters, and blend modes.
//!
//! None of these types perform color math. They are carried through a display
//! list unchanged so the target device can resolve them.

use alloc::string::String;
use alloc::sync::Arc;

/// Maximum number of color components a recorded color may carry.
pub const MAX_COLORS: usize = 32;

/// A colorspace handle.
///
/// The three device spaces are recognized by the node codec, which can encode
/// a switch to one of them together with its canonical default color in the
/// node header alone.
#[derive(Clone, Debug, PartialEq)]
pub enum ColorSpace {
    /// Single-component device gray.
    DeviceGray,
    /// Three-component device RGB.
    DeviceRgb,
    /// Four-component device CMYK.
    DeviceCmyk,
    /// Any other colorspace, resolved by the target device.
    Custom(Arc<CustomColorSpace>),
}

impl ColorSpace {
    /// Returns the number of color components.
    #[must_use]
    pub fn n(&self) -> usize {
        match self {
            Self::DeviceGray => 1,
            Self::DeviceRgb => 3,
            Self::DeviceCmyk => 4,
            Self::Custom(cs) => cs.components.min(MAX_COLORS),
        }
    }

    /// Creates a custom colorspace handle.
    #[must_use]
    pub fn custom(name: impl Into<String>, components: usize) -> Self {
        Self::Custom(Arc::new(CustomColorSpace {
            name: name.into(),
            components,
        }))
    }

    /// Returns the space's name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::DeviceGray => "DeviceGray",
            Self::DeviceRgb => "DeviceRGB",
            Self::DeviceCmyk => "DeviceCMYK",
            Self::Custom(cs) => &cs.name,
        }
    }
}

/// Description of a non-device colorspace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomColorSpace {
    /// Name used by the target device to look the space up.
    pub name: String,
    /// Number of color components.
    pub components: usize,
}

/// Rendering intent for color conversion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RenderingIntent {
    /// Perceptual.
    Perceptual,
    /// Relative colorimetric.
    #[default]
    RelativeColorimetric,
    /// Saturation.
    Saturation,
    /// Absolute colorimetric.
    AbsoluteColorimetric,
}

impl RenderingIntent {
    pub(crate) const fn to_bits(self) -> u8 {
        match self {
            Self::Perceptual => 0,
            Self::RelativeColorimetric => 1,
            Self::Saturation => 2,
            Self::AbsoluteColorimetric => 3,
        }
    }

    pub(crate) const fn from_bits(bits: u8) -> Self {
        match bits & 3 {
            0 => Self::Perceptual,
            1 => Self::RelativeColorimetric,
            2 => Self::Saturation,
            _ => Self::AbsoluteColorimetric,
        }
    }
}

/// Color conversion parameters attached to painting calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ColorParams {
    /// Rendering intent.
    pub intent: RenderingIntent,
    /// Black point compensation.
    pub black_point: bool,
    /// Overprint.
    pub overprint: bool,
    /// Overprint mode (nonzero overprint).
    pub overprint_mode: bool,
}

/// Default colorspaces that replace the device spaces for subsequent calls.
#[derive(Clone, Debug, PartialEq)]
pub struct DefaultColorSpaces {
    /// Replacement for device gray.
    pub gray: ColorSpace,
    /// Replacement for device RGB.
    pub rgb: ColorSpace,
    /// Replacement for device CMYK.
    pub cmyk: ColorSpace,
    /// Output intent, if the document declares one.
    pub output_intent: Option<ColorSpace>,
}

impl Default for DefaultColorSpaces {
    fn default() -> Self {
        Self {
            gray: ColorSpace::DeviceGray,
            rgb: ColorSpace::DeviceRgb,
            cmyk: ColorSpace::DeviceCmyk,
            output_intent: None,
        }
    }
}

/// Blend mode for transparency groups.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Source over.
    #[default]
    Normal,
    /// Multiply.
    Multiply,
    /// Screen.
    Screen,
    /// Overlay.
    Overlay,
    /// Darken.
    Darken,
    /// Lighten.
    Lighten,
    /// Color dodge.
    ColorDodge,
    /// Color burn.
    ColorBurn,
    /// Hard light.
    HardLight,
    /// Soft light.
    SoftLight,
    /// Difference.
    Difference,
    /// Exclusion.
    Exclusion,
    /// Hue (non-separable).
    Hue,
    /// Saturation (non-separable).
    Saturation,
    /// Color (non-separable).
    Color,
    /// Luminosity (non-separable).
    Luminosity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_counts() {
        assert_eq!(ColorSpace::DeviceGray.n(), 1);
        assert_eq!(ColorSpace::DeviceRgb.n(), 3);
        assert_eq!(ColorSpace::DeviceCmyk.n(), 4);
        assert_eq!(ColorSpace::custom("Lab", 3).n(), 3);
        assert_eq!(ColorSpace::custom("DeviceN", 64).n(), MAX_COLORS);
    }

    #[test]
    fn intent_bits_round_trip() {
        for intent in [
            RenderingIntent::Perceptual,
            RenderingIntent::RelativeColorimetric,
            RenderingIntent::Saturation,
            RenderingIntent::AbsoluteColorimetric,
        ] {
            assert_eq!(RenderingIntent::from_bits(intent.to_bits()), intent);
        }
    }
}
