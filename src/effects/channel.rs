use std::fmt;
use std::str::FromStr;

use crate::assets::bitmap::Bitmap;
use crate::foundation::core::CoverageMask;
use crate::foundation::error::{FxError, FxResult};

/// Image channel a bitmap stencil is cut from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Channel {
    Red,
    Green,
    Blue,
    Alpha,
    /// Equal-weighted average of r, g and b.
    Luminance,
}

impl Channel {
    pub fn name(self) -> &'static str {
        match self {
            Channel::Red => "red",
            Channel::Green => "green",
            Channel::Blue => "blue",
            Channel::Alpha => "alpha",
            Channel::Luminance => "luminance",
        }
    }

    pub fn parse(name: &str) -> FxResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "red" | "r" => Ok(Channel::Red),
            "green" | "g" => Ok(Channel::Green),
            "blue" | "b" => Ok(Channel::Blue),
            "alpha" | "a" => Ok(Channel::Alpha),
            "luminance" | "luma" | "black" | "white" => Ok(Channel::Luminance),
            _ => Err(FxError::invalid_stencil(format!(
                "unknown channel \"{name}\" (expected red, green, blue, alpha or luminance)"
            ))),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Channel {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Channel {
    type Error = FxError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Channel> for String {
    fn from(c: Channel) -> Self {
        c.name().to_owned()
    }
}

/// Affine color transform in the five-vector layout: each output channel is the dot product of
/// its row with straight `(r, g, b, a)` plus the matching `bias` component.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorMatrix {
    pub r: [f32; 4],
    pub g: [f32; 4],
    pub b: [f32; 4],
    pub a: [f32; 4],
    pub bias: [f32; 4],
}

/// 0.333 per channel, not 1/3. The coefficient is part of the mask output.
const LUMA_WEIGHT: f32 = 0.333;

impl ColorMatrix {
    pub const IDENTITY: ColorMatrix = ColorMatrix {
        r: [1.0, 0.0, 0.0, 0.0],
        g: [0.0, 1.0, 0.0, 0.0],
        b: [0.0, 0.0, 1.0, 0.0],
        a: [0.0, 0.0, 0.0, 1.0],
        bias: [0.0; 4],
    };

    /// Copy one channel into r, g and b and force full opacity.
    pub fn isolate(channel: Channel) -> Self {
        let row = match channel {
            Channel::Red => [1.0, 0.0, 0.0, 0.0],
            Channel::Green => [0.0, 1.0, 0.0, 0.0],
            Channel::Blue => [0.0, 0.0, 1.0, 0.0],
            Channel::Alpha => [0.0, 0.0, 0.0, 1.0],
            Channel::Luminance => [LUMA_WEIGHT, LUMA_WEIGHT, LUMA_WEIGHT, 0.0],
        };
        Self {
            r: row,
            g: row,
            b: row,
            a: [0.0; 4],
            bias: [0.0, 0.0, 0.0, 1.0],
        }
    }

    /// Tone inversion of r, g and b, or a pass-through when `identity` is set. Output is opaque.
    pub fn polarity(identity: bool) -> Self {
        let p = if identity { 1.0 } else { -1.0 };
        let bias = if identity { 0.0 } else { 1.0 };
        Self {
            r: [p, 0.0, 0.0, 0.0],
            g: [0.0, p, 0.0, 0.0],
            b: [0.0, 0.0, p, 0.0],
            a: [0.0; 4],
            bias: [bias, bias, bias, 1.0],
        }
    }

    /// Row-major 4x5 coefficients (`[r0 r1 r2 r3 bias_r, g0 ...]`).
    pub fn coeffs(&self) -> [f32; 20] {
        let mut m = [0.0f32; 20];
        for (i, row) in [self.r, self.g, self.b, self.a].iter().enumerate() {
            m[i * 5..i * 5 + 4].copy_from_slice(row);
            m[i * 5 + 4] = self.bias[i];
        }
        m
    }

    /// Run the matrix over a bitmap, keeping its size and placement.
    pub fn apply(&self, src: &Bitmap) -> FxResult<Bitmap> {
        let mut out = vec![0u8; src.premul_bytes().len()];
        color_matrix_rgba8_premul(src.premul_bytes(), &mut out, self.coeffs());
        let has_alpha = out.chunks_exact(4).any(|px| px[3] != 255);
        Ok(
            Bitmap::from_premul_rgba8(src.width(), src.height(), out, has_alpha)?
                .with_transform(src.screen_transform()),
        )
    }
}

/// The two filters a bitmap stencil is built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaskFilter {
    /// Isolate one channel into an opaque greyscale image.
    Channel(Channel),
    /// Invert tones unless the flag (identity) is set.
    Polarity(bool),
}

impl MaskFilter {
    pub fn matrix(self) -> ColorMatrix {
        match self {
            MaskFilter::Channel(c) => ColorMatrix::isolate(c),
            MaskFilter::Polarity(identity) => ColorMatrix::polarity(identity),
        }
    }

    pub fn apply(self, src: &Bitmap) -> FxResult<Bitmap> {
        self.matrix().apply(src)
    }
}

pub fn isolate_channel(channel: Channel, img: &Bitmap) -> FxResult<Bitmap> {
    MaskFilter::Channel(channel).apply(img)
}

pub fn invert_polarity(identity: bool, img: &Bitmap) -> FxResult<Bitmap> {
    MaskFilter::Polarity(identity).apply(img)
}

/// Read a greyscale image as an image mask: black paints, white is masked out.
pub fn image_mask_coverage(grey: &Bitmap) -> CoverageMask {
    let data = grey
        .premul_bytes()
        .chunks_exact(4)
        .map(|px| 255 - px[0])
        .collect();
    CoverageMask {
        width: grey.width(),
        height: grey.height(),
        data,
    }
}

fn color_matrix_rgba8_premul(src: &[u8], dst: &mut [u8], m: [f32; 20]) {
    debug_assert_eq!(src.len(), dst.len());
    for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
        let pa = f32::from(s[3]) / 255.0;
        let inv_a = if pa > 0.0 { 1.0 / pa } else { 0.0 };
        let r = (f32::from(s[0]) / 255.0 * inv_a).min(1.0);
        let g = (f32::from(s[1]) / 255.0 * inv_a).min(1.0);
        let b = (f32::from(s[2]) / 255.0 * inv_a).min(1.0);
        let a = pa;

        let row = |i: usize| {
            (m[i] * r + m[i + 1] * g + m[i + 2] * b + m[i + 3] * a + m[i + 4]).clamp(0.0, 1.0)
        };
        let out_r = row(0);
        let out_g = row(5);
        let out_b = row(10);
        let out_a = row(15);

        let to_u8 = |x: f32| (x * 255.0).round().clamp(0.0, 255.0) as u8;
        d[0] = to_u8(out_r * out_a);
        d[1] = to_u8(out_g * out_a);
        d[2] = to_u8(out_b * out_a);
        d[3] = to_u8(out_a);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/channel.rs"]
mod tests;
