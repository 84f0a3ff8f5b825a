use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::core::{Affine, Canvas, Rect};
use crate::foundation::error::{FxError, FxResult};
use crate::foundation::math::{premultiply_rgba8_in_place, unpremultiply_rgba8_in_place};

/// Decoded raster image held as premultiplied RGBA8.
///
/// Pixel data is shared behind an `Arc`, so cloning a bitmap (e.g. when it is attached to a
/// stencil or a drawable) never copies the buffer.
#[derive(Clone, Debug)]
pub struct Bitmap {
    width: u32,
    height: u32,
    rgba8_premul: Arc<Vec<u8>>,
    has_alpha: bool,
    transform: Affine,
}

impl Bitmap {
    /// Build from tightly packed straight-alpha RGBA8 bytes.
    pub fn from_rgba8(width: u32, height: u32, mut rgba: Vec<u8>) -> FxResult<Self> {
        check_len(width, height, rgba.len())?;
        let has_alpha = rgba.chunks_exact(4).any(|px| px[3] != 255);
        premultiply_rgba8_in_place(&mut rgba);
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba),
            has_alpha,
            transform: Affine::IDENTITY,
        })
    }

    /// Build from premultiplied RGBA8 bytes, with an explicit alpha-channel flag.
    pub fn from_premul_rgba8(
        width: u32,
        height: u32,
        rgba8_premul: Vec<u8>,
        has_alpha: bool,
    ) -> FxResult<Self> {
        check_len(width, height, rgba8_premul.len())?;
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
            has_alpha,
            transform: Affine::IDENTITY,
        })
    }

    /// Opaque bitmap filled with a single straight-alpha color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> FxResult<Self> {
        let len = Canvas::new(width, height).rgba8_len();
        let mut bytes = vec![0u8; len];
        for px in bytes.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
        Self::from_rgba8(width, height, bytes)
    }

    /// Convert an already decoded image. Whether the source format carries alpha is preserved.
    pub fn from_dynamic_image(img: &image::DynamicImage) -> FxResult<Self> {
        let has_alpha = img.color().has_alpha();
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut bytes = rgba.into_raw();
        premultiply_rgba8_in_place(&mut bytes);
        Self::from_premul_rgba8(width, height, bytes, has_alpha)
    }

    /// Decode an encoded image (PNG, JPEG, ...) from memory.
    pub fn decode(bytes: &[u8]) -> FxResult<Self> {
        let img = image::load_from_memory(bytes).context("decode image from memory")?;
        Self::from_dynamic_image(&img)
    }

    /// Open and decode an image file.
    pub fn open(path: impl AsRef<Path>) -> FxResult<Self> {
        let path = path.as_ref();
        let img = image::open(path).with_context(|| format!("open image '{}'", path.display()))?;
        Self::from_dynamic_image(&img)
    }

    /// Same pixels placed with a different local-to-device transform.
    pub fn with_transform(mut self, transform: Affine) -> Self {
        self.transform = transform;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Canvas {
        Canvas::new(self.width, self.height)
    }

    /// Pixel rectangle in the bitmap's local coordinates.
    pub fn bounds(&self) -> Rect {
        self.size().bounds()
    }

    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    pub fn screen_transform(&self) -> Affine {
        self.transform
    }

    pub fn premul_bytes(&self) -> &[u8] {
        self.rgba8_premul.as_slice()
    }

    /// Straight-alpha pixel at `(x, y)`; `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.rgba8_premul.get(idx..idx + 4)?;
        Some(crate::foundation::math::unpremul_px([
            px[0], px[1], px[2], px[3],
        ]))
    }

    /// Export as a straight-alpha `image::RgbaImage`.
    pub fn to_rgba_image(&self) -> FxResult<image::RgbaImage> {
        let mut bytes = self.rgba8_premul.as_ref().clone();
        unpremultiply_rgba8_in_place(&mut bytes);
        image::RgbaImage::from_raw(self.width, self.height, bytes)
            .ok_or_else(|| FxError::surface("bitmap buffer does not match its dimensions"))
    }
}

fn check_len(width: u32, height: u32, len: usize) -> FxResult<()> {
    if width == 0 || height == 0 {
        return Err(FxError::surface("bitmap dimensions must be non-zero"));
    }
    let want = Canvas::new(width, height).rgba8_len();
    if len != want {
        return Err(FxError::surface(format!(
            "bitmap byte len mismatch: got {len}, want {want} for {width}x{height}"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/bitmap.rs"]
mod tests;
