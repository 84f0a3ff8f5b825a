use kurbo::Shape as _;

use crate::assets::bitmap::Bitmap;
use crate::foundation::core::{Affine, BezPath, Point, Rect};

const PATH_TOLERANCE: f64 = 0.1;

/// Vector geometry with its local-to-device placement.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    pub path: BezPath,
    pub transform: Affine,
}

impl Shape {
    pub fn new(path: BezPath) -> Self {
        Self {
            path,
            transform: Affine::IDENTITY,
        }
    }

    pub fn rect(rect: Rect) -> Self {
        Self::new(rect.to_path(PATH_TOLERANCE))
    }

    pub fn circle(center: impl Into<Point>, radius: f64) -> Self {
        Self::new(kurbo::Circle::new(center, radius).to_path(PATH_TOLERANCE))
    }

    pub fn ellipse(rect: Rect) -> Self {
        Self::new(kurbo::Ellipse::from_rect(rect).to_path(PATH_TOLERANCE))
    }

    /// Parse SVG path data (`M0 0 L10 0 ...`).
    pub fn from_svg(d: &str) -> crate::FxResult<Self> {
        let path = BezPath::from_svg(d.trim())
            .map_err(|e| crate::FxError::invalid_stencil(format!("invalid svg path data: {e}")))?;
        Ok(Self::new(path))
    }

    pub fn with_transform(mut self, transform: Affine) -> Self {
        self.transform = transform;
        self
    }

    /// Path in device coordinates.
    pub fn device_path(&self) -> BezPath {
        self.transform * self.path.clone()
    }
}

/// Something a stencil can be cut from.
///
/// Vector sources answer `fill_path`, raster sources answer `bitmap`. A source answering
/// neither cannot produce a clip.
pub trait MaskSource {
    /// Closed fill geometry in local coordinates.
    fn fill_path(&self) -> Option<BezPath>;

    /// Pixel data for image-derived masks.
    fn bitmap(&self) -> Option<&Bitmap> {
        None
    }

    /// Local-to-device transform.
    fn screen_transform(&self) -> Affine;
}

impl MaskSource for Shape {
    fn fill_path(&self) -> Option<BezPath> {
        Some(self.path.clone())
    }

    fn screen_transform(&self) -> Affine {
        self.transform
    }
}

impl MaskSource for Bitmap {
    fn fill_path(&self) -> Option<BezPath> {
        None
    }

    fn bitmap(&self) -> Option<&Bitmap> {
        Some(self)
    }

    fn screen_transform(&self) -> Affine {
        Bitmap::screen_transform(self)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/shape.rs"]
mod tests;
