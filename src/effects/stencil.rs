use kurbo::Shape as _;

use crate::assets::bitmap::Bitmap;
use crate::assets::shape::MaskSource;
use crate::effects::channel::{Channel, MaskFilter, image_mask_coverage};
use crate::foundation::core::{Affine, BezPath, CoverageMask, FillRule};
use crate::foundation::error::{FxError, FxResult};
use crate::render::context::CompositingContext;
use crate::render::surface::DrawingSurface;

/// Where a stencil's clip comes from. Decided once, at construction.
#[derive(Clone, Debug)]
pub enum StencilSource {
    Path {
        path: BezPath,
        transform: Affine,
        /// Clip to the complement of the path.
        even_odd: bool,
    },
    Bitmap {
        bitmap: Bitmap,
        channel: Channel,
        /// Polarity flag handed to the inversion filter, after the luminance flip.
        invert: bool,
    },
}

/// A clip region cut from a vector shape or from one channel of a bitmap.
///
/// `set` installs the clip but never removes it; run it inside a state bracket (or use
/// [`Stencil::clipped`]).
#[derive(Clone, Debug)]
pub struct Stencil {
    source: StencilSource,
}

impl Stencil {
    /// Build a stencil from anything exposing a fill path or pixels.
    ///
    /// Vector sources clip to their interior, or to everything outside it when `invert` is set.
    /// Bitmap sources default to the alpha channel when the bitmap has one and to luminance
    /// otherwise. Luminance reverses the sense of `invert`: dark areas stay visible unless
    /// `invert` is set.
    pub fn new(source: &dyn MaskSource, invert: bool, channel: Option<Channel>) -> FxResult<Self> {
        if let Some(path) = source.fill_path() {
            return Ok(Self {
                source: StencilSource::Path {
                    path,
                    transform: source.screen_transform(),
                    even_odd: invert,
                },
            });
        }
        if let Some(bitmap) = source.bitmap() {
            let channel = channel.unwrap_or(if bitmap.has_alpha() {
                Channel::Alpha
            } else {
                Channel::Luminance
            });
            let invert = if channel == Channel::Luminance {
                !invert
            } else {
                invert
            };
            return Ok(Self {
                source: StencilSource::Bitmap {
                    bitmap: bitmap.clone().with_transform(source.screen_transform()),
                    channel,
                    invert,
                },
            });
        }
        Err(FxError::invalid_stencil(
            "stencil source must expose a fill path or bitmap data",
        ))
    }

    pub fn source(&self) -> &StencilSource {
        &self.source
    }

    /// Coverage for a bitmap stencil; `None` for vector stencils.
    pub fn mask(&self) -> FxResult<Option<CoverageMask>> {
        match &self.source {
            StencilSource::Path { .. } => Ok(None),
            StencilSource::Bitmap {
                bitmap,
                channel,
                invert,
            } => bitmap_coverage(bitmap, *channel, *invert).map(Some),
        }
    }

    /// Intersect the surface clip with this stencil.
    #[tracing::instrument(level = "debug", skip_all, fields(kind = self.kind()))]
    pub fn set<S: DrawingSurface + ?Sized>(&self, surface: &mut S) -> FxResult<()> {
        match &self.source {
            StencilSource::Path {
                path,
                transform,
                even_odd: false,
            } => surface.clip(&(*transform * path.clone()), FillRule::NonZero),
            StencilSource::Path {
                path,
                transform,
                even_odd: true,
            } => {
                let ctm = surface.transform();
                if !is_invertible(ctm) {
                    return Err(FxError::invalid_stencil(
                        "cannot invert a stencil under a singular transform",
                    ));
                }
                let mut knockout = ctm.inverse() * surface.canvas().bounds().to_path(0.1);
                knockout.extend((*transform * path.clone()).elements().iter().copied());
                surface.clip(&knockout, FillRule::EvenOdd)
            }
            StencilSource::Bitmap {
                bitmap,
                channel,
                invert,
            } => {
                let placement = bitmap.screen_transform();
                if !is_invertible(placement) {
                    return Err(FxError::invalid_stencil(
                        "bitmap stencil has a singular transform",
                    ));
                }
                let mask = bitmap_coverage(bitmap, *channel, *invert)?;
                surface.concat_transform(placement);
                let res = surface.clip_to_mask(&mask, bitmap.bounds());
                surface.concat_transform(placement.inverse());
                res
            }
        }
    }

    /// Install the clip and run `body`. The clip stays in place afterwards.
    pub fn applied<S: DrawingSurface, R>(
        &self,
        ctx: &mut CompositingContext<S>,
        body: impl FnOnce(&mut CompositingContext<S>) -> FxResult<R>,
    ) -> FxResult<R> {
        self.set(ctx.surface_mut())?;
        body(ctx)
    }

    /// [`Stencil::applied`] inside a state bracket, so the clip is gone when `body` returns.
    pub fn clipped<S: DrawingSurface, R>(
        &self,
        ctx: &mut CompositingContext<S>,
        body: impl FnOnce(&mut CompositingContext<S>) -> FxResult<R>,
    ) -> FxResult<R> {
        ctx.saved(|ctx| self.applied(ctx, body))
    }

    fn kind(&self) -> &'static str {
        match self.source {
            StencilSource::Path { even_odd: false, .. } => "path",
            StencilSource::Path { even_odd: true, .. } => "path-inverted",
            StencilSource::Bitmap { .. } => "bitmap",
        }
    }
}

fn bitmap_coverage(bitmap: &Bitmap, channel: Channel, invert: bool) -> FxResult<CoverageMask> {
    let grey = MaskFilter::Channel(channel).apply(bitmap)?;
    let toned = MaskFilter::Polarity(invert).apply(&grey)?;
    Ok(image_mask_coverage(&toned))
}

fn is_invertible(t: Affine) -> bool {
    let det = t.determinant();
    det.is_finite() && det.abs() > 1e-12
}

#[cfg(test)]
#[path = "../../tests/unit/effects/stencil.rs"]
mod tests;
