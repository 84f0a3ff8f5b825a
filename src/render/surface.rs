use crate::assets::bitmap::Bitmap;
use crate::assets::color::Color;
use crate::effects::blend::BlendMode;
use crate::effects::shadow::Shadow;
use crate::foundation::core::{Affine, BezPath, Canvas, CoverageMask, FillRule, Rect};
use crate::foundation::error::FxResult;

/// The drawing backend the compositing engine runs against.
///
/// State follows the usual graphics-state model: `push_state`/`pop_state` save and restore the
/// transform, alpha, blend mode, shadow and clip. Beginning a transparency group (or a raster
/// buffer) implicitly saves the state and resets alpha, blend mode and shadow inside it; ending
/// it restores the saved state and composites the layer with that restored state.
///
/// Paths and bitmaps are given in user space and mapped through the current transform.
pub trait DrawingSurface {
    /// Pixel size of the target.
    fn canvas(&self) -> Canvas;

    fn push_state(&mut self) -> FxResult<()>;

    fn pop_state(&mut self) -> FxResult<()>;

    /// Current user-to-device transform.
    fn transform(&self) -> Affine;

    fn concat_transform(&mut self, transform: Affine);

    fn set_alpha(&mut self, alpha: f32);

    fn set_blend_mode(&mut self, mode: BlendMode);

    /// Set (or clear, with `None`) the shadow cast by subsequent drawing.
    fn apply_shadow(&mut self, shadow: Option<&Shadow>);

    fn begin_transparency_group(&mut self) -> FxResult<()>;

    fn end_transparency_group(&mut self) -> FxResult<()>;

    /// Redirect drawing into a dedicated offscreen pixel buffer.
    fn begin_raster(&mut self) -> FxResult<()>;

    fn end_raster(&mut self) -> FxResult<()>;

    /// Intersect the clip with the interior of `path`.
    fn clip(&mut self, path: &BezPath, rule: FillRule) -> FxResult<()>;

    /// Intersect the clip with `mask` stretched over `bounds`; everything outside `bounds` is
    /// clipped away.
    fn clip_to_mask(&mut self, mask: &CoverageMask, bounds: Rect) -> FxResult<()>;

    fn fill_path(&mut self, path: &BezPath, color: Color) -> FxResult<()>;

    /// Draw a bitmap at its own screen transform (composed with the current transform).
    fn draw_image(&mut self, bitmap: &Bitmap) -> FxResult<()>;
}
