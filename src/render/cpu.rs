use std::sync::Arc;

use crate::assets::bitmap::Bitmap;
use crate::assets::color::Color;
use crate::effects::blend::BlendMode;
use crate::effects::shadow::Shadow;
use crate::foundation::core::{
    Affine, BezPath, Canvas, CoverageMask, FillRule, FrameRGBA, Rect,
};
use crate::foundation::error::{FxError, FxResult};
use crate::foundation::math::{mul_div255_u8, premul_px, unpremultiply_rgba8_in_place};
use crate::render::blur::shadow_layer;
use crate::render::composite::composite_layer;
use crate::render::surface::DrawingSurface;

const DEFAULT_MAX_BLUR_RADIUS: u32 = 256;

/// Options for the software surface.
#[derive(Debug, Clone, Copy)]
pub struct CpuSurfaceOpts {
    pub(crate) clear_rgba: Option<[u8; 4]>,
    pub(crate) max_blur_radius: u32,
}

impl Default for CpuSurfaceOpts {
    /// `max_blur_radius` honours `CANVASFX_MAX_BLUR_RADIUS` when it holds a positive integer.
    fn default() -> Self {
        let max_blur_radius = std::env::var("CANVASFX_MAX_BLUR_RADIUS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_MAX_BLUR_RADIUS);
        Self {
            clear_rgba: None,
            max_blur_radius,
        }
    }
}

impl CpuSurfaceOpts {
    /// Return options with a straight-alpha background the surface starts from.
    pub fn with_clear_rgba(mut self, clear: Option<[u8; 4]>) -> Self {
        self.clear_rgba = clear;
        self
    }

    /// Return options with a cap on the shadow blur kernel radius, in pixels.
    pub fn with_max_blur_radius(mut self, radius: u32) -> Self {
        self.max_blur_radius = radius;
        self
    }

    pub fn max_blur_radius(&self) -> u32 {
        self.max_blur_radius
    }
}

#[derive(Clone, Debug)]
struct GState {
    transform: Affine,
    alpha: f32,
    blend: BlendMode,
    shadow: Option<Shadow>,
    /// Device-space coverage, one byte per pixel; `None` means unclipped.
    clip: Option<Arc<Vec<u8>>>,
}

impl Default for GState {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            alpha: 1.0,
            blend: BlendMode::Normal,
            shadow: None,
            clip: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Saved {
    State,
    Group,
    Raster,
}

/// Software drawing surface over premultiplied RGBA8 buffers.
///
/// Geometry is rasterized with `vello_cpu`; every transparency group and raster buffer is its
/// own full-canvas layer, composited into its parent when it ends.
pub struct CpuSurface {
    canvas: Canvas,
    opts: CpuSurfaceOpts,
    base: Vec<u8>,
    layers: Vec<Vec<u8>>,
    state: GState,
    saved: Vec<(Saved, GState)>,
    ctx: Option<vello_cpu::RenderContext>,
}

impl std::fmt::Debug for CpuSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuSurface")
            .field("canvas", &self.canvas)
            .field("opts", &self.opts)
            .field("layers", &self.layers.len())
            .field("saved", &self.saved.len())
            .finish()
    }
}

impl CpuSurface {
    pub fn new(canvas: Canvas, opts: CpuSurfaceOpts) -> FxResult<Self> {
        if canvas.width == 0 || canvas.height == 0 {
            return Err(FxError::surface("canvas dimensions must be non-zero"));
        }
        u16::try_from(canvas.width)
            .map_err(|_| FxError::surface("canvas width exceeds u16"))?;
        u16::try_from(canvas.height)
            .map_err(|_| FxError::surface("canvas height exceeds u16"))?;

        let mut base = vec![0u8; canvas.rgba8_len()];
        if let Some(clear) = opts.clear_rgba {
            let px = premul_px(clear);
            for d in base.chunks_exact_mut(4) {
                d.copy_from_slice(&px);
            }
        }
        Ok(Self {
            canvas,
            opts,
            base,
            layers: Vec::new(),
            state: GState::default(),
            saved: Vec::new(),
            ctx: None,
        })
    }

    /// Copy out the composited canvas (premultiplied). Fails while a group or raster buffer is
    /// still open, since its contents have not reached the canvas yet.
    pub fn snapshot(&self) -> FxResult<FrameRGBA> {
        if !self.layers.is_empty() {
            return Err(FxError::surface(format!(
                "cannot read the canvas with {} layer(s) still open",
                self.layers.len()
            )));
        }
        Ok(FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data: self.base.clone(),
            premultiplied: true,
        })
    }

    /// Straight-alpha image of the canvas, for encoding.
    pub fn to_rgba_image(&self) -> FxResult<image::RgbaImage> {
        let mut frame = self.snapshot()?;
        unpremultiply_rgba8_in_place(&mut frame.data);
        image::RgbaImage::from_raw(frame.width, frame.height, frame.data)
            .ok_or_else(|| FxError::surface("frame buffer does not match canvas size"))
    }

    /// Open state brackets, groups and raster buffers.
    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    fn size_u16(&self) -> (u16, u16) {
        // Checked in `new`.
        (self.canvas.width as u16, self.canvas.height as u16)
    }

    fn target_mut(&mut self) -> &mut Vec<u8> {
        match self.layers.last_mut() {
            Some(layer) => layer,
            None => &mut self.base,
        }
    }

    /// Run `paint` against a cleared render context and return the rasterized pixels.
    fn rasterize(&mut self, paint: impl FnOnce(&mut vello_cpu::RenderContext)) -> Vec<u8> {
        let (w, h) = self.size_u16();
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == w && ctx.height() == h => ctx,
            _ => vello_cpu::RenderContext::new(w, h),
        };
        ctx.reset();
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        paint(&mut ctx);
        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut pixmap);
        self.ctx = Some(ctx);
        pixmap.data_as_u8_slice().to_vec()
    }

    /// Composite a full-canvas premultiplied layer into the current target with `state`.
    #[tracing::instrument(
        level = "trace",
        skip(self, src, state),
        fields(blend = %state.blend, alpha = state.alpha)
    )]
    fn composite(&mut self, src: &[u8], state: &GState) -> FxResult<()> {
        let (w, h) = (self.canvas.width, self.canvas.height);
        let max_radius = self.opts.max_blur_radius;
        let clip = state.clip.as_deref().map(Vec::as_slice);
        let shadow = match &state.shadow {
            Some(s) if s.color().alpha() > 0.0 => Some(shadow_layer(src, w, h, s, max_radius)?),
            _ => None,
        };
        let target = self.target_mut();
        if let Some(shadow_px) = shadow {
            composite_layer(target, &shadow_px, state.alpha, state.blend, clip)?;
        }
        composite_layer(target, src, state.alpha, state.blend, clip)
    }

    fn intersect_clip(&mut self, coverage: Vec<u8>) {
        let next = match self.state.clip.take() {
            Some(prev) => prev
                .iter()
                .zip(&coverage)
                .map(|(&a, &b)| mul_div255_u8(u16::from(a), u16::from(b)))
                .collect(),
            None => coverage,
        };
        self.state.clip = Some(Arc::new(next));
    }

    fn push_layer(&mut self, kind: Saved) {
        tracing::debug!(?kind, depth = self.layers.len() + 1, "open layer");
        self.saved.push((kind, self.state.clone()));
        self.layers.push(vec![0u8; self.canvas.rgba8_len()]);
        self.state.alpha = 1.0;
        self.state.blend = BlendMode::Normal;
        self.state.shadow = None;
        // The enclosing clip applies once, when the layer composites into its parent.
        self.state.clip = None;
    }

    fn pop_layer(&mut self, kind: Saved) -> FxResult<()> {
        match self.saved.last() {
            Some((k, _)) if *k == kind => {}
            Some((k, _)) => {
                return Err(FxError::surface(format!(
                    "unbalanced nesting: expected to close {kind:?}, innermost open is {k:?}"
                )));
            }
            None => {
                return Err(FxError::surface(format!(
                    "unbalanced nesting: no open {kind:?} to close"
                )));
            }
        }
        let (Some((_, restored)), Some(layer)) = (self.saved.pop(), self.layers.pop()) else {
            return Err(FxError::surface("layer stack out of sync with state stack"));
        };
        tracing::debug!(?kind, depth = self.layers.len(), "close layer");
        self.state = restored;
        let state = self.state.clone();
        self.composite(&layer, &state)
    }
}

impl DrawingSurface for CpuSurface {
    fn canvas(&self) -> Canvas {
        self.canvas
    }

    fn push_state(&mut self) -> FxResult<()> {
        self.saved.push((Saved::State, self.state.clone()));
        Ok(())
    }

    fn pop_state(&mut self) -> FxResult<()> {
        match self.saved.last() {
            Some((Saved::State, _)) => {
                if let Some((_, st)) = self.saved.pop() {
                    self.state = st;
                }
                Ok(())
            }
            Some((k, _)) => Err(FxError::surface(format!(
                "unbalanced nesting: pop_state while a {k:?} is open"
            ))),
            None => Err(FxError::surface("unbalanced nesting: no saved state to pop")),
        }
    }

    fn transform(&self) -> Affine {
        self.state.transform
    }

    fn concat_transform(&mut self, transform: Affine) {
        self.state.transform *= transform;
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.state.alpha = alpha.clamp(0.0, 1.0);
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.state.blend = mode;
    }

    fn apply_shadow(&mut self, shadow: Option<&Shadow>) {
        self.state.shadow = shadow.cloned();
    }

    fn begin_transparency_group(&mut self) -> FxResult<()> {
        self.push_layer(Saved::Group);
        Ok(())
    }

    fn end_transparency_group(&mut self) -> FxResult<()> {
        self.pop_layer(Saved::Group)
    }

    fn begin_raster(&mut self) -> FxResult<()> {
        self.push_layer(Saved::Raster);
        Ok(())
    }

    fn end_raster(&mut self) -> FxResult<()> {
        self.pop_layer(Saved::Raster)
    }

    fn clip(&mut self, path: &BezPath, rule: FillRule) -> FxResult<()> {
        let transform = self.state.transform;
        let cpu_path = bezpath_to_cpu(path);
        let px = self.rasterize(|ctx| {
            ctx.set_transform(affine_to_cpu(transform));
            ctx.set_fill_rule(fill_rule_to_cpu(rule));
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 255));
            ctx.fill_path(&cpu_path);
        });
        self.intersect_clip(alpha_plane(&px));
        Ok(())
    }

    fn clip_to_mask(&mut self, mask: &CoverageMask, bounds: Rect) -> FxResult<()> {
        if mask.width == 0 || mask.height == 0 {
            return Err(FxError::surface("clip mask dimensions must be non-zero"));
        }
        let rgba: Vec<u8> = mask.data.iter().flat_map(|&c| [c, c, c, c]).collect();
        let image = rgba_premul_to_image(&rgba, mask.width, mask.height)?;
        let place = self.state.transform
            * Affine::translate(bounds.origin().to_vec2())
            * Affine::scale_non_uniform(
                bounds.width() / f64::from(mask.width),
                bounds.height() / f64::from(mask.height),
            );
        let (mw, mh) = (f64::from(mask.width), f64::from(mask.height));
        let px = self.rasterize(|ctx| {
            ctx.set_transform(affine_to_cpu(place));
            ctx.set_paint(image);
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, mw, mh));
        });
        self.intersect_clip(alpha_plane(&px));
        Ok(())
    }

    fn fill_path(&mut self, path: &BezPath, color: Color) -> FxResult<()> {
        let transform = self.state.transform;
        let [r, g, b, a] = color.to_rgba8();
        let cpu_path = bezpath_to_cpu(path);
        let px = self.rasterize(|ctx| {
            ctx.set_transform(affine_to_cpu(transform));
            ctx.set_fill_rule(vello_cpu::peniko::Fill::NonZero);
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
            ctx.fill_path(&cpu_path);
        });
        let state = self.state.clone();
        self.composite(&px, &state)
    }

    fn draw_image(&mut self, bitmap: &Bitmap) -> FxResult<()> {
        let image = rgba_premul_to_image(bitmap.premul_bytes(), bitmap.width(), bitmap.height())?;
        let place = self.state.transform * bitmap.screen_transform();
        let (w, h) = (f64::from(bitmap.width()), f64::from(bitmap.height()));
        let px = self.rasterize(|ctx| {
            ctx.set_transform(affine_to_cpu(place));
            ctx.set_paint(image);
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));
        });
        let state = self.state.clone();
        self.composite(&px, &state)
    }
}

fn alpha_plane(rgba: &[u8]) -> Vec<u8> {
    rgba.chunks_exact(4).map(|px| px[3]).collect()
}

fn fill_rule_to_cpu(rule: FillRule) -> vello_cpu::peniko::Fill {
    match rule {
        FillRule::NonZero => vello_cpu::peniko::Fill::NonZero,
        FillRule::EvenOdd => vello_cpu::peniko::Fill::EvenOdd,
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let pt = |p: kurbo::Point| vello_cpu::kurbo::Point::new(p.x, p.y);
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(pt(p)),
            PathEl::LineTo(p) => out.line_to(pt(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(pt(p1), pt(p2)),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(pt(p1), pt(p2), pt(p3)),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn pixmap_from_premul_bytes(bytes: &[u8], width: u32, height: u32) -> FxResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| FxError::surface("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| FxError::surface("pixmap height exceeds u16"))?;
    if bytes.len() != Canvas::new(width, height).rgba8_len() {
        return Err(FxError::surface("pixmap byte len mismatch"));
    }
    let pixels: Vec<vello_cpu::peniko::color::PremulRgba8> = bytes
        .chunks_exact(4)
        .map(|px| {
            vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]])
        })
        .collect();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

fn rgba_premul_to_image(bytes: &[u8], width: u32, height: u32) -> FxResult<vello_cpu::Image> {
    let pixmap = pixmap_from_premul_bytes(bytes, width, height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
