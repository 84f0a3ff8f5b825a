use smallvec::smallvec;

use crate::assets::bitmap::Bitmap;
use crate::assets::color::Color;
use crate::assets::shape::{MaskSource, Shape};
use crate::effects::blend::BlendMode;
use crate::effects::effect::{Effect, EffectKind, EffectSettings, EffectSpec, Rollback};
use crate::effects::shadow::Shadow;
use crate::effects::stencil::Stencil;
use crate::foundation::core::{Affine, BezPath};
use crate::foundation::error::{FxResult, prefer_primary};
use crate::render::surface::DrawingSurface;

/// A drawable handed to [`CompositingContext::draw`].
#[derive(Clone, Debug)]
pub enum Grob {
    Fill { shape: Shape, color: Color },
    Image(Bitmap),
    /// One-shot effect around its attached children.
    Group(Effect),
    /// Children drawn under a stencil clip.
    Masked { stencil: Stencil, contents: Vec<Grob> },
}

impl Grob {
    pub fn fill(shape: Shape, color: Color) -> Self {
        Grob::Fill { shape, color }
    }

    pub fn masked(stencil: Stencil, contents: impl IntoIterator<Item = Grob>) -> Self {
        Grob::Masked {
            stencil,
            contents: contents.into_iter().collect(),
        }
    }
}

impl From<Bitmap> for Grob {
    fn from(bitmap: Bitmap) -> Self {
        Grob::Image(bitmap)
    }
}

impl From<Effect> for Grob {
    fn from(effect: Effect) -> Self {
        Grob::Group(effect)
    }
}

impl MaskSource for Grob {
    fn fill_path(&self) -> Option<BezPath> {
        match self {
            Grob::Fill { shape, .. } => Some(shape.path.clone()),
            _ => None,
        }
    }

    fn bitmap(&self) -> Option<&Bitmap> {
        match self {
            Grob::Image(b) => Some(b),
            _ => None,
        }
    }

    fn screen_transform(&self) -> Affine {
        match self {
            Grob::Fill { shape, .. } => shape.transform,
            Grob::Image(b) => b.screen_transform(),
            _ => Affine::IDENTITY,
        }
    }
}

/// The drawing surface together with the ambient effect state and the stack of open effect
/// frames.
///
/// Every context is independent; nothing here is global.
#[derive(Debug)]
pub struct CompositingContext<S: DrawingSurface> {
    surface: S,
    ambient: EffectSettings,
    frames: Vec<EffectSettings>,
}

impl<S: DrawingSurface> CompositingContext<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            ambient: EffectSettings::default(),
            frames: Vec::new(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Settings applied to primitives drawn outside any scope that overrides them.
    pub fn ambient(&self) -> &EffectSettings {
        &self.ambient
    }

    /// Settings of the open effect scopes, outermost first.
    pub fn frames(&self) -> &[EffectSettings] {
        &self.frames
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn ambient_mut(&mut self) -> &mut EffectSettings {
        &mut self.ambient
    }

    pub(crate) fn push_frame(&mut self, settings: EffectSettings) {
        self.frames.push(settings);
    }

    pub(crate) fn pop_frame(&mut self) {
        if self.frames.pop().is_none() {
            tracing::warn!("effect frame stack underflow");
        }
    }

    /// Run `body` inside a surface state bracket. The state is popped on every path.
    pub fn saved<R>(&mut self, body: impl FnOnce(&mut Self) -> FxResult<R>) -> FxResult<R> {
        self.surface.push_state()?;
        let out = body(self);
        let cleanup = self.surface.pop_state();
        prefer_primary(out, cleanup)
    }

    pub fn draw(&mut self, grob: &Grob) -> FxResult<()> {
        match grob {
            Grob::Fill { .. } | Grob::Image(_) => {
                let ambient = Effect::from_settings(self.ambient.clone());
                self.saved(|ctx| ambient.applied(ctx, |ctx| ctx.draw_leaf(grob)))
            }
            Grob::Group(effect) => {
                let mut frame = effect.copy();
                frame.scoped(self, |ctx| ctx.draw_all(effect.contents()))
            }
            Grob::Masked { stencil, contents } => {
                stencil.clipped(self, |ctx| ctx.draw_all(contents))
            }
        }
    }

    pub fn draw_all<'g>(&mut self, grobs: impl IntoIterator<Item = &'g Grob>) -> FxResult<()> {
        for g in grobs {
            self.draw(g)?;
        }
        Ok(())
    }

    fn draw_leaf(&mut self, grob: &Grob) -> FxResult<()> {
        match grob {
            Grob::Fill { shape, color } => {
                self.surface.concat_transform(shape.transform);
                self.surface.fill_path(&shape.path, *color)
            }
            Grob::Image(bitmap) => self.surface.draw_image(bitmap),
            Grob::Group(_) | Grob::Masked { .. } => self.draw(grob),
        }
    }

    /// Set the ambient alpha. The returned effect restores the previous value when its scope
    /// exits; dropping it unused keeps the new value.
    pub fn set_alpha(&mut self, alpha: f64) -> FxResult<Effect> {
        let validated = Effect::new(EffectSpec::default().alpha(alpha))?;
        Ok(self.replace_ambient(EffectKind::Alpha, validated.settings()))
    }

    pub fn set_blend(&mut self, name: &str) -> FxResult<Effect> {
        let validated = Effect::new(EffectSpec::default().blend(name))?;
        Ok(self.replace_ambient(EffectKind::Blend, validated.settings()))
    }

    pub fn set_blend_mode(&mut self, mode: BlendMode) -> Effect {
        let settings = EffectSettings {
            blend: Some(mode),
            ..EffectSettings::default()
        };
        self.replace_ambient(EffectKind::Blend, &settings)
    }

    /// `None` turns the ambient shadow off.
    pub fn set_shadow(&mut self, shadow: Option<&Shadow>) -> Effect {
        let settings = EffectSettings {
            shadow: shadow.cloned(),
            ..EffectSettings::default()
        };
        self.replace_ambient(EffectKind::Shadow, &settings)
    }

    pub fn set_raster(&mut self, raster: bool) -> Effect {
        let settings = EffectSettings {
            raster: Some(raster),
            ..EffectSettings::default()
        };
        self.replace_ambient(EffectKind::Raster, &settings)
    }

    fn replace_ambient(&mut self, kind: EffectKind, value: &EffectSettings) -> Effect {
        let kinds = smallvec![kind];
        let rollback = Rollback {
            values: self.ambient.snapshot(&kinds),
            kinds,
        };
        self.ambient.restore(value, &[kind]);
        Effect::with_rollback(EffectSettings::default(), rollback)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/context.rs"]
mod tests;
