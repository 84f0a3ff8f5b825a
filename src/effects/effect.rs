use std::ops::{Deref, DerefMut};

use smallvec::SmallVec;

use crate::effects::blend::BlendMode;
use crate::effects::shadow::{Shadow, ShadowSpec};
use crate::foundation::error::{FxError, FxResult, prefer_primary};
use crate::render::context::{CompositingContext, Grob};
use crate::render::surface::DrawingSurface;

/// The kinds of setting an [`Effect`] can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Blend,
    Alpha,
    Shadow,
    Raster,
}

impl EffectKind {
    pub const ALL: [EffectKind; 4] = [
        EffectKind::Blend,
        EffectKind::Alpha,
        EffectKind::Shadow,
        EffectKind::Raster,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EffectKind::Blend => "blend",
            EffectKind::Alpha => "alpha",
            EffectKind::Shadow => "shadow",
            EffectKind::Raster => "raster",
        }
    }
}

pub type KindSet = SmallVec<[EffectKind; 4]>;

/// Sparse set of validated effect values. `None` means "inherit".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EffectSettings {
    pub blend: Option<BlendMode>,
    pub alpha: Option<f64>,
    pub shadow: Option<Shadow>,
    pub raster: Option<bool>,
}

impl EffectSettings {
    pub fn is_empty(&self) -> bool {
        self.kinds().is_empty()
    }

    pub fn has(&self, kind: EffectKind) -> bool {
        match kind {
            EffectKind::Blend => self.blend.is_some(),
            EffectKind::Alpha => self.alpha.is_some(),
            EffectKind::Shadow => self.shadow.is_some(),
            EffectKind::Raster => self.raster.is_some(),
        }
    }

    /// Kinds holding a value, in canonical order.
    pub fn kinds(&self) -> KindSet {
        EffectKind::ALL
            .iter()
            .copied()
            .filter(|k| self.has(*k))
            .collect()
    }

    /// Copy of just the listed kinds; everything else is unset.
    pub fn snapshot(&self, kinds: &[EffectKind]) -> EffectSettings {
        let mut out = EffectSettings::default();
        out.restore(self, kinds);
        out
    }

    pub fn clear(&mut self, kinds: &[EffectKind]) {
        for kind in kinds {
            match kind {
                EffectKind::Blend => self.blend = None,
                EffectKind::Alpha => self.alpha = None,
                EffectKind::Shadow => self.shadow = None,
                EffectKind::Raster => self.raster = None,
            }
        }
    }

    /// Overwrite the listed kinds with the values in `from`, unset ones included.
    pub fn restore(&mut self, from: &EffectSettings, kinds: &[EffectKind]) {
        for kind in kinds {
            match kind {
                EffectKind::Blend => self.blend = from.blend,
                EffectKind::Alpha => self.alpha = from.alpha,
                EffectKind::Shadow => self.shadow = from.shadow.clone(),
                EffectKind::Raster => self.raster = from.raster,
            }
        }
    }

    /// Layers needed to realize these settings, outermost first.
    ///
    /// Blend and alpha share one transparency group, since both act on the flattened result of
    /// everything inside it. A shadow gets its own group nested inside that one so it is cast by
    /// the flattened contents exactly once. Rasterization is innermost, in a dedicated buffer.
    pub fn layer_plan(&self) -> SmallVec<[Layer; 3]> {
        let mut plan = SmallVec::new();
        if self.blend.is_some() || self.alpha.is_some() {
            plan.push(Layer::Transparency {
                blend: self.blend,
                alpha: self.alpha,
            });
        }
        if let Some(shadow) = &self.shadow {
            plan.push(Layer::Shadow(shadow.clone()));
        }
        if self.raster == Some(true) {
            plan.push(Layer::Raster);
        }
        plan
    }
}

/// One layer opened on the surface by an effect.
#[derive(Clone, Debug, PartialEq)]
pub enum Layer {
    Transparency {
        blend: Option<BlendMode>,
        alpha: Option<f64>,
    },
    Shadow(Shadow),
    Raster,
}

/// Unvalidated effect arguments, as a script or JSON document supplies them.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EffectSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow: Option<ShadowSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raster: Option<bool>,
}

impl EffectSpec {
    pub fn blend(mut self, name: impl Into<String>) -> Self {
        self.blend = Some(name.into());
        self
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }

    pub fn shadow(mut self, shadow: impl Into<ShadowSpec>) -> Self {
        self.shadow = Some(shadow.into());
        self
    }

    pub fn raster(mut self, raster: bool) -> Self {
        self.raster = Some(raster);
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Rollback {
    pub(crate) kinds: KindSet,
    pub(crate) values: EffectSettings,
}

/// A compositing frame: blend, alpha, shadow and raster settings that are realized as nested
/// layers around a block of drawing.
///
/// Use it scoped ([`Effect::enter`], [`Effect::scoped`]) to wrap everything drawn until the scope
/// ends, or one-shot by attaching drawables with [`Effect::append`] and drawing it as
/// [`Grob::Group`].
#[derive(Clone, Debug, Default)]
pub struct Effect {
    settings: EffectSettings,
    rollback: Option<Rollback>,
    grobs: Vec<Grob>,
}

impl Effect {
    /// Validate every supplied value. Nothing is built unless all of them are valid.
    pub fn new(spec: EffectSpec) -> FxResult<Self> {
        let settings = EffectSettings {
            blend: spec.blend.as_deref().map(BlendMode::parse).transpose()?,
            alpha: spec.alpha.map(validate_alpha).transpose()?,
            shadow: spec.shadow.map(Shadow::new).transpose()?,
            raster: spec.raster,
        };
        Ok(Self::from_settings(settings))
    }

    /// Wrap already validated settings.
    pub fn from_settings(settings: EffectSettings) -> Self {
        Self {
            settings,
            rollback: None,
            grobs: Vec::new(),
        }
    }

    pub(crate) fn with_rollback(settings: EffectSettings, rollback: Rollback) -> Self {
        Self {
            settings,
            rollback: Some(rollback),
            grobs: Vec::new(),
        }
    }

    pub fn settings(&self) -> &EffectSettings {
        &self.settings
    }

    /// Alpha, or `1.0` when unset.
    pub fn alpha(&self) -> f64 {
        self.settings.alpha.unwrap_or(1.0)
    }

    /// `None` unsets the kind.
    pub fn set_alpha(&mut self, alpha: Option<f64>) -> FxResult<()> {
        self.settings.alpha = alpha.map(validate_alpha).transpose()?;
        Ok(())
    }

    /// Blend mode, or `normal` when unset.
    pub fn blend(&self) -> BlendMode {
        self.settings.blend.unwrap_or_default()
    }

    pub fn set_blend(&mut self, name: Option<&str>) -> FxResult<()> {
        self.settings.blend = name.map(BlendMode::parse).transpose()?;
        Ok(())
    }

    pub fn set_blend_mode(&mut self, mode: Option<BlendMode>) {
        self.settings.blend = mode;
    }

    pub fn shadow(&self) -> Option<&Shadow> {
        self.settings.shadow.as_ref()
    }

    /// The shadow is copied in, so later changes to the caller's value do not leak into the
    /// effect.
    pub fn set_shadow(&mut self, shadow: Option<&Shadow>) {
        self.settings.shadow = shadow.cloned();
    }

    pub fn raster(&self) -> bool {
        self.settings.raster.unwrap_or(false)
    }

    pub fn set_raster(&mut self, raster: Option<bool>) {
        self.settings.raster = raster;
    }

    /// Independent effect with the same settings and no attached drawables.
    pub fn copy(&self) -> Self {
        Self::from_settings(self.settings.clone())
    }

    /// Attach a drawable for one-shot use.
    pub fn append(&mut self, grob: Grob) {
        self.grobs.push(grob);
    }

    pub fn contents(&self) -> &[Grob] {
        &self.grobs
    }

    pub fn layer_plan(&self) -> SmallVec<[Layer; 3]> {
        self.settings.layer_plan()
    }

    /// Open a scope on `ctx`.
    ///
    /// The ambient value of every kind this effect defines is snapshotted and then cleared for
    /// the duration of the scope, the effect is pushed as the active frame, and its layers are
    /// opened. Dropping the returned guard (or calling [`EffectScope::exit`]) undoes all of it in
    /// reverse order. If a layer fails to open, whatever was opened is closed again and the
    /// ambient state is left as it was.
    ///
    /// An effect returned by one of the ambient setters on [`CompositingContext`] carries the
    /// value that setter replaced; exiting its scope puts that value back.
    #[tracing::instrument(level = "debug", skip_all, fields(kinds = ?self.settings.kinds()))]
    pub fn enter<'a, S: DrawingSurface>(
        &mut self,
        ctx: &'a mut CompositingContext<S>,
    ) -> FxResult<EffectScope<'a, S>> {
        let kinds = self.settings.kinds();
        let before = ctx.ambient().snapshot(&kinds);
        let preloaded = self.rollback.take();
        let mut rollback = preloaded.clone().unwrap_or_default();
        for k in &kinds {
            if !rollback.kinds.contains(k) {
                rollback.kinds.push(*k);
                rollback.values.restore(&before, &[*k]);
            }
        }

        ctx.push_frame(self.settings.clone());
        ctx.ambient_mut().clear(&kinds);

        match open_layers(ctx.surface_mut(), &self.layer_plan()) {
            Ok(open) => Ok(EffectScope {
                ctx,
                open,
                rollback,
                closed: false,
            }),
            Err(e) => {
                ctx.pop_frame();
                ctx.ambient_mut().restore(&before, &kinds);
                self.rollback = preloaded;
                Err(e)
            }
        }
    }

    /// Run `body` inside a scope. The body's error is returned in preference to any cleanup
    /// error.
    pub fn scoped<S: DrawingSurface, R>(
        &mut self,
        ctx: &mut CompositingContext<S>,
        body: impl FnOnce(&mut CompositingContext<S>) -> FxResult<R>,
    ) -> FxResult<R> {
        let mut scope = self.enter(ctx)?;
        let out = body(&mut *scope);
        let cleanup = scope.exit();
        prefer_primary(out, cleanup)
    }

    /// Realize the layers around `body` without touching ambient state or the frame stack.
    pub fn applied<S: DrawingSurface, R>(
        &self,
        ctx: &mut CompositingContext<S>,
        body: impl FnOnce(&mut CompositingContext<S>) -> FxResult<R>,
    ) -> FxResult<R> {
        let plan = self.layer_plan();
        if plan.is_empty() {
            return body(ctx);
        }
        let open = open_layers(ctx.surface_mut(), &plan)?;
        let out = body(ctx);
        let cleanup = close_layers(ctx.surface_mut(), open);
        prefer_primary(out, cleanup)
    }
}

impl TryFrom<EffectSpec> for Effect {
    type Error = FxError;

    fn try_from(spec: EffectSpec) -> Result<Self, Self::Error> {
        Self::new(spec)
    }
}

/// An open effect scope. Derefs to the context so drawing can continue through it.
pub struct EffectScope<'a, S: DrawingSurface> {
    ctx: &'a mut CompositingContext<S>,
    open: OpenLayers,
    rollback: Rollback,
    closed: bool,
}

impl<S: DrawingSurface> EffectScope<'_, S> {
    /// Close the scope now and report any cleanup failure.
    pub fn exit(mut self) -> FxResult<()> {
        self.close()
    }

    fn close(&mut self) -> FxResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let res = close_layers(self.ctx.surface_mut(), std::mem::take(&mut self.open));
        self.ctx.pop_frame();
        self.ctx
            .ambient_mut()
            .restore(&self.rollback.values, &self.rollback.kinds);
        res
    }
}

impl<S: DrawingSurface> Drop for EffectScope<'_, S> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "effect scope cleanup failed");
        }
    }
}

impl<S: DrawingSurface> Deref for EffectScope<'_, S> {
    type Target = CompositingContext<S>;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl<S: DrawingSurface> DerefMut for EffectScope<'_, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OpenLayer {
    Group,
    Raster,
}

#[derive(Debug, Default)]
pub(crate) struct OpenLayers {
    state_pushed: bool,
    layers: SmallVec<[OpenLayer; 3]>,
}

/// Open `plan` on the surface inside a state bracket. On failure the layers opened so far are
/// closed before the error is returned.
pub(crate) fn open_layers<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    plan: &[Layer],
) -> FxResult<OpenLayers> {
    let mut open = OpenLayers::default();
    if plan.is_empty() {
        return Ok(open);
    }
    surface.push_state()?;
    open.state_pushed = true;

    for layer in plan {
        let res = match layer {
            Layer::Transparency { blend, alpha } => {
                if let Some(mode) = blend {
                    surface.set_blend_mode(*mode);
                }
                if let Some(a) = alpha {
                    surface.set_alpha(*a as f32);
                }
                surface.begin_transparency_group().map(|()| OpenLayer::Group)
            }
            Layer::Shadow(shadow) => {
                surface.apply_shadow(Some(shadow));
                surface.begin_transparency_group().map(|()| OpenLayer::Group)
            }
            Layer::Raster => surface.begin_raster().map(|()| OpenLayer::Raster),
        };
        match res {
            Ok(l) => {
                tracing::debug!(layer = ?l, depth = open.layers.len() + 1, "layer opened");
                open.layers.push(l);
            }
            Err(e) => {
                let cleanup = close_layers(surface, open);
                return prefer_primary(Err(e), cleanup);
            }
        }
    }
    Ok(open)
}

/// Close layers innermost first, then the state bracket. Every step runs even if an earlier one
/// fails; the first failure is returned.
pub(crate) fn close_layers<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    open: OpenLayers,
) -> FxResult<()> {
    let mut first: Option<FxError> = None;
    let mut note = |res: FxResult<()>| {
        if let Err(e) = res {
            if first.is_none() {
                first = Some(e);
            } else {
                tracing::warn!(error = %e, "additional failure while closing layers");
            }
        }
    };
    for l in open.layers.iter().rev() {
        tracing::debug!(layer = ?l, "closing layer");
        note(match l {
            OpenLayer::Group => surface.end_transparency_group(),
            OpenLayer::Raster => surface.end_raster(),
        });
    }
    if open.state_pushed {
        note(surface.pop_state());
    }
    first.map_or(Ok(()), Err)
}

fn validate_alpha(alpha: f64) -> FxResult<f64> {
    if alpha.is_finite() && (0.0..=1.0).contains(&alpha) {
        Ok(alpha)
    } else {
        Err(FxError::invalid_effect(format!(
            "alpha value must be a number between 0 and 1.0 (got {alpha})"
        )))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/effect.rs"]
mod tests;
