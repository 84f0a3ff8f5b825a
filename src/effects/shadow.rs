use crate::assets::color::{Color, ColorSpec};
use crate::foundation::core::Vec2;
use crate::foundation::error::{FxError, FxResult};

const DEFAULT_BLUR: f64 = 10.0;
const DEFAULT_ALPHA: f64 = 0.75;

/// Shadow offset as given by a caller: one value for both axes, or an `(x, y)` pair.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Offset {
    Uniform(f64),
    Pair(f64, f64),
}

impl Offset {
    fn resolve(self) -> FxResult<Vec2> {
        let (x, y) = match self {
            Offset::Uniform(v) => (v, v),
            Offset::Pair(x, y) => (x, y),
        };
        if !x.is_finite() || !y.is_finite() {
            return Err(FxError::invalid_effect("shadow offset must be finite"));
        }
        Ok(Vec2::new(x, y))
    }
}

impl From<f64> for Offset {
    fn from(v: f64) -> Self {
        Offset::Uniform(v)
    }
}

impl From<(f64, f64)> for Offset {
    fn from((x, y): (f64, f64)) -> Self {
        Offset::Pair(x, y)
    }
}

impl From<Vec2> for Offset {
    fn from(v: Vec2) -> Self {
        Offset::Pair(v.x, v.y)
    }
}

/// Constructor arguments for [`Shadow`]. Every field is optional and defaulted.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShadowSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blur: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<Offset>,
}

impl ShadowSpec {
    pub fn color(mut self, spec: impl Into<ColorSpec>) -> Self {
        self.color = Some(spec.into());
        self
    }

    pub fn blur(mut self, blur: f64) -> Self {
        self.blur = Some(blur);
        self
    }

    pub fn offset(mut self, offset: impl Into<Offset>) -> Self {
        self.offset = Some(offset.into());
        self
    }
}

/// Drop shadow cast by the flattened contents of a layer.
///
/// The vertical offset is kept flipped internally: a public offset of `(3, 4)` is stored as
/// `(3, -4)` and reported back as `(3, 4)`. On a y-down surface a positive public `y` moves the
/// shadow down.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "ShadowSpec", into = "ShadowSpec")]
pub struct Shadow {
    color: Color,
    blur: f64,
    stored_offset: Vec2,
}

impl Shadow {
    /// Build a shadow, filling unspecified fields with defaults.
    ///
    /// The color defaults to black at 75% opacity. The blur defaults to 10, or 0 when the color
    /// is fully transparent. The offset defaults to half the blur on both axes.
    pub fn new(spec: ShadowSpec) -> FxResult<Self> {
        let color = match spec.color {
            Some(c) => c.resolve()?,
            None => Color::BLACK.with_alpha(DEFAULT_ALPHA),
        };
        let blur = match spec.blur {
            Some(b) => validate_blur(b)?,
            None if color.alpha() > 0.0 => DEFAULT_BLUR,
            None => 0.0,
        };
        let offset = spec.offset.unwrap_or(Offset::Uniform(blur / 2.0)).resolve()?;
        Ok(Self {
            color,
            blur,
            stored_offset: flip(offset),
        })
    }

    /// Copy with some fields replaced; unspecified fields keep this shadow's values.
    pub fn with(&self, spec: ShadowSpec) -> FxResult<Self> {
        let mut out = self.clone();
        if let Some(c) = spec.color {
            out.set_color(c)?;
        }
        if let Some(b) = spec.blur {
            out.set_blur(b)?;
        }
        if let Some(o) = spec.offset {
            out.set_offset(o)?;
        }
        Ok(out)
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, spec: impl Into<ColorSpec>) -> FxResult<()> {
        self.color = spec.into().resolve()?;
        Ok(())
    }

    pub fn blur(&self) -> f64 {
        self.blur
    }

    pub fn set_blur(&mut self, blur: f64) -> FxResult<()> {
        self.blur = validate_blur(blur)?;
        Ok(())
    }

    /// Public `(x, y)` offset.
    pub fn offset(&self) -> Vec2 {
        flip(self.stored_offset)
    }

    pub fn set_offset(&mut self, offset: impl Into<Offset>) -> FxResult<()> {
        self.stored_offset = flip(offset.into().resolve()?);
        Ok(())
    }

    /// Offset in the internal y-up representation.
    pub fn stored_offset(&self) -> Vec2 {
        self.stored_offset
    }

    /// Translation applied to the shadow in y-down device pixels.
    pub fn device_offset(&self) -> Vec2 {
        flip(self.stored_offset)
    }
}

impl Default for Shadow {
    fn default() -> Self {
        Self {
            color: Color::BLACK.with_alpha(DEFAULT_ALPHA),
            blur: DEFAULT_BLUR,
            stored_offset: flip(Vec2::new(DEFAULT_BLUR / 2.0, DEFAULT_BLUR / 2.0)),
        }
    }
}

impl TryFrom<ShadowSpec> for Shadow {
    type Error = FxError;

    fn try_from(spec: ShadowSpec) -> Result<Self, Self::Error> {
        Self::new(spec)
    }
}

impl From<Shadow> for ShadowSpec {
    fn from(s: Shadow) -> Self {
        let off = s.offset();
        ShadowSpec {
            color: Some(ColorSpec::Color(s.color)),
            blur: Some(s.blur),
            offset: Some(Offset::Pair(off.x, off.y)),
        }
    }
}

fn flip(v: Vec2) -> Vec2 {
    Vec2::new(v.x, -v.y)
}

fn validate_blur(blur: f64) -> FxResult<f64> {
    if !blur.is_finite() || blur < 0.0 {
        return Err(FxError::invalid_effect(format!(
            "shadow blur must be a finite, non-negative number (got {blur})"
        )));
    }
    Ok(blur)
}

#[cfg(test)]
#[path = "../../tests/unit/effects/shadow.rs"]
mod tests;
