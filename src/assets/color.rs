use serde::{Deserialize, Serialize};

use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{FxError, FxResult};

/// Straight-alpha RGBA color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub const fn grey(level: f64, a: f64) -> Self {
        Self::rgba(level, level, level, a)
    }

    /// Parse any accepted color specification.
    pub fn parse(spec: impl Into<ColorSpec>) -> FxResult<Self> {
        spec.into().resolve()
    }

    /// Same color with a replaced alpha component.
    pub fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }

    pub fn alpha(self) -> f64 {
        self.a
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        fn to_u8(x: f64) -> u8 {
            (x.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        [to_u8(self.r), to_u8(self.g), to_u8(self.b), to_u8(self.a)]
    }

    pub fn to_rgba8_premul(self) -> Rgba8Premul {
        let [r, g, b, a] = self.to_rgba8();
        Rgba8Premul::from_straight_rgba(r, g, b, a)
    }

    fn validate(self) -> FxResult<Self> {
        let comps = [self.r, self.g, self.b, self.a];
        if comps.iter().any(|c| !c.is_finite()) {
            return Err(FxError::invalid_color("color components must be finite"));
        }
        Ok(Self::rgba(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
            self.a.clamp(0.0, 1.0),
        ))
    }
}

/// Anything the color collaborator knows how to turn into a [`Color`].
///
/// Deserializes from a string (`"#f80"`, `"#ff8800cc"`, `"steelblue"`), a grey level (`0.5`),
/// a channel array (`[r, g, b]` / `[r, g, b, a]`), or a `{ "spec": ..., "alpha": ... }` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorSpec {
    Color(Color),
    Text(String),
    Grey(f64),
    Channels(Vec<f64>),
    WithAlpha { spec: Box<ColorSpec>, alpha: f64 },
}

impl ColorSpec {
    pub fn resolve(&self) -> FxResult<Color> {
        match self {
            ColorSpec::Color(c) => c.validate(),
            ColorSpec::Text(s) => parse_text(s),
            ColorSpec::Grey(level) => Color::grey(*level, 1.0).validate(),
            ColorSpec::Channels(v) => match v.as_slice() {
                [r, g, b] => Color::rgba(*r, *g, *b, 1.0).validate(),
                [r, g, b, a] => Color::rgba(*r, *g, *b, *a).validate(),
                [level, a] => Color::grey(*level, *a).validate(),
                _ => Err(FxError::invalid_color(
                    "channel array must have len 2 ([grey,a]), 3 ([r,g,b]) or 4 ([r,g,b,a])",
                )),
            },
            ColorSpec::WithAlpha { spec, alpha } => {
                let base = spec.resolve()?;
                base.with_alpha(*alpha).validate()
            }
        }
    }
}

impl From<Color> for ColorSpec {
    fn from(c: Color) -> Self {
        ColorSpec::Color(c)
    }
}

impl From<&str> for ColorSpec {
    fn from(s: &str) -> Self {
        ColorSpec::Text(s.to_owned())
    }
}

impl From<String> for ColorSpec {
    fn from(s: String) -> Self {
        ColorSpec::Text(s)
    }
}

impl From<f64> for ColorSpec {
    fn from(level: f64) -> Self {
        ColorSpec::Grey(level)
    }
}

impl From<[f64; 3]> for ColorSpec {
    fn from(v: [f64; 3]) -> Self {
        ColorSpec::Channels(v.to_vec())
    }
}

impl From<[f64; 4]> for ColorSpec {
    fn from(v: [f64; 4]) -> Self {
        ColorSpec::Channels(v.to_vec())
    }
}

impl<S: Into<ColorSpec>> From<(S, f64)> for ColorSpec {
    fn from((spec, alpha): (S, f64)) -> Self {
        ColorSpec::WithAlpha {
            spec: Box::new(spec.into()),
            alpha,
        }
    }
}

fn parse_text(s: &str) -> FxResult<Color> {
    let t = s.trim();
    if t.starts_with('#') {
        return parse_hex(t);
    }
    let key = t.to_ascii_lowercase().replace([' ', '_', '-'], "");
    named_color(&key)
        .ok_or_else(|| FxError::invalid_color(format!("unrecognized color \"{s}\"")))
}

fn parse_hex(s: &str) -> FxResult<Color> {
    let digits = s.strip_prefix('#').unwrap_or(s);

    fn nibble(c: char) -> FxResult<u8> {
        c.to_digit(16)
            .map(|d| d as u8)
            .ok_or_else(|| FxError::invalid_color(format!("invalid hex digit '{c}'")))
    }

    let chars: Vec<char> = digits.chars().collect();
    let bytes: Vec<u8> = match chars.len() {
        3 | 4 => chars
            .iter()
            .map(|&c| nibble(c).map(|n| n * 17))
            .collect::<FxResult<_>>()?,
        6 | 8 => chars
            .chunks_exact(2)
            .map(|pair| -> FxResult<u8> { Ok(nibble(pair[0])? * 16 + nibble(pair[1])?) })
            .collect::<FxResult<_>>()?,
        _ => {
            return Err(FxError::invalid_color(
                "hex color must be #RGB, #RGBA, #RRGGBB or #RRGGBBAA (case-insensitive)",
            ));
        }
    };

    let unit = |b: u8| f64::from(b) / 255.0;
    let a = bytes.get(3).copied().unwrap_or(255);
    Ok(Color::rgba(unit(bytes[0]), unit(bytes[1]), unit(bytes[2]), unit(a)))
}

fn named_color(key: &str) -> Option<Color> {
    let rgb = |r: u8, g: u8, b: u8| {
        Color::rgba(
            f64::from(r) / 255.0,
            f64::from(g) / 255.0,
            f64::from(b) / 255.0,
            1.0,
        )
    };
    let c = match key {
        "transparent" | "clear" => Color::TRANSPARENT,
        "black" => Color::BLACK,
        "white" => Color::WHITE,
        "red" => rgb(255, 0, 0),
        "green" => rgb(0, 128, 0),
        "lime" => rgb(0, 255, 0),
        "blue" => rgb(0, 0, 255),
        "yellow" => rgb(255, 255, 0),
        "cyan" | "aqua" => rgb(0, 255, 255),
        "magenta" | "fuchsia" => rgb(255, 0, 255),
        "orange" => rgb(255, 165, 0),
        "purple" => rgb(128, 0, 128),
        "pink" => rgb(255, 192, 203),
        "brown" => rgb(165, 42, 42),
        "gray" | "grey" => rgb(128, 128, 128),
        "lightgray" | "lightgrey" => rgb(211, 211, 211),
        "darkgray" | "darkgrey" => rgb(169, 169, 169),
        "navy" => rgb(0, 0, 128),
        "teal" => rgb(0, 128, 128),
        "olive" => rgb(128, 128, 0),
        "maroon" => rgb(128, 0, 0),
        "silver" => rgb(192, 192, 192),
        "gold" => rgb(255, 215, 0),
        "steelblue" => rgb(70, 130, 180),
        "tomato" => rgb(255, 99, 71),
        "coral" => rgb(255, 127, 80),
        "salmon" => rgb(250, 128, 114),
        "indigo" => rgb(75, 0, 130),
        "violet" => rgb(238, 130, 238),
        _ => return None,
    };
    Some(c)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/color.rs"]
mod tests;
