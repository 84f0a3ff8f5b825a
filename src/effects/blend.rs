use std::fmt;
use std::str::FromStr;

use crate::foundation::error::{FxError, FxResult};

/// How a layer combines with what is already on the surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BlendMode {
    #[default]
    Normal,
    Clear,
    Copy,

    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    SoftLight,
    HardLight,
    Difference,
    Exclusion,

    Hue,
    Saturation,
    Color,
    Luminosity,

    SourceIn,
    SourceOut,
    SourceAtop,
    DestinationOver,
    DestinationIn,
    DestinationOut,
    DestinationAtop,
    Xor,
    PlusDarker,
    PlusLighter,
}

/// Grouping used when listing modes to a user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlendCategory {
    Basic,
    Standard,
    Color,
    Advanced,
}

impl BlendCategory {
    pub const ALL: [BlendCategory; 4] = [
        BlendCategory::Basic,
        BlendCategory::Standard,
        BlendCategory::Color,
        BlendCategory::Advanced,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BlendCategory::Basic => "Basic",
            BlendCategory::Standard => "Standard",
            BlendCategory::Color => "Color",
            BlendCategory::Advanced => "Advanced",
        }
    }
}

impl BlendMode {
    pub const ALL: [BlendMode; 28] = [
        BlendMode::Normal,
        BlendMode::Clear,
        BlendMode::Copy,
        BlendMode::Multiply,
        BlendMode::Screen,
        BlendMode::Overlay,
        BlendMode::Darken,
        BlendMode::Lighten,
        BlendMode::ColorDodge,
        BlendMode::ColorBurn,
        BlendMode::SoftLight,
        BlendMode::HardLight,
        BlendMode::Difference,
        BlendMode::Exclusion,
        BlendMode::Hue,
        BlendMode::Saturation,
        BlendMode::Color,
        BlendMode::Luminosity,
        BlendMode::SourceIn,
        BlendMode::SourceOut,
        BlendMode::SourceAtop,
        BlendMode::DestinationOver,
        BlendMode::DestinationIn,
        BlendMode::DestinationOut,
        BlendMode::DestinationAtop,
        BlendMode::Xor,
        BlendMode::PlusDarker,
        BlendMode::PlusLighter,
    ];

    /// Canonical (normalized) name.
    pub fn name(self) -> &'static str {
        match self {
            BlendMode::Normal => "normal",
            BlendMode::Clear => "clear",
            BlendMode::Copy => "copy",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
            BlendMode::Overlay => "overlay",
            BlendMode::Darken => "darken",
            BlendMode::Lighten => "lighten",
            BlendMode::ColorDodge => "colordodge",
            BlendMode::ColorBurn => "colorburn",
            BlendMode::SoftLight => "softlight",
            BlendMode::HardLight => "hardlight",
            BlendMode::Difference => "difference",
            BlendMode::Exclusion => "exclusion",
            BlendMode::Hue => "hue",
            BlendMode::Saturation => "saturation",
            BlendMode::Color => "color",
            BlendMode::Luminosity => "luminosity",
            BlendMode::SourceIn => "sourcein",
            BlendMode::SourceOut => "sourceout",
            BlendMode::SourceAtop => "sourceatop",
            BlendMode::DestinationOver => "destinationover",
            BlendMode::DestinationIn => "destinationin",
            BlendMode::DestinationOut => "destinationout",
            BlendMode::DestinationAtop => "destinationatop",
            BlendMode::Xor => "xor",
            BlendMode::PlusDarker => "plusdarker",
            BlendMode::PlusLighter => "pluslighter",
        }
    }

    pub fn category(self) -> BlendCategory {
        use BlendMode::*;
        match self {
            Normal | Clear | Copy => BlendCategory::Basic,
            Multiply | Screen | Overlay | Darken | Lighten | ColorDodge | ColorBurn | SoftLight
            | HardLight | Difference | Exclusion => BlendCategory::Standard,
            Hue | Saturation | Color | Luminosity => BlendCategory::Color,
            SourceIn | SourceOut | SourceAtop | DestinationOver | DestinationIn
            | DestinationOut | DestinationAtop | Xor | PlusDarker | PlusLighter => {
                BlendCategory::Advanced
            }
        }
    }

    /// Resolve a user-supplied name. Case, spaces, `-` and `_` are ignored.
    pub fn parse(name: &str) -> FxResult<Self> {
        let key = normalize_name(name);
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.name() == key)
            .ok_or_else(|| {
                FxError::invalid_effect(format!(
                    "\"{name}\" is not a recognized blend mode.\nUse one of:\n{}",
                    Self::help()
                ))
            })
    }

    /// Human-readable list of valid names, grouped by category.
    pub fn help() -> String {
        let mut out = String::from("Available blend modes:");
        for cat in BlendCategory::ALL {
            let names: Vec<&str> = Self::ALL
                .iter()
                .filter(|m| m.category() == cat)
                .map(|m| m.name())
                .collect();
            out.push_str(&format!("\n    {}: {}", cat.label(), names.join(", ")));
        }
        out
    }
}

fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BlendMode {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for BlendMode {
    type Error = FxError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<BlendMode> for String {
    fn from(m: BlendMode) -> Self {
        m.name().to_owned()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/blend.rs"]
mod tests;
