use std::fmt;
use std::path::Path;

use crate::assets::color::{Color, ColorSpec};
use crate::foundation::error::{FxError, FxResult};

const DEFAULT_COLOR: &str = "#cccccc";
const LABEL_PUNCTUATION: &str = "!'#%&()*+,-./:;<=>?@[]^_{|}~";

/// Control type of a dashboard variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    Number,
    Text,
    Boolean,
    Button,
    Color,
    Select,
    File,
}

impl VariableType {
    pub fn name(self) -> &'static str {
        match self {
            VariableType::Number => "number",
            VariableType::Text => "text",
            VariableType::Boolean => "boolean",
            VariableType::Button => "button",
            VariableType::Color => "color",
            VariableType::Select => "select",
            VariableType::File => "file",
        }
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value read from or written to a variable.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl VariableValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            VariableValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            VariableValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            VariableValue::Text(s) => Some(s),
            _ => None,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            VariableValue::Bool(_) => "boolean",
            VariableValue::Number(_) => "number",
            VariableValue::Text(_) => "string",
        }
    }
}

impl From<bool> for VariableValue {
    fn from(b: bool) -> Self {
        VariableValue::Bool(b)
    }
}

impl From<f64> for VariableValue {
    fn from(v: f64) -> Self {
        VariableValue::Number(v)
    }
}

impl From<&str> for VariableValue {
    fn from(s: &str) -> Self {
        VariableValue::Text(s.to_owned())
    }
}

impl From<String> for VariableValue {
    fn from(s: String) -> Self {
        VariableValue::Text(s)
    }
}

/// Kind-specific constraints together with the current value.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VariableKind {
    Number {
        min: f64,
        max: f64,
        step: Option<f64>,
        value: f64,
    },
    Text {
        value: String,
    },
    Boolean {
        value: bool,
    },
    /// `value` is the button's caption; `color` tints it.
    Button {
        value: String,
        color: Option<Color>,
    },
    /// `value` keeps the color spec as written, so the dashboard can show it back.
    Color {
        value: String,
    },
    Select {
        options: Vec<String>,
        value: String,
    },
    /// Empty `value` means no file chosen. `types` are lowercase extensions without the dot.
    File {
        types: Vec<String>,
        value: String,
    },
}

impl VariableKind {
    pub fn var_type(&self) -> VariableType {
        match self {
            VariableKind::Number { .. } => VariableType::Number,
            VariableKind::Text { .. } => VariableType::Text,
            VariableKind::Boolean { .. } => VariableType::Boolean,
            VariableKind::Button { .. } => VariableType::Button,
            VariableKind::Color { .. } => VariableType::Color,
            VariableKind::Select { .. } => VariableType::Select,
            VariableKind::File { .. } => VariableType::File,
        }
    }
}

/// A script parameter exposed on the dashboard.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Variable {
    name: String,
    label: String,
    kind: VariableKind,
}

impl Variable {
    fn build(name: &str, kind: VariableKind) -> FxResult<Self> {
        validate_name(name)?;
        Ok(Self {
            name: name.to_owned(),
            label: normalize_label(name),
            kind,
        })
    }

    /// Numeric slider. Reversed bounds are swapped; a step must divide the range evenly and the
    /// value (default `min`) is snapped to it before the range check.
    pub fn number(
        name: &str,
        min: f64,
        max: f64,
        step: Option<f64>,
        value: Option<f64>,
    ) -> FxResult<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(FxError::invalid_variable(format!(
                "bounds of \"{name}\" must be finite numbers"
            )));
        }
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        let step = match step {
            Some(s) if !s.is_finite() || s < 0.0 => {
                return Err(FxError::invalid_variable(format!(
                    "step of \"{name}\" must be a positive number (got {s})"
                )));
            }
            Some(s) if s > 0.0 => Some(s),
            _ => None,
        };
        if let Some(s) = step {
            let q = (max - min) / s;
            if (q - q.round()).abs() > 1e-9 {
                return Err(FxError::invalid_variable(format!(
                    "the step size {s} doesn't fit evenly into the range {min} to {max}"
                )));
            }
        }
        let value = checked_number(value.unwrap_or(min), min, max, step)?;
        Self::build(
            name,
            VariableKind::Number {
                min,
                max,
                step,
                value,
            },
        )
    }

    pub fn text(name: &str, value: impl Into<String>) -> FxResult<Self> {
        Self::build(
            name,
            VariableKind::Text {
                value: value.into(),
            },
        )
    }

    pub fn boolean(name: &str, value: bool) -> FxResult<Self> {
        Self::build(name, VariableKind::Boolean { value })
    }

    /// Push button captioned `caption` (default: the variable name).
    pub fn button(name: &str, caption: Option<&str>, color: Option<ColorSpec>) -> FxResult<Self> {
        let color = color.map(|c| c.resolve()).transpose()?;
        Self::build(
            name,
            VariableKind::Button {
                value: caption.unwrap_or(name).to_owned(),
                color,
            },
        )
    }

    /// Color well. The value must be a parsable color; it defaults to light grey.
    pub fn color(name: &str, value: Option<&str>) -> FxResult<Self> {
        let value = value.unwrap_or(DEFAULT_COLOR);
        checked_color(name, value)?;
        Self::build(
            name,
            VariableKind::Color {
                value: value.to_owned(),
            },
        )
    }

    /// Menu of options. The value defaults to the first option and must be one of them.
    pub fn select(name: &str, options: Vec<String>, value: Option<&str>) -> FxResult<Self> {
        let Some(first) = options.first() else {
            return Err(FxError::invalid_variable(format!(
                "select variable \"{name}\" requires at least one option"
            )));
        };
        let value = value.unwrap_or(first).to_owned();
        checked_option(&options, &value)?;
        Self::build(name, VariableKind::Select { options, value })
    }

    /// File picker restricted to `types` (any extension when empty). A non-empty default path
    /// must name an existing file with an allowed extension.
    pub fn file(name: &str, value: Option<&str>, types: &[&str]) -> FxResult<Self> {
        let types: Vec<String> = types.iter().map(|t| normalize_extension(t)).collect();
        let value = value.unwrap_or_default();
        checked_file(value, &types)?;
        Self::build(
            name,
            VariableKind::File {
                types,
                value: value.to_owned(),
            },
        )
    }

    /// Replace the label. A trailing `:` is added unless the label ends in punctuation.
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = normalize_label(label);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> &VariableKind {
        &self.kind
    }

    pub fn var_type(&self) -> VariableType {
        self.kind.var_type()
    }

    pub fn value(&self) -> VariableValue {
        match &self.kind {
            VariableKind::Number { value, .. } => VariableValue::Number(*value),
            VariableKind::Boolean { value } => VariableValue::Bool(*value),
            VariableKind::Text { value }
            | VariableKind::Button { value, .. }
            | VariableKind::Color { value }
            | VariableKind::Select { value, .. }
            | VariableKind::File { value, .. } => VariableValue::Text(value.clone()),
        }
    }

    /// Store a new value after checking it against this variable's constraints. Numbers are
    /// snapped to the step first.
    pub fn set_value(&mut self, new: impl Into<VariableValue>) -> FxResult<()> {
        let new = new.into();
        let mismatch = |want: &str| {
            FxError::invalid_variable(format!(
                "variable \"{}\" expects a {want}, got a {}",
                self.name,
                new.describe()
            ))
        };
        match (&mut self.kind, &new) {
            (
                VariableKind::Number {
                    min,
                    max,
                    step,
                    value,
                },
                VariableValue::Number(v),
            ) => *value = checked_number(*v, *min, *max, *step)?,
            (VariableKind::Boolean { value }, VariableValue::Bool(b)) => *value = *b,
            (
                VariableKind::Text { value } | VariableKind::Button { value, .. },
                VariableValue::Text(s),
            ) => value.clone_from(s),
            (VariableKind::Color { value }, VariableValue::Text(s)) => {
                checked_color(&self.name, s)?;
                value.clone_from(s);
            }
            (VariableKind::Select { options, value }, VariableValue::Text(s)) => {
                checked_option(options, s)?;
                value.clone_from(s);
            }
            (VariableKind::File { types, value }, VariableValue::Text(s)) => {
                checked_file(s, types)?;
                value.clone_from(s);
            }
            (VariableKind::Number { .. }, _) => return Err(mismatch("number")),
            (VariableKind::Boolean { .. }, _) => return Err(mismatch("boolean")),
            _ => return Err(mismatch("string")),
        }
        Ok(())
    }

    /// Carry a previous definition's value across a reload.
    ///
    /// Nothing happens unless both variables have the same type. Numbers are clamped into the
    /// new range and moved to the nearest step inside it. Select and file values carry over only
    /// when the new options or types still accept them; other values are copied as they are.
    pub fn inherit(&mut self, old: &Variable) {
        if self.var_type() != old.var_type() {
            return;
        }
        match (&mut self.kind, &old.kind) {
            (
                VariableKind::Number {
                    min,
                    max,
                    step,
                    value,
                },
                VariableKind::Number { value: prev, .. },
            ) => {
                let clamped = prev.clamp(*min, *max);
                *value = step.map_or(clamped, |s| snap_within(clamped, s, *min, *max));
            }
            (VariableKind::Select { options, value }, VariableKind::Select { value: prev, .. }) => {
                if checked_option(options, prev).is_ok() {
                    value.clone_from(prev);
                }
            }
            (VariableKind::File { types, value }, VariableKind::File { value: prev, .. }) => {
                if checked_file(prev, types).is_ok() {
                    value.clone_from(prev);
                }
            }
            (VariableKind::Text { value }, VariableKind::Text { value: prev })
            | (VariableKind::Color { value }, VariableKind::Color { value: prev })
            | (VariableKind::Button { value, .. }, VariableKind::Button { value: prev, .. }) => {
                value.clone_from(prev);
            }
            (VariableKind::Boolean { value }, VariableKind::Boolean { value: prev }) => {
                *value = *prev;
            }
            _ => {}
        }
    }
}

/// Variable description as hosts send it over the wire.
///
/// ```json
/// { "name": "speed", "type": "number", "min": 0, "max": 10, "step": 2, "value": 4 }
/// ```
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariableDef {
    pub name: String,
    #[serde(rename = "type")]
    pub var_type: Option<VariableType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<VariableValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorSpec>,
}

impl TryFrom<VariableDef> for Variable {
    type Error = FxError;

    fn try_from(def: VariableDef) -> Result<Self, Self::Error> {
        let name = def.name.as_str();
        let Some(var_type) = def.var_type else {
            return Err(FxError::invalid_variable(format!(
                "variable \"{name}\" is missing a type"
            )));
        };
        let text = |v: &Option<VariableValue>| -> FxResult<Option<String>> {
            match v {
                None => Ok(None),
                Some(VariableValue::Text(s)) => Ok(Some(s.clone())),
                Some(other) => Err(FxError::invalid_variable(format!(
                    "{var_type} variable \"{name}\" expects a string value, got a {}",
                    other.describe()
                ))),
            }
        };
        let var = match var_type {
            VariableType::Number => {
                let (Some(min), Some(max)) = (def.min, def.max) else {
                    return Err(FxError::invalid_variable(format!(
                        "number variable \"{name}\" requires min and max values"
                    )));
                };
                let value = match &def.value {
                    None => None,
                    Some(VariableValue::Number(v)) => Some(*v),
                    Some(other) => {
                        return Err(FxError::invalid_variable(format!(
                            "number variable \"{name}\" expects a numeric value, got a {}",
                            other.describe()
                        )));
                    }
                };
                Variable::number(name, min, max, def.step, value)?
            }
            VariableType::Text => Variable::text(name, text(&def.value)?.unwrap_or_default())?,
            VariableType::Boolean => {
                let value = match &def.value {
                    None => false,
                    Some(VariableValue::Bool(b)) => *b,
                    Some(other) => {
                        return Err(FxError::invalid_variable(format!(
                            "boolean variable \"{name}\" expects true or false, got a {}",
                            other.describe()
                        )));
                    }
                };
                Variable::boolean(name, value)?
            }
            VariableType::Button => {
                Variable::button(name, text(&def.value)?.as_deref(), def.color.clone())?
            }
            VariableType::Color => Variable::color(name, text(&def.value)?.as_deref())?,
            VariableType::Select => Variable::select(
                name,
                def.options.clone().unwrap_or_default(),
                text(&def.value)?.as_deref(),
            )?,
            VariableType::File => {
                let types: Vec<&str> = def.types.iter().flatten().map(String::as_str).collect();
                Variable::file(name, text(&def.value)?.as_deref(), &types)?
            }
        };
        Ok(match &def.label {
            Some(label) => var.with_label(label),
            None => var,
        })
    }
}

fn validate_name(name: &str) -> FxResult<()> {
    let mut chars = name.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if head_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(FxError::invalid_variable(format!(
            "not a legal variable name: \"{name}\""
        )))
    }
}

fn normalize_label(label: &str) -> String {
    match label.chars().last() {
        Some(c) if !LABEL_PUNCTUATION.contains(c) => format!("{label}:"),
        _ => label.to_owned(),
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim_start_matches('.').to_lowercase()
}

fn snap(value: f64, step: f64) -> f64 {
    step * ((value + step / 2.0) / step).floor()
}

/// [`snap`], stepping back inside `[min, max]` when the nearest grid point falls outside it.
fn snap_within(value: f64, step: f64, min: f64, max: f64) -> f64 {
    let snapped = snap(value, step);
    let stepped = if snapped > max {
        snapped - step
    } else if snapped < min {
        snapped + step
    } else {
        snapped
    };
    stepped.clamp(min, max)
}

fn checked_number(value: f64, min: f64, max: f64, step: Option<f64>) -> FxResult<f64> {
    if !value.is_finite() {
        return Err(FxError::invalid_variable("number value must be finite"));
    }
    let value = step.map_or(value, |s| snap(value, s));
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(FxError::invalid_variable(format!(
            "the value {value} doesn't fall within the range {min} to {max}"
        )))
    }
}

fn checked_color(name: &str, spec: &str) -> FxResult<()> {
    Color::parse(spec).map(|_| ()).map_err(|_| {
        FxError::invalid_variable(format!(
            "invalid color specification for variable \"{name}\": \"{spec}\""
        ))
    })
}

fn checked_option(options: &[String], value: &str) -> FxResult<()> {
    if options.iter().any(|o| o == value) {
        Ok(())
    } else {
        Err(FxError::invalid_variable(format!(
            "value \"{value}\" not found in options list"
        )))
    }
}

fn checked_file(path: &str, types: &[String]) -> FxResult<()> {
    if path.is_empty() {
        return Ok(());
    }
    let p = Path::new(path);
    if !p.exists() {
        return Err(FxError::invalid_variable(format!(
            "file not found: \"{path}\""
        )));
    }
    if !p.is_file() {
        return Err(FxError::invalid_variable(format!(
            "path is not a file: \"{path}\""
        )));
    }
    if types.is_empty() {
        return Ok(());
    }
    let ext = p
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if ext.is_empty() {
        return Err(FxError::invalid_variable(format!(
            "file has no extension: \"{path}\""
        )));
    }
    if types.contains(&ext) {
        Ok(())
    } else {
        let allowed: Vec<String> = types.iter().map(|t| format!(".{t}")).collect();
        Err(FxError::invalid_variable(format!(
            "file type \".{ext}\" not allowed, must be one of: {}",
            allowed.join(", ")
        )))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/dashboard/variable.rs"]
mod tests;
