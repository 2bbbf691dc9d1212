//! Per-request options and the schemas engines declare for them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DepthmeshError, Result};

/// A single option value as sent by the UI or a batch job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl OptionValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric view; integers widen to floats.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A flat, ordered mapping of option names to values.
///
/// Unknown keys are carried along untouched; each consumer reads only the
/// keys it understands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionSet {
    values: BTreeMap<String, OptionValue>,
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<OptionValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(OptionValue::as_bool)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(OptionValue::as_f64)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(OptionValue::as_str)
    }

    /// `render_mode`: only an explicit `true` requests the point-cloud shortcut.
    pub fn render_mode(&self) -> bool {
        self.get_bool("render_mode") == Some(true)
    }

    /// `quality_filters`: density pruning is on unless explicitly disabled.
    pub fn quality_filters(&self) -> bool {
        self.get_bool("quality_filters").unwrap_or(true)
    }

    /// `depth_scale`, if present and numeric.
    #[allow(clippy::cast_possible_truncation)]
    pub fn depth_scale(&self) -> Option<f32> {
        self.get_f64("depth_scale").map(|v| v as f32)
    }

    /// Keeps only the options named by `schema`.
    #[must_use]
    pub fn restricted_to(&self, schema: &OptionSchema) -> Self {
        Self {
            values: self
                .values
                .iter()
                .filter(|(name, _)| schema.contains(name))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Fills in schema defaults for every option not already set.
    #[must_use]
    pub fn with_defaults(mut self, schema: &OptionSchema) -> Self {
        for spec in schema.iter() {
            self.values
                .entry(spec.name.clone())
                .or_insert_with(|| spec.kind.default_value());
        }
        self
    }
}

impl<K: Into<String>, V: Into<OptionValue>> FromIterator<(K, V)> for OptionSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// The type, default, and bounds of a declared option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OptionKind {
    Bool {
        default: bool,
    },
    Int {
        default: i64,
        min: i64,
        max: i64,
    },
    Float {
        default: f64,
        min: f64,
        max: f64,
        step: f64,
    },
    Choice {
        default: String,
        choices: Vec<String>,
    },
}

impl OptionKind {
    pub fn default_value(&self) -> OptionValue {
        match self {
            Self::Bool { default } => OptionValue::Bool(*default),
            Self::Int { default, .. } => OptionValue::Int(*default),
            Self::Float { default, .. } => OptionValue::Float(*default),
            Self::Choice { default, .. } => OptionValue::Text(default.clone()),
        }
    }

    fn check(&self, value: &OptionValue) -> std::result::Result<(), String> {
        match (self, value) {
            (Self::Bool { .. }, OptionValue::Bool(_)) => Ok(()),
            (Self::Int { min, max, .. }, OptionValue::Int(v)) => {
                if (*min..=*max).contains(v) {
                    Ok(())
                } else {
                    Err(format!("{v} outside {min}..={max}"))
                }
            }
            (Self::Float { min, max, .. }, v) => match v.as_f64() {
                Some(x) if (*min..=*max).contains(&x) => Ok(()),
                Some(x) => Err(format!("{x} outside {min}..={max}")),
                None => Err(format!("expected a number, got '{v}'")),
            },
            (Self::Choice { choices, .. }, OptionValue::Text(s)) => {
                if choices.iter().any(|c| c == s) {
                    Ok(())
                } else {
                    Err(format!("'{s}' is not one of {choices:?}"))
                }
            }
            (kind, v) => Err(format!("'{v}' does not match {kind:?}")),
        }
    }
}

/// A declared option: name, human label, and kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSpec {
    pub name: String,
    pub label: String,
    pub kind: OptionKind,
}

impl OptionSpec {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: OptionKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
        }
    }
}

/// The set of options a component recognises.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionSchema {
    specs: Vec<OptionSpec>,
}

impl OptionSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a spec, replacing any earlier spec with the same name.
    #[must_use]
    pub fn with(mut self, spec: OptionSpec) -> Self {
        self.specs.retain(|s| s.name != spec.name);
        self.specs.push(spec);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.specs.iter().any(|s| s.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&OptionSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|s| s.name.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OptionSpec> {
        self.specs.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// An option set holding every default.
    pub fn defaults(&self) -> OptionSet {
        OptionSet::new().with_defaults(self)
    }

    /// Checks every declared option present in `options`; undeclared keys are ignored.
    pub fn validate(&self, options: &OptionSet) -> Result<()> {
        for spec in &self.specs {
            if let Some(value) = options.get(&spec.name) {
                spec.kind
                    .check(value)
                    .map_err(|reason| DepthmeshError::InvalidOption {
                        name: spec.name.clone(),
                        reason,
                    })?;
            }
        }
        Ok(())
    }

    /// Combines two schemas; specs in `other` win on name clashes.
    #[must_use]
    pub fn merged(&self, other: &OptionSchema) -> Self {
        other
            .specs
            .iter()
            .cloned()
            .fold(self.clone(), OptionSchema::with)
    }
}

/// Options shared by every engine: preprocessing and depth scaling.
pub fn pipeline_schema() -> OptionSchema {
    OptionSchema::new()
        .with(OptionSpec::new(
            "bg_removal",
            "Remove background",
            OptionKind::Bool { default: true },
        ))
        .with(OptionSpec::new(
            "resize_to",
            "Downscale image to (max)",
            OptionKind::Choice {
                default: "Original".to_string(),
                choices: ["Original", "1024", "768", "512"]
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
            },
        ))
        .with(OptionSpec::new(
            "depth_scale",
            "Depth scale",
            OptionKind::Float {
                default: 1.0,
                min: 0.1,
                max: 50.0,
                step: 0.5,
            },
        ))
}
