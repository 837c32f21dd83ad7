use serde::{de, Deserialize, Deserializer};
use serde_json::Value;
use utoipa::ToSchema;

pub const DEFAULT_DPI: i64 = 300;

/// Request body for equation rendering
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RenderRequest {
    /// LaTeX math expression, without surrounding delimiters
    #[serde(default)]
    pub tex: String,

    /// Typeset as display math (`\[...\]`) instead of inline math (`\(...\)`).
    /// Any JSON value is accepted and read by truthiness.
    #[serde(default, deserialize_with = "truthy")]
    pub display: bool,

    /// Output resolution in dots per inch. Numeric strings and floats are
    /// accepted; floats are truncated, null means the default.
    #[serde(default = "default_dpi", deserialize_with = "lenient_int")]
    pub dpi: i64,
}

fn default_dpi() -> i64 {
    DEFAULT_DPI
}

/// Empty strings, arrays and objects, zero, false and null are false.
fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    })
}

fn lenient_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(DEFAULT_DPI),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Ok(i),
            (None, Some(f)) if f.is_finite() && f.abs() < i64::MAX as f64 => Ok(f.trunc() as i64),
            _ => Err(de::Error::custom(format!("dpi out of integer range: {n}"))),
        },
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| de::Error::custom(format!("invalid dpi: {s:?}"))),
        other => Err(de::Error::custom(format!("invalid dpi: {other}"))),
    }
}

impl RenderRequest {
    pub fn new(tex: impl Into<String>) -> Self {
        Self {
            tex: tex.into(),
            display: false,
            dpi: DEFAULT_DPI,
        }
    }

    pub fn mode(&self) -> MathMode {
        MathMode::from_display_flag(self.display)
    }
}

/// Math environment the expression is wrapped in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathMode {
    Inline,
    Display,
}

impl MathMode {
    pub fn from_display_flag(display: bool) -> Self {
        if display {
            MathMode::Display
        } else {
            MathMode::Inline
        }
    }

    /// Opening and closing delimiter pair
    pub fn delimiters(self) -> (&'static str, &'static str) {
        match self {
            MathMode::Inline => ("\\(", "\\)"),
            MathMode::Display => ("\\[", "\\]"),
        }
    }
}
