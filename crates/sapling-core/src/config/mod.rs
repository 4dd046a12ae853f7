use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// Keys a settings layer may carry, spelled as they appear in config files.
pub const TREE_KEYS: [&str; 7] = [
    "fontSize",
    "fontFamily",
    "triangles",
    "nodeColor",
    "autoSubscript",
    "alignment",
    "spacing",
];

/// One layer of untyped tree settings: a config file, or the flags given on the command line.
///
/// Layers stack with [`SaplingConfig::layer`] (defaults < config file < flags); a key set by a
/// later layer replaces the earlier value. Unknown keys are refused when the layer is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaplingConfig {
    values: Map<String, Value>,
}

impl SaplingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(values) = value else {
            return Err(Error::InvalidConfig {
                message: "config must be a JSON object".to_string(),
            });
        };
        if let Some(key) = values.keys().find(|k| !is_tree_key(k)) {
            return Err(unknown_key(key));
        }
        Ok(Self { values })
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(text)?)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        if !is_tree_key(key) {
            return Err(unknown_key(key));
        }
        self.values.insert(key.to_string(), value.into());
        Ok(())
    }

    /// Stacks `over` on top of `self`.
    pub fn layer(&mut self, over: &SaplingConfig) {
        for (key, value) in &over.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn number(&self, key: &str) -> Result<Option<f64>> {
        self.typed(key, "a number", Value::as_f64)
    }

    fn flag(&self, key: &str) -> Result<Option<bool>> {
        self.typed(key, "true or false", Value::as_bool)
    }

    fn text(&self, key: &str) -> Result<Option<&str>> {
        self.typed(key, "a string", Value::as_str)
    }

    fn typed<'a, T>(
        &'a self,
        key: &str,
        expected: &str,
        read: impl FnOnce(&'a Value) -> Option<T>,
    ) -> Result<Option<T>> {
        let Some(value) = self.values.get(key) else {
            return Ok(None);
        };
        read(value).map(Some).ok_or_else(|| Error::InvalidConfig {
            message: format!("`{key}` must be {expected}, got {value}"),
        })
    }
}

fn is_tree_key(key: &str) -> bool {
    TREE_KEYS.contains(&key)
}

fn unknown_key(key: &str) -> Error {
    Error::InvalidConfig {
        message: format!("unknown config key `{key}` (expected one of {})", TREE_KEYS.join(", ")),
    }
}

/// Where leaves (and optionally internal nodes) sit vertically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeafAlignment {
    /// Every node sits one rank below its parent.
    #[default]
    #[serde(rename = "none")]
    None,
    /// Leaves share one baseline at the deepest rank.
    #[serde(rename = "bottom")]
    Bottom,
    /// Leaves share the bottom baseline and internal nodes hug their shallowest child.
    #[serde(rename = "bottom+internal", alias = "bottom-internal")]
    BottomInternal,
}

impl FromStr for LeafAlignment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "top" => Ok(Self::None),
            "bottom" | "leaves" => Ok(Self::Bottom),
            "bottom+internal" | "bottom-internal" => Ok(Self::BottomInternal),
            other => Err(Error::InvalidConfig {
                message: format!("unknown alignment `{other}` (expected none|bottom|bottom+internal)"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TreeConfig {
    /// Label font size in px.
    pub font_size: f64,
    pub font_family: String,
    /// Draw multi-word leaves under a triangle instead of a line.
    pub triangles: bool,
    /// Color leaves and internal nodes differently.
    pub node_color: bool,
    /// Number repeated internal labels (`NP1`, `NP2`, ...).
    pub auto_subscript: bool,
    pub alignment: LeafAlignment,
    /// Scale factor applied to the vertical distance between ranks.
    pub spacing: f64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            font_family: "sans-serif".to_string(),
            triangles: true,
            node_color: true,
            auto_subscript: true,
            alignment: LeafAlignment::None,
            spacing: 1.0,
        }
    }
}

impl TreeConfig {
    /// Resolves a typed config from layered values; missing keys keep their defaults and a
    /// value of the wrong JSON type is an error.
    pub fn from_config(config: &SaplingConfig) -> Result<Self> {
        let mut out = Self::default();
        if let Some(v) = config.number("fontSize")? {
            out.font_size = v;
        }
        if let Some(v) = config.text("fontFamily")? {
            out.font_family = v.to_string();
        }
        if let Some(v) = config.flag("triangles")? {
            out.triangles = v;
        }
        if let Some(v) = config.flag("nodeColor")? {
            out.node_color = v;
        }
        if let Some(v) = config.flag("autoSubscript")? {
            out.auto_subscript = v;
        }
        if let Some(v) = config.text("alignment")? {
            out.alignment = v.parse()?;
        }
        if let Some(v) = config.number("spacing")? {
            out.spacing = v;
        }
        out.validate()?;
        Ok(out)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(Error::InvalidConfig {
                message: format!("fontSize must be a positive number, got {}", self.font_size),
            });
        }
        if !(self.spacing.is_finite() && self.spacing > 0.0) {
            return Err(Error::InvalidConfig {
                message: format!("spacing must be a positive number, got {}", self.spacing),
            });
        }
        Ok(())
    }

    /// Vertical distance between two adjacent ranks.
    pub fn vertical_spacing(&self) -> f64 {
        self.font_size * 3.0 * self.spacing
    }
}
