use super::field::FieldParams;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Display colors handed to the render adapter. The engine never interprets
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Colors {
    pub positive: String,
    pub negative: String,
    pub line: String,
    pub background: String,
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            positive: "#e53935".to_string(),
            negative: "#1e88e5".to_string(),
            line: "#212121".to_string(),
            background: "#fafafa".to_string(),
        }
    }
}

/// Per-simulation defaults used to seed new charges and their fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub r: f64,
    pub density: usize,
    pub steps: usize,
    pub delta: f64,
    /// Absolute magnitude given to newly added charges.
    pub magnitude: f64,
    pub colors: Colors,
    pub show_source_value: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            r: 10.0,
            density: 16,
            steps: 1000,
            delta: 2.0,
            magnitude: 1.0,
            colors: Colors::default(),
            show_source_value: false,
        }
    }
}

impl Settings {
    pub fn field_params(&self) -> FieldParams {
        FieldParams {
            r: self.r,
            density: self.density,
            steps: self.steps,
            delta: self.delta,
        }
    }

    /// Applies a partial settings update received from a form or file.
    ///
    /// Each recognized key is validated on its own; keys that are unknown or
    /// carry a malformed value are skipped and the previous value is kept.
    /// The names of the skipped keys are returned.
    pub fn apply_update(&mut self, update: &Map<String, Value>) -> Vec<String> {
        let mut ignored = Vec::new();

        for (key, value) in update {
            let accepted = match key.as_str() {
                "r" => positive_f64(value).map(|v| self.r = v).is_some(),
                "delta" => positive_f64(value).map(|v| self.delta = v).is_some(),
                "magnitude" => positive_f64(value).map(|v| self.magnitude = v).is_some(),
                "density" => count(value).map(|v| self.density = v).is_some(),
                "steps" => count(value).map(|v| self.steps = v).is_some(),
                "showSourceValue" => value
                    .as_bool()
                    .map(|v| self.show_source_value = v)
                    .is_some(),
                "colors" => match value.as_object() {
                    Some(colors) => {
                        ignored.extend(self.apply_colors(colors));
                        true
                    }
                    None => false,
                },
                _ => false,
            };
            if !accepted {
                ignored.push(key.clone());
            }
        }

        if !ignored.is_empty() {
            warn!(keys = ?ignored, "Ignored unrecognized or malformed settings fields.");
        }
        ignored
    }

    fn apply_colors(&mut self, update: &Map<String, Value>) -> Vec<String> {
        let mut ignored = Vec::new();
        for (key, value) in update {
            let slot = match key.as_str() {
                "positive" => &mut self.colors.positive,
                "negative" => &mut self.colors.negative,
                "line" => &mut self.colors.line,
                "background" => &mut self.colors.background,
                _ => {
                    ignored.push(format!("colors.{}", key));
                    continue;
                }
            };
            match value.as_str() {
                Some(color) if !color.trim().is_empty() => *slot = color.to_string(),
                _ => ignored.push(format!("colors.{}", key)),
            }
        }
        ignored
    }
}

fn positive_f64(value: &Value) -> Option<f64> {
    value.as_f64().filter(|v| v.is_finite() && *v > 0.0)
}

fn count(value: &Value) -> Option<usize> {
    value.as_u64().and_then(|v| usize::try_from(v).ok())
}
