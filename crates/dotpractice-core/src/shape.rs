//! Focus object description.
//!
//! Rendering is left to the presentation layer; this module only describes
//! what should be drawn and validates the user-editable custom form.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ValidationError};
use crate::storage::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Dot,
    Circle,
    Square,
    Triangle,
    Hexagon,
    Star,
}

impl Shape {
    pub fn label(self) -> &'static str {
        match self {
            Shape::Dot => "dot",
            Shape::Circle => "circle",
            Shape::Square => "square",
            Shape::Triangle => "triangle",
            Shape::Hexagon => "hexagon",
            Shape::Star => "star",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Animation {
    None,
    Pulse,
    Rotate,
    Breathe,
}

/// Configuration of the fully customizable animated level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomShapeConfig {
    #[serde(default = "default_shape")]
    pub shape: Shape,
    #[serde(default = "default_color")]
    pub color: String,
    /// Fraction of the viewport occupied by the form.
    #[serde(default = "default_size")]
    pub size: f64,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
    #[serde(default = "default_animation")]
    pub animation: Animation,
    /// Period of one animation cycle.
    #[serde(default = "default_animation_secs")]
    pub animation_secs: f64,
}

fn default_shape() -> Shape {
    Shape::Circle
}
fn default_color() -> String {
    "#ffffff".into()
}
fn default_size() -> f64 {
    0.4
}
fn default_stroke_width() -> f64 {
    3.0
}
fn default_animation() -> Animation {
    Animation::Breathe
}
fn default_animation_secs() -> f64 {
    8.0
}

impl Default for CustomShapeConfig {
    fn default() -> Self {
        Self {
            shape: default_shape(),
            color: default_color(),
            size: default_size(),
            stroke_width: default_stroke_width(),
            animation: default_animation(),
            animation_secs: default_animation_secs(),
        }
    }
}

impl CustomShapeConfig {
    /// Check value ranges before the config is stored.
    ///
    /// # Errors
    /// Returns the first out-of-range field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.05..=1.0).contains(&self.size) {
            return Err(ValidationError::invalid(
                "size",
                format!("{} is outside 0.05..=1.0", self.size),
            ));
        }
        if !self.stroke_width.is_finite() || self.stroke_width < 0.0 {
            return Err(ValidationError::invalid(
                "strokeWidth",
                "must be a non-negative number",
            ));
        }
        if !self.animation_secs.is_finite() || self.animation_secs <= 0.0 {
            return Err(ValidationError::invalid(
                "animationSecs",
                "must be greater than zero",
            ));
        }
        if self.color.trim().is_empty() {
            return Err(ValidationError::invalid("color", "must not be empty"));
        }
        Ok(())
    }

    /// Copy with one camelCase field replaced, e.g. `("animation", "pulse")`.
    ///
    /// # Errors
    /// Unknown field, unparsable value, or a result that fails validation.
    pub fn with_field(&self, key: &str, value: &str) -> Result<Self, ValidationError> {
        let mut json = serde_json::to_value(self)
            .map_err(|e| ValidationError::invalid(key, e.to_string()))?;
        // Enum fields are JSON strings, so they pass through as-is and are
        // checked by deserialization below.
        Config::set_json_value_by_path(&mut json, key, value).map_err(|e| match e {
            ConfigError::UnknownKey(_) => ValidationError::invalid(key, "unknown shape setting"),
            other => ValidationError::invalid(key, other.to_string()),
        })?;
        let updated: Self = serde_json::from_value(json)
            .map_err(|e| ValidationError::invalid(key, e.to_string()))?;
        updated.validate()?;
        Ok(updated)
    }
}
