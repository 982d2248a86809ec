//! Per-level goal configuration.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;
use crate::level::Level;

/// Smallest accepted cumulative goal.
pub const MIN_TOTAL_TARGET_HOURS: f64 = 0.1;

/// Interim checkpoint and cumulative target for one level.
///
/// A session copies the interim target when it starts, so editing a goal
/// never affects a session already in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionGoal {
    /// Stored documents may hold fractional minutes; they round to whole ones.
    #[serde(deserialize_with = "whole_minutes")]
    pub target_minutes: u32,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_total_target_hours")]
    pub total_target_hours: f64,
    #[serde(default)]
    pub total_enabled: bool,
}

fn default_total_target_hours() -> f64 {
    1.0
}

fn whole_minutes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let minutes = f64::deserialize(deserializer)?;
    if !minutes.is_finite() {
        return Err(D::Error::custom("targetMinutes must be a finite number"));
    }
    Ok(minutes.round().clamp(1.0, f64::from(u32::MAX)) as u32)
}

impl SessionGoal {
    /// Defaults for a level: the checkpoint sits at the base duration.
    pub fn for_level(level: &Level) -> Self {
        Self {
            target_minutes: level.base_minutes(),
            enabled: false,
            total_target_hours: default_total_target_hours(),
            total_enabled: false,
        }
    }

    /// Interim checkpoint in seconds, when enabled.
    pub fn target_secs(&self) -> Option<u64> {
        self.enabled.then(|| u64::from(self.target_minutes) * 60)
    }

    /// Fraction of the cumulative goal covered by `time_secs`, when enabled.
    pub fn total_progress(&self, time_secs: u64) -> Option<f64> {
        if !self.total_enabled {
            return None;
        }
        let target_secs = self.total_target_hours * 3600.0;
        Some((time_secs as f64 / target_secs).min(1.0))
    }

    pub(crate) fn validate_minutes(minutes: u32) -> Result<(), ValidationError> {
        if minutes == 0 {
            return Err(ValidationError::invalid(
                "targetMinutes",
                "must be at least one minute",
            ));
        }
        Ok(())
    }

    pub(crate) fn validate_hours(hours: f64) -> Result<(), ValidationError> {
        if !hours.is_finite() || hours < MIN_TOTAL_TARGET_HOURS {
            return Err(ValidationError::invalid(
                "totalTargetHours",
                format!("must be at least {MIN_TOTAL_TARGET_HOURS}"),
            ));
        }
        Ok(())
    }
}
