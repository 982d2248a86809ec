//! The persisted practice document.
//!
//! One JSON document holds everything durable. Every field added after the
//! first release carries a serde default so older documents still load.
//! Settings (goals, theme, custom form) are read leniently: an unreadable
//! value falls back to its default instead of failing the whole document,
//! so practice progress is never discarded over a bad setting.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::goal::SessionGoal;
use crate::level::Level;
use crate::shape::CustomShapeConfig;

/// Key the document is stored under.
pub const STORE_KEY: &str = "dot_practice_v1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: DateTime<Utc>,
    /// Seconds practiced.
    pub duration: u64,
}

/// Accumulated progress for one level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRecord {
    /// Total seconds: the sum of `history` plus manual adjustments.
    #[serde(default)]
    pub time: u64,
    /// Only ever goes from false to true.
    #[serde(default)]
    pub mastered: bool,
    /// Append-only, insertion order.
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(format!("unknown theme '{other}' (expected dark or light)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    #[serde(default)]
    pub total_time: u64,
    #[serde(default = "default_unlocked_level")]
    pub unlocked_level: u32,
    #[serde(default)]
    pub level_data: BTreeMap<u32, LevelRecord>,
    #[serde(default, deserialize_with = "lenient_goals")]
    pub goals: BTreeMap<u32, SessionGoal>,
    /// Uploaded focus image as a data URL.
    #[serde(default, deserialize_with = "or_default")]
    pub sigil_image: Option<String>,
    #[serde(default, deserialize_with = "or_default")]
    pub theme: Theme,
    #[serde(default, deserialize_with = "lenient_custom_shape")]
    pub custom_shape: CustomShapeConfig,
}

fn default_unlocked_level() -> u32 {
    // All levels unlocked.
    Level::max_id()
}

/// Overlay each stored field onto `base`, keeping only fields that still
/// deserialize and pass `accept`.
fn overlay_fields<T, F>(base: T, stored: &serde_json::Value, accept: F) -> T
where
    T: Serialize + DeserializeOwned,
    F: Fn(&T) -> bool,
{
    let Some(fields) = stored.as_object() else {
        tracing::warn!("ignoring stored setting that is not an object");
        return base;
    };
    let Ok(mut merged) = serde_json::to_value(&base) else {
        return base;
    };
    let mut current = base;
    for (key, value) in fields {
        let mut candidate = merged.clone();
        if let Some(obj) = candidate.as_object_mut() {
            obj.insert(key.clone(), value.clone());
        }
        match serde_json::from_value::<T>(candidate.clone()) {
            Ok(parsed) if accept(&parsed) => {
                merged = candidate;
                current = parsed;
            }
            _ => tracing::warn!(field = %key, "ignoring unreadable stored setting"),
        }
    }
    current
}

fn lenient_goals<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<u32, SessionGoal>, D::Error> {
    let raw = serde_json::Value::deserialize(deserializer)?;
    let Some(entries) = raw.as_object() else {
        tracing::warn!("stored goals are not a mapping, using defaults");
        return Ok(BTreeMap::new());
    };
    let goals = entries
        .iter()
        .filter_map(|(key, value)| {
            let level = key.parse().ok().and_then(|id| Level::get(id).ok())?;
            let goal = overlay_fields(SessionGoal::for_level(level), value, |_| true);
            Some((level.id, goal))
        })
        .collect();
    Ok(goals)
}

fn lenient_custom_shape<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<CustomShapeConfig, D::Error> {
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(overlay_fields(CustomShapeConfig::default(), &raw, |cfg| {
        cfg.validate().is_ok()
    }))
}

fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(raw).unwrap_or_else(|e| {
        tracing::warn!("ignoring unreadable stored setting: {e}");
        T::default()
    }))
}

impl Default for Store {
    fn default() -> Self {
        let mut store = Self {
            total_time: 0,
            unlocked_level: default_unlocked_level(),
            level_data: BTreeMap::new(),
            goals: BTreeMap::new(),
            sigil_image: None,
            theme: Theme::default(),
            custom_shape: CustomShapeConfig::default(),
        };
        store.normalize();
        store
    }
}

impl Store {
    /// Fill in a record and a goal for every catalog level that lacks one.
    ///
    /// Returns `true` when anything was added.
    pub fn normalize(&mut self) -> bool {
        let mut changed = false;
        for level in Level::all() {
            if !self.level_data.contains_key(&level.id) {
                self.level_data.insert(level.id, LevelRecord::default());
                changed = true;
            }
            if !self.goals.contains_key(&level.id) {
                self.goals.insert(level.id, SessionGoal::for_level(level));
                changed = true;
            }
        }
        changed
    }

    pub fn record(&self, level_id: u32) -> Option<&LevelRecord> {
        self.level_data.get(&level_id)
    }

    pub fn goal(&self, level_id: u32) -> Option<&SessionGoal> {
        self.goals.get(&level_id)
    }

    pub(crate) fn record_mut(&mut self, level_id: u32) -> &mut LevelRecord {
        self.level_data.entry(level_id).or_default()
    }

    /// Parse a persisted document, filling defaults for missing fields.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut store: Store = serde_json::from_str(json)?;
        store.normalize();
        Ok(store)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
