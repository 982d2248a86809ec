//! Level catalog.
//!
//! Levels are static definitions; per-level progress lives in
//! [`LevelRecord`](crate::storage::LevelRecord).

use serde::Serialize;

use crate::error::ValidationError;
use crate::shape::Shape;

/// Accumulated time needed before mastery may be claimed, as a multiple of
/// the level's base duration.
pub const MASTERY_MULTIPLIER: u64 = 3;

/// What the practitioner looks at during a level.
///
/// Resolved once when a session is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "shape", rename_all = "lowercase")]
pub enum LevelKind {
    /// A drawn geometric form around a dot.
    Form(Shape),
    /// An uploaded image (the stored sigil).
    Sigil,
    /// The user-configurable animated form.
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Level {
    pub id: u32,
    pub name: &'static str,
    pub base_duration_secs: u64,
    pub steps: &'static [&'static str],
    pub extra: Option<&'static str>,
    pub kind: LevelKind,
}

static LEVELS: [Level; 6] = [
    Level {
        id: 1,
        name: "The Dot",
        base_duration_secs: 2 * 60,
        steps: &[
            "Draw a single dot on white paper.",
            "Focus your undivided attention on the dot.",
            "When your mind wanders, return your focus to the dot.",
        ],
        extra: None,
        kind: LevelKind::Form(Shape::Dot),
    },
    Level {
        id: 2,
        name: "The Circle",
        base_duration_secs: 4 * 60,
        steps: &[
            "Draw a perfect circle around a new dot.",
            "Focus on the dot within the circle.",
            "Maintain unwavering attention on this form.",
        ],
        extra: None,
        kind: LevelKind::Form(Shape::Circle),
    },
    Level {
        id: 3,
        name: "The Square",
        base_duration_secs: 6 * 60,
        steps: &[
            "Draw a perfect square around a new dot.",
            "Focus on the dot within the square.",
            "Maintain unwavering attention on this form.",
        ],
        extra: None,
        kind: LevelKind::Form(Shape::Square),
    },
    Level {
        id: 4,
        name: "The Triangle",
        base_duration_secs: 6 * 60,
        steps: &[
            "Draw a perfect triangle around a new dot.",
            "Focus on the dot within the triangle.",
            "Maintain unwavering attention on this form.",
        ],
        extra: None,
        kind: LevelKind::Form(Shape::Triangle),
    },
    Level {
        id: 5,
        name: "God/Demon Sigil Practice",
        base_duration_secs: 10 * 60,
        steps: &[
            "Select a God Sigil of your choice.",
            "Place the image before you.",
            "Focus on the Sigil's visual center, with unwavering attention, then expand your attention to the entire pattern. Allow the pattern to be experienced by your attention.",
            "Do not break focus for the full 10 minutes.",
        ],
        extra: Some(
            "When this level is reached, your attention has become more stable, but now you have foundation to focus in general.",
        ),
        kind: LevelKind::Sigil,
    },
    Level {
        id: 6,
        name: "The Living Form",
        base_duration_secs: 10 * 60,
        steps: &[
            "Shape the form, its color and its motion to your liking.",
            "Rest your attention on the center of the form.",
            "Let the motion carry your attention without following it away.",
        ],
        extra: None,
        kind: LevelKind::Custom,
    },
];

impl Level {
    /// All levels, ordered by id.
    pub fn all() -> &'static [Level] {
        &LEVELS
    }

    /// Look up a level by id.
    ///
    /// # Errors
    /// Returns [`ValidationError::UnknownLevel`] for ids outside the catalog.
    pub fn get(id: u32) -> Result<&'static Level, ValidationError> {
        LEVELS
            .iter()
            .find(|l| l.id == id)
            .ok_or(ValidationError::UnknownLevel(id))
    }

    /// Id of the top level. It has nothing to graduate toward.
    pub fn max_id() -> u32 {
        LEVELS.iter().map(|l| l.id).max().unwrap_or(0)
    }

    pub fn is_max(&self) -> bool {
        self.id == Self::max_id()
    }

    pub fn base_minutes(&self) -> u32 {
        (self.base_duration_secs / 60) as u32
    }

    pub fn mastery_threshold_secs(&self) -> u64 {
        self.base_duration_secs * MASTERY_MULTIPLIER
    }

    pub fn needs_focus_image(&self) -> bool {
        matches!(self.kind, LevelKind::Sigil)
    }
}
