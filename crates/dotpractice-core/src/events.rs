//! Session clock events.
//!
//! Serialized as JSON objects tagged by `type`, one per accepted transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timer::SessionStatus;

/// Every accepted session transition produces an Event.
/// The presentation layer renders from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStarted {
        session_id: Uuid,
        level_id: u32,
        planned_secs: u64,
        goal_secs: Option<u64>,
        at: DateTime<Utc>,
    },
    SessionPaused {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    /// The host lost immersive mode; treated as a pause.
    SessionInterrupted {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    /// Fires at most once per session.
    GoalReached {
        elapsed_secs: u64,
        goal_secs: u64,
        at: DateTime<Utc>,
    },
    SessionContinued {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    SessionFinished {
        session_id: Uuid,
        level_id: u32,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    SessionAborted {
        session_id: Uuid,
        level_id: u32,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        status: SessionStatus,
        level_id: u32,
        elapsed_secs: u64,
        remaining_secs: u64,
        goal_secs: Option<u64>,
        goal_reached: bool,
        at: DateTime<Utc>,
    },
}
