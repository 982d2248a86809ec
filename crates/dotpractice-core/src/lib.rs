//! # The Practice Core Library
//!
//! Core logic for an attention-training timer: the practitioner picks a
//! focus object, holds uninterrupted attention on it for a level's duration,
//! and the time is credited to that level's progress.
//!
//! ## Architecture
//!
//! - **Session Clock**: a wall-clock state machine; the caller invokes
//!   `tick()` periodically so the interim goal can fire
//! - **Progress Ledger**: the only writer of the persisted store; records
//!   finished sessions, manual adjustments and mastery
//! - **Storage**: one JSON document in a SQLite key-value table, plus a TOML
//!   configuration file
//!
//! ## Key Components
//!
//! - [`SessionClock`]: practice session state machine
//! - [`Ledger`]: per-level totals, history and mastery
//! - [`Store`]: the persisted document
//! - [`Config`]: host configuration

pub mod error;
pub mod events;
pub mod goal;
pub mod ledger;
pub mod level;
pub mod shape;
pub mod storage;
pub mod timer;

pub use error::{
    ConfigError, CoreError, ImportError, LedgerError, Result, SessionError, StorageError,
    ValidationError,
};
pub use events::Event;
pub use goal::SessionGoal;
pub use ledger::{GoalChoice, Ledger, LevelSummary, LogEntry};
pub use level::{Level, LevelKind};
pub use shape::{Animation, CustomShapeConfig, Shape};
pub use storage::{Config, Database, Store, StoreBackend, Theme};
pub use timer::{
    CompletedSession, FocusEnvironment, SessionClock, SessionPlan, SessionStatus,
};
