//! Progress ledger.
//!
//! The ledger owns the [`Store`] and is its only writer. Each mutation
//! updates memory first, then persists the whole document once. A failed
//! persist is logged and never surfaced: memory stays authoritative and the
//! next mutation writes everything again.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{ImportError, LedgerError, Result, ValidationError};
use crate::goal::SessionGoal;
use crate::level::Level;
use crate::shape::CustomShapeConfig;
use crate::storage::{transfer, HistoryEntry, Store, StoreBackend, Theme};
use crate::timer::{Clock, CompletedSession, SessionPlan, SystemClock};

/// How the interim goal is chosen for a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GoalChoice {
    /// Use the level's stored goal setting.
    #[default]
    Configured,
    /// Use this many minutes regardless of the stored setting.
    Minutes(u32),
    /// No interim goal.
    Off,
}

/// Per-level aggregate for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelSummary {
    pub level_id: u32,
    pub name: &'static str,
    pub sessions: usize,
    pub time_secs: u64,
    pub mastered: bool,
    pub mastery_eligible: bool,
    /// Fraction of the cumulative goal reached, when that goal is enabled.
    pub total_goal_progress: Option<f64>,
}

/// One row of the global practice log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub level_id: u32,
    pub level_name: String,
    pub date: DateTime<Utc>,
    pub duration: u64,
}

pub struct Ledger {
    store: Store,
    backend: Box<dyn StoreBackend>,
    clock: Box<dyn Clock>,
    last_persist_error: Option<String>,
}

impl Ledger {
    /// Load the store from `backend`.
    ///
    /// A missing, unreadable or malformed document yields a fresh default
    /// store; loading never fails.
    pub fn load(backend: impl StoreBackend + 'static) -> Self {
        let store = match backend.load() {
            Ok(Some(json)) => match Store::from_json(&json) {
                Ok(store) => store,
                Err(e) => {
                    tracing::warn!("stored practice data is malformed, starting fresh: {e}");
                    Store::default()
                }
            },
            Ok(None) => Store::default(),
            Err(e) => {
                tracing::warn!("could not read practice data, starting fresh: {e}");
                Store::default()
            }
        };
        Self {
            store,
            backend: Box::new(backend),
            clock: Box::new(SystemClock),
            last_persist_error: None,
        }
    }

    /// Timestamps for new history entries come from `clock`.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Message of the most recent failed persist, cleared by a successful one.
    pub fn last_persist_error(&self) -> Option<&str> {
        self.last_persist_error.as_deref()
    }

    // ── Sessions ─────────────────────────────────────────────────────

    /// Check a level's preconditions and build the plan for a new session.
    ///
    /// # Errors
    /// Unknown level, or a sigil level without an uploaded image.
    pub fn prepare_session(
        &self,
        level_id: u32,
        goal: GoalChoice,
    ) -> Result<SessionPlan, ValidationError> {
        let level = Level::get(level_id)?;
        if level.needs_focus_image() && self.store.sigil_image.is_none() {
            return Err(ValidationError::MissingFocusImage { level_id });
        }
        let plan = match goal {
            GoalChoice::Configured => SessionPlan::for_level(level, self.store.goal(level_id)),
            GoalChoice::Minutes(minutes) => {
                SessionGoal::validate_minutes(minutes)?;
                SessionPlan {
                    goal_target_secs: Some(u64::from(minutes) * 60),
                    ..SessionPlan::for_level(level, None)
                }
            }
            GoalChoice::Off => SessionPlan::for_level(level, None),
        };
        Ok(plan)
    }

    /// Record a finished session. Consumes it, so it cannot be counted twice.
    ///
    /// Returns the level's new accumulated time.
    pub fn reconcile(&mut self, completed: CompletedSession) -> Result<u64, ValidationError> {
        tracing::debug!(
            session = %completed.session_id(),
            started_at = %completed.started_at(),
            "reconciling session"
        );
        self.record_completed_session(completed.level_id(), completed.elapsed_secs())
    }

    /// Append a history entry and credit `seconds` to the level and total.
    ///
    /// The only operation that grows a level's history.
    ///
    /// # Errors
    /// Unknown level.
    pub fn record_completed_session(
        &mut self,
        level_id: u32,
        seconds: u64,
    ) -> Result<u64, ValidationError> {
        Level::get(level_id)?;
        let date = self.clock.now_utc();
        let record = self.store.record_mut(level_id);
        record.history.push(HistoryEntry {
            date,
            duration: seconds,
        });
        record.time += seconds;
        let time = record.time;
        self.store.total_time += seconds;
        tracing::info!(level_id, seconds, "session recorded");
        self.persist();
        Ok(time)
    }

    /// Add (or with a negative value, remove) minutes of practice without
    /// touching history.
    ///
    /// Returns the level's new accumulated time.
    ///
    /// # Errors
    /// Unknown level, or an adjustment that would leave the level below zero.
    /// Nothing is changed on error.
    pub fn adjust_manual_time(&mut self, level_id: u32, minutes: i64) -> Result<u64> {
        Level::get(level_id)?;
        let current = self.store.record(level_id).map_or(0, |r| r.time);
        let delta = minutes.saturating_mul(60);
        let updated = i128::from(current) + i128::from(delta);
        if updated < 0 {
            return Err(LedgerError::NegativeTime {
                level_id,
                minutes,
                current_secs: current,
            }
            .into());
        }
        let updated = u64::try_from(updated).unwrap_or(u64::MAX);
        self.store.record_mut(level_id).time = updated;
        self.store.total_time = if updated >= current {
            self.store.total_time.saturating_add(updated - current)
        } else {
            self.store.total_time.saturating_sub(current - updated)
        };
        tracing::info!(level_id, minutes, "manual time adjustment");
        self.persist();
        Ok(updated)
    }

    /// Flag a level as mastered. Idempotent.
    ///
    /// # Errors
    /// Unknown level.
    pub fn mark_mastered(&mut self, level_id: u32) -> Result<(), ValidationError> {
        Level::get(level_id)?;
        self.store.record_mut(level_id).mastered = true;
        self.persist();
        Ok(())
    }

    // ── Aggregates ───────────────────────────────────────────────────

    pub fn total_time_secs(&self) -> u64 {
        self.store.total_time
    }

    /// Whether mastery may be claimed: below the top level, not yet
    /// mastered, and at least three base durations practiced.
    pub fn is_mastery_eligible(&self, level_id: u32) -> bool {
        let Ok(level) = Level::get(level_id) else {
            return false;
        };
        if level.is_max() {
            return false;
        }
        self.store
            .record(level_id)
            .is_some_and(|r| !r.mastered && r.time >= level.mastery_threshold_secs())
    }

    /// # Errors
    /// Unknown level.
    pub fn level_summary(&self, level_id: u32) -> Result<LevelSummary, ValidationError> {
        let level = Level::get(level_id)?;
        let record = self.store.record(level_id).cloned().unwrap_or_default();
        Ok(LevelSummary {
            level_id,
            name: level.name,
            sessions: record.history.len(),
            time_secs: record.time,
            mastered: record.mastered,
            mastery_eligible: self.is_mastery_eligible(level_id),
            total_goal_progress: self
                .store
                .goal(level_id)
                .and_then(|g| g.total_progress(record.time)),
        })
    }

    pub fn summaries(&self) -> Vec<LevelSummary> {
        Level::all()
            .iter()
            .filter_map(|l| self.level_summary(l.id).ok())
            .collect()
    }

    /// Every level's history, most recent first. Entries with equal
    /// timestamps keep their level and insertion order.
    pub fn session_log(&self) -> Vec<LogEntry> {
        let mut log: Vec<LogEntry> = Level::all()
            .iter()
            .flat_map(|level| {
                self.store
                    .record(level.id)
                    .into_iter()
                    .flat_map(|r| r.history.iter())
                    .map(move |entry| LogEntry {
                        level_id: level.id,
                        level_name: level.name.to_uppercase(),
                        date: entry.date,
                        duration: entry.duration,
                    })
            })
            .collect();
        log.sort_by(|a, b| b.date.cmp(&a.date));
        log
    }

    pub fn last_session(&self) -> Option<LogEntry> {
        self.session_log().into_iter().next()
    }

    // ── Settings ─────────────────────────────────────────────────────

    /// Update a level's interim goal. `None` keeps the current minutes.
    ///
    /// # Errors
    /// Unknown level or zero minutes.
    pub fn set_session_goal(
        &mut self,
        level_id: u32,
        minutes: Option<u32>,
        enabled: bool,
    ) -> Result<(), ValidationError> {
        let level = Level::get(level_id)?;
        if let Some(m) = minutes {
            SessionGoal::validate_minutes(m)?;
        }
        let goal = self
            .store
            .goals
            .entry(level_id)
            .or_insert_with(|| SessionGoal::for_level(level));
        if let Some(m) = minutes {
            goal.target_minutes = m;
        }
        goal.enabled = enabled;
        self.persist();
        Ok(())
    }

    /// Update a level's cumulative goal. `None` keeps the current hours.
    ///
    /// # Errors
    /// Unknown level or fewer than 0.1 hours.
    pub fn set_total_goal(
        &mut self,
        level_id: u32,
        hours: Option<f64>,
        enabled: bool,
    ) -> Result<(), ValidationError> {
        let level = Level::get(level_id)?;
        if let Some(h) = hours {
            SessionGoal::validate_hours(h)?;
        }
        let goal = self
            .store
            .goals
            .entry(level_id)
            .or_insert_with(|| SessionGoal::for_level(level));
        if let Some(h) = hours {
            goal.total_target_hours = h;
        }
        goal.total_enabled = enabled;
        self.persist();
        Ok(())
    }

    pub fn set_sigil_image(&mut self, data_url: String) {
        self.store.sigil_image = Some(data_url);
        self.persist();
    }

    pub fn clear_sigil_image(&mut self) {
        self.store.sigil_image = None;
        self.persist();
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.store.theme = theme;
        self.persist();
    }

    /// # Errors
    /// Out-of-range shape values; the stored config is left unchanged.
    pub fn set_custom_shape(&mut self, config: CustomShapeConfig) -> Result<(), ValidationError> {
        config.validate()?;
        self.store.custom_shape = config;
        self.persist();
        Ok(())
    }

    // ── Import / export ──────────────────────────────────────────────

    pub fn export_document(&self) -> Result<String, serde_json::Error> {
        transfer::export_json(&self.store)
    }

    /// Replace the whole store with an imported document.
    ///
    /// # Errors
    /// Invalid payload; the current store is untouched.
    pub fn import_document(&mut self, payload: &str) -> Result<(), ImportError> {
        let store = transfer::parse_import(payload)?;
        self.store = store;
        tracing::info!("practice data imported");
        self.persist();
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn persist(&mut self) {
        let result = self
            .store
            .to_json()
            .map_err(|e| e.to_string())
            .and_then(|json| self.backend.save(&json).map_err(|e| e.to_string()));
        match result {
            Ok(()) => self.last_persist_error = None,
            Err(e) => {
                tracing::error!("persisting practice data failed: {e}");
                self.last_persist_error = Some(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, StorageError};
    use crate::storage::MemoryBackend;
    use crate::timer::{ManualClock, SessionClock};

    const T0: u64 = 1_700_000_000_000;

    struct FailingBackend;

    impl StoreBackend for FailingBackend {
        fn load(&self) -> Result<Option<String>, StorageError> {
            Err(StorageError::Locked)
        }

        fn save(&mut self, _document: &str) -> Result<(), StorageError> {
            Err(StorageError::QueryFailed("quota exceeded".into()))
        }
    }

    fn ledger() -> (Ledger, MemoryBackend, ManualClock) {
        let backend = MemoryBackend::new();
        let clock = ManualClock::new(T0);
        let ledger = Ledger::load(backend.clone()).with_clock(clock.clone());
        (ledger, backend, clock)
    }

    fn persisted(backend: &MemoryBackend) -> Store {
        Store::from_json(&backend.document().unwrap()).unwrap()
    }

    #[test]
    fn record_session_updates_totals_and_persists() {
        let (mut ledger, backend, _clock) = ledger();
        assert_eq!(ledger.record_completed_session(1, 90).unwrap(), 90);
        ledger.record_completed_session(2, 30).unwrap();

        let store = persisted(&backend);
        assert_eq!(store.total_time, 120);
        assert_eq!(store.record(1).unwrap().time, 90);
        assert_eq!(store.record(1).unwrap().history.len(), 1);
        assert_eq!(store.record(1).unwrap().history[0].duration, 90);
        assert_eq!(&store, ledger.store());
    }

    #[test]
    fn record_rejects_unknown_level() {
        let (mut ledger, backend, _clock) = ledger();
        assert_eq!(
            ledger.record_completed_session(9, 10),
            Err(ValidationError::UnknownLevel(9))
        );
        assert!(backend.document().is_none());
    }

    #[test]
    fn manual_adjustment_never_grows_history() {
        let (mut ledger, _backend, _clock) = ledger();
        ledger.record_completed_session(1, 60).unwrap();
        assert_eq!(ledger.adjust_manual_time(1, 5).unwrap(), 360);
        assert_eq!(ledger.store().record(1).unwrap().history.len(), 1);
        assert_eq!(ledger.total_time_secs(), 360);
    }

    #[test]
    fn manual_adjustment_below_zero_is_rejected() {
        let (mut ledger, backend, _clock) = ledger();
        ledger.record_completed_session(3, 120).unwrap();
        let before = backend.document();

        let err = ledger.adjust_manual_time(3, -3).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Ledger(LedgerError::NegativeTime { current_secs: 120, .. })
        ));
        assert_eq!(ledger.store().record(3).unwrap().time, 120);
        assert_eq!(ledger.total_time_secs(), 120);
        assert_eq!(backend.document(), before);

        assert_eq!(ledger.adjust_manual_time(3, -2).unwrap(), 0);
        assert_eq!(ledger.total_time_secs(), 0);
    }

    #[test]
    fn mastery_threshold_for_the_dot() {
        let (mut ledger, _backend, _clock) = ledger();
        ledger.record_completed_session(1, 359).unwrap();
        assert!(!ledger.is_mastery_eligible(1));
        ledger.record_completed_session(1, 1).unwrap();
        assert!(ledger.is_mastery_eligible(1));
        ledger.mark_mastered(1).unwrap();
        assert!(!ledger.is_mastery_eligible(1));
        ledger.mark_mastered(1).unwrap();
        assert!(ledger.store().record(1).unwrap().mastered);
    }

    #[test]
    fn top_level_is_never_eligible() {
        let (mut ledger, _backend, _clock) = ledger();
        let top = Level::max_id();
        ledger.adjust_manual_time(top, 100_000).unwrap();
        assert!(!ledger.is_mastery_eligible(top));
        assert!(!ledger.is_mastery_eligible(42));
    }

    #[test]
    fn session_log_is_newest_first_and_stable() {
        let (mut ledger, _backend, clock) = ledger();
        ledger.record_completed_session(1, 10).unwrap();
        clock.advance_secs(60);
        ledger.record_completed_session(3, 30).unwrap();
        ledger.record_completed_session(2, 20).unwrap();
        clock.advance_secs(60);
        ledger.record_completed_session(1, 40).unwrap();

        let durations: Vec<u64> = ledger.session_log().iter().map(|e| e.duration).collect();
        // Level 2 and 3 share a timestamp; catalog order breaks the tie.
        assert_eq!(durations, vec![40, 20, 30, 10]);
        let last = ledger.last_session().unwrap();
        assert_eq!(last.level_name, "THE DOT");
    }

    #[test]
    fn reconcile_records_a_finished_session() {
        let (mut ledger, _backend, clock) = ledger();
        let plan = ledger.prepare_session(1, GoalChoice::Off).unwrap();
        let mut session = SessionClock::new(plan).with_clock(clock.clone());
        session.start().unwrap();
        clock.advance_secs(45);
        let completed = session.finish().unwrap();
        assert_eq!(ledger.reconcile(completed).unwrap(), 45);
        assert_eq!(ledger.store().record(1).unwrap().history.len(), 1);
    }

    #[test]
    fn prepare_session_copies_goal_configuration() {
        let (mut ledger, _backend, _clock) = ledger();
        assert_eq!(
            ledger.prepare_session(1, GoalChoice::Configured).unwrap().goal_target_secs,
            None
        );
        ledger.set_session_goal(1, Some(3), true).unwrap();
        let plan = ledger.prepare_session(1, GoalChoice::Configured).unwrap();
        assert_eq!(plan.goal_target_secs, Some(180));

        // Editing the goal later does not reach an existing plan.
        ledger.set_session_goal(1, Some(9), true).unwrap();
        assert_eq!(plan.goal_target_secs, Some(180));

        assert_eq!(
            ledger.prepare_session(1, GoalChoice::Minutes(2)).unwrap().goal_target_secs,
            Some(120)
        );
        assert_eq!(
            ledger.prepare_session(1, GoalChoice::Off).unwrap().goal_target_secs,
            None
        );
        assert!(ledger.prepare_session(1, GoalChoice::Minutes(0)).is_err());
    }

    #[test]
    fn sigil_level_needs_an_image() {
        let (mut ledger, _backend, _clock) = ledger();
        assert_eq!(
            ledger.prepare_session(5, GoalChoice::Configured),
            Err(ValidationError::MissingFocusImage { level_id: 5 })
        );
        ledger.set_sigil_image("data:image/png;base64,AAAA".into());
        assert!(ledger.prepare_session(5, GoalChoice::Configured).is_ok());
        ledger.clear_sigil_image();
        assert!(ledger.prepare_session(5, GoalChoice::Configured).is_err());
    }

    #[test]
    fn total_goal_progress_in_summary() {
        let (mut ledger, _backend, _clock) = ledger();
        assert!(ledger.set_total_goal(2, Some(0.05), true).is_err());
        ledger.set_total_goal(2, Some(0.5), true).unwrap();
        ledger.record_completed_session(2, 450).unwrap();
        let summary = ledger.level_summary(2).unwrap();
        assert_eq!(summary.sessions, 1);
        assert_eq!(summary.total_goal_progress, Some(0.25));
        assert_eq!(ledger.summaries().len(), Level::all().len());
    }

    #[test]
    fn custom_shape_is_validated_before_storing() {
        let (mut ledger, _backend, _clock) = ledger();
        let bad = CustomShapeConfig {
            size: 0.0,
            ..CustomShapeConfig::default()
        };
        assert!(ledger.set_custom_shape(bad).is_err());
        assert_eq!(ledger.store().custom_shape, CustomShapeConfig::default());
        ledger.set_theme(Theme::Light);
        assert_eq!(ledger.store().theme, Theme::Light);
    }

    #[test]
    fn persist_failure_keeps_memory_authoritative() {
        let mut ledger = Ledger::load(FailingBackend);
        assert_eq!(ledger.store(), &Store::default());
        ledger.record_completed_session(1, 30).unwrap();
        assert_eq!(ledger.total_time_secs(), 30);
        assert!(ledger.last_persist_error().unwrap().contains("quota"));
    }

    #[test]
    fn malformed_document_loads_as_default() {
        let ledger = Ledger::load(MemoryBackend::with_document("{broken"));
        assert_eq!(ledger.store(), &Store::default());
    }

    #[test]
    fn bad_goal_settings_keep_saved_progress() {
        for goal in [r#"{"enabled":true}"#, r#"{"targetMinutes":1.5,"enabled":true}"#] {
            let document = format!(
                r#"{{"totalTime":3600,"levelData":{{"1":{{"time":3600,"mastered":true,"history":[]}}}},"goals":{{"1":{goal}}}}}"#
            );
            let backend = MemoryBackend::with_document(document);
            let mut ledger = Ledger::load(backend.clone());
            assert_eq!(ledger.total_time_secs(), 3600, "goal {goal}");
            assert!(ledger.level_summary(1).unwrap().mastered);
            assert_eq!(ledger.store().goal(1).unwrap().target_minutes, 2);

            ledger.set_theme(Theme::Light);
            assert_eq!(persisted(&backend).total_time, 3600);
        }
    }

    #[test]
    fn failed_import_leaves_store_untouched() {
        let (mut ledger, backend, _clock) = ledger();
        ledger.record_completed_session(1, 30).unwrap();
        let before = ledger.store().clone();
        assert!(ledger.import_document(r#"{"levelData":{}}"#).is_err());
        assert_eq!(ledger.store(), &before);
        assert_eq!(persisted(&backend), before);
    }

    #[test]
    fn export_import_round_trip() {
        let (mut ledger, _backend, _clock) = ledger();
        ledger.record_completed_session(4, 400).unwrap();
        ledger.mark_mastered(2).unwrap();
        ledger.set_session_goal(3, Some(4), true).unwrap();
        let exported = ledger.export_document().unwrap();

        let (mut other, other_backend, _clock) = self::ledger();
        other.import_document(&exported).unwrap();
        assert_eq!(other.store(), ledger.store());
        assert_eq!(persisted(&other_backend), *ledger.store());
    }
}
