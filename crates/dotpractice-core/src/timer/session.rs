//! Practice session clock.
//!
//! A wall-clock state machine with no internal thread. The host calls
//! `tick()` at its refresh cadence so the interim goal can fire.
//!
//! ## State Transitions
//!
//! ```text
//! NotStarted -> Running <-> Paused
//!               Running  -> GoalReached -> (Running | Finished | Aborted)
//!               Running | Paused -> (Finished | Aborted)
//! ```
//!
//! ## Elapsed time
//!
//! While running, `elapsed = now - interval_start`. Resuming rebases
//! `interval_start = now - accumulated`, so the same subtraction stays valid
//! after any number of pauses. Do not replace this with a separate
//! "is running" branch that adds `accumulated` back in.
//!
//! ## Usage
//!
//! ```ignore
//! let mut session = SessionClock::new(plan);
//! session.start()?;
//! // In a loop:
//! if let Some(Event::GoalReached { .. }) = session.tick() { /* notify */ }
//! let completed = session.finish()?;
//! ledger.reconcile(completed);
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::clock::{ms_to_utc, Clock, SystemClock};
use super::environment::{FocusEnvironment, Headless, ImmersiveLease};
use super::poll::{GoalPoll, PollTicket};
use crate::error::SessionError;
use crate::events::Event;
use crate::goal::SessionGoal;
use crate::level::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    NotStarted,
    Running,
    Paused,
    /// Frozen at the interim goal, awaiting continue or finish.
    GoalReached,
    Finished,
    Aborted,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Finished | SessionStatus::Aborted)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::NotStarted => "not started",
            SessionStatus::Running => "running",
            SessionStatus::Paused => "paused",
            SessionStatus::GoalReached => "at its goal",
            SessionStatus::Finished => "finished",
            SessionStatus::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// Everything a session copies from its level and goal at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPlan {
    pub level_id: u32,
    pub planned_secs: u64,
    pub goal_target_secs: Option<u64>,
}

impl SessionPlan {
    pub fn for_level(level: &Level, goal: Option<&SessionGoal>) -> Self {
        Self {
            level_id: level.id,
            planned_secs: level.base_duration_secs,
            goal_target_secs: goal.and_then(SessionGoal::target_secs),
        }
    }
}

/// Result of a finished session, handed to the ledger.
///
/// Not `Clone`: the ledger takes it by value, so it can be recorded once.
#[derive(Debug, PartialEq, Eq)]
pub struct CompletedSession {
    session_id: Uuid,
    level_id: u32,
    elapsed_secs: u64,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
}

impl CompletedSession {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn level_id(&self) -> u32 {
        self.level_id
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    pub fn to_event(&self) -> Event {
        Event::SessionFinished {
            session_id: self.session_id,
            level_id: self.level_id,
            elapsed_secs: self.elapsed_secs,
            at: self.finished_at,
        }
    }
}

/// One practice attempt.
pub struct SessionClock {
    id: Uuid,
    plan: SessionPlan,
    status: SessionStatus,
    /// Time credited before the current running interval began.
    accumulated_ms: u64,
    /// Start of the current running interval; `Some` only while running.
    interval_start_ms: Option<u64>,
    goal_fired: bool,
    started_at: Option<DateTime<Utc>>,
    poll: GoalPoll,
    immersive: ImmersiveLease,
    clock: Box<dyn Clock>,
}

impl SessionClock {
    /// Create a session on the system clock with no immersive environment.
    pub fn new(plan: SessionPlan) -> Self {
        Self {
            id: Uuid::new_v4(),
            plan,
            status: SessionStatus::NotStarted,
            accumulated_ms: 0,
            interval_start_ms: None,
            goal_fired: false,
            started_at: None,
            poll: GoalPoll::default(),
            immersive: ImmersiveLease::new(Box::new(Headless)),
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_environment(mut self, env: impl FocusEnvironment + 'static) -> Self {
        self.immersive = ImmersiveLease::new(Box::new(env));
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn level_id(&self) -> u32 {
        self.plan.level_id
    }

    pub fn planned_secs(&self) -> u64 {
        self.plan.planned_secs
    }

    pub fn goal_target_secs(&self) -> Option<u64> {
        self.plan.goal_target_secs
    }

    /// Whether the interim goal has fired during this session.
    pub fn goal_reached(&self) -> bool {
        self.goal_fired
    }

    pub fn is_immersive(&self) -> bool {
        self.immersive.is_held()
    }

    pub fn elapsed_ms(&self) -> u64 {
        match self.interval_start_ms {
            Some(start) => self.clock.now_ms().saturating_sub(start),
            None => self.accumulated_ms,
        }
    }

    /// Elapsed practice time, floored to whole seconds.
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_ms() / 1000
    }

    pub fn remaining_secs(&self) -> u64 {
        self.plan.planned_secs.saturating_sub(self.elapsed_secs())
    }

    /// Ticket for the armed goal poll, `None` unless running.
    pub fn poll_ticket(&self) -> Option<PollTicket> {
        self.poll.ticket()
    }

    pub fn poll_generation(&self) -> u64 {
        self.poll.generation()
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            status: self.status,
            level_id: self.plan.level_id,
            elapsed_secs: self.elapsed_secs(),
            remaining_secs: self.remaining_secs(),
            goal_secs: self.plan.goal_target_secs,
            goal_reached: self.goal_fired,
            at: self.clock.now_utc(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Result<Event, SessionError> {
        self.ensure(&[SessionStatus::NotStarted], "start")?;
        let now = self.clock.now_ms();
        self.accumulated_ms = 0;
        self.started_at = Some(ms_to_utc(now));
        self.enter_running(now);
        tracing::debug!(session = %self.id, level = self.plan.level_id, "session started");
        Ok(Event::SessionStarted {
            session_id: self.id,
            level_id: self.plan.level_id,
            planned_secs: self.plan.planned_secs,
            goal_secs: self.plan.goal_target_secs,
            at: ms_to_utc(now),
        })
    }

    pub fn pause(&mut self) -> Result<Event, SessionError> {
        self.ensure(&[SessionStatus::Running], "pause")?;
        let now = self.leave_running(SessionStatus::Paused);
        Ok(Event::SessionPaused {
            elapsed_secs: self.elapsed_secs(),
            at: ms_to_utc(now),
        })
    }

    pub fn resume(&mut self) -> Result<Event, SessionError> {
        self.ensure(&[SessionStatus::Paused], "resume")?;
        let now = self.clock.now_ms();
        self.enter_running(now);
        Ok(Event::SessionResumed {
            elapsed_secs: self.elapsed_secs(),
            at: ms_to_utc(now),
        })
    }

    /// Host lost immersive mode. A running session pauses; nothing is
    /// discarded. Returns `None` when there was nothing to interrupt.
    pub fn interrupt(&mut self) -> Option<Event> {
        if self.status != SessionStatus::Running {
            return None;
        }
        let now = self.leave_running(SessionStatus::Paused);
        tracing::debug!(session = %self.id, "session interrupted by environment");
        Some(Event::SessionInterrupted {
            elapsed_secs: self.elapsed_secs(),
            at: ms_to_utc(now),
        })
    }

    /// Call periodically while running. Returns `Some(Event::GoalReached)`
    /// the first time the interim goal is crossed.
    pub fn tick(&mut self) -> Option<Event> {
        if self.status != SessionStatus::Running || !self.poll.is_armed() || self.goal_fired {
            return None;
        }
        let goal_secs = self.plan.goal_target_secs?;
        if self.elapsed_ms() < goal_secs.saturating_mul(1000) {
            return None;
        }
        self.goal_fired = true;
        let now = self.leave_running(SessionStatus::GoalReached);
        tracing::debug!(session = %self.id, goal_secs, "interim goal reached");
        Some(Event::GoalReached {
            elapsed_secs: self.elapsed_secs(),
            goal_secs,
            at: ms_to_utc(now),
        })
    }

    /// Same as [`tick`](Self::tick), but ignored when `ticket` is stale.
    pub fn tick_with(&mut self, ticket: PollTicket) -> Option<Event> {
        if !self.poll.is_current(ticket) {
            return None;
        }
        self.tick()
    }

    pub fn continue_after_goal(&mut self) -> Result<Event, SessionError> {
        self.ensure(&[SessionStatus::GoalReached], "continue")?;
        let now = self.clock.now_ms();
        self.enter_running(now);
        Ok(Event::SessionContinued {
            elapsed_secs: self.elapsed_secs(),
            at: ms_to_utc(now),
        })
    }

    /// Finish from the goal screen. Reports the time frozen at the goal,
    /// not the time spent looking at the goal screen.
    pub fn finish_after_goal(&mut self) -> Result<CompletedSession, SessionError> {
        self.ensure(&[SessionStatus::GoalReached], "finish after goal")?;
        Ok(self.complete())
    }

    /// Finish a running or paused session.
    pub fn finish(&mut self) -> Result<CompletedSession, SessionError> {
        self.ensure(&[SessionStatus::Running, SessionStatus::Paused], "finish")?;
        if self.status == SessionStatus::Running {
            self.leave_running(SessionStatus::Paused);
        }
        Ok(self.complete())
    }

    /// Discard the session. Nothing reaches the ledger.
    pub fn abort(&mut self) -> Result<Event, SessionError> {
        self.ensure(
            &[
                SessionStatus::Running,
                SessionStatus::Paused,
                SessionStatus::GoalReached,
            ],
            "abort",
        )?;
        let now = if self.status == SessionStatus::Running {
            self.leave_running(SessionStatus::Aborted)
        } else {
            self.status = SessionStatus::Aborted;
            self.clock.now_ms()
        };
        tracing::debug!(session = %self.id, "session aborted");
        Ok(Event::SessionAborted {
            session_id: self.id,
            level_id: self.plan.level_id,
            at: ms_to_utc(now),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn ensure(&self, allowed: &[SessionStatus], action: &'static str) -> Result<(), SessionError> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                from: self.status,
                action,
            })
        }
    }

    fn enter_running(&mut self, now: u64) {
        self.interval_start_ms = Some(now.saturating_sub(self.accumulated_ms));
        self.status = SessionStatus::Running;
        self.poll.arm();
        self.immersive.acquire();
    }

    /// Freeze elapsed time and drop every resource tied to running.
    fn leave_running(&mut self, next: SessionStatus) -> u64 {
        let now = self.clock.now_ms();
        if let Some(start) = self.interval_start_ms.take() {
            // max() keeps credited time if the wall clock stepped backwards.
            self.accumulated_ms = self.accumulated_ms.max(now.saturating_sub(start));
        }
        self.status = next;
        self.poll.cancel();
        self.immersive.release();
        now
    }

    fn complete(&mut self) -> CompletedSession {
        let now = self.clock.now_ms();
        self.status = SessionStatus::Finished;
        let finished_at = ms_to_utc(now);
        tracing::debug!(session = %self.id, elapsed_ms = self.accumulated_ms, "session finished");
        CompletedSession {
            session_id: self.id,
            level_id: self.plan.level_id,
            elapsed_secs: self.accumulated_ms / 1000,
            started_at: self.started_at.unwrap_or(finished_at),
            finished_at,
        }
    }
}

impl Drop for SessionClock {
    fn drop(&mut self) {
        self.poll.cancel();
        self.immersive.release();
    }
}

impl fmt::Debug for SessionClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionClock")
            .field("id", &self.id)
            .field("plan", &self.plan)
            .field("status", &self.status)
            .field("accumulated_ms", &self.accumulated_ms)
            .field("interval_start_ms", &self.interval_start_ms)
            .field("goal_fired", &self.goal_fired)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::timer::clock::ManualClock;
    use crate::timer::environment::EnvironmentError;

    const T0: u64 = 1_700_000_000_000;

    fn session(goal: Option<u64>) -> (SessionClock, ManualClock) {
        let clock = ManualClock::new(T0);
        let plan = SessionPlan {
            level_id: 1,
            planned_secs: 120,
            goal_target_secs: goal,
        };
        (SessionClock::new(plan).with_clock(clock.clone()), clock)
    }

    #[derive(Clone, Default)]
    struct RecordingEnv {
        log: Arc<Mutex<Vec<&'static str>>>,
        refuse: bool,
    }

    impl FocusEnvironment for RecordingEnv {
        fn enter_immersive(&mut self) -> Result<(), EnvironmentError> {
            if self.refuse {
                return Err(EnvironmentError::Refused("blocked".into()));
            }
            self.log.lock().unwrap().push("enter");
            Ok(())
        }

        fn exit_immersive(&mut self) {
            self.log.lock().unwrap().push("exit");
        }
    }

    #[test]
    fn start_pause_resume() {
        let (mut s, _clock) = session(None);
        assert_eq!(s.status(), SessionStatus::NotStarted);
        assert!(s.start().is_ok());
        assert_eq!(s.status(), SessionStatus::Running);
        assert!(s.pause().is_ok());
        assert_eq!(s.status(), SessionStatus::Paused);
        assert!(s.resume().is_ok());
        assert_eq!(s.status(), SessionStatus::Running);
    }

    #[test]
    fn paused_wall_time_is_not_credited() {
        let (mut s, clock) = session(None);
        s.start().unwrap();
        clock.advance_secs(30);
        s.pause().unwrap();
        clock.advance_secs(500);
        assert_eq!(s.elapsed_secs(), 30);
        s.resume().unwrap();
        clock.advance_secs(10);
        let done = s.finish().unwrap();
        assert_eq!(done.elapsed_secs(), 40);
        assert_eq!(s.status(), SessionStatus::Finished);
    }

    #[test]
    fn elapsed_is_floored() {
        let (mut s, clock) = session(None);
        s.start().unwrap();
        clock.advance_ms(1_999);
        assert_eq!(s.finish().unwrap().elapsed_secs(), 1);
    }

    #[test]
    fn goal_fires_once_and_continue_keeps_counting() {
        let (mut s, clock) = session(Some(60));
        s.start().unwrap();
        clock.advance_secs(59);
        assert!(s.tick().is_none());
        clock.advance_secs(1);
        let event = s.tick().expect("goal should fire");
        assert!(matches!(event, Event::GoalReached { elapsed_secs: 60, goal_secs: 60, .. }));
        assert_eq!(s.status(), SessionStatus::GoalReached);

        s.continue_after_goal().unwrap();
        clock.advance_secs(20);
        assert!(s.tick().is_none());
        assert_eq!(s.status(), SessionStatus::Running);
        assert_eq!(s.finish().unwrap().elapsed_secs(), 80);
    }

    #[test]
    fn finish_after_goal_ignores_time_on_goal_screen() {
        let (mut s, clock) = session(Some(60));
        s.start().unwrap();
        clock.advance_secs(60);
        s.tick().unwrap();
        clock.advance_secs(45);
        assert_eq!(s.elapsed_secs(), 60);
        assert_eq!(s.finish_after_goal().unwrap().elapsed_secs(), 60);
    }

    #[test]
    fn goal_latch_survives_pause_cycles() {
        let (mut s, clock) = session(Some(10));
        s.start().unwrap();
        clock.advance_secs(10);
        assert!(s.tick().is_some());
        s.continue_after_goal().unwrap();
        s.pause().unwrap();
        s.resume().unwrap();
        clock.advance_secs(30);
        assert!(s.tick().is_none());
        assert!(s.goal_reached());
    }

    #[test]
    fn tick_without_goal_never_fires() {
        let (mut s, clock) = session(None);
        s.start().unwrap();
        clock.advance_secs(10_000);
        assert!(s.tick().is_none());
    }

    #[test]
    fn tick_while_paused_does_not_fire() {
        let (mut s, clock) = session(Some(5));
        s.start().unwrap();
        clock.advance_secs(4);
        s.pause().unwrap();
        clock.advance_secs(100);
        assert!(s.tick().is_none());
        assert_eq!(s.status(), SessionStatus::Paused);
    }

    #[test]
    fn invalid_transitions_are_rejected_without_mutation() {
        let (mut s, clock) = session(None);
        assert!(s.pause().is_err());
        assert!(s.finish().is_err());
        s.start().unwrap();
        clock.advance_secs(7);
        s.pause().unwrap();
        let err = s.pause().unwrap_err();
        assert_eq!(
            err,
            SessionError::InvalidTransition {
                from: SessionStatus::Paused,
                action: "pause"
            }
        );
        assert!(s.start().is_err());
        assert!(s.continue_after_goal().is_err());
        assert!(s.finish_after_goal().is_err());
        assert_eq!(s.elapsed_secs(), 7);
    }

    #[test]
    fn terminal_states_reject_everything() {
        let (mut s, clock) = session(None);
        s.start().unwrap();
        clock.advance_secs(3);
        s.finish().unwrap();
        assert!(s.finish().is_err());
        assert!(s.resume().is_err());
        assert!(s.abort().is_err());
        assert!(s.interrupt().is_none());
        clock.advance_secs(100);
        assert_eq!(s.elapsed_secs(), 3);

        let (mut s, _clock) = session(None);
        s.start().unwrap();
        s.abort().unwrap();
        assert_eq!(s.status(), SessionStatus::Aborted);
        assert!(s.finish().is_err());
    }

    #[test]
    fn finish_from_paused_reports_frozen_time() {
        let (mut s, clock) = session(None);
        s.start().unwrap();
        clock.advance_secs(25);
        s.pause().unwrap();
        clock.advance_secs(300);
        assert_eq!(s.finish().unwrap().elapsed_secs(), 25);
    }

    #[test]
    fn interruption_pauses_instead_of_aborting() {
        let (mut s, clock) = session(None);
        s.start().unwrap();
        clock.advance_secs(12);
        assert!(matches!(
            s.interrupt(),
            Some(Event::SessionInterrupted { elapsed_secs: 12, .. })
        ));
        assert_eq!(s.status(), SessionStatus::Paused);
        assert!(s.interrupt().is_none());
        clock.advance_secs(60);
        s.resume().unwrap();
        clock.advance_secs(3);
        assert_eq!(s.finish().unwrap().elapsed_secs(), 15);
    }

    #[test]
    fn backwards_clock_step_never_loses_credit() {
        let (mut s, clock) = session(None);
        s.start().unwrap();
        clock.advance_secs(20);
        s.pause().unwrap();
        s.resume().unwrap();
        clock.set_ms(T0);
        s.pause().unwrap();
        assert_eq!(s.elapsed_secs(), 20);
    }

    #[test]
    fn poll_is_armed_only_while_running() {
        let (mut s, clock) = session(Some(5));
        assert!(s.poll_ticket().is_none());
        s.start().unwrap();
        let first = s.poll_ticket().unwrap();
        s.pause().unwrap();
        assert!(s.poll_ticket().is_none());
        s.resume().unwrap();
        assert_eq!(s.poll_generation(), 2);
        clock.advance_secs(5);
        assert!(s.tick_with(first).is_none());
        let current = s.poll_ticket().unwrap();
        assert!(s.tick_with(current).is_some());
        assert!(s.poll_ticket().is_none());
    }

    #[test]
    fn immersive_mode_is_released_on_every_exit() {
        let env = RecordingEnv::default();
        let log = env.log.clone();
        let clock = ManualClock::new(T0);
        let plan = SessionPlan {
            level_id: 2,
            planned_secs: 240,
            goal_target_secs: Some(1),
        };
        let mut s = SessionClock::new(plan)
            .with_clock(clock.clone())
            .with_environment(env);

        s.start().unwrap();
        assert!(s.is_immersive());
        s.interrupt();
        assert!(!s.is_immersive());
        s.resume().unwrap();
        clock.advance_secs(1);
        s.tick().unwrap();
        assert!(!s.is_immersive());
        s.continue_after_goal().unwrap();
        s.abort().unwrap();
        assert!(!s.is_immersive());

        assert_eq!(
            *log.lock().unwrap(),
            vec!["enter", "exit", "enter", "exit", "enter", "exit"]
        );
    }

    #[test]
    fn dropping_a_live_session_releases_immersive_mode() {
        let env = RecordingEnv::default();
        let log = env.log.clone();
        let plan = SessionPlan {
            level_id: 1,
            planned_secs: 120,
            goal_target_secs: None,
        };
        {
            let mut s = SessionClock::new(plan).with_environment(env);
            s.start().unwrap();
        }
        assert_eq!(*log.lock().unwrap(), vec!["enter", "exit"]);
    }

    #[test]
    fn refused_immersive_mode_does_not_block_the_session() {
        let env = RecordingEnv {
            refuse: true,
            ..RecordingEnv::default()
        };
        let (s, clock) = session(None);
        let mut s = s.with_environment(env);
        s.start().unwrap();
        assert!(!s.is_immersive());
        clock.advance_secs(2);
        assert_eq!(s.finish().unwrap().elapsed_secs(), 2);
    }

    #[test]
    fn plan_copies_goal_only_when_enabled() {
        let level = Level::get(1).unwrap();
        let mut goal = SessionGoal::for_level(level);
        assert_eq!(SessionPlan::for_level(level, Some(&goal)).goal_target_secs, None);
        goal.enabled = true;
        goal.target_minutes = 1;
        let plan = SessionPlan::for_level(level, Some(&goal));
        assert_eq!(plan.goal_target_secs, Some(60));
        assert_eq!(plan.planned_secs, 120);
    }

    #[test]
    fn snapshot_reflects_state() {
        let (mut s, clock) = session(Some(60));
        s.start().unwrap();
        clock.advance_secs(20);
        match s.snapshot() {
            Event::StateSnapshot {
                status,
                elapsed_secs,
                remaining_secs,
                goal_secs,
                goal_reached,
                ..
            } => {
                assert_eq!(status, SessionStatus::Running);
                assert_eq!(elapsed_secs, 20);
                assert_eq!(remaining_secs, 100);
                assert_eq!(goal_secs, Some(60));
                assert!(!goal_reached);
            }
            _ => panic!("Expected StateSnapshot"),
        }
    }
}
