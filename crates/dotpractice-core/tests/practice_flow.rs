//! End-to-end flows through the session clock and the ledger.

use dotpractice_core::storage::{Database, MemoryBackend, Store};
use dotpractice_core::timer::{ManualClock, SessionClock, SessionStatus};
use dotpractice_core::{Event, GoalChoice, Ledger};

const T0: u64 = 1_700_000_000_000;

#[test]
fn paused_time_is_not_recorded() {
    let clock = ManualClock::new(T0);
    let mut ledger = Ledger::load(MemoryBackend::new()).with_clock(clock.clone());

    let plan = ledger.prepare_session(1, GoalChoice::Off).unwrap();
    assert_eq!(plan.planned_secs, 120);
    let mut session = SessionClock::new(plan).with_clock(clock.clone());
    session.start().unwrap();
    clock.advance_secs(30);
    session.pause().unwrap();
    clock.advance_secs(500);
    session.resume().unwrap();
    clock.advance_secs(10);
    let completed = session.finish().unwrap();

    assert_eq!(ledger.reconcile(completed).unwrap(), 40);
    assert_eq!(ledger.total_time_secs(), 40);
}

#[test]
fn goal_checkpoint_then_continue() {
    let clock = ManualClock::new(T0);
    let mut ledger = Ledger::load(MemoryBackend::new()).with_clock(clock.clone());
    ledger.set_session_goal(2, Some(1), true).unwrap();

    let plan = ledger.prepare_session(2, GoalChoice::Configured).unwrap();
    let mut session = SessionClock::new(plan).with_clock(clock.clone());
    session.start().unwrap();

    let mut goal_events = 0;
    for _ in 0..80 {
        clock.advance_secs(1);
        if let Some(Event::GoalReached { elapsed_secs, .. }) = session.tick() {
            goal_events += 1;
            assert_eq!(elapsed_secs, 60);
            assert_eq!(session.status(), SessionStatus::GoalReached);
            session.continue_after_goal().unwrap();
        }
    }
    assert_eq!(goal_events, 1);

    let completed = session.finish().unwrap();
    assert_eq!(completed.elapsed_secs(), 80);
    ledger.reconcile(completed).unwrap();
    assert_eq!(ledger.store().record(2).unwrap().history[0].duration, 80);
}

#[test]
fn aborted_session_leaves_no_trace() {
    let clock = ManualClock::new(T0);
    let ledger = Ledger::load(MemoryBackend::new()).with_clock(clock.clone());
    let plan = ledger.prepare_session(3, GoalChoice::Off).unwrap();
    let mut session = SessionClock::new(plan).with_clock(clock.clone());
    session.start().unwrap();
    clock.advance_secs(200);
    session.abort().unwrap();

    assert_eq!(ledger.store(), &Store::default());
    // Nothing to reconcile: finish is rejected after abort.
    assert!(session.finish().is_err());
    assert_eq!(ledger.session_log().len(), 0);
}

#[test]
fn progress_survives_reopening_the_database() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("dotpractice.db");
    {
        let mut ledger = Ledger::load(Database::open_at(&path).unwrap());
        ledger.record_completed_session(1, 200).unwrap();
        ledger.record_completed_session(1, 160).unwrap();
        assert!(ledger.is_mastery_eligible(1));
        ledger.mark_mastered(1).unwrap();
    }
    let ledger = Ledger::load(Database::open_at(&path).unwrap());
    let record = ledger.store().record(1).unwrap();
    assert_eq!(record.time, 360);
    assert!(record.mastered);
    assert_eq!(record.history.len(), 2);
    assert_eq!(ledger.total_time_secs(), 360);
}
