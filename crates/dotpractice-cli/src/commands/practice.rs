//! Interactive practice session.
//!
//! The clock is driven from three sources: a poll timer that lets the
//! interim goal fire, command lines on stdin, and Ctrl-C, which is treated
//! as losing immersive mode.

use std::io::{IsTerminal, Write};
use std::time::Duration;

use clap::Args;
use dotpractice_core::{
    CompletedSession, Config, Event, GoalChoice, Level, SessionClock, SessionError, SessionStatus,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

use super::{open_ledger, warn_if_unsaved, CliResult};
use crate::display;
use crate::terminal::TerminalEnvironment;

#[derive(Args)]
pub struct PracticeArgs {
    /// Level number
    pub level: u32,
    /// Interim goal for this session only
    #[arg(long, conflicts_with = "no_goal")]
    pub goal_minutes: Option<u32>,
    /// Practice without an interim goal
    #[arg(long)]
    pub no_goal: bool,
    /// Print session events as JSON lines
    #[arg(long)]
    pub json: bool,
}

impl PracticeArgs {
    fn goal_choice(&self) -> GoalChoice {
        match (self.goal_minutes, self.no_goal) {
            (_, true) => GoalChoice::Off,
            (Some(minutes), false) => GoalChoice::Minutes(minutes),
            (None, false) => GoalChoice::Configured,
        }
    }
}

enum Step {
    Continue,
    Finished(CompletedSession),
    Aborted,
}

struct Output {
    json: bool,
    countdown: bool,
    level_name: &'static str,
    live: bool,
    shown_secs: Option<u64>,
}

impl Output {
    fn event(&mut self, event: &Event) {
        self.clear_progress();
        if self.json {
            match serde_json::to_string(event) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::error!("failed to encode event: {e}"),
            }
            return;
        }
        match event {
            Event::SessionStarted {
                planned_secs,
                goal_secs,
                ..
            } => {
                println!("{}: {}", self.level_name, display::clock(*planned_secs));
                if let Some(goal) = goal_secs {
                    println!("Goal at {}", display::clock(*goal));
                }
                println!("[p]ause [f]inish [a]bort");
            }
            Event::SessionPaused { elapsed_secs, .. } => {
                println!("Paused at {}. [r]esume [f]inish [a]bort", display::clock(*elapsed_secs));
            }
            Event::SessionInterrupted { elapsed_secs, .. } => {
                println!(
                    "Interrupted at {}. Session paused. [r]esume [f]inish [a]bort",
                    display::clock(*elapsed_secs)
                );
            }
            Event::SessionResumed { elapsed_secs, .. } => {
                println!("Resumed at {}", display::clock(*elapsed_secs));
            }
            Event::GoalReached { elapsed_secs, .. } => {
                println!(
                    "Goal reached at {}. [c]ontinue [f]inish [a]bort",
                    display::clock(*elapsed_secs)
                );
            }
            Event::SessionContinued { elapsed_secs, .. } => {
                println!("Continuing from {}", display::clock(*elapsed_secs));
            }
            Event::SessionFinished { elapsed_secs, .. } => {
                println!("Finished at {}", display::clock(*elapsed_secs));
            }
            Event::SessionAborted { .. } => {
                println!("Session aborted. Nothing recorded.");
            }
            Event::StateSnapshot {
                status,
                elapsed_secs,
                remaining_secs,
                ..
            } => {
                println!(
                    "{status}: {} elapsed, {} remaining",
                    display::clock(*elapsed_secs),
                    display::clock(*remaining_secs)
                );
            }
        }
    }

    fn rejected(&mut self, err: &SessionError) {
        self.clear_progress();
        eprintln!("{err}");
    }

    fn help(&mut self) {
        self.clear_progress();
        eprintln!("commands: p pause, r resume, c continue, f finish, a abort, s status");
    }

    /// Redraw the running time once per whole second.
    fn progress(&mut self, session: &SessionClock) {
        if self.json || !self.live {
            return;
        }
        let elapsed = session.elapsed_secs();
        if self.shown_secs == Some(elapsed) {
            return;
        }
        self.shown_secs = Some(elapsed);
        let remaining = session.remaining_secs();
        let text = if self.countdown && remaining > 0 {
            format!("{} remaining", display::clock(remaining))
        } else {
            format!("{} elapsed", display::clock(elapsed))
        };
        let mut err = std::io::stderr();
        let _ = write!(err, "\r\x1b[K{text}");
        let _ = err.flush();
    }

    fn clear_progress(&mut self) {
        if self.shown_secs.take().is_some() {
            let mut err = std::io::stderr();
            let _ = write!(err, "\r\x1b[K");
            let _ = err.flush();
        }
    }
}

/// Finish whatever is live: from the goal screen the time frozen at the goal
/// is reported, otherwise the running or paused time.
fn finish_live(session: &mut SessionClock) -> Result<CompletedSession, SessionError> {
    if session.status() == SessionStatus::GoalReached {
        session.finish_after_goal()
    } else {
        session.finish()
    }
}

fn apply(session: &mut SessionClock, input: &str, out: &mut Output) -> Step {
    let result = match input {
        "" => return Step::Continue,
        "p" | "pause" => session.pause().map(|e| out.event(&e)),
        "r" | "resume" => session.resume().map(|e| out.event(&e)),
        "c" | "continue" => session.continue_after_goal().map(|e| out.event(&e)),
        "s" | "status" => {
            out.event(&session.snapshot());
            Ok(())
        }
        "f" | "finish" => match finish_live(session) {
            Ok(completed) => return Step::Finished(completed),
            Err(e) => Err(e),
        },
        "a" | "abort" => match session.abort() {
            Ok(event) => {
                out.event(&event);
                return Step::Aborted;
            }
            Err(e) => Err(e),
        },
        _ => {
            out.help();
            Ok(())
        }
    };
    if let Err(e) = result {
        out.rejected(&e);
    }
    Step::Continue
}

async fn drive(
    session: &mut SessionClock,
    poll_interval: Duration,
    out: &mut Output,
) -> Result<Option<CompletedSession>, Box<dyn std::error::Error>> {
    out.event(&session.start()?);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Some(event) = session.tick() {
                    out.event(&event);
                }
                if session.status() == SessionStatus::Running {
                    out.progress(session);
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    // Input closed: keep what was practiced.
                    if let Some(event) = session.interrupt() {
                        out.event(&event);
                    }
                    return Ok(Some(finish_live(session)?));
                };
                match apply(session, line.trim(), out) {
                    Step::Continue => {}
                    Step::Finished(completed) => return Ok(Some(completed)),
                    Step::Aborted => return Ok(None),
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                if let Some(event) = session.interrupt() {
                    out.event(&event);
                }
            }
        }
    }
}

pub fn run(args: PracticeArgs) -> CliResult {
    let config = Config::load_or_default();
    let mut ledger = open_ledger()?;
    let level = Level::get(args.level)?;
    let plan = ledger.prepare_session(args.level, args.goal_choice())?;

    let mut session = SessionClock::new(plan)
        .with_environment(TerminalEnvironment::new(config.session.immersive));
    let mut out = Output {
        json: args.json,
        countdown: config.session.countdown,
        level_name: level.name,
        live: std::io::stderr().is_terminal(),
        shown_secs: None,
    };
    let poll_interval = Duration::from_millis(config.session.poll_interval_ms.max(1));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let outcome = runtime.block_on(drive(&mut session, poll_interval, &mut out));
    // A pending stdin read cannot be cancelled; do not wait for it.
    runtime.shutdown_background();

    let Some(completed) = outcome? else {
        return Ok(());
    };
    out.event(&completed.to_event());
    let elapsed = completed.elapsed_secs();
    let level_time = ledger.reconcile(completed)?;
    warn_if_unsaved(&ledger);

    let summary = ledger.level_summary(level.id)?;
    if args.json {
        println!("{}", serde_json::to_string(&summary)?);
        return Ok(());
    }
    println!();
    println!("Session: {}", display::clock(elapsed));
    println!("{} total: {}", level.name, display::minutes(level_time));
    if let Some(progress) = summary.total_goal_progress {
        println!("Total goal: {}", display::percent(progress));
    }
    if summary.mastery_eligible {
        println!("Mastery available: dotpractice master {}", level.id);
    }
    Ok(())
}
