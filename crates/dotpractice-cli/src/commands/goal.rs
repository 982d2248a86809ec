use clap::Subcommand;

use super::{open_ledger, warn_if_unsaved, CliResult};

#[derive(Subcommand)]
pub enum GoalAction {
    /// Interim checkpoint within one session
    Session {
        level: u32,
        /// Checkpoint in minutes
        #[arg(long)]
        minutes: Option<u32>,
        /// Turn the checkpoint off
        #[arg(long)]
        off: bool,
    },
    /// Cumulative practice target for a level
    Total {
        level: u32,
        /// Target in hours
        #[arg(long)]
        hours: Option<f64>,
        /// Turn the target off
        #[arg(long)]
        off: bool,
    },
}

pub fn run(action: GoalAction) -> CliResult {
    let mut ledger = open_ledger()?;
    match action {
        GoalAction::Session {
            level,
            minutes,
            off,
        } => {
            ledger.set_session_goal(level, minutes, !off)?;
            if let Some(goal) = ledger.store().goal(level) {
                if goal.enabled {
                    println!("session goal: {} min", goal.target_minutes);
                } else {
                    println!("session goal: off");
                }
            }
        }
        GoalAction::Total { level, hours, off } => {
            ledger.set_total_goal(level, hours, !off)?;
            if let Some(goal) = ledger.store().goal(level) {
                if goal.total_enabled {
                    println!("total goal: {} h", goal.total_target_hours);
                } else {
                    println!("total goal: off");
                }
            }
        }
    }
    warn_if_unsaved(&ledger);
    Ok(())
}
