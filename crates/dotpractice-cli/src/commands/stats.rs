use dotpractice_core::Level;

use super::{open_ledger, CliResult};
use crate::display;

pub fn summary(json: bool) -> CliResult {
    let ledger = open_ledger()?;

    if json {
        let value = serde_json::json!({
            "totalTime": ledger.total_time_secs(),
            "lastSession": ledger.last_session(),
            "levels": ledger.summaries(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Total practice: {}", display::hours_minutes(ledger.total_time_secs()));
    match ledger.last_session() {
        Some(last) => println!(
            "Last session: {} {} ({})",
            last.level_name,
            display::log_date(last.date),
            display::clock(last.duration)
        ),
        None => println!("Last session: none"),
    }
    println!();
    for summary in ledger.summaries() {
        let level = Level::get(summary.level_id)?;
        let mut line = format!(
            "{:>4}  {:<16} Sessions: {} | Total: {}",
            display::roman(level.id),
            level.name,
            summary.sessions,
            display::minutes(summary.time_secs)
        );
        if summary.mastered {
            line.push_str(" | mastered");
        }
        println!("{line}");
    }
    Ok(())
}

pub fn log(limit: Option<usize>, json: bool) -> CliResult {
    let ledger = open_ledger()?;
    let mut entries = ledger.session_log();
    if let Some(limit) = limit {
        entries.truncate(limit);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No sessions yet.");
        return Ok(());
    }
    for entry in entries {
        println!(
            "{:<16} {}  {:>6}",
            entry.level_name,
            display::log_date(entry.date),
            display::clock(entry.duration)
        );
    }
    Ok(())
}
