use dotpractice_core::Level;

use super::{open_ledger, warn_if_unsaved, CliResult};
use crate::display;

pub fn adjust(level_id: u32, minutes: i64) -> CliResult {
    let mut ledger = open_ledger()?;
    let time = ledger.adjust_manual_time(level_id, minutes)?;
    warn_if_unsaved(&ledger);
    println!(
        "{}: {} total",
        Level::get(level_id)?.name,
        display::minutes(time)
    );
    Ok(())
}

pub fn master(level_id: u32) -> CliResult {
    let mut ledger = open_ledger()?;
    let level = Level::get(level_id)?;
    let summary = ledger.level_summary(level_id)?;
    if summary.mastered {
        println!("{} is already mastered", level.name);
        return Ok(());
    }
    if !summary.mastery_eligible {
        let reason = if level.is_max() {
            "the final level has no mastery".to_string()
        } else {
            format!(
                "requires {} of practice, {} so far",
                display::minutes(level.mastery_threshold_secs()),
                display::minutes(summary.time_secs)
            )
        };
        return Err(format!("{} cannot be mastered yet: {reason}", level.name).into());
    }
    ledger.mark_mastered(level_id)?;
    warn_if_unsaved(&ledger);
    println!("{} mastered", level.name);
    Ok(())
}
