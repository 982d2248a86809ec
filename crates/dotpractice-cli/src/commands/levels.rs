use dotpractice_core::{Level, LevelKind, LevelSummary};

use super::{open_ledger, CliResult};
use crate::display;

fn progress_line(summary: &LevelSummary) -> String {
    let mut line = format!(
        "Sessions: {} | Total: {}",
        summary.sessions,
        display::minutes(summary.time_secs)
    );
    if let Some(progress) = summary.total_goal_progress {
        line.push_str(&format!(" | Goal: {}", display::percent(progress)));
    }
    if summary.mastered {
        line.push_str(" | mastered");
    } else if summary.mastery_eligible {
        line.push_str(" | mastery available");
    }
    line
}

pub fn list(json: bool) -> CliResult {
    let ledger = open_ledger()?;
    let summaries = ledger.summaries();

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    for summary in &summaries {
        let level = Level::get(summary.level_id)?;
        println!(
            "{:>4}  {:<16} {:>3} min   {}",
            display::roman(level.id),
            level.name,
            level.base_minutes(),
            progress_line(summary)
        );
    }
    Ok(())
}

pub fn show(level_id: u32) -> CliResult {
    let ledger = open_ledger()?;
    let level = Level::get(level_id)?;
    let summary = ledger.level_summary(level_id)?;

    println!("Level {}: {}", display::roman(level.id), level.name);
    println!("Duration: {} min", level.base_minutes());
    match level.kind {
        LevelKind::Form(shape) => println!("Form: {}", shape.label()),
        LevelKind::Sigil => {
            let image = if ledger.store().sigil_image.is_some() {
                "uploaded"
            } else {
                "missing (dotpractice sigil set <path>)"
            };
            println!("Form: sigil image, {image}");
        }
        LevelKind::Custom => {
            let shape = &ledger.store().custom_shape;
            println!(
                "Form: {} {}, {:?} every {}s",
                shape.color,
                shape.shape.label(),
                shape.animation,
                shape.animation_secs
            );
        }
    }
    println!();
    for (i, step) in level.steps.iter().enumerate() {
        println!("  {}. {step}", i + 1);
    }
    if let Some(extra) = level.extra {
        println!();
        println!("  {extra}");
    }
    println!();
    if let Some(goal) = ledger.store().goal(level_id) {
        if goal.enabled {
            println!("Interim goal: {} min", goal.target_minutes);
        }
        if goal.total_enabled {
            println!("Total goal: {} h", goal.total_target_hours);
        }
    }
    println!("{}", progress_line(&summary));
    Ok(())
}
