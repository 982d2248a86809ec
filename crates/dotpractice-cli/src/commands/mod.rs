pub mod config;
pub mod goal;
pub mod levels;
pub mod practice;
pub mod progress;
pub mod settings;
pub mod stats;
pub mod transfer;

use dotpractice_core::{Database, Ledger};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Open the ledger over the on-disk database.
pub fn open_ledger() -> Result<Ledger, Box<dyn std::error::Error>> {
    Ok(Ledger::load(Database::open()?))
}

/// Report a failed write without failing the command; the change is kept
/// in memory only for this run.
pub fn warn_if_unsaved(ledger: &Ledger) {
    if let Some(e) = ledger.last_persist_error() {
        eprintln!("warning: change not saved: {e}");
    }
}
