use std::path::{Path, PathBuf};

use chrono::Utc;
use dotpractice_core::storage::transfer::export_file_name;

use super::{open_ledger, warn_if_unsaved, CliResult};

pub fn export(out: Option<PathBuf>) -> CliResult {
    let ledger = open_ledger()?;
    let dir = out.unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(export_file_name(Utc::now()));
    std::fs::write(&path, ledger.export_document()?)?;
    println!("{}", path.display());
    Ok(())
}

pub fn import(path: &Path) -> CliResult {
    let payload = std::fs::read_to_string(path)?;
    let mut ledger = open_ledger()?;
    ledger.import_document(&payload)?;
    warn_if_unsaved(&ledger);
    println!("imported {}", path.display());
    Ok(())
}
