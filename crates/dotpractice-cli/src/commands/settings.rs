use std::path::PathBuf;

use clap::Subcommand;
use dotpractice_core::storage::transfer;
use dotpractice_core::Theme;

use super::{open_ledger, warn_if_unsaved, CliResult};

#[derive(Subcommand)]
pub enum SigilAction {
    /// Store an image file as the sigil
    Set { path: PathBuf },
    /// Remove the stored sigil
    Clear,
}

#[derive(Subcommand)]
pub enum ShapeAction {
    /// Print the custom form settings
    Show,
    /// Change one setting (shape, color, size, strokeWidth, animation, animationSecs)
    Set { key: String, value: String },
}

pub fn sigil(action: SigilAction) -> CliResult {
    let mut ledger = open_ledger()?;
    match action {
        SigilAction::Set { path } => {
            let data_url = transfer::image_data_url(&path)?;
            ledger.set_sigil_image(data_url);
            println!("sigil stored");
        }
        SigilAction::Clear => {
            ledger.clear_sigil_image();
            println!("sigil cleared");
        }
    }
    warn_if_unsaved(&ledger);
    Ok(())
}

pub fn theme(name: &str) -> CliResult {
    let theme: Theme = name.parse()?;
    let mut ledger = open_ledger()?;
    ledger.set_theme(theme);
    warn_if_unsaved(&ledger);
    println!("theme: {name}");
    Ok(())
}

pub fn shape(action: ShapeAction) -> CliResult {
    let mut ledger = open_ledger()?;
    match action {
        ShapeAction::Show => {
            let json = serde_json::to_string_pretty(&ledger.store().custom_shape)?;
            println!("{json}");
        }
        ShapeAction::Set { key, value } => {
            let updated = ledger.store().custom_shape.with_field(&key, &value)?;
            ledger.set_custom_shape(updated)?;
            warn_if_unsaved(&ledger);
            println!("ok");
        }
    }
    Ok(())
}
