//! Export and import of the practice document, plus focus image encoding.

use std::path::Path;

use base64::Engine as _;
use chrono::{DateTime, Utc};

use super::Store;
use crate::error::{CoreError, ImportError, ValidationError};

/// Serialize the store for export. The output is the persisted document.
pub fn export_json(store: &Store) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(store)
}

/// File name for an export taken at `at`.
pub fn export_file_name(at: DateTime<Utc>) -> String {
    format!("dot-practice-{}.json", at.format("%Y-%m-%dT%H-%M-%SZ"))
}

/// Validate and parse an import payload.
///
/// The payload must carry a numeric `totalTime` and an object `levelData`;
/// everything else falls back to defaults.
///
/// # Errors
/// Returns an [`ImportError`] describing the first problem found.
pub fn parse_import(payload: &str) -> Result<Store, ImportError> {
    let value: serde_json::Value = serde_json::from_str(payload).map_err(ImportError::NotJson)?;
    if !value.get("totalTime").is_some_and(serde_json::Value::is_number) {
        return Err(ImportError::MissingField("a numeric totalTime"));
    }
    if !value.get("levelData").is_some_and(serde_json::Value::is_object) {
        return Err(ImportError::MissingField("a levelData mapping"));
    }
    let mut store: Store = serde_json::from_value(value).map_err(ImportError::Malformed)?;
    store.normalize();
    Ok(store)
}

/// Read an image file and encode it as a data URL for the sigil level.
///
/// # Errors
/// Returns an error if the file cannot be read or is not a known image type.
pub fn image_data_url(path: &Path) -> Result<String, CoreError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => {
            return Err(ValidationError::invalid(
                "sigilImage",
                format!("unsupported image type '{ext}'"),
            )
            .into())
        }
    };
    let bytes = std::fs::read(path)?;
    Ok(encode_data_url(mime, &bytes))
}

pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{encoded}")
}
