//! Offline generators for the static `drugs.json` and `metrics.json`
//! files the dashboard can load without going through the API.

pub mod drugs;
pub mod metrics;

use std::path::Path;

use serde::Serialize;

pub use drugs::{generate_drugs_json, parse_drug_csv, DrugList};
pub use metrics::{generate_metrics_json, parse_metrics_csv};

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Cannot write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV has no header row")]
    EmptyCsv,
    #[error("CSV header has no '{0}' column")]
    MissingColumn(&'static str),
}

pub(crate) fn read_csv(path: &Path) -> Result<String, AssetError> {
    std::fs::read_to_string(path).map_err(|source| AssetError::Read {
        path: path.display().to_string(),
        source,
    })
}

/// Pretty-print `value` to `path`, creating parent directories.
pub(crate) fn write_pretty_json<T: Serialize>(path: &Path, value: &T) -> Result<(), AssetError> {
    let json = serde_json::to_string_pretty(value)?;
    let write_err = |source| AssetError::Write {
        path: path.display().to_string(),
        source,
    };
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(write_err)?;
    }
    std::fs::write(path, json).map_err(write_err)
}

/// Split one CSV record into trimmed fields.
///
/// Double-quoted fields may contain commas; `""` inside quotes is a
/// literal quote. Records spanning several lines are not supported.
pub(crate) fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

/// Non-blank lines with trailing `\r` removed.
pub(crate) fn csv_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
}
