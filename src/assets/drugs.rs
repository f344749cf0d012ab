use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::{csv_lines, read_csv, split_csv_line, write_pretty_json, AssetError};

/// Contents of `drugs.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugList {
    pub drugs: Vec<String>,
    pub total: usize,
    #[serde(default)]
    pub generated_at: String,
}

/// Collect the unique, sorted drug names from an ADR summary CSV.
///
/// The name is the first column; the header row is skipped and blank
/// names are ignored.
pub fn parse_drug_csv(text: &str, generated_at: DateTime<Utc>) -> DrugList {
    let drugs: BTreeSet<String> = csv_lines(text)
        .skip(1)
        .filter_map(|line| split_csv_line(line).into_iter().next())
        .filter(|name| !name.is_empty())
        .collect();

    let drugs: Vec<String> = drugs.into_iter().collect();
    DrugList {
        total: drugs.len(),
        drugs,
        generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

/// Read `csv_path`, write `drugs.json` to `json_path`.
pub fn generate_drugs_json(csv_path: &Path, json_path: &Path) -> Result<DrugList, AssetError> {
    let text = read_csv(csv_path)?;
    let list = parse_drug_csv(&text, Utc::now());
    write_pretty_json(json_path, &list)?;
    tracing::info!(total = list.total, output = %json_path.display(), "Generated drug list");
    Ok(list)
}
