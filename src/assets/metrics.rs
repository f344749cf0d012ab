use std::path::Path;

use serde_json::Value;

use super::{csv_lines, read_csv, split_csv_line, write_pretty_json, AssetError};
use crate::models::{GroupMetrics, Metrics};

const GROUP_COLUMN: &str = "Group";
const OVERALL_GROUP: &str = "Overall";

/// Display name for a raw group label from the evaluation CSV.
pub fn display_group_name(raw: &str) -> String {
    match raw {
        "Sex: 1" => "Male".to_string(),
        "Sex: 2" => "Female".to_string(),
        other => other.to_string(),
    }
}

/// Convert the evaluation-metrics CSV into [`Metrics`].
///
/// Every row becomes a group (the `Overall` row included); `overall` is
/// that row when present. Numeric cells parse as floats, other cells of
/// unknown columns are kept as strings.
pub fn parse_metrics_csv(text: &str) -> Result<Metrics, AssetError> {
    let mut lines = csv_lines(text);
    let headers = split_csv_line(lines.next().ok_or(AssetError::EmptyCsv)?);
    if !headers.iter().any(|h| h == GROUP_COLUMN) {
        return Err(AssetError::MissingColumn(GROUP_COLUMN));
    }

    let mut groups = Vec::new();
    for line in lines {
        let cells = split_csv_line(line);
        let mut row = GroupMetrics::default();
        for (i, header) in headers.iter().enumerate() {
            let cell = cells.get(i).map(String::as_str).unwrap_or_default();
            if header == GROUP_COLUMN {
                row.group = display_group_name(cell);
                continue;
            }
            let number = cell.parse::<f64>().ok().filter(|v| v.is_finite());
            if !row.set_metric(header, number) && !cell.is_empty() {
                let value = match number {
                    Some(n) => Value::from(n),
                    None => Value::String(cell.to_string()),
                };
                row.extra.insert(header.clone(), value);
            }
        }
        groups.push(row);
    }

    let overall = groups.iter().find(|g| g.group == OVERALL_GROUP).cloned();
    Ok(Metrics { overall, groups })
}

/// Read `csv_path`, write `metrics.json` to `json_path`.
pub fn generate_metrics_json(csv_path: &Path, json_path: &Path) -> Result<Metrics, AssetError> {
    let text = read_csv(csv_path)?;
    let metrics = parse_metrics_csv(&text)?;
    write_pretty_json(json_path, &metrics)?;
    tracing::info!(
        groups = metrics.groups.len(),
        output = %json_path.display(),
        "Generated metrics"
    );
    Ok(metrics)
}
