//! Plain-text renderings used by the `aicpa` binary.

use std::fmt::Write;

use super::format::{drug_analysis_line, format_risk_percent, shap_lines};
use crate::models::{GroupMetrics, Metrics, PredictionResult, METRIC_COLUMNS};

/// The result panel as text, section for section.
///
/// `medication_count` is the number of selected drugs on the submitted
/// patient record.
pub fn prediction_report(result: &PredictionResult, medication_count: usize) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "Risk Level: {}", result.risk_category);
    let _ = writeln!(out, "ADR Risk Score: {}", format_risk_percent(result.risk_score));
    let _ = writeln!(
        out,
        "Based on {medication_count} medications and current lab values"
    );

    out.push_str("\nDrug-Specific ADR Analysis\n");
    if result.top_drugs().is_empty() {
        out.push_str("  No medications selected.\n");
    } else {
        for (name, stats) in result.top_drugs() {
            let _ = writeln!(out, "  {}", drug_analysis_line(name, stats));
        }
    }

    out.push_str("\nModel Explanation (SHAP)\n");
    let shap = shap_lines(result.shap_contributors());
    if shap.is_empty() {
        out.push_str("  SHAP unavailable.\n");
    } else {
        for line in shap {
            let _ = writeln!(out, "  {line}");
        }
    }

    out.push_str("\nClinical Recommendations\n");
    for rec in result.recommendation_list() {
        let _ = writeln!(out, "  • {rec}");
    }

    if let Some(md) = result.ai_recommendations_md.as_deref().filter(|m| !m.trim().is_empty()) {
        out.push_str("\nAI Pharmacist Insights\n");
        for line in md.lines() {
            let _ = writeln!(out, "  {line}");
        }
    }

    out
}

fn metric_cell(group: &GroupMetrics, key: &str) -> String {
    group
        .metric(key)
        .map(|v| format!("{v:.3}"))
        .unwrap_or_else(|| "n/a".to_string())
}

/// Per-group metrics as an aligned text table, overall row first.
pub fn bias_audit_table(metrics: &Metrics) -> String {
    let mut rows: Vec<&GroupMetrics> = Vec::new();
    if let Some(overall) = &metrics.overall {
        rows.push(overall);
    }
    rows.extend(
        metrics
            .groups
            .iter()
            .filter(|g| metrics.overall.as_ref().map(|o| o.group != g.group).unwrap_or(true)),
    );
    if rows.is_empty() {
        return "No metrics available.\n".to_string();
    }

    let mut table: Vec<Vec<String>> = Vec::with_capacity(rows.len() + 1);
    let mut header = vec!["Group".to_string()];
    header.extend(METRIC_COLUMNS.iter().map(|(_, heading)| heading.to_string()));
    table.push(header);
    for group in rows {
        let mut row = vec![group.group.clone()];
        row.extend(METRIC_COLUMNS.iter().map(|(key, _)| metric_cell(group, key)));
        table.push(row);
    }

    let widths: Vec<usize> = (0..table[0].len())
        .map(|col| table.iter().map(|r| r[col].chars().count()).max().unwrap_or(0))
        .collect();

    let mut out = String::new();
    for row in &table {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{cell:<w$}"))
            .collect();
        out.push_str(cells.join(" | ").trim_end());
        out.push('\n');
    }
    out
}
