//! Number and line formatting shared by the dashboard views and the CLI.

use chrono::{DateTime, NaiveDateTime};

use crate::models::{DrugStats, FeatureImportance, HistoryRecord, RiskCategory, ShapContribution};

/// SHAP rows shown under a prediction.
pub const SHAP_DISPLAY_LIMIT: usize = 10;
/// Admin records shown in the list view.
pub const ADMIN_LIST_LIMIT: usize = 25;

/// `lab_creatinine` → `Lab Creatinine`.
///
/// Underscores become spaces and the first character after every
/// non-word boundary is upper-cased. The rest of each word is untouched.
pub fn prettify_feature_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut at_boundary = true;
    for c in name.chars() {
        let c = if c == '_' { ' ' } else { c };
        if at_boundary && c.is_alphanumeric() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_boundary = !c.is_alphanumeric();
    }
    out
}

/// Risk score as a percentage. Tiny scores keep four decimals so they
/// never read as a flat `0.0%`.
pub fn format_risk_percent(score: f64) -> String {
    let pct = score * 100.0;
    if pct < 0.1 {
        format!("{pct:.4}%")
    } else {
        format!("{pct:.1}%")
    }
}

pub fn format_shap_value(value: f64) -> String {
    format!("{value:.4}")
}

/// `feature: 0.3125` lines for the first [`SHAP_DISPLAY_LIMIT`] contributors.
pub fn shap_lines(contributors: &[ShapContribution]) -> Vec<String> {
    contributors
        .iter()
        .take(SHAP_DISPLAY_LIMIT)
        .map(|c| format!("{}: {}", c.feature, format_shap_value(c.shap_value)))
        .collect()
}

pub fn drug_analysis_line(name: &str, stats: &DrugStats) -> String {
    let mut line = format!(
        "{name} — ADR: {:.3}% | Severe: {:.2}%",
        stats.adr_rate * 100.0,
        stats.severe_rate * 100.0
    );
    if let Some(count) = stats.count {
        line.push_str(&format!(" | Count: {count}"));
    }
    line
}

/// Mean arterial pressure as displayed next to the BP inputs.
pub fn format_map(map: f64) -> String {
    format!("{map:.1}")
}

/// Backend timestamps come either zoned (RFC 3339) or naive.
pub fn format_timestamp(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    raw.to_string()
}

pub fn history_line(record: &HistoryRecord) -> String {
    format!(
        "{} — {} Risk ({:.1}%)",
        format_timestamp(&record.created_at),
        record.risk_category,
        record.risk_score * 100.0
    )
}

/// One line per record, capped at [`ADMIN_LIST_LIMIT`].
pub fn admin_lines(records: &[HistoryRecord]) -> Vec<String> {
    records
        .iter()
        .take(ADMIN_LIST_LIMIT)
        .map(|r| {
            let user = r
                .user_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "?".to_string());
            format!(
                "#{} — {} ({:.1}%) — user {user}",
                r.id,
                r.risk_category,
                r.risk_score * 100.0
            )
        })
        .collect()
}

pub fn feature_importance_lines(features: &[FeatureImportance]) -> Vec<String> {
    features
        .iter()
        .map(|f| format!("{}: {:.4}", prettify_feature_name(&f.feature), f.importance))
        .collect()
}

/// Left border color of the risk summary box.
pub fn category_accent(category: RiskCategory) -> &'static str {
    match category {
        RiskCategory::High => "#dc3545",
        RiskCategory::Moderate => "#fd7e14",
        RiskCategory::Low => "#28a745",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: i64, score: f64, user_id: Option<i64>) -> HistoryRecord {
        let result: crate::models::PredictionResult =
            serde_json::from_str(crate::testing::fixtures::HIGH_RISK_RESULT).unwrap();
        HistoryRecord {
            id,
            patient_name: None,
            risk_score: score,
            risk_category: RiskCategory::High,
            created_at: "2026-03-04T09:15:00Z".into(),
            patient_data: Default::default(),
            prediction_result: result,
            clinical_recommendations: None,
            user_id,
        }
    }

    #[test]
    fn prettify_names() {
        assert_eq!(prettify_feature_name("lab_creatinine"), "Lab Creatinine");
        assert_eq!(prettify_feature_name("vital_spo2"), "Vital Spo2");
        assert_eq!(prettify_feature_name("on_dialysis"), "On Dialysis");
        assert_eq!(prettify_feature_name("eGFR"), "EGFR");
        assert_eq!(prettify_feature_name("drug_cisplatin_x2"), "Drug Cisplatin X2");
        assert_eq!(prettify_feature_name(""), "");
    }

    #[test]
    fn risk_percent_precision_switch() {
        assert_eq!(format_risk_percent(0.87), "87.0%");
        assert_eq!(format_risk_percent(0.002), "0.2%");
        assert_eq!(format_risk_percent(0.0005), "0.0500%");
        assert_eq!(format_risk_percent(0.0), "0.0000%");
    }

    #[test]
    fn shap_lines_cap_at_ten() {
        let many: Vec<ShapContribution> = (0..15)
            .map(|i| ShapContribution {
                feature: format!("f{i}"),
                shap_value: i as f64 / 100.0,
            })
            .collect();
        let lines = shap_lines(&many);
        assert_eq!(lines.len(), SHAP_DISPLAY_LIMIT);
        assert_eq!(lines[0], "f0: 0.0000");
        assert_eq!(lines[9], "f9: 0.0900");
    }

    #[test]
    fn drug_line_with_and_without_count() {
        let stats: DrugStats =
            serde_json::from_value(json!({"adr_rate": 0.1234, "severe_rate": 0.0456, "count": 311})).unwrap();
        assert_eq!(
            drug_analysis_line("Cisplatin", &stats),
            "Cisplatin — ADR: 12.340% | Severe: 4.56% | Count: 311"
        );
        let bare: DrugStats =
            serde_json::from_value(json!({"adr_rate": 0.5, "severe_rate": 0.25})).unwrap();
        assert_eq!(drug_analysis_line("X", &bare), "X — ADR: 50.000% | Severe: 25.00%");
    }

    #[test]
    fn map_has_one_decimal() {
        assert_eq!(format_map(93.33333), "93.3");
    }

    #[test]
    fn timestamps() {
        assert_eq!(format_timestamp("2026-03-04T09:15:00Z"), "2026-03-04 09:15");
        assert_eq!(format_timestamp("2026-03-04T09:15:42.123456"), "2026-03-04 09:15");
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }

    #[test]
    fn history_and_admin_lines() {
        let r = record(12, 0.8766, Some(7));
        assert_eq!(history_line(&r), "2026-03-04 09:15 — High Risk (87.7%)");
        assert_eq!(admin_lines(&[r])[0], "#12 — High (87.7%) — user 7");
        assert_eq!(admin_lines(&[record(1, 0.5, None)])[0], "#1 — High (50.0%) — user ?");
    }

    #[test]
    fn admin_list_is_capped() {
        let records: Vec<_> = (0..40).map(|i| record(i, 0.5, Some(1))).collect();
        assert_eq!(admin_lines(&records).len(), ADMIN_LIST_LIMIT);
    }

    #[test]
    fn feature_importance_is_prettified() {
        let lines = feature_importance_lines(&[FeatureImportance {
            feature: "lab_egfr".into(),
            importance: 0.21,
        }]);
        assert_eq!(lines, vec!["Lab Egfr: 0.2100"]);
    }

    #[test]
    fn accents() {
        assert_eq!(category_accent(RiskCategory::High), "#dc3545");
        assert_eq!(category_accent(RiskCategory::Low), "#28a745");
    }
}
