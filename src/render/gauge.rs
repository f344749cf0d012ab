use serde_json::{json, Value};

use crate::models::RiskCategory;

/// Red marker drawn across the gauge, in percent.
pub const GAUGE_THRESHOLD_PCT: f64 = 90.0;

/// Color band for a risk score: `< 0.3` green, `< 0.7` amber, else red.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskBand {
    Low,
    Moderate,
    High,
}

impl RiskBand {
    pub fn for_score(score: f64) -> Self {
        if score < 0.3 {
            Self::Low
        } else if score < 0.7 {
            Self::Moderate
        } else {
            Self::High
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Low => "#10b981",
            Self::Moderate => "#f59e0b",
            Self::High => "#ef4444",
        }
    }

    pub fn background(&self) -> &'static str {
        match self {
            Self::Low => "linear-gradient(135deg, #ecfdf5 0%, #d1fae5 100%)",
            Self::Moderate => "linear-gradient(135deg, #fffbeb 0%, #fef3c7 100%)",
            Self::High => "linear-gradient(135deg, #fef2f2 0%, #fee2e2 100%)",
        }
    }

    pub fn category(&self) -> RiskCategory {
        match self {
            Self::Low => RiskCategory::Low,
            Self::Moderate => RiskCategory::Moderate,
            Self::High => RiskCategory::High,
        }
    }
}

/// Score clamped into `[0, 1]`; NaN reads as 0.
fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

/// Plotly indicator figure for the radial risk gauge.
pub fn gauge_figure(score: f64) -> Value {
    let score = clamp_score(score);
    let band = RiskBand::for_score(score);
    let font = "Inter, -apple-system, sans-serif";

    json!({
        "data": [{
            "type": "indicator",
            "mode": "gauge+number",
            "value": score * 100.0,
            "number": {
                "suffix": "%",
                "font": {"size": 56, "color": "#0f172a", "family": "Space Grotesk, Inter, -apple-system, sans-serif"}
            },
            "title": {
                "text": "ADR Risk Score",
                "font": {"size": 22, "color": "#1e293b", "family": font},
                "y": 0.85
            },
            "domain": {"x": [0, 1], "y": [0, 1]},
            "gauge": {
                "axis": {
                    "range": [0, 100],
                    "tickfont": {"color": "#475569", "size": 13, "family": font},
                    "tickcolor": "#94a3b8",
                    "tickwidth": 2,
                    "ticklen": 10,
                    "showticksuffix": "last",
                    "ticksuffix": "%"
                },
                "bar": {"color": band.color(), "line": {"width": 2, "color": "#ffffff"}},
                "bgcolor": "transparent",
                "borderwidth": 0,
                "steps": [
                    {"range": [0, 30], "color": "#d1fae5", "line": {"width": 0}},
                    {"range": [30, 70], "color": "#fde68a", "line": {"width": 0}},
                    {"range": [70, 100], "color": "#fecaca", "line": {"width": 0}}
                ],
                "threshold": {
                    "line": {"color": "#dc2626", "width": 3},
                    "thickness": 0.85,
                    "value": GAUGE_THRESHOLD_PCT
                },
                "shape": "angular"
            }
        }],
        "layout": {
            "height": 320,
            "paper_bgcolor": "transparent",
            "plot_bgcolor": "transparent",
            "margin": {"t": 40, "r": 20, "l": 20, "b": 20},
            "font": {"family": font}
        }
    })
}
