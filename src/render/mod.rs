//! Presentation helpers: risk gauge, markdown subset, number formatting
//! and plain-text reports. Everything here is a pure function of its input.

pub mod format;
pub mod gauge;
pub mod markdown;
pub mod report;

pub use format::*;
pub use gauge::{gauge_figure, RiskBand};
pub use markdown::markdown_to_html;
pub use report::{bias_audit_table, prediction_report};
