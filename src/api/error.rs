//! Client-side error types and the non-2xx response decoder.
//!
//! The backend answers failures in several shapes. Each known shape gets
//! its own [`ErrorPayload`] case; anything else is `Opaque`. Whatever the
//! shape, an [`ApiError`] always displays as one human-readable line and
//! never leaks raw HTML.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::session::SessionError;

/// Longest plain-text body surfaced verbatim.
pub const MAX_PLAIN_TEXT_CHARS: usize = 200;

/// Anything that looks like markup: a doctype, comment or tag.
static MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<\s*(!doctype|!--|/?[a-z][a-z0-9]*(\s[^>]*)?/?>)").expect("valid markup regex")
});

/// One entry of a field-validation error list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub loc: Vec<String>,
    pub msg: String,
}

impl ValidationIssue {
    /// `"<msg> (<dotted location>)"`, or just the message without a location.
    pub fn describe(&self) -> String {
        if self.loc.is_empty() {
            self.msg.clone()
        } else {
            format!("{} ({})", self.msg, self.loc.join("."))
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        let msg = value.get("msg")?.as_str()?.to_string();
        let loc = value
            .get("loc")
            .and_then(Value::as_array)
            .map(|parts| {
                parts
                    .iter()
                    .map(|p| match p {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Some(Self { loc, msg })
    }
}

/// Known backend error shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorPayload {
    /// `{"detail": "..."}`
    Detail(String),
    /// `{"detail": [{"loc": [...], "msg": "..."}, ...]}`
    ValidationErrors(Vec<ValidationIssue>),
    /// `{"message": "..."}`
    Message(String),
    /// Non-JSON, non-HTML text (already truncated).
    PlainText(String),
    /// HTML, empty or unrecognised bodies.
    Opaque,
}

impl ErrorPayload {
    /// Classify a failed response body.
    pub fn decode(content_type: Option<&str>, body: &str) -> Self {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Self::Opaque;
        }

        let is_html = content_type
            .map(|ct| ct.to_ascii_lowercase().contains("html"))
            .unwrap_or(false);
        if is_html || trimmed.starts_with('<') || MARKUP.is_match(trimmed) {
            return Self::Opaque;
        }

        match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => Self::from_json(&value),
            Err(_) => Self::PlainText(truncate(trimmed, MAX_PLAIN_TEXT_CHARS)),
        }
    }

    fn from_json(value: &Value) -> Self {
        match value.get("detail") {
            Some(Value::String(detail)) => return Self::Detail(detail.clone()),
            Some(Value::Array(entries)) => {
                let issues: Vec<ValidationIssue> =
                    entries.iter().filter_map(ValidationIssue::from_value).collect();
                if !issues.is_empty() {
                    return Self::ValidationErrors(issues);
                }
            }
            _ => {}
        }
        match value {
            Value::Object(map) => match map.get("message") {
                Some(Value::String(message)) => Self::Message(message.clone()),
                _ => Self::Opaque,
            },
            Value::String(text) if !text.trim().is_empty() => {
                Self::PlainText(truncate(text.trim(), MAX_PLAIN_TEXT_CHARS))
            }
            _ => Self::Opaque,
        }
    }

    /// Human-readable detail, `None` for opaque bodies.
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Detail(s) | Self::Message(s) | Self::PlainText(s) => Some(s.clone()),
            Self::ValidationErrors(issues) => issues.first().map(ValidationIssue::describe),
            Self::Opaque => None,
        }
    }
}

/// Cut `text` to `max` characters, marking the cut with an ellipsis.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max).collect();
    cut.push('…');
    cut
}

// ═══════════════════════════════════════════════════════════
// ApiError: one non-2xx response
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", self.message())]
pub struct ApiError {
    pub status: u16,
    pub detail: Option<String>,
    pub payload: ErrorPayload,
}

impl ApiError {
    pub fn from_response(status: u16, content_type: Option<&str>, body: &str) -> Self {
        let payload = ErrorPayload::decode(content_type, body);
        Self {
            status,
            detail: payload.detail(),
            payload,
        }
    }

    /// The single line shown to the user.
    pub fn message(&self) -> String {
        match &self.detail {
            Some(detail) => detail.clone(),
            None => format!("Request failed ({})", self.status),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// ClientError: everything an API call can fail with
// ═══════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Cannot reach the prediction API at {0}")]
    Connection(String),

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("Failed to parse response: {0}")]
    ResponseParsing(String),

    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ClientError {
    /// HTTP status for API errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api(e) => Some(e.status),
            _ => None,
        }
    }

    /// A 401 means the stored token is no longer accepted.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}
