use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "AI-CPA";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Backend used when nothing is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

pub const API_BASE_URL_ENV: &str = "AICPA_API_BASE_URL";
pub const ASSETS_BASE_URL_ENV: &str = "AICPA_ASSETS_BASE_URL";
pub const SESSION_FILE_ENV: &str = "AICPA_SESSION_FILE";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "aicpa=info,aicpa_lib=info,warn"
}

/// Get the application data directory (`~/.aicpa/`).
///
/// Falls back to the working directory when no home directory is known.
pub fn app_data_dir() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(".aicpa"),
        None => PathBuf::from(".aicpa"),
    }
}

/// Location of the persisted session (token + user).
pub fn session_file() -> PathBuf {
    match std::env::var(SESSION_FILE_ENV) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => app_data_dir().join("session.json"),
    }
}

/// Normalize a configured base URL.
///
/// Blank input resolves to [`DEFAULT_API_BASE_URL`]. A missing scheme is
/// filled with `https://`, and trailing slashes are stripped.
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return DEFAULT_API_BASE_URL.to_string();
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    with_scheme.trim_end_matches('/').to_string()
}

/// Endpoints the client talks to, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Prediction/auth/history API origin.
    pub api_base_url: String,
    /// Origin serving the generated `drugs.json` / `metrics.json`.
    pub assets_base_url: String,
}

impl ClientConfig {
    /// Both API and static assets served from the same origin.
    pub fn new(api_base_url: &str) -> Self {
        let api = normalize_base_url(api_base_url);
        Self {
            assets_base_url: api.clone(),
            api_base_url: api,
        }
    }

    pub fn with_assets_base_url(mut self, assets_base_url: &str) -> Self {
        self.assets_base_url = normalize_base_url(assets_base_url);
        self
    }

    /// Read `AICPA_API_BASE_URL` / `AICPA_ASSETS_BASE_URL`.
    pub fn from_env() -> Self {
        let api = std::env::var(API_BASE_URL_ENV).unwrap_or_default();
        let config = Self::new(&api);
        match std::env::var(ASSETS_BASE_URL_ENV) {
            Ok(assets) if !assets.trim().is_empty() => config.with_assets_base_url(&assets),
            _ => config,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_scheme_gets_https_and_trailing_slash_is_stripped() {
        assert_eq!(normalize_base_url("foo.com/"), "https://foo.com");
    }

    #[test]
    fn existing_scheme_is_kept() {
        assert_eq!(
            normalize_base_url("http://localhost:8000/"),
            "http://localhost:8000"
        );
        assert_eq!(normalize_base_url("https://api.example.org"), "https://api.example.org");
    }

    #[test]
    fn multiple_trailing_slashes_are_stripped() {
        assert_eq!(normalize_base_url("api.example.org///"), "https://api.example.org");
    }

    #[test]
    fn paths_survive_normalization() {
        assert_eq!(
            normalize_base_url("  example.org/adr/  "),
            "https://example.org/adr"
        );
    }

    #[test]
    fn blank_input_uses_default() {
        assert_eq!(normalize_base_url(""), DEFAULT_API_BASE_URL);
        assert_eq!(normalize_base_url("   "), DEFAULT_API_BASE_URL);
    }

    #[test]
    fn no_input_ever_keeps_a_trailing_slash_or_lacks_a_scheme() {
        for raw in ["a.io", "a.io/", "http://a.io/", "https://a.io//", "a.io/x/"] {
            let normalized = normalize_base_url(raw);
            assert!(normalized.contains("://"), "{normalized}");
            assert!(!normalized.ends_with('/'), "{normalized}");
        }
    }

    #[test]
    fn assets_default_to_api_origin() {
        let config = ClientConfig::new("backend.local:9000/");
        assert_eq!(config.api_base_url, "https://backend.local:9000");
        assert_eq!(config.assets_base_url, config.api_base_url);
    }

    #[test]
    fn assets_origin_can_differ() {
        let config = ClientConfig::new("http://localhost:8000")
            .with_assets_base_url("http://localhost:3000/");
        assert_eq!(config.assets_base_url, "http://localhost:3000");
    }

    #[test]
    fn app_data_dir_ends_with_app_folder() {
        assert!(app_data_dir().ends_with(".aicpa"));
    }

    #[test]
    fn app_name_is_aicpa() {
        assert_eq!(APP_NAME, "AI-CPA");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
