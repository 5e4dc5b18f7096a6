// src/config.rs
use std::sync::OnceLock;
use std::time::Duration;

/// Fallback backend endpoint when nothing is configured.
pub const DEFAULT_API_BASE_URL: &str = "https://deployment-backend-production-2db3.up.railway.app";

/// Environment variable naming the agent API base URL, read at build time and at runtime.
pub const API_URL_VAR: &str = "AGENT_API_URL";

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

static BASE_URL: OnceLock<String> = OnceLock::new();

/// Pick the base URL from the build-time value, then the runtime value, then the default.
/// Empty values are skipped and one trailing slash is stripped.
pub fn resolve_base_url(build_time: Option<&str>, runtime: Option<&str>) -> String {
    let raw = [build_time, runtime]
        .into_iter()
        .flatten()
        .find(|value| !value.is_empty())
        .unwrap_or(DEFAULT_API_BASE_URL);

    raw.strip_suffix('/').unwrap_or(raw).to_string()
}

/// Process-wide base URL, resolved on first use.
pub fn base_url_from_env() -> &'static str {
    BASE_URL.get_or_init(|| {
        let runtime = std::env::var(API_URL_VAR).ok();
        resolve_base_url(option_env!("AGENT_API_URL"), runtime.as_deref())
    })
}

/// Settings shared by both backend clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub connect_timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let base_url = match base_url.strip_suffix('/') {
            Some(trimmed) => trimmed.to_string(),
            None => base_url,
        };
        Self {
            base_url,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn from_env() -> Self {
        Self::new(base_url_from_env())
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_time_value_wins() {
        let url = resolve_base_url(Some("https://build.example"), Some("https://runtime.example"));
        assert_eq!(url, "https://build.example");
    }

    #[test]
    fn runtime_value_used_when_build_time_missing() {
        assert_eq!(resolve_base_url(None, Some("https://runtime.example/")), "https://runtime.example");
        assert_eq!(resolve_base_url(Some(""), Some("https://runtime.example")), "https://runtime.example");
    }

    #[test]
    fn falls_back_to_default() {
        assert_eq!(resolve_base_url(None, None), DEFAULT_API_BASE_URL);
        assert_eq!(resolve_base_url(Some(""), Some("")), DEFAULT_API_BASE_URL);
    }

    #[test]
    fn strips_only_one_trailing_slash() {
        assert_eq!(resolve_base_url(Some("http://localhost:8000//"), None), "http://localhost:8000/");
    }

    #[test]
    fn env_resolution_is_stable() {
        let first = base_url_from_env();
        let second = base_url_from_env();
        assert_eq!(first, second);
        assert!(std::ptr::eq(first, second));
        assert_eq!(ClientConfig::from_env(), ClientConfig::from_env());
    }

    #[test]
    fn endpoint_joins_path() {
        let config = ClientConfig::new("http://localhost:8000/");
        assert_eq!(config.endpoint("/conversations"), "http://localhost:8000/conversations");
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
    }

    #[test]
    fn connect_timeout_override() {
        let config = ClientConfig::new("http://localhost:8000")
            .with_connect_timeout(Duration::from_millis(250));
        assert_eq!(config.connect_timeout, Duration::from_millis(250));
        assert_eq!(config.base_url, "http://localhost:8000");
    }
}
