//! Process-wide testing configuration and the credentials provider seam.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Default pagination safety cap.
pub const DEFAULT_MAX_PAGES: usize = 1000;

/// Process-wide configuration for one replay run.
///
/// Read-only after initialization. When `endpoint` is set it takes
/// precedence over `region` as the client's host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestingConfig {
    /// Absolute host override. Wins over `region` when non-empty.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Region identifier installed on clients when no endpoint override is set.
    pub region: String,

    /// Install the shared retry policy into each request's metadata.
    #[serde(default)]
    pub with_retry: bool,

    /// Pagination safety cap.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

const fn default_max_pages() -> usize {
    DEFAULT_MAX_PAGES
}

impl TestingConfig {
    /// Config targeting a region, no endpoint override, retries off.
    pub fn for_region(region: impl Into<String>) -> Self {
        Self {
            endpoint: None,
            region: region.into(),
            with_retry: false,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// Config targeting an explicit endpoint, retries off.
    pub fn for_endpoint(endpoint: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            region: region.into(),
            with_retry: false,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// Enable retry injection.
    #[must_use]
    pub fn with_retry(mut self, with_retry: bool) -> Self {
        self.with_retry = with_retry;
        self
    }

    /// Override the pagination safety cap.
    #[must_use]
    pub const fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Read configuration from `SRT_REGION`, `SRT_ENDPOINT`, `SRT_WITH_RETRY`
    /// and `SRT_MAX_PAGES`. Unset variables fall back to defaults; the region
    /// falls back to `us-phoenix-1`.
    #[must_use]
    pub fn from_env() -> Self {
        let region =
            std::env::var("SRT_REGION").unwrap_or_else(|_| String::from("us-phoenix-1"));
        let endpoint = std::env::var("SRT_ENDPOINT").ok().filter(|e| !e.is_empty());
        let with_retry = std::env::var("SRT_WITH_RETRY")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let max_pages = std::env::var("SRT_MAX_PAGES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_PAGES);
        Self {
            endpoint,
            region,
            with_retry,
            max_pages,
        }
    }

    /// The host a client builder should install: the endpoint override if
    /// present, otherwise `None` (install the region instead).
    #[must_use]
    pub fn endpoint_override(&self) -> Option<&str> {
        self.endpoint.as_deref().filter(|e| !e.is_empty())
    }
}

/// Source of client credentials and the default region.
///
/// Client builders receive this alongside the [`TestingConfig`]; the harness
/// treats it as opaque.
pub trait ConfigProvider: Send + Sync {
    /// Region to use when the testing config carries none.
    fn default_region(&self) -> &str;

    /// Keyed credential lookup (tenancy, user, fingerprint, ...).
    fn credential(&self, name: &str) -> Option<&str>;
}

/// Provider backed by a fixed credential map.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    region: String,
    credentials: HashMap<String, String>,
}

impl StaticProvider {
    /// Provider with a default region and no credentials.
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            credentials: HashMap::new(),
        }
    }

    /// Add a named credential.
    #[must_use]
    pub fn with_credential(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.credentials.insert(name.into(), value.into());
        self
    }
}

impl ConfigProvider for StaticProvider {
    fn default_region(&self) -> &str {
        &self.region
    }

    fn credential(&self, name: &str) -> Option<&str> {
        self.credentials.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_wins_over_region() {
        let cfg = TestingConfig::for_endpoint("https://replay.local:8443", "us-phoenix-1");
        assert_eq!(cfg.endpoint_override(), Some("https://replay.local:8443"));
    }

    #[test]
    fn empty_endpoint_is_no_override() {
        let mut cfg = TestingConfig::for_region("us-ashburn-1");
        cfg.endpoint = Some(String::new());
        assert_eq!(cfg.endpoint_override(), None);
    }

    #[test]
    fn defaults() {
        let cfg = TestingConfig::for_region("us-phoenix-1");
        assert!(!cfg.with_retry);
        assert_eq!(cfg.max_pages, DEFAULT_MAX_PAGES);
    }

    #[test]
    fn static_provider_lookup() {
        let p = StaticProvider::new("us-phoenix-1").with_credential("tenancy", "ocid1.tenancy.test");
        assert_eq!(p.credential("tenancy"), Some("ocid1.tenancy.test"));
        assert_eq!(p.credential("user"), None);
    }
}
