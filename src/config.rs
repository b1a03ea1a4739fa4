use crate::constants::{network, search, session};
use crate::errors::ToolError;
use std::fmt;
use url::Url;

pub const ENV_URL: &str = "GEONETWORK_URL";
pub const ENV_USERNAME: &str = "GEONETWORK_USERNAME";
pub const ENV_PASSWORD: &str = "GEONETWORK_PASSWORD";
pub const ENV_SIGNIN_URL: &str = "GEONETWORK_SIGNIN_URL";
pub const ENV_MAX_SEARCH_SIZE: &str = "GEONETWORK_MAX_SEARCH_SIZE";
pub const ENV_TIMEOUT_MS: &str = "GEONETWORK_TIMEOUT_MS";

#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.is_empty()
    }
}

// Never print the password, even at debug level.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    api_base: String,
    signin_url: String,
    credentials: Credentials,
    max_search_size: u64,
    timeout_ms: u64,
}

impl GatewayConfig {
    pub fn new(api_base: &str) -> Result<Self, ToolError> {
        let api_base = normalize_base_url(Some(api_base))?;
        let signin_url = derive_signin_url(&api_base);
        Ok(Self {
            api_base,
            signin_url,
            credentials: Credentials::default(),
            max_search_size: search::MAX_SIZE,
            timeout_ms: network::TIMEOUT_API_REQUEST_MS,
        })
    }

    pub fn from_env() -> Result<Self, ToolError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ToolError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = lookup(ENV_URL).unwrap_or_default();
        if base.trim().is_empty() {
            return Err(ToolError::invalid_params(format!("{} is required", ENV_URL))
                .with_hint("Point it at the catalogue API, e.g. \"https://example.org/geonetwork/srv/api\"."));
        }
        let mut config = Self::new(&base)?;
        config.credentials = Credentials::new(
            lookup(ENV_USERNAME).unwrap_or_default(),
            lookup(ENV_PASSWORD).unwrap_or_default(),
        );
        if let Some(signin) = lookup(ENV_SIGNIN_URL).filter(|v| !v.trim().is_empty()) {
            config = config.with_signin_url(&signin)?;
        }
        if let Some(raw) = lookup(ENV_MAX_SEARCH_SIZE) {
            config.max_search_size = parse_positive(&raw, ENV_MAX_SEARCH_SIZE)?;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            config.timeout_ms = parse_positive(&raw, ENV_TIMEOUT_MS)?;
        }
        Ok(config)
    }

    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.credentials = Credentials::new(username, password);
        self
    }

    pub fn with_signin_url(mut self, signin_url: &str) -> Result<Self, ToolError> {
        self.signin_url = normalize_base_url(Some(signin_url))?;
        Ok(self)
    }

    pub fn with_max_search_size(mut self, max: u64) -> Self {
        self.max_search_size = max.max(1);
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn signin_url(&self) -> &str {
        &self.signin_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_configured()
    }

    pub fn max_search_size(&self) -> u64 {
        self.max_search_size
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }
}

fn normalize_base_url(raw: Option<&str>) -> Result<String, ToolError> {
    let raw = raw.unwrap_or("").trim();
    let mut url = Url::parse(raw).map_err(|_| {
        ToolError::invalid_params("Invalid catalogue URL")
            .with_hint("Expected a valid URL, e.g. \"https://example.org/geonetwork/srv/api\".")
            .with_details(serde_json::json!({ "url": raw }))
    })?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ToolError::invalid_params(
            "Only http/https catalogue URLs are supported",
        ));
    }
    url.set_fragment(None);
    url.set_query(None);
    let normalized = format!("{}{}", url.origin().ascii_serialization(), url.path());
    Ok(normalized.trim_end_matches('/').to_string())
}

/// `https://host/geonetwork/srv/api` signs in at `https://host/geonetwork/signin`.
fn derive_signin_url(api_base: &str) -> String {
    let root = api_base
        .strip_suffix(session::API_SUFFIX)
        .unwrap_or(api_base);
    format!("{}/{}", root, session::SIGNIN_PATH)
}

fn parse_positive(raw: &str, label: &str) -> Result<u64, ToolError> {
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ToolError::invalid_params(format!(
            "{} must be a positive integer",
            label
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn signin_url_is_derived_from_api_base() {
        let config = GatewayConfig::new("https://example.org/geonetwork/srv/api/").unwrap();
        assert_eq!(config.api_base(), "https://example.org/geonetwork/srv/api");
        assert_eq!(config.signin_url(), "https://example.org/geonetwork/signin");
        assert_eq!(
            config.api_url("/records/abc"),
            "https://example.org/geonetwork/srv/api/records/abc"
        );
    }

    #[test]
    fn from_lookup_reads_limits_and_credentials() {
        let config = GatewayConfig::from_lookup(lookup_from(&[
            (ENV_URL, "http://localhost:8080/geonetwork/srv/api"),
            (ENV_USERNAME, "admin"),
            (ENV_PASSWORD, "secret"),
            (ENV_MAX_SEARCH_SIZE, "50"),
            (ENV_TIMEOUT_MS, "1000"),
        ]))
        .unwrap();
        assert!(config.has_credentials());
        assert_eq!(config.max_search_size(), 50);
        assert_eq!(config.timeout_ms(), 1000);
    }

    #[test]
    fn from_lookup_requires_url() {
        let err = GatewayConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.message.contains(ENV_URL));
    }

    #[test]
    fn from_lookup_rejects_zero_limit() {
        let err = GatewayConfig::from_lookup(lookup_from(&[
            (ENV_URL, "http://localhost/geonetwork/srv/api"),
            (ENV_MAX_SEARCH_SIZE, "0"),
        ]))
        .unwrap_err();
        assert!(err.message.contains(ENV_MAX_SEARCH_SIZE));
    }

    #[test]
    fn blank_password_is_not_configured() {
        let config = GatewayConfig::new("http://localhost/geonetwork/srv/api")
            .unwrap()
            .with_credentials("admin", "");
        assert!(!config.has_credentials());
        assert!(!format!("{:?}", Credentials::new("a", "hunter2")).contains("hunter2"));
    }
}
