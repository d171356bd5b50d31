use super::request_timeout::{default_request_timeout, parse_request_timeout};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
pub const DEFAULT_GRAPH_BASE: &str = "https://graph.microsoft.com/v1.0";
pub const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

const AUTHORITY_HOST_ENV: &str = "SHAREPOINT_FILES_AUTHORITY_HOST";
const GRAPH_BASE_ENV: &str = "SHAREPOINT_FILES_GRAPH_BASE";
const TIMEOUT_ENV: &str = "SHAREPOINT_FILES_TIMEOUT_SECS";

/// Where tokens and Graph calls are sent, plus the transport timeout.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    pub authority_host: String,
    pub graph_base: String,
    #[serde(with = "timeout_secs")]
    pub timeout: Duration,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
            graph_base: DEFAULT_GRAPH_BASE.to_string(),
            timeout: default_request_timeout(),
        }
    }
}

impl GraphSettings {
    /// Defaults overridden by `SHAREPOINT_FILES_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        if let Some(value) = lookup(AUTHORITY_HOST_ENV).filter(|v| !v.trim().is_empty()) {
            settings.authority_host = value;
        }
        if let Some(value) = lookup(GRAPH_BASE_ENV).filter(|v| !v.trim().is_empty()) {
            settings.graph_base = value;
        }
        if let Some(value) = lookup(TIMEOUT_ENV).filter(|v| !v.trim().is_empty()) {
            settings.timeout = parse_request_timeout(&value)?;
        }
        settings.validated()
    }

    /// Checks both base URLs parse and strips trailing slashes.
    pub fn validated(mut self) -> Result<Self> {
        self.authority_host = normalize_base_url("authority host", &self.authority_host)?;
        self.graph_base = normalize_base_url("graph base", &self.graph_base)?;
        Ok(self)
    }

    pub fn token_url(&self, tenant_id: &str) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host.trim_end_matches('/'),
            tenant_id.trim()
        )
    }

    pub fn graph_url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.graph_base.trim_end_matches('/'))
    }
}

fn normalize_base_url(label: &str, raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::validation(format!("{label} must not be empty")));
    }
    Url::parse(trimmed).map_err(|e| Error::validation(format!("invalid {label} {raw:?}: {e}")))?;
    Ok(trimmed.to_string())
}

mod timeout_secs {
    use crate::settings::request_timeout::{MAX_TIMEOUT_SECS, MIN_TIMEOUT_SECS};
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_follow_public_endpoints() {
        let settings = GraphSettings::default();
        assert_eq!(
            settings.token_url("contoso"),
            "https://login.microsoftonline.com/contoso/oauth2/v2.0/token"
        );
        assert_eq!(
            settings.graph_url("/sites/root"),
            "https://graph.microsoft.com/v1.0/sites/root"
        );
    }

    #[test]
    fn lookup_overrides_and_trims() {
        let env: HashMap<&str, &str> = [
            (GRAPH_BASE_ENV, "http://127.0.0.1:9000/v1.0/"),
            (TIMEOUT_ENV, "120"),
        ]
        .into_iter()
        .collect();
        let settings =
            GraphSettings::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(settings.graph_base, "http://127.0.0.1:9000/v1.0");
        assert_eq!(settings.authority_host, DEFAULT_AUTHORITY_HOST);
        assert_eq!(settings.timeout, Duration::from_secs(120));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = GraphSettings::from_lookup(|key| {
            (key == AUTHORITY_HOST_ENV).then(|| "not a url".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("authority host"));
    }

    #[test]
    fn deserializes_with_defaults() {
        let settings: GraphSettings =
            serde_json::from_str(r#"{"graph_base":"http://localhost:1/v1.0","timeout":2}"#)
                .unwrap();
        assert_eq!(settings.authority_host, DEFAULT_AUTHORITY_HOST);
        assert_eq!(settings.timeout, Duration::from_secs(5));
    }
}
