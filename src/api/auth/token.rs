use crate::error::{Error, Result};
use crate::settings::{GraphSettings, GRAPH_SCOPE};
use crate::transport::{HttpRequest, HttpTransport, RequestBody};
use reqwest::Method;
use serde::Deserialize;
use std::fmt;
use tracing::debug;

/// App registration secrets. Owned by the host's credential store; the
/// crate only passes them through to each token exchange.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Bearer token for a single top-level Graph request. Never cached.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: Option<String>,
    pub(crate) error: Option<String>,
    pub(crate) error_description: Option<String>,
}

pub(crate) fn token_request(settings: &GraphSettings, credentials: &Credentials) -> HttpRequest {
    let params = vec![
        ("grant_type".to_string(), "client_credentials".to_string()),
        ("client_id".to_string(), credentials.client_id.clone()),
        ("client_secret".to_string(), credentials.client_secret.clone()),
        ("scope".to_string(), GRAPH_SCOPE.to_string()),
    ];
    HttpRequest::new(Method::POST, settings.token_url(&credentials.tenant_id))
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(RequestBody::Form(params))
}

/// Exchanges the client credentials for a bearer token. One network call,
/// no retry.
pub async fn fetch_token(
    transport: &dyn HttpTransport,
    settings: &GraphSettings,
    credentials: &Credentials,
) -> Result<AccessToken> {
    debug!(tenant_id = %credentials.tenant_id, "requesting client-credentials token");
    let response = transport
        .send(token_request(settings, credentials))
        .await
        .map_err(|e| Error::Auth(format!("token exchange failed: {e}")))?;

    let payload = response.json::<TokenResponse>().ok();
    if !response.is_success() {
        let detail = payload
            .as_ref()
            .and_then(describe_token_error)
            .unwrap_or_else(|| String::from_utf8_lossy(&response.body).trim().to_string());
        return Err(Error::Auth(format!(
            "token endpoint returned HTTP {}: {detail}",
            response.status
        )));
    }

    let payload =
        payload.ok_or_else(|| Error::Auth("failed to parse token response".to_string()))?;
    if let Some(detail) = describe_token_error(&payload) {
        return Err(Error::Auth(detail));
    }
    payload
        .access_token
        .filter(|token| !token.is_empty())
        .map(AccessToken)
        .ok_or_else(|| Error::Auth("missing access_token in response".to_string()))
}

fn describe_token_error(payload: &TokenResponse) -> Option<String> {
    let error = payload.error.as_deref()?;
    let description = payload.error_description.as_deref().unwrap_or_default();
    Some(format!("{error}: {description}").trim_end_matches([' ', ':']).to_string())
}
