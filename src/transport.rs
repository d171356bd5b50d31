use crate::error::{ApiError, Result};
use crate::settings::GraphSettings;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Body of an outbound request.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
    Bytes(Vec<u8>),
}

#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
    /// Overrides the client-wide timeout for long transfers.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::Empty,
            timeout: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Case-insensitive header lookup.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Raw response; returned for every status code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> std::result::Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Fails with the normalized Graph error unless the status is 2xx.
    pub fn error_for_status(self) -> std::result::Result<Self, ApiError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ApiError::from_response(self.status, &self.body))
        }
    }
}

/// The HTTP capability provided by the host.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Default transport backed by a shared `reqwest` client.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(settings: &GraphSettings) -> Result<Self> {
        Ok(Self {
            client: build_http_client(settings.timeout)?,
        })
    }
}

/// One client with a default timeout and redirect policy for every call.
/// Requests carrying their own timeout replace the default.
pub(crate) fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .connect_timeout(timeout)
        .timeout(timeout)
        .redirect(Policy::limited(10))
        .build()
        .map_err(|e| ApiError::transport(format!("failed to build HTTP client: {e}")).into())
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let HttpRequest {
            method,
            url,
            query,
            headers,
            body,
            timeout,
        } = request;

        let mut builder = self.client.request(method.clone(), &url);
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Form(pairs) => builder.form(&pairs),
            RequestBody::Bytes(bytes) => builder.body(bytes),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| {
                ApiError::transport(format!("failed to send {method} request: {}", describe(&e)))
            })?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| {
                ApiError::transport(format!("failed to read response body: {}", describe(&e)))
            })?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// The error plus its source chain; reqwest's own message omits the cause.
fn describe(err: &reqwest::Error) -> String {
    let mut message = if err.is_timeout() {
        format!("request timed out: {err}")
    } else {
        err.to_string()
    };
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = std::error::Error::source(cause);
    }
    message
}
