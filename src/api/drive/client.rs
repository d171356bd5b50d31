use crate::api::auth::{fetch_token, AccessToken, Credentials};
use crate::error::{ApiError, Result};
use crate::settings::GraphSettings;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, RequestBody};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Content downloads stream whole files and get far more time than
/// metadata calls.
pub const CONTENT_TRANSFER_TIMEOUT: Duration = Duration::from_secs(600);

/// Extra query pairs and headers for a single Graph call.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Authenticated access to Graph. Every top-level call fetches a fresh
/// token; pagination hops reuse the token of their first page.
#[derive(Clone)]
pub struct GraphClient {
    transport: Arc<dyn HttpTransport>,
    settings: GraphSettings,
    credentials: Credentials,
}

impl GraphClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        settings: GraphSettings,
        credentials: Credentials,
    ) -> Self {
        Self {
            transport,
            settings,
            credentials,
        }
    }

    /// Budget for a long body transfer; never shorter than the configured
    /// default.
    pub(crate) fn transfer_timeout(&self, budget: Duration) -> Duration {
        budget.max(self.settings.timeout)
    }

    async fn access_token(&self) -> Result<AccessToken> {
        fetch_token(self.transport.as_ref(), &self.settings, &self.credentials).await
    }

    /// One JSON call against `endpoint` (relative to the Graph base).
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: RequestBody,
        options: &RequestOptions,
    ) -> Result<Value> {
        let token = self.access_token().await?;
        let request = json_request(
            &token,
            method,
            self.settings.graph_url(endpoint),
            body,
            options,
        );
        let response = self.send(request).await?;
        parse_json(&response)
    }

    /// Follows `@odata.nextLink` until exhausted and returns every `value`
    /// entry in server order.
    pub async fn request_all_pages(
        &self,
        method: Method,
        endpoint: &str,
        body: RequestBody,
        options: &RequestOptions,
    ) -> Result<Vec<Value>> {
        let token = self.access_token().await?;
        let first = json_request(
            &token,
            method.clone(),
            self.settings.graph_url(endpoint),
            body,
            options,
        );

        let mut items = Vec::new();
        let mut next = Some(first);
        let mut pages = 0usize;
        while let Some(request) = next.take() {
            let page: Page = parse_page(&self.send(request).await?)?;
            pages += 1;
            items.extend(page.value);
            next = page.next_link.filter(|link| !link.is_empty()).map(|link| {
                json_request(
                    &token,
                    method.clone(),
                    link,
                    RequestBody::Empty,
                    &RequestOptions::default(),
                )
            });
        }
        debug!(endpoint, pages, items = items.len(), "collected paged results");
        Ok(items)
    }

    /// Raw bytes, no JSON negotiation. Runs under the content transfer
    /// budget rather than the default timeout.
    pub async fn request_binary(&self, method: Method, endpoint: &str) -> Result<Vec<u8>> {
        let token = self.access_token().await?;
        let request = HttpRequest::new(method, self.settings.graph_url(endpoint))
            .header("Authorization", token.bearer())
            .timeout(self.transfer_timeout(CONTENT_TRANSFER_TIMEOUT));
        Ok(self.send(request).await?.body)
    }

    /// Sends without adding credentials; for pre-authenticated URLs such as
    /// upload sessions.
    pub(crate) async fn send_unauthenticated(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.send(request).await
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!(method = %request.method, url = %request.url, "graph request");
        let response = self.transport.send(request).await?;
        Ok(response.error_for_status()?)
    }
}

fn json_request(
    token: &AccessToken,
    method: Method,
    url: String,
    body: RequestBody,
    options: &RequestOptions,
) -> HttpRequest {
    let mut headers = vec![
        ("Authorization".to_string(), token.bearer()),
        ("Content-Type".to_string(), "application/json".to_string()),
        ("Accept".to_string(), "application/json".to_string()),
    ];
    for (name, value) in &options.headers {
        headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        headers.push((name.clone(), value.clone()));
    }

    let body = if method == Method::GET || is_empty_body(&body) {
        RequestBody::Empty
    } else {
        body
    };

    HttpRequest {
        method,
        url,
        query: options.query.clone(),
        headers,
        body,
        timeout: options.timeout,
    }
}

/// Graph rejects empty JSON bodies on some verbs, so these are never sent.
fn is_empty_body(body: &RequestBody) -> bool {
    match body {
        RequestBody::Empty => true,
        RequestBody::Json(Value::Null) => true,
        RequestBody::Json(Value::Object(map)) => map.is_empty(),
        RequestBody::Form(pairs) => pairs.is_empty(),
        RequestBody::Bytes(bytes) => bytes.is_empty(),
        RequestBody::Json(_) => false,
    }
}

fn parse_json(response: &HttpResponse) -> Result<Value> {
    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    response.json::<Value>().map_err(|e| {
        ApiError {
            status: Some(response.status),
            message: format!("failed to parse graph response: {e}"),
            body: Some(String::from_utf8_lossy(&response.body).into_owned()),
        }
        .into()
    })
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    value: Vec<Value>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

fn parse_page(response: &HttpResponse) -> Result<Page> {
    let value = parse_json(response)?;
    serde_json::from_value(value).map_err(|e| {
        ApiError {
            status: Some(response.status),
            message: format!("unexpected page shape: {e}"),
            body: None,
        }
        .into()
    })
}
