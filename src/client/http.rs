use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderValue, CONTENT_TYPE, USER_AGENT};
use std::time::Duration;
use tracing::debug;

use crate::config::Config;

use super::transport::{
    Method, RequestContext, ResponseBody, Transport, TransportError, TransportRequest,
    TransportResponse,
};

const APP_USER_AGENT: &str = concat!("rulectl/", env!("CARGO_PKG_VERSION"));
const TENANT_HEADER: &str = "X-Scope-OrgID";
const YAML_CONTENT_TYPE: &str = "application/yaml";

/// `Transport` backed by a pooled `reqwest` client.
///
/// Attaches the tenant header and basic auth to every request and turns
/// non-2xx responses into [`TransportError::Status`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    address: String,
    tenant_id: Option<String>,
    user: Option<String>,
    key: Option<String>,
    http: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport for the server at `address` (scheme and host,
    /// no trailing path).
    pub fn new(address: &str) -> Self {
        HttpTransport {
            address: address.trim_end_matches('/').to_string(),
            tenant_id: None,
            user: None,
            key: None,
            http: reqwest::Client::new(),
        }
    }

    /// Build a transport from runtime configuration.
    pub fn from_config(config: &Config) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(HttpTransport {
            address: config.address.trim_end_matches('/').to_string(),
            tenant_id: non_empty(config.id.as_deref()),
            user: non_empty(config.user.as_deref()),
            key: non_empty(config.key.as_deref()),
            http,
        })
    }

    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = non_empty(Some(tenant_id.into().as_str()));
        self
    }

    pub fn with_basic_auth(mut self, user: impl Into<String>, key: impl Into<String>) -> Self {
        self.user = non_empty(Some(user.into().as_str()));
        self.key = non_empty(Some(key.into().as_str()));
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Basic auth credentials: the explicit user if set, otherwise the
    /// tenant id paired with the key.
    fn credentials(&self) -> Option<(&str, Option<&str>)> {
        match (&self.user, &self.key, &self.tenant_id) {
            (Some(user), key, _) => Some((user.as_str(), key.as_deref())),
            (None, Some(key), Some(id)) => Some((id.as_str(), Some(key.as_str()))),
            _ => None,
        }
    }

    fn build(&self, request: TransportRequest) -> reqwest::RequestBuilder {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        };
        let url = format!("{}{}", self.address, request.path);

        let mut builder = self
            .http
            .request(method, url)
            .header(USER_AGENT, HeaderValue::from_static(APP_USER_AGENT));

        if let Some(id) = &self.tenant_id {
            builder = builder.header(TENANT_HEADER, id);
        }
        if let Some((user, key)) = self.credentials() {
            builder = builder.basic_auth(user, key);
        }
        if let Some(body) = request.body {
            builder = builder
                .header(CONTENT_TYPE, HeaderValue::from_static(YAML_CONTENT_TYPE))
                .body(body);
        }

        builder
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(
        &self,
        ctx: &RequestContext,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        if ctx.is_cancelled() {
            return Err(TransportError::Cancelled);
        }

        let mut builder = self.build(request);
        if let Some(remaining) = ctx.remaining() {
            if remaining.is_zero() {
                return Err(TransportError::DeadlineExceeded);
            }
            builder = builder.timeout(remaining);
        }

        let response = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(TransportError::Cancelled),
            result = builder.send() => result.map_err(request_error)?,
        };

        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "Received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(TransportResponse::new(
            status.as_u16(),
            Box::new(HttpBody {
                response: Some(response),
            }),
        ))
    }
}

/// Body of a live `reqwest` response; dropping it returns the
/// connection to the pool.
struct HttpBody {
    response: Option<reqwest::Response>,
}

#[async_trait]
impl ResponseBody for HttpBody {
    async fn read_all(&mut self) -> Result<Bytes, TransportError> {
        match self.response.take() {
            Some(response) => response.bytes().await.map_err(request_error),
            None => Ok(Bytes::new()),
        }
    }
}

/// A reqwest timeout is the context deadline expiring mid-request.
fn request_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::DeadlineExceeded
    } else {
        TransportError::Http(e)
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}
