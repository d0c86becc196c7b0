use bytes::Bytes;
use std::sync::Arc;

use crate::config::Config;
use crate::domain::{RuleGroup, RuleSet};
use crate::observability::{DiagnosticEvent, Diagnostics, TracingDiagnostics};

use super::error::ClientError;
use super::http::HttpTransport;
use super::path::{group_path, list_path, namespace_path};
use super::sanitize::trim_non_graphic;
use super::transport::{
    Method, RequestContext, Transport, TransportError, TransportRequest, TransportResponse,
};

/// Client for the rule group endpoints of a ruler API.
///
/// Holds only immutable configuration and shared collaborators, so it
/// can be cloned freely and used from many tasks at once.
#[derive(Debug, Clone)]
pub struct RuleClient {
    transport: Arc<dyn Transport>,
    diagnostics: Arc<dyn Diagnostics>,
    api_path: String,
}

impl RuleClient {
    /// Create a client issuing requests under `api_path`
    /// (e.g. `/api/v1/rules`). Diagnostics go to `tracing`.
    pub fn new(transport: Arc<dyn Transport>, api_path: impl Into<String>) -> Self {
        RuleClient {
            transport,
            diagnostics: Arc::new(TracingDiagnostics),
            api_path: api_path.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create a client talking HTTP to the configured server.
    pub fn from_config(config: &Config) -> Result<Self, TransportError> {
        let transport = HttpTransport::from_config(config)?;
        Ok(Self::new(Arc::new(transport), config.api_path()))
    }

    /// Replace the diagnostics sink.
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn api_path(&self) -> &str {
        &self.api_path
    }

    /// Create or replace a rule group in `namespace`.
    pub async fn create_rule_group(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        group: &RuleGroup,
    ) -> Result<(), ClientError> {
        let payload =
            serde_yaml::to_string(group).map_err(|source| ClientError::Encoding { source })?;

        let path = namespace_path(&self.api_path, namespace);
        let response = self
            .do_request(ctx, Method::Post, path, Some(Bytes::from(payload)))
            .await?;
        response.release();

        Ok(())
    }

    /// Delete a rule group. A missing group is reported like any other
    /// non-success status.
    pub async fn delete_rule_group(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        group_name: &str,
    ) -> Result<(), ClientError> {
        let path = group_path(&self.api_path, namespace, group_name);
        let response = self.do_request(ctx, Method::Delete, path, None).await?;
        response.release();

        Ok(())
    }

    /// Fetch a single rule group.
    pub async fn get_rule_group(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        group_name: &str,
    ) -> Result<RuleGroup, ClientError> {
        let path = group_path(&self.api_path, namespace, group_name);
        let response = self.do_request(ctx, Method::Get, path.clone(), None).await?;
        let body = response.bytes().await?;

        if body.iter().all(u8::is_ascii_whitespace) {
            self.diagnostics.record(DiagnosticEvent::DecodeFailure {
                path: path.clone(),
                body: String::from_utf8_lossy(&body).into_owned(),
                error: "empty response body".to_string(),
            });
            return Err(ClientError::Decode {
                message: format!("empty response body for {}", path),
                source: None,
            });
        }

        serde_yaml::from_slice::<RuleGroup>(&body).map_err(|e| {
            self.diagnostics.record(DiagnosticEvent::DecodeFailure {
                path,
                body: String::from_utf8_lossy(&body).into_owned(),
                error: e.to_string(),
            });
            ClientError::decode("unable to unmarshal response", e)
        })
    }

    /// List rule groups, for all namespaces when `namespace` is empty.
    ///
    /// The namespace is appended to the path without escaping. The body
    /// is trimmed of leading and trailing non-graphic chars before it is
    /// decoded, and each trimmed char is reported as a warning.
    pub async fn list_rules(
        &self,
        ctx: &RequestContext,
        namespace: &str,
    ) -> Result<RuleSet, ClientError> {
        let path = list_path(&self.api_path, namespace);
        let response = self.do_request(ctx, Method::Get, path.clone(), None).await?;
        let body = response.bytes().await?;

        let raw = match std::str::from_utf8(&body) {
            Ok(raw) => raw,
            Err(e) => {
                self.diagnostics.record(DiagnosticEvent::DecodeFailure {
                    path: path.clone(),
                    body: String::from_utf8_lossy(&body).into_owned(),
                    error: e.to_string(),
                });
                return Err(ClientError::Decode {
                    message: format!("response body for {} is not valid UTF-8: {}", path, e),
                    source: None,
                });
            }
        };
        self.diagnostics.record(DiagnosticEvent::ResponseBody {
            path: path.clone(),
            body: raw.to_string(),
        });

        let sanitized = trim_non_graphic(raw, |rune, edge| {
            self.diagnostics.record(DiagnosticEvent::NonGraphicRune {
                path: path.clone(),
                rune,
                edge,
            });
        });

        if sanitized.is_empty() {
            return Ok(RuleSet::new());
        }

        serde_yaml::from_str::<RuleSet>(sanitized).map_err(|e| {
            self.diagnostics.record(DiagnosticEvent::DecodeFailure {
                path: path.clone(),
                body: sanitized.to_string(),
                error: e.to_string(),
            });
            ClientError::decode("unable to unmarshal rule set", e)
        })
    }

    async fn do_request(
        &self,
        ctx: &RequestContext,
        method: Method,
        path: String,
        body: Option<Bytes>,
    ) -> Result<TransportResponse, ClientError> {
        self.diagnostics.record(DiagnosticEvent::Request {
            method: method.to_string(),
            path: path.clone(),
        });

        let response = self
            .transport
            .execute(ctx, TransportRequest { method, path, body })
            .await?;

        if !response.is_success() {
            let status = response.status();
            let body = response
                .bytes()
                .await
                .map(|b| String::from_utf8_lossy(&b).into_owned())
                .unwrap_or_default();
            return Err(TransportError::Status { status, body }.into());
        }

        Ok(response)
    }
}
