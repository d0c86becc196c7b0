use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::domain::{RuleGroup, RuleSet};

use super::transport::{
    Method, RequestContext, ResponseBody, Transport, TransportError, TransportRequest,
    TransportResponse,
};

/// Mock transport for testing.
///
/// Records every request, replays scripted responses in order and
/// counts how many response bodies were released. With a store it
/// behaves like a minimal ruler that echoes back what was created.
#[derive(Debug, Default)]
pub struct MockTransport {
    requests: Mutex<Vec<TransportRequest>>,
    scripted: Mutex<VecDeque<Result<(u16, Bytes), TransportError>>>,
    store: Option<Store>,
    cancelled: AtomicUsize,
    issued: AtomicUsize,
    releases: Arc<AtomicUsize>,
}

#[derive(Debug)]
struct Store {
    base: String,
    groups: Mutex<RuleSet>,
}

impl MockTransport {
    /// A transport answering `200` with an empty body unless a response
    /// was scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that stores created groups under `base`.
    pub fn with_store(base: &str) -> Self {
        MockTransport {
            store: Some(Store {
                base: base.trim_end_matches('/').to_string(),
                groups: Mutex::new(RuleSet::new()),
            }),
            ..Self::default()
        }
    }

    /// Queue a response (for testing).
    pub fn push_response(&self, status: u16, body: impl Into<Bytes>) {
        self.scripted.lock().push_back(Ok((status, body.into())));
    }

    /// Queue a transport failure (for testing).
    pub fn push_error(&self, error: TransportError) {
        self.scripted.lock().push_back(Err(error));
    }

    /// Get recorded requests (for assertions).
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    /// Number of response bodies released so far.
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Responses handed out but not yet released.
    pub fn outstanding(&self) -> usize {
        self.issued.load(Ordering::SeqCst) - self.releases()
    }

    /// Requests that arrived with an already-cancelled context.
    pub fn cancelled_requests(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Stored groups (store mode only).
    pub fn stored(&self) -> RuleSet {
        self.store
            .as_ref()
            .map(|s| s.groups.lock().clone())
            .unwrap_or_default()
    }

    fn respond(&self, status: u16, body: Bytes) -> TransportResponse {
        self.issued.fetch_add(1, Ordering::SeqCst);
        TransportResponse::new(
            status,
            Box::new(TrackedBody {
                body,
                releases: self.releases.clone(),
            }),
        )
    }
}

impl Store {
    fn handle(&self, request: &TransportRequest) -> Result<(u16, Bytes), TransportError> {
        let rest = request
            .path
            .strip_prefix(&self.base)
            .ok_or_else(|| not_found(&request.path))?;
        let segments: Vec<String> = rest
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                urlencoding::decode(s)
                    .map(|d| d.into_owned())
                    .map_err(|e| TransportError::Other(e.to_string()))
            })
            .collect::<Result<_, _>>()?;

        let mut groups = self.groups.lock();
        match (request.method, segments.as_slice()) {
            (Method::Get, []) => Ok((200, to_yaml(&*groups)?)),
            (Method::Get, [ns]) => {
                let found = groups.get(ns).ok_or_else(|| not_found(&request.path))?;
                let mut set = RuleSet::new();
                set.insert(ns.clone(), found.clone());
                Ok((200, to_yaml(&set)?))
            }
            (Method::Get, [ns, name]) => {
                let group = groups
                    .get(ns)
                    .and_then(|gs| gs.iter().find(|g| &g.name == name))
                    .ok_or_else(|| not_found(&request.path))?;
                Ok((200, to_yaml(group)?))
            }
            (Method::Post, [ns]) => {
                let body = request.body.clone().unwrap_or_default();
                let group: RuleGroup = serde_yaml::from_slice(&body).map_err(|e| {
                    TransportError::Status {
                        status: 400,
                        body: e.to_string(),
                    }
                })?;
                let entry = groups.entry(ns.clone()).or_default();
                match entry.iter_mut().find(|g| g.name == group.name) {
                    Some(existing) => *existing = group,
                    None => entry.push(group),
                }
                Ok((202, Bytes::new()))
            }
            (Method::Delete, [ns, name]) => {
                let entry = groups.get_mut(ns).ok_or_else(|| not_found(&request.path))?;
                let before = entry.len();
                entry.retain(|g| &g.name != name);
                if entry.len() == before {
                    return Err(not_found(&request.path));
                }
                if entry.is_empty() {
                    groups.remove(ns);
                }
                Ok((202, Bytes::new()))
            }
            _ => Err(TransportError::Status {
                status: 405,
                body: format!("{} not allowed on {}", request.method, request.path),
            }),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(
        &self,
        ctx: &RequestContext,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        if ctx.is_cancelled() {
            self.cancelled.fetch_add(1, Ordering::SeqCst);
        }
        self.requests.lock().push(request.clone());

        let scripted = self.scripted.lock().pop_front();
        let (status, body) = match (scripted, &self.store) {
            (Some(result), _) => result?,
            (None, Some(store)) => store.handle(&request)?,
            (None, None) => (200, Bytes::new()),
        };

        Ok(self.respond(status, body))
    }
}

/// In-memory body that counts its own release.
struct TrackedBody {
    body: Bytes,
    releases: Arc<AtomicUsize>,
}

#[async_trait]
impl ResponseBody for TrackedBody {
    async fn read_all(&mut self) -> Result<Bytes, TransportError> {
        Ok(std::mem::take(&mut self.body))
    }
}

impl Drop for TrackedBody {
    fn drop(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

fn not_found(path: &str) -> TransportError {
    TransportError::Status {
        status: 404,
        body: format!("no rule group found at {}", path),
    }
}

fn to_yaml<T: serde::Serialize + ?Sized>(value: &T) -> Result<Bytes, TransportError> {
    serde_yaml::to_string(value)
        .map(Bytes::from)
        .map_err(|e| TransportError::Other(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(path: &str) -> TransportRequest {
        TransportRequest {
            method: Method::Get,
            path: path.to_string(),
            body: None,
        }
    }

    #[tokio::test]
    async fn test_scripted_responses_in_order() {
        let transport = MockTransport::new();
        transport.push_response(201, "first");
        transport.push_error(TransportError::Cancelled);
        let ctx = RequestContext::background();

        let first = transport.execute(&ctx, get("/a")).await.unwrap();
        assert_eq!(first.status(), 201);
        assert_eq!(transport.outstanding(), 1);
        assert_eq!(&first.bytes().await.unwrap()[..], b"first");
        assert_eq!(transport.outstanding(), 0);

        let second = transport.execute(&ctx, get("/b")).await;
        assert!(matches!(second, Err(TransportError::Cancelled)));

        let third = transport.execute(&ctx, get("/c")).await.unwrap();
        assert_eq!(third.status(), 200);
        third.release();

        assert_eq!(transport.requests().len(), 3);
        assert_eq!(transport.releases(), 2);
    }

    #[tokio::test]
    async fn test_store_missing_group() {
        let transport = MockTransport::with_store("/api/v1/rules");
        let result = transport
            .execute(&RequestContext::background(), get("/api/v1/rules/ns/g"))
            .await;

        assert_eq!(result.unwrap_err().status(), Some(404));
    }
}
