//! Scripted in-memory transport for tests.
//!
//! Routes match on method plus a URL substring and are tried in the order
//! they were registered. Every request that reaches the transport is
//! recorded, including ones later cancelled.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransferProgress, TransportError};

#[derive(Debug, Clone)]
enum Reply {
    Respond(HttpResponse),
    Fail(TransportError),
    /// Never settles; only cancellation ends the call.
    Pending,
}

/// What a route answers with.
#[derive(Debug, Clone)]
pub struct MockResponse {
    reply: Reply,
    gate: Option<Arc<Notify>>,
    upload_progress: Option<(u64, u64)>,
}

impl MockResponse {
    pub fn text(status: u16, body: impl Into<Bytes>) -> Self {
        Self::from_reply(Reply::Respond(HttpResponse::new(status, body)))
    }

    pub fn json(status: u16, body: &str) -> Self {
        Self::from_reply(Reply::Respond(
            HttpResponse::new(status, body.to_string())
                .with_header("content-type", "application/vnd.api+json"),
        ))
    }

    pub fn bytes(status: u16, body: impl Into<Bytes>) -> Self {
        Self::text(status, body)
    }

    pub fn transport_error(message: &str) -> Self {
        Self::from_reply(Reply::Fail(TransportError::Connect(message.to_string())))
    }

    pub fn pending() -> Self {
        Self::from_reply(Reply::Pending)
    }

    /// Holds the reply until `gate` is notified.
    pub fn after(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Reports partial upload progress as soon as the request arrives.
    pub fn with_upload_progress(mut self, sent: u64, total: u64) -> Self {
        self.upload_progress = Some((sent, total));
        self
    }

    fn from_reply(reply: Reply) -> Self {
        Self {
            reply,
            gate: None,
            upload_progress: None,
        }
    }
}

#[derive(Debug)]
struct Route {
    method: HttpMethod,
    pattern: String,
    response: MockResponse,
    remaining: Option<usize>,
    handle: RouteHandle,
}

/// Observes one registered route.
#[derive(Debug, Clone, Default)]
pub struct RouteHandle {
    started: Arc<Notify>,
    hits: Arc<AtomicUsize>,
}

impl RouteHandle {
    /// Notified each time a request reaches this route.
    pub fn started(&self) -> Arc<Notify> {
        Arc::clone(&self.started)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every matching request with `response`.
    pub fn on(&self, method: HttpMethod, pattern: &str, response: MockResponse) -> RouteHandle {
        self.register(method, pattern, response, None)
    }

    /// Answers the next matching request only; later ones fall through to
    /// routes registered after this one.
    pub fn on_once(&self, method: HttpMethod, pattern: &str, response: MockResponse) -> RouteHandle {
        self.register(method, pattern, response, Some(1))
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub fn requests_to(&self, method: HttpMethod, pattern: &str) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|request| request.method == method && request.url.contains(pattern))
            .cloned()
            .collect()
    }

    fn register(
        &self,
        method: HttpMethod,
        pattern: &str,
        response: MockResponse,
        remaining: Option<usize>,
    ) -> RouteHandle {
        let handle = RouteHandle::default();
        self.routes.lock().push(Route {
            method,
            pattern: pattern.to_string(),
            response,
            remaining,
            handle: handle.clone(),
        });
        handle
    }

    fn take_route(&self, request: &HttpRequest) -> Option<(MockResponse, RouteHandle)> {
        let mut routes = self.routes.lock();
        let route = routes.iter_mut().find(|route| {
            route.method == request.method
                && request.url.contains(&route.pattern)
                && route.remaining != Some(0)
        })?;
        if let Some(remaining) = route.remaining.as_mut() {
            *remaining -= 1;
        }
        Some((route.response.clone(), route.handle.clone()))
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn execute(
        &self,
        request: HttpRequest,
        progress: TransferProgress,
    ) -> Result<HttpResponse, TransportError> {
        self.requests.lock().push(request.clone());

        let Some((response, handle)) = self.take_route(&request) else {
            return Err(TransportError::other(format!(
                "no mock route for {} {}",
                request.method, request.url
            )));
        };
        handle.hits.fetch_add(1, Ordering::SeqCst);

        if let Some((sent, total)) = response.upload_progress {
            progress.set_uploaded(sent, total);
        }
        handle.started.notify_one();

        if let Some(gate) = response.gate {
            gate.notified().await;
        }

        match response.reply {
            Reply::Respond(response) => Ok(response),
            Reply::Fail(error) => Err(error),
            Reply::Pending => std::future::pending().await,
        }
    }
}
