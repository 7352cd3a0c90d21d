use std::future::Future;
use std::sync::{Arc, RwLock};

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{ApiError, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

/// An outgoing call, path relative to the `/api` prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
    /// Bearer credential. Filled in by [`HttpClient::send`]; callers leave it empty.
    pub bearer: Option<String>,
    /// The token exchange itself: no credential attached, no expiry interception.
    pub authentication: bool,
}

impl HttpRequest {
    pub fn get(path: &str) -> Self {
        Self {
            method: Method::Get,
            path: path.to_string(),
            body: None,
            bearer: None,
            authentication: false,
        }
    }

    pub fn post<B: Serialize>(path: &str, body: &B) -> Result<Self, ApiError> {
        Self::with_body(Method::Post, path, body)
    }

    pub fn put<B: Serialize>(path: &str, body: &B) -> Result<Self, ApiError> {
        Self::with_body(Method::Put, path, body)
    }

    fn with_body<B: Serialize>(method: Method, path: &str, body: &B) -> Result<Self, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidResponse(format!("encode request: {e}")))?;
        Ok(Self {
            method,
            path: path.to_string(),
            body: Some(body),
            bearer: None,
            authentication: false,
        })
    }

    /// Mark this request as the authentication call.
    pub fn authentication(mut self) -> Self {
        self.authentication = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Moves a request over the wire. Implemented by [`crate::ReqwestTransport`]
/// and, in tests, by a recording stub.
pub trait Transport: Send + Sync + 'static {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

/// The adapter's view of the session: where the credential comes from and
/// who to tell when the server stops accepting it.
pub trait SessionHooks: Send + Sync {
    fn bearer_token(&self) -> Option<String>;

    /// Called synchronously on a 401, before the error reaches the caller.
    fn on_unauthorized(&self);
}

/// HTTP client adapter.
///
/// Every request passes through [`HttpClient::send`], which attaches the
/// credential from the installed [`SessionHooks`] and turns a 401 into a
/// session teardown plus [`ApiError::SessionExpired`]. There is exactly one
/// hook slot; installing replaces the previous hooks.
pub struct HttpClient<T> {
    transport: T,
    hooks: RwLock<Option<Arc<dyn SessionHooks>>>,
}

impl<T: Transport> HttpClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            hooks: RwLock::new(None),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Install session hooks, returning whatever was installed before.
    pub fn install_hooks(&self, hooks: Arc<dyn SessionHooks>) -> Option<Arc<dyn SessionHooks>> {
        let mut slot = self.hooks.write().unwrap_or_else(|e| e.into_inner());
        slot.replace(hooks)
    }

    /// Remove the installed hooks. Later requests go out without a credential.
    pub fn eject_hooks(&self) -> Option<Arc<dyn SessionHooks>> {
        let mut slot = self.hooks.write().unwrap_or_else(|e| e.into_inner());
        slot.take()
    }

    pub fn has_hooks(&self) -> bool {
        self.current_hooks().is_some()
    }

    fn current_hooks(&self) -> Option<Arc<dyn SessionHooks>> {
        self.hooks.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub async fn send(&self, mut request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let hooks = if request.authentication {
            None
        } else {
            self.current_hooks()
        };
        request.bearer = hooks.as_ref().and_then(|h| h.bearer_token());

        let method = request.method;
        let path = request.path.clone();
        let authentication = request.authentication;
        debug!(method = method.as_str(), %path, "sending request");

        let response = self.transport.execute(request).await?;

        if response.status == 401 && !authentication {
            warn!(method = method.as_str(), %path, "credential rejected, ending session");
            if let Some(hooks) = hooks {
                hooks.on_unauthorized();
            }
            return Err(ApiError::SessionExpired);
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubTransport;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeSession {
        token: Mutex<Option<String>>,
        expired: AtomicUsize,
    }

    impl FakeSession {
        fn with_token(token: &str) -> Arc<Self> {
            Arc::new(Self {
                token: Mutex::new(Some(token.to_string())),
                expired: AtomicUsize::new(0),
            })
        }
    }

    impl SessionHooks for FakeSession {
        fn bearer_token(&self) -> Option<String> {
            self.token.lock().unwrap().clone()
        }

        fn on_unauthorized(&self) {
            *self.token.lock().unwrap() = None;
            self.expired.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn attaches_bearer_to_regular_requests_only() {
        let stub = StubTransport::new();
        stub.push_json(200, json!({"data": []}));
        stub.push_json(200, json!({"access": "abc"}));
        let client = HttpClient::new(stub.clone());
        client.install_hooks(FakeSession::with_token("tok-1"));

        client.send(HttpRequest::get("/families/")).await.unwrap();
        let login = HttpRequest::post("/token/", &json!({"username": "a", "password": "b"}))
            .unwrap()
            .authentication();
        client.send(login).await.unwrap();

        let calls = stub.calls();
        assert_eq!(calls[0].bearer.as_deref(), Some("tok-1"));
        assert_eq!(calls[1].bearer, None);
    }

    #[tokio::test]
    async fn unauthorized_triggers_hooks_and_propagates() {
        let stub = StubTransport::new();
        stub.push_json(401, json!({"detail": "Given token not valid"}));
        let client = HttpClient::new(stub.clone());
        let session = FakeSession::with_token("stale");
        client.install_hooks(session.clone());

        let err = client.send(HttpRequest::get("/families/")).await.unwrap_err();

        assert_eq!(err, ApiError::SessionExpired);
        assert_eq!(session.expired.load(Ordering::SeqCst), 1);
        assert_eq!(session.bearer_token(), None);
        assert_eq!(stub.call_count(), 1);
    }

    #[tokio::test]
    async fn unauthorized_on_authentication_is_not_an_expiry() {
        let stub = StubTransport::new();
        stub.push_json(401, json!({"detail": "No active account"}));
        let client = HttpClient::new(stub.clone());
        let session = FakeSession::with_token("tok");
        client.install_hooks(session.clone());

        let req = HttpRequest::post("/token/", &json!({}))
            .unwrap()
            .authentication();
        let resp = client.send(req).await.unwrap();

        assert_eq!(resp.status, 401);
        assert_eq!(session.expired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn ejected_hooks_are_no_longer_consulted() {
        let stub = StubTransport::new();
        stub.push_json(401, json!({}));
        let client = HttpClient::new(stub.clone());
        let session = FakeSession::with_token("tok");
        client.install_hooks(session.clone());
        assert!(client.eject_hooks().is_some());
        assert!(!client.has_hooks());

        let err = client.send(HttpRequest::get("/families/")).await.unwrap_err();

        assert_eq!(err, ApiError::SessionExpired);
        assert_eq!(stub.calls()[0].bearer, None);
        assert_eq!(session.expired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn installing_replaces_previous_hooks() {
        let stub = StubTransport::new();
        stub.push_json(200, json!({}));
        let client = HttpClient::new(stub.clone());
        client.install_hooks(FakeSession::with_token("old"));
        let previous = client.install_hooks(FakeSession::with_token("new"));

        assert_eq!(previous.and_then(|h| h.bearer_token()).as_deref(), Some("old"));
        client.send(HttpRequest::get("/families/")).await.unwrap();
        assert_eq!(stub.calls()[0].bearer.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn transport_failure_maps_to_unreachable() {
        let stub = StubTransport::new();
        stub.push_failure("connection refused");
        let client = HttpClient::new(stub);

        let err = client.send(HttpRequest::get("/families/")).await.unwrap_err();
        assert_eq!(err, ApiError::Unreachable("connection refused".to_string()));
    }
}
