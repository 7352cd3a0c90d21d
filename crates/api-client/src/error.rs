/// Everything that can go wrong on a call to the backend.
///
/// Every variant is recoverable at the screen that issued the call.
/// `SessionExpired` is the only one with a side effect beyond that screen:
/// by the time a caller sees it, the installed session hooks have already
/// torn the session down.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Client-side validation failed before any request was sent.
    #[error("{0}")]
    MissingField(String),

    /// The server declined the request with a reason.
    #[error("{0}")]
    Rejected(String),

    /// The request never produced an HTTP response.
    #[error("server unreachable: {0}")]
    Unreachable(String),

    /// A 401 on an authenticated call.
    #[error("session expired")]
    SessionExpired,

    /// A 2xx response whose body did not decode.
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}

/// A failure below HTTP: DNS, connect, TLS, timeout, or a broken body stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        Self(e.to_string())
    }
}

impl From<TransportError> for ApiError {
    fn from(e: TransportError) -> Self {
        Self::Unreachable(e.0)
    }
}
