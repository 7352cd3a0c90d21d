//! Session store: the current credential, its persisted copy, and the last
//! session-level error.

use std::sync::{Arc, Mutex, MutexGuard};

use harvest_api_client::SessionHooks;
use tracing::{info, warn};

use crate::storage::{KeyValueStore, StorageError};

pub const TOKEN_KEY: &str = "access_token";
pub const IDENTITY_KEY: &str = "username";

pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to persist session: {0}")]
    Storage(#[from] StorageError),

    #[error("refusing to store an empty access token")]
    EmptyToken,
}

/// An opaque bearer token and the name of whoever obtained it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub identity: Option<String>,
}

impl Credential {
    pub fn new(token: impl Into<String>, identity: Option<String>) -> Self {
        Self {
            token: token.into(),
            identity,
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("identity", &self.identity)
            .finish()
    }
}

/// In-memory session state. Authentication is derived from the credential,
/// so the two can never disagree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    credential: Option<Credential>,
    last_error: Option<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.credential.as_ref().map(|c| c.token.as_str())
    }

    pub fn identity(&self) -> Option<&str> {
        self.credential.as_ref().and_then(|c| c.identity.as_deref())
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

/// Owns the [`Session`] and keeps it in step with durable storage.
///
/// Every mutation writes storage and memory together. Login persists first
/// and only then updates memory; teardown always clears memory and reports a
/// storage failure afterwards, so a failed write can never leave the process
/// believing it is still logged in.
pub struct SessionStore {
    session: Session,
    storage: Box<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(storage: Box<dyn KeyValueStore>) -> Self {
        Self {
            session: Session::default(),
            storage,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Rebuild the session from storage. No network validation: a stale
    /// token is discovered by the first request that gets a 401.
    pub fn restore(&mut self) -> bool {
        let token = self
            .storage
            .get(TOKEN_KEY)
            .filter(|token| !token.trim().is_empty());
        self.session.credential = token.map(|token| Credential {
            token,
            identity: self.storage.get(IDENTITY_KEY),
        });
        if let Some(credential) = &self.session.credential {
            info!(identity = ?credential.identity, "restored persisted session");
        }
        self.session.is_authenticated()
    }

    pub fn login(&mut self, credential: Credential) -> Result<(), SessionError> {
        if credential.token.trim().is_empty() {
            return Err(SessionError::EmptyToken);
        }
        self.storage.update(&[
            (TOKEN_KEY, Some(credential.token.as_str())),
            (IDENTITY_KEY, credential.identity.as_deref()),
        ])?;
        info!(identity = ?credential.identity, "logged in");
        self.session.credential = Some(credential);
        self.session.last_error = None;
        Ok(())
    }

    pub fn logout(&mut self) -> Result<(), SessionError> {
        info!("logged out");
        self.teardown(None)
    }

    /// Tear down after the server rejected the credential.
    pub fn expire(&mut self, message: &str) -> Result<(), SessionError> {
        warn!("session expired");
        self.teardown(Some(message.to_string()))
    }

    /// Hide the last error without touching the credential.
    pub fn dismiss_error(&mut self) {
        self.session.last_error = None;
    }

    fn teardown(&mut self, last_error: Option<String>) -> Result<(), SessionError> {
        self.session.credential = None;
        self.session.last_error = last_error;
        self.storage
            .update(&[(TOKEN_KEY, None), (IDENTITY_KEY, None)])?;
        Ok(())
    }
}

/// Shared handle to the one [`SessionStore`], handed to the HTTP adapter as
/// its [`SessionHooks`].
#[derive(Clone)]
pub struct SharedSession(Arc<Mutex<SessionStore>>);

impl SharedSession {
    pub fn new(store: SessionStore) -> Self {
        Self(Arc::new(Mutex::new(store)))
    }

    pub fn lock(&self) -> MutexGuard<'_, SessionStore> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Copy of the current session state.
    pub fn snapshot(&self) -> Session {
        self.lock().session().clone()
    }
}

impl SessionHooks for SharedSession {
    fn bearer_token(&self) -> Option<String> {
        self.lock().session().token().map(str::to_string)
    }

    fn on_unauthorized(&self) {
        if let Err(e) = self.lock().expire(SESSION_EXPIRED_MESSAGE) {
            warn!("session cleared in memory but not on disk: {e}");
        }
    }
}
