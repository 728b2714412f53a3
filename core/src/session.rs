//! Collaborators the client reads from and reports to.
//!
//! `CredentialStore` supplies the bearer token, read once per request.
//! `SessionObserver` hears about rejected sessions so the application can
//! send the user back to login.

use std::sync::RwLock;

use tokio::sync::mpsc::UnboundedSender;

/// Source of the current bearer token.
pub trait CredentialStore: Send + Sync {
    /// The token to send, or `None` to send no `Authorization` header.
    fn token(&self) -> Option<String>;
}

/// In-process token holder, written after login and cleared on logout.
#[derive(Debug, Default)]
pub struct MemoryCredentials {
    token: RwLock<Option<String>>,
}

impl MemoryCredentials {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: RwLock::new(token),
        }
    }

    pub fn set(&self, token: impl Into<String>) {
        // a poisoned lock still holds a usable Option
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(token.into());
    }

    pub fn clear(&self) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }
}

impl CredentialStore for MemoryCredentials {
    fn token(&self) -> Option<String> {
        let guard = self.token.read().unwrap_or_else(|e| e.into_inner());
        guard.clone().filter(|token| !token.is_empty())
    }
}

/// Something that happened to the session as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A request came back 401.
    Unauthorized,
}

/// Receives session notifications.
///
/// The client dispatches each call in the background, so the failing request
/// returns without waiting for it. A panic here is logged and swallowed.
pub trait SessionObserver: Send + Sync {
    fn unauthorized(&self);
}

impl SessionObserver for UnboundedSender<SessionEvent> {
    fn unauthorized(&self) {
        if self.send(SessionEvent::Unauthorized).is_err() {
            tracing::debug!("no subscriber for session events");
        }
    }
}
