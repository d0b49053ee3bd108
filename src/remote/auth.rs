//! Credential and token handling.
//!
//! The bearer token lives in a `SecretString` and is only exposed when a
//! request header is built. Login state is published on a watch channel so a
//! routing layer can redirect to the login view when the session ends.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tokio::sync::watch;

/// Email/password pair submitted to `POST /login`.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Holds the session's bearer token, if any.
#[derive(Default)]
pub struct TokenStore {
    token: RwLock<Option<SecretString>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set(token);
        store
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.token.write() = Some(SecretString::from(token.into()));
    }

    pub fn clear(&self) {
        *self.token.write() = None;
    }

    pub fn is_set(&self) -> bool {
        self.token.read().is_some()
    }

    /// Build the `Authorization` header value, if a token is held.
    pub(crate) fn bearer(&self) -> Option<String> {
        self.token
            .read()
            .as_ref()
            .map(|t| format!("Bearer {}", t.expose_secret()))
    }
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore")
            .field("token", &self.token.read().as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Whether the operator currently holds a usable session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    LoggedOut,
    LoggedIn,
}

/// Auth state published through a watch channel.
#[derive(Clone, Debug)]
pub struct AuthStateStore {
    sender: Arc<watch::Sender<AuthState>>,
    receiver: watch::Receiver<AuthState>,
}

impl AuthStateStore {
    pub fn new(initial: AuthState) -> Self {
        let (sender, receiver) = watch::channel(initial);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    pub fn current(&self) -> AuthState {
        *self.receiver.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.receiver.clone()
    }

    pub fn set(&self, state: AuthState) {
        self.sender.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }
}
