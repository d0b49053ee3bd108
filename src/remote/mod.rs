//! Remote user directory access.
//!
//! This module defines the `DirectoryClient` interface the sync engine talks
//! to, plus the reqwest-backed implementation for the HTTP directory API
//! (`GET /users?page=N`, `PUT /users/{id}`, `DELETE /users/{id}`, `POST /login`).

pub mod auth;
pub mod http;

use crate::error::Result;
use crate::types::{UserId, UserPatch, UserRecord, UsersPage};

pub use auth::{AuthState, AuthStateStore, Credentials, TokenStore};
pub use http::HttpDirectoryClient;

/// Common interface for the remote directory.
///
/// Implementations are stateless apart from the credentials they attach;
/// every method is a single network round trip. HTTP 401 must surface as
/// `UserdeckError::Auth` and transport failures as `UserdeckError::Network`.
pub trait DirectoryClient: Send + Sync {
    /// Exchange credentials for a bearer token
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    /// Fetch one remote page (1-based)
    fn fetch_page(&self, page: u32)
    -> impl std::future::Future<Output = Result<UsersPage>> + Send;

    /// Send a partial update and return the server's view of the record
    fn update_record(
        &self,
        id: UserId,
        patch: &UserPatch,
    ) -> impl std::future::Future<Output = Result<UserRecord>> + Send;

    /// Delete a record
    fn delete_record(&self, id: UserId) -> impl std::future::Future<Output = Result<()>> + Send;
}
