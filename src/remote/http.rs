//! reqwest implementation of the directory API.
//!
//! # Security Note - Logging
//!
//! The bearer token and API key are attached through `RedactedHeader`, whose
//! `Display`/`Debug` never print the value, and the resulting header values are
//! marked sensitive so reqwest's own debug output hides them too.

use std::fmt;
use std::sync::Arc;

use reqwest::header::{self, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use crate::config::Config;
use crate::error::{Result, UserdeckError};
use crate::types::{UserId, UserPatch, UserRecord, UsersPage};

use super::{Credentials, DirectoryClient, TokenStore};

/// Wrapper for sensitive header values that redacts the value when formatted.
struct RedactedHeader {
    value: String,
}

impl RedactedHeader {
    fn new(value: String) -> Self {
        Self { value }
    }

    fn as_header_value(&self) -> Result<HeaderValue> {
        let mut value = HeaderValue::from_str(&self.value)
            .map_err(|_| UserdeckError::Config("credential is not a valid header value".into()))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Display for RedactedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl fmt::Debug for RedactedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedactedHeader")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

/// Body of `PUT /users/{id}`. Mock backends echo only what they received, so
/// every field is optional.
#[derive(Deserialize)]
struct UpdateResponse {
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    avatar: Option<String>,
}

impl UpdateResponse {
    fn into_record(self, id: UserId) -> UserRecord {
        UserRecord {
            id,
            email: self.email.unwrap_or_default(),
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name.unwrap_or_default(),
            avatar: self.avatar.unwrap_or_default(),
        }
    }
}

/// HTTP directory client.
pub struct HttpDirectoryClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    tokens: Arc<TokenStore>,
}

impl fmt::Debug for HttpDirectoryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpDirectoryClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("tokens", &self.tokens)
            .finish()
    }
}

impl HttpDirectoryClient {
    /// Create a client from configuration, sharing the session's token store.
    ///
    /// Timeouts come from the config; a timed-out request surfaces as
    /// `UserdeckError::Network`.
    pub fn from_config(config: &Config, tokens: Arc<TokenStore>) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| UserdeckError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            api_key: config.api_key(),
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the API key and bearer token, when present.
    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let mut request = request;
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", RedactedHeader::new(key.clone()).as_header_value()?);
        }
        if let Some(bearer) = self.tokens.bearer() {
            request = request.header(
                header::AUTHORIZATION,
                RedactedHeader::new(bearer).as_header_value()?,
            );
        }
        Ok(request)
    }

    async fn send(&self, request: RequestBuilder, context: &str) -> Result<Response> {
        let response = self.authorize(request)?.send().await?;
        check_status(response, context).await
    }
}

/// Map non-success statuses onto the error taxonomy.
async fn check_status(response: Response, context: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = api_error_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });

    Err(match status {
        StatusCode::UNAUTHORIZED => UserdeckError::Auth(message),
        StatusCode::NOT_FOUND => UserdeckError::NotFound(context.to_string()),
        _ => UserdeckError::Api {
            status: status.as_u16(),
            message,
        },
    })
}

/// Pull `{"error": "..."}` out of an error body.
fn api_error_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: String,
    }
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|b| b.error)
}

impl DirectoryClient for HttpDirectoryClient {
    async fn login(&self, credentials: &Credentials) -> Result<String> {
        let request = self.client.post(self.url("/login")).json(credentials);
        let response = match self.send(request, "login").await {
            // reqres answers a bad login with 400 rather than 401
            Err(UserdeckError::Api { status: 400, message }) => {
                return Err(UserdeckError::Auth(message));
            }
            other => other?,
        };
        let body: LoginResponse = response.json().await?;
        tracing::debug!(email = %credentials.email, "login succeeded");
        Ok(body.token)
    }

    async fn fetch_page(&self, page: u32) -> Result<UsersPage> {
        let request = self
            .client
            .get(self.url("/users"))
            .query(&[("page", page)]);
        let response = self.send(request, &format!("page {page}")).await?;
        let body: UsersPage = response.json().await?;
        tracing::debug!(
            page,
            records = body.data.len(),
            total_pages = body.total_pages,
            "fetched users page"
        );
        Ok(body)
    }

    async fn update_record(&self, id: UserId, patch: &UserPatch) -> Result<UserRecord> {
        let request = self.client.put(self.url(&format!("/users/{id}"))).json(patch);
        let response = self.send(request, &id.to_string()).await?;
        let body: UpdateResponse = response.json().await?;
        Ok(body.into_record(id))
    }

    async fn delete_record(&self, id: UserId) -> Result<()> {
        let request = self.client.delete(self.url(&format!("/users/{id}")));
        self.send(request, &id.to_string()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacted_header_display() {
        let header = RedactedHeader::new("Bearer secret".to_string());
        assert_eq!(header.to_string(), "[REDACTED]");
        assert!(!format!("{header:?}").contains("secret"));
        assert!(header.as_header_value().unwrap().is_sensitive());
    }

    #[test]
    fn test_redacted_header_rejects_newlines() {
        let header = RedactedHeader::new("Bearer a\nb".to_string());
        assert!(matches!(
            header.as_header_value(),
            Err(UserdeckError::Config(_))
        ));
    }

    #[test]
    fn test_api_error_message() {
        assert_eq!(
            api_error_message(r#"{"error": "Missing password"}"#).as_deref(),
            Some("Missing password")
        );
        assert_eq!(api_error_message("<html>"), None);
    }

    #[test]
    #[serial_test::serial]
    fn test_from_config_trims_trailing_slash() {
        let config = Config {
            base_url: "http://localhost:1234/api/".to_string(),
            ..Config::default()
        };
        let client = HttpDirectoryClient::from_config(&config, Arc::new(TokenStore::new())).unwrap();
        assert_eq!(client.base_url(), "http://localhost:1234/api");
        assert_eq!(client.url("/users"), "http://localhost:1234/api/users");
    }

    #[test]
    fn test_update_response_fills_missing_fields() {
        let body: UpdateResponse =
            serde_json::from_str(r#"{"first_name": "X", "updatedAt": "2024-01-01T00:00:00Z"}"#)
                .unwrap();
        let record = body.into_record(UserId::new(2));
        assert_eq!(record.id, UserId::new(2));
        assert_eq!(record.first_name, "X");
        assert!(record.last_name.is_empty());
        assert!(record.avatar.is_empty());
    }
}
