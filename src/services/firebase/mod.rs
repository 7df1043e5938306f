//! Live backend over the Firebase REST APIs.
//!
//! - `auth`: email/password identity via the Identity Toolkit API
//! - `firestore`: entry storage in the `journalEntries` collection
//! - `document`: conversion between models and Firestore typed JSON values
//!
//! Both services share one [`FirebaseSession`], which holds the signed-in
//! credentials and broadcasts session transitions.

mod auth;
pub mod document;
mod firestore;

pub use auth::FirebaseAuthService;
pub use firestore::FirestoreJournalService;

use super::{AuthStateChange, AUTH_EVENT_CAPACITY};
use crate::errors::{AuthError, JournalError};
use crate::models::User;
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Endpoints and keys for one backend project.
#[derive(Clone)]
pub struct FirebaseSettings {
    pub api_key: String,
    pub project_id: String,
    pub auth_url: String,
    pub firestore_url: String,
}

impl fmt::Debug for FirebaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirebaseSettings")
            .field("api_key", &crate::constants::REDACTED_PLACEHOLDER)
            .field("project_id", &self.project_id)
            .field("auth_url", &self.auth_url)
            .field("firestore_url", &self.firestore_url)
            .finish()
    }
}

impl FirebaseSettings {
    /// Base URL for document paths, e.g. `.../databases/(default)/documents`.
    pub fn documents_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents",
            self.firestore_url.trim_end_matches('/'),
            self.project_id
        )
    }

    pub(crate) fn identity_url(&self, method: &str) -> String {
        format!(
            "{}/v1/accounts:{}?key={}",
            self.auth_url.trim_end_matches('/'),
            method,
            self.api_key
        )
    }
}

/// Credentials of the signed-in user.
#[derive(Clone)]
pub struct Credentials {
    pub user_id: String,
    pub email: String,
    pub id_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("id_token", &crate::constants::REDACTED_PLACEHOLDER)
            .finish()
    }
}

/// Shared session state for the live services.
#[derive(Debug)]
pub struct FirebaseSession {
    credentials: RwLock<Option<Credentials>>,
    events: broadcast::Sender<AuthStateChange>,
}

impl Default for FirebaseSession {
    fn default() -> Self {
        Self::new()
    }
}

impl FirebaseSession {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self {
            credentials: RwLock::new(None),
            events,
        }
    }

    pub fn credentials(&self) -> Option<Credentials> {
        self.credentials
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Identity-only record of the signed-in user.
    pub fn identity(&self) -> Option<User> {
        self.credentials()
            .map(|c| User::new(c.user_id, c.email, ""))
    }

    pub fn sign_in(&self, credentials: Credentials) {
        let identity = User::new(&credentials.user_id, &credentials.email, "");
        *self
            .credentials
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(credentials);
        info!("Session started for user {}", identity.id);
        let _ = self.events.send(AuthStateChange::SignedIn(identity));
    }

    pub fn sign_out(&self) {
        let previous = self
            .credentials
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(credentials) = previous {
            info!("Session ended for user {}", credentials.user_id);
            let _ = self.events.send(AuthStateChange::SignedOut);
        }
    }

    /// Ends the session after the backend rejected its token.
    pub fn expire(&self) {
        debug!("Backend rejected session token");
        self.sign_out();
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthStateChange> {
        self.events.subscribe()
    }
}

/// Failure of a single REST call, before mapping onto a taxonomy.
#[derive(Debug)]
pub(crate) enum RestError {
    /// No signed-in credentials; nothing was sent.
    NoSession,
    Transport(reqwest::Error),
    Status { status: StatusCode, message: String },
    Decode(String),
}

impl RestError {
    pub(crate) fn into_journal_error(self, session: &FirebaseSession) -> JournalError {
        match self {
            RestError::NoSession => JournalError::Unauthorized,
            RestError::Transport(err) => {
                warn!("Firestore unreachable: {}", err);
                JournalError::NetworkError
            }
            RestError::Decode(detail) => {
                warn!("Undecodable Firestore response: {}", detail);
                JournalError::DecodingError
            }
            RestError::Status { status, message } => match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    session.expire();
                    JournalError::Unauthorized
                }
                StatusCode::NOT_FOUND => JournalError::NotFound,
                StatusCode::BAD_REQUEST => JournalError::InvalidData(message),
                // only these reach the retry loop
                StatusCode::TOO_MANY_REQUESTS => {
                    JournalError::DatabaseError(status_detail(status, &message))
                }
                _ if status.is_server_error() => {
                    JournalError::DatabaseError(status_detail(status, &message))
                }
                _ if status.is_client_error() => {
                    JournalError::InvalidData(status_detail(status, &message))
                }
                _ => {
                    warn!("Unexpected Firestore status {}", status);
                    JournalError::Unknown
                }
            },
        }
    }

    /// Whether the store rejected the write because the document exists.
    pub(crate) fn is_conflict(&self) -> bool {
        matches!(self, RestError::Status { status, .. } if *status == StatusCode::CONFLICT)
    }

    pub(crate) fn into_auth_error(self) -> AuthError {
        match self {
            RestError::Transport(err) => {
                warn!("Profile request failed: {}", err);
                AuthError::NetworkError
            }
            other => {
                warn!("Profile request failed: {:?}", other);
                AuthError::Unknown
            }
        }
    }
}

fn status_detail(status: StatusCode, message: &str) -> String {
    format!("HTTP {}: {}", status.as_u16(), message)
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Extracts `error.message` from a Google API error body.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

/// Authenticated JSON client for Firestore document paths.
#[derive(Debug, Clone)]
pub(crate) struct FirestoreClient {
    http: Client,
    documents_url: String,
    session: Arc<FirebaseSession>,
}

impl FirestoreClient {
    pub(crate) fn new(
        http: Client,
        settings: &FirebaseSettings,
        session: Arc<FirebaseSession>,
    ) -> Self {
        Self {
            http,
            documents_url: settings.documents_url(),
            session,
        }
    }

    pub(crate) fn session(&self) -> &FirebaseSession {
        &self.session
    }

    /// Sends a request to `{documents_url}{path}` and returns the JSON body.
    ///
    /// `path` starts with `/` for document paths or `:` for collection-group
    /// methods such as `:runQuery`.
    pub(crate) async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value, RestError> {
        let credentials = self.session.credentials().ok_or(RestError::NoSession)?;
        let url = format!("{}{}", self.documents_url, path);
        debug!("Firestore {} {}", method, path);

        let mut request = self
            .http
            .request(method, &url)
            .bearer_auth(&credentials.id_token)
            .query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(RestError::Transport)?;
        let status = response.status();
        let text = response.text().await.map_err(RestError::Transport)?;

        if !status.is_success() {
            return Err(RestError::Status {
                status,
                message: error_message(&text),
            });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| RestError::Decode(e.to_string()))
    }
}
