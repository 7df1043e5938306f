//! Email/password identity via the Identity Toolkit REST API.

use super::document::{user_fields, user_from_document};
use super::{error_message, Credentials, FirebaseSession, FirebaseSettings, FirestoreClient};
use crate::constants::USERS_COLLECTION;
use crate::errors::AuthError;
use crate::models::User;
use crate::services::{AuthService, AuthStateChange};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OobCodeRequest<'a> {
    request_type: &'static str,
    email: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    id_token: String,
}

/// Maps an Identity Toolkit error message onto the auth taxonomy.
///
/// Messages look like `EMAIL_EXISTS` or `WEAK_PASSWORD : Password should be ...`.
fn map_identity_error(message: &str) -> AuthError {
    let code = message
        .split(|c: char| c == ' ' || c == ':')
        .next()
        .unwrap_or_default();
    match code {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "INVALID_EMAIL"
        | "USER_DISABLED" | "MISSING_PASSWORD" | "MISSING_EMAIL" => AuthError::InvalidCredentials,
        "EMAIL_EXISTS" => AuthError::UserAlreadyExists,
        "WEAK_PASSWORD" => AuthError::WeakPassword,
        _ => {
            warn!("Unmapped identity error: {}", message);
            AuthError::Unknown
        }
    }
}

/// Live [`AuthService`].
#[derive(Debug, Clone)]
pub struct FirebaseAuthService {
    http: Client,
    settings: FirebaseSettings,
    firestore: FirestoreClient,
    session: Arc<FirebaseSession>,
}

impl FirebaseAuthService {
    pub fn new(settings: &FirebaseSettings, session: Arc<FirebaseSession>) -> Self {
        Self::with_client(Client::new(), settings, session)
    }

    pub fn with_client(
        http: Client,
        settings: &FirebaseSettings,
        session: Arc<FirebaseSession>,
    ) -> Self {
        Self {
            firestore: FirestoreClient::new(http.clone(), settings, session.clone()),
            http,
            settings: settings.clone(),
            session,
        }
    }

    async fn post_identity<B, R>(&self, method: &str, body: &B) -> Result<R, AuthError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        debug!("Identity request accounts:{}", method);
        let response = self
            .http
            .post(self.settings.identity_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!("Identity service unreachable: {}", e);
                AuthError::NetworkError
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            warn!("Identity response interrupted: {}", e);
            AuthError::NetworkError
        })?;

        if !status.is_success() {
            return Err(map_identity_error(&error_message(&text)));
        }
        serde_json::from_str(&text).map_err(|e| {
            warn!("Undecodable identity response: {}", e);
            AuthError::Unknown
        })
    }

    async fn sign_in_with(
        &self,
        method: &str,
        email: &str,
        password: &str,
    ) -> Result<Credentials, AuthError> {
        let request = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let response: IdentityResponse = self.post_identity(method, &request).await?;
        let credentials = Credentials {
            email: if response.email.is_empty() {
                email.to_string()
            } else {
                response.email
            },
            user_id: response.local_id,
            id_token: response.id_token,
        };
        self.session.sign_in(credentials.clone());
        Ok(credentials)
    }

    fn profile_path(user_id: &str) -> String {
        format!("/{}/{}", USERS_COLLECTION, user_id)
    }
}

#[async_trait]
impl AuthService for FirebaseAuthService {
    async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let credentials = self
            .sign_in_with("signInWithPassword", email, password)
            .await?;
        info!("Signed in user {}", credentials.user_id);
        Ok(User::new(credentials.user_id, credentials.email, ""))
    }

    async fn signup(&self, email: &str, password: &str, name: &str) -> Result<User, AuthError> {
        let credentials = self.sign_in_with("signUp", email, password).await?;
        info!("Created account {}", credentials.user_id);

        let profile = User::new(credentials.user_id, credentials.email, name);
        if let Err(e) = self.save_profile(&profile).await {
            warn!("Default profile was not written for {}: {}", profile.id, e);
        }
        Ok(profile)
    }

    async fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        let request = OobCodeRequest {
            request_type: "PASSWORD_RESET",
            email,
        };
        let _: Value = self.post_identity("sendOobCode", &request).await?;
        info!("Password reset email requested");
        Ok(())
    }

    async fn logout(&self) -> Result<(), AuthError> {
        self.session.sign_out();
        Ok(())
    }

    async fn current_user(&self) -> Option<User> {
        self.session.identity()
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<User, AuthError> {
        let document = self
            .firestore
            .request(Method::GET, &Self::profile_path(user_id), &[], None)
            .await
            .map_err(|e| e.into_auth_error())?;
        user_from_document(&document).map_err(|e| {
            warn!("Undecodable profile for {}: {}", user_id, e);
            AuthError::Unknown
        })
    }

    async fn save_profile(&self, user: &User) -> Result<(), AuthError> {
        let body = json!({ "fields": user_fields(user) });
        self.firestore
            .request(Method::PATCH, &Self::profile_path(&user.id), &[], Some(&body))
            .await
            .map_err(|e| e.into_auth_error())?;
        debug!("Saved profile for {}", user.id);
        Ok(())
    }

    fn auth_state_changes(&self) -> broadcast::Receiver<AuthStateChange> {
        self.session.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};

    fn service(server: &ServerGuard) -> (FirebaseAuthService, Arc<FirebaseSession>) {
        let settings = FirebaseSettings {
            api_key: "web-key".to_string(),
            project_id: "moodlog-test".to_string(),
            auth_url: server.url(),
            firestore_url: server.url(),
        };
        let session = Arc::new(FirebaseSession::new());
        (FirebaseAuthService::new(&settings, session.clone()), session)
    }

    async fn identity_error(
        server: &mut ServerGuard,
        method: &str,
        message: &str,
    ) -> mockito::Mock {
        server
            .mock("POST", format!("/v1/accounts:{}", method).as_str())
            .match_query(Matcher::UrlEncoded("key".to_string(), "web-key".to_string()))
            .with_status(400)
            .with_body(format!(r#"{{"error":{{"code":400,"message":"{}"}}}}"#, message))
            .create_async()
            .await
    }

    #[test]
    fn test_identity_error_mapping() {
        assert_eq!(map_identity_error("EMAIL_NOT_FOUND"), AuthError::InvalidCredentials);
        assert_eq!(
            map_identity_error("INVALID_LOGIN_CREDENTIALS"),
            AuthError::InvalidCredentials
        );
        assert_eq!(map_identity_error("EMAIL_EXISTS"), AuthError::UserAlreadyExists);
        assert_eq!(
            map_identity_error("WEAK_PASSWORD : Password should be at least 6 characters"),
            AuthError::WeakPassword
        );
        assert_eq!(
            map_identity_error("TOO_MANY_ATTEMPTS_TRY_LATER : Access disabled"),
            AuthError::Unknown
        );
    }

    #[tokio::test]
    async fn test_login_starts_session() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/accounts:signInWithPassword")
            .match_query(Matcher::UrlEncoded("key".to_string(), "web-key".to_string()))
            .match_body(Matcher::PartialJson(json!({
                "email": "ada@example.com",
                "returnSecureToken": true,
            })))
            .with_status(200)
            .with_body(
                json!({
                    "localId": "uid-7",
                    "email": "ada@example.com",
                    "idToken": "tok",
                    "refreshToken": "r",
                    "expiresIn": "3600",
                })
                .to_string(),
            )
            .create_async()
            .await;

        let (auth, session) = service(&server);
        let mut events = auth.auth_state_changes();
        let user = auth.login("ada@example.com", "pw123456").await.unwrap();

        mock.assert_async().await;
        assert_eq!(user.id, "uid-7");
        assert_eq!(session.credentials().unwrap().id_token, "tok");
        assert_eq!(auth.current_user().await.unwrap().id, "uid-7");
        assert!(matches!(events.recv().await.unwrap(), AuthStateChange::SignedIn(_)));
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let mut server = Server::new_async().await;
        let _mock = identity_error(&mut server, "signInWithPassword", "INVALID_PASSWORD").await;

        let (auth, session) = service(&server);
        assert_eq!(
            auth.login("ada@example.com", "nope").await,
            Err(AuthError::InvalidCredentials)
        );
        assert!(session.credentials().is_none());
    }

    #[tokio::test]
    async fn test_signup_existing_email() {
        let mut server = Server::new_async().await;
        let _mock = identity_error(&mut server, "signUp", "EMAIL_EXISTS").await;

        let (auth, _) = service(&server);
        assert_eq!(
            auth.signup("ada@example.com", "pw123456", "Ada").await,
            Err(AuthError::UserAlreadyExists)
        );
    }

    #[tokio::test]
    async fn test_signup_writes_default_profile() {
        let mut server = Server::new_async().await;
        let _signup = server
            .mock("POST", "/v1/accounts:signUp")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"localId":"uid-new","email":"new@example.com","idToken":"tok"}"#)
            .create_async()
            .await;
        let profile = server
            .mock(
                "PATCH",
                "/v1/projects/moodlog-test/databases/(default)/documents/users/uid-new",
            )
            .match_header("authorization", "Bearer tok")
            .match_body(Matcher::PartialJson(json!({
                "fields": {
                    "name": { "stringValue": "Newcomer" },
                    "notificationsEnabled": { "booleanValue": true },
                    "reminderTime": { "timestampValue": "1970-01-01T20:00:00.000000Z" },
                }
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let (auth, _) = service(&server);
        let user = auth
            .signup("new@example.com", "pw123456", "Newcomer")
            .await
            .unwrap();

        profile.assert_async().await;
        assert_eq!(user.name, "Newcomer");
        assert!(user.notifications_enabled);
    }

    #[tokio::test]
    async fn test_reset_password_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/accounts:sendOobCode")
            .match_query(Matcher::Any)
            .match_body(Matcher::Json(json!({
                "requestType": "PASSWORD_RESET",
                "email": "ada@example.com",
            })))
            .with_status(200)
            .with_body(r#"{"email":"ada@example.com"}"#)
            .create_async()
            .await;

        let (auth, _) = service(&server);
        auth.reset_password("ada@example.com").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_profile_without_session_is_unknown() {
        let server = Server::new_async().await;
        let (auth, _) = service(&server);
        assert_eq!(auth.fetch_profile("uid-1").await, Err(AuthError::Unknown));
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let server = Server::new_async().await;
        let (auth, session) = service(&server);
        session.sign_in(Credentials {
            user_id: "u".to_string(),
            email: "e@x.io".to_string(),
            id_token: "t".to_string(),
        });

        auth.logout().await.unwrap();
        assert!(auth.current_user().await.is_none());
    }
}
