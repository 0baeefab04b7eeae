//! Firebase Authentication (Identity Toolkit) email/password sign-in.

use crate::error::{ErrorKind, Result};
use crate::{Authenticator, Session};
use async_trait::async_trait;
use exn::ResultExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

const TIMEOUT: Duration = Duration::from_secs(30);
/// Identity Toolkit's documented default token lifetime.
const DEFAULT_EXPIRES_IN: i64 = 3600;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    id_token: String,
    #[serde(default)]
    refresh_token: String,
    /// Seconds, as a string.
    expires_in: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Signs users in against `<endpoint>/accounts:signInWithPassword`.
#[derive(Clone)]
pub struct FirebaseAuth {
    client: Client,
    url: Url,
}
impl FirebaseAuth {
    pub const DEFAULT_ENDPOINT: &'static str = "https://identitytoolkit.googleapis.com/v1";

    pub fn new(endpoint: &str, api_key: &str) -> Result<Self> {
        let raw = format!("{}/accounts:signInWithPassword", endpoint.trim_end_matches('/'));
        let mut url = Url::parse(&raw).or_raise(|| ErrorKind::InvalidEndpoint(raw.clone()))?;
        url.query_pairs_mut().append_pair("key", api_key);
        let client = Client::builder().timeout(TIMEOUT).build().map_err(|e| ErrorKind::Network(e.to_string()))?;
        Ok(Self { client, url })
    }

    fn session_from(response: SignInResponse, fallback_email: &str) -> Result<Session> {
        let uid = response.local_id;
        // The user id becomes a path segment, locally and remotely.
        if uid.is_empty() || uid.contains(['/', '\\']) || uid == "." || uid == ".." {
            exn::bail!(ErrorKind::Server(format!("unusable user id `{uid}`")));
        }
        let expires_in = response
            .expires_in
            .as_deref()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(DEFAULT_EXPIRES_IN);
        let email = if response.email.is_empty() { fallback_email.to_string() } else { response.email };
        Ok(Session::new(
            uid,
            email,
            response.id_token,
            response.refresh_token,
            time::Duration::seconds(expires_in),
        ))
    }
}

#[async_trait]
impl Authenticator for FirebaseAuth {
    #[instrument(skip_all, fields(email = %email))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            exn::bail!(ErrorKind::InvalidCredentials);
        }
        let body = serde_json::to_vec(&SignInRequest {
            email,
            password,
            return_secure_token: true,
        })
        .map_err(|e| ErrorKind::Server(e.to_string()))?;

        let response = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| ErrorKind::Network(e.to_string()))?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| ErrorKind::Network(e.to_string()))?;

        if status.is_server_error() {
            exn::bail!(ErrorKind::Server(format!("HTTP {}", status.as_u16())));
        }
        if !status.is_success() {
            let parsed: std::result::Result<ErrorResponse, _> = serde_json::from_slice(&bytes);
            let kind = match parsed {
                Ok(body) => ErrorKind::from_firebase_message(&body.error.message),
                Err(e) => ErrorKind::Server(format!("HTTP {}: {e}", status.as_u16())),
            };
            tracing::debug!(status = status.as_u16(), error = %kind, "Sign-in refused");
            exn::bail!(kind);
        }

        let parsed = serde_json::from_slice::<SignInResponse>(&bytes)
            .map_err(|e| ErrorKind::Server(format!("malformed sign-in response: {e}")))?;
        let session = Self::session_from(parsed, email)?;
        tracing::info!(user_id = %session.user_id(), "Signed in");
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PATH: &str = "/accounts:signInWithPassword";

    fn auth(server: &MockServer) -> FirebaseAuth {
        FirebaseAuth::new(&server.uri(), "api-key").unwrap()
    }

    #[tokio::test]
    async fn test_sign_in() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(PATH))
            .and(query_param("key", "api-key"))
            .and(body_json(json!({
                "email": "me@example.com",
                "password": "hunter2",
                "returnSecureToken": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kind": "identitytoolkit#VerifyPasswordResponse",
                "localId": "u1",
                "email": "me@example.com",
                "displayName": "",
                "idToken": "id-token",
                "registered": true,
                "refreshToken": "refresh-token",
                "expiresIn": "3600"
            })))
            .expect(1)
            .mount(&server)
            .await;
        let session = auth(&server).sign_in(" me@example.com ", "hunter2").await.unwrap();
        assert_eq!(session.user_id(), "u1");
        assert_eq!(session.email(), "me@example.com");
        assert_eq!(session.id_token(), "id-token");
        assert_eq!(session.refresh_token(), "refresh-token");
        assert!(!session.is_expired());
    }

    #[rstest]
    #[case("INVALID_PASSWORD", ErrorKind::InvalidCredentials)]
    #[case("EMAIL_NOT_FOUND", ErrorKind::InvalidCredentials)]
    #[case("INVALID_LOGIN_CREDENTIALS", ErrorKind::InvalidCredentials)]
    #[case("USER_DISABLED", ErrorKind::AccountDisabled)]
    #[case("TOO_MANY_ATTEMPTS_TRY_LATER : Try again later.", ErrorKind::TooManyAttempts)]
    #[case("PROJECT_NOT_FOUND", ErrorKind::Rejected("PROJECT_NOT_FOUND".to_string()))]
    #[tokio::test]
    async fn test_sign_in_error_codes(#[case] message: &str, #[case] expected: ErrorKind) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"code": 400, "message": message, "errors": [{"message": message, "domain": "global"}]}
            })))
            .mount(&server)
            .await;
        let err = auth(&server).sign_in("me@example.com", "pw").await.unwrap_err();
        assert_eq!(*err, expected);
    }

    #[tokio::test]
    async fn test_sign_in_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;
        let err = auth(&server).sign_in("me@example.com", "pw").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Server(_)));
    }

    #[tokio::test]
    async fn test_sign_in_non_json_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("<html>bad gateway</html>"))
            .mount(&server)
            .await;
        let err = auth(&server).sign_in("me@example.com", "pw").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Server(_)));
    }

    #[tokio::test]
    async fn test_sign_in_malformed_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"kind": "nothing useful"})))
            .mount(&server)
            .await;
        let err = auth(&server).sign_in("me@example.com", "pw").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Server(_)));
    }

    #[tokio::test]
    async fn test_sign_in_rejects_path_like_user_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"localId": "../u1", "idToken": "t"})))
            .mount(&server)
            .await;
        let err = auth(&server).sign_in("me@example.com", "pw").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Server(_)));
    }

    #[tokio::test]
    async fn test_sign_in_network_error() {
        // Nothing listens on port 1.
        let auth = FirebaseAuth::new("http://127.0.0.1:1", "api-key").unwrap();
        let err = auth.sign_in("me@example.com", "pw").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Network(_)));
        assert!(err.is_retryable());
    }

    #[rstest]
    #[case("", "pw")]
    #[case("   ", "pw")]
    #[case("me@example.com", "")]
    #[tokio::test]
    async fn test_sign_in_empty_input_never_hits_network(#[case] email: &str, #[case] password: &str) {
        let server = MockServer::start().await;
        Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;
        let err = auth(&server).sign_in(email, password).await.unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidCredentials);
    }

    #[test]
    fn test_new_rejects_garbage_endpoint() {
        let err = FirebaseAuth::new("::not a url::", "k").err().unwrap();
        assert!(matches!(&*err, ErrorKind::InvalidEndpoint(_)));
    }
}
