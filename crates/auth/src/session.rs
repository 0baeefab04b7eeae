use std::fmt;
use std::path::{Path, PathBuf};
use time::{Duration, UtcDateTime};

const REDACTED: &str = "<redacted>";

/// A signed-in user.
///
/// Only a successful sign-in creates one; it lives for the rest of the
/// process (or until [`logout()`](Self::logout)) and is passed explicitly to
/// everything that needs the user's identity or credential.
#[derive(Clone)]
pub struct Session {
    user_id: String,
    email: String,
    id_token: String,
    refresh_token: String,
    expires_at: UtcDateTime,
}

impl Session {
    pub fn new(
        user_id: impl Into<String>,
        email: impl Into<String>,
        id_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_in: Duration,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            id_token: id_token.into(),
            refresh_token: refresh_token.into(),
            expires_at: UtcDateTime::now() + expires_in,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Bearer credential for storage requests.
    pub fn id_token(&self) -> &str {
        &self.id_token
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    pub fn expires_at(&self) -> UtcDateTime {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        UtcDateTime::now() >= self.expires_at
    }

    /// Remote prefix holding this user's models: `models/<user-id>/`.
    pub fn model_prefix(&self) -> String {
        format!("models/{}/", self.user_id)
    }

    /// This user's directory under `downloads`.
    pub fn cache_dir(&self, downloads: &Path) -> PathBuf {
        downloads.join(&self.user_id)
    }

    /// End the session. Nothing is persisted, so dropping the credential is
    /// all there is to it.
    pub fn logout(self) {
        tracing::info!(user_id = %self.user_id, "Signed out");
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("id_token", &REDACTED)
            .field("refresh_token", &REDACTED)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
