//! Signing users in and the session that results.

pub mod error;
mod firebase;
mod session;

pub use crate::firebase::FirebaseAuth;
pub use crate::session::Session;
use async_trait::async_trait;

/// Something that can turn an email and password into a [`Session`].
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Sign in with email and password.
    ///
    /// Empty credentials are rejected as
    /// [`InvalidCredentials`](error::ErrorKind::InvalidCredentials) without
    /// contacting the service.
    async fn sign_in(&self, email: &str, password: &str) -> error::Result<Session>;
}
