//! CLI Error Types
//!
//! Every variant's `Display` is the single line shown to the user; the error
//! tree underneath is only ever logged.

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("Configuration error: {_0}")]
    Config(#[error(not(source))] String),
    #[display("Could not read the password.")]
    Password,
    /// Carries the authentication failure's user message.
    #[display("{_0}")]
    Auth(#[error(not(source))] String),
    #[display("Could not connect to cloud storage. Please check your configuration.")]
    Storage,
    #[display("Could not fetch your models. Please try again later.")]
    Listing,
    #[display("Could not copy the viewer files into your model directory.")]
    Provision,
    #[display("Could not prepare your local model directory.")]
    Cache,
    /// Carries the launch failure's description.
    #[display("Failed to launch viewer: {_0}")]
    Launch(#[error(not(source))] String),
}
