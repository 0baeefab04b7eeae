//! Configuration error types.

use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A configuration file named explicitly does not exist
    #[display("configuration file not found: {}", _0.display())]
    FileNotFound(#[error(not(source))] PathBuf),
    /// Configuration file extension is not one of toml, yaml/yml or json
    #[display("unsupported configuration format: {}", _0.display())]
    UnsupportedFormat(#[error(not(source))] PathBuf),
    /// The merged sources could not be deserialized
    #[display("could not read configuration")]
    Extract,
    /// A required setting is empty
    #[display("missing required setting `{_0}`")]
    Missing(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Configuration problems never fix themselves.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
