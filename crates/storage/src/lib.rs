pub mod backend;
mod cache;
pub mod error;
mod key;
mod path;

#[cfg(any(test, feature = "mock"))]
pub use crate::backend::MockStore;
pub use crate::backend::{FirebaseStore, RemoteStore};
pub use crate::cache::{LocalCache, PARTIAL_SUFFIX};
pub use crate::key::{ObjectKey, Prefix};
pub use crate::path::validate as validate_path;
