//! Starting the viewers.
//!
//! Nothing here supervises what it starts: once a viewer or browser process
//! is spawned it is never waited on or killed.

mod browser;
pub mod error;
mod native;

pub use crate::browser::{BROWSERS, Browser, open_url, validate_url};
pub use crate::native::NativeViewer;
