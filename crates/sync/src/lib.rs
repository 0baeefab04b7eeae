//! Incremental model sync.
//!
//! Mirrors a user's remote models into their local cache directory by file
//! name: a key is downloaded only when no file of the same name exists yet.
//! That makes re-running a sync cheap and lets an interrupted run pick up
//! where it stopped, but it also means a model replaced remotely under an
//! unchanged name is never refreshed locally.

pub mod error;
mod event;
mod provision;
mod sink;
mod stream;

pub use crate::event::{Outcome, Progress, SyncEvent, SyncReport};
pub use crate::provision::provision_viewer_assets;
pub use crate::sink::{ChannelSink, ProgressSink};
pub use crate::stream::{inventory, run, sync, sync_with};
