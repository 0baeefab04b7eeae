use crate::SyncEvent;
use tokio::sync::mpsc::UnboundedSender;

/// Receives [`SyncEvent`]s as [`sync_with`](crate::sync_with) produces them.
///
/// Any `FnMut(&SyncEvent)` closure is a sink. [`ChannelSink`] forwards events
/// to another task.
pub trait ProgressSink {
    fn on_event(&mut self, event: &SyncEvent);
}

impl<F> ProgressSink for F
where
    F: FnMut(&SyncEvent),
{
    fn on_event(&mut self, event: &SyncEvent) {
        self(event);
    }
}

/// Forwards every event down an unbounded channel.
///
/// Events sent after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelSink(UnboundedSender<SyncEvent>);
impl ChannelSink {
    pub fn new(sender: UnboundedSender<SyncEvent>) -> Self {
        Self(sender)
    }
}
impl From<UnboundedSender<SyncEvent>> for ChannelSink {
    fn from(sender: UnboundedSender<SyncEvent>) -> Self {
        Self(sender)
    }
}
impl ProgressSink for ChannelSink {
    fn on_event(&mut self, event: &SyncEvent) {
        if self.0.send(event.clone()).is_err() {
            tracing::trace!("Progress receiver dropped");
        }
    }
}
