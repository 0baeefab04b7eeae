use archeon_storage::ObjectKey;
use derive_more::Display;

/// Overall progress of a sync session.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[display("{processed}/{total}")]
pub struct Progress {
    pub processed: u64,
    pub total: u64,
}
impl Progress {
    pub fn new(total: u64) -> Self {
        Self { processed: 0, total }
    }

    /// Fraction processed, `1.0` for an empty session.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.processed as f64 / self.total as f64
    }

    pub fn is_complete(&self) -> bool {
        self.processed >= self.total
    }

    pub(crate) fn advance(&mut self) {
        self.processed = (self.processed + 1).min(self.total);
    }
}

/// What happened to one remote key.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum Outcome {
    #[display("downloaded ({bytes} bytes)")]
    Downloaded { bytes: u64 },
    /// A file with the same name was already present. Its content was not
    /// compared with the remote object.
    #[display("skipped, already present")]
    Skipped,
    #[display("failed: {reason}")]
    Failed { reason: String },
}
impl Outcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Per-key outcomes of a sync session, in processing order.
///
/// There is no aggregate success or failure; an empty report means there
/// were no files to sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    entries: Vec<(ObjectKey, Outcome)>,
}
impl SyncReport {
    pub(crate) fn push(&mut self, key: ObjectKey, outcome: Outcome) {
        self.entries.push((key, outcome));
    }

    pub fn entries(&self) -> &[(ObjectKey, Outcome)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn downloaded(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Downloaded { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(Outcome::is_failed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &(ObjectKey, Outcome)> {
        self.entries.iter().filter(|(_, outcome)| outcome.is_failed())
    }

    fn count(&self, f: impl Fn(&Outcome) -> bool) -> usize {
        self.entries.iter().filter(|(_, outcome)| f(outcome)).count()
    }
}

/// Progress events emitted by [`sync`](crate::sync) as it works through the
/// remote keys.
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started): exactly once, with the total key count.
/// 2. [`Processing`](Self::Processing) then [`Finished`](Self::Finished):
///    once each per key, in listing order.
/// 3. [`Complete`](Self::Complete): exactly once, signalling the stream is
///    finished.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    Started { total: u64 },
    /// About to examine `key`; `progress` counts the keys already finished.
    Processing { key: ObjectKey, progress: Progress },
    /// Done with `key`; `progress` includes it.
    Finished { key: ObjectKey, outcome: Outcome, progress: Progress },
    Complete(SyncReport),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0, 1.0)]
    #[case(0, 4, 0.0)]
    #[case(1, 4, 0.25)]
    #[case(4, 4, 1.0)]
    fn test_fraction(#[case] processed: u64, #[case] total: u64, #[case] expected: f64) {
        assert_eq!(Progress { processed, total }.fraction(), expected);
    }

    #[test]
    fn test_advance_saturates() {
        let mut progress = Progress::new(1);
        progress.advance();
        progress.advance();
        assert_eq!(progress, Progress { processed: 1, total: 1 });
        assert!(progress.is_complete());
        assert_eq!(progress.to_string(), "1/1");
    }

    #[test]
    fn test_report_counts() {
        let mut report = SyncReport::default();
        assert!(report.is_empty());
        report.push(ObjectKey::new("models/u1/a.gs"), Outcome::Downloaded { bytes: 3 });
        report.push(ObjectKey::new("models/u1/b.gs"), Outcome::Skipped);
        report.push(ObjectKey::new("models/u1/c.gs"), Outcome::Failed { reason: "boom".to_string() });
        assert_eq!((report.downloaded(), report.skipped(), report.failed()), (1, 1, 1));
        assert_eq!(report.failures().next().map(|(k, _)| k.as_str()), Some("models/u1/c.gs"));
    }
}
