//! Pull-based refresh scheduling.
//!
//! Nothing runs in the background: the owner of the debugging session
//! calls [`SnapshotTree::poll`](crate::SnapshotTree::poll) from its own loop
//! (e.g. between simulation steps) and the schedule decides whether a
//! refresh is due.

use std::time::{Duration, Instant};

/// Default time between refreshes.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

/// Snapshot settings read from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotConfig {
    /// Minimum time between two scheduled refreshes.
    pub interval: Duration,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl SnapshotConfig {
    /// Read `SNAPSHOT_INTERVAL_MS`, falling back to the default when unset
    /// or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let interval = lookup("SNAPSHOT_INTERVAL_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map_or(DEFAULT_INTERVAL, Duration::from_millis);
        Self { interval }
    }

    #[must_use]
    pub const fn schedule(&self) -> RefreshSchedule {
        RefreshSchedule::new(self.interval)
    }
}

/// Interval gate deciding when the next refresh is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSchedule {
    interval: Duration,
    last: Option<Instant>,
}

impl RefreshSchedule {
    /// A schedule whose first check is always due.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        self.last
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval)
    }

    /// Record that a refresh ran at `now`.
    pub fn mark(&mut self, now: Instant) {
        self.last = Some(now);
    }

    /// When the next refresh becomes due.
    ///
    /// `None` before the first refresh, and also when the deadline lies
    /// beyond what [`Instant`] can represent.
    #[must_use]
    pub fn next_due(&self) -> Option<Instant> {
        self.last.and_then(|last| last.checked_add(self.interval))
    }
}
