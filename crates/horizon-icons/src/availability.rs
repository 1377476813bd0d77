//! Known icon names and the time-based recheck of missing ones.
//!
//! Lookups for icons that do not exist are expensive (every theme directory
//! is probed), so their absence is remembered. To let freshly installed icons
//! show up without a restart, remembered absences are re-checked at most once
//! per interval, measured on a monotonic [`Clock`].

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Default interval between rechecks of missing icons.
pub const DEFAULT_RECHECK_INTERVAL: Duration = Duration::from_millis(5000);

/// A monotonic time source.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Time elapsed since an arbitrary fixed origin. Never decreases.
    fn now(&self) -> Duration;
}

/// The system's monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A clock that only moves when told to.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use horizon_icons::{Clock, ManualClock};
///
/// let clock = ManualClock::new();
/// clock.advance(Duration::from_millis(5001));
/// assert_eq!(clock.now(), Duration::from_millis(5001));
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set(&self, at: Duration) {
        self.millis.fetch_max(at.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

/// Measures elapsed time on a shared [`Clock`].
#[derive(Debug, Clone)]
pub struct Stopwatch {
    clock: Arc<dyn Clock>,
    started_at: Option<Duration>,
}

impl Stopwatch {
    /// A stopwatch that has not been started.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            started_at: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn restart(&mut self) {
        self.started_at = Some(self.clock.now());
    }

    pub fn invalidate(&mut self) {
        self.started_at = None;
    }

    /// Time since the last restart, `None` if never started.
    pub fn elapsed(&self) -> Option<Duration> {
        self.started_at
            .map(|start| self.clock.now().saturating_sub(start))
    }
}

/// Rate limits rechecks of icons known to be missing.
#[derive(Debug, Clone)]
pub struct AgeGovernor {
    stopwatch: Stopwatch,
    interval: Duration,
}

impl AgeGovernor {
    pub fn new(clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            stopwatch: Stopwatch::new(clock),
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether a missing icon should be looked up again.
    ///
    /// Returns `false` while less than the interval has passed since the last
    /// recheck. Otherwise the interval starts over and `true` is returned.
    pub fn should_recheck(&mut self) -> bool {
        if let Some(elapsed) = self.stopwatch.elapsed()
            && elapsed <= self.interval
        {
            return false;
        }
        self.stopwatch.restart();
        true
    }

    /// Record that a lookup just came back empty.
    pub fn record_miss(&mut self) {
        self.stopwatch.restart();
    }

    /// Forget the last check so the next query rechecks.
    pub fn reset(&mut self) {
        self.stopwatch.invalidate();
    }
}

/// Icon names mapped to their resolved path, or `None` when known missing.
#[derive(Debug, Clone, Default)]
pub struct AvailabilityMap {
    entries: HashMap<String, Option<PathBuf>>,
}

impl AvailabilityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` when the name was never looked up.
    pub fn get(&self, name: &str) -> Option<Option<&Path>> {
        self.entries.get(name).map(|path| path.as_deref())
    }

    pub fn insert(&mut self, name: impl Into<String>, path: Option<PathBuf>) {
        self.entries.insert(name.into(), path);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
