// Failure counter over a trailing time window.
// Feed it with `record_failure`; `check` ignores its input and prunes expired entries.

use std::{
    collections::VecDeque,
    fmt,
    time::{Duration, Instant},
};

use parking_lot::RwLock;

use crate::threshold::{CheckValue, Limit, Threshold};

pub struct SlidingWindowThreshold {
    window_size: Duration,
    max_failures: usize,
    name: String,

    // oldest first
    failure_times: RwLock<VecDeque<Instant>>,
}

impl SlidingWindowThreshold {
    pub fn new(window_size: Duration, max_failures: usize, name: impl Into<String>) -> Self {
        Self {
            window_size,
            max_failures,
            name: name.into(),
            failure_times: RwLock::new(VecDeque::new()),
        }
    }

    pub fn record_failure(&self) {
        self.failure_times.write().push_back(Instant::now());
    }

    // Stored count without pruning. Entries older than the window stay
    // here until the next `check`.
    pub fn current_failures(&self) -> usize {
        self.failure_times.read().len()
    }

    pub fn window_size(&self) -> Duration {
        self.window_size
    }

    pub fn max_failures(&self) -> usize {
        self.max_failures
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Threshold for SlidingWindowThreshold {
    fn check(&self, _value: &CheckValue) -> bool {
        let mut failure_times = self.failure_times.write();
        let now = Instant::now();

        let before = failure_times.len();
        while let Some(oldest) = failure_times.front() {
            if now.duration_since(*oldest) < self.window_size {
                break;
            }
            failure_times.pop_front();
        }

        let expired = before - failure_times.len();
        if expired > 0 {
            tracing::trace!(window = %self.name, expired, "pruned expired failures");
        }

        failure_times.len() >= self.max_failures
    }

    fn limit(&self) -> Limit<'_> {
        Limit::Policy(self)
    }
}

impl fmt::Display for SlidingWindowThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlidingWindowThreshold: {}", self.name)
    }
}

impl fmt::Debug for SlidingWindowThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlidingWindowThreshold")
            .field("name", &self.name)
            .field("window_size", &self.window_size)
            .field("max_failures", &self.max_failures)
            .field("stored_failures", &self.current_failures())
            .finish()
    }
}
