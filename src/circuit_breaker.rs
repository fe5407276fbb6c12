// Circuit breaker with pluggable thresholds.
//
// Closed --[failure threshold met]--> Open --[opened_timeout elapsed]--> HalfOpen
// HalfOpen --[success threshold met]--> Closed
// HalfOpen --[any failure]--> Open
//
// Open -> HalfOpen is observed lazily by `allow` and `state`; there is no timer.

use std::{
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::config::CircuitBreakerConfig;
use crate::threshold::{choose_switch, CheckValue, Switch, Threshold, ValueKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum State {
    Closed,
    Open,
    HalfOpen,
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            State::Closed => "closed",
            State::Open => "open",
            State::HalfOpen => "half-open",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Point-in-time view for logging and metrics labels
#[derive(Debug, Clone, Serialize)]
pub struct BreakerSnapshot {
    pub state: State,
    pub failures: u64,
    pub successes: u64,
    pub last_state_change: DateTime<Utc>,
}

struct Inner {
    failures: u64,
    successes: u64,

    state: State,
    last_state_change: Instant,
    changed_at: DateTime<Utc>,

    failure_threshold: Arc<dyn Threshold>,
    success_threshold: Arc<dyn Threshold>,
    failure_switch: Box<dyn Switch>,
    success_switch: Box<dyn Switch>,

    opened_timeout: Duration,
}

impl Inner {
    fn reset_counters(&mut self) {
        self.failures = 0;
        self.successes = 0;
    }

    fn transition(&mut self, to: State) {
        let from = self.state;
        self.state = to;
        self.last_state_change = Instant::now();
        self.changed_at = Utc::now();
        self.reset_counters();

        if to == State::Open {
            tracing::warn!(%from, %to, "circuit breaker opened");
        } else {
            tracing::info!(%from, %to, "circuit breaker state changed");
        }
    }

    fn try_half_open(&mut self) {
        // at-or-after the timeout, so a zero timeout flips on the next check
        if self.state == State::Open && self.last_state_change.elapsed() >= self.opened_timeout {
            self.transition(State::HalfOpen);
        }
    }

    fn calculate_check_value(&self, counter: u64, threshold: &dyn Threshold) -> CheckValue {
        let total = self.successes + self.failures;
        match threshold.value_kind() {
            ValueKind::Count => CheckValue::I64(i64::try_from(counter).unwrap_or(i64::MAX)),
            ValueKind::Ratio => {
                if total == 0 {
                    CheckValue::F64(0.0)
                } else {
                    CheckValue::F64(counter as f64 / total as f64)
                }
            }
            ValueKind::Snapshot => CheckValue::Counts {
                successes: self.successes,
                failures: self.failures,
                total,
            },
        }
    }
}

pub struct CircuitBreaker {
    inner: RwLock<Inner>,
}

impl CircuitBreaker {
    pub fn new(
        failure_threshold: Arc<dyn Threshold>,
        success_threshold: Arc<dyn Threshold>,
        opened_timeout: Duration,
    ) -> Self {
        Self {
            inner: RwLock::new(Inner {
                failures: 0,
                successes: 0,
                state: State::Closed,
                last_state_change: Instant::now(),
                changed_at: Utc::now(),
                failure_switch: choose_switch(failure_threshold.clone()),
                success_switch: choose_switch(success_threshold.clone()),
                failure_threshold,
                success_threshold,
                opened_timeout,
            }),
        }
    }

    // Swaps both thresholds and the timeout. State and counters are kept.
    pub fn update_values(
        &self,
        new_failure: Arc<dyn Threshold>,
        new_success: Arc<dyn Threshold>,
        new_timeout: Duration,
    ) {
        let mut inner = self.inner.write();

        inner.failure_switch = choose_switch(new_failure.clone());
        inner.success_switch = choose_switch(new_success.clone());
        inner.failure_threshold = new_failure;
        inner.success_threshold = new_success;
        inner.opened_timeout = new_timeout;

        tracing::debug!(opened_timeout = ?new_timeout, "circuit breaker thresholds updated");
    }

    pub fn apply_config(&self, config: &CircuitBreakerConfig) {
        let (failure, success) = config.thresholds();
        self.update_values(failure, success, config.open_timeout());
    }

    // False only while Open and the cooldown has not elapsed
    pub fn allow(&self) -> bool {
        let mut inner = self.inner.write();
        inner.try_half_open();
        inner.state != State::Open
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.write();

        match inner.state {
            State::Closed => {
                inner.successes += 1;
                inner.failures = 0;
            }
            State::HalfOpen => {
                inner.successes += 1;
                inner.failures = 0;

                let value = inner.calculate_check_value(inner.successes, &*inner.success_threshold);
                if inner.success_switch.check(&value) {
                    inner.transition(State::Closed);
                }
            }
            State::Open => {}
        }
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.write();

        match inner.state {
            State::Closed => {
                inner.failures += 1;
                inner.successes = 0;

                let value = inner.calculate_check_value(inner.failures, &*inner.failure_threshold);
                if inner.failure_switch.check(&value) {
                    inner.transition(State::Open);
                }
            }
            State::HalfOpen => inner.transition(State::Open),
            State::Open => {}
        }
    }

    pub fn state(&self) -> State {
        let mut inner = self.inner.write();
        inner.try_half_open();
        inner.state
    }

    // Does not advance Open -> HalfOpen
    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.inner.read();
        BreakerSnapshot {
            state: inner.state,
            failures: inner.failures,
            successes: inner.successes,
            last_state_change: inner.changed_at,
        }
    }
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("CircuitBreaker")
            .field("state", &inner.state)
            .field("failures", &inner.failures)
            .field("successes", &inner.successes)
            .field("opened_timeout", &inner.opened_timeout)
            .finish()
    }
}
