// Plain configuration for a count-based breaker
use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};

use crate::circuit_breaker::CircuitBreaker;
use crate::errors::BreakerError;
use crate::threshold::{Int64Threshold, Threshold};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    // consecutive failures in Closed before opening
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: i64,

    // consecutive successes in HalfOpen before closing
    #[serde(default = "default_success_threshold")]
    pub success_threshold: i64,

    #[serde(default = "default_open_timeout_ms")]
    pub open_timeout_ms: u64,
}

fn default_failure_threshold() -> i64 {
    5
}

fn default_success_threshold() -> i64 {
    3
}

fn default_open_timeout_ms() -> u64 {
    4000
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            success_threshold: default_success_threshold(),
            open_timeout_ms: default_open_timeout_ms(),
        }
    }
}

impl CircuitBreakerConfig {
    pub fn from_json(json: &str) -> Result<Self, BreakerError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn open_timeout(&self) -> Duration {
        Duration::from_millis(self.open_timeout_ms)
    }

    // (failure, success)
    pub fn thresholds(&self) -> (Arc<dyn Threshold>, Arc<dyn Threshold>) {
        (
            Arc::new(Int64Threshold::new(self.failure_threshold)),
            Arc::new(Int64Threshold::new(self.success_threshold)),
        )
    }

    pub fn build(&self) -> CircuitBreaker {
        let (failure, success) = self.thresholds();
        CircuitBreaker::new(failure, success, self.open_timeout())
    }
}
