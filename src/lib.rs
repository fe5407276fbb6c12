// Circuit breaker with pluggable threshold policies

pub mod circuit_breaker;
pub mod config;
pub mod errors;
pub mod sliding_window;
pub mod threshold;

// Re-export key types for convenience
pub use circuit_breaker::{BreakerSnapshot, CircuitBreaker, State};
pub use config::CircuitBreakerConfig;
pub use errors::BreakerError;
pub use sliding_window::SlidingWindowThreshold;
pub use threshold::{
    choose_switch, CheckValue, Float64Threshold, Int64Threshold, Limit, Switch, Threshold,
    ThresholdSwitch, ValueKind,
};
