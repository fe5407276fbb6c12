// Threshold policies and the switch adapter the breaker consults them through.

use std::{fmt, sync::Arc};

use crate::errors::BreakerError;

// Evidence handed to a threshold. Which shape a policy gets is decided by its ValueKind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CheckValue {
    I64(i64),
    I32(i32),
    F64(f64),
    F32(f32),
    Counts {
        successes: u64,
        failures: u64,
        total: u64,
    },
    // Self-contained policies (sliding window) take no input
    Empty,
}

impl CheckValue {
    fn type_name(&self) -> &'static str {
        match self {
            CheckValue::I64(_) => "i64",
            CheckValue::I32(_) => "i32",
            CheckValue::F64(_) => "f64",
            CheckValue::F32(_) => "f32",
            CheckValue::Counts { .. } => "counts",
            CheckValue::Empty => "empty",
        }
    }
}

impl TryFrom<&CheckValue> for i64 {
    type Error = BreakerError;

    fn try_from(value: &CheckValue) -> Result<Self, Self::Error> {
        match *value {
            CheckValue::I64(v) => Ok(v),
            CheckValue::I32(v) => Ok(i64::from(v)),
            ref other => Err(BreakerError::UnsupportedType(other.type_name())),
        }
    }
}

impl TryFrom<&CheckValue> for f64 {
    type Error = BreakerError;

    fn try_from(value: &CheckValue) -> Result<Self, Self::Error> {
        match *value {
            CheckValue::F64(v) => Ok(v),
            CheckValue::F32(v) => Ok(f64::from(v)),
            CheckValue::I64(v) => Ok(v as f64),
            CheckValue::I32(v) => Ok(f64::from(v)),
            ref other => Err(BreakerError::UnsupportedType(other.type_name())),
        }
    }
}

// What kind of evidence a threshold wants from the breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    // raw counter
    Count,
    // counter / (successes + failures)
    Ratio,
    // {successes, failures, total}, informational only
    Snapshot,
}

// Configured limit of a threshold, for introspection
#[derive(Clone, Copy)]
pub enum Limit<'a> {
    Count(i64),
    Ratio(f64),
    // Policies without a single scalar limit hand back themselves
    Policy(&'a dyn Threshold),
}

impl fmt::Debug for Limit<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Count(v) => f.debug_tuple("Count").field(v).finish(),
            Limit::Ratio(v) => f.debug_tuple("Ratio").field(v).finish(),
            Limit::Policy(_) => f.write_str("Policy(..)"),
        }
    }
}

// Capability every threshold policy implements.
// `check` must never panic; an input shape the policy does not understand is `false`.
pub trait Threshold: Send + Sync {
    fn check(&self, value: &CheckValue) -> bool;

    fn limit(&self) -> Limit<'_>;

    fn value_kind(&self) -> ValueKind {
        ValueKind::Snapshot
    }
}

// Boolean check the breaker's transition logic calls
pub trait Switch: Send + Sync {
    fn check(&self, value: &CheckValue) -> bool;
}

pub struct ThresholdSwitch {
    threshold: Arc<dyn Threshold>,
}

impl Switch for ThresholdSwitch {
    fn check(&self, value: &CheckValue) -> bool {
        self.threshold.check(value)
    }
}

pub fn choose_switch(threshold: Arc<dyn Threshold>) -> Box<dyn Switch> {
    Box::new(ThresholdSwitch { threshold })
}

// Trips when an integer count reaches the limit
#[derive(Debug, Clone)]
pub struct Int64Threshold {
    threshold: i64,
}

impl Int64Threshold {
    pub fn new(threshold: i64) -> Self {
        Self { threshold }
    }
}

impl Threshold for Int64Threshold {
    fn check(&self, value: &CheckValue) -> bool {
        match i64::try_from(value) {
            Ok(v) => v >= self.threshold,
            Err(_) => false,
        }
    }

    fn limit(&self) -> Limit<'_> {
        Limit::Count(self.threshold)
    }

    fn value_kind(&self) -> ValueKind {
        ValueKind::Count
    }
}

// Trips when a ratio reaches the limit
#[derive(Debug, Clone)]
pub struct Float64Threshold {
    threshold: f64,
}

impl Float64Threshold {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl Threshold for Float64Threshold {
    fn check(&self, value: &CheckValue) -> bool {
        match f64::try_from(value) {
            Ok(v) => v >= self.threshold,
            Err(_) => false,
        }
    }

    fn limit(&self) -> Limit<'_> {
        Limit::Ratio(self.threshold)
    }

    fn value_kind(&self) -> ValueKind {
        ValueKind::Ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int64_threshold() {
        let t = Int64Threshold::new(3);

        assert!(!t.check(&CheckValue::I64(2)));
        assert!(t.check(&CheckValue::I64(3)));
        assert!(t.check(&CheckValue::I32(4)));

        // anything that is not an integer never trips
        assert!(!t.check(&CheckValue::F64(10.0)));
        assert!(!t.check(&CheckValue::Empty));
        assert!(!t.check(&CheckValue::Counts {
            successes: 0,
            failures: 10,
            total: 10,
        }));

        assert!(matches!(t.limit(), Limit::Count(3)));
        assert_eq!(t.value_kind(), ValueKind::Count);
    }

    #[test]
    fn test_float64_threshold() {
        let t = Float64Threshold::new(0.5);

        assert!(!t.check(&CheckValue::F64(0.49)));
        assert!(t.check(&CheckValue::F64(0.5)));
        assert!(t.check(&CheckValue::F32(0.75)));
        assert!(t.check(&CheckValue::I64(1)));
        assert!(!t.check(&CheckValue::I32(0)));
        assert!(!t.check(&CheckValue::Empty));

        match t.limit() {
            Limit::Ratio(v) => assert_eq!(v, 0.5),
            other => panic!("unexpected limit {other:?}"),
        }
        assert_eq!(t.value_kind(), ValueKind::Ratio);
    }

    #[test]
    fn test_value_coercion_errors() {
        let err = i64::try_from(&CheckValue::F32(1.0)).unwrap_err();
        assert!(matches!(err, BreakerError::UnsupportedType("f32")));

        let err = f64::try_from(&CheckValue::Empty).unwrap_err();
        assert!(matches!(err, BreakerError::UnsupportedType("empty")));
    }

    struct AlwaysTrips;

    impl Threshold for AlwaysTrips {
        fn check(&self, _value: &CheckValue) -> bool {
            true
        }

        fn limit(&self) -> Limit<'_> {
            Limit::Policy(self)
        }
    }

    #[test]
    fn test_switch_forwards_to_threshold() {
        let switch = choose_switch(Arc::new(Int64Threshold::new(2)));
        assert!(!switch.check(&CheckValue::I64(1)));
        assert!(switch.check(&CheckValue::I64(2)));

        let custom = AlwaysTrips;
        assert_eq!(custom.value_kind(), ValueKind::Snapshot);
        let switch = choose_switch(Arc::new(AlwaysTrips));
        assert!(switch.check(&CheckValue::Empty));
    }
}
