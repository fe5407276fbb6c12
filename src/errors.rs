use thiserror::Error;

// Error types for thresholds and configuration.
// The hot path (allow / record_* / state) never returns these.
#[derive(Error, Debug)]
pub enum BreakerError {
    #[error("Unsupported type: {0}")]
    UnsupportedType(&'static str),

    // Reserved for threshold policies that are declared but not wired yet
    #[error("Not implemented")]
    NotImplemented,

    #[error("Invalid config: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            BreakerError::UnsupportedType("counts").to_string(),
            "Unsupported type: counts"
        );
        assert_eq!(BreakerError::NotImplemented.to_string(), "Not implemented");

        let err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: BreakerError = err.into();
        assert!(err.to_string().starts_with("Invalid config: "));
    }
}
