//! Domain error types.
//!
//! These errors represent validation failures in the domain layer. They
//! are distinct from the I/O and parse errors of the input loaders.

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Invalid leg construction (e.g., arrival before departure)
    #[error("invalid leg: {0}")]
    InvalidLeg(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DomainError::InvalidLeg("departure must be before arrival");
        assert_eq!(
            err.to_string(),
            "invalid leg: departure must be before arrival"
        );
    }
}
