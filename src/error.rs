use thiserror::Error;

/// Reasons a candidate payload is rejected.
///
/// None of these are fatal: the locator and decoder log them and move on to
/// the next candidate in the advertisement.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("invalid payload length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("trailing address {found} does not match device {expected}")]
    AddressMismatch { expected: String, found: String },

    #[error("invalid hardware address: {0}")]
    InvalidAddress(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_error_display() {
        let err = PayloadError::InvalidLength {
            expected: 13,
            actual: 12,
        };
        assert_eq!(
            err.to_string(),
            "invalid payload length: expected 13 bytes, got 12"
        );

        let err = PayloadError::InvalidAddress("5F:5A".to_string());
        assert_eq!(err.to_string(), "invalid hardware address: 5F:5A");
    }
}
