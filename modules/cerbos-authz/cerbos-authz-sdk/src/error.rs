//! Error types raised by PDP clients.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while asking the PDP for a decision.
///
/// These represent infrastructure failures only. Access denial is expressed
/// through `Effect::Deny` in the check result, not as an error variant.
#[derive(Debug, Error)]
pub enum PdpError {
    /// The client could not be built from its settings.
    #[error("invalid PDP client configuration: {0}")]
    Configuration(String),

    /// The PDP could not be reached.
    #[error("PDP transport error: {0}")]
    Transport(String),

    /// The PDP did not answer within the configured timeout.
    #[error("PDP call timed out after {} ms", .0.as_millis())]
    Timeout(Duration),

    /// The PDP answered with a failure status.
    #[error("PDP rejected the request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The PDP answer could not be decoded.
    #[error("invalid PDP response: {0}")]
    InvalidResponse(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PdpError {
    /// Whether this failure is something a PDP client is expected to
    /// report (reachability, PDP-side errors), as opposed to a bug.
    #[must_use]
    pub fn is_expected(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_are_unexpected() {
        assert!(!PdpError::Internal("boom".to_owned()).is_expected());
        assert!(PdpError::Transport("connection refused".to_owned()).is_expected());
        assert!(
            PdpError::Rejected {
                status: 500,
                message: "policy store offline".to_owned(),
            }
            .is_expected()
        );
    }

    #[test]
    fn rejected_message_includes_status() {
        let err = PdpError::Rejected {
            status: 400,
            message: "invalid principal".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "PDP rejected the request (status 400): invalid principal"
        );
    }
}
