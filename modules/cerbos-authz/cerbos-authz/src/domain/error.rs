//! Errors surfaced by the evaluation service.

use cerbos_authz_sdk::PdpError;

/// Failure to obtain an authorization decision.
///
/// A denial is never an error: it is reported as `Ok(false)` or as a deny
/// effect in the check result.
#[derive(thiserror::Error, Debug)]
pub enum AuthorizationError {
    /// A required request field is blank. Raised before any PDP call.
    #[error("{field} must not be blank")]
    Validation { field: &'static str },

    /// The PDP could not produce a decision.
    #[error("authorization decision unavailable: {source}")]
    Unavailable {
        #[source]
        source: PdpError,
    },
}

impl AuthorizationError {
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

impl From<PdpError> for AuthorizationError {
    fn from(source: PdpError) -> Self {
        Self::Unavailable { source }
    }
}
