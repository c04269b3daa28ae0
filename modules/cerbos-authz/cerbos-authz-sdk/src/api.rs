//! PDP client trait consumed by the evaluation service.

use async_trait::async_trait;

use crate::error::PdpError;
use crate::models::{CheckResourcesResult, Principal, ResourceAction};

/// Client for a Cerbos policy decision point.
///
/// Implementations own the transport (HTTP, in-process, test doubles),
/// the call timeout and any retry policy. The evaluation service makes
/// exactly one call per evaluation:
///
/// ```ignore
/// let result = pdp
///     .check_resources(principal, vec![resource_action])
///     .await?;
/// let allowed = result
///     .find("/documents/alpha")
///     .is_some_and(|r| r.is_allowed("read"));
/// ```
#[async_trait]
pub trait PdpClient: Send + Sync {
    /// Check one principal against a batch of resource-action entries.
    ///
    /// Denials are expressed in the returned result, never as errors.
    ///
    /// # Errors
    ///
    /// - `Transport` / `Timeout` if the PDP could not be reached in time
    /// - `Rejected` if the PDP reported a failure
    /// - `InvalidResponse` if the PDP answer could not be decoded
    /// - `Internal` for unexpected failures
    async fn check_resources(
        &self,
        principal: Principal,
        resources: Vec<ResourceAction>,
    ) -> Result<CheckResourcesResult, PdpError>;
}
