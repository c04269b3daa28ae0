//! Evaluation service: turns an [`EvaluationRequest`] into one PDP call and
//! reduces the answer to a decision.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use cerbos_authz_sdk::{
    CheckResourcesResult, EvaluationRequest, PdpClient, PdpError, Principal, Resource,
    ResourceAction, normalize_map,
};
use futures::FutureExt;
use tracing::field::Empty;

use super::error::AuthorizationError;
use crate::config::DeploymentDefaults;

/// Stateless evaluation service.
///
/// Holds only read-only handles; safe to share across tasks.
#[derive(Clone)]
pub struct EvaluationService {
    pdp: Arc<dyn PdpClient>,
    defaults: Arc<DeploymentDefaults>,
}

impl EvaluationService {
    #[must_use]
    pub fn new(pdp: Arc<dyn PdpClient>, defaults: Arc<DeploymentDefaults>) -> Self {
        Self { pdp, defaults }
    }

    #[must_use]
    pub fn defaults(&self) -> &DeploymentDefaults {
        &self.defaults
    }

    /// Ask the PDP about one resource-action pair and return its raw result.
    ///
    /// # Errors
    ///
    /// - `Validation` if `principal_id`, `action`, `resource_id` or the
    ///   resolved resource kind is blank; the PDP is not called
    /// - `Unavailable` if the PDP call failed for any reason
    #[tracing::instrument(
        skip_all,
        fields(
            principal_id = %request.principal_id(),
            resource_kind = Empty,
            resource_id = %request.resource_id(),
            action = %request.action(),
        )
    )]
    pub async fn evaluate(
        &self,
        request: &EvaluationRequest,
    ) -> Result<CheckResourcesResult, AuthorizationError> {
        let kind = self.validate(request)?;
        tracing::Span::current().record("resource_kind", kind.as_str());

        let principal = self.build_principal(request);
        let resource = self.build_resource(request, kind);

        let call = self.pdp.check_resources(principal, vec![resource]);
        match AssertUnwindSafe(call).catch_unwind().await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(err)) => Err(unavailable(err)),
            Err(panic) => Err(unavailable(PdpError::Internal(panic_message(&*panic)))),
        }
    }

    /// Ask the PDP whether the action is allowed.
    ///
    /// A result without an entry for the resource id, or with a non-allow
    /// effect for the action, is a denial.
    ///
    /// # Errors
    ///
    /// Same as [`EvaluationService::evaluate`].
    pub async fn is_authorized(&self, request: &EvaluationRequest) -> Result<bool, AuthorizationError> {
        let result = self.evaluate(request).await?;
        let allowed = result
            .find(request.resource_id())
            .is_some_and(|r| r.is_allowed(request.action()));

        tracing::debug!(
            principal_id = %request.principal_id(),
            resource_id = %request.resource_id(),
            action = %request.action(),
            allowed,
            "authorization decision"
        );
        Ok(allowed)
    }

    /// Principal with sanitized roles, resolved overrides and normalized attributes.
    #[must_use]
    pub fn build_principal(&self, request: &EvaluationRequest) -> Principal {
        Principal {
            id: request.principal_id().to_owned(),
            roles: request.roles().to_vec(),
            policy_version: resolve_override(
                request.policy_version(),
                self.defaults.policy_version.as_deref(),
            ),
            scope: resolve_override(
                request.principal_scope(),
                self.defaults.principal_scope.as_deref(),
            ),
            attributes: normalize_map(request.principal_attributes()),
        }
    }

    /// Resource-action entry for the single action under evaluation.
    #[must_use]
    pub fn build_resource(&self, request: &EvaluationRequest, kind: String) -> ResourceAction {
        ResourceAction {
            actions: vec![request.action().to_owned()],
            resource: Resource {
                kind,
                id: request.resource_id().to_owned(),
                policy_version: resolve_override(
                    request.policy_version(),
                    self.defaults.policy_version.as_deref(),
                ),
                scope: resolve_override(
                    request.resource_scope(),
                    self.defaults.resource_scope.as_deref(),
                ),
                attributes: normalize_map(request.resource_attributes()),
            },
        }
    }

    /// Resource kind after applying the deployment default.
    #[must_use]
    pub fn resolve_kind(&self, request: &EvaluationRequest) -> Option<String> {
        resolve_override(request.resource_kind(), Some(&self.defaults.resource_kind))
    }

    /// Checks required fields in order and returns the resolved kind.
    fn validate(&self, request: &EvaluationRequest) -> Result<String, AuthorizationError> {
        require("principal_id", request.principal_id())?;
        require("action", request.action())?;
        require("resource_id", request.resource_id())?;
        self.resolve_kind(request)
            .ok_or(AuthorizationError::Validation {
                field: "resource_kind",
            })
    }
}

/// Request value wins over default wins over absent. Blank counts as absent.
fn resolve_override(requested: Option<&str>, default: Option<&str>) -> Option<String> {
    requested
        .filter(|v| has_text(v))
        .or_else(|| default.filter(|v| has_text(v)))
        .map(str::to_owned)
}

fn has_text(value: &str) -> bool {
    !value.trim().is_empty()
}

fn require(field: &'static str, value: &str) -> Result<(), AuthorizationError> {
    if has_text(value) {
        Ok(())
    } else {
        tracing::debug!(field, "rejecting authorization request with blank field");
        Err(AuthorizationError::Validation { field })
    }
}

fn unavailable(source: PdpError) -> AuthorizationError {
    log_pdp_error(&source);
    AuthorizationError::Unavailable { source }
}

/// Cognitive complexity is inflated by tracing macro expansion.
#[allow(clippy::cognitive_complexity)]
fn log_pdp_error(err: &PdpError) {
    if err.is_expected() {
        tracing::warn!(error = %err, "PDP call failed");
    } else {
        tracing::error!(error = %err, "unexpected failure during PDP call");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "PDP client panicked".to_owned()
    }
}
