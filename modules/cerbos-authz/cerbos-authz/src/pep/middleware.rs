//! Enforcement middleware for axum routers.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use http::request::Parts;

use super::identity::Identity;
use super::problem::Problem;
use super::request_factory::AuthorizationRequestFactory;
use crate::domain::{AuthorizationError, EvaluationService};

/// Outcome of an enforcement check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// The PDP allowed the action.
    Allow,
    /// The PDP denied the action, or returned no decision for the resource.
    Deny,
    /// No authenticated principal; the PDP was not called.
    Unauthenticated,
    /// The PDP could not be asked. Fails closed.
    Unavailable,
    /// The evaluation request was malformed.
    Invalid { field: &'static str },
}

impl GateDecision {
    #[must_use]
    pub fn is_allowed(self) -> bool {
        self == Self::Allow
    }

    /// Problem response for a refused request; `None` for `Allow`.
    #[must_use]
    pub fn rejection(self) -> Option<Problem> {
        let (status, title, detail) = match self {
            Self::Allow => return None,
            Self::Deny => (StatusCode::FORBIDDEN, "Forbidden", "Access denied"),
            Self::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                "Authentication required",
            ),
            Self::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service Unavailable",
                "Authorization service unavailable",
            ),
            Self::Invalid { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
                "Authorization request could not be built",
            ),
        };
        Some(Problem::new(status, title, detail))
    }
}

/// Enforcement point: builds the evaluation request and asks the service.
#[derive(Clone)]
pub struct AuthorizationGate {
    service: EvaluationService,
    factory: Arc<dyn AuthorizationRequestFactory>,
}

impl AuthorizationGate {
    #[must_use]
    pub fn new(service: EvaluationService, factory: Arc<dyn AuthorizationRequestFactory>) -> Self {
        Self { service, factory }
    }

    /// Decide whether `identity` may perform the request described by `parts`.
    ///
    /// Never returns `Allow` unless the PDP confirmed it.
    ///
    /// Cognitive complexity is inflated by tracing macro expansion.
    #[allow(clippy::cognitive_complexity)]
    pub async fn check(&self, identity: Option<&Identity>, parts: &Parts) -> GateDecision {
        let Some(identity) = identity.filter(|i| i.is_authenticated()) else {
            tracing::debug!(path = %parts.uri.path(), "no authenticated principal; refusing request");
            return GateDecision::Unauthenticated;
        };

        let request = self.factory.create(identity, parts);
        match self.service.is_authorized(&request).await {
            Ok(true) => GateDecision::Allow,
            Ok(false) => {
                tracing::debug!(
                    principal_id = %identity.id,
                    path = %parts.uri.path(),
                    "access denied by PDP"
                );
                GateDecision::Deny
            }
            Err(AuthorizationError::Validation { field }) => {
                tracing::warn!(field, path = %parts.uri.path(), "invalid authorization request");
                GateDecision::Invalid { field }
            }
            Err(err @ AuthorizationError::Unavailable { .. }) => {
                tracing::error!(
                    principal_id = %identity.id,
                    path = %parts.uri.path(),
                    error = %err,
                    "authorization unavailable; refusing request"
                );
                GateDecision::Unavailable
            }
        }
    }
}

/// Authorization middleware.
///
/// Reads the [`Identity`] placed in request extensions by the authentication
/// layer and forwards the request only when the PDP allows it:
/// 1. No identity, or an unauthenticated one: 401, the PDP is not called
/// 2. Deny: 403
/// 3. PDP unavailable: 503
/// 4. Malformed evaluation request: 500
pub async fn authorization_middleware(
    State(gate): State<AuthorizationGate>,
    req: Request,
    next: Next,
) -> Response {
    let (parts, body) = req.into_parts();
    let identity = parts.extensions.get::<Identity>().cloned();

    let decision = gate.check(identity.as_ref(), &parts).await;
    match decision.rejection() {
        None => next.run(Request::from_parts(parts, body)).await,
        Some(problem) => problem.into_response(),
    }
}
