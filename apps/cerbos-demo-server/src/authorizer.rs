//! Method-level authorization for document operations.

use cerbos_authz::pep::Identity;
use cerbos_authz::{AuthorizationError, EvaluationService};
use cerbos_authz_sdk::{EvaluationRequest, EvaluationRequestBuilder, HostValue};

use crate::documents::{CreateDocument, Document};

pub const DOCUMENT_KIND: &str = "document";
/// Resource id used when no particular document is addressed.
pub const ANY_DOCUMENT: &str = "_ANY_";
/// Resource id used when creating a document without a requested id.
pub const NEW_DOCUMENT: &str = "_NEW_";

/// Asks the PDP about `document` resources on behalf of an [`Identity`].
#[derive(Clone)]
pub struct DocumentAuthorizer {
    service: EvaluationService,
}

impl DocumentAuthorizer {
    #[must_use]
    pub fn new(service: EvaluationService) -> Self {
        Self { service }
    }

    /// May `identity` read documents at all.
    ///
    /// # Errors
    ///
    /// See [`EvaluationService::is_authorized`].
    pub async fn can_view_documents(&self, identity: &Identity) -> Result<bool, AuthorizationError> {
        let Some(builder) = Self::builder(identity, ANY_DOCUMENT, "read") else {
            return Ok(false);
        };
        self.decide(builder.build()).await
    }

    /// May `identity` perform `action` on `document`.
    ///
    /// # Errors
    ///
    /// See [`EvaluationService::is_authorized`].
    pub async fn can_access_document(
        &self,
        identity: &Identity,
        document: &Document,
        action: &str,
    ) -> Result<bool, AuthorizationError> {
        let Some(builder) = Self::builder(identity, &document.id, action) else {
            return Ok(false);
        };
        let request = builder
            .resource_attribute("owner", document.owner.as_str())
            .resource_attribute("content", serde_json::Value::Object(document.content.clone()))
            .build();
        self.decide(request).await
    }

    /// May `identity` create the document described by `request`.
    ///
    /// # Errors
    ///
    /// See [`EvaluationService::is_authorized`].
    pub async fn can_create_document(
        &self,
        identity: &Identity,
        request: &CreateDocument,
    ) -> Result<bool, AuthorizationError> {
        let requested_id = request.requested_id();
        let Some(mut builder) = Self::builder(identity, requested_id.unwrap_or(NEW_DOCUMENT), "create") else {
            return Ok(false);
        };

        builder = builder.principal_attribute("requestedOwner", identity.id.as_str());
        if !request.content.is_empty() {
            builder = builder.resource_attribute("content", serde_json::Value::Object(request.content.clone()));
        }
        if let Some(id) = requested_id {
            builder = builder.resource_attribute("requestedId", id);
        }
        self.decide(builder.build()).await
    }

    fn builder(identity: &Identity, resource_id: &str, action: &str) -> Option<EvaluationRequestBuilder> {
        if !identity.is_authenticated() {
            tracing::debug!(resource_id, action, "unauthenticated principal denied");
            return None;
        }
        Some(
            EvaluationRequest::builder(identity.id.as_str(), resource_id, action)
                .roles(identity.authorities.iter().map(String::as_str))
                .resource_kind(DOCUMENT_KIND)
                .principal_attributes(
                    identity
                        .attributes
                        .iter()
                        .map(|(key, value)| (key.as_str(), HostValue::clone(value))),
                ),
        )
    }

    async fn decide(&self, request: EvaluationRequest) -> Result<bool, AuthorizationError> {
        self.service.is_authorized(&request).await
    }
}
