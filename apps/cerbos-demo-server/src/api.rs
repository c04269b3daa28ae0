//! Document REST endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use cerbos_authz::AuthorizationError;
use cerbos_authz::pep::{Identity, Problem};
use http::StatusCode;
use serde::Serialize;

use crate::authorizer::DocumentAuthorizer;
use crate::documents::{Content, CreateDocument, Document, DocumentRepository};

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<DocumentRepository>,
    pub authorizer: DocumentAuthorizer,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("access denied")]
    Forbidden,

    #[error("document '{0}' not found")]
    NotFound(String),

    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = self.to_string();
        let problem = match &self {
            Self::Forbidden => Problem::new(StatusCode::FORBIDDEN, "Forbidden", detail),
            Self::NotFound(_) => Problem::new(StatusCode::NOT_FOUND, "Not Found", detail),
            Self::Authorization(err) if err.is_unavailable() => {
                tracing::error!(error = %err, "authorization service unavailable");
                Problem::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service Unavailable",
                    "authorization service unavailable",
                )
            }
            Self::Authorization(err) => {
                tracing::error!(error = %err, "invalid authorization request");
                Problem::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                    "authorization request could not be built",
                )
            }
        };
        problem.into_response()
    }
}

/// Document as returned to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentView {
    pub document_id: String,
    pub owner: String,
    pub content: Content,
    pub performed_by: String,
}

impl DocumentView {
    fn new(document: Document, identity: &Identity) -> Self {
        Self {
            document_id: document.id,
            owner: document.owner,
            content: document.content,
            performed_by: identity.id.clone(),
        }
    }
}

/// `GET /documents/{id}`: pre-check on documents in general, then on the
/// loaded document itself.
pub async fn read_document(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<DocumentView>, ApiError> {
    if !state.authorizer.can_view_documents(&identity).await? {
        return Err(ApiError::Forbidden);
    }

    let document = state
        .repository
        .find(&id)
        .await
        .ok_or_else(|| ApiError::NotFound(id))?;

    if !state
        .authorizer
        .can_access_document(&identity, &document, "read")
        .await?
    {
        return Err(ApiError::Forbidden);
    }

    Ok(Json(DocumentView::new(document, &identity)))
}

/// `GET /documents`: every document the caller may read.
pub async fn list_documents(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<DocumentView>>, ApiError> {
    if !state.authorizer.can_view_documents(&identity).await? {
        return Err(ApiError::Forbidden);
    }

    let mut visible = Vec::new();
    for document in state.repository.list().await {
        if state
            .authorizer
            .can_access_document(&identity, &document, "read")
            .await?
        {
            visible.push(DocumentView::new(document, &identity));
        }
    }
    Ok(Json(visible))
}

/// `POST /documents`: the caller becomes the owner.
pub async fn create_document(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<CreateDocument>,
) -> Result<(StatusCode, Json<DocumentView>), ApiError> {
    if !state
        .authorizer
        .can_create_document(&identity, &request)
        .await?
    {
        return Err(ApiError::Forbidden);
    }

    let id = request
        .requested_id()
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), str::to_owned);
    let document = state
        .repository
        .save(Document {
            id,
            owner: identity.id.clone(),
            content: request.content,
        })
        .await;

    tracing::info!(document_id = %document.id, owner = %document.owner, "document created");
    Ok((StatusCode::CREATED, Json(DocumentView::new(document, &identity))))
}
