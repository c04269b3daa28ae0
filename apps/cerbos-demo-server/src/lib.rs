#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Demo document service protected by Cerbos.
//!
//! Requests pass two gates: the URL-level [`authorization_middleware`] checks
//! the HTTP request itself, then each handler asks about the `document`
//! resource through [`authorizer::DocumentAuthorizer`].

pub mod api;
pub mod auth;
pub mod authorizer;
pub mod config;
pub mod documents;

use std::sync::Arc;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use cerbos_authz::pep::{AuthorizationGate, HttpRequestFactory, authorization_middleware};
use cerbos_authz::{EvaluationService, HttpPdpClient};
use cerbos_authz_sdk::PdpClient;
use static_pdp_plugin::StaticPdpClient;

use crate::api::AppState;
use crate::auth::{TokenDirectory, authn_middleware};
use crate::authorizer::DocumentAuthorizer;
use crate::config::{AppConfig, PdpBackend};
use crate::documents::DocumentRepository;

/// PDP client selected by `pdp_backend`.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built from the settings.
pub fn build_pdp(config: &AppConfig) -> anyhow::Result<Arc<dyn PdpClient>> {
    Ok(match config.pdp_backend {
        PdpBackend::Http => {
            let client = HttpPdpClient::new(&config.authz.pdp)?;
            tracing::info!(endpoint = %client.endpoint(), "using Cerbos HTTP PDP");
            Arc::new(client)
        }
        PdpBackend::Static => {
            tracing::info!(mode = ?config.static_pdp.mode, "using static PDP");
            Arc::new(StaticPdpClient::new(config.static_pdp.clone()))
        }
    })
}

/// Full application router over `pdp`.
#[must_use]
pub fn build_router(config: &AppConfig, pdp: Arc<dyn PdpClient>) -> Router {
    let defaults = Arc::new(config.authz.clone());
    let service = EvaluationService::new(pdp, Arc::clone(&defaults));
    let gate = AuthorizationGate::new(service.clone(), Arc::new(HttpRequestFactory::new(defaults)));

    let state = AppState {
        repository: Arc::new(DocumentRepository::seeded()),
        authorizer: DocumentAuthorizer::new(service),
    };

    let protected = Router::new()
        .route("/documents", get(api::list_documents).post(api::create_document))
        .route("/documents/{id}", get(api::read_document))
        .with_state(state)
        .layer(from_fn_with_state(gate, authorization_middleware))
        .layer(from_fn_with_state(TokenDirectory::from_users(&config.users), authn_middleware));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(protected)
}
