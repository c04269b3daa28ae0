//! Demo bearer-token authentication.
//!
//! Resolves `Authorization: Bearer <token>` against the configured users and
//! places the matching [`Identity`] in request extensions. Requests without a
//! known token pass through unauthenticated; the authorization layer rejects
//! them.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use cerbos_authz::pep::Identity;
use cerbos_authz_sdk::HostValue;
use http::{HeaderMap, header};

use crate::config::DemoUser;

/// Token to identity lookup table.
#[derive(Debug, Clone, Default)]
pub struct TokenDirectory {
    identities: Arc<HashMap<String, Identity>>,
}

impl TokenDirectory {
    #[must_use]
    pub fn from_users(users: &[DemoUser]) -> Self {
        let identities = users
            .iter()
            .map(|user| {
                let identity = user.attributes.iter().fold(
                    Identity::authenticated(user.id.clone(), user.roles.iter().cloned()),
                    |identity, (key, value)| identity.with_attribute(key.clone(), HostValue::from(value.clone())),
                );
                (user.token.clone(), identity)
            })
            .collect();
        Self {
            identities: Arc::new(identities),
        }
    }

    #[must_use]
    pub fn resolve(&self, token: &str) -> Option<&Identity> {
        self.identities.get(token)
    }
}

/// Extract the token from an `Authorization: Bearer` header.
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim_start().split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("Bearer"))
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
}

pub async fn authn_middleware(State(directory): State<TokenDirectory>, mut req: Request, next: Next) -> Response {
    let identity = extract_bearer_token(req.headers())
        .and_then(|token| directory.resolve(token))
        .cloned();

    match identity {
        Some(identity) => {
            tracing::debug!(principal_id = %identity.id, "bearer token accepted");
            req.extensions_mut().insert(identity);
        }
        None => tracing::debug!("request carries no known bearer token"),
    }

    next.run(req).await
}
