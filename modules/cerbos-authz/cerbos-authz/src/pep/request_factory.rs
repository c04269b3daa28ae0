//! Builds evaluation requests from in-flight HTTP requests.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ConnectInfo;
use cerbos_authz_sdk::{EvaluationRequest, HostValue};
use http::request::Parts;
use http::{HeaderMap, header};
use indexmap::IndexMap;

use super::identity::Identity;
use crate::config::DeploymentDefaults;
use crate::domain::sanitize_roles;

/// Headers never forwarded to the PDP.
const REDACTED_HEADERS: [&str; 3] = ["authorization", "cookie", "proxy-authorization"];

/// Turns an identity and an HTTP request into an [`EvaluationRequest`].
pub trait AuthorizationRequestFactory: Send + Sync {
    fn create(&self, identity: &Identity, parts: &Parts) -> EvaluationRequest;
}

/// Default factory: the request path is the resource id, the method table
/// gives the action and the deployment default gives the resource kind.
///
/// Principal attributes: `authorities`, `details` when present, and the
/// account flags (`accountNonExpired`, `accountNonLocked`,
/// `credentialsNonExpired`, `enabled`) when the identity carries them.
/// Resource attributes: `method`, `path`, `query` (when non-blank),
/// `remoteAddress`, `contentType`, `segments`, `headers`.
#[derive(Clone)]
pub struct HttpRequestFactory {
    defaults: Arc<DeploymentDefaults>,
}

impl HttpRequestFactory {
    #[must_use]
    pub fn new(defaults: Arc<DeploymentDefaults>) -> Self {
        Self { defaults }
    }
}

impl AuthorizationRequestFactory for HttpRequestFactory {
    fn create(&self, identity: &Identity, parts: &Parts) -> EvaluationRequest {
        let method = parts.method.as_str();
        let path = parts.uri.path();
        let action = self.defaults.method_actions.resolve(method);

        let mut builder = EvaluationRequest::builder(&identity.id, path, action)
            .roles(identity.authorities.iter())
            .resource_kind(self.defaults.resource_kind.as_str())
            .principal_attribute("authorities", sanitize_roles(identity.authorities.as_slice()));
        if !identity.attributes.is_empty() {
            builder = builder.principal_attribute("details", HostValue::map(identity.attributes.clone()));
        }
        if let Some(account) = identity.account {
            builder = builder
                .principal_attribute("accountNonExpired", account.account_non_expired)
                .principal_attribute("accountNonLocked", account.account_non_locked)
                .principal_attribute("credentialsNonExpired", account.credentials_non_expired)
                .principal_attribute("enabled", account.enabled);
        }

        builder = builder
            .resource_attribute("method", method)
            .resource_attribute("path", path);
        if let Some(query) = parts.uri.query().filter(|q| !q.trim().is_empty()) {
            builder = builder.resource_attribute("query", query);
        }

        builder
            .resource_attribute("remoteAddress", remote_address(parts))
            .resource_attribute("contentType", content_type(&parts.headers))
            .resource_attribute("segments", path_segments(path))
            .resource_attribute("headers", header_values(&parts.headers))
            .build()
    }
}

fn remote_address(parts: &Parts) -> Option<String> {
    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
}

fn content_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::CONTENT_TYPE)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}

fn path_segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.trim().is_empty())
        .map(str::to_owned)
        .collect()
}

fn header_values(headers: &HeaderMap) -> IndexMap<String, Vec<String>> {
    headers
        .keys()
        .filter(|name| !REDACTED_HEADERS.contains(&name.as_str()))
        .map(|name| {
            let values = headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect();
            (name.as_str().to_lowercase(), values)
        })
        .collect()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::pep::identity::AccountStatus;
    use cerbos_authz_sdk::{AttributeValue, normalize_map};
    use http::Request;

    fn parts(builder: http::request::Builder) -> Parts {
        builder.body(()).unwrap().into_parts().0
    }

    fn factory() -> HttpRequestFactory {
        HttpRequestFactory::new(Arc::new(DeploymentDefaults::default()))
    }

    #[test]
    fn builds_request_from_path_method_and_identity() {
        let identity = Identity::authenticated("alice", ["ROLE_employee", "ROLE_employee"]);
        let parts = parts(Request::get("/documents/alpha"));

        let request = factory().create(&identity, &parts);
        assert_eq!(request.principal_id(), "alice");
        assert_eq!(request.resource_id(), "/documents/alpha");
        assert_eq!(request.action(), "read");
        assert_eq!(request.resource_kind(), Some("http_request"));

        let principal_attr = normalize_map(request.principal_attributes());
        assert_eq!(
            principal_attr["authorities"],
            AttributeValue::List(vec![AttributeValue::string("employee")])
        );
        assert!(!principal_attr.contains_key("details"));
        assert!(!principal_attr.contains_key("enabled"));
    }

    #[test]
    fn account_flags_become_principal_attributes() {
        let identity = Identity::authenticated("alice", ["ROLE_employee"]).with_account_status(
            AccountStatus {
                account_non_locked: false,
                ..AccountStatus::default()
            },
        );
        let parts = parts(Request::get("/documents/alpha"));

        let request = factory().create(&identity, &parts);
        let principal_attr = normalize_map(request.principal_attributes());
        assert_eq!(principal_attr["accountNonExpired"], AttributeValue::Bool(true));
        assert_eq!(principal_attr["accountNonLocked"], AttributeValue::Bool(false));
        assert_eq!(principal_attr["credentialsNonExpired"], AttributeValue::Bool(true));
        assert_eq!(principal_attr["enabled"], AttributeValue::Bool(true));
    }

    #[test]
    fn resource_attributes_describe_the_http_request() {
        let identity = Identity::authenticated("alice", ["ROLE_employee"]);
        let mut parts = parts(
            Request::post("/documents//drafts/?lang=en")
                .header("Content-Type", "application/json")
                .header("X-Trace", "a")
                .header("X-Trace", "b")
                .header("Authorization", "Bearer secret"),
        );
        parts
            .extensions
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 7], 51000))));

        let request = factory().create(&identity, &parts);
        assert_eq!(request.action(), "create");

        let attr = normalize_map(request.resource_attributes());
        assert_eq!(attr["method"], AttributeValue::string("POST"));
        assert_eq!(attr["path"], AttributeValue::string("/documents//drafts/"));
        assert_eq!(attr["query"], AttributeValue::string("lang=en"));
        assert_eq!(attr["remoteAddress"], AttributeValue::string("10.0.0.7"));
        assert_eq!(attr["contentType"], AttributeValue::string("application/json"));
        assert_eq!(
            attr["segments"],
            AttributeValue::List(vec![
                AttributeValue::string("documents"),
                AttributeValue::string("drafts"),
            ])
        );

        let headers = attr["headers"].as_map().unwrap();
        assert_eq!(
            headers["x-trace"],
            AttributeValue::List(vec![AttributeValue::string("a"), AttributeValue::string("b")])
        );
        assert!(!headers.contains_key("authorization"));
    }

    #[test]
    fn missing_connection_info_and_content_type_become_null() {
        let identity = Identity::authenticated("alice", Vec::<String>::new())
            .with_attribute("department", "eng");
        let parts = parts(Request::delete("/documents/alpha?"));

        let request = factory().create(&identity, &parts);
        assert_eq!(request.action(), "delete");

        let attr = normalize_map(request.resource_attributes());
        assert_eq!(attr["remoteAddress"], AttributeValue::string("null"));
        assert_eq!(attr["contentType"], AttributeValue::string("null"));
        assert!(!attr.contains_key("query"));

        let principal_attr = normalize_map(request.principal_attributes());
        let details = principal_attr["details"].as_map().unwrap();
        assert_eq!(details["department"], AttributeValue::string("eng"));
    }
}
