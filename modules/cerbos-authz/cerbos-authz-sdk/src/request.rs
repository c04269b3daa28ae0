//! Evaluation request.
//!
//! An [`EvaluationRequest`] describes one authorization question: may this
//! principal perform this action on this resource? It is built once and then
//! only read.

use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::attributes::HostValue;

/// Prefix removed from role names before they reach the PDP.
const ROLE_PREFIX: &str = "ROLE_";

/// Immutable description of one authorization question.
///
/// Roles are sanitized by [`EvaluationRequestBuilder::build`]. Other fields
/// are stored as supplied; attribute normalization and default resolution
/// happen in the evaluation service.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRequest {
    principal_id: String,
    roles: Vec<String>,
    principal_attributes: IndexMap<String, HostValue>,
    resource_kind: Option<String>,
    resource_id: String,
    resource_attributes: IndexMap<String, HostValue>,
    action: String,
    policy_version: Option<String>,
    principal_scope: Option<String>,
    resource_scope: Option<String>,
}

impl EvaluationRequest {
    /// Start a request for `principal_id` performing `action` on `resource_id`.
    #[must_use]
    pub fn builder(
        principal_id: impl Into<String>,
        resource_id: impl Into<String>,
        action: impl Into<String>,
    ) -> EvaluationRequestBuilder {
        EvaluationRequestBuilder {
            inner: Self {
                principal_id: principal_id.into(),
                roles: Vec::new(),
                principal_attributes: IndexMap::new(),
                resource_kind: None,
                resource_id: resource_id.into(),
                resource_attributes: IndexMap::new(),
                action: action.into(),
                policy_version: None,
                principal_scope: None,
                resource_scope: None,
            },
        }
    }

    #[must_use]
    pub fn principal_id(&self) -> &str {
        &self.principal_id
    }

    /// Sanitized roles, sorted. See [`sanitize_roles`].
    #[must_use]
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    #[must_use]
    pub fn principal_attributes(&self) -> &IndexMap<String, HostValue> {
        &self.principal_attributes
    }

    #[must_use]
    pub fn resource_kind(&self) -> Option<&str> {
        self.resource_kind.as_deref()
    }

    #[must_use]
    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    #[must_use]
    pub fn resource_attributes(&self) -> &IndexMap<String, HostValue> {
        &self.resource_attributes
    }

    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    #[must_use]
    pub fn policy_version(&self) -> Option<&str> {
        self.policy_version.as_deref()
    }

    #[must_use]
    pub fn principal_scope(&self) -> Option<&str> {
        self.principal_scope.as_deref()
    }

    #[must_use]
    pub fn resource_scope(&self) -> Option<&str> {
        self.resource_scope.as_deref()
    }
}

/// Builder for [`EvaluationRequest`].
#[derive(Debug, Clone)]
pub struct EvaluationRequestBuilder {
    inner: EvaluationRequest,
}

impl EvaluationRequestBuilder {
    /// Append one role.
    #[must_use]
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.inner.roles.push(role.into());
        self
    }

    /// Append several roles.
    #[must_use]
    pub fn roles<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        self.inner.roles.extend(roles.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn principal_attribute(mut self, key: impl Into<String>, value: impl Into<HostValue>) -> Self {
        self.inner
            .principal_attributes
            .insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn principal_attributes<I, K, V>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<HostValue>,
    {
        self.inner.principal_attributes.extend(
            attributes
                .into_iter()
                .map(|(k, v)| (k.into(), v.into())),
        );
        self
    }

    /// Resource kind. When omitted or blank, the deployment default applies.
    #[must_use]
    pub fn resource_kind(mut self, kind: impl Into<String>) -> Self {
        self.inner.resource_kind = Some(kind.into());
        self
    }

    #[must_use]
    pub fn resource_attribute(mut self, key: impl Into<String>, value: impl Into<HostValue>) -> Self {
        self.inner
            .resource_attributes
            .insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn resource_attributes<I, K, V>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<HostValue>,
    {
        self.inner.resource_attributes.extend(
            attributes
                .into_iter()
                .map(|(k, v)| (k.into(), v.into())),
        );
        self
    }

    #[must_use]
    pub fn policy_version(mut self, version: impl Into<String>) -> Self {
        self.inner.policy_version = Some(version.into());
        self
    }

    #[must_use]
    pub fn principal_scope(mut self, scope: impl Into<String>) -> Self {
        self.inner.principal_scope = Some(scope.into());
        self
    }

    #[must_use]
    pub fn resource_scope(mut self, scope: impl Into<String>) -> Self {
        self.inner.resource_scope = Some(scope.into());
        self
    }

    /// Finish the request, sanitizing the collected roles.
    #[must_use]
    pub fn build(mut self) -> EvaluationRequest {
        self.inner.roles = sanitize_roles(&self.inner.roles);
        self.inner
    }
}

/// Drop blank roles, strip one leading `ROLE_` and deduplicate.
///
/// The result is sorted.
#[must_use]
pub fn sanitize_roles<S: AsRef<str>>(roles: &[S]) -> Vec<String> {
    roles
        .iter()
        .map(AsRef::as_ref)
        .filter(|role| !role.trim().is_empty())
        .map(|role| role.strip_prefix(ROLE_PREFIX).unwrap_or(role))
        .filter(|role| !role.trim().is_empty())
        .map(str::to_owned)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_values_and_sanitizes_roles() {
        let request = EvaluationRequest::builder("alice", "/documents/1", "read")
            .roles(["ROLE_employee", "  "])
            .role("manager")
            .resource_kind("document")
            .principal_attribute("department", "eng")
            .resource_attribute("owner", "alice")
            .resource_attribute("owner", "bob")
            .policy_version("v2")
            .build();

        assert_eq!(request.principal_id(), "alice");
        assert_eq!(request.resource_id(), "/documents/1");
        assert_eq!(request.action(), "read");
        assert_eq!(request.roles(), ["employee", "manager"]);
        assert_eq!(request.resource_kind(), Some("document"));
        assert_eq!(request.policy_version(), Some("v2"));
        assert_eq!(request.principal_scope(), None);
        assert_eq!(
            request.resource_attributes().get("owner"),
            Some(&HostValue::from("bob"))
        );
        assert_eq!(request.principal_attributes().len(), 1);
    }

    #[test]
    fn attribute_order_follows_insertion() {
        let request = EvaluationRequest::builder("p", "r", "a")
            .resource_attributes([("z", 1_i32), ("a", 2_i32)])
            .build();

        let keys: Vec<&str> = request
            .resource_attributes()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn sanitize_roles_filters_strips_and_dedups() {
        let roles = sanitize_roles(&["ROLE_admin", "ROLE_admin", " ", "manager"]);
        assert_eq!(roles, vec!["admin".to_owned(), "manager".to_owned()]);
    }

    #[test]
    fn sanitize_roles_strips_prefix_once_and_keeps_case() {
        let roles = sanitize_roles(&["ROLE_ROLE_x", "Role_y", "ROLE_", ""]);
        assert_eq!(roles, vec!["ROLE_x".to_owned(), "Role_y".to_owned()]);
    }

    #[test]
    fn built_request_holds_sanitized_roles_once() {
        let request = EvaluationRequest::builder("alice", "doc", "read")
            .role("ROLE_ROLE_admin")
            .roles(["ROLE_admin", "", "ROLE_"])
            .build();

        assert_eq!(request.roles(), ["ROLE_admin", "admin"]);
    }
}
