//! Service implementation for the static PDP plugin.

use cerbos_authz_sdk::{
    CheckResourcesResult, Effect, Principal, ResourceAction, ResourceMeta, ResourceResult,
};

use crate::config::{StaticMode, StaticPdpConfig};

/// Request id reported in every result.
const REQUEST_ID: &str = "static-pdp";

/// Static PDP service.
///
/// Answers one [`ResourceResult`] per requested resource, with one effect per
/// requested action.
#[derive(Debug, Clone, Default)]
pub struct Service {
    config: StaticPdpConfig,
}

impl Service {
    #[must_use]
    pub fn new(config: StaticPdpConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn mode(&self) -> StaticMode {
        self.config.mode
    }

    /// Evaluate every action of every resource for `principal`.
    #[must_use]
    pub fn evaluate(&self, principal: &Principal, resources: &[ResourceAction]) -> CheckResourcesResult {
        let results = resources
            .iter()
            .map(|entry| ResourceResult {
                resource: ResourceMeta {
                    id: entry.resource.id.clone(),
                    kind: entry.resource.kind.clone(),
                    policy_version: entry.resource.policy_version.clone(),
                    scope: entry.resource.scope.clone(),
                },
                actions: entry
                    .actions
                    .iter()
                    .map(|action| (action.clone(), self.effect(principal, &entry.resource.kind, action)))
                    .collect(),
                validation_errors: Vec::new(),
            })
            .collect();

        CheckResourcesResult {
            request_id: REQUEST_ID.to_owned(),
            results,
        }
    }

    fn effect(&self, principal: &Principal, kind: &str, action: &str) -> Effect {
        let allowed = match self.config.mode {
            StaticMode::AllowAll => true,
            StaticMode::DenyAll => false,
            StaticMode::Rules => self
                .config
                .rules
                .iter()
                .any(|rule| rule.grants(&principal.roles, kind, action)),
        };
        if allowed { Effect::Allow } else { Effect::Deny }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::config::PolicyRule;
    use cerbos_authz_sdk::Resource;
    use indexmap::IndexMap;

    fn principal(roles: &[&str]) -> Principal {
        Principal {
            id: "alice".to_owned(),
            roles: roles.iter().map(|r| (*r).to_owned()).collect(),
            policy_version: None,
            scope: None,
            attributes: IndexMap::new(),
        }
    }

    fn entry(kind: &str, id: &str, actions: &[&str]) -> ResourceAction {
        ResourceAction {
            actions: actions.iter().map(|a| (*a).to_owned()).collect(),
            resource: Resource {
                kind: kind.to_owned(),
                id: id.to_owned(),
                policy_version: Some("default".to_owned()),
                scope: None,
                attributes: IndexMap::new(),
            },
        }
    }

    fn rules_service() -> Service {
        Service::new(StaticPdpConfig {
            mode: StaticMode::Rules,
            rules: vec![
                PolicyRule {
                    roles: vec!["employee".to_owned()],
                    kinds: vec!["document".to_owned()],
                    actions: vec!["read".to_owned()],
                },
                PolicyRule {
                    roles: vec!["admin".to_owned()],
                    kinds: vec!["*".to_owned()],
                    actions: vec!["*".to_owned()],
                },
            ],
        })
    }

    #[test]
    fn allow_all_allows_every_action() {
        let service = Service::default();
        let result = service.evaluate(&principal(&[]), &[entry("document", "d1", &["read", "delete"])]);

        let doc = result.find("d1").unwrap();
        assert!(doc.is_allowed("read"));
        assert!(doc.is_allowed("delete"));
        assert_eq!(doc.resource.policy_version.as_deref(), Some("default"));
    }

    #[test]
    fn deny_all_denies_every_action() {
        let service = Service::new(StaticPdpConfig {
            mode: StaticMode::DenyAll,
            ..StaticPdpConfig::default()
        });
        let result = service.evaluate(&principal(&["admin"]), &[entry("document", "d1", &["read"])]);

        assert_eq!(result.find("d1").unwrap().actions["read"], Effect::Deny);
    }

    #[test]
    fn rules_grant_by_role_kind_and_action() {
        let service = rules_service();
        let employee = principal(&["employee"]);

        let result = service.evaluate(
            &employee,
            &[
                entry("document", "d1", &["read", "delete"]),
                entry("invoice", "i1", &["read"]),
            ],
        );

        let doc = result.find("d1").unwrap();
        assert!(doc.is_allowed("read"));
        assert!(!doc.is_allowed("delete"));
        assert!(!result.find("i1").unwrap().is_allowed("read"));
    }

    #[test]
    fn wildcard_rule_grants_everything_to_role() {
        let service = rules_service();
        let result = service.evaluate(&principal(&["admin"]), &[entry("invoice", "i1", &["delete"])]);

        assert!(result.find("i1").unwrap().is_allowed("delete"));
    }

    #[test]
    fn principal_without_matching_role_is_denied() {
        let service = rules_service();
        let result = service.evaluate(&principal(&["guest"]), &[entry("document", "d1", &["read"])]);

        assert!(!result.find("d1").unwrap().is_allowed("read"));
    }

    #[test]
    fn config_parses_from_json() {
        let config: StaticPdpConfig = serde_json::from_value(serde_json::json!({
            "mode": "rules",
            "rules": [{ "roles": ["*"], "kinds": ["document"], "actions": ["read"] }]
        }))
        .unwrap();

        assert_eq!(config.mode, StaticMode::Rules);
        assert!(config.rules[0].grants(&[], "document", "read"));
        assert!(!config.rules[0].grants(&[], "document", "update"));
    }
}
