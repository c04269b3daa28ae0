//! Configuration for the static PDP plugin.

use serde::{Deserialize, Serialize};

/// Plugin configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticPdpConfig {
    /// Decision mode.
    pub mode: StaticMode,

    /// Rules consulted in `rules` mode.
    pub rules: Vec<PolicyRule>,
}

/// Decision mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaticMode {
    /// Allow every action.
    #[default]
    AllowAll,
    /// Deny every action.
    DenyAll,
    /// Allow only what a rule grants.
    Rules,
}

/// Grants `actions` on resources of `kinds` to principals holding any of `roles`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyRule {
    pub roles: Vec<String>,
    pub kinds: Vec<String>,
    pub actions: Vec<String>,
}

pub const WILDCARD: &str = "*";

impl PolicyRule {
    /// Whether this rule grants `action` on `kind` to a holder of `roles`.
    #[must_use]
    pub fn grants(&self, roles: &[String], kind: &str, action: &str) -> bool {
        let any_role = self
            .roles
            .iter()
            .any(|r| r == WILDCARD || roles.iter().any(|held| held == r));
        any_role && matches_entry(&self.kinds, kind) && matches_entry(&self.actions, action)
    }
}

fn matches_entry(entries: &[String], value: &str) -> bool {
    entries.iter().any(|e| e == WILDCARD || e == value)
}
