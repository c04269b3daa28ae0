//! Deployment defaults for the Cerbos authorization adapter.
//!
//! Loaded once at process start and shared read-only (behind `Arc`) by every
//! evaluation.

use std::collections::HashMap;
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Action used when the HTTP method is blank.
pub const UNKNOWN_ACTION: &str = "unknown";

/// Process-wide defaults applied when a request does not override them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeploymentDefaults {
    /// PDP connection settings.
    pub pdp: PdpSettings,
    /// Resource kind used when the request does not name one.
    pub resource_kind: String,
    pub policy_version: Option<String>,
    pub principal_scope: Option<String>,
    pub resource_scope: Option<String>,
    /// HTTP method to action lookup table.
    pub method_actions: MethodActions,
}

impl Default for DeploymentDefaults {
    fn default() -> Self {
        Self {
            pdp: PdpSettings::default(),
            resource_kind: "http_request".to_owned(),
            policy_version: None,
            principal_scope: None,
            resource_scope: None,
            method_actions: MethodActions::default(),
        }
    }
}

/// Transport security for the PDP connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    /// Unencrypted HTTP.
    #[default]
    Plaintext,
    /// TLS without certificate verification.
    Insecure,
    /// TLS with certificate verification.
    Tls,
}

/// Connection settings for the PDP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PdpSettings {
    /// `host:port` or a full `http(s)://` URL.
    pub target: String,
    pub transport: TransportMode,
    /// Per-call timeout, e.g. `"1s"` or `"250ms"`.
    #[serde(with = "humantime_duration")]
    pub timeout: Duration,
    /// Playground instance selector sent with every call.
    pub playground_instance: Option<String>,
    /// Static headers attached to every call.
    pub headers: IndexMap<String, String>,
}

impl Default for PdpSettings {
    fn default() -> Self {
        Self {
            target: "localhost:3593".to_owned(),
            transport: TransportMode::default(),
            timeout: Duration::from_secs(1),
            playground_instance: None,
            headers: IndexMap::new(),
        }
    }
}

/// HTTP method to action lookup, case-insensitive on the method.
///
/// Configuring a table replaces the defaults entirely. Methods without an
/// entry map to their lower-cased name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodActions {
    table: HashMap<String, String>,
}

impl MethodActions {
    /// Builds a table from `(method, action)` pairs.
    #[must_use]
    pub fn new<I, M, A>(entries: I) -> Self
    where
        I: IntoIterator<Item = (M, A)>,
        M: AsRef<str>,
        A: Into<String>,
    {
        Self {
            table: entries
                .into_iter()
                .map(|(method, action)| (method.as_ref().trim().to_uppercase(), action.into()))
                .collect(),
        }
    }

    /// Resolves the action for an HTTP method.
    #[must_use]
    pub fn resolve(&self, method: &str) -> String {
        let method = method.trim();
        if method.is_empty() {
            return UNKNOWN_ACTION.to_owned();
        }
        self.table
            .get(&method.to_uppercase())
            .cloned()
            .unwrap_or_else(|| method.to_lowercase())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for MethodActions {
    fn default() -> Self {
        Self::new([
            ("GET", "read"),
            ("HEAD", "read"),
            ("POST", "create"),
            ("PUT", "update"),
            ("PATCH", "update"),
            ("DELETE", "delete"),
        ])
    }
}

impl Serialize for MethodActions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let sorted: std::collections::BTreeMap<&String, &String> = self.table.iter().collect();
        sorted.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MethodActions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = HashMap::<String, String>::deserialize(deserializer)?;
        Ok(Self::new(raw))
    }
}

mod humantime_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*value))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
    }
}
