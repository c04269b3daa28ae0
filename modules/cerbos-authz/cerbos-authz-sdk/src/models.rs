//! Attribute values and PDP request/response models.
//!
//! Field names follow the Cerbos `CheckResources` JSON API so the models can
//! be sent and received as-is by HTTP clients.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};

/// Literal string sent in place of an absent value.
///
/// The PDP attribute model has no null, so absent values travel as this text.
pub const NULL_LITERAL: &str = "null";

/// Wire text for a `NaN` double.
///
/// JSON has no non-finite numbers, so `NaN` and the infinities are sent as
/// these strings and come back as [`AttributeValue::String`].
pub const NAN_LITERAL: &str = "NaN";
/// Wire text for positive infinity.
pub const INFINITY_LITERAL: &str = "Infinity";
/// Wire text for negative infinity.
pub const NEG_INFINITY_LITERAL: &str = "-Infinity";

/// Canonical typed value understood by the PDP.
///
/// Map keys are always strings and entry order is preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    #[serde(serialize_with = "serialize_double")]
    Double(f64),
    String(String),
    List(Vec<AttributeValue>),
    Map(IndexMap<String, AttributeValue>),
}

impl AttributeValue {
    /// The value used for absent inputs: the string `"null"`.
    #[must_use]
    pub fn null() -> Self {
        Self::String(NULL_LITERAL.to_owned())
    }

    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(d) => Some(*d),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[AttributeValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&IndexMap<String, AttributeValue>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

/// Textual form of a value.
///
/// Scalars render without quoting; lists and maps render as compact JSON.
impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Double(d) => f.write_str(&render_double(*d)),
            Self::String(s) => f.write_str(s),
            Self::List(_) | Self::Map(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

/// Wire text for `NaN` and the infinities; `None` for finite values.
fn non_finite_literal(value: f64) -> Option<&'static str> {
    if value.is_nan() {
        Some(NAN_LITERAL)
    } else if value.is_infinite() {
        Some(if value.is_sign_positive() {
            INFINITY_LITERAL
        } else {
            NEG_INFINITY_LITERAL
        })
    } else {
        None
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)] // signature fixed by serde's serialize_with
fn serialize_double<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    match non_finite_literal(*value) {
        Some(literal) => serializer.serialize_str(literal),
        None => serializer.serialize_f64(*value),
    }
}

/// Renders a double keeping a fractional part for integral values (`1.0`, not `1`).
///
/// Non-finite values render as their wire text.
pub(crate) fn render_double(value: f64) -> String {
    if let Some(literal) = non_finite_literal(value) {
        return literal.to_owned();
    }
    let text = value.to_string();
    if text.contains(['.', 'e', 'E']) {
        text
    } else {
        format!("{text}.0")
    }
}

/// The subject of an authorization check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, rename = "attr", skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, AttributeValue>,
}

/// The object an action is performed on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub kind: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, rename = "attr", skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, AttributeValue>,
}

/// One resource together with the actions to check against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceAction {
    pub actions: Vec<String>,
    pub resource: Resource,
}

/// Decision effect for a single action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    #[serde(rename = "EFFECT_ALLOW")]
    Allow,
    #[serde(rename = "EFFECT_DENY")]
    Deny,
    #[serde(rename = "EFFECT_NO_MATCH")]
    NoMatch,
    #[default]
    #[serde(rename = "EFFECT_UNSPECIFIED", other)]
    Unspecified,
}

/// Identity of the resource a result refers to, as echoed by the PDP.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMeta {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Schema validation problem reported by the PDP for an input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub source: String,
}

/// Per-resource outcome: one effect per requested action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceResult {
    #[serde(default)]
    pub resource: ResourceMeta,
    #[serde(default)]
    pub actions: IndexMap<String, Effect>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation_errors: Vec<ValidationIssue>,
}

impl ResourceResult {
    /// `true` only when the PDP answered `EFFECT_ALLOW` for `action`.
    #[must_use]
    pub fn is_allowed(&self, action: &str) -> bool {
        self.actions.get(action) == Some(&Effect::Allow)
    }
}

/// Response of a `CheckResources` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResourcesResult {
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub results: Vec<ResourceResult>,
}

impl CheckResourcesResult {
    /// Locate the result for a resource id.
    #[must_use]
    pub fn find(&self, resource_id: &str) -> Option<&ResourceResult> {
        self.results.iter().find(|r| r.resource.id == resource_id)
    }
}
