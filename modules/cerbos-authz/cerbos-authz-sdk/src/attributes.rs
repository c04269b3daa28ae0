//! Attribute normalization.
//!
//! Host applications describe principals and resources with loosely typed
//! values ([`HostValue`]). Before a value crosses the PDP boundary it is
//! converted into the canonical [`AttributeValue`] model by [`normalize`].
//!
//! Conversion rules, applied first-match:
//!
//! | Host value        | Attribute value                         |
//! |-------------------|-----------------------------------------|
//! | `Null`            | the string `"null"`                     |
//! | `Attribute`       | passed through unchanged                |
//! | `String`          | string                                  |
//! | `Number`          | double                                  |
//! | `Bool`            | bool                                    |
//! | `Enum`            | string holding the symbolic name        |
//! | `Map`             | map with string keys, order preserved   |
//! | `Sequence`        | list, order preserved                   |
//! | `Object`          | string holding the textual form         |
//!
//! Map keys that are absent are skipped. Other keys are coerced to their
//! textual form; a later key with the same text overwrites the earlier value
//! in its original position.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;

use indexmap::IndexMap;

use crate::models::{AttributeValue, render_double};

/// Numeric host value. All numbers normalize to doubles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostNumber {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

impl HostNumber {
    /// Converts to a double. Integers beyond 2^53 lose precision.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_f64(self) -> f64 {
        match self {
            Self::Signed(n) => n as f64,
            Self::Unsigned(n) => n as f64,
            Self::Float(n) => n,
        }
    }
}

impl fmt::Display for HostNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signed(n) => write!(f, "{n}"),
            Self::Unsigned(n) => write!(f, "{n}"),
            Self::Float(n) => f.write_str(&render_double(*n)),
        }
    }
}

/// A loosely typed value supplied by the host application.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    /// Absent value.
    Null,
    /// Already canonical; passed through untouched.
    Attribute(AttributeValue),
    String(String),
    Number(HostNumber),
    Bool(bool),
    /// Enumeration constant, carried by its symbolic name.
    Enum(String),
    /// Key/value pairs in iteration order. Keys may be any host value.
    Map(Vec<(HostValue, HostValue)>),
    /// Any ordered collection or array.
    Sequence(Vec<HostValue>),
    /// Any other value, carried by its textual form.
    Object(String),
}

impl HostValue {
    /// Enumeration constant identified by its symbolic name.
    #[must_use]
    pub fn enumerated(name: impl Into<String>) -> Self {
        Self::Enum(name.into())
    }

    /// Arbitrary value carried by its `Display` form.
    #[must_use]
    pub fn object(value: &impl fmt::Display) -> Self {
        Self::Object(value.to_string())
    }

    /// Map from any iterable of key/value pairs.
    #[must_use]
    pub fn map<K, V, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<HostValue>,
        V: Into<HostValue>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Sequence from any iterable.
    #[must_use]
    pub fn sequence<T, I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<HostValue>,
    {
        Self::Sequence(items.into_iter().map(Into::into).collect())
    }
}

/// Convert one host value into the canonical attribute model.
///
/// Total: every input yields a value, nested containers are converted
/// recursively and the input is left untouched.
#[must_use]
pub fn normalize(value: &HostValue) -> AttributeValue {
    match value {
        HostValue::Null => AttributeValue::null(),
        HostValue::Attribute(attr) => attr.clone(),
        HostValue::String(text) | HostValue::Enum(text) | HostValue::Object(text) => {
            AttributeValue::String(text.clone())
        }
        HostValue::Number(n) => AttributeValue::Double(n.to_f64()),
        HostValue::Bool(b) => AttributeValue::Bool(*b),
        HostValue::Map(entries) => AttributeValue::Map(normalize_entries(entries)),
        HostValue::Sequence(items) => AttributeValue::List(items.iter().map(normalize).collect()),
    }
}

/// Convert every value of a string-keyed map, preserving entry order.
#[must_use]
pub fn normalize_map<S: ::std::hash::BuildHasher>(
    values: &IndexMap<String, HostValue, S>,
) -> IndexMap<String, AttributeValue> {
    values
        .iter()
        .map(|(key, value)| (key.clone(), normalize(value)))
        .collect()
}

fn normalize_entries(entries: &[(HostValue, HostValue)]) -> IndexMap<String, AttributeValue> {
    let mut out = IndexMap::with_capacity(entries.len());
    for (key, value) in entries {
        if let Some(key) = key_text(key) {
            out.insert(key, normalize(value));
        }
    }
    out
}

/// Textual form of a map key; `None` for absent keys.
fn key_text(key: &HostValue) -> Option<String> {
    match key {
        HostValue::Null => None,
        HostValue::String(text) | HostValue::Enum(text) | HostValue::Object(text) => {
            Some(text.clone())
        }
        HostValue::Number(n) => Some(n.to_string()),
        HostValue::Bool(b) => Some(b.to_string()),
        HostValue::Attribute(attr) => Some(attr.to_string()),
        HostValue::Map(_) | HostValue::Sequence(_) => Some(normalize(key).to_string()),
    }
}

impl From<AttributeValue> for HostValue {
    fn from(value: AttributeValue) -> Self {
        Self::Attribute(value)
    }
}

impl From<String> for HostValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for HostValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<&String> for HostValue {
    fn from(value: &String) -> Self {
        Self::String(value.clone())
    }
}

impl From<bool> for HostValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<HostNumber> for HostValue {
    fn from(value: HostNumber) -> Self {
        Self::Number(value)
    }
}

macro_rules! impl_from_number {
    ($variant:ident($target:ty): $($t:ty),+) => {
        $(
            impl From<$t> for HostValue {
                fn from(value: $t) -> Self {
                    Self::Number(HostNumber::$variant(<$target>::from(value)))
                }
            }
        )+
    };
}

impl_from_number!(Signed(i64): i8, i16, i32, i64);
impl_from_number!(Unsigned(u64): u8, u16, u32, u64);
impl_from_number!(Float(f64): f32, f64);

impl From<isize> for HostValue {
    #[allow(clippy::cast_possible_truncation)]
    fn from(value: isize) -> Self {
        Self::Number(HostNumber::Signed(value as i64))
    }
}

impl From<usize> for HostValue {
    #[allow(clippy::cast_possible_truncation)]
    fn from(value: usize) -> Self {
        Self::Number(HostNumber::Unsigned(value as u64))
    }
}

impl<T: Into<HostValue>> From<Option<T>> for HostValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<HostValue>> From<Vec<T>> for HostValue {
    fn from(items: Vec<T>) -> Self {
        Self::sequence(items)
    }
}

impl<T: Into<HostValue>, const N: usize> From<[T; N]> for HostValue {
    fn from(items: [T; N]) -> Self {
        Self::sequence(items)
    }
}

impl<T: Clone + Into<HostValue>> From<&[T]> for HostValue {
    fn from(items: &[T]) -> Self {
        Self::sequence(items.iter().cloned())
    }
}

impl<T: Into<HostValue>> From<VecDeque<T>> for HostValue {
    fn from(items: VecDeque<T>) -> Self {
        Self::sequence(items)
    }
}

impl<T: Into<HostValue>, S> From<HashSet<T, S>> for HostValue {
    fn from(items: HashSet<T, S>) -> Self {
        Self::sequence(items)
    }
}

impl<T: Into<HostValue>> From<BTreeSet<T>> for HostValue {
    fn from(items: BTreeSet<T>) -> Self {
        Self::sequence(items)
    }
}

impl<K: Into<HostValue>, V: Into<HostValue>, S> From<HashMap<K, V, S>> for HostValue {
    fn from(entries: HashMap<K, V, S>) -> Self {
        Self::map(entries)
    }
}

impl<K: Into<HostValue>, V: Into<HostValue>> From<BTreeMap<K, V>> for HostValue {
    fn from(entries: BTreeMap<K, V>) -> Self {
        Self::map(entries)
    }
}

impl<K: Into<HostValue>, V: Into<HostValue>, S> From<IndexMap<K, V, S>> for HostValue {
    fn from(entries: IndexMap<K, V, S>) -> Self {
        Self::map(entries)
    }
}

impl From<serde_json::Value> for HostValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Number(HostNumber::Signed(i))
                } else if let Some(u) = n.as_u64() {
                    Self::Number(HostNumber::Unsigned(u))
                } else {
                    Self::Number(HostNumber::Float(n.as_f64().unwrap_or(f64::NAN)))
                }
            }
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::sequence(items),
            Value::Object(entries) => Self::map(entries),
        }
    }
}
