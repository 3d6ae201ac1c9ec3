use std::borrow::Cow;
use std::collections::HashMap;
use std::ops::Index;

use serde::{Deserialize, Serialize};
use serde_json::Value;

static NULL: Value = Value::Null;

/// Raw values of a form, keyed by field name.
///
/// Values are kept exactly as submitted. Normalization happens per rule
/// inside the validator, never here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormValues {
    #[serde(flatten)]
    values: HashMap<String, Value>,
}

impl FormValues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value by field name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Get a value by field name, reading a missing field as `null`.
    #[must_use]
    pub fn peer(&self, name: &str) -> &Value {
        self.values.get(name).unwrap_or(&NULL)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Chainable variant of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.values.get(name)?.as_str()
    }

    /// Build from a JSON object. Anything else yields an empty set.
    #[must_use]
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => map.into_iter().collect(),
            _ => Self::default(),
        }
    }
}

impl FromIterator<(String, Value)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<(&'a str, Value)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (&'a str, Value)>>(iter: I) -> Self {
        iter.into_iter().map(|(k, v)| (k.to_owned(), v)).collect()
    }
}

impl Index<&str> for FormValues {
    type Output = Value;

    /// Missing fields index as `null` rather than panicking.
    fn index(&self, name: &str) -> &Self::Output {
        self.peer(name)
    }
}

/// Render a raw value as the text the rules operate on.
///
/// `null` renders empty, strings as-is, numbers and booleans via their
/// display form, arrays as comma-joined elements, objects as compact JSON.
#[must_use]
pub fn to_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed(""),
        Value::String(s) => Cow::Borrowed(s),
        Value::Bool(b) => Cow::Owned(b.to_string()),
        Value::Number(n) => Cow::Owned(n.to_string()),
        Value::Array(items) => Cow::Owned(
            items
                .iter()
                .map(to_text)
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => Cow::Owned(value.to_string()),
    }
}

/// Whether a value counts as empty: `null`, or text that is blank after trimming.
#[must_use]
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        other => to_text(other).trim().is_empty(),
    }
}
