use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::values::is_blank;

/// A `when` clause: gates a rule on the current value of a peer field.
///
/// Only one test is honoured. When a configuration sets several, the first
/// present one wins in this order: `equals`, `notEquals`, `notEmpty`, `in`,
/// `notIn`. A clause with no test at all always applies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Name of the peer field whose value is inspected.
    pub field: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equals: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_equals: Option<Value>,

    /// `false` is the same as not setting the test.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub not_empty: bool,

    #[serde(default, rename = "in", skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_in: Option<Vec<Value>>,
}

/// The single test a [`Condition`] resolves to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConditionTest<'a> {
    Equals(&'a Value),
    NotEquals(&'a Value),
    NotEmpty,
    In(&'a [Value]),
    NotIn(&'a [Value]),
}

impl ConditionTest<'_> {
    /// Evaluate against the peer value (`Value::Null` when the peer is missing).
    #[must_use]
    pub fn evaluate(&self, peer: &Value) -> bool {
        match self {
            Self::Equals(expected) => peer == *expected,
            Self::NotEquals(expected) => peer != *expected,
            Self::NotEmpty => !is_blank(peer),
            Self::In(set) => set.contains(peer),
            Self::NotIn(set) => !set.contains(peer),
        }
    }
}

impl Condition {
    /// Start a clause on `field` with no test yet.
    #[must_use]
    pub fn on(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn equals(mut self, value: impl Into<Value>) -> Self {
        self.equals = Some(value.into());
        self
    }

    #[must_use]
    pub fn not_equals(mut self, value: impl Into<Value>) -> Self {
        self.not_equals = Some(value.into());
        self
    }

    #[must_use]
    pub fn not_empty(mut self) -> Self {
        self.not_empty = true;
        self
    }

    #[must_use]
    pub fn one_of<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.one_of = Some(values.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn not_in<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.not_in = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Resolve the honoured test, or `None` if the clause sets none.
    #[must_use]
    pub fn test(&self) -> Option<ConditionTest<'_>> {
        if let Some(expected) = &self.equals {
            return Some(ConditionTest::Equals(expected));
        }
        if let Some(expected) = &self.not_equals {
            return Some(ConditionTest::NotEquals(expected));
        }
        if self.not_empty {
            return Some(ConditionTest::NotEmpty);
        }
        if let Some(set) = &self.one_of {
            return Some(ConditionTest::In(set));
        }
        self.not_in.as_deref().map(ConditionTest::NotIn)
    }
}
