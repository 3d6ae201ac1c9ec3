//! Rule definitions.
//!
//! A rule is a flat object with a `type` tag, a few header keys shared by
//! every rule (`severity`, `message`, `when`, `uppercase`, `extra`) and the
//! parameters of its kind:
//!
//! ```yaml
//! - type: length
//!   min: 2
//!   max: 50
//!   severity: warning
//!   maxMessage: { en: "Too long", hi: "बहुत लंबा" }
//! ```
//!
//! Tags this crate knows are checked when the document is loaded. Any other
//! tag is kept as [`RuleKind::Other`] and dispatched by name at validation time.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::ser::{self, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::condition::Condition;
use crate::message::{Message, Severity};

/// Canonical dispatch keys of the built-in rule kinds.
pub mod tag {
    pub const REQUIRED: &str = "required";
    pub const REGEX: &str = "regex";
    pub const LENGTH: &str = "length";
    pub const NUMBER_RANGE: &str = "numberRange";
    pub const DATE: &str = "date";
    pub const SELECT: &str = "select";
    pub const CROSS_FIELD: &str = "crossField";
    pub const CUSTOM: &str = "custom";
    pub const ASYNC: &str = "async";
}

/// Keys handled by [`RuleDef`] itself rather than by its kind.
const HEADER_KEYS: [&str; 6] = ["type", "severity", "message", "when", "uppercase", "extra"];

// ── Parameters per kind ─────────────────────────────────────────────────────

/// Regular expression match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternRule {
    /// Falls back to `extra.pattern` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Falls back to `extra.flags` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<String>,
}

/// Character count bounds. `eq` is checked first, then `min`, then `max`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LengthRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eq: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eq_message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_message: Option<Message>,
}

impl LengthRule {
    #[must_use]
    pub fn exactly(len: usize) -> Self {
        Self {
            eq: Some(len),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn between(min: usize, max: usize) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn at_least(min: usize) -> Self {
        Self {
            min: Some(min),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn at_most(max: usize) -> Self {
        Self {
            max: Some(max),
            ..Self::default()
        }
    }
}

/// Inclusive numeric bounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberRangeRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_message: Option<Message>,
}

impl NumberRangeRule {
    #[must_use]
    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn at_most(max: f64) -> Self {
        Self {
            max: Some(max),
            ..Self::default()
        }
    }
}

/// Calendar date checks, relative to the evaluation date or to fixed dates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRule {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub must_be_past: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub must_be_future: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<NaiveDate>,
    /// Minimum age in whole years on the evaluation date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_min: Option<u32>,
}

impl DateRule {
    #[must_use]
    pub fn past() -> Self {
        Self {
            must_be_past: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn future() -> Self {
        Self {
            must_be_future: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn before(mut self, date: NaiveDate) -> Self {
        self.before = Some(date);
        self
    }

    #[must_use]
    pub fn after(mut self, date: NaiveDate) -> Self {
        self.after = Some(date);
        self
    }

    #[must_use]
    pub fn age_min(mut self, years: u32) -> Self {
        self.age_min = Some(years);
        self
    }
}

/// Membership in a fixed option list. An empty list defers to the field's options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectRule {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

/// Equality with another field of the same form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossFieldRule {
    pub field: String,
}

/// Reference to a predicate in the custom registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRule {
    pub custom: String,
}

/// Validation delegated to an HTTP endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRule {
    pub endpoint: Url,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

// ── Kind ────────────────────────────────────────────────────────────────────

/// What a rule checks.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
    Required,
    Pattern(PatternRule),
    Length(LengthRule),
    NumberRange(NumberRangeRule),
    Date(DateRule),
    Select(SelectRule),
    CrossField(CrossFieldRule),
    Custom(CustomRule),
    Remote(RemoteRule),
    /// Any tag not listed above, with its parameters untouched.
    Other { name: String, params: Map<String, Value> },
}

impl RuleKind {
    /// Canonical dispatch key.
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            Self::Required => tag::REQUIRED,
            Self::Pattern(_) => tag::REGEX,
            Self::Length(_) => tag::LENGTH,
            Self::NumberRange(_) => tag::NUMBER_RANGE,
            Self::Date(_) => tag::DATE,
            Self::Select(_) => tag::SELECT,
            Self::CrossField(_) => tag::CROSS_FIELD,
            Self::Custom(_) => tag::CUSTOM,
            Self::Remote(_) => tag::ASYNC,
            Self::Other { name, .. } => name,
        }
    }

    /// Build a kind from its tag (aliases included) and remaining parameters.
    ///
    /// # Errors
    ///
    /// Returns an error when a known tag has missing or ill-typed parameters.
    pub fn from_params(name: &str, params: Map<String, Value>) -> Result<Self, serde_json::Error> {
        let params = Value::Object(params);
        Ok(match name {
            "required" => Self::Required,
            "regex" | "pattern" => Self::Pattern(serde_json::from_value(params)?),
            "length" => Self::Length(serde_json::from_value(params)?),
            "numberRange" | "number" => Self::NumberRange(serde_json::from_value(params)?),
            "date" => Self::Date(serde_json::from_value(params)?),
            "select" | "enum" => Self::Select(serde_json::from_value(params)?),
            "crossField" => Self::CrossField(serde_json::from_value(params)?),
            "custom" => Self::Custom(serde_json::from_value(params)?),
            "async" | "remote" => Self::Remote(serde_json::from_value(params)?),
            other => Self::Other {
                name: other.to_owned(),
                params: match params {
                    Value::Object(map) => map,
                    _ => Map::new(),
                },
            },
        })
    }

    /// The kind's parameters as a flat JSON object (without the tag).
    ///
    /// # Errors
    ///
    /// Fails only if a parameter cannot be represented as JSON.
    pub fn params(&self) -> Result<Map<String, Value>, serde_json::Error> {
        let value = match self {
            Self::Required => return Ok(Map::new()),
            Self::Other { params, .. } => return Ok(params.clone()),
            Self::Pattern(p) => serde_json::to_value(p)?,
            Self::Length(p) => serde_json::to_value(p)?,
            Self::NumberRange(p) => serde_json::to_value(p)?,
            Self::Date(p) => serde_json::to_value(p)?,
            Self::Select(p) => serde_json::to_value(p)?,
            Self::CrossField(p) => serde_json::to_value(p)?,
            Self::Custom(p) => serde_json::to_value(p)?,
            Self::Remote(p) => serde_json::to_value(p)?,
        };
        Ok(match value {
            Value::Object(map) => map,
            _ => Map::new(),
        })
    }
}

// ── Rule ────────────────────────────────────────────────────────────────────

/// One validation rule attached to a field.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDef {
    pub kind: RuleKind,
    pub severity: Severity,
    /// Overrides whatever message the handler produces.
    pub message: Option<Message>,
    /// The rule is skipped unless this clause holds.
    pub when: Option<Condition>,
    /// Upper-case the value before checking it.
    pub uppercase: bool,
    /// Free-form parameters for custom predicates and handler fallbacks.
    pub extra: Map<String, Value>,
}

impl RuleDef {
    #[must_use]
    pub fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            severity: Severity::default(),
            message: None,
            when: None,
            uppercase: false,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn required() -> Self {
        Self::new(RuleKind::Required)
    }

    #[must_use]
    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self::new(RuleKind::Pattern(PatternRule {
            pattern: Some(pattern.into()),
            flags: None,
        }))
    }

    /// Pattern with flags, e.g. `"i"` for case-insensitive matching.
    #[must_use]
    pub fn pattern_with_flags(pattern: impl Into<String>, flags: impl Into<String>) -> Self {
        Self::new(RuleKind::Pattern(PatternRule {
            pattern: Some(pattern.into()),
            flags: Some(flags.into()),
        }))
    }

    #[must_use]
    pub fn length(rule: LengthRule) -> Self {
        Self::new(RuleKind::Length(rule))
    }

    #[must_use]
    pub fn number_range(rule: NumberRangeRule) -> Self {
        Self::new(RuleKind::NumberRange(rule))
    }

    #[must_use]
    pub fn date(rule: DateRule) -> Self {
        Self::new(RuleKind::Date(rule))
    }

    #[must_use]
    pub fn select<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(RuleKind::Select(SelectRule {
            options: options.into_iter().map(Into::into).collect(),
        }))
    }

    #[must_use]
    pub fn cross_field(field: impl Into<String>) -> Self {
        Self::new(RuleKind::CrossField(CrossFieldRule {
            field: field.into(),
        }))
    }

    #[must_use]
    pub fn custom(key: impl Into<String>) -> Self {
        Self::new(RuleKind::Custom(CustomRule { custom: key.into() }))
    }

    #[must_use]
    pub fn remote(endpoint: Url) -> Self {
        Self::new(RuleKind::Remote(RemoteRule {
            endpoint,
            headers: BTreeMap::new(),
        }))
    }

    /// A rule dispatched by an arbitrary tag.
    #[must_use]
    pub fn other(name: impl Into<String>) -> Self {
        Self::new(RuleKind::Other {
            name: name.into(),
            params: Map::new(),
        })
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<Message>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Shorthand for `with_severity(Severity::Warning)`.
    #[must_use]
    pub fn warning(self) -> Self {
        self.with_severity(Severity::Warning)
    }

    #[must_use]
    pub fn when(mut self, condition: Condition) -> Self {
        self.when = Some(condition);
        self
    }

    #[must_use]
    pub fn uppercase(mut self) -> Self {
        self.uppercase = true;
        self
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Canonical dispatch key of this rule's kind.
    #[must_use]
    pub fn tag(&self) -> &str {
        self.kind.tag()
    }

    /// A string entry of `extra`.
    #[must_use]
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key)?.as_str()
    }
}

fn take<T, E>(map: &mut Map<String, Value>, key: &str) -> Result<Option<T>, E>
where
    T: DeserializeOwned,
    E: de::Error,
{
    match map.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| E::custom(format_args!("`{key}`: {e}"))),
    }
}

impl<'de> Deserialize<'de> for RuleDef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut map = Map::<String, Value>::deserialize(deserializer)?;

        let name = match map.remove("type") {
            Some(Value::String(name)) => name,
            Some(other) => {
                return Err(de::Error::custom(format_args!(
                    "rule `type` must be a string, got {other}"
                )));
            }
            None => return Err(de::Error::missing_field("type")),
        };

        let severity = take(&mut map, "severity")?.unwrap_or_default();
        let message = take(&mut map, "message")?;
        let when = take(&mut map, "when")?;
        let uppercase = take(&mut map, "uppercase")?.unwrap_or(false);
        let extra = take(&mut map, "extra")?.unwrap_or_default();

        let kind = RuleKind::from_params(&name, map)
            .map_err(|e| de::Error::custom(format_args!("`{name}` rule: {e}")))?;

        Ok(Self {
            kind,
            severity,
            message,
            when,
            uppercase,
            extra,
        })
    }
}

impl Serialize for RuleDef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = self.kind.params().map_err(ser::Error::custom)?;
        // Parameters of `Other` rules must not shadow the header.
        map.retain(|k, _| !HEADER_KEYS.contains(&k.as_str()));

        map.insert("type".into(), Value::String(self.tag().to_owned()));
        if self.severity != Severity::default() {
            map.insert(
                "severity".into(),
                serde_json::to_value(self.severity).map_err(ser::Error::custom)?,
            );
        }
        if let Some(message) = &self.message {
            map.insert(
                "message".into(),
                serde_json::to_value(message).map_err(ser::Error::custom)?,
            );
        }
        if let Some(when) = &self.when {
            map.insert(
                "when".into(),
                serde_json::to_value(when).map_err(ser::Error::custom)?,
            );
        }
        if self.uppercase {
            map.insert("uppercase".into(), Value::Bool(true));
        }
        if !self.extra.is_empty() {
            map.insert("extra".into(), Value::Object(self.extra.clone()));
        }
        map.serialize(serializer)
    }
}
