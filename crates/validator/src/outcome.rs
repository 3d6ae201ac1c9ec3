//! Results of validating a field or a whole form.

use std::collections::BTreeMap;

use rulekit_schema::message::Severity;
use serde::Serialize;

/// One rule that did not pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleFailure {
    /// Dispatch tag of the failing rule.
    pub rule: String,
    /// Machine-readable reason, e.g. `required` or `custom_rule_error`.
    pub code: String,
    /// Localized, user-facing text.
    pub message: String,
    pub severity: Severity,
}

/// Outcome of validating one field.
///
/// In short-circuit mode `failures` holds at most one entry. A failing rule
/// marks the field invalid whatever its severity; use
/// [`is_blocking`](Self::is_blocking) to tell errors from warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOutcome {
    pub valid: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<RuleFailure>,
}

impl FieldOutcome {
    #[must_use]
    pub fn pass() -> Self {
        Self {
            valid: true,
            failures: Vec::new(),
        }
    }

    /// Build from collected failures; valid when there are none.
    #[must_use]
    pub fn from_failures(failures: Vec<RuleFailure>) -> Self {
        Self {
            valid: failures.is_empty(),
            failures,
        }
    }

    /// The first failure in rule order.
    #[must_use]
    pub fn first(&self) -> Option<&RuleFailure> {
        self.failures.first()
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.first().map(|f| f.message.as_str())
    }

    #[must_use]
    pub fn severity(&self) -> Option<Severity> {
        self.first().map(|f| f.severity)
    }

    /// Whether any failure has error severity.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        self.failures.iter().any(|f| f.severity.is_blocking())
    }
}

/// Outcome of validating a set of fields.
///
/// `errors` holds an entry for every invalid field and nothing else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormOutcome {
    pub valid: bool,
    pub errors: BTreeMap<String, FieldOutcome>,
}

impl FormOutcome {
    /// Collect per-field outcomes, keeping only the invalid ones. If a name
    /// repeats, its first invalid outcome is kept.
    pub fn from_fields<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = (String, FieldOutcome)>,
    {
        let mut errors = BTreeMap::new();
        for (name, outcome) in outcomes.into_iter().filter(|(_, o)| !o.valid) {
            errors.entry(name).or_insert(outcome);
        }
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Message of the first failure of `field`, if it is invalid.
    #[must_use]
    pub fn error_for(&self, field: &str) -> Option<&str> {
        self.errors.get(field)?.message()
    }

    /// Field name to message, one entry per invalid field.
    #[must_use]
    pub fn messages(&self) -> BTreeMap<&str, &str> {
        self.errors
            .iter()
            .filter_map(|(name, o)| Some((name.as_str(), o.message()?)))
            .collect()
    }

    /// Invalid fields with at least one error-severity failure.
    pub fn blocking_errors(&self) -> impl Iterator<Item = (&str, &FieldOutcome)> {
        self.errors
            .iter()
            .filter(|(_, o)| o.is_blocking())
            .map(|(name, o)| (name.as_str(), o))
    }

    /// Invalid fields that only carry warnings.
    pub fn warnings(&self) -> impl Iterator<Item = (&str, &FieldOutcome)> {
        self.errors
            .iter()
            .filter(|(_, o)| !o.is_blocking())
            .map(|(name, o)| (name.as_str(), o))
    }

    /// Whether submission should be blocked.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        self.errors.values().any(FieldOutcome::is_blocking)
    }
}
