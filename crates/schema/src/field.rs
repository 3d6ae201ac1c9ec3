use serde::{Deserialize, Serialize};

use crate::rule::RuleDef;

/// The input kind of a field. Only `email` changes how values are checked
/// (they are lower-cased before every rule); the rest are descriptive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    Email,
    Number,
    Date,
    Select,
    Password,
    Tel,
    Textarea,
    Checkbox,
    /// Any kind not listed above.
    #[serde(other)]
    Other,
}

/// A form field together with its ordered rule list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    /// Unique within a form.
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, rename = "type")]
    pub kind: FieldKind,

    /// Evaluated in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation: Vec<RuleDef>,

    /// Choices for select-like fields. `select` rules without options use these.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,

    /// Rendering hint only; never enforced.
    #[serde(default, alias = "min", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    /// Rendering hint only; never enforced.
    #[serde(default, alias = "max", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

impl FieldDef {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: None,
            kind,
            validation: Vec::new(),
            options: Vec::new(),
            min_length: None,
            max_length: None,
        }
    }

    #[must_use]
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    #[must_use]
    pub fn email(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Email)
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Append a rule.
    #[must_use]
    pub fn rule(mut self, rule: RuleDef) -> Self {
        self.validation.push(rule);
        self
    }

    #[must_use]
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_length_hint(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    #[must_use]
    pub fn is_email(&self) -> bool {
        self.kind == FieldKind::Email
    }

    /// Label for display, falling back to the field name.
    #[must_use]
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}
