use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Locale used when a requested translation is missing.
pub const FALLBACK_LOCALE: &str = "en";

/// How seriously a failing rule should be treated by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks submission (default).
    #[default]
    Error,
    /// Advisory only.
    Warning,
}

impl Severity {
    /// Whether this severity blocks submission.
    #[must_use]
    pub fn is_blocking(self) -> bool {
        self == Self::Error
    }
}

/// A user-facing message: either one string or a per-locale table.
///
/// ```rust,ignore
/// let msg: Message = serde_json::from_str(r#"{"en": "Required", "hi": "आवश्यक"}"#)?;
/// assert_eq!(msg.resolve("hi"), Some("आवश्यक"));
/// assert_eq!(msg.resolve("fr"), Some("Required"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    /// Same text for every locale.
    Text(String),
    /// Locale code to text.
    Localized(BTreeMap<String, String>),
}

impl Message {
    /// Build a single-locale table.
    #[must_use]
    pub fn localized(locale: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Localized(BTreeMap::from([(locale.into(), text.into())]))
    }

    /// Add a translation. A plain text message becomes a table keyed by
    /// [`FALLBACK_LOCALE`] first.
    #[must_use]
    pub fn with_translation(self, locale: impl Into<String>, text: impl Into<String>) -> Self {
        let mut table = match self {
            Self::Text(text) => BTreeMap::from([(FALLBACK_LOCALE.to_owned(), text)]),
            Self::Localized(table) => table,
        };
        table.insert(locale.into(), text.into());
        Self::Localized(table)
    }

    /// Pick the text for `locale`, falling back to English.
    ///
    /// Returns `None` only for a table that has neither entry.
    #[must_use]
    pub fn resolve(&self, locale: &str) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Localized(table) => table
                .get(locale)
                .or_else(|| table.get(FALLBACK_LOCALE))
                .map(String::as_str),
        }
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}
