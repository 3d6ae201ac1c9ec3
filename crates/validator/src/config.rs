//! Engine configuration.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How many failing rules are reported per field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationMode {
    /// Stop at the first failing rule (default).
    #[default]
    ShortCircuit,
    /// Run every applicable rule and report all failures.
    Aggregate,
}

impl FromStr for ValidationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "shortcircuit" => Ok(Self::ShortCircuit),
            "aggregate" | "all" => Ok(Self::Aggregate),
            other => Err(format!("unknown validation mode `{other}`")),
        }
    }
}

/// Settings for a [`Validator`](crate::Validator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidatorConfig {
    /// Locale used when a call does not name one.
    pub default_locale: String,
    pub mode: ValidationMode,
    /// Per-request timeout for remote rules, in milliseconds. Unbounded
    /// when unset.
    pub remote_timeout_ms: Option<u64>,
    /// Upper bound on a single custom predicate, in milliseconds.
    pub predicate_timeout_ms: Option<u64>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            default_locale: rulekit_schema::message::FALLBACK_LOCALE.to_owned(),
            mode: ValidationMode::ShortCircuit,
            remote_timeout_ms: None,
            predicate_timeout_ms: None,
        }
    }
}

impl ValidatorConfig {
    /// Defaults overridden by `RULEKIT_LOCALE`, `RULEKIT_MODE`,
    /// `RULEKIT_REMOTE_TIMEOUT_MS` and `RULEKIT_PREDICATE_TIMEOUT_MS`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    /// Unparseable values are logged and ignored.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(locale) = lookup("RULEKIT_LOCALE").filter(|l| !l.trim().is_empty()) {
            config.default_locale = locale.trim().to_owned();
        }

        if let Some(mode) = lookup("RULEKIT_MODE") {
            match mode.parse() {
                Ok(mode) => config.mode = mode,
                Err(reason) => tracing::warn!(%reason, "ignoring RULEKIT_MODE"),
            }
        }

        for (name, slot) in [
            ("RULEKIT_REMOTE_TIMEOUT_MS", &mut config.remote_timeout_ms),
            ("RULEKIT_PREDICATE_TIMEOUT_MS", &mut config.predicate_timeout_ms),
        ] {
            if let Some(raw) = lookup(name) {
                match raw.trim().parse::<u64>() {
                    // 0 disables the timeout
                    Ok(0) => *slot = None,
                    Ok(ms) => *slot = Some(ms),
                    Err(err) => tracing::warn!(var = name, error = %err, "ignoring invalid timeout"),
                }
            }
        }

        config
    }

    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = locale.into();
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_remote_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.remote_timeout_ms = timeout.map(duration_ms);
        self
    }

    #[must_use]
    pub fn with_predicate_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.predicate_timeout_ms = timeout.map(duration_ms);
        self
    }

    #[must_use]
    pub fn remote_timeout(&self) -> Option<Duration> {
        self.remote_timeout_ms.map(Duration::from_millis)
    }

    #[must_use]
    pub fn predicate_timeout(&self) -> Option<Duration> {
        self.predicate_timeout_ms.map(Duration::from_millis)
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let config = ValidatorConfig::default();
        assert_eq!(config.default_locale, "en");
        assert_eq!(config.mode, ValidationMode::ShortCircuit);
        assert_eq!(config.remote_timeout(), None);
        assert_eq!(config.predicate_timeout(), None);
    }

    #[test]
    fn reads_variables() {
        let config = ValidatorConfig::from_lookup(lookup(&[
            ("RULEKIT_LOCALE", "hi"),
            ("RULEKIT_MODE", "aggregate"),
            ("RULEKIT_REMOTE_TIMEOUT_MS", "5000"),
            ("RULEKIT_PREDICATE_TIMEOUT_MS", "0"),
        ]));
        assert_eq!(
            config,
            ValidatorConfig {
                default_locale: "hi".into(),
                mode: ValidationMode::Aggregate,
                remote_timeout_ms: Some(5000),
                predicate_timeout_ms: None,
            }
        );
    }

    #[test]
    fn ignores_garbage() {
        let config = ValidatorConfig::from_lookup(lookup(&[
            ("RULEKIT_LOCALE", "  "),
            ("RULEKIT_MODE", "sometimes"),
            ("RULEKIT_PREDICATE_TIMEOUT_MS", "soon"),
        ]));
        assert_eq!(config, ValidatorConfig::default());
    }

    #[rstest]
    #[case("short-circuit", ValidationMode::ShortCircuit)]
    #[case("SHORT_CIRCUIT", ValidationMode::ShortCircuit)]
    #[case("shortCircuit", ValidationMode::ShortCircuit)]
    #[case("aggregate", ValidationMode::Aggregate)]
    #[case("all", ValidationMode::Aggregate)]
    fn mode_parsing(#[case] input: &str, #[case] expected: ValidationMode) {
        assert_eq!(input.parse::<ValidationMode>(), Ok(expected));
    }

    #[test]
    fn serde_uses_camel_case_and_defaults() {
        let config: ValidatorConfig =
            serde_json::from_value(json!({ "mode": "aggregate", "predicateTimeoutMs": 100 }))
                .unwrap();
        assert_eq!(config.mode, ValidationMode::Aggregate);
        assert_eq!(config.default_locale, "en");
        assert_eq!(config.predicate_timeout(), Some(Duration::from_millis(100)));
    }

    #[test]
    fn builder_setters() {
        let config = ValidatorConfig::default()
            .with_locale("fr")
            .with_mode(ValidationMode::Aggregate)
            .with_remote_timeout(Some(Duration::from_secs(2)))
            .with_predicate_timeout(Some(Duration::from_millis(40)));
        assert_eq!(config.default_locale, "fr");
        assert_eq!(config.remote_timeout_ms, Some(2000));
        assert_eq!(config.predicate_timeout_ms, Some(40));
    }
}
