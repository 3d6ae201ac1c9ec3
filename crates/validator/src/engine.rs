//! Field and form validation.

use std::collections::HashSet;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::NaiveDate;
use futures::FutureExt;
use futures::future::join_all;
use rulekit_schema::field::FieldDef;
use rulekit_schema::form::FormDef;
use rulekit_schema::rule::RuleDef;
use rulekit_schema::values::FormValues;
use serde_json::Value;

use crate::condition::applies;
use crate::config::{ValidationMode, ValidatorConfig};
use crate::custom::{CustomPredicate, CustomRegistry};
use crate::error::RegistryError;
use crate::normalize::normalize;
use crate::outcome::{FieldOutcome, FormOutcome, RuleFailure};
use crate::registry::{Failure, RuleHandler, RuleInput, RuleRegistry, RuleVerdict};
use crate::remote::RemoteClient;

/// Source of the date that "today" means for date rules.
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Failure code for a rule handler that panicked.
pub const RULE_HANDLER_ERROR: &str = "rule_handler_error";

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Validates fields against their rule lists.
///
/// Each validator owns its rule and custom registries; nothing is global.
/// Clones share the registries.
///
/// ```rust,ignore
/// let validator = Validator::new();
/// let field = presets::pincode("pincode");
/// let values = FormValues::new().with("pincode", "");
///
/// let outcome = validator.validate_field(&field, values.peer("pincode"), &values, None).await;
/// assert_eq!(outcome.message(), Some("PIN Code is required"));
/// ```
#[derive(Clone)]
pub struct Validator {
    rules: Arc<RuleRegistry>,
    custom: Arc<CustomRegistry>,
    config: ValidatorConfig,
    clock: Clock,
}

impl Validator {
    /// A validator with every built-in rule and predicate and default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// A validator with empty registries. Every rule passes until a handler
    /// is registered for its tag.
    #[must_use]
    pub fn empty() -> Self {
        Self::builder()
            .rules(Arc::new(RuleRegistry::new()))
            .custom(Arc::new(CustomRegistry::new()))
            .build()
    }

    #[must_use]
    pub fn builder() -> ValidatorBuilder {
        ValidatorBuilder::default()
    }

    #[must_use]
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    #[must_use]
    pub fn rules(&self) -> &Arc<RuleRegistry> {
        &self.rules
    }

    #[must_use]
    pub fn custom(&self) -> &Arc<CustomRegistry> {
        &self.custom
    }

    /// Install or replace the handler for a rule tag.
    pub fn register_rule(
        &self,
        tag: impl Into<String>,
        handler: Arc<dyn RuleHandler>,
    ) -> Option<Arc<dyn RuleHandler>> {
        self.rules.register(tag, handler)
    }

    /// See [`CustomRegistry::add`].
    pub fn add_custom(
        &self,
        key: impl Into<String>,
        predicate: Arc<dyn CustomPredicate>,
    ) -> Result<(), RegistryError> {
        self.custom.add(key, predicate)
    }

    /// See [`CustomRegistry::add_fn`].
    pub fn add_custom_fn<F>(&self, key: impl Into<String>, f: F) -> Result<(), RegistryError>
    where
        F: Fn(&Value, &FormValues, &RuleDef) -> bool + Send + Sync + 'static,
    {
        self.custom.add_fn(key, f)
    }

    pub fn remove_custom(&self, key: &str) -> bool {
        self.custom.remove(key)
    }

    #[must_use]
    pub fn get_custom(&self, key: &str) -> Option<Arc<dyn CustomPredicate>> {
        self.custom.get(key)
    }

    #[must_use]
    pub fn list_custom(&self) -> Vec<String> {
        self.custom.list()
    }

    /// Validate one field.
    ///
    /// Rules run in declared order. A rule whose `when` clause does not hold
    /// or whose tag has no handler is skipped. In short-circuit mode the
    /// first failure ends the field; in aggregate mode every rule runs.
    /// `locale` falls back to the configured default.
    #[tracing::instrument(level = "debug", skip_all, fields(field = %field.name))]
    pub async fn validate_field(
        &self,
        field: &FieldDef,
        value: &Value,
        values: &FormValues,
        locale: Option<&str>,
    ) -> FieldOutcome {
        let locale = locale.unwrap_or(&self.config.default_locale);
        let today = (self.clock)();
        let mut failures = Vec::new();

        for rule in &field.validation {
            let tag = rule.tag();
            if !applies(rule.when.as_ref(), values) {
                tracing::debug!(rule = tag, "skipped, condition not met");
                continue;
            }
            let Some(handler) = self.rules.resolve(tag) else {
                tracing::debug!(rule = tag, "skipped, no handler registered");
                continue;
            };

            let normalized = normalize(value, field, rule);
            let input = RuleInput {
                rule,
                value: &normalized,
                raw: value,
                values,
                field,
                today,
            };
            let verdict = AssertUnwindSafe(handler.check(input))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    tracing::warn!(rule = tag, "rule handler panicked");
                    RuleVerdict::fail(RULE_HANDLER_ERROR, "Validation failed")
                });

            if let RuleVerdict::Fail(failure) = verdict {
                failures.push(describe(rule, failure, locale));
                if self.config.mode == ValidationMode::ShortCircuit {
                    break;
                }
            }
        }

        let outcome = FieldOutcome::from_failures(failures);
        tracing::debug!(valid = outcome.valid, failures = outcome.failures.len(), "field validated");
        outcome
    }

    /// Validate several fields concurrently, reading each field's value from
    /// `values` by name.
    ///
    /// Field names should be unique, which [`FormDef::check`] guarantees for
    /// loaded forms. A repeated name is logged at `warn` and reported once,
    /// with the first of its fields that fails.
    pub async fn validate_all(
        &self,
        fields: &[FieldDef],
        values: &FormValues,
        locale: Option<&str>,
    ) -> FormOutcome {
        let mut seen = HashSet::with_capacity(fields.len());
        for field in fields {
            if !seen.insert(field.name.as_str()) {
                tracing::warn!(field = %field.name, "duplicate field name in validate_all");
            }
        }

        let outcomes = join_all(fields.iter().map(|field| async move {
            let outcome = self
                .validate_field(field, values.peer(&field.name), values, locale)
                .await;
            (field.name.clone(), outcome)
        }))
        .await;

        let form = FormOutcome::from_fields(outcomes);
        tracing::debug!(
            fields = fields.len(),
            invalid = form.errors.len(),
            "form validated"
        );
        form
    }

    /// [`validate_all`](Self::validate_all) over a loaded form definition.
    pub async fn validate_form(
        &self,
        form: &FormDef,
        values: &FormValues,
        locale: Option<&str>,
    ) -> FormOutcome {
        self.validate_all(form.fields(), values, locale).await
    }
}

/// Pick the message for a failure: the rule's own, then the handler's, then
/// the handler's fallback text.
fn describe(rule: &RuleDef, failure: Failure, locale: &str) -> RuleFailure {
    let message = [rule.message.as_ref(), failure.message.as_ref()]
        .into_iter()
        .flatten()
        .find_map(|m| m.resolve(locale))
        .map_or_else(|| failure.fallback.clone(), str::to_owned);

    RuleFailure {
        rule: rule.tag().to_owned(),
        code: failure.code.into_owned(),
        message,
        severity: rule.severity,
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("rules", &self.rules)
            .field("custom", &self.custom)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Validator`].
#[derive(Default)]
pub struct ValidatorBuilder {
    config: ValidatorConfig,
    rules: Option<Arc<RuleRegistry>>,
    custom: Option<Arc<CustomRegistry>>,
    remote: Option<RemoteClient>,
    clock: Option<Clock>,
}

impl ValidatorBuilder {
    #[must_use]
    pub fn config(mut self, config: ValidatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Use this rule registry as is instead of seeding the built-ins.
    #[must_use]
    pub fn rules(mut self, rules: Arc<RuleRegistry>) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Share a custom predicate registry, e.g. between validators.
    #[must_use]
    pub fn custom(mut self, custom: Arc<CustomRegistry>) -> Self {
        self.custom = Some(custom);
        self
    }

    /// HTTP client for remote rules. Defaults to one honouring the
    /// configured remote timeout.
    #[must_use]
    pub fn remote(mut self, remote: RemoteClient) -> Self {
        self.remote = Some(remote);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Pin "today" to a fixed date.
    #[must_use]
    pub fn today(self, date: NaiveDate) -> Self {
        self.clock(move || date)
    }

    #[must_use]
    pub fn build(self) -> Validator {
        let config = self.config;
        let remote = self
            .remote
            .unwrap_or_else(|| RemoteClient::new().with_timeout(config.remote_timeout()));
        let custom = self
            .custom
            .unwrap_or_else(|| Arc::new(CustomRegistry::with_builtins(remote.clone())));
        let rules = self.rules.unwrap_or_else(|| {
            Arc::new(RuleRegistry::with_builtins(
                Arc::clone(&custom),
                remote,
                config.predicate_timeout(),
            ))
        });

        Validator {
            rules,
            custom,
            config,
            clock: self.clock.unwrap_or_else(|| Arc::new(local_today)),
        }
    }
}

impl fmt::Debug for ValidatorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
