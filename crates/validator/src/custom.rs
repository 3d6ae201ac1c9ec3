//! Custom rule predicates.
//!
//! A `custom` rule names a predicate by key:
//!
//! ```yaml
//! - type: custom
//!   custom: afterDate
//!   extra: { after: "2024-01-01" }
//! ```
//!
//! Predicates see the raw, unnormalized value. Whatever happens inside one
//! (an error, a panic, running past the configured timeout) ends up as a
//! failed outcome for the field, never as a fault in the caller.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::BoxFuture;
use rulekit_schema::rule::{RuleDef, RuleKind};
use rulekit_schema::values::{FormValues, to_text};
use serde_json::Value;

use crate::builtin::{compile_pattern, parse_date};
use crate::error::{PredicateError, RegistryError};
use crate::registry::{Failure, RuleHandler, RuleInput, RuleVerdict};
use crate::remote::RemoteClient;

/// Failure code for predicates that erred, panicked or timed out.
pub const CUSTOM_RULE_ERROR: &str = "custom_rule_error";

/// A named check usable from `custom` rules.
#[async_trait]
pub trait CustomPredicate: Send + Sync {
    /// `Ok(false)` fails the rule with the rule's message; `Err` fails it as
    /// a contained fault.
    async fn test(
        &self,
        value: &Value,
        values: &FormValues,
        rule: &RuleDef,
    ) -> Result<bool, PredicateError>;
}

struct SyncFn<F>(F);

#[async_trait]
impl<F> CustomPredicate for SyncFn<F>
where
    F: Fn(&Value, &FormValues, &RuleDef) -> bool + Send + Sync,
{
    async fn test(
        &self,
        value: &Value,
        values: &FormValues,
        rule: &RuleDef,
    ) -> Result<bool, PredicateError> {
        Ok((self.0)(value, values, rule))
    }
}

struct TryFn<F>(F);

#[async_trait]
impl<F> CustomPredicate for TryFn<F>
where
    F: Fn(&Value, &FormValues, &RuleDef) -> Result<bool, PredicateError> + Send + Sync,
{
    async fn test(
        &self,
        value: &Value,
        values: &FormValues,
        rule: &RuleDef,
    ) -> Result<bool, PredicateError> {
        (self.0)(value, values, rule)
    }
}

struct AsyncFn<F>(F);

#[async_trait]
impl<F, Fut> CustomPredicate for AsyncFn<F>
where
    F: Fn(Value, FormValues, RuleDef) -> Fut + Send + Sync,
    Fut: Future<Output = Result<bool, PredicateError>> + Send,
{
    async fn test(
        &self,
        value: &Value,
        values: &FormValues,
        rule: &RuleDef,
    ) -> Result<bool, PredicateError> {
        (self.0)(value.clone(), values.clone(), rule.clone()).await
    }
}

/// Thread-safe map from predicate key to predicate.
///
/// Unlike [`RuleRegistry`](crate::RuleRegistry), adding never replaces: a
/// key must be removed before it can be registered again.
pub struct CustomRegistry {
    predicates: DashMap<String, Arc<dyn CustomPredicate>>,
}

impl CustomRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            predicates: DashMap::new(),
        }
    }

    /// A registry holding `isEven`, `mustContainXYZ`, `afterDate`,
    /// `matchesRegex` and `remoteAvailable`.
    #[must_use]
    pub fn with_builtins(remote: RemoteClient) -> Self {
        let registry = Self::new();
        let builtins: [(&str, Arc<dyn CustomPredicate>); 5] = [
            ("isEven", Arc::new(SyncFn(is_even))),
            ("mustContainXYZ", Arc::new(SyncFn(must_contain_xyz))),
            ("afterDate", Arc::new(SyncFn(after_date))),
            ("matchesRegex", Arc::new(TryFn(matches_regex))),
            ("remoteAvailable", Arc::new(RemoteAvailable(remote))),
        ];
        for (key, predicate) in builtins {
            registry.predicates.insert(key.to_owned(), predicate);
        }
        registry
    }

    /// Register a predicate under a new key.
    ///
    /// # Errors
    ///
    /// [`RegistryError::EmptyKey`] for an empty key and
    /// [`RegistryError::DuplicateKey`] if the key is taken.
    pub fn add(
        &self,
        key: impl Into<String>,
        predicate: Arc<dyn CustomPredicate>,
    ) -> Result<(), RegistryError> {
        let key = key.into();
        if key.is_empty() {
            return Err(RegistryError::EmptyKey);
        }
        match self.predicates.entry(key) {
            Entry::Occupied(entry) => Err(RegistryError::DuplicateKey {
                key: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                tracing::info!(key = %entry.key(), "registered custom rule");
                entry.insert(predicate);
                Ok(())
            }
        }
    }

    /// Register a synchronous closure.
    pub fn add_fn<F>(&self, key: impl Into<String>, f: F) -> Result<(), RegistryError>
    where
        F: Fn(&Value, &FormValues, &RuleDef) -> bool + Send + Sync + 'static,
    {
        self.add(key, Arc::new(SyncFn(f)))
    }

    /// Register a closure returning a future. Arguments are passed owned.
    pub fn add_async_fn<F, Fut>(&self, key: impl Into<String>, f: F) -> Result<(), RegistryError>
    where
        F: Fn(Value, FormValues, RuleDef) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool, PredicateError>> + Send + 'static,
    {
        self.add(key, Arc::new(AsyncFn(f)))
    }

    /// Remove a predicate. Unknown keys are ignored.
    ///
    /// Returns whether something was removed.
    pub fn remove(&self, key: &str) -> bool {
        let removed = self.predicates.remove(key).is_some();
        if removed {
            tracing::info!(%key, "removed custom rule");
        }
        removed
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Arc<dyn CustomPredicate>> {
        self.predicates.get(key).map(|e| Arc::clone(e.value()))
    }

    /// Registered keys, sorted.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.predicates.iter().map(|e| e.key().clone()).collect();
        keys.sort_unstable();
        keys
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.predicates.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl Default for CustomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CustomRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomRegistry")
            .field("keys", &self.list())
            .finish()
    }
}

// ── Built-in predicates ─────────────────────────────────────────────────────

fn is_even(value: &Value, _: &FormValues, _: &RuleDef) -> bool {
    to_text(value)
        .trim()
        .parse::<f64>()
        .is_ok_and(|n| n.is_finite() && n % 2.0 == 0.0)
}

fn must_contain_xyz(value: &Value, _: &FormValues, _: &RuleDef) -> bool {
    to_text(value).to_uppercase().contains("XYZ")
}

fn after_date(value: &Value, _: &FormValues, rule: &RuleDef) -> bool {
    let Some(after) = rule.extra_str("after").and_then(parse_date) else {
        return false;
    };
    parse_date(to_text(value).trim()).is_some_and(|date| date > after)
}

/// No pattern is a plain mismatch. An unknown flag or a pattern that does not
/// compile is an error.
fn matches_regex(value: &Value, _: &FormValues, rule: &RuleDef) -> Result<bool, PredicateError> {
    let Some(pattern) = rule.extra_str("pattern").filter(|p| !p.is_empty()) else {
        return Ok(false);
    };
    let flags = rule.extra_str("flags").unwrap_or_default();
    let re = compile_pattern(pattern, flags).map_err(PredicateError::failed)?;
    Ok(re.is_match(&to_text(value)))
}

/// Asks `extra.endpoint` whether a value (a username, say) is still free.
struct RemoteAvailable(RemoteClient);

#[async_trait]
impl CustomPredicate for RemoteAvailable {
    async fn test(
        &self,
        value: &Value,
        _: &FormValues,
        rule: &RuleDef,
    ) -> Result<bool, PredicateError> {
        let endpoint = rule
            .extra_str("endpoint")
            .ok_or_else(|| PredicateError::failed("remoteAvailable needs `extra.endpoint`"))?;
        let url = url::Url::parse(endpoint).map_err(|e| PredicateError::failed(e.to_string()))?;
        self.0.check_available(&url, value).await
    }
}

// ── Rule handler ────────────────────────────────────────────────────────────

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

/// Dispatches `custom` rules to the predicate registry.
pub struct CustomRuleHandler {
    registry: Arc<CustomRegistry>,
    timeout: Option<Duration>,
}

impl CustomRuleHandler {
    #[must_use]
    pub fn new(registry: Arc<CustomRegistry>) -> Self {
        Self {
            registry,
            timeout: None,
        }
    }

    /// Fail predicates that take longer than `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run a predicate with panics and the timeout turned into errors.
    async fn invoke(
        &self,
        predicate: &dyn CustomPredicate,
        input: &RuleInput<'_>,
    ) -> Result<bool, PredicateError> {
        let call: BoxFuture<'_, Result<bool, PredicateError>> =
            AssertUnwindSafe(predicate.test(input.raw, input.values, input.rule))
                .catch_unwind()
                .map(|result| {
                    result.unwrap_or_else(|payload| {
                        Err(PredicateError::Panicked {
                            reason: panic_reason(payload.as_ref()),
                        })
                    })
                })
                .boxed();

        match self.timeout {
            Some(after) => tokio::time::timeout(after, call)
                .await
                .unwrap_or(Err(PredicateError::Timeout { after })),
            None => call.await,
        }
    }
}

#[async_trait]
impl RuleHandler for CustomRuleHandler {
    async fn check(&self, input: RuleInput<'_>) -> RuleVerdict {
        let key = match &input.rule.kind {
            RuleKind::Custom(rule) => rule.custom.as_str(),
            _ => input.rule.extra_str("custom").unwrap_or_default(),
        };
        let Some(predicate) = self.registry.get(key) else {
            tracing::warn!(field = %input.field.name, %key, "unknown custom rule");
            return RuleVerdict::fail("unknown_custom_rule", format!("Unknown custom rule: {key}"));
        };

        match self.invoke(predicate.as_ref(), &input).await {
            Ok(true) => RuleVerdict::Pass,
            Ok(false) => RuleVerdict::fail("custom", "Invalid value"),
            Err(err) => {
                tracing::warn!(
                    field = %input.field.name,
                    %key,
                    error = %err,
                    code = err.code(),
                    "custom rule failed"
                );
                Failure::new(CUSTOM_RULE_ERROR, "Custom rule failed").into()
            }
        }
    }
}
