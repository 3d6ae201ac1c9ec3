//! Rule handler registry.
//!
//! Maps a rule tag (`required`, `regex`, `pan`, ...) to the handler that
//! evaluates it. Each [`Validator`](crate::Validator) owns its own registry,
//! so two validators never see each other's registrations.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use rulekit_schema::field::FieldDef;
use rulekit_schema::message::Message;
use rulekit_schema::rule::{RuleDef, tag};
use rulekit_schema::values::FormValues;
use serde_json::Value;

use crate::builtin;
use crate::custom::{CustomRegistry, CustomRuleHandler};
use crate::remote::{RemoteClient, RemoteRuleHandler};

/// Everything a handler may look at when checking one rule.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    pub rule: &'a RuleDef,
    /// Normalized value (see [`normalize`](crate::normalize::normalize)).
    pub value: &'a str,
    /// The value exactly as submitted.
    pub raw: &'a Value,
    /// All raw values of the form.
    pub values: &'a FormValues,
    pub field: &'a FieldDef,
    /// The date "today" refers to.
    pub today: NaiveDate,
}

/// Why a rule did not pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub code: Cow<'static, str>,
    /// Handler-specific message, e.g. a length rule's `minMessage`.
    pub message: Option<Message>,
    /// Used when neither the rule nor the handler supplies a message.
    pub fallback: String,
}

impl Failure {
    pub fn new(code: impl Into<Cow<'static, str>>, fallback: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: None,
            fallback: fallback.into(),
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: Option<&Message>) -> Self {
        self.message = message.cloned();
        self
    }
}

/// Result of a single handler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleVerdict {
    Pass,
    Fail(Failure),
}

impl RuleVerdict {
    pub fn fail(code: impl Into<Cow<'static, str>>, fallback: impl Into<String>) -> Self {
        Self::Fail(Failure::new(code, fallback))
    }

    #[must_use]
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

impl From<Failure> for RuleVerdict {
    fn from(failure: Failure) -> Self {
        Self::Fail(failure)
    }
}

/// Evaluates one kind of rule.
///
/// A panicking handler fails its rule with `rule_handler_error`; it does
/// not take down the field or the form.
#[async_trait]
pub trait RuleHandler: Send + Sync {
    async fn check(&self, input: RuleInput<'_>) -> RuleVerdict;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F> RuleHandler for FnHandler<F>
where
    F: for<'a> Fn(&RuleInput<'a>) -> RuleVerdict + Send + Sync,
{
    async fn check(&self, input: RuleInput<'_>) -> RuleVerdict {
        (self.0)(&input)
    }
}

/// Wrap a synchronous closure as a handler.
///
/// ```rust,ignore
/// registry.register("even", handler_fn(|input| {
///     if input.value.parse::<i64>().is_ok_and(|n| n % 2 == 0) {
///         RuleVerdict::Pass
///     } else {
///         RuleVerdict::fail("even", "Must be even")
///     }
/// }));
/// ```
pub fn handler_fn<F>(f: F) -> Arc<dyn RuleHandler>
where
    F: for<'a> Fn(&RuleInput<'a>) -> RuleVerdict + Send + Sync + 'static,
{
    Arc::new(FnHandler(f))
}

/// Thread-safe map from rule tag to handler.
pub struct RuleRegistry {
    handlers: DashMap<String, Arc<dyn RuleHandler>>,
}

impl RuleRegistry {
    /// An empty registry. Every rule is a no-op until something is registered.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }

    /// A registry seeded with every built-in handler.
    ///
    /// `custom` rules resolve their predicates in `custom`, `async` rules go
    /// through `remote`. `predicate_timeout` bounds each custom predicate.
    #[must_use]
    pub fn with_builtins(
        custom: Arc<CustomRegistry>,
        remote: RemoteClient,
        predicate_timeout: Option<Duration>,
    ) -> Self {
        let registry = Self::new();
        registry.register(tag::REQUIRED, Arc::new(builtin::Required));
        registry.register(tag::REGEX, Arc::new(builtin::Pattern::default()));
        registry.register(tag::LENGTH, Arc::new(builtin::Length));
        registry.register(tag::NUMBER_RANGE, Arc::new(builtin::NumberRange));
        registry.register(tag::DATE, Arc::new(builtin::DateCheck));
        registry.register(tag::SELECT, Arc::new(builtin::Select));
        registry.register(tag::CROSS_FIELD, Arc::new(builtin::CrossField));
        registry.register(builtin::PAN, Arc::new(builtin::Identifier::Pan));
        registry.register(builtin::IFSC, Arc::new(builtin::Identifier::Ifsc));
        registry.register(builtin::AADHAAR, Arc::new(builtin::Identifier::Aadhaar));
        registry.register(
            tag::CUSTOM,
            Arc::new(CustomRuleHandler::new(custom).with_timeout(predicate_timeout)),
        );
        registry.register(tag::ASYNC, Arc::new(RemoteRuleHandler::new(remote)));
        registry
    }

    /// Install a handler, replacing and returning any previous one.
    pub fn register(
        &self,
        tag: impl Into<String>,
        handler: Arc<dyn RuleHandler>,
    ) -> Option<Arc<dyn RuleHandler>> {
        let tag = tag.into();
        tracing::debug!(rule = %tag, "registered rule handler");
        self.handlers.insert(tag, handler)
    }

    #[must_use]
    pub fn resolve(&self, tag: &str) -> Option<Arc<dyn RuleHandler>> {
        self.handlers.get(tag).map(|entry| Arc::clone(entry.value()))
    }

    pub fn remove(&self, tag: &str) -> Option<Arc<dyn RuleHandler>> {
        self.handlers.remove(tag).map(|(_, handler)| handler)
    }

    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.handlers.contains_key(tag)
    }

    /// Registered tags, sorted.
    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<_> = self.handlers.iter().map(|e| e.key().clone()).collect();
        tags.sort_unstable();
        tags
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}
