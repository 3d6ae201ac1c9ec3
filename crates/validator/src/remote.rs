//! Remote (`async`) rules: validation delegated to an HTTP endpoint.
//!
//! The endpoint receives a JSON POST
//!
//! ```json
//! { "value": "ABCDE1234F", "fieldName": "pan", "peerValues": { "...": "..." } }
//! ```
//!
//! and answers `{ "valid": bool, "message"?: string }`. Transport errors,
//! non-2xx statuses, timeouts and bodies of any other shape fail the rule
//! with code `remote_error`.

use std::time::Duration;

use async_trait::async_trait;
use rulekit_schema::message::Message;
use rulekit_schema::rule::{RemoteRule, RuleKind};
use rulekit_schema::values::FormValues;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::PredicateError;
use crate::registry::{Failure, RuleHandler, RuleInput, RuleVerdict};

/// Failure code for remote calls that did not produce a verdict.
pub const REMOTE_ERROR: &str = "remote_error";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RemoteRequest<'a> {
    value: &'a str,
    field_name: &'a str,
    peer_values: &'a FormValues,
}

/// What a remote endpoint answers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteVerdict {
    pub valid: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
struct AvailabilityRequest<'a> {
    value: &'a Value,
}

#[derive(Debug, Deserialize)]
struct AvailabilityResponse {
    available: bool,
}

/// HTTP client shared by remote rules and the `remoteAvailable` predicate.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone, Default)]
pub struct RemoteClient {
    http: reqwest::Client,
    timeout: Option<Duration>,
}

impl RemoteClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured `reqwest` client (proxies, TLS roots, ...).
    #[must_use]
    pub fn with_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn post(&self, url: &Url) -> reqwest::RequestBuilder {
        let request = self.http.post(url.clone());
        match self.timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }

    /// Ask the rule's endpoint for a verdict on `value`.
    ///
    /// # Errors
    ///
    /// Any transport, status or decoding problem.
    pub async fn validate(
        &self,
        rule: &RemoteRule,
        value: &str,
        field_name: &str,
        peer_values: &FormValues,
    ) -> Result<RemoteVerdict, PredicateError> {
        let mut request = self.post(&rule.endpoint).json(&RemoteRequest {
            value,
            field_name,
            peer_values,
        });
        for (name, header) in &rule.headers {
            request = request.header(name, header);
        }
        let verdict = request
            .send()
            .await?
            .error_for_status()?
            .json::<RemoteVerdict>()
            .await?;
        Ok(verdict)
    }

    /// Ask an availability endpoint whether `value` is still free.
    ///
    /// # Errors
    ///
    /// Any transport, status or decoding problem.
    pub async fn check_available(&self, url: &Url, value: &Value) -> Result<bool, PredicateError> {
        let response = self
            .post(url)
            .json(&AvailabilityRequest { value })
            .send()
            .await?
            .error_for_status()?
            .json::<AvailabilityResponse>()
            .await?;
        Ok(response.available)
    }
}

/// Dispatches `async` rules to their endpoint.
pub struct RemoteRuleHandler {
    client: RemoteClient,
}

impl RemoteRuleHandler {
    #[must_use]
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RuleHandler for RemoteRuleHandler {
    async fn check(&self, input: RuleInput<'_>) -> RuleVerdict {
        let RuleKind::Remote(rule) = &input.rule.kind else {
            return RuleVerdict::Pass;
        };
        let field = input.field.name.as_str();

        match self
            .client
            .validate(rule, input.value, field, input.values)
            .await
        {
            Ok(RemoteVerdict { valid: true, .. }) => RuleVerdict::Pass,
            Ok(RemoteVerdict { message, .. }) => Failure::new("remote", "Invalid value")
                .with_message(message.map(Message::Text).as_ref())
                .into(),
            Err(err) => {
                tracing::warn!(
                    %field,
                    endpoint = %rule.endpoint,
                    error = %err,
                    code = err.code(),
                    "remote rule failed"
                );
                Failure::new(REMOTE_ERROR, "Remote validation failed").into()
            }
        }
    }
}
