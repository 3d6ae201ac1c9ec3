//! Built-in rule handlers.

use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use dashmap::DashMap;
use regex::{Regex, RegexBuilder};
use rulekit_schema::rule::{RuleDef, RuleKind};
use rulekit_schema::values::to_text;
use serde_json::Value;

use crate::registry::{Failure, RuleHandler, RuleInput, RuleVerdict};

pub const PAN: &str = "pan";
pub const IFSC: &str = "ifsc";
pub const AADHAAR: &str = "aadhaar";

/// Non-empty after normalization.
pub struct Required;

#[async_trait]
impl RuleHandler for Required {
    async fn check(&self, input: RuleInput<'_>) -> RuleVerdict {
        if input.value.is_empty() {
            RuleVerdict::fail("required", "This field is required")
        } else {
            RuleVerdict::Pass
        }
    }
}

/// Build a regex from a pattern and single-letter flags.
///
/// `i`, `m` and `s` are honoured, `g`, `u` and `y` are accepted and ignored,
/// anything else is an error. `\d` and `\w` (and their negations) match
/// ASCII only, so `^\d{6}$` does not accept Devanagari or Arabic-Indic
/// digits. `\s` and `\b` keep their Unicode meaning.
pub fn compile_pattern(pattern: &str, flags: &str) -> Result<Regex, String> {
    let mut builder = RegexBuilder::new(&ascii_classes(pattern));
    for flag in flags.chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            'g' | 'u' | 'y' => {}
            other => return Err(format!("unsupported flag `{other}`")),
        }
    }
    builder.build().map_err(|e| e.to_string())
}

/// Rewrite `\d`, `\D`, `\w` and `\W` into their ASCII POSIX classes.
fn ascii_classes(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    let mut depth = 0usize;

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let Some(next) = chars.next() else {
                    out.push(c);
                    break;
                };
                let class = match next {
                    'd' => Some("[:digit:]"),
                    'D' => Some("[:^digit:]"),
                    'w' => Some("[:word:]"),
                    'W' => Some("[:^word:]"),
                    _ => None,
                };
                match class {
                    Some(class) if depth > 0 => out.push_str(class),
                    Some(class) => {
                        out.push('[');
                        out.push_str(class);
                        out.push(']');
                    }
                    None => {
                        out.push(c);
                        out.push(next);
                    }
                }
            }
            '[' => {
                depth += 1;
                out.push(c);
                if chars.peek() == Some(&'^') {
                    out.push('^');
                    chars.next();
                }
                // A leading `]` is a literal member of the class.
                if chars.peek() == Some(&']') {
                    out.push(']');
                    chars.next();
                }
            }
            ']' if depth > 0 => {
                depth -= 1;
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Regular expression match, with compiled patterns cached per handler.
///
/// Flags and class semantics are those of [`compile_pattern`]. A missing
/// pattern, or one that does not compile, fails the rule.
#[derive(Default)]
pub struct Pattern {
    cache: DashMap<(String, String), Regex>,
}

impl Pattern {
    fn compile(&self, pattern: &str, flags: &str) -> Result<Regex, String> {
        let key = (pattern.to_owned(), flags.to_owned());
        if let Some(re) = self.cache.get(&key) {
            return Ok(re.clone());
        }
        let re = compile_pattern(pattern, flags)?;
        self.cache.insert(key, re.clone());
        Ok(re)
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

fn other_param<'a>(rule: &'a RuleDef, key: &str) -> Option<&'a str> {
    match &rule.kind {
        RuleKind::Other { params, .. } => params.get(key).and_then(Value::as_str),
        _ => None,
    }
}

#[async_trait]
impl RuleHandler for Pattern {
    async fn check(&self, input: RuleInput<'_>) -> RuleVerdict {
        let rule = input.rule;
        let (pattern, flags) = match &rule.kind {
            RuleKind::Pattern(p) => (p.pattern.as_deref(), p.flags.as_deref()),
            _ => (other_param(rule, "pattern"), other_param(rule, "flags")),
        };
        let pattern = non_empty(pattern).or_else(|| non_empty(rule.extra_str("pattern")));
        let flags = non_empty(flags)
            .or_else(|| rule.extra_str("flags"))
            .unwrap_or_default();

        let Some(pattern) = pattern else {
            tracing::warn!(field = %input.field.name, "regex rule has no pattern");
            return RuleVerdict::fail("invalid_pattern", "Invalid regex pattern");
        };

        match self.compile(pattern, flags) {
            Ok(re) if re.is_match(input.value) => RuleVerdict::Pass,
            Ok(_) => RuleVerdict::fail("pattern", "Invalid format"),
            Err(reason) => {
                tracing::warn!(field = %input.field.name, %pattern, %reason, "invalid regex pattern");
                RuleVerdict::fail("invalid_pattern", "Invalid regex pattern")
            }
        }
    }
}

/// Character count: `eq`, then `min`, then `max`.
pub struct Length;

#[async_trait]
impl RuleHandler for Length {
    async fn check(&self, input: RuleInput<'_>) -> RuleVerdict {
        let RuleKind::Length(rule) = &input.rule.kind else {
            return RuleVerdict::Pass;
        };
        let len = input.value.chars().count();

        if let Some(eq) = rule.eq.filter(|&eq| len != eq) {
            return Failure::new("length_eq", format!("Length must be {eq}"))
                .with_message(rule.eq_message.as_ref())
                .into();
        }
        if let Some(min) = rule.min.filter(|&min| len < min) {
            return Failure::new("length_min", format!("Length must be ≥ {min}"))
                .with_message(rule.min_message.as_ref())
                .into();
        }
        if let Some(max) = rule.max.filter(|&max| len > max) {
            return Failure::new("length_max", format!("Length must be ≤ {max}"))
                .with_message(rule.max_message.as_ref())
                .into();
        }
        RuleVerdict::Pass
    }
}

/// Finite number within inclusive bounds. Empty text is not a number.
pub struct NumberRange;

#[async_trait]
impl RuleHandler for NumberRange {
    async fn check(&self, input: RuleInput<'_>) -> RuleVerdict {
        let Some(num) = input.value.parse::<f64>().ok().filter(|n| n.is_finite()) else {
            return RuleVerdict::fail("not_a_number", "Must be a number");
        };
        let RuleKind::NumberRange(rule) = &input.rule.kind else {
            return RuleVerdict::Pass;
        };

        if let Some(min) = rule.min.filter(|&min| num < min) {
            return Failure::new("number_min", format!("Must be ≥ {min}"))
                .with_message(rule.min_message.as_ref())
                .into();
        }
        if let Some(max) = rule.max.filter(|&max| num > max) {
            return Failure::new("number_max", format!("Must be ≤ {max}"))
                .with_message(rule.max_message.as_ref())
                .into();
        }
        RuleVerdict::Pass
    }
}

/// Parse `YYYY-MM-DD` or an RFC 3339 timestamp (its calendar date).
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

/// Calendar checks against the evaluation date. Empty values pass.
pub struct DateCheck;

#[async_trait]
impl RuleHandler for DateCheck {
    async fn check(&self, input: RuleInput<'_>) -> RuleVerdict {
        if input.value.is_empty() {
            return RuleVerdict::Pass;
        }
        let Some(date) = parse_date(input.value) else {
            return RuleVerdict::fail("invalid_date", "Invalid date");
        };
        let RuleKind::Date(rule) = &input.rule.kind else {
            return RuleVerdict::Pass;
        };
        let today = input.today;

        if rule.must_be_past && date >= today {
            return RuleVerdict::fail("date_not_past", "Date must be before today");
        }
        if rule.must_be_future && date <= today {
            return RuleVerdict::fail("date_not_future", "Date must be after today");
        }
        if let Some(before) = rule.before.filter(|&before| date >= before) {
            return RuleVerdict::fail("date_before", format!("Date must be before {before}"));
        }
        if let Some(after) = rule.after.filter(|&after| date <= after) {
            return RuleVerdict::fail("date_after", format!("Date must be after {after}"));
        }
        if let Some(years) = rule.age_min {
            let age = today.years_since(date).unwrap_or(0);
            if age < years {
                return RuleVerdict::fail("age_min", format!("Must be at least {years} years old"));
            }
        }
        RuleVerdict::Pass
    }
}

/// Membership in the rule's options, or the field's when the rule has none.
/// Empty values pass.
pub struct Select;

#[async_trait]
impl RuleHandler for Select {
    async fn check(&self, input: RuleInput<'_>) -> RuleVerdict {
        if input.value.is_empty() {
            return RuleVerdict::Pass;
        }
        let options = match &input.rule.kind {
            RuleKind::Select(rule) if !rule.options.is_empty() => &rule.options,
            _ => &input.field.options,
        };
        if options.iter().any(|o| o == input.value) {
            RuleVerdict::Pass
        } else {
            RuleVerdict::fail("invalid_option", "Invalid selection")
        }
    }
}

/// Equality of the normalized value with the peer field's raw text. The peer
/// is not trimmed or case-folded, so `" secret "` does not confirm `"secret"`.
/// A missing or null peer never matches.
pub struct CrossField;

#[async_trait]
impl RuleHandler for CrossField {
    async fn check(&self, input: RuleInput<'_>) -> RuleVerdict {
        let RuleKind::CrossField(rule) = &input.rule.kind else {
            return RuleVerdict::Pass;
        };
        let matches = input
            .values
            .get(&rule.field)
            .filter(|peer| !peer.is_null())
            .is_some_and(|peer| to_text(peer) == input.value);
        if matches {
            RuleVerdict::Pass
        } else {
            RuleVerdict::fail("cross_field", format!("Must match {}", rule.field))
        }
    }
}

static PAN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{5}[0-9]{4}[A-Z]$").expect("PAN pattern compiles"));

static IFSC_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{4}0[A-Z0-9]{6}$").expect("IFSC pattern compiles"));

static AADHAAR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{12}$").expect("Aadhaar pattern compiles"));

/// Indian identity and banking identifiers, checked upper-cased.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identifier {
    /// Five letters, four digits, one letter.
    Pan,
    /// Four letters, a zero, six letters or digits.
    Ifsc,
    /// Twelve digits.
    Aadhaar,
}

impl Identifier {
    fn regex(self) -> &'static Regex {
        match self {
            Self::Pan => &PAN_REGEX,
            Self::Ifsc => &IFSC_REGEX,
            Self::Aadhaar => &AADHAAR_REGEX,
        }
    }

    #[must_use]
    pub fn is_valid(self, value: &str) -> bool {
        self.regex().is_match(&value.to_ascii_uppercase())
    }

    fn failure(self) -> RuleVerdict {
        match self {
            Self::Pan => RuleVerdict::fail("invalid_pan", "Invalid PAN"),
            Self::Ifsc => RuleVerdict::fail("invalid_ifsc", "Invalid IFSC code"),
            Self::Aadhaar => RuleVerdict::fail("invalid_aadhaar", "Invalid Aadhaar number"),
        }
    }
}

#[async_trait]
impl RuleHandler for Identifier {
    async fn check(&self, input: RuleInput<'_>) -> RuleVerdict {
        if self.is_valid(input.value) {
            RuleVerdict::Pass
        } else {
            self.failure()
        }
    }
}
