use rulekit_schema::field::FieldDef;
use rulekit_schema::rule::RuleDef;
use rulekit_schema::values::to_text;
use serde_json::Value;

/// Canonical text form of a raw value, as seen by built-in rule handlers.
///
/// The value is rendered as text and trimmed. Email fields are lower-cased,
/// and rules that ask for it get the value upper-cased after that.
#[must_use]
pub fn normalize(raw: &Value, field: &FieldDef, rule: &RuleDef) -> String {
    let text = to_text(raw);
    let mut value = text.trim().to_owned();
    if field.is_email() {
        value = value.to_lowercase();
    }
    if rule.uppercase {
        value = value.to_uppercase();
    }
    value
}
