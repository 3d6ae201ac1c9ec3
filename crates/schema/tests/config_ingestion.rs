use pretty_assertions::assert_eq;
use rulekit_schema::condition::ConditionTest;
use rulekit_schema::field::FieldKind;
use rulekit_schema::error::SchemaError;
use rulekit_schema::form::FormDef;
use rulekit_schema::message::Severity;
use rulekit_schema::rule::{RuleDef, RuleKind};
use serde_json::json;

const SIGNUP: &str = include_str!("fixtures/signup.yaml");

fn signup() -> FormDef {
    FormDef::parse(SIGNUP).expect("fixture should load")
}

// ---------------------------------------------------------------------------
// 1. Loading a full document
// ---------------------------------------------------------------------------

#[test]
fn loads_every_field_in_order() {
    let form = signup();
    assert_eq!(
        form.names().collect::<Vec<_>>(),
        vec![
            "fullName",
            "email",
            "country",
            "pincode",
            "password",
            "confirmPassword",
            "dob",
            "referral",
            "pan"
        ]
    );
}

#[test]
fn field_kinds_and_hints() {
    let form = signup();
    assert_eq!(form.get("email").unwrap().kind, FieldKind::Email);
    assert_eq!(form.get("dob").unwrap().kind, FieldKind::Date);
    assert_eq!(form.get("country").unwrap().options, vec!["IN", "US", "UK"]);

    let pincode = form.get("pincode").unwrap();
    assert_eq!(pincode.min_length, Some(6));
    assert_eq!(pincode.max_length, Some(6));
}

#[test]
fn rule_tags_resolve_aliases() {
    let form = signup();
    let tags: Vec<_> = form
        .iter()
        .flat_map(|f| f.validation.iter().map(RuleDef::tag))
        .collect();
    assert_eq!(
        tags,
        vec![
            "required",
            "regex",
            "length",
            "required",
            "regex",
            "select",
            "required",
            "length",
            "required",
            "length",
            "crossField",
            "date",
            "custom",
            "async",
            "pan"
        ]
    );
}

// ---------------------------------------------------------------------------
// 2. Header keys
// ---------------------------------------------------------------------------

#[test]
fn localized_message_and_severity() {
    let form = signup();
    let name = form.get("fullName").unwrap();

    let required = &name.validation[0];
    let message = required.message.as_ref().unwrap();
    assert_eq!(message.resolve("hi"), Some("नाम आवश्यक है"));
    assert_eq!(message.resolve("ta"), Some("Name is required"));

    assert_eq!(name.validation[2].severity, Severity::Warning);
    assert_eq!(name.validation[0].severity, Severity::Error);
}

#[test]
fn condition_is_attached() {
    let form = signup();
    let when = form.get("pincode").unwrap().validation[0]
        .when
        .as_ref()
        .unwrap();
    assert_eq!(when.field, "country");
    assert_eq!(when.test(), Some(ConditionTest::Equals(&json!("IN"))));
}

#[test]
fn custom_and_remote_params() {
    let form = signup();
    let referral = form.get("referral").unwrap();

    let RuleKind::Custom(custom) = &referral.validation[0].kind else {
        panic!("expected custom rule");
    };
    assert_eq!(custom.custom, "isEven");
    assert_eq!(
        referral.validation[0].extra_str("note"),
        Some("referral codes are even numbers")
    );

    let RuleKind::Remote(remote) = &referral.validation[1].kind else {
        panic!("expected remote rule");
    };
    assert_eq!(remote.endpoint.host_str(), Some("referrals.example.com"));
    assert_eq!(remote.headers.get("x-api-key").map(String::as_str), Some("demo"));
}

#[test]
fn unknown_rule_type_is_kept_by_name() {
    let form = signup();
    let pan = &form.get("pan").unwrap().validation[0];
    assert!(matches!(&pan.kind, RuleKind::Other { name, .. } if name == "pan"));
    assert!(pan.uppercase);
}

// ---------------------------------------------------------------------------
// 3. Round trip through JSON
// ---------------------------------------------------------------------------

#[test]
fn json_round_trip_preserves_definition() {
    let form = signup();
    let json = serde_json::to_string(&form).unwrap();
    let back = FormDef::from_json(&json).unwrap();
    assert_eq!(back, form);
}

// ---------------------------------------------------------------------------
// 4. Malformed documents
// ---------------------------------------------------------------------------

#[test]
fn malformed_rule_is_a_parse_error() {
    let yaml = "
fields:
  - name: confirm
    validation:
      - type: crossField
";
    let err = FormDef::from_yaml(yaml).unwrap_err();
    assert!(matches!(err, SchemaError::Parse { format: "YAML", .. }), "{err:?}");
    assert_eq!(err.category(), "parse");
}

#[test]
fn non_list_fields_is_an_invalid_shape() {
    let err = FormDef::from_json(r#"{ "fields": 3 }"#).unwrap_err();
    assert!(matches!(err, SchemaError::InvalidShape { .. }), "{err:?}");
    assert_eq!(err.code(), "SCHEMA_SHAPE");
}
