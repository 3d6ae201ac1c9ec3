//! Field-level behaviour of the validator: ordering, messages, locales,
//! conditions, severities and the built-in rule set.

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rstest::rstest;
use rulekit_schema::presets;
use rulekit_validator::prelude::*;
use serde_json::{Value, json};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

fn validator() -> Validator {
    // RUST_LOG=rulekit_validator=debug shows skipped rules and outcomes
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    Validator::builder().today(today()).build()
}

async fn check(validator: &Validator, field: &FieldDef, value: Value) -> FieldOutcome {
    let values = FormValues::new().with(field.name.clone(), value.clone());
    validator.validate_field(field, &value, &values, None).await
}

// ============================================================================
// PIN CODE
// ============================================================================

#[tokio::test]
async fn pincode_accepts_six_digits() {
    let outcome = check(&validator(), &presets::pincode("pincode"), json!("411001")).await;
    assert!(outcome.valid);
    assert_eq!(outcome.message(), None);
}

#[tokio::test]
async fn pincode_rejects_five_digits_with_format_message() {
    let outcome = check(&validator(), &presets::pincode("pincode"), json!("41100")).await;
    assert!(!outcome.valid);
    assert_eq!(outcome.message(), Some("PIN Code must be 6 digits"));
    assert_eq!(outcome.first().map(|f| f.rule.as_str()), Some("regex"));
}

#[tokio::test]
async fn pincode_surrounding_whitespace_is_trimmed() {
    let outcome = check(&validator(), &presets::pincode("pincode"), json!("  411001 ")).await;
    assert!(outcome.valid);
}

#[rstest]
#[case("४११००१")]
#[case("٤١١٠٠١")]
#[case("41१001")]
#[tokio::test]
async fn pincode_rejects_non_ascii_digits(#[case] pin: &str) {
    let outcome = check(&validator(), &presets::pincode("pincode"), json!(pin)).await;
    assert!(!outcome.valid);
    assert_eq!(outcome.message(), Some("PIN Code must be 6 digits"));
}

#[rstest]
#[case("9876543210", true)]
#[case("9८७६५४३२१०", false)]
#[case("5876543210", false)]
#[tokio::test]
async fn phone_accepts_only_ascii_digits(#[case] phone: &str, #[case] valid: bool) {
    let outcome = check(&validator(), &presets::phone("phone"), json!(phone)).await;
    assert_eq!(outcome.valid, valid, "{phone}");
}

#[tokio::test]
async fn digit_class_in_custom_pattern_is_ascii() {
    let field = FieldDef::text("code").rule(RuleDef::pattern(r"^\d{6}$"));
    assert!(check(&validator(), &field, json!("110001")).await.valid);
    assert!(!check(&validator(), &field, json!("११०००१")).await.valid);
}

#[tokio::test]
async fn numeric_value_is_stringified() {
    let outcome = check(&validator(), &presets::pincode("pincode"), json!(411_001)).await;
    assert!(outcome.valid);
}

// ============================================================================
// SHORT-CIRCUIT AND AGGREGATE
// ============================================================================

#[tokio::test]
async fn short_circuit_reports_only_first_failure() {
    let outcome = check(&validator(), &presets::pincode("pincode"), json!("abc")).await;
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].code, "pattern");
}

#[tokio::test]
async fn aggregate_mode_reports_every_failure_in_order() {
    let validator = Validator::builder()
        .config(ValidatorConfig::default().with_mode(ValidationMode::Aggregate))
        .build();
    let outcome = check(&validator, &presets::pincode("pincode"), json!("abc")).await;

    let codes: Vec<_> = outcome.failures.iter().map(|f| f.code.as_str()).collect();
    assert_eq!(codes, vec!["pattern", "length_eq"]);
    assert_eq!(outcome.message(), Some("PIN Code must be 6 digits"));
    assert_eq!(outcome.failures[1].message, "Length must be 6");
}

#[tokio::test]
async fn aggregate_mode_with_all_rules_passing_is_valid() {
    let validator = Validator::builder()
        .config(ValidatorConfig::default().with_mode(ValidationMode::Aggregate))
        .build();
    let outcome = check(&validator, &presets::pincode("pincode"), json!("560001")).await;
    assert_eq!(outcome, FieldOutcome::pass());
}

// ============================================================================
// LOCALES
// ============================================================================

#[rstest]
#[case(None, "PIN Code is required")]
#[case(Some("en"), "PIN Code is required")]
#[case(Some("hi"), "पिन कोड आवश्यक है")]
#[case(Some("fr"), "PIN Code is required")]
#[tokio::test]
async fn required_message_follows_locale(#[case] locale: Option<&str>, #[case] expected: &str) {
    let field = presets::pincode("pincode");
    let values = FormValues::new();
    let outcome = validator()
        .validate_field(&field, &Value::Null, &values, locale)
        .await;
    assert_eq!(outcome.message(), Some(expected));
}

#[tokio::test]
async fn table_without_requested_or_english_entry_uses_handler_text() {
    let field = FieldDef::text("city")
        .rule(RuleDef::required().with_message(Message::localized("fr", "Ville requise")));
    let outcome = validator()
        .validate_field(&field, &json!(""), &FormValues::new(), Some("de"))
        .await;
    assert_eq!(outcome.message(), Some("This field is required"));
}

#[tokio::test]
async fn configured_default_locale_applies_when_call_names_none() {
    let validator = Validator::builder()
        .config(ValidatorConfig::default().with_locale("hi"))
        .build();
    let outcome = check(&validator, &presets::pincode("pincode"), json!("")).await;
    assert_eq!(outcome.message(), Some("पिन कोड आवश्यक है"));
}

// ============================================================================
// SEVERITY
// ============================================================================

#[tokio::test]
async fn severity_defaults_to_error() {
    let outcome = check(&validator(), &presets::email("email"), json!("")).await;
    assert_eq!(outcome.severity(), Some(Severity::Error));
    assert!(outcome.is_blocking());
}

#[tokio::test]
async fn warning_rule_marks_field_invalid_but_not_blocking() {
    let outcome = check(&validator(), &presets::alternate_email("alt"), json!("nope")).await;
    assert!(!outcome.valid);
    assert_eq!(outcome.severity(), Some(Severity::Warning));
    assert!(!outcome.is_blocking());
    assert_eq!(outcome.message(), Some("This email looks unusual"));
}

#[tokio::test]
async fn full_name_length_is_only_a_warning() {
    let outcome = check(&validator(), &presets::full_name("name"), json!("J")).await;
    assert_eq!(outcome.first().map(|f| f.code.as_str()), Some("length_min"));
    assert_eq!(outcome.severity(), Some(Severity::Warning));
}

// ============================================================================
// CONDITIONS
// ============================================================================

#[tokio::test]
async fn empty_alternate_email_skips_its_rule() {
    let outcome = check(&validator(), &presets::alternate_email("alt"), json!("  ")).await;
    assert!(outcome.valid);
}

#[rstest]
#[case("IN", false)]
#[case("US", true)]
#[tokio::test]
async fn rule_applies_only_when_condition_holds(#[case] country: &str, #[case] valid: bool) {
    let field = FieldDef::text("state")
        .rule(RuleDef::required().when(Condition::on("country").equals("IN")));
    let values = FormValues::new().with("country", country).with("state", "");
    let outcome = validator()
        .validate_field(&field, values.peer("state"), &values, None)
        .await;
    assert_eq!(outcome.valid, valid);
}

#[tokio::test]
async fn condition_precedence_prefers_equals_over_in() {
    let field = FieldDef::text("state").rule(
        RuleDef::required().when(Condition::on("country").equals("IN").one_of(["US"])),
    );
    let values = FormValues::new().with("country", "US");
    let outcome = validator()
        .validate_field(&field, &Value::Null, &values, None)
        .await;
    assert!(outcome.valid, "`in` must be ignored when `equals` is present");
}

#[tokio::test]
async fn not_in_condition() {
    let field = FieldDef::text("gst")
        .rule(RuleDef::required().when(Condition::on("kind").not_in(["individual"])));
    let company = FormValues::new().with("kind", "company");
    let person = FormValues::new().with("kind", "individual");

    let v = validator();
    assert!(!v.validate_field(&field, &Value::Null, &company, None).await.valid);
    assert!(v.validate_field(&field, &Value::Null, &person, None).await.valid);
}

// ============================================================================
// DATES
// ============================================================================

#[rstest]
#[case("2024-06-15", false)]
#[case("2024-06-14", true)]
#[case("2024-06-16", false)]
#[tokio::test]
async fn must_be_past_is_relative_to_injected_today(#[case] date: &str, #[case] valid: bool) {
    let outcome = check(&validator(), &presets::date_of_birth("dob"), json!(date)).await;
    assert_eq!(outcome.valid, valid, "{date}");
}

#[tokio::test]
async fn today_moves_with_the_clock() {
    let later = Validator::builder()
        .today(NaiveDate::from_ymd_opt(2024, 6, 16).unwrap())
        .build();
    let outcome = check(&later, &presets::date_of_birth("dob"), json!("2024-06-15")).await;
    assert!(outcome.valid);
}

#[tokio::test]
async fn age_minimum() {
    let field = FieldDef::new("dob", FieldKind::Date).rule(
        RuleDef::date(DateRule::past().age_min(18)).with_message("You must be 18 or older"),
    );
    let v = validator();
    assert!(check(&v, &field, json!("2006-06-15")).await.valid);
    let outcome = check(&v, &field, json!("2006-06-16")).await;
    assert_eq!(outcome.message(), Some("You must be 18 or older"));
}

// ============================================================================
// CROSS-FIELD AND SELECT
// ============================================================================

#[tokio::test]
async fn confirm_password_must_match_peer() {
    let field = presets::confirm_password("confirm", "password");
    let values = FormValues::new()
        .with("password", "hunter22")
        .with("confirm", "hunter23");
    let outcome = validator()
        .validate_field(&field, values.peer("confirm"), &values, None)
        .await;
    assert_eq!(outcome.message(), Some("Passwords must match"));

    let values = values.with("confirm", "hunter22");
    let outcome = validator()
        .validate_field(&field, values.peer("confirm"), &values, None)
        .await;
    assert!(outcome.valid);
}

#[rstest]
#[case("  hunter22  ", "hunter22")]
#[case("Hunter22", "hunter22")]
#[tokio::test]
async fn confirm_password_compares_peer_as_entered(#[case] password: &str, #[case] confirm: &str) {
    let field = presets::confirm_password("confirm", "password");
    let values = FormValues::new()
        .with("password", password)
        .with("confirm", confirm);
    let outcome = validator()
        .validate_field(&field, values.peer("confirm"), &values, None)
        .await;
    assert!(!outcome.valid);
    assert_eq!(outcome.message(), Some("Passwords must match"));
}

#[tokio::test]
async fn confirm_email_is_not_case_folded_on_the_peer_side() {
    let field = FieldDef::email("confirmEmail").rule(RuleDef::cross_field("email"));
    let values = FormValues::new()
        .with("email", "Bob@X.com")
        .with("confirmEmail", "bob@x.com");
    let outcome = validator()
        .validate_field(&field, values.peer("confirmEmail"), &values, None)
        .await;
    assert_eq!(outcome.first().map(|f| f.code.as_str()), Some("cross_field"));
}

#[rstest]
#[case("Female", true)]
#[case("", false)]
#[case("Unknown", false)]
#[tokio::test]
async fn gender_selection(#[case] value: &str, #[case] valid: bool) {
    let outcome = check(&validator(), &presets::gender("gender"), json!(value)).await;
    assert_eq!(outcome.valid, valid);
}

// ============================================================================
// NUMBERS
// ============================================================================

#[rstest]
#[case(json!(18), None)]
#[case(json!("65"), None)]
#[case(json!("17"), Some("number_min"))]
#[case(json!(66.5), Some("number_max"))]
#[case(json!("abc"), Some("not_a_number"))]
#[case(json!(""), Some("not_a_number"))]
#[tokio::test]
async fn number_range(#[case] value: Value, #[case] code: Option<&str>) {
    let field = FieldDef::new("age", FieldKind::Number)
        .rule(RuleDef::number_range(NumberRangeRule::between(18.0, 65.0)));
    let outcome = check(&validator(), &field, value).await;
    assert_eq!(outcome.first().map(|f| f.code.as_str()), code);
}

// ============================================================================
// IDENTIFIERS
// ============================================================================

#[rstest]
#[case(presets::pan("pan"), "abcde1234f", true)]
#[case(presets::pan("pan"), "ABCDE12345", false)]
#[case(presets::ifsc("ifsc"), "sbin0001234", true)]
#[case(presets::ifsc("ifsc"), "SBIN1001234", false)]
#[case(presets::aadhaar("aadhaar"), "123412341234", true)]
#[case(presets::aadhaar("aadhaar"), "12341234123", false)]
#[tokio::test]
async fn indian_identifiers(#[case] field: FieldDef, #[case] value: &str, #[case] valid: bool) {
    let outcome = check(&validator(), &field, json!(value)).await;
    assert_eq!(outcome.valid, valid, "{} = {value}", field.name);
}

#[tokio::test]
async fn aadhaar_uses_configured_message() {
    let outcome = check(&validator(), &presets::aadhaar("aadhaar"), json!("1234")).await;
    assert_eq!(outcome.message(), Some("Aadhaar must be exactly 12 digits"));
}

// ============================================================================
// EMAIL NORMALIZATION
// ============================================================================

#[tokio::test]
async fn email_is_lower_cased_before_matching() {
    let field = FieldDef::email("email").rule(RuleDef::pattern("^[a-z@.]+$"));
    let outcome = check(&validator(), &field, json!("  USER@EXAMPLE.COM ")).await;
    assert!(outcome.valid);
}

// ============================================================================
// REGISTRY INJECTION
// ============================================================================

#[tokio::test]
async fn unregistered_tag_is_skipped() {
    let field = FieldDef::text("code").rule(RuleDef::other("luhn"));
    let outcome = check(&validator(), &field, json!("anything")).await;
    assert!(outcome.valid);
}

#[tokio::test]
async fn registered_closure_handles_new_tag() {
    let v = validator();
    v.register_rule(
        "even",
        handler_fn(|input: &RuleInput<'_>| {
            if input.value.parse::<i64>().is_ok_and(|n| n % 2 == 0) {
                RuleVerdict::Pass
            } else {
                RuleVerdict::fail("even", "Must be even")
            }
        }),
    );
    let field = FieldDef::text("n").rule(RuleDef::other("even"));
    assert!(check(&v, &field, json!("4")).await.valid);
    assert_eq!(check(&v, &field, json!("5")).await.message(), Some("Must be even"));
}

#[tokio::test]
async fn replacing_a_builtin_handler() {
    let v = validator();
    let previous = v.register_rule("required", handler_fn(|_: &RuleInput<'_>| RuleVerdict::Pass));
    assert!(previous.is_some());

    let outcome = check(&v, &presets::pincode("pincode"), json!("")).await;
    assert_eq!(outcome.first().map(|f| f.code.as_str()), Some("pattern"));
}

#[tokio::test]
async fn empty_validator_passes_everything() {
    let v = Validator::empty();
    assert!(v.rules().is_empty());
    assert!(v.list_custom().is_empty());
    let outcome = check(&v, &presets::pincode("pincode"), json!("")).await;
    assert!(outcome.valid);
}
