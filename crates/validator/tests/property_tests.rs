//! Property-based tests for rule evaluation.

use proptest::prelude::*;
use rulekit_schema::presets;
use rulekit_validator::prelude::*;
use serde_json::{Value, json};

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
        .block_on(future)
}

fn validate(field: &FieldDef, value: &Value) -> FieldOutcome {
    let validator = Validator::new();
    block_on(validator.validate_field(field, value, &FormValues::new(), None))
}

proptest! {
    #[test]
    fn required_fails_exactly_for_blank_input(text in "[ \t\n]{0,6}([a-z0-9][a-z0-9 ]{0,10})?") {
        let field = FieldDef::text("f").rule(RuleDef::required());
        let outcome = validate(&field, &json!(text));
        prop_assert_eq!(outcome.valid, !text.trim().is_empty());
    }

    #[test]
    fn length_counts_trimmed_characters(
        text in "[a-zé ]{0,20}",
        min in 0usize..8,
        extra in 0usize..8,
    ) {
        let max = min + extra;
        let field = FieldDef::text("f").rule(RuleDef::length(LengthRule::between(min, max)));
        let outcome = validate(&field, &json!(text));

        let len = text.trim().chars().count();
        prop_assert_eq!(outcome.valid, (min..=max).contains(&len));
    }

    #[test]
    fn number_range_is_inclusive(n in -1_000i64..1_000) {
        let field = FieldDef::new("n", FieldKind::Number)
            .rule(RuleDef::number_range(NumberRangeRule::between(-10.0, 10.0)));
        let outcome = validate(&field, &json!(n));
        prop_assert_eq!(outcome.valid, (-10..=10).contains(&n));
    }

    #[test]
    fn validate_field_is_idempotent(
        value in "[ ]{0,2}[a-zA-Z0-9@.]{0,14}[ ]{0,2}",
        peer in "[a-zA-Z0-9@.]{0,8}",
        preset in 0usize..5,
    ) {
        let field = match preset {
            0 => presets::pincode("f"),
            1 => presets::email("f"),
            2 => presets::phone("f"),
            3 => presets::pan("f"),
            _ => presets::confirm_password("f", "peer"),
        };
        let values = FormValues::new().with("f", value.clone()).with("peer", peer);
        let validator = Validator::new();

        let first = block_on(validator.validate_field(&field, &json!(value), &values, None));
        let second = block_on(validator.validate_field(&field, &json!(value), &values, None));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn form_outcome_lists_exactly_the_invalid_fields(
        filled in proptest::collection::vec(any::<bool>(), 1..6),
    ) {
        let fields: Vec<FieldDef> = (0..filled.len())
            .map(|i| FieldDef::text(format!("f{i}")).rule(RuleDef::required()))
            .collect();
        let values: FormValues = filled
            .iter()
            .enumerate()
            .map(|(i, &on)| (format!("f{i}"), if on { json!("x") } else { json!("") }))
            .collect();

        let validator = Validator::new();
        let outcome = block_on(validator.validate_all(&fields, &values, None));

        let mut expected: Vec<String> = filled
            .iter()
            .enumerate()
            .filter(|&(_, &on)| !on)
            .map(|(i, _)| format!("f{i}"))
            .collect();
        expected.sort();
        prop_assert_eq!(outcome.errors.keys().cloned().collect::<Vec<_>>(), expected.clone());
        prop_assert_eq!(outcome.valid, expected.is_empty());
    }
}
