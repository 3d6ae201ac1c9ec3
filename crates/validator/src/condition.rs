use rulekit_schema::condition::Condition;
use rulekit_schema::values::FormValues;

/// Whether a rule gated by `when` should run against the current values.
///
/// No clause, or a clause without any test, always applies. A peer field
/// missing from `values` is read as `null`.
#[must_use]
pub fn applies(when: Option<&Condition>, values: &FormValues) -> bool {
    let Some(condition) = when else {
        return true;
    };
    let Some(test) = condition.test() else {
        return true;
    };
    let holds = test.evaluate(values.peer(&condition.field));
    if !holds {
        tracing::trace!(peer = %condition.field, ?test, "condition not met");
    }
    holds
}
