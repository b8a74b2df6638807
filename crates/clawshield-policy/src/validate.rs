use crate::condition::{Operator, type_name};
use serde_json::Value;

/// Return every structural problem in a raw condition tree.
///
/// Never stops at the first error: a policy author should be able to fix a
/// whole document from one run. Each message is prefixed with the path of the
/// offending node, e.g. `condition.all[2].any[0]`.
pub fn validate_condition(condition: &Value) -> Vec<String> {
    let mut errors = Vec::new();
    validate_node(condition, "condition", &mut errors);
    errors
}

fn validate_node(node: &Value, path: &str, errors: &mut Vec<String>) {
    let Some(obj) = node.as_object() else {
        errors.push(format!("{path}: expected mapping, got {}", type_name(node)));
        return;
    };

    for combinator in ["all", "any"] {
        if let Some(children) = obj.get(combinator) {
            let Some(children) = children.as_array() else {
                errors.push(format!(
                    "{path}.{combinator}: expected list, got {}",
                    type_name(children)
                ));
                return;
            };
            for (i, child) in children.iter().enumerate() {
                validate_node(child, &format!("{path}.{combinator}[{i}]"), errors);
            }
            return;
        }
    }

    validate_leaf(obj, path, errors);
}

fn validate_leaf(obj: &serde_json::Map<String, Value>, path: &str, errors: &mut Vec<String>) {
    for key in ["fact", "op", "value"] {
        if !obj.contains_key(key) {
            errors.push(format!("{path}: missing required key '{key}'"));
        }
    }

    match obj.get("fact") {
        Some(Value::String(fact)) if fact.is_empty() => {
            errors.push(format!("{path}: 'fact' must be a non-empty string"));
        }
        Some(Value::String(_)) | None => {}
        Some(other) => errors.push(format!(
            "{path}: 'fact' must be a string, got {}",
            type_name(other)
        )),
    }

    let Some(op) = obj.get("op") else { return };
    let valid = Operator::ALL.map(Operator::as_str).join(", ");
    match op.as_str().and_then(Operator::parse) {
        None => {
            let shown = op.as_str().map(str::to_string).unwrap_or_else(|| op.to_string());
            errors.push(format!(
                "{path}: unknown operator '{shown}' (valid: {valid})"
            ));
        }
        Some(Operator::In) => {
            if let Some(value) = obj.get("value")
                && !value.is_array()
            {
                errors.push(format!(
                    "{path}: 'in' operator requires a list value, got {}",
                    type_name(value)
                ));
            }
        }
        Some(Operator::Eq) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_condition_has_no_errors() {
        let cond = json!({
            "all": [
                {"fact": "network.bind_address", "op": "in", "value": ["0.0.0.0", "::"]},
                {"fact": "runtime.auth_enabled", "op": "eq", "value": false},
            ]
        });
        assert!(validate_condition(&cond).is_empty());
    }

    #[test]
    fn missing_fact_key() {
        let errors = validate_condition(&json!({"op": "eq", "value": 1}));
        assert_eq!(errors, vec!["condition: missing required key 'fact'"]);
    }

    #[test]
    fn missing_op_key() {
        let errors = validate_condition(&json!({"fact": "x", "value": 1}));
        assert_eq!(errors, vec!["condition: missing required key 'op'"]);
    }

    #[test]
    fn unknown_operator() {
        let errors = validate_condition(&json!({"fact": "x", "op": "nope", "value": 1}));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("unknown operator 'nope'"));
        assert!(errors[0].contains("valid: eq, in"));
    }

    #[test]
    fn in_with_scalar_value_is_rejected() {
        let errors = validate_condition(&json!({"fact": "x", "op": "in", "value": "0.0.0.0"}));
        assert_eq!(
            errors,
            vec!["condition: 'in' operator requires a list value, got string"]
        );
    }

    #[test]
    fn in_with_null_value_is_rejected() {
        let errors = validate_condition(&json!({"fact": "x", "op": "in", "value": null}));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].ends_with("got null"));
    }

    #[test]
    fn nested_errors_carry_paths() {
        let cond = json!({
            "all": [
                {"fact": "a", "op": "eq", "value": 1},
                {"fact": "b", "op": "eq", "value": 1},
                {"any": [{"fact": "c", "op": "bogus", "value": 1}]},
            ]
        });
        let errors = validate_condition(&cond);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("condition.all[2].any[0]:"));
    }

    #[test]
    fn non_list_combinator_records_one_error_and_stops() {
        let errors = validate_condition(&json!({"any": {"fact": "a"}}));
        assert_eq!(errors, vec!["condition.any: expected list, got mapping"]);
    }

    #[test]
    fn collects_every_problem_in_one_pass() {
        let cond = json!({
            "any": [
                {"op": "eq"},
                {"fact": "", "op": "in", "value": 3},
                "not a node",
            ]
        });
        let errors = validate_condition(&cond);
        assert_eq!(
            errors,
            vec![
                "condition.any[0]: missing required key 'fact'",
                "condition.any[0]: missing required key 'value'",
                "condition.any[1]: 'fact' must be a non-empty string",
                "condition.any[1]: 'in' operator requires a list value, got int",
                "condition.any[2]: expected mapping, got string",
            ]
        );
    }
}
