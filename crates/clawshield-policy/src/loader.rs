//! Policy document parsing and validation.
//!
//! Every rule is checked before any is accepted: errors from all rules are
//! gathered into a single [`PolicyLoadError::Invalid`].

use crate::condition::{ConditionNode, type_name};
use crate::error::PolicyLoadError;
use crate::model::{Rule, RuleSet};
use crate::validate::validate_condition;
use clawshield_types::{Confidence, Severity};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::{debug, warn};

const REQUIRED_RULE_KEYS: [&str; 5] = ["id", "title", "severity", "confidence", "condition"];

/// Parse a YAML (or JSON) policy document into a validated [`RuleSet`].
///
/// YAML merge keys (`<<: *anchor`) are applied before validation.
///
/// `origin` is the label used in error messages, typically the file path or
/// `builtin:<name>.yaml`.
pub fn parse_policy_str(text: &str, origin: &str) -> Result<RuleSet, PolicyLoadError> {
    let doc = parse_document(text, origin)?;

    let Some(top) = doc.as_object() else {
        return Err(PolicyLoadError::NotAMapping {
            origin: origin.to_string(),
        });
    };

    let raw_rules: &[Value] = match top.get("rules") {
        None => &[],
        Some(Value::Array(items)) => items.as_slice(),
        Some(_) => {
            return Err(PolicyLoadError::RulesNotAList {
                origin: origin.to_string(),
            });
        }
    };

    let mut errors = Vec::new();
    for (i, raw) in raw_rules.iter().enumerate() {
        check_rule(i, raw, &mut errors);
    }
    if !errors.is_empty() {
        return Err(PolicyLoadError::Invalid {
            origin: origin.to_string(),
            errors,
        });
    }

    let mut rules = Vec::with_capacity(raw_rules.len());
    for (i, raw) in raw_rules.iter().enumerate() {
        let rule = build_rule(raw).map_err(|e| PolicyLoadError::Invalid {
            origin: origin.to_string(),
            errors: vec![format!("rules[{i}]: {e}")],
        })?;
        rules.push(rule);
    }

    warn_on_duplicate_ids(&rules, origin);
    debug!(origin, rules = rules.len(), "policy loaded");
    Ok(RuleSet::new(rules))
}

fn parse_document(text: &str, origin: &str) -> Result<Value, PolicyLoadError> {
    let blank = text
        .lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with('#'));
    if blank {
        return Ok(Value::Null);
    }
    let parse_error = |source| PolicyLoadError::Parse {
        origin: origin.to_string(),
        source,
    };
    let mut doc: serde_yaml::Value = serde_yaml::from_str(text).map_err(parse_error)?;
    doc.apply_merge().map_err(parse_error)?;

    let mut errors = Vec::new();
    find_non_finite(&doc, "", &mut errors);
    if !errors.is_empty() {
        return Err(PolicyLoadError::Invalid {
            origin: origin.to_string(),
            errors,
        });
    }
    serde_yaml::from_value(doc).map_err(parse_error)
}

/// JSON has no NaN or infinity; converting would turn them into `null`.
fn find_non_finite(node: &serde_yaml::Value, path: &str, errors: &mut Vec<String>) {
    use serde_yaml::Value as Yaml;

    match node {
        Yaml::Number(n) if n.as_f64().is_some_and(|f| !f.is_finite()) => {
            errors.push(format!("{path}: non-finite number {n} is not supported"));
        }
        Yaml::Sequence(items) => {
            for (i, item) in items.iter().enumerate() {
                find_non_finite(item, &format!("{path}[{i}]"), errors);
            }
        }
        Yaml::Mapping(map) => {
            for (key, value) in map {
                let key = match key {
                    Yaml::String(s) => s.clone(),
                    Yaml::Number(n) => n.to_string(),
                    Yaml::Bool(b) => b.to_string(),
                    _ => "?".to_string(),
                };
                let child = if path.is_empty() {
                    key
                } else {
                    format!("{path}.{key}")
                };
                find_non_finite(value, &child, errors);
            }
        }
        Yaml::Tagged(tagged) => find_non_finite(&tagged.value, path, errors),
        _ => {}
    }
}

fn check_rule(i: usize, raw: &Value, errors: &mut Vec<String>) {
    let Some(rule) = raw.as_object() else {
        errors.push(format!("rules[{i}]: expected mapping, got {}", type_name(raw)));
        return;
    };

    let label = rule.get("id").and_then(Value::as_str).unwrap_or("?");
    let prefix = format!("rules[{i}] (id={label})");

    let missing: Vec<&str> = REQUIRED_RULE_KEYS
        .into_iter()
        .filter(|k| !rule.contains_key(*k))
        .collect();
    if !missing.is_empty() {
        errors.push(format!("{prefix}: missing keys: {}", missing.join(", ")));
    }

    for key in ["id", "title", "description"] {
        if let Some(v) = rule.get(key)
            && !v.is_string()
        {
            errors.push(format!(
                "{prefix}: '{key}' must be a string, got {}",
                type_name(v)
            ));
        }
    }

    if let Some(v) = rule.get("severity")
        && let Err(e) = parse_level::<Severity>(v)
    {
        errors.push(format!("{prefix}: {e}"));
    }
    if let Some(v) = rule.get("confidence")
        && let Err(e) = parse_level::<Confidence>(v)
    {
        errors.push(format!("{prefix}: {e}"));
    }

    if let Some(actions) = rule.get("actions") {
        check_actions(actions, &prefix, errors);
    }

    if let Some(condition) = rule.get("condition") {
        for err in validate_condition(condition) {
            errors.push(format!("{prefix}: {err}"));
        }
    }
}

fn parse_level<T>(v: &Value) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match v.as_str() {
        Some(s) => s.parse::<T>().map_err(|e| e.to_string()),
        None => Err(format!("expected a level string, got {}", type_name(v))),
    }
}

fn check_actions(actions: &Value, prefix: &str, errors: &mut Vec<String>) {
    let Some(actions) = actions.as_object() else {
        errors.push(format!(
            "{prefix}: 'actions' must be a mapping, got {}",
            type_name(actions)
        ));
        return;
    };

    if let Some(recommended) = actions.get("recommended") {
        match recommended.as_array() {
            None => errors.push(format!(
                "{prefix}: 'actions.recommended' must be a list, got {}",
                type_name(recommended)
            )),
            Some(items) => {
                for (j, item) in items.iter().enumerate() {
                    if !item.get("id").is_some_and(Value::is_string) {
                        errors.push(format!(
                            "{prefix}: actions.recommended[{j}] \
                             must be a mapping with a string 'id'"
                        ));
                    }
                }
            }
        }
    }

    if let Some(autofix) = actions.get("autofix")
        && !autofix.is_array()
    {
        errors.push(format!(
            "{prefix}: 'actions.autofix' must be a list, got {}",
            type_name(autofix)
        ));
    }
}

/// Convert a rule that already passed `check_rule`.
fn build_rule(raw: &Value) -> Result<Rule, String> {
    let obj = raw.as_object().ok_or("expected mapping")?;

    let text = |key: &str| -> Result<String, String> {
        obj.get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| format!("'{key}' is not a string"))
    };

    let severity = obj
        .get("severity")
        .ok_or("missing severity")
        .and_then(|v| parse_level::<Severity>(v).map_err(|_| "bad severity"))?;
    let confidence = obj
        .get("confidence")
        .ok_or("missing confidence")
        .and_then(|v| parse_level::<Confidence>(v).map_err(|_| "bad confidence"))?;
    let condition = obj
        .get("condition")
        .ok_or_else(|| "missing condition".to_string())
        .and_then(ConditionNode::from_validated)?;

    let (recommended_actions, has_autofix) = obj
        .get("actions")
        .and_then(Value::as_object)
        .map(read_actions)
        .unwrap_or_default();

    Ok(Rule {
        id: text("id")?,
        title: text("title")?,
        severity,
        confidence,
        description: obj
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
        condition,
        recommended_actions,
        has_autofix,
    })
}

fn read_actions(actions: &Map<String, Value>) -> (Vec<String>, bool) {
    let recommended = actions
        .get("recommended")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("id").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let has_autofix = actions
        .get("autofix")
        .and_then(Value::as_array)
        .is_some_and(|fixes| !fixes.is_empty());
    (recommended, has_autofix)
}

fn warn_on_duplicate_ids(rules: &[Rule], origin: &str) {
    let mut seen = BTreeSet::new();
    for rule in rules {
        if !seen.insert(rule.id.as_str()) {
            warn!(origin, rule_id = %rule.id, "duplicate rule id; both rules will be evaluated");
        }
    }
}
