//! The `explain` use case: describe one rule of the loaded policy.

use clawshield_policy::{PolicyEngine, Rule};

#[derive(Clone, Debug, PartialEq)]
pub enum ExplainOutput {
    Found(Box<Rule>),
    NotFound {
        identifier: String,
        available: Vec<String>,
    },
}

pub fn run_explain(engine: &PolicyEngine, identifier: &str) -> ExplainOutput {
    match engine.rules().get(identifier) {
        Some(rule) => ExplainOutput::Found(Box::new(rule.clone())),
        None => ExplainOutput::NotFound {
            identifier: identifier.to_string(),
            available: engine.rules().ids().map(str::to_string).collect(),
        },
    }
}

pub fn format_explanation(rule: &Rule) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}: {}\n", rule.id, rule.title));
    out.push_str(&format!("Severity: {}\n", rule.severity));
    out.push_str(&format!("Confidence: {}\n", rule.confidence));
    if let Some(description) = &rule.description {
        out.push('\n');
        out.push_str(description.trim_end());
        out.push('\n');
    }
    out.push_str(&format!("\nCondition: {}\n", rule.condition));
    if !rule.recommended_actions.is_empty() {
        out.push_str("\nRecommended actions:\n");
        for action in &rule.recommended_actions {
            out.push_str(&format!("  - {action}\n"));
        }
    }
    if rule.has_autofix {
        out.push_str("\nAutofix: available\n");
    }
    out
}

pub fn format_not_found(identifier: &str, available: &[String]) -> String {
    let mut out = format!("Unknown rule '{identifier}'.\n");
    if available.is_empty() {
        out.push_str("The loaded policy has no rules.\n");
    } else {
        out.push_str(&format!("Available rules: {}\n", available.join(", ")));
    }
    out
}
