//! Policy loading and the `check-policy` use case.

use anyhow::Context;
use clawshield_policy::{PolicyEngine, builtin};
use clawshield_settings::{PolicySource, RuleFilter};
use tracing::info;

/// Load the engine `source` points at.
pub fn load_policy(source: &PolicySource) -> anyhow::Result<PolicyEngine> {
    let engine = match source {
        PolicySource::Default => PolicyEngine::builtin(builtin::DEFAULT)?,
        PolicySource::Builtin(name) => PolicyEngine::builtin(name)?,
        PolicySource::File(path) => PolicyEngine::from_path(path)?,
    };
    Ok(engine)
}

/// Drop rules matched by `rules.disabled`.
pub(crate) fn apply_rule_filter(engine: PolicyEngine, filter: &RuleFilter) -> PolicyEngine {
    if filter.is_empty() {
        return engine;
    }
    let kept = engine.retain_rules(|rule| !filter.is_disabled(&rule.id));
    let dropped = engine.rules().len() - kept.rules().len();
    info!(dropped, patterns = ?filter.patterns(), "rules disabled by settings");
    kept
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckPolicyOutput {
    pub origin: String,
    pub rule_count: usize,
}

/// Load and validate a policy without running collectors.
pub fn run_check_policy(source: &PolicySource) -> anyhow::Result<CheckPolicyOutput> {
    let engine = load_policy(source).context("load policy")?;
    Ok(CheckPolicyOutput {
        origin: engine.origin().to_string(),
        rule_count: engine.rules().len(),
    })
}
