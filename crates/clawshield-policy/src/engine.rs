use crate::builtin;
use crate::correlate::correlate;
use crate::error::PolicyLoadError;
use crate::model::{Rule, RuleSet};
use camino::Utf8Path;
use clawshield_types::{EvalResult, Fact, Finding};
use tracing::debug;

/// A loaded policy, ready to evaluate any number of fact lists.
///
/// Holds nothing mutable, so `evaluate` may run from several threads at once.
#[derive(Clone, Debug)]
pub struct PolicyEngine {
    origin: String,
    rules: RuleSet,
}

impl PolicyEngine {
    pub fn new(origin: impl Into<String>, rules: RuleSet) -> Self {
        Self {
            origin: origin.into(),
            rules,
        }
    }

    /// Read and validate a policy file.
    pub fn from_path(path: &Utf8Path) -> Result<Self, PolicyLoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                PolicyLoadError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                PolicyLoadError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Self::from_yaml_str(&text, path.as_str())
    }

    pub fn from_yaml_str(text: &str, origin: &str) -> Result<Self, PolicyLoadError> {
        let rules = RuleSet::from_yaml_str(text, origin)?;
        Ok(Self::new(origin, rules))
    }

    /// Load one of the policies compiled into the binary.
    pub fn builtin(name: &str) -> Result<Self, PolicyLoadError> {
        let text = builtin::source(name).ok_or_else(|| PolicyLoadError::UnknownBuiltin {
            name: name.to_string(),
            available: builtin::names().collect(),
        })?;
        Self::from_yaml_str(text, &builtin::origin(name))
    }

    /// Label used in error messages and the report's `policy_path`.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// An engine that evaluates only the rules `keep` accepts.
    pub fn retain_rules(&self, keep: impl FnMut(&Rule) -> bool) -> Self {
        Self {
            origin: self.origin.clone(),
            rules: self.rules.filtered(keep),
        }
    }

    /// Evaluate every rule, in document order, against `facts`.
    pub fn evaluate(&self, facts: &[Fact]) -> EvalResult {
        let correlation = correlate(facts);

        let findings: Vec<Finding> = self
            .rules
            .iter()
            .filter(|rule| rule.condition.evaluate(&correlation.map))
            .map(|rule| finding_for(rule, facts))
            .collect();

        debug!(
            origin = %self.origin,
            rules = self.rules.len(),
            facts = facts.len(),
            findings = findings.len(),
            "policy evaluated"
        );

        EvalResult {
            findings,
            warnings: correlation.warnings,
        }
    }
}

fn finding_for(rule: &Rule, facts: &[Fact]) -> Finding {
    let keys = rule.condition.fact_keys();
    let evidence = facts
        .iter()
        .filter(|f| keys.contains(f.key.as_str()))
        .cloned()
        .collect();

    Finding {
        rule_id: rule.id.clone(),
        title: rule.title.clone(),
        severity: rule.severity,
        confidence: rule.confidence,
        evidence,
        recommended_actions: rule.recommended_actions.clone(),
        autofix_available: rule.has_autofix,
    }
}
