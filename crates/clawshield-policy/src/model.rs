use crate::condition::ConditionNode;
use crate::error::PolicyLoadError;
use clawshield_types::{Confidence, Severity};

/// A validated policy rule. Built only by the loader.
#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    pub id: String,
    pub title: String,
    pub severity: Severity,
    pub confidence: Confidence,
    pub description: Option<String>,
    pub condition: ConditionNode,
    pub recommended_actions: Vec<String>,
    pub has_autofix: bool,
}

/// Rules in document order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub(crate) fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Parse and validate a policy document. `origin` labels error messages.
    pub fn from_yaml_str(text: &str, origin: &str) -> Result<Self, PolicyLoadError> {
        crate::loader::parse_policy_str(text, origin)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule with this id.
    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.id.as_str())
    }

    /// A new set keeping only the rules `keep` accepts, order preserved.
    pub fn filtered(&self, mut keep: impl FnMut(&Rule) -> bool) -> Self {
        Self {
            rules: self.rules.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
