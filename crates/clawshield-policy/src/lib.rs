//! Policy evaluation for clawshield.
//!
//! Input: a declarative rule document (YAML or JSON) and a list of `Fact`s
//! gathered elsewhere.
//! Output: `Finding`s in rule order plus correlation warnings.
//!
//! The only IO performed here is the one-time policy document read in
//! [`PolicyEngine::from_path`].

#![forbid(unsafe_code)]

pub mod builtin;
pub mod condition;
pub mod correlate;
pub mod model;

mod engine;
mod error;
mod loader;
mod validate;

pub use condition::{ConditionNode, Operator, Predicate};
pub use correlate::{Correlation, FactMap, correlate};
pub use engine::PolicyEngine;
pub use error::PolicyLoadError;
pub use loader::parse_policy_str;
pub use model::{Rule, RuleSet};
pub use validate::validate_condition;

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod proptests;
