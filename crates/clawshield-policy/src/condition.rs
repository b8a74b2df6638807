//! Typed condition trees and their evaluation.
//!
//! A raw condition document is shape-checked by [`crate::validate_condition`]
//! and then parsed exactly once into a [`ConditionNode`]. Evaluation never
//! re-inspects document shape.

use crate::correlate::FactMap;
use serde_json::{Map, Number, Value};
use std::collections::BTreeSet;
use std::fmt;

/// Leaf comparison operators understood by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    In,
}

impl Operator {
    pub const ALL: [Operator; 2] = [Operator::Eq, Operator::In];

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::In => "in",
        }
    }

    pub fn parse(s: &str) -> Option<Operator> {
        Operator::ALL.into_iter().find(|op| op.as_str() == s)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The comparison a leaf performs against its fact's value.
///
/// `In` owns a list, so a membership test against a scalar cannot be built.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    Eq(Value),
    In(Vec<Value>),
}

impl Predicate {
    pub fn op(&self) -> Operator {
        match self {
            Predicate::Eq(_) => Operator::Eq,
            Predicate::In(_) => Operator::In,
        }
    }

    pub fn matches(&self, actual: &Value) -> bool {
        match self {
            Predicate::Eq(expected) => values_equal(actual, expected),
            Predicate::In(members) => members.iter().any(|m| values_equal(actual, m)),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConditionNode {
    AllOf(Vec<ConditionNode>),
    AnyOf(Vec<ConditionNode>),
    Leaf { fact: String, predicate: Predicate },
}

impl ConditionNode {
    pub fn equals(fact: impl Into<String>, value: impl Into<Value>) -> Self {
        ConditionNode::Leaf {
            fact: fact.into(),
            predicate: Predicate::Eq(value.into()),
        }
    }

    pub fn one_of<V: Into<Value>>(
        fact: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        ConditionNode::Leaf {
            fact: fact.into(),
            predicate: Predicate::In(values.into_iter().map(Into::into).collect()),
        }
    }

    /// Decide whether this tree holds against `facts`.
    ///
    /// A leaf whose key is absent from the map is false whatever its operator;
    /// a key present with `null` is compared normally.
    pub fn evaluate(&self, facts: &FactMap) -> bool {
        match self {
            ConditionNode::AllOf(children) => children.iter().all(|c| c.evaluate(facts)),
            ConditionNode::AnyOf(children) => children.iter().any(|c| c.evaluate(facts)),
            ConditionNode::Leaf { fact, predicate } => match facts.get(fact) {
                Some(actual) => predicate.matches(actual),
                None => false,
            },
        }
    }

    /// Every fact key referenced anywhere in the tree.
    pub fn fact_keys(&self) -> BTreeSet<&str> {
        let mut keys = BTreeSet::new();
        self.collect_keys(&mut keys);
        keys
    }

    fn collect_keys<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            ConditionNode::AllOf(children) | ConditionNode::AnyOf(children) => {
                for child in children {
                    child.collect_keys(out);
                }
            }
            ConditionNode::Leaf { fact, .. } => {
                out.insert(fact.as_str());
            }
        }
    }

    /// Build a node from a raw document that already passed validation.
    ///
    /// Returns an error string rather than panicking if it is handed a shape
    /// validation would have rejected.
    pub(crate) fn from_validated(raw: &Value) -> Result<Self, String> {
        let obj = raw
            .as_object()
            .ok_or_else(|| format!("expected mapping, got {}", type_name(raw)))?;

        if let Some(children) = obj.get("all") {
            return Ok(ConditionNode::AllOf(children_from(children, "all")?));
        }
        if let Some(children) = obj.get("any") {
            return Ok(ConditionNode::AnyOf(children_from(children, "any")?));
        }

        let fact = obj
            .get("fact")
            .and_then(Value::as_str)
            .filter(|f| !f.is_empty())
            .ok_or("leaf without a fact key")?;
        let op = obj
            .get("op")
            .and_then(Value::as_str)
            .and_then(Operator::parse)
            .ok_or("leaf without a recognized operator")?;
        let value = obj.get("value").ok_or("leaf without a value")?;

        let predicate = match op {
            Operator::Eq => Predicate::Eq(value.clone()),
            Operator::In => Predicate::In(
                value
                    .as_array()
                    .ok_or("'in' leaf without a list value")?
                    .clone(),
            ),
        };

        Ok(ConditionNode::Leaf {
            fact: fact.to_string(),
            predicate,
        })
    }
}

fn children_from(raw: &Value, combinator: &str) -> Result<Vec<ConditionNode>, String> {
    raw.as_array()
        .ok_or_else(|| format!("'{combinator}' without a list"))?
        .iter()
        .map(ConditionNode::from_validated)
        .collect()
}

impl fmt::Display for ConditionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionNode::AllOf(children) => write_combinator(f, "all", children),
            ConditionNode::AnyOf(children) => write_combinator(f, "any", children),
            ConditionNode::Leaf { fact, predicate } => match predicate {
                Predicate::Eq(v) => write!(f, "{fact} eq {v}"),
                Predicate::In(vs) => write!(f, "{fact} in {}", Value::Array(vs.clone())),
            },
        }
    }
}

fn write_combinator(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    children: &[ConditionNode],
) -> fmt::Result {
    write!(f, "{name}(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{child}")?;
    }
    f.write_str(")")
}

/// Structural equality with numbers compared by value (`1 == 1.0`).
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => objects_equal(xs, ys),
        _ => a == b,
    }
}

fn numbers_equal(x: &Number, y: &Number) -> bool {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a == b;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn objects_equal(xs: &Map<String, Value>, ys: &Map<String, Value>) -> bool {
    xs.len() == ys.len()
        && xs
            .iter()
            .all(|(k, v)| ys.get(k).is_some_and(|other| values_equal(v, other)))
}

/// Short type label used in validation messages.
pub(crate) fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}
