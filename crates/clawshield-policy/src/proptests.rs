//! Property-based tests for condition evaluation and the engine.
//!
//! Invariants covered:
//! - `all`/`any` behave as boolean conjunction/disjunction, including empty lists
//! - a leaf over an absent key is false for every predicate
//! - evaluation is idempotent and correlation keeps the last value per key

use crate::PolicyEngine;
use crate::condition::ConditionNode;
use crate::correlate::{FactMap, correlate};
use crate::model::{Rule, RuleSet};
use clawshield_types::{Confidence, Fact, Severity};
use proptest::prelude::*;
use serde_json::Value;

// ============================================================================
// Strategies
// ============================================================================

fn arb_key() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "b", "c", "d", "e"]).prop_map(str::to_string)
}

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        (-3i64..3).prop_map(Value::from),
        prop::sample::select(vec!["x", "y", "0.0.0.0"]).prop_map(Value::from),
    ]
}

fn arb_leaf() -> impl Strategy<Value = ConditionNode> {
    prop_oneof![
        (arb_key(), arb_scalar()).prop_map(|(k, v)| ConditionNode::equals(k, v)),
        (arb_key(), prop::collection::vec(arb_scalar(), 0..4))
            .prop_map(|(k, vs)| ConditionNode::one_of(k, vs)),
    ]
}

fn arb_condition() -> impl Strategy<Value = ConditionNode> {
    arb_leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(ConditionNode::AllOf),
            prop::collection::vec(inner, 0..4).prop_map(ConditionNode::AnyOf),
        ]
    })
}

fn arb_facts() -> impl Strategy<Value = Vec<Fact>> {
    prop::collection::vec(
        (arb_key(), arb_scalar(), prop::sample::select(vec!["s1", "s2", "s3"])),
        0..10,
    )
    .prop_map(|items| {
        items
            .into_iter()
            .map(|(k, v, s)| Fact::new(k, v, s))
            .collect()
    })
}

fn fact_map_of(facts: &[Fact]) -> FactMap {
    correlate(facts).map
}

// ============================================================================
// Combinator laws
// ============================================================================

proptest! {
    #[test]
    fn all_is_conjunction(
        children in prop::collection::vec(arb_condition(), 0..5),
        facts in arb_facts(),
    ) {
        let map = fact_map_of(&facts);
        let expected = children.iter().all(|c| c.evaluate(&map));
        prop_assert_eq!(ConditionNode::AllOf(children).evaluate(&map), expected);
    }

    #[test]
    fn any_is_disjunction(
        children in prop::collection::vec(arb_condition(), 0..5),
        facts in arb_facts(),
    ) {
        let map = fact_map_of(&facts);
        let expected = children.iter().any(|c| c.evaluate(&map));
        prop_assert_eq!(ConditionNode::AnyOf(children).evaluate(&map), expected);
    }

    #[test]
    fn absent_key_is_false(
        value in arb_scalar(),
        members in prop::collection::vec(arb_scalar(), 0..4),
        facts in arb_facts(),
    ) {
        let map = fact_map_of(&facts);
        prop_assert!(!ConditionNode::equals("never.collected", value).evaluate(&map));
        prop_assert!(!ConditionNode::one_of("never.collected", members).evaluate(&map));
    }

    #[test]
    fn eq_is_reflexive_for_present_keys(key in arb_key(), value in arb_scalar()) {
        let map = fact_map_of(&[Fact::new(key.clone(), value.clone(), "s")]);
        prop_assert!(ConditionNode::equals(key, value).evaluate(&map));
    }
}

// ============================================================================
// Engine properties
// ============================================================================

fn engine_for(conditions: Vec<ConditionNode>) -> PolicyEngine {
    let rules = conditions
        .into_iter()
        .enumerate()
        .map(|(i, condition)| Rule {
            id: format!("R{i}"),
            title: format!("rule {i}"),
            severity: Severity::Medium,
            confidence: Confidence::High,
            description: None,
            condition,
            recommended_actions: Vec::new(),
            has_autofix: false,
        })
        .collect();
    PolicyEngine::new("proptest", RuleSet::new(rules))
}

proptest! {
    #[test]
    fn evaluate_is_idempotent(
        conditions in prop::collection::vec(arb_condition(), 0..6),
        facts in arb_facts(),
    ) {
        let engine = engine_for(conditions);
        prop_assert_eq!(engine.evaluate(&facts), engine.evaluate(&facts));
    }

    #[test]
    fn findings_are_a_rule_order_subsequence(
        conditions in prop::collection::vec(arb_condition(), 0..6),
        facts in arb_facts(),
    ) {
        let engine = engine_for(conditions);
        let result = engine.evaluate(&facts);
        let order: Vec<&str> = engine.rules().ids().collect();
        let mut cursor = 0;
        for finding in &result.findings {
            let pos = order[cursor..].iter().position(|id| *id == finding.rule_id);
            prop_assert!(pos.is_some());
            cursor += pos.unwrap_or(0) + 1;
        }
    }

    #[test]
    fn evidence_is_every_referenced_fact_in_order(
        condition in arb_condition(),
        facts in arb_facts(),
    ) {
        let keys: Vec<String> = condition.fact_keys().into_iter().map(str::to_string).collect();
        let engine = engine_for(vec![condition]);
        let result = engine.evaluate(&facts);
        if let Some(finding) = result.findings.first() {
            let expected: Vec<Fact> = facts
                .iter()
                .filter(|f| keys.contains(&f.key))
                .cloned()
                .collect();
            prop_assert_eq!(&finding.evidence, &expected);
        }
    }

    #[test]
    fn correlation_keeps_last_value(facts in arb_facts()) {
        let corr = correlate(&facts);
        for fact in &facts {
            let last = facts.iter().rev().find(|f| f.key == fact.key).map(|f| &f.value);
            prop_assert_eq!(corr.map.get(&fact.key), last);
        }
        let repeated = {
            let mut seen = std::collections::BTreeMap::<&str, usize>::new();
            for fact in &facts {
                *seen.entry(fact.key.as_str()).or_default() += 1;
            }
            seen.values().filter(|n| **n > 1).count()
        };
        prop_assert_eq!(corr.warnings.len(), repeated);
    }
}
