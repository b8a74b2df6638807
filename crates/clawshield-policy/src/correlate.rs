//! Fold an ordered fact list into one value per key.

use clawshield_types::Fact;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Correlated view of the facts: one value per key, the last one collected.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FactMap {
    values: BTreeMap<String, Value>,
}

impl FactMap {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(key.into(), value)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for FactMap {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut map = FactMap::default();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Correlation {
    pub map: FactMap,
    pub warnings: Vec<String>,
}

/// Merge `facts` in order. Last write wins; a key collected more than once
/// produces one warning naming every source, in first-seen key order.
pub fn correlate(facts: &[Fact]) -> Correlation {
    let mut map = FactMap::default();
    let mut order: Vec<&str> = Vec::new();
    let mut sources: HashMap<&str, Vec<&str>> = HashMap::new();

    for fact in facts {
        map.insert(fact.key.as_str(), fact.value.clone());
        let seen = sources.entry(fact.key.as_str()).or_default();
        if seen.is_empty() {
            order.push(fact.key.as_str());
        }
        seen.push(fact.source.as_str());
    }

    let warnings = order
        .into_iter()
        .filter_map(|key| {
            let srcs = sources.get(key)?;
            (srcs.len() > 1).then(|| {
                format!(
                    "fact '{key}' collected {} times (sources: {}), using last value",
                    srcs.len(),
                    srcs.join(", ")
                )
            })
        })
        .collect();

    Correlation { map, warnings }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn distinct_keys_produce_no_warnings() {
        let facts = vec![
            Fact::new("a", 1, "s1"),
            Fact::new("b", true, "s2"),
        ];
        let corr = correlate(&facts);
        assert!(corr.warnings.is_empty());
        assert_eq!(corr.map.len(), 2);
        assert_eq!(corr.map.get("b"), Some(&json!(true)));
    }

    #[test]
    fn collision_uses_last_value_and_warns_once() {
        let facts = vec![
            Fact::new("network.bind_address", "127.0.0.1", "src_a"),
            Fact::new("network.bind_address", "0.0.0.0", "src_b"),
        ];
        let corr = correlate(&facts);
        assert_eq!(corr.map.get("network.bind_address"), Some(&json!("0.0.0.0")));
        assert_eq!(
            corr.warnings,
            vec![
                "fact 'network.bind_address' collected 2 times \
                 (sources: src_a, src_b), using last value"
            ]
        );
    }

    #[test]
    fn warnings_follow_first_seen_key_order() {
        let facts = vec![
            Fact::new("z", 1, "a"),
            Fact::new("m", 1, "a"),
            Fact::new("m", 2, "b"),
            Fact::new("z", 3, "c"),
            Fact::new("z", 4, "d"),
        ];
        let corr = correlate(&facts);
        assert_eq!(corr.warnings.len(), 2);
        assert!(corr.warnings[0].starts_with("fact 'z' collected 3 times (sources: a, c, d)"));
        assert!(corr.warnings[1].starts_with("fact 'm' collected 2 times"));
        assert_eq!(corr.map.get("z"), Some(&json!(4)));
    }

    #[test]
    fn null_values_are_present_keys() {
        let corr = correlate(&[Fact::new("k", Value::Null, "s")]);
        assert!(corr.map.contains_key("k"));
        assert_eq!(corr.map.get("k"), Some(&Value::Null));
    }

    #[test]
    fn empty_input_is_empty_map() {
        let corr = correlate(&[]);
        assert!(corr.map.is_empty());
        assert!(corr.warnings.is_empty());
    }
}
