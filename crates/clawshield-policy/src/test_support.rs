use crate::correlate::FactMap;
use camino::Utf8PathBuf;
use clawshield_types::Fact;
use serde_json::Value;
use std::path::Path;

pub fn fact_map(pairs: &[(&str, Value)]) -> FactMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

pub fn fact(key: &str, value: Value, source: &str) -> Fact {
    Fact::new(key, value, source)
}

pub fn write_policy(dir: &Path, name: &str, text: &str) -> Utf8PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).expect("write policy");
    Utf8PathBuf::from_path_buf(path).expect("utf8 path")
}
