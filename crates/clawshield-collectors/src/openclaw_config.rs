//! Security-relevant settings from OpenClaw configuration files.

use crate::{Collector, CollectorOutput};
use camino::{Utf8Path, Utf8PathBuf};
use clawshield_types::{Fact, ids};
use serde_json::Value;
use tracing::{debug, warn};

/// Tokens shorter than this are reported as weak.
pub const MIN_TOKEN_LEN: usize = 32;

/// Config path to fact key, for toggles copied through with bool normalization.
const TOGGLES: &[(&str, &str)] = &[
    ("sandbox.enabled", ids::FACT_SANDBOX_ENABLED),
    ("tools.shell.enabled", ids::FACT_TOOLS_SHELL_ENABLED),
    ("browser.enabled", ids::FACT_BROWSER_ENABLED),
    ("logging.redaction.enabled", ids::FACT_LOGGING_REDACTION_ENABLED),
    ("logging.redaction.file_logs", ids::FACT_LOGGING_FILE_LOGS_REDACTED),
];

#[derive(Clone, Copy, Debug, Default)]
pub struct OpenClawConfigCollector;

impl Collector for OpenClawConfigCollector {
    fn name(&self) -> &'static str {
        ids::SOURCE_OPENCLAW_CONFIG
    }

    fn collect(&self, config_paths: &[Utf8PathBuf]) -> CollectorOutput {
        let mut out = CollectorOutput::default();
        for path in config_paths {
            match read_config(path) {
                Ok(doc) => out.facts.extend(facts_from_config(&doc, path)),
                Err(reason) => {
                    warn!(path = %path, %reason, "skipping unreadable config");
                    out.warnings.push(format!(
                        "{}: cannot read {path}: {reason}",
                        ids::SOURCE_OPENCLAW_CONFIG
                    ));
                }
            }
        }
        out
    }
}

fn read_config(path: &Utf8Path) -> Result<Value, String> {
    let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_yaml::from_str(&text).map_err(|e| format!("invalid YAML: {e}"))
}

/// Extract facts from one parsed configuration document.
///
/// Only keys present (and non-null) in the document produce facts. A document
/// that is empty or not a mapping yields none.
pub fn facts_from_config(doc: &Value, path: &Utf8Path) -> Vec<Fact> {
    let source = format!("{}:{path}", ids::SOURCE_OPENCLAW_CONFIG);
    let mut facts = Vec::new();

    if !doc.is_object() {
        debug!(path = %path, "config document is not a mapping");
        return facts;
    }

    if let Some(bind) = deep_get(doc, "server.bind_address") {
        facts.push(Fact::new(
            ids::FACT_NETWORK_BIND_ADDRESS,
            normalize_bind_address(bind),
            source.as_str(),
        ));
    }

    if let Some(enabled) = deep_get(doc, "auth.enabled") {
        facts.push(Fact::new(
            ids::FACT_RUNTIME_AUTH_ENABLED,
            normalize_bool(enabled),
            source.as_str(),
        ));
    }

    if let Some(mode) = deep_get(doc, "auth.mode") {
        let mode = match mode {
            Value::String(s) => Value::from(s.trim().to_ascii_lowercase()),
            other => other.clone(),
        };
        facts.push(Fact::new(ids::FACT_RUNTIME_AUTH_MODE, mode, source.as_str()));
    }

    if let Some(token) = deep_get(doc, "auth.token") {
        facts.push(Fact::new(
            ids::FACT_RUNTIME_AUTH_TOKEN_WEAK,
            token_is_weak(token),
            source.as_str(),
        ));
    }

    for (path_in_doc, key) in TOGGLES {
        if let Some(v) = deep_get(doc, path_in_doc) {
            facts.push(Fact::new(*key, normalize_bool(v), source.as_str()));
        }
    }

    facts
}

fn deep_get<'a>(doc: &'a Value, dotted: &str) -> Option<&'a Value> {
    let mut current = doc;
    for part in dotted.split('.') {
        current = current.as_object()?.get(part)?;
    }
    (!current.is_null()).then_some(current)
}

fn normalize_bind_address(v: &Value) -> String {
    match v {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// `true`/`1`/`yes` and `false`/`0`/`no` strings become booleans; anything
/// else passes through unchanged.
pub fn normalize_bool(v: &Value) -> Value {
    match v {
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Value::Bool(true),
            "false" | "0" | "no" => Value::Bool(false),
            _ => v.clone(),
        },
        _ => v.clone(),
    }
}

fn token_is_weak(token: &Value) -> bool {
    let text = match token {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    text.chars().count() < MIN_TOKEN_LEN
}
