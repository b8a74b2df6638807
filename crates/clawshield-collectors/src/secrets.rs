//! Known API key names next to, or inside, the OpenClaw config.
//!
//! Looks at the `.env` beside each config and at the config text itself. No
//! recursion and no entropy analysis.

use crate::paths::with_env_once;
use crate::{Collector, CollectorOutput};
use camino::{Utf8Path, Utf8PathBuf};
use clawshield_types::{Fact, ids};
use tracing::debug;

pub const KNOWN_KEY_NAMES: &[&str] = &[
    "OPENAI_API_KEY",
    "ANTHROPIC_API_KEY",
    "GOOGLE_API_KEY",
    "AZURE_OPENAI_API_KEY",
    "COHERE_API_KEY",
    "MISTRAL_API_KEY",
    "HUGGINGFACEHUB_API_TOKEN",
    "HF_TOKEN",
];

#[derive(Clone, Copy, Debug, Default)]
pub struct SecretsLiteCollector;

impl Collector for SecretsLiteCollector {
    fn name(&self) -> &'static str {
        ids::SOURCE_SECRETS_LITE
    }

    fn collect(&self, config_paths: &[Utf8PathBuf]) -> CollectorOutput {
        let mut out = CollectorOutput::default();
        for (config, env) in with_env_once(config_paths) {
            if let Some(env) = env {
                let source = source_for(&env);
                let present = env.is_file();
                let key_in_env = present && env_file_has_key(&env);
                out.facts.push(Fact::new(
                    ids::FACT_SECRETS_ENV_FILE_PRESENT,
                    present,
                    source.as_str(),
                ));
                out.facts.push(Fact::new(
                    ids::FACT_SECRETS_API_KEY_IN_ENV_FILE,
                    key_in_env,
                    source.as_str(),
                ));
            }

            out.facts.push(Fact::new(
                ids::FACT_SECRETS_API_KEY_IN_CONFIG,
                file_mentions_key_name(config),
                source_for(config),
            ));
        }
        out
    }
}

fn source_for(path: &Utf8Path) -> String {
    format!("{}:{path}", ids::SOURCE_SECRETS_LITE)
}

fn read_lossy(path: &Utf8Path) -> Option<String> {
    match std::fs::read(path) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            debug!(path = %path, error = %e, "cannot read file for secrets scan");
            None
        }
    }
}

/// A non-comment line that starts with `<KNOWN_NAME>=`.
pub fn env_text_has_key(text: &str) -> bool {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .any(|line| {
            KNOWN_KEY_NAMES.iter().any(|name| {
                line.strip_prefix(*name)
                    .is_some_and(|rest| rest.starts_with('='))
            })
        })
}

/// Any known key name anywhere in the text, ignoring case.
pub fn text_mentions_key_name(text: &str) -> bool {
    let lowered = text.to_ascii_lowercase();
    KNOWN_KEY_NAMES
        .iter()
        .any(|name| lowered.contains(&name.to_ascii_lowercase()))
}

fn env_file_has_key(path: &Utf8Path) -> bool {
    read_lossy(path).is_some_and(|text| env_text_has_key(&text))
}

fn file_mentions_key_name(path: &Utf8Path) -> bool {
    read_lossy(path).is_some_and(|text| text_mentions_key_name(&text))
}
