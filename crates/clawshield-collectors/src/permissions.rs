//! World-readable / world-writable config and `.env` files.
//!
//! Only meaningful on Unix. Elsewhere every permission fact is `false`.

use crate::paths::with_env_once;
use crate::{Collector, CollectorOutput};
use camino::{Utf8Path, Utf8PathBuf};
use clawshield_types::{Fact, ids};

const OTHER_READ: u32 = 0o004;
const OTHER_WRITE: u32 = 0o002;

#[derive(Clone, Copy, Debug, Default)]
pub struct FilePermissionsCollector;

impl Collector for FilePermissionsCollector {
    fn name(&self) -> &'static str {
        ids::SOURCE_FILE_PERMISSIONS
    }

    fn collect(&self, config_paths: &[Utf8PathBuf]) -> CollectorOutput {
        let mut out = CollectorOutput::default();
        for (config, env) in with_env_once(config_paths) {
            let mode = file_mode(config);
            out.facts.push(Fact::new(
                ids::FACT_FILES_CONFIG_WORLD_WRITABLE,
                has_bits(mode, OTHER_WRITE),
                source_for(config),
            ));

            if let Some(env) = env {
                let env_mode = if env.is_file() { file_mode(&env) } else { None };
                let source = source_for(&env);
                out.facts.push(Fact::new(
                    ids::FACT_FILES_ENV_WORLD_READABLE,
                    has_bits(env_mode, OTHER_READ),
                    source.as_str(),
                ));
                out.facts.push(Fact::new(
                    ids::FACT_FILES_ENV_WORLD_WRITABLE,
                    has_bits(env_mode, OTHER_WRITE),
                    source.as_str(),
                ));
            }
        }
        out
    }
}

fn source_for(path: &Utf8Path) -> String {
    format!("{}:{path}", ids::SOURCE_FILE_PERMISSIONS)
}

fn has_bits(mode: Option<u32>, bits: u32) -> bool {
    mode.is_some_and(|m| m & bits != 0)
}

#[cfg(unix)]
fn file_mode(path: &Utf8Path) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).ok().map(|m| m.permissions().mode())
}

#[cfg(not(unix))]
fn file_mode(_path: &Utf8Path) -> Option<u32> {
    None
}
