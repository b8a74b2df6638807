//! Fact collectors.
//!
//! This crate is allowed to do filesystem IO and to spawn the container
//! runtime CLI. Nothing here fails an audit: every problem becomes a warning
//! next to whatever facts could still be collected.

#![forbid(unsafe_code)]

pub mod docker;
pub mod openclaw_config;
pub mod permissions;
pub mod secrets;

mod paths;

use camino::Utf8PathBuf;
use clawshield_types::Fact;
use tracing::debug;

pub use docker::{ContainerRuntime, DockerCli, DockerCollector, RuntimeError};
pub use openclaw_config::OpenClawConfigCollector;
pub use permissions::FilePermissionsCollector;
pub use secrets::SecretsLiteCollector;

/// Facts and warnings from one collector run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollectorOutput {
    pub facts: Vec<Fact>,
    pub warnings: Vec<String>,
}

impl CollectorOutput {
    pub fn extend(&mut self, other: CollectorOutput) {
        self.facts.extend(other.facts);
        self.warnings.extend(other.warnings);
    }
}

pub trait Collector {
    /// Stable name, also the prefix of every `source` this collector emits.
    fn name(&self) -> &'static str;

    fn collect(&self, config_paths: &[Utf8PathBuf]) -> CollectorOutput;
}

/// Run `collectors` in order and concatenate their output.
pub fn collect_all(collectors: &[&dyn Collector], config_paths: &[Utf8PathBuf]) -> CollectorOutput {
    let mut out = CollectorOutput::default();
    for collector in collectors {
        let part = collector.collect(config_paths);
        debug!(
            collector = collector.name(),
            facts = part.facts.len(),
            warnings = part.warnings.len(),
            "collector finished"
        );
        out.extend(part);
    }
    out
}
