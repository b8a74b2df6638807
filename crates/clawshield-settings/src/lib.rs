//! Settings parsing, override resolution, and config discovery.
//!
//! This crate is IO-free: it parses settings provided as strings and resolves
//! candidate paths against a caller-supplied existence check.

#![forbid(unsafe_code)]

pub mod locate;
mod model;
mod resolve;

pub use model::{ClawshieldConfigV1, CollectorsConfig, RulesConfig};
pub use resolve::{CollectorToggles, Overrides, PolicySource, ResolvedConfig, RuleFilter};

/// Parse `clawshield.toml` into a typed model.
pub fn parse_config_toml(input: &str) -> anyhow::Result<ClawshieldConfigV1> {
    let cfg: ClawshieldConfigV1 = toml::from_str(input)?;
    Ok(cfg)
}

/// Resolve the effective settings (file values, then CLI overrides).
pub fn resolve_config(
    cfg: ClawshieldConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    resolve::resolve_config(cfg, overrides)
}
