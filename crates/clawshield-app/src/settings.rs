use anyhow::Context;
use clawshield_settings::{ClawshieldConfigV1, Overrides, ResolvedConfig};

/// Parse `clawshield.toml` text (empty means defaults) and apply CLI overrides.
pub fn resolve_settings(
    settings_text: &str,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    let cfg = if settings_text.trim().is_empty() {
        ClawshieldConfigV1::default()
    } else {
        clawshield_settings::parse_config_toml(settings_text).context("parse settings")?
    };
    clawshield_settings::resolve_config(cfg, overrides).context("resolve settings")
}
