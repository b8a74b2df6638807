use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// `clawshield.toml` schema v1.
///
/// Every field is optional; a missing file and an empty file mean the same thing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ClawshieldConfigV1 {
    /// Optional schema string for tooling (`clawshield.config.v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Policy file path, or `builtin:<name>` for a bundled policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,

    /// Lowest finding severity that fails the audit: `low`, `medium`, `high`, `critical`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_on: Option<String>,

    #[serde(default)]
    pub collectors: CollectorsConfig,

    #[serde(default)]
    pub rules: RulesConfig,
}

/// Collector toggles. Unset means enabled.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CollectorsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secrets: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RulesConfig {
    /// Rule id globs to skip, e.g. `TOOL-*`.
    #[serde(default)]
    pub disabled: Vec<String>,
}
