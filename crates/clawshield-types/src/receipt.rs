use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

/// Schema version stamped into `meta.schema_version` of the JSON report.
pub const SCHEMA_VERSION: &str = "0.1";

/// How bad a finding is. Ordered `low < medium < high < critical` so
/// `--fail-on` thresholds can compare directly.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// How sure a rule author is that a fired rule is a real problem.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl Confidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

/// Returned when a severity/confidence string is not one of the known levels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownLevel {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl fmt::Display for UnknownLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown {} '{}' (expected {})",
            self.kind, self.value, self.expected
        )
    }
}

impl std::error::Error for UnknownLevel {}

impl FromStr for Severity {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(UnknownLevel {
                kind: "severity",
                value: other.to_string(),
                expected: "low|medium|high|critical",
            }),
        }
    }
}

impl FromStr for Confidence {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Confidence::Low),
            "medium" => Ok(Confidence::Medium),
            "high" => Ok(Confidence::High),
            other => Err(UnknownLevel {
                kind: "confidence",
                value: other.to_string(),
                expected: "low|medium|high",
            }),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single observed, attributable data point.
///
/// `value` is a scalar, a list, or `null`. `source` names the collector and the
/// artifact it looked at (e.g. `openclaw_config:/etc/openclaw/config.yaml`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Fact {
    pub key: String,
    pub value: JsonValue,
    pub source: String,
}

impl Fact {
    pub fn new(
        key: impl Into<String>,
        value: impl Into<JsonValue>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            source: source.into(),
        }
    }
}

/// The record produced when a rule's condition holds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Finding {
    pub rule_id: String,
    pub title: String,
    pub severity: Severity,
    pub confidence: Confidence,

    /// Every raw fact whose key the rule's condition references, in collection
    /// order, duplicates included.
    pub evidence: Vec<Fact>,

    pub recommended_actions: Vec<String>,
    pub autofix_available: bool,
}

/// Output of one `PolicyEngine::evaluate` call.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EvalResult {
    pub findings: Vec<Finding>,
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReportMeta {
    pub schema_version: String,
    pub tool_version: String,
    pub policy_path: String,

    /// Collector and correlation warnings. Omitted entirely when empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
}

/// The `--json` report envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AuditReport {
    pub meta: ReportMeta,
    pub facts: Vec<Fact>,
    pub findings: Vec<Finding>,
}

impl ReportMeta {
    pub fn new(tool_version: &str, policy_path: &str, warnings: Vec<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            tool_version: tool_version.to_string(),
            policy_path: policy_path.to_string(),
            warnings: if warnings.is_empty() {
                None
            } else {
                Some(warnings)
            },
        }
    }
}

impl AuditReport {
    pub fn warnings(&self) -> &[String] {
        self.meta.warnings.as_deref().unwrap_or(&[])
    }

    /// Highest severity among the findings, if any fired.
    pub fn max_severity(&self) -> Option<Severity> {
        self.findings.iter().map(|f| f.severity).max()
    }
}
