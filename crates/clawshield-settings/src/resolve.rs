use crate::model::ClawshieldConfigV1;
use anyhow::Context;
use camino::Utf8PathBuf;
use clawshield_types::Severity;
use globset::{Glob, GlobSet, GlobSetBuilder};

const BUILTIN_PREFIX: &str = "builtin:";

/// Values given on the command line. They win over the settings file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub policy: Option<Utf8PathBuf>,
    pub fail_on: Option<Severity>,
    pub skip_docker: bool,
}

/// Where the rule set comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PolicySource {
    /// The bundled default policy.
    Default,
    /// A bundled policy by name.
    Builtin(String),
    File(Utf8PathBuf),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollectorToggles {
    pub config: bool,
    pub secrets: bool,
    pub permissions: bool,
    pub docker: bool,
}

impl Default for CollectorToggles {
    fn default() -> Self {
        Self {
            config: true,
            secrets: true,
            permissions: true,
            docker: true,
        }
    }
}

/// Compiled `rules.disabled` globs.
#[derive(Clone, Debug)]
pub struct RuleFilter {
    patterns: Vec<String>,
    set: GlobSet,
}

impl RuleFilter {
    pub fn new(patterns: &[String]) -> anyhow::Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern)
                .with_context(|| format!("invalid rules.disabled glob: {pattern}"))?;
            builder.add(glob);
        }
        let set = builder.build().context("build rules.disabled glob set")?;
        Ok(Self {
            patterns: patterns.to_vec(),
            set,
        })
    }

    pub fn is_disabled(&self, rule_id: &str) -> bool {
        self.set.is_match(rule_id)
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl Default for RuleFilter {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            set: GlobSet::empty(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub policy: PolicySource,
    pub fail_on: Severity,
    pub collectors: CollectorToggles,
    pub disabled_rules: RuleFilter,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            policy: PolicySource::Default,
            fail_on: Severity::Critical,
            collectors: CollectorToggles::default(),
            disabled_rules: RuleFilter::default(),
        }
    }
}

pub fn resolve_config(
    cfg: ClawshieldConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    let policy = match (overrides.policy, cfg.policy.as_deref()) {
        (Some(path), _) => PolicySource::File(path),
        (None, Some(raw)) => parse_policy(raw)?,
        (None, None) => PolicySource::Default,
    };

    let fail_on = match (overrides.fail_on, cfg.fail_on.as_deref()) {
        (Some(sev), _) => sev,
        (None, Some(raw)) => parse_fail_on(raw)?,
        (None, None) => Severity::Critical,
    };

    let c = &cfg.collectors;
    let collectors = CollectorToggles {
        config: c.config.unwrap_or(true),
        secrets: c.secrets.unwrap_or(true),
        permissions: c.permissions.unwrap_or(true),
        docker: c.docker.unwrap_or(true) && !overrides.skip_docker,
    };

    let disabled_rules = RuleFilter::new(&cfg.rules.disabled)?;

    Ok(ResolvedConfig {
        policy,
        fail_on,
        collectors,
        disabled_rules,
    })
}

fn parse_policy(raw: &str) -> anyhow::Result<PolicySource> {
    let raw = raw.trim();
    if raw.is_empty() {
        anyhow::bail!("policy must not be empty");
    }
    match raw.strip_prefix(BUILTIN_PREFIX) {
        Some(name) if name.is_empty() => anyhow::bail!("policy '{raw}' names no builtin"),
        Some(name) => Ok(PolicySource::Builtin(name.to_string())),
        None => Ok(PolicySource::File(Utf8PathBuf::from(raw))),
    }
}

fn parse_fail_on(raw: &str) -> anyhow::Result<Severity> {
    raw.parse::<Severity>()
        .with_context(|| format!("invalid fail_on: {raw}"))
}
