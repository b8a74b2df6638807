//! The `audit` use case: collect facts, evaluate policy, produce a report.

use crate::policy::{apply_rule_filter, load_policy};
use crate::settings::resolve_settings;
use anyhow::Context;
use camino::Utf8PathBuf;
use clawshield_collectors::{
    Collector, ContainerRuntime, DockerCollector, FilePermissionsCollector, OpenClawConfigCollector,
    SecretsLiteCollector, collect_all,
};
use clawshield_settings::{Overrides, ResolvedConfig};
use clawshield_types::{AuditReport, ReportMeta, Severity};
use tracing::{debug, info};

pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Input for the audit use case.
pub struct AuditInput<'a> {
    /// Resolved OpenClaw configuration files.
    pub config_paths: &'a [Utf8PathBuf],
    /// `clawshield.toml` contents (empty if there is none).
    pub settings_text: &'a str,
    pub overrides: Overrides,
    pub container_runtime: &'a dyn ContainerRuntime,
}

#[derive(Clone, Debug)]
pub struct AuditOutput {
    pub report: AuditReport,
    pub resolved: ResolvedConfig,
}

/// Run the audit: resolve settings, load policy, collect facts, evaluate.
pub fn run_audit(input: AuditInput<'_>) -> anyhow::Result<AuditOutput> {
    let resolved = resolve_settings(input.settings_text, input.overrides)?;

    let engine = load_policy(&resolved.policy).context("load policy")?;
    let engine = apply_rule_filter(engine, &resolved.disabled_rules);
    info!(
        policy = engine.origin(),
        rules = engine.rules().len(),
        configs = input.config_paths.len(),
        "starting audit"
    );

    let config = OpenClawConfigCollector;
    let secrets = SecretsLiteCollector;
    let permissions = FilePermissionsCollector;
    let docker = DockerCollector::new(input.container_runtime);

    let toggles = resolved.collectors;
    let mut collectors: Vec<&dyn Collector> = Vec::new();
    if toggles.config {
        collectors.push(&config);
    }
    if toggles.secrets {
        collectors.push(&secrets);
    }
    if toggles.permissions {
        collectors.push(&permissions);
    }
    if toggles.docker {
        collectors.push(&docker);
    }
    debug!(
        collectors = ?collectors.iter().map(|c| c.name()).collect::<Vec<_>>(),
        "collectors enabled"
    );

    let collected = collect_all(&collectors, input.config_paths);
    let mut warnings = collected.warnings;

    let findings = if collected.facts.is_empty() {
        info!("no facts collected; skipping evaluation");
        Vec::new()
    } else {
        let result = engine.evaluate(&collected.facts);
        warnings.extend(result.warnings);
        result.findings
    };
    info!(
        facts = collected.facts.len(),
        findings = findings.len(),
        warnings = warnings.len(),
        "audit finished"
    );

    let report = AuditReport {
        meta: ReportMeta::new(TOOL_VERSION, engine.origin(), warnings),
        facts: collected.facts,
        findings,
    };
    Ok(AuditOutput { report, resolved })
}

/// `1` when any finding is at or above `fail_on`, else `0`.
pub fn exit_code(report: &AuditReport, fail_on: Severity) -> i32 {
    match report.max_severity() {
        Some(worst) if worst >= fail_on => 1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clawshield_collectors::RuntimeError;
    use clawshield_types::Finding;

    struct NoDocker;

    impl ContainerRuntime for NoDocker {
        fn running_container_ids(&self) -> Result<Vec<String>, RuntimeError> {
            Err(RuntimeError::BinaryNotFound)
        }

        fn inspect(&self, _ids: &[String]) -> Result<String, RuntimeError> {
            Err(RuntimeError::BinaryNotFound)
        }
    }

    struct RootContainer;

    impl ContainerRuntime for RootContainer {
        fn running_container_ids(&self) -> Result<Vec<String>, RuntimeError> {
            Ok(vec!["abc".to_string()])
        }

        fn inspect(&self, _ids: &[String]) -> Result<String, RuntimeError> {
            Ok(r#"[{"Id": "abc", "Name": "/openclaw", "Config": {"User": ""}}]"#.to_string())
        }
    }

    fn write_config(dir: &tempfile::TempDir, text: &str) -> Utf8PathBuf {
        let path = dir.path().join("openclaw.yaml");
        std::fs::write(&path, text).expect("write config");
        Utf8PathBuf::from_path_buf(path).expect("utf8 path")
    }

    fn audit(
        paths: &[Utf8PathBuf],
        settings: &str,
        overrides: Overrides,
        runtime: &dyn ContainerRuntime,
    ) -> anyhow::Result<AuditOutput> {
        run_audit(AuditInput {
            config_paths: paths,
            settings_text: settings,
            overrides,
            container_runtime: runtime,
        })
    }

    fn skip_docker() -> Overrides {
        Overrides {
            skip_docker: true,
            ..Overrides::default()
        }
    }

    fn rule_ids(report: &AuditReport) -> Vec<&str> {
        report.findings.iter().map(|f| f.rule_id.as_str()).collect()
    }

    #[test]
    fn vulnerable_config_reports_net001() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = write_config(
            &dir,
            "server:\n  bind_address: 0.0.0.0\nauth:\n  enabled: false\n",
        );
        let out = audit(&[config], "", skip_docker(), &NoDocker).expect("audit");

        assert_eq!(rule_ids(&out.report), vec!["NET-001"]);
        assert_eq!(out.report.meta.policy_path, "builtin:vps_public.yaml");
        assert_eq!(out.report.meta.schema_version, "0.1");
        assert!(out.report.meta.warnings.is_none());
        assert_eq!(exit_code(&out.report, out.resolved.fail_on), 1);
    }

    #[test]
    fn safe_config_has_no_findings() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = write_config(
            &dir,
            "server:\n  bind_address: 127.0.0.1\nauth:\n  enabled: true\n",
        );
        let out = audit(&[config], "", skip_docker(), &NoDocker).expect("audit");
        assert!(out.report.findings.is_empty());
        assert!(!out.report.facts.is_empty());
        assert_eq!(exit_code(&out.report, Severity::Low), 0);
    }

    #[test]
    fn docker_warnings_reach_the_report() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = write_config(&dir, "server:\n  bind_address: 127.0.0.1\n");
        let out = audit(&[config], "", Overrides::default(), &NoDocker).expect("audit");
        assert_eq!(
            out.report.warnings(),
            &["Docker: docker binary not found; skipping container inspection".to_string()]
        );
    }

    #[test]
    fn docker_facts_feed_the_policy() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = write_config(
            &dir,
            "server:\n  bind_address: 127.0.0.1\nauth:\n  enabled: true\n",
        );
        let out = audit(&[config], "", Overrides::default(), &RootContainer).expect("audit");
        assert_eq!(rule_ids(&out.report), vec!["DOC-001"]);
        assert_eq!(exit_code(&out.report, Severity::Critical), 0);
        assert_eq!(exit_code(&out.report, Severity::High), 1);
    }

    #[test]
    fn settings_disable_rules_and_collectors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = write_config(
            &dir,
            "server:\n  bind_address: 0.0.0.0\nauth:\n  enabled: false\n\
             tools:\n  shell:\n    enabled: true\n",
        );
        let settings = "fail_on = \"medium\"\n\
            [collectors]\ndocker = false\nsecrets = false\n\
            [rules]\ndisabled = [\"NET-*\"]\n";
        let out = audit(&[config], settings, Overrides::default(), &RootContainer).expect("audit");
        assert_eq!(rule_ids(&out.report), vec!["TOOL-001"]);
        assert!(!out.report.facts.iter().any(|f| f.key.starts_with("secrets.")));
        assert!(!out.report.facts.iter().any(|f| f.key.starts_with("docker.")));
        assert_eq!(out.resolved.fail_on, Severity::Medium);
        assert_eq!(exit_code(&out.report, out.resolved.fail_on), 1);
    }

    #[test]
    fn no_facts_skips_evaluation() {
        let settings = "[collectors]\nsecrets = false\npermissions = false\n";
        let out = audit(&[], settings, skip_docker(), &NoDocker).expect("audit");
        assert!(out.report.facts.is_empty());
        assert!(out.report.findings.is_empty());
    }

    #[test]
    fn bad_settings_fail_with_context() {
        let err = audit(&[], "fail_on = 3\n", skip_docker(), &NoDocker).expect_err("bad settings");
        assert!(format!("{err:#}").starts_with("parse settings"));
    }

    #[test]
    fn exit_code_threshold() {
        let finding = |severity| Finding {
            rule_id: "R".to_string(),
            title: "t".to_string(),
            severity,
            confidence: clawshield_types::Confidence::High,
            evidence: Vec::new(),
            recommended_actions: Vec::new(),
            autofix_available: false,
        };
        let report = AuditReport {
            meta: ReportMeta::new(TOOL_VERSION, "p", Vec::new()),
            facts: Vec::new(),
            findings: vec![finding(Severity::High)],
        };
        assert_eq!(exit_code(&report, Severity::Critical), 0);
        assert_eq!(exit_code(&report, Severity::High), 1);
        assert_eq!(exit_code(&report, Severity::Low), 1);
    }
}
