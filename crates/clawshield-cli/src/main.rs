//! CLI entry point for clawshield.
//!
//! This module is intentionally thin: it handles argument parsing, I/O, and exit codes.
//! All business logic lives in the `clawshield-app` crate.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use clawshield_app::{
    AuditInput, ExplainOutput, exit_code, format_explanation, format_not_found, load_policy,
    render_markdown, render_text, resolve_settings, run_audit, run_check_policy, run_explain,
    serialize_report,
};
use clawshield_collectors::DockerCli;
use clawshield_settings::{Overrides, locate};
use clawshield_types::Severity;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const DEFAULT_SETTINGS: &str = "clawshield.toml";
const LOG_ENV: &str = "CLAWSHIELD_LOG";

#[derive(Parser, Debug)]
#[command(
    name = "clawshield",
    version,
    about = "Security audit for OpenClaw deployments"
)]
struct Cli {
    /// Path to clawshield settings TOML (default: clawshield.toml if present).
    #[arg(long, global = true)]
    settings: Option<Utf8PathBuf>,

    /// Log debug output to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Collect facts from an OpenClaw deployment and evaluate the policy.
    Audit {
        /// Path to the OpenClaw config file (searched for when omitted).
        config: Option<Utf8PathBuf>,

        /// Path to a custom policy YAML.
        #[arg(long)]
        policy: Option<Utf8PathBuf>,

        /// Output the report as JSON.
        #[arg(long)]
        json: bool,

        /// Minimum severity that causes a non-zero exit code (default: critical).
        #[arg(long, value_parser = parse_severity)]
        fail_on: Option<Severity>,

        /// Do not inspect running Docker containers.
        #[arg(long)]
        skip_docker: bool,

        /// Docker CLI binary used for container inspection.
        #[arg(long, default_value = "docker")]
        docker_binary: String,

        /// Also write a Markdown report to this path.
        #[arg(long)]
        markdown_out: Option<Utf8PathBuf>,
    },

    /// Explain a policy rule.
    Explain {
        /// The rule id (e.g. "NET-001").
        rule_id: String,

        /// Path to a custom policy YAML.
        #[arg(long)]
        policy: Option<Utf8PathBuf>,
    },

    /// Load and validate a policy without collecting facts.
    CheckPolicy {
        /// Path to a custom policy YAML.
        #[arg(long)]
        policy: Option<Utf8PathBuf>,
    },
}

fn parse_severity(raw: &str) -> Result<Severity, String> {
    raw.parse::<Severity>().map_err(|e| e.to_string())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.cmd {
        Commands::Audit {
            config,
            policy,
            json,
            fail_on,
            skip_docker,
            docker_binary,
            markdown_out,
        } => {
            let overrides = Overrides {
                policy,
                fail_on,
                skip_docker,
            };
            cmd_audit(
                cli.settings.as_deref(),
                config,
                overrides,
                json,
                docker_binary,
                markdown_out,
            )
        }
        Commands::Explain { rule_id, policy } => {
            cmd_explain(cli.settings.as_deref(), &rule_id, policy)
        }
        Commands::CheckPolicy { policy } => cmd_check_policy(cli.settings.as_deref(), policy),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("error"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Settings text. An explicit path must exist; the default may be absent.
fn read_settings(explicit: Option<&Utf8Path>) -> anyhow::Result<String> {
    match explicit {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("read settings: {path}")),
        None => {
            let path = Utf8Path::new(DEFAULT_SETTINGS);
            if path.is_file() {
                std::fs::read_to_string(path).with_context(|| format!("read settings: {path}"))
            } else {
                Ok(String::new())
            }
        }
    }
}

fn home_dir() -> Option<Utf8PathBuf> {
    std::env::var("HOME")
        .ok()
        .filter(|h| !h.is_empty())
        .map(Utf8PathBuf::from)
}

fn cmd_audit(
    settings: Option<&Utf8Path>,
    config: Option<Utf8PathBuf>,
    overrides: Overrides,
    json: bool,
    docker_binary: String,
    markdown_out: Option<Utf8PathBuf>,
) -> anyhow::Result<i32> {
    let settings_text = read_settings(settings)?;

    let env_override = std::env::var(locate::ENV_OVERRIDE).ok();
    let home = home_dir();
    let candidates = locate::default_candidates(
        config.as_deref(),
        env_override.as_deref(),
        home.as_deref(),
    );
    let Some(found) = locate::resolve_first(&candidates, |p| p.exists()) else {
        let searched: Vec<&str> = candidates.iter().map(|p| p.as_str()).collect();
        eprintln!("No OpenClaw configuration found.");
        eprintln!("  searched: {}", searched.join(", "));
        eprintln!("Usage: clawshield audit <path-to-openclaw-config.yaml>");
        return Ok(1);
    };
    debug!(config = %found, "using OpenClaw configuration");

    let runtime = DockerCli {
        binary: docker_binary,
        ..DockerCli::default()
    };
    let config_paths = [found];
    let output = run_audit(AuditInput {
        config_paths: &config_paths,
        settings_text: &settings_text,
        overrides,
        container_runtime: &runtime,
    })?;
    let report = &output.report;

    for w in report.warnings() {
        eprintln!("warning: {w}");
    }

    if json {
        print!("{}", serialize_report(report)?);
    } else {
        print!("{}", render_text(report));
    }

    if let Some(path) = markdown_out {
        write_text_file(&path, &render_markdown(report)).context("write markdown")?;
    }

    Ok(exit_code(report, output.resolved.fail_on))
}

fn cmd_explain(
    settings: Option<&Utf8Path>,
    rule_id: &str,
    policy: Option<Utf8PathBuf>,
) -> anyhow::Result<i32> {
    let settings_text = read_settings(settings)?;
    let overrides = Overrides {
        policy,
        ..Overrides::default()
    };
    let resolved = resolve_settings(&settings_text, overrides)?;
    let engine = load_policy(&resolved.policy).context("load policy")?;

    match run_explain(&engine, rule_id) {
        ExplainOutput::Found(rule) => {
            print!("{}", format_explanation(&rule));
            Ok(0)
        }
        ExplainOutput::NotFound {
            identifier,
            available,
        } => {
            eprint!("{}", format_not_found(&identifier, &available));
            Ok(1)
        }
    }
}

fn cmd_check_policy(
    settings: Option<&Utf8Path>,
    policy: Option<Utf8PathBuf>,
) -> anyhow::Result<i32> {
    let settings_text = read_settings(settings)?;
    let overrides = Overrides {
        policy,
        ..Overrides::default()
    };
    let resolved = resolve_settings(&settings_text, overrides)?;
    let out = run_check_policy(&resolved.policy)?;
    println!("policy OK: {} rules ({})", out.rule_count, out.origin);
    Ok(0)
}

fn write_text_file(path: &Utf8Path, text: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("create directory: {parent}"))?;
    }
    std::fs::write(path, text).with_context(|| format!("write text: {path}"))?;
    Ok(())
}
