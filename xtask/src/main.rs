//! Developer tasks (schema generation, policy checks, report conformance).
//!
//! Keeping this separate avoids bloating the end-user CLI.

use anyhow::{Context, bail};
use clawshield_policy::{PolicyEngine, builtin};
use clawshield_test_util::normalize_nondeterministic;
use clawshield_types::{SCHEMA_VERSION, ids};
use schemars::schema_for;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Workspace root (parent of the xtask directory).
fn project_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .unwrap_or(manifest_dir)
        .to_path_buf()
}

fn schemas_dir() -> PathBuf {
    project_root().join("schemas")
}

fn report_fixtures_dir() -> PathBuf {
    project_root().join("tests").join("fixtures").join("reports")
}

fn policy_fixtures_dir() -> PathBuf {
    project_root().join("tests").join("fixtures").join("policies")
}

/// Schema definition with its target filename.
struct SchemaSpec {
    filename: &'static str,
    generate: fn() -> schemars::Schema,
}

fn generate_report_schema() -> schemars::Schema {
    schema_for!(clawshield_types::AuditReport)
}

fn generate_config_schema() -> schemars::Schema {
    schema_for!(clawshield_settings::ClawshieldConfigV1)
}

fn schema_specs() -> Vec<SchemaSpec> {
    vec![
        SchemaSpec {
            filename: "clawshield.report.v0.1.json",
            generate: generate_report_schema,
        },
        SchemaSpec {
            filename: "clawshield.config.v1.json",
            generate: generate_config_schema,
        },
    ]
}

/// Serialize a schema to pretty-printed JSON with trailing newline.
fn serialize_schema(schema: &schemars::Schema) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(schema).context("Failed to serialize schema")?;
    json.push('\n');
    Ok(json)
}

fn emit_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir();
    fs::create_dir_all(&dir).context("Failed to create schemas directory")?;

    for spec in schema_specs() {
        let json = serialize_schema(&(spec.generate)())?;
        let path = dir.join(spec.filename);
        fs::write(&path, &json)
            .with_context(|| format!("Failed to write schema to {}", path.display()))?;
        println!("Wrote {}", path.display());
    }

    println!("\nSchemas emitted successfully.");
    Ok(())
}

/// Fail if schemas/ differs from what the current types generate.
fn validate_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir();
    let mut missing = Vec::new();
    let mut mismatched = Vec::new();

    for spec in schema_specs() {
        let path = dir.join(spec.filename);
        if !path.exists() {
            missing.push(spec.filename);
            continue;
        }

        let expected = serialize_schema(&(spec.generate)())?;
        let actual = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if expected != actual {
            mismatched.push(spec.filename);
        }
    }

    if missing.is_empty() && mismatched.is_empty() {
        println!("All schemas are up to date.");
        return Ok(());
    }
    if !missing.is_empty() {
        eprintln!("Missing schemas:");
        for name in &missing {
            eprintln!("  - {name}");
        }
    }
    if !mismatched.is_empty() {
        eprintln!("Schemas out of date:");
        for name in &mismatched {
            eprintln!("  - {name}");
        }
    }
    eprintln!("\nRun `cargo xtask emit-schemas` to regenerate.");
    bail!("Schema validation failed")
}

/// Load every bundled policy, then every fixture policy whose name does not
/// start with `invalid_` or `not_`.
fn check_policies() -> anyhow::Result<()> {
    let mut errors = Vec::new();

    for name in builtin::names() {
        match PolicyEngine::builtin(name) {
            Ok(engine) => println!("  ✓ builtin:{name} ({} rules)", engine.rules().len()),
            Err(e) => errors.push(format!("builtin:{name}: {e}")),
        }
    }

    let dir = policy_fixtures_dir();
    if dir.exists() {
        let mut paths: Vec<PathBuf> = fs::read_dir(&dir)
            .with_context(|| format!("Failed to read {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "yaml"))
            .collect();
        paths.sort();

        for path in paths {
            let filename = file_name(&path);
            let expect_invalid = filename.starts_with("invalid_") || filename.starts_with("not_");
            let text = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {filename}"))?;
            match (PolicyEngine::from_yaml_str(&text, &filename), expect_invalid) {
                (Ok(engine), false) => {
                    println!("  ✓ {filename} ({} rules)", engine.rules().len());
                }
                (Err(e), true) => {
                    println!("  ✓ {filename} rejected ({} problems)", e.problems().len());
                }
                (Ok(_), true) => errors.push(format!("{filename}: expected to be rejected")),
                (Err(e), false) => errors.push(e.to_string()),
            }
        }
    }

    if !errors.is_empty() {
        eprintln!("\nPolicy errors:");
        for err in &errors {
            eprintln!("  - {err}");
        }
        bail!("Policy check failed with {} errors", errors.len());
    }
    println!("\n✓ All policies load.");
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

/// Fact sources must start with a known collector prefix.
fn is_known_source(source: &str) -> bool {
    [
        ids::SOURCE_OPENCLAW_CONFIG,
        ids::SOURCE_SECRETS_LITE,
        ids::SOURCE_FILE_PERMISSIONS,
        ids::SOURCE_DOCKER_INSPECT,
    ]
    .iter()
    .any(|prefix| {
        source
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with(':'))
    })
}

/// Validate golden report fixtures.
///
/// 1. Schema validation against the schema generated from `AuditReport`
/// 2. `meta.schema_version` matches the current constant
/// 3. Fixtures are already normalized (no real tool version)
/// 4. Every fact and evidence source names a known collector
fn conform() -> anyhow::Result<()> {
    let schema = serde_json::to_value(generate_report_schema())
        .context("Failed to convert report schema to JSON")?;
    let compiled = jsonschema::validator_for(&schema)
        .map_err(|e| anyhow::anyhow!("Failed to compile schema: {e}"))?;
    println!("✓ report schema compiles");

    let dir = report_fixtures_dir();
    if !dir.exists() {
        bail!("report fixtures not found at {}", dir.display());
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(&dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut errors = Vec::new();
    for path in &paths {
        let filename = file_name(path);
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {filename}"))?;
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {filename} as JSON"))?;

        for err in compiled.iter_errors(&value) {
            errors.push(format!("{filename}: schema validation: {err}"));
        }

        if value["meta"]["schema_version"] != SCHEMA_VERSION {
            errors.push(format!(
                "{filename}: meta.schema_version is not \"{SCHEMA_VERSION}\""
            ));
        }

        if normalize_nondeterministic(value.clone(), None) != value {
            errors.push(format!("{filename}: not normalized (tool_version)"));
        }

        let fact_sources = value["facts"].as_array().into_iter().flatten();
        let evidence_sources = value["findings"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|f| f["evidence"].as_array())
            .flatten();
        for fact in fact_sources.chain(evidence_sources) {
            let source = fact["source"].as_str().unwrap_or_default();
            if !is_known_source(source) {
                errors.push(format!("{filename}: unknown fact source '{source}'"));
            }
        }

        println!("  ✓ {filename} checked");
    }

    if paths.is_empty() {
        bail!("No JSON fixtures found in {}", dir.display());
    }
    if !errors.is_empty() {
        eprintln!("\nConformance errors:");
        for err in &errors {
            eprintln!("  - {err}");
        }
        bail!("Conformance validation failed with {} errors", errors.len());
    }

    println!("\n✓ All {} report fixtures pass conformance checks!", paths.len());
    Ok(())
}

fn print_help() {
    eprintln!("xtask commands:");
    eprintln!("  help              Show this message");
    eprintln!("  emit-schemas      Generate JSON schemas from Rust types to schemas/");
    eprintln!("  validate-schemas  Check if schemas/ matches generated output (for CI)");
    eprintln!("  print-schema-ids  Print known schema IDs");
    eprintln!("  check-policies    Load every bundled and fixture policy");
    eprintln!("  conform           Validate report fixtures against the report schema");
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cmd = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match cmd {
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        "emit-schemas" => emit_schemas(),
        "validate-schemas" => validate_schemas(),
        "check-policies" => check_policies(),
        "conform" => conform(),
        "print-schema-ids" => {
            for spec in schema_specs() {
                println!("{}", spec.filename.trim_end_matches(".json"));
            }
            Ok(())
        }
        other => bail!("unknown xtask command: {other}\n\nRun `cargo xtask help` for usage."),
    }
    .context("xtask failed")
}
