//! Render use cases: JSON, terminal text, and Markdown from an in-memory report.

use anyhow::Context;
use clawshield_types::AuditReport;

/// Pretty-printed JSON with a trailing newline.
pub fn serialize_report(report: &AuditReport) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(report).context("serialize audit report")?;
    json.push('\n');
    Ok(json)
}

pub fn render_text(report: &AuditReport) -> String {
    clawshield_render::render_text(report)
}

pub fn render_markdown(report: &AuditReport) -> String {
    clawshield_render::render_markdown(report)
}
