use clawshield_types::AuditReport;
use serde_json::Value;

pub const NO_FACTS: &str = "No facts collected from configuration.";
pub const NO_FINDINGS: &str = "Audit complete. No issues found for the checks performed.";

/// Plain-text report for a terminal.
///
/// Warnings are not included; the caller prints them to stderr.
pub fn render_text(report: &AuditReport) -> String {
    if report.facts.is_empty() {
        return format!("{NO_FACTS}\n");
    }
    if report.findings.is_empty() {
        return format!("{NO_FINDINGS}\n");
    }

    let mut out = String::new();
    for f in &report.findings {
        out.push_str(&format!(
            "[{}] {}: {}\n",
            f.severity.as_str().to_ascii_uppercase(),
            f.rule_id,
            f.title
        ));
        for ev in &f.evidence {
            out.push_str(&format!(
                "  - {} = {}  ({})\n",
                ev.key,
                render_value(&ev.value),
                ev.source
            ));
        }
        if !f.recommended_actions.is_empty() {
            out.push_str(&format!(
                "  recommended: {}\n",
                f.recommended_actions.join(", ")
            ));
        }
        if f.autofix_available {
            out.push_str("  autofix: available\n");
        }
        out.push('\n');
    }
    out
}

/// Strings bare, everything else as compact JSON.
pub fn render_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
