use crate::text::render_value;
use clawshield_types::{AuditReport, Severity};

pub fn render_markdown(report: &AuditReport) -> String {
    let mut out = String::new();

    out.push_str("# Clawshield audit report\n\n");
    out.push_str(&format!(
        "- Policy: `{}`\n- Tool version: {}\n- Facts collected: {}\n- Findings: {}\n",
        report.meta.policy_path,
        report.meta.tool_version,
        report.facts.len(),
        report.findings.len()
    ));

    let counts: Vec<String> = Severity::ALL
        .iter()
        .rev()
        .filter_map(|sev| {
            let n = report.findings.iter().filter(|f| f.severity == *sev).count();
            (n > 0).then(|| format!("{n} {sev}"))
        })
        .collect();
    if !counts.is_empty() {
        out.push_str(&format!("- By severity: {}\n", counts.join(", ")));
    }
    out.push('\n');

    if !report.warnings().is_empty() {
        out.push_str("## Warnings\n\n");
        for w in report.warnings() {
            out.push_str(&format!("- {w}\n"));
        }
        out.push('\n');
    }

    if report.findings.is_empty() {
        out.push_str("No findings.\n");
        return out;
    }

    out.push_str("## Findings\n\n");
    for f in &report.findings {
        out.push_str(&format!(
            "### [{}] `{}` {}\n\n",
            f.severity.as_str().to_ascii_uppercase(),
            f.rule_id,
            f.title
        ));
        out.push_str(&format!("- Confidence: {}\n", f.confidence));
        for ev in &f.evidence {
            out.push_str(&format!(
                "- Evidence: `{}` = `{}` ({})\n",
                ev.key,
                render_value(&ev.value),
                ev.source
            ));
        }
        if !f.recommended_actions.is_empty() {
            let actions: Vec<String> = f
                .recommended_actions
                .iter()
                .map(|a| format!("`{a}`"))
                .collect();
            out.push_str(&format!("- Recommended: {}\n", actions.join(", ")));
        }
        if f.autofix_available {
            out.push_str("- Autofix: available\n");
        }
        out.push('\n');
    }

    out
}
