//! Use case orchestration for clawshield.
//!
//! This crate coordinates the settings, collector, policy, and render layers.
//! It is intentionally thin; the CLI crate depends on it and only handles
//! argument parsing and I/O.

#![forbid(unsafe_code)]

mod audit;
mod explain;
mod policy;
mod render;
mod settings;

pub use audit::{AuditInput, AuditOutput, TOOL_VERSION, exit_code, run_audit};
pub use explain::{ExplainOutput, format_explanation, format_not_found, run_explain};
pub use policy::{CheckPolicyOutput, load_policy, run_check_policy};
pub use render::{render_markdown, render_text, serialize_report};
pub use settings::resolve_settings;
