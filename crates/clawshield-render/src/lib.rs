//! Rendering for terminal and Markdown surfaces.
//!
//! JSON output is plain `serde_json` over `AuditReport` and lives in the app crate.

#![forbid(unsafe_code)]

mod markdown;
mod text;

pub use markdown::render_markdown;
pub use text::{NO_FACTS, NO_FINDINGS, render_text, render_value};
