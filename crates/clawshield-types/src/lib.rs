//! Stable DTOs and IDs used across the clawshield workspace.
//!
//! This crate is intentionally boring:
//! - the `Fact` records collectors emit and the policy engine consumes
//! - the `Finding` / `EvalResult` records the engine produces
//! - the JSON report envelope
//! - stable fact keys and schema identifiers

#![forbid(unsafe_code)]

pub mod ids;
pub mod receipt;

pub use receipt::{
    AuditReport, Confidence, EvalResult, Fact, Finding, ReportMeta, SCHEMA_VERSION, Severity,
    UnknownLevel,
};
