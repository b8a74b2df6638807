use camino::Utf8PathBuf;

/// Why a policy document could not become a `RuleSet`.
///
/// Loading is all-or-nothing: any of these means no engine was built.
#[derive(Debug, thiserror::Error)]
pub enum PolicyLoadError {
    #[error("policy file not found: {path}")]
    NotFound { path: Utf8PathBuf },

    #[error("failed to read policy file {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{origin}: invalid YAML: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{origin}: expected a YAML mapping at top level")]
    NotAMapping { origin: String },

    #[error("{origin}: 'rules' must be a list")]
    RulesNotAList { origin: String },

    #[error("{origin}: policy validation failed:\n  {}", .errors.join("\n  "))]
    Invalid { origin: String, errors: Vec<String> },

    #[error("unknown builtin policy '{name}' (available: {})", .available.join(", "))]
    UnknownBuiltin {
        name: String,
        available: Vec<&'static str>,
    },
}

impl PolicyLoadError {
    /// Individual validation problems, one per line of the aggregated message.
    ///
    /// Structural failures that stop loading before rule validation report a
    /// single entry.
    pub fn problems(&self) -> Vec<String> {
        match self {
            PolicyLoadError::Invalid { errors, .. } => errors.clone(),
            other => vec![other.to_string()],
        }
    }
}
