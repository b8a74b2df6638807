//! OpenClaw configuration discovery.
//!
//! Pure: callers pass the explicit path, the `OPENCLAW_CONFIG` value, the home
//! directory, and an existence check. Nothing here reads the environment.

use camino::{Utf8Path, Utf8PathBuf};

/// Environment variable consulted after an explicit path.
pub const ENV_OVERRIDE: &str = "OPENCLAW_CONFIG";

/// Ordered candidate list, most specific first.
///
/// 1. the explicit path
/// 2. `$OPENCLAW_CONFIG`
/// 3. `~/.openclaw/openclaw.json`
/// 4. `/etc/openclaw/config.yaml`
/// 5. `~/.openclaw/config.yaml`
/// 6. `openclaw.yaml` in the working directory
pub fn default_candidates(
    explicit: Option<&Utf8Path>,
    env_override: Option<&str>,
    home: Option<&Utf8Path>,
) -> Vec<Utf8PathBuf> {
    let mut out = Vec::new();
    if let Some(path) = explicit {
        out.push(path.to_path_buf());
    }
    if let Some(raw) = env_override.map(str::trim).filter(|s| !s.is_empty()) {
        out.push(Utf8PathBuf::from(raw));
    }
    if let Some(home) = home {
        out.push(home.join(".openclaw").join("openclaw.json"));
    }
    out.push(Utf8PathBuf::from("/etc/openclaw/config.yaml"));
    if let Some(home) = home {
        out.push(home.join(".openclaw").join("config.yaml"));
    }
    out.push(Utf8PathBuf::from("openclaw.yaml"));
    out
}

/// First candidate for which `exists` holds.
pub fn resolve_first(
    candidates: &[Utf8PathBuf],
    mut exists: impl FnMut(&Utf8Path) -> bool,
) -> Option<Utf8PathBuf> {
    candidates.iter().find(|p| exists(p)).cloned()
}
