use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeSet;

/// Directory holding `config`, `.` for a bare file name.
pub(crate) fn config_dir(config: &Utf8Path) -> Utf8PathBuf {
    match config.parent() {
        Some(dir) if !dir.as_str().is_empty() => dir.to_path_buf(),
        _ => Utf8PathBuf::from("."),
    }
}

/// `(config, Some(env_path))` for the first config seen in each directory,
/// `(config, None)` for the rest.
pub(crate) fn with_env_once(configs: &[Utf8PathBuf]) -> Vec<(&Utf8Path, Option<Utf8PathBuf>)> {
    let mut seen = BTreeSet::new();
    configs
        .iter()
        .map(|config| {
            let dir = config_dir(config);
            let env = seen.insert(dir.clone()).then(|| dir.join(".env"));
            (config.as_path(), env)
        })
        .collect()
}
