//! Policies compiled into the binary.

/// Policy used when no `--policy` or `policy =` setting is given.
pub const DEFAULT: &str = "vps_public";

const BUILTINS: &[(&str, &str)] = &[(
    "vps_public",
    include_str!("../policies/vps_public.yaml"),
)];

pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|(name, _)| *name)
}

/// Document text for a bundled policy. Accepts `vps_public` or `vps_public.yaml`.
pub fn source(name: &str) -> Option<&'static str> {
    let name = name.strip_suffix(".yaml").unwrap_or(name);
    BUILTINS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, text)| *text)
}

/// The `policy_path` label reported for a bundled policy.
pub fn origin(name: &str) -> String {
    let name = name.strip_suffix(".yaml").unwrap_or(name);
    format!("builtin:{name}.yaml")
}
