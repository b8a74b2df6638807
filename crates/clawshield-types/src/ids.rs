//! Stable fact keys and source prefixes.
//!
//! Fact keys are dotted namespaces. Policies reference them by string, so
//! renaming one is a breaking change for every policy document.

// network / runtime
pub const FACT_NETWORK_BIND_ADDRESS: &str = "network.bind_address";
pub const FACT_RUNTIME_AUTH_ENABLED: &str = "runtime.auth_enabled";
pub const FACT_RUNTIME_AUTH_MODE: &str = "runtime.auth_mode";
pub const FACT_RUNTIME_AUTH_TOKEN_WEAK: &str = "runtime.auth_token_weak";

// tools / sandbox
pub const FACT_SANDBOX_ENABLED: &str = "sandbox.enabled";
pub const FACT_TOOLS_SHELL_ENABLED: &str = "tools.shell_enabled";
pub const FACT_BROWSER_ENABLED: &str = "browser.enabled";

// logging
pub const FACT_LOGGING_REDACTION_ENABLED: &str = "logging.redaction_enabled";
pub const FACT_LOGGING_FILE_LOGS_REDACTED: &str = "logging.file_logs_redacted";

// secrets
pub const FACT_SECRETS_ENV_FILE_PRESENT: &str = "secrets.env_file_present";
pub const FACT_SECRETS_API_KEY_IN_ENV_FILE: &str = "secrets.api_key_in_env_file";
pub const FACT_SECRETS_API_KEY_IN_CONFIG: &str = "secrets.api_key_in_config";

// files
pub const FACT_FILES_CONFIG_WORLD_WRITABLE: &str = "files.config_world_writable";
pub const FACT_FILES_ENV_WORLD_READABLE: &str = "files.env_world_readable";
pub const FACT_FILES_ENV_WORLD_WRITABLE: &str = "files.env_world_writable";

// containers
pub const FACT_DOCKER_USER: &str = "docker.user";
pub const FACT_DOCKER_PRIVILEGED: &str = "docker.privileged";

// Source prefixes (`<prefix>:<detail>`).
pub const SOURCE_OPENCLAW_CONFIG: &str = "openclaw_config";
pub const SOURCE_SECRETS_LITE: &str = "secrets_lite";
pub const SOURCE_FILE_PERMISSIONS: &str = "file_permissions";
pub const SOURCE_DOCKER_INSPECT: &str = "docker_inspect";

// Tool-level
pub const TOOL_NAME: &str = "clawshield";
