//! Running-container inspection through the `docker` CLI.
//!
//! The collector never fails the audit. A missing binary, a stopped daemon, a
//! timeout, or unreadable output all become one warning and no facts.

use crate::{Collector, CollectorOutput};
use camino::Utf8PathBuf;
use clawshield_types::{Fact, ids};
use serde::Deserialize;
use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const PS_TIMEOUT: Duration = Duration::from_secs(10);
pub const INSPECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Container names listed in a fact's source before truncating.
const SOURCE_NAME_LIMIT: usize = 5;
const POLL_INTERVAL: Duration = Duration::from_millis(25);
const STDERR_SNIPPET: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("docker binary not found")]
    BinaryNotFound,

    #[error("docker {command} failed ({detail})")]
    CommandFailed { command: &'static str, detail: String },

    #[error("docker command timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    #[error("OS error: {0}")]
    Io(#[from] std::io::Error),
}

/// What the collector needs from a container runtime.
pub trait ContainerRuntime {
    /// Ids of running containers (`docker ps -q`).
    fn running_container_ids(&self) -> Result<Vec<String>, RuntimeError>;

    /// Raw `docker inspect` JSON for `ids`.
    fn inspect(&self, ids: &[String]) -> Result<String, RuntimeError>;
}

impl<T: ContainerRuntime + ?Sized> ContainerRuntime for &T {
    fn running_container_ids(&self) -> Result<Vec<String>, RuntimeError> {
        (**self).running_container_ids()
    }

    fn inspect(&self, ids: &[String]) -> Result<String, RuntimeError> {
        (**self).inspect(ids)
    }
}

/// The real `docker` CLI.
#[derive(Clone, Debug)]
pub struct DockerCli {
    pub binary: String,
    pub ps_timeout: Duration,
    pub inspect_timeout: Duration,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self {
            binary: "docker".to_string(),
            ps_timeout: PS_TIMEOUT,
            inspect_timeout: INSPECT_TIMEOUT,
        }
    }
}

impl ContainerRuntime for DockerCli {
    fn running_container_ids(&self) -> Result<Vec<String>, RuntimeError> {
        let stdout = run_with_timeout(&self.binary, "ps", &["ps", "-q"], self.ps_timeout)?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn inspect(&self, ids: &[String]) -> Result<String, RuntimeError> {
        let mut args = vec!["inspect"];
        args.extend(ids.iter().map(String::as_str));
        run_with_timeout(&self.binary, "inspect", &args, self.inspect_timeout)
    }
}

/// Run `binary args...`, killing it if it outlives `timeout`.
///
/// Output pipes are drained on helper threads so a chatty child cannot block
/// on a full pipe while we poll.
fn run_with_timeout(
    binary: &str,
    command: &'static str,
    args: &[&str],
    timeout: Duration,
) -> Result<String, RuntimeError> {
    let mut child = Command::new(binary)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => RuntimeError::BinaryNotFound,
            _ => RuntimeError::Io(e),
        })?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(RuntimeError::TimedOut(timeout));
        }
        thread::sleep(POLL_INTERVAL);
    };

    let stdout = stdout.join().unwrap_or_default();
    let stderr = stderr.join().unwrap_or_default();

    if !status.success() {
        let detail: String = stderr.trim().chars().take(STDERR_SNIPPET).collect();
        return Err(RuntimeError::CommandFailed {
            command,
            detail: if detail.is_empty() {
                "non-zero exit".to_string()
            } else {
                detail
            },
        });
    }
    Ok(stdout)
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Collector over any [`ContainerRuntime`]; config paths are ignored.
#[derive(Clone, Debug, Default)]
pub struct DockerCollector<R = DockerCli> {
    runtime: R,
}

impl<R: ContainerRuntime> DockerCollector<R> {
    pub fn new(runtime: R) -> Self {
        Self { runtime }
    }

    pub fn scan(&self) -> CollectorOutput {
        let mut out = CollectorOutput::default();

        let ids = match self.runtime.running_container_ids() {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "container runtime unavailable");
                out.warnings
                    .push(format!("Docker: {e}; skipping container inspection"));
                return out;
            }
        };
        if ids.is_empty() {
            debug!("no running containers");
            return out;
        }

        let parsed = self
            .runtime
            .inspect(&ids)
            .map_err(|e| e.to_string())
            .and_then(|raw| parse_inspect_output(&raw).map_err(|e| format!("invalid JSON: {e}")));
        match parsed {
            Ok(facts) => out.facts = facts,
            Err(reason) => {
                warn!(%reason, containers = ids.len(), "docker inspect failed");
                out.warnings.push(format!(
                    "Failed to inspect running Docker containers: {reason}"
                ));
            }
        }
        out
    }
}

impl<R: ContainerRuntime> Collector for DockerCollector<R> {
    fn name(&self) -> &'static str {
        ids::SOURCE_DOCKER_INSPECT
    }

    fn collect(&self, _config_paths: &[Utf8PathBuf]) -> CollectorOutput {
        self.scan()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectedContainer {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    config: Option<ContainerConfig>,
    #[serde(default)]
    host_config: Option<HostConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerConfig {
    #[serde(default)]
    user: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HostConfig {
    #[serde(default)]
    privileged: Option<bool>,
}

impl InspectedContainer {
    fn display_name(&self) -> String {
        let id = self.id.as_deref().filter(|s| !s.is_empty()).unwrap_or("unknown");
        let name = match self.name.as_deref().filter(|s| !s.is_empty()) {
            Some(name) => name,
            None => id.get(..12).unwrap_or(id),
        };
        name.trim_start_matches('/').to_string()
    }

    /// Empty user, `root`, or uid 0 (with or without a group).
    fn runs_as_root(&self) -> bool {
        let user = self
            .config
            .as_ref()
            .and_then(|c| c.user.as_deref())
            .unwrap_or("")
            .trim();
        user.is_empty() || user == "root" || user.split(':').next() == Some("0")
    }

    fn privileged(&self) -> bool {
        self.host_config
            .as_ref()
            .and_then(|h| h.privileged)
            .unwrap_or(false)
    }
}

/// Facts from raw `docker inspect` JSON, judged across all containers.
///
/// `docker.user` is `root` when any container runs as root, `docker.privileged`
/// is true when any container is privileged. Each source lists the offending
/// containers, or all of them when none offend.
pub fn parse_inspect_output(raw: &str) -> Result<Vec<Fact>, serde_json::Error> {
    let containers: Vec<InspectedContainer> = serde_json::from_str(raw)?;
    Ok(facts_from_containers(&containers))
}

fn facts_from_containers(containers: &[InspectedContainer]) -> Vec<Fact> {
    if containers.is_empty() {
        return Vec::new();
    }

    let mut all = Vec::new();
    let mut root = Vec::new();
    let mut privileged = Vec::new();
    for c in containers {
        let name = c.display_name();
        if c.runs_as_root() {
            root.push(name.clone());
        }
        if c.privileged() {
            privileged.push(name.clone());
        }
        all.push(name);
    }

    vec![
        Fact::new(
            ids::FACT_DOCKER_USER,
            if root.is_empty() { "non-root" } else { "root" },
            source_for(if root.is_empty() { &all } else { &root }),
        ),
        Fact::new(
            ids::FACT_DOCKER_PRIVILEGED,
            !privileged.is_empty(),
            source_for(if privileged.is_empty() { &all } else { &privileged }),
        ),
    ]
}

fn source_for(names: &[String]) -> String {
    format!("{}:{}", ids::SOURCE_DOCKER_INSPECT, cap_names(names))
}

fn cap_names(names: &[String]) -> String {
    if names.len() <= SOURCE_NAME_LIMIT {
        return names.join(",");
    }
    format!(
        "{} (+{} more)",
        names[..SOURCE_NAME_LIMIT].join(","),
        names.len() - SOURCE_NAME_LIMIT
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn facts(containers: Value) -> Vec<Fact> {
        parse_inspect_output(&containers.to_string()).expect("parse")
    }

    fn value_of<'a>(facts: &'a [Fact], key: &str) -> &'a Value {
        &facts.iter().find(|f| f.key == key).expect("fact").value
    }

    fn source_of<'a>(facts: &'a [Fact], key: &str) -> &'a str {
        &facts.iter().find(|f| f.key == key).expect("fact").source
    }

    #[test]
    fn empty_user_is_root() {
        let f = facts(json!([{
            "Id": "abc123def456",
            "Name": "/openclaw",
            "Config": {"User": "", "Image": "openclaw:latest"},
            "HostConfig": {"Privileged": false},
        }]));
        assert_eq!(value_of(&f, "docker.user"), &json!("root"));
        assert_eq!(value_of(&f, "docker.privileged"), &json!(false));
    }

    #[test]
    fn explicit_root_and_uid_zero_are_root() {
        for user in ["root", "0", "0:0"] {
            let f = facts(json!([{"Id": "a", "Name": "/app", "Config": {"User": user}}]));
            assert_eq!(value_of(&f, "docker.user"), &json!("root"), "{user}");
        }
    }

    #[test]
    fn privileged_non_root_container() {
        let f = facts(json!([{
            "Id": "abc123",
            "Name": "/openclaw",
            "Config": {"User": "1000"},
            "HostConfig": {"Privileged": true},
        }]));
        assert_eq!(value_of(&f, "docker.user"), &json!("non-root"));
        assert_eq!(value_of(&f, "docker.privileged"), &json!(true));
    }

    #[test]
    fn worst_case_wins_and_source_names_offenders() {
        let f = facts(json!([
            {
                "Id": "safe111",
                "Name": "/safe-app",
                "Config": {"User": "1000"},
                "HostConfig": {"Privileged": false}
            },
            {
                "Id": "bad222",
                "Name": "/openclaw",
                "Config": {"User": ""},
                "HostConfig": {"Privileged": true}
            },
        ]));
        assert_eq!(value_of(&f, "docker.user"), &json!("root"));
        assert_eq!(value_of(&f, "docker.privileged"), &json!(true));
        assert_eq!(source_of(&f, "docker.user"), "docker_inspect:openclaw");
        assert_eq!(source_of(&f, "docker.privileged"), "docker_inspect:openclaw");
    }

    #[test]
    fn safe_hosts_list_every_container() {
        let f = facts(json!([
            {"Id": "a", "Name": "/one", "Config": {"User": "1000:1000"}},
            {"Id": "b", "Name": "/two", "Config": {"User": "app"}},
        ]));
        assert_eq!(source_of(&f, "docker.user"), "docker_inspect:one,two");
    }

    #[test]
    fn empty_inspect_yields_no_facts() {
        assert!(facts(json!([])).is_empty());
    }

    #[test]
    fn missing_name_falls_back_to_short_id() {
        let f = facts(json!([{"Id": "abcdef123456789", "Config": {"User": ""}}]));
        assert_eq!(source_of(&f, "docker.user"), "docker_inspect:abcdef123456");
    }

    #[test]
    fn missing_name_and_id_is_unknown() {
        let f = facts(json!([{"Config": {"User": ""}}]));
        assert!(source_of(&f, "docker.user").contains("unknown"));
        let f = facts(json!([{"Id": null, "Config": {"User": ""}}]));
        assert!(source_of(&f, "docker.user").contains("unknown"));
    }

    #[test]
    fn source_is_capped() {
        let containers: Vec<Value> = (0..12)
            .map(|i| {
                json!({
                    "Id": format!("id{i}"),
                    "Name": format!("/container-{i}"),
                    "Config": {"User": ""}
                })
            })
            .collect();
        let f = facts(Value::Array(containers));
        let source = source_of(&f, "docker.user");
        assert!(source.contains("+7 more"));
        assert!(source.contains("container-0"));
        assert!(source.contains("container-4"));
        assert!(!source.contains("container-5"));
    }

    struct FakeRuntime {
        ids: Result<Vec<String>, fn() -> RuntimeError>,
        inspect: Result<String, fn() -> RuntimeError>,
    }

    impl ContainerRuntime for FakeRuntime {
        fn running_container_ids(&self) -> Result<Vec<String>, RuntimeError> {
            self.ids.clone().map_err(|e| e())
        }

        fn inspect(&self, _ids: &[String]) -> Result<String, RuntimeError> {
            self.inspect.clone().map_err(|e| e())
        }
    }

    fn scan(runtime: FakeRuntime) -> CollectorOutput {
        DockerCollector::new(runtime).scan()
    }

    #[test]
    fn missing_binary_warns() {
        let out = scan(FakeRuntime {
            ids: Err(|| RuntimeError::BinaryNotFound),
            inspect: Ok(String::new()),
        });
        assert!(out.facts.is_empty());
        assert_eq!(
            out.warnings,
            vec!["Docker: docker binary not found; skipping container inspection"]
        );
    }

    #[test]
    fn daemon_down_warns_with_stderr() {
        let out = scan(FakeRuntime {
            ids: Err(|| RuntimeError::CommandFailed {
                command: "ps",
                detail: "Cannot connect to the Docker daemon".to_string(),
            }),
            inspect: Ok(String::new()),
        });
        assert!(out.facts.is_empty());
        assert!(out.warnings[0].contains("Cannot connect"));
    }

    #[test]
    fn timeout_warns() {
        let out = scan(FakeRuntime {
            ids: Err(|| RuntimeError::TimedOut(PS_TIMEOUT)),
            inspect: Ok(String::new()),
        });
        assert!(out.warnings[0].contains("timed out"));
    }

    #[test]
    fn no_containers_is_silent() {
        let out = scan(FakeRuntime {
            ids: Ok(Vec::new()),
            inspect: Err(|| RuntimeError::BinaryNotFound),
        });
        assert_eq!(out, CollectorOutput::default());
    }

    #[test]
    fn inspect_failure_and_bad_json_warn() {
        let failed = scan(FakeRuntime {
            ids: Ok(vec!["abc123".to_string()]),
            inspect: Err(|| RuntimeError::CommandFailed {
                command: "inspect",
                detail: "non-zero exit".to_string(),
            }),
        });
        assert!(failed.facts.is_empty());
        assert!(failed.warnings[0].starts_with("Failed to inspect"));

        let garbage = scan(FakeRuntime {
            ids: Ok(vec!["abc123".to_string()]),
            inspect: Ok("not json".to_string()),
        });
        assert!(garbage.facts.is_empty());
        assert!(garbage.warnings[0].contains("invalid JSON"));
    }

    #[test]
    fn inspect_success_yields_facts() {
        let inspect = json!([{"Id": "abc123", "Name": "/oc", "Config": {"User": "1000"}}]);
        let out = scan(FakeRuntime {
            ids: Ok(vec!["abc123".to_string()]),
            inspect: Ok(inspect.to_string()),
        });
        assert!(out.warnings.is_empty());
        assert_eq!(out.facts.len(), 2);
    }

    #[test]
    fn missing_binary_is_detected_by_cli_runtime() {
        let cli = DockerCli {
            binary: "clawshield-no-such-docker-binary".to_string(),
            ..DockerCli::default()
        };
        assert!(matches!(
            cli.running_container_ids(),
            Err(RuntimeError::BinaryNotFound)
        ));
    }
}
