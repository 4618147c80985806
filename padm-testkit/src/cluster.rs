//! Container runtime adapter for the product test cluster.
//!
//! Provisions the fixed container set (one coordinator, three workers) on a
//! dedicated Docker network, executes shell commands inside the containers,
//! and tears everything down again. Docker is driven through its CLI; every
//! call is a single synchronous subprocess with a bounded runtime.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::{HarnessError, HarnessResult};

/// Mount point inside every container for files staged from the test host.
pub const SHARED_MOUNT: &str = "/mnt/presto-admin";

/// Role a host plays in the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostRole {
    Coordinator,
    Worker,
}

/// A fixed cluster host. The container name doubles as the network alias
/// the admin tool resolves topology entries by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    pub name: String,
    pub role: HostRole,
}

impl Host {
    pub fn coordinator(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: HostRole::Coordinator,
        }
    }

    pub fn worker(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: HostRole::Worker,
        }
    }

    pub fn is_coordinator(&self) -> bool {
        self.role == HostRole::Coordinator
    }
}

/// Configuration for provisioning the test cluster.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Base image for every container. The image must start sshd in the
    /// foreground and carry `rpm` plus the JDK prerequisite preinstalled.
    pub image: String,
    /// Docker network the containers join.
    pub network: String,
    /// Coordinator container name.
    pub coordinator: String,
    /// Worker container names.
    pub workers: Vec<String>,
    /// Host directory bind-mounted at [`SHARED_MOUNT`] in every container.
    /// Created under the system temp directory when `None`.
    pub shared_dir: Option<PathBuf>,
    /// Path of the admin binary inside the coordinator.
    pub admin_binary: String,
    /// Host path of the admin tool installer tarball.
    pub admin_installer: PathBuf,
    /// Host directory holding the server RPM to stage.
    pub rpm_dir: PathBuf,
    /// Upper bound for any single `docker` invocation.
    pub exec_timeout: Duration,
    /// Skip teardown on drop, leaving the containers behind for inspection.
    pub keep_cluster: bool,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        let env_path = |key: &str| std::env::var(key).ok().map(PathBuf::from);

        Self {
            image: std::env::var("PADM_E2E_IMAGE")
                .unwrap_or_else(|_| "prestodb-testing/centos6-cluster".to_string()),
            network: "presto-admin-test".to_string(),
            coordinator: "master".to_string(),
            workers: vec![
                "slave1".to_string(),
                "slave2".to_string(),
                "slave3".to_string(),
            ],
            shared_dir: env_path("PADM_E2E_SHARED_DIR"),
            admin_binary: "/opt/prestoadmin/presto-admin".to_string(),
            admin_installer: env_path("PADM_E2E_ADMIN_INSTALLER")
                .unwrap_or_else(|| PathBuf::from("prestoadmin-installer.tar.gz")),
            rpm_dir: env_path("PADM_E2E_RPM_DIR").unwrap_or_else(|| PathBuf::from(".")),
            exec_timeout: Duration::from_secs(180),
            keep_cluster: std::env::var("PADM_E2E_KEEP_CLUSTER")
                .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }
}

/// Result of one subprocess invocation.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout followed by stderr, with nothing inserted between them.
    /// Assertions compare this against exact expected text.
    pub fn combined(&self) -> String {
        let mut output = String::with_capacity(self.stdout.len() + self.stderr.len());
        output.push_str(&self.stdout);
        output.push_str(&self.stderr);
        output
    }
}

/// The provisioned container set.
///
/// Dropping the cluster tears it down unless
/// [`ClusterConfig::keep_cluster`] is set.
pub struct Cluster {
    config: ClusterConfig,
    hosts: Vec<Host>,
    shared_dir: PathBuf,
    torn_down: bool,
}

impl Cluster {
    /// Create the network and all containers, removing leftovers from an
    /// aborted run first.
    pub fn provision(config: ClusterConfig) -> HarnessResult<Self> {
        let shared_dir = match &config.shared_dir {
            Some(dir) => dir.clone(),
            None => std::env::temp_dir().join(format!(
                "padm_product_{}",
                chrono::Utc::now().format("%Y%m%d_%H%M%S_%3f")
            )),
        };
        let mut cluster = Self::attach(config, shared_dir)?;
        cluster.remove_leftovers();

        info!(network = %cluster.config.network, "creating cluster network");
        let created = cluster.docker(&["network", "create", &cluster.config.network])?;
        if !created.success() {
            return Err(HarnessError::ProvisionFailed(format!(
                "network create failed: {}",
                created.combined().trim()
            )));
        }

        for host in cluster.host_names() {
            if let Err(error) = cluster.start_container(&host) {
                cluster.teardown();
                return Err(error);
            }
        }

        Ok(cluster)
    }

    /// Attach to an already-provisioned container set, e.g. one kept
    /// alive with `PADM_E2E_KEEP_CLUSTER=1`, without creating anything.
    pub fn attach(config: ClusterConfig, shared_dir: PathBuf) -> HarnessResult<Self> {
        std::fs::create_dir_all(&shared_dir)?;
        let hosts = std::iter::once(Host::coordinator(config.coordinator.as_str()))
            .chain(config.workers.iter().map(|name| Host::worker(name.as_str())))
            .collect();
        Ok(Self {
            config,
            hosts,
            shared_dir,
            torn_down: false,
        })
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    pub fn coordinator(&self) -> &str {
        &self.config.coordinator
    }

    pub fn workers(&self) -> &[String] {
        &self.config.workers
    }

    /// All host names, coordinator first.
    pub fn all_hosts(&self) -> Vec<&str> {
        self.hosts.iter().map(|host| host.name.as_str()).collect()
    }

    /// Host-side directory backing [`SHARED_MOUNT`].
    pub fn shared_dir(&self) -> &Path {
        &self.shared_dir
    }

    /// Run a shell command inside `host` and return its combined output.
    ///
    /// A non-zero exit becomes [`HarnessError::CommandFailed`] carrying the
    /// combined output. Exactly one attempt; no retry.
    pub fn exec(&self, host: &str, command: &str) -> HarnessResult<String> {
        debug!(host, command, "exec in container");
        let result = self.docker(exec_args(host, command))?;
        if result.success() {
            Ok(result.combined())
        } else {
            Err(HarnessError::CommandFailed {
                command: format!("[{host}] {command}"),
                exit_code: result.exit_code,
                output: result.combined(),
            })
        }
    }

    /// Copy a file from the test host into the shared mount and return the
    /// path it is visible at inside every container.
    pub fn stage_file(&self, source: &Path) -> HarnessResult<String> {
        let name = source
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                HarnessError::InvalidArtifact(format!("not a stageable file: {}", source.display()))
            })?;
        std::fs::copy(source, self.shared_dir.join(name))?;
        debug!(source = %source.display(), name, "file staged into shared mount");
        Ok(format!("{SHARED_MOUNT}/{name}"))
    }

    /// Write `contents` into the shared mount under `name` and return the
    /// container-side path.
    pub fn write_shared(&self, name: &str, contents: &str) -> HarnessResult<String> {
        std::fs::write(self.shared_dir.join(name), contents)?;
        Ok(format!("{SHARED_MOUNT}/{name}"))
    }

    /// Force-remove the containers, the network, and the staging directory.
    ///
    /// Idempotent; failures are logged rather than propagated since callers
    /// run this on already-failing paths.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        for host in self.host_names() {
            match self.docker(remove_container_args(&host)) {
                Ok(result) if result.success() => debug!(host = %host, "container removed"),
                Ok(result) => {
                    warn!(host = %host, output = %result.combined().trim(), "container removal failed")
                }
                Err(error) => warn!(host = %host, %error, "container removal failed"),
            }
        }
        match self.docker(&["network", "rm", &self.config.network]) {
            Ok(result) if result.success() => debug!("network removed"),
            Ok(result) => warn!(output = %result.combined().trim(), "network removal failed"),
            Err(error) => warn!(%error, "network removal failed"),
        }
        if let Err(error) = std::fs::remove_dir_all(&self.shared_dir) {
            warn!(%error, dir = %self.shared_dir.display(), "failed to remove staging directory");
        }
    }

    fn host_names(&self) -> Vec<String> {
        self.hosts.iter().map(|host| host.name.clone()).collect()
    }

    fn start_container(&self, host: &str) -> HarnessResult<()> {
        info!(host, image = %self.config.image, "starting container");
        let mount = format!("{}:{}", self.shared_dir.display(), SHARED_MOUNT);
        let run = self.docker(run_container_args(
            host,
            &self.config.network,
            &self.config.image,
            &mount,
        ))?;
        if run.success() {
            Ok(())
        } else {
            Err(HarnessError::ProvisionFailed(format!(
                "container {host} failed to start: {}",
                run.combined().trim()
            )))
        }
    }

    /// Best-effort cleanup of containers and network left by an aborted
    /// earlier run. Removal failures here are expected and ignored.
    fn remove_leftovers(&self) {
        for host in self.host_names() {
            let _ = self.docker(remove_container_args(&host));
        }
        let _ = self.docker(&["network", "rm", &self.config.network]);
    }

    fn docker<I, S>(&self, args: I) -> HarnessResult<CommandResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args
            .into_iter()
            .map(|arg| arg.as_ref().to_string())
            .collect();
        run_once("docker", &args, self.config.exec_timeout)
    }
}

impl Drop for Cluster {
    fn drop(&mut self) {
        if self.config.keep_cluster {
            info!(shared_dir = %self.shared_dir.display(), "keeping cluster for inspection");
            return;
        }
        self.teardown();
    }
}

/// `docker run` arguments for one cluster container. The container name is
/// also its hostname and network alias, so topology entries resolve by
/// name.
fn run_container_args(host: &str, network: &str, image: &str, mount: &str) -> Vec<String> {
    [
        "run",
        "-d",
        "--name",
        host,
        "--hostname",
        host,
        "--network",
        network,
        "--network-alias",
        host,
        "-v",
        mount,
        image,
    ]
    .map(String::from)
    .to_vec()
}

/// `docker exec` arguments running a shell command inside a container.
fn exec_args(host: &str, command: &str) -> Vec<String> {
    ["exec", host, "sh", "-c", command].map(String::from).to_vec()
}

/// `docker rm` arguments force-removing a container by name.
fn remove_container_args(host: &str) -> Vec<String> {
    ["rm", "-f", host].map(String::from).to_vec()
}

/// Run one subprocess to completion, draining its output off-thread while
/// the deadline is enforced.
///
/// A child still running at the deadline is killed and surfaced as
/// [`HarnessError::TimedOut`]; there is no second attempt.
fn run_once(program: &str, args: &[String], timeout: Duration) -> HarnessResult<CommandResult> {
    let started = Instant::now();

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    match wait_with_deadline(&mut child, started + timeout)? {
        Some(status) => Ok(CommandResult {
            exit_code: status.code().unwrap_or(-1),
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
            duration: started.elapsed(),
        }),
        None => Err(HarnessError::TimedOut {
            command: format!("{program} {}", args.join(" ")),
            timeout,
        }),
    }
}

/// Wait for the child to exit, killing it once `deadline` passes.
///
/// Polling backs off from 5ms to 250ms, so short commands return almost
/// immediately without spinning through long ones. `None` means the child
/// had to be killed.
fn wait_with_deadline(child: &mut Child, deadline: Instant) -> std::io::Result<Option<ExitStatus>> {
    let mut pause = Duration::from_millis(5);
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            child.kill()?;
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(pause);
        pause = (pause * 2).min(Duration::from_millis(250));
    }
}

/// Collect a captured stream to a lossy string on its own thread, so a
/// chatty command cannot fill the pipe buffer and stall the wait.
fn drain<R: Read + Send + 'static>(stream: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let Some(mut stream) = stream else {
            return String::new();
        };
        let mut bytes = Vec::new();
        match stream.read_to_end(&mut bytes) {
            Ok(_) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(_) => String::new(),
        }
    })
}
