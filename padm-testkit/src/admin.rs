//! Invocation of the admin CLI under test.

use tracing::{debug, info};

use crate::cluster::Cluster;
use crate::error::HarnessResult;

/// Directory on the coordinator holding the admin tool's configuration.
pub const CONFIG_DIR: &str = "/etc/opt/prestoadmin";

/// Topology descriptor location read by the admin tool.
pub const CONFIG_PATH: &str = "/etc/opt/prestoadmin/config.json";

/// Directory the tool deploys packages to on every target host.
pub const PACKAGE_DEPLOY_DIR: &str = "/opt/prestoadmin/packages";

/// Runner for the admin binary on the coordinator.
pub struct AdminCli<'a> {
    cluster: &'a Cluster,
}

impl<'a> AdminCli<'a> {
    pub fn new(cluster: &'a Cluster) -> Self {
        Self { cluster }
    }

    /// Run the admin binary once with the given argument string, blocking
    /// until it exits.
    ///
    /// Returns the combined output on exit zero. A non-zero exit surfaces
    /// the captured diagnostic text (`Fatal error: ...`) inside the error,
    /// which is the only channel negative scenarios assert on.
    pub fn run(&self, args: &str) -> HarnessResult<String> {
        info!(args, "running admin command");
        let command = format!("{} {}", self.cluster.config().admin_binary, args);
        let output = self.cluster.exec(self.cluster.coordinator(), &command)?;
        debug!(bytes = output.len(), "admin command completed");
        Ok(output)
    }
}
