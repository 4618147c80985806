//! Cluster topology descriptor consumed by the admin tool.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::info;

use crate::admin;
use crate::cluster::Cluster;
use crate::error::HarnessResult;

/// Role-to-host mapping uploaded to the coordinator before every admin
/// invocation. Written once per scenario and never mutated afterward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub username: String,
    pub port: u16,
    pub coordinator: String,
    pub workers: Vec<String>,
}

impl Topology {
    /// The fixed suite layout: one coordinator and three workers.
    pub fn standard() -> Self {
        Self {
            username: "root".to_string(),
            port: 22,
            coordinator: "master".to_string(),
            workers: vec![
                "slave1".to_string(),
                "slave2".to_string(),
                "slave3".to_string(),
            ],
        }
    }

    /// Topology describing the hosts of a provisioned cluster.
    pub fn for_cluster(cluster: &Cluster) -> Self {
        Self {
            username: "root".to_string(),
            port: 22,
            coordinator: cluster.coordinator().to_string(),
            workers: cluster.workers().to_vec(),
        }
    }

    /// JSON rendering in the shape the admin tool reads.
    pub fn to_json(&self) -> HarnessResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the descriptor to [`admin::CONFIG_PATH`] on the coordinator.
    pub fn upload(&self, cluster: &Cluster) -> HarnessResult<()> {
        let staged = cluster.write_shared("config.json", &self.to_json()?)?;
        let quoted = shell_escape::escape(Cow::from(staged));
        cluster.exec(
            cluster.coordinator(),
            &format!(
                "mkdir -p {} && cp {} {}",
                admin::CONFIG_DIR,
                quoted,
                admin::CONFIG_PATH
            ),
        )?;
        info!(coordinator = cluster.coordinator(), "topology uploaded");
        Ok(())
    }
}
