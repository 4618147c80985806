//! Scenario fixtures: admin tool installation, topology upload, artifact
//! staging, and literal expected-output resources.

use std::borrow::Cow;
use std::path::PathBuf;

use tracing::info;

use crate::artifact::RpmArtifact;
use crate::cluster::Cluster;
use crate::error::HarnessResult;
use crate::topology::Topology;

/// Install the admin tool on the coordinator from the configured installer
/// tarball.
pub fn install_admin(cluster: &Cluster) -> HarnessResult<()> {
    let staged = cluster.stage_file(&cluster.config().admin_installer)?;
    let quoted = shell_escape::escape(Cow::from(staged));
    cluster.exec(
        cluster.coordinator(),
        &format!(
            "mkdir -p /opt/prestoadmin && tar xzf {quoted} -C /opt/prestoadmin --strip-components=1 && /opt/prestoadmin/install-prestoadmin.sh"
        ),
    )?;
    info!("admin tool installed on coordinator");
    Ok(())
}

/// Upload the topology for the provisioned cluster.
pub fn upload_topology(cluster: &Cluster) -> HarnessResult<()> {
    Topology::for_cluster(cluster).upload(cluster)
}

/// Stage the server RPM from the configured artifact directory into the
/// shared mount.
pub fn stage_server_rpm(cluster: &Cluster) -> HarnessResult<RpmArtifact> {
    let artifact = RpmArtifact::server();
    artifact.stage_from(cluster, &cluster.config().rpm_dir)?;
    Ok(artifact)
}

/// Directory holding literal expected-output resources for the product
/// suite.
pub fn resources_dir() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .map(|root| root.to_path_buf())
        .unwrap_or(manifest_dir)
        .join("tests")
        .join("product")
        .join("resources")
}

/// Load a resource file verbatim.
pub fn load_resource(name: &str) -> HarnessResult<String> {
    Ok(std::fs::read_to_string(resources_dir().join(name))?)
}
