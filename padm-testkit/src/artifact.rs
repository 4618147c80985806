//! Installable package artifacts and the staging conventions around them.

use std::path::Path;

use tracing::info;

use crate::cluster::{Cluster, SHARED_MOUNT};
use crate::error::{HarnessError, HarnessResult};

/// File name of the server RPM the suite installs.
pub const SERVER_RPM: &str = "presto-0.101-1.0.x86_64.rpm";

/// An RPM artifact identified by its file name.
///
/// The name without its `.rpm` suffix is exactly what `rpm -q` prints for
/// the installed package, and the segment before the version is the
/// package name to query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpmArtifact {
    file_name: String,
}

impl RpmArtifact {
    pub fn new(file_name: impl Into<String>) -> HarnessResult<Self> {
        let file_name = file_name.into();
        if !file_name.ends_with(".rpm") || file_name.len() == ".rpm".len() {
            return Err(HarnessError::InvalidArtifact(file_name));
        }
        Ok(Self { file_name })
    }

    /// The pinned server release the product suite installs.
    pub fn server() -> Self {
        Self {
            file_name: SERVER_RPM.to_string(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// File name without the `.rpm` suffix.
    pub fn base_name(&self) -> &str {
        self.file_name
            .strip_suffix(".rpm")
            .unwrap_or(&self.file_name)
    }

    /// Package name as understood by `rpm -q`.
    pub fn package_name(&self) -> &str {
        let base = self.base_name();
        match base.find('-') {
            Some(index) => &base[..index],
            None => base,
        }
    }

    /// Exact package-query output for the installed artifact.
    pub fn query_output(&self) -> String {
        format!("{}\n", self.base_name())
    }

    /// Path the artifact is visible at inside every container once staged.
    pub fn staged_path(&self) -> String {
        format!("{SHARED_MOUNT}/{}", self.file_name)
    }

    /// Copy the artifact from `source_dir` on the test host into the
    /// cluster's shared mount.
    pub fn stage_from(&self, cluster: &Cluster, source_dir: &Path) -> HarnessResult<String> {
        let source = source_dir.join(&self.file_name);
        if !source.is_file() {
            return Err(HarnessError::InvalidArtifact(format!(
                "{} not found",
                source.display()
            )));
        }
        let staged = cluster.stage_file(&source)?;
        info!(artifact = %self.file_name, staged, "artifact staged");
        Ok(staged)
    }
}
