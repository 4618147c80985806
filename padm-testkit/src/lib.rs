//! Harness for the presto-admin product test suite.
//!
//! Provisions a containerized cluster (coordinator `master`, workers
//! `slave1..slave3`), uploads the topology descriptor the admin tool
//! reads, stages RPM artifacts into a mount shared with every container,
//! drives the `presto-admin` CLI inside the coordinator, and asserts
//! per-host package state.
//!
//! The containerized scenarios live under `tests/product` at the
//! workspace root and are gated behind the `product-e2e` feature; see
//! that suite for the required environment.

pub mod admin;
pub mod artifact;
pub mod assertions;
pub mod cluster;
pub mod error;
pub mod fixtures;
pub mod logging;
pub mod topology;

pub use admin::AdminCli;
pub use artifact::RpmArtifact;
pub use cluster::{Cluster, ClusterConfig, CommandResult, Host, HostRole};
pub use error::{HarnessError, HarnessResult};
pub use topology::Topology;
