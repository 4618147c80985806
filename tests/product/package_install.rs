//! Product tests for `package install`.
//!
//! Each scenario provisions a fresh containerized cluster (coordinator
//! `master`, workers `slave1..slave3`), installs the admin tool, uploads
//! the topology, stages the server RPM into the shared mount, runs one
//! `presto-admin` command, and asserts per-host package state.
//!
//! # Running the suite
//!
//! ```bash
//! PADM_E2E_RPM_DIR=/path/to/artifacts \
//! PADM_E2E_ADMIN_INSTALLER=/path/to/prestoadmin-installer.tar.gz \
//! cargo test --features product-e2e --test product_install
//! ```
//!
//! Requires a local Docker daemon and the cluster base image (override
//! with `PADM_E2E_IMAGE`). The scenarios share the fixed container names
//! and therefore run serially. Set `PADM_E2E_KEEP_CLUSTER=1` to keep a
//! failing scenario's containers around for inspection.

use padm_testkit::RpmArtifact;
use padm_testkit::admin::{AdminCli, CONFIG_PATH, PACKAGE_DEPLOY_DIR};
use padm_testkit::assertions::{
    assert_contains, assert_eq_ignoring_order, assert_err_matches, assert_installed,
    assert_uninstalled,
};
use padm_testkit::cluster::{Cluster, ClusterConfig};
use padm_testkit::fixtures::{install_admin, load_resource, stage_server_rpm, upload_topology};
use padm_testkit::logging::init_test_logging;
use padm_testkit::test_log;
use serial_test::serial;

/// Provision the cluster and run the common setup every scenario needs:
/// admin tool installed on the coordinator, topology uploaded.
fn provisioned_cluster() -> Cluster {
    init_test_logging();
    let cluster = Cluster::provision(ClusterConfig::default()).expect("provision cluster");
    install_admin(&cluster).expect("install admin tool");
    upload_topology(&cluster).expect("upload topology");
    cluster
}

fn install_command(rpm: &RpmArtifact) -> String {
    format!("package install {}", rpm.staged_path())
}

#[test]
#[serial]
fn install_on_all_hosts() {
    let cluster = provisioned_cluster();
    let rpm = stage_server_rpm(&cluster).expect("stage server rpm");
    test_log!("installing on all hosts");

    AdminCli::new(&cluster)
        .run(&install_command(&rpm))
        .expect("package install should succeed");

    for host in cluster.all_hosts() {
        assert_installed(&cluster, host, &rpm);
    }
}

#[test]
#[serial]
fn install_on_coordinator_only() {
    let cluster = provisioned_cluster();
    let rpm = stage_server_rpm(&cluster).expect("stage server rpm");

    AdminCli::new(&cluster)
        .run(&format!("{} -H master", install_command(&rpm)))
        .expect("package install should succeed");

    assert_installed(&cluster, "master", &rpm);
    for worker in cluster.workers() {
        assert_uninstalled(&cluster, worker, &rpm);
    }
}

#[test]
#[serial]
fn install_on_single_worker() {
    let cluster = provisioned_cluster();
    let rpm = stage_server_rpm(&cluster).expect("stage server rpm");

    AdminCli::new(&cluster)
        .run(&format!("{} -H slave1", install_command(&rpm)))
        .expect("package install should succeed");

    assert_installed(&cluster, "slave1", &rpm);
    assert_uninstalled(&cluster, "master", &rpm);
    assert_uninstalled(&cluster, "slave2", &rpm);
    assert_uninstalled(&cluster, "slave3", &rpm);
}

#[test]
#[serial]
fn install_on_worker_pair() {
    let cluster = provisioned_cluster();
    let rpm = stage_server_rpm(&cluster).expect("stage server rpm");

    AdminCli::new(&cluster)
        .run(&format!("{} -H slave1,slave2", install_command(&rpm)))
        .expect("package install should succeed");

    assert_installed(&cluster, "slave1", &rpm);
    assert_installed(&cluster, "slave2", &rpm);
    assert_uninstalled(&cluster, "master", &rpm);
    assert_uninstalled(&cluster, "slave3", &rpm);
}

#[test]
#[serial]
fn install_excluding_coordinator() {
    let cluster = provisioned_cluster();
    let rpm = stage_server_rpm(&cluster).expect("stage server rpm");

    AdminCli::new(&cluster)
        .run(&format!("{} -x master", install_command(&rpm)))
        .expect("package install should succeed");

    assert_uninstalled(&cluster, "master", &rpm);
    for worker in cluster.workers() {
        assert_installed(&cluster, worker, &rpm);
    }
}

#[test]
#[serial]
fn install_excluding_single_worker() {
    let cluster = provisioned_cluster();
    let rpm = stage_server_rpm(&cluster).expect("stage server rpm");

    AdminCli::new(&cluster)
        .run(&format!("{} -x slave1", install_command(&rpm)))
        .expect("package install should succeed");

    assert_uninstalled(&cluster, "slave1", &rpm);
    assert_installed(&cluster, "master", &rpm);
    assert_installed(&cluster, "slave2", &rpm);
    assert_installed(&cluster, "slave3", &rpm);
}

#[test]
#[serial]
fn install_excluding_worker_pair() {
    let cluster = provisioned_cluster();
    let rpm = stage_server_rpm(&cluster).expect("stage server rpm");

    AdminCli::new(&cluster)
        .run(&format!("{} -x slave1,slave2", install_command(&rpm)))
        .expect("package install should succeed");

    assert_uninstalled(&cluster, "slave1", &rpm);
    assert_uninstalled(&cluster, "slave2", &rpm);
    assert_installed(&cluster, "master", &rpm);
    assert_installed(&cluster, "slave3", &rpm);
}

#[test]
#[serial]
fn install_with_invalid_artifact_path() {
    let cluster = provisioned_cluster();
    stage_server_rpm(&cluster).expect("stage server rpm");

    assert_err_matches(
        "Fatal error: error: /mnt/presto-admin/invalid-path/presto.rpm: open failed: No such file or directory",
        AdminCli::new(&cluster).run("package install /mnt/presto-admin/invalid-path/presto.rpm"),
    );
}

#[test]
#[serial]
fn install_without_path_argument() {
    let cluster = provisioned_cluster();
    stage_server_rpm(&cluster).expect("stage server rpm");

    assert_err_matches(
        "Fatal error: Missing argument local_path: Absolute path to the rpm to be installed",
        AdminCli::new(&cluster).run("package install"),
    );
}

#[test]
#[serial]
fn reinstall_on_installed_host_reports_already_installed() {
    let cluster = provisioned_cluster();
    let rpm = stage_server_rpm(&cluster).expect("stage server rpm");
    let admin = AdminCli::new(&cluster);
    let command = format!("{} -H master", install_command(&rpm));

    admin.run(&command).expect("first install should succeed");
    assert_installed(&cluster, "master", &rpm);

    // The second run still exits zero: the rpm is deployed again, but the
    // remote install step reports the package as already present.
    let output = admin.run(&command).expect("reinstall should exit zero");
    let expected = [
        "Deploying rpm...".to_string(),
        "Package deployed successfully on: master".to_string(),
        format!(
            "Warning: [master] sudo() received nonzero return code 1 while executing 'rpm -i {}/{}'!",
            PACKAGE_DEPLOY_DIR,
            rpm.file_name()
        ),
        String::new(),
        String::new(),
        "[master] out: ".to_string(),
        format!(
            "[master] out: \tpackage {} is already installed",
            rpm.base_name()
        ),
    ];
    assert_eq_ignoring_order(&expected.join("\n"), &output);
    assert_installed(&cluster, "master", &rpm);
}

#[test]
#[serial]
fn install_rejects_non_rpm_file() {
    let cluster = provisioned_cluster();

    // The uploaded topology descriptor is a convenient file on the
    // coordinator that is definitely not an rpm.
    assert_err_matches(
        "Fatal error: error: not an rpm package",
        AdminCli::new(&cluster).run(&format!("package install {CONFIG_PATH}")),
    );
}

#[test]
#[serial]
fn install_with_missing_jdk_reports_failed_dependency() {
    let cluster = provisioned_cluster();
    let rpm = stage_server_rpm(&cluster).expect("stage server rpm");

    cluster
        .exec("master", "rpm -e jdk1.8.0_40-1.8.0_40-fcs")
        .expect("remove jdk prerequisite");
    assert_err_matches(
        "package jdk1.8.0_40-1.8.0_40-fcs is not installed",
        cluster.exec("master", "rpm -q jdk1.8.0_40-1.8.0_40-fcs"),
    );

    let output = AdminCli::new(&cluster)
        .run(&format!("{} -H master", install_command(&rpm)))
        .expect("install should exit zero even when the remote install fails");
    let expected = load_resource("jdk_not_found.txt").expect("jdk_not_found.txt resource");
    assert_eq_ignoring_order(&expected, &output);
}

#[test]
#[serial]
fn install_with_missing_python_reports_failed_dependencies() {
    let cluster = provisioned_cluster();
    let rpm = stage_server_rpm(&cluster).expect("stage server rpm");

    cluster
        .exec("master", "rpm -e --nodeps python-2.6.6")
        .expect("remove python prerequisite");
    assert_err_matches(
        "package python-2.6.6 is not installed",
        cluster.exec("master", "rpm -q python-2.6.6"),
    );

    let output = AdminCli::new(&cluster)
        .run(&format!("{} -H master", install_command(&rpm)))
        .expect("install should exit zero even when the remote install fails");
    let expected = [
        "Deploying rpm...".to_string(),
        String::new(),
        format!(
            "Warning: [master] sudo() received nonzero return code 1 while executing 'rpm -i {}/{}'!",
            PACKAGE_DEPLOY_DIR,
            rpm.file_name()
        ),
        String::new(),
        "Package deployed successfully on: master".to_string(),
        "[master] out: error: Failed dependencies:".to_string(),
        format!(
            "[master] out: \tpython >= 2.6 is needed by {}",
            rpm.base_name()
        ),
        format!(
            "[master] out: \tpython <= 2.7 is needed by {}",
            rpm.base_name()
        ),
        "[master] out: ".to_string(),
    ];
    assert_eq_ignoring_order(&expected.join("\n"), &output);
}

#[test]
#[serial]
fn install_with_nodeps_skips_dependency_check() {
    let cluster = provisioned_cluster();
    let rpm = stage_server_rpm(&cluster).expect("stage server rpm");

    cluster
        .exec("master", "rpm -e --nodeps python-2.6.6")
        .expect("remove python prerequisite");
    assert_err_matches(
        "package python-2.6.6 is not installed",
        cluster.exec("master", "rpm -q python-2.6.6"),
    );

    let output = AdminCli::new(&cluster)
        .run(&format!("{} -H master --nodeps", install_command(&rpm)))
        .expect("package install --nodeps should succeed");
    assert_contains(&output, "Package installed successfully on: master");
    let expected = "Deploying rpm...\nPackage deployed successfully on: master\nPackage installed successfully on: master";
    assert_eq_ignoring_order(expected, &output);
    assert_installed(&cluster, "master", &rpm);
}
