//! Assertion helpers for product scenarios.
//!
//! Two failure channels are kept deliberately distinct: harness errors
//! (subprocesses and remote commands exiting non-zero, surfaced as
//! [`crate::HarnessError`]) and test-framework panics raised here when an
//! expected and an actual outcome diverge.

use std::fmt;

use regex::Regex;

use crate::artifact::RpmArtifact;
use crate::cluster::Cluster;

/// Assert the artifact's package is installed on `host`.
///
/// The package query must print exactly the artifact base name plus a
/// trailing newline.
pub fn assert_installed(cluster: &Cluster, host: &str, artifact: &RpmArtifact) {
    let query = format!("rpm -q {}", artifact.package_name());
    let output = cluster
        .exec(host, &query)
        .unwrap_or_else(|error| panic!("`{query}` failed on {host}: {error}"));
    assert_eq!(
        output,
        artifact.query_output(),
        "unexpected package query output on {host}"
    );
}

/// Assert the artifact's package is absent from `host`.
///
/// Absence is observed as the package query failing with the
/// not-installed diagnostic.
pub fn assert_uninstalled(cluster: &Cluster, host: &str, artifact: &RpmArtifact) {
    let package = artifact.package_name();
    assert_err_matches(
        &format!("package {package} is not installed"),
        cluster.exec(host, &format!("rpm -q {package}")),
    );
}

/// Compare two multi-line strings as unordered line multisets.
///
/// The tool under test drives hosts concurrently, so per-host lines arrive
/// interleaved in no particular order.
pub fn assert_eq_ignoring_order(expected: &str, actual: &str) {
    let mut expected_lines: Vec<&str> = expected.lines().collect();
    let mut actual_lines: Vec<&str> = actual.lines().collect();
    expected_lines.sort_unstable();
    actual_lines.sort_unstable();
    assert_eq!(
        expected_lines, actual_lines,
        "line sets differ\n--- expected ---\n{expected}\n--- actual ---\n{actual}"
    );
}

/// Require `result` to be an error whose rendered message matches
/// `pattern`.
pub fn assert_err_matches<T: fmt::Debug, E: fmt::Display>(pattern: &str, result: Result<T, E>) {
    let regex =
        Regex::new(pattern).unwrap_or_else(|error| panic!("invalid pattern `{pattern}`: {error}"));
    match result {
        Ok(value) => panic!("expected failure matching `{pattern}`, got success: {value:?}"),
        Err(error) => {
            let message = error.to_string();
            assert!(
                regex.is_match(&message),
                "error did not match `{pattern}`:\n{message}"
            );
        }
    }
}

pub fn assert_contains(haystack: &str, needle: &str) {
    assert!(
        haystack.contains(needle),
        "Expected to find '{needle}' in output, got: {haystack}"
    );
}
