//! Integration tests for the `mantle` binary entry point.
//!
//! Verifies the JSON report written for each scenario and user-facing error
//! handling for bad arguments and configuration.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;

#[test]
fn default_invocation_reports_the_stacked_scenario() {
    let mut command = cargo_bin_cmd!("mantle");
    command.args(["--log-filter", "off"]);
    command
        .assert()
        .success()
        .stdout(contains("\"scenario\":\"stacked\""))
        .stdout(contains("\"context_depth\":0"));
}

#[test]
fn configuration_flags_precede_the_scenario() {
    let mut command = cargo_bin_cmd!("mantle");
    command.args(["--log-filter=off", "--method-access", "public_only", "plain"]);
    command
        .assert()
        .success()
        .stdout(contains("\"result\":\"hello world\""));
}

#[test]
fn unknown_scenario_exits_with_failure() {
    let mut command = cargo_bin_cmd!("mantle");
    command.args(["--log-filter", "off", "haunted"]);
    command
        .assert()
        .failure()
        .stderr(contains("invalid value 'haunted'"));
}

#[test]
fn malformed_log_filter_exits_with_failure() {
    let mut command = cargo_bin_cmd!("mantle");
    command.args(["--log-filter", "mantle_dispatch=loud"]);
    command
        .assert()
        .failure()
        .stderr(contains("invalid log filter"));
}
