use assert_cmd::Command;
use predicates::prelude::*;

const MISSING_TOOL: &str = "/nonexistent/rhc-tests/tool";

fn rhc() -> Command {
    let mut cmd = Command::cargo_bin("rhc").expect("rhc binary is built for integration tests");
    cmd.env_remove("RHC_LOG_LEVEL")
        .env_remove("RHC_LOG_FORMAT")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

fn without_tools(cmd: &mut Command) -> &mut Command {
    cmd.env("RHC_SUBSCRIPTION_MANAGER", MISSING_TOOL)
        .env("RHC_INSIGHTS_CLIENT", MISSING_TOOL)
        .env("RHC_SYSTEMCTL", MISSING_TOOL)
}

#[test]
fn help_lists_public_commands_only() {
    rhc()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("connect"))
        .stdout(predicate::str::contains("disconnect"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("canonical-facts").not());
}

#[test]
fn version_flag_prints_package_version() {
    rhc()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::diff(format!(
            "rhc version {}\n",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn connect_help_documents_credential_flags() {
    rhc()
        .args(["connect", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--activation-key"))
        .stdout(predicate::str::contains("--organization"))
        .stdout(predicate::str::contains("--server"));
}

#[test]
fn invalid_log_level_is_a_usage_error() {
    rhc()
        .args(["--log-level", "loud", "status"])
        .assert()
        .code(2);
}

#[test]
fn status_fails_when_subscription_manager_is_missing() {
    let mut cmd = rhc();
    without_tools(&mut cmd)
        .arg("status")
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("Connection status for "))
        .stderr(predicate::str::contains(
            "error: cannot query Red Hat Subscription Management",
        ))
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn disconnect_reports_every_failed_step() {
    let mut cmd = rhc();
    without_tools(&mut cmd)
        .arg("disconnect")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("! Cannot deactivate the rhc daemon"))
        .stdout(predicate::str::contains(
            "The following errors were encountered during disconnect:",
        ))
        .stdout(predicate::str::contains("rhcd"))
        .stdout(predicate::str::contains("insights"))
        .stdout(predicate::str::contains("rhsm"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn connect_with_activation_key_stops_at_first_failure() {
    let mut cmd = rhc();
    without_tools(&mut cmd)
        .args(["connect", "-o", "12345", "-a", "web"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("This might take a few seconds."))
        .stdout(predicate::str::contains("rhc daemon").not())
        .stderr(predicate::str::contains(
            "error: cannot query Red Hat Subscription Management",
        ));
}

#[test]
fn canonical_facts_rejects_missing_root() {
    rhc()
        .args(["canonical-facts"])
        .env("RHC_FACTS_ROOT", "/nonexistent/rhc-tests/root")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("is not a directory"));
}
