//! CLI argument parsing tests for wifi-scan.
//!
//! None of these need a wireless device or privileges: they stop at argument
//! parsing or at interface name resolution.

use assert_cmd::Command;
use predicates::prelude::*;

fn wifi_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_wifi-scan"))
}

mod global_flags {
    use super::*;

    #[test]
    fn test_help() {
        wifi_cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Wireless network scanner"))
            .stdout(predicate::str::contains("--interface"))
            .stdout(predicate::str::contains("--timeout"));
    }

    #[test]
    fn test_version() {
        wifi_cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("wifi-scan"));
    }

    #[test]
    fn test_invalid_subcommand() {
        wifi_cmd()
            .arg("invalid_command")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn test_timeout_must_be_number() {
        wifi_cmd()
            .args(["-i", "nlscan-none0", "--timeout", "soon", "scan"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid value"));
    }

    #[test]
    fn test_interface_is_required() {
        wifi_cmd()
            .arg("scan")
            .assert()
            .failure()
            .stderr(predicate::str::contains("--interface"))
            .stderr(predicate::str::contains("required"));
    }

    #[test]
    fn test_unknown_interface_fails_cleanly() {
        wifi_cmd()
            .args(["--interface", "nlscan-none0", "station"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("interface not found: nlscan-none0"));
    }
}

mod scan_command {
    use super::*;

    #[test]
    fn test_scan_help() {
        wifi_cmd()
            .args(["scan", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--capacity"))
            .stdout(predicate::str::contains("--retries"))
            .stdout(predicate::str::contains("--retry-delay"));
    }

    #[test]
    fn test_scan_alias() {
        wifi_cmd().args(["s", "--help"]).assert().success();
    }

    #[test]
    fn test_capacity_rejects_negative() {
        wifi_cmd()
            .args(["scan", "--capacity", "-1"])
            .assert()
            .failure();
    }

    #[test]
    fn test_json_flag_after_subcommand() {
        wifi_cmd()
            .args(["-i", "nlscan-none0", "scan", "--json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("nlscan-none0"));
    }
}

mod station_command {
    use super::*;

    #[test]
    fn test_station_help() {
        wifi_cmd()
            .args(["station", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("connected"));
    }

    #[test]
    fn test_station_takes_no_arguments() {
        wifi_cmd()
            .args(["station", "extra"])
            .assert()
            .failure();
    }
}
