//! Integration tests for fwbaseline.
//!
//! Tests that change the host firewall require root privileges and are
//! marked with #[ignore].
//! Run with: `sudo cargo test --release -- --ignored`

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Helper to get the path to the compiled binary
fn get_binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_fwbaseline"))
}

/// Check if running as root
fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Run fwbaseline command and return output
fn run_fwbaseline(args: &[&str]) -> std::process::Output {
    let binary = get_binary_path();
    Command::new(&binary)
        .args(args)
        .output()
        .expect("Failed to execute fwbaseline")
}

/// Config that keeps rulesets and the marker inside `dir`
fn write_config(dir: &Path, unit_dir: &Path) -> PathBuf {
    let path = dir.join("config.yaml");
    let yaml = format!(
        "config_dir: {}\nunit_dir: {}\nstate_file: {}\n",
        dir.join("iptables").display(),
        unit_dir.display(),
        dir.join("state/state.json").display()
    );
    std::fs::write(&path, yaml).unwrap();
    path
}

#[test]
fn test_version_command() {
    let output = run_fwbaseline(&["--version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("fwbaseline"));
}

#[test]
fn test_help_command() {
    let output = run_fwbaseline(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("install"));
    assert!(stdout.contains("remove"));
    assert!(stdout.contains("status"));
}

#[test]
fn test_usage_errors_exit_2() {
    for args in [
        &["install", "5"][..],
        &["remove", "ipv4"][..],
        &["4"][..],
        &[][..],
    ] {
        let output = run_fwbaseline(args);
        assert_eq!(
            output.status.code(),
            Some(2),
            "Expected usage error for {:?}",
            args
        );
    }
}

#[test]
fn test_install_requires_root() {
    if is_root() {
        eprintln!("Skipping test_install_requires_root: running as root");
        return;
    }

    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), &dir.path().join("units"));

    for command in ["install", "remove"] {
        let output = run_fwbaseline(&["--config", config.to_str().unwrap(), command, "4"]);
        assert_eq!(output.status.code(), Some(1));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(
            stderr.contains("fwbaseline: preflight:"),
            "Unexpected stderr: {}",
            stderr
        );
    }

    // No mutation happened
    assert!(!dir.path().join("iptables").exists());
    assert!(!dir.path().join("state").exists());
}

#[test]
fn test_invalid_config_is_reported() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.yaml");
    std::fs::write(&config, "config_dir: relative/path\n").unwrap();

    let output = run_fwbaseline(&["--config", config.to_str().unwrap(), "status"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("fwbaseline: config:"), "Unexpected stderr: {}", stderr);
}

#[test]
fn test_status_json_on_clean_host() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), &dir.path().join("units"));

    let output = run_fwbaseline(&["--config", config.to_str().unwrap(), "status", "--json"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let families = report["families"].as_array().unwrap();
    assert_eq!(families.len(), 2);
    assert_eq!(families[0]["family"], "v4");
    assert_eq!(families[1]["family"], "v6");
    for family in families {
        assert_eq!(family["artifacts"]["state"], "unmanaged");
    }
    assert_eq!(report["directory"]["state"], "absent");
}

#[test]
fn test_status_text_single_family() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), &dir.path().join("units"));

    let output = run_fwbaseline(&["-q", "--config", config.to_str().unwrap(), "status", "6"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("IPv6: NOT MANAGED"));
    assert!(!stdout.contains("IPv4"));
}

#[test]
#[ignore] // Requires root, changes the live firewall and systemd units
fn test_install_remove_roundtrip() {
    if !is_root() {
        eprintln!("Skipping test_install_remove_roundtrip: requires root");
        return;
    }

    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), Path::new("/etc/systemd/system"));
    let config = config.to_str().unwrap();

    let output = run_fwbaseline(&["--config", config, "install", "4"]);
    assert!(
        output.status.success(),
        "install failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let rules = std::fs::read(dir.path().join("iptables/rules.v4")).unwrap();

    // Second install is refused
    let output = run_fwbaseline(&["--config", config, "install", "4"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("guard"));

    let output = run_fwbaseline(&["--config", config, "remove", "4"]);
    assert!(output.status.success());
    assert!(!dir.path().join("iptables").exists());

    // Reinstall produces the same bytes
    let output = run_fwbaseline(&["--config", config, "install", "4"]);
    assert!(output.status.success());
    assert_eq!(std::fs::read(dir.path().join("iptables/rules.v4")).unwrap(), rules);

    let output = run_fwbaseline(&["--config", config, "remove"]);
    assert_eq!(output.status.code(), Some(1), "remove of both needs both installed");
    let output = run_fwbaseline(&["--config", config, "remove", "4"]);
    assert!(output.status.success());
}
