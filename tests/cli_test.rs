//! Integration tests running the compiled binary

use std::process::Command;

use tempfile::TempDir;

fn bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_zone-ddns"));
    for key in ["ZONE_DDNS_FQDN", "ZONE_DDNS_TOKEN", "ZONE_DDNS_ZONEID", "RUST_LOG"] {
        cmd.env_remove(key);
    }
    cmd
}

#[test]
fn test_help_lists_required_flags() {
    let output = bin().arg("-h").output().expect("run binary");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--fqdn"));
    assert!(stdout.contains("--token"));
    assert!(stdout.contains("--zoneid"));
}

#[test]
fn test_missing_required_flags_exit_non_zero() {
    let dir = TempDir::new().expect("temp dir");
    let output = bin()
        .args(["-config", dir.path().join("config.json").to_str().unwrap()])
        .args(["-fqdn", "home.example.com"])
        .output()
        .expect("run binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("-fqdn, -token, -zoneid"));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_malformed_config_file_still_requires_flags() {
    let dir = TempDir::new().expect("temp dir");
    let config = dir.path().join("config.json");
    std::fs::write(&config, "{ not json").expect("write config");

    let output = bin()
        .args(["--config", config.to_str().unwrap()])
        .output()
        .expect("run binary");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("is missing"));
}

#[test]
fn test_unreachable_ip_service_is_fatal_and_writes_no_state() {
    let dir = TempDir::new().expect("temp dir");
    let state = dir.path().join("current.json");

    let output = bin()
        .args(["-config", dir.path().join("config.json").to_str().unwrap()])
        .args(["-fqdn", "home.example.com", "-token", "T", "-zoneid", "Z"])
        .args(["-ip-url", "http://127.0.0.1:9/ip", "-timeout", "2"])
        .args(["-state", state.to_str().unwrap()])
        .output()
        .expect("run binary");

    assert!(!output.status.success());
    assert!(!state.exists());
}
