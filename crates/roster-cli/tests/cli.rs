//! Integration tests for the roster binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use roster_wireguard::{Configuration, Key};
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

fn install() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path();
    for sub in ["configs", "keys", "home/configs"] {
        fs::create_dir_all(root.join(sub)).expect("mkdir");
    }
    fs::write(
        root.join("setupVars.conf"),
        format!(
            "pivpnHOST=vpn.example.com\npivpnDNS1=10.6.0.1\ninstall_home={}\n",
            root.join("home").display()
        ),
    )
    .expect("write");

    let mut server = Configuration::new("wg0", Key::generate_private());
    server.interface.listen_port = 51820;
    server.interface.addresses.push("10.6.0.1/24".parse().expect("net"));
    fs::write(root.join("wg0.conf"), server.export()).expect("write");
    fs::write(root.join("configs/clients.txt"), "").expect("write");
    fs::write(root.join("hosts.wireguard"), "").expect("write");
    dir
}

fn roster(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("roster").expect("binary");
    cmd.arg("--setup-vars")
        .arg(root.join("setupVars.conf"))
        .arg("--tunnel-dir")
        .arg(root)
        .arg("--configs-dir")
        .arg(root.join("configs"))
        .arg("--keys-dir")
        .arg(root.join("keys"))
        .arg("--hosts-file")
        .arg(root.join("hosts.wireguard"))
        .arg("--no-chown");
    cmd
}

// ============================================================================
// Help and usage
// ============================================================================

#[test]
fn test_help_lists_subcommands() {
    Command::cargo_bin("roster")
        .expect("binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("disable"))
        .stdout(predicate::str::contains("sync"));
}

#[test]
fn test_missing_subcommand_fails() {
    Command::cargo_bin("roster").expect("binary").assert().failure();
}

// ============================================================================
// Client lifecycle
// ============================================================================

#[test]
fn test_list_empty_install() {
    let dir = install();
    roster(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout("No clients\n");
}

#[test]
fn test_add_disable_list() {
    let dir = install();
    let root = dir.path();

    roster(root)
        .args(["add", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("10.6.0.2"));
    assert!(root.join("configs/alice.conf").exists());
    assert!(root.join("home/configs/alice.conf").exists());

    roster(root).args(["disable", "alice"]).assert().success();

    roster(root)
        .args(["--format", "json", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"disabled\": true"));

    let tunnel = fs::read_to_string(root.join("wg0.conf")).expect("read");
    assert!(tunnel.contains("#[disabled] ### begin alice ###"));
    let hosts = fs::read_to_string(root.join("hosts.wireguard")).expect("read");
    assert!(hosts.contains("10.6.0.2 alice.pivpn"));
}

#[test]
fn test_errors_exit_nonzero() {
    let dir = install();

    roster(dir.path())
        .args(["remove", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: client not found: ghost"));

    roster(dir.path())
        .args(["add", "server"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}
