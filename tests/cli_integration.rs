//! Integration tests for the passvault CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.  The
//! master passphrase comes from `PASSVAULT_PASSWORD` and entry passwords
//! are piped through stdin, so nothing waits on an interactive prompt.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

const PASS: &str = "correct horse battery staple";

/// Keeps the tests fast: the default Argon2 cost is far too slow here.
const FAST_SETTINGS: &str = "\
argon2_memory_kib = 8192
argon2_iterations = 1
argon2_parallelism = 1
";

/// Helper: get a Command pointing at the passvault binary.
fn passvault() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("passvault").expect("binary should exist")
}

/// Helper: a command against `dir` with the passphrase in the environment.
fn in_vault(dir: &Path) -> Command {
    let mut cmd = passvault();
    cmd.arg("--vault-dir")
        .arg(dir)
        .env("PASSVAULT_PASSWORD", PASS)
        .env_remove("PASSVAULT_DIR");
    cmd
}

/// Helper: a freshly initialized vault.
fn new_vault() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let vault = tmp.child("vault");
    vault.create_dir_all().unwrap();
    vault.child("settings.toml").write_str(FAST_SETTINGS).unwrap();

    in_vault(vault.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Vault created"));

    let dir = vault.path().to_path_buf();
    (tmp, dir)
}

fn insert_bank(dir: &Path) {
    in_vault(dir)
        .args(["insert", "bank.com", "--username", "alice"])
        .write_stdin("s3cr3t\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Inserted 'bank.com'"));
}

// ---------------------------------------------------------------------------
// Parser surface
// ---------------------------------------------------------------------------

#[test]
fn help_flag_shows_usage() {
    passvault()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Local password vault"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("insert"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("find"))
        .stdout(predicate::str::contains("rename"))
        .stdout(predicate::str::contains("remove"))
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("integrity"))
        .stdout(predicate::str::contains("pull"))
        .stdout(predicate::str::contains("push"));
}

#[test]
fn version_flag_shows_version() {
    passvault()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("passvault"));
}

#[test]
fn no_subcommand_lists_and_needs_a_vault() {
    let tmp = TempDir::new().unwrap();
    passvault()
        .arg("--vault-dir")
        .arg(tmp.child("missing").path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Vault not found"));
}

// ---------------------------------------------------------------------------
// Vault lifecycle
// ---------------------------------------------------------------------------

#[test]
fn init_writes_records_and_refuses_twice() {
    let (_tmp, dir) = new_vault();
    assert!(dir.join("config.json").exists());
    assert!(dir.join("sites.json").exists());
    assert!(dir.join("files").is_dir());

    in_vault(&dir)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn init_rejects_short_passphrase() {
    let tmp = TempDir::new().unwrap();
    passvault()
        .arg("--vault-dir")
        .arg(tmp.child("vault").path())
        .env("PASSVAULT_PASSWORD", "short")
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 8 characters"));
}

#[test]
fn insert_list_and_show_credential() {
    let (_tmp, dir) = new_vault();
    insert_bank(&dir);

    in_vault(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("  1\n"))
        .stdout(predicate::str::contains("└──bank.com"));

    in_vault(&dir)
        .args(["show", "bank.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alice"))
        .stdout(predicate::str::contains("s3cr3t"));

    // Nothing readable ends up in the vault record.
    let raw = std::fs::read_to_string(dir.join("sites.json")).unwrap();
    assert!(!raw.contains("alice"));
    assert!(!raw.contains("s3cr3t"));
}

#[test]
fn wrong_passphrase_does_not_trip() {
    let (_tmp, dir) = new_vault();
    insert_bank(&dir);

    in_vault(&dir)
        .env("PASSVAULT_PASSWORD", "Tr0ub4dor&3")
        .args(["show", "bank.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Decryption failed"));

    assert!(!dir.join("TRIPWIRE").exists());
}

#[test]
fn duplicate_insert_is_refused() {
    let (_tmp, dir) = new_vault();
    insert_bank(&dir);
    let before = std::fs::read(dir.join("sites.json")).unwrap();

    in_vault(&dir)
        .args(["insert", "bank.com", "--username", "mallory"])
        .write_stdin("other\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    assert_eq!(std::fs::read(dir.join("sites.json")).unwrap(), before);
}

#[test]
fn find_matches_group_prefix() {
    let (_tmp, dir) = new_vault();
    for name in ["work/vpn", "work/email", "bank.com"] {
        in_vault(&dir)
            .args(["insert", name, "--generate"])
            .assert()
            .success();
    }

    in_vault(&dir)
        .args(["find", "work"])
        .assert()
        .success()
        .stdout(predicate::str::contains("  2\n"))
        .stdout(predicate::str::contains("└──work"))
        .stdout(predicate::str::contains("email"))
        .stdout(predicate::str::contains("vpn"))
        .stdout(predicate::str::contains("bank.com").not());
}

#[test]
fn edit_regenerates_password() {
    let (_tmp, dir) = new_vault();
    insert_bank(&dir);

    in_vault(&dir)
        .args(["edit", "bank.com", "--generate", "40"])
        .assert()
        .success();

    in_vault(&dir)
        .args(["show", "bank.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alice"))
        .stdout(predicate::str::contains("s3cr3t").not());
}

#[test]
fn rename_and_remove() {
    let (_tmp, dir) = new_vault();
    insert_bank(&dir);

    in_vault(&dir)
        .args(["rename", "bank.com", "money/bank.com"])
        .assert()
        .success();

    in_vault(&dir)
        .args(["show", "money/bank.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("s3cr3t"));

    in_vault(&dir)
        .args(["rm", "money/bank.com"])
        .assert()
        .success();

    in_vault(&dir)
        .args(["show", "money/bank.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No entry named"));
}

#[test]
fn file_entry_roundtrip() {
    let (tmp, dir) = new_vault();
    let source = tmp.child("id_ed25519");
    source.write_str("private key material").unwrap();
    let restored = tmp.child("restored");

    in_vault(&dir)
        .args(["insert", "keys/ssh", "--file"])
        .arg(source.path())
        .assert()
        .success();

    in_vault(&dir)
        .args(["show", "keys/ssh", "--out"])
        .arg(restored.path())
        .assert()
        .success();

    restored.assert("private key material");
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

#[test]
fn generate_prints_requested_length() {
    passvault()
        .args(["generate", "16", "--no-symbol"])
        .env("PASSVAULT_DIR", "/nonexistent/passvault")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^[!-~]{16}\n$").unwrap());
}

#[test]
fn generate_rejects_infeasible_and_oversized_requests() {
    passvault()
        .args(["generate", "3"])
        .env("PASSVAULT_DIR", "/nonexistent/passvault")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot satisfy 4 required character classes"));

    passvault()
        .args(["generate", "2000"])
        .env("PASSVAULT_DIR", "/nonexistent/passvault")
        .assert()
        .failure()
        .stderr(predicate::str::contains("exceeds the maximum of 1024"));
}

// ---------------------------------------------------------------------------
// Tripwires
// ---------------------------------------------------------------------------

/// Commit every tracked change with `message`, the way a remote would
/// hand it over.
fn git_commit_all(dir: &Path, message: &str) {
    let status = std::process::Command::new("git")
        .args([
            "-c",
            "user.name=mallory",
            "-c",
            "user.email=mallory@localhost",
            "commit",
            "--quiet",
            "--all",
            "-m",
            message,
        ])
        .current_dir(dir)
        .status()
        .unwrap();
    assert!(status.success());
}

#[test]
fn tampered_vault_record_trips_and_locks() {
    if !passvault::git::git_available() {
        return;
    }
    let (_tmp, dir) = new_vault();
    insert_bank(&dir);

    in_vault(&dir)
        .arg("integrity")
        .assert()
        .success()
        .stdout(predicate::str::contains("Integrity hash updated"));

    in_vault(&dir).arg("verify").assert().success();

    // Tamper with the raw record and dress it up as a baseline commit.
    let sites = dir.join("sites.json");
    let mut raw = std::fs::read(&sites).unwrap();
    raw.push(b' ');
    std::fs::write(&sites, raw).unwrap();
    git_commit_all(&dir, passvault::git::INTEGRITY_COMMIT);

    in_vault(&dir)
        .arg("verify")
        .assert()
        .failure()
        .stderr(predicate::str::contains("You are under attack!"));
    assert!(dir.join("TRIPWIRE").exists());

    in_vault(&dir)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Tripwire marker found"));
}

#[test]
fn verify_refuses_local_changes_without_tripping() {
    let (_tmp, dir) = new_vault();
    insert_bank(&dir);

    in_vault(&dir)
        .arg("verify")
        .assert()
        .failure()
        .stderr(predicate::str::contains("last integrity baseline"));
    assert!(!dir.join("TRIPWIRE").exists());

    in_vault(&dir).arg("list").assert().success();
}

#[test]
fn verify_without_git_refuses_and_never_trips() {
    let tmp = TempDir::new().unwrap();
    let no_git = tmp.child("empty-path");
    no_git.create_dir_all().unwrap();
    let vault = tmp.child("vault");
    vault.create_dir_all().unwrap();
    vault.child("settings.toml").write_str(FAST_SETTINGS).unwrap();
    let dir = vault.path();

    in_vault(dir)
        .env("PATH", no_git.path())
        .arg("init")
        .assert()
        .success()
        .stderr(predicate::str::contains("git not found"));

    in_vault(dir)
        .env("PATH", no_git.path())
        .args(["insert", "bank.com", "-u", "alice"])
        .write_stdin("s3cr3t\n")
        .assert()
        .success();

    in_vault(dir)
        .env("PATH", no_git.path())
        .arg("verify")
        .assert()
        .failure()
        .stderr(predicate::str::contains("last integrity baseline"));
    assert!(!dir.join("TRIPWIRE").exists());

    in_vault(dir)
        .env("PATH", no_git.path())
        .args(["show", "bank.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("s3cr3t"));
}

#[test]
fn pull_baselines_local_changes_first() {
    if !passvault::git::git_available() {
        return;
    }
    let (tmp, dir) = new_vault();
    let origin = tmp.child("origin.git");
    let status = std::process::Command::new("git")
        .args(["init", "--quiet", "--bare"])
        .arg(origin.path())
        .status()
        .unwrap();
    assert!(status.success());

    in_vault(&dir)
        .arg("remote")
        .arg(origin.path())
        .assert()
        .success();
    in_vault(&dir).arg("push").assert().success();

    // A local insert the remote has not seen yet.
    insert_bank(&dir);

    in_vault(&dir).arg("pull").assert().success();
    assert!(!dir.join("TRIPWIRE").exists());
    in_vault(&dir).arg("verify").assert().success();
}

// ---------------------------------------------------------------------------
// Misused flags
// ---------------------------------------------------------------------------

#[test]
fn out_on_a_credential_is_refused_before_anything_is_shown() {
    let (tmp, dir) = new_vault();
    insert_bank(&dir);
    let target = tmp.child("leak.txt");

    in_vault(&dir)
        .args(["show", "bank.com", "--out"])
        .arg(target.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("s3cr3t").not())
        .stderr(predicate::str::contains("--out only works for file entries"));

    target.assert(predicate::path::missing());
}

#[test]
fn audit_records_operations() {
    let (_tmp, dir) = new_vault();
    insert_bank(&dir);

    in_vault(&dir)
        .args(["audit", "--last", "10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("insert"))
        .stdout(predicate::str::contains("bank.com"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn completions_for_bash() {
    passvault()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("passvault"));
}
