//! Integration tests for the contact-hub CLI

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command as AssertCommand;
use predicates::prelude::*;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

const PEOPLE_CSV: &str = "First Name,Last Name,Organization,Phone 1 - Value\n\
Jane,Doe,Acme,555-1234\n\
,,Globex,\n\
,,,555-9999\n";

const FRIENDS_VCF: &str = "BEGIN:VCARD\r\n\
VERSION:3.0\r\n\
FN:Zoe Adams\r\n\
item1.TEL:+1 555 0101\r\n\
item1.X-ABLabel:_$!<Mobile>!$_\r\n\
EMAIL;TYPE=INTERNET,WORK:zoe@example.com\r\n\
NOTE:Met at the\\nconference\r\n\
END:VCARD\r\n\
BEGIN:VCARD\r\n\
VERSION:3.0\r\n\
FN:Émile Zola\r\n\
BDAY:19900715\r\n\
END:VCARD\r\n";

/// Library directory plus an isolated config file
struct TestEnv {
    temp_dir: TempDir,
    config_path: PathBuf,
    library_dir: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        Self::with_config("")
    }

    fn with_config(config: &str) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let library_dir = temp_dir.path().join("contacts");
        fs::create_dir(&library_dir).unwrap();
        fs::write(&config_path, config).unwrap();

        fs::write(library_dir.join("people.csv"), PEOPLE_CSV).unwrap();
        fs::write(library_dir.join("friends.vcf"), FRIENDS_VCF).unwrap();
        fs::write(library_dir.join("empty.csv"), "First Name,Last Name\n").unwrap();
        fs::write(library_dir.join("readme.txt"), "not contacts").unwrap();

        Self {
            temp_dir,
            config_path,
            library_dir,
        }
    }

    fn cmd(&self) -> AssertCommand {
        let mut cmd = hub_cmd();
        cmd.env_remove("RUST_LOG").args([
            "--config",
            self.config_path.to_str().unwrap(),
            "--dir",
            self.library_dir.to_str().unwrap(),
        ]);
        cmd
    }

    fn path(&self) -> &Path {
        self.temp_dir.path()
    }
}

fn hub_cmd() -> AssertCommand {
    AssertCommand::cargo_bin("contact-hub").unwrap()
}

// =============================================================================
// list
// =============================================================================

#[test]
fn test_list_is_default_command() {
    let env = TestEnv::new();

    env.cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("friends\tVCARD\t2 contact(s)"))
        .stdout(predicate::str::contains("people\tCSV\t2 contact(s)"))
        .stdout(predicate::str::contains("empty").not())
        .stdout(predicate::str::contains("readme").not());
}

#[test]
fn test_list_orders_by_name() {
    let env = TestEnv::new();

    let output = env.cmd().arg("list").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let friends = stdout.find("friends").unwrap();
    let people = stdout.find("people").unwrap();
    assert!(friends < people);
}

#[test]
fn test_list_json() {
    let env = TestEnv::new();

    let output = env.cmd().args(["list", "--json"]).output().unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let libraries = value.as_array().unwrap();
    assert_eq!(libraries.len(), 2);
    assert_eq!(libraries[0]["name"], "friends.vcf");
    assert_eq!(libraries[0]["format"], "VCARD");
    assert_eq!(libraries[0]["contacts"][1]["displayName"], "Zoe Adams");
    assert_eq!(libraries[1]["format"], "CSV");
}

#[test]
fn test_list_format_filter() {
    let env = TestEnv::new();

    env.cmd()
        .args(["list", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("people\tCSV"))
        .stdout(predicate::str::contains("friends").not());

    env.cmd()
        .args(["list", "--format", "ldif"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown library format `ldif`"));
}

#[test]
fn test_list_empty_directory() {
    let env = TestEnv::new();
    let empty = env.path().join("nothing-here");
    fs::create_dir(&empty).unwrap();

    hub_cmd()
        .env_remove("RUST_LOG")
        .args([
            "--config",
            env.config_path.to_str().unwrap(),
            "--dir",
            empty.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("No contact files found"));
}

#[test]
fn test_missing_directory_fails() {
    let env = TestEnv::new();

    hub_cmd()
        .args([
            "--config",
            env.config_path.to_str().unwrap(),
            "--dir",
            env.path().join("missing").to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read directory"));
}

// =============================================================================
// show / card / export
// =============================================================================

#[test]
fn test_show_sorted_contacts() {
    let env = TestEnv::new();

    let output = env.cmd().args(["show", "friends"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("1. Émile Zola\tNo information"));
    assert!(lines[1].contains("2. Zoe Adams\t+1 555 0101"));
}

#[test]
fn test_show_accepts_file_name_and_filter() {
    let env = TestEnv::new();

    env.cmd()
        .args(["show", "PEOPLE.csv", "--filter", "jd"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Jane Doe\tAcme"))
        .stdout(predicate::str::contains("Globex").not());
}

#[test]
fn test_show_json() {
    let env = TestEnv::new();

    let output = env.cmd().args(["show", "friends", "--json"]).output().unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let zoe = &value[1];
    assert_eq!(zoe["phones"][0]["label"], "Mobile");
    assert_eq!(zoe["emails"][0]["label"], "WORK");
    assert_eq!(zoe["note"], "Met at the\nconference");
}

#[test]
fn test_show_unknown_library_fails() {
    let env = TestEnv::new();

    env.cmd()
        .args(["show", "strangers"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no library named `strangers`"));
}

#[test]
fn test_card_prints_summary() {
    let env = TestEnv::new();

    env.cmd()
        .args(["card", "friends", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Name: Zoe Adams\n"))
        .stdout(predicate::str::contains("Phone (Mobile): +1 555 0101\n"))
        .stdout(predicate::str::contains("Email (WORK): zoe@example.com\n"));
}

#[test]
fn test_card_normalizes_birthday() {
    let env = TestEnv::new();

    env.cmd()
        .args(["card", "friends", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Birthday: July 15, 1990"));
}

#[test]
fn test_card_index_out_of_range_fails() {
    let env = TestEnv::new();

    env.cmd()
        .args(["card", "friends", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));

    env.cmd().args(["card", "friends", "0"]).assert().failure();
}

#[test]
fn test_export_to_stdout() {
    let env = TestEnv::new();

    env.cmd()
        .args(["export", "friends", "2"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("BEGIN:VCARD\r\nVERSION:3.0\r\n"))
        .stdout(predicate::str::contains("FN:Zoe Adams\r\n"))
        .stdout(predicate::str::contains("NOTE:Met at the\\nconference\r\n"));
}

#[test]
fn test_export_into_directory() {
    let env = TestEnv::new();
    let out_dir = env.path().join("out");
    fs::create_dir(&out_dir).unwrap();

    env.cmd()
        .args(["export", "friends", "2", "--output", out_dir.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported Zoe Adams"));

    let written = fs::read_to_string(out_dir.join("Zoe_Adams.vcf")).unwrap();
    assert!(written.contains("FN:Zoe Adams\r\n"));
}

#[test]
fn test_exported_card_reads_back() {
    let env = TestEnv::new();
    let target = env.library_dir.join("zoe.vcf");

    env.cmd()
        .args(["export", "friends", "2", "-o", target.to_str().unwrap()])
        .assert()
        .success();

    env.cmd()
        .args(["card", "zoe", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Phone (Mobile): +1 555 0101\n"))
        .stdout(predicate::str::contains("Email (WORK): zoe@example.com\n"));
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_config_placeholder_keeps_unnamed_csv_rows() {
    let env = TestEnv::with_config("[parse]\ncsv_unnamed = \"placeholder\"\n");

    env.cmd()
        .args(["show", "people"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Unknown\t555-9999"));
}

#[test]
fn test_config_locale_changes_birthday() {
    let env = TestEnv::with_config("locale = \"en-GB\"\n");

    env.cmd()
        .args(["card", "friends", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Birthday: 15 July 1990"));
}

#[test]
fn test_config_library_dir_used_without_flag() {
    let env = TestEnv::new();
    fs::write(
        &env.config_path,
        format!("library_dir = \"{}\"\n", env.library_dir.display()),
    )
    .unwrap();

    hub_cmd()
        .env_remove("RUST_LOG")
        .args(["--config", env.config_path.to_str().unwrap(), "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("friends\tVCARD"));
}

#[test]
fn test_config_invalid_policy_fails() {
    let env = TestEnv::with_config("[parse]\nvcard_unnamed = \"sometimes\"\n");

    env.cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid parse.vcard_unnamed"));
}

#[test]
fn test_config_unknown_key_warns() {
    let env = TestEnv::with_config("colour = \"blue\"\n");

    env.cmd()
        .assert()
        .success()
        .stderr(predicate::str::contains("warning: unknown configuration key `colour`"));
}

#[test]
fn test_config_missing_explicit_file_fails() {
    let env = TestEnv::new();

    hub_cmd()
        .args(["--config", env.path().join("nope.toml").to_str().unwrap(), "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration file not found"));
}
