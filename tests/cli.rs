use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

const EXPORT_DIR: &str = "connections/followers_and_following";

fn profile_page(handles: &[&str]) -> String {
    handles
        .iter()
        .map(|h| format!("<a href=\"https://www.instagram.com/{}/\">{}</a>\n", h, h))
        .collect()
}

fn write_export(path: &Path, following: &[&str], followers: &[&str]) {
    let mut writer = zip::ZipWriter::new(fs::File::create(path).unwrap());
    let options = SimpleFileOptions::default();

    writer
        .start_file(format!("{}/following.html", EXPORT_DIR), options)
        .unwrap();
    writer.write_all(profile_page(following).as_bytes()).unwrap();
    writer
        .start_file(format!("{}/followers_1.html", EXPORT_DIR), options)
        .unwrap();
    writer.write_all(profile_page(followers).as_bytes()).unwrap();
    writer.finish().unwrap();
}

fn followback(workdir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("followback").unwrap();
    cmd.current_dir(workdir.path())
        .env_remove("RUST_LOG")
        .arg("--results-dir")
        .arg(workdir.path().join("results"))
        .arg("--uploads-dir")
        .arg(workdir.path().join("uploads"));
    cmd
}

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("followback")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn generate_config_writes_sample() {
    let workdir = TempDir::new().unwrap();
    let config_path = workdir.path().join("sample.toml");

    Command::cargo_bin("followback")
        .unwrap()
        .arg("--generate-config")
        .arg("--config")
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated sample configuration file"));

    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("platform_domain"));
}

#[test]
fn check_lists_accounts_not_following_back() {
    let workdir = TempDir::new().unwrap();
    let archive = workdir.path().join("export.zip");
    write_export(&archive, &["alice", "bob", "carol"], &["bob"]);

    followback(&workdir)
        .arg("check")
        .arg(&archive)
        .arg("--output-format")
        .arg("plain")
        .assert()
        .code(10)
        .stdout(predicate::str::contains("@alice\n@carol"))
        .stdout(predicate::str::contains("@bob").not());

    let results: Vec<_> = fs::read_dir(workdir.path().join("results"))
        .unwrap()
        .collect();
    assert_eq!(results.len(), 1);
    assert!(archive.exists());
}

#[test]
fn check_json_output_when_everyone_follows_back() {
    let workdir = TempDir::new().unwrap();
    let archive = workdir.path().join("export.zip");
    write_export(&archive, &["x"], &["x"]);

    followback(&workdir)
        .arg("check")
        .arg(&archive)
        .arg("--output-format")
        .arg("json")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("\"outcome\":\"all_follow_back\""));
}

#[test]
fn check_rejects_wrong_extension() {
    let workdir = TempDir::new().unwrap();
    let archive = workdir.path().join("export.rar");
    write_export(&archive, &["alice"], &[]);

    followback(&workdir)
        .arg("check")
        .arg(&archive)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("rejected"));
}

#[test]
fn check_missing_archive_fails() {
    let workdir = TempDir::new().unwrap();

    followback(&workdir)
        .arg("check")
        .arg(workdir.path().join("missing.zip"))
        .assert()
        .code(2);
}

#[test]
fn check_archive_without_export_documents() {
    let workdir = TempDir::new().unwrap();
    let archive = workdir.path().join("other.zip");
    let mut writer = zip::ZipWriter::new(fs::File::create(&archive).unwrap());
    writer
        .start_file("notes.txt", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"hello").unwrap();
    writer.finish().unwrap();

    followback(&workdir)
        .arg("check")
        .arg(&archive)
        .assert()
        .code(4);

    let leftovers = fs::read_dir(workdir.path().join("uploads")).unwrap().count();
    assert_eq!(leftovers, 0);
}
