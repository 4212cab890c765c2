use assert_cmd::Command;
use predicates::prelude::*;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_formscan"))
}

#[test]
fn help_lists_positionals() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("<IMAGE_PATH>"))
        .stdout(predicate::str::contains("<THRESHOLD>"));
}

#[test]
fn wrong_argument_count_prints_usage() {
    cli()
        .args(["form.jpg", "1", "2000"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn unknown_mode_is_rejected() {
    cli()
        .args(["form.jpg", "3", "2000", "1400", "230"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error: invalid mode '3'"));
}

#[test]
fn unreadable_image_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("missing.jpg");
    cli()
        .arg(&missing)
        .args(["1", "2000", "1400", "230"])
        .arg("--template")
        .arg(dir.path().join("template.json"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error: failed to read image"));
    assert!(!dir.path().join("template.json").exists());
}

#[test]
fn malformed_config_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("formscan.json");
    std::fs::write(&config, "{ not json").expect("write");
    cli()
        .args(["form.jpg", "1", "2000", "1400", "230"])
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .code(1);
}
