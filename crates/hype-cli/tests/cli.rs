use std::fs;
use std::path::Path;

use assert_cmd::Command;
use hype_cli::ExitCode;
use hype_test_support::{write_fixture, SAMPLE_DOCUMENT};
use predicates::prelude::*;
use tempfile::TempDir;

/// `hype` binary isolated from the user's config directory and environment.
fn hype(config_home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("hype").expect("binary");
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env("HOME", config_home)
        .env_remove("RUST_LOG");
    for key in ["BASIC", "VERBOSE", "FORCE", "ROOT", "PORT", "HOST"] {
        cmd.env_remove(format!("HYPE_{key}"));
    }
    cmd
}

#[test]
fn converts_file_to_file() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_fixture(temp.path(), "a.md", SAMPLE_DOCUMENT);
    let output = temp.path().join("site/a.html");

    hype(temp.path())
        .arg("convert")
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let html = fs::read_to_string(&output).expect("read output");
    assert!(html.contains("<del>strike</del>"), "{html}");
    assert!(html.contains("type=\"checkbox\""), "{html}");
    assert!(html.contains("<div class=\"raw\">inline html</div>"), "{html}");
}

#[test]
fn converts_stdin_to_stdout_by_default() {
    let temp = TempDir::new().expect("tempdir");

    hype(temp.path())
        .arg("convert")
        .write_stdin("# Title\n\n~~gone~~\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("<del>gone</del>"))
        .stdout(predicate::str::contains("id=\"title\""));
}

#[test]
fn basic_flag_disables_extensions() {
    let temp = TempDir::new().expect("tempdir");

    hype(temp.path())
        .args(["--basic", "convert", "-i", "-", "-o", "-"])
        .write_stdin("~~strike~~ :smile: <b>x</b>\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("~~strike~~ :smile: &lt;b&gt;x&lt;/b&gt;"));
}

#[test]
fn basic_flag_is_accepted_after_subcommand() {
    let temp = TempDir::new().expect("tempdir");

    hype(temp.path())
        .args(["convert", "-b"])
        .write_stdin("~~strike~~\n")
        .assert()
        .success()
        .stdout("<p>~~strike~~</p>\n");
}

#[test]
fn missing_input_reports_not_found() {
    let temp = TempDir::new().expect("tempdir");
    let output = temp.path().join("out.html");

    hype(temp.path())
        .arg("convert")
        .arg("-i")
        .arg(temp.path().join("absent.md"))
        .arg("-o")
        .arg(&output)
        .assert()
        .failure()
        .code(ExitCode::InputNotFound as i32)
        .stderr(predicate::str::contains("absent.md not found"));

    assert!(!output.exists());
}

#[test]
fn existing_output_is_preserved_without_force() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_fixture(temp.path(), "a.md", "# Fresh\n");
    let output = write_fixture(temp.path(), "b.html", "<p>keep me</p>");

    hype(temp.path())
        .arg("convert")
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .failure()
        .code(ExitCode::OutputExists as i32)
        .stderr(predicate::str::contains("already exists, use --force"));

    assert_eq!(fs::read(&output).expect("read"), b"<p>keep me</p>");

    hype(temp.path())
        .arg("convert")
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .arg("--force")
        .assert()
        .success();

    let html = fs::read_to_string(&output).expect("read");
    assert!(html.contains("Fresh</h1>"), "{html}");
}

#[test]
fn config_file_enables_basic_mode() {
    let temp = TempDir::new().expect("tempdir");
    let config = write_fixture(temp.path(), "custom.toml", "basic = true\n");

    hype(temp.path())
        .arg("--config")
        .arg(&config)
        .arg("convert")
        .write_stdin("~~strike~~\n")
        .assert()
        .success()
        .stdout("<p>~~strike~~</p>\n");
}

// `dirs::config_dir` only follows XDG_CONFIG_HOME on Linux.
#[cfg(target_os = "linux")]
#[test]
fn yaml_config_in_config_dir_enables_basic_mode() {
    let temp = TempDir::new().expect("tempdir");
    write_fixture(temp.path(), "hyperc.yaml", "basic: true\n");

    hype(temp.path())
        .arg("convert")
        .write_stdin("~~strike~~\n")
        .assert()
        .success()
        .stdout("<p>~~strike~~</p>\n");
}

#[test]
fn unwritable_output_reports_io_failure() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_fixture(temp.path(), "a.md", "text\n");
    let blocker = write_fixture(temp.path(), "blocker", "file");

    hype(temp.path())
        .arg("convert")
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(blocker.join("out.html"))
        .assert()
        .failure()
        .code(ExitCode::Io as i32)
        .stderr(predicate::str::contains("failed to write"));
}

#[test]
fn environment_enables_force() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_fixture(temp.path(), "a.md", "new\n");
    let output = write_fixture(temp.path(), "b.html", "old");

    hype(temp.path())
        .env("HYPE_FORCE", "true")
        .arg("convert")
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&output).expect("read"), "<p>new</p>\n");
}

#[test]
fn missing_config_file_is_fatal() {
    let temp = TempDir::new().expect("tempdir");

    hype(temp.path())
        .arg("--config")
        .arg(temp.path().join("nope.toml"))
        .arg("convert")
        .write_stdin("x\n")
        .assert()
        .failure()
        .code(ExitCode::Failure as i32)
        .stderr(predicate::str::contains("nope.toml not found"));
}

#[test]
fn preview_rejects_missing_root() {
    let temp = TempDir::new().expect("tempdir");

    hype(temp.path())
        .arg("preview")
        .arg("--root")
        .arg(temp.path().join("absent"))
        .arg("--port")
        .arg("1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot serve root directory"));
}

#[test]
fn invert_is_not_a_command() {
    let temp = TempDir::new().expect("tempdir");

    hype(temp.path())
        .arg("invert")
        .arg("page.html")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}
