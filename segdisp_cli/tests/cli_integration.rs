use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Minimal valid config for the sim backend; [pins] is only needed on hardware.
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[refresh]
on_time_us = 900
blank_time_us = 80

[sampling]
channel = 6
# sample every ~16 ms so short runs see several readings
cadence_cycles = 4
conversion_timeout_ms = 5
poll_interval_us = 50
max_retries = 2

[sensor]
reference_mv = 5000
full_scale_counts = 1023

[display]
decimal_point = 2
blank_leading_zeros = true
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["render", "2537"], 0, "patterns: 0x5B 0xED 0x4F 0x07", "stdout")]
#[case(&["render", "120000"], 0, "patterns: 0x6F 0xEF 0x6F 0x6F", "stdout")]
#[case(&["render"], 2, "required", "stderr")]
#[case(&["self-check"], 0, "self-check ok: reading 24.93", "stdout")]
#[case(&["run", "--duration-ms", "150"], 0, "last reading 24.93", "stdout")]
#[case(&["run", "--duration-ms", "150", "--stats"], 0, "Refresh Stats", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("segdisp").unwrap();

    // Always include a valid config to avoid relying on default path
    cmd.arg("--config").arg(&cfg);
    cmd.env_remove("SEGDISP_SIM_MV").env_remove("SEGDISP_SIM_STALL");

    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
fn render_draws_the_panel_without_a_config_file() {
    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("segdisp").unwrap();
    cmd.arg("--config")
        .arg(dir.path().join("absent.toml"))
        .arg("render")
        .arg("512");
    // " 5.12": leading zero blanked, decimal point after the 5
    cmd.assert().success().stdout(
        predicate::str::contains("_       _")
            .and(predicate::str::contains("|_    |  _|"))
            .and(predicate::str::contains(" _|.  | |_")),
    );
}

#[rstest]
fn sim_voltage_is_taken_from_the_environment() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let mut cmd = Command::cargo_bin("segdisp").unwrap();
    // 300 mV -> 61 counts -> 29.81
    cmd.env("SEGDISP_SIM_MV", "300")
        .arg("--config")
        .arg(&cfg)
        .arg("self-check");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("29.81"));
}

#[rstest]
#[case("[refresh]\non_time_us = 0\n", "refresh.on_time_us must be > 0")]
#[case("[display]\ndecimal_point = 4\n", "display.decimal_point must be < 4")]
#[case("[sampling]\ncadence_cycles = \"often\"\n", "parse")]
fn bad_config_exits_four(#[case] toml: &str, #[case] needle: &str) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, toml).unwrap();

    let mut cmd = Command::cargo_bin("segdisp").unwrap();
    cmd.arg("--config").arg(&path).arg("self-check");
    cmd.assert().code(4).stderr(
        predicate::str::contains("What happened: The configuration could not be used")
            .and(predicate::str::contains(needle)),
    );
}

#[rstest]
fn missing_config_exits_four() {
    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("segdisp").unwrap();
    cmd.arg("--config")
        .arg(dir.path().join("absent.toml"))
        .arg("run");
    cmd.assert()
        .code(4)
        .stderr(predicate::str::contains("How to fix"));
}
