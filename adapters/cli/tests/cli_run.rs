use std::process::Command;

fn scrapfield() -> Command {
    Command::new(env!("CARGO_BIN_EXE_scrapfield"))
}

#[test]
fn headless_run_prints_the_banner_and_a_summary() {
    let output = scrapfield()
        .args(["--seed", "3", "--ticks", "120", "--dt-ms", "16"])
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to launch scrapfield");

    assert!(
        output.status.success(),
        "scrapfield failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Welcome to Scrapfield."));
    assert!(stdout.contains("tick 120 level 1"), "unexpected summary: {stdout}");
}

#[test]
fn runs_replay_identically_for_a_seed() {
    let run = || {
        scrapfield()
            .args(["--seed", "11", "--ticks", "600"])
            .env("RUST_LOG", "off")
            .output()
            .expect("failed to launch scrapfield")
            .stdout
    };

    assert_eq!(run(), run());
}

#[test]
fn unreadable_config_fails_with_context() {
    let output = scrapfield()
        .args(["--config", "/nonexistent/scrapfield.toml", "--ticks", "1"])
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to launch scrapfield");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to read tuning file"));
}

#[test]
fn zero_frame_length_is_rejected() {
    let output = scrapfield()
        .args(["--dt-ms", "0", "--ticks", "1"])
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to launch scrapfield");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("frame duration must be positive"));
}
