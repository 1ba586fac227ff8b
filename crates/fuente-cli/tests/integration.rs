//! Integration tests for fuente-cli.
//!
//! Tests cover invoking the `fuente` binary for each command and checking the
//! files it writes.

use std::process::Command;
use tempfile::TempDir;

/// Helper to get the path to the `fuente` binary built by cargo.
fn fuente_bin() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_fuente"));
    command.env("RUST_LOG", "warn");
    command
}

#[test]
fn cli_note_prints_label() {
    let output = fuente_bin()
        .args(["note", "61"])
        .output()
        .expect("failed to run fuente note");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("C4♯"), "unexpected output: {stdout}");
}

#[test]
fn cli_note_rejects_out_of_range() {
    let output = fuente_bin()
        .args(["note", "128"])
        .output()
        .expect("failed to run fuente note");
    assert!(!output.status.success());
}

#[test]
fn cli_render_sine_writes_stereo_wav() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out.wav");

    let output = fuente_bin()
        .args(["render", "--notes", "69:100:0.25,72:100:0.25", "--sine", "440", "--tail", "0.5", "-o"])
        .arg(&out)
        .output()
        .expect("failed to run fuente render");
    assert!(
        output.status.success(),
        "render failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let (pcm, spec) = fuente_io::read_wav_mono(&out).unwrap();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, 48000);
    assert_eq!(pcm.len(), 48000);
    assert!(pcm.iter().any(|&s| s.unsigned_abs() > 1000));
}

#[test]
fn cli_render_from_wav_sample() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.wav");
    let out = dir.path().join("out.wav");
    let tone: Vec<f32> = (0..4800).map(|i| (i as f32 * 0.05).sin() * 0.5).collect();
    fuente_io::write_wav_stereo(&input, &tone, &tone, fuente_io::WavSpec::default()).unwrap();

    let output = fuente_bin()
        .args(["render", "--notes", "60:127:0.05", "--loop", "--sample"])
        .arg(&input)
        .arg("-o")
        .arg(&out)
        .output()
        .expect("failed to run fuente render");
    assert!(
        output.status.success(),
        "render failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(out.exists());
}

#[test]
fn cli_render_rejects_bad_notes() {
    let dir = TempDir::new().unwrap();
    let output = fuente_bin()
        .args(["render", "--notes", "60:100", "-o"])
        .arg(dir.path().join("out.wav"))
        .output()
        .expect("failed to run fuente render");
    assert!(!output.status.success());
}

#[test]
fn cli_info_lists_structure() {
    let output = fuente_bin()
        .args(["info", "--sine", "261.6"])
        .output()
        .expect("failed to run fuente info");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Presets: 1"));
    assert!(stdout.contains("Samples: 1"));
    assert!(stdout.contains("sampleModes"), "unexpected output: {stdout}");
}

#[test]
fn cli_config_init_then_show() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("engine.toml");

    let output = fuente_bin()
        .args(["config", "--init"])
        .arg(&path)
        .output()
        .expect("failed to run fuente config");
    assert!(output.status.success());
    assert!(path.exists());

    let output = fuente_bin()
        .args(["config", "--show"])
        .arg(&path)
        .output()
        .expect("failed to run fuente config");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("voice_count = 32"));
}
