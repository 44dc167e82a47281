//! Integration tests for tapesat-cli.
//!
//! These run the built `tapesat` binary against temporary WAV and preset files.

use std::process::Command;

use tapesat_config::Preset;
use tapesat_core::AudioBuffer;
use tapesat_io::{WavSpec, read_wav, write_wav};
use tempfile::TempDir;

fn tapesat_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_tapesat"))
}

fn write_sine(dir: &TempDir, name: &str, channels: usize, frames: usize) -> std::path::PathBuf {
    let mut buffer = AudioBuffer::new(channels, frames);
    for ch in buffer.channels_mut() {
        for (i, s) in ch.iter_mut().enumerate() {
            *s = 0.25 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 48000.0).sin();
        }
    }
    let path = dir.path().join(name);
    write_wav(&path, &buffer, WavSpec::default()).unwrap();
    path
}

// ---------------------------------------------------------------------------
// tapesat presets
// ---------------------------------------------------------------------------

#[test]
fn presets_list_shows_factory_presets() {
    let output = tapesat_bin()
        .args(["presets", "list", "--factory"])
        .output()
        .expect("failed to run tapesat presets list");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["clean", "warm", "hot", "dusty"] {
        assert!(stdout.contains(name), "listing should contain '{name}'");
    }
}

#[test]
fn presets_show_prints_every_parameter() {
    let output = tapesat_bin().args(["presets", "show", "hot"]).output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["Saturation", "Drive", "Mix", "Hiss"] {
        assert!(stdout.contains(name), "show should contain '{name}'");
    }
}

#[test]
fn presets_show_unknown_fails() {
    let output = tapesat_bin()
        .args(["presets", "show", "definitely-not-a-preset"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn presets_save_to_explicit_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mine.toml");

    let output = tapesat_bin()
        .args(["presets", "save", "mine", "--preset", "warm", "--drive", "6"])
        .arg("--output")
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let snapshot = Preset::load(&path).unwrap().snapshot().unwrap();
    assert_eq!(snapshot.drive, 6.0);
    assert_eq!(snapshot.saturation, 35.0);

    // Second save without --force refuses to overwrite
    let again = tapesat_bin()
        .args(["presets", "save", "mine", "--output"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(!again.status.success());
}

// ---------------------------------------------------------------------------
// tapesat process / scope / info
// ---------------------------------------------------------------------------

#[test]
fn process_renders_a_file() {
    let dir = TempDir::new().unwrap();
    let input = write_sine(&dir, "in.wav", 2, 24000);
    let out = dir.path().join("out.wav");

    let output = tapesat_bin()
        .arg("process")
        .arg(&input)
        .arg(&out)
        .args(["--preset", "warm", "--mix", "100", "--bit-depth", "24", "--seed", "7"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let (rendered, spec) = read_wav(&out).unwrap();
    assert_eq!(spec.bits_per_sample, 24);
    assert_eq!(rendered.num_channels(), 2);
    assert_eq!(rendered.num_samples(), 24000);
    assert!(rendered.channels().flatten().all(|s| s.is_finite()));
}

#[test]
fn process_missing_input_fails() {
    let dir = TempDir::new().unwrap();
    let output = tapesat_bin()
        .arg("process")
        .arg(dir.path().join("nope.wav"))
        .arg(dir.path().join("out.wav"))
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn scope_prints_requested_rows() {
    let dir = TempDir::new().unwrap();
    let input = write_sine(&dir, "mono.wav", 1, 48000);

    let output = tapesat_bin()
        .arg("scope")
        .arg(&input)
        .args(["--rows", "8", "--channel", "1", "--mix", "100"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().filter(|l| l.contains(" dB |")).count(), 8);
}

#[test]
fn scope_rejects_short_input() {
    let dir = TempDir::new().unwrap();
    let input = write_sine(&dir, "short.wav", 1, 100);
    let output = tapesat_bin().arg("scope").arg(&input).output().unwrap();
    assert!(!output.status.success());
}

#[test]
fn info_reports_latency() {
    let output = tapesat_bin()
        .args(["info", "--sample-rate", "44100"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Latency:"));
    assert!(stdout.contains("44100 Hz"));
}
