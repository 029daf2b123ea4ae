use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn manai() -> Command {
    Command::cargo_bin("manai").unwrap()
}

#[test]
fn help_lists_commands() {
    manai()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ocr"))
        .stdout(predicate::str::contains("detect"))
        .stdout(predicate::str::contains("models"));
}

#[test]
fn config_init_get_set() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");

    manai()
        .args(["--config", config.to_str().unwrap(), "config", "init"])
        .assert()
        .success();
    assert!(config.exists());

    manai()
        .args(["--config", config.to_str().unwrap(), "config", "get", "ocr.iou_threshold"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0.45"));

    manai()
        .args([
            "--config",
            config.to_str().unwrap(),
            "config",
            "set",
            "ocr.confidence_threshold",
            "0.7",
        ])
        .assert()
        .success();

    manai()
        .args([
            "--config",
            config.to_str().unwrap(),
            "config",
            "get",
            "ocr.confidence_threshold",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("0.7"));
}

#[test]
fn config_init_refuses_to_overwrite() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");
    std::fs::write(&config, "{}").unwrap();

    manai()
        .args(["--config", config.to_str().unwrap(), "config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn config_get_unknown_key_fails() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");

    manai()
        .args(["--config", config.to_str().unwrap(), "config", "get", "ocr.nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));
}

#[test]
fn models_install_and_status() {
    let source = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    for name in [
        "textdetector.onnx",
        "encoder.onnx",
        "decoder_first.onnx",
        "decoder_with_past.onnx",
        "vocab.txt",
    ] {
        std::fs::write(source.path().join(name), b"stub").unwrap();
    }
    let model_dir = target.path().join("models");

    manai()
        .args(["models", "--model-dir", model_dir.to_str().unwrap(), "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("missing"));

    manai()
        .args([
            "models",
            "--model-dir",
            model_dir.to_str().unwrap(),
            "install",
            "--from",
            source.path().to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Installed 5 files"));

    assert!(model_dir.join("decoder_with_past.onnx").exists());

    manai()
        .args(["models", "--model-dir", model_dir.to_str().unwrap(), "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ready"));
}

#[test]
fn ocr_missing_input_fails() {
    let dir = TempDir::new().unwrap();

    manai()
        .current_dir(dir.path())
        .args(["ocr", "no_such_page.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn ocr_without_models_reports_missing_asset() {
    let dir = TempDir::new().unwrap();
    let page = dir.path().join("page.png");
    image::RgbImage::new(32, 48).save(&page).unwrap();

    manai()
        .args([
            "ocr",
            page.to_str().unwrap(),
            "--model-dir",
            dir.path().join("models").to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing model asset"));
}

#[test]
fn batch_without_matches_fails() {
    let dir = TempDir::new().unwrap();
    let pattern = dir.path().join("*.png");

    manai()
        .args(["batch", pattern.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files"));
}
