//! Integration tests for the command line interface.
//!
//! Every test points the config directory at a fresh temporary home so the
//! user's own configuration never leaks in.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::thread;
use tempfile::TempDir;

const DEER_RESPONSE: &str = r#"{
    "image": {"width": 64, "height": 48},
    "predictions": [
        {"x": 20, "y": 20, "width": 10, "height": 10, "confidence": 0.91, "class": "deer"}
    ]
}"#;

fn trailsort(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("trailsort");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("APPDATA", home.join("AppData"))
        .env_remove("TRAILSORT_INPUT_DIR")
        .env_remove("TRAILSORT_OUTPUT_DIR")
        .env_remove("TRAILSORT_BACKEND")
        .env_remove("TRAILSORT_API_KEY")
        .env_remove("TRAILSORT_CONFIG")
        .env_remove("RUST_LOG")
        .env_remove("HTTP_PROXY")
        .env_remove("http_proxy")
        .env_remove("ALL_PROXY")
        .env_remove("all_proxy");
    cmd
}

fn config_path(home: &Path) -> PathBuf {
    let output = trailsort(home).args(["config", "path"]).output().unwrap();
    PathBuf::from(String::from_utf8(output.stdout).unwrap().trim())
}

fn write_config(home: &Path, contents: &str) {
    let path = config_path(home);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

/// Answer every request on a local port with the same detection response.
fn serve_detections(body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut content_length = 0;
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
                    break;
                }
                if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap_or(0);
                }
            }
            let mut request_body = vec![0; content_length];
            let _ = reader.read_exact(&mut request_body);

            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    format!("http://{addr}")
}

fn write_remote_config(home: &Path, endpoint: &str, extra: &str) {
    write_config(
        home,
        &format!(
            r#"{extra}
[backends.trailcam]
type = "remote"
endpoint = "{endpoint}"
model_id = "trailcam/3"
api_key = "test-key"
"#
        ),
    );
}

fn write_photo(path: &Path) {
    image::RgbImage::new(64, 48).save(path).unwrap();
}

#[test]
fn test_help_describes_tool() {
    let home = TempDir::new().unwrap();
    trailsort(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("trail camera"))
        .stdout(predicate::str::contains("--save-all"));
}

#[test]
fn test_config_path_points_into_home() {
    let home = TempDir::new().unwrap();
    let path = config_path(home.path());
    assert!(path.ends_with("config.toml"));
    assert!(path.starts_with(home.path()));
}

#[test]
fn test_config_init_then_backends_list() {
    let home = TempDir::new().unwrap();
    trailsort(home.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));
    assert!(config_path(home.path()).exists());

    trailsort(home.path())
        .args(["backends", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No backends configured."));
}

#[test]
fn test_missing_input_dir_fails_before_creating_output() {
    let home = TempDir::new().unwrap();
    let output = home.path().join("processed_wildlife");

    trailsort(home.path())
        .arg(home.path().join("no_such_photos"))
        .arg("-o")
        .arg(&output)
        .args(["-b", "yolov8n"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
    assert!(!output.exists());
}

#[test]
fn test_unknown_backend_is_fatal() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("photos");
    std::fs::create_dir(&input).unwrap();

    trailsort(home.path())
        .arg(&input)
        .arg("-o")
        .arg(home.path().join("out"))
        .args(["-b", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("backend 'missing' not found"));
}

#[test]
fn test_no_backend_configured_is_fatal() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("photos");
    std::fs::create_dir(&input).unwrap();

    trailsort(home.path())
        .arg(&input)
        .arg("-o")
        .arg(home.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no backend specified"));
}

#[test]
fn test_remote_backend_without_key_is_fatal() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("photos");
    std::fs::create_dir(&input).unwrap();
    write_config(
        home.path(),
        r#"
[backends.trailcam]
type = "remote"
model_id = "trailcam/3"
"#,
    );

    trailsort(home.path())
        .arg(&input)
        .arg("-o")
        .arg(home.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("requires an API key"));
}

#[test]
fn test_backends_check_reports_missing_model() {
    let home = TempDir::new().unwrap();
    write_config(
        home.path(),
        r#"
[defaults]
backend = "yolov8n"

[backends.yolov8n]
type = "local"
path = "/nonexistent/yolov8n.onnx"
labels = "/nonexistent/coco.names"
"#,
    );

    trailsort(home.path())
        .args(["backends", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("yolov8n (local)"))
        .stdout(predicate::str::contains("[default]"));

    trailsort(home.path())
        .args(["backends", "check"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("model file does not exist"));
}

#[test]
fn test_config_show_masks_api_key() {
    let home = TempDir::new().unwrap();
    write_config(
        home.path(),
        r#"
[backends.trailcam]
type = "remote"
model_id = "trailcam/3"
api_key = "super-secret"
"#,
    );

    trailsort(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("trailcam/3"))
        .stdout(predicate::str::contains("super-secret").not());
}

#[test]
fn test_invalid_confidence_rejected_by_parser() {
    let home = TempDir::new().unwrap();
    trailsort(home.path())
        .args(["photos", "-c", "1.7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("1.7"));
}

#[test]
fn test_inspect_rejects_directory() {
    let home = TempDir::new().unwrap();
    write_remote_config(home.path(), "http://127.0.0.1:9", "");

    trailsort(home.path())
        .arg("inspect")
        .arg(home.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a file"));
}

#[test]
fn test_inspect_rejects_invalid_config() {
    let home = TempDir::new().unwrap();
    let photo = home.path().join("IMG_0001.png");
    write_photo(&photo);
    write_remote_config(
        home.path(),
        "http://127.0.0.1:9",
        "[defaults]\nmin_confidence = 1.5\n",
    );

    trailsort(home.path())
        .arg("inspect")
        .arg(&photo)
        .assert()
        .failure()
        .stderr(predicate::str::contains("min_confidence"));
}

#[test]
fn test_inspect_reports_output_name_without_writing() {
    let home = TempDir::new().unwrap();
    let photos = home.path().join("photos");
    std::fs::create_dir(&photos).unwrap();
    let photo = photos.join("IMG_0001.png");
    write_photo(&photo);
    let endpoint = serve_detections(DEER_RESPONSE);
    write_remote_config(home.path(), &endpoint, "");

    trailsort(home.path())
        .args(["inspect", "--all"])
        .arg(&photo)
        .assert()
        .success()
        .stdout(predicate::str::contains("Dimensions:  64x48"))
        .stdout(predicate::str::contains("1 raw, 1 accepted"))
        .stdout(predicate::str::is_match(r"Output name: \S+_deer\.png").unwrap());

    assert_eq!(std::fs::read_dir(&photos).unwrap().count(), 1);
}

#[test]
fn test_quiet_run_still_prints_summary() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("photos");
    let output = home.path().join("processed");
    std::fs::create_dir(&input).unwrap();
    write_photo(&input.join("IMG_0001.png"));
    write_photo(&input.join("IMG_0002.png"));
    let endpoint = serve_detections(DEER_RESPONSE);
    write_remote_config(home.path(), &endpoint, "");

    trailsort(home.path())
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("-q")
        .assert()
        .success()
        .stdout(predicate::str::contains("Processing complete"))
        .stdout(predicate::str::contains("Images with wildlife:   2"))
        .stdout(predicate::str::contains("deer: 2"));
}

#[test]
fn test_config_env_overrides_platform_path() {
    let home = TempDir::new().unwrap();
    let custom = home.path().join("cams").join("trailsort.toml");

    trailsort(home.path())
        .env("TRAILSORT_CONFIG", &custom)
        .args(["config", "init"])
        .assert()
        .success();

    assert!(custom.exists());
    assert!(!config_path(home.path()).exists());
}
