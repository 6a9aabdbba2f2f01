use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

const BOARD: [u8; 3] = [20, 60, 160];
const PAD: [u8; 3] = [230, 40, 200];
const CORNERS: [(u32, u32); 4] = [(20, 20), (140, 20), (20, 140), (140, 140)];

fn templates_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../testdata/templates.json")
}

/// 200x200 blue board with 40x40 magenta pads at the given corners.
fn write_board(path: &Path, pads: &[(u32, u32)]) {
    let img = image::RgbaImage::from_fn(200, 200, |x, y| {
        let on_pad = pads
            .iter()
            .any(|&(px, py)| (px..px + 40).contains(&x) && (py..py + 40).contains(&y));
        let [r, g, b] = if on_pad { PAD } else { BOARD };
        image::Rgba([r, g, b, 255])
    });
    img.save(path).expect("save png");
}

fn padcheck() -> Command {
    Command::cargo_bin("padcheck").expect("binary")
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("json on stdout")
}

struct Bench {
    dir: tempfile::TempDir,
}

impl Bench {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn board(&self, name: &str, pads: &[(u32, u32)]) -> PathBuf {
        let path = self.path(name);
        write_board(&path, pads);
        path
    }

    fn store(&self) -> PathBuf {
        self.path("refs.json")
    }

    fn capture(&self, image: &Path) {
        padcheck()
            .args(["capture", "--serial", "sn-1", "--side", "front", "--image"])
            .arg(image)
            .arg("--store")
            .arg(self.store())
            .assert()
            .success();
    }

    fn validate(&self, image: &Path) -> Command {
        let mut cmd = padcheck();
        cmd.args(["validate", "--serial", "SN-1", "--side", "front", "--image"])
            .arg(image)
            .arg("--store")
            .arg(self.store());
        cmd
    }
}

#[test]
fn detect_reports_four_pads_on_primary_path() {
    let bench = Bench::new();
    let image = bench.board("board.png", &CORNERS);

    let output = padcheck()
        .arg("detect")
        .arg("--image")
        .arg(&image)
        .output()
        .expect("run");
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["candidates"].as_array().map(Vec::len), Some(4));
    assert_eq!(json["path"]["path"], "primary");
    assert!(json["image"].as_str().is_some_and(|s| s.ends_with("board.png")));
}

#[test]
fn detect_writes_report_file() {
    let bench = Bench::new();
    let image = bench.board("board.png", &CORNERS);
    let out = bench.path("report.json");

    padcheck()
        .arg("detect")
        .arg("--image")
        .arg(&image)
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let json: Value = serde_json::from_str(&std::fs::read_to_string(&out).expect("read"))
        .expect("json");
    assert_eq!(json["candidates"].as_array().map(Vec::len), Some(4));
}

#[test]
fn unreadable_image_gives_empty_detection() {
    let bench = Bench::new();
    let image = bench.path("broken.png");
    std::fs::write(&image, b"definitely not a png").expect("write");

    let output = padcheck()
        .arg("detect")
        .arg("--image")
        .arg(&image)
        .output()
        .expect("run");
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["candidates"].as_array().map(Vec::len), Some(0));
    assert_eq!(json["path"]["path"], "failed");
}

#[test]
fn capture_then_validate_same_board_succeeds() {
    let bench = Bench::new();
    let image = bench.board("golden.png", &CORNERS);
    bench.capture(&image);

    let output = bench.validate(&image).output().expect("run");
    assert_eq!(output.status.code(), Some(0));

    let json = stdout_json(&output);
    assert_eq!(json["status"], "success");
    assert_eq!(json["matchedCount"], 4);
    assert_eq!(json["totalCount"], 4);
}

#[test]
fn half_the_pads_fails_with_exit_code_two() {
    let bench = Bench::new();
    bench.capture(&bench.board("golden.png", &CORNERS));
    let live = bench.board("live.png", &CORNERS[..2]);

    let output = bench.validate(&live).output().expect("run");
    assert_eq!(output.status.code(), Some(2));

    let json = stdout_json(&output);
    assert_eq!(json["status"], "fail");
    assert_eq!(json["matchedCount"], 2);
    assert_eq!(json["matchPercentage"], 50.0);
}

#[test]
fn missing_reference_is_an_error() {
    let bench = Bench::new();
    bench.capture(&bench.board("golden.png", &CORNERS));

    padcheck()
        .args(["validate", "--serial", "other", "--side", "back", "--image"])
        .arg(bench.path("golden.png"))
        .arg("--store")
        .arg(bench.store())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no reference found for OTHER_back"));
}

#[test]
fn blank_board_capture_needs_allow_empty() {
    let bench = Bench::new();
    let blank = bench.board("blank.png", &[]);

    padcheck()
        .args(["capture", "--serial", "SN-1", "--side", "front", "--image"])
        .arg(&blank)
        .arg("--store")
        .arg(bench.store())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no pads detected"));
    assert!(!bench.store().exists());

    padcheck()
        .args(["capture", "--serial", "SN-1", "--side", "front", "--allow-empty", "--image"])
        .arg(&blank)
        .arg("--store")
        .arg(bench.store())
        .assert()
        .success();

    bench
        .validate(&blank)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("reference holds no pad positions"));
}

#[test]
fn template_check_reports_missing_pads() {
    let bench = Bench::new();
    bench.capture(&bench.board("golden.png", &CORNERS));
    let live = bench.board("live.png", &CORNERS[..3]);

    let output = bench
        .validate(&live)
        .arg("--templates")
        .arg(templates_path())
        .args(["--product", "3U", "--variant", "3U-Basic"])
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(2));

    let json = stdout_json(&output);
    assert_eq!(json["status"], "fail");
    assert_eq!(json["missing"], 1);
    assert!(json.get("accuracy").is_none());
}

#[test]
fn template_check_reports_accuracy_when_counts_agree() {
    let bench = Bench::new();
    let image = bench.board("golden.png", &CORNERS);
    bench.capture(&image);

    let output = bench
        .validate(&image)
        .arg("--templates")
        .arg(templates_path())
        .args(["--product", "3U", "--variant", "3U-HighPower"])
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(0));

    let json = stdout_json(&output);
    assert_eq!(json["status"], "success");
    assert_eq!(json["accuracy"], 100.0);
}

#[test]
fn unknown_template_variant_is_an_error() {
    let bench = Bench::new();
    let image = bench.board("golden.png", &CORNERS);
    bench.capture(&image);

    bench
        .validate(&image)
        .arg("--templates")
        .arg(templates_path())
        .args(["--product", "3U", "--variant", "9U-Custom"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no template '9U-Custom' for product '3U'"));
}

#[test]
fn templates_are_listed() {
    let output = padcheck()
        .arg("templates")
        .arg("--templates")
        .arg(templates_path())
        .output()
        .expect("run");
    assert!(output.status.success());

    let json = stdout_json(&output);
    let rows = json.as_array().expect("array");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["variant"], "3U-Basic");
    assert_eq!(rows[1]["expectedPads"], 5);
    assert_eq!(rows[1]["requiredPads"], 4);
}

#[test]
fn watch_prints_one_result_per_tick() {
    let bench = Bench::new();
    bench.capture(&bench.board("golden.png", &CORNERS));

    let frames = bench.path("frames");
    std::fs::create_dir(&frames).expect("mkdir");
    write_board(&frames.join("000.png"), &CORNERS);
    write_board(&frames.join("001.png"), &CORNERS[..2]);

    let output = padcheck()
        .args(["watch", "--serial", "SN-1", "--side", "front"])
        .arg("--frames")
        .arg(&frames)
        .arg("--store")
        .arg(bench.store())
        .args(["--period-ms", "10", "--max-ticks", "2"])
        .output()
        .expect("run");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("utf8");
    let results: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["status"], "success");
    assert_eq!(results[1]["status"], "fail");
}

#[test]
fn delete_removes_the_reference() {
    let bench = Bench::new();
    let image = bench.board("golden.png", &CORNERS);
    bench.capture(&image);

    padcheck()
        .args(["delete", "--serial", "sn-1", "--side", "FRONT", "--store"])
        .arg(bench.store())
        .assert()
        .success()
        .stdout(predicate::str::contains("deleted SN-1_front"));

    bench
        .validate(&image)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no reference found"));

    padcheck()
        .args(["delete", "--serial", "sn-1", "--side", "front", "--store"])
        .arg(bench.store())
        .assert()
        .code(1);
}

#[test]
fn config_file_overrides_thresholds() {
    let bench = Bench::new();
    bench.capture(&bench.board("golden.png", &CORNERS));
    let live = bench.board("live.png", &CORNERS[..2]);

    let config = bench.path("padcheck.json");
    std::fs::write(
        &config,
        r#"{ "validation": { "success_percent": 50.0, "warning_percent": 25.0 } }"#,
    )
    .expect("write config");

    let output = bench
        .validate(&live)
        .arg("--config")
        .arg(&config)
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout_json(&output)["status"], "success");
}
