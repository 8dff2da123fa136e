//! Orchestrator rows against fake runners written as shell scripts, and
//! against the real runner on the simulated driver
#![cfg(unix)]

use rfaria::driver::Backend;
use rfaria::orchestrator::{Orchestrator, RunOptions};
use rfaria::tap::Console;
use rfaria::Error;
use serde_json::json;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Shell prologue: pick the payload directory, log file and browser
/// arguments out of the runner's command line
const PROLOGUE: &str = r#"#!/bin/sh
for arg in "$@"; do
  case "$arg" in
    --payload=*) payload="${arg#--payload=}" ;;
    --log=*) log="${arg#--log=}" ;;
    --chrome=*) chrome="${arg#--chrome=}" ;;
    --driver=*) driver="${arg#--driver=}" ;;
  esac
done
"#;

fn fake_runner(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-runner");
    std::fs::write(&path, format!("{}{}", PROLOGUE, body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn scenario(dir: &Path) -> PathBuf {
    let path = dir.join("menu.json");
    std::fs::write(
        &path,
        r#"{"describe":"Menus","checks":[{"it":"works","pattern":"menuButton","label":"Actions"}]}"#,
    )
    .unwrap();
    path
}

fn options(dir: &Path, runner: PathBuf) -> RunOptions {
    RunOptions {
        url: "https://example.com/".into(),
        scenarios: vec![scenario(dir)],
        target: PathBuf::from("/opt/chrome/chrome"),
        runner: Some(runner),
        timeout: Duration::from_secs(20),
        ..RunOptions::default()
    }
}

const WRITES_RESULTS: &str = r#"
echo "$payload" > "$OUT/payload.txt"
echo "$chrome $driver" > "$OUT/browser.txt"
echo '[1:INFO:CONSOLE(3)] "[TAP]TAP version 13[TAP]", source: feature.js (3)' >> "$log"
echo '[1:INFO:CONSOLE(9)] "[DEBUG]{role: popUpButton}[DEBUG]", source: feature.js (9)' >> "$log"
echo '[1:WARNING:gpu.cc(12)] noise' >> "$log"
echo '[1:INFO:CONSOLE(3)] "[TAP]ok 1 - opens[TAP]", source: feature.js (3)' >> "$log"
echo '[1:INFO:CONSOLE(3)] "[TAP]not ok 2 - closes[TAP]", source: feature.js (3)' >> "$log"
echo '[1:INFO:CONSOLE(3)] "[TAP]  # expected false[TAP]", source: feature.js (3)' >> "$log"
echo '[1:INFO:CONSOLE(3)] "[TAP]1..2[TAP]", source: feature.js (3)' >> "$log"
"#;

fn with_out(body: &str, out: &Path) -> String {
    body.replace("$OUT", &out.display().to_string())
}

#[tokio::test]
async fn collects_tap_lines_and_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let target = fake_runner(dir.path(), &with_out(WRITES_RESULTS, dir.path()));
    let console = Console::memory();
    let outcomes = Orchestrator::new(options(dir.path(), target))
        .with_console(console.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 1);
    let row = &outcomes[0];
    assert!(!row.timed_out);
    assert_eq!(row.exit_code, Some(0));
    assert_eq!(row.summary.total(), 2);
    assert_eq!(row.summary.failed(), 1);
    assert_eq!(row.summary.records[1].detail.as_deref(), Some("expected false"));

    let printed = console.contents();
    let mut lines = printed.lines();
    assert!(lines.next().unwrap().starts_with("# Execute test suite: "));
    assert!(printed.contains("on site: https://example.com/"));
    assert_eq!(lines.next(), Some("TAP version 13"));
    assert_eq!(lines.next(), Some("ok 1 - opens"));
    assert!(!printed.contains("popUpButton"));
    assert!(!printed.contains("noise"));

    let payload = std::fs::read_to_string(dir.path().join("payload.txt")).unwrap();
    assert!(!Path::new(payload.trim()).exists());
    let browser = std::fs::read_to_string(dir.path().join("browser.txt")).unwrap();
    assert_eq!(browser.trim(), "/opt/chrome/chrome cdp");
}

#[tokio::test]
async fn verbose_runs_print_the_debug_channel() {
    let dir = tempfile::tempdir().unwrap();
    let target = fake_runner(dir.path(), &with_out(WRITES_RESULTS, dir.path()));
    let console = Console::memory();
    Orchestrator::new(RunOptions {
        verbose: 1,
        ..options(dir.path(), target)
    })
    .with_console(console.clone())
    .run()
    .await
    .unwrap();
    assert!(console.contents().contains("{role: popUpButton}"));
}

#[tokio::test]
async fn hanging_target_is_killed_and_the_row_completes() {
    let dir = tempfile::tempdir().unwrap();
    let body = with_out("echo \"$payload\" > \"$OUT/payload.txt\"\nexec sleep 30\n", dir.path());
    let target = fake_runner(dir.path(), &body);
    let console = Console::memory();
    let started = Instant::now();
    let outcomes = Orchestrator::new(RunOptions {
        timeout: Duration::from_millis(500),
        ..options(dir.path(), target)
    })
    .with_console(console.clone())
    .run()
    .await
    .unwrap();

    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(outcomes[0].timed_out);
    assert_eq!(outcomes[0].summary.total(), 0);
    assert!(console
        .contents()
        .contains("# Execution time exceeded (0.5 seconds) - killing process."));
    let payload = std::fs::read_to_string(dir.path().join("payload.txt")).unwrap();
    assert!(!Path::new(payload.trim()).exists());
}

#[tokio::test]
async fn each_row_gets_its_own_payload() {
    let dir = tempfile::tempdir().unwrap();
    let body = with_out(
        "cat \"$payload/dataset.js\" >> \"$OUT/datasets.txt\"\necho >> \"$OUT/datasets.txt\"\n\
         ls \"$payload\" > \"$OUT/listing.txt\"\n\
         grep -c '// Feature file: ' \"$payload/feature.bundle\" > \"$OUT/features.txt\"\n",
        dir.path(),
    );
    let target = fake_runner(dir.path(), &body);
    let template = dir.path().join("template");
    std::fs::create_dir(&template).unwrap();
    std::fs::write(template.join("manifest.json"), "{}").unwrap();
    let preflight = dir.path().join("login.js");
    std::fs::write(&preflight, "login()").unwrap();

    let outcomes = Orchestrator::new(RunOptions {
        dataset: vec![json!({"page": "Contact"}), json!({"page": "Blog"})],
        template: Some(template),
        preflight: vec![preflight],
        timeout: Duration::from_secs(12),
        ..options(dir.path(), target)
    })
    .with_console(Console::memory())
    .run()
    .await
    .unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[1].row, 1);

    let datasets = std::fs::read_to_string(dir.path().join("datasets.txt")).unwrap();
    let rows: Vec<&str> = datasets.lines().filter(|l| !l.is_empty()).collect();
    assert_eq!(
        rows,
        [
            r#"window.state = {"page":"Contact"}; window.timeout = 10000; window.startUrl = "https://example.com/";"#,
            r#"window.state = {"page":"Blog"}; window.timeout = 10000; window.startUrl = "https://example.com/";"#,
        ]
    );
    let listing = std::fs::read_to_string(dir.path().join("listing.txt")).unwrap();
    for file in ["manifest.json", "preflight0.js", "feature.bundle", "dataset.js", "dataset.json"] {
        assert!(listing.lines().any(|l| l == file), "{} missing from payload", file);
    }
    let features = std::fs::read_to_string(dir.path().join("features.txt")).unwrap();
    assert_eq!(features.trim(), "1");
}

#[tokio::test]
async fn launch_failure_stops_the_remaining_rows() {
    let dir = tempfile::tempdir().unwrap();
    let console = Console::memory();
    let result = Orchestrator::new(RunOptions {
        dataset: vec![json!({}), json!({})],
        ..options(dir.path(), dir.path().join("missing-runner"))
    })
    .with_console(console.clone())
    .run()
    .await;
    assert!(matches!(result, Err(Error::Launch(_))));
    // only the suite header made it out
    assert_eq!(console.contents().lines().count(), 1);
}

#[tokio::test]
async fn runner_writes_results_the_collector_reads() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = dir.path().join("blank.json");
    std::fs::write(
        &scenario,
        r#"{"describe":"Blank page","checks":[
            {"it":"Regions are labelled","pattern":"pageRegionLabels"},
            {"it":"Search button works","pattern":"button","label":"Search"}]}"#,
    )
    .unwrap();
    let console = Console::memory();
    let outcomes = Orchestrator::new(RunOptions {
        url: "about:blank".into(),
        scenarios: vec![scenario],
        runner: Some(PathBuf::from(env!("CARGO_BIN_EXE_rfaria"))),
        backend: Backend::Sim,
        timeout: Duration::from_secs(30),
        ..RunOptions::default()
    })
    .with_console(console.clone())
    .run()
    .await
    .unwrap();

    let row = &outcomes[0];
    assert!(!row.timed_out);
    assert_eq!(row.exit_code, Some(0));
    assert!(row.summary.passed() >= 1);
    assert_eq!(row.summary.failed(), 1);
    let failed = row.summary.records.iter().find(|r| !r.passed()).unwrap();
    assert!(failed.title.ends_with("\"Search\" is present"), "{}", failed.title);

    let printed = console.contents();
    assert!(printed.contains("TAP version 13"));
    assert!(printed.contains("# Blank page"));
    assert!(printed.contains("not ok "));
    assert!(!printed.contains("[TAP]"));
}

#[tokio::test]
async fn runner_without_a_usable_driver_bails_out_in_the_log() {
    let dir = tempfile::tempdir().unwrap();
    let console = Console::memory();
    let outcomes = Orchestrator::new(RunOptions {
        runner: Some(PathBuf::from(env!("CARGO_BIN_EXE_rfaria"))),
        target: dir.path().join("no-such-chrome"),
        timeout: Duration::from_secs(30),
        ..options(dir.path(), PathBuf::new())
    })
    .with_console(console.clone())
    .run()
    .await
    .unwrap();

    assert_eq!(outcomes[0].exit_code, Some(1));
    assert_eq!(outcomes[0].summary.total(), 0);
    assert!(console.contents().contains("Bail out! # "));
}
