//! Scenario runs end to end over the simulator

use rfaria::driver::sim::Behavior;
use rfaria::driver::{widgets, SimDriver};
use rfaria::reader::ScreenReader;
use rfaria::scenario::{parse_bundle, run_payload, wrap_feature, Scenario, ScenarioRunner, BUNDLE_FILE, DATASET_FILE};
use rfaria::tap::{unframe, Console, RunSummary, TAP_MARKER};
use rfaria::tree::TreeSnapshot;
use rfaria::{RunContext, Timing};
use serde_json::json;

const HOME: &str = "sim://wooden-box/";
const PAGES: [(&str, &str); 5] = [
    ("Home", "sim://wooden-box/home"),
    ("Products", "sim://wooden-box/products"),
    ("About", "sim://wooden-box/about"),
    ("Blog", "sim://wooden-box/blog"),
    ("Contact", "sim://wooden-box/contact"),
];

fn site_page(tree: &mut TreeSnapshot, title: &str) -> Vec<Box<dyn Behavior>> {
    tree.set_title(title);
    let Some(root) = tree.root() else {
        return Vec::new();
    };
    vec![widgets::site_navigation(tree, root, "Site", &PAGES)]
}

/// A five-page site; every page carries the same navigation menu
fn wooden_box() -> SimDriver {
    let mut driver = SimDriver::new().with_page(HOME, |tree| site_page(tree, "Wooden Box"));
    for (title, url) in PAGES {
        driver = driver.with_page(url, move |tree| site_page(tree, title));
    }
    driver
}

const NAVIGATION: &str = r#"{
  "describe": "Site navigation",
  "checks": [
    { "it": "opens the menu and follows the dataset's page",
      "pattern": "navigationMenu", "toggle": "/Menu/", "link": "$page" }
  ]
}"#;

fn tap_lines(console: &Console) -> Vec<String> {
    console
        .contents()
        .lines()
        .filter_map(|l| unframe(TAP_MARKER, l))
        .collect()
}

#[tokio::test]
async fn navigation_scenario_passes_for_the_dataset_row() {
    let reader = ScreenReader::new(wooden_box(), Timing::immediate()).with_console(Console::memory());
    let ctx = RunContext {
        state: json!({"page": "Contact"}),
        start_url: HOME.into(),
        ..Default::default()
    };
    let console = Console::memory();
    let scenarios = Scenario::parse_all(NAVIGATION).unwrap();
    let summary = ScenarioRunner::new(&reader, &ctx, console.clone())
        .run(&scenarios)
        .await
        .unwrap();

    // navigation present, toggle found, closed, opens, link usable, title
    assert_eq!(summary.total(), 6);
    assert!(summary.all_passed(), "{:#?}", summary);
    assert_eq!(reader.get_page_title().await.unwrap().as_deref(), Some("Contact"));

    let lines = tap_lines(&console);
    assert_eq!(lines.first().map(String::as_str), Some("TAP version 13"));
    assert!(lines.contains(&"1..6".to_string()));
    assert_eq!(RunSummary::from_lines(lines.iter().map(String::as_str)), summary);
}

#[tokio::test]
async fn failures_are_recorded_and_the_run_continues() {
    let reader = ScreenReader::new(wooden_box(), Timing::immediate()).with_console(Console::memory());
    let ctx = RunContext {
        state: json!({"page": "Contact"}),
        start_url: HOME.into(),
        ..Default::default()
    };
    let scenarios = Scenario::parse_all(
        r#"[{"describe": "Broken", "checks": [
              {"it": "unknown dataset key", "pattern": "navigationMenu", "toggle": "Menu", "link": "$missing"},
              {"it": "no such tablist", "pattern": "tablist", "label": "Entertainment"},
              {"it": "menu still works", "pattern": "navigationMenu", "toggle": "Menu", "link": "About"}
            ]},
            {"describe": "Unreachable", "url": "sim://nowhere", "checks": []}]"#,
    )
    .unwrap();
    let summary = ScenarioRunner::new(&reader, &ctx, Console::memory())
        .run(&scenarios)
        .await
        .unwrap();

    let titles: Vec<&str> = summary.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles[0], "unknown dataset key");
    assert!(!summary.records[0].passed());
    assert!(summary.records[0].detail.as_deref().unwrap_or("").contains("missing"));
    assert!(!summary.records[1].passed());
    // the third check runs to completion after two failures
    assert_eq!(summary.records[2..8].iter().filter(|r| r.passed()).count(), 6);
    // the unreachable page is one failure
    assert_eq!(summary.total(), 9);
    assert_eq!(summary.failed(), 3);
}

#[tokio::test]
async fn provisioned_payload_runs_in_target() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(BUNDLE_FILE),
        wrap_feature("features/navigation.json", NAVIGATION),
    )
    .unwrap();
    std::fs::write(
        dir.path().join(DATASET_FILE),
        json!({"state": {"page": "Blog"}, "timeout": 58000, "startUrl": HOME}).to_string(),
    )
    .unwrap();
    assert_eq!(
        parse_bundle(&std::fs::read_to_string(dir.path().join(BUNDLE_FILE)).unwrap())
            .unwrap()[0]
            .0,
        "features/navigation.json"
    );

    let reader = ScreenReader::new(wooden_box(), Timing::immediate()).with_console(Console::memory());
    let console = Console::memory();
    let summary = run_payload(&reader, dir.path(), console.clone()).await.unwrap();
    assert_eq!(summary.total(), 6);
    assert!(summary.all_passed());
    assert_eq!(reader.get_page_title().await.unwrap().as_deref(), Some("Blog"));
    assert!(console.contents().contains("[TAP]# pass  6[TAP]"));
}
