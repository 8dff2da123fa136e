//! In-target scenario runner
//!
//! A scenario file holds one [`Scenario`] or an array of them as JSON:
//!
//! ```json
//! {
//!   "describe": "WAI-ARIA menu button",
//!   "url": "https://www.w3.org/TR/wai-aria-practices-1.1/examples/menu-button/menu-button-actions.html",
//!   "checks": [
//!     { "it": "Menu button using actions is accessible", "pattern": "menuButton", "label": "Actions" }
//!   ]
//! }
//! ```
//!
//! The orchestrator concatenates scenario files into one feature bundle,
//! each wrapped in provenance markers; [`parse_bundle`] splits it again.

use crate::driver::Driver;
use crate::protocols::Protocol;
use crate::reader::ScreenReader;
use crate::tap::{Console, RunSummary, TapWriter};
use crate::{Error, Result, RunContext};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Opens a feature file inside a bundle; the file name follows
pub const FEATURE_BEGIN: &str = "// Feature file: ";
pub const FEATURE_END: &str = "// End of feature file";

/// File names inside a payload directory
pub const BUNDLE_FILE: &str = "feature.bundle";
pub const DATASET_FILE: &str = "dataset.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    pub it: String,
    #[serde(flatten)]
    pub protocol: Protocol,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub describe: String,
    /// Page to load first; the run's start URL when absent
    #[serde(default)]
    pub url: Option<String>,
    pub checks: Vec<Check>,
}

impl Scenario {
    /// Parse one scenario or an array of scenarios
    pub fn parse_all(text: &str) -> Result<Vec<Scenario>> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum OneOrMany {
            Many(Vec<Scenario>),
            One(Scenario),
        }
        Ok(match serde_json::from_str(text)? {
            OneOrMany::Many(all) => all,
            OneOrMany::One(one) => vec![one],
        })
    }

    pub fn load(path: &Path) -> Result<Vec<Scenario>> {
        let text = std::fs::read_to_string(path)?;
        Self::parse_all(&text)
    }
}

/// Wrap one feature file for the bundle
pub fn wrap_feature(name: &str, content: &str) -> String {
    format!("\n{}{}\n{}\n{}\n", FEATURE_BEGIN, name, content.trim_end(), FEATURE_END)
}

/// Split a feature bundle into `(file name, scenarios)` in bundle order
pub fn parse_bundle(text: &str) -> Result<Vec<(String, Vec<Scenario>)>> {
    let mut out = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;
    for line in text.lines() {
        if let Some(name) = line.strip_prefix(FEATURE_BEGIN) {
            if current.is_some() {
                return Err(Error::ConfigError(format!(
                    "feature file {} starts before the previous one ends",
                    name
                )));
            }
            current = Some((name.to_string(), Vec::new()));
        } else if line == FEATURE_END {
            let Some((name, body)) = current.take() else {
                return Err(Error::ConfigError("unbalanced feature file marker".into()));
            };
            let scenarios = Scenario::parse_all(&body.join("\n"))
                .map_err(|e| Error::ConfigError(format!("{}: {}", name, e)))?;
            out.push((name, scenarios));
        } else if let Some((_, body)) = current.as_mut() {
            body.push(line);
        }
    }
    if let Some((name, _)) = current {
        return Err(Error::ConfigError(format!("feature file {} is not closed", name)));
    }
    Ok(out)
}

/// Runs scenarios in declaration order and reports them over TAP
pub struct ScenarioRunner<'a, D: Driver> {
    reader: &'a ScreenReader<D>,
    ctx: &'a RunContext,
    tap: TapWriter,
}

impl<'a, D: Driver> ScenarioRunner<'a, D> {
    pub fn new(reader: &'a ScreenReader<D>, ctx: &'a RunContext, console: Console) -> Self {
        Self {
            reader,
            ctx,
            tap: TapWriter::new(console),
        }
    }

    /// Run everything, then write the plan and trailer
    pub async fn run(mut self, scenarios: &[Scenario]) -> Result<RunSummary> {
        self.tap.header()?;
        for scenario in scenarios {
            self.run_scenario(scenario).await?;
        }
        self.tap.finish()
    }

    async fn run_scenario(&mut self, scenario: &Scenario) -> Result<()> {
        self.tap.comment(&scenario.describe)?;
        let url = scenario.url.as_deref().unwrap_or(&self.ctx.start_url);
        if let Err(e) = self.reader.set_page_url(url).await {
            self.tap.explain(format!("{}: load {}", scenario.describe, url));
            self.tap.record(false, Some(&e.to_string()))?;
            return Ok(());
        }
        for check in &scenario.checks {
            self.run_check(check).await?;
        }
        Ok(())
    }

    /// A failed assertion is normally already on record; anything else is
    /// recorded here under the check's title. Neither stops the run.
    async fn run_check(&mut self, check: &Check) -> Result<()> {
        self.tap.comment(&check.it)?;
        self.tap.explain(check.it.clone());
        let failed_before = self.tap.summary().failed();
        let budget = self.ctx.timeout;
        let outcome = tokio::time::timeout(
            budget,
            check.protocol.validate(self.reader, &mut self.tap, self.ctx),
        )
        .await;
        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) if e.is_assertion() && self.tap.summary().failed() > failed_before => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(_) => Some(Error::Timeout(budget.as_millis() as u64).to_string()),
        };
        if let Some(message) = failure {
            log::warn!("check \"{}\" failed: {}", check.it, message);
            self.tap.explain(check.it.clone());
            self.tap.record(false, Some(&message))?;
        }
        Ok(())
    }
}

/// Run a provisioned payload directory: its dataset row and feature bundle
pub async fn run_payload<D: Driver>(
    reader: &ScreenReader<D>,
    payload: &Path,
    console: Console,
) -> Result<RunSummary> {
    let ctx: RunContext = serde_json::from_str(&std::fs::read_to_string(payload.join(DATASET_FILE))?)?;
    let bundle = std::fs::read_to_string(payload.join(BUNDLE_FILE))?;
    let scenarios: Vec<Scenario> = parse_bundle(&bundle)?
        .into_iter()
        .flat_map(|(_, s)| s)
        .collect();
    ScenarioRunner::new(reader, &ctx, console).run(&scenarios).await
}

#[cfg(test)]
mod tests {
    use super::*;

    const MENU: &str = r#"{"describe":"Menus","url":"sim://menu","checks":[
        {"it":"works","pattern":"menuButton","label":"Actions"}]}"#;

    #[test]
    fn single_or_many() {
        assert_eq!(Scenario::parse_all(MENU).unwrap().len(), 1);
        let many = format!("[{},{}]", MENU, MENU);
        assert_eq!(Scenario::parse_all(&many).unwrap().len(), 2);
    }

    #[test]
    fn bundle_round_trip_keeps_provenance() {
        let bundle = format!("{}{}", wrap_feature("a.json", MENU), wrap_feature("b.json", MENU));
        let parsed = parse_bundle(&bundle).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].0, "a.json");
        assert_eq!(parsed[1].1[0].checks[0].it, "works");
    }

    #[test]
    fn unclosed_feature_is_rejected() {
        let text = format!("{}x.json\n{}", FEATURE_BEGIN, MENU);
        assert!(matches!(parse_bundle(&text), Err(Error::ConfigError(_))));
    }
}
