//! Out-of-process execution orchestrator
//!
//! Each dataset row gets one complete target run:
//! provision a scratch workspace, launch the payload runner against it,
//! wait for exit under a kill timer, collect the log channels, and remove
//! the workspace. Rows run one after another because each run owns the
//! profile directory and its log file exclusively.
//!
//! The runner is this binary started with `--payload`: it drives the browser,
//! executes the bundled scenarios, and appends framed result lines to the
//! row's log file.

pub mod logchan;
pub mod payload;

use crate::driver::Backend;
use crate::tap::{Console, RunSummary};
use crate::{Error, Result};
use logchan::Channel;
use payload::Workspace;
use serde_json::Value;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(60_000);
pub const DEFAULT_URL: &str = "about:blank";

/// Everything one invocation needs
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub url: String,
    pub scenarios: Vec<PathBuf>,
    /// Browser binary the runner drives
    pub target: PathBuf,
    /// Payload runner executable; this binary when unset
    pub runner: Option<PathBuf>,
    /// Driver the runner uses
    pub backend: Backend,
    /// Kill timer per row
    pub timeout: Duration,
    pub preflight: Vec<PathBuf>,
    /// One target run per row
    pub dataset: Vec<Value>,
    pub verbose: u8,
    /// Files copied verbatim into every payload directory
    pub template: Option<PathBuf>,
    /// Extra browser flags, forwarded by the runner
    pub target_args: Vec<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            scenarios: Vec::new(),
            target: PathBuf::from(crate::settings::DEFAULT_TARGET),
            runner: None,
            backend: Backend::default(),
            timeout: DEFAULT_TIMEOUT,
            preflight: Vec::new(),
            dataset: vec![Value::Object(Default::default())],
            verbose: 0,
            template: None,
            target_args: Vec::new(),
        }
    }
}

/// Result of one dataset row
#[derive(Debug, Clone)]
pub struct RowOutcome {
    pub row: usize,
    /// The kill timer fired before the target exited
    pub timed_out: bool,
    /// Exit code when the target exited on its own
    pub exit_code: Option<i32>,
    pub elapsed: Duration,
    pub summary: RunSummary,
}

pub struct Orchestrator {
    options: RunOptions,
    out: Console,
}

impl Orchestrator {
    pub fn new(options: RunOptions) -> Self {
        Self {
            options,
            out: Console::stdout(),
        }
    }

    /// Print collected lines somewhere other than stdout
    pub fn with_console(mut self, out: Console) -> Self {
        self.out = out;
        self
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Run every dataset row in order. The first row that fails stops the
    /// run after its own workspace is removed.
    pub async fn run(&self) -> Result<Vec<RowOutcome>> {
        if self.options.scenarios.is_empty() {
            return Err(Error::ConfigError("no scenario files given".into()));
        }
        let files: Vec<String> = self
            .options
            .scenarios
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        self.out.line(&format!(
            "# Execute test suite: {} on site: {}",
            files.join(", "),
            self.options.url
        ))?;

        let mut outcomes = Vec::with_capacity(self.options.dataset.len());
        for (index, row) in self.options.dataset.iter().enumerate() {
            outcomes.push(self.run_row(index, row).await?);
        }
        Ok(outcomes)
    }

    /// One row through all five phases
    pub async fn run_row(&self, index: usize, row: &Value) -> Result<RowOutcome> {
        log::debug!("row {}: provision", index);
        let workspace = self.provision(row)?;
        let outcome = self.execute(&workspace, index).await;
        log::debug!("row {}: cleanup {}", index, workspace.root().display());
        let removed = workspace.close();
        let outcome = outcome?;
        removed?;
        Ok(outcome)
    }

    fn provision(&self, row: &Value) -> Result<Workspace> {
        let ws = Workspace::create()?;
        if let Some(template) = &self.options.template {
            payload::copy_template(template, ws.payload())?;
        }
        payload::write_bundle(ws.payload(), &self.options.scenarios)?;
        payload::write_preflight(ws.payload(), &self.options.preflight)?;
        payload::write_dataset(ws.payload(), row, self.options.timeout, &self.options.url)?;
        Ok(ws)
    }

    /// Runner command line for one workspace
    pub fn launch_args(&self, ws: &Workspace) -> Vec<String> {
        let mut args = vec![
            format!("--payload={}", ws.payload().display()),
            format!("--log={}", ws.profile().join(logchan::LOG_FILE).display()),
            format!("--user-data-dir={}", ws.browser_profile().display()),
            format!("--chrome={}", self.options.target.display()),
            format!("--driver={}", self.options.backend),
        ];
        args.extend((0..self.options.verbose).map(|_| "-v".to_string()));
        args.extend(
            self.options
                .target_args
                .iter()
                .map(|a| format!("--target-arg={}", a)),
        );
        args
    }

    fn runner(&self) -> Result<PathBuf> {
        match &self.options.runner {
            Some(path) => Ok(path.clone()),
            None => std::env::current_exe()
                .map_err(|e| Error::Launch(format!("cannot locate the runner: {}", e))),
        }
    }

    async fn execute(&self, ws: &Workspace, index: usize) -> Result<RowOutcome> {
        let runner = self.runner()?;
        log::debug!(
            "row {}: launch {} for {}",
            index,
            runner.display(),
            self.options.target.display()
        );
        let started = Instant::now();
        let mut child = tokio::process::Command::new(&runner)
            .args(self.launch_args(ws))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Launch(format!("{}: {}", runner.display(), e)))?;

        let (timed_out, exit_code) = match tokio::time::timeout(self.options.timeout, child.wait()).await {
            Ok(status) => {
                let status = status.map_err(|e| Error::Launch(e.to_string()))?;
                log::debug!("row {}: runner exited with {}", index, status);
                (false, status.code())
            }
            Err(_) => {
                self.out.line(&format!(
                    "# Execution time exceeded ({} seconds) - killing process.",
                    self.options.timeout.as_secs_f64()
                ))?;
                log::warn!("row {}: timed out, killing runner", index);
                if let Err(e) = child.kill().await {
                    log::warn!("row {}: kill failed: {}", index, e);
                }
                (true, None)
            }
        };
        let elapsed = started.elapsed();

        log::debug!("row {}: collect", index);
        let collected = logchan::collect(ws.profile(), self.options.verbose).await?;
        for line in &collected.lines {
            if line.channel == Channel::Debug {
                log::trace!("debug channel: {}", line.content);
            }
            self.out.line(&line.content)?;
        }

        Ok(RowOutcome {
            row: index,
            timed_out,
            exit_code,
            elapsed,
            summary: collected.summary(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runner_gets_payload_log_and_browser_flags() {
        let orch = Orchestrator::new(RunOptions {
            target: PathBuf::from("/opt/chrome/chrome"),
            backend: Backend::Sim,
            verbose: 2,
            target_args: vec!["--headless=new".into()],
            ..RunOptions::default()
        });
        let ws = Workspace::create().unwrap();
        let args = orch.launch_args(&ws);
        assert_eq!(args[0], format!("--payload={}", ws.payload().display()));
        assert_eq!(
            args[1],
            format!("--log={}", ws.profile().join("chrome_debug.log").display())
        );
        assert!(args[2].starts_with("--user-data-dir="));
        assert!(args[2].ends_with("browser"));
        assert_eq!(args[3], "--chrome=/opt/chrome/chrome");
        assert_eq!(args[4], "--driver=sim");
        assert_eq!(&args[5..7], ["-v", "-v"]);
        assert_eq!(args.last().map(String::as_str), Some("--target-arg=--headless=new"));
    }

    #[tokio::test]
    async fn scenarios_are_required() {
        let out = Console::memory();
        let orch = Orchestrator::new(RunOptions::default()).with_console(out.clone());
        assert!(matches!(orch.run().await, Err(Error::ConfigError(_))));
        assert!(out.contents().is_empty());
    }

    #[tokio::test]
    async fn missing_runner_fails_launch_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = dir.path().join("s.json");
        std::fs::write(&scenario, "[]").unwrap();
        let orch = Orchestrator::new(RunOptions {
            scenarios: vec![scenario],
            runner: Some(dir.path().join("no-such-runner")),
            ..RunOptions::default()
        })
        .with_console(Console::memory());
        let err = orch.run_row(0, &Value::Null).await.unwrap_err();
        assert!(matches!(err, Error::Launch(_)));
    }
}
