use clap::{ArgAction, Parser};
use rfaria::driver::{Backend, SimDriver};
use rfaria::orchestrator::{Orchestrator, RunOptions, DEFAULT_URL};
use rfaria::reader::ScreenReader;
use rfaria::settings::Settings;
use rfaria::tap::{Console, RunSummary};
use rfaria::{scenario, Error, Result, Timing};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Run ARIA widget conformance scenarios in a browser
#[derive(Parser, Debug)]
#[command(name = "rfaria", version, about)]
struct Cli {
    /// Site to test
    #[arg(default_value = DEFAULT_URL, value_parser = parse_url)]
    url: String,

    /// Scenario file (repeatable, run in order)
    #[arg(short = 'f', long = "feature", value_name = "FILE")]
    features: Vec<PathBuf>,

    /// Browser binary; remembered for later runs
    #[arg(short = 'c', long = "chrome", value_name = "PATH")]
    chrome: Option<PathBuf>,

    /// Kill timer per dataset row, in milliseconds
    #[arg(short = 't', long, default_value_t = 60_000)]
    timeout: u64,

    /// Pre-flight script copied into the payload (repeatable)
    #[arg(short = 'p', long = "preflight", value_name = "FILE")]
    preflight: Vec<PathBuf>,

    /// JSON array of dataset rows; one browser run per row
    #[arg(short = 'd', long, default_value = "[{}]", value_parser = parse_dataset)]
    dataset: Dataset,

    /// Verbosity: -v shows the debug channel and debug logs, -vv trace logs
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    /// Payload template directory
    #[arg(long, env = "RFARIA_TEMPLATE", value_name = "DIR")]
    template: Option<PathBuf>,

    /// Extra flag passed to the browser (repeatable)
    #[arg(long = "target-arg", value_name = "FLAG", allow_hyphen_values = true)]
    target_args: Vec<String>,

    /// Settings file
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Page driver: cdp drives the browser, sim an empty in-memory page
    #[arg(long, value_name = "NAME", default_value_t = Backend::Cdp)]
    driver: Backend,

    /// Runner mode: execute a provisioned payload directory and exit
    #[arg(long, value_name = "DIR")]
    payload: Option<PathBuf>,

    /// Runner mode: file the framed result lines are appended to
    #[arg(long, value_name = "FILE", requires = "payload")]
    log: Option<PathBuf>,

    /// Runner mode: browser profile directory
    #[arg(long = "user-data-dir", value_name = "DIR", requires = "payload")]
    user_data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
struct Dataset(Vec<Value>);

fn parse_url(s: &str) -> std::result::Result<String, String> {
    url::Url::parse(s)
        .map(|_| s.to_string())
        .map_err(|e| format!("invalid URL {:?}: {}", s, e))
}

fn parse_dataset(s: &str) -> std::result::Result<Dataset, String> {
    match serde_json::from_str::<Value>(s) {
        Ok(Value::Array(rows)) => Ok(Dataset(rows)),
        Ok(_) => Err("dataset must be a JSON array".to_string()),
        Err(e) => Err(format!("invalid dataset JSON: {}", e)),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    if let Some(dir) = &cli.payload {
        return run_payload(dir, &cli).await;
    }

    let settings_path = cli.settings.clone().unwrap_or_else(Settings::default_path);
    let mut settings = Settings::load(&settings_path)?;
    if settings.remember_target(cli.chrome.clone()) {
        if let Err(e) = settings.save(&settings_path) {
            log::warn!("could not save settings: {}", e);
        }
    }

    if cli.dataset.0.is_empty() {
        return Err(Error::ConfigError("dataset has no rows".into()));
    }
    let options = RunOptions {
        url: cli.url,
        scenarios: cli.features,
        target: settings.target,
        runner: None,
        backend: cli.driver,
        timeout: Duration::from_millis(cli.timeout),
        preflight: cli.preflight,
        dataset: cli.dataset.0,
        verbose: cli.verbose,
        template: cli.template,
        target_args: cli.target_args,
    };
    let outcomes = Orchestrator::new(options).run().await?;
    for outcome in &outcomes {
        log::debug!(
            "row {}: {} passed, {} failed in {:?}{}",
            outcome.row,
            outcome.summary.passed(),
            outcome.summary.failed(),
            outcome.elapsed,
            if outcome.timed_out { " (killed)" } else { "" }
        );
    }
    Ok(())
}

/// Runner mode. Results go to the log file; a run that cannot start leaves
/// a bail-out line there instead.
async fn run_payload(dir: &Path, cli: &Cli) -> Result<()> {
    let console = match &cli.log {
        Some(path) => Console::file(path)?,
        None => Console::stdout(),
    };
    let result = match cli.driver {
        Backend::Sim => {
            let reader = ScreenReader::new(SimDriver::new(), Timing::immediate())
                .with_console(console.clone());
            scenario::run_payload(&reader, dir, console.clone()).await
        }
        Backend::Cdp => run_cdp(dir, cli, console.clone()).await,
    };
    match result {
        Ok(summary) => {
            log::debug!("{} passed, {} failed", summary.passed(), summary.failed());
            Ok(())
        }
        Err(e) => {
            console.tap(&format!("Bail out! # {}", e))?;
            Err(e)
        }
    }
}

#[cfg(feature = "cdp")]
async fn run_cdp(dir: &Path, cli: &Cli, console: Console) -> Result<RunSummary> {
    use rfaria::driver::cdp::{CdpDriver, CdpOptions};

    let driver = CdpDriver::launch(CdpOptions {
        binary: cli.chrome.clone(),
        user_data_dir: cli.user_data_dir.clone(),
        args: cli.target_args.clone(),
        ..CdpOptions::default()
    })
    .await?;
    let reader = ScreenReader::new(driver, Timing::default()).with_console(console.clone());
    scenario::run_payload(&reader, dir, console).await
}

#[cfg(not(feature = "cdp"))]
async fn run_cdp(_dir: &Path, _cli: &Cli, _console: Console) -> Result<RunSummary> {
    Err(Error::ConfigError(
        "built without the cdp driver; rebuild with --features cdp or pass --driver sim".into(),
    ))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if let Err(e) = run(cli).await {
        log::error!("{}", e);
        println!("Bail out! # Test execution failed.");
        std::process::exit(1);
    }
}
