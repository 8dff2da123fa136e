//! Provision phase: scratch workspace and run payload

use crate::scenario::{wrap_feature, BUNDLE_FILE, DATASET_FILE};
use crate::{Error, Result, RunContext};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Legacy globals file for script payloads
pub const DATASET_SCRIPT: &str = "dataset.js";

/// Margin the in-target run gets below the process kill timer
pub const TIMEOUT_MARGIN: Duration = Duration::from_millis(2000);

/// Scratch root holding one row's profile and payload directories.
///
/// Both directories live under one [`TempDir`], so dropping the workspace
/// removes them on every exit path.
pub struct Workspace {
    root: TempDir,
    profile: PathBuf,
    payload: PathBuf,
}

impl Workspace {
    pub fn create() -> Result<Self> {
        let root = tempfile::Builder::new()
            .prefix("rfaria-")
            .tempdir()
            .map_err(|e| Error::Provision(format!("scratch root: {}", e)))?;
        let profile = root.path().join("profile");
        let payload = root.path().join("extension");
        for dir in [&profile, &payload] {
            std::fs::create_dir(dir)
                .map_err(|e| Error::Provision(format!("{}: {}", dir.display(), e)))?;
        }
        Ok(Self { root, profile, payload })
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Run directory holding the log file and the browser profile
    pub fn profile(&self) -> &Path {
        &self.profile
    }

    /// Browser user data directory, inside [`Workspace::profile`]
    pub fn browser_profile(&self) -> PathBuf {
        self.profile.join("browser")
    }

    /// Payload directory handed to the target
    pub fn payload(&self) -> &Path {
        &self.payload
    }

    /// Remove the scratch root, reporting I/O errors instead of swallowing them
    pub fn close(self) -> Result<()> {
        self.root.close()?;
        Ok(())
    }
}

/// Copy a template tree verbatim into `dest`; returns the number of files
pub fn copy_template(template: &Path, dest: &Path) -> Result<usize> {
    let mut copied = 0;
    for entry in walkdir::WalkDir::new(template).min_depth(1) {
        let entry = entry.map_err(|e| Error::Provision(format!("template: {}", e)))?;
        let relative = entry
            .path()
            .strip_prefix(template)
            .map_err(|e| Error::Provision(e.to_string()))?;
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target)
                .map_err(|e| Error::Provision(format!("{}: {}", entry.path().display(), e)))?;
            copied += 1;
        }
    }
    log::debug!("copied {} template files from {}", copied, template.display());
    Ok(copied)
}

/// Concatenate scenario files, in the given order, into the feature bundle
pub fn write_bundle(dest: &Path, scenarios: &[PathBuf]) -> Result<PathBuf> {
    let mut bundle = String::new();
    for file in scenarios {
        let content = std::fs::read_to_string(file)
            .map_err(|e| Error::Provision(format!("scenario {}: {}", file.display(), e)))?;
        bundle.push_str(&wrap_feature(&file.display().to_string(), &content));
    }
    let path = dest.join(BUNDLE_FILE);
    std::fs::write(&path, bundle)?;
    Ok(path)
}

/// Copy pre-flight scripts as `preflight<i>` keeping their extension
pub fn write_preflight(dest: &Path, scripts: &[PathBuf]) -> Result<Vec<PathBuf>> {
    scripts
        .iter()
        .enumerate()
        .map(|(i, script)| {
            let mut name = format!("preflight{}", i);
            if let Some(ext) = script.extension() {
                name.push('.');
                name.push_str(&ext.to_string_lossy());
            }
            let target = dest.join(name);
            std::fs::copy(script, &target)
                .map_err(|e| Error::Provision(format!("preflight {}: {}", script.display(), e)))?;
            Ok(target)
        })
        .collect()
}

/// Write the row's dataset as `dataset.json` and as script globals in
/// `dataset.js`. The in-target timeout is the kill timer minus
/// [`TIMEOUT_MARGIN`].
pub fn write_dataset(dest: &Path, row: &Value, timeout: Duration, url: &str) -> Result<RunContext> {
    let ctx = RunContext {
        state: row.clone(),
        timeout: timeout.saturating_sub(TIMEOUT_MARGIN),
        start_url: url.to_string(),
    };
    std::fs::write(dest.join(DATASET_FILE), serde_json::to_string_pretty(&ctx)?)?;
    let script = format!(
        "window.state = {}; window.timeout = {}; window.startUrl = {};",
        serde_json::to_string(&ctx.state)?,
        ctx.timeout.as_millis(),
        serde_json::to_string(&ctx.start_url)?,
    );
    std::fs::write(dest.join(DATASET_SCRIPT), script)?;
    Ok(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn workspace_is_removed_on_drop() {
        let ws = Workspace::create().unwrap();
        let root = ws.root().to_path_buf();
        assert!(ws.profile().is_dir());
        assert!(ws.payload().is_dir());
        drop(ws);
        assert!(!root.exists());
    }

    #[test]
    fn template_copy_keeps_layout() {
        let template = tempfile::tempdir().unwrap();
        std::fs::create_dir(template.path().join("js")).unwrap();
        std::fs::write(template.path().join("manifest.json"), "{}").unwrap();
        std::fs::write(template.path().join("js/run.js"), "run()").unwrap();
        let dest = tempfile::tempdir().unwrap();

        assert_eq!(copy_template(template.path(), dest.path()).unwrap(), 2);
        assert_eq!(std::fs::read_to_string(dest.path().join("js/run.js")).unwrap(), "run()");
    }

    #[test]
    fn dataset_carries_margin_and_url() {
        let dest = tempfile::tempdir().unwrap();
        let ctx = write_dataset(
            dest.path(),
            &json!({"page": "Contact"}),
            Duration::from_secs(60),
            "https://example.com/",
        )
        .unwrap();
        assert_eq!(ctx.timeout, Duration::from_millis(58_000));

        let script = std::fs::read_to_string(dest.path().join(DATASET_SCRIPT)).unwrap();
        assert_eq!(
            script,
            r#"window.state = {"page":"Contact"}; window.timeout = 58000; window.startUrl = "https://example.com/";"#
        );
        let back: RunContext =
            serde_json::from_str(&std::fs::read_to_string(dest.path().join(DATASET_FILE)).unwrap()).unwrap();
        assert_eq!(back.state_str("page"), Some("Contact"));
    }

    #[test]
    fn missing_scenario_is_a_provision_error() {
        let dest = tempfile::tempdir().unwrap();
        let err = write_bundle(dest.path(), &[PathBuf::from("/nonexistent/a.json")]).unwrap_err();
        assert!(matches!(err, Error::Provision(_)));
    }
}
