//! Options remembered across invocations

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_TARGET: &str = "/usr/bin/google-chrome-unstable";
pub const SETTINGS_FILE: &str = ".rfaria.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Target browser binary
    #[serde(default = "default_target")]
    pub target: PathBuf,
}

fn default_target() -> PathBuf {
    PathBuf::from(DEFAULT_TARGET)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target: default_target(),
        }
    }
}

impl Settings {
    /// `$HOME/.rfaria.json`, or the working directory when `HOME` is unset
    pub fn default_path() -> PathBuf {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_default()
            .join(SETTINGS_FILE)
    }

    /// Load settings; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text)
                .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        log::debug!("saved settings to {}", path.display());
        Ok(())
    }

    /// Adopt a target given on the command line; true when it changed
    pub fn remember_target(&mut self, target: Option<PathBuf>) -> bool {
        match target {
            Some(t) if t != self.target => {
                self.target = t;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let s = Settings::load(&dir.path().join("none.json")).unwrap();
        assert_eq!(s.target, PathBuf::from(DEFAULT_TARGET));
    }

    #[test]
    fn target_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        let mut s = Settings::default();
        assert!(s.remember_target(Some("/opt/chrome".into())));
        assert!(!s.remember_target(Some("/opt/chrome".into())));
        s.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap().target, PathBuf::from("/opt/chrome"));
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(Settings::load(&path), Err(Error::ConfigError(_))));
    }
}
