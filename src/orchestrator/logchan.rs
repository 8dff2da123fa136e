//! Collect phase: read the target's debug log and demultiplex its channels

use crate::tap::{unframe, RunSummary, DEBUG_MARKER, TAP_MARKER};
use crate::{Error, Result};
use std::path::Path;

/// Log file the target writes into its profile directory
pub const LOG_FILE: &str = "chrome_debug.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Tap,
    Debug,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub channel: Channel,
    pub content: String,
}

/// Channel lines recovered from one run, in log order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collected {
    pub lines: Vec<LogLine>,
}

impl Collected {
    pub fn tap_lines(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .filter(|l| l.channel == Channel::Tap)
            .map(|l| l.content.as_str())
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary::from_lines(self.tap_lines())
    }
}

/// Demultiplex raw log text. Debug lines are kept only when `verbose > 0`;
/// empty inner content is dropped.
pub fn demux(text: &str, verbose: u8) -> Collected {
    let mut lines = Vec::new();
    for raw in text.lines() {
        if verbose > 0 {
            if let Some(content) = unframe(DEBUG_MARKER, raw).filter(|c| !c.is_empty()) {
                lines.push(LogLine {
                    channel: Channel::Debug,
                    content,
                });
            }
        }
        if let Some(content) = unframe(TAP_MARKER, raw).filter(|c| !c.is_empty()) {
            lines.push(LogLine {
                channel: Channel::Tap,
                content,
            });
        }
    }
    Collected { lines }
}

/// Read and demultiplex `<profile>/chrome_debug.log`. A missing log means
/// the target never wrote one and collects as empty.
pub async fn collect(profile: &Path, verbose: u8) -> Result<Collected> {
    let path = profile.join(LOG_FILE);
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(demux(&String::from_utf8_lossy(&bytes), verbose)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::warn!("no target log at {}", path.display());
            Ok(Collected::default())
        }
        Err(e) => Err(Error::Collect(format!("{}: {}", path.display(), e))),
    }
}
