//! TAP result channel
//!
//! In-target code writes every result line wrapped in a pair of channel
//! markers, `[TAP]ok 1 - label[TAP]`, so the lines survive being interleaved
//! with unrelated browser logging. Verbose diagnostics use `[DEBUG]` markers
//! instead. [`unframe`] reverses the framing on the collecting side and
//! [`RunSummary::from_lines`] turns the unframed lines back into records.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub const TAP_MARKER: &str = "[TAP]";
pub const DEBUG_MARKER: &str = "[DEBUG]";

/// Wrap one line in a channel marker pair. Markers and line breaks inside
/// `line` are neutralized so the frame always spans exactly one log line.
pub fn frame(marker: &str, line: &str) -> String {
    format!("{marker}{}{marker}", escape(line))
}

fn escape(text: &str) -> String {
    text.replace(TAP_MARKER, "(TAP)")
        .replace(DEBUG_MARKER, "(DEBUG)")
        .replace(['\r', '\n'], " ")
}

/// Inner content of a framed line: split on the marker, drop the segments
/// before the first and after the last marker, and rejoin the rest. `None`
/// when the line carries no complete frame.
pub fn unframe(marker: &str, line: &str) -> Option<String> {
    let mut parts: Vec<&str> = line.split(marker).collect();
    if parts.len() < 3 {
        return None;
    }
    parts.pop();
    parts.remove(0);
    Some(parts.concat())
}

enum Sink {
    Stdout,
    Memory(Vec<u8>),
    File(File),
}

/// Shared in-target console both channels write to
#[derive(Clone)]
pub struct Console {
    sink: Arc<Mutex<Sink>>,
}

impl Console {
    pub fn stdout() -> Self {
        Self::with_sink(Sink::Stdout)
    }

    /// Console kept in memory; read it back with [`Console::contents`]
    pub fn memory() -> Self {
        Self::with_sink(Sink::Memory(Vec::new()))
    }

    /// Append to a log file
    pub fn file(path: &Path) -> Result<Self> {
        let f = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::with_sink(Sink::File(f)))
    }

    fn with_sink(sink: Sink) -> Self {
        Self {
            sink: Arc::new(Mutex::new(sink)),
        }
    }

    /// Write one raw line
    pub fn line(&self, text: &str) -> Result<()> {
        let mut guard = match self.sink.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        match &mut *guard {
            Sink::Stdout => {
                let mut out = std::io::stdout().lock();
                writeln!(out, "{}", text)?;
            }
            Sink::Memory(buf) => writeln!(buf, "{}", text)?,
            Sink::File(f) => writeln!(f, "{}", text)?,
        }
        Ok(())
    }

    pub fn tap(&self, text: &str) -> Result<()> {
        self.line(&frame(TAP_MARKER, text))
    }

    pub fn debug(&self, text: &str) -> Result<()> {
        self.line(&frame(DEBUG_MARKER, text))
    }

    /// Everything written so far to a memory console; empty for other sinks
    pub fn contents(&self) -> String {
        let guard = match self.sink.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        match &*guard {
            Sink::Memory(buf) => String::from_utf8_lossy(buf).into_owned(),
            _ => String::new(),
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::stdout()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
}

/// One assertion result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub index: usize,
    pub title: String,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ResultRecord {
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Pass
    }
}

/// Parse an `ok N - title` / `not ok N - title` line
pub fn parse_record(line: &str) -> Option<ResultRecord> {
    let (outcome, rest) = if let Some(rest) = line.strip_prefix("not ok ") {
        (Outcome::Fail, rest)
    } else if let Some(rest) = line.strip_prefix("ok ") {
        (Outcome::Pass, rest)
    } else {
        return None;
    };
    let (index, title) = match rest.split_once(' ') {
        Some((n, t)) => (n, t.trim_start_matches("- ").to_string()),
        None => (rest, String::new()),
    };
    Some(ResultRecord {
        index: index.parse().ok()?,
        title,
        outcome,
        detail: None,
    })
}

/// Records of one run, in emission order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub records: Vec<ResultRecord>,
}

impl RunSummary {
    /// Rebuild records from unframed TAP lines. Indented `# ` lines directly
    /// after a failed record become its detail.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut records: Vec<ResultRecord> = Vec::new();
        for line in lines {
            if let Some(r) = parse_record(line) {
                records.push(r);
                continue;
            }
            let Some(comment) = line.strip_prefix("  # ") else {
                continue;
            };
            if let Some(last) = records.last_mut().filter(|r| !r.passed()) {
                match &mut last.detail {
                    Some(d) => {
                        d.push('\n');
                        d.push_str(comment);
                    }
                    None => last.detail = Some(comment.to_string()),
                }
            }
        }
        Self { records }
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn passed(&self) -> usize {
        self.records.iter().filter(|r| r.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    pub fn merge(&mut self, other: RunSummary) {
        self.records.extend(other.records);
    }
}

/// Emits TAP records on a [`Console`] and doubles as the assertion API of
/// the validators.
///
/// Every assertion call writes exactly one record titled with the label last
/// set by [`TapWriter::explain`]. A failing assertion also returns
/// [`Error::Assertion`] so the validator stops at the first failure.
pub struct TapWriter {
    console: Console,
    label: String,
    summary: RunSummary,
}

impl TapWriter {
    pub fn new(console: Console) -> Self {
        Self {
            console,
            label: String::new(),
            summary: RunSummary::default(),
        }
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    /// Records written so far
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Title the following assertions
    pub fn explain(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// TAP version header
    pub fn header(&self) -> Result<()> {
        self.console.tap("TAP version 13")
    }

    /// A `# ` comment line
    pub fn comment(&self, text: &str) -> Result<()> {
        self.console.tap(&format!("# {}", text))
    }

    /// Write one record
    pub fn record(&mut self, ok: bool, detail: Option<&str>) -> Result<()> {
        let index = self.summary.records.len() + 1;
        let title = if self.label.is_empty() {
            "assertion".to_string()
        } else {
            self.label.clone()
        };
        let status = if ok { "ok" } else { "not ok" };
        self.console.tap(&format!("{} {} - {}", status, index, title))?;
        if let Some(d) = detail {
            for line in d.lines() {
                self.console.tap(&format!("  # {}", line))?;
            }
        }
        self.summary.records.push(ResultRecord {
            index,
            title,
            outcome: if ok { Outcome::Pass } else { Outcome::Fail },
            detail: detail.map(str::to_string),
        });
        Ok(())
    }

    /// Record `ok`; on failure describe it with `message` and abort
    pub fn check(&mut self, ok: bool, message: impl FnOnce() -> String) -> Result<()> {
        if ok {
            return self.record(true, None);
        }
        let message = message();
        self.record(false, Some(&message))?;
        Err(Error::assertion(self.label.clone(), message))
    }

    pub fn equal<T: PartialEq + Debug>(&mut self, actual: T, expected: T) -> Result<()> {
        let ok = actual == expected;
        self.check(ok, || format!("expected {:?} to equal {:?}", actual, expected))
    }

    pub fn not_equal<T: PartialEq + Debug>(&mut self, actual: T, unexpected: T) -> Result<()> {
        let ok = actual != unexpected;
        self.check(ok, || format!("expected {:?} to differ from {:?}", actual, unexpected))
    }

    pub fn is_true(&mut self, value: bool) -> Result<()> {
        self.check(value, || "expected true, got false".to_string())
    }

    pub fn is_false(&mut self, value: bool) -> Result<()> {
        self.check(!value, || "expected false, got true".to_string())
    }

    pub fn not_empty<T>(&mut self, items: &[T]) -> Result<()> {
        self.check(!items.is_empty(), || "expected a non-empty collection".to_string())
    }

    /// A string is present and non-empty
    pub fn non_blank(&mut self, value: Option<&str>) -> Result<()> {
        let ok = value.is_some_and(|v| !v.trim().is_empty());
        self.check(ok, || format!("expected a non-empty string, got {:?}", value))
    }

    /// Record the outcome of a fallible check
    pub fn succeeds<T>(&mut self, result: Result<T>) -> Result<T> {
        match result {
            Ok(v) => {
                self.record(true, None)?;
                Ok(v)
            }
            Err(e) => {
                let message = e.to_string();
                self.record(false, Some(&message))?;
                Err(Error::assertion(self.label.clone(), message))
            }
        }
    }

    /// Plan line and `# tests/# pass/# fail` trailer
    pub fn finish(&self) -> Result<RunSummary> {
        let s = &self.summary;
        self.console.tap(&format!("1..{}", s.total()))?;
        self.console.tap(&format!("# tests {}", s.total()))?;
        self.console.tap(&format!("# pass  {}", s.passed()))?;
        self.console.tap(&format!("# fail  {}", s.failed()))?;
        Ok(s.clone())
    }
}
