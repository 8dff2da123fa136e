//! rfaria: accessibility conformance runner
//!
//! Drives a page through its accessibility tree and replays the keyboard and
//! pointer sequences prescribed by the WAI-ARIA authoring practices, checking
//! that each widget exposes the expected roles, names, states and transitions.
//!
//! # Layers
//!
//! - [`tree`] and [`lifecycle`]: the live accessibility tree and the page-ready gate
//! - [`driver`]: the browser capability seam (a simulator, and Chrome over CDP
//!   behind the `cdp` feature; reference widgets for the simulator behind `sim`)
//! - [`reader`]: node handles, tree queries and interaction primitives
//! - [`wait`]: one-shot change waiters
//! - [`protocols`]: one validator per widget pattern
//! - [`scenario`] and [`tap`]: in-target runs emitting TAP records
//! - [`orchestrator`]: provisions, launches and collects one runner process per dataset row
//!
//! # Example
//!
//! ```no_run
//! use rfaria::driver::SimDriver;
//! use rfaria::protocols::Protocol;
//! use rfaria::reader::ScreenReader;
//! use rfaria::tap::{Console, TapWriter};
//! use rfaria::tree::{roles, NodeData};
//! use rfaria::{RunContext, Timing};
//!
//! # async fn demo() -> rfaria::Result<()> {
//! let driver = SimDriver::new().with_page("sim://home", |tree| {
//!     if let Some(root) = tree.root() {
//!         tree.append(root, NodeData::new(roles::NAVIGATION).named("Main"));
//!         tree.append(root, NodeData::new(roles::NAVIGATION).named("Footer"));
//!     }
//!     Vec::new()
//! });
//! let reader = ScreenReader::new(driver, Timing::immediate());
//! reader.set_page_url("sim://home").await?;
//!
//! let mut tap = TapWriter::new(Console::stdout());
//! Protocol::PageRegionLabels
//!     .validate(&reader, &mut tap, &RunContext::default())
//!     .await?;
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod driver;
pub mod error;
pub mod lifecycle;
pub mod orchestrator;
pub mod protocols;
pub mod reader;
pub mod scenario;
pub mod settings;
pub mod tap;
pub mod tree;
pub mod wait;

pub use error::{Error, Result};

/// Settle intervals and wait bounds used by the interaction layer
///
/// Effects of an action on a live page are not synchronously observable, so
/// every interactive primitive sleeps for one of these intervals before it
/// returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// After a default action
    pub action: Duration,
    /// After a default action expected to navigate or animate
    pub slow_action: Duration,
    /// After a key press
    pub key: Duration,
    /// After Escape, which may move focus asynchronously
    pub escape_key: Duration,
    /// After entering text
    pub text: Duration,
    /// After starting a navigation, before awaiting the page gate
    pub navigation: Duration,
    /// Interval of polling waiters
    pub poll_interval: Duration,
    /// Upper bound of any waiter
    pub wait_timeout: Duration,
    /// Pause of `wait_for_interaction`
    pub interaction: Duration,
    pub slow_interaction: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            action: Duration::from_millis(250),
            slow_action: Duration::from_millis(1000),
            key: Duration::from_millis(10),
            escape_key: Duration::from_millis(500),
            text: Duration::from_millis(500),
            navigation: Duration::from_millis(1000),
            poll_interval: Duration::from_millis(200),
            wait_timeout: Duration::from_secs(10),
            interaction: Duration::from_millis(250),
            slow_interaction: Duration::from_millis(1000),
        }
    }
}

impl Timing {
    /// No settling at all; for drivers whose effects are visible at once
    pub fn immediate() -> Self {
        Self {
            action: Duration::ZERO,
            slow_action: Duration::ZERO,
            key: Duration::ZERO,
            escape_key: Duration::ZERO,
            text: Duration::ZERO,
            navigation: Duration::ZERO,
            poll_interval: Duration::from_millis(5),
            wait_timeout: Duration::from_secs(2),
            interaction: Duration::ZERO,
            slow_interaction: Duration::ZERO,
        }
    }
}

/// Per-run configuration injected into every validator
///
/// One dataset row plus the run's time budget and start page. The
/// orchestrator writes it into the payload as `dataset.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunContext {
    /// The dataset row
    #[serde(default)]
    pub state: serde_json::Value,
    /// In-target time budget, in milliseconds on the wire
    #[serde(with = "millis", default = "default_run_timeout")]
    pub timeout: Duration,
    #[serde(default = "default_start_url")]
    pub start_url: String,
}

fn default_run_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_start_url() -> String {
    "about:blank".to_string()
}

impl Default for RunContext {
    fn default() -> Self {
        Self {
            state: serde_json::Value::Object(Default::default()),
            timeout: default_run_timeout(),
            start_url: default_start_url(),
        }
    }
}

impl RunContext {
    /// String value of a top-level key of the dataset row
    pub fn state_str(&self, key: &str) -> Option<&str> {
        self.state.get(key).and_then(|v| v.as_str())
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timing() {
        let t = Timing::default();
        assert_eq!(t.action, Duration::from_millis(250));
        assert_eq!(t.slow_action, t.action * 4);
        assert_eq!(t.poll_interval, Duration::from_millis(200));
    }

    #[test]
    fn test_run_context_wire_format() {
        let ctx: RunContext =
            serde_json::from_str(r#"{"state":{"page":"Contact"},"timeout":55000,"startUrl":"http://x/"}"#)
                .unwrap();
        assert_eq!(ctx.state_str("page"), Some("Contact"));
        assert_eq!(ctx.timeout, Duration::from_secs(55));
        assert_eq!(ctx.start_url, "http://x/");

        let back = serde_json::to_value(&ctx).unwrap();
        assert_eq!(back["timeout"], 55000);
    }

    #[test]
    fn test_run_context_defaults() {
        let ctx: RunContext = serde_json::from_str("{}").unwrap();
        assert_eq!(ctx.start_url, "about:blank");
        assert!(ctx.state.is_null());
    }
}
