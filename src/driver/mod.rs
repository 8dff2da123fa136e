//! Browser capability seam
//!
//! A [`Driver`] owns the connection to whatever renders the page and keeps a
//! [`TreeStore`] up to date with its accessibility tree. Everything above this
//! module (reader, waiters, validators) talks to the page only through it.

use crate::tree::{NodeId, TreeStore};
use crate::Result;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

#[cfg(feature = "cdp")]
pub mod cdp;
pub mod sim;
#[cfg(any(test, feature = "sim"))]
pub mod widgets;

pub use sim::SimDriver;

/// Driver the payload runner puts under the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// In-memory simulator; only `about:blank` loads
    Sim,
    /// Chrome over the DevTools protocol
    #[default]
    Cdp,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Backend::Sim => "sim",
            Backend::Cdp => "cdp",
        })
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "sim" => Ok(Backend::Sim),
            "cdp" => Ok(Backend::Cdp),
            other => Err(format!("unknown driver {:?}, expected sim or cdp", other)),
        }
    }
}

/// Non-printable keys understood by [`Driver::dispatch_key`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialKey {
    Tab,
    Enter,
    Up,
    Down,
    Left,
    Right,
    Space,
    Home,
    End,
    Escape,
    PageUp,
    PageDown,
}

impl SpecialKey {
    /// Windows virtual key code
    pub fn code(self) -> u32 {
        match self {
            SpecialKey::Tab => 9,
            SpecialKey::Enter => 13,
            SpecialKey::Space => 32,
            SpecialKey::PageUp => 33,
            SpecialKey::PageDown => 34,
            SpecialKey::End => 35,
            SpecialKey::Home => 36,
            SpecialKey::Left => 37,
            SpecialKey::Up => 38,
            SpecialKey::Right => 39,
            SpecialKey::Down => 40,
            SpecialKey::Escape => 27,
        }
    }

    /// DOM `KeyboardEvent.key` value
    pub fn key_name(self) -> &'static str {
        match self {
            SpecialKey::Tab => "Tab",
            SpecialKey::Enter => "Enter",
            SpecialKey::Up => "ArrowUp",
            SpecialKey::Down => "ArrowDown",
            SpecialKey::Left => "ArrowLeft",
            SpecialKey::Right => "ArrowRight",
            SpecialKey::Space => " ",
            SpecialKey::Home => "Home",
            SpecialKey::End => "End",
            SpecialKey::Escape => "Escape",
            SpecialKey::PageUp => "PageUp",
            SpecialKey::PageDown => "PageDown",
        }
    }
}

/// One synthetic key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Special(SpecialKey),
    Char(char),
}

impl From<SpecialKey> for KeyInput {
    fn from(key: SpecialKey) -> Self {
        KeyInput::Special(key)
    }
}

impl From<char> for KeyInput {
    fn from(c: char) -> Self {
        KeyInput::Char(c)
    }
}

/// Capability interface over a live page.
///
/// Every action publishes its visible effect to [`Driver::store`] before its
/// future resolves, or on a later [`Driver::refresh`] for backends that can
/// only observe the page by polling.
pub trait Driver {
    /// The live tree this driver publishes to
    fn store(&self) -> &Arc<TreeStore>;

    /// Move input focus to `node`
    fn focus(&self, node: NodeId) -> impl Future<Output = Result<()>>;

    /// Trigger the node's primary action (click)
    fn do_default(&self, node: NodeId) -> impl Future<Output = Result<()>>;

    /// Set the value of an editable node directly
    fn set_value(&self, node: NodeId, value: &str) -> impl Future<Output = Result<()>>;

    /// Dispatch a key down/up pair to the focused node
    fn dispatch_key(&self, key: KeyInput) -> impl Future<Output = Result<()>>;

    /// Start navigating to `url`; the store's lifecycle tracks completion
    fn navigate(&self, url: &str) -> impl Future<Output = Result<()>>;

    /// Re-read the page and publish a fresh snapshot
    fn refresh(&self) -> impl Future<Output = Result<()>>;
}
