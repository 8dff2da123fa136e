//! Page lifecycle tracking
//!
//! The tracker has two states. A navigation-start signal moves it to
//! [`LoadState::Loading`], a navigation-finish signal back to
//! [`LoadState::Complete`]. [`PageLifecycle::wait_for_page`] resolves at once
//! while the page is complete and otherwise parks until the next completion,
//! so a query never runs against a tree that is being replaced.

use crate::{Error, Result};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Complete,
}

/// Awaitable "page ready" gate
#[derive(Debug)]
pub struct PageLifecycle {
    state: watch::Sender<LoadState>,
}

impl Default for PageLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl PageLifecycle {
    /// Starts out complete: the tracker is created once a page is already there.
    pub fn new() -> Self {
        let (state, _) = watch::channel(LoadState::Complete);
        Self { state }
    }

    pub fn state(&self) -> LoadState {
        *self.state.borrow()
    }

    pub fn is_loading(&self) -> bool {
        self.state() == LoadState::Loading
    }

    pub fn begin_navigation(&self) {
        log::trace!("page lifecycle: loading");
        self.state.send_replace(LoadState::Loading);
    }

    pub fn finish_navigation(&self) {
        log::trace!("page lifecycle: complete");
        self.state.send_replace(LoadState::Complete);
    }

    /// Resolve when the page is complete
    pub async fn wait_for_page(&self) -> Result<()> {
        let mut rx = self.state.subscribe();
        rx.wait_for(|s| *s == LoadState::Complete)
            .await
            .map(|_| ())
            .map_err(|_| Error::Navigation("page lifecycle tracker dropped".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn complete_gate_is_already_open() {
        let lc = PageLifecycle::new();
        assert_eq!(lc.state(), LoadState::Complete);
        lc.wait_for_page().await.unwrap();
    }

    #[tokio::test]
    async fn gate_parks_while_loading() {
        let lc = Arc::new(PageLifecycle::new());
        lc.begin_navigation();
        assert!(lc.is_loading());

        let waiting = {
            let lc = lc.clone();
            tokio::spawn(async move { lc.wait_for_page().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());

        lc.finish_navigation();
        waiting.await.unwrap().unwrap();
    }
}
