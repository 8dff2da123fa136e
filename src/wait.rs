//! One-shot change waiters
//!
//! A [`Wait`] subscribes to the tree store when it is created and resolves on
//! the first event satisfying its [`Condition`]. Create it *before* the
//! action whose effect it waits for, then [`Wait::resolve`] it afterwards;
//! events published in between are buffered by the subscription. Each wait
//! is single use and unsubscribes when dropped.
//!
//! While waiting, the driver is refreshed every poll interval so backends
//! that only observe the page by polling still produce events. Every wait is
//! bounded by `Timing::wait_timeout`.

use crate::driver::Driver;
use crate::tree::{EventType, NodeId, SearchPredicate, TreeEvent, TreeSnapshot, TreeStore};
use crate::{Error, Result, Timing};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

/// What a [`Wait`] is waiting for
#[derive(Debug, Clone)]
pub enum Condition {
    /// An event of this type on this node
    NodeEvent { node: NodeId, event: EventType },
    /// Any structural or attribute change on a node matching the predicate
    TreeChange(SearchPredicate),
    /// Focus moving onto `scope` or one of its descendants
    FocusWithin(NodeId),
    /// A node matching the predicate becoming visible
    Shown(SearchPredicate),
    /// A node matching the predicate disappearing or becoming invisible
    Hidden(SearchPredicate),
}

impl Condition {
    fn satisfied_by(&self, event: &TreeEvent, tree: &TreeSnapshot) -> bool {
        match self {
            Condition::NodeEvent { node, event: kind } => event.target == *node && event.event == *kind,
            Condition::TreeChange(pred) => {
                event.event.is_tree_change() && event_matches(pred, event, tree)
            }
            Condition::FocusWithin(scope) => {
                event.event == EventType::Focus && tree.contains(*scope, event.target)
            }
            Condition::Shown(pred) => {
                matches!(event.event, EventType::NodeCreated | EventType::StateChanged)
                    && event_matches(pred, event, tree)
                    && tree.get(event.target).is_some_and(|n| !n.state.invisible)
            }
            Condition::Hidden(pred) => match event.event {
                EventType::NodeRemoved => event_matches(pred, event, tree),
                EventType::StateChanged => {
                    event_matches(pred, event, tree)
                        && tree.get(event.target).is_some_and(|n| n.state.invisible)
                }
                _ => false,
            },
        }
    }
}

/// Match against the live node, or against what the event recorded when the
/// node is already gone
fn event_matches(pred: &SearchPredicate, event: &TreeEvent, tree: &TreeSnapshot) -> bool {
    match tree.get(event.target) {
        Some(node) => pred.matches(node),
        None => {
            let mut ghost = crate::tree::NodeData::new(event.role.clone());
            ghost.name = event.name.clone();
            pred.matches(&ghost)
        }
    }
}

/// A pending single-use subscription
pub struct Wait {
    rx: broadcast::Receiver<TreeEvent>,
    store: Arc<TreeStore>,
    condition: Condition,
}

impl Wait {
    /// Subscribe now
    pub fn new(store: &Arc<TreeStore>, condition: Condition) -> Self {
        log::trace!("wait: subscribing for {:?}", condition);
        Self {
            rx: store.subscribe(),
            store: store.clone(),
            condition,
        }
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    /// Resolve with the first matching event
    pub async fn resolve<D: Driver>(mut self, driver: &D, timing: &Timing) -> Result<TreeEvent> {
        let bound = timing.wait_timeout;
        let mut ticker = tokio::time::interval(timing.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let condition = self.condition.clone();

        let pending = async {
            loop {
                tokio::select! {
                    received = self.rx.recv() => match received {
                        Ok(event) => {
                            let tree = self.store.current();
                            if condition.satisfied_by(&event, &tree) {
                                log::trace!("wait: resolved by {:?} on {}", event.event, event.target);
                                return Ok(event);
                            }
                        }
                        Err(RecvError::Lagged(n)) => {
                            log::warn!("wait: skipped {} tree events", n);
                        }
                        Err(RecvError::Closed) => {
                            return Err(Error::Other("tree store closed".into()));
                        }
                    },
                    _ = ticker.tick() => driver.refresh().await?,
                }
            }
        };
        match tokio::time::timeout(bound, pending).await {
            Ok(result) => result,
            Err(_) => {
                log::warn!("wait: gave up on {:?} after {:?}", condition, bound);
                Err(Error::Timeout(bound.as_millis() as u64))
            }
        }
    }
}

/// Poll `check` against fresh snapshots until it holds.
///
/// Fallback for states that do not reliably produce a change event (ARIA
/// attributes flipped by page script); prefer a [`Wait`] where one exists.
pub async fn poll_until<D, F>(driver: &D, timing: &Timing, mut check: F) -> Result<()>
where
    D: Driver,
    F: FnMut(&TreeSnapshot) -> bool,
{
    let bound = timing.wait_timeout;
    let polling = async {
        loop {
            driver.refresh().await?;
            if check(&driver.store().current()) {
                return Ok(());
            }
            tokio::time::sleep(timing.poll_interval).await;
        }
    };
    match tokio::time::timeout(bound, polling).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(bound.as_millis() as u64)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::SimDriver;
    use crate::tree::{roles, NodeData};
    use std::time::Duration;

    #[tokio::test]
    async fn event_published_before_resolve_is_not_lost() {
        let driver = SimDriver::new();
        let store = driver.store().clone();
        let root = store.current().root().unwrap();
        let wait = Wait::new(&store, Condition::Shown(SearchPredicate::role(roles::DIALOG)));
        store.mutate(|t| t.append(root, NodeData::new(roles::DIALOG).named("Hi")));

        let event = wait.resolve(&driver, &Timing::immediate()).await.unwrap();
        assert_eq!(event.role, roles::DIALOG);
    }

    #[tokio::test]
    async fn hidden_matches_removed_nodes() {
        let driver = SimDriver::new();
        let store = driver.store().clone();
        let root = store.current().root().unwrap();
        let id = store.mutate(|t| t.append(root, NodeData::new(roles::ALERT_DIALOG).named("Sure?")));
        let wait = Wait::new(&store, Condition::Hidden(SearchPredicate::role(roles::ALERT_DIALOG)));
        store.mutate(|t| t.remove(id));
        let event = wait.resolve(&driver, &Timing::immediate()).await.unwrap();
        assert_eq!(event.event, EventType::NodeRemoved);
    }

    #[tokio::test]
    async fn waits_are_bounded() {
        let driver = SimDriver::new();
        let timing = Timing {
            wait_timeout: Duration::from_millis(30),
            ..Timing::immediate()
        };
        let wait = Wait::new(driver.store(), Condition::FocusWithin(NodeId(1)));
        assert!(matches!(
            wait.resolve(&driver, &timing).await,
            Err(Error::Timeout(30))
        ));
        assert!(matches!(
            poll_until(&driver, &timing, |_| false).await,
            Err(Error::Timeout(30))
        ));
    }
}
