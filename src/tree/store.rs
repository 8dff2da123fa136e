//! Shared, live accessibility tree

use super::{EventType, NodeId, TreeEvent, TreeSnapshot};
use crate::lifecycle::PageLifecycle;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 1024;

/// The live tree shared by a driver, the reader and any waiters.
///
/// Backends publish a whole new snapshot after every change; the store diffs
/// it against the previous one and broadcasts the resulting events. Readers
/// always see the latest published snapshot.
#[derive(Debug)]
pub struct TreeStore {
    snapshot: RwLock<Arc<TreeSnapshot>>,
    events: broadcast::Sender<TreeEvent>,
    lifecycle: PageLifecycle,
}

impl TreeStore {
    pub fn new(initial: TreeSnapshot) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            snapshot: RwLock::new(Arc::new(initial)),
            events,
            lifecycle: PageLifecycle::new(),
        })
    }

    /// The most recently published snapshot
    pub fn current(&self) -> Arc<TreeSnapshot> {
        match self.snapshot.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Subscribe to events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<TreeEvent> {
        self.events.subscribe()
    }

    pub fn lifecycle(&self) -> &PageLifecycle {
        &self.lifecycle
    }

    /// Publish a new snapshot of the same page. Returns the number of events
    /// the change produced.
    pub fn replace(&self, next: TreeSnapshot) -> usize {
        let events = {
            let mut guard = match self.snapshot.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let events = guard.diff(&next);
            *guard = Arc::new(next);
            events
        };
        let count = events.len();
        for event in events {
            // No receivers is fine: nobody is waiting.
            let _ = self.events.send(event);
        }
        count
    }

    /// Apply an in-place edit and publish the result.
    ///
    /// The write lock is held from copy to publish, so concurrent edits
    /// serialize and none is lost. Events go out after the lock is released.
    pub fn mutate<R>(&self, edit: impl FnOnce(&mut TreeSnapshot) -> R) -> R {
        let (out, events) = {
            let mut guard = match self.snapshot.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let before = guard.clone();
            let out = edit(Arc::make_mut(&mut guard));
            (out, before.diff(&guard))
        };
        for event in events {
            let _ = self.events.send(event);
        }
        out
    }

    /// Id to start numbering a replacement page from
    pub fn id_floor(&self) -> u64 {
        self.current().next_id()
    }

    /// Enter the loading state and announce it
    pub fn begin_navigation(&self) {
        self.lifecycle.begin_navigation();
        self.announce(EventType::LoadStart);
    }

    /// Publish the new page, then leave the loading state
    pub fn finish_navigation(&self, page: TreeSnapshot) {
        self.replace(page);
        self.announce(EventType::LoadComplete);
        self.lifecycle.finish_navigation();
    }

    fn announce(&self, event: EventType) {
        let tree = self.current();
        let (target, role, name) = match tree.root().and_then(|r| tree.get(r)) {
            Some(root) => (root.id, root.role.clone(), root.name.clone()),
            None => (NodeId(0), String::new(), None),
        };
        let _ = self.events.send(TreeEvent {
            event,
            target,
            role,
            name,
        });
    }
}
