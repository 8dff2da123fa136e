//! Accessibility tree data model
//!
//! A [`TreeSnapshot`] is an immutable-by-convention picture of the page's
//! accessibility tree at one point in time. Backends build a fresh snapshot
//! after every action and hand it to the shared [`store::TreeStore`], which
//! diffs it against the previous one and broadcasts the resulting
//! [`TreeEvent`]s to any waiters.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

pub mod predicate;
pub mod roles;
pub mod store;

pub use predicate::{NameMatch, SearchPredicate};
pub use store::TreeStore;

/// Identifier of a node inside one tree store. Ids are never reused within a
/// store, so a handle to a removed node stays removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Boolean state flags exposed by a node. Focus is not stored here: the
/// snapshot tracks a single focused node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeState {
    pub focusable: bool,
    pub expanded: bool,
    pub invisible: bool,
    pub modal: bool,
}

/// One node of the tree
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub id: NodeId,
    pub role: String,
    pub name: Option<String>,
    pub value: Option<String>,
    pub state: NodeState,
    /// Mirrors of the underlying element's attributes (`aria-*`, `id`, `tabindex`, ...)
    pub attributes: BTreeMap<String, String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub controls: Option<Vec<NodeId>>,
    pub flow_to: Option<Vec<NodeId>>,
    pub next_focus: Option<NodeId>,
    pub active_descendant: Option<NodeId>,
}

impl NodeData {
    /// A detached node with the given role; the id is assigned on insertion.
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            id: NodeId(0),
            role: role.into(),
            name: None,
            value: None,
            state: NodeState::default(),
            attributes: BTreeMap::new(),
            parent: None,
            children: Vec::new(),
            controls: None,
            flow_to: None,
            next_focus: None,
            active_descendant: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn focusable(mut self) -> Self {
        self.state.focusable = true;
        self
    }

    pub fn invisible(mut self) -> Self {
        self.state.invisible = true;
        self
    }

    pub fn modal(mut self) -> Self {
        self.state.modal = true;
        self
    }

    pub fn expanded(mut self, expanded: bool) -> Self {
        self.state.expanded = expanded;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Event types delivered to waiters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventType {
    Focus,
    Blur,
    Expanded,
    Collapsed,
    AttributeChanged,
    StateChanged,
    NameChanged,
    ValueChanged,
    ChildrenChanged,
    NodeCreated,
    NodeRemoved,
    LoadStart,
    LoadComplete,
}

impl EventType {
    /// Structural or attribute changes, as opposed to focus and load events
    pub fn is_tree_change(self) -> bool {
        !matches!(
            self,
            EventType::Focus | EventType::Blur | EventType::LoadStart | EventType::LoadComplete
        )
    }
}

/// A change observed between two snapshots
#[derive(Debug, Clone, PartialEq)]
pub struct TreeEvent {
    pub event: EventType,
    pub target: NodeId,
    pub role: String,
    pub name: Option<String>,
}

impl TreeEvent {
    fn about(event: EventType, node: &NodeData) -> Self {
        Self {
            event,
            target: node.id,
            role: node.role.clone(),
            name: node.name.clone(),
        }
    }
}

/// The whole tree at one point in time
#[derive(Debug, Clone, Default)]
pub struct TreeSnapshot {
    nodes: HashMap<NodeId, NodeData>,
    root: Option<NodeId>,
    focus: Option<NodeId>,
    url: String,
    next_id: u64,
}

impl TreeSnapshot {
    /// A tree with only a root web area named after the page title
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self::starting_at(url, title, 1)
    }

    /// Like [`TreeSnapshot::new`], but hands out ids from `first_id` on. Used
    /// when a page replaces another in the same store so that ids of the old
    /// page are never reused.
    pub fn starting_at(url: impl Into<String>, title: impl Into<String>, first_id: u64) -> Self {
        let mut tree = Self {
            url: url.into(),
            next_id: first_id.max(1),
            ..Default::default()
        };
        let title = title.into();
        let mut root = NodeData::new(roles::ROOT_WEB_AREA);
        if !title.is_empty() {
            root.name = Some(title);
        }
        let id = tree.insert(root);
        tree.root = Some(id);
        tree
    }

    /// A tree with no root at all (no page loaded)
    pub fn empty() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    /// Assemble a snapshot from nodes whose ids and links were assigned
    /// elsewhere (a browser backend). Dangling links are dropped; a relation
    /// left with no target at all counts as absent.
    pub fn from_nodes(
        url: impl Into<String>,
        root: Option<NodeId>,
        focus: Option<NodeId>,
        nodes: Vec<NodeData>,
    ) -> Self {
        let next_id = nodes.iter().map(|n| n.id.0).max().unwrap_or(0) + 1;
        let mut map: HashMap<NodeId, NodeData> = nodes.into_iter().map(|n| (n.id, n)).collect();
        let known: HashSet<NodeId> = map.keys().copied().collect();
        for node in map.values_mut() {
            node.children.retain(|c| known.contains(c));
            if let Some(p) = node.parent {
                if !known.contains(&p) {
                    node.parent = None;
                }
            }
            for rel in [&mut node.controls, &mut node.flow_to] {
                if let Some(list) = rel.as_mut() {
                    list.retain(|c| known.contains(c));
                }
                if rel.as_ref().is_some_and(Vec::is_empty) {
                    *rel = None;
                }
            }
            if node.next_focus.is_some_and(|n| !known.contains(&n)) {
                node.next_focus = None;
            }
            if node.active_descendant.is_some_and(|n| !known.contains(&n)) {
                node.active_descendant = None;
            }
        }
        Self {
            nodes: map,
            root: root.filter(|r| known.contains(r)),
            focus: focus.filter(|f| known.contains(f)),
            url: url.into(),
            next_id,
        }
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    /// Accessible name of the root web area
    pub fn title(&self) -> Option<&str> {
        self.root
            .and_then(|r| self.nodes.get(&r))
            .and_then(|n| n.name.as_deref())
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        if let Some(root) = self.root.and_then(|r| self.nodes.get_mut(&r)) {
            root.name = Some(title.into());
        }
    }

    /// The id the next inserted node will get
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(&id)
    }

    pub fn focus(&self) -> Option<NodeId> {
        self.focus
    }

    /// Move focus; unknown ids clear it.
    pub fn set_focus(&mut self, id: Option<NodeId>) {
        self.focus = id.filter(|i| self.nodes.contains_key(i));
    }

    fn insert(&mut self, mut data: NodeData) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        data.id = id;
        self.nodes.insert(id, data);
        id
    }

    /// Insert `data` as the last child of `parent`
    pub fn append(&mut self, parent: NodeId, mut data: NodeData) -> NodeId {
        data.parent = Some(parent);
        data.children.clear();
        let id = self.insert(data);
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        id
    }

    /// Remove a node and its whole subtree
    pub fn remove(&mut self, id: NodeId) {
        let doomed = self.subtree(id);
        if let Some(parent) = self.nodes.get(&id).and_then(|n| n.parent) {
            if let Some(p) = self.nodes.get_mut(&parent) {
                p.children.retain(|c| *c != id);
            }
        }
        for d in &doomed {
            self.nodes.remove(d);
        }
        if self.focus.is_some_and(|f| doomed.contains(&f)) {
            self.focus = None;
        }
        if self.root == Some(id) {
            self.root = None;
        }
    }

    /// Re-parent a node (keeping its subtree) as the last child of `new_parent`
    pub fn move_node(&mut self, id: NodeId, new_parent: NodeId) {
        if !self.nodes.contains_key(&new_parent) || self.contains(id, new_parent) {
            return;
        }
        let old_parent = match self.nodes.get(&id) {
            Some(n) => n.parent,
            None => return,
        };
        if let Some(p) = old_parent.and_then(|p| self.nodes.get_mut(&p)) {
            p.children.retain(|c| *c != id);
        }
        if let Some(p) = self.nodes.get_mut(&new_parent) {
            p.children.push(id);
        }
        if let Some(n) = self.nodes.get_mut(&id) {
            n.parent = Some(new_parent);
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.children.first().copied())
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = &self.nodes.get(&parent)?.children;
        let pos = siblings.iter().position(|c| *c == id)?;
        siblings.get(pos + 1).copied()
    }

    /// Nodes whose `flow_to` names `id`, in document order; `None` when there are none
    pub fn flow_from(&self, id: NodeId) -> Option<Vec<NodeId>> {
        let root = self.root?;
        let sources: Vec<NodeId> = self
            .subtree(root)
            .into_iter()
            .filter(|n| {
                self.nodes
                    .get(n)
                    .and_then(|d| d.flow_to.as_ref())
                    .is_some_and(|list| list.contains(&id))
            })
            .collect();
        if sources.is_empty() {
            None
        } else {
            Some(sources)
        }
    }

    /// Whether `id` is `scope` or one of its descendants
    pub fn contains(&self, scope: NodeId, id: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(c) = cur {
            if c == scope {
                return true;
            }
            cur = self.parent(c);
        }
        false
    }

    /// `scope` and its descendants in document (pre-) order
    pub fn subtree(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.nodes.contains_key(&scope) {
            return out;
        }
        let mut stack = vec![scope];
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(n) = self.nodes.get(&id) {
                stack.extend(n.children.iter().rev().copied());
            }
        }
        out
    }

    pub fn set_attr(&mut self, id: NodeId, key: &str, value: impl Into<String>) {
        if let Some(n) = self.nodes.get_mut(&id) {
            n.attributes.insert(key.to_string(), value.into());
        }
    }

    pub fn attr(&self, id: NodeId, key: &str) -> Option<&str> {
        self.nodes.get(&id).and_then(|n| n.attributes.get(key)).map(String::as_str)
    }

    /// Events describing how `newer` differs from `self`
    pub fn diff(&self, newer: &TreeSnapshot) -> Vec<TreeEvent> {
        let mut events = Vec::new();
        let order = match newer.root {
            Some(r) => newer.subtree(r),
            None => Vec::new(),
        };
        for id in &order {
            let Some(new) = newer.nodes.get(id) else { continue };
            let Some(old) = self.nodes.get(id) else {
                events.push(TreeEvent::about(EventType::NodeCreated, new));
                continue;
            };
            if old.state.expanded != new.state.expanded {
                let ev = if new.state.expanded {
                    EventType::Expanded
                } else {
                    EventType::Collapsed
                };
                events.push(TreeEvent::about(ev, new));
            }
            if old.state != new.state {
                events.push(TreeEvent::about(EventType::StateChanged, new));
            }
            if old.attributes != new.attributes
                || old.controls != new.controls
                || old.active_descendant != new.active_descendant
            {
                events.push(TreeEvent::about(EventType::AttributeChanged, new));
            }
            if old.name != new.name {
                events.push(TreeEvent::about(EventType::NameChanged, new));
            }
            if old.value != new.value {
                events.push(TreeEvent::about(EventType::ValueChanged, new));
            }
            if old.children != new.children {
                events.push(TreeEvent::about(EventType::ChildrenChanged, new));
            }
        }
        let mut removed: Vec<&NodeData> = self
            .nodes
            .values()
            .filter(|n| !newer.nodes.contains_key(&n.id))
            .collect();
        removed.sort_by_key(|n| n.id);
        events.extend(removed.into_iter().map(|n| TreeEvent::about(EventType::NodeRemoved, n)));

        if self.focus != newer.focus {
            if let Some(old) = self.focus.and_then(|f| self.nodes.get(&f)) {
                events.push(TreeEvent::about(EventType::Blur, old));
            }
            if let Some(new) = newer.focus.and_then(|f| newer.nodes.get(&f)) {
                events.push(TreeEvent::about(EventType::Focus, new));
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (TreeSnapshot, NodeId, NodeId, NodeId) {
        let mut t = TreeSnapshot::new("about:blank", "Sample");
        let root = t.root().unwrap();
        let list = t.append(root, NodeData::new("list"));
        let a = t.append(list, NodeData::new("listItem").named("a"));
        let b = t.append(list, NodeData::new("listItem").named("b"));
        (t, list, a, b)
    }

    #[test]
    fn siblings_and_children() {
        let (t, list, a, b) = sample();
        assert_eq!(t.first_child(list), Some(a));
        assert_eq!(t.next_sibling(a), Some(b));
        assert_eq!(t.next_sibling(b), None);
        assert_eq!(t.parent(b), Some(list));
        assert!(t.contains(list, b));
        assert!(!t.contains(a, b));
    }

    #[test]
    fn subtree_is_document_order() {
        let (t, list, a, b) = sample();
        assert_eq!(t.subtree(list), vec![list, a, b]);
    }

    #[test]
    fn remove_detaches_and_clears_focus() {
        let (mut t, list, a, b) = sample();
        t.set_focus(Some(a));
        t.remove(a);
        assert!(t.get(a).is_none());
        assert_eq!(t.get(list).unwrap().children, vec![b]);
        assert_eq!(t.focus(), None);
    }

    #[test]
    fn move_node_refuses_cycles() {
        let (mut t, list, a, _) = sample();
        t.move_node(list, a);
        assert_eq!(t.parent(list), t.root());
    }

    #[test]
    fn diff_reports_focus_and_expansion() {
        let (old, _list, a, b) = sample();
        let mut new = old.clone();
        new.set_focus(Some(b));
        new.get_mut(a).unwrap().state.expanded = true;
        let events = old.diff(&new);
        assert!(events
            .iter()
            .any(|e| e.event == EventType::Expanded && e.target == a));
        assert!(events
            .iter()
            .any(|e| e.event == EventType::Focus && e.target == b));
    }

    #[test]
    fn diff_reports_removed_nodes() {
        let (old, list, a, _) = sample();
        let mut new = old.clone();
        new.remove(a);
        let events = old.diff(&new);
        assert!(events
            .iter()
            .any(|e| e.event == EventType::NodeRemoved && e.target == a));
        assert!(events
            .iter()
            .any(|e| e.event == EventType::ChildrenChanged && e.target == list));
    }

    #[test]
    fn flow_from_is_inverse_of_flow_to() {
        let (mut t, _list, a, b) = sample();
        assert_eq!(t.flow_from(b), None);
        t.get_mut(a).unwrap().flow_to = Some(vec![b]);
        assert_eq!(t.flow_from(b), Some(vec![a]));
    }

    #[test]
    fn from_nodes_drops_dangling_links() {
        let mut button = NodeData::new("button");
        button.id = NodeId(3);
        button.controls = Some(vec![NodeId(99)]);
        button.flow_to = Some(vec![NodeId(4), NodeId(98)]);
        let mut region = NodeData::new("region");
        region.id = NodeId(4);
        region.parent = Some(NodeId(3));
        button.children = vec![NodeId(4)];
        let t = TreeSnapshot::from_nodes("x", Some(NodeId(3)), Some(NodeId(42)), vec![button, region]);
        let button = t.get(NodeId(3)).unwrap();
        assert_eq!(button.controls, None);
        assert_eq!(button.flow_to, Some(vec![NodeId(4)]));
        assert_eq!(t.focus(), None);
    }
}
