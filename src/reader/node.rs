//! Node handles

use crate::tree::{NodeData, NodeId, NodeState, TreeSnapshot, TreeStore};
use std::fmt;
use std::sync::Arc;

/// Reference to one node of a live tree, or to nothing.
///
/// A handle reads through to the store's current snapshot, so it reflects
/// later edits of its node and becomes empty once the node is removed (for
/// example by a navigation). The empty handle is an ordinary value: every
/// accessor treats it as "absent".
#[derive(Clone, Default)]
pub struct NodeHandle {
    target: Option<(Arc<TreeStore>, NodeId)>,
}

impl NodeHandle {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(store: Arc<TreeStore>, id: NodeId) -> Self {
        Self {
            target: Some((store, id)),
        }
    }

    pub(crate) fn from_opt(store: &Arc<TreeStore>, id: Option<NodeId>) -> Self {
        match id {
            Some(id) => Self::new(store.clone(), id),
            None => Self::empty(),
        }
    }

    /// True when the handle wraps nothing or its node no longer exists
    pub fn is_empty(&self) -> bool {
        self.with(|_, _| ()).is_none()
    }

    /// Id of the wrapped node, whether or not it still exists
    pub fn id(&self) -> Option<NodeId> {
        self.target.as_ref().map(|(_, id)| *id)
    }

    pub fn store(&self) -> Option<&Arc<TreeStore>> {
        self.target.as_ref().map(|(store, _)| store)
    }

    /// Run `read` against the node in the current snapshot
    pub fn with<R>(&self, read: impl FnOnce(&TreeSnapshot, &NodeData) -> R) -> Option<R> {
        let (store, id) = self.target.as_ref()?;
        let tree = store.current();
        let node = tree.get(*id)?;
        Some(read(&tree, node))
    }

    fn related(&self, pick: impl FnOnce(&TreeSnapshot, &NodeData) -> Option<NodeId>) -> NodeHandle {
        match &self.target {
            Some((store, _)) => NodeHandle::from_opt(store, self.with(pick).flatten()),
            None => NodeHandle::empty(),
        }
    }

    fn related_all(
        &self,
        pick: impl FnOnce(&TreeSnapshot, &NodeData) -> Option<Vec<NodeId>>,
    ) -> Option<Vec<NodeHandle>> {
        let (store, _) = self.target.as_ref()?;
        let ids = self.with(pick).flatten()?;
        Some(ids.into_iter().map(|id| NodeHandle::new(store.clone(), id)).collect())
    }

    pub fn role(&self) -> Option<String> {
        self.with(|_, n| n.role.clone())
    }

    pub fn name(&self) -> Option<String> {
        self.with(|_, n| n.name.clone()).flatten()
    }

    pub fn value(&self) -> Option<String> {
        self.with(|_, n| n.value.clone()).flatten()
    }

    pub fn state(&self) -> Option<NodeState> {
        self.with(|_, n| n.state.clone())
    }

    /// Raw attribute value; absent and `"false"` stay distinct here
    pub fn attribute(&self, key: &str) -> Option<String> {
        self.with(|_, n| n.attributes.get(key).cloned()).flatten()
    }

    pub fn is_focused(&self) -> bool {
        self.with(|t, n| t.focus() == Some(n.id)).unwrap_or(false)
    }

    pub fn first_child(&self) -> NodeHandle {
        self.related(|_, n| n.children.first().copied())
    }

    pub fn next_sibling(&self) -> NodeHandle {
        self.related(|t, n| t.next_sibling(n.id))
    }

    pub fn parent(&self) -> NodeHandle {
        self.related(|_, n| n.parent)
    }

    pub fn children(&self) -> Vec<NodeHandle> {
        self.related_all(|_, n| Some(n.children.clone()))
            .unwrap_or_default()
    }

    pub fn active_descendant(&self) -> NodeHandle {
        self.related(|_, n| n.active_descendant)
    }

    pub fn next_focus(&self) -> NodeHandle {
        self.related(|_, n| n.next_focus)
    }

    /// `None` when the relation is not set at all
    pub fn controls(&self) -> Option<Vec<NodeHandle>> {
        self.related_all(|_, n| n.controls.clone())
    }

    pub fn flow_to(&self) -> Option<Vec<NodeHandle>> {
        self.related_all(|_, n| n.flow_to.clone())
    }

    pub fn flow_from(&self) -> Option<Vec<NodeHandle>> {
        self.related_all(|t, n| t.flow_from(n.id))
    }
}

impl PartialEq for NodeHandle {
    fn eq(&self, other: &Self) -> bool {
        match (&self.target, &other.target) {
            (Some((a, x)), Some((b, y))) => Arc::ptr_eq(a, b) && x == y,
            (None, None) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id() {
            Some(id) => write!(f, "NodeHandle({})", id),
            None => write!(f, "NodeHandle(empty)"),
        }
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.with(|_, n| (n.role.clone(), n.name.clone())) {
            Some((role, Some(name))) => write!(f, "{{role: {}, name: \"{}\"}}", role, name),
            Some((role, None)) => write!(f, "{{role: {}}}", role),
            None => write!(f, "<empty>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{roles, TreeSnapshot};

    #[test]
    fn handle_goes_empty_when_node_is_removed() {
        let store = TreeStore::new(TreeSnapshot::new("about:blank", "t"));
        let root = store.current().root().unwrap();
        let id = store.mutate(|t| t.append(root, NodeData::new(roles::BUTTON).named("Go")));
        let h = NodeHandle::new(store.clone(), id);
        assert!(!h.is_empty());
        assert_eq!(h.to_string(), "{role: button, name: \"Go\"}");
        assert_eq!(h.parent().id(), Some(root));

        store.mutate(|t| t.remove(id));
        assert!(h.is_empty());
        assert_eq!(h.role(), None);
        assert!(h.parent().is_empty());
        assert_eq!(h.to_string(), "<empty>");
    }

    #[test]
    fn unset_relations_are_none_not_empty() {
        let store = TreeStore::new(TreeSnapshot::new("about:blank", "t"));
        let root = NodeHandle::new(store.clone(), store.current().root().unwrap());
        assert!(root.controls().is_none());
        assert!(root.flow_from().is_none());
        assert!(root.children().is_empty());
        assert!(NodeHandle::empty().controls().is_none());
    }
}
