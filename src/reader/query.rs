//! Pure search functions over one snapshot
//!
//! All three walk the tree in document (pre-)order. `find` and `find_all`
//! consider `scope` itself; `next` starts at its first child and never leaves
//! its subtree.

use crate::tree::{NodeId, SearchPredicate, TreeSnapshot};

/// First node of `scope`'s subtree (scope included) matching `pred`
pub fn find(tree: &TreeSnapshot, scope: NodeId, pred: &SearchPredicate) -> Option<NodeId> {
    matching(tree, scope, pred).next()
}

/// Every node of `scope`'s subtree (scope included) matching `pred`
pub fn find_all(tree: &TreeSnapshot, scope: NodeId, pred: &SearchPredicate) -> Vec<NodeId> {
    matching(tree, scope, pred).collect()
}

/// First strict descendant of `scope` matching `pred`
pub fn next(tree: &TreeSnapshot, scope: NodeId, pred: &SearchPredicate) -> Option<NodeId> {
    matching(tree, scope, pred).find(|id| *id != scope)
}

fn matching<'a>(
    tree: &'a TreeSnapshot,
    scope: NodeId,
    pred: &'a SearchPredicate,
) -> impl Iterator<Item = NodeId> + 'a {
    tree.subtree(scope)
        .into_iter()
        .filter(move |id| tree.get(*id).is_some_and(|n| pred.matches(n)))
}
