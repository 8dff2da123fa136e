//! Tree query and interaction layer
//!
//! [`ScreenReader`] is what validators see of the page: searches that hand
//! out [`NodeHandle`]s, state accessors, and interactive primitives that
//! settle for a [`Timing`] interval after acting.
//!
//! Failure policy: passing an empty handle where a live node is required,
//! or a structural assertion that does not hold, is an error. A search that
//! finds nothing is not; it returns an empty handle or an empty `Vec`.

use crate::driver::{Driver, KeyInput, SpecialKey};
use crate::tap::Console;
use crate::tree::{roles, EventType, NodeId, SearchPredicate, TreeEvent, TreeSnapshot, TreeStore};
use crate::wait::{self, Condition, Wait};
use crate::{Error, Result, Timing};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

pub mod node;
pub mod query;

pub use node::NodeHandle;

/// Value `get_attribute_value` reports for attributes that are not set
pub const ABSENT: &str = "false";

pub struct ScreenReader<D: Driver> {
    driver: D,
    timing: Timing,
    console: Console,
}

impl<D: Driver> ScreenReader<D> {
    pub fn new(driver: D, timing: Timing) -> Self {
        Self {
            driver,
            timing,
            console: Console::stdout(),
        }
    }

    /// Where `debug_print_*` output goes
    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn store(&self) -> &Arc<TreeStore> {
        self.driver.store()
    }

    fn handle(&self, id: Option<NodeId>) -> NodeHandle {
        NodeHandle::from_opt(self.store(), id)
    }

    /// Id of a live node, or `err` for empty and stale handles
    fn live(&self, handle: &NodeHandle, err: fn() -> Error) -> Result<(Arc<TreeSnapshot>, NodeId)> {
        let tree = self.store().current();
        match handle.id() {
            Some(id) if tree.get(id).is_some() => Ok((tree, id)),
            _ => Err(err()),
        }
    }

    /// Sleep, then have the driver republish whatever the page did meanwhile
    async fn settle(&self, interval: Duration) {
        if !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
        if let Err(e) = self.driver.refresh().await {
            log::warn!("refresh after settle failed: {}", e);
        }
    }

    // ---- page ----

    /// Root of the current page, once it has finished loading
    pub async fn get_page(&self) -> Result<NodeHandle> {
        self.store().lifecycle().wait_for_page().await?;
        Ok(self.handle(self.store().current().root()))
    }

    pub async fn get_page_title(&self) -> Result<Option<String>> {
        self.store().lifecycle().wait_for_page().await?;
        Ok(self.store().current().title().map(str::to_string))
    }

    pub async fn get_page_url(&self) -> Result<String> {
        self.store().lifecycle().wait_for_page().await?;
        Ok(self.store().current().url().to_string())
    }

    /// Navigate and return once the new page is complete
    pub async fn set_page_url(&self, url: &str) -> Result<()> {
        self.driver.navigate(url).await?;
        self.settle(self.timing.navigation).await;
        self.store().lifecycle().wait_for_page().await
    }

    pub async fn find_in_page(&self, pred: &SearchPredicate) -> Result<NodeHandle> {
        let page = self.get_page().await?;
        self.find(&page, pred)
    }

    pub async fn find_all_in_page(&self, pred: &SearchPredicate) -> Result<Vec<NodeHandle>> {
        let page = self.get_page().await?;
        self.find_all(&page, pred)
    }

    pub async fn exists_in_page(&self, pred: &SearchPredicate) -> Result<bool> {
        Ok(!self.find_in_page(pred).await?.is_empty())
    }

    // ---- searches ----

    /// First match in `scope`'s subtree, `scope` included
    pub fn find(&self, scope: &NodeHandle, pred: &SearchPredicate) -> Result<NodeHandle> {
        let (tree, scope) = self.live(scope, || Error::InvalidScope)?;
        Ok(self.handle(query::find(&tree, scope, pred)))
    }

    /// Every match in `scope`'s subtree in document order, `scope` included
    pub fn find_all(&self, scope: &NodeHandle, pred: &SearchPredicate) -> Result<Vec<NodeHandle>> {
        let (tree, scope) = self.live(scope, || Error::InvalidScope)?;
        Ok(query::find_all(&tree, scope, pred)
            .into_iter()
            .map(|id| NodeHandle::new(self.store().clone(), id))
            .collect())
    }

    /// First match strictly inside `scope`
    pub fn next(&self, scope: &NodeHandle, pred: &SearchPredicate) -> Result<NodeHandle> {
        let (tree, scope) = self.live(scope, || Error::InvalidScope)?;
        Ok(self.handle(query::next(&tree, scope, pred)))
    }

    /// The first child, which must have `role`
    pub fn get_child(&self, scope: &NodeHandle, role: &str) -> Result<NodeHandle> {
        let (tree, scope) = self.live(scope, || Error::NodeIsNull)?;
        let child = tree.first_child(scope).ok_or(Error::NoChildren)?;
        check_role(&tree, child, role)?;
        Ok(self.handle(Some(child)))
    }

    /// All children, every one of which must have `role`
    pub fn get_children(&self, scope: &NodeHandle, role: &str) -> Result<Vec<NodeHandle>> {
        let (tree, scope) = self.live(scope, || Error::NodeIsNull)?;
        let children = tree.get(scope).map(|n| n.children.clone()).unwrap_or_default();
        children
            .into_iter()
            .map(|child| {
                check_role(&tree, child, role)?;
                Ok(NodeHandle::new(self.store().clone(), child))
            })
            .collect()
    }

    pub fn parent(&self, node: &NodeHandle) -> NodeHandle {
        node.parent()
    }

    /// First descendant in the tab sequence (`tabindex="0"`)
    pub fn find_by_tab_index(&self, scope: &NodeHandle) -> Result<NodeHandle> {
        self.next(scope, &SearchPredicate::any().with_attr("tabindex", "0"))
    }

    // ---- relations ----

    fn relation(
        &self,
        node: &NodeHandle,
        name: &'static str,
        rel: Option<Vec<NodeHandle>>,
    ) -> Result<Vec<NodeHandle>> {
        self.live(node, || Error::NodeIsNull)?;
        rel.ok_or(Error::NoSuchRelation(name))
    }

    pub fn get_controls(&self, node: &NodeHandle) -> Result<Vec<NodeHandle>> {
        self.relation(node, "controls", node.controls())
    }

    pub fn get_flow_to(&self, node: &NodeHandle) -> Result<Vec<NodeHandle>> {
        self.relation(node, "flowTo", node.flow_to())
    }

    pub fn get_flow_from(&self, node: &NodeHandle) -> Result<Vec<NodeHandle>> {
        self.relation(node, "flowFrom", node.flow_from())
    }

    pub fn get_next_focus(&self, node: &NodeHandle) -> Result<NodeHandle> {
        self.live(node, || Error::NodeIsNull)?;
        let next = node.next_focus();
        if next.id().is_none() {
            return Err(Error::NoSuchRelation("nextFocus"));
        }
        Ok(next)
    }

    /// The only node `node` controls
    pub fn get_single_control(&self, node: &NodeHandle) -> Result<NodeHandle> {
        let mut controls = self.get_controls(node)?;
        if controls.len() != 1 {
            return Err(Error::assertion(
                "single control",
                format!("{} controls {} nodes, expected exactly one", node, controls.len()),
            ));
        }
        Ok(controls.remove(0))
    }

    pub fn get_active_descendant(&self, node: &NodeHandle) -> NodeHandle {
        node.active_descendant()
    }

    // ---- state ----

    pub fn get_role(&self, node: &NodeHandle) -> Option<String> {
        node.role()
    }

    pub fn get_accessible_name(&self, node: &NodeHandle) -> Option<String> {
        node.name()
    }

    pub fn is_focusable(&self, node: &NodeHandle) -> bool {
        node.state().is_some_and(|s| s.focusable)
    }

    pub fn is_focused(&self, node: &NodeHandle) -> bool {
        node.is_focused()
    }

    pub fn is_expanded(&self, node: &NodeHandle) -> bool {
        node.state().is_some_and(|s| s.expanded)
    }

    pub fn is_visible(&self, node: &NodeHandle) -> bool {
        node.state().is_some_and(|s| !s.invisible)
    }

    pub fn is_modal(&self, node: &NodeHandle) -> bool {
        node.state().is_some_and(|s| s.modal)
    }

    /// Attribute value, or [`ABSENT`] when the attribute is not set
    pub fn get_attribute_value(&self, node: &NodeHandle, key: &str) -> String {
        node.attribute(key).unwrap_or_else(|| ABSENT.to_string())
    }

    pub fn get_checked(&self, node: &NodeHandle) -> String {
        self.get_attribute_value(node, "aria-checked")
    }

    /// The focused node of the current page
    pub fn get_focus(&self) -> NodeHandle {
        self.handle(self.store().current().focus())
    }

    /// Index of the focused item among the menu's children. Every child must
    /// be a labelled, focusable `menuItem`.
    pub fn get_selected_menu_index(&self, menu: &NodeHandle) -> Result<Option<usize>> {
        let items = self.get_children(menu, roles::MENU_ITEM)?;
        for (i, item) in items.iter().enumerate() {
            if !item.name().is_some_and(|n| !n.trim().is_empty()) {
                return Err(Error::assertion(
                    "menu items",
                    format!("menu item {} has no accessible name", i + 1),
                ));
            }
            if !self.is_focusable(item) {
                return Err(Error::assertion(
                    "menu items",
                    format!("menu item {} is not focusable", i + 1),
                ));
            }
        }
        Ok(items.iter().position(NodeHandle::is_focused))
    }

    /// Fails naming the first accessible name that occurs twice
    pub fn expect_unique_labels(&self, nodes: &[NodeHandle]) -> Result<()> {
        let mut seen = HashSet::new();
        for node in nodes {
            let name = node.name().unwrap_or_default();
            if !seen.insert(name.clone()) {
                return Err(Error::assertion(
                    "unique labels",
                    format!("label \"{}\" is used more than once", name),
                ));
            }
        }
        Ok(())
    }

    // ---- interaction ----

    pub async fn focus(&self, node: &NodeHandle) -> Result<()> {
        let (_, id) = self.live(node, || Error::NodeIsNull)?;
        self.driver.focus(id).await
    }

    /// Trigger the node's primary action and settle
    pub async fn do_default(&self, node: &NodeHandle) -> Result<()> {
        self.default_action(node, self.timing.action).await
    }

    /// Like [`ScreenReader::do_default`], for actions that navigate or animate
    pub async fn do_default_slow(&self, node: &NodeHandle) -> Result<()> {
        self.default_action(node, self.timing.slow_action).await
    }

    async fn default_action(&self, node: &NodeHandle, settle: Duration) -> Result<()> {
        let (_, id) = self.live(node, || Error::NodeIsNull)?;
        self.driver.do_default(id).await?;
        self.settle(settle).await;
        Ok(())
    }

    /// Focus the node, then type `text` into it
    pub async fn enter_text(&self, node: &NodeHandle, text: &str) -> Result<()> {
        let (tree, id) = self.live(node, || Error::NodeIsNull)?;
        self.driver.focus(id).await?;
        if tree.get(id).is_some_and(|n| n.role == roles::TEXT_FIELD) {
            self.driver.set_value(id, text).await?;
        } else {
            for c in text.chars() {
                self.driver.dispatch_key(KeyInput::Char(c)).await?;
            }
        }
        self.settle(self.timing.text).await;
        Ok(())
    }

    /// Type one printable character at the focused node
    pub async fn send_key(&self, c: char) -> Result<()> {
        self.driver.dispatch_key(KeyInput::Char(c)).await?;
        self.settle(self.timing.key).await;
        Ok(())
    }

    pub async fn send_special_key(&self, key: SpecialKey) -> Result<()> {
        self.driver.dispatch_key(KeyInput::Special(key)).await?;
        let settle = match key {
            SpecialKey::Escape => self.timing.escape_key,
            _ => self.timing.key,
        };
        self.settle(settle).await;
        Ok(())
    }

    /// Give page script time to react to the last interaction
    pub async fn wait_for_interaction(&self, slow: bool) {
        let interval = if slow {
            self.timing.slow_interaction
        } else {
            self.timing.interaction
        };
        self.settle(interval).await;
    }

    pub async fn pause(&self, duration: Duration) {
        self.settle(duration).await;
    }

    // ---- waits ----

    /// Subscribe for focus landing inside `scope`
    pub fn wait_for_focus_change(&self, scope: &NodeHandle) -> Result<Wait> {
        let (_, id) = self.live(scope, || Error::NodeIsNull)?;
        Ok(Wait::new(self.store(), Condition::FocusWithin(id)))
    }

    pub fn wait_for_node_event(&self, node: &NodeHandle, event: EventType) -> Result<Wait> {
        let (_, id) = self.live(node, || Error::NodeIsNull)?;
        Ok(Wait::new(self.store(), Condition::NodeEvent { node: id, event }))
    }

    pub fn wait_for_tree_change(&self, pred: SearchPredicate) -> Wait {
        Wait::new(self.store(), Condition::TreeChange(pred))
    }

    pub fn wait_for_shown(&self, pred: SearchPredicate) -> Wait {
        Wait::new(self.store(), Condition::Shown(pred))
    }

    pub fn wait_for_hidden(&self, pred: SearchPredicate) -> Wait {
        Wait::new(self.store(), Condition::Hidden(pred))
    }

    /// Await a pending subscription
    pub async fn resolve(&self, wait: Wait) -> Result<TreeEvent> {
        wait.resolve(&self.driver, &self.timing).await
    }

    /// Poll until the node reports expanded
    pub async fn wait_for_expanded(&self, node: &NodeHandle) -> Result<()> {
        self.wait_for_expansion(node, true).await
    }

    pub async fn wait_for_collapsed(&self, node: &NodeHandle) -> Result<()> {
        self.wait_for_expansion(node, false).await
    }

    /// Polls the `aria-expanded` attribute; the accessibility state flag
    /// lags behind it on some pages
    async fn wait_for_expansion(&self, node: &NodeHandle, expanded: bool) -> Result<()> {
        let (_, id) = self.live(node, || Error::NodeIsNull)?;
        wait::poll_until(&self.driver, &self.timing, |tree| {
            tree.get(id).is_some() && (tree.attr(id, "aria-expanded") == Some("true")) == expanded
        })
        .await
    }

    // ---- diagnostics ----

    /// One `[DEBUG]` line describing the node
    pub fn debug_print_node(&self, node: &NodeHandle) -> Result<()> {
        self.console.debug(&describe(node))
    }

    /// The whole page, one indented `[DEBUG]` line per node
    pub fn debug_print_tree(&self) -> Result<()> {
        let tree = self.store().current();
        let Some(root) = tree.root() else {
            return self.console.debug("<no page>");
        };
        for id in tree.subtree(root) {
            let mut depth = 0;
            let mut cur = tree.parent(id);
            while let Some(p) = cur {
                depth += 1;
                cur = tree.parent(p);
            }
            let line = describe(&self.handle(Some(id)));
            self.console.debug(&format!("{}{}", "  ".repeat(depth), line))?;
        }
        Ok(())
    }
}

fn check_role(tree: &TreeSnapshot, child: NodeId, role: &str) -> Result<()> {
    let found = tree.get(child).map(|n| n.role.as_str()).unwrap_or_default();
    if found != role {
        return Err(Error::RoleMismatch {
            expected: role.to_string(),
            found: found.to_string(),
        });
    }
    Ok(())
}

fn describe(node: &NodeHandle) -> String {
    node.with(|tree, n| {
        let mut flags = Vec::new();
        if tree.focus() == Some(n.id) {
            flags.push("focused");
        }
        if n.state.focusable {
            flags.push("focusable");
        }
        if n.state.expanded {
            flags.push("expanded");
        }
        if n.state.invisible {
            flags.push("invisible");
        }
        if n.state.modal {
            flags.push("modal");
        }
        let attrs: Vec<String> = n
            .attributes
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", k, v))
            .collect();
        format!(
            "{} role={} name={:?} state=[{}] attributes=[{}]",
            n.id,
            n.role,
            n.name.as_deref().unwrap_or(""),
            flags.join(","),
            attrs.join(" ")
        )
    })
    .unwrap_or_else(|| "<empty>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::SimDriver;
    use crate::tree::NodeData;

    fn reader() -> ScreenReader<SimDriver> {
        ScreenReader::new(SimDriver::new(), Timing::immediate()).with_console(Console::memory())
    }

    fn add(r: &ScreenReader<SimDriver>, parent: NodeId, data: NodeData) -> NodeHandle {
        let id = r.store().mutate(|t| t.append(parent, data));
        NodeHandle::new(r.store().clone(), id)
    }

    #[tokio::test]
    async fn empty_scope_is_a_contract_violation() {
        let r = reader();
        let pred = SearchPredicate::role(roles::BUTTON);
        assert!(matches!(r.find(&NodeHandle::empty(), &pred), Err(Error::InvalidScope)));
        assert!(matches!(r.next(&NodeHandle::empty(), &pred), Err(Error::InvalidScope)));
        assert!(matches!(r.focus(&NodeHandle::empty()).await, Err(Error::NodeIsNull)));
        assert!(matches!(
            r.do_default(&NodeHandle::empty()).await,
            Err(Error::NodeIsNull)
        ));
    }

    #[tokio::test]
    async fn not_found_is_empty_not_error() {
        let r = reader();
        let page = r.get_page().await.unwrap();
        let pred = SearchPredicate::new(roles::BUTTON, "missing");
        assert!(r.find(&page, &pred).unwrap().is_empty());
        assert!(r.find_all(&page, &pred).unwrap().is_empty());
        assert!(!r.exists_in_page(&pred).await.unwrap());
    }

    #[tokio::test]
    async fn get_children_fails_on_first_mismatch() {
        let r = reader();
        let page = r.get_page().await.unwrap();
        let root = page.id().unwrap();
        let list = add(&r, root, NodeData::new(roles::LIST));
        let lid = list.id().unwrap();
        add(&r, lid, NodeData::new(roles::LIST_ITEM));
        add(&r, lid, NodeData::new(roles::LINK));
        add(&r, lid, NodeData::new(roles::LIST_ITEM));

        match r.get_children(&list, roles::LIST_ITEM) {
            Err(Error::RoleMismatch { expected, found }) => {
                assert_eq!(expected, roles::LIST_ITEM);
                assert_eq!(found, roles::LINK);
            }
            other => panic!("expected a role mismatch, got {:?}", other),
        }
        assert!(r.get_child(&list, roles::LIST_ITEM).is_ok());

        let empty = add(&r, root, NodeData::new(roles::LIST));
        assert!(r.get_children(&empty, roles::LIST_ITEM).unwrap().is_empty());
        assert!(matches!(r.get_child(&empty, roles::LIST_ITEM), Err(Error::NoChildren)));
    }

    #[tokio::test]
    async fn attribute_sentinel_and_relations() {
        let r = reader();
        let root = r.get_page().await.unwrap().id().unwrap();
        let button = add(&r, root, NodeData::new(roles::BUTTON).attr("aria-pressed", "true"));
        assert_eq!(r.get_attribute_value(&button, "aria-pressed"), "true");
        assert_eq!(r.get_attribute_value(&button, "aria-expanded"), ABSENT);
        assert!(matches!(
            r.get_controls(&button),
            Err(Error::NoSuchRelation("controls"))
        ));
        assert!(matches!(
            r.get_next_focus(&button),
            Err(Error::NoSuchRelation("nextFocus"))
        ));

        let a = add(&r, root, NodeData::new(roles::REGION));
        let b = add(&r, root, NodeData::new(roles::REGION));
        let (bid, aid, aid2) = (button.id().unwrap(), a.id().unwrap(), b.id().unwrap());
        r.store().mutate(|t| t.get_mut(bid).unwrap().controls = Some(vec![aid]));
        assert_eq!(r.get_single_control(&button).unwrap(), a);
        r.store().mutate(|t| t.get_mut(bid).unwrap().controls = Some(vec![aid, aid2]));
        assert!(r.get_single_control(&button).unwrap_err().is_assertion());
    }

    #[tokio::test]
    async fn dangling_controls_are_no_relation() {
        let r = reader();
        let mut root = NodeData::new(roles::ROOT_WEB_AREA);
        root.id = NodeId(1);
        root.children = vec![NodeId(2)];
        let mut button = NodeData::new(roles::BUTTON).named("Open");
        button.id = NodeId(2);
        button.parent = Some(NodeId(1));
        button.controls = Some(vec![NodeId(77)]);
        r.store()
            .replace(TreeSnapshot::from_nodes("about:blank", Some(NodeId(1)), None, vec![root, button]));
        let button = NodeHandle::new(r.store().clone(), NodeId(2));
        assert!(matches!(
            r.get_controls(&button),
            Err(Error::NoSuchRelation("controls"))
        ));
    }

    #[tokio::test]
    async fn unique_labels_and_debug_output() {
        let r = reader();
        let root = r.get_page().await.unwrap().id().unwrap();
        let one = add(&r, root, NodeData::new(roles::LINK).named("Home"));
        let two = add(&r, root, NodeData::new(roles::LINK).named("Home"));
        assert!(r.expect_unique_labels(&[one.clone()]).is_ok());
        assert!(r.expect_unique_labels(&[one.clone(), two]).is_err());

        r.debug_print_node(&one).unwrap();
        r.debug_print_tree().unwrap();
        let out = r.console().contents();
        assert!(out.starts_with("[DEBUG]"));
        assert!(out.contains("role=link name=\"Home\""));
        assert!(out.contains("[DEBUG]  "));
    }

    #[tokio::test]
    async fn selected_menu_index_checks_every_item() {
        let r = reader();
        let root = r.get_page().await.unwrap().id().unwrap();
        let menu = add(&r, root, NodeData::new(roles::MENU));
        let mid = menu.id().unwrap();
        add(&r, mid, NodeData::new(roles::MENU_ITEM).named("Cut").focusable());
        let paste = add(&r, mid, NodeData::new(roles::MENU_ITEM).named("Paste").focusable());
        r.store().mutate(|t| t.set_focus(paste.id()));
        assert_eq!(r.get_selected_menu_index(&menu).unwrap(), Some(1));

        let unnamed = add(&r, root, NodeData::new(roles::MENU));
        let uid = unnamed.id().unwrap();
        add(&r, uid, NodeData::new(roles::MENU_ITEM).focusable());
        add(&r, uid, NodeData::new(roles::MENU_ITEM).named("Ok").focusable());
        assert!(r.get_selected_menu_index(&unnamed).unwrap_err().is_assertion());

        let inert = add(&r, root, NodeData::new(roles::MENU));
        add(&r, inert.id().unwrap(), NodeData::new(roles::MENU_ITEM).named("Ok"));
        assert!(r.get_selected_menu_index(&inert).unwrap_err().is_assertion());

        let stray = add(&r, root, NodeData::new(roles::MENU));
        let sid = stray.id().unwrap();
        add(&r, sid, NodeData::new(roles::MENU_ITEM).named("Ok").focusable());
        add(&r, sid, NodeData::new(roles::LINK).named("stray"));
        assert!(matches!(
            r.get_selected_menu_index(&stray),
            Err(Error::RoleMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn expansion_waits_follow_the_attribute() {
        let r = reader();
        let root = r.get_page().await.unwrap().id().unwrap();
        let button = add(&r, root, NodeData::new(roles::BUTTON).attr("aria-expanded", "false"));
        let id = button.id().unwrap();

        let store = r.store().clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            store.mutate(|t| t.set_attr(id, "aria-expanded", "true"));
        });
        r.wait_for_expanded(&button).await.unwrap();
        assert!(!r.is_expanded(&button));

        r.store().mutate(|t| {
            t.get_mut(id).unwrap().state.expanded = true;
            t.set_attr(id, "aria-expanded", "false");
        });
        r.wait_for_collapsed(&button).await.unwrap();
    }

    #[tokio::test]
    async fn enter_text_sets_text_field_value() {
        let r = reader();
        let root = r.get_page().await.unwrap().id().unwrap();
        let field = add(&r, root, NodeData::new(roles::TEXT_FIELD).focusable());
        r.enter_text(&field, "hello").await.unwrap();
        assert_eq!(field.value().as_deref(), Some("hello"));
        assert!(r.is_focused(&field));
        assert_eq!(r.get_focus(), field);
    }
}
