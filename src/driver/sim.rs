//! In-memory page simulator
//!
//! `SimDriver` plays the part of the browser for tests, benches and dry runs.
//! Pages are registered per URL as builder closures that lay out a
//! [`TreeSnapshot`] and return the [`Behavior`]s reacting to input on it.
//! Keys and default actions are offered to each behavior in registration
//! order; the first one that reacts consumes the input. Unclaimed input falls
//! back to browser defaults: Tab moves focus to the next focusable node, Enter
//! or a default action on a link follows its `href`, and printable keys type
//! into a focused text field.

use super::{Driver, KeyInput, SpecialKey};
use crate::tree::{roles, NodeId, TreeSnapshot, TreeStore};
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What a behavior did with an input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reaction {
    /// Not for me; offer it to the next behavior
    Ignored,
    /// Consumed; tree edits made during the call are published
    Handled,
    /// Consumed, and the page navigates to the URL
    Navigate(String),
}

/// Scripted reaction of one widget to keyboard and pointer input
pub trait Behavior: Send + Sync {
    fn on_key(&self, _tree: &mut TreeSnapshot, _key: KeyInput) -> Reaction {
        Reaction::Ignored
    }

    fn on_default(&self, _tree: &mut TreeSnapshot, _node: NodeId) -> Reaction {
        Reaction::Ignored
    }
}

type Behaviors = Arc<Vec<Box<dyn Behavior>>>;
type PageBuilder = Arc<dyn Fn(&mut TreeSnapshot) -> Vec<Box<dyn Behavior>> + Send + Sync>;

pub const BLANK: &str = "about:blank";

/// Deterministic driver over a simulated page
pub struct SimDriver {
    store: Arc<TreeStore>,
    pages: HashMap<String, PageBuilder>,
    behaviors: Arc<Mutex<Behaviors>>,
    load_delay: Duration,
}

impl Default for SimDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimDriver {
    /// A driver showing an empty `about:blank` page
    pub fn new() -> Self {
        Self {
            store: TreeStore::new(TreeSnapshot::new(BLANK, "")),
            pages: HashMap::new(),
            behaviors: Arc::new(Mutex::new(Arc::new(Vec::new()))),
            load_delay: Duration::ZERO,
        }
    }

    /// Register the page served at `url`
    pub fn with_page<F>(mut self, url: impl Into<String>, build: F) -> Self
    where
        F: Fn(&mut TreeSnapshot) -> Vec<Box<dyn Behavior>> + Send + Sync + 'static,
    {
        self.pages.insert(url.into(), Arc::new(build));
        self
    }

    /// Time a navigation spends in the loading state
    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    pub fn has_page(&self, url: &str) -> bool {
        url == BLANK || self.pages.contains_key(url)
    }

    fn behaviors(&self) -> Behaviors {
        match self.behaviors.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

fn install(slot: &Mutex<Behaviors>, next: Vec<Box<dyn Behavior>>) {
    let mut guard = match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    *guard = Arc::new(next);
}

/// Browser default handling for keys no widget claimed
fn default_key(tree: &mut TreeSnapshot, key: KeyInput) -> Option<String> {
    let focused = tree.focus();
    match key {
        KeyInput::Special(SpecialKey::Tab) => {
            let root = tree.root()?;
            let order: Vec<NodeId> = tree
                .subtree(root)
                .into_iter()
                .filter(|id| {
                    tree.get(*id)
                        .is_some_and(|n| n.state.focusable && !n.state.invisible)
                })
                .collect();
            let next = match focused.and_then(|f| order.iter().position(|id| *id == f)) {
                Some(pos) => order.get((pos + 1) % order.len()).copied(),
                None => order.first().copied(),
            };
            tree.set_focus(next);
            None
        }
        KeyInput::Special(SpecialKey::Enter) => focused.and_then(|f| follow_link(tree, f)),
        KeyInput::Char(c) => {
            let node = tree.get_mut(focused?)?;
            if node.role == roles::TEXT_FIELD {
                node.value.get_or_insert_with(String::new).push(c);
            }
            None
        }
        KeyInput::Special(_) => None,
    }
}

fn follow_link(tree: &TreeSnapshot, node: NodeId) -> Option<String> {
    let data = tree.get(node)?;
    if data.role != roles::LINK {
        return None;
    }
    data.attributes.get("href").cloned()
}

fn offer<F>(behaviors: &[Box<dyn Behavior>], mut ask: F) -> Option<Reaction>
where
    F: FnMut(&dyn Behavior) -> Reaction,
{
    behaviors
        .iter()
        .map(|b| ask(b.as_ref()))
        .find(|r| *r != Reaction::Ignored)
}

impl Driver for SimDriver {
    fn store(&self) -> &Arc<TreeStore> {
        &self.store
    }

    async fn focus(&self, node: NodeId) -> Result<()> {
        self.store.mutate(|tree| {
            if tree.get(node).is_none() {
                return Err(Error::NodeIsNull);
            }
            tree.set_focus(Some(node));
            Ok(())
        })
    }

    async fn do_default(&self, node: NodeId) -> Result<()> {
        let behaviors = self.behaviors();
        let target = self.store.mutate(|tree| {
            if tree.get(node).is_none() {
                return Err(Error::NodeIsNull);
            }
            Ok(match offer(&behaviors, |b| b.on_default(tree, node)) {
                Some(Reaction::Navigate(url)) => Some(url),
                Some(_) => None,
                None => follow_link(tree, node),
            })
        })?;
        if let Some(url) = target {
            self.navigate(&url).await?;
        }
        Ok(())
    }

    async fn set_value(&self, node: NodeId, value: &str) -> Result<()> {
        self.store.mutate(|tree| match tree.get_mut(node) {
            Some(n) => {
                n.value = Some(value.to_string());
                Ok(())
            }
            None => Err(Error::NodeIsNull),
        })
    }

    async fn dispatch_key(&self, key: KeyInput) -> Result<()> {
        let behaviors = self.behaviors();
        let target = self.store.mutate(|tree| {
            match offer(&behaviors, |b| b.on_key(tree, key)) {
                Some(Reaction::Navigate(url)) => Some(url),
                Some(_) => None,
                None => default_key(tree, key),
            }
        });
        if let Some(url) = target {
            self.navigate(&url).await?;
        }
        Ok(())
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        let build: Option<PageBuilder> = match self.pages.get(url) {
            Some(b) => Some(b.clone()),
            None if url == BLANK => None,
            None => return Err(Error::Navigation(format!("no page served at {}", url))),
        };
        log::debug!("sim: navigating to {}", url);
        self.store.begin_navigation();

        let store = self.store.clone();
        let slot = self.behaviors.clone();
        let delay = self.load_delay;
        let url = url.to_string();
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let mut page = TreeSnapshot::starting_at(url, "", store.id_floor());
            let behaviors = match build {
                Some(build) => build(&mut page),
                None => Vec::new(),
            };
            install(&slot, behaviors);
            store.finish_navigation(page);
        });
        Ok(())
    }

    async fn refresh(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeData;

    fn two_buttons(tree: &mut TreeSnapshot) -> Vec<Box<dyn Behavior>> {
        let root = tree.root().unwrap();
        tree.set_title("Buttons");
        tree.append(root, NodeData::new(roles::BUTTON).named("One").focusable());
        tree.append(root, NodeData::new(roles::STATIC_TEXT).named("between"));
        tree.append(root, NodeData::new(roles::BUTTON).named("Two").focusable());
        Vec::new()
    }

    #[tokio::test]
    async fn navigation_swaps_the_page() {
        let driver = SimDriver::new().with_page("sim://buttons", two_buttons);
        driver.navigate("sim://buttons").await.unwrap();
        driver.store().lifecycle().wait_for_page().await.unwrap();
        let tree = driver.store().current();
        assert_eq!(tree.title(), Some("Buttons"));
        assert_eq!(tree.url(), "sim://buttons");
    }

    #[tokio::test]
    async fn unknown_url_is_a_navigation_error() {
        let driver = SimDriver::new();
        assert!(matches!(
            driver.navigate("sim://nowhere").await,
            Err(Error::Navigation(_))
        ));
        assert!(!driver.store().lifecycle().is_loading());
    }

    #[tokio::test]
    async fn tab_cycles_focusable_nodes() {
        let driver = SimDriver::new().with_page("sim://buttons", two_buttons);
        driver.navigate("sim://buttons").await.unwrap();
        driver.store().lifecycle().wait_for_page().await.unwrap();

        let name_of_focus = |d: &SimDriver| {
            let t = d.store().current();
            t.focus().and_then(|f| t.get(f)).and_then(|n| n.name.clone())
        };
        driver.dispatch_key(SpecialKey::Tab.into()).await.unwrap();
        assert_eq!(name_of_focus(&driver).as_deref(), Some("One"));
        driver.dispatch_key(SpecialKey::Tab.into()).await.unwrap();
        assert_eq!(name_of_focus(&driver).as_deref(), Some("Two"));
        driver.dispatch_key(SpecialKey::Tab.into()).await.unwrap();
        assert_eq!(name_of_focus(&driver).as_deref(), Some("One"));
    }

    #[tokio::test]
    async fn typing_into_a_text_field() {
        let driver = SimDriver::new();
        let root = driver.store().current().root().unwrap();
        let field = driver
            .store()
            .mutate(|t| t.append(root, NodeData::new(roles::TEXT_FIELD).focusable()));
        driver.focus(field).await.unwrap();
        for c in "hi".chars() {
            driver.dispatch_key(c.into()).await.unwrap();
        }
        let tree = driver.store().current();
        assert_eq!(tree.get(field).unwrap().value.as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn focusing_a_missing_node_fails() {
        let driver = SimDriver::new();
        assert!(matches!(
            driver.focus(NodeId(999)).await,
            Err(Error::NodeIsNull)
        ));
    }
}
