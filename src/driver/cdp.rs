//! Chrome DevTools Protocol driver
//!
//! `headless_chrome` is synchronous, so a dedicated worker thread owns the
//! browser and its tab and executes commands sent from async code, replying
//! over oneshot channels.
//!
//! The tree is Chrome's own accessibility tree (`Accessibility.getFullAXTree`),
//! with element attributes taken from one `DOM.getDocument` pass. Ignored
//! nodes are spliced out, except hidden ones, which stay as invisible nodes so
//! collapsed widgets can still be found. On the wire nodes are addressed by
//! backend DOM node id; in the store every backend node keeps one [`NodeId`]
//! for the life of its document.

use super::{Driver, KeyInput};
use crate::tree::{roles, NodeData, NodeId, TreeSnapshot, TreeStore};
use crate::{Error, Result};
use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::types::Method;
use headless_chrome::protocol::cdp::{Accessibility, Runtime, DOM};
use headless_chrome::{Browser, LaunchOptions};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ffi::OsStr;
use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use tokio::sync::oneshot;

/// Flags every launch gets ahead of [`CdpOptions::args`]
pub const BROWSER_FLAGS: [&str; 3] = [
    "--force-renderer-accessibility",
    "--no-first-run",
    "--no-default-browser-check",
];

/// Element attributes mirrored besides `aria-*`
const KEPT_ATTRIBUTES: [&str; 6] = ["id", "href", "tabindex", "type", "role", "title"];

/// `ignoredReasons` that mean "not rendered" rather than "not interesting"
const HIDDEN_REASONS: [&str; 6] = [
    "notRendered",
    "notVisible",
    "ariaHiddenElement",
    "ariaHiddenSubtree",
    "inertElement",
    "inertSubtree",
];

// ---- wire types ----

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AxValue {
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    related_nodes: Option<Vec<AxRelatedNode>>,
}

#[derive(Debug, Deserialize)]
struct AxRelatedNode {
    #[serde(rename = "backendDOMNodeId", alias = "backendDomNodeId")]
    backend_id: u64,
}

#[derive(Debug, Deserialize)]
struct AxProperty {
    name: String,
    #[serde(default)]
    value: AxValue,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AxNode {
    node_id: String,
    #[serde(default)]
    ignored: bool,
    #[serde(default)]
    ignored_reasons: Option<Vec<AxProperty>>,
    #[serde(default)]
    role: Option<AxValue>,
    #[serde(default)]
    name: Option<AxValue>,
    #[serde(default)]
    value: Option<AxValue>,
    #[serde(default)]
    properties: Option<Vec<AxProperty>>,
    #[serde(default)]
    parent_id: Option<String>,
    #[serde(default)]
    child_ids: Option<Vec<String>>,
    #[serde(default, rename = "backendDOMNodeId", alias = "backendDomNodeId")]
    backend_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct AxTree {
    nodes: Vec<AxNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DomNode {
    backend_node_id: u64,
    #[serde(default)]
    node_type: u32,
    #[serde(default)]
    node_name: String,
    #[serde(default)]
    attributes: Option<Vec<String>>,
    #[serde(default)]
    children: Option<Vec<DomNode>>,
    #[serde(default)]
    shadow_roots: Option<Vec<DomNode>>,
    #[serde(default)]
    content_document: Option<Box<DomNode>>,
}

#[derive(Debug, Deserialize)]
struct DomDocument {
    root: DomNode,
}

/// Element facts the accessibility tree does not carry
#[derive(Debug, Clone, Default, PartialEq)]
struct DomInfo {
    tag: String,
    attributes: BTreeMap<String, String>,
}

/// Everything one snapshot is built from
#[derive(Debug)]
struct PageDump {
    url: String,
    nodes: Vec<AxNode>,
    dom: HashMap<u64, DomInfo>,
}

fn collect_dom(node: &DomNode, out: &mut HashMap<u64, DomInfo>) {
    const ELEMENT_NODE: u32 = 1;
    if node.node_type == ELEMENT_NODE {
        let mut attributes = BTreeMap::new();
        for pair in node.attributes.as_deref().unwrap_or_default().chunks(2) {
            if let [key, value] = pair {
                if key.starts_with("aria-") || KEPT_ATTRIBUTES.contains(&key.as_str()) {
                    attributes.insert(key.clone(), value.clone());
                }
            }
        }
        out.insert(
            node.backend_node_id,
            DomInfo {
                tag: node.node_name.to_ascii_lowercase(),
                attributes,
            },
        );
    }
    let nested = node
        .children
        .iter()
        .flatten()
        .chain(node.shadow_roots.iter().flatten())
        .chain(node.content_document.as_deref());
    for child in nested {
        collect_dom(child, out);
    }
}

// ---- mapping ----

impl AxNode {
    fn role(&self) -> &str {
        self.role
            .as_ref()
            .and_then(|r| r.value.as_ref())
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    fn property(&self, name: &str) -> Option<&AxValue> {
        self.properties
            .iter()
            .flatten()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }

    fn flag(&self, name: &str) -> bool {
        self.property(name)
            .and_then(|v| v.value.as_ref())
            .is_some_and(|v| match v {
                Value::Bool(b) => *b,
                Value::String(s) => s == "true",
                _ => false,
            })
    }

    fn token(&self, name: &str) -> Option<String> {
        self.property(name)
            .and_then(|v| v.value.as_ref())
            .and_then(text_of)
    }

    fn related(&self, name: &str) -> Option<Vec<u64>> {
        self.property(name).map(|v| {
            v.related_nodes
                .iter()
                .flatten()
                .map(|r| r.backend_id)
                .collect()
        })
    }

    fn is_hidden(&self) -> bool {
        self.flag("hidden")
            || self
                .ignored_reasons
                .iter()
                .flatten()
                .any(|r| HIDDEN_REASONS.contains(&r.name.as_str()))
    }

    fn key(&self) -> String {
        match self.backend_id {
            Some(b) => backend_key(b),
            None => format!("ax:{}", self.node_id),
        }
    }
}

fn backend_key(backend: u64) -> String {
    format!("dom:{}", backend)
}

fn text_of(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Automation role of an accessibility node. Ignored nodes report no useful
/// role, so theirs comes from the element.
fn role_of(ax: &AxNode, dom: Option<&DomInfo>) -> String {
    let attr = |key: &str| dom.and_then(|d| d.attributes.get(key)).map(String::as_str);
    let base = match ax.role() {
        "RootWebArea" | "WebArea" => roles::ROOT_WEB_AREA.to_string(),
        "StaticText" => roles::STATIC_TEXT.to_string(),
        "PopUpButton" => roles::POP_UP_BUTTON.to_string(),
        "" | "none" | "generic" | "Ignored" | "GenericContainer" => {
            match attr("role").and_then(|r| r.split_whitespace().next()) {
                Some(explicit) => roles::from_aria(explicit).to_string(),
                None => dom
                    .and_then(|d| roles::implicit_for_tag(&d.tag, attr("type"), attr("href").is_some()))
                    .unwrap_or(roles::GENERIC)
                    .to_string(),
            }
        }
        other => roles::from_aria(other).to_string(),
    };
    let popup = ax
        .token("hasPopup")
        .or_else(|| attr("aria-haspopup").map(str::to_string))
        .is_some_and(|v| v != "false");
    let pressed = ax.property("pressed").is_some() || attr("aria-pressed").is_some();
    match base.as_str() {
        roles::BUTTON if pressed => roles::TOGGLE_BUTTON.to_string(),
        roles::BUTTON if popup => roles::POP_UP_BUTTON.to_string(),
        _ => base,
    }
}

/// Store ids handed out for one document's nodes
#[derive(Debug, Default)]
struct IdMap {
    doc: Option<String>,
    next: u64,
    by_key: HashMap<String, NodeId>,
    backend: HashMap<NodeId, u64>,
}

impl IdMap {
    /// Switch to `doc`, numbering from `floor` when it is a new document.
    /// Returns whether it was.
    fn enter(&mut self, doc: &str, floor: u64) -> bool {
        if self.doc.as_deref() == Some(doc) {
            return false;
        }
        self.doc = Some(doc.to_string());
        self.next = self.next.max(floor);
        self.by_key.clear();
        self.backend.clear();
        true
    }

    fn assign(&mut self, key: String, backend: Option<u64>) -> NodeId {
        let next = &mut self.next;
        let id = *self.by_key.entry(key).or_insert_with(|| {
            let id = NodeId(*next);
            *next += 1;
            id
        });
        if let Some(b) = backend {
            self.backend.insert(id, b);
        }
        id
    }

    fn by_backend(&self, backend: u64) -> Option<NodeId> {
        self.by_key.get(&backend_key(backend)).copied()
    }

    fn backend_of(&self, id: NodeId) -> Option<u64> {
        self.backend.get(&id).copied()
    }
}

/// Relations are resolved once every kept node has its id
struct PendingRelations {
    index: usize,
    controls: Option<Vec<u64>>,
    flow_to: Option<Vec<u64>>,
    active_descendant: Option<u64>,
}

struct Builder<'a> {
    index: HashMap<&'a str, &'a AxNode>,
    dom: &'a HashMap<u64, DomInfo>,
    ids: &'a mut IdMap,
    seen: HashSet<&'a str>,
    nodes: Vec<NodeData>,
    pending: Vec<PendingRelations>,
    focus: Option<NodeId>,
}

impl<'a> Builder<'a> {
    fn visit(&mut self, ax: &'a AxNode, parent: Option<usize>, hidden: bool) {
        if !self.seen.insert(ax.node_id.as_str()) || ax.role() == "InlineTextBox" {
            return;
        }
        let hidden_here = hidden || ax.is_hidden();
        let keep = parent.is_none() || !ax.ignored || ax.is_hidden();
        let here = if keep {
            Some(self.push(ax, parent, hidden_here))
        } else {
            parent
        };
        for child in ax.child_ids.iter().flatten() {
            if let Some(c) = self.index.get(child.as_str()).copied() {
                self.visit(c, here, hidden_here);
            }
        }
    }

    fn push(&mut self, ax: &AxNode, parent: Option<usize>, hidden: bool) -> usize {
        let dom = ax.backend_id.and_then(|b| self.dom.get(&b));
        let id = self.ids.assign(ax.key(), ax.backend_id);
        let attributes = dom.map(|d| d.attributes.clone()).unwrap_or_default();

        let mut node = NodeData::new(role_of(ax, dom));
        node.id = id;
        node.name = ax
            .name
            .as_ref()
            .and_then(|n| n.value.as_ref())
            .and_then(text_of)
            .filter(|n| !n.is_empty())
            .or_else(|| {
                ["aria-label", "title"]
                    .iter()
                    .find_map(|k| attributes.get(*k).cloned())
                    .filter(|_| ax.ignored)
            });
        node.value = ax.value.as_ref().and_then(|v| v.value.as_ref()).and_then(text_of);
        node.state.focusable = ax.flag("focusable");
        node.state.expanded = ax.flag("expanded");
        node.state.modal = ax.flag("modal");
        node.state.invisible = hidden;
        node.attributes = attributes;
        if ax.flag("focused") {
            self.focus = Some(id);
        }

        let index = self.nodes.len();
        if let Some(p) = parent {
            node.parent = Some(self.nodes[p].id);
            self.nodes[p].children.push(id);
        }
        self.pending.push(PendingRelations {
            index,
            controls: ax.related("controls"),
            flow_to: ax.related("flowto"),
            active_descendant: ax.related("activedescendant").and_then(|r| r.first().copied()),
        });
        self.nodes.push(node);
        index
    }

    fn finish(mut self, url: String) -> TreeSnapshot {
        let ids = &*self.ids;
        let resolve = |list: Option<Vec<u64>>| {
            list.map(|l| l.into_iter().filter_map(|b| ids.by_backend(b)).collect())
        };
        for p in std::mem::take(&mut self.pending) {
            let node = &mut self.nodes[p.index];
            node.controls = resolve(p.controls);
            node.flow_to = resolve(p.flow_to);
            node.active_descendant = p.active_descendant.and_then(|b| ids.by_backend(b));
        }
        let root = self.nodes.first().map(|n| n.id);
        TreeSnapshot::from_nodes(url, root, self.focus, self.nodes)
    }
}

/// Map one page dump into a snapshot. The second value reports whether the
/// dump is of a different document than the previous one.
fn to_snapshot(page: PageDump, ids: &mut IdMap, floor: u64) -> (TreeSnapshot, bool) {
    let Some(root) = page.nodes.iter().find(|n| n.parent_id.is_none()) else {
        return (TreeSnapshot::from_nodes(page.url, None, None, Vec::new()), false);
    };
    let changed = ids.enter(&root.key(), floor);
    let mut builder = Builder {
        index: page.nodes.iter().map(|n| (n.node_id.as_str(), n)).collect(),
        dom: &page.dom,
        ids,
        seen: HashSet::new(),
        nodes: Vec::new(),
        pending: Vec::new(),
        focus: None,
    };
    builder.visit(root, None, false);
    let snapshot = builder.finish(page.url.clone());
    (snapshot, changed)
}

// ---- worker ----

enum Action {
    Focus(u64),
    Click(u64),
    SetValue(u64, String),
    Key(KeyInput),
}

enum Command {
    Goto(String, oneshot::Sender<Result<()>>),
    Snapshot(oneshot::Sender<Result<PageDump>>),
    /// Replies whether the target node still existed
    Act(Action, oneshot::Sender<Result<bool>>),
    Close(oneshot::Sender<Result<()>>),
}

fn cdp_error(context: &str, e: impl std::fmt::Display) -> Error {
    Error::CdpError(format!("{}: {}", context, e))
}

/// Issue `M` with JSON parameters and return its result as JSON
fn call_json<M>(tab: &Tab, params: Value) -> Result<Value>
where
    M: Method + Serialize + DeserializeOwned + Debug,
    M::ReturnObject: Serialize,
{
    let method: M = serde_json::from_value(params)?;
    let result = tab.call_method(method).map_err(|e| cdp_error(M::NAME, e))?;
    Ok(serde_json::to_value(result)?)
}

fn read_once(tab: &Tab) -> Result<PageDump> {
    let tree: AxTree = serde_json::from_value(call_json::<Accessibility::GetFullAXTree>(tab, json!({}))?)?;
    let mut dom = HashMap::new();
    match call_json::<DOM::GetDocument>(tab, json!({ "depth": -1, "pierce": true })) {
        Ok(doc) => collect_dom(&serde_json::from_value::<DomDocument>(doc)?.root, &mut dom),
        Err(e) => log::warn!("cdp: no element attributes this time: {}", e),
    }
    Ok(PageDump {
        url: tab.get_url(),
        nodes: tree.nodes,
        dom,
    })
}

fn read_page(tab: &Tab) -> Result<PageDump> {
    match read_once(tab) {
        Ok(page) => Ok(page),
        Err(first) => {
            // A navigation may have replaced the document mid-read.
            log::debug!("snapshot retry after: {}", first);
            tab.wait_until_navigated()
                .map_err(|e| cdp_error("wait for navigation", e))?;
            read_once(tab)
        }
    }
}

/// Run a function with the element as `this`. `Ok(false)` when the node is
/// gone from the document.
fn call_on(tab: &Tab, backend: u64, function: &str, args: Vec<Value>) -> Result<bool> {
    let resolved = match call_json::<DOM::ResolveNode>(tab, json!({ "backendNodeId": backend })) {
        Ok(v) => v,
        Err(e) => {
            log::debug!("cdp: node {} did not resolve: {}", backend, e);
            return Ok(false);
        }
    };
    let Some(object_id) = resolved.pointer("/object/objectId").and_then(Value::as_str) else {
        return Ok(false);
    };
    let arguments: Vec<Value> = args.into_iter().map(|v| json!({ "value": v })).collect();
    call_json::<Runtime::CallFunctionOn>(
        tab,
        json!({
            "functionDeclaration": function,
            "objectId": object_id,
            "arguments": arguments,
            "returnByValue": true,
        }),
    )?;
    Ok(true)
}

const CLICK_JS: &str = "function() { \
    const el = this.nodeType === Node.ELEMENT_NODE ? this : this.parentElement; \
    if (el) el.click(); }";

const FOCUS_JS: &str = "function() { \
    const el = this.nodeType === Node.ELEMENT_NODE ? this : this.parentElement; \
    if (el) el.focus(); }";

const SET_VALUE_JS: &str = "function(v) { \
    this.value = v; \
    this.dispatchEvent(new Event('input', { bubbles: true })); \
    this.dispatchEvent(new Event('change', { bubbles: true })); }";

fn perform(tab: &Tab, action: Action) -> Result<bool> {
    match action {
        Action::Key(KeyInput::Special(k)) => {
            tab.press_key(k.key_name())
                .map_err(|e| cdp_error("key press", e))?;
            Ok(true)
        }
        Action::Key(KeyInput::Char(c)) => {
            let s = c.to_string();
            if tab.press_key(&s).is_err() {
                tab.send_character(&s)
                    .map_err(|e| cdp_error("character input", e))?;
            }
            Ok(true)
        }
        Action::Focus(backend) => {
            match call_json::<DOM::Focus>(tab, json!({ "backendNodeId": backend })) {
                Ok(_) => Ok(true),
                // Not focusable by the browser's rules; script focus is a no-op then.
                Err(_) => call_on(tab, backend, FOCUS_JS, Vec::new()),
            }
        }
        Action::Click(backend) => call_on(tab, backend, CLICK_JS, Vec::new()),
        Action::SetValue(backend, value) => {
            call_on(tab, backend, SET_VALUE_JS, vec![Value::String(value)])
        }
    }
}

fn worker(tab: Arc<Tab>, browser: Browser, commands: mpsc::Receiver<Command>) {
    while let Ok(cmd) = commands.recv() {
        match cmd {
            Command::Goto(url, resp) => {
                let res = tab
                    .navigate_to(&url)
                    .and_then(|t| t.wait_until_navigated())
                    .map(|_| ())
                    .map_err(|e| Error::Navigation(format!("{}: {}", url, e)));
                let _ = resp.send(res);
            }
            Command::Snapshot(resp) => {
                let _ = resp.send(read_page(&tab));
            }
            Command::Act(action, resp) => {
                let _ = resp.send(perform(&tab, action));
            }
            Command::Close(resp) => {
                drop(browser);
                let _ = resp.send(Ok(()));
                return;
            }
        }
    }
}

// ---- driver ----

/// Launch settings for [`CdpDriver::launch`]
#[derive(Debug, Clone)]
pub struct CdpOptions {
    /// Chrome binary; autodetected when `None`
    pub binary: Option<PathBuf>,
    /// Profile directory; a throwaway one when `None`
    pub user_data_dir: Option<PathBuf>,
    pub headless: bool,
    pub window_size: (u32, u32),
    /// Flags appended after [`BROWSER_FLAGS`]
    pub args: Vec<String>,
}

impl Default for CdpOptions {
    fn default() -> Self {
        Self {
            binary: None,
            user_data_dir: None,
            headless: true,
            window_size: (1280, 800),
            args: Vec::new(),
        }
    }
}

/// Driver over a Chrome tab
pub struct CdpDriver {
    cmd_tx: Sender<Command>,
    store: Arc<TreeStore>,
    ids: Mutex<IdMap>,
}

impl CdpDriver {
    /// Launch Chrome on a worker thread and open one tab
    pub async fn launch(options: CdpOptions) -> Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx) = oneshot::channel::<Result<()>>();

        thread::spawn(move || {
            let mut args: Vec<&OsStr> = BROWSER_FLAGS.iter().map(OsStr::new).collect();
            args.extend(options.args.iter().map(OsStr::new));
            let launch_options = match LaunchOptions::default_builder()
                .headless(options.headless)
                .path(options.binary.clone())
                .user_data_dir(options.user_data_dir.clone())
                .window_size(Some(options.window_size))
                .args(args)
                .build()
            {
                Ok(o) => o,
                Err(e) => {
                    let _ = init_tx.send(Err(Error::Launch(e.to_string())));
                    return;
                }
            };
            let browser = match Browser::new(launch_options) {
                Ok(b) => b,
                Err(e) => {
                    let _ = init_tx.send(Err(Error::Launch(e.to_string())));
                    return;
                }
            };
            let tab = match browser.new_tab() {
                Ok(t) => t,
                Err(e) => {
                    let _ = init_tx.send(Err(Error::Launch(format!("new tab: {}", e))));
                    return;
                }
            };
            let _ = init_tx.send(Ok(()));
            worker(tab, browser, cmd_rx);
        });

        init_rx
            .await
            .map_err(|e| Error::Launch(format!("worker init canceled: {}", e)))??;
        Ok(Self {
            cmd_tx,
            store: TreeStore::new(TreeSnapshot::new("about:blank", "")),
            ids: Mutex::new(IdMap::default()),
        })
    }

    async fn call<T>(&self, make: impl FnOnce(oneshot::Sender<Result<T>>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .map_err(|_| Error::CdpError("browser worker has exited".into()))?;
        rx.await
            .map_err(|e| Error::CdpError(format!("browser worker dropped the reply: {}", e)))?
    }

    fn ids(&self) -> MutexGuard<'_, IdMap> {
        match self.ids.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Read the page; the flag reports a new document
    async fn snapshot(&self) -> Result<(TreeSnapshot, bool)> {
        let page = self.call(Command::Snapshot).await?;
        let floor = self.store.id_floor();
        Ok(to_snapshot(page, &mut self.ids(), floor))
    }

    async fn act(&self, action: Action) -> Result<()> {
        if !self.call(|tx| Command::Act(action, tx)).await? {
            return Err(Error::NodeIsNull);
        }
        self.refresh().await
    }

    async fn act_on(&self, node: NodeId, action: impl FnOnce(u64) -> Action) -> Result<()> {
        let backend = self.ids().backend_of(node).ok_or(Error::NodeIsNull)?;
        self.act(action(backend)).await
    }

    /// Close the browser and stop the worker
    pub async fn close(self) -> Result<()> {
        self.call(Command::Close).await
    }
}

impl Driver for CdpDriver {
    fn store(&self) -> &Arc<TreeStore> {
        &self.store
    }

    async fn focus(&self, node: NodeId) -> Result<()> {
        self.act_on(node, Action::Focus).await
    }

    async fn do_default(&self, node: NodeId) -> Result<()> {
        self.act_on(node, Action::Click).await
    }

    async fn set_value(&self, node: NodeId, value: &str) -> Result<()> {
        let value = value.to_string();
        self.act_on(node, |b| Action::SetValue(b, value)).await
    }

    async fn dispatch_key(&self, key: KeyInput) -> Result<()> {
        self.act(Action::Key(key)).await
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        log::debug!("cdp: navigating to {}", url);
        self.store.begin_navigation();
        let page = match self.call(|tx| Command::Goto(url.to_string(), tx)).await {
            Ok(()) => self.snapshot().await,
            Err(e) => Err(e),
        };
        match page {
            Ok((snapshot, _)) => {
                self.store.finish_navigation(snapshot);
                Ok(())
            }
            Err(e) => {
                // Leave the loading state so nobody waits forever on a dead page.
                self.store.finish_navigation((*self.store.current()).clone());
                Err(Error::Navigation(e.to_string()))
            }
        }
    }

    async fn refresh(&self) -> Result<()> {
        let (snapshot, new_document) = self.snapshot().await?;
        if new_document {
            log::debug!("cdp: page changed to {}", snapshot.url());
            self.store.begin_navigation();
            self.store.finish_navigation(snapshot);
        } else {
            self.store.replace(snapshot);
        }
        Ok(())
    }
}

impl Drop for CdpDriver {
    fn drop(&mut self) {
        let (tx, _rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Close(tx));
    }
}
