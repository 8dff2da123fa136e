//! Reference widgets for the simulator
//!
//! Each builder lays out one widget under `parent` following the matching
//! WAI-ARIA authoring practice and, where the widget reacts to input, returns
//! the [`Behavior`] implementing its keyboard and pointer model. Page
//! builders passed to [`SimDriver::with_page`](super::SimDriver::with_page)
//! combine them.

use super::sim::{Behavior, Reaction};
use super::{KeyInput, SpecialKey};
use crate::protocols::{DialogKind, ItemTracking};
use crate::tree::{roles, NodeData, NodeId, TreeSnapshot};

/// Hide or show a whole subtree
pub fn set_hidden(tree: &mut TreeSnapshot, id: NodeId, hidden: bool) {
    for n in tree.subtree(id) {
        if let Some(data) = tree.get_mut(n) {
            data.state.invisible = hidden;
        }
    }
}

/// Set the expanded state and its `aria-expanded` mirror
pub fn set_expanded(tree: &mut TreeSnapshot, id: NodeId, expanded: bool) {
    if let Some(data) = tree.get_mut(id) {
        data.state.expanded = expanded;
        data.attributes
            .insert("aria-expanded".into(), expanded.to_string());
    }
}

fn is_expanded(tree: &TreeSnapshot, id: NodeId) -> bool {
    tree.get(id).is_some_and(|n| n.state.expanded)
}

fn children_with_role(tree: &TreeSnapshot, id: NodeId, role: &str) -> Vec<NodeId> {
    tree.get(id)
        .map(|n| {
            n.children
                .iter()
                .copied()
                .filter(|c| tree.get(*c).is_some_and(|d| d.role == role))
                .collect()
        })
        .unwrap_or_default()
}

fn slug(label: &str) -> String {
    label
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() {
                Some(c.to_ascii_lowercase())
            } else if c.is_whitespace() || c == '-' {
                Some('-')
            } else {
                None
            }
        })
        .collect()
}

fn point_at(tree: &mut TreeSnapshot, owner: NodeId, target: Option<NodeId>) {
    let dom_id = target.and_then(|t| tree.attr(t, "id").map(str::to_string));
    if let Some(data) = tree.get_mut(owner) {
        data.active_descendant = target;
        match dom_id {
            Some(id) => {
                data.attributes.insert("aria-activedescendant".into(), id);
            }
            None => {
                data.attributes.remove("aria-activedescendant");
            }
        }
    }
}

fn wrap(pos: usize, len: usize, forward: bool) -> usize {
    if forward {
        (pos + 1) % len
    } else {
        (pos + len - 1) % len
    }
}

// ---- menu button ----

struct MenuButton {
    button: NodeId,
    menu: NodeId,
    items: Vec<NodeId>,
    tracking: ItemTracking,
}

/// A button opening a menu of actions
pub fn menu_button(
    tree: &mut TreeSnapshot,
    parent: NodeId,
    label: &str,
    items: &[&str],
    tracking: ItemTracking,
) -> Box<dyn Behavior> {
    let prefix = slug(label);
    let button = tree.append(
        parent,
        NodeData::new(roles::POP_UP_BUTTON)
            .named(label)
            .focusable()
            .attr("id", format!("{}-button", prefix))
            .attr("aria-haspopup", "true")
            .attr("aria-expanded", "false"),
    );
    let mut menu_node = NodeData::new(roles::MENU)
        .named(label)
        .invisible()
        .attr("id", format!("{}-menu", prefix));
    if tracking == ItemTracking::ActiveDescendant {
        menu_node = menu_node.focusable();
    }
    let menu = tree.append(parent, menu_node);
    let items = items
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let mut item = NodeData::new(roles::MENU_ITEM)
                .named(*name)
                .invisible()
                .attr("id", format!("{}-item-{}", prefix, i));
            if tracking == ItemTracking::Focus {
                item = item.focusable();
            }
            tree.append(menu, item)
        })
        .collect();
    if let Some(b) = tree.get_mut(button) {
        b.controls = Some(vec![menu]);
        b.attributes
            .insert("aria-controls".into(), format!("{}-menu", prefix));
    }
    Box::new(MenuButton {
        button,
        menu,
        items,
        tracking,
    })
}

impl MenuButton {
    fn current(&self, tree: &TreeSnapshot) -> Option<usize> {
        let marker = match self.tracking {
            ItemTracking::Focus => tree.focus(),
            ItemTracking::ActiveDescendant => tree.get(self.menu)?.active_descendant,
        }?;
        self.items.iter().position(|i| *i == marker)
    }

    fn in_menu(&self, tree: &TreeSnapshot) -> bool {
        match self.tracking {
            ItemTracking::Focus => self.current(tree).is_some(),
            ItemTracking::ActiveDescendant => tree.focus() == Some(self.menu),
        }
    }

    fn select(&self, tree: &mut TreeSnapshot, index: usize) {
        let Some(item) = self.items.get(index).copied() else {
            return;
        };
        match self.tracking {
            ItemTracking::Focus => tree.set_focus(Some(item)),
            ItemTracking::ActiveDescendant => {
                point_at(tree, self.menu, Some(item));
                tree.set_focus(Some(self.menu));
            }
        }
    }

    fn open(&self, tree: &mut TreeSnapshot, last: bool) {
        set_expanded(tree, self.button, true);
        set_hidden(tree, self.menu, false);
        let index = if last { self.items.len().saturating_sub(1) } else { 0 };
        self.select(tree, index);
    }

    fn close(&self, tree: &mut TreeSnapshot) {
        set_expanded(tree, self.button, false);
        set_hidden(tree, self.menu, true);
        if self.tracking == ItemTracking::ActiveDescendant {
            point_at(tree, self.menu, None);
        }
        tree.set_focus(Some(self.button));
    }

    fn search(&self, tree: &mut TreeSnapshot, c: char) {
        let len = self.items.len();
        let start = self.current(tree).map(|p| p + 1).unwrap_or(0);
        let wanted = c.to_lowercase().next().unwrap_or(c);
        let hit = (0..len).map(|k| (start + k) % len).find(|&i| {
            tree.get(self.items[i])
                .and_then(|n| n.name.as_deref())
                .and_then(|n| n.chars().next())
                .is_some_and(|first| first.to_lowercase().next() == Some(wanted))
        });
        if let Some(i) = hit {
            self.select(tree, i);
        }
    }
}

impl Behavior for MenuButton {
    fn on_key(&self, tree: &mut TreeSnapshot, key: KeyInput) -> Reaction {
        if self.items.is_empty() {
            return Reaction::Ignored;
        }
        if tree.focus() == Some(self.button) {
            match key {
                KeyInput::Special(SpecialKey::Enter | SpecialKey::Space | SpecialKey::Down) => {
                    self.open(tree, false)
                }
                KeyInput::Special(SpecialKey::Up) => self.open(tree, true),
                _ => return Reaction::Ignored,
            }
            return Reaction::Handled;
        }
        if !is_expanded(tree, self.button) || !self.in_menu(tree) {
            return Reaction::Ignored;
        }
        let len = self.items.len();
        let pos = self.current(tree).unwrap_or(0);
        match key {
            KeyInput::Special(SpecialKey::Down) => self.select(tree, wrap(pos, len, true)),
            KeyInput::Special(SpecialKey::Up) => self.select(tree, wrap(pos, len, false)),
            KeyInput::Special(SpecialKey::Home) => self.select(tree, 0),
            KeyInput::Special(SpecialKey::End) => self.select(tree, len - 1),
            KeyInput::Special(SpecialKey::Escape | SpecialKey::Enter | SpecialKey::Space) => {
                self.close(tree)
            }
            KeyInput::Special(SpecialKey::Tab) => {
                self.close(tree);
                return Reaction::Ignored;
            }
            KeyInput::Char(c) => self.search(tree, c),
            KeyInput::Special(_) => {}
        }
        Reaction::Handled
    }

    fn on_default(&self, tree: &mut TreeSnapshot, node: NodeId) -> Reaction {
        if node == self.button {
            if is_expanded(tree, self.button) {
                self.close(tree);
            } else {
                self.open(tree, false);
            }
            Reaction::Handled
        } else if self.items.contains(&node) {
            self.close(tree);
            Reaction::Handled
        } else {
            Reaction::Ignored
        }
    }
}

// ---- listboxes ----

#[derive(Clone, Copy)]
struct Listbox {
    list: NodeId,
}

fn append_listbox(tree: &mut TreeSnapshot, parent: NodeId, label: &str, options: &[&str]) -> NodeId {
    let prefix = slug(label);
    let list = tree.append(
        parent,
        NodeData::new(roles::LIST_BOX)
            .named(label)
            .focusable()
            .attr("id", prefix.clone()),
    );
    for (i, name) in options.iter().enumerate() {
        tree.append(
            list,
            NodeData::new(roles::LIST_BOX_OPTION)
                .named(*name)
                .focusable()
                .attr("id", format!("{}-{}", prefix, i))
                .attr("aria-selected", "false"),
        );
    }
    let first = tree.first_child(list);
    Listbox { list }.select(tree, first);
    list
}

impl Listbox {
    fn options(&self, tree: &TreeSnapshot) -> Vec<NodeId> {
        children_with_role(tree, self.list, roles::LIST_BOX_OPTION)
    }

    fn active(&self, tree: &TreeSnapshot) -> Option<NodeId> {
        tree.get(self.list)?.active_descendant
    }

    fn select(&self, tree: &mut TreeSnapshot, option: Option<NodeId>) {
        for o in self.options(tree) {
            let selected = Some(o) == option;
            tree.set_attr(o, "aria-selected", selected.to_string());
        }
        point_at(tree, self.list, option);
    }

    fn key(&self, tree: &mut TreeSnapshot, key: KeyInput) -> Reaction {
        if tree.focus() != Some(self.list) {
            return Reaction::Ignored;
        }
        let options = self.options(tree);
        if options.is_empty() {
            return Reaction::Ignored;
        }
        let last = options.len() - 1;
        let pos = self
            .active(tree)
            .and_then(|a| options.iter().position(|o| *o == a));
        let next = match (key, pos) {
            (KeyInput::Special(SpecialKey::Down), Some(p)) => (p + 1).min(last),
            (KeyInput::Special(SpecialKey::Up), Some(p)) => p.saturating_sub(1),
            (KeyInput::Special(SpecialKey::Down | SpecialKey::Up), None) => 0,
            (KeyInput::Special(SpecialKey::Home), _) => 0,
            (KeyInput::Special(SpecialKey::End), _) => last,
            _ => return Reaction::Ignored,
        };
        self.select(tree, Some(options[next]));
        Reaction::Handled
    }
}

impl Behavior for Listbox {
    fn on_key(&self, tree: &mut TreeSnapshot, key: KeyInput) -> Reaction {
        self.key(tree, key)
    }
}

/// A single-select listbox with active-descendant selection
pub fn listbox(tree: &mut TreeSnapshot, parent: NodeId, label: &str, options: &[&str]) -> Box<dyn Behavior> {
    let list = append_listbox(tree, parent, label, options);
    Box::new(Listbox { list })
}

struct CollapsibleListbox {
    button: NodeId,
    inner: Listbox,
}

/// A button that pops up a listbox
pub fn collapsible_listbox(
    tree: &mut TreeSnapshot,
    parent: NodeId,
    label: &str,
    options: &[&str],
) -> Box<dyn Behavior> {
    let button = tree.append(
        parent,
        NodeData::new(roles::POP_UP_BUTTON)
            .named(label)
            .focusable()
            .attr("aria-haspopup", "listbox")
            .attr("aria-expanded", "false"),
    );
    let list = append_listbox(tree, parent, label, options);
    set_hidden(tree, list, true);
    if let Some(b) = tree.get_mut(button) {
        b.controls = Some(vec![list]);
    }
    Box::new(CollapsibleListbox {
        button,
        inner: Listbox { list },
    })
}

impl CollapsibleListbox {
    fn expand(&self, tree: &mut TreeSnapshot) {
        set_expanded(tree, self.button, true);
        set_hidden(tree, self.inner.list, false);
        tree.set_focus(Some(self.inner.list));
    }

    fn collapse(&self, tree: &mut TreeSnapshot) {
        set_expanded(tree, self.button, false);
        set_hidden(tree, self.inner.list, true);
        tree.set_focus(Some(self.button));
    }
}

impl Behavior for CollapsibleListbox {
    fn on_key(&self, tree: &mut TreeSnapshot, key: KeyInput) -> Reaction {
        let focus = tree.focus();
        if focus == Some(self.button) {
            if let KeyInput::Special(SpecialKey::Enter | SpecialKey::Space | SpecialKey::Down) = key {
                self.expand(tree);
                return Reaction::Handled;
            }
            return Reaction::Ignored;
        }
        if focus == Some(self.inner.list) {
            if let KeyInput::Special(SpecialKey::Enter | SpecialKey::Escape) = key {
                self.collapse(tree);
                return Reaction::Handled;
            }
        }
        self.inner.key(tree, key)
    }

    fn on_default(&self, tree: &mut TreeSnapshot, node: NodeId) -> Reaction {
        if node != self.button {
            return Reaction::Ignored;
        }
        if is_expanded(tree, self.button) {
            self.collapse(tree);
        } else {
            self.expand(tree);
        }
        Reaction::Handled
    }
}

struct Rearrangeable {
    from: Listbox,
    to: Listbox,
    move_to: NodeId,
    move_from: NodeId,
}

/// Two listboxes with buttons moving the selected option between them
pub fn rearrangeable_listboxes(
    tree: &mut TreeSnapshot,
    parent: NodeId,
    from: (&str, &[&str]),
    to: (&str, &[&str]),
) -> Box<dyn Behavior> {
    let from_list = append_listbox(tree, parent, from.0, from.1);
    let move_to = tree.append(
        parent,
        NodeData::new(roles::BUTTON)
            .named(format!("Move to {}", to.0.trim_end_matches(':')))
            .focusable(),
    );
    let move_from = tree.append(
        parent,
        NodeData::new(roles::BUTTON)
            .named(format!("Move to {}", from.0.trim_end_matches(':')))
            .focusable(),
    );
    let to_list = append_listbox(tree, parent, to.0, to.1);
    Box::new(Rearrangeable {
        from: Listbox { list: from_list },
        to: Listbox { list: to_list },
        move_to,
        move_from,
    })
}

fn transfer(tree: &mut TreeSnapshot, source: Listbox, dest: Listbox) {
    let options = source.options(tree);
    let Some(option) = source.active(tree).or_else(|| options.first().copied()) else {
        return;
    };
    let pos = options.iter().position(|o| *o == option).unwrap_or(0);
    tree.move_node(option, dest.list);

    let remaining = source.options(tree);
    let next = remaining.get(pos).or_else(|| remaining.last()).copied();
    source.select(tree, next);
    dest.select(tree, Some(option));
}

impl Behavior for Rearrangeable {
    fn on_key(&self, tree: &mut TreeSnapshot, key: KeyInput) -> Reaction {
        match self.from.key(tree, key) {
            Reaction::Ignored => self.to.key(tree, key),
            handled => handled,
        }
    }

    fn on_default(&self, tree: &mut TreeSnapshot, node: NodeId) -> Reaction {
        if node == self.move_to {
            transfer(tree, self.from, self.to);
        } else if node == self.move_from {
            transfer(tree, self.to, self.from);
        } else {
            return Reaction::Ignored;
        }
        Reaction::Handled
    }
}

// ---- tabs ----

struct Tabs {
    tabs: Vec<NodeId>,
    panels: Vec<NodeId>,
    manual: bool,
}

/// A tab list with one panel per tab; `(tab name, panel text)` pairs
pub fn tabs(
    tree: &mut TreeSnapshot,
    parent: NodeId,
    label: &str,
    entries: &[(&str, &str)],
    manual: bool,
) -> Box<dyn Behavior> {
    let prefix = slug(label);
    let list = tree.append(parent, NodeData::new(roles::TAB_LIST).named(label));
    let tabs: Vec<NodeId> = entries
        .iter()
        .enumerate()
        .map(|(i, (name, _))| {
            tree.append(
                list,
                NodeData::new(roles::TAB)
                    .named(*name)
                    .focusable()
                    .attr("id", format!("{}-tab-{}", prefix, i))
                    .attr("aria-controls", format!("{}-panel-{}", prefix, i)),
            )
        })
        .collect();
    let panels: Vec<NodeId> = entries
        .iter()
        .enumerate()
        .map(|(i, (name, text))| {
            let panel = tree.append(
                parent,
                NodeData::new(roles::TAB_PANEL)
                    .named(*name)
                    .attr("id", format!("{}-panel-{}", prefix, i)),
            );
            tree.append(panel, NodeData::new(roles::STATIC_TEXT).named(*text));
            panel
        })
        .collect();
    for (tab, panel) in tabs.iter().zip(&panels) {
        if let Some(t) = tree.get_mut(*tab) {
            t.controls = Some(vec![*panel]);
        }
    }
    let widget = Tabs { tabs, panels, manual };
    widget.activate(tree, 0);
    Box::new(widget)
}

impl Tabs {
    fn activate(&self, tree: &mut TreeSnapshot, index: usize) {
        for (i, (tab, panel)) in self.tabs.iter().zip(&self.panels).enumerate() {
            let selected = i == index;
            tree.set_attr(*tab, "aria-selected", selected.to_string());
            tree.set_attr(*tab, "tabindex", if selected { "0" } else { "-1" });
            set_hidden(tree, *panel, !selected);
        }
    }

    fn move_to(&self, tree: &mut TreeSnapshot, index: usize) {
        tree.set_focus(self.tabs.get(index).copied());
        if !self.manual {
            self.activate(tree, index);
        }
    }
}

impl Behavior for Tabs {
    fn on_key(&self, tree: &mut TreeSnapshot, key: KeyInput) -> Reaction {
        let Some(pos) = tree.focus().and_then(|f| self.tabs.iter().position(|t| *t == f)) else {
            return Reaction::Ignored;
        };
        let len = self.tabs.len();
        match key {
            KeyInput::Special(SpecialKey::Right) => self.move_to(tree, wrap(pos, len, true)),
            KeyInput::Special(SpecialKey::Left) => self.move_to(tree, wrap(pos, len, false)),
            KeyInput::Special(SpecialKey::Home) => self.move_to(tree, 0),
            KeyInput::Special(SpecialKey::End) => self.move_to(tree, len - 1),
            KeyInput::Special(SpecialKey::Enter | SpecialKey::Space) => self.activate(tree, pos),
            _ => return Reaction::Ignored,
        }
        Reaction::Handled
    }

    fn on_default(&self, tree: &mut TreeSnapshot, node: NodeId) -> Reaction {
        match self.tabs.iter().position(|t| *t == node) {
            Some(pos) => {
                tree.set_focus(Some(node));
                self.activate(tree, pos);
                Reaction::Handled
            }
            None => Reaction::Ignored,
        }
    }
}

// ---- accordion ----

struct Accordion {
    buttons: Vec<NodeId>,
    regions: Vec<NodeId>,
}

/// Headings with buttons expanding one region at a time; `(title, body)`
/// pairs. The first section starts expanded.
pub fn accordion(
    tree: &mut TreeSnapshot,
    parent: NodeId,
    label: &str,
    sections: &[(&str, &str)],
) -> Box<dyn Behavior> {
    let group = tree.append(parent, NodeData::new(roles::GROUP).named(label));
    let mut buttons = Vec::new();
    let mut regions = Vec::new();
    for (title, body) in sections {
        let heading = tree.append(group, NodeData::new(roles::HEADING).named(*title));
        let button = tree.append(
            heading,
            NodeData::new(roles::BUTTON).named(*title).focusable(),
        );
        let region = tree.append(group, NodeData::new(roles::REGION).named(*title));
        tree.append(region, NodeData::new(roles::STATIC_TEXT).named(*body));
        if let Some(b) = tree.get_mut(button) {
            b.controls = Some(vec![region]);
        }
        buttons.push(button);
        regions.push(region);
    }
    let widget = Accordion { buttons, regions };
    widget.expand(tree, 0);
    Box::new(widget)
}

impl Accordion {
    fn expand(&self, tree: &mut TreeSnapshot, index: usize) {
        if self.buttons.get(index).is_some_and(|b| is_expanded(tree, *b)) {
            return;
        }
        for (i, (button, region)) in self.buttons.iter().zip(&self.regions).enumerate() {
            let open = i == index;
            set_expanded(tree, *button, open);
            set_hidden(tree, *region, !open);
            if let Some(b) = tree.get_mut(*button) {
                if open {
                    b.attributes.insert("aria-disabled".into(), "true".into());
                } else {
                    b.attributes.remove("aria-disabled");
                }
            }
        }
    }
}

impl Behavior for Accordion {
    fn on_key(&self, tree: &mut TreeSnapshot, key: KeyInput) -> Reaction {
        let Some(pos) = tree.focus().and_then(|f| self.buttons.iter().position(|b| *b == f)) else {
            return Reaction::Ignored;
        };
        let len = self.buttons.len();
        match key {
            KeyInput::Special(SpecialKey::Enter | SpecialKey::Space) => self.expand(tree, pos),
            KeyInput::Special(SpecialKey::Down) => tree.set_focus(Some(self.buttons[wrap(pos, len, true)])),
            KeyInput::Special(SpecialKey::Up) => tree.set_focus(Some(self.buttons[wrap(pos, len, false)])),
            KeyInput::Special(SpecialKey::Home) => tree.set_focus(self.buttons.first().copied()),
            KeyInput::Special(SpecialKey::End) => tree.set_focus(self.buttons.last().copied()),
            _ => return Reaction::Ignored,
        }
        Reaction::Handled
    }

    fn on_default(&self, tree: &mut TreeSnapshot, node: NodeId) -> Reaction {
        match self.buttons.iter().position(|b| *b == node) {
            Some(pos) => {
                self.expand(tree, pos);
                Reaction::Handled
            }
            None => Reaction::Ignored,
        }
    }
}

// ---- radio group ----

struct RadioGroup {
    group: NodeId,
    radios: Vec<NodeId>,
    tracking: ItemTracking,
}

/// A radio group with nothing checked initially
pub fn radio_group(
    tree: &mut TreeSnapshot,
    parent: NodeId,
    label: &str,
    options: &[&str],
    tracking: ItemTracking,
) -> Box<dyn Behavior> {
    let prefix = slug(label);
    let mut group_node = NodeData::new(roles::RADIO_GROUP).named(label);
    if tracking == ItemTracking::ActiveDescendant {
        group_node = group_node.focusable();
    }
    let group = tree.append(parent, group_node);
    let radios = options
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let mut radio = NodeData::new(roles::RADIO_BUTTON)
                .named(*name)
                .attr("id", format!("{}-{}", prefix, i))
                .attr("aria-checked", "false");
            if tracking == ItemTracking::Focus {
                radio = radio.focusable();
            }
            tree.append(group, radio)
        })
        .collect();
    Box::new(RadioGroup {
        group,
        radios,
        tracking,
    })
}

impl RadioGroup {
    fn check(&self, tree: &mut TreeSnapshot, index: usize) {
        for (i, radio) in self.radios.iter().enumerate() {
            tree.set_attr(*radio, "aria-checked", (i == index).to_string());
        }
        match self.tracking {
            ItemTracking::Focus => tree.set_focus(self.radios.get(index).copied()),
            ItemTracking::ActiveDescendant => point_at(tree, self.group, self.radios.get(index).copied()),
        }
    }

    fn position(&self, tree: &TreeSnapshot) -> Option<Option<usize>> {
        match self.tracking {
            ItemTracking::Focus => {
                let focus = tree.focus()?;
                let pos = self.radios.iter().position(|r| *r == focus)?;
                Some(Some(pos))
            }
            ItemTracking::ActiveDescendant => {
                if tree.focus() != Some(self.group) {
                    return None;
                }
                let active = tree.get(self.group)?.active_descendant;
                Some(active.and_then(|a| self.radios.iter().position(|r| *r == a)))
            }
        }
    }
}

impl Behavior for RadioGroup {
    fn on_key(&self, tree: &mut TreeSnapshot, key: KeyInput) -> Reaction {
        if self.radios.is_empty() {
            return Reaction::Ignored;
        }
        let Some(pos) = self.position(tree) else {
            return Reaction::Ignored;
        };
        let len = self.radios.len();
        let next = match (key, pos) {
            (KeyInput::Special(SpecialKey::Right | SpecialKey::Down), Some(p)) => wrap(p, len, true),
            (KeyInput::Special(SpecialKey::Left | SpecialKey::Up), Some(p)) => wrap(p, len, false),
            (KeyInput::Special(SpecialKey::Right | SpecialKey::Down), None) => 0,
            (KeyInput::Special(SpecialKey::Left | SpecialKey::Up), None) => len - 1,
            (KeyInput::Special(SpecialKey::Space | SpecialKey::Enter), p) => p.unwrap_or(0),
            _ => return Reaction::Ignored,
        };
        self.check(tree, next);
        Reaction::Handled
    }

    fn on_default(&self, tree: &mut TreeSnapshot, node: NodeId) -> Reaction {
        match self.radios.iter().position(|r| *r == node) {
            Some(pos) => {
                self.check(tree, pos);
                Reaction::Handled
            }
            None => Reaction::Ignored,
        }
    }
}

// ---- dialogs ----

struct Dialog {
    kind: DialogKind,
    trigger: NodeId,
    parent: NodeId,
    title: String,
    cancel: String,
}

/// A trigger button and the dialog it opens. Modal dialogs are laid out up
/// front and shown or hidden; alert dialogs are created on open and removed
/// on close.
pub fn dialog(
    tree: &mut TreeSnapshot,
    parent: NodeId,
    kind: DialogKind,
    trigger_label: &str,
    title: &str,
    cancel_label: &str,
) -> Box<dyn Behavior> {
    let trigger = tree.append(
        parent,
        NodeData::new(roles::BUTTON).named(trigger_label).focusable(),
    );
    let widget = Dialog {
        kind,
        trigger,
        parent,
        title: title.to_string(),
        cancel: cancel_label.to_string(),
    };
    if kind == DialogKind::Modal {
        let node = widget.build(tree);
        set_hidden(tree, node, true);
    }
    Box::new(widget)
}

impl Dialog {
    fn role(&self) -> &'static str {
        match self.kind {
            DialogKind::Modal => roles::DIALOG,
            DialogKind::Alert => roles::ALERT_DIALOG,
        }
    }

    fn build(&self, tree: &mut TreeSnapshot) -> NodeId {
        let node = tree.append(
            self.parent,
            NodeData::new(self.role()).named(self.title.clone()).modal(),
        );
        tree.append(node, NodeData::new(roles::STATIC_TEXT).named(self.title.clone()));
        tree.append(node, NodeData::new(roles::BUTTON).named("OK").focusable());
        tree.append(
            node,
            NodeData::new(roles::BUTTON).named(self.cancel.clone()).focusable(),
        );
        node
    }

    fn node(&self, tree: &TreeSnapshot) -> Option<NodeId> {
        tree.subtree(self.parent).into_iter().find(|id| {
            tree.get(*id)
                .is_some_and(|n| n.role == self.role() && n.name.as_deref() == Some(self.title.as_str()))
        })
    }

    fn open_node(&self, tree: &TreeSnapshot) -> Option<NodeId> {
        self.node(tree)
            .filter(|n| tree.get(*n).is_some_and(|d| !d.state.invisible))
    }

    fn open(&self, tree: &mut TreeSnapshot) {
        let node = match self.kind {
            DialogKind::Modal => match self.node(tree) {
                Some(n) => n,
                None => self.build(tree),
            },
            DialogKind::Alert => self.build(tree),
        };
        set_hidden(tree, node, false);
        let first_button = tree
            .subtree(node)
            .into_iter()
            .find(|id| tree.get(*id).is_some_and(|d| d.role == roles::BUTTON));
        tree.set_focus(first_button);
    }

    fn close(&self, tree: &mut TreeSnapshot, node: NodeId) {
        match self.kind {
            DialogKind::Modal => set_hidden(tree, node, true),
            DialogKind::Alert => tree.remove(node),
        }
        tree.set_focus(Some(self.trigger));
    }
}

impl Behavior for Dialog {
    fn on_key(&self, tree: &mut TreeSnapshot, key: KeyInput) -> Reaction {
        let Some(node) = self.open_node(tree) else {
            return Reaction::Ignored;
        };
        let inside = tree.focus().is_some_and(|f| tree.contains(node, f));
        if key == KeyInput::Special(SpecialKey::Escape) && inside {
            self.close(tree, node);
            return Reaction::Handled;
        }
        Reaction::Ignored
    }

    fn on_default(&self, tree: &mut TreeSnapshot, node: NodeId) -> Reaction {
        if node == self.trigger {
            if self.open_node(tree).is_none() {
                self.open(tree);
            }
            return Reaction::Handled;
        }
        let Some(dialog) = self.open_node(tree) else {
            return Reaction::Ignored;
        };
        let is_button = tree.get(node).is_some_and(|n| n.role == roles::BUTTON);
        if is_button && tree.contains(dialog, node) {
            self.close(tree, dialog);
            return Reaction::Handled;
        }
        Reaction::Ignored
    }
}

// ---- disclosure ----

struct Disclosure {
    button: NodeId,
    content: NodeId,
}

impl Disclosure {
    fn toggle(&self, tree: &mut TreeSnapshot) {
        let open = !is_expanded(tree, self.button);
        set_expanded(tree, self.button, open);
        set_hidden(tree, self.content, !open);
    }
}

impl Behavior for Disclosure {
    fn on_key(&self, tree: &mut TreeSnapshot, key: KeyInput) -> Reaction {
        if tree.focus() != Some(self.button) {
            return Reaction::Ignored;
        }
        match key {
            KeyInput::Special(SpecialKey::Enter | SpecialKey::Space) => {
                self.toggle(tree);
                Reaction::Handled
            }
            _ => Reaction::Ignored,
        }
    }

    fn on_default(&self, tree: &mut TreeSnapshot, node: NodeId) -> Reaction {
        if node != self.button {
            return Reaction::Ignored;
        }
        self.toggle(tree);
        Reaction::Handled
    }
}

/// A button showing and hiding a block of text
pub fn disclosure(tree: &mut TreeSnapshot, parent: NodeId, label: &str, lines: &[&str]) -> Box<dyn Behavior> {
    let button = tree.append(
        parent,
        NodeData::new(roles::BUTTON)
            .named(label)
            .focusable()
            .attr("aria-expanded", "false"),
    );
    let content = tree.append(parent, NodeData::new(roles::GROUP).invisible());
    for line in lines {
        tree.append(content, NodeData::new(roles::STATIC_TEXT).named(*line).invisible());
    }
    if let Some(b) = tree.get_mut(button) {
        b.controls = Some(vec![content]);
    }
    Box::new(Disclosure { button, content })
}

/// Site navigation: a "Menu" button disclosing a list of links.
/// `(name, href)` pairs.
pub fn site_navigation(
    tree: &mut TreeSnapshot,
    parent: NodeId,
    label: &str,
    links: &[(&str, &str)],
) -> Box<dyn Behavior> {
    let nav = tree.append(parent, NodeData::new(roles::NAVIGATION).named(label));
    let button = tree.append(
        nav,
        NodeData::new(roles::BUTTON)
            .named("Menu")
            .focusable()
            .attr("aria-expanded", "false"),
    );
    let list = tree.append(nav, NodeData::new(roles::LIST).invisible());
    for (name, href) in links {
        let item = tree.append(list, NodeData::new(roles::LIST_ITEM).invisible());
        tree.append(
            item,
            NodeData::new(roles::LINK)
                .named(*name)
                .focusable()
                .invisible()
                .attr("href", *href),
        );
    }
    if let Some(b) = tree.get_mut(button) {
        b.controls = Some(vec![list]);
    }
    Box::new(Disclosure {
        button,
        content: list,
    })
}

// ---- two-state controls ----

struct Toggle {
    node: NodeId,
    attribute: &'static str,
}

impl Toggle {
    fn flip(&self, tree: &mut TreeSnapshot) {
        let on = tree.attr(self.node, self.attribute) == Some("true");
        tree.set_attr(self.node, self.attribute, (!on).to_string());
    }
}

impl Behavior for Toggle {
    fn on_key(&self, tree: &mut TreeSnapshot, key: KeyInput) -> Reaction {
        if tree.focus() == Some(self.node) && key == KeyInput::Special(SpecialKey::Space) {
            self.flip(tree);
            return Reaction::Handled;
        }
        Reaction::Ignored
    }

    fn on_default(&self, tree: &mut TreeSnapshot, node: NodeId) -> Reaction {
        if node != self.node {
            return Reaction::Ignored;
        }
        self.flip(tree);
        Reaction::Handled
    }
}

pub fn checkbox(tree: &mut TreeSnapshot, parent: NodeId, label: &str, checked: bool) -> Box<dyn Behavior> {
    let node = tree.append(
        parent,
        NodeData::new(roles::CHECK_BOX)
            .named(label)
            .focusable()
            .attr("aria-checked", checked.to_string()),
    );
    Box::new(Toggle {
        node,
        attribute: "aria-checked",
    })
}

pub fn toggle_button(tree: &mut TreeSnapshot, parent: NodeId, label: &str) -> Box<dyn Behavior> {
    let node = tree.append(
        parent,
        NodeData::new(roles::TOGGLE_BUTTON)
            .named(label)
            .focusable()
            .attr("aria-pressed", "false"),
    );
    Box::new(Toggle {
        node,
        attribute: "aria-pressed",
    })
}

// ---- slider ----

struct Slider {
    node: NodeId,
    min: i64,
    max: i64,
    step: i64,
}

pub fn slider(
    tree: &mut TreeSnapshot,
    parent: NodeId,
    label: &str,
    min: i64,
    max: i64,
    value: i64,
) -> Box<dyn Behavior> {
    let node = tree.append(
        parent,
        NodeData::new(roles::SLIDER)
            .named(label)
            .focusable()
            .with_value(value.to_string())
            .attr("aria-valuemin", min.to_string())
            .attr("aria-valuemax", max.to_string())
            .attr("aria-valuenow", value.to_string()),
    );
    Box::new(Slider {
        node,
        min,
        max,
        step: 1,
    })
}

impl Behavior for Slider {
    fn on_key(&self, tree: &mut TreeSnapshot, key: KeyInput) -> Reaction {
        if tree.focus() != Some(self.node) {
            return Reaction::Ignored;
        }
        let now: i64 = tree
            .attr(self.node, "aria-valuenow")
            .and_then(|v| v.parse().ok())
            .unwrap_or(self.min);
        let big = self.step * 10;
        let next = match key {
            KeyInput::Special(SpecialKey::Right | SpecialKey::Up) => now + self.step,
            KeyInput::Special(SpecialKey::Left | SpecialKey::Down) => now - self.step,
            KeyInput::Special(SpecialKey::PageUp) => now + big,
            KeyInput::Special(SpecialKey::PageDown) => now - big,
            KeyInput::Special(SpecialKey::Home) => self.min,
            KeyInput::Special(SpecialKey::End) => self.max,
            _ => return Reaction::Ignored,
        }
        .clamp(self.min, self.max);
        tree.set_attr(self.node, "aria-valuenow", next.to_string());
        if let Some(n) = tree.get_mut(self.node) {
            n.value = Some(next.to_string());
        }
        Reaction::Handled
    }
}

// ---- feed ----

struct Feed {
    articles: Vec<NodeId>,
}

pub fn feed(tree: &mut TreeSnapshot, parent: NodeId, label: &str, articles: &[&str]) -> Box<dyn Behavior> {
    let node = tree.append(parent, NodeData::new(roles::FEED).named(label));
    let total = articles.len();
    let articles = articles
        .iter()
        .enumerate()
        .map(|(i, title)| {
            tree.append(
                node,
                NodeData::new(roles::ARTICLE)
                    .named(*title)
                    .focusable()
                    .attr("aria-posinset", (i + 1).to_string())
                    .attr("aria-setsize", total.to_string()),
            )
        })
        .collect();
    Box::new(Feed { articles })
}

impl Behavior for Feed {
    fn on_key(&self, tree: &mut TreeSnapshot, key: KeyInput) -> Reaction {
        let Some(pos) = tree.focus().and_then(|f| self.articles.iter().position(|a| *a == f)) else {
            return Reaction::Ignored;
        };
        let next = match key {
            KeyInput::Special(SpecialKey::PageDown) => (pos + 1).min(self.articles.len() - 1),
            KeyInput::Special(SpecialKey::PageUp) => pos.saturating_sub(1),
            _ => return Reaction::Ignored,
        };
        tree.set_focus(Some(self.articles[next]));
        Reaction::Handled
    }
}

// ---- static structure ----

pub fn button(tree: &mut TreeSnapshot, parent: NodeId, label: &str) -> NodeId {
    tree.append(parent, NodeData::new(roles::BUTTON).named(label).focusable())
}

pub fn link(tree: &mut TreeSnapshot, parent: NodeId, label: &str, href: &str) -> NodeId {
    tree.append(
        parent,
        NodeData::new(roles::LINK).named(label).focusable().attr("href", href),
    )
}

/// A breadcrumb trail of `(name, href)` links; the last one is the current page
pub fn breadcrumb(tree: &mut TreeSnapshot, parent: NodeId, label: &str, trail: &[(&str, &str)]) -> NodeId {
    let nav = tree.append(parent, NodeData::new(roles::NAVIGATION).named(label));
    let list = tree.append(nav, NodeData::new(roles::LIST));
    for (i, (name, href)) in trail.iter().enumerate() {
        let item = tree.append(list, NodeData::new(roles::LIST_ITEM));
        let a = link(tree, item, name, href);
        if i + 1 == trail.len() {
            tree.set_attr(a, "aria-current", "page");
        }
    }
    nav
}

/// A data table with one header row and row headers in the first column
pub fn table(tree: &mut TreeSnapshot, parent: NodeId, label: &str, columns: &[&str], rows: &[&[&str]]) -> NodeId {
    let node = tree.append(parent, NodeData::new(roles::TABLE).named(label));
    let header = tree.append(node, NodeData::new(roles::ROW));
    for c in columns {
        tree.append(header, NodeData::new(roles::COLUMN_HEADER).named(*c));
    }
    for cells in rows {
        let row = tree.append(node, NodeData::new(roles::ROW));
        for (i, text) in cells.iter().enumerate() {
            let role = if i == 0 { roles::ROW_HEADER } else { roles::CELL };
            tree.append(row, NodeData::new(role).named(*text));
        }
    }
    node
}

/// A labelled landmark of the given role
pub fn landmark(tree: &mut TreeSnapshot, parent: NodeId, role: &str, label: &str) -> NodeId {
    tree.append(parent, NodeData::new(role).named(label))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> (TreeSnapshot, NodeId) {
        let tree = TreeSnapshot::new("sim://widgets", "Widgets");
        let root = tree.root().unwrap();
        (tree, root)
    }

    fn focused_name(tree: &TreeSnapshot) -> Option<String> {
        tree.focus().and_then(|f| tree.get(f)).and_then(|n| n.name.clone())
    }

    #[test]
    fn menu_button_opens_wraps_and_closes() {
        let (mut tree, root) = page();
        let menu = menu_button(&mut tree, root, "Actions", &["Cut", "Paste"], ItemTracking::Focus);
        let button = tree.subtree(root)[1];
        tree.set_focus(Some(button));

        assert_eq!(menu.on_key(&mut tree, SpecialKey::Up.into()), Reaction::Handled);
        assert!(is_expanded(&tree, button));
        assert_eq!(focused_name(&tree).as_deref(), Some("Paste"));
        menu.on_key(&mut tree, SpecialKey::Down.into());
        assert_eq!(focused_name(&tree).as_deref(), Some("Cut"));
        menu.on_key(&mut tree, 'p'.into());
        assert_eq!(focused_name(&tree).as_deref(), Some("Paste"));
        menu.on_key(&mut tree, SpecialKey::Escape.into());
        assert!(!is_expanded(&tree, button));
        assert_eq!(tree.focus(), Some(button));
        assert_eq!(tree.attr(button, "aria-expanded"), Some("false"));
    }

    #[test]
    fn listbox_moves_active_descendant_without_wrapping() {
        let (mut tree, root) = page();
        let lb = listbox(&mut tree, root, "Fruit", &["Apple", "Pear"]);
        let list = tree.subtree(root)[1];
        tree.set_focus(Some(list));
        lb.on_key(&mut tree, SpecialKey::Down.into());
        lb.on_key(&mut tree, SpecialKey::Down.into());
        let active = tree.get(list).unwrap().active_descendant.unwrap();
        assert_eq!(tree.get(active).unwrap().name.as_deref(), Some("Pear"));
        assert_eq!(tree.attr(list, "aria-activedescendant"), Some("fruit-1"));
    }

    #[test]
    fn accordion_rejects_retrigger_of_open_section() {
        let (mut tree, root) = page();
        let acc = accordion(&mut tree, root, "FAQ", &[("One", "1"), ("Two", "2")]);
        let buttons: Vec<NodeId> = tree
            .subtree(root)
            .into_iter()
            .filter(|id| tree.get(*id).unwrap().role == roles::BUTTON)
            .collect();
        assert!(is_expanded(&tree, buttons[0]));
        acc.on_default(&mut tree, buttons[0]);
        assert!(is_expanded(&tree, buttons[0]));
        acc.on_default(&mut tree, buttons[1]);
        assert!(!is_expanded(&tree, buttons[0]));
        assert_eq!(tree.attr(buttons[1], "aria-disabled"), Some("true"));
        assert_eq!(tree.attr(buttons[0], "aria-disabled"), None);
    }

    #[test]
    fn alert_dialog_is_created_and_removed() {
        let (mut tree, root) = page();
        let d = dialog(&mut tree, root, DialogKind::Alert, "Discard", "Confirm", "No");
        let trigger = tree.subtree(root)[1];
        let before = tree.len();
        d.on_default(&mut tree, trigger);
        assert!(tree.len() > before);
        assert_eq!(
            tree.get(tree.focus().unwrap()).unwrap().role,
            roles::BUTTON
        );
        d.on_key(&mut tree, SpecialKey::Escape.into());
        assert_eq!(tree.len(), before);
        assert_eq!(tree.focus(), Some(trigger));
    }

    #[test]
    fn slider_clamps_to_range() {
        let (mut tree, root) = page();
        let s = slider(&mut tree, root, "Volume", 0, 5, 4);
        let node = tree.subtree(root)[1];
        tree.set_focus(Some(node));
        s.on_key(&mut tree, SpecialKey::PageUp.into());
        assert_eq!(tree.attr(node, "aria-valuenow"), Some("5"));
        s.on_key(&mut tree, SpecialKey::Home.into());
        assert_eq!(tree.attr(node, "aria-valuenow"), Some("0"));
    }
}
