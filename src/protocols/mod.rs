//! Widget protocol validators
//!
//! Each [`Protocol`] variant is a fixed script for one WAI-ARIA authoring
//! practice: an ordered run of actions, waits and labelled assertions. The
//! first failing assertion ends the script with [`Error::Assertion`]; nothing
//! is retried.
//!
//! Names in a protocol are exact accessible names, `/regex/` patterns, or
//! `$key` to read the name from the run's dataset row.

use crate::driver::{Driver, KeyInput};
use crate::reader::{NodeHandle, ScreenReader};
use crate::tap::TapWriter;
use crate::tree::{NameMatch, SearchPredicate};
use crate::{Error, Result, RunContext};
use serde::{Deserialize, Serialize};

mod accordion;
mod controls;
mod dialog;
mod listbox;
mod menu;
mod radio;
mod structure;
mod tabs;

/// How a composite widget marks its current item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemTracking {
    /// The item itself takes input focus
    #[default]
    Focus,
    /// The container keeps focus and points at the item with
    /// `aria-activedescendant`
    ActiveDescendant,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DialogKind {
    #[default]
    Modal,
    Alert,
}

/// One interaction protocol and the widget it applies to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "pattern", rename_all = "camelCase")]
pub enum Protocol {
    /// Menu button opening a menu of actions
    #[serde(rename_all = "camelCase")]
    MenuButton {
        label: String,
        #[serde(default)]
        tracking: ItemTracking,
        /// Also check first-character typeahead
        #[serde(default)]
        search: bool,
    },
    /// Always-visible single-select listbox
    Listbox { label: String },
    /// Listbox popped up by a button
    CollapsibleListbox { label: String },
    /// Two listboxes and the buttons moving options between them
    #[serde(rename_all = "camelCase")]
    RearrangeableListbox {
        from: String,
        to: String,
        move_to: String,
        move_from: String,
    },
    Tablist {
        label: String,
        /// Tabs are activated with Enter rather than on focus
        #[serde(default)]
        manual: bool,
    },
    /// Accordion headings inside the container named `label`
    Accordion { label: String },
    RadioGroup {
        label: String,
        #[serde(default)]
        tracking: ItemTracking,
    },
    Dialog {
        #[serde(default)]
        kind: DialogKind,
        trigger: String,
        cancel: String,
    },
    Disclosure { label: String },
    Button { label: String },
    ToggleButton { label: String },
    Checkbox { label: String },
    Link { label: String },
    #[serde(rename_all = "camelCase")]
    Slider {
        label: String,
        #[serde(default)]
        page_keys: bool,
    },
    Breadcrumb { label: String },
    Feed {
        #[serde(default)]
        label: Option<String>,
    },
    Table { label: String },
    /// Navigation landmarks and regions carry distinct labels
    PageRegionLabels,
    /// Site navigation toggled by a button, then one of its links followed
    NavigationMenu {
        #[serde(default)]
        navigation: Option<String>,
        toggle: String,
        link: String,
    },
}

impl Protocol {
    /// Pattern name as used in scenario files
    pub fn name(&self) -> &'static str {
        match self {
            Protocol::MenuButton { .. } => "menuButton",
            Protocol::Listbox { .. } => "listbox",
            Protocol::CollapsibleListbox { .. } => "collapsibleListbox",
            Protocol::RearrangeableListbox { .. } => "rearrangeableListbox",
            Protocol::Tablist { .. } => "tablist",
            Protocol::Accordion { .. } => "accordion",
            Protocol::RadioGroup { .. } => "radioGroup",
            Protocol::Dialog { .. } => "dialog",
            Protocol::Disclosure { .. } => "disclosure",
            Protocol::Button { .. } => "button",
            Protocol::ToggleButton { .. } => "toggleButton",
            Protocol::Checkbox { .. } => "checkbox",
            Protocol::Link { .. } => "link",
            Protocol::Slider { .. } => "slider",
            Protocol::Breadcrumb { .. } => "breadcrumb",
            Protocol::Feed { .. } => "feed",
            Protocol::Table { .. } => "table",
            Protocol::PageRegionLabels => "pageRegionLabels",
            Protocol::NavigationMenu { .. } => "navigationMenu",
        }
    }

    /// Run the script against the current page
    pub async fn validate<D: Driver>(
        &self,
        r: &ScreenReader<D>,
        t: &mut TapWriter,
        ctx: &RunContext,
    ) -> Result<()> {
        log::debug!("validating {} protocol", self.name());
        match self {
            Protocol::MenuButton {
                label,
                tracking,
                search,
            } => menu::menu_button(r, t, &resolve(ctx, label)?, *tracking, *search).await,
            Protocol::Listbox { label } => listbox::scrollable(r, t, &resolve(ctx, label)?).await,
            Protocol::CollapsibleListbox { label } => {
                listbox::collapsible(r, t, &resolve(ctx, label)?).await
            }
            Protocol::RearrangeableListbox {
                from,
                to,
                move_to,
                move_from,
            } => {
                let names = listbox::Rearrangeable {
                    from: resolve(ctx, from)?,
                    to: resolve(ctx, to)?,
                    move_to: resolve(ctx, move_to)?,
                    move_from: resolve(ctx, move_from)?,
                };
                listbox::rearrangeable(r, t, &names).await
            }
            Protocol::Tablist { label, manual } => tabs::tablist(r, t, &resolve(ctx, label)?, *manual).await,
            Protocol::Accordion { label } => accordion::accordion(r, t, &resolve(ctx, label)?).await,
            Protocol::RadioGroup { label, tracking } => {
                radio::radio_group(r, t, &resolve(ctx, label)?, *tracking).await
            }
            Protocol::Dialog {
                kind,
                trigger,
                cancel,
            } => dialog::dialog(r, t, *kind, &resolve(ctx, trigger)?, &resolve(ctx, cancel)?).await,
            Protocol::Disclosure { label } => controls::disclosure(r, t, &resolve(ctx, label)?).await,
            Protocol::Button { label } => controls::button(r, t, &resolve(ctx, label)?).await,
            Protocol::ToggleButton { label } => controls::toggle_button(r, t, &resolve(ctx, label)?).await,
            Protocol::Checkbox { label } => controls::checkbox(r, t, &resolve(ctx, label)?).await,
            Protocol::Link { label } => controls::link(r, t, &resolve(ctx, label)?).await,
            Protocol::Slider { label, page_keys } => {
                controls::slider(r, t, &resolve(ctx, label)?, *page_keys).await
            }
            Protocol::Breadcrumb { label } => structure::breadcrumb(r, t, &resolve(ctx, label)?).await,
            Protocol::Feed { label } => {
                let label = match label {
                    Some(l) => resolve(ctx, l)?,
                    None => String::new(),
                };
                structure::feed(r, t, &label).await
            }
            Protocol::Table { label } => structure::table(r, t, &resolve(ctx, label)?).await,
            Protocol::PageRegionLabels => structure::page_region_labels(r, t).await,
            Protocol::NavigationMenu {
                navigation,
                toggle,
                link,
            } => {
                let navigation = match navigation {
                    Some(n) => resolve(ctx, n)?,
                    None => String::new(),
                };
                structure::navigation_menu(r, t, &navigation, &resolve(ctx, toggle)?, &resolve(ctx, link)?)
                    .await
            }
        }
    }
}

/// Substitute `$key` names from the dataset row
pub fn resolve(ctx: &RunContext, name: &str) -> Result<String> {
    match name.strip_prefix('$') {
        Some(key) => ctx
            .state_str(key)
            .map(str::to_string)
            .ok_or_else(|| Error::ConfigError(format!("dataset row has no string \"{}\"", key))),
        None => Ok(name.to_string()),
    }
}

/// Role plus a name that may be a `/regex/`; empty means any name
pub(crate) fn predicate(role: &str, name: &str) -> Result<SearchPredicate> {
    let mut pred = SearchPredicate::role(role);
    if !name.is_empty() {
        pred.name = Some(NameMatch::parse(name)?);
    }
    Ok(pred)
}

/// Find a widget in the page and record that it exists
pub(crate) async fn locate<D: Driver>(
    r: &ScreenReader<D>,
    t: &mut TapWriter,
    role: &str,
    name: &str,
) -> Result<NodeHandle> {
    let node = r.find_in_page(&predicate(role, name)?).await?;
    t.explain(format!("{} \"{}\" is present", role, name));
    t.is_false(node.is_empty())?;
    Ok(node)
}

/// Press a key that should move focus to `target`, waiting for the move
pub(crate) async fn press_to<D: Driver>(
    r: &ScreenReader<D>,
    key: KeyInput,
    target: &NodeHandle,
) -> Result<()> {
    let wait = if target.is_focused() {
        None
    } else {
        Some(r.wait_for_focus_change(target)?)
    };
    press(r, key).await?;
    if let Some(w) = wait {
        r.resolve(w).await?;
    }
    Ok(())
}

pub(crate) async fn press<D: Driver>(r: &ScreenReader<D>, key: KeyInput) -> Result<()> {
    match key {
        KeyInput::Special(k) => r.send_special_key(k).await,
        KeyInput::Char(c) => r.send_key(c).await,
    }
}

/// Position of `node` in `items`
pub(crate) fn index_of(items: &[NodeHandle], node: &NodeHandle) -> Option<usize> {
    items.iter().position(|i| i == node)
}

/// `aria-expanded` as the page reports it
pub(crate) fn expanded_attr<D: Driver>(r: &ScreenReader<D>, node: &NodeHandle) -> String {
    r.get_attribute_value(node, "aria-expanded")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocols_parse_from_scenario_json() {
        let p: Protocol =
            serde_json::from_str(r#"{"pattern":"menuButton","label":"Actions","search":true}"#).unwrap();
        assert_eq!(
            p,
            Protocol::MenuButton {
                label: "Actions".into(),
                tracking: ItemTracking::Focus,
                search: true
            }
        );
        let p: Protocol = serde_json::from_str(
            r#"{"pattern":"dialog","kind":"alert","trigger":"Discard","cancel":"No"}"#,
        )
        .unwrap();
        assert_eq!(p.name(), "dialog");
        let p: Protocol = serde_json::from_str(r#"{"pattern":"pageRegionLabels"}"#).unwrap();
        assert_eq!(p, Protocol::PageRegionLabels);
    }

    #[test]
    fn dataset_names_resolve() {
        let ctx = RunContext {
            state: serde_json::json!({"page": "Contact"}),
            ..Default::default()
        };
        assert_eq!(resolve(&ctx, "$page").unwrap(), "Contact");
        assert_eq!(resolve(&ctx, "Home").unwrap(), "Home");
        assert!(matches!(resolve(&ctx, "$missing"), Err(Error::ConfigError(_))));
    }

    #[test]
    fn regex_names_in_predicates() {
        let p = predicate("button", "/Menu/").unwrap();
        assert!(matches!(p.name, Some(NameMatch::Pattern(_))));
        assert!(predicate("button", "").unwrap().name.is_none());
    }
}
