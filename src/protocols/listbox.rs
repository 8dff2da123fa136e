use super::{expanded_attr, locate};
use crate::driver::{Driver, SpecialKey};
use crate::reader::{NodeHandle, ScreenReader};
use crate::tap::TapWriter;
use crate::tree::{roles, SearchPredicate};
use crate::Result;

pub(super) struct Rearrangeable {
    pub from: String,
    pub to: String,
    pub move_to: String,
    pub move_from: String,
}

fn options<D: Driver>(r: &ScreenReader<D>, list: &NodeHandle) -> Result<Vec<NodeHandle>> {
    r.find_all(list, &SearchPredicate::role(roles::LIST_BOX_OPTION))
}

fn active_name<D: Driver>(r: &ScreenReader<D>, list: &NodeHandle) -> Option<String> {
    r.get_active_descendant(list).name()
}

/// Label, visibility and role of the list itself
fn check_list_node<D: Driver>(r: &ScreenReader<D>, t: &mut TapWriter, list: &NodeHandle) -> Result<()> {
    t.explain("The listbox is labelled");
    t.non_blank(r.get_accessible_name(list).as_deref())?;
    t.explain("The listbox is visible");
    t.is_true(r.is_visible(list))?;
    t.explain("The listbox has the listBox role");
    t.equal(r.get_role(list).as_deref(), Some(roles::LIST_BOX))
}

/// Option checks, then arrow, Home and End navigation of the active option
async fn check_listbox<D: Driver>(r: &ScreenReader<D>, t: &mut TapWriter, list: &NodeHandle) -> Result<()> {
    check_list_node(r, t, list)?;

    let opts = options(r, list)?;
    t.explain("The listbox has options");
    t.not_empty(&opts)?;
    for opt in &opts {
        let name = r.get_accessible_name(opt);
        t.explain(format!(
            "Option \"{}\" is labelled, visible and focusable",
            name.as_deref().unwrap_or("")
        ));
        t.is_true(name.is_some_and(|n| !n.is_empty()) && r.is_visible(opt) && r.is_focusable(opt))?;
    }

    r.focus(list).await?;
    let first = opts[0].name();
    let last = opts[opts.len() - 1].name();
    if opts.len() > 1 {
        step(r, t, list, SpecialKey::Down).await?;
        t.explain("Down arrow activates the second option");
        t.equal(active_name(r, list), opts[1].name())?;
        step(r, t, list, SpecialKey::Up).await?;
        t.explain("Up arrow activates the first option");
        t.equal(active_name(r, list), first.clone())?;
    }
    step(r, t, list, SpecialKey::End).await?;
    t.explain("End activates the last option");
    t.equal(active_name(r, list), last)?;
    step(r, t, list, SpecialKey::Home).await?;
    t.explain("Home activates the first option");
    t.equal(active_name(r, list), first)
}

/// Press a navigation key; the active option moves but DOM focus stays on
/// the list
async fn step<D: Driver>(
    r: &ScreenReader<D>,
    t: &mut TapWriter,
    list: &NodeHandle,
    key: SpecialKey,
) -> Result<()> {
    r.send_special_key(key).await?;
    t.explain(format!("Focus stays on the listbox after {:?}", key));
    t.equal(r.get_focus(), list.clone())
}

pub(super) async fn scrollable<D: Driver>(r: &ScreenReader<D>, t: &mut TapWriter, label: &str) -> Result<()> {
    let list = locate(r, t, roles::LIST_BOX, label).await?;
    check_listbox(r, t, &list).await
}

pub(super) async fn collapsible<D: Driver>(r: &ScreenReader<D>, t: &mut TapWriter, label: &str) -> Result<()> {
    let button = locate(r, t, roles::POP_UP_BUTTON, label).await?;
    t.explain("The button announces a listbox popup");
    t.equal(r.get_attribute_value(&button, "aria-haspopup").as_str(), "listbox")?;

    r.do_default(&button).await?;
    r.wait_for_expanded(&button).await?;
    t.explain("Activating the button expands the listbox");
    t.equal(expanded_attr(r, &button).as_str(), "true")?;

    t.explain("The button controls exactly one listbox");
    let list = t.succeeds(r.get_single_control(&button))?;
    check_listbox(r, t, &list).await?;

    r.send_special_key(SpecialKey::Escape).await?;
    r.wait_for_collapsed(&button).await?;
    t.explain("Escape collapses the listbox");
    t.is_false(r.is_visible(&list))
}

pub(super) async fn rearrangeable<D: Driver>(
    r: &ScreenReader<D>,
    t: &mut TapWriter,
    names: &Rearrangeable,
) -> Result<()> {
    let from = locate(r, t, roles::LIST_BOX, &names.from).await?;
    let to = locate(r, t, roles::LIST_BOX, &names.to).await?;
    let move_to = locate(r, t, roles::BUTTON, &names.move_to).await?;
    let move_from = locate(r, t, roles::BUTTON, &names.move_from).await?;

    check_list_node(r, t, &to)?;
    for button in [&move_to, &move_from] {
        t.explain(format!(
            "\"{}\" is a visible button",
            button.name().unwrap_or_default()
        ));
        t.is_true(r.is_visible(button) && r.get_role(button).as_deref() == Some(roles::BUTTON))?;
    }
    check_listbox(r, t, &from).await?;

    let from_count = options(r, &from)?.len();
    let to_count = options(r, &to)?.len();

    r.do_default(&move_to).await?;
    t.explain("Moving an option removes it from the source list");
    t.equal(options(r, &from)?.len(), from_count - 1)?;
    t.explain("Moving an option adds it to the destination list");
    t.equal(options(r, &to)?.len(), to_count + 1)?;

    r.do_default(&move_from).await?;
    t.explain("Moving the option back restores the source list");
    t.equal(options(r, &from)?.len(), from_count)?;
    t.explain("Moving the option back restores the destination list");
    t.equal(options(r, &to)?.len(), to_count)
}
