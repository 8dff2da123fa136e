use super::{expanded_attr, locate};
use crate::driver::{Driver, SpecialKey};
use crate::reader::{NodeHandle, ScreenReader};
use crate::tap::TapWriter;
use crate::tree::roles;
use crate::Result;

fn check_basics<D: Driver>(r: &ScreenReader<D>, t: &mut TapWriter, node: &NodeHandle, role: &str) -> Result<()> {
    t.explain(format!("The {} is visible", role));
    t.is_true(r.is_visible(node))?;
    t.explain(format!("The node has the {} role", role));
    t.equal(r.get_role(node).as_deref(), Some(role))?;
    t.explain(format!("The {} is focusable", role));
    t.is_true(r.is_focusable(node))?;
    t.explain(format!("The {} is labelled", role));
    t.non_blank(r.get_accessible_name(node).as_deref())
}

pub(super) async fn button<D: Driver>(r: &ScreenReader<D>, t: &mut TapWriter, label: &str) -> Result<()> {
    let node = locate(r, t, roles::BUTTON, label).await?;
    check_basics(r, t, &node, roles::BUTTON)
}

pub(super) async fn link<D: Driver>(r: &ScreenReader<D>, t: &mut TapWriter, label: &str) -> Result<()> {
    let node = locate(r, t, roles::LINK, label).await?;
    check_basics(r, t, &node, roles::LINK)
}

pub(super) async fn disclosure<D: Driver>(r: &ScreenReader<D>, t: &mut TapWriter, label: &str) -> Result<()> {
    let button = locate(r, t, roles::BUTTON, label).await?;
    check_basics(r, t, &button, roles::BUTTON)?;
    t.explain("The content is initially hidden");
    t.equal(expanded_attr(r, &button).as_str(), "false")?;

    r.do_default(&button).await?;
    r.wait_for_expanded(&button).await?;
    t.explain("Activating the button shows the content");
    t.equal(expanded_attr(r, &button).as_str(), "true")?;
    t.explain("The button controls the content");
    let controls = t.succeeds(r.get_controls(&button))?;
    t.explain("The controlled content exists");
    t.not_empty(&controls)?;
    t.explain("The content is visible");
    t.is_true(r.is_visible(&controls[0]))?;

    r.do_default(&button).await?;
    r.wait_for_collapsed(&button).await?;
    t.explain("Activating the button again hides the content");
    t.equal(expanded_attr(r, &button).as_str(), "false")?;
    t.explain("The content is hidden");
    t.is_false(r.is_visible(&controls[0]))
}

/// Two toggles flip the state and then restore it
async fn two_state<D: Driver>(
    r: &ScreenReader<D>,
    t: &mut TapWriter,
    role: &str,
    label: &str,
    attribute: &str,
) -> Result<()> {
    let node = locate(r, t, role, label).await?;
    check_basics(r, t, &node, role)?;
    let initial = r.get_attribute_value(&node, attribute);

    r.do_default(&node).await?;
    t.explain(format!("Activating the {} changes {}", role, attribute));
    t.not_equal(r.get_attribute_value(&node, attribute), initial.clone())?;

    r.focus(&node).await?;
    r.send_special_key(SpecialKey::Space).await?;
    t.explain(format!("Space restores {}", attribute));
    t.equal(r.get_attribute_value(&node, attribute), initial)
}

pub(super) async fn checkbox<D: Driver>(r: &ScreenReader<D>, t: &mut TapWriter, label: &str) -> Result<()> {
    two_state(r, t, roles::CHECK_BOX, label, "aria-checked").await
}

pub(super) async fn toggle_button<D: Driver>(r: &ScreenReader<D>, t: &mut TapWriter, label: &str) -> Result<()> {
    two_state(r, t, roles::TOGGLE_BUTTON, label, "aria-pressed").await
}

pub(super) async fn slider<D: Driver>(
    r: &ScreenReader<D>,
    t: &mut TapWriter,
    label: &str,
    page_keys: bool,
) -> Result<()> {
    let node = locate(r, t, roles::SLIDER, label).await?;
    check_basics(r, t, &node, roles::SLIDER)?;

    let now = || node.attribute("aria-valuenow");
    let min = node.attribute("aria-valuemin");
    let max = node.attribute("aria-valuemax");
    for (name, value) in [("aria-valuenow", now()), ("aria-valuemin", min.clone()), ("aria-valuemax", max.clone())] {
        t.explain(format!("The slider exposes {}", name));
        t.non_blank(value.as_deref())?;
    }

    r.focus(&node).await?;
    press(r, SpecialKey::End).await?;
    t.explain("End sets the maximum value");
    t.equal(now(), max.clone())?;
    press(r, SpecialKey::Home).await?;
    t.explain("Home sets the minimum value");
    t.equal(now(), min.clone())?;

    let mut pairs = vec![(SpecialKey::Right, SpecialKey::Left), (SpecialKey::Up, SpecialKey::Down)];
    if page_keys {
        pairs.push((SpecialKey::PageUp, SpecialKey::PageDown));
    }
    for (up, down) in pairs {
        press(r, up).await?;
        t.explain(format!("{:?} increases the value", up));
        t.not_equal(now(), min.clone())?;
        press(r, down).await?;
        t.explain(format!("{:?} decreases the value", down));
        t.equal(now(), min.clone())?;
    }
    Ok(())
}

async fn press<D: Driver>(r: &ScreenReader<D>, key: SpecialKey) -> Result<()> {
    r.send_special_key(key).await?;
    r.wait_for_interaction(false).await;
    Ok(())
}
