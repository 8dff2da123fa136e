use super::press_to;
use crate::driver::{Driver, SpecialKey};
use crate::reader::{NodeHandle, ScreenReader};
use crate::tap::TapWriter;
use crate::tree::{roles, NameMatch, SearchPredicate};
use crate::Result;

/// Sections open one at a time and the open one refuses to collapse
async fn check_open_section<D: Driver>(
    r: &ScreenReader<D>,
    t: &mut TapWriter,
    buttons: &[NodeHandle],
    index: usize,
) -> Result<()> {
    let button = &buttons[index];
    t.explain(format!("Section {} is expanded", index + 1));
    t.is_true(r.is_expanded(button))?;
    t.explain(format!("Section {} cannot be collapsed while open", index + 1));
    t.equal(r.get_attribute_value(button, "aria-disabled").as_str(), "true")?;

    t.explain(format!("Section {} controls exactly one region", index + 1));
    let region = t.succeeds(r.get_single_control(button))?;
    t.explain(format!("The region of section {} is visible and labelled", index + 1));
    t.is_true(r.is_visible(&region) && region.name().is_some_and(|n| !n.is_empty()))?;

    let open = buttons.iter().filter(|b| r.is_expanded(b)).count();
    t.explain("Exactly one section is expanded");
    t.equal(open, 1)
}

pub(super) async fn accordion<D: Driver>(r: &ScreenReader<D>, t: &mut TapWriter, label: &str) -> Result<()> {
    let container = r
        .find_in_page(&SearchPredicate {
            name: Some(NameMatch::parse(label)?),
            ..SearchPredicate::any()
        })
        .await?;
    t.explain(format!("Accordion \"{}\" is present", label));
    t.is_false(container.is_empty())?;

    let headings = r.find_all(&container, &SearchPredicate::role(roles::HEADING))?;
    t.explain("The accordion has headings");
    t.not_empty(&headings)?;
    t.explain("Headings have unique labels");
    t.succeeds(r.expect_unique_labels(&headings))?;

    let mut buttons = Vec::with_capacity(headings.len());
    for heading in &headings {
        let button = r.next(heading, &SearchPredicate::role(roles::BUTTON))?;
        t.explain(format!(
            "Heading \"{}\" holds a button",
            heading.name().unwrap_or_default()
        ));
        t.is_false(button.is_empty())?;
        buttons.push(button);
    }

    if !r.is_expanded(&buttons[0]) {
        r.focus(&buttons[0]).await?;
        r.send_special_key(SpecialKey::Enter).await?;
        r.wait_for_expanded(&buttons[0]).await?;
    }
    check_open_section(r, t, &buttons, 0).await?;

    r.focus(&buttons[0]).await?;
    for i in 1..buttons.len() {
        press_to(r, SpecialKey::Down.into(), &buttons[i]).await?;
        t.explain("Down arrow moves to the next heading");
        t.is_true(buttons[i].is_focused())?;
        t.explain(format!("Section {} starts collapsed", i + 1));
        t.is_false(r.is_expanded(&buttons[i]))?;

        r.do_default(&buttons[i]).await?;
        r.wait_for_expanded(&buttons[i]).await?;
        check_open_section(r, t, &buttons, i).await?;

        r.do_default(&buttons[i]).await?;
        t.explain("Activating the open section again keeps it open");
        t.is_true(r.is_expanded(&buttons[i]))?;
    }

    press_to(r, SpecialKey::Home.into(), &buttons[0]).await?;
    t.explain("Home moves to the first heading");
    t.is_true(buttons[0].is_focused())?;
    let last = &buttons[buttons.len() - 1];
    press_to(r, SpecialKey::End.into(), last).await?;
    t.explain("End moves to the last heading");
    t.is_true(last.is_focused())
}
