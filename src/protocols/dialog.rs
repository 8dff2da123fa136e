use super::{locate, predicate, DialogKind};
use crate::driver::{Driver, SpecialKey};
use crate::reader::{NodeHandle, ScreenReader};
use crate::tap::TapWriter;
use crate::tree::{roles, SearchPredicate};
use crate::Result;

fn role_of(kind: DialogKind) -> &'static str {
    match kind {
        DialogKind::Modal => roles::DIALOG,
        DialogKind::Alert => roles::ALERT_DIALOG,
    }
}

async fn open<D: Driver>(
    r: &ScreenReader<D>,
    t: &mut TapWriter,
    trigger: &NodeHandle,
    role: &str,
) -> Result<NodeHandle> {
    let shown = r.wait_for_shown(SearchPredicate::role(role));
    r.do_default(trigger).await?;
    r.resolve(shown).await?;

    let dialog = r.find_in_page(&SearchPredicate::role(role)).await?;
    t.explain("The trigger opens a dialog");
    t.is_true(r.is_visible(&dialog))?;
    t.explain("The dialog is modal");
    t.is_true(r.is_modal(&dialog))?;
    t.explain("The dialog is labelled");
    t.non_blank(r.get_accessible_name(&dialog).as_deref())?;
    Ok(dialog)
}

async fn is_closed<D: Driver>(r: &ScreenReader<D>, role: &str) -> Result<bool> {
    let dialog = r.find_in_page(&SearchPredicate::role(role)).await?;
    Ok(dialog.is_empty() || !r.is_visible(&dialog))
}

pub(super) async fn dialog<D: Driver>(
    r: &ScreenReader<D>,
    t: &mut TapWriter,
    kind: DialogKind,
    trigger: &str,
    cancel: &str,
) -> Result<()> {
    let role = role_of(kind);
    let trigger = locate(r, t, roles::BUTTON, trigger).await?;

    let dialog = open(r, t, &trigger, role).await?;
    let cancel_button = r.find(&dialog, &predicate(roles::BUTTON, cancel)?)?;
    t.explain(format!("The dialog has a \"{}\" button", cancel));
    t.is_false(cancel_button.is_empty())?;

    let hidden = r.wait_for_hidden(SearchPredicate::role(role));
    r.do_default(&cancel_button).await?;
    r.resolve(hidden).await?;
    t.explain(format!("\"{}\" closes the dialog", cancel));
    t.is_true(is_closed(r, role).await?)?;

    open(r, t, &trigger, role).await?;
    let hidden = r.wait_for_hidden(SearchPredicate::role(role));
    r.send_special_key(SpecialKey::Escape).await?;
    r.resolve(hidden).await?;
    t.explain("Escape closes the dialog");
    t.is_true(is_closed(r, role).await?)?;
    t.explain("Focus returns to the trigger");
    t.is_true(trigger.is_focused())
}
