use super::{index_of, locate, press_to};
use crate::driver::{Driver, SpecialKey};
use crate::reader::{NodeHandle, ScreenReader};
use crate::tap::TapWriter;
use crate::tree::{roles, SearchPredicate};
use crate::Result;

fn selected(tabs: &[NodeHandle]) -> Vec<usize> {
    tabs.iter()
        .enumerate()
        .filter(|(_, tab)| tab.attribute("aria-selected").as_deref() == Some("true"))
        .map(|(i, _)| i)
        .collect()
}

/// Move with `key` to `target`, activating it with Enter in manual mode
async fn move_to<D: Driver>(
    r: &ScreenReader<D>,
    t: &mut TapWriter,
    tabs: &[NodeHandle],
    key: SpecialKey,
    target: usize,
    manual: bool,
) -> Result<()> {
    press_to(r, key.into(), &tabs[target]).await?;
    if manual {
        r.send_special_key(SpecialKey::Enter).await?;
    }
    t.explain(format!("{:?} moves to tab {}", key, target + 1));
    t.equal(index_of(tabs, &r.get_focus()), Some(target))?;
    t.explain(format!("Tab {} is the only selected tab", target + 1));
    t.equal(selected(tabs), vec![target])
}

pub(super) async fn tablist<D: Driver>(
    r: &ScreenReader<D>,
    t: &mut TapWriter,
    label: &str,
    manual: bool,
) -> Result<()> {
    let list = locate(r, t, roles::TAB_LIST, label).await?;
    t.explain("The tab list is visible");
    t.is_true(r.is_visible(&list))?;
    t.explain("The tab list is labelled");
    t.non_blank(r.get_accessible_name(&list).as_deref())?;

    let tabs = r.find_all(&list, &SearchPredicate::role(roles::TAB))?;
    t.explain("The tab list has tabs");
    t.not_empty(&tabs)?;

    for (i, tab) in tabs.iter().enumerate() {
        let name = tab.name().unwrap_or_default();
        r.do_default(tab).await?;
        t.explain(format!("Choosing \"{}\" selects only that tab", name));
        t.equal(selected(&tabs), vec![i])?;
        t.explain(format!("\"{}\" controls exactly one panel", name));
        let panel = t.succeeds(r.get_single_control(tab))?;
        t.explain(format!("The panel of \"{}\" is visible", name));
        t.is_true(r.is_visible(&panel))?;
    }

    let n = tabs.len();
    r.do_default(&tabs[0]).await?;
    let mut pos = 0;
    for _ in 0..n {
        pos = (pos + 1) % n;
        move_to(r, t, &tabs, SpecialKey::Right, pos, manual).await?;
    }
    for _ in 0..n {
        pos = (pos + n - 1) % n;
        move_to(r, t, &tabs, SpecialKey::Left, pos, manual).await?;
    }
    move_to(r, t, &tabs, SpecialKey::End, n - 1, manual).await?;
    move_to(r, t, &tabs, SpecialKey::Home, 0, manual).await
}
