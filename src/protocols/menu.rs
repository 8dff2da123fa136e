use super::{expanded_attr, index_of, locate, press, press_to, ItemTracking};
use crate::driver::{Driver, KeyInput, SpecialKey};
use crate::reader::{NodeHandle, ScreenReader};
use crate::tap::TapWriter;
use crate::tree::{roles, SearchPredicate};
use crate::Result;

struct Menu<'a, D: Driver> {
    r: &'a ScreenReader<D>,
    button: NodeHandle,
    menu: NodeHandle,
    items: Vec<NodeHandle>,
    tracking: ItemTracking,
}

impl<D: Driver> Menu<'_, D> {
    fn selected(&self) -> Result<Option<usize>> {
        match self.tracking {
            ItemTracking::Focus => self.r.get_selected_menu_index(&self.menu),
            ItemTracking::ActiveDescendant => Ok(index_of(
                &self.items,
                &self.r.get_active_descendant(&self.menu),
            )),
        }
    }

    /// Press `key` inside the open menu and check the item it lands on
    async fn step(&self, t: &mut TapWriter, key: KeyInput, expected: usize, label: &str) -> Result<()> {
        match self.tracking {
            ItemTracking::Focus => press_to(self.r, key, &self.items[expected]).await?,
            ItemTracking::ActiveDescendant => {
                press(self.r, key).await?;
                self.r.wait_for_interaction(false).await;
            }
        }
        t.explain(label);
        t.equal(self.selected()?, Some(expected))
    }

    async fn close(&self, t: &mut TapWriter, label: &str) -> Result<()> {
        self.r.send_special_key(SpecialKey::Escape).await?;
        self.r.wait_for_collapsed(&self.button).await?;
        t.explain(label);
        t.equal(expanded_attr(self.r, &self.button).as_str(), "false")
    }

    async fn open_with(&self, t: &mut TapWriter, key: SpecialKey, expected: usize) -> Result<()> {
        self.r.send_special_key(key).await?;
        self.r.wait_for_expanded(&self.button).await?;
        t.explain(format!("{:?} on the button opens the menu", key));
        t.equal(expanded_attr(self.r, &self.button).as_str(), "true")?;
        t.explain("The open menu is visible");
        t.is_true(self.r.is_visible(&self.menu))?;
        t.explain(format!("Opening with {:?} selects item {}", key, expected));
        t.equal(self.selected()?, Some(expected))
    }
}

/// Menu button whose menu holds actions
pub(super) async fn menu_button<D: Driver>(
    r: &ScreenReader<D>,
    t: &mut TapWriter,
    label: &str,
    tracking: ItemTracking,
    search: bool,
) -> Result<()> {
    let button = locate(r, t, roles::POP_UP_BUTTON, label).await?;
    r.focus(&button).await?;
    t.explain("The menu is initially closed");
    t.equal(expanded_attr(r, &button).as_str(), "false")?;

    r.do_default_slow(&button).await?;
    r.wait_for_expanded(&button).await?;
    t.explain("Activating the button opens the menu");
    t.equal(expanded_attr(r, &button).as_str(), "true")?;

    t.explain("The button controls exactly one menu");
    let menu = t.succeeds(r.get_single_control(&button))?;
    t.explain("The menu is visible");
    t.is_true(r.is_visible(&menu))?;
    t.explain("The controlled node is a menu");
    t.equal(r.get_role(&menu).as_deref(), Some(roles::MENU))?;

    let items = r.find_all(&menu, &SearchPredicate::role(roles::MENU_ITEM))?;
    t.explain("The menu has items");
    t.not_empty(&items)?;
    t.explain("Menu items have unique labels");
    t.succeeds(r.expect_unique_labels(&items))?;

    let m = Menu {
        r,
        button,
        menu,
        items,
        tracking,
    };
    let last = m.items.len() - 1;
    if tracking == ItemTracking::Focus {
        t.explain("Menu items are labelled and focusable");
        t.succeeds(r.get_selected_menu_index(&m.menu))?;
    }
    t.explain("Opening the menu selects the first item");
    t.equal(m.selected()?, Some(0))?;

    for i in 1..=last {
        m.step(t, SpecialKey::Down.into(), i, "Down arrow selects the next item").await?;
    }
    for i in (0..last).rev() {
        m.step(t, SpecialKey::Up.into(), i, "Up arrow selects the previous item").await?;
    }
    m.step(t, SpecialKey::Up.into(), last, "Up arrow on the first item wraps to the last")
        .await?;
    m.step(t, SpecialKey::Down.into(), 0, "Down arrow on the last item wraps to the first")
        .await?;
    m.step(t, SpecialKey::End.into(), last, "End selects the last item").await?;
    m.step(t, SpecialKey::Home.into(), 0, "Home selects the first item").await?;

    m.close(t, "Escape closes the menu").await?;
    t.explain("Focus returns to the menu button");
    t.is_true(m.button.is_focused())?;

    for key in [SpecialKey::Space, SpecialKey::Enter, SpecialKey::Down] {
        m.open_with(t, key, 0).await?;
        m.close(t, "Escape closes the menu").await?;
    }

    r.send_special_key(SpecialKey::Escape).await?;
    t.explain("Escape on a closed menu keeps it closed");
    t.equal(expanded_attr(r, &m.button).as_str(), "false")?;

    m.open_with(t, SpecialKey::Up, last).await?;

    if search && m.items.len() > 1 {
        for target in [0, 1] {
            let Some(initial) = m.items[target].name().and_then(|n| n.chars().next()) else {
                continue;
            };
            let label = format!("Typing \"{}\" selects the next matching item", initial);
            m.step(t, KeyInput::Char(initial), target, &label).await?;
        }
    }

    m.close(t, "The menu ends closed").await
}
