use super::{locate, press, press_to, ItemTracking};
use crate::driver::{Driver, SpecialKey};
use crate::reader::{NodeHandle, ScreenReader};
use crate::tap::TapWriter;
use crate::tree::{roles, SearchPredicate};
use crate::Result;

struct Group<'a, D: Driver> {
    r: &'a ScreenReader<D>,
    group: NodeHandle,
    options: Vec<NodeHandle>,
    tracking: ItemTracking,
}

impl<D: Driver> Group<'_, D> {
    fn checked(&self) -> Vec<usize> {
        self.options
            .iter()
            .enumerate()
            .filter(|(_, o)| self.r.get_checked(o) == "true")
            .map(|(i, _)| i)
            .collect()
    }

    async fn step(&self, t: &mut TapWriter, key: SpecialKey, expected: usize) -> Result<()> {
        match self.tracking {
            ItemTracking::Focus => press_to(self.r, key.into(), &self.options[expected]).await?,
            ItemTracking::ActiveDescendant => {
                press(self.r, key.into()).await?;
                self.r.wait_for_interaction(false).await;
            }
        }
        t.explain(format!("{:?} checks option {} and only that option", key, expected + 1));
        t.equal(self.checked(), vec![expected])?;
        if self.tracking == ItemTracking::ActiveDescendant {
            t.explain("The active descendant is the checked option");
            t.equal(self.r.get_active_descendant(&self.group), self.options[expected].clone())?;
        }
        Ok(())
    }
}

pub(super) async fn radio_group<D: Driver>(
    r: &ScreenReader<D>,
    t: &mut TapWriter,
    label: &str,
    tracking: ItemTracking,
) -> Result<()> {
    let group = locate(r, t, roles::RADIO_GROUP, label).await?;
    let options = r.find_all(&group, &SearchPredicate::role(roles::RADIO_BUTTON))?;
    t.explain("The radio group has options");
    t.not_empty(&options)?;

    let g = Group {
        r,
        group,
        options,
        tracking,
    };
    if g.checked().is_empty() {
        match tracking {
            ItemTracking::Focus => {
                r.focus(&g.options[0]).await?;
                r.send_special_key(SpecialKey::Enter).await?;
            }
            ItemTracking::ActiveDescendant => {
                r.focus(&g.group).await?;
                r.send_special_key(SpecialKey::Space).await?;
            }
        }
    }
    t.explain("Exactly one option is checked");
    t.equal(g.checked().len(), 1)?;

    // Start from the first option.
    let n = g.options.len();
    let start = g.checked()[0];
    match tracking {
        ItemTracking::Focus => r.focus(&g.options[start]).await?,
        ItemTracking::ActiveDescendant => r.focus(&g.group).await?,
    }
    for _ in 0..(n - start) % n {
        let next = (g.checked()[0] + 1) % n;
        g.step(t, SpecialKey::Right, next).await?;
    }

    for i in 1..n {
        g.step(t, SpecialKey::Right, i).await?;
    }
    g.step(t, SpecialKey::Right, 0).await?;
    g.step(t, SpecialKey::Left, n - 1).await?;
    for i in (0..n - 1).rev() {
        g.step(t, SpecialKey::Left, i).await?;
    }
    for i in 1..n {
        g.step(t, SpecialKey::Down, i).await?;
    }
    for i in (0..n - 1).rev() {
        g.step(t, SpecialKey::Up, i).await?;
    }
    Ok(())
}
