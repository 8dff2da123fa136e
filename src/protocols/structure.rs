use super::{locate, predicate, press_to};
use crate::driver::{Driver, SpecialKey};
use crate::reader::{NodeHandle, ScreenReader};
use crate::tap::TapWriter;
use crate::tree::{roles, SearchPredicate};
use crate::Result;

pub(super) async fn breadcrumb<D: Driver>(r: &ScreenReader<D>, t: &mut TapWriter, label: &str) -> Result<()> {
    let nav = locate(r, t, roles::NAVIGATION, label).await?;
    t.explain("The breadcrumb holds a list");
    let list = t.succeeds(r.get_child(&nav, roles::LIST))?;
    t.explain("The list holds only list items");
    let items = t.succeeds(r.get_children(&list, roles::LIST_ITEM))?;
    t.explain("The trail is not empty");
    t.not_empty(&items)?;

    let mut links = Vec::with_capacity(items.len());
    for item in &items {
        links.push(r.find(item, &SearchPredicate::role(roles::LINK))?);
    }
    t.explain("Every item holds a link");
    t.is_true(links.iter().all(|l| !l.is_empty()))?;
    t.explain("Links have unique labels");
    t.succeeds(r.expect_unique_labels(&links))?;

    let current: Vec<usize> = links
        .iter()
        .enumerate()
        .filter(|(_, l)| r.get_attribute_value(l, "aria-current") == "page")
        .map(|(i, _)| i)
        .collect();
    t.explain("Only the last link marks the current page");
    t.equal(current, vec![links.len() - 1])?;

    let before = r.get_page_url().await?;
    r.do_default_slow(&links[links.len() - 1]).await?;
    t.explain("The current page link leads to the same page");
    t.equal(r.get_page_url().await?, before)
}

pub(super) async fn feed<D: Driver>(r: &ScreenReader<D>, t: &mut TapWriter, label: &str) -> Result<()> {
    let feed = locate(r, t, roles::FEED, label).await?;
    t.explain("The feed is visible");
    t.is_true(r.is_visible(&feed))?;

    let articles = r.find_all(&feed, &SearchPredicate::role(roles::ARTICLE))?;
    t.explain("The feed has articles");
    t.not_empty(&articles)?;
    let total = articles.len().to_string();
    for (i, article) in articles.iter().enumerate() {
        t.explain(format!("Article {} is labelled and focusable", i + 1));
        t.is_true(
            r.get_accessible_name(article).is_some_and(|n| !n.is_empty()) && r.is_focusable(article),
        )?;
        t.explain(format!("Article {} reports its position in the set", i + 1));
        t.equal(
            (article.attribute("aria-posinset"), article.attribute("aria-setsize")),
            (Some((i + 1).to_string()), Some(total.clone())),
        )?;
    }

    if articles.len() > 1 {
        r.focus(&articles[0]).await?;
        press_to(r, SpecialKey::PageDown.into(), &articles[1]).await?;
        t.explain("Page Down moves to the next article");
        t.is_true(articles[1].is_focused())?;
        press_to(r, SpecialKey::PageUp.into(), &articles[0]).await?;
        t.explain("Page Up moves to the previous article");
        t.is_true(articles[0].is_focused())?;
    }
    Ok(())
}

pub(super) async fn table<D: Driver>(r: &ScreenReader<D>, t: &mut TapWriter, label: &str) -> Result<()> {
    let table = locate(r, t, roles::TABLE, label).await?;
    t.explain("The table is visible");
    t.is_true(r.is_visible(&table))?;
    t.explain("The table is labelled");
    t.non_blank(r.get_accessible_name(&table).as_deref())?;

    let rows = r.find_all(&table, &SearchPredicate::role(roles::ROW))?;
    t.explain("The table has rows");
    t.not_empty(&rows)?;

    let mut headers = r.find_all(&table, &SearchPredicate::role(roles::COLUMN_HEADER))?;
    headers.extend(r.find_all(&table, &SearchPredicate::role(roles::ROW_HEADER))?);
    t.explain("The table has row or column headers");
    t.not_empty(&headers)
}

pub(super) async fn page_region_labels<D: Driver>(r: &ScreenReader<D>, t: &mut TapWriter) -> Result<()> {
    let navigations = r
        .find_all_in_page(&SearchPredicate::role(roles::NAVIGATION))
        .await?;
    t.explain("Navigation landmarks have unique labels");
    t.succeeds(r.expect_unique_labels(&navigations))?;
    let regions = r.find_all_in_page(&SearchPredicate::role(roles::REGION)).await?;
    t.explain("Regions have unique labels");
    t.succeeds(r.expect_unique_labels(&regions))
}

/// Open the site menu and follow one of its links
pub(super) async fn navigation_menu<D: Driver>(
    r: &ScreenReader<D>,
    t: &mut TapWriter,
    navigation: &str,
    toggle: &str,
    link: &str,
) -> Result<()> {
    let nav = locate(r, t, roles::NAVIGATION, navigation).await?;
    let button: NodeHandle = r.next(&nav, &predicate(roles::BUTTON, toggle)?)?;
    t.explain(format!("The navigation has a \"{}\" button", toggle));
    t.is_false(button.is_empty())?;
    t.explain("The navigation menu is initially closed");
    t.is_false(r.is_expanded(&button))?;

    r.do_default(&button).await?;
    r.wait_for_expanded(&button).await?;
    t.explain("The button opens the navigation menu");
    t.is_true(r.is_expanded(&button))?;

    let target = r.next(&nav, &predicate(roles::LINK, link)?)?;
    let name = target.name().unwrap_or_default();
    t.explain(format!("Link \"{}\" is visible and focusable", name));
    t.is_true(r.is_visible(&target) && r.is_focusable(&target))?;

    r.do_default_slow(&target).await?;
    t.explain(format!("Following \"{}\" opens that page", name));
    t.equal(r.get_page_title().await?, Some(name))
}
