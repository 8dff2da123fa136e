//! Role vocabulary
//!
//! Roles use the browser automation naming (`menuItem`, `listBox`,
//! `popUpButton`, ...). Backends that start from ARIA or HTML map into this
//! vocabulary with [`from_aria`] and [`implicit_for_tag`].

pub const ROOT_WEB_AREA: &str = "rootWebArea";
pub const GENERIC: &str = "genericContainer";

pub const ALERT: &str = "alert";
pub const ALERT_DIALOG: &str = "alertDialog";
pub const ARTICLE: &str = "article";
pub const BUTTON: &str = "button";
pub const CELL: &str = "cell";
pub const CHECK_BOX: &str = "checkBox";
pub const COLUMN_HEADER: &str = "columnHeader";
pub const DIALOG: &str = "dialog";
pub const FEED: &str = "feed";
pub const GRID: &str = "grid";
pub const GROUP: &str = "group";
pub const HEADING: &str = "heading";
pub const LINK: &str = "link";
pub const LIST: &str = "list";
pub const LIST_BOX: &str = "listBox";
pub const LIST_BOX_OPTION: &str = "listBoxOption";
pub const LIST_ITEM: &str = "listItem";
pub const MAIN: &str = "main";
pub const MENU: &str = "menu";
pub const MENU_BAR: &str = "menuBar";
pub const MENU_ITEM: &str = "menuItem";
pub const NAVIGATION: &str = "navigation";
pub const POP_UP_BUTTON: &str = "popUpButton";
pub const RADIO_BUTTON: &str = "radioButton";
pub const RADIO_GROUP: &str = "radioGroup";
pub const REGION: &str = "region";
pub const ROW: &str = "row";
pub const ROW_HEADER: &str = "rowHeader";
pub const SLIDER: &str = "slider";
pub const STATIC_TEXT: &str = "staticText";
pub const TAB: &str = "tab";
pub const TAB_LIST: &str = "tabList";
pub const TAB_PANEL: &str = "tabPanel";
pub const TABLE: &str = "table";
pub const TEXT_FIELD: &str = "textField";
pub const TOGGLE_BUTTON: &str = "toggleButton";
pub const TOOLBAR: &str = "toolbar";

/// Map an ARIA `role` attribute value to the automation role name.
///
/// Unknown roles pass through unchanged so that callers can still search for
/// them by their literal name.
pub fn from_aria(aria: &str) -> &str {
    match aria {
        "alert" => ALERT,
        "alertdialog" => ALERT_DIALOG,
        "article" => ARTICLE,
        "button" => BUTTON,
        "cell" | "gridcell" => CELL,
        "checkbox" => CHECK_BOX,
        "columnheader" => COLUMN_HEADER,
        "dialog" => DIALOG,
        "feed" => FEED,
        "grid" => GRID,
        "group" => GROUP,
        "heading" => HEADING,
        "link" => LINK,
        "list" => LIST,
        "listbox" => LIST_BOX,
        "listitem" => LIST_ITEM,
        "main" => MAIN,
        "menu" => MENU,
        "menubar" => MENU_BAR,
        "menuitem" | "menuitemcheckbox" | "menuitemradio" => MENU_ITEM,
        "navigation" => NAVIGATION,
        "option" => LIST_BOX_OPTION,
        "radio" => RADIO_BUTTON,
        "radiogroup" => RADIO_GROUP,
        "region" => REGION,
        "row" => ROW,
        "rowheader" => ROW_HEADER,
        "slider" => SLIDER,
        "tab" => TAB,
        "table" => TABLE,
        "tablist" => TAB_LIST,
        "tabpanel" => TAB_PANEL,
        "textbox" | "searchbox" => TEXT_FIELD,
        "toolbar" => TOOLBAR,
        "none" | "presentation" | "generic" => GENERIC,
        other => other,
    }
}

/// Implicit role of an HTML element when no `role` attribute is present.
///
/// `input_type` is the lower-cased `type` attribute of `<input>` elements,
/// `has_href` reports whether an `<a>` carries an `href`.
pub fn implicit_for_tag(tag: &str, input_type: Option<&str>, has_href: bool) -> Option<&'static str> {
    let role = match tag {
        "a" if has_href => LINK,
        "article" => ARTICLE,
        "button" => BUTTON,
        "dialog" => DIALOG,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => HEADING,
        "input" => match input_type.unwrap_or("text") {
            "checkbox" => CHECK_BOX,
            "radio" => RADIO_BUTTON,
            "range" => SLIDER,
            "button" | "submit" | "reset" => BUTTON,
            "hidden" => return None,
            _ => TEXT_FIELD,
        },
        "main" => MAIN,
        "nav" => NAVIGATION,
        "ol" | "ul" => LIST,
        "li" => LIST_ITEM,
        "section" => REGION,
        "select" => LIST_BOX,
        "option" => LIST_BOX_OPTION,
        "table" => TABLE,
        "textarea" => TEXT_FIELD,
        "td" => CELL,
        "th" => COLUMN_HEADER,
        "tr" => ROW,
        _ => return None,
    };
    Some(role)
}
