//! Menu item shapes and the resolved (context-filtered) forms.

use serde::{Deserialize, Serialize};

use crate::commands::{CommandRule, Icon};
use crate::expression::WhenClause;

/// Identifier of a menu (a named contribution surface, e.g. `"edit"` or
/// `"view/panel.title"`).
pub type MenuId = String;

/// The group that always sorts to the top of a menu, regardless of name.
pub const NAVIGATION_GROUP: &str = "navigation";

/// An entry contributed to a menu: either a command reference or a nested
/// submenu reference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MenuItem {
    Command(CommandMenuItem),
    Submenu(SubmenuItem),
}

impl MenuItem {
    pub fn command(command_id: impl Into<String>) -> Self {
        MenuItem::Command(CommandMenuItem::new(command_id))
    }

    pub fn submenu(submenu: impl Into<MenuId>, title: impl Into<String>) -> Self {
        MenuItem::Submenu(SubmenuItem::new(submenu, title))
    }

    pub fn when(&self) -> Option<&WhenClause> {
        match self {
            MenuItem::Command(item) => item.when.as_ref(),
            MenuItem::Submenu(item) => item.when.as_ref(),
        }
    }

    pub fn group(&self) -> Option<&str> {
        match self {
            MenuItem::Command(item) => item.group.as_deref(),
            MenuItem::Submenu(item) => item.group.as_deref(),
        }
    }

    pub fn order(&self) -> Option<f64> {
        match self {
            MenuItem::Command(item) => item.order,
            MenuItem::Submenu(item) => item.order,
        }
    }
}

/// A menu entry that triggers a command when selected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommandMenuItem {
    /// Id of the command to trigger; the title/icon shown come from the
    /// command's own rule.
    pub command_id: String,
    /// Condition for the item to be shown. Absent means always shown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<WhenClause>,
    /// Sortable group name for visual clustering; `"navigation"` always
    /// sorts first, ungrouped items last.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Order within the group; ties fall back to registration sequence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
}

impl CommandMenuItem {
    pub fn new(command_id: impl Into<String>) -> Self {
        Self {
            command_id: command_id.into(),
            when: None,
            group: None,
            order: None,
        }
    }

    pub fn with_when(mut self, when: WhenClause) -> Self {
        self.when = Some(when);
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_order(mut self, order: f64) -> Self {
        self.order = Some(order);
        self
    }
}

/// A menu entry that opens another menu as a submenu.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubmenuItem {
    /// Menu to insert as a submenu.
    pub submenu: MenuId,
    /// Title shown for the submenu entry.
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<WhenClause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
}

impl SubmenuItem {
    pub fn new(submenu: impl Into<MenuId>, title: impl Into<String>) -> Self {
        Self {
            submenu: submenu.into(),
            title: title.into(),
            icon: None,
            when: None,
            group: None,
            order: None,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<Icon>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_when(mut self, when: WhenClause) -> Self {
        self.when = Some(when);
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_order(mut self, order: f64) -> Self {
        self.order = Some(order);
        self
    }
}

/// Options for menu resolution.
#[derive(Clone, Copy, Debug, Default)]
pub struct MenuResolveOptions {
    /// Drop submenu entries whose resolved contents are empty. Off by
    /// default: hosts usually render empty submenus grayed out.
    pub prune_empty_submenus: bool,
}

/// A menu item after context filtering, ready for display.
#[derive(Clone, Debug, PartialEq)]
pub enum ResolvedMenuItem {
    Command(ResolvedCommandItem),
    Submenu(ResolvedSubmenu),
}

/// A visible command entry. `enabled` is the command's enablement clause
/// evaluated against the same context snapshot (`true` when absent).
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedCommandItem {
    pub command: CommandRule,
    pub enabled: bool,
}

/// A visible submenu entry with its own resolved contents.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedSubmenu {
    pub submenu: MenuId,
    pub title: String,
    pub icon: Option<Icon>,
    pub items: Vec<ResolvedMenuItem>,
}
