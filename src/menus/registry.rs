//! Registry of menu contributions and their context-filtered resolution.

use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::commands::CommandRegistry;
use crate::context::ContextView;

use super::types::{
    MenuId, MenuItem, MenuResolveOptions, ResolvedCommandItem, ResolvedMenuItem, ResolvedSubmenu,
    NAVIGATION_GROUP,
};

/// Receipt for one `register_items` call; pass to
/// [`MenuRegistry::unregister`] to remove exactly the entries it added.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuRegistration {
    pub menu_id: MenuId,
    pub(crate) seqs: Vec<u64>,
}

#[derive(Clone, Debug)]
struct Entry {
    item: MenuItem,
    seq: u64,
}

struct Inner {
    menus: HashMap<MenuId, Vec<Entry>>,
    next_seq: u64,
}

/// Menu registry owned by one application instance.
pub struct MenuRegistry {
    inner: RwLock<Inner>,
}

impl Default for MenuRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MenuRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                menus: HashMap::new(),
                next_seq: 0,
            }),
        }
    }

    /// Contribute items to a menu. Each item receives a monotonically
    /// increasing sequence number, the final tie-break for ordering.
    pub fn register_items(
        &self,
        menu_id: impl Into<MenuId>,
        items: impl IntoIterator<Item = MenuItem>,
    ) -> MenuRegistration {
        let menu_id = menu_id.into();
        let mut inner = self.inner.write();
        let mut seqs = Vec::new();
        for item in items {
            let seq = inner.next_seq;
            inner.next_seq += 1;
            seqs.push(seq);
            inner
                .menus
                .entry(menu_id.clone())
                .or_default()
                .push(Entry { item, seq });
        }
        debug!(menu = %menu_id, count = seqs.len(), "registered menu items");
        MenuRegistration { menu_id, seqs }
    }

    /// Remove every registered entry equal to any of `items`. Idempotent:
    /// absent items are ignored.
    pub fn unregister_items(&self, menu_id: &str, items: &[MenuItem]) {
        let mut inner = self.inner.write();
        let now_empty = match inner.menus.get_mut(menu_id) {
            Some(entries) => {
                entries.retain(|entry| !items.contains(&entry.item));
                entries.is_empty()
            }
            None => false,
        };
        if now_empty {
            inner.menus.remove(menu_id);
        }
    }

    /// Remove exactly the entries added by one `register_items` call.
    pub fn unregister(&self, registration: &MenuRegistration) {
        let mut inner = self.inner.write();
        let now_empty = match inner.menus.get_mut(&registration.menu_id) {
            Some(entries) => {
                entries.retain(|entry| !registration.seqs.contains(&entry.seq));
                entries.is_empty()
            }
            None => false,
        };
        if now_empty {
            inner.menus.remove(&registration.menu_id);
        }
    }

    /// Ids of all menus with at least one contribution.
    pub fn menu_ids(&self) -> Vec<MenuId> {
        let mut ids: Vec<MenuId> = self.inner.read().menus.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Unfiltered items of a menu, in registration order.
    pub fn raw_items(&self, menu_id: &str) -> Vec<MenuItem> {
        self.inner
            .read()
            .menus
            .get(menu_id)
            .map(|entries| entries.iter().map(|e| e.item.clone()).collect())
            .unwrap_or_default()
    }

    /// Resolve a menu for display under `ctx`: filter by `when`, sort by the
    /// stable (group, order, sequence) rule, recurse into submenus.
    ///
    /// Command items whose id is not registered in `commands` are omitted
    /// (the dangling-reference policy after `unregister`).
    pub fn resolve(
        &self,
        menu_id: &str,
        ctx: &dyn ContextView,
        commands: &CommandRegistry,
    ) -> Vec<ResolvedMenuItem> {
        self.resolve_with(menu_id, ctx, commands, MenuResolveOptions::default())
    }

    pub fn resolve_with(
        &self,
        menu_id: &str,
        ctx: &dyn ContextView,
        commands: &CommandRegistry,
        options: MenuResolveOptions,
    ) -> Vec<ResolvedMenuItem> {
        let mut stack = Vec::new();
        self.resolve_inner(menu_id, ctx, commands, options, &mut stack)
    }

    fn resolve_inner(
        &self,
        menu_id: &str,
        ctx: &dyn ContextView,
        commands: &CommandRegistry,
        options: MenuResolveOptions,
        stack: &mut Vec<MenuId>,
    ) -> Vec<ResolvedMenuItem> {
        // Copy out under the read lock, then resolve lock-free so submenu
        // recursion never holds the lock across expression evaluation.
        let mut entries: Vec<Entry> = {
            let inner = self.inner.read();
            match inner.menus.get(menu_id) {
                Some(entries) => entries.clone(),
                None => return Vec::new(),
            }
        };

        entries.sort_by(|a, b| {
            group_rank(a.item.group())
                .cmp(&group_rank(b.item.group()))
                .then_with(|| a.item.group().unwrap_or("").cmp(b.item.group().unwrap_or("")))
                .then_with(|| {
                    a.item
                        .order()
                        .unwrap_or(0.0)
                        .total_cmp(&b.item.order().unwrap_or(0.0))
                })
                .then_with(|| a.seq.cmp(&b.seq))
        });

        let mut resolved = Vec::new();
        for entry in entries {
            if let Some(when) = entry.item.when() {
                if !when.eval(ctx) {
                    continue;
                }
            }
            match entry.item {
                MenuItem::Command(item) => {
                    let Some(rule) = commands.get(&item.command_id) else {
                        debug!(menu = %menu_id, command = %item.command_id, "omitting dangling command reference");
                        continue;
                    };
                    let enabled = rule
                        .enablement
                        .as_ref()
                        .map(|when| when.eval(ctx))
                        .unwrap_or(true);
                    resolved.push(ResolvedMenuItem::Command(ResolvedCommandItem {
                        command: rule,
                        enabled,
                    }));
                }
                MenuItem::Submenu(item) => {
                    if stack.iter().any(|id| id == &item.submenu) {
                        warn!(menu = %menu_id, submenu = %item.submenu, "skipping cyclic submenu reference");
                        continue;
                    }
                    stack.push(item.submenu.clone());
                    let items =
                        self.resolve_inner(&item.submenu, ctx, commands, options, stack);
                    stack.pop();
                    if items.is_empty() && options.prune_empty_submenus {
                        continue;
                    }
                    resolved.push(ResolvedMenuItem::Submenu(ResolvedSubmenu {
                        submenu: item.submenu,
                        title: item.title,
                        icon: item.icon,
                        items,
                    }));
                }
            }
        }
        resolved
    }
}

/// `"navigation"` first, then named groups, then ungrouped items.
fn group_rank(group: Option<&str>) -> u8 {
    match group {
        Some(NAVIGATION_GROUP) => 0,
        Some(_) => 1,
        None => 2,
    }
}
