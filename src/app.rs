//! The application instance: one object owning a context store and the
//! command/menu/keybinding registries, plus the dispatcher surface that
//! composes them.
//!
//! There are no process-wide singletons. Hosts (and tests) create as many
//! [`Application`]s as they like; instances share nothing.

use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::commands::{CommandArgs, CommandRegistry, CommandRegistration, CommandRule, Invocable};
use crate::context::ContextStore;
use crate::error::Result;
use crate::expression::WhenClause;
use crate::keybindings::{KeyChord, KeybindingRegistration, KeybindingRegistry, KeybindingRule};
use crate::menus::{
    CommandMenuItem, MenuId, MenuItem, MenuRegistration, MenuRegistry, MenuResolveOptions,
    ResolvedMenuItem,
};

/// Placement of an action's menu entry: which menu, and where in it.
#[derive(Clone, Debug, PartialEq)]
pub struct MenuRule {
    pub menu_id: MenuId,
    pub when: Option<WhenClause>,
    pub group: Option<String>,
    pub order: Option<f64>,
}

impl MenuRule {
    pub fn new(menu_id: impl Into<MenuId>) -> Self {
        Self {
            menu_id: menu_id.into(),
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

/// The complete representation of a command: metadata, handler, and any menu
/// placements and keybindings, registered in one step via
/// [`Application::register_action`].
pub struct Action {
    pub command: CommandRule,
    pub handler: Arc<dyn Invocable>,
    pub menus: Vec<MenuRule>,
    pub keybindings: Vec<KeybindingRule>,
}

impl Action {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        handler: impl Invocable + 'static,
    ) -> Self {
        Self {
            command: CommandRule::new(id, title),
            handler: Arc::new(handler),
            menus: Vec::new(),
            keybindings: Vec::new(),
        }
    }

    pub fn with_command(mut self, command: CommandRule) -> Self {
        self.command = command;
        self
    }

    pub fn with_enablement(mut self, when: WhenClause) -> Self {
        self.command.enablement = Some(when);
        self
    }

    pub fn add_menu(mut self, rule: MenuRule) -> Self {
        self.menus.push(rule);
        self
    }

    /// Add a keybinding. The rule's `command_id` is overwritten with this
    /// action's command id at registration.
    pub fn add_keybinding(mut self, rule: KeybindingRule) -> Self {
        self.keybindings.push(rule);
        self
    }
}

/// Receipt for a registered action; undoes every registration it made.
#[derive(Debug)]
pub struct ActionRegistration {
    pub command: CommandRegistration,
    pub menus: Vec<MenuRegistration>,
    pub keybindings: Vec<KeybindingRegistration>,
}

/// One application instance: context store plus the three registries, and
/// the dispatcher surface over them.
pub struct Application {
    name: String,
    context: ContextStore,
    commands: CommandRegistry,
    menus: MenuRegistry,
    keybindings: KeybindingRegistry,
}

impl Application {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        info!(app = %name, "created application instance");
        Self {
            name,
            context: ContextStore::new(),
            commands: CommandRegistry::new(),
            menus: MenuRegistry::new(),
            keybindings: KeybindingRegistry::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn context(&self) -> &ContextStore {
        &self.context
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn menus(&self) -> &MenuRegistry {
        &self.menus
    }

    pub fn keybindings(&self) -> &KeybindingRegistry {
        &self.keybindings
    }

    /// Register an action's command, menu placements, and keybindings in one
    /// step. Nothing is left half-registered on failure: the command slot is
    /// taken first and rolled back if a keybinding fails to parse.
    pub fn register_action(&self, action: Action) -> Result<ActionRegistration> {
        let command_id = action.command.id.clone();
        let command = self.commands.register(action.command, action.handler)?;

        let mut menus = Vec::new();
        for rule in action.menus {
            let mut item = CommandMenuItem::new(command_id.clone());
            item.when = rule.when;
            item.group = rule.group;
            item.order = rule.order;
            menus.push(
                self.menus
                    .register_items(rule.menu_id, vec![MenuItem::Command(item)]),
            );
        }

        let mut keybindings = Vec::new();
        for mut rule in action.keybindings {
            rule.command_id = command_id.clone();
            match self.keybindings.register(rule) {
                Ok(registration) => keybindings.push(registration),
                Err(err) => {
                    // Roll back everything this call added.
                    for registration in &keybindings {
                        self.keybindings.unregister(registration);
                    }
                    for registration in &menus {
                        self.menus.unregister(registration);
                    }
                    self.commands.unregister(&command_id);
                    return Err(err);
                }
            }
        }

        Ok(ActionRegistration { command, menus, keybindings })
    }

    /// Undo everything a [`register_action`](Application::register_action)
    /// call added. Idempotent.
    pub fn unregister_action(&self, registration: &ActionRegistration) {
        for kb in &registration.keybindings {
            self.keybindings.unregister(kb);
        }
        for menu in &registration.menus {
            self.menus.unregister(menu);
        }
        self.commands.unregister(&registration.command.id);
    }

    // ------------------------------------------------------------------
    // Dispatcher surface: each call takes one context snapshot and
    // delegates. No state lives here.
    // ------------------------------------------------------------------

    /// The currently visible items of a menu.
    pub fn visible_menu(&self, menu_id: &str) -> Vec<ResolvedMenuItem> {
        self.menus
            .resolve(menu_id, &self.context.snapshot(), &self.commands)
    }

    pub fn visible_menu_with(
        &self,
        menu_id: &str,
        options: MenuResolveOptions,
    ) -> Vec<ResolvedMenuItem> {
        self.menus
            .resolve_with(menu_id, &self.context.snapshot(), &self.commands, options)
    }

    /// The command the given chord would trigger right now, if any.
    pub fn active_binding(&self, chord: &KeyChord) -> Option<String> {
        self.keybindings
            .resolve(chord, &self.context.snapshot(), &self.commands)
    }

    /// Whether a command is enabled under the current context.
    pub fn is_command_enabled(&self, id: &str) -> bool {
        self.commands.is_enabled(id, &self.context.snapshot())
    }

    /// Execute a command without an enablement check.
    pub fn execute_command(&self, id: &str, args: &CommandArgs) -> Result<Value> {
        self.commands.execute(id, args)
    }

    /// Execute a command, first checking its enablement against the current
    /// context.
    pub fn execute_command_checked(&self, id: &str, args: &CommandArgs) -> Result<Value> {
        self.commands
            .execute_checked(id, args, &self.context.snapshot())
    }
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
