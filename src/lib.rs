//! action-kit - a declarative extension model for host applications.
//!
//! Hosts expose **commands** (named, invokable actions), **menus** (ordered
//! groupings of commands and submenus), and **keybindings** (chord to
//! command), all gated by **when-clauses** evaluated against a live context
//! describing current application state.
//!
//! ```rust
//! use action_kit::{Action, Application, KeybindingRule, MenuRule, WhenClause};
//! use action_kit::commands::CommandArgs;
//!
//! let app = Application::new("demo");
//! app.register_action(
//!     Action::new("edit.copy", "Copy", |_: &CommandArgs| -> anyhow::Result<serde_json::Value> {
//!         Ok(serde_json::json!("copied"))
//!     })
//!     .with_enablement(WhenClause::parse("hasSelection").unwrap())
//!     .add_menu(MenuRule::new("edit").with_group("1_cutcopypaste"))
//!     .add_keybinding(KeybindingRule::new("", "ctrl+c")),
//! )
//! .unwrap();
//!
//! app.context().set("hasSelection", true);
//! assert!(app.is_command_enabled("edit.copy"));
//! ```

pub mod app;
pub mod commands;
pub mod context;
pub mod error;
pub mod expression;
pub mod keybindings;
pub mod logging;
pub mod menus;

pub use app::{Action, ActionRegistration, Application, MenuRule};
pub use commands::{CommandRegistry, CommandRule, Invocable};
pub use context::{ContextStore, ContextValue, ContextView};
pub use error::{ActionKitError, Result};
pub use expression::{Expr, ParseError, WhenClause};
pub use keybindings::{BindingSource, KeyChord, KeybindingRegistry, KeybindingRule};
pub use menus::{MenuItem, MenuRegistry, ResolvedMenuItem};
