//! Command metadata and the handler capability interface.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::expression::WhenClause;

/// Icon for a command or submenu, with optional light/dark variants. If only
/// one variant is provided it is used for both themes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Icon {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dark: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light: Option<String>,
}

impl Icon {
    pub fn new(code: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            dark: Some(code.clone()),
            light: Some(code),
        }
    }
}

impl From<&str> for Icon {
    fn from(code: &str) -> Self {
        Icon::new(code)
    }
}

/// Metadata describing a command and its presentation.
///
/// Presentation depends on the containing surface: a command palette might
/// prefix `category` and ignore icons, while a menu grays out disabled items
/// and drops the category label.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommandRule {
    /// Globally unique identifier, e.g. `"editor.copyLine"`.
    pub id: String,
    /// Title by which the command is represented in the UI.
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
    /// Shorter title for cramped surfaces; menus pick whichever fits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_title: Option<String>,
    /// Condition for the command to be enabled in the UI. Absent means always
    /// enabled. Does not prevent execution through the unchecked API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enablement: Option<WhenClause>,
}

impl CommandRule {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            category: None,
            tooltip: None,
            icon: None,
            short_title: None,
            enablement: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<Icon>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_short_title(mut self, short_title: impl Into<String>) -> Self {
        self.short_title = Some(short_title.into());
        self
    }

    pub fn with_enablement(mut self, when: WhenClause) -> Self {
        self.enablement = Some(when);
        self
    }
}

/// Resolved arguments passed to a command handler.
pub type CommandArgs = serde_json::Map<String, Value>;

/// The capability a command handler exposes to the registry.
///
/// Registries store `Arc<dyn Invocable>` plus metadata; they never own
/// execution logic beyond calling this. Any matching closure is an
/// `Invocable` via the blanket impl.
pub trait Invocable: Send + Sync {
    fn invoke(&self, args: &CommandArgs) -> anyhow::Result<Value>;
}

impl<F> Invocable for F
where
    F: Fn(&CommandArgs) -> anyhow::Result<Value> + Send + Sync,
{
    fn invoke(&self, args: &CommandArgs) -> anyhow::Result<Value> {
        self(args)
    }
}

/// External dependency-injection collaborator: supplies a value per declared
/// parameter name. The registry passes through whatever it returns.
pub trait ArgResolver {
    fn provide(&self, param: &str) -> Option<Value>;
}

/// Drive an [`ArgResolver`] across a declared parameter list. Parameters the
/// resolver cannot provide are simply absent from the result.
pub fn resolve_args(params: &[&str], resolver: &dyn ArgResolver) -> CommandArgs {
    let mut args = CommandArgs::new();
    for param in params {
        if let Some(value) = resolver.provide(param) {
            args.insert((*param).to_string(), value);
        }
    }
    args
}

/// A command as held by the registry: metadata, handler, and the sequence
/// number assigned at registration.
#[derive(Clone)]
pub struct RegisteredCommand {
    pub rule: CommandRule,
    pub handler: Arc<dyn Invocable>,
    pub seq: u64,
}

impl fmt::Debug for RegisteredCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredCommand")
            .field("rule", &self.rule)
            .field("seq", &self.seq)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_rule_serde_round_trip() {
        let rule = CommandRule::new("edit.copy", "Copy")
            .with_category("Edit")
            .with_icon("fa.copy")
            .with_enablement(WhenClause::parse("hasSelection").unwrap());
        let json = serde_json::to_string(&rule).unwrap();
        let back: CommandRule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rule);
    }

    #[test]
    fn test_rule_omits_absent_fields() {
        let rule = CommandRule::new("a", "A");
        let json = serde_json::to_string(&rule).unwrap();
        assert_eq!(json, "{\"id\":\"a\",\"title\":\"A\"}");
    }

    #[test]
    fn test_resolve_args_skips_unprovided() {
        struct OnlyPath;
        impl ArgResolver for OnlyPath {
            fn provide(&self, param: &str) -> Option<Value> {
                (param == "path").then(|| Value::String("/tmp/x".to_string()))
            }
        }
        let args = resolve_args(&["path", "line"], &OnlyPath);
        assert_eq!(args.get("path"), Some(&Value::String("/tmp/x".to_string())));
        assert!(!args.contains_key("line"));
    }
}
