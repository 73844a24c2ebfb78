//! Registry mapping command ids to metadata and handlers.
//!
//! Reads return copies (copy-on-read), never live iterators, so enumeration
//! is snapshot-consistent under concurrent mutation.

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::context::ContextView;
use crate::error::{ActionKitError, Result};

use super::types::{CommandArgs, CommandRule, Invocable, RegisteredCommand};

/// Receipt for a registered command; pass to
/// [`CommandRegistry::unregister`] or keep for bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandRegistration {
    pub id: String,
    pub(crate) seq: u64,
}

struct Inner {
    commands: HashMap<String, RegisteredCommand>,
    next_seq: u64,
}

/// Command registry owned by one application instance.
pub struct CommandRegistry {
    inner: RwLock<Inner>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                commands: HashMap::new(),
                next_seq: 0,
            }),
        }
    }

    /// Register a command. Fails with [`ActionKitError::DuplicateCommand`]
    /// when the id is already taken; use [`register_or_replace`] for explicit
    /// overwrite semantics.
    ///
    /// [`register_or_replace`]: CommandRegistry::register_or_replace
    pub fn register(
        &self,
        rule: CommandRule,
        handler: Arc<dyn Invocable>,
    ) -> Result<CommandRegistration> {
        let mut inner = self.inner.write();
        if inner.commands.contains_key(&rule.id) {
            return Err(ActionKitError::DuplicateCommand(rule.id));
        }
        Ok(Self::insert(&mut inner, rule, handler))
    }

    /// Register a command, replacing any existing registration for the id.
    pub fn register_or_replace(
        &self,
        rule: CommandRule,
        handler: Arc<dyn Invocable>,
    ) -> CommandRegistration {
        let mut inner = self.inner.write();
        if inner.commands.contains_key(&rule.id) {
            debug!(command = %rule.id, "replacing existing command registration");
        }
        Self::insert(&mut inner, rule, handler)
    }

    fn insert(
        inner: &mut Inner,
        rule: CommandRule,
        handler: Arc<dyn Invocable>,
    ) -> CommandRegistration {
        let seq = inner.next_seq;
        inner.next_seq += 1;
        let id = rule.id.clone();
        debug!(command = %id, seq, "registered command");
        inner.commands.insert(
            id.clone(),
            RegisteredCommand { rule, handler, seq },
        );
        CommandRegistration { id, seq }
    }

    /// Remove a command. Idempotent: removing an absent id is a no-op.
    /// Menu items and keybindings referencing the id are left in place and
    /// resolve as absent from then on.
    pub fn unregister(&self, id: &str) {
        let removed = self.inner.write().commands.remove(id);
        if removed.is_some() {
            debug!(command = %id, "unregistered command");
        }
    }

    pub fn get(&self, id: &str) -> Option<CommandRule> {
        self.inner.read().commands.get(id).map(|c| c.rule.clone())
    }

    pub fn handler(&self, id: &str) -> Option<Arc<dyn Invocable>> {
        self.inner.read().commands.get(id).map(|c| Arc::clone(&c.handler))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.read().commands.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().commands.is_empty()
    }

    /// All registered commands, in registration order. Snapshot-consistent:
    /// the returned list is unaffected by later mutation.
    pub fn list(&self) -> Vec<CommandRule> {
        let inner = self.inner.read();
        let mut commands: Vec<&RegisteredCommand> = inner.commands.values().collect();
        commands.sort_by_key(|c| c.seq);
        commands.iter().map(|c| c.rule.clone()).collect()
    }

    /// Whether the command would be enabled under `ctx`. Absent enablement
    /// means enabled; an unknown id is not enabled.
    pub fn is_enabled(&self, id: &str, ctx: &dyn ContextView) -> bool {
        match self.get(id) {
            Some(rule) => rule.enablement.map(|when| when.eval(ctx)).unwrap_or(true),
            None => false,
        }
    }

    /// Execute a command without an enablement check.
    ///
    /// Handler failures come back as
    /// [`ActionKitError::CommandExecution`] wrapping the original cause.
    pub fn execute(&self, id: &str, args: &CommandArgs) -> Result<Value> {
        let handler = self
            .handler(id)
            .ok_or_else(|| ActionKitError::CommandNotFound(id.to_string()))?;
        // The lock is released before invoking: handlers may re-enter the
        // registry (e.g. to execute another command).
        handler.invoke(args).map_err(|source| {
            warn!(command = %id, error = %source, "command handler failed");
            ActionKitError::CommandExecution {
                id: id.to_string(),
                source,
            }
        })
    }

    /// Execute a command after checking its enablement against `ctx`.
    /// Fails with [`ActionKitError::CommandDisabled`] when the check is
    /// false.
    pub fn execute_checked(
        &self,
        id: &str,
        args: &CommandArgs,
        ctx: &dyn ContextView,
    ) -> Result<Value> {
        let rule = self
            .get(id)
            .ok_or_else(|| ActionKitError::CommandNotFound(id.to_string()))?;
        if let Some(when) = &rule.enablement {
            if !when.eval(ctx) {
                debug!(command = %id, clause = %when, "command disabled in current context");
                return Err(ActionKitError::CommandDisabled(id.to_string()));
            }
        }
        self.execute(id, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::WhenClause;
    use serde_json::json;
    use std::collections::HashMap as Map;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn noop() -> Arc<dyn Invocable> {
        Arc::new(|_: &CommandArgs| -> anyhow::Result<Value> { Ok(Value::Null) })
    }

    fn ctx(entries: &[(&str, bool)]) -> Map<String, crate::context::ContextValue> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), (*v).into()))
            .collect()
    }

    #[test]
    fn test_register_and_get() {
        let registry = CommandRegistry::new();
        registry
            .register(CommandRule::new("a", "A"), noop())
            .unwrap();
        assert_eq!(registry.get("a").unwrap().title, "A");
        assert!(registry.get("b").is_none());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let registry = CommandRegistry::new();
        registry
            .register(CommandRule::new("a", "A"), noop())
            .unwrap();
        let err = registry
            .register(CommandRule::new("a", "A2"), noop())
            .unwrap_err();
        assert!(matches!(err, ActionKitError::DuplicateCommand(id) if id == "a"));
        assert_eq!(registry.get("a").unwrap().title, "A");
    }

    #[test]
    fn test_register_or_replace_overwrites() {
        let registry = CommandRegistry::new();
        registry
            .register(CommandRule::new("a", "A"), noop())
            .unwrap();
        registry.register_or_replace(CommandRule::new("a", "A2"), noop());
        assert_eq!(registry.get("a").unwrap().title, "A2");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let registry = CommandRegistry::new();
        registry
            .register(CommandRule::new("a", "A"), noop())
            .unwrap();
        registry.unregister("a");
        assert!(!registry.contains("a"));
        // Absent id: no-op, no panic, no error.
        registry.unregister("a");
        registry.unregister("never-existed");
    }

    #[test]
    fn test_list_is_in_registration_order_and_snapshot_consistent() {
        let registry = CommandRegistry::new();
        registry.register(CommandRule::new("b", "B"), noop()).unwrap();
        registry.register(CommandRule::new("a", "A"), noop()).unwrap();
        let listed = registry.list();
        assert_eq!(
            listed.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            vec!["b", "a"]
        );
        registry.unregister("b");
        // The earlier snapshot is unaffected.
        assert_eq!(listed.len(), 2);
        assert_eq!(registry.list().len(), 1);
    }

    #[test]
    fn test_execute_passes_args_and_returns_result() {
        let registry = CommandRegistry::new();
        registry
            .register(
                CommandRule::new("add", "Add"),
                Arc::new(|args: &CommandArgs| -> anyhow::Result<Value> {
                    let a = args["a"].as_i64().unwrap();
                    let b = args["b"].as_i64().unwrap();
                    Ok(json!(a + b))
                }),
            )
            .unwrap();
        let mut args = CommandArgs::new();
        args.insert("a".to_string(), json!(2));
        args.insert("b".to_string(), json!(3));
        assert_eq!(registry.execute("add", &args).unwrap(), json!(5));
    }

    #[test]
    fn test_execute_unknown_command() {
        let registry = CommandRegistry::new();
        let err = registry.execute("ghost", &CommandArgs::new()).unwrap_err();
        assert!(matches!(err, ActionKitError::CommandNotFound(id) if id == "ghost"));
    }

    #[test]
    fn test_handler_failure_is_wrapped_with_cause() {
        let registry = CommandRegistry::new();
        registry
            .register(
                CommandRule::new("boom", "Boom"),
                Arc::new(|_: &CommandArgs| -> anyhow::Result<Value> { Err(anyhow::anyhow!("disk on fire")) }),
            )
            .unwrap();
        let err = registry.execute("boom", &CommandArgs::new()).unwrap_err();
        match err {
            ActionKitError::CommandExecution { id, source } => {
                assert_eq!(id, "boom");
                assert_eq!(source.to_string(), "disk on fire");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_execute_checked_respects_enablement() {
        let registry = CommandRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in = Arc::clone(&calls);
        registry
            .register(
                CommandRule::new("paste", "Paste")
                    .with_enablement(WhenClause::parse("clipboardHasText").unwrap()),
                Arc::new(move |_: &CommandArgs| {
                    calls_in.fetch_add(1, Ordering::SeqCst);
                    Ok(Value::Null)
                }),
            )
            .unwrap();

        let err = registry
            .execute_checked("paste", &CommandArgs::new(), &ctx(&[]))
            .unwrap_err();
        assert!(matches!(err, ActionKitError::CommandDisabled(id) if id == "paste"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        registry
            .execute_checked("paste", &CommandArgs::new(), &ctx(&[("clipboardHasText", true)]))
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // The unchecked path ignores enablement.
        registry.execute("paste", &CommandArgs::new()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_is_enabled() {
        let registry = CommandRegistry::new();
        registry
            .register(
                CommandRule::new("cut", "Cut")
                    .with_enablement(WhenClause::parse("hasSelection").unwrap()),
                noop(),
            )
            .unwrap();
        registry.register(CommandRule::new("open", "Open"), noop()).unwrap();

        assert!(!registry.is_enabled("cut", &ctx(&[])));
        assert!(registry.is_enabled("cut", &ctx(&[("hasSelection", true)])));
        assert!(registry.is_enabled("open", &ctx(&[])));
        assert!(!registry.is_enabled("ghost", &ctx(&[])));
    }

    #[test]
    fn test_handler_may_reenter_registry() {
        let registry = Arc::new(CommandRegistry::new());
        registry.register(CommandRule::new("inner", "Inner"), Arc::new(|_: &CommandArgs| -> anyhow::Result<Value> { Ok(json!("inner-ran")) })).unwrap();
        let registry_in = Arc::clone(&registry);
        registry
            .register(
                CommandRule::new("outer", "Outer"),
                Arc::new(move |args: &CommandArgs| -> anyhow::Result<Value> {
                    registry_in.execute("inner", args).map_err(Into::into)
                }),
            )
            .unwrap();
        assert_eq!(registry.execute("outer", &CommandArgs::new()).unwrap(), json!("inner-ran"));
    }
}
