//! Keybinding registry and single-winner chord resolution.
//!
//! Multiple bindings may share a chord; resolution yields at most one active
//! binding for a given (chord, context) pair. Winner selection: highest
//! source rank, then highest weight, then most recent registration (later
//! registrations shadow earlier ones at equal priority).

use parking_lot::RwLock;
use tracing::debug;

use crate::commands::CommandRegistry;
use crate::context::ContextView;
use crate::error::{ActionKitError, Result};

use super::chord::{KeyChord, Platform};
use super::types::{KeybindingRule, RegisteredKeybinding};

/// Receipt for a registered binding; pass to
/// [`KeybindingRegistry::unregister`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeybindingRegistration {
    pub(crate) seq: u64,
}

struct Inner {
    bindings: Vec<RegisteredKeybinding>,
    next_seq: u64,
}

/// Keybinding registry owned by one application instance.
pub struct KeybindingRegistry {
    inner: RwLock<Inner>,
}

impl Default for KeybindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl KeybindingRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                bindings: Vec::new(),
                next_seq: 0,
            }),
        }
    }

    /// Register a binding for the current platform.
    pub fn register(&self, rule: KeybindingRule) -> Result<KeybindingRegistration> {
        self.register_for_platform(rule, Platform::current())
    }

    /// Register a binding, choosing the chord for an explicit platform.
    /// Fails with [`ActionKitError::NoChordForPlatform`] when the rule has
    /// neither a platform override nor a primary chord.
    pub fn register_for_platform(
        &self,
        rule: KeybindingRule,
        platform: Platform,
    ) -> Result<KeybindingRegistration> {
        let chord_text = rule
            .chord_for_platform(platform)
            .ok_or_else(|| ActionKitError::NoChordForPlatform(rule.command_id.clone()))?;
        let chord = KeyChord::parse(chord_text)?;

        let mut inner = self.inner.write();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        debug!(
            command = %rule.command_id,
            chord = %chord.to_canonical_string(),
            seq,
            "registered keybinding"
        );
        inner.bindings.push(RegisteredKeybinding {
            chord,
            command_id: rule.command_id,
            when: rule.when,
            weight: rule.weight,
            source: rule.source,
            seq,
        });
        Ok(KeybindingRegistration { seq })
    }

    /// Remove one binding by its registration receipt. Idempotent.
    pub fn unregister(&self, registration: &KeybindingRegistration) {
        self.inner
            .write()
            .bindings
            .retain(|b| b.seq != registration.seq);
    }

    /// Remove every binding for a command. Idempotent.
    pub fn unregister_command(&self, command_id: &str) {
        self.inner
            .write()
            .bindings
            .retain(|b| b.command_id != command_id);
    }

    /// All registered bindings, in registration order. Snapshot-consistent.
    pub fn bindings(&self) -> Vec<RegisteredKeybinding> {
        self.inner.read().bindings.clone()
    }

    /// All bindings for a command, in registration order.
    pub fn bindings_for_command(&self, command_id: &str) -> Vec<RegisteredKeybinding> {
        self.inner
            .read()
            .bindings
            .iter()
            .filter(|b| b.command_id == command_id)
            .cloned()
            .collect()
    }

    /// The highest-priority chord bound to a command, for display next to
    /// menu entries. Ignores `when` (display is not resolution).
    pub fn keybinding_for(&self, command_id: &str) -> Option<KeyChord> {
        self.inner
            .read()
            .bindings
            .iter()
            .filter(|b| b.command_id == command_id)
            .max_by_key(|b| (b.source.rank(), b.weight, b.seq))
            .map(|b| b.chord.clone())
    }

    /// Resolve the single active binding for `chord` under `ctx`.
    ///
    /// Candidates are bindings whose chord matches, whose `when` holds, and
    /// whose command is still registered (dangling references are skipped).
    /// Returns the winning command id, or `None` — the host then processes
    /// the key normally.
    pub fn resolve(
        &self,
        chord: &KeyChord,
        ctx: &dyn ContextView,
        commands: &CommandRegistry,
    ) -> Option<String> {
        let inner = self.inner.read();
        let winner = inner
            .bindings
            .iter()
            .filter(|b| &b.chord == chord)
            .filter(|b| b.when.as_ref().map(|when| when.eval(ctx)).unwrap_or(true))
            .filter(|b| commands.contains(&b.command_id))
            .max_by_key(|b| (b.source.rank(), b.weight, b.seq))?;
        debug!(
            chord = %chord.to_canonical_string(),
            command = %winner.command_id,
            "resolved keybinding"
        );
        Some(winner.command_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{CommandArgs, CommandRule, Invocable};
    use crate::context::ContextValue;
    use crate::expression::WhenClause;
    use crate::keybindings::types::BindingSource;
    use serde_json::Value;
    use std::collections::HashMap as Map;
    use std::sync::Arc;

    fn noop() -> Arc<dyn Invocable> {
        Arc::new(|_: &CommandArgs| -> anyhow::Result<Value> { Ok(Value::Null) })
    }

    fn commands(ids: &[&str]) -> CommandRegistry {
        let registry = CommandRegistry::new();
        for id in ids {
            registry
                .register(CommandRule::new(*id, id.to_uppercase()), noop())
                .unwrap();
        }
        registry
    }

    fn ctx(entries: &[(&str, ContextValue)]) -> Map<String, ContextValue> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn chord(s: &str) -> KeyChord {
        KeyChord::parse(s).unwrap()
    }

    #[test]
    fn test_equal_weight_later_registration_wins() {
        let bindings = KeybindingRegistry::new();
        let cmds = commands(&["first", "second"]);
        bindings.register(KeybindingRule::new("first", "ctrl+k")).unwrap();
        bindings.register(KeybindingRule::new("second", "ctrl+k")).unwrap();
        assert_eq!(
            bindings.resolve(&chord("ctrl+k"), &ctx(&[]), &cmds),
            Some("second".to_string())
        );
    }

    #[test]
    fn test_higher_weight_wins_regardless_of_order() {
        let bindings = KeybindingRegistry::new();
        let cmds = commands(&["heavy", "light"]);
        bindings
            .register(KeybindingRule::new("heavy", "ctrl+k").with_weight(10))
            .unwrap();
        bindings.register(KeybindingRule::new("light", "ctrl+k")).unwrap();
        assert_eq!(
            bindings.resolve(&chord("ctrl+k"), &ctx(&[]), &cmds),
            Some("heavy".to_string())
        );
    }

    #[test]
    fn test_user_source_beats_default_weight() {
        let bindings = KeybindingRegistry::new();
        let cmds = commands(&["default", "user"]);
        bindings
            .register(KeybindingRule::new("default", "ctrl+k").with_weight(100))
            .unwrap();
        bindings
            .register(
                KeybindingRule::new("user", "ctrl+k").with_source(BindingSource::User),
            )
            .unwrap();
        assert_eq!(
            bindings.resolve(&chord("ctrl+k"), &ctx(&[]), &cmds),
            Some("user".to_string())
        );
    }

    #[test]
    fn test_removing_winner_falls_back_to_next_candidate() {
        let bindings = KeybindingRegistry::new();
        let cmds = commands(&["first", "second"]);
        bindings.register(KeybindingRule::new("first", "ctrl+k")).unwrap();
        let winner = bindings
            .register(KeybindingRule::new("second", "ctrl+k"))
            .unwrap();
        bindings.unregister(&winner);
        assert_eq!(
            bindings.resolve(&chord("ctrl+k"), &ctx(&[]), &cmds),
            Some("first".to_string())
        );
        // Idempotent.
        bindings.unregister(&winner);
    }

    #[test]
    fn test_when_clause_gates_candidates() {
        let bindings = KeybindingRegistry::new();
        let cmds = commands(&["everywhere", "editor_only"]);
        bindings
            .register(KeybindingRule::new("everywhere", "ctrl+w"))
            .unwrap();
        bindings
            .register(
                KeybindingRule::new("editor_only", "ctrl+w")
                    .with_when(WhenClause::parse("editorFocus").unwrap()),
            )
            .unwrap();

        assert_eq!(
            bindings.resolve(&chord("ctrl+w"), &ctx(&[]), &cmds),
            Some("everywhere".to_string())
        );
        assert_eq!(
            bindings.resolve(&chord("ctrl+w"), &ctx(&[("editorFocus", true.into())]), &cmds),
            Some("editor_only".to_string())
        );
    }

    #[test]
    fn test_no_candidate_resolves_to_none() {
        let bindings = KeybindingRegistry::new();
        let cmds = commands(&[]);
        assert_eq!(bindings.resolve(&chord("ctrl+q"), &ctx(&[]), &cmds), None);
    }

    #[test]
    fn test_dangling_command_is_skipped() {
        let bindings = KeybindingRegistry::new();
        let cmds = commands(&["kept", "removed"]);
        bindings.register(KeybindingRule::new("kept", "ctrl+k")).unwrap();
        bindings.register(KeybindingRule::new("removed", "ctrl+k")).unwrap();
        cmds.unregister("removed");
        assert_eq!(
            bindings.resolve(&chord("ctrl+k"), &ctx(&[]), &cmds),
            Some("kept".to_string())
        );
    }

    #[test]
    fn test_chord_spellings_collide() {
        let bindings = KeybindingRegistry::new();
        let cmds = commands(&["cmd"]);
        bindings
            .register(KeybindingRule::new("cmd", "Shift+Ctrl+P"))
            .unwrap();
        assert_eq!(
            bindings.resolve(&chord("ctrl shift p"), &ctx(&[]), &cmds),
            Some("cmd".to_string())
        );
    }

    #[test]
    fn test_platform_override_binds_platform_chord() {
        let bindings = KeybindingRegistry::new();
        let cmds = commands(&["open"]);
        let rule = KeybindingRule::new("open", "ctrl+o").with_mac("cmd+o");
        bindings.register_for_platform(rule, Platform::MacOS).unwrap();
        assert_eq!(
            bindings.resolve(&chord("cmd+o"), &ctx(&[]), &cmds),
            Some("open".to_string())
        );
        assert_eq!(bindings.resolve(&chord("ctrl+o"), &ctx(&[]), &cmds), None);
    }

    #[test]
    fn test_rule_without_chord_for_platform() {
        let bindings = KeybindingRegistry::new();
        let rule = KeybindingRule {
            primary: None,
            ..KeybindingRule::new("x", "ctrl+x")
        };
        let err = bindings
            .register_for_platform(rule, Platform::Linux)
            .unwrap_err();
        assert!(matches!(err, ActionKitError::NoChordForPlatform(id) if id == "x"));
    }

    #[test]
    fn test_invalid_chord_is_a_registration_error() {
        let bindings = KeybindingRegistry::new();
        let err = bindings
            .register(KeybindingRule::new("x", "ctrl+"))
            .unwrap_err();
        assert!(matches!(err, ActionKitError::Chord(_)));
    }

    #[test]
    fn test_keybinding_for_prefers_highest_priority() {
        let bindings = KeybindingRegistry::new();
        bindings.register(KeybindingRule::new("save", "ctrl+s")).unwrap();
        bindings
            .register(
                KeybindingRule::new("save", "ctrl+shift+s").with_source(BindingSource::User),
            )
            .unwrap();
        assert_eq!(
            bindings.keybinding_for("save").unwrap().to_canonical_string(),
            "ctrl+shift+s"
        );
        assert!(bindings.keybinding_for("ghost").is_none());
    }

    #[test]
    fn test_unregister_command_removes_all() {
        let bindings = KeybindingRegistry::new();
        bindings.register(KeybindingRule::new("x", "ctrl+1")).unwrap();
        bindings.register(KeybindingRule::new("x", "ctrl+2")).unwrap();
        bindings.register(KeybindingRule::new("y", "ctrl+3")).unwrap();
        bindings.unregister_command("x");
        assert_eq!(bindings.bindings().len(), 1);
        assert_eq!(bindings.bindings_for_command("x").len(), 0);
    }
}
