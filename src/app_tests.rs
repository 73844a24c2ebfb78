//! Tests for the application instance: dispatcher passthrough, action
//! registration, round-trip behavior, and instance isolation.

use super::*;
use crate::error::ActionKitError;
use crate::expression::WhenClause;
use crate::keybindings::BindingSource;
use crate::menus::ResolvedMenuItem;
use serde_json::json;

fn ok_handler(result: Value) -> impl Invocable + 'static {
    move |_: &CommandArgs| -> anyhow::Result<Value> { Ok(result.clone()) }
}

fn visible_command_ids(items: &[ResolvedMenuItem]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| match item {
            ResolvedMenuItem::Command(c) => Some(c.command.id.clone()),
            ResolvedMenuItem::Submenu(_) => None,
        })
        .collect()
}

#[test]
fn test_register_action_wires_all_three_registries() {
    let app = Application::new("test");
    app.register_action(
        Action::new("file.open", "Open File", ok_handler(json!("opened")))
            .add_menu(MenuRule::new("file").with_group("navigation"))
            .add_keybinding(KeybindingRule::new("", "ctrl+o")),
    )
    .unwrap();

    assert!(app.commands().contains("file.open"));
    assert_eq!(visible_command_ids(&app.visible_menu("file")), vec!["file.open"]);
    assert_eq!(
        app.active_binding(&KeyChord::parse("ctrl+o").unwrap()),
        Some("file.open".to_string())
    );
    assert_eq!(
        app.execute_command("file.open", &CommandArgs::new()).unwrap(),
        json!("opened")
    );
}

#[test]
fn test_unregister_action_undoes_everything() {
    let app = Application::new("test");
    let registration = app
        .register_action(
            Action::new("x", "X", ok_handler(Value::Null))
                .add_menu(MenuRule::new("m"))
                .add_keybinding(KeybindingRule::new("", "ctrl+x")),
        )
        .unwrap();

    app.unregister_action(&registration);
    assert!(!app.commands().contains("x"));
    assert!(app.visible_menu("m").is_empty());
    assert_eq!(app.active_binding(&KeyChord::parse("ctrl+x").unwrap()), None);
    // Idempotent.
    app.unregister_action(&registration);
}

#[test]
fn test_register_action_rolls_back_on_bad_keybinding() {
    let app = Application::new("test");
    let err = app
        .register_action(
            Action::new("x", "X", ok_handler(Value::Null))
                .add_menu(MenuRule::new("m"))
                .add_keybinding(KeybindingRule::new("", "ctrl+o"))
                .add_keybinding(KeybindingRule::new("", "not a chord at all")),
        )
        .unwrap_err();
    assert!(matches!(err, ActionKitError::Chord(_)));
    assert!(!app.commands().contains("x"));
    assert!(app.visible_menu("m").is_empty());
    assert_eq!(app.active_binding(&KeyChord::parse("ctrl+o").unwrap()), None);
}

#[test]
fn test_dispatcher_tracks_context_changes() {
    let app = Application::new("test");
    app.register_action(
        Action::new("edit.copy", "Copy", ok_handler(Value::Null))
            .with_enablement(WhenClause::parse("hasSelection").unwrap())
            .add_menu(MenuRule::new("edit").with_when(WhenClause::parse("hasSelection").unwrap()))
            .add_keybinding(
                KeybindingRule::new("", "ctrl+c")
                    .with_when(WhenClause::parse("hasSelection").unwrap()),
            ),
    )
    .unwrap();

    let chord = KeyChord::parse("ctrl+c").unwrap();
    assert!(app.visible_menu("edit").is_empty());
    assert_eq!(app.active_binding(&chord), None);
    assert!(!app.is_command_enabled("edit.copy"));

    app.context().set("hasSelection", true);
    assert_eq!(visible_command_ids(&app.visible_menu("edit")), vec!["edit.copy"]);
    assert_eq!(app.active_binding(&chord), Some("edit.copy".to_string()));
    assert!(app.is_command_enabled("edit.copy"));

    // And back again once the context no longer satisfies the clauses.
    app.context().set("hasSelection", false);
    assert!(app.visible_menu("edit").is_empty());
    assert_eq!(app.active_binding(&chord), None);
}

#[test]
fn test_execute_command_checked_uses_current_context() {
    let app = Application::new("test");
    app.register_action(
        Action::new("deploy", "Deploy", ok_handler(json!("done")))
            .with_enablement(WhenClause::parse("ci.green && !frozen").unwrap()),
    )
    .unwrap();

    let err = app
        .execute_command_checked("deploy", &CommandArgs::new())
        .unwrap_err();
    assert!(matches!(err, ActionKitError::CommandDisabled(_)));

    app.context().update([("ci.green", true)]);
    assert_eq!(
        app.execute_command_checked("deploy", &CommandArgs::new()).unwrap(),
        json!("done")
    );

    app.context().set("frozen", true);
    assert!(app.execute_command_checked("deploy", &CommandArgs::new()).is_err());
    // The unchecked path still runs.
    assert_eq!(
        app.execute_command("deploy", &CommandArgs::new()).unwrap(),
        json!("done")
    );
}

#[test]
fn test_instances_share_nothing() {
    let a = Application::new("a");
    let b = Application::new("b");

    a.register_action(Action::new("only.in.a", "A", ok_handler(Value::Null)))
        .unwrap();
    a.context().set("key", "a-value");

    assert!(!b.commands().contains("only.in.a"));
    assert_eq!(b.context().get("key"), crate::context::ContextValue::Null);
}

#[test]
fn test_round_trip_re_registration_resolves_identically() {
    // Serialize rules out of one application, rebuild a fresh one from the
    // JSON, and check resolution behaves the same.
    let original = Application::new("original");
    original
        .register_action(
            Action::new("edit.paste", "Paste", ok_handler(Value::Null))
                .with_command(
                    CommandRule::new("edit.paste", "Paste")
                        .with_category("Edit")
                        .with_enablement(WhenClause::parse("clipboardHasText").unwrap()),
                )
                .add_keybinding(
                    KeybindingRule::new("", "ctrl+v")
                        .with_source(BindingSource::User)
                        .with_when(WhenClause::parse("editorFocus").unwrap()),
                ),
        )
        .unwrap();

    let command_json =
        serde_json::to_string(&original.commands().get("edit.paste").unwrap()).unwrap();
    let binding_json = serde_json::to_string(&original.keybindings().bindings()[0].chord).unwrap();

    let rebuilt = Application::new("rebuilt");
    let command: CommandRule = serde_json::from_str(&command_json).unwrap();
    let chord_text: String = serde_json::from_str(&binding_json).unwrap();
    rebuilt
        .register_action(
            Action::new("ignored", "ignored", ok_handler(Value::Null))
                .with_command(command)
                .add_keybinding(
                    KeybindingRule::new("", chord_text)
                        .with_source(BindingSource::User)
                        .with_when(WhenClause::parse("editorFocus").unwrap()),
                ),
        )
        .unwrap();

    for app in [&original, &rebuilt] {
        app.context().update([("clipboardHasText", true), ("editorFocus", true)]);
    }

    let chord = KeyChord::parse("ctrl+v").unwrap();
    assert_eq!(
        original.active_binding(&chord),
        rebuilt.active_binding(&chord)
    );
    assert_eq!(
        original.is_command_enabled("edit.paste"),
        rebuilt.is_command_enabled("edit.paste")
    );
}

#[test]
fn test_visible_menu_with_pruning() {
    let app = Application::new("test");
    app.register_action(Action::new("child", "Child", ok_handler(Value::Null)))
        .unwrap();
    app.menus().register_items(
        "root",
        vec![MenuItem::submenu("empty-sub", "Empty")],
    );

    assert_eq!(app.visible_menu("root").len(), 1);
    let pruned = app.visible_menu_with(
        "root",
        MenuResolveOptions { prune_empty_submenus: true },
    );
    assert!(pruned.is_empty());
}
