// tests/config_tests.rs

use pawdeck_common::models::action::{STEP_KIND_BLOCK, STEP_KIND_CONDITION};
use pawdeck_common::models::{
    Action, BranchRole, Command, MatchAnchor, SubAction, Trigger, TriggerKind,
};
use pawdeck_core::config::{ConfigStore, Snapshot};
use pawdeck_core::services::{ActionService, CommandService};
use pawdeck_core::Error;

fn sample_command() -> Command {
    let mut cmd = Command::new("shoutout", "!so");
    cmd.anchor = MatchAnchor::Start;
    cmd.global_cooldown_secs = 30;
    cmd
}

fn sample_action() -> Action {
    let mut action = Action::new("Shoutout");
    action.triggers.push(Trigger::new(TriggerKind::Command));
    action
        .steps
        .push(SubAction::new("chat_message").with_field("message", "Shoutout to %input0%!"));
    action
}

#[test]
fn documents_round_trip_through_the_store() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let store = ConfigStore::new(dir.path());

    store.save_commands(&[sample_command()])?;
    store.save_actions(&[sample_action()])?;

    let commands = store.load_commands()?;
    let actions = store.load_actions()?;
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].trigger_text, "!so");
    assert_eq!(commands[0].global_cooldown_secs, 30);
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].steps.len(), 1);
    Ok(())
}

#[test]
fn missing_documents_load_as_empty_catalogs() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let store = ConfigStore::new(dir.path());
    assert!(store.load_commands()?.is_empty());
    assert!(store.load_actions()?.is_empty());
    Ok(())
}

#[test]
fn loading_normalizes_malformed_branch_nodes() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let store = ConfigStore::new(dir.path());

    // A condition saved with only a true block.
    let mut true_block = SubAction::new(STEP_KIND_BLOCK);
    true_block.branch = Some(BranchRole::True);
    let mut condition = SubAction::new(STEP_KIND_CONDITION)
        .with_field("left", "x")
        .with_field("operator", "is_empty");
    condition.children.push(true_block);
    let mut action = Action::new("Lopsided");
    action.steps.push(condition);
    store.save_actions(&[action])?;

    let loaded = store.load_actions()?;
    let condition = &loaded[0].steps[0];
    assert_eq!(condition.children.len(), 2);
    assert!(condition.branch_block(BranchRole::True).is_some());
    assert!(condition.branch_block(BranchRole::False).is_some());
    Ok(())
}

#[test]
fn documents_tolerate_unknown_fields() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let store = ConfigStore::new(dir.path());
    std::fs::write(
        store.commands_path(),
        r##"[{
            "command_id": "6f3e2d1c-0000-4000-8000-000000000001",
            "name": "lurk",
            "trigger_text": "!lurk",
            "dashboard_color": "#ff00ff",
            "editor_position": {"x": 10, "y": 20}
        }]"##,
    )?;
    let commands = store.load_commands()?;
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].name, "lurk");
    Ok(())
}

#[test]
fn snapshot_round_trips_both_collections() -> Result<(), Error> {
    let source_commands = CommandService::new();
    let source_actions = ActionService::new();
    source_commands.create_command(sample_command());
    source_actions.create_action(sample_action());

    let raw = Snapshot::export(&source_commands, &source_actions).to_json()?;

    let target_commands = CommandService::new();
    let target_actions = ActionService::new();
    Snapshot::import(&raw, &target_commands, &target_actions)?;

    assert_eq!(target_commands.list_commands().len(), 1);
    assert_eq!(target_actions.list_actions().len(), 1);
    assert_eq!(target_commands.list_commands()[0].trigger_text, "!so");
    Ok(())
}

#[test]
fn malformed_snapshot_leaves_catalogs_untouched() {
    let commands = CommandService::new();
    let actions = ActionService::new();
    commands.create_command(sample_command());
    actions.create_action(sample_action());

    let result = Snapshot::import("{not json at all", &commands, &actions);
    assert!(result.is_err());
    assert_eq!(commands.list_commands().len(), 1, "no partial mutation on parse error");
    assert_eq!(actions.list_actions().len(), 1);
}

#[test]
fn snapshot_from_the_future_is_refused() {
    let commands = CommandService::new();
    let actions = ActionService::new();
    let raw = r#"{"version": 99, "exported_at": "2026-01-01T00:00:00Z"}"#;
    let result = Snapshot::import(raw, &commands, &actions);
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn snapshot_import_normalizes_step_trees() -> Result<(), Error> {
    let commands = CommandService::new();
    let actions = ActionService::new();

    let mut condition = SubAction::new(STEP_KIND_CONDITION);
    condition.children.clear();
    let mut action = Action::new("Bare");
    action.steps.push(condition);
    let snapshot = Snapshot {
        version: 1,
        exported_at: chrono::Utc::now(),
        commands: vec![],
        actions: vec![action],
    };

    Snapshot::import(&snapshot.to_json()?, &commands, &actions)?;
    let loaded = &actions.list_actions()[0];
    assert_eq!(loaded.steps[0].children.len(), 2);
    Ok(())
}
