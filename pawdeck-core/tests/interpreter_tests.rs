// tests/interpreter_tests.rs

use std::sync::Arc;

use pawdeck_common::models::{AutomationEvent, Platform, SubAction};
use pawdeck_core::services::{ActionService, CommandService};
use pawdeck_core::test_utils::*;
use pawdeck_core::{AutomationEngine, Error, RuntimeContext};

fn setup() -> (
    Arc<CommandService>,
    Arc<ActionService>,
    Arc<RecordingChat>,
    AutomationEngine,
) {
    let commands = Arc::new(CommandService::new());
    let actions = Arc::new(ActionService::new());
    let chat = RecordingChat::new();
    let mut runtime = RuntimeContext::new();
    runtime.chat = Some(chat.clone());
    let engine = AutomationEngine::new(commands.clone(), actions.clone(), runtime);
    (commands, actions, chat, engine)
}

async fn run_steps(steps: Vec<SubAction>) -> Vec<String> {
    let (commands, actions, chat, engine) = setup();
    let cmd = commands.create_command(pawdeck_common::models::Command::new("test", "!test"));
    actions.create_action(command_action("Test", &cmd, steps));
    engine
        .process_event(AutomationEvent::command(Platform::Twitch, "bob", "!test"))
        .await;
    chat.messages()
}

#[tokio::test]
async fn unresolved_template_tokens_stay_verbatim() -> Result<(), Error> {
    let messages = run_steps(vec![chat_step("hi %user%, %missing%")]).await;
    assert_eq!(messages, vec!["hi bob, %missing%".to_string()]);
    Ok(())
}

#[tokio::test]
async fn math_divide_by_zero_yields_zero() -> Result<(), Error> {
    let messages = run_steps(vec![
        SubAction::new("math")
            .with_field("operand1", "42")
            .with_field("operand2", "0")
            .with_field("operation", "divide")
            .with_field("variable", "quotient"),
        chat_step("result=%quotient%"),
    ])
    .await;
    assert_eq!(messages, vec!["result=0".to_string()]);
    Ok(())
}

#[tokio::test]
async fn math_results_flow_through_the_variable_bag() -> Result<(), Error> {
    let messages = run_steps(vec![
        SubAction::new("math")
            .with_field("operand1", "6")
            .with_field("operand2", "7")
            .with_field("operation", "multiply"),
        chat_step("%mathResult%"),
    ])
    .await;
    assert_eq!(messages, vec!["42".to_string()]);
    Ok(())
}

#[tokio::test]
async fn string_ops_chain_through_variables() -> Result<(), Error> {
    let messages = run_steps(vec![
        SubAction::new("string_op")
            .with_field("input", "  %user% the Builder  ")
            .with_field("operation", "trim")
            .with_field("variable", "trimmed"),
        SubAction::new("string_op")
            .with_field("input", "%trimmed%")
            .with_field("operation", "uppercase")
            .with_field("variable", "shouted"),
        chat_step("%shouted%"),
    ])
    .await;
    assert_eq!(messages, vec!["BOB THE BUILDER".to_string()]);
    Ok(())
}

#[tokio::test]
async fn split_extracts_the_indexed_part() -> Result<(), Error> {
    let messages = run_steps(vec![
        SubAction::new("string_op")
            .with_field("input", "red,green,blue")
            .with_field("operation", "split")
            .with_field("separator", ",")
            .with_field("index", 1)
            .with_field("variable", "color"),
        chat_step("picked %color%"),
    ])
    .await;
    assert_eq!(messages, vec!["picked green".to_string()]);
    Ok(())
}

#[tokio::test]
async fn global_variables_persist_across_events() -> Result<(), Error> {
    let (commands, actions, chat, engine) = setup();
    let set_cmd = commands.create_command(pawdeck_common::models::Command::new("set", "!set"));
    actions.create_action(command_action(
        "Set",
        &set_cmd,
        vec![SubAction::new("set_variable")
            .with_field("name", "motto")
            .with_field("value", "stay hydrated")],
    ));
    let get_cmd = commands.create_command(pawdeck_common::models::Command::new("get", "!get"));
    actions.create_action(command_action(
        "Get",
        &get_cmd,
        vec![
            SubAction::new("get_variable").with_field("name", "motto"),
            chat_step("motto: %motto%"),
        ],
    ));

    engine
        .process_event(AutomationEvent::command(Platform::Twitch, "bob", "!set"))
        .await;
    engine
        .process_event(AutomationEvent::command(Platform::Twitch, "alice", "!get"))
        .await;

    assert_eq!(chat.messages(), vec!["motto: stay hydrated".to_string()]);
    Ok(())
}

#[tokio::test]
async fn user_variables_are_scoped_per_user() -> Result<(), Error> {
    let (commands, actions, chat, engine) = setup();
    let bump = commands.create_command(pawdeck_common::models::Command::new("bump", "!bump"));
    actions.create_action(command_action(
        "Bump",
        &bump,
        vec![
            SubAction::new("set_user_variable")
                .with_field("name", "color")
                .with_field("value", "%input0%"),
            SubAction::new("get_user_variable").with_field("name", "color"),
            chat_step("%user% likes %color%"),
        ],
    ));

    engine
        .process_event(AutomationEvent::command(Platform::Twitch, "bob", "!bump teal"))
        .await;
    engine
        .process_event(AutomationEvent::command(Platform::Twitch, "alice", "!bump mauve"))
        .await;

    assert_eq!(
        chat.messages(),
        vec!["bob likes teal".to_string(), "alice likes mauve".to_string()]
    );
    Ok(())
}

#[tokio::test]
async fn file_steps_round_trip_through_local_access() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("quotes.txt");
    let path_str = path.to_str().unwrap();

    let messages = run_steps(vec![
        SubAction::new("file_write")
            .with_field("path", path_str)
            .with_field("content", "first line\n"),
        SubAction::new("file_write")
            .with_field("path", path_str)
            .with_field("content", "second line")
            .with_field("append", true),
        SubAction::new("file_read")
            .with_field("path", path_str)
            .with_field("variable", "quotes"),
        chat_step("%quotes%"),
    ])
    .await;

    assert_eq!(messages, vec!["first line\nsecond line".to_string()]);
    Ok(())
}

#[tokio::test]
async fn datetime_step_exposes_decomposed_fields() -> Result<(), Error> {
    let messages = run_steps(vec![
        SubAction::new("current_datetime").with_field("format", "%Y"),
        chat_step("%datetime%|%year%"),
    ])
    .await;
    assert_eq!(messages.len(), 1);
    let parts: Vec<&str> = messages[0].split('|').collect();
    assert_eq!(parts[0], parts[1], "formatted year must match the decomposed field");
    assert!(parts[0].parse::<i32>().unwrap() >= 2024);
    Ok(())
}

#[tokio::test]
async fn moderation_steps_reach_the_capability() -> Result<(), Error> {
    let commands = Arc::new(CommandService::new());
    let actions = Arc::new(ActionService::new());
    let moderation = RecordingModeration::new();
    let mut runtime = RuntimeContext::new();
    runtime.moderation = Some(moderation.clone());
    let engine = AutomationEngine::new(commands.clone(), actions.clone(), runtime);

    let cmd = commands.create_command(pawdeck_common::models::Command::new("shield", "!shield"));
    actions.create_action(command_action(
        "Shield",
        &cmd,
        vec![
            SubAction::new("moderation")
                .with_field("operation", "timeout")
                .with_field("user", "%targetUser%")
                .with_field("duration_seconds", 120),
            SubAction::new("moderation")
                .with_field("operation", "slow_mode")
                .with_field("seconds", 30),
        ],
    ));

    engine
        .process_event(AutomationEvent::command(
            Platform::Twitch,
            "mod",
            "!shield @troll",
        ))
        .await;

    let calls = moderation.calls.lock().unwrap().clone();
    assert_eq!(calls, vec!["timeout:troll:120".to_string(), "slow_mode:Some(30)".to_string()]);
    Ok(())
}

#[tokio::test]
async fn scene_steps_reach_the_capability_and_read_back() -> Result<(), Error> {
    let commands = Arc::new(CommandService::new());
    let actions = Arc::new(ActionService::new());
    let chat = RecordingChat::new();
    let scenes = RecordingScenes::new();
    let mut runtime = RuntimeContext::new();
    runtime.chat = Some(chat.clone());
    runtime.scenes = Some(scenes.clone());
    let engine = AutomationEngine::new(commands.clone(), actions.clone(), runtime);

    let cmd = commands.create_command(pawdeck_common::models::Command::new("brb", "!brb"));
    actions.create_action(command_action(
        "Brb",
        &cmd,
        vec![
            SubAction::new("scene_change").with_field("scene", "BRB"),
            SubAction::new("get_current_scene"),
            chat_step("now on %currentScene%"),
        ],
    ));

    engine
        .process_event(AutomationEvent::command(Platform::Twitch, "bob", "!brb"))
        .await;

    assert_eq!(chat.messages(), vec!["now on BRB".to_string()]);
    Ok(())
}

#[tokio::test]
async fn user_lookup_fills_placeholder_variables_without_capability() -> Result<(), Error> {
    // No lookup capability configured: the step still succeeds and the
    // profile variables template to empty strings.
    let messages = run_steps(vec![
        SubAction::new("user_lookup").with_field("login", "%user%"),
        chat_step("[%lookupDisplayName%]"),
    ])
    .await;
    assert_eq!(messages, vec!["[]".to_string()]);
    Ok(())
}

#[tokio::test]
async fn user_lookup_exposes_profile_fields() -> Result<(), Error> {
    let commands = Arc::new(CommandService::new());
    let actions = Arc::new(ActionService::new());
    let chat = RecordingChat::new();
    let mut runtime = RuntimeContext::new();
    runtime.chat = Some(chat.clone());
    runtime.user_lookup = Some(StaticUserLookup::new("bob", "Bob the Builder"));
    let engine = AutomationEngine::new(commands.clone(), actions.clone(), runtime);

    let cmd = commands.create_command(pawdeck_common::models::Command::new("who", "!who"));
    actions.create_action(command_action(
        "Who",
        &cmd,
        vec![
            SubAction::new("user_lookup").with_field("login", "%user%"),
            chat_step("%lookupDisplayName% (#%lookupUserId%)"),
        ],
    ));

    engine
        .process_event(AutomationEvent::command(Platform::Twitch, "bob", "!who"))
        .await;

    assert_eq!(chat.messages(), vec!["Bob the Builder (#42)".to_string()]);
    Ok(())
}
