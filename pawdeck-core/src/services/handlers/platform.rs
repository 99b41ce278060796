// File: src/services/handlers/platform.rs
//
// Thin call-throughs to the injected platform capabilities. A missing
// capability is a logged no-op, except where the step exists to produce
// variables (user lookup, scene query); those yield empty placeholders.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::info;

use pawdeck_common::models::SubAction;
use pawdeck_common::traits::capabilities::UserProfile;

use crate::services::interpreter::{template, ExecutionContext, Interpreter, StepHandler, StepOutput};
use crate::Error;

fn require_str<'a>(step: &'a SubAction, name: &str) -> Result<&'a str, StepOutput> {
    match step.field_str(name) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(StepOutput::fail(format!(
            "step '{}' requires a '{}' field",
            step.kind, name
        ))),
    }
}

/// Sends a templated chat line.
pub struct ChatMessageHandler;

#[async_trait]
impl StepHandler for ChatMessageHandler {
    fn kind(&self) -> &'static str {
        "chat_message"
    }

    async fn execute(
        &self,
        step: &SubAction,
        ctx: &mut ExecutionContext,
        interpreter: &Interpreter,
    ) -> Result<StepOutput, Error> {
        let Some(chat) = &interpreter.runtime().chat else {
            info!("No chat capability configured; skipping chat_message");
            return Ok(StepOutput::ok());
        };
        let message = template::render_field(step, "message", ctx);
        if message.is_empty() {
            return Ok(StepOutput::fail("chat_message requires a 'message' field"));
        }
        let as_bot = step.field_bool("as_bot").unwrap_or(true);
        chat.send_message(&message, as_bot).await?;
        Ok(StepOutput::ok())
    }
}

/// Moderation operations: timeout, ban, unban, clear chat, slow mode.
pub struct ModerationHandler;

#[async_trait]
impl StepHandler for ModerationHandler {
    fn kind(&self) -> &'static str {
        "moderation"
    }

    async fn execute(
        &self,
        step: &SubAction,
        ctx: &mut ExecutionContext,
        interpreter: &Interpreter,
    ) -> Result<StepOutput, Error> {
        let Some(moderation) = &interpreter.runtime().moderation else {
            info!("No moderation capability configured; skipping moderation step");
            return Ok(StepOutput::ok());
        };
        let operation = step.field_str("operation").unwrap_or("timeout");
        let user = template::render_field(step, "user", ctx);
        let reason_raw = template::render_field(step, "reason", ctx);
        let reason = if reason_raw.is_empty() {
            None
        } else {
            Some(reason_raw.as_str())
        };
        match operation {
            "timeout" => {
                if user.is_empty() {
                    return Ok(StepOutput::fail("moderation timeout requires a 'user' field"));
                }
                let seconds = step.field_i64("duration_seconds").unwrap_or(600).max(1) as u64;
                moderation.timeout_user(&user, seconds, reason).await?;
            }
            "ban" => {
                if user.is_empty() {
                    return Ok(StepOutput::fail("moderation ban requires a 'user' field"));
                }
                moderation.ban_user(&user, reason).await?;
            }
            "unban" => {
                if user.is_empty() {
                    return Ok(StepOutput::fail("moderation unban requires a 'user' field"));
                }
                moderation.unban_user(&user).await?;
            }
            "clear_chat" => {
                moderation.clear_chat().await?;
            }
            "slow_mode" => {
                let seconds = step.field_i64("seconds").unwrap_or(0);
                let setting = if seconds > 0 { Some(seconds as u64) } else { None };
                moderation.set_slow_mode(setting).await?;
            }
            other => {
                return Ok(StepOutput::fail(format!("unknown moderation operation '{}'", other)));
            }
        }
        Ok(StepOutput::ok())
    }
}

/// Channel metadata: title, category, stream marker, commercial.
pub struct ChannelUpdateHandler;

#[async_trait]
impl StepHandler for ChannelUpdateHandler {
    fn kind(&self) -> &'static str {
        "channel_update"
    }

    async fn execute(
        &self,
        step: &SubAction,
        ctx: &mut ExecutionContext,
        interpreter: &Interpreter,
    ) -> Result<StepOutput, Error> {
        let Some(channel) = &interpreter.runtime().channel else {
            info!("No channel capability configured; skipping channel_update");
            return Ok(StepOutput::ok());
        };
        let operation = step.field_str("operation").unwrap_or("set_title");
        match operation {
            "set_title" => {
                let title = template::render_field(step, "title", ctx);
                if title.is_empty() {
                    return Ok(StepOutput::fail("channel_update set_title requires a 'title'"));
                }
                channel.set_title(&title).await?;
            }
            "set_category" => {
                let category = template::render_field(step, "category", ctx);
                if category.is_empty() {
                    return Ok(StepOutput::fail(
                        "channel_update set_category requires a 'category'",
                    ));
                }
                channel.set_category(&category).await?;
            }
            "create_marker" => {
                let description = template::render_field(step, "description", ctx);
                let description = if description.is_empty() {
                    None
                } else {
                    Some(description.as_str())
                };
                channel.create_marker(description).await?;
            }
            "run_commercial" => {
                let length = step.field_i64("length_seconds").unwrap_or(30).max(30) as u64;
                channel.run_commercial(length).await?;
            }
            other => {
                return Ok(StepOutput::fail(format!("unknown channel operation '{}'", other)));
            }
        }
        Ok(StepOutput::ok())
    }
}

/// Switches the active scene.
pub struct SceneChangeHandler;

#[async_trait]
impl StepHandler for SceneChangeHandler {
    fn kind(&self) -> &'static str {
        "scene_change"
    }

    async fn execute(
        &self,
        step: &SubAction,
        ctx: &mut ExecutionContext,
        interpreter: &Interpreter,
    ) -> Result<StepOutput, Error> {
        let Some(scenes) = &interpreter.runtime().scenes else {
            info!("No scene capability configured; skipping scene_change");
            return Ok(StepOutput::ok());
        };
        let scene = template::render_field(step, "scene", ctx);
        if scene.is_empty() {
            return Ok(StepOutput::fail("scene_change requires a 'scene' field"));
        }
        scenes.set_current_scene(&scene).await?;
        Ok(StepOutput::ok())
    }
}

/// Reads the active scene into a variable.
pub struct GetSceneHandler;

#[async_trait]
impl StepHandler for GetSceneHandler {
    fn kind(&self) -> &'static str {
        "get_current_scene"
    }

    async fn execute(
        &self,
        step: &SubAction,
        _ctx: &mut ExecutionContext,
        interpreter: &Interpreter,
    ) -> Result<StepOutput, Error> {
        let variable = step.field_str("variable").unwrap_or("currentScene").to_string();
        let mut vars = HashMap::new();
        let Some(scenes) = &interpreter.runtime().scenes else {
            info!("No scene capability configured; get_current_scene yields an empty value");
            vars.insert(variable, String::new());
            return Ok(StepOutput::ok_with(vars));
        };
        let scene = scenes.current_scene().await?;
        vars.insert(variable, scene);
        Ok(StepOutput::ok_with(vars))
    }
}

/// Shows or hides a source, optionally within a named scene.
pub struct SourceVisibilityHandler;

#[async_trait]
impl StepHandler for SourceVisibilityHandler {
    fn kind(&self) -> &'static str {
        "source_visibility"
    }

    async fn execute(
        &self,
        step: &SubAction,
        _ctx: &mut ExecutionContext,
        interpreter: &Interpreter,
    ) -> Result<StepOutput, Error> {
        let Some(scenes) = &interpreter.runtime().scenes else {
            info!("No scene capability configured; skipping source_visibility");
            return Ok(StepOutput::ok());
        };
        let source = match require_str(step, "source") {
            Ok(v) => v,
            Err(out) => return Ok(out),
        };
        let scene = step.field_str("scene").filter(|s| !s.is_empty());
        let visible = step.field_bool("visible").unwrap_or(true);
        scenes.set_source_visible(scene, source, visible).await?;
        Ok(StepOutput::ok())
    }
}

/// Replaces the text of a text source.
pub struct SetTextSourceHandler;

#[async_trait]
impl StepHandler for SetTextSourceHandler {
    fn kind(&self) -> &'static str {
        "set_text_source"
    }

    async fn execute(
        &self,
        step: &SubAction,
        ctx: &mut ExecutionContext,
        interpreter: &Interpreter,
    ) -> Result<StepOutput, Error> {
        let Some(scenes) = &interpreter.runtime().scenes else {
            info!("No scene capability configured; skipping set_text_source");
            return Ok(StepOutput::ok());
        };
        let source = match require_str(step, "source") {
            Ok(v) => v,
            Err(out) => return Ok(out),
        };
        let text = template::render_field(step, "text", ctx);
        scenes.set_text_source(source, &text).await?;
        Ok(StepOutput::ok())
    }
}

/// Points a browser source at a templated URL.
pub struct SetBrowserSourceHandler;

#[async_trait]
impl StepHandler for SetBrowserSourceHandler {
    fn kind(&self) -> &'static str {
        "set_browser_source"
    }

    async fn execute(
        &self,
        step: &SubAction,
        ctx: &mut ExecutionContext,
        interpreter: &Interpreter,
    ) -> Result<StepOutput, Error> {
        let Some(scenes) = &interpreter.runtime().scenes else {
            info!("No scene capability configured; skipping set_browser_source");
            return Ok(StepOutput::ok());
        };
        let source = match require_str(step, "source") {
            Ok(v) => v,
            Err(out) => return Ok(out),
        };
        let url = template::render_field(step, "url", ctx);
        scenes.set_browser_source(source, &url).await?;
        Ok(StepOutput::ok())
    }
}

/// Points a media source at a templated file path.
pub struct SetMediaSourceHandler;

#[async_trait]
impl StepHandler for SetMediaSourceHandler {
    fn kind(&self) -> &'static str {
        "set_media_source"
    }

    async fn execute(
        &self,
        step: &SubAction,
        ctx: &mut ExecutionContext,
        interpreter: &Interpreter,
    ) -> Result<StepOutput, Error> {
        let Some(scenes) = &interpreter.runtime().scenes else {
            info!("No scene capability configured; skipping set_media_source");
            return Ok(StepOutput::ok());
        };
        let source = match require_str(step, "source") {
            Ok(v) => v,
            Err(out) => return Ok(out),
        };
        let path = template::render_field(step, "path", ctx);
        scenes.set_media_source(source, &path).await?;
        Ok(StepOutput::ok())
    }
}

/// Starts or stops the recording output.
pub struct RecordControlHandler;

#[async_trait]
impl StepHandler for RecordControlHandler {
    fn kind(&self) -> &'static str {
        "record_control"
    }

    async fn execute(
        &self,
        step: &SubAction,
        _ctx: &mut ExecutionContext,
        interpreter: &Interpreter,
    ) -> Result<StepOutput, Error> {
        let Some(scenes) = &interpreter.runtime().scenes else {
            info!("No scene capability configured; skipping record_control");
            return Ok(StepOutput::ok());
        };
        let active = match step.field_str("operation").unwrap_or("start") {
            "start" => true,
            "stop" => false,
            other => {
                return Ok(StepOutput::fail(format!("unknown record operation '{}'", other)));
            }
        };
        scenes.set_recording(active).await?;
        Ok(StepOutput::ok())
    }
}

/// Starts or stops the streaming output.
pub struct StreamControlHandler;

#[async_trait]
impl StepHandler for StreamControlHandler {
    fn kind(&self) -> &'static str {
        "stream_control"
    }

    async fn execute(
        &self,
        step: &SubAction,
        _ctx: &mut ExecutionContext,
        interpreter: &Interpreter,
    ) -> Result<StepOutput, Error> {
        let Some(scenes) = &interpreter.runtime().scenes else {
            info!("No scene capability configured; skipping stream_control");
            return Ok(StepOutput::ok());
        };
        let active = match step.field_str("operation").unwrap_or("start") {
            "start" => true,
            "stop" => false,
            other => {
                return Ok(StepOutput::fail(format!("unknown stream operation '{}'", other)));
            }
        };
        scenes.set_streaming(active).await?;
        Ok(StepOutput::ok())
    }
}

/// Posts a templated message to a broker channel.
pub struct BrokerMessageHandler;

#[async_trait]
impl StepHandler for BrokerMessageHandler {
    fn kind(&self) -> &'static str {
        "broker_message"
    }

    async fn execute(
        &self,
        step: &SubAction,
        ctx: &mut ExecutionContext,
        interpreter: &Interpreter,
    ) -> Result<StepOutput, Error> {
        let Some(broker) = &interpreter.runtime().broker else {
            info!("No broker capability configured; skipping broker_message");
            return Ok(StepOutput::ok());
        };
        let channel = match require_str(step, "channel") {
            Ok(v) => v,
            Err(out) => return Ok(out),
        };
        let message = template::render_field(step, "message", ctx);
        broker.send_message(channel, &message).await?;
        Ok(StepOutput::ok())
    }
}

/// Sends a templated direct message through the broker.
pub struct BrokerDmHandler;

#[async_trait]
impl StepHandler for BrokerDmHandler {
    fn kind(&self) -> &'static str {
        "broker_dm"
    }

    async fn execute(
        &self,
        step: &SubAction,
        ctx: &mut ExecutionContext,
        interpreter: &Interpreter,
    ) -> Result<StepOutput, Error> {
        let Some(broker) = &interpreter.runtime().broker else {
            info!("No broker capability configured; skipping broker_dm");
            return Ok(StepOutput::ok());
        };
        let user = template::render_field(step, "user", ctx);
        if user.is_empty() {
            return Ok(StepOutput::fail("broker_dm requires a 'user' field"));
        }
        let message = template::render_field(step, "message", ctx);
        broker.send_direct_message(&user, &message).await?;
        Ok(StepOutput::ok())
    }
}

/// Adds or removes a broker role on a user.
pub struct BrokerRoleHandler;

#[async_trait]
impl StepHandler for BrokerRoleHandler {
    fn kind(&self) -> &'static str {
        "broker_role"
    }

    async fn execute(
        &self,
        step: &SubAction,
        ctx: &mut ExecutionContext,
        interpreter: &Interpreter,
    ) -> Result<StepOutput, Error> {
        let Some(broker) = &interpreter.runtime().broker else {
            info!("No broker capability configured; skipping broker_role");
            return Ok(StepOutput::ok());
        };
        let user = template::render_field(step, "user", ctx);
        if user.is_empty() {
            return Ok(StepOutput::fail("broker_role requires a 'user' field"));
        }
        let role = match require_str(step, "role") {
            Ok(v) => v,
            Err(out) => return Ok(out),
        };
        match step.field_str("operation").unwrap_or("add") {
            "add" => broker.add_role(&user, role).await?,
            "remove" => broker.remove_role(&user, role).await?,
            other => {
                return Ok(StepOutput::fail(format!("unknown role operation '{}'", other)));
            }
        }
        Ok(StepOutput::ok())
    }
}

/// Creates a broker channel.
pub struct BrokerChannelCreateHandler;

#[async_trait]
impl StepHandler for BrokerChannelCreateHandler {
    fn kind(&self) -> &'static str {
        "broker_channel_create"
    }

    async fn execute(
        &self,
        step: &SubAction,
        ctx: &mut ExecutionContext,
        interpreter: &Interpreter,
    ) -> Result<StepOutput, Error> {
        let Some(broker) = &interpreter.runtime().broker else {
            info!("No broker capability configured; skipping broker_channel_create");
            return Ok(StepOutput::ok());
        };
        let name = template::render_field(step, "name", ctx);
        if name.is_empty() {
            return Ok(StepOutput::fail("broker_channel_create requires a 'name' field"));
        }
        broker.create_channel(&name).await?;
        Ok(StepOutput::ok())
    }
}

/// Looks up a user profile and exposes its fields as variables. With no
/// capability configured, or no profile found, the variables are empty
/// placeholders and the step still succeeds.
pub struct UserLookupHandler;

#[async_trait]
impl StepHandler for UserLookupHandler {
    fn kind(&self) -> &'static str {
        "user_lookup"
    }

    async fn execute(
        &self,
        step: &SubAction,
        ctx: &mut ExecutionContext,
        interpreter: &Interpreter,
    ) -> Result<StepOutput, Error> {
        let login = template::render_field(step, "login", ctx);
        let user_id = template::render_field(step, "user_id", ctx);

        let profile = match &interpreter.runtime().user_lookup {
            Some(lookup) => {
                if !user_id.is_empty() {
                    lookup.user_by_id(&user_id).await?
                } else if !login.is_empty() {
                    lookup.user_by_login(&login).await?
                } else {
                    return Ok(StepOutput::fail(
                        "user_lookup requires a 'login' or 'user_id' field",
                    ));
                }
            }
            None => {
                info!("No user-lookup capability configured; yielding empty profile");
                None
            }
        };

        let profile = profile.unwrap_or_else(UserProfile::default);
        let mut vars = HashMap::new();
        vars.insert("lookupUserId".to_string(), profile.id);
        vars.insert("lookupLogin".to_string(), profile.login);
        vars.insert("lookupDisplayName".to_string(), profile.display_name);
        vars.insert("lookupDescription".to_string(), profile.description);
        vars.insert("lookupAvatarUrl".to_string(), profile.profile_image_url);
        Ok(StepOutput::ok_with(vars))
    }
}
