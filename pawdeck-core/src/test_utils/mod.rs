// File: src/test_utils/mod.rs
//
// Recording fakes for the capability traits plus small builders, shared by
// the unit and integration tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use pawdeck_common::models::{Action, Command, SubAction, Trigger};
use pawdeck_common::traits::capabilities::{
    ChatCapability, ModerationCapability, SceneCapability, UserLookupCapability, UserProfile,
};
use pawdeck_common::Error;

/// Chat fake that records every line it is asked to send.
#[derive(Default)]
pub struct RecordingChat {
    pub sent: Mutex<Vec<(String, bool)>>,
}

impl RecordingChat {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(m, _)| m.clone()).collect()
    }
}

#[async_trait]
impl ChatCapability for RecordingChat {
    async fn send_message(&self, text: &str, as_bot: bool) -> Result<(), Error> {
        self.sent.lock().unwrap().push((text.to_string(), as_bot));
        Ok(())
    }
}

/// Moderation fake recording operation names.
#[derive(Default)]
pub struct RecordingModeration {
    pub calls: Mutex<Vec<String>>,
}

impl RecordingModeration {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl ModerationCapability for RecordingModeration {
    async fn timeout_user(
        &self,
        user: &str,
        seconds: u64,
        _reason: Option<&str>,
    ) -> Result<(), Error> {
        self.calls.lock().unwrap().push(format!("timeout:{}:{}", user, seconds));
        Ok(())
    }

    async fn ban_user(&self, user: &str, _reason: Option<&str>) -> Result<(), Error> {
        self.calls.lock().unwrap().push(format!("ban:{}", user));
        Ok(())
    }

    async fn unban_user(&self, user: &str) -> Result<(), Error> {
        self.calls.lock().unwrap().push(format!("unban:{}", user));
        Ok(())
    }

    async fn clear_chat(&self) -> Result<(), Error> {
        self.calls.lock().unwrap().push("clear_chat".to_string());
        Ok(())
    }

    async fn set_slow_mode(&self, seconds: Option<u64>) -> Result<(), Error> {
        self.calls.lock().unwrap().push(format!("slow_mode:{:?}", seconds));
        Ok(())
    }
}

/// Scene fake with a mutable current scene.
pub struct RecordingScenes {
    pub current: Mutex<String>,
    pub calls: Mutex<Vec<String>>,
}

impl RecordingScenes {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            current: Mutex::new("Main".to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl SceneCapability for RecordingScenes {
    async fn set_current_scene(&self, name: &str) -> Result<(), Error> {
        *self.current.lock().unwrap() = name.to_string();
        self.calls.lock().unwrap().push(format!("scene:{}", name));
        Ok(())
    }

    async fn current_scene(&self) -> Result<String, Error> {
        Ok(self.current.lock().unwrap().clone())
    }

    async fn set_source_visible(
        &self,
        scene: Option<&str>,
        source: &str,
        visible: bool,
    ) -> Result<(), Error> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("source:{:?}:{}:{}", scene, source, visible));
        Ok(())
    }

    async fn set_text_source(&self, source: &str, text: &str) -> Result<(), Error> {
        self.calls.lock().unwrap().push(format!("text:{}:{}", source, text));
        Ok(())
    }

    async fn set_browser_source(&self, source: &str, url: &str) -> Result<(), Error> {
        self.calls.lock().unwrap().push(format!("browser:{}:{}", source, url));
        Ok(())
    }

    async fn set_media_source(&self, source: &str, path: &str) -> Result<(), Error> {
        self.calls.lock().unwrap().push(format!("media:{}:{}", source, path));
        Ok(())
    }

    async fn set_recording(&self, active: bool) -> Result<(), Error> {
        self.calls.lock().unwrap().push(format!("recording:{}", active));
        Ok(())
    }

    async fn set_streaming(&self, active: bool) -> Result<(), Error> {
        self.calls.lock().unwrap().push(format!("streaming:{}", active));
        Ok(())
    }
}

/// User-lookup fake returning one canned profile.
pub struct StaticUserLookup {
    pub profile: UserProfile,
}

impl StaticUserLookup {
    pub fn new(login: &str, display_name: &str) -> Arc<Self> {
        Arc::new(Self {
            profile: UserProfile {
                id: "42".to_string(),
                login: login.to_string(),
                display_name: display_name.to_string(),
                description: String::new(),
                profile_image_url: String::new(),
            },
        })
    }
}

#[async_trait]
impl UserLookupCapability for StaticUserLookup {
    async fn user_by_login(&self, login: &str) -> Result<Option<UserProfile>, Error> {
        if login.eq_ignore_ascii_case(&self.profile.login) {
            Ok(Some(self.profile.clone()))
        } else {
            Ok(None)
        }
    }

    async fn user_by_id(&self, id: &str) -> Result<Option<UserProfile>, Error> {
        if id == self.profile.id {
            Ok(Some(self.profile.clone()))
        } else {
            Ok(None)
        }
    }
}

// ----------------------------------------------------------------
// Builders
// ----------------------------------------------------------------

/// A chat-message step with a templated text.
pub fn chat_step(message: &str) -> SubAction {
    SubAction::new("chat_message").with_field("message", message)
}

/// A math step that always fails (non-numeric operand).
pub fn failing_step() -> SubAction {
    SubAction::new("math")
        .with_field("operand1", "not-a-number")
        .with_field("operand2", "1")
}

/// An action bound to the given command with the given steps.
pub fn command_action(name: &str, command: &Command, steps: Vec<SubAction>) -> Action {
    let mut action = Action::new(name);
    action.triggers.push(Trigger::for_command(command.command_id));
    action.steps = steps;
    action
}
