use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::platform::PlatformSet;

/// How a command's trigger text is compared against an incoming message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Literal,
    Pattern,
}

/// Whether the trigger must start the message or may appear anywhere in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchAnchor {
    #[default]
    Start,
    Anywhere,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", tag = "kind", content = "users")]
pub enum CommandPermission {
    #[default]
    Everyone,
    Restricted(Vec<String>),
}

impl CommandPermission {
    pub fn allows(&self, user: Option<&str>) -> bool {
        match self {
            CommandPermission::Everyone => true,
            CommandPermission::Restricted(users) => match user {
                Some(u) => users.iter().any(|allowed| allowed.eq_ignore_ascii_case(u)),
                None => false,
            },
        }
    }
}

/// A configured chat command (e.g. `!lurk`) that can trigger actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    pub command_id: Uuid,
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub trigger_text: String,
    #[serde(default)]
    pub match_mode: MatchMode,
    #[serde(default)]
    pub anchor: MatchAnchor,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub platforms: PlatformSet,
    #[serde(default)]
    pub global_cooldown_secs: u64,
    #[serde(default)]
    pub user_cooldown_secs: u64,
    #[serde(default)]
    pub permission: CommandPermission,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Command {
    pub fn new(name: &str, trigger_text: &str) -> Self {
        let now = Utc::now();
        Self {
            command_id: Uuid::new_v4(),
            name: name.to_string(),
            enabled: true,
            trigger_text: trigger_text.to_string(),
            match_mode: MatchMode::Literal,
            anchor: MatchAnchor::Start,
            case_sensitive: false,
            platforms: PlatformSet::all(),
            global_cooldown_secs: 0,
            user_cooldown_secs: 0,
            permission: CommandPermission::Everyone,
            created_at: now,
            updated_at: now,
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_restricted_is_case_insensitive() {
        let perm = CommandPermission::Restricted(vec!["Alice".into(), "bob".into()]);
        assert!(perm.allows(Some("alice")));
        assert!(perm.allows(Some("BOB")));
        assert!(!perm.allows(Some("mallory")));
        assert!(!perm.allows(None));
    }

    #[test]
    fn unknown_fields_are_tolerated_on_load() {
        let json = r#"{
            "command_id": "6f3e2d1c-0000-4000-8000-000000000001",
            "name": "lurk",
            "trigger_text": "!lurk",
            "some_future_field": {"nested": true}
        }"#;
        let cmd: Command = serde_json::from_str(json).unwrap();
        assert!(cmd.enabled);
        assert_eq!(cmd.match_mode, MatchMode::Literal);
        assert_eq!(cmd.anchor, MatchAnchor::Start);
        assert!(cmd.platforms.contains(crate::models::Platform::Kick));
    }
}
