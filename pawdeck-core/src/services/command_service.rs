use std::sync::RwLock;

use chrono::Utc;
use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};
use uuid::Uuid;

use pawdeck_common::models::{Command, MatchAnchor, MatchMode, Platform};

use crate::Error;

/// The command catalog: stores chat-command definitions and matches raw
/// chat text against them. Iteration order is insertion order and the
/// first matching command wins; there is no priority field.
pub struct CommandService {
    commands: RwLock<Vec<Command>>,
}

impl CommandService {
    pub fn new() -> Self {
        Self {
            commands: RwLock::new(Vec::new()),
        }
    }

    // ----------------------------------------------------------------
    // CRUD
    // ----------------------------------------------------------------

    pub fn create_command(&self, command: Command) -> Command {
        debug!("Creating command '{}' ({})", command.name, command.trigger_text);
        let mut lock = self.commands.write().unwrap();
        lock.push(command.clone());
        command
    }

    pub fn update_command(&self, command: &Command) -> Result<(), Error> {
        let mut lock = self.commands.write().unwrap();
        match lock.iter_mut().find(|c| c.command_id == command.command_id) {
            Some(slot) => {
                let mut updated = command.clone();
                updated.updated_at = Utc::now();
                *slot = updated;
                Ok(())
            }
            None => Err(Error::NotFound(format!(
                "command {} not found",
                command.command_id
            ))),
        }
    }

    pub fn delete_command(&self, command_id: Uuid) -> Result<(), Error> {
        let mut lock = self.commands.write().unwrap();
        let before = lock.len();
        lock.retain(|c| c.command_id != command_id);
        if lock.len() == before {
            return Err(Error::NotFound(format!("command {} not found", command_id)));
        }
        Ok(())
    }

    pub fn set_command_enabled(&self, command_id: Uuid, enabled: bool) -> Result<(), Error> {
        let mut lock = self.commands.write().unwrap();
        match lock.iter_mut().find(|c| c.command_id == command_id) {
            Some(cmd) => {
                cmd.enabled = enabled;
                cmd.updated_at = Utc::now();
                Ok(())
            }
            None => Err(Error::NotFound(format!("command {} not found", command_id))),
        }
    }

    pub fn get_command(&self, command_id: Uuid) -> Option<Command> {
        let lock = self.commands.read().unwrap();
        lock.iter().find(|c| c.command_id == command_id).cloned()
    }

    pub fn list_commands(&self) -> Vec<Command> {
        self.commands.read().unwrap().clone()
    }

    /// Swap the whole catalog, preserving the document's order. Used by
    /// config reload and snapshot import.
    pub fn replace_all(&self, commands: Vec<Command>) {
        let mut lock = self.commands.write().unwrap();
        debug!("Replacing command catalog: {} -> {} entries", lock.len(), commands.len());
        *lock = commands;
    }

    // ----------------------------------------------------------------
    // Matching
    // ----------------------------------------------------------------

    /// First enabled command whose platform set includes `platform` and
    /// whose trigger matches `text`.
    pub fn match_command(&self, text: &str, platform: Platform) -> Option<Command> {
        let lock = self.commands.read().unwrap();
        lock.iter()
            .find(|cmd| cmd.enabled && cmd.platforms.contains(platform) && trigger_matches(cmd, text))
            .cloned()
    }

    /// The message text after the matched trigger occurrence, used to build
    /// positional arguments. Empty when the command carries no input.
    pub fn input_remainder<'a>(command: &Command, text: &'a str) -> &'a str {
        match command.match_mode {
            MatchMode::Pattern => match compile_pattern(command) {
                Some(re) => re
                    .find(text)
                    .and_then(|m| text.get(m.end()..))
                    .unwrap_or(""),
                None => "",
            },
            MatchMode::Literal => {
                let pos = if command.case_sensitive {
                    text.find(&command.trigger_text)
                } else {
                    text.to_lowercase().find(&command.trigger_text.to_lowercase())
                };
                match pos {
                    Some(start) => text
                        .get(start + command.trigger_text.len()..)
                        .unwrap_or(""),
                    None => "",
                }
            }
        }
    }
}

impl Default for CommandService {
    fn default() -> Self {
        Self::new()
    }
}

fn trigger_matches(command: &Command, text: &str) -> bool {
    match command.match_mode {
        MatchMode::Pattern => match compile_pattern(command) {
            Some(re) => match command.anchor {
                MatchAnchor::Start => re.find(text).map(|m| m.start() == 0).unwrap_or(false),
                MatchAnchor::Anywhere => re.is_match(text),
            },
            // An invalid pattern is "no match", never an error.
            None => false,
        },
        MatchMode::Literal => {
            let (haystack, needle) = if command.case_sensitive {
                (text.to_string(), command.trigger_text.clone())
            } else {
                (text.to_lowercase(), command.trigger_text.to_lowercase())
            };
            match command.anchor {
                MatchAnchor::Start => haystack.starts_with(&needle),
                MatchAnchor::Anywhere => haystack.contains(&needle),
            }
        }
    }
}

fn compile_pattern(command: &Command) -> Option<Regex> {
    match RegexBuilder::new(&command.trigger_text)
        .case_insensitive(!command.case_sensitive)
        .build()
    {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(
                "Command '{}' has an invalid pattern '{}': {}",
                command.name, command.trigger_text, e
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pawdeck_common::models::PlatformSet;

    fn literal(trigger: &str) -> Command {
        Command::new(trigger.trim_start_matches('!'), trigger)
    }

    #[test]
    fn start_anchored_literal_matches_prefix_only() {
        let svc = CommandService::new();
        svc.create_command(literal("!so"));
        assert!(svc.match_command("!so alice", Platform::Twitch).is_some());
        assert!(svc.match_command("please !so alice", Platform::Twitch).is_none());
    }

    #[test]
    fn anywhere_literal_matches_substring() {
        let svc = CommandService::new();
        let mut cmd = literal("hype");
        cmd.anchor = MatchAnchor::Anywhere;
        svc.create_command(cmd);
        assert!(svc.match_command("so much HYPE today", Platform::Twitch).is_some());
    }

    #[test]
    fn case_sensitive_literal_requires_exact_case() {
        let svc = CommandService::new();
        let mut cmd = literal("!So");
        cmd.case_sensitive = true;
        svc.create_command(cmd);
        assert!(svc.match_command("!So alice", Platform::Twitch).is_some());
        assert!(svc.match_command("!so alice", Platform::Twitch).is_none());
    }

    #[test]
    fn invalid_pattern_is_no_match_not_error() {
        let svc = CommandService::new();
        let mut cmd = literal("([broken");
        cmd.match_mode = MatchMode::Pattern;
        svc.create_command(cmd);
        assert!(svc.match_command("([broken", Platform::Twitch).is_none());
    }

    #[test]
    fn platform_mask_gates_matching() {
        let svc = CommandService::new();
        let mut cmd = literal("!so");
        cmd.platforms = PlatformSet::single(Platform::Twitch);
        svc.create_command(cmd);
        assert!(svc.match_command("!so", Platform::Twitch).is_some());
        assert!(svc.match_command("!so", Platform::Discord).is_none());
    }

    #[test]
    fn first_match_wins_in_insertion_order() {
        let svc = CommandService::new();
        let first = svc.create_command(literal("!s"));
        let mut second = literal("!so");
        second.anchor = MatchAnchor::Start;
        svc.create_command(second);
        let matched = svc.match_command("!so alice", Platform::Twitch).unwrap();
        assert_eq!(matched.command_id, first.command_id);
    }

    #[test]
    fn disabled_commands_never_match() {
        let svc = CommandService::new();
        let cmd = svc.create_command(literal("!so"));
        svc.set_command_enabled(cmd.command_id, false).unwrap();
        assert!(svc.match_command("!so", Platform::Twitch).is_none());
    }

    #[test]
    fn input_remainder_strips_the_trigger() {
        let cmd = literal("!so");
        assert_eq!(CommandService::input_remainder(&cmd, "!so alice bob"), " alice bob");
        assert_eq!(CommandService::input_remainder(&cmd, "!so"), "");
    }
}
