use std::collections::HashMap;

use uuid::Uuid;

use pawdeck_common::models::{AutomationEvent, Platform};

/// Per-event transient state threaded through step execution. Never shared
/// across events, so the recursion stack cannot leak between concurrent
/// invocations.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub platform: Platform,
    pub user: Option<String>,
    pub message: Option<String>,
    /// Read-only argument bag: positional inputs plus event metadata.
    pub args: HashMap<String, String>,
    /// Variable bag written by steps, read by templating.
    pub variables: HashMap<String, String>,
    /// Set by a break step; aborts remaining siblings at every level.
    pub break_requested: bool,
    /// Action ids currently executing in this chain.
    pub call_stack: Vec<Uuid>,
}

impl ExecutionContext {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            user: None,
            message: None,
            args: HashMap::new(),
            variables: HashMap::new(),
            break_requested: false,
            call_stack: Vec::new(),
        }
    }

    /// Base context for an event: user/platform/message args plus every
    /// scalar entry of the event's data map, exposed under its own name.
    pub fn for_event(event: &AutomationEvent) -> Self {
        let mut ctx = ExecutionContext::new(event.platform);
        ctx.user = event.user.clone();
        ctx.message = event.message.clone();
        ctx.args.insert("platform".into(), event.platform.to_string());
        if let Some(user) = &event.user {
            ctx.args.insert("user".into(), user.clone());
        }
        if let Some(message) = &event.message {
            ctx.args.insert("message".into(), message.clone());
        }
        for (key, value) in &event.data {
            let rendered = match value {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                serde_json::Value::Bool(b) => Some(b.to_string()),
                _ => None,
            };
            if let Some(rendered) = rendered {
                ctx.args.insert(key.clone(), rendered);
            }
        }
        ctx
    }

    /// Split command input into `input0..inputN`, expose the whole
    /// remainder as `rawInput`, and `input0` (without a leading `@`) as
    /// `targetUser`.
    pub fn apply_command_input(&mut self, remainder: &str) {
        let trimmed = remainder.trim();
        self.args.insert("rawInput".into(), trimmed.to_string());
        for (i, part) in trimmed.split_whitespace().enumerate() {
            self.args.insert(format!("input{}", i), part.to_string());
            if i == 0 {
                self.args
                    .insert("targetUser".into(), part.trim_start_matches('@').to_string());
            }
        }
    }

    /// Template lookup order: variable bag first, then arguments.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.variables
            .get(name)
            .or_else(|| self.args.get(name))
            .map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_input_produces_positional_args() {
        let mut ctx = ExecutionContext::new(Platform::Twitch);
        ctx.apply_command_input(" @alice  raid soon ");
        assert_eq!(ctx.args.get("rawInput").unwrap(), "@alice  raid soon");
        assert_eq!(ctx.args.get("input0").unwrap(), "@alice");
        assert_eq!(ctx.args.get("input1").unwrap(), "raid");
        assert_eq!(ctx.args.get("input2").unwrap(), "soon");
        assert_eq!(ctx.args.get("targetUser").unwrap(), "alice");
        assert!(!ctx.args.contains_key("input3"));
    }

    #[test]
    fn variables_shadow_args_in_lookup() {
        let mut ctx = ExecutionContext::new(Platform::Twitch);
        ctx.args.insert("user".into(), "alice".into());
        assert_eq!(ctx.lookup("user"), Some("alice"));
        ctx.variables.insert("user".into(), "bob".into());
        assert_eq!(ctx.lookup("user"), Some("bob"));
        assert_eq!(ctx.lookup("missing"), None);
    }
}
