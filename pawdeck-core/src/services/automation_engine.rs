use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use pawdeck_common::models::{AutomationEvent, Command, EventKind, TriggerKind};

use crate::services::action_service::ActionService;
use crate::services::command_service::CommandService;
use crate::services::interpreter::{ExecutionContext, Interpreter, RuntimeContext};
use crate::Error;

/// Tracks when each command last fired, globally and per user. Owned by
/// one engine instance; separate engines (e.g. in tests) never interfere.
#[derive(Debug, Default)]
struct CooldownTracker {
    last_global_use: HashMap<Uuid, DateTime<Utc>>,
    last_user_use: HashMap<Uuid, HashMap<String, DateTime<Utc>>>,
}

/// The orchestrator: receives normalized events, resolves matching
/// commands/actions, applies cooldown gating and drives the interpreter.
pub struct AutomationEngine {
    commands: Arc<CommandService>,
    actions: Arc<ActionService>,
    interpreter: Interpreter,
    cooldowns: Mutex<CooldownTracker>,
}

impl AutomationEngine {
    pub fn new(
        commands: Arc<CommandService>,
        actions: Arc<ActionService>,
        runtime: RuntimeContext,
    ) -> Self {
        debug!("Initializing AutomationEngine");
        let interpreter = Interpreter::new(Arc::new(runtime), actions.clone());
        Self {
            commands,
            actions,
            interpreter,
            cooldowns: Mutex::new(CooldownTracker::default()),
        }
    }

    pub fn commands(&self) -> &CommandService {
        &self.commands
    }

    pub fn actions(&self) -> &ActionService {
        &self.actions
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// Process one inbound event. Never propagates an error: one failing
    /// event must not take down the engine or block the next one.
    pub async fn process_event(&self, event: AutomationEvent) {
        if let Err(e) = self.process_event_inner(&event).await {
            error!("Error processing {:?} event: {:?}", event.kind, e);
        }
    }

    async fn process_event_inner(&self, event: &AutomationEvent) -> Result<(), Error> {
        match event.kind {
            EventKind::Command => self.handle_command_event(event).await,
            _ => self.handle_platform_event(event).await,
        }
    }

    async fn handle_command_event(&self, event: &AutomationEvent) -> Result<(), Error> {
        let Some(text) = event.message.as_deref() else {
            debug!("Command event without message text, ignoring");
            return Ok(());
        };
        let Some(command) = self.commands.match_command(text, event.platform) else {
            debug!("No command matches '{}'", text);
            return Ok(());
        };
        if !command.permission.allows(event.user.as_deref()) {
            debug!(
                "User {:?} lacks permission for command '{}'",
                event.user, command.name
            );
            return Ok(());
        }
        if !self.check_and_arm_cooldowns(&command, event.user.as_deref()) {
            debug!("Command '{}' is on cooldown, skipping", command.name);
            return Ok(());
        }

        let triggered = self.actions.find_actions_by_trigger(
            TriggerKind::Command,
            event,
            Some(command.command_id),
        );
        if triggered.is_empty() {
            debug!("Command '{}' matched but no action is bound to it", command.name);
            return Ok(());
        }

        let mut ctx = ExecutionContext::for_event(event);
        ctx.apply_command_input(CommandService::input_remainder(&command, text));

        info!(
            "Command '{}' triggering {} action(s)",
            command.name,
            triggered.len()
        );
        for action in &triggered {
            ctx.break_requested = false;
            self.interpreter.run_action(action, &mut ctx).await;
        }
        Ok(())
    }

    async fn handle_platform_event(&self, event: &AutomationEvent) -> Result<(), Error> {
        let kind = event.kind.trigger_kind();
        let triggered = self.actions.find_actions_by_trigger(kind, event, None);
        if triggered.is_empty() {
            debug!("No actions bound to {:?} events", kind);
            return Ok(());
        }

        let mut ctx = ExecutionContext::for_event(event);
        info!("{:?} event triggering {} action(s)", kind, triggered.len());
        for action in &triggered {
            ctx.break_requested = false;
            self.interpreter.run_action(action, &mut ctx).await;
        }
        Ok(())
    }

    /// Check the global and per-user gates and, when both are open, record
    /// the firing timestamps, all under one lock acquisition. Two
    /// near-simultaneous events for the same command/user cannot both slip
    /// through the gate.
    fn check_and_arm_cooldowns(&self, command: &Command, user: Option<&str>) -> bool {
        if command.global_cooldown_secs == 0 && command.user_cooldown_secs == 0 {
            return true;
        }
        let now = Utc::now();
        let mut tracker = match self.cooldowns.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Cooldown tracker lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };

        if command.global_cooldown_secs > 0 {
            if let Some(last) = tracker.last_global_use.get(&command.command_id) {
                let elapsed = now.signed_duration_since(*last).num_seconds();
                if elapsed < command.global_cooldown_secs as i64 {
                    return false;
                }
            }
        }
        if command.user_cooldown_secs > 0 {
            if let Some(user) = user {
                let key = user.to_lowercase();
                if let Some(per_user) = tracker.last_user_use.get(&command.command_id) {
                    if let Some(last) = per_user.get(&key) {
                        let elapsed = now.signed_duration_since(*last).num_seconds();
                        if elapsed < command.user_cooldown_secs as i64 {
                            return false;
                        }
                    }
                }
            }
        }

        tracker.last_global_use.insert(command.command_id, now);
        if let Some(user) = user {
            tracker
                .last_user_use
                .entry(command.command_id)
                .or_default()
                .insert(user.to_lowercase(), now);
        }
        true
    }
}
