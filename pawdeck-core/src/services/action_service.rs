use std::sync::RwLock;

use tracing::debug;
use uuid::Uuid;

use pawdeck_common::models::{Action, AutomationEvent, Trigger, TriggerKind};

use crate::Error;

/// The action catalog: stores action definitions and resolves which
/// actions are triggered by a given event.
pub struct ActionService {
    actions: RwLock<Vec<Action>>,
}

impl ActionService {
    pub fn new() -> Self {
        Self {
            actions: RwLock::new(Vec::new()),
        }
    }

    // ----------------------------------------------------------------
    // CRUD
    // ----------------------------------------------------------------

    pub fn create_action(&self, mut action: Action) -> Action {
        action.normalize();
        debug!("Creating action '{}'", action.name);
        let mut lock = self.actions.write().unwrap();
        lock.push(action.clone());
        action
    }

    pub fn update_action(&self, action: &Action) -> Result<(), Error> {
        let mut lock = self.actions.write().unwrap();
        match lock.iter_mut().find(|a| a.action_id == action.action_id) {
            Some(slot) => {
                let mut updated = action.clone();
                updated.normalize();
                *slot = updated;
                Ok(())
            }
            None => Err(Error::NotFound(format!(
                "action {} not found",
                action.action_id
            ))),
        }
    }

    pub fn delete_action(&self, action_id: Uuid) -> Result<(), Error> {
        let mut lock = self.actions.write().unwrap();
        let before = lock.len();
        lock.retain(|a| a.action_id != action_id);
        if lock.len() == before {
            return Err(Error::NotFound(format!("action {} not found", action_id)));
        }
        Ok(())
    }

    pub fn set_action_enabled(&self, action_id: Uuid, enabled: bool) -> Result<(), Error> {
        let mut lock = self.actions.write().unwrap();
        match lock.iter_mut().find(|a| a.action_id == action_id) {
            Some(action) => {
                action.enabled = enabled;
                Ok(())
            }
            None => Err(Error::NotFound(format!("action {} not found", action_id))),
        }
    }

    pub fn get_action(&self, action_id: Uuid) -> Option<Action> {
        let lock = self.actions.read().unwrap();
        lock.iter().find(|a| a.action_id == action_id).cloned()
    }

    pub fn list_actions(&self) -> Vec<Action> {
        self.actions.read().unwrap().clone()
    }

    /// Swap the whole catalog. Steps are normalized on the way in so the
    /// branch-node invariant holds for everything the interpreter sees.
    pub fn replace_all(&self, actions: Vec<Action>) {
        let mut normalized = actions;
        for action in &mut normalized {
            action.normalize();
        }
        let mut lock = self.actions.write().unwrap();
        debug!("Replacing action catalog: {} -> {} entries", lock.len(), normalized.len());
        *lock = normalized;
    }

    // ----------------------------------------------------------------
    // Trigger resolution
    // ----------------------------------------------------------------

    /// Every enabled action having at least one enabled trigger of `kind`
    /// whose type-specific filter matches the event. For command triggers
    /// the engine passes the id of the command it already matched.
    pub fn find_actions_by_trigger(
        &self,
        kind: TriggerKind,
        event: &AutomationEvent,
        command_id: Option<Uuid>,
    ) -> Vec<Action> {
        let lock = self.actions.read().unwrap();
        lock.iter()
            .filter(|action| {
                action.enabled
                    && action
                        .triggers
                        .iter()
                        .any(|t| trigger_matches(t, kind, event, command_id))
            })
            .cloned()
            .collect()
    }
}

impl Default for ActionService {
    fn default() -> Self {
        Self::new()
    }
}

fn trigger_matches(
    trigger: &Trigger,
    kind: TriggerKind,
    event: &AutomationEvent,
    command_id: Option<Uuid>,
) -> bool {
    if !trigger.enabled || trigger.kind != kind {
        return false;
    }
    if trigger.excludes(event.user.as_deref()) {
        return false;
    }
    match kind {
        TriggerKind::Command => trigger.command_id.is_some() && trigger.command_id == command_id,
        TriggerKind::ChannelPointRedemption => match &trigger.reward_id {
            Some(reward_id) => event.data_str("reward_id") == Some(reward_id.as_str()),
            None => true,
        },
        TriggerKind::Cheer => amount_in_range(trigger, event.data_i64("bits")),
        TriggerKind::GiftBomb => amount_in_range(trigger, event.data_i64("count")),
        TriggerKind::Raid => amount_in_range(trigger, event.data_i64("viewers")),
        TriggerKind::Subscribe | TriggerKind::Resub => match &trigger.tier {
            Some(tier) => event.data_str("tier") == Some(tier.as_str()),
            None => true,
        },
        TriggerKind::Follow | TriggerKind::GiftSub => true,
    }
}

fn amount_in_range(trigger: &Trigger, amount: Option<i64>) -> bool {
    if trigger.min_amount.is_none() && trigger.max_amount.is_none() {
        return true;
    }
    let Some(amount) = amount else {
        return false;
    };
    if let Some(min) = trigger.min_amount {
        if amount < min {
            return false;
        }
    }
    if let Some(max) = trigger.max_amount {
        if amount > max {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pawdeck_common::models::Platform;

    fn action_with_trigger(trigger: Trigger) -> Action {
        let mut action = Action::new("test");
        action.triggers.push(trigger);
        action
    }

    #[test]
    fn command_trigger_requires_id_equality() {
        let svc = ActionService::new();
        let cmd_id = Uuid::new_v4();
        svc.create_action(action_with_trigger(Trigger::for_command(cmd_id)));

        let event = AutomationEvent::command(Platform::Twitch, "bob", "!so alice");
        assert_eq!(
            svc.find_actions_by_trigger(TriggerKind::Command, &event, Some(cmd_id)).len(),
            1
        );
        assert!(svc
            .find_actions_by_trigger(TriggerKind::Command, &event, Some(Uuid::new_v4()))
            .is_empty());
    }

    #[test]
    fn redemption_trigger_filters_on_reward_id() {
        let svc = ActionService::new();
        let mut trigger = Trigger::new(TriggerKind::ChannelPointRedemption);
        trigger.reward_id = Some("reward-1".into());
        svc.create_action(action_with_trigger(trigger));

        let hit = AutomationEvent::redemption(Platform::Twitch, "bob", "reward-1");
        let miss = AutomationEvent::redemption(Platform::Twitch, "bob", "reward-2");
        assert_eq!(
            svc.find_actions_by_trigger(TriggerKind::ChannelPointRedemption, &hit, None).len(),
            1
        );
        assert!(svc
            .find_actions_by_trigger(TriggerKind::ChannelPointRedemption, &miss, None)
            .is_empty());
    }

    #[test]
    fn cheer_trigger_honors_bit_range() {
        let svc = ActionService::new();
        let mut trigger = Trigger::new(TriggerKind::Cheer);
        trigger.min_amount = Some(100);
        trigger.max_amount = Some(500);
        svc.create_action(action_with_trigger(trigger));

        let low = AutomationEvent::cheer(Platform::Twitch, "bob", 50);
        let mid = AutomationEvent::cheer(Platform::Twitch, "bob", 250);
        let high = AutomationEvent::cheer(Platform::Twitch, "bob", 1000);
        assert!(svc.find_actions_by_trigger(TriggerKind::Cheer, &low, None).is_empty());
        assert_eq!(svc.find_actions_by_trigger(TriggerKind::Cheer, &mid, None).len(), 1);
        assert!(svc.find_actions_by_trigger(TriggerKind::Cheer, &high, None).is_empty());
    }

    #[test]
    fn excluded_users_never_fire() {
        let svc = ActionService::new();
        let mut trigger = Trigger::new(TriggerKind::Follow);
        trigger.excluded_users.push("nightbot".into());
        svc.create_action(action_with_trigger(trigger));

        let excluded = AutomationEvent::follow(Platform::Twitch, "Nightbot");
        let normal = AutomationEvent::follow(Platform::Twitch, "viewer");
        assert!(svc.find_actions_by_trigger(TriggerKind::Follow, &excluded, None).is_empty());
        assert_eq!(svc.find_actions_by_trigger(TriggerKind::Follow, &normal, None).len(), 1);
    }

    #[test]
    fn disabled_actions_and_triggers_are_skipped() {
        let svc = ActionService::new();
        let mut disabled_action = action_with_trigger(Trigger::new(TriggerKind::Follow));
        disabled_action.enabled = false;
        svc.create_action(disabled_action);

        let mut disabled_trigger = Trigger::new(TriggerKind::Follow);
        disabled_trigger.enabled = false;
        svc.create_action(action_with_trigger(disabled_trigger));

        let event = AutomationEvent::follow(Platform::Twitch, "viewer");
        assert!(svc.find_actions_by_trigger(TriggerKind::Follow, &event, None).is_empty());
    }

    #[test]
    fn subscribe_tier_filter() {
        let svc = ActionService::new();
        let mut trigger = Trigger::new(TriggerKind::Subscribe);
        trigger.tier = Some("3000".into());
        svc.create_action(action_with_trigger(trigger));

        let t3 = AutomationEvent::subscribe(Platform::Twitch, "bob", "3000");
        let t1 = AutomationEvent::subscribe(Platform::Twitch, "bob", "1000");
        assert_eq!(svc.find_actions_by_trigger(TriggerKind::Subscribe, &t3, None).len(), 1);
        assert!(svc.find_actions_by_trigger(TriggerKind::Subscribe, &t1, None).is_empty());
    }
}
