use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::action::TriggerKind;
use crate::models::platform::Platform;

/// Kind of a normalized inbound platform event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Command,
    Follow,
    Cheer,
    Subscribe,
    Resub,
    GiftSub,
    GiftBomb,
    Raid,
    ChannelPointRedemption,
}

impl EventKind {
    pub fn trigger_kind(&self) -> TriggerKind {
        match self {
            EventKind::Command => TriggerKind::Command,
            EventKind::Follow => TriggerKind::Follow,
            EventKind::Cheer => TriggerKind::Cheer,
            EventKind::Subscribe => TriggerKind::Subscribe,
            EventKind::Resub => TriggerKind::Resub,
            EventKind::GiftSub => TriggerKind::GiftSub,
            EventKind::GiftBomb => TriggerKind::GiftBomb,
            EventKind::Raid => TriggerKind::Raid,
            EventKind::ChannelPointRedemption => TriggerKind::ChannelPointRedemption,
        }
    }
}

/// A normalized event handed to the automation engine. `data` carries the
/// event-specific values (bits, tier, gift count, viewers, reward id, ...)
/// as a loose metadata map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationEvent {
    pub kind: EventKind,
    pub platform: Platform,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl AutomationEvent {
    pub fn new(kind: EventKind, platform: Platform) -> Self {
        Self {
            kind,
            platform,
            user: None,
            message: None,
            data: Map::new(),
        }
    }

    pub fn command(platform: Platform, user: &str, message: &str) -> Self {
        let mut ev = AutomationEvent::new(EventKind::Command, platform);
        ev.user = Some(user.to_string());
        ev.message = Some(message.to_string());
        ev
    }

    pub fn follow(platform: Platform, user: &str) -> Self {
        let mut ev = AutomationEvent::new(EventKind::Follow, platform);
        ev.user = Some(user.to_string());
        ev
    }

    pub fn cheer(platform: Platform, user: &str, bits: i64) -> Self {
        let mut ev = AutomationEvent::new(EventKind::Cheer, platform);
        ev.user = Some(user.to_string());
        ev.data.insert("bits".into(), bits.into());
        ev
    }

    pub fn subscribe(platform: Platform, user: &str, tier: &str) -> Self {
        let mut ev = AutomationEvent::new(EventKind::Subscribe, platform);
        ev.user = Some(user.to_string());
        ev.data.insert("tier".into(), tier.into());
        ev
    }

    pub fn raid(platform: Platform, from_channel: &str, viewers: i64) -> Self {
        let mut ev = AutomationEvent::new(EventKind::Raid, platform);
        ev.user = Some(from_channel.to_string());
        ev.data.insert("viewers".into(), viewers.into());
        ev
    }

    pub fn redemption(platform: Platform, user: &str, reward_id: &str) -> Self {
        let mut ev = AutomationEvent::new(EventKind::ChannelPointRedemption, platform);
        ev.user = Some(user.to_string());
        ev.data.insert("reward_id".into(), reward_id.into());
        ev
    }

    pub fn with_data(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.as_str())
    }

    pub fn data_i64(&self, key: &str) -> Option<i64> {
        self.data.get(key).and_then(|v| v.as_i64())
    }
}
