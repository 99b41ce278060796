// File: pawdeck-common/src/traits/capabilities.rs
//
// Narrow, swappable interfaces to the platform clients that live outside
// the automation core. The interpreter only ever talks to these traits;
// the embedding process decides what actually backs them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Sending chat lines to the connected stream chat.
#[async_trait]
pub trait ChatCapability: Send + Sync {
    /// `as_bot` selects the bot account over the broadcaster account.
    async fn send_message(&self, text: &str, as_bot: bool) -> Result<(), Error>;
}

/// Chat moderation surface.
#[async_trait]
pub trait ModerationCapability: Send + Sync {
    async fn timeout_user(&self, user: &str, seconds: u64, reason: Option<&str>)
        -> Result<(), Error>;
    async fn ban_user(&self, user: &str, reason: Option<&str>) -> Result<(), Error>;
    async fn unban_user(&self, user: &str) -> Result<(), Error>;
    async fn clear_chat(&self) -> Result<(), Error>;
    /// `None` disables slow mode.
    async fn set_slow_mode(&self, seconds: Option<u64>) -> Result<(), Error>;
}

/// Broadcast/channel metadata operations.
#[async_trait]
pub trait ChannelCapability: Send + Sync {
    async fn set_title(&self, title: &str) -> Result<(), Error>;
    async fn set_category(&self, category: &str) -> Result<(), Error>;
    async fn create_marker(&self, description: Option<&str>) -> Result<(), Error>;
    async fn run_commercial(&self, length_secs: u64) -> Result<(), Error>;
}

/// Scene/source control of the streaming software.
#[async_trait]
pub trait SceneCapability: Send + Sync {
    async fn set_current_scene(&self, name: &str) -> Result<(), Error>;
    async fn current_scene(&self) -> Result<String, Error>;
    async fn set_source_visible(
        &self,
        scene: Option<&str>,
        source: &str,
        visible: bool,
    ) -> Result<(), Error>;
    async fn set_text_source(&self, source: &str, text: &str) -> Result<(), Error>;
    async fn set_browser_source(&self, source: &str, url: &str) -> Result<(), Error>;
    async fn set_media_source(&self, source: &str, path: &str) -> Result<(), Error>;
    async fn set_recording(&self, active: bool) -> Result<(), Error>;
    async fn set_streaming(&self, active: bool) -> Result<(), Error>;
}

/// Message-broker side (community server: channels, DMs, roles).
#[async_trait]
pub trait BrokerCapability: Send + Sync {
    async fn send_message(&self, channel: &str, text: &str) -> Result<(), Error>;
    async fn send_direct_message(&self, user: &str, text: &str) -> Result<(), Error>;
    async fn add_role(&self, user: &str, role: &str) -> Result<(), Error>;
    async fn remove_role(&self, user: &str, role: &str) -> Result<(), Error>;
    async fn create_channel(&self, name: &str) -> Result<(), Error>;
}

/// Profile fields returned by user lookups.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub login: String,
    pub display_name: String,
    pub description: String,
    pub profile_image_url: String,
}

#[async_trait]
pub trait UserLookupCapability: Send + Sync {
    async fn user_by_login(&self, login: &str) -> Result<Option<UserProfile>, Error>;
    async fn user_by_id(&self, id: &str) -> Result<Option<UserProfile>, Error>;
}

/// Filesystem access used by the file step handlers.
#[async_trait]
pub trait FileAccess: Send + Sync {
    async fn write_text(&self, path: &str, contents: &str, append: bool) -> Result<(), Error>;
    async fn read_text(&self, path: &str) -> Result<String, Error>;
}

/// Local media playback.
#[async_trait]
pub trait MediaPlayback: Send + Sync {
    /// When `wait` is true the call resolves only after playback finishes.
    async fn play_sound(&self, path: &str, volume: f32, wait: bool) -> Result<(), Error>;
}
