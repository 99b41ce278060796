// File: src/services/handlers/mod.rs
//
// Category step handlers. Each handler is registered in the dispatch table
// under its type tag; the interpreter resolves tags through that table
// instead of a match over every step kind.

pub mod action_control;
pub mod core;
pub mod datetime;
pub mod file;
pub mod media;
pub mod network;
pub mod platform;
pub mod variables;

use std::collections::HashMap;
use std::sync::Arc;

use crate::services::interpreter::StepHandler;

/// Build the registry of built-in handlers, keyed by step type tag.
pub fn builtin_handlers() -> HashMap<&'static str, Arc<dyn StepHandler>> {
    let all: Vec<Arc<dyn StepHandler>> = vec![
        // core
        Arc::new(self::core::DelayHandler),
        Arc::new(self::core::RandomNumberHandler),
        Arc::new(self::core::CommentHandler),
        // variables
        Arc::new(variables::SetVariableHandler),
        Arc::new(variables::GetVariableHandler),
        Arc::new(variables::SetUserVariableHandler),
        Arc::new(variables::GetUserVariableHandler),
        Arc::new(variables::MathHandler),
        Arc::new(variables::StringOpHandler),
        // file
        Arc::new(file::FileWriteHandler),
        Arc::new(file::FileReadHandler),
        // media
        Arc::new(media::PlaySoundHandler),
        // network
        Arc::new(network::HttpRequestHandler::new()),
        // date/time
        Arc::new(datetime::CurrentDatetimeHandler),
        // action control
        Arc::new(action_control::RunActionHandler),
        Arc::new(action_control::SetActionStateHandler),
        // platform capability adapters
        Arc::new(platform::ChatMessageHandler),
        Arc::new(platform::ModerationHandler),
        Arc::new(platform::ChannelUpdateHandler),
        Arc::new(platform::SceneChangeHandler),
        Arc::new(platform::GetSceneHandler),
        Arc::new(platform::SourceVisibilityHandler),
        Arc::new(platform::SetTextSourceHandler),
        Arc::new(platform::SetBrowserSourceHandler),
        Arc::new(platform::SetMediaSourceHandler),
        Arc::new(platform::RecordControlHandler),
        Arc::new(platform::StreamControlHandler),
        Arc::new(platform::BrokerMessageHandler),
        Arc::new(platform::BrokerDmHandler),
        Arc::new(platform::BrokerRoleHandler),
        Arc::new(platform::BrokerChannelCreateHandler),
        Arc::new(platform::UserLookupHandler),
    ];

    let mut map: HashMap<&'static str, Arc<dyn StepHandler>> = HashMap::new();
    for handler in all {
        map.insert(handler.kind(), handler);
    }
    map
}
