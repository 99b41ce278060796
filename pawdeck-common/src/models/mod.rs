pub mod action;
pub mod command;
pub mod event;
pub mod platform;

pub use action::{Action, BranchRole, SubAction, Trigger, TriggerKind};
pub use command::{Command, CommandPermission, MatchAnchor, MatchMode};
pub use event::{AutomationEvent, EventKind};
pub use platform::{Platform, PlatformSet};
