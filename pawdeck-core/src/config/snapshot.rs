use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use pawdeck_common::models::{Action, Command};

use crate::services::action_service::ActionService;
use crate::services::command_service::CommandService;
use crate::Error;

pub const SNAPSHOT_VERSION: u32 = 1;

/// A single JSON document bundling both collections, used for backup and
/// restore. Unknown extra fields in an imported snapshot are ignored.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    #[serde(default)]
    pub commands: Vec<Command>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Snapshot {
    /// Capture the current catalogs.
    pub fn export(commands: &CommandService, actions: &ActionService) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            exported_at: Utc::now(),
            commands: commands.list_commands(),
            actions: actions.list_actions(),
        }
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and apply a snapshot. Parsing happens before any catalog is
    /// touched: malformed JSON reports failure with no partial mutation.
    pub fn import(
        raw: &str,
        commands: &CommandService,
        actions: &ActionService,
    ) -> Result<(), Error> {
        let snapshot: Snapshot = serde_json::from_str(raw)?;
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(Error::Config(format!(
                "snapshot version {} is newer than supported version {}",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }
        info!(
            "Importing snapshot from {} ({} commands, {} actions)",
            snapshot.exported_at,
            snapshot.commands.len(),
            snapshot.actions.len()
        );
        commands.replace_all(snapshot.commands);
        actions.replace_all(snapshot.actions);
        Ok(())
    }
}
