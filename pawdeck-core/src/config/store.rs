use std::path::{Path, PathBuf};

use tracing::{debug, info};

use pawdeck_common::models::{Action, Command};

use crate::Error;

pub const COMMANDS_FILE: &str = "commands.json";
pub const ACTIONS_FILE: &str = "actions.json";

/// Owns the two persisted configuration documents: an array of commands
/// and an array of actions. Documents tolerate unknown fields so newer
/// dashboards can keep extra metadata in them.
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn commands_path(&self) -> PathBuf {
        self.dir.join(COMMANDS_FILE)
    }

    pub fn actions_path(&self) -> PathBuf {
        self.dir.join(ACTIONS_FILE)
    }

    /// Load the commands document. A missing file is an empty catalog.
    pub fn load_commands(&self) -> Result<Vec<Command>, Error> {
        let path = self.commands_path();
        if !path.exists() {
            debug!("No commands document at {:?}", path);
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&path)?;
        let commands: Vec<Command> = serde_json::from_str(&raw)?;
        info!("Loaded {} command(s) from {:?}", commands.len(), path);
        Ok(commands)
    }

    /// Load the actions document, normalizing every step tree so the
    /// branch-node invariant holds before the interpreter sees it.
    pub fn load_actions(&self) -> Result<Vec<Action>, Error> {
        let path = self.actions_path();
        if !path.exists() {
            debug!("No actions document at {:?}", path);
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&path)?;
        let mut actions: Vec<Action> = serde_json::from_str(&raw)?;
        for action in &mut actions {
            action.normalize();
        }
        info!("Loaded {} action(s) from {:?}", actions.len(), path);
        Ok(actions)
    }

    pub fn save_commands(&self, commands: &[Command]) -> Result<(), Error> {
        self.write_atomic(&self.commands_path(), &serde_json::to_string_pretty(commands)?)
    }

    pub fn save_actions(&self, actions: &[Action]) -> Result<(), Error> {
        self.write_atomic(&self.actions_path(), &serde_json::to_string_pretty(actions)?)
    }

    /// Write through a temp file and rename, so a crash mid-write never
    /// leaves a truncated document behind.
    fn write_atomic(&self, path: &Path, contents: &str) -> Result<(), Error> {
        std::fs::create_dir_all(&self.dir)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}
