// File: src/config/watcher.rs

use std::sync::Arc;
use std::thread;

use notify::event::EventKind;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, error, info, warn};

use crate::config::store::{ConfigStore, ACTIONS_FILE, COMMANDS_FILE};
use crate::services::action_service::ActionService;
use crate::services::command_service::CommandService;
use crate::Error;

/// Watches the configuration directory and reloads a catalog whenever its
/// document changes on disk. File events arrive on a background thread;
/// the watcher lives there for as long as the channel stays open.
pub struct ConfigWatcher {
    _handle: thread::JoinHandle<()>,
}

impl ConfigWatcher {
    pub fn spawn(
        store: ConfigStore,
        commands: Arc<CommandService>,
        actions: Arc<ActionService>,
    ) -> Result<Self, Error> {
        let dir = store.dir().to_path_buf();
        std::fs::create_dir_all(&dir)?;

        let handle = thread::spawn(move || {
            let (watch_send, watch_recv) = std::sync::mpsc::channel();

            let mut watcher = match RecommendedWatcher::new(
                move |res: std::result::Result<Event, notify::Error>| match res {
                    Ok(event) => {
                        let _ = watch_send.send(event);
                    }
                    Err(e) => {
                        error!("Config watcher error: {:?}", e);
                    }
                },
                Config::default(),
            ) {
                Ok(w) => w,
                Err(e) => {
                    error!("Failed to create config watcher: {:?}", e);
                    return;
                }
            };

            if let Err(e) = watcher.watch(&dir, RecursiveMode::NonRecursive) {
                error!("Failed to watch config directory {:?}: {:?}", dir, e);
                return;
            }
            info!("Watching {:?} for configuration changes", dir);

            loop {
                match watch_recv.recv() {
                    Ok(event) => {
                        if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                            continue;
                        }
                        for path in &event.paths {
                            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                                continue;
                            };
                            match name {
                                COMMANDS_FILE => match store.load_commands() {
                                    Ok(loaded) => {
                                        info!("Reloading {} command(s) after file change", loaded.len());
                                        commands.replace_all(loaded);
                                    }
                                    Err(e) => {
                                        warn!("Ignoring unreadable commands document: {:?}", e);
                                    }
                                },
                                ACTIONS_FILE => match store.load_actions() {
                                    Ok(loaded) => {
                                        info!("Reloading {} action(s) after file change", loaded.len());
                                        actions.replace_all(loaded);
                                    }
                                    Err(e) => {
                                        warn!("Ignoring unreadable actions document: {:?}", e);
                                    }
                                },
                                other => {
                                    debug!("Ignoring change to unrelated file {}", other);
                                }
                            }
                        }
                    }
                    Err(_) => break, // Channel closed
                }
            }
        });

        Ok(Self { _handle: handle })
    }
}
