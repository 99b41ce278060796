pub mod snapshot;
pub mod store;
pub mod watcher;

pub use snapshot::Snapshot;
pub use store::ConfigStore;
pub use watcher::ConfigWatcher;
