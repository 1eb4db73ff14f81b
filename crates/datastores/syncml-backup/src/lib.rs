//! Reference DBApi datastore plugin: a tab-separated-file backend
//! exercising every branch of `syncml_dbapi::datastore`'s state
//! machine, used both as a test fixture and as a baseline
//! implementation to copy when writing a real plugin.

mod config;
mod factory;
mod plugin;
mod storage;

pub use config::BackupConfig;
pub use factory::register_native;
pub use plugin::BackupPlugin;
