//! Plugin entry points: the `plugin_factory` symbol a dynamic-load host
//! resolves via `libloading`, and a `register_native` helper for a host
//! that links this crate in directly.

use std::sync::Arc;

use syncml_dbapi::plugin::DatastorePlugin;
use syncml_dbapi::plugin::native::NATIVE_REGISTRY;

use crate::config::BackupConfig;
use crate::plugin::BackupPlugin;

/// Registers a default-configured instance into the process-wide
/// native registry, for a host that compiles this crate in rather than
/// loading it as a shared library.
pub fn register_native() {
    NATIVE_REGISTRY.register(Arc::new(BackupPlugin::new(BackupConfig::default())));
}

#[unsafe(no_mangle)]
pub extern "C" fn plugin_factory() -> *mut dyn DatastorePlugin {
    let plugin: Box<dyn DatastorePlugin> = Box::new(BackupPlugin::new(BackupConfig::default()));
    Box::into_raw(plugin)
}
