//! LIB backend: plugins statically linked into the host process.
//!
//! Grounded on `plugin/native.rs`'s `NativeProviderRegistry`, but
//! replacing folder-scanned dynamic libraries with a compiled-in
//! namespace: a `LIB`-mode plugin name resolves entirely within this
//! process, the way `platform_DLL.cpp::DLWrapper::connect` resolves a
//! `//static/SYM=ADDR` symbol table without ever calling `dlopen`.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use super::DatastorePlugin;

#[derive(Default)]
pub struct NativeRegistry {
    plugins: RwLock<HashMap<String, Arc<dyn DatastorePlugin>>>,
}

impl NativeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, plugin: Arc<dyn DatastorePlugin>) {
        self.plugins
            .write()
            .unwrap()
            .insert(plugin.name().to_string(), plugin);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn DatastorePlugin>> {
        self.plugins.read().unwrap().get(name).cloned()
    }

    pub fn list(&self) -> Vec<Arc<dyn DatastorePlugin>> {
        self.plugins.read().unwrap().values().cloned().collect()
    }
}

/// Process-wide registry for plugins compiled into the same binary as
/// the host. Populated by each plugin crate's own `inventory`-style
/// `register` call (here: an explicit call at startup, since the
/// corpus does not pull in an inventory-collection crate).
pub static NATIVE_REGISTRY: Lazy<NativeRegistry> = Lazy::new(NativeRegistry::new);
