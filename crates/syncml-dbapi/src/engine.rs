//! Host-side orchestration facade tying the loader, the three context
//! registries, and the disposer registry into the single sequence of
//! calls a driving layer (a CLI, or a C ABI crate) actually makes:
//! create module -> open session -> create datastore -> read/write ->
//! close datastore -> close session -> delete module.
//!
//! Grounded on `dbapi.cpp::TDB_Api_Config::Connect`'s overall call
//! sequence, restructured as a single synchronous facade since every
//! driving layer in this workspace (`syncml-cli`, `syncml-native-ffi`)
//! needs the exact same orchestration and would otherwise duplicate it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::context::datastore::DatastoreHandle;
use crate::context::module::ModuleRegistry as ModuleContextRegistry;
use crate::context::session::SessionRegistry;
use crate::dispose::DisposerRegistry;
use crate::error::{Error, Result};
use crate::global_context::GlobalContextChain;
use crate::ids::{DatastoreContext, ModuleContext, SessionContext};
use crate::registry::ModuleRegistry as ModuleLoader;

pub struct Engine {
    loader: ModuleLoader,
    modules: ModuleContextRegistry,
    sessions: SessionRegistry,
    datastores: Mutex<HashMap<DatastoreContext, Arc<DatastoreHandle>>>,
    pub disposers: DisposerRegistry,
    global_contexts: GlobalContextChain,
    glob_context_by_module: Mutex<HashMap<ModuleContext, String>>,
}

impl Engine {
    pub fn new(loader: ModuleLoader) -> Self {
        Self {
            loader,
            modules: ModuleContextRegistry::new(),
            sessions: SessionRegistry::new(),
            datastores: Mutex::new(HashMap::new()),
            disposers: DisposerRegistry::new(),
            global_contexts: GlobalContextChain::new(),
            glob_context_by_module: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        Ok(Self::new(ModuleLoader::from_path(path)?))
    }

    /// Loads every configured module, blocking the calling thread.
    /// The loader's own `load_all` is `async` (see DESIGN.md) because
    /// its per-module I/O genuinely benefits from running concurrently;
    /// this facade's callers (a C ABI, a synchronous CLI command) are
    /// not, so `futures::executor::block_on` drives it to completion
    /// without pulling in a full `tokio` runtime for what is, from
    /// here, a single blocking call.
    pub fn load_modules(&self) {
        futures::executor::block_on(self.loader.load_all())
    }

    /// `ConnectModule`: creates (or re-attaches to) a module context
    /// for a module named in the loaded configuration. When the
    /// negotiated capability string carries a `GlobContext` key (see
    /// spec.md §3/§4.D), this module's handle adopts or creates a
    /// shared node under that name in the engine-wide global context
    /// chain and holds one reference to it for as long as the module
    /// context lives; the `Already`-softened re-attach path (handled
    /// inside `ModuleContextRegistry::create_context`) is recognised
    /// here by the module id already being present in
    /// `glob_context_by_module`, so a second `create_module` call for
    /// an already-loaded name does not inflate the refcount.
    pub fn create_module(&self, name: &str) -> Result<ModuleContext> {
        let plugin = futures::executor::block_on(self.loader.get(name))
            .ok_or_else(|| Error::Loader(format!("module '{name}' is not configured or failed to load")))?;
        let handle = self.modules.create_context(name, plugin)?;

        let mut glob_map = self.glob_context_by_module.lock().unwrap();
        if !glob_map.contains_key(&handle.id) {
            if let Some(glob_name) = handle.capabilities.get("GlobContext") {
                self.global_contexts
                    .acquire(glob_name, || std::ptr::null_mut());
                glob_map.insert(handle.id, glob_name.to_string());
            }
        }
        drop(glob_map);

        Ok(handle.id)
    }

    pub fn delete_module(&self, id: ModuleContext) -> Result<()> {
        if let Some(glob_name) = self.glob_context_by_module.lock().unwrap().remove(&id) {
            self.global_contexts.release(&glob_name);
        }
        self.modules.delete_context(id)
    }

    /// `Session_CreateContext`: always succeeds at this layer per the
    /// soft-failure Open Question decision in DESIGN.md.
    pub fn open_session(&self, module: ModuleContext) -> SessionContext {
        self.sessions.open(module).id
    }

    pub fn close_session(&self, id: SessionContext) -> Result<()> {
        if self.sessions.close(id) {
            Ok(())
        } else {
            Err(Error::NotFound)
        }
    }

    /// `CreateContext`: opens a datastore against the plugin loaded
    /// into `module`.
    pub fn create_datastore(
        &self,
        module: ModuleContext,
        datastore_name: &str,
        device_key: &str,
        user_key: &str,
        admin_mode: bool,
    ) -> Result<DatastoreContext> {
        let module_handle = self.modules.get(module).ok_or(Error::NotFound)?;
        let handle = Arc::new(DatastoreHandle::open(
            module_handle.plugin.clone(),
            datastore_name,
            device_key,
            user_key,
            admin_mode,
        )?);
        let id = handle.id;
        self.datastores.lock().unwrap().insert(id, handle);
        Ok(id)
    }

    pub fn datastore(&self, id: DatastoreContext) -> Option<Arc<DatastoreHandle>> {
        self.datastores.lock().unwrap().get(&id).cloned()
    }

    pub fn close_datastore(&self, id: DatastoreContext) -> Result<()> {
        let handle = self.datastores.lock().unwrap().remove(&id).ok_or(Error::NotFound)?;
        handle.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Capabilities;
    use crate::config::ModuleConfig;
    use crate::plugin::native::NATIVE_REGISTRY;
    use crate::plugin::DatastorePlugin;

    struct Dummy;
    impl DatastorePlugin for Dummy {
        fn name(&self) -> &str {
            "engine-test-dummy"
        }
        fn capabilities(&self) -> Capabilities {
            Capabilities::parse("MinVersion:300\n")
        }
        fn create_context(
            &self,
            _name: &str,
            _device_key: &str,
            _user_key: &str,
            _admin_mode: bool,
        ) -> Result<DatastoreContext> {
            Ok(DatastoreContext::new())
        }
    }

    fn engine_with_dummy_configured() -> Engine {
        NATIVE_REGISTRY.register(Arc::new(Dummy));
        let mut config = ModuleConfig::default();
        config.modules.push(crate::config::PluginEntry {
            name: "engine-test-dummy".to_string(),
            path: "lib:engine-test-dummy".to_string(),
            options: None,
        });
        Engine::new(ModuleLoader::from_config(config))
    }

    #[test]
    fn full_lifecycle_round_trips() {
        let engine = engine_with_dummy_configured();
        let module = engine.create_module("engine-test-dummy").unwrap();
        let session = engine.open_session(module);
        let datastore = engine
            .create_datastore(module, "contacts", "dev1", "user1", false)
            .unwrap();
        assert!(engine.datastore(datastore).is_some());
        engine.close_datastore(datastore).unwrap();
        assert!(engine.datastore(datastore).is_none());
        engine.close_session(session).unwrap();
        engine.delete_module(module).unwrap();
    }

    #[test]
    fn creating_datastore_on_unknown_module_is_not_found() {
        let engine = engine_with_dummy_configured();
        let bogus = ModuleContext::new();
        assert!(matches!(
            engine.create_datastore(bogus, "contacts", "dev1", "user1", false),
            Err(Error::NotFound)
        ));
    }

    struct GlobContextDummy;
    impl DatastorePlugin for GlobContextDummy {
        fn name(&self) -> &str {
            "engine-test-globcontext"
        }
        fn capabilities(&self) -> Capabilities {
            Capabilities::parse("MinVersion:300\nGlobContext:shared-db\n")
        }
    }

    #[test]
    fn module_with_glob_context_shares_one_node_across_two_loads() {
        NATIVE_REGISTRY.register(Arc::new(GlobContextDummy));
        let mut config = ModuleConfig::default();
        config.modules.push(crate::config::PluginEntry {
            name: "engine-test-globcontext".to_string(),
            path: "lib:engine-test-globcontext".to_string(),
            options: None,
        });
        let engine = Engine::new(ModuleLoader::from_config(config));

        let module = engine.create_module("engine-test-globcontext").unwrap();
        assert_eq!(engine.global_contexts.len(), 1);

        // Re-attaching to the already-loaded module must not inflate
        // the chain's refcount (the `Already`-softening path).
        let same_module = engine.create_module("engine-test-globcontext").unwrap();
        assert_eq!(module, same_module);
        assert_eq!(engine.global_contexts.len(), 1);

        engine.delete_module(module).unwrap();
        assert!(engine.global_contexts.is_empty());
    }
}
