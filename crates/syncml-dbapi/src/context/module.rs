//! Module-level context.
//!
//! Grounded on `dbapi.h`'s `TDB_Api_Config`: a module context owns a
//! loaded plugin and the capability block it negotiated at load time.
//! A second `create_context` call for a name already loaded is
//! softened from `Already` to success and returns the existing
//! context, per `dbapi.cpp::Connect`'s
//! `if (err==LOCERR_ALREADY) err=LOCERR_OK;`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::capability::Capabilities;
use crate::error::{Error, Result};
use crate::ids::ModuleContext;
use crate::plugin::DatastorePlugin;

pub struct ModuleHandle {
    pub id: ModuleContext,
    pub plugin: Arc<dyn DatastorePlugin>,
    pub capabilities: Capabilities,
}

#[derive(Default)]
pub struct ModuleRegistry {
    by_name: Mutex<HashMap<String, ModuleContext>>,
    by_id: Mutex<HashMap<ModuleContext, Arc<ModuleHandle>>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a module context for `name`, or returns the existing
    /// one if already created (the `Already`-softening rule).
    pub fn create_context(
        &self,
        name: &str,
        plugin: Arc<dyn DatastorePlugin>,
    ) -> Result<Arc<ModuleHandle>> {
        let mut by_name = self.by_name.lock().unwrap();
        if let Some(existing) = by_name.get(name) {
            let by_id = self.by_id.lock().unwrap();
            return by_id
                .get(existing)
                .cloned()
                .ok_or_else(|| Error::Fatal("module registry inconsistent".into()));
        }

        let capabilities = plugin.capabilities();
        capabilities.check_min_version(crate::capability::ENGINE_SDK_VERSION)?;

        let id = ModuleContext::new();
        let handle = Arc::new(ModuleHandle {
            id,
            plugin,
            capabilities,
        });
        by_name.insert(name.to_string(), id);
        self.by_id.lock().unwrap().insert(id, handle.clone());
        Ok(handle)
    }

    pub fn get(&self, id: ModuleContext) -> Option<Arc<ModuleHandle>> {
        self.by_id.lock().unwrap().get(&id).cloned()
    }

    pub fn delete_context(&self, id: ModuleContext) -> Result<()> {
        let mut by_id = self.by_id.lock().unwrap();
        let handle = by_id.remove(&id).ok_or(Error::NotFound)?;
        let mut by_name = self.by_name.lock().unwrap();
        by_name.retain(|_, v| *v != handle.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy;
    impl DatastorePlugin for Dummy {
        fn name(&self) -> &str {
            "dummy"
        }
    }

    #[test]
    fn repeated_create_context_is_softened_to_success() {
        let registry = ModuleRegistry::new();
        let a = registry.create_context("db", Arc::new(Dummy)).unwrap();
        let b = registry.create_context("db", Arc::new(Dummy)).unwrap();
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn delete_context_removes_both_indices() {
        let registry = ModuleRegistry::new();
        let handle = registry.create_context("db", Arc::new(Dummy)).unwrap();
        registry.delete_context(handle.id).unwrap();
        assert!(registry.get(handle.id).is_none());
        assert!(registry.create_context("db", Arc::new(Dummy)).is_ok());
    }
}
