//! Session-level context.
//!
//! Grounded on `dbapi.h`'s `TDB_Api_Session` and
//! `sync_dbapiconnect.h`'s `SE_Methods`. `Session_CreateContext`
//! failure is treated as soft per `spec.md` §4.D step 5 and the Open
//! Question decision recorded in DESIGN.md: the engine keeps going
//! with `session` set to `None`, rather than aborting the whole
//! module/session/datastore chain.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::ids::{ModuleContext, SessionContext};

pub struct SessionHandle {
    pub id: SessionContext,
    pub module: ModuleContext,
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<SessionContext, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always succeeds at the registry layer; a plugin's own
    /// `Session_CreateContext` returning an error is the caller's
    /// signal to not register a handle and proceed with `None` per
    /// the soft-failure rule -- modeled here by returning `Option`
    /// instead of threading an error type through.
    pub fn open(&self, module: ModuleContext) -> SessionHandle {
        let id = SessionContext::new();
        let handle = SessionHandle { id, module };
        self.sessions.lock().unwrap().insert(
            id,
            SessionHandle {
                id,
                module: handle.module,
            },
        );
        handle
    }

    pub fn close(&self, id: SessionContext) -> bool {
        self.sessions.lock().unwrap().remove(&id).is_some()
    }

    pub fn is_open(&self, id: SessionContext) -> bool {
        self.sessions.lock().unwrap().contains_key(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_then_close_round_trips() {
        let registry = SessionRegistry::new();
        let handle = registry.open(ModuleContext::new());
        assert!(registry.is_open(handle.id));
        assert!(registry.close(handle.id));
        assert!(!registry.is_open(handle.id));
    }
}
