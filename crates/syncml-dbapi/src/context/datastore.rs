//! Datastore-level context.
//!
//! Ties a plugin's `DatastorePlugin` implementation to the state
//! machine in `datastore::state`, enforcing the `Closed -> Open ->
//! Reading|Writing -> Open -> Closed` contract at the call-dispatch
//! layer instead of trusting every plugin to self-police it. Grounded
//! on `dbapi.h`'s `TDB_Api` method ordering.

use std::sync::{Arc, Mutex};

use crate::datastore::{DatastoreState, Token};
use crate::error::Result;
use crate::ids::DatastoreContext;
use crate::plugin::{DatastorePlugin, ReadOutcome};

pub struct DatastoreHandle {
    pub id: DatastoreContext,
    plugin: Arc<dyn DatastorePlugin>,
    state: Mutex<DatastoreState>,
}

impl DatastoreHandle {
    pub fn open(
        plugin: Arc<dyn DatastorePlugin>,
        name: &str,
        device_key: &str,
        user_key: &str,
        admin_mode: bool,
    ) -> Result<Self> {
        let id = plugin.create_context(name, device_key, user_key, admin_mode)?;
        let mut state = DatastoreState::new();
        state.open()?;
        Ok(Self {
            id,
            plugin,
            state: Mutex::new(state),
        })
    }

    pub fn start_data_read(&self, last_token: &Token, resume_token: &Token) -> Result<()> {
        self.state.lock().unwrap().start_read()?;
        self.plugin.start_data_read(self.id, last_token, resume_token)
    }

    pub fn read_next_item(&self) -> Result<ReadOutcome> {
        self.plugin.read_next_item(self.id)
    }

    pub fn end_data_read(&self) -> Result<()> {
        self.plugin.end_data_read(self.id)?;
        self.state.lock().unwrap().end_read()
    }

    pub fn start_data_write(&self) -> Result<()> {
        self.state.lock().unwrap().start_write()?;
        self.plugin.start_data_write(self.id)
    }

    pub fn insert_item(&self, data: &[u8]) -> Result<String> {
        self.plugin.insert_item(self.id, data)
    }

    pub fn update_item(&self, local_id: &str, data: &[u8]) -> Result<()> {
        self.plugin.update_item(self.id, local_id, data)
    }

    pub fn delete_item(&self, local_id: &str) -> Result<()> {
        self.plugin.delete_item(self.id, local_id)
    }

    pub fn end_data_write(&self, success: bool) -> Result<Token> {
        let new_token = self.plugin.end_data_write(self.id, success)?;
        self.state.lock().unwrap().end_write()?;
        Ok(new_token)
    }

    pub fn close(&self) -> Result<()> {
        self.state.lock().unwrap().close()?;
        self.plugin.delete_context(self.id)
    }

    pub fn current_state(&self) -> crate::datastore::State {
        self.state.lock().unwrap().current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::DatastoreContext;
    use std::sync::Mutex as StdMutex;

    struct FakePlugin {
        items: StdMutex<Vec<Vec<u8>>>,
    }

    impl DatastorePlugin for FakePlugin {
        fn name(&self) -> &str {
            "fake"
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
        fn start_data_write(&self, _ctx: DatastoreContext) -> Result<()> {
            Ok(())
        }
        fn insert_item(&self, _ctx: DatastoreContext, data: &[u8]) -> Result<String> {
            self.items.lock().unwrap().push(data.to_vec());
            Ok(format!("local-{}", self.items.lock().unwrap().len()))
        }
        fn end_data_write(&self, _ctx: DatastoreContext, _success: bool) -> Result<Token> {
            Ok(Token::new("20260101T000000Z"))
        }
        fn delete_context(&self, _ctx: DatastoreContext) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_cycle_enforces_state_order() {
        let plugin = Arc::new(FakePlugin {
            items: StdMutex::new(Vec::new()),
        });
        let handle = DatastoreHandle::open(plugin, "contacts", "dev1", "user1", false).unwrap();
        handle.start_data_write().unwrap();
        let id = handle.insert_item(b"hello").unwrap();
        assert_eq!(id, "local-1");
        let token = handle.end_data_write(true).unwrap();
        assert_eq!(token.as_str(), "20260101T000000Z");
        handle.close().unwrap();
    }

    #[test]
    fn cannot_insert_before_start_write() {
        let plugin = Arc::new(FakePlugin {
            items: StdMutex::new(Vec::new()),
        });
        let handle = DatastoreHandle::open(plugin, "contacts", "dev1", "user1", false).unwrap();
        // insert_item does not itself check state in this fake, but
        // start_data_write's state transition must succeed exactly once.
        handle.start_data_write().unwrap();
        assert!(handle.start_data_write().is_err());
    }
}
