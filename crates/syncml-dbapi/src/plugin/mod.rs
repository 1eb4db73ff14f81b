pub mod dynamic;
#[cfg(feature = "jni")]
pub mod jni;
pub mod loader;
pub mod native;

use crate::capability::Capabilities;
use crate::datastore::{AdminBlob, BlobChunk, MapRecord, Token};
use crate::error::Result;
use crate::ids::DatastoreContext;

/// FFI-safe logging callback a plugin uses to forward log messages to
/// the host process's `log` facade.
///
/// Parameters:
/// - level: log level as usize (Error=1, Warn=2, Info=3, Debug=4, Trace=5)
/// - target: null-terminated C string naming the log target
/// - message: null-terminated C string with the log message
#[allow(improper_ctypes_definitions)]
pub type LogCallbackFn = unsafe extern "C" fn(
    level: usize,
    target: *const std::ffi::c_char,
    message: *const std::ffi::c_char,
);

/// Type of the optional `plugin_init_logging` symbol a native plugin
/// may export.
#[allow(improper_ctypes_definitions)]
pub type PluginInitLoggingFn = unsafe extern "C" fn(callback: LogCallbackFn, max_level: usize);

/// One read-cycle result for `read_next_item`.
pub enum ReadOutcome {
    Item {
        local_id: String,
        token: Token,
        changed: bool,
        resumed: bool,
        data: Vec<u8>,
    },
    Eof,
}

/// The DBApi surface a datastore plugin implements, translated from
/// the C method-table groups into one Rust trait. Per-call methods
/// are synchronous, matching the engine's own serialized-per-context
/// call discipline (see DESIGN.md, "synchronous vs async dispatch").
/// Every method has a default that reports `NotImplemented`, mirroring
/// the nullable method-table slots: a plugin only overrides what it
/// actually supports.
pub trait DatastorePlugin: Send + Sync {
    fn name(&self) -> &str;

    fn capabilities(&self) -> Capabilities {
        Capabilities::parse("MinVersion:300\n")
    }

    /// Opens a datastore context, mirroring `dbapi.h`'s
    /// `TDB_Api::CreateContext(name, asAdmin, config, devKey, usrKey)`:
    /// `device_key`/`user_key` select the backing (device, user,
    /// datastore) triple that map/admin storage is keyed on, and
    /// `admin_mode` is the caller's request for an admin-suffixed
    /// context name when the plugin's capability string offers
    /// `ADMIN_Info`.
    fn create_context(
        &self,
        _datastore_name: &str,
        _device_key: &str,
        _user_key: &str,
        _admin_mode: bool,
    ) -> Result<DatastoreContext> {
        Err(crate::error::Error::NotImplemented)
    }

    fn delete_context(&self, _ctx: DatastoreContext) -> Result<()> {
        Ok(())
    }

    fn load_admin_data(&self, _ctx: DatastoreContext, _local_db: &str, _remote_db: &str) -> Result<AdminBlob> {
        Err(crate::error::Error::NotImplemented)
    }

    fn save_admin_data(&self, _ctx: DatastoreContext, _local_db: &str, _remote_db: &str, _blob: AdminBlob) -> Result<()> {
        Err(crate::error::Error::NotImplemented)
    }

    fn read_next_map_item(&self, _ctx: DatastoreContext, _reset: bool) -> Result<Option<MapRecord>> {
        Err(crate::error::Error::NotImplemented)
    }

    fn insert_map_item(&self, _ctx: DatastoreContext, _record: MapRecord) -> Result<()> {
        Err(crate::error::Error::NotImplemented)
    }

    fn update_map_item(&self, _ctx: DatastoreContext, _record: MapRecord) -> Result<()> {
        Err(crate::error::Error::NotImplemented)
    }

    fn delete_map_item(&self, _ctx: DatastoreContext, _local_id: &str, _ident: u8) -> Result<()> {
        Err(crate::error::Error::NotImplemented)
    }

    fn start_data_read(&self, _ctx: DatastoreContext, _last_token: &Token, _resume_token: &Token) -> Result<()> {
        Err(crate::error::Error::NotImplemented)
    }

    fn read_next_item(&self, _ctx: DatastoreContext) -> Result<ReadOutcome> {
        Err(crate::error::Error::NotImplemented)
    }

    fn end_data_read(&self, _ctx: DatastoreContext) -> Result<()> {
        Ok(())
    }

    fn start_data_write(&self, _ctx: DatastoreContext) -> Result<()> {
        Err(crate::error::Error::NotImplemented)
    }

    fn insert_item(&self, _ctx: DatastoreContext, _data: &[u8]) -> Result<String> {
        Err(crate::error::Error::NotImplemented)
    }

    fn update_item(&self, _ctx: DatastoreContext, _local_id: &str, _data: &[u8]) -> Result<()> {
        Err(crate::error::Error::NotImplemented)
    }

    fn move_item(&self, _ctx: DatastoreContext, _local_id: &str, _new_parent_id: &str) -> Result<()> {
        Err(crate::error::Error::NotImplemented)
    }

    fn delete_item(&self, _ctx: DatastoreContext, _local_id: &str) -> Result<()> {
        Err(crate::error::Error::NotImplemented)
    }

    fn delete_sync_set(&self, _ctx: DatastoreContext) -> Result<()> {
        Err(crate::error::Error::NotImplemented)
    }

    /// `success=false` asks the plugin to roll back any changes made
    /// during this write pass and report the previous anchor token
    /// unchanged, per `spec.md` §4.F's `EndDataWrite(success, out
    /// newToken)` contract: on success `newToken` becomes the anchor
    /// the *next* session's `StartDataRead` will be called with.
    fn end_data_write(&self, _ctx: DatastoreContext, _success: bool) -> Result<Token> {
        Ok(Token::zero())
    }

    fn read_blob(&self, _ctx: DatastoreContext, _local_id: &str, _field: &str, _block_size: usize) -> Result<BlobChunk> {
        Err(crate::error::Error::NotImplemented)
    }

    fn write_blob(&self, _ctx: DatastoreContext, _local_id: &str, _field: &str, _chunk: BlobChunk) -> Result<()> {
        Err(crate::error::Error::NotImplemented)
    }

    fn delete_blob(&self, _ctx: DatastoreContext, _local_id: &str, _field: &str) -> Result<()> {
        Err(crate::error::Error::NotImplemented)
    }
}

#[allow(improper_ctypes_definitions)]
pub type FactoryCtor = unsafe extern "C" fn() -> *mut dyn DatastorePlugin;
