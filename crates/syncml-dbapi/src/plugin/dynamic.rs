//! DLL backend: plugins loaded from a shared library at runtime.
//!
//! Grounded on `plugin/host/native.rs::NativeLoader` for the
//! `libloading` usage and log-bridging, and on
//! `platform_adapters/linux/platform_DLL.cpp::DLWrapper::connect` for
//! the suffix-probing resolution order: a bare path is tried first,
//! then with the platform's shared-library suffix appended, then both
//! again under `./`.

use std::ffi::CStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::Library;

use crate::datastore::{AdminBlob, BlobChunk, MapRecord, Token};
use crate::error::{Error, Result};
use crate::ids::DatastoreContext;
use crate::plugin::{DatastorePlugin, FactoryCtor, PluginInitLoggingFn, ReadOutcome};

#[cfg(target_os = "macos")]
const PLATFORM_SUFFIX: &str = ".dylib";
#[cfg(target_os = "windows")]
const PLATFORM_SUFFIX: &str = ".dll";
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const PLATFORM_SUFFIX: &str = ".so";

/// Produces the candidate paths tried, in order, for a bare plugin
/// name: the name as-is, the name with the platform suffix, then both
/// again rooted at the current directory.
pub fn candidate_paths(name: &str) -> Vec<PathBuf> {
    let with_suffix = format!("{name}{PLATFORM_SUFFIX}");
    vec![
        PathBuf::from(name),
        PathBuf::from(&with_suffix),
        Path::new(".").join(name),
        Path::new(".").join(&with_suffix),
    ]
}

struct DynamicPlugin {
    inner: Box<dyn DatastorePlugin>,
    _library: Arc<Library>,
}

/// Every call is forwarded verbatim to the loaded library's own
/// `DatastorePlugin`; this wrapper's only job is to keep the `Library`
/// handle alive for at least as long as `inner`; none of these may be
/// left as trait defaults, or a loaded plugin would silently answer
/// `NotImplemented` to everything but `name`/`capabilities`.
impl DatastorePlugin for DynamicPlugin {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn capabilities(&self) -> crate::capability::Capabilities {
        self.inner.capabilities()
    }

    fn create_context(
        &self,
        datastore_name: &str,
        device_key: &str,
        user_key: &str,
        admin_mode: bool,
    ) -> Result<DatastoreContext> {
        self.inner.create_context(datastore_name, device_key, user_key, admin_mode)
    }

    fn delete_context(&self, ctx: DatastoreContext) -> Result<()> {
        self.inner.delete_context(ctx)
    }

    fn load_admin_data(&self, ctx: DatastoreContext, local_db: &str, remote_db: &str) -> Result<AdminBlob> {
        self.inner.load_admin_data(ctx, local_db, remote_db)
    }

    fn save_admin_data(&self, ctx: DatastoreContext, local_db: &str, remote_db: &str, blob: AdminBlob) -> Result<()> {
        self.inner.save_admin_data(ctx, local_db, remote_db, blob)
    }

    fn read_next_map_item(&self, ctx: DatastoreContext, reset: bool) -> Result<Option<MapRecord>> {
        self.inner.read_next_map_item(ctx, reset)
    }

    fn insert_map_item(&self, ctx: DatastoreContext, record: MapRecord) -> Result<()> {
        self.inner.insert_map_item(ctx, record)
    }

    fn update_map_item(&self, ctx: DatastoreContext, record: MapRecord) -> Result<()> {
        self.inner.update_map_item(ctx, record)
    }

    fn delete_map_item(&self, ctx: DatastoreContext, local_id: &str, ident: u8) -> Result<()> {
        self.inner.delete_map_item(ctx, local_id, ident)
    }

    fn start_data_read(&self, ctx: DatastoreContext, last_token: &Token, resume_token: &Token) -> Result<()> {
        self.inner.start_data_read(ctx, last_token, resume_token)
    }

    fn read_next_item(&self, ctx: DatastoreContext) -> Result<ReadOutcome> {
        self.inner.read_next_item(ctx)
    }

    fn end_data_read(&self, ctx: DatastoreContext) -> Result<()> {
        self.inner.end_data_read(ctx)
    }

    fn start_data_write(&self, ctx: DatastoreContext) -> Result<()> {
        self.inner.start_data_write(ctx)
    }

    fn insert_item(&self, ctx: DatastoreContext, data: &[u8]) -> Result<String> {
        self.inner.insert_item(ctx, data)
    }

    fn update_item(&self, ctx: DatastoreContext, local_id: &str, data: &[u8]) -> Result<()> {
        self.inner.update_item(ctx, local_id, data)
    }

    fn move_item(&self, ctx: DatastoreContext, local_id: &str, new_parent_id: &str) -> Result<()> {
        self.inner.move_item(ctx, local_id, new_parent_id)
    }

    fn delete_item(&self, ctx: DatastoreContext, local_id: &str) -> Result<()> {
        self.inner.delete_item(ctx, local_id)
    }

    fn delete_sync_set(&self, ctx: DatastoreContext) -> Result<()> {
        self.inner.delete_sync_set(ctx)
    }

    fn end_data_write(&self, ctx: DatastoreContext, success: bool) -> Result<Token> {
        self.inner.end_data_write(ctx, success)
    }

    fn read_blob(&self, ctx: DatastoreContext, local_id: &str, field: &str, block_size: usize) -> Result<BlobChunk> {
        self.inner.read_blob(ctx, local_id, field, block_size)
    }

    fn write_blob(&self, ctx: DatastoreContext, local_id: &str, field: &str, chunk: BlobChunk) -> Result<()> {
        self.inner.write_blob(ctx, local_id, field, chunk)
    }

    fn delete_blob(&self, ctx: DatastoreContext, local_id: &str, field: &str) -> Result<()> {
        self.inner.delete_blob(ctx, local_id, field)
    }
}

/// Host-side logging callback forwarded to a plugin's optional
/// `plugin_init_logging` export, bridging into the `log` facade.
unsafe extern "C" fn host_log_callback(
    level: usize,
    target: *const std::ffi::c_char,
    message: *const std::ffi::c_char,
) {
    let target_str = if target.is_null() {
        "plugin"
    } else {
        unsafe { CStr::from_ptr(target) }.to_str().unwrap_or("plugin")
    };
    let message_str = if message.is_null() {
        ""
    } else {
        unsafe { CStr::from_ptr(message) }.to_str().unwrap_or("")
    };
    let log_level = match level {
        1 => log::Level::Error,
        2 => log::Level::Warn,
        3 => log::Level::Info,
        4 => log::Level::Debug,
        5 => log::Level::Trace,
        _ => return,
    };
    log::log!(target: target_str, log_level, "{}", message_str);
}

/// Loads a plugin from a shared library, trying each candidate path in
/// turn and failing only once all are exhausted.
pub fn load(name: &str, explicit_path: Option<&Path>) -> Result<Arc<dyn DatastorePlugin>> {
    let paths: Vec<PathBuf> = match explicit_path {
        Some(p) => vec![p.to_path_buf()],
        None => candidate_paths(name),
    };

    let mut last_err = None;
    for path in &paths {
        match load_library(name, path) {
            Ok(plugin) => return Ok(plugin),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| Error::Loader(format!("no candidate path for {name}"))))
}

fn load_library(name: &str, path: &Path) -> Result<Arc<dyn DatastorePlugin>> {
    let lib = unsafe {
        Arc::new(Library::new(path).map_err(|e| Error::Loader(format!("{path:?}: {e}")))?)
    };

    let factory: Box<dyn DatastorePlugin> = unsafe {
        let ctor = lib
            .get::<FactoryCtor>(b"plugin_factory")
            .map_err(|_| Error::Loader(format!("no plugin_factory symbol in {path:?}")))?;
        let raw = ctor();
        if raw.is_null() {
            return Err(Error::Loader(format!("plugin_factory returned null in {path:?}")));
        }
        Box::from_raw(raw)
    };

    if factory.name() != name {
        log::warn!(
            "plugin name mismatch in {:?}: requested '{}', plugin reports '{}'",
            path,
            name,
            factory.name()
        );
    }

    unsafe {
        if let Ok(init_logging) = lib.get::<PluginInitLoggingFn>(b"plugin_init_logging") {
            let max_level = log::max_level() as usize;
            init_logging(host_log_callback, max_level);
        }
    }

    Ok(Arc::new(DynamicPlugin {
        inner: factory,
        _library: lib,
    }))
}
