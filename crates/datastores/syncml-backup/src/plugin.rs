//! The reference `DatastorePlugin` implementation: one tab-separated
//! file store per (device, user, datastore), grounded on
//! `sync_dbapi_text.cpp`'s overall read/write/admin/map/blob behavior.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::Utc;
use syncml_dbapi::capability::Capabilities;
use syncml_dbapi::datastore::{AdminBlob, BlobChunk, MapRecord, MapTable, Token};
use syncml_dbapi::datastore::token::{is_changed, is_resumed};
use syncml_dbapi::error::{Error, Result};
use syncml_dbapi::ids::DatastoreContext;
use syncml_dbapi::plugin::{DatastorePlugin, ReadOutcome};

use crate::config::BackupConfig;
use crate::storage::item_store::ItemStore;
use crate::storage::{admin_store, blob_store, map_store, require_utf8, role_path};

struct Paths {
    data: PathBuf,
    map: PathBuf,
    admin: PathBuf,
    blob: PathBuf,
}

struct BlobReadCursor {
    item_id: String,
    field: String,
    offset: usize,
    data: Vec<u8>,
}

struct BlobWriteCursor {
    item_id: String,
    field: String,
    buffer: Vec<u8>,
}

struct Session {
    paths: Paths,
    items: ItemStore,
    map: MapTable,
    read_cursor: Option<(Vec<crate::storage::item_store::ItemRow>, usize, Token, Token)>,
    map_cursor: usize,
    write_token: Option<Token>,
    blob_read: Option<BlobReadCursor>,
    blob_write: Option<BlobWriteCursor>,
}

pub struct BackupPlugin {
    config: BackupConfig,
    sessions: Mutex<HashMap<DatastoreContext, Session>>,
}

impl BackupPlugin {
    pub fn new(config: BackupConfig) -> Self {
        Self {
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn with_session<T>(&self, ctx: DatastoreContext, f: impl FnOnce(&mut Session) -> Result<T>) -> Result<T> {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions.get_mut(&ctx).ok_or(Error::NotFound)?;
        f(session)
    }

    fn mint_token(&self) -> Token {
        next_token()
    }
}

/// Process-wide monotonic counter appended to the wall-clock prefix so
/// two tokens minted within the same wall-clock second still compare
/// strictly greater, without giving up the lexicographic-timestamp
/// property `spec.md` §4.F requires.
static TOKEN_COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);

fn next_token() -> Token {
    let seq = TOKEN_COUNTER.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    let compact = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
    Token::new(format!("{compact}{seq:010}"))
}

impl DatastorePlugin for BackupPlugin {
    fn name(&self) -> &str {
        "syncml-backup"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::parse(
            "MinVersion:300\n\
             Manufacturer:reference\n\
             Description:tab-separated-file reference datastore\n\
             Plugin:syncml-backup\n\
             ADMIN_Info:yes\n\
             Plugin_DS_Admin_Map:yes\n\
             Plugin_DS_Data:yes\n\
             Plugin_DS_Blob:yes\n",
        )
    }

    fn create_context(
        &self,
        datastore_name: &str,
        device_key: &str,
        user_key: &str,
        admin_mode: bool,
    ) -> Result<DatastoreContext> {
        let name = if admin_mode {
            format!("{datastore_name}_admin")
        } else {
            datastore_name.to_string()
        };
        let paths = Paths {
            data: role_path(&self.config.base_dir, "data", device_key, user_key, &name),
            map: role_path(&self.config.base_dir, "map", device_key, user_key, &name),
            admin: role_path(&self.config.base_dir, "admin", device_key, user_key, &name),
            blob: role_path(&self.config.base_dir, "blob", device_key, user_key, &name),
        };
        let items = ItemStore::load(&paths.data)?;
        let map = map_store::load(&paths.map)?;

        let id = DatastoreContext::new();
        self.sessions.lock().unwrap().insert(
            id,
            Session {
                paths,
                items,
                map,
                read_cursor: None,
                map_cursor: 0,
                write_token: None,
                blob_read: None,
                blob_write: None,
            },
        );
        Ok(id)
    }

    fn delete_context(&self, ctx: DatastoreContext) -> Result<()> {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions.remove(&ctx).ok_or(Error::NotFound)?;
        session.items.save(&session.paths.data)?;
        map_store::save(&session.paths.map, &session.map)?;
        Ok(())
    }

    fn load_admin_data(&self, ctx: DatastoreContext, local_db: &str, remote_db: &str) -> Result<AdminBlob> {
        self.with_session(ctx, |s| admin_store::load(&s.paths.admin, local_db, remote_db))
    }

    fn save_admin_data(&self, ctx: DatastoreContext, local_db: &str, remote_db: &str, blob: AdminBlob) -> Result<()> {
        self.with_session(ctx, |s| admin_store::save(&s.paths.admin, local_db, remote_db, blob))
    }

    fn read_next_map_item(&self, ctx: DatastoreContext, reset: bool) -> Result<Option<MapRecord>> {
        self.with_session(ctx, |s| {
            if reset {
                s.map_cursor = 0;
            }
            let record = s.map.iter().nth(s.map_cursor).cloned();
            if record.is_some() {
                s.map_cursor += 1;
            }
            Ok(record)
        })
    }

    fn insert_map_item(&self, ctx: DatastoreContext, record: MapRecord) -> Result<()> {
        self.with_session(ctx, |s| {
            if s.map.get(&record.local_id, record.ident).is_some() {
                return Err(Error::Generic("map record already exists".into()));
            }
            s.map.insert(record);
            map_store::save(&s.paths.map, &s.map)
        })
    }

    fn update_map_item(&self, ctx: DatastoreContext, record: MapRecord) -> Result<()> {
        self.with_session(ctx, |s| {
            if !s.map.update(record) {
                return Err(Error::NotFound);
            }
            map_store::save(&s.paths.map, &s.map)
        })
    }

    fn delete_map_item(&self, ctx: DatastoreContext, local_id: &str, ident: u8) -> Result<()> {
        self.with_session(ctx, |s| {
            if !s.map.delete(local_id, ident) {
                return Err(Error::NotFound);
            }
            map_store::save(&s.paths.map, &s.map)
        })
    }

    fn start_data_read(&self, ctx: DatastoreContext, last_token: &Token, resume_token: &Token) -> Result<()> {
        self.with_session(ctx, |s| {
            let snapshot = s.items.snapshot();
            s.read_cursor = Some((snapshot, 0, last_token.clone(), resume_token.clone()));
            Ok(())
        })
    }

    fn read_next_item(&self, ctx: DatastoreContext) -> Result<ReadOutcome> {
        self.with_session(ctx, |s| {
            let (rows, pos, last_token, resume_token) =
                s.read_cursor.as_mut().ok_or_else(|| Error::Generic("read not started".into()))?;
            if *pos >= rows.len() {
                return Ok(ReadOutcome::Eof);
            }
            let row = &rows[*pos];
            *pos += 1;
            let changed = is_changed(&row.token, last_token);
            let resumed = is_resumed(resume_token, &row.token, last_token);
            Ok(ReadOutcome::Item {
                local_id: row.id.clone(),
                token: row.token.clone(),
                changed: changed || resumed,
                resumed,
                data: row.data.clone().into_bytes(),
            })
        })
    }

    fn end_data_read(&self, ctx: DatastoreContext) -> Result<()> {
        self.with_session(ctx, |s| {
            s.read_cursor = None;
            Ok(())
        })
    }

    fn start_data_write(&self, ctx: DatastoreContext) -> Result<()> {
        let token = self.mint_token();
        self.with_session(ctx, |s| {
            s.write_token = Some(token.clone());
            Ok(())
        })
    }

    fn insert_item(&self, ctx: DatastoreContext, data: &[u8]) -> Result<String> {
        let text = require_utf8(data)?;
        self.with_session(ctx, |s| {
            let token = s.write_token.clone().ok_or_else(|| Error::Generic("write not started".into()))?;
            let id = s.items.next_numeric_id();
            s.items.upsert(crate::storage::item_store::ItemRow {
                id: id.clone(),
                parent: String::new(),
                token,
                data: text.clone(),
            });
            Ok(id)
        })
    }

    fn update_item(&self, ctx: DatastoreContext, local_id: &str, data: &[u8]) -> Result<()> {
        let text = require_utf8(data)?;
        self.with_session(ctx, |s| {
            let token = s.write_token.clone().ok_or_else(|| Error::Generic("write not started".into()))?;
            let existing = s.items.get(local_id).ok_or(Error::NotFound)?;
            let parent = existing.parent.clone();
            s.items.upsert(crate::storage::item_store::ItemRow {
                id: local_id.to_string(),
                parent,
                token,
                data: text.clone(),
            });
            Ok(())
        })
    }

    fn move_item(&self, ctx: DatastoreContext, local_id: &str, new_parent_id: &str) -> Result<()> {
        self.with_session(ctx, |s| {
            if s.items.get(local_id).is_none() {
                return Err(Error::NotFound);
            }
            if !new_parent_id.is_empty() && s.items.get(new_parent_id).is_none() {
                return Err(Error::NotFound);
            }
            if s.items.parent_would_cycle(local_id, new_parent_id) {
                return Err(Error::Forbidden);
            }
            let mut row = s.items.get(local_id).unwrap().clone();
            row.parent = new_parent_id.to_string();
            s.items.upsert(row);
            Ok(())
        })
    }

    fn delete_item(&self, ctx: DatastoreContext, local_id: &str) -> Result<()> {
        self.with_session(ctx, |s| {
            if !s.items.remove(local_id) {
                return Err(Error::NotFound);
            }
            Ok(())
        })
    }

    fn delete_sync_set(&self, ctx: DatastoreContext) -> Result<()> {
        self.with_session(ctx, |s| {
            s.items = ItemStore::default();
            Ok(())
        })
    }

    fn end_data_write(&self, ctx: DatastoreContext, success: bool) -> Result<Token> {
        self.with_session(ctx, |s| {
            let token = s.write_token.take().unwrap_or_else(Token::zero);
            if !success {
                // Roll back: reload from the last persisted file,
                // discarding in-memory changes made during this pass.
                s.items = ItemStore::load(&s.paths.data)?;
                return Ok(Token::zero());
            }
            s.items.save(&s.paths.data)?;
            Ok(token)
        })
    }

    fn read_blob(&self, ctx: DatastoreContext, local_id: &str, field: &str, block_size: usize) -> Result<BlobChunk> {
        self.with_session(ctx, |s| {
            let needs_open = match &s.blob_read {
                Some(cur) => cur.item_id != local_id || cur.field != field,
                None => true,
            };
            if needs_open {
                let data = blob_store::load(&s.paths.blob, local_id, field)?.unwrap_or_default();
                s.blob_read = Some(BlobReadCursor {
                    item_id: local_id.to_string(),
                    field: field.to_string(),
                    offset: 0,
                    data,
                });
            }
            let cursor = s.blob_read.as_mut().unwrap();
            let first = cursor.offset == 0;
            let block_size = block_size.max(1);
            let end = (cursor.offset + block_size).min(cursor.data.len());
            let chunk = cursor.data[cursor.offset..end].to_vec();
            let total_size = cursor.data.len();
            let last = end >= cursor.data.len();
            cursor.offset = end;
            if last {
                s.blob_read = None;
            }
            Ok(BlobChunk {
                data: chunk,
                total_size,
                first,
                last,
            })
        })
    }

    fn write_blob(&self, ctx: DatastoreContext, local_id: &str, field: &str, chunk: BlobChunk) -> Result<()> {
        self.with_session(ctx, |s| {
            if chunk.first && chunk.last && chunk.data.is_empty() {
                s.blob_write = None;
                return blob_store::delete(&s.paths.blob, local_id, field);
            }
            if chunk.first {
                s.blob_write = Some(BlobWriteCursor {
                    item_id: local_id.to_string(),
                    field: field.to_string(),
                    buffer: Vec::new(),
                });
            }
            let cursor = s
                .blob_write
                .as_mut()
                .filter(|c| c.item_id == local_id && c.field == field)
                .ok_or_else(|| Error::Generic("write_blob called without an open stream".into()))?;
            cursor.buffer.extend_from_slice(&chunk.data);
            if chunk.last {
                let bytes = std::mem::take(&mut cursor.buffer);
                s.blob_write = None;
                blob_store::save(&s.paths.blob, local_id, field, &bytes)?;
            }
            Ok(())
        })
    }

    fn delete_blob(&self, ctx: DatastoreContext, local_id: &str, field: &str) -> Result<()> {
        self.with_session(ctx, |s| {
            if let Some(cur) = &s.blob_write {
                if cur.item_id == local_id && cur.field == field {
                    s.blob_write = None;
                }
            }
            if let Some(cur) = &s.blob_read {
                if cur.item_id == local_id && cur.field == field {
                    s.blob_read = None;
                }
            }
            blob_store::delete(&s.paths.blob, local_id, field)
        })
    }
}
