//! Admin blob persistence: one row per (localDB, remoteDB) pairing,
//! base64-encoded since the blob's bytes are opaque to the engine and
//! may not be valid UTF-8.

use std::path::{Path, PathBuf};

use base64::Engine as _;
use syncml_dbapi::datastore::AdminBlob;
use syncml_dbapi::error::{Error, Result};

use super::{read_rows, write_rows};

pub fn load(path: &Path, local_db: &str, remote_db: &str) -> Result<AdminBlob> {
    for fields in read_rows(path)? {
        if fields.len() != 3 {
            return Err(Error::Generic("malformed admin row".into()));
        }
        if fields[0] == local_db && fields[1] == remote_db {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(&fields[2])
                .map_err(|e| Error::Generic(format!("malformed admin blob base64: {e}")))?;
            return Ok(AdminBlob::new(bytes));
        }
    }
    Ok(AdminBlob::empty())
}

pub fn save(path: &PathBuf, local_db: &str, remote_db: &str, blob: AdminBlob) -> Result<()> {
    let mut rows: Vec<Vec<String>> = read_rows(path)?
        .into_iter()
        .filter(|fields| !(fields.len() == 3 && fields[0] == local_db && fields[1] == remote_db))
        .collect();
    let encoded = base64::engine::general_purpose::STANDARD.encode(blob.as_bytes());
    rows.push(vec![local_db.to_string(), remote_db.to_string(), encoded]);
    write_rows(path, &["localDB", "remoteDB", "blob"], &rows)
}
