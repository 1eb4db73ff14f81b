//! Committed BLOB storage: one row per (item id, field), holding the
//! full reassembled bytes base64-encoded. Streaming/chunking state
//! lives in the plugin's own read/write cursors, which only touch this
//! store once a read or write pass completes.

use std::path::{Path, PathBuf};

use base64::Engine as _;
use syncml_dbapi::error::{Error, Result};

use super::{read_rows, write_rows};

pub fn load(path: &Path, item_id: &str, field: &str) -> Result<Option<Vec<u8>>> {
    for fields in read_rows(path)? {
        if fields.len() != 3 {
            return Err(Error::Generic("malformed blob row".into()));
        }
        if fields[0] == item_id && fields[1] == field {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(&fields[2])
                .map_err(|e| Error::Generic(format!("malformed blob base64: {e}")))?;
            return Ok(Some(bytes));
        }
    }
    Ok(None)
}

pub fn save(path: &PathBuf, item_id: &str, field: &str, data: &[u8]) -> Result<()> {
    let mut rows: Vec<Vec<String>> = read_rows(path)?
        .into_iter()
        .filter(|fields| !(fields.len() == 3 && fields[0] == item_id && fields[1] == field))
        .collect();
    let encoded = base64::engine::general_purpose::STANDARD.encode(data);
    rows.push(vec![item_id.to_string(), field.to_string(), encoded]);
    write_rows(path, &["itemID", "field", "data"], &rows)
}

pub fn delete(path: &PathBuf, item_id: &str, field: &str) -> Result<()> {
    let rows: Vec<Vec<String>> = read_rows(path)?
        .into_iter()
        .filter(|fields| !(fields.len() == 3 && fields[0] == item_id && fields[1] == field))
        .collect();
    write_rows(path, &["itemID", "field", "data"], &rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_round_trips_bytes() {
        let dir = std::env::temp_dir().join(format!("syncml-backup-blob-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("blob.tsv");

        let data = vec![0xABu8; 5000];
        save(&path, "10000", "photo", &data).unwrap();
        assert_eq!(load(&path, "10000", "photo").unwrap().unwrap(), data);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn delete_removes_the_row() {
        let dir = std::env::temp_dir().join(format!("syncml-backup-blob-del-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("blob.tsv");

        save(&path, "10000", "photo", &[1, 2, 3]).unwrap();
        delete(&path, "10000", "photo").unwrap();
        assert!(load(&path, "10000", "photo").unwrap().is_none());
        std::fs::remove_file(&path).ok();
    }
}
