//! Map table persistence: wraps `syncml_dbapi::datastore::MapTable`
//! with load/save against a tab-separated file.

use std::path::{Path, PathBuf};

use syncml_dbapi::datastore::{MapRecord, MapTable};
use syncml_dbapi::error::{Error, Result};

use super::{read_rows, write_rows};

pub fn load(path: &Path) -> Result<MapTable> {
    let mut table = MapTable::new();
    for fields in read_rows(path)? {
        let [local_id, remote_id, flags, ident]: [String; 4] = fields
            .try_into()
            .map_err(|_| Error::Generic("malformed map row".into()))?;
        table.insert(MapRecord {
            local_id,
            remote_id,
            flags: flags.parse().map_err(|_| Error::Generic("malformed map flags".into()))?,
            ident: ident.parse().map_err(|_| Error::Generic("malformed map ident".into()))?,
        });
    }
    Ok(table)
}

pub fn save(path: &PathBuf, table: &MapTable) -> Result<()> {
    let rows: Vec<Vec<String>> = table
        .iter()
        .map(|r| {
            vec![
                r.local_id.clone(),
                r.remote_id.clone(),
                r.flags.to_string(),
                r.ident.to_string(),
            ]
        })
        .collect();
    write_rows(path, &["localID", "remoteID", "flags", "ident"], &rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_round_trips() {
        let dir = std::env::temp_dir().join(format!("syncml-backup-map-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("map.tsv");

        let mut table = MapTable::new();
        table.insert(MapRecord {
            local_id: "10000".to_string(),
            remote_id: "r1".to_string(),
            flags: 0,
            ident: 1,
        });
        save(&path, &table).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.get("10000", 1).unwrap().remote_id, "r1");
        std::fs::remove_file(&path).ok();
    }
}
