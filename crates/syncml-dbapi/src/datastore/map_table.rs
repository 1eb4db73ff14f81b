//! Map table: local-ID <-> remote-ID correspondence records.
//!
//! Grounded on `sysync_SDK/Sources/admindata.h`'s `TAdminData` map
//! methods (`ReadNextMapItem`/`InsertMapItem`/`UpdateMapItem`/
//! `DeleteMapItem`). A record is keyed by `(local_id, ident)`; `ident`
//! distinguishes multiple remote peers syncing against the same local
//! item (a single local contact mapped to more than one remote
//! device/datastore pairing).

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MapKey {
    pub local_id: String,
    pub ident: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapRecord {
    pub local_id: String,
    pub remote_id: String,
    pub flags: u16,
    pub ident: u8,
}

impl MapRecord {
    fn key(&self) -> MapKey {
        MapKey {
            local_id: self.local_id.clone(),
            ident: self.ident,
        }
    }
}

#[derive(Debug, Default)]
pub struct MapTable {
    records: BTreeMap<MapKey, MapRecord>,
}

impl MapTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: MapRecord) {
        self.records.insert(record.key(), record);
    }

    pub fn update(&mut self, record: MapRecord) -> bool {
        let key = record.key();
        if self.records.contains_key(&key) {
            self.records.insert(key, record);
            true
        } else {
            false
        }
    }

    pub fn delete(&mut self, local_id: &str, ident: u8) -> bool {
        self.records
            .remove(&MapKey {
                local_id: local_id.to_string(),
                ident,
            })
            .is_some()
    }

    pub fn get(&self, local_id: &str, ident: u8) -> Option<&MapRecord> {
        self.records.get(&MapKey {
            local_id: local_id.to_string(),
            ident,
        })
    }

    /// Iterates records in a stable order, the way `ReadNextMapItem`
    /// walks the backing store sequentially.
    pub fn iter(&self) -> impl Iterator<Item = &MapRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(local: &str, remote: &str, ident: u8) -> MapRecord {
        MapRecord {
            local_id: local.to_string(),
            remote_id: remote.to_string(),
            flags: 0,
            ident,
        }
    }

    #[test]
    fn insert_and_lookup_round_trips() {
        let mut t = MapTable::new();
        t.insert(rec("l1", "r1", 0));
        assert_eq!(t.get("l1", 0).unwrap().remote_id, "r1");
    }

    #[test]
    fn same_local_id_different_ident_are_distinct_records() {
        let mut t = MapTable::new();
        t.insert(rec("l1", "r1", 0));
        t.insert(rec("l1", "r2", 1));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn update_requires_existing_key() {
        let mut t = MapTable::new();
        assert!(!t.update(rec("l1", "r1", 0)));
        t.insert(rec("l1", "r1", 0));
        assert!(t.update(rec("l1", "r2", 0)));
        assert_eq!(t.get("l1", 0).unwrap().remote_id, "r2");
    }

    #[test]
    fn delete_removes_record() {
        let mut t = MapTable::new();
        t.insert(rec("l1", "r1", 0));
        assert!(t.delete("l1", 0));
        assert!(t.get("l1", 0).is_none());
        assert!(!t.delete("l1", 0));
    }
}
