//! Item table: one row per synced record, `id[,parent] TAB token TAB
//! data`, grounded on `sysync_SDK/Sources/dbitem.cpp`.

use std::path::{Path, PathBuf};

use syncml_dbapi::datastore::Token;
use syncml_dbapi::error::{Error, Result};

use super::{read_rows, write_rows};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRow {
    pub id: String,
    pub parent: String,
    pub token: Token,
    pub data: String,
}

#[derive(Debug, Default)]
pub struct ItemStore {
    rows: Vec<ItemRow>,
}

impl ItemStore {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = read_rows(path)?;
        let mut rows = Vec::with_capacity(raw.len());
        for fields in raw {
            let [id_parent, token, data]: [String; 3] = fields
                .try_into()
                .map_err(|_| Error::Generic("malformed item row".into()))?;
            let (id, parent) = match id_parent.split_once(',') {
                Some((id, parent)) => (id.to_string(), parent.to_string()),
                None => (id_parent, String::new()),
            };
            rows.push(ItemRow {
                id,
                parent,
                token: Token::new(token),
                data,
            });
        }
        Ok(Self { rows })
    }

    pub fn save(&self, path: &PathBuf) -> Result<()> {
        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| {
                let id_parent = if r.parent.is_empty() {
                    r.id.clone()
                } else {
                    format!("{},{}", r.id, r.parent)
                };
                vec![id_parent, r.token.as_str().to_string(), r.data.clone()]
            })
            .collect();
        write_rows(path, &["id", "token", "data"], &rows)
    }

    pub fn get(&self, id: &str) -> Option<&ItemRow> {
        self.rows.iter().find(|r| r.id == id)
    }

    /// Rejects a parent assignment that would self-reference or close
    /// a cycle, per `spec.md` §9's "Cyclic graphs" note: walk the
    /// parent chain tracking visited ids.
    pub fn parent_would_cycle(&self, id: &str, new_parent: &str) -> bool {
        if new_parent.is_empty() {
            return false;
        }
        if new_parent == id {
            return true;
        }
        let mut visited = std::collections::HashSet::new();
        let mut current = new_parent.to_string();
        loop {
            if current == id || !visited.insert(current.clone()) {
                return true;
            }
            match self.get(&current) {
                Some(row) if !row.parent.is_empty() => current = row.parent.clone(),
                _ => return false,
            }
        }
    }

    pub fn upsert(&mut self, row: ItemRow) {
        if let Some(existing) = self.rows.iter_mut().find(|r| r.id == row.id) {
            *existing = row;
        } else {
            self.rows.push(row);
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.rows.len();
        self.rows.retain(|r| r.id != id);
        self.rows.len() != before
    }

    /// Snapshots the current rows for a read pass, sorted by id for a
    /// stable, repeatable enumeration order (§4.F idempotence:
    /// `StartDataRead` with the same `lastToken` yields the same
    /// ordered set modulo intervening writes).
    pub fn snapshot(&self) -> Vec<ItemRow> {
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        rows
    }

    pub fn next_numeric_id(&self) -> String {
        let max = self
            .rows
            .iter()
            .filter_map(|r| r.id.parse::<u64>().ok())
            .max()
            .unwrap_or(9999);
        (max + 1).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, parent: &str) -> ItemRow {
        ItemRow {
            id: id.to_string(),
            parent: parent.to_string(),
            token: Token::new("20260101T000000Z"),
            data: "payload".to_string(),
        }
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let store = ItemStore::default();
        assert!(store.parent_would_cycle("a", "a"));
    }

    #[test]
    fn chain_closing_on_itself_is_a_cycle() {
        let mut store = ItemStore::default();
        store.upsert(row("a", "b"));
        store.upsert(row("b", ""));
        // a -> b; making b's parent "a" would close the cycle a -> b -> a
        assert!(store.parent_would_cycle("b", "a"));
    }

    #[test]
    fn unrelated_parent_is_not_a_cycle() {
        let mut store = ItemStore::default();
        store.upsert(row("a", ""));
        store.upsert(row("b", ""));
        assert!(!store.parent_would_cycle("a", "b"));
    }

    #[test]
    fn next_numeric_id_starts_above_10000() {
        let store = ItemStore::default();
        assert_eq!(store.next_numeric_id(), "10000");
    }

    #[test]
    fn upsert_replaces_existing_row() {
        let mut store = ItemStore::default();
        store.upsert(row("a", ""));
        let mut updated = row("a", "");
        updated.data = "new payload".to_string();
        store.upsert(updated);
        assert_eq!(store.get("a").unwrap().data, "new payload");
        assert_eq!(store.snapshot().len(), 1);
    }
}
