//! Admin blob: opaque per-(local, remote) synchronization state.
//!
//! Grounded on `sysync_SDK/Sources/admindata.h`'s `LoadAdminData`/
//! `SaveAdminData`. The engine treats the bytes as opaque; the
//! datastore plugin is the only party that interprets them.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminBlob(Vec<u8>);

impl AdminBlob {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// Keyed store for admin blobs, one per (local datastore, remote
/// datastore) pairing.
#[derive(Debug, Default)]
pub struct AdminStore {
    blobs: std::collections::HashMap<(String, String), AdminBlob>,
}

impl AdminStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self, local_db: &str, remote_db: &str) -> AdminBlob {
        self.blobs
            .get(&(local_db.to_string(), remote_db.to_string()))
            .cloned()
            .unwrap_or_else(AdminBlob::empty)
    }

    pub fn save(&mut self, local_db: &str, remote_db: &str, blob: AdminBlob) {
        self.blobs
            .insert((local_db.to_string(), remote_db.to_string()), blob);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_of_unknown_pairing_is_empty() {
        let store = AdminStore::new();
        assert!(store.load("a", "b").as_bytes().is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let mut store = AdminStore::new();
        store.save("a", "b", AdminBlob::new(vec![1, 2, 3]));
        assert_eq!(store.load("a", "b").as_bytes(), &[1, 2, 3]);
    }
}
