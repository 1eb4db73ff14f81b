//! Global context chain.
//!
//! A small singly-linked, refcounted registry shared by every session
//! opened against the same plugin sub-name, so a plugin can keep
//! state (a shared database connection, a cache) across sessions.
//! Grounded on `dbapi.cpp`'s `GlobContext`/`DispGlobContext` handling:
//! head-insertion, refcounting, and garbage collection of nodes with
//! no remaining references and no backref.

use std::sync::Mutex;

struct Node {
    name: String,
    refcount: usize,
    backref: Option<*mut std::ffi::c_void>,
    payload: *mut std::ffi::c_void,
}

// payload/backref are opaque handles managed entirely behind the
// Mutex; never dereferenced here.
unsafe impl Send for Node {}

#[derive(Default)]
pub struct GlobalContextChain {
    nodes: Mutex<Vec<Node>>,
}

impl GlobalContextChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds an existing node by name and bumps its refcount, or
    /// inserts a fresh one at the head of the chain.
    pub fn acquire(
        &self,
        name: &str,
        make_payload: impl FnOnce() -> *mut std::ffi::c_void,
    ) -> *mut std::ffi::c_void {
        let mut nodes = self.nodes.lock().unwrap();
        if let Some(node) = nodes.iter_mut().find(|n| n.name == name) {
            node.refcount += 1;
            return node.payload;
        }
        let payload = make_payload();
        nodes.insert(
            0,
            Node {
                name: name.to_string(),
                refcount: 1,
                backref: None,
                payload,
            },
        );
        payload
    }

    pub fn set_backref(&self, name: &str, backref: *mut std::ffi::c_void) {
        let mut nodes = self.nodes.lock().unwrap();
        if let Some(node) = nodes.iter_mut().find(|n| n.name == name) {
            node.backref = Some(backref);
        }
    }

    /// Drops one reference; when it reaches zero and no backref is
    /// set, the node is removed and its payload pointer returned for
    /// the caller to actually free.
    pub fn release(&self, name: &str) -> Option<*mut std::ffi::c_void> {
        let mut nodes = self.nodes.lock().unwrap();
        let idx = nodes.iter().position(|n| n.name == name)?;
        nodes[idx].refcount = nodes[idx].refcount.saturating_sub(1);
        if nodes[idx].refcount == 0 && nodes[idx].backref.is_none() {
            let node = nodes.remove(idx);
            Some(node.payload)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_shares_payload_and_bumps_refcount() {
        let chain = GlobalContextChain::new();
        let a = chain.acquire("db1", || 0x1 as *mut std::ffi::c_void);
        let b = chain.acquire("db1", || 0x2 as *mut std::ffi::c_void);
        assert_eq!(a, b);
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn release_removes_node_only_at_zero_refcount_without_backref() {
        let chain = GlobalContextChain::new();
        chain.acquire("db1", || 0x1 as *mut std::ffi::c_void);
        chain.acquire("db1", || 0x1 as *mut std::ffi::c_void);
        assert!(chain.release("db1").is_none());
        assert!(chain.release("db1").is_some());
        assert!(chain.is_empty());
    }

    #[test]
    fn backref_keeps_node_alive() {
        let chain = GlobalContextChain::new();
        chain.acquire("db1", || 0x1 as *mut std::ffi::c_void);
        chain.set_backref("db1", 0x42 as *mut std::ffi::c_void);
        assert!(chain.release("db1").is_none());
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn head_insertion_orders_newest_first() {
        let chain = GlobalContextChain::new();
        chain.acquire("a", || std::ptr::null_mut());
        chain.acquire("b", || std::ptr::null_mut());
        let nodes = chain.nodes.lock().unwrap();
        assert_eq!(nodes[0].name, "b");
        assert_eq!(nodes[1].name, "a");
    }
}
