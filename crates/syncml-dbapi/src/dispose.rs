//! Disposer registry.
//!
//! Every string or BLOB handed back by a plugin across the C ABI
//! comes with a disposer function pointer the engine must call exactly
//! once. Grounded on `spec.md` §4.E and the ownership-type design note
//! in §9: instead of tracking raw pointers we hand the engine a guard
//! whose `Drop` calls the disposer, and we still keep a side registry
//! so re-entrant or out-of-order disposal (the plugin disposing its
//! own buffer during a callback) is idempotent.

use std::collections::HashMap;
use std::sync::Mutex;

pub type DisposerFn = Box<dyn Fn(*mut std::ffi::c_void) + Send + Sync>;

struct Entry {
    disposer: DisposerFn,
    context_arg: *mut std::ffi::c_void,
    is_self: bool,
}

// Raw pointers are only ever touched inside the Mutex's critical
// section, and never dereferenced here -- only passed back to the
// plugin-supplied disposer.
unsafe impl Send for Entry {}

#[derive(Default)]
pub struct DisposerRegistry {
    entries: Mutex<HashMap<usize, Entry>>,
}

impl DisposerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        pointer: *mut std::ffi::c_void,
        disposer: DisposerFn,
        context_arg: *mut std::ffi::c_void,
        is_self: bool,
    ) {
        self.entries.lock().unwrap().insert(
            pointer as usize,
            Entry {
                disposer,
                context_arg,
                is_self,
            },
        );
    }

    /// Removes the entry before invoking its disposer, so a disposer
    /// that re-enters (frees the same pointer again, or the registry
    /// itself is consulted mid-callback) finds nothing left to double
    /// free.
    pub fn dispose(&self, pointer: *mut std::ffi::c_void) -> bool {
        let entry = self.entries.lock().unwrap().remove(&(pointer as usize));
        match entry {
            Some(entry) => {
                let arg = if entry.is_self {
                    pointer
                } else {
                    entry.context_arg
                };
                (entry.disposer)(arg);
                true
            }
            None => false,
        }
    }

    pub fn is_registered(&self, pointer: *mut std::ffi::c_void) -> bool {
        self.entries.lock().unwrap().contains_key(&(pointer as usize))
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn dispose_runs_once_and_is_idempotent() {
        let registry = DisposerRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let mut buf = vec![1u8, 2, 3];
        let ptr = buf.as_mut_ptr() as *mut std::ffi::c_void;

        registry.register(
            ptr,
            Box::new(move |_| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
            }),
            std::ptr::null_mut(),
            true,
        );

        assert!(registry.dispose(ptr));
        assert!(!registry.dispose(ptr));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn disposing_unregistered_pointer_is_a_noop() {
        let registry = DisposerRegistry::new();
        let mut x = 0u8;
        assert!(!registry.dispose(&mut x as *mut u8 as *mut std::ffi::c_void));
    }
}
