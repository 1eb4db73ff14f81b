//! Opaque context handles.
//!
//! The original DBApi ABI passes an untyped `CContext` at each of the
//! three nesting levels (module, session, datastore). We keep the
//! untyped-handle feel (engine code never inspects the value, only
//! threads it back through later calls) but give each level its own
//! type so a session handle can't be passed where a datastore handle
//! is expected.
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

fn next() -> u64 {
    NEXT_HANDLE.fetch_add(1, Ordering::Relaxed)
}

macro_rules! context_handle {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            pub fn new() -> Self {
                Self(next())
            }

            pub fn as_raw(self) -> u64 {
                self.0
            }

            /// Reconstructs a handle from a raw value obtained from
            /// `as_raw`, for the C ABI boundary where a handle crosses
            /// out of the process's own type system and back.
            pub fn from_raw(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

context_handle!(ModuleContext);
context_handle!(SessionContext);
context_handle!(DatastoreContext);
