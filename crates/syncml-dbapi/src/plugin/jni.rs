//! JNI backend stub.
//!
//! Grounded on `sync_dbapiconnect.h`'s Java signature helpers
//! (`c_JNI_ItemID`, `c_JNI_DB_Callback`, `LCP`/`JCS`/`SgnS` signature
//! builders). Full method dispatch through a JVM is out of this
//! crate's scope (no JVM is available in this build); this module
//! only resolves a class path down to `NotImplemented` so the
//! negotiator has a real, well-typed answer rather than silently
//! falling through to the DLL backend.

use crate::error::{Error, Result};
use crate::plugin::DatastorePlugin;
use std::sync::Arc;

pub fn load(_class_name: &str) -> Result<Arc<dyn DatastorePlugin>> {
    Err(Error::NotImplemented)
}

/// Java type signature for a class in the given package, mirroring
/// `LCP` in `sync_dbapiconnect.h`.
pub fn lcp(package: &str, class_name: &str) -> String {
    format!("L{}/{};", package.replace('.', "/"), class_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lcp_builds_jni_class_signature() {
        assert_eq!(lcp("com.example", "Backup"), "Lcom/example/Backup;");
    }

    #[test]
    fn load_reports_not_implemented() {
        assert!(matches!(load("com.example.Backup"), Err(Error::NotImplemented)));
    }
}
