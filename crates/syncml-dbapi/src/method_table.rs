//! Method table groups.
//!
//! Mirrors the nested structs in `sync_dbapiconnect.h`: every callable
//! DBApi operation lives in exactly one group, every slot is
//! independently nullable, and a whole group is replaced atomically
//! when a plugin's capability string enables or disables it (the
//! `ConnectFunctions` pattern from `DLL_interface.cpp`, generalized
//! away from its vararg C signature).

use std::sync::Arc;

/// One group of related method slots. `T` is a boxed trait object
/// bundle for that group; `None` means the plugin never wired this
/// group and callers should fall back to a no-op default.
#[derive(Clone)]
pub struct MethodGroup<T: ?Sized>(Option<Arc<T>>);

impl<T: ?Sized> MethodGroup<T> {
    pub fn empty() -> Self {
        Self(None)
    }

    pub fn set(&mut self, methods: Arc<T>) {
        self.0 = Some(methods);
    }

    pub fn get(&self) -> Option<&Arc<T>> {
        self.0.as_ref()
    }

    pub fn is_wired(&self) -> bool {
        self.0.is_some()
    }
}

impl<T: ?Sized> Default for MethodGroup<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Every group key recognized in the capability string / method table,
/// taken verbatim from `dbapi_include.h::AssignMethods`. Legacy
/// aliases are kept distinct from their current-scheme counterpart so
/// the negotiator can choose between them per §4.C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodGroupKey {
    Start,
    Param,
    Session,
    SeAuth,
    SeAuthOld,
    SeAdapt,
    DvAdmin,
    DvDbTime,
    DsGeneral,
    DsAdminStr,
    DsAdminKey,
    DsAdminMap,
    DsAdminOld,
    DsAdapt,
    DsData,
    DsDataOld1,
    DsDataOld2,
    DsDataStr,
    DsDataKey,
    DsBlob,
    DsBlobOld1,
    DsBlobOld2,
    Datastore,
    Ui,
}

impl MethodGroupKey {
    /// Capability-string key exactly as emitted by a plugin, per
    /// `dbapi_include.h`.
    pub fn capability_key(self) -> &'static str {
        use MethodGroupKey::*;
        match self {
            Start => "Plugin_Start",
            Param => "Plugin_Param",
            Session => "Plugin_Session",
            SeAuth => "Plugin_SE_Auth",
            SeAuthOld => "Plugin_SE_Auth_OLD",
            SeAdapt => "Plugin_SE_Adapt",
            DvAdmin => "Plugin_DV_Admin",
            DvDbTime => "Plugin_DV_DBTime",
            DsGeneral => "Plugin_DS_General",
            DsAdminStr => "Plugin_DS_Admin_Str",
            DsAdminKey => "Plugin_DS_Admin_Key",
            DsAdminMap => "Plugin_DS_Admin_Map",
            DsAdminOld => "Plugin_DS_Admin_OLD",
            DsAdapt => "Plugin_DS_Adapt",
            DsData => "Plugin_DS_Data",
            DsDataOld1 => "Plugin_DS_Data_OLD1",
            DsDataOld2 => "Plugin_DS_Data_OLD2",
            DsDataStr => "Plugin_DS_Data_Str",
            DsDataKey => "Plugin_DS_Data_Key",
            DsBlob => "Plugin_DS_Blob",
            DsBlobOld1 => "Plugin_DS_Blob_OLD1",
            DsBlobOld2 => "Plugin_DS_Blob_OLD2",
            Datastore => "Plugin_Datastore",
            Ui => "Plugin_UI",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_starts_unwired() {
        let g: MethodGroup<dyn std::fmt::Debug> = MethodGroup::empty();
        assert!(!g.is_wired());
    }

    #[test]
    fn capability_keys_match_original_scheme() {
        assert_eq!(MethodGroupKey::DsAdminMap.capability_key(), "Plugin_DS_Admin_Map");
        assert_eq!(MethodGroupKey::DsBlobOld1.capability_key(), "Plugin_DS_Blob_OLD1");
    }
}
