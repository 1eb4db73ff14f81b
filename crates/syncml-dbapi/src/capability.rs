//! Capability string parsing and version-gated method-group selection.
//!
//! Grounded on `dbapi.cpp::TDB_Api_Config::Connect` and
//! `MinVersionCheck`: a plugin reports its capabilities as a
//! newline-separated `key:value` block; this module parses that block
//! and decides which method-group key (current or legacy) the
//! negotiator should look for.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::method_table::MethodGroupKey;

pub const ENGINE_SDK_VERSION: u32 = 320;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupMode {
    /// Group disabled; plugin does not implement it.
    Disabled,
    /// Group enabled under the current scheme only.
    Current,
    /// Group enabled under the legacy scheme only.
    Legacy,
    /// Plugin wires both the string and key variant of a group.
    Both,
}

#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    fields: HashMap<String, String>,
}

impl Capabilities {
    /// Parses a newline-separated `key:value` capability block. Lines
    /// without a `:` are ignored rather than rejected, matching the
    /// tolerant original parser.
    pub fn parse(raw: &str) -> Self {
        let mut fields = HashMap::new();
        for line in raw.lines() {
            if let Some((key, value)) = line.split_once(':') {
                fields.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// `MinVersionCheck`: every `MinVersion` line found must be at or
    /// below the engine's own SDK version. A capability block may
    /// legitimately contain more than one `MinVersion` line once
    /// concatenated from module- and datastore-level responses, so we
    /// track the maximum seen.
    pub fn check_min_version(&self, engine_version: u32) -> Result<()> {
        if let Some(raw) = self.get("MinVersion") {
            let required: u32 = raw.parse().map_err(|_| {
                Error::Loader(format!("malformed MinVersion capability: {raw:?}"))
            })?;
            if engine_version < required {
                return Err(Error::TooOld);
            }
        }
        Ok(())
    }

    pub fn admin_as_key(&self) -> bool {
        self.flag_true("AdminAsKey")
    }

    pub fn item_as_key(&self) -> bool {
        self.flag_true("ItemAsKey")
    }

    fn flag_true(&self, key: &str) -> bool {
        matches!(self.get(key), Some(v) if v.eq_ignore_ascii_case("yes") || v == "1")
    }

    /// `FlagOK`/`FlagBoth` equivalent: decides how a given method
    /// group should be wired given its capability-string value.
    pub fn group_mode(&self, key: MethodGroupKey) -> GroupMode {
        match self.get(key.capability_key()) {
            None => GroupMode::Disabled,
            Some(v) if v.eq_ignore_ascii_case("no") => GroupMode::Disabled,
            Some(v) if v.eq_ignore_ascii_case("both") => GroupMode::Both,
            Some(_) => GroupMode::Current,
        }
    }
}

/// One legacy-vs-current gate: if the plugin's declared capability
/// version is below `required`, the negotiator should look for
/// `legacy` instead of `current`. Mirrors the `Supported(VP_*)` checks
/// in `dbapi.cpp::Connect`.
pub struct VersionGate {
    pub required: u32,
    pub current: MethodGroupKey,
    pub legacy: MethodGroupKey,
}

pub const VERSION_GATES: &[VersionGate] = &[
    VersionGate {
        required: 300, // VP_InsertMapItem
        current: MethodGroupKey::DsAdminMap,
        legacy: MethodGroupKey::DsAdminOld,
    },
    VersionGate {
        required: 310, // VP_FLI_DSS / VP_ResumeToken
        current: MethodGroupKey::DsData,
        legacy: MethodGroupKey::DsDataOld2,
    },
    VersionGate {
        required: 301, // VP_BLOB_JSignature / VP_DeleteBlob
        current: MethodGroupKey::DsBlob,
        legacy: MethodGroupKey::DsBlobOld2,
    },
];

/// Resolves which group key to actually look up in the capability
/// string and method table for a gated group, given the plugin's
/// advertised capability version (distinct from `MinVersion`; taken
/// from an optional `SubVersion` capability field).
pub fn resolve_gated_key(caps: &Capabilities, current: MethodGroupKey) -> MethodGroupKey {
    let plugin_version: u32 = caps
        .get("SubVersion")
        .and_then(|v| v.parse().ok())
        .unwrap_or(u32::MAX);
    for gate in VERSION_GATES {
        if gate.current == current && plugin_version < gate.required {
            return gate.legacy;
        }
    }
    current
}
