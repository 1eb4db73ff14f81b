//! Plugin name grammar and backend dispatch.
//!
//! Grounded on `dbapi.cpp::TDB_Api_Config::Connect` for the
//! bracket/sub-name/options grammar (`SDK_support.h`'s `SepFound`,
//! `SDK_support.cpp`'s `WithSubSystem`/`Plugin_SubName`), and on
//! `platform_adapters/linux/platform_DLL.cpp::DLWrapper::connect` for
//! the `//static/SYM=ADDR` notation used to inject compiled-in
//! function addresses for testing without a real shared library. The
//! source's older `subsystem:id` colon notation is explicitly marked
//! "no longer supported" at `dbapi.cpp:782` and is not reproduced here.

use std::collections::HashMap;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// Statically linked into the host process namespace.
    Lib,
    /// Loaded from a shared library via `dlopen`/`LoadLibrary`.
    Dll,
    /// Bridged through a JNI class.
    Jni,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginName {
    pub plugin_id: String,
    /// Introduced by `!` per `spec.md` §4.A, e.g. `aaa!bbb`.
    pub sub_name: Option<String>,
    pub options: Option<String>,
    /// Set when the id was enclosed in brackets, per `spec.md` §4.A:
    /// `[core]` forces LIB-mode resolution regardless of sub-name.
    pub is_lib: bool,
}

/// Splits a plugin name per `spec.md` §4.A's grammar:
/// `fullname := [ '[' core ']' ] ( '!' subname )? ( ' ' options )?`,
/// `core := literal-plugin-id ( ' ' options )?`.
///
/// Brackets are checked first (recording `is_lib`); if bracketed, any
/// options live inside the brackets alongside the id (`core`'s own
/// trailing-space rule). What follows the (optional) brackets is then
/// split on the first `!` into the id-so-far and a sub-name, and the
/// sub-name is itself split on its first space into the sub-name
/// proper and a trailing options string. An unbracketed name with no
/// `!` keeps whatever options followed its first space.
pub fn parse_plugin_name(raw: &str) -> PluginName {
    let raw = raw.trim();

    let (core, rest, is_lib) = if let Some(after_open) = raw.strip_prefix('[') {
        match after_open.find(']') {
            Some(close) => (&after_open[..close], &after_open[close + 1..], true),
            None => (after_open, "", true),
        }
    } else {
        match raw.find('!') {
            Some(pos) => (&raw[..pos], &raw[pos..], false),
            None => (raw, "", false),
        }
    };

    let (mut plugin_id, mut options) = split_id_and_options(core);

    let rest = rest.trim_start();
    let sub_name = if let Some(after_bang) = rest.strip_prefix('!') {
        let (sub_name, sub_options) = split_id_and_options(after_bang);
        if sub_options.is_some() {
            options = sub_options;
        }
        Some(sub_name)
    } else if !rest.is_empty() {
        options = Some(rest.to_string());
        None
    } else {
        None
    };

    if plugin_id.is_empty() && is_lib {
        // `[]` with nothing inside: keep the empty id rather than panic.
        plugin_id = String::new();
    }

    PluginName {
        plugin_id,
        sub_name,
        options,
        is_lib,
    }
}

/// Splits `id` or `id options` on the first space.
fn split_id_and_options(s: &str) -> (String, Option<String>) {
    let s = s.trim();
    match s.split_once(' ') {
        Some((id, opts)) => (id.to_string(), Some(opts.trim().to_string()).filter(|o| !o.is_empty())),
        None => (s.to_string(), None),
    }
}

/// Decides which backend a plugin name resolves to. Bracketed ids
/// (`is_lib`) always force the in-process namespace, per `spec.md`
/// §4.A; a name matching a compiled-in namespace registered with the
/// loader resolves the same way even unbracketed. Anything else is
/// attempted as a dynamic library load; the JNI bridge is only reached
/// as a fallback when the dynamic load itself cannot proceed (see
/// `registry.rs::load_one`).
pub fn resolve_backend(name: &PluginName) -> Backend {
    if name.is_lib || crate::plugin::native::NATIVE_REGISTRY.get(&name.plugin_id).is_some() {
        Backend::Lib
    } else {
        Backend::Dll
    }
}

/// Parses a `//static/SYM=ADDR/SYM2=ADDR2` static symbol table, used
/// to inject compiled-in addresses for symbols instead of resolving
/// them through a real shared library. Malformed entries (missing
/// `=`, non-decimal address) are silently dropped, matching the
/// tolerant original parser.
pub fn parse_static_symbols(raw: &str) -> Result<HashMap<String, usize>> {
    let body = raw
        .strip_prefix("//static/")
        .ok_or_else(|| Error::Loader(format!("not a static symbol table: {raw:?}")))?;

    let mut symbols = HashMap::new();
    for entry in body.split('/') {
        if entry.is_empty() {
            continue;
        }
        if let Some((sym, addr)) = entry.split_once('=') {
            if let Ok(addr) = addr.parse::<usize>() {
                symbols.insert(sym.to_string(), addr);
            }
        }
    }
    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bracketed_core_with_options() {
        let parsed = parse_plugin_name("[syncml_backup /tmp/data]");
        assert!(parsed.is_lib);
        assert_eq!(parsed.plugin_id, "syncml_backup");
        assert_eq!(parsed.options.as_deref(), Some("/tmp/data"));
        assert_eq!(parsed.sub_name, None);
    }

    #[test]
    fn parses_name_without_sub_name_or_options() {
        let parsed = parse_plugin_name("syncml_backup");
        assert_eq!(parsed.sub_name, None);
        assert_eq!(parsed.plugin_id, "syncml_backup");
        assert_eq!(parsed.options, None);
        assert!(!parsed.is_lib);
    }

    #[test]
    fn splits_sub_name_on_bang() {
        let parsed = parse_plugin_name("aaa!bbb");
        assert_eq!(parsed.plugin_id, "aaa");
        assert_eq!(parsed.sub_name.as_deref(), Some("bbb"));
        assert_eq!(parsed.options, None);
        assert!(!parsed.is_lib);
    }

    #[test]
    fn splits_sub_name_on_bang_inside_brackets() {
        let parsed = parse_plugin_name("[aaa]!bbb");
        assert!(parsed.is_lib);
        assert_eq!(parsed.plugin_id, "aaa");
        assert_eq!(parsed.sub_name.as_deref(), Some("bbb"));
    }

    #[test]
    fn sub_name_carries_trailing_options() {
        let parsed = parse_plugin_name("aaa!bbb ccc");
        assert_eq!(parsed.plugin_id, "aaa");
        assert_eq!(parsed.sub_name.as_deref(), Some("bbb"));
        assert_eq!(parsed.options.as_deref(), Some("ccc"));
    }

    #[test]
    fn resolves_lib_for_brackets_and_dll_otherwise() {
        assert_eq!(
            resolve_backend(&parse_plugin_name("[no_dbapi]")),
            Backend::Lib
        );
        assert_eq!(
            resolve_backend(&parse_plugin_name("./syncml_backup.so")),
            Backend::Dll
        );
    }

    #[test]
    fn brackets_force_lib_backend_regardless_of_sub_name() {
        let parsed = parse_plugin_name("[no_dbapi]");
        assert!(parsed.is_lib);
        assert_eq!(parsed.plugin_id, "no_dbapi");
        assert_eq!(resolve_backend(&parsed), Backend::Lib);

        let parsed = parse_plugin_name("[syncml_backup /tmp/data]!legacy");
        assert!(parsed.is_lib);
        assert_eq!(parsed.sub_name.as_deref(), Some("legacy"));
        assert_eq!(resolve_backend(&parsed), Backend::Lib);
    }

    #[test]
    fn parses_static_symbol_table_and_drops_malformed_entries() {
        let symbols = parse_static_symbols("//static/CreateContext=4096/garbage/ReadItem=8192").unwrap();
        assert_eq!(symbols.get("CreateContext"), Some(&4096));
        assert_eq!(symbols.get("ReadItem"), Some(&8192));
        assert_eq!(symbols.len(), 2);
    }

    #[test]
    fn rejects_non_static_string() {
        assert!(parse_static_symbols("plain_plugin_name").is_err());
    }
}
