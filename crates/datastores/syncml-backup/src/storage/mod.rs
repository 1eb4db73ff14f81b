//! Tab-separated file persistence, shared by the data, map, and admin
//! tables.
//!
//! Grounded on `spec.md` §6 and `sysync_SDK/Sources/dbitem.cpp`: files
//! are UTF-8 with an optional leading BOM, one record per line, fields
//! separated by TAB, an in-field LF escaped as VT (`\x0B`), array
//! fields joined with RS (`\x1D`), and a header line naming the
//! fields. Saving a file is always a whole-file rewrite.

pub mod admin_store;
pub mod blob_store;
pub mod item_store;
pub mod map_store;

use std::fs;
use std::path::{Path, PathBuf};

use syncml_dbapi::error::{Error, Result};

const ARRAY_SEPARATOR: char = '\u{1D}';
const LINE_ESCAPE: char = '\u{0B}';
const BOM: char = '\u{FEFF}';

/// Escapes embedded newlines in a single field value as VT so the
/// TAB/LF-delimited line structure stays intact.
pub fn escape_field(value: &str) -> String {
    value.replace('\n', &LINE_ESCAPE.to_string())
}

pub fn unescape_field(value: &str) -> String {
    value.replace(LINE_ESCAPE, "\n")
}

pub fn join_array(values: &[String]) -> String {
    values.join(&ARRAY_SEPARATOR.to_string())
}

pub fn split_array(value: &str) -> Vec<String> {
    if value.is_empty() {
        Vec::new()
    } else {
        value.split(ARRAY_SEPARATOR).map(str::to_string).collect()
    }
}

/// Reads a TSV file, tolerating a leading BOM and stripping the header
/// line. Returns the remaining lines split on TAB, with each field
/// unescaped. A missing file is treated as empty (no rows yet), not
/// an error.
pub fn read_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path)?;
    let raw = raw.strip_prefix(BOM).unwrap_or(&raw);
    let mut lines = raw.lines();
    lines.next(); // header
    Ok(lines
        .filter(|l| !l.is_empty())
        .map(|line| line.split('\t').map(unescape_field).collect())
        .collect())
}

/// Rewrites the whole file with the given header and rows, escaping
/// each field and writing a BOM so future loads round-trip.
pub fn write_rows(path: &Path, header: &[&str], rows: &[Vec<String>]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = String::new();
    out.push(BOM);
    out.push_str(&header.join("\t"));
    out.push_str("\r\n");
    for row in rows {
        let escaped: Vec<String> = row.iter().map(|f| escape_field(f)).collect();
        out.push_str(&escaped.join("\t"));
        out.push_str("\r\n");
    }
    fs::write(path, out)?;
    Ok(())
}

/// Sanitizes a key component (device, user, or datastore name) for
/// use in a file name: anything but ASCII alphanumerics, `-`, and `_`
/// becomes `_`.
fn sanitize(component: &str) -> String {
    component
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Builds the path for a given role/device/user/datastore quadruple,
/// following the `P_Device`/`P_Data` role-prefix convention.
pub fn role_path(base_dir: &Path, role: &str, device: &str, user: &str, datastore: &str) -> PathBuf {
    let stem = format!(
        "{role}_{}_{}_{}.tsv",
        sanitize(device),
        sanitize(user),
        sanitize(datastore)
    );
    base_dir.join(stem)
}

pub fn require_utf8(data: &[u8]) -> Result<String> {
    String::from_utf8(data.to_vec()).map_err(|e| Error::Generic(format!("non-UTF-8 item payload: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_round_trips() {
        let values = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let joined = join_array(&values);
        assert_eq!(split_array(&joined), values);
    }

    #[test]
    fn empty_array_round_trips() {
        assert!(split_array(&join_array(&[])).is_empty());
    }

    #[test]
    fn field_escape_round_trips_embedded_newline() {
        let original = "line one\nline two";
        assert_eq!(unescape_field(&escape_field(original)), original);
    }

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize("dev/1 name"), "dev_1_name");
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let rows = read_rows(Path::new("/nonexistent/syncml-backup-test.tsv")).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn write_then_read_round_trips_rows_and_bom() {
        let dir = std::env::temp_dir().join(format!("syncml-backup-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("roundtrip.tsv");
        let rows = vec![
            vec!["10000".to_string(), "a\nb".to_string()],
            vec!["10001".to_string(), "plain".to_string()],
        ];
        write_rows(&path, &["id", "data"], &rows).unwrap();
        let read_back = read_rows(&path).unwrap();
        assert_eq!(read_back, rows);
        std::fs::remove_file(&path).ok();
    }
}
