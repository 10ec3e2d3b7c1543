//! Malformed-document report.
//!
//! One CSV row per input that could not be parsed, columns `file_name,error`,
//! no header. A run without malformed input removes a stale report.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::output::write_atomic;

/// An input file that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedDocument {
    pub file_name: String,
    pub error: String,
}

impl MalformedDocument {
    pub fn new(file_name: impl Into<String>, error: impl ToString) -> Self {
        Self {
            file_name: file_name.into(),
            error: error.to_string(),
        }
    }
}

/// Render report rows.
///
/// # Examples
/// ```
/// use bv_refiner::report::{to_csv, MalformedDocument};
///
/// let rows = [MalformedDocument::new("a_tei.xml", "unexpected end, line 3")];
/// assert_eq!(to_csv(&rows), "a_tei.xml,\"unexpected end, line 3\"\r\n");
/// ```
pub fn to_csv(documents: &[MalformedDocument]) -> String {
    let mut out = String::new();
    for doc in documents {
        out.push_str(&csv_field(&doc.file_name));
        out.push(',');
        out.push_str(&csv_field(&doc.error));
        out.push_str("\r\n");
    }
    out
}

/// Write the report, or remove an existing one when there is nothing to report.
pub fn write_report(path: &Path, documents: &[MalformedDocument]) -> Result<()> {
    if documents.is_empty() {
        return match fs::remove_file(path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Removed stale malformed-document report");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        };
    }

    write_atomic(path, to_csv(documents).as_bytes())?;
    tracing::warn!(
        count = documents.len(),
        path = %path.display(),
        "Malformed documents reported"
    );
    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_csv_quoting() {
        let rows = vec![
            MalformedDocument::new("plain_tei.xml", "bad"),
            MalformedDocument::new("q_tei.xml", "say \"hi\"\nagain"),
        ];
        assert_eq!(
            to_csv(&rows),
            "plain_tei.xml,bad\r\nq_tei.xml,\"say \"\"hi\"\"\nagain\"\r\n"
        );
    }

    #[test]
    fn test_write_and_remove_report() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("malformed_files.csv");

        write_report(&path, &[MalformedDocument::new("x_tei.xml", "broken")]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "x_tei.xml,broken\r\n");

        write_report(&path, &[]).unwrap();
        assert!(!path.exists());

        write_report(&path, &[]).unwrap();
    }
}
