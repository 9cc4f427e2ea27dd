//! Turns uploaded file content into candidate addresses.

use crate::core::error::{AppError, Result};
use std::path::Path;

/// Maximum number of candidates taken from a single upload.
pub const MAX_ADDRESSES: usize = 40_000;

const ACCEPTED_EXTENSIONS: [&str; 2] = ["csv", "txt"];

/// Splits raw text on newlines and commas into candidate addresses.
///
/// Tokens are trimmed and stripped of quote characters; empty tokens and tokens
/// without an `@` are discarded. Duplicates are kept. Anything past `max_entries`
/// is dropped silently (a warning is logged).
///
/// Returns `Err(AppError::EmptyInput)` if nothing usable remains.
pub fn parse_addresses(raw: &str, max_entries: usize) -> Result<Vec<String>> {
    let mut candidates: Vec<String> = raw
        .split(['\n', ','])
        .map(|token| {
            token
                .trim()
                .chars()
                .filter(|c| *c != '"' && *c != '\'')
                .collect::<String>()
        })
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty() && token.contains('@'))
        .collect();

    if candidates.len() > max_entries {
        tracing::warn!(target: "input",
            "Input holds {} candidate addresses; keeping the first {} and dropping {}.",
            candidates.len(), max_entries, candidates.len() - max_entries);
        candidates.truncate(max_entries);
    }

    if candidates.is_empty() {
        return Err(AppError::EmptyInput(
            "no tokens containing '@' were found".to_string(),
        ));
    }

    tracing::debug!(target: "input", "Parsed {} candidate addresses.", candidates.len());
    Ok(candidates)
}

/// Rejects uploads with the wrong type or size before any parsing happens.
///
/// The file type is judged by extension (`.csv` or `.txt`, case-insensitive).
pub fn check_input_file(path: &Path, size_bytes: u64, max_file_size: u64) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension {
        Some(ref ext) if ACCEPTED_EXTENSIONS.contains(&ext.as_str()) => {}
        _ => {
            return Err(AppError::UnsupportedFile(format!(
                "'{}' is not a CSV or plain-text file",
                path.display()
            )));
        }
    }

    if size_bytes > max_file_size {
        return Err(AppError::UnsupportedFile(format!(
            "'{}' is {} bytes, above the {} byte limit",
            path.display(),
            size_bytes,
            max_file_size
        )));
    }

    Ok(())
}

/// Checks and reads an upload from disk, then parses it.
pub fn read_addresses_file(path: &Path, max_file_size: u64, max_entries: usize) -> Result<Vec<String>> {
    let metadata = std::fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(AppError::UnsupportedFile(format!(
            "'{}' is not a regular file",
            path.display()
        )));
    }
    check_input_file(path, metadata.len(), max_file_size)?;

    tracing::info!(target: "input", "Reading addresses from '{}' ({} bytes).", path.display(), metadata.len());
    let content = std::fs::read_to_string(path)?;
    parse_addresses(&content, max_entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_mixed_delimiters() {
        let parsed = parse_addresses(" a@x.com ,b@y.org\n\nc@z.net\r\n", MAX_ADDRESSES).unwrap();
        assert_eq!(parsed, vec!["a@x.com", "b@y.org", "c@z.net"]);
    }

    #[test]
    fn test_parse_discards_tokens_without_at() {
        let parsed = parse_addresses("a@gmail.com,not-an-email,b@microsoft.com", MAX_ADDRESSES).unwrap();
        assert_eq!(parsed, vec!["a@gmail.com", "b@microsoft.com"]);
    }

    #[test]
    fn test_parse_strips_quotes() {
        let parsed = parse_addresses("\"a@x.com\",'b@y.org'", MAX_ADDRESSES).unwrap();
        assert_eq!(parsed, vec!["a@x.com", "b@y.org"]);
    }

    #[test]
    fn test_parse_keeps_duplicates() {
        let parsed = parse_addresses("a@x.com,a@x.com", MAX_ADDRESSES).unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn test_parse_truncates_silently() {
        let raw = (0..40_001)
            .map(|i| format!("user{}@example.com", i))
            .collect::<Vec<_>>()
            .join(",");
        let parsed = parse_addresses(&raw, MAX_ADDRESSES).unwrap();
        assert_eq!(parsed.len(), 40_000);
        assert_eq!(parsed.last().unwrap(), "user39999@example.com");
    }

    #[test]
    fn test_parse_empty_is_error() {
        assert!(matches!(parse_addresses("", MAX_ADDRESSES), Err(AppError::EmptyInput(_))));
        assert!(matches!(
            parse_addresses(" , \n nothing here", MAX_ADDRESSES),
            Err(AppError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_check_input_file() {
        let limit = 10 * 1024 * 1024;
        assert!(check_input_file(Path::new("list.csv"), 100, limit).is_ok());
        assert!(check_input_file(Path::new("LIST.TXT"), 100, limit).is_ok());
        assert!(matches!(
            check_input_file(Path::new("list.xlsx"), 100, limit),
            Err(AppError::UnsupportedFile(_))
        ));
        assert!(matches!(
            check_input_file(Path::new("noext"), 100, limit),
            Err(AppError::UnsupportedFile(_))
        ));
        assert!(matches!(
            check_input_file(Path::new("big.csv"), limit + 1, limit),
            Err(AppError::UnsupportedFile(_))
        ));
    }

    #[test]
    fn test_read_addresses_file() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "a@x.com\nb@y.org").unwrap();
        let parsed = read_addresses_file(file.path(), 1024, MAX_ADDRESSES).unwrap();
        assert_eq!(parsed, vec!["a@x.com", "b@y.org"]);

        assert!(matches!(
            read_addresses_file(file.path(), 2, MAX_ADDRESSES),
            Err(AppError::UnsupportedFile(_))
        ));
    }
}
