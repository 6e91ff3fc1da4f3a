//! Log and notes file access: bounded tails, size/mtime stats, and the
//! append-only notes contract.

use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use thiserror::Error;

use crate::text::{format_clock, utc_stamp};

#[derive(Debug, Error)]
pub enum NotesError {
    #[error("cannot create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write notes file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Last `n` lines of a file, oldest first. Missing or unreadable files
/// yield an empty tail; invalid UTF-8 is replaced.
pub fn tail_lines(path: &Path, n: usize) -> Vec<String> {
    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };
    let mut reader = BufReader::new(file);
    let mut q: VecDeque<String> = VecDeque::with_capacity(n.min(256));
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                }
                q.push_back(String::from_utf8_lossy(&buf).into_owned());
                if q.len() > n {
                    q.pop_front();
                }
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "tail read stopped");
                break;
            }
        }
    }
    q.into()
}

/// Size and modification time of a file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileStat {
    pub size: u64,
    /// Local `HH:MM:SS` of the last modification
    pub modified: Option<String>,
}

pub fn stat(path: &Path) -> Option<FileStat> {
    let meta = fs::metadata(path).ok()?;
    if !meta.is_file() {
        return None;
    }
    let modified = meta
        .modified()
        .ok()
        .map(|t| format_clock(DateTime::<Local>::from(t)));
    Some(FileStat {
        size: meta.len(),
        modified,
    })
}

/// Make sure the notes file exists, creating parents and an empty file
pub fn ensure_file(path: &Path) -> Result<(), NotesError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| NotesError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| NotesError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(())
}

/// Append `<UTC-ISO8601> <text>` to the notes file. Blank text is not
/// written; returns whether a line was appended.
pub fn append_note(path: &Path, text: &str, at: DateTime<Utc>) -> Result<bool, NotesError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(false);
    }
    ensure_file(path)?;

    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|source| NotesError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    writeln!(file, "{} {}", utc_stamp(at), text).map_err(|source| NotesError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), "note appended");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_tail_lines_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runtime.log");
        let body: String = (0..10).map(|i| format!("line {}\n", i)).collect();
        fs::write(&path, body).unwrap();

        let tail = tail_lines(&path, 3);
        assert_eq!(tail, vec!["line 7", "line 8", "line 9"]);
    }

    #[test]
    fn test_tail_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(tail_lines(&dir.path().join("nope.log"), 10).is_empty());
    }

    #[test]
    fn test_tail_without_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.log");
        fs::write(&path, "one\ntwo").unwrap();
        assert_eq!(tail_lines(&path, 5), vec!["one", "two"]);
    }

    #[test]
    fn test_append_note_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes").join("agent_chat.log");
        ensure_file(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");

        let at = Utc.with_ymd_and_hms(2026, 10, 19, 8, 15, 0).unwrap();
        assert!(append_note(&path, "  deploy v2  ", at).unwrap());

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "2026-10-19T08:15:00Z deploy v2\n");
    }

    #[test]
    fn test_blank_note_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent_chat.log");
        assert!(!append_note(&path, "   ", Utc::now()).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_stat_reports_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runtime.log");
        fs::write(&path, vec![b'x'; 100]).unwrap();

        let st = stat(&path).unwrap();
        assert_eq!(st.size, 100);
        assert!(st.modified.is_some());
        assert!(stat(&dir.path().join("missing")).is_none());
    }
}
