//! Scan result entries and drop payload classification
//!
//! A scan flattens a dropped tree into a sequence of [`ScanEntry`] values:
//! one `File` per materialized file and one synthetic `Directory` marker
//! per directory, with each marker appearing before any of its own
//! descendants.

use crate::scan::source::{FileContent, RawEntry};
use std::sync::atomic::{AtomicU64, Ordering};

/// One flattened entry discovered during a scan
///
/// `full_path` is forward-slash separated and relative to the scan root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEntry {
    /// A materialized file
    File {
        /// Path relative to the scan root
        full_path: String,

        /// Byte size of the content
        size: u64,

        /// Materialized content
        content: FileContent,
    },

    /// A synthetic directory marker (no content, size zero)
    Directory {
        /// Path relative to the scan root
        full_path: String,
    },
}

impl ScanEntry {
    /// Create a file entry, deriving the size from the content
    pub fn file(full_path: impl Into<String>, content: FileContent) -> Self {
        let size = content.size();
        ScanEntry::File {
            full_path: full_path.into(),
            size,
            content,
        }
    }

    /// Create a directory marker
    pub fn directory(full_path: impl Into<String>) -> Self {
        ScanEntry::Directory {
            full_path: full_path.into(),
        }
    }

    /// Path relative to the scan root
    pub fn full_path(&self) -> &str {
        match self {
            ScanEntry::File { full_path, .. } => full_path,
            ScanEntry::Directory { full_path } => full_path,
        }
    }

    /// Final path segment
    pub fn name(&self) -> &str {
        self.full_path()
            .rsplit('/')
            .next()
            .unwrap_or_else(|| self.full_path())
    }

    /// Byte size (zero for directory markers)
    pub fn size(&self) -> u64 {
        match self {
            ScanEntry::File { size, .. } => *size,
            ScanEntry::Directory { .. } => 0,
        }
    }

    /// True for directory markers
    pub fn is_dir(&self) -> bool {
        matches!(self, ScanEntry::Directory { .. })
    }
}

/// What the browser handed over on drop
#[derive(Debug, Clone)]
pub enum DropPayload {
    /// Typed entries: files and directories to be walked
    Items(Vec<RawEntry>),

    /// Flat file list only (no typed items collection was exposed);
    /// resolved as-is with no tree walk
    Files(Vec<ScanEntry>),
}

/// Counters accumulated across scans
#[derive(Debug, Default)]
pub struct ScanStats {
    /// Directory markers emitted
    pub dirs_found: AtomicU64,

    /// Files materialized
    pub files_found: AtomicU64,

    /// Total bytes across materialized files
    pub bytes_found: AtomicU64,

    /// Directory pages read (including final empty pages)
    pub pages_read: AtomicU64,

    /// Failed source operations
    pub errors: AtomicU64,
}

impl ScanStats {
    pub fn record_dir(&self) {
        self.dirs_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_file(&self, bytes: u64) {
        self.files_found.fetch_add(1, Ordering::Relaxed);
        self.bytes_found.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_page(&self) {
        self.pages_read.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_entry_size_from_content() {
        let entry = ScanEntry::file(
            "docs/a.txt",
            FileContent {
                bytes: vec![0u8; 10],
            },
        );
        assert_eq!(entry.size(), 10);
        assert_eq!(entry.full_path(), "docs/a.txt");
        assert_eq!(entry.name(), "a.txt");
        assert!(!entry.is_dir());
    }

    #[test]
    fn test_directory_marker() {
        let entry = ScanEntry::directory("docs");
        assert!(entry.is_dir());
        assert_eq!(entry.size(), 0);
        assert_eq!(entry.name(), "docs");
    }
}
