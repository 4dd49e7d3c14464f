//! Entry source abstraction
//!
//! The scanner never touches a real file-system API. It works against an
//! [`EntrySource`] collaborator that knows how to read one page of a
//! directory's children and how to materialize a file's content. In the
//! browser this maps onto the drag-and-drop entry API (directory readers
//! hand back children in pages and must be drained until an empty page);
//! in tests it is a scripted in-memory tree.

use crate::error::ScanResult;

/// Opaque reference to a directory known to the source
///
/// The source owns the pagination cursor for each handle: repeated
/// `read_directory_page` calls with the same handle return successive
/// pages, then an empty page once exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirHandle {
    /// Source-assigned identifier
    pub id: u64,

    /// Directory name (single path segment)
    pub name: String,
}

/// Opaque reference to a not-yet-materialized file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileHandle {
    /// Source-assigned identifier
    pub id: u64,

    /// File name (single path segment)
    pub name: String,
}

/// One node handed back by a directory page read or a top-level drop item
#[derive(Debug, Clone)]
pub enum RawEntry {
    /// A plain file, materialized lazily
    File(FileHandle),

    /// A directory, expanded via paginated reads
    Directory(DirHandle),
}

impl RawEntry {
    /// Name of the underlying node
    pub fn name(&self) -> &str {
        match self {
            RawEntry::File(file) => &file.name,
            RawEntry::Directory(dir) => &dir.name,
        }
    }
}

/// Materialized file content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    /// Raw bytes
    pub bytes: Vec<u8>,
}

impl FileContent {
    /// Byte size of the content
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Asynchronous access to dropped entries
#[async_trait::async_trait]
pub trait EntrySource: Send + Sync {
    /// Read the next page of children for a directory
    ///
    /// Returns an empty vec once the directory is exhausted. Every
    /// directory yields at least one (possibly empty) page.
    async fn read_directory_page(&self, dir: &DirHandle) -> ScanResult<Vec<RawEntry>>;

    /// Materialize a file's content
    async fn materialize_file(&self, file: &FileHandle) -> ScanResult<FileContent>;
}
