//! Directory-tree scanning for upload
//!
//! Expands a drag-and-drop payload into a flat, order-preserving sequence
//! of files and synthetic directory markers, tracking an unbounded fan-out
//! of asynchronous reads with a pending-operation counter.

mod entry;
mod scanner;
mod source;

pub use entry::{DropPayload, ScanEntry, ScanStats};
pub use scanner::TreeScanner;
pub use source::{DirHandle, EntrySource, FileContent, FileHandle, RawEntry};
