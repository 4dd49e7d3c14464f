//! dropwalk - Async job coordination core for a file-management client
//!
//! Two small state machines over pending and in-flight work, plus a pure
//! conflict check, extracted from the client's upload and reload workflows:
//!
//! - **Reload sequencing**: remote "reload configuration" requests are
//!   serviced strictly one at a time. Requests arriving while one is in
//!   flight queue up FIFO, a page-unload guard is held for the whole busy
//!   period, and every settlement is reported as a typed event.
//!
//! - **Tree scanning**: a drag-and-drop payload of files and lazily
//!   disclosed, paginated directories is flattened into an ordered list of
//!   files and directory markers. Completion is gated on a pending counter
//!   that every asynchronous read increments before dispatch and decrements
//!   on every exit path.
//!
//! - **Conflict detection**: a synchronous check of scanned entries against
//!   an existing listing, comparing top-level names only.
//!
//! # Architecture
//!
//! ```text
//!  UI action                 UI action
//!     │                         │
//!     ▼                         ▼
//!  ReloadCoordinator         TreeScanner
//!  ┌──────────────┐          ┌─────────────────────────┐
//!  │ queue (FIFO) │          │ counted task fan-out    │
//!  │ in-flight {1}│          │  file ──► materialize   │
//!  └──────┬───────┘          │  dir  ──► marker + page │
//!         │ one at a time    │           reads (drain) │
//!         ▼                  └────────────┬────────────┘
//!  ReloadTransport                        │ counter == 0
//!         │                               ▼
//!         ▼                        Vec<ScanEntry> ──► has_conflict
//!  ReloadEvent stream
//! ```
//!
//! External collaborators (the remote transport, the entry source, the
//! unload guard, the event observer) are trait seams; the crate carries no
//! HTTP, file-system or UI code of its own.

pub mod config;
pub mod conflict;
pub mod error;
pub mod reload;
pub mod scan;

pub use config::ScanConfig;
pub use conflict::{has_conflict, ListingItem};
pub use error::{ConfigError, CoreError, ReloadError, Result, ScanError};
pub use reload::{
    JobOutcome, ReloadCoordinator, ReloadEvent, ReloadObserver, ReloadResponse, ReloadTransport,
    UnloadGuard,
};
pub use scan::{DropPayload, EntrySource, ScanEntry, TreeScanner};
