//! Tree scanner - flattens a drop payload via a counted async fan-out
//!
//! Every unit of work (one file materialization, one directory page read)
//! increments the in-flight counter before it is dispatched and decrements
//! it on every completion branch, success or failure. The dispatch loop
//! ends exactly when the counter returns to zero, so the scan settles
//! exactly once regardless of how wide or deep the fan-out gets.
//!
//! Directory pagination follows the browser reader contract: a directory
//! is read page by page until an empty page is returned. The marker for a
//! directory is appended before its first page read is dispatched, which
//! is what guarantees parent-before-descendant ordering; no ordering is
//! guaranteed across sibling subtrees processed concurrently.

use crate::config::ScanConfig;
use crate::error::{ScanError, ScanResult};
use crate::scan::entry::{DropPayload, ScanEntry, ScanStats};
use crate::scan::source::{DirHandle, EntrySource, RawEntry};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, warn};

/// Poll interval for the completion check in the dispatch loop
const IDLE_CHECK_INTERVAL: Duration = Duration::from_millis(10);

/// One counted unit of scan work
#[derive(Debug)]
enum ScanTask {
    /// Classify and process one discovered entry
    Entry { entry: RawEntry, prefix: String },

    /// Read the next page of a directory's children
    Page { dir: DirHandle, prefix: String },
}

/// State owned by a single `scan` invocation
///
/// Each call owns an independent counter, result buffer and channel, so
/// concurrent scans do not interfere with each other.
struct ScanCtx {
    source: Arc<dyn EntrySource>,
    stats: Arc<ScanStats>,
    tx: mpsc::UnboundedSender<ScanTask>,
    in_flight: AtomicU64,
    contents: Mutex<Vec<ScanEntry>>,
    failure: Mutex<Option<ScanError>>,
    aborted: AtomicBool,
}

impl ScanCtx {
    /// Dispatch one counted unit of work
    ///
    /// The increment happens before the send so the dispatch loop can
    /// never observe a zero counter while a task is still queued. The
    /// channel is unbounded: execution is already bounded by the
    /// semaphore, and a bounded channel could wedge the fan-out when a
    /// single page yields more children than the channel holds while
    /// every permit holder is blocked on the same full channel.
    fn dispatch(&self, task: ScanTask) -> ScanResult<()> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(task).is_err() {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            return Err(ScanError::QueueSendFailed);
        }
        Ok(())
    }

    /// Record the first failure and stop further work
    fn abort_with(&self, error: ScanError) {
        self.stats.record_error();
        let mut failure = self.failure.lock().expect("Failure slot poisoned");
        if failure.is_none() {
            *failure = Some(error);
        }
        self.aborted.store(true, Ordering::SeqCst);
    }

    fn push(&self, entry: ScanEntry) {
        self.contents
            .lock()
            .expect("Scan results poisoned")
            .push(entry);
    }
}

/// Expands a drop payload into a flat, order-preserving entry sequence
pub struct TreeScanner {
    source: Arc<dyn EntrySource>,
    config: ScanConfig,
    stats: Arc<ScanStats>,
}

impl TreeScanner {
    /// Create a scanner over the given source
    pub fn new(source: Arc<dyn EntrySource>, config: ScanConfig) -> Self {
        Self {
            source,
            config,
            stats: Arc::new(ScanStats::default()),
        }
    }

    /// Cumulative counters across this scanner's scans
    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Flatten one drop payload
    ///
    /// Resolves exactly once: with the flat list unmodified when the
    /// payload carries no typed items, with the flattened tree otherwise,
    /// or with the first scan failure (no partial result is surfaced).
    pub async fn scan(&self, payload: DropPayload) -> ScanResult<Vec<ScanEntry>> {
        let items = match payload {
            // No typed items collection: nothing to walk.
            DropPayload::Files(files) => return Ok(files),
            DropPayload::Items(items) => items,
        };

        debug!(top_level = items.len(), "Starting drop payload scan");

        let (task_tx, mut task_rx) = mpsc::unbounded_channel::<ScanTask>();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent));

        let ctx = Arc::new(ScanCtx {
            source: Arc::clone(&self.source),
            stats: Arc::clone(&self.stats),
            tx: task_tx,
            in_flight: AtomicU64::new(0),
            contents: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            aborted: AtomicBool::new(false),
        });

        // Seed the top-level items.
        for item in items {
            ctx.dispatch(ScanTask::Entry {
                entry: item,
                prefix: String::new(),
            })?;
        }

        // Dispatch loop: spawn one bounded task per counted unit until the
        // in-flight counter returns to zero.
        loop {
            let task = match tokio::time::timeout(IDLE_CHECK_INTERVAL, task_rx.recv()).await {
                Ok(Some(task)) => task,
                Ok(None) => break,
                Err(_) => {
                    if ctx.in_flight.load(Ordering::SeqCst) == 0 {
                        break;
                    }
                    continue;
                }
            };

            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .expect("Semaphore closed");
            let task_ctx = Arc::clone(&ctx);

            tokio::spawn(async move {
                if let Err(e) = process_task(&task_ctx, task).await {
                    warn!(error = %e, "Scan task failed");
                    task_ctx.abort_with(e);
                }
                task_ctx.in_flight.fetch_sub(1, Ordering::SeqCst);
                drop(permit);
            });
        }

        let failure = ctx
            .failure
            .lock()
            .expect("Failure slot poisoned")
            .take();
        if let Some(error) = failure {
            return Err(error);
        }

        let contents = std::mem::take(
            &mut *ctx.contents.lock().expect("Scan results poisoned"),
        );
        debug!(entries = contents.len(), "Scan completed");
        Ok(contents)
    }
}

/// Process one counted unit of work
///
/// After a failure has been recorded, remaining units drain without doing
/// any source work so the counter still reaches zero and the scan settles.
async fn process_task(ctx: &ScanCtx, task: ScanTask) -> ScanResult<()> {
    if ctx.aborted.load(Ordering::SeqCst) {
        return Ok(());
    }

    match task {
        ScanTask::Entry { entry, prefix } => match entry {
            RawEntry::File(file) => {
                let content = ctx.source.materialize_file(&file).await?;
                ctx.stats.record_file(content.size());
                ctx.push(ScanEntry::file(format!("{prefix}{}", file.name), content));
            }
            RawEntry::Directory(dir) => {
                // The marker goes in before the first page read is
                // dispatched, so it always precedes the directory's own
                // descendants in the result.
                let full_path = format!("{prefix}{}", dir.name);
                ctx.push(ScanEntry::directory(full_path.clone()));
                ctx.stats.record_dir();

                ctx.dispatch(ScanTask::Page {
                    dir,
                    prefix: format!("{full_path}/"),
                })?;
            }
        },
        ScanTask::Page { dir, prefix } => {
            let children = ctx.source.read_directory_page(&dir).await?;
            ctx.stats.record_page();

            // A non-empty page fans out its children plus one more page
            // read for the same directory; the empty page ends pagination.
            if !children.is_empty() {
                for child in children {
                    ctx.dispatch(ScanTask::Entry {
                        entry: child,
                        prefix: prefix.clone(),
                    })?;
                }
                ctx.dispatch(ScanTask::Page { dir, prefix })?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::source::{FileContent, FileHandle};
    use std::collections::HashMap;

    /// Scripted in-memory source: directory id -> pages of children
    struct FakeSource {
        pages: HashMap<u64, Vec<Vec<RawEntry>>>,
        cursors: Mutex<HashMap<u64, usize>>,
    }

    impl FakeSource {
        fn new(pages: HashMap<u64, Vec<Vec<RawEntry>>>) -> Self {
            Self {
                pages,
                cursors: Mutex::new(HashMap::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl EntrySource for FakeSource {
        async fn read_directory_page(&self, dir: &DirHandle) -> ScanResult<Vec<RawEntry>> {
            let mut cursors = self.cursors.lock().unwrap();
            let cursor = cursors.entry(dir.id).or_insert(0);
            let pages = self.pages.get(&dir.id).ok_or_else(|| {
                ScanError::ReadDirFailed {
                    path: dir.name.clone(),
                    reason: "unknown directory".into(),
                }
            })?;
            let page = pages.get(*cursor).cloned().unwrap_or_default();
            *cursor += 1;
            Ok(page)
        }

        async fn materialize_file(&self, file: &FileHandle) -> ScanResult<FileContent> {
            Ok(FileContent {
                bytes: file.name.as_bytes().to_vec(),
            })
        }
    }

    fn file(id: u64, name: &str) -> RawEntry {
        RawEntry::File(FileHandle {
            id,
            name: name.into(),
        })
    }

    fn dir(id: u64, name: &str) -> RawEntry {
        RawEntry::Directory(DirHandle {
            id,
            name: name.into(),
        })
    }

    #[tokio::test]
    async fn test_flat_payload_passes_through() {
        let scanner = TreeScanner::new(
            Arc::new(FakeSource::new(HashMap::new())),
            ScanConfig::default(),
        );

        let flat = vec![
            ScanEntry::file("a.txt", FileContent { bytes: vec![1] }),
            ScanEntry::file("b.txt", FileContent { bytes: vec![2] }),
        ];
        let result = scanner.scan(DropPayload::Files(flat.clone())).await.unwrap();
        assert_eq!(result, flat);
    }

    #[tokio::test]
    async fn test_empty_items_resolve_empty() {
        let scanner = TreeScanner::new(
            Arc::new(FakeSource::new(HashMap::new())),
            ScanConfig::default(),
        );
        let result = scanner.scan(DropPayload::Items(vec![])).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_empty_directory_settles() {
        let mut pages = HashMap::new();
        pages.insert(1, vec![vec![]]);
        let scanner = TreeScanner::new(Arc::new(FakeSource::new(pages)), ScanConfig::default());

        let result = scanner
            .scan(DropPayload::Items(vec![dir(1, "empty")]))
            .await
            .unwrap();
        assert_eq!(result, vec![ScanEntry::directory("empty")]);
    }

    #[tokio::test]
    async fn test_marker_precedes_descendants() {
        let mut pages = HashMap::new();
        pages.insert(1, vec![vec![file(10, "inner.txt"), dir(2, "nested")], vec![]]);
        pages.insert(2, vec![vec![file(11, "deep.txt")], vec![]]);
        let scanner = TreeScanner::new(Arc::new(FakeSource::new(pages)), ScanConfig::default());

        let result = scanner
            .scan(DropPayload::Items(vec![dir(1, "top")]))
            .await
            .unwrap();

        let pos = |path: &str| {
            result
                .iter()
                .position(|e| e.full_path() == path)
                .unwrap_or_else(|| panic!("missing {path}"))
        };

        assert_eq!(result.len(), 4);
        assert!(pos("top") < pos("top/inner.txt"));
        assert!(pos("top") < pos("top/nested"));
        assert!(pos("top/nested") < pos("top/nested/deep.txt"));
    }

    #[tokio::test]
    async fn test_wide_page_settles_with_minimal_concurrency() {
        // One page fanning out far more children than any internal
        // buffering, drained with a single unit executing at a time. The
        // scan must still settle.
        let children: Vec<RawEntry> = (0..40)
            .map(|i| file(100 + i, &format!("f{i}.txt")))
            .collect();
        let mut pages = HashMap::new();
        pages.insert(1, vec![children, vec![]]);
        let scanner = TreeScanner::new(
            Arc::new(FakeSource::new(pages)),
            ScanConfig::new(1).unwrap(),
        );

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            scanner.scan(DropPayload::Items(vec![dir(1, "wide")])),
        )
        .await
        .expect("scan settled")
        .unwrap();

        assert_eq!(result.len(), 41);
        assert_eq!(result.iter().filter(|e| e.is_dir()).count(), 1);
    }

    #[tokio::test]
    async fn test_failed_page_read_rejects_scan() {
        // Directory 2 is not scripted, so its page read fails.
        let mut pages = HashMap::new();
        pages.insert(1, vec![vec![dir(2, "broken")], vec![]]);
        let scanner = TreeScanner::new(Arc::new(FakeSource::new(pages)), ScanConfig::default());

        let err = scanner
            .scan(DropPayload::Items(vec![dir(1, "top")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::ReadDirFailed { .. }));
        assert_eq!(scanner.stats().errors.load(Ordering::Relaxed), 1);
    }
}
