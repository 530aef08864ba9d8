//! Debounced autosave.
//!
//! Each [`Autosave::schedule`] call replaces the pending save with a new one
//! that fires after the configured delay. A burst of edits closer together
//! than the delay therefore produces a single write of the final state, and
//! the document is on disk at most `delay` after the last edit as long as the
//! process keeps running.
//!
//! Writes are serialized: a save that has started always finishes and
//! reports, and no two saves ever touch the target at the same time.

use ea_core::codec::{self, CodecError};
use ea_core::Document;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// The delay used when none is configured.
pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_secs(5);

/// Where autosaved snapshots go.
pub trait SaveTarget: Send + Sync + 'static {
    fn save(&self, document: &Document) -> Result<(), CodecError>;
}

/// Saves to a file through the document codec.
#[derive(Debug, Clone)]
pub struct FileTarget {
    path: PathBuf,
}

impl FileTarget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SaveTarget for FileTarget {
    fn save(&self, document: &Document) -> Result<(), CodecError> {
        codec::save(document, &self.path)
    }
}

/// Result of one completed autosave.
#[derive(Debug)]
pub struct SaveReport {
    pub result: Result<(), CodecError>,
}

/// State shared between the owner, the timer task, and the writer.
struct Shared<T> {
    target: T,
    /// The newest snapshot not yet handed to a writer.
    slot: Mutex<Option<Arc<Document>>>,
    /// Held for the whole duration of a save, so writes never overlap.
    writer: Mutex<()>,
}

impl<T: SaveTarget> Shared<T> {
    /// Save whatever is in the slot, if anything. Returns `None` when another
    /// writer already took the snapshot.
    fn write_pending(&self) -> Option<Result<(), CodecError>> {
        let _writing = lock(&self.writer);
        let snapshot = lock(&self.slot).take()?;
        Some(self.target.save(&snapshot))
    }
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Autosave<T> {
    shared: Arc<Shared<T>>,
    delay: Duration,
    timer: Option<JoinHandle<()>>,
    report_tx: mpsc::UnboundedSender<SaveReport>,
    report_rx: mpsc::UnboundedReceiver<SaveReport>,
}

impl<T: SaveTarget> Autosave<T> {
    pub fn new(target: T, delay: Duration) -> Self {
        let (report_tx, report_rx) = mpsc::unbounded_channel();
        Self {
            shared: Arc::new(Shared {
                target,
                slot: Mutex::new(None),
                writer: Mutex::new(()),
            }),
            delay,
            timer: None,
            report_tx,
            report_rx,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn target(&self) -> &T {
        &self.shared.target
    }

    /// Whether a snapshot is waiting to be written.
    pub fn is_pending(&self) -> bool {
        lock(&self.shared.slot).is_some()
    }

    /// (Re)start the timer for saving `snapshot`, replacing any snapshot
    /// still waiting. Must be called from within a Tokio runtime.
    ///
    /// Only the timer is cancelled. A save that already started runs to
    /// completion and reports.
    pub fn schedule(&mut self, snapshot: Document) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        *lock(&self.shared.slot) = Some(Arc::new(snapshot));

        // The deadline counts from the edit, not from when the task first runs.
        let deadline = Instant::now() + self.delay;
        let shared = Arc::clone(&self.shared);
        let tx = self.report_tx.clone();
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            // Detached: aborting the timer from here on no longer affects
            // the write or its report.
            tokio::task::spawn_blocking(move || {
                if let Some(result) = shared.write_pending() {
                    let _ = tx.send(SaveReport { result });
                }
            });
        }));
    }

    /// Save the waiting snapshot right now instead of waiting for the timer.
    ///
    /// Blocks until any save already in progress has finished. Returns `None`
    /// if nothing was left to write; a save that was already running reports
    /// through [`Autosave::next_report`] as usual.
    pub fn flush(&mut self) -> Option<Result<(), CodecError>> {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        let result = self.shared.write_pending()?;
        if let Err(e) = &result {
            log::error!("autosave flush failed: {e}");
        }
        Some(result)
    }

    /// A completed save report, if one is ready. Never blocks.
    pub fn try_next_report(&mut self) -> Option<SaveReport> {
        self.report_rx.try_recv().ok()
    }

    /// Wait for the next completed save.
    pub async fn next_report(&mut self) -> Option<SaveReport> {
        self.report_rx.recv().await
    }
}

impl<T> Drop for Autosave<T> {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}
