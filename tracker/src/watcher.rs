//! File tailer for a live host feed.
//!
//! Watches a single JSON Lines feed file and emits the complete lines
//! appended to it since the last read.
//!
//! # Architecture
//!
//! The watcher uses the [`notify`] crate on the feed's parent directory and
//! keeps the byte offset of the last complete line read. The notify callback
//! only forwards a wake-up through an internal channel; a dedicated async
//! task does the file I/O.
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use tokio::sync::mpsc;
//! use specimen_tracker::watcher::FeedWatcher;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (tx, mut rx) = mpsc::channel(100);
//!     let _watcher = FeedWatcher::new(PathBuf::from("/tmp/host-feed.jsonl"), tx)?;
//!
//!     while let Some(lines) = rx.recv().await {
//!         println!("{} new records", lines.len());
//!     }
//!     Ok(())
//! }
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, trace, warn};

/// Errors that can occur during feed watching.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Failed to initialize the file system watcher.
    #[error("failed to create watcher: {0}")]
    WatcherInit(#[from] notify::Error),

    /// Failed to read the feed file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The feed file does not exist.
    #[error("feed file does not exist: {0}")]
    FileNotFound(PathBuf),

    /// Failed to send lines through the channel.
    #[error("failed to send lines: channel closed")]
    ChannelClosed,
}

/// Result type for watcher operations.
pub type Result<T> = std::result::Result<T, WatcherError>;

/// Tails one feed file.
#[derive(Debug)]
pub struct FeedWatcher {
    /// Kept alive to maintain the watch subscription.
    #[allow(dead_code)]
    watcher: RecommendedWatcher,

    path: PathBuf,

    /// Byte offset just past the last complete line read.
    position: Arc<Mutex<u64>>,

    line_sender: mpsc::Sender<Vec<String>>,
}

impl FeedWatcher {
    /// Starts tailing `path` from its current end.
    ///
    /// Existing content is not replayed; use [`crate::feed::replay`] for
    /// recorded feeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or the watcher cannot be
    /// initialized.
    pub fn new(path: PathBuf, line_sender: mpsc::Sender<Vec<String>>) -> Result<Self> {
        if !path.is_file() {
            return Err(WatcherError::FileNotFound(path));
        }

        // notify reports canonical paths
        let path = path.canonicalize()?;
        let size = std::fs::metadata(&path)?.len();
        let position = Arc::new(Mutex::new(size));

        info!(path = %path.display(), offset = size, "Initialized feed watcher");

        let (wake_tx, wake_rx) = mpsc::channel::<()>(64);

        let task_path = path.clone();
        let task_position = Arc::clone(&position);
        let task_sender = line_sender.clone();
        tokio::spawn(async move {
            process_wakeups(wake_rx, task_path, task_position, task_sender).await;
        });

        let watcher = create_watcher(wake_tx, &path)?;

        Ok(Self {
            watcher,
            path,
            position,
            line_sender,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current read offset.
    pub async fn position(&self) -> u64 {
        *self.position.lock().await
    }

    /// Reads any new lines right away instead of waiting for a notify event.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the channel is closed.
    pub async fn check_now(&self) -> Result<()> {
        let lines = {
            let mut position = self.position.lock().await;
            read_new_lines(&self.path, &mut position)?
        };

        if !lines.is_empty() {
            self.line_sender
                .send(lines)
                .await
                .map_err(|_| WatcherError::ChannelClosed)?;
        }
        Ok(())
    }
}

/// Watches the feed's parent directory, waking the reader task for changes
/// to the feed file.
fn create_watcher(wake_tx: mpsc::Sender<()>, path: &Path) -> Result<RecommendedWatcher> {
    let feed_path = path.to_path_buf();
    let watch_dir = path
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| WatcherError::FileNotFound(path.to_path_buf()))?;

    let mut watcher = RecommendedWatcher::new(
        move |res: std::result::Result<Event, notify::Error>| {
            handle_notify_event(res, &feed_path, &wake_tx);
        },
        Config::default(),
    )?;

    watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;

    debug!(watch_dir = %watch_dir.display(), "Started feed directory watch");

    Ok(watcher)
}

fn handle_notify_event(
    res: std::result::Result<Event, notify::Error>,
    feed_path: &Path,
    wake_tx: &mpsc::Sender<()>,
) {
    let event = match res {
        Ok(event) => event,
        Err(e) => {
            error!(error = %e, "Feed watcher error");
            return;
        }
    };

    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
        trace!(kind = ?event.kind, "Ignoring event kind");
        return;
    }

    if !event.paths.iter().any(|p| p == feed_path) {
        return;
    }

    // A full channel already has a wake-up pending
    if let Err(mpsc::error::TrySendError::Closed(_)) = wake_tx.try_send(()) {
        warn!("Feed reader task has stopped");
    }
}

async fn process_wakeups(
    mut wake_rx: mpsc::Receiver<()>,
    path: PathBuf,
    position: Arc<Mutex<u64>>,
    sender: mpsc::Sender<Vec<String>>,
) {
    while wake_rx.recv().await.is_some() {
        let lines = {
            let mut guard = position.lock().await;
            match read_new_lines(&path, &mut guard) {
                Ok(lines) => lines,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to read feed");
                    continue;
                }
            }
        };

        if lines.is_empty() {
            trace!("No complete lines appended");
            continue;
        }

        debug!(line_count = lines.len(), "Read new feed lines");
        if sender.send(lines).await.is_err() {
            debug!("Feed line receiver dropped, stopping reader");
            break;
        }
    }
}

/// Reads complete lines appended after `position` and advances it.
///
/// A trailing partial line is left for the next read. If the file shrank,
/// reading restarts from the beginning.
fn read_new_lines(path: &Path, position: &mut u64) -> Result<Vec<String>> {
    let mut file = File::open(path)?;
    let file_size = file.metadata()?.len();

    if file_size < *position {
        info!(
            path = %path.display(),
            old_pos = *position,
            new_size = file_size,
            "Feed truncated, resetting position to 0"
        );
        *position = 0;
    }

    if *position >= file_size {
        return Ok(Vec::new());
    }

    file.seek(SeekFrom::Start(*position))?;
    let mut reader = BufReader::new(file);
    let mut lines = Vec::new();

    loop {
        let mut line = String::new();
        let read = reader.read_line(&mut line)?;
        if read == 0 || !line.ends_with('\n') {
            break;
        }

        *position += read as u64;
        let trimmed = line.trim_end_matches(['\n', '\r']);
        if !trimmed.is_empty() {
            lines.push(trimmed.to_string());
        }
    }

    Ok(lines)
}
