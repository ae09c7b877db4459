//! Directory-backed screenshot queues
//!
//! Two bounded queues: the main queue collects screenshots for a new
//! request, the extra queue collects follow-ups while a result is shown.
//! File names sort in capture order.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use super::QueueManager;

/// Screenshots kept per queue before the oldest is evicted
pub const MAX_SCREENSHOTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueKind {
    Main,
    Extra,
}

impl QueueKind {
    fn dir_name(self) -> &'static str {
        match self {
            QueueKind::Main => "queue",
            QueueKind::Extra => "extra",
        }
    }
}

pub struct ScreenshotQueue {
    root: PathBuf,
    limit: usize,
}

impl ScreenshotQueue {
    pub fn new(root: &Path) -> Self {
        Self::with_limit(root, MAX_SCREENSHOTS)
    }

    pub fn with_limit(root: &Path, limit: usize) -> Self {
        Self {
            root: root.to_owned(),
            limit,
        }
    }

    fn dir(&self, kind: QueueKind) -> PathBuf {
        self.root.join(kind.dir_name())
    }

    /// Path for the next screenshot in `kind`, creating the queue directory
    pub fn next_path(&self, kind: QueueKind) -> std::io::Result<PathBuf> {
        let dir = self.dir(kind);
        std::fs::create_dir_all(&dir)?;
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        Ok(dir.join(format!("{:013}-{}.png", millis, uuid::Uuid::new_v4())))
    }

    /// Queued screenshots, oldest first
    pub fn list(&self, kind: QueueKind) -> std::io::Result<Vec<PathBuf>> {
        let dir = self.dir(kind);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Evict the oldest screenshots beyond the queue limit
    pub fn enforce_limit(&self, kind: QueueKind) -> std::io::Result<()> {
        let files = self.list(kind)?;
        let excess = files.len().saturating_sub(self.limit);
        for path in files.into_iter().take(excess) {
            debug!(?path, "evicting oldest screenshot");
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }

    pub fn clear(&self, kind: QueueKind) -> std::io::Result<usize> {
        let files = self.list(kind)?;
        let count = files.len();
        for path in files {
            std::fs::remove_file(&path)?;
        }
        Ok(count)
    }
}

impl QueueManager for ScreenshotQueue {
    fn clear_queues(&self) {
        for kind in [QueueKind::Main, QueueKind::Extra] {
            match self.clear(kind) {
                Ok(removed) => info!(queue = kind.dir_name(), removed, "queue cleared"),
                Err(e) => warn!(queue = kind.dir_name(), ?e, "failed to clear queue"),
            }
        }
    }
}
