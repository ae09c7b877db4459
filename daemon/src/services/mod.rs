//! Workflow collaborators driven by hotkeys
//!
//! Capture, processing, queue and view services are consumed through the
//! narrow traits below. The daemon ships a command-based capture service
//! and a directory-backed screenshot queue.

mod capture;
mod queue;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::state::View;

pub use capture::ScreenshotCapture;
pub use queue::ScreenshotQueue;

/// Errors taking a screenshot
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("capture command is empty")]
    NoCommand,

    #[error("failed to run capture command: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("capture command exited with {0}")]
    CommandFailed(std::process::ExitStatus),

    #[error("capture produced no file at {0}")]
    MissingOutput(PathBuf),

    #[error("failed to prepare screenshot queue: {0}")]
    Queue(#[source] std::io::Error),
}

/// Errors building an image preview
#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    #[error("failed to read screenshot {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Screenshot capture and preview generation
#[async_trait]
pub trait CaptureService: Send + Sync {
    async fn take_screenshot(&self) -> Result<PathBuf, CaptureError>;
    async fn image_preview(&self, path: &Path) -> Result<String, PreviewError>;
}

/// Screenshot processing pipeline
#[async_trait]
pub trait ProcessingService: Send + Sync {
    async fn process_screenshots(&self) -> anyhow::Result<()>;
    /// Signal in-flight requests to stop; does not wait for them
    fn cancel_ongoing_requests(&self);
}

/// Owner of the screenshot queues
pub trait QueueManager: Send + Sync {
    fn clear_queues(&self);
}

/// Owner of the current view
pub trait ViewStateStore: Send + Sync {
    fn set_view(&self, view: View);
}

/// Application lifecycle control
pub trait AppControl: Send + Sync {
    fn quit(&self);
}
