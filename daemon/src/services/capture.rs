//! Screenshot capture through an external command

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, info, warn};

use super::queue::{QueueKind, ScreenshotQueue};
use super::{CaptureError, CaptureService, PreviewError};
use crate::state::{AppState, View};

/// Placeholder replaced with the output file in the capture command
const PATH_PLACEHOLDER: &str = "{path}";

/// Captures the screen by running a configured command
pub struct ScreenshotCapture {
    command: Vec<String>,
    queue: Arc<ScreenshotQueue>,
    state: Arc<AppState>,
}

impl ScreenshotCapture {
    pub fn new(command: Vec<String>, queue: Arc<ScreenshotQueue>, state: Arc<AppState>) -> Self {
        Self {
            command,
            queue,
            state,
        }
    }

    /// New screenshots go to the main queue only while it is on screen
    fn target_queue(&self) -> QueueKind {
        match self.state.view() {
            View::Queue => QueueKind::Main,
            View::Solutions | View::Debug => QueueKind::Extra,
        }
    }
}

#[async_trait]
impl CaptureService for ScreenshotCapture {
    async fn take_screenshot(&self) -> Result<PathBuf, CaptureError> {
        let (program, args) = self.command.split_first().ok_or(CaptureError::NoCommand)?;

        let kind = self.target_queue();
        let path = self.queue.next_path(kind).map_err(CaptureError::Queue)?;
        let target = path.to_string_lossy();
        let args: Vec<String> = args
            .iter()
            .map(|arg| arg.replace(PATH_PLACEHOLDER, &target))
            .collect();

        debug!(%program, ?args, "running capture command");
        let status = tokio::process::Command::new(program)
            .args(&args)
            .status()
            .await
            .map_err(CaptureError::Spawn)?;

        if !status.success() {
            return Err(CaptureError::CommandFailed(status));
        }
        if !path.exists() {
            return Err(CaptureError::MissingOutput(path));
        }

        if let Err(e) = self.queue.enforce_limit(kind) {
            warn!(?e, "failed to trim screenshot queue");
        }

        info!(?path, ?kind, "screenshot captured");
        Ok(path)
    }

    async fn image_preview(&self, path: &Path) -> Result<String, PreviewError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| PreviewError::Read {
            path: path.to_owned(),
            source,
        })?;
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(bytes)))
    }
}
