//! Signal handling for graceful shutdown

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::{debug, info};

use crate::services::AppControl;

/// Handles shutdown signals (SIGTERM, SIGINT) and quit requests
pub struct ShutdownSignal {
    quit: Notify,
}

impl ShutdownSignal {
    /// Create a new shutdown signal handler
    pub fn new() -> Self {
        Self { quit: Notify::new() }
    }

    /// Ask the daemon to shut down
    pub fn request(&self) {
        // notify_one keeps a permit if nobody is waiting yet
        self.quit.notify_one();
    }

    /// Wait for a shutdown signal or request
    pub async fn wait(&self) -> std::io::Result<()> {
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                debug!("received SIGTERM");
            }
            _ = sigint.recv() => {
                debug!("received SIGINT");
            }
            _ = self.quit.notified() => {
                debug!("quit requested");
            }
        }

        Ok(())
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl AppControl for ShutdownSignal {
    fn quit(&self) {
        info!("application quit requested");
        self.request();
    }
}
