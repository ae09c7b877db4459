//! Unix domain socket server for IPC
//!
//! Provides request-response communication and pushes window commands and
//! renderer events to subscribed clients.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use super::protocol::{DaemonStatus, Frame, Notification, Request, Response, MAX_FRAME_LEN};
use crate::hotkey::{Chord, HotkeyEvent, ShortcutRegistry};
use crate::state::AppState;
use crate::window::MainWindow;

/// What the server reads from and forwards to
pub struct ServerContext {
    pub state: Arc<AppState>,
    pub window: MainWindow,
    pub registry: Arc<ShortcutRegistry>,
    /// Chords triggered by clients join the hotkey stream here
    pub hotkey_tx: mpsc::Sender<HotkeyEvent>,
    /// Source of notifications for subscribed clients
    pub notify_tx: broadcast::Sender<Notification>,
}

/// Shared server state
struct Shared {
    context: ServerContext,
    start_time: Instant,
}

impl Shared {
    fn status(&self) -> DaemonStatus {
        let window = self.context.window.get();
        DaemonStatus {
            opacity: window.as_ref().map(|w| w.opacity()),
            zoom_level: window.as_ref().map(|w| w.zoom_level()),
            window_visible: self.context.state.is_window_visible(),
            click_through: self.context.state.is_click_through(),
            view: self.context.state.view(),
            bindings: self.context.registry.len(),
            uptime_secs: self.start_time.elapsed().as_secs(),
            ..DaemonStatus::default()
        }
    }
}

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: Option<UnixListener>,
    shared: Arc<Shared>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Server {
    /// Create a new IPC server
    pub fn new(socket_path: &Path, context: ServerContext) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Set socket permissions to owner-only (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener: Some(listener),
            shared: Arc::new(Shared {
                context,
                start_time: Instant::now(),
            }),
            shutdown_tx,
        })
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        let listener = self.listener.as_ref().context("server not initialized")?;

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let shared = Arc::clone(&self.shared);
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = Self::handle_client(stream, shared) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Handle a single client connection
    ///
    /// The writer outlives the reader so replies queued before the client
    /// half-closes are still delivered.
    async fn handle_client(stream: UnixStream, shared: Arc<Shared>) -> Result<()> {
        let (mut reader, mut writer) = stream.into_split();
        let (reply_tx, reply_rx) = mpsc::channel::<Response>(16);

        tokio::try_join!(
            Self::read_requests(&mut reader, &shared, reply_tx),
            Self::write_frames(&mut writer, &shared, reply_rx),
        )?;
        Ok(())
    }

    /// Read requests until the client disconnects, queueing one reply each
    async fn read_requests(
        reader: &mut OwnedReadHalf,
        shared: &Shared,
        reply_tx: mpsc::Sender<Response>,
    ) -> Result<()> {
        loop {
            let Some(body) = read_frame(reader).await? else {
                debug!("client disconnected");
                return Ok(());
            };

            let response = match serde_json::from_slice::<Request>(&body) {
                Ok(request) => {
                    debug!(?request, "received request");
                    Self::process_request(request, shared).await
                }
                Err(e) => Response::error("bad_request", e.to_string()),
            };

            if reply_tx.send(response).await.is_err() {
                return Ok(());
            }
        }
    }

    /// Write replies and, once subscribed, notifications
    async fn write_frames(
        writer: &mut OwnedWriteHalf,
        shared: &Shared,
        mut reply_rx: mpsc::Receiver<Response>,
    ) -> Result<()> {
        let mut notifications: Option<broadcast::Receiver<Notification>> = None;

        loop {
            tokio::select! {
                reply = reply_rx.recv() => {
                    let Some(response) = reply else {
                        return Ok(());
                    };
                    if response == Response::Subscribed && notifications.is_none() {
                        // Subscribe before the confirmation goes out so
                        // nothing sent after it is missed
                        notifications = Some(shared.context.notify_tx.subscribe());
                        debug!("client subscribed to notifications");
                    }
                    write_frame(writer, &Frame::Response(response)).await?;
                }
                notification = next_notification(&mut notifications) => {
                    match notification {
                        Ok(notification) => {
                            write_frame(writer, &Frame::Notification(notification)).await?;
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "client lagged behind notifications");
                        }
                        Err(RecvError::Closed) => return Ok(()),
                    }
                }
            }
        }
    }

    /// Process a request and return a response
    async fn process_request(request: Request, shared: &Shared) -> Response {
        match request {
            Request::Ping => Response::Pong,

            Request::GetStatus => Response::Status(shared.status()),

            Request::Subscribe => Response::Subscribed,

            Request::Trigger { chord } => {
                let chord: Chord = match chord.parse() {
                    Ok(chord) => chord,
                    Err(e) => return Response::error("invalid_chord", e.to_string()),
                };
                let Some(action) = shared.context.registry.lookup(&chord) else {
                    return Response::error("unbound_chord", format!("{} is not registered", chord));
                };
                if shared
                    .context
                    .hotkey_tx
                    .send(HotkeyEvent::Pressed(chord))
                    .await
                    .is_err()
                {
                    return Response::error("unavailable", "dispatcher is not running");
                }
                info!(%chord, ?action, "chord triggered via IPC");
                Response::Triggered { action }
            }
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        // Remove socket file
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}

/// Read one length-prefixed frame; `None` on clean disconnect
async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        warn!(len, "message too large, disconnecting");
        return Ok(None);
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some(body))
}

/// Send a length-prefixed JSON message
async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, frame: &Frame) -> Result<()> {
    let bytes = serde_json::to_vec(frame)?;
    let len = (bytes.len() as u32).to_le_bytes();

    writer.write_all(&len).await?;
    writer.write_all(&bytes).await?;

    Ok(())
}

/// Next notification, or never when not subscribed
async fn next_notification(
    rx: &mut Option<broadcast::Receiver<Notification>>,
) -> Result<Notification, RecvError> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Action;
    use crate::events::{RendererEvent, WindowCommand};
    use tempfile::{tempdir, TempDir};

    struct Harness {
        server: Arc<Server>,
        socket_path: PathBuf,
        hotkey_rx: mpsc::Receiver<HotkeyEvent>,
        notify_tx: broadcast::Sender<Notification>,
        _dir: TempDir,
    }

    fn harness() -> Harness {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("daemon.sock");

        let registry = Arc::new(ShortcutRegistry::new());
        registry
            .register("CommandOrControl+L".parse().unwrap(), Action::DeleteLastScreenshot)
            .unwrap();
        let (hotkey_tx, hotkey_rx) = mpsc::channel(8);
        let (notify_tx, _) = broadcast::channel(8);

        let server = Server::new(
            &socket_path,
            ServerContext {
                state: Arc::new(AppState::new()),
                window: MainWindow::new(),
                registry,
                hotkey_tx,
                notify_tx: notify_tx.clone(),
            },
        )
        .unwrap();

        let server = Arc::new(server);
        let running = Arc::clone(&server);
        tokio::spawn(async move { running.run().await });

        Harness {
            server,
            socket_path,
            hotkey_rx,
            notify_tx,
            _dir: dir,
        }
    }

    async fn request(stream: &mut UnixStream, request: &Request) -> Frame {
        let bytes = serde_json::to_vec(request).unwrap();
        stream.write_all(&(bytes.len() as u32).to_le_bytes()).await.unwrap();
        stream.write_all(&bytes).await.unwrap();
        next_frame(stream).await
    }

    async fn next_frame(stream: &mut UnixStream) -> Frame {
        let body = read_frame(stream).await.unwrap().unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_ping_and_status() {
        let h = harness();
        let mut stream = UnixStream::connect(&h.socket_path).await.unwrap();

        assert_eq!(
            request(&mut stream, &Request::Ping).await,
            Frame::Response(Response::Pong)
        );

        let Frame::Response(Response::Status(status)) =
            request(&mut stream, &Request::GetStatus).await
        else {
            panic!("expected status");
        };
        assert_eq!(status.bindings, 1);
        assert!(status.window_visible);
        assert_eq!(status.opacity, None);

        h.server.shutdown().await;
        assert!(!h.socket_path.exists());
    }

    #[tokio::test]
    async fn test_subscribed_client_receives_notifications() {
        let h = harness();
        let mut stream = UnixStream::connect(&h.socket_path).await.unwrap();

        assert_eq!(
            request(&mut stream, &Request::Subscribe).await,
            Frame::Response(Response::Subscribed)
        );

        h.notify_tx
            .send(Notification::Window(WindowCommand::Show))
            .unwrap();
        h.notify_tx
            .send(Notification::Renderer(RendererEvent::Reset))
            .unwrap();

        assert_eq!(
            next_frame(&mut stream).await,
            Frame::Notification(Notification::Window(WindowCommand::Show))
        );
        assert_eq!(
            next_frame(&mut stream).await,
            Frame::Notification(Notification::Renderer(RendererEvent::Reset))
        );
    }

    #[tokio::test]
    async fn test_trigger_forwards_registered_chord() {
        let mut h = harness();
        let mut stream = UnixStream::connect(&h.socket_path).await.unwrap();

        let frame = request(
            &mut stream,
            &Request::Trigger {
                chord: "CommandOrControl+L".to_string(),
            },
        )
        .await;
        assert_eq!(
            frame,
            Frame::Response(Response::Triggered {
                action: Action::DeleteLastScreenshot
            })
        );
        assert!(matches!(
            h.hotkey_rx.recv().await,
            Some(HotkeyEvent::Pressed(_))
        ));
    }

    #[tokio::test]
    async fn test_trigger_errors() {
        let h = harness();
        let mut stream = UnixStream::connect(&h.socket_path).await.unwrap();

        let invalid = request(&mut stream, &Request::Trigger { chord: "Ctrl+".into() }).await;
        assert!(matches!(
            invalid,
            Frame::Response(Response::Error { ref code, .. }) if code == "invalid_chord"
        ));

        let unbound = request(&mut stream, &Request::Trigger { chord: "Ctrl+Alt+K".into() }).await;
        assert!(matches!(
            unbound,
            Frame::Response(Response::Error { ref code, .. }) if code == "unbound_chord"
        ));
    }

    #[tokio::test]
    async fn test_reply_delivered_after_client_half_close() {
        let h = harness();
        let mut stream = UnixStream::connect(&h.socket_path).await.unwrap();

        let bytes = serde_json::to_vec(&Request::Ping).unwrap();
        stream.write_all(&(bytes.len() as u32).to_le_bytes()).await.unwrap();
        stream.write_all(&bytes).await.unwrap();
        stream.shutdown().await.unwrap();

        assert_eq!(next_frame(&mut stream).await, Frame::Response(Response::Pong));
        assert!(read_frame(&mut stream).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_request_gets_error() {
        let h = harness();
        let mut stream = UnixStream::connect(&h.socket_path).await.unwrap();

        let body = br#"{"type":"launch_rockets"}"#;
        stream.write_all(&(body.len() as u32).to_le_bytes()).await.unwrap();
        stream.write_all(body).await.unwrap();

        assert!(matches!(
            next_frame(&mut stream).await,
            Frame::Response(Response::Error { ref code, .. }) if code == "bad_request"
        ));
    }
}
