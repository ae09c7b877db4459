//! Recording collaborators shared by unit tests

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::config::{ConfigStore, PersistenceError};
use crate::dispatch::Context;
use crate::events::{Direction, RendererEvent};
use crate::services::{
    AppControl, CaptureError, CaptureService, PreviewError, ProcessingService, QueueManager,
    ViewStateStore,
};
use crate::state::{AppState, View, VisibilityController};
use crate::window::{MainWindow, WindowHandle, WindowMover};

/// Every observable collaborator call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SetOpacity(f64),
    Show,
    Hide,
    MoveToTop,
    Focus,
    SetZoom(f64),
    ClickThrough(bool),
    Renderer(RendererEvent),
    Move(Direction),
    Capture,
    Preview,
    Process,
    CancelRequests,
    ClearQueues,
    SetView(View),
    Quit,
}

/// Ordered log of calls across all collaborators
#[derive(Default)]
pub struct Recorder {
    calls: Mutex<Vec<Call>>,
}

impl Recorder {
    pub fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn contains(&self, call: &Call) -> bool {
        self.calls.lock().unwrap().contains(call)
    }

    pub fn renderer_events(&self) -> Vec<RendererEvent> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Renderer(event) => Some(event),
                _ => None,
            })
            .collect()
    }
}

pub struct MockWindow {
    opacity: Mutex<f64>,
    zoom: Mutex<f64>,
    destroyed: AtomicBool,
    log: Arc<Recorder>,
}

impl MockWindow {
    pub fn new(opacity: f64, log: Arc<Recorder>) -> Self {
        Self {
            opacity: Mutex::new(opacity),
            zoom: Mutex::new(0.0),
            destroyed: AtomicBool::new(false),
            log,
        }
    }

    pub fn current_opacity(&self) -> f64 {
        *self.opacity.lock().unwrap()
    }

    /// Set the opacity without recording a call
    pub fn set_current_opacity(&self, opacity: f64) {
        *self.opacity.lock().unwrap() = opacity;
    }

    pub fn current_zoom(&self) -> f64 {
        *self.zoom.lock().unwrap()
    }

    pub fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
    }
}

impl WindowHandle for MockWindow {
    fn opacity(&self) -> f64 {
        self.current_opacity()
    }

    fn set_opacity(&self, opacity: f64) {
        self.set_current_opacity(opacity);
        self.log.record(Call::SetOpacity(opacity));
    }

    fn show(&self) {
        self.log.record(Call::Show);
    }

    fn hide(&self) {
        self.log.record(Call::Hide);
    }

    fn move_to_top(&self) {
        self.log.record(Call::MoveToTop);
    }

    fn focus(&self) {
        self.log.record(Call::Focus);
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    fn zoom_level(&self) -> f64 {
        self.current_zoom()
    }

    fn set_zoom_level(&self, level: f64) {
        *self.zoom.lock().unwrap() = level;
        self.log.record(Call::SetZoom(level));
    }

    fn set_click_through(&self, enabled: bool) {
        self.log.record(Call::ClickThrough(enabled));
    }

    fn send_to_renderer(&self, event: RendererEvent) {
        self.log.record(Call::Renderer(event));
    }
}

/// Config store that keeps successful writes in memory
pub struct MockConfig {
    saved: Mutex<Vec<f64>>,
    fail: bool,
}

impl MockConfig {
    pub fn new() -> Self {
        Self {
            saved: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn last_saved(&self) -> Option<f64> {
        self.saved.lock().unwrap().last().copied()
    }
}

impl ConfigStore for MockConfig {
    fn set_opacity(&self, opacity: f64) -> Result<(), PersistenceError> {
        if self.fail {
            return Err(PersistenceError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )));
        }
        self.saved.lock().unwrap().push(opacity);
        Ok(())
    }
}

pub struct MockCapture {
    log: Arc<Recorder>,
    fail_capture: AtomicBool,
    fail_preview: AtomicBool,
}

impl MockCapture {
    pub fn fail_capture(&self) {
        self.fail_capture.store(true, Ordering::SeqCst);
    }

    pub fn fail_preview(&self) {
        self.fail_preview.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl CaptureService for MockCapture {
    async fn take_screenshot(&self) -> Result<PathBuf, CaptureError> {
        self.log.record(Call::Capture);
        if self.fail_capture.load(Ordering::SeqCst) {
            return Err(CaptureError::NoCommand);
        }
        Ok(PathBuf::from("/tmp/screenshot.png"))
    }

    async fn image_preview(&self, path: &Path) -> Result<String, PreviewError> {
        self.log.record(Call::Preview);
        if self.fail_preview.load(Ordering::SeqCst) {
            return Err(PreviewError::Read {
                path: path.to_owned(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        Ok("preview".to_string())
    }
}

/// Processing service that can be held in flight until released
pub struct MockProcessing {
    log: Arc<Recorder>,
    fail: AtomicBool,
    held: AtomicBool,
    release: Notify,
}

impl MockProcessing {
    pub fn fail(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn hold(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl ProcessingService for MockProcessing {
    async fn process_screenshots(&self) -> anyhow::Result<()> {
        self.log.record(Call::Process);
        if self.held.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("processing failed");
        }
        Ok(())
    }

    fn cancel_ongoing_requests(&self) {
        self.log.record(Call::CancelRequests);
    }
}

/// Queue, view, mover and app control in one recorder-backed type
pub struct MockWorkflow {
    log: Arc<Recorder>,
}

impl QueueManager for MockWorkflow {
    fn clear_queues(&self) {
        self.log.record(Call::ClearQueues);
    }
}

impl ViewStateStore for MockWorkflow {
    fn set_view(&self, view: View) {
        self.log.record(Call::SetView(view));
    }
}

impl WindowMover for MockWorkflow {
    fn move_window(&self, direction: Direction) {
        self.log.record(Call::Move(direction));
    }
}

impl AppControl for MockWorkflow {
    fn quit(&self) {
        self.log.record(Call::Quit);
    }
}

/// A full set of mock collaborators sharing one recorder
pub struct Collaborators {
    pub log: Arc<Recorder>,
    pub window: Arc<MockWindow>,
    pub config: Arc<MockConfig>,
    pub state: Arc<AppState>,
    pub capture: Arc<MockCapture>,
    pub processing: Arc<MockProcessing>,
    pub workflow: Arc<MockWorkflow>,
}

impl Collaborators {
    pub fn new() -> Self {
        let log = Arc::new(Recorder::default());
        Self {
            window: Arc::new(MockWindow::new(1.0, Arc::clone(&log))),
            config: Arc::new(MockConfig::new()),
            state: Arc::new(AppState::new()),
            capture: Arc::new(MockCapture {
                log: Arc::clone(&log),
                fail_capture: AtomicBool::new(false),
                fail_preview: AtomicBool::new(false),
            }),
            processing: Arc::new(MockProcessing {
                log: Arc::clone(&log),
                fail: AtomicBool::new(false),
                held: AtomicBool::new(false),
                release: Notify::new(),
            }),
            workflow: Arc::new(MockWorkflow {
                log: Arc::clone(&log),
            }),
            log,
        }
    }
}

/// Handler context wired to the mocks
pub fn context(c: &Collaborators) -> Context {
    let window = MainWindow::with(c.window.clone());
    let visibility = Arc::new(VisibilityController::new(
        window.clone(),
        c.config.clone(),
        Arc::clone(&c.state),
    ));

    Context {
        window,
        visibility: Arc::clone(&visibility),
        capture: c.capture.clone(),
        processing: Some(c.processing.clone()),
        queues: c.workflow.clone(),
        views: c.workflow.clone(),
        mover: c.workflow.clone(),
        toggles: visibility,
        app: c.workflow.clone(),
    }
}
