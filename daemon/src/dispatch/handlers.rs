//! Handler bodies for each action
//!
//! Handlers receive a capability context instead of closing over
//! collaborators. Failures end here: they are logged and never reach the
//! dispatcher loop.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::events::{Direction, RendererEvent};
use crate::services::{AppControl, CaptureService, ProcessingService, QueueManager, ViewStateStore};
use crate::state::{View, VisibilityController};
use crate::window::{MainWindow, VisibilityToggle, WindowMover};

/// Zoom change per hotkey press
pub const ZOOM_STEP: f64 = 0.5;
/// Zoom level restored by the reset chord
pub const DEFAULT_ZOOM: f64 = 0.0;

/// Capabilities available to handlers
#[derive(Clone)]
pub struct Context {
    pub window: MainWindow,
    pub visibility: Arc<VisibilityController>,
    pub capture: Arc<dyn CaptureService>,
    pub processing: Option<Arc<dyn ProcessingService>>,
    pub queues: Arc<dyn QueueManager>,
    pub views: Arc<dyn ViewStateStore>,
    pub mover: Arc<dyn WindowMover>,
    pub toggles: Arc<dyn VisibilityToggle>,
    pub app: Arc<dyn AppControl>,
}

/// Capture, build a preview, then tell the renderer. Nothing is sent if
/// either step fails.
pub async fn capture_screenshot(ctx: Context) {
    if ctx.window.get().is_none() {
        debug!("no window, skipping screenshot");
        return;
    }

    info!("taking screenshot");
    let result = async {
        let path = ctx.capture.take_screenshot().await?;
        let preview = ctx.capture.image_preview(&path).await?;
        Ok::<_, anyhow::Error>((path, preview))
    }
    .await;

    match result {
        Ok((path, preview)) => match ctx.window.get() {
            Some(window) => window.send_to_renderer(RendererEvent::ScreenshotTaken { path, preview }),
            None => debug!(?path, "window closed during capture"),
        },
        Err(e) => error!(?e, "error capturing screenshot"),
    }
}

pub async fn process_screenshots(ctx: Context) {
    let Some(processing) = ctx.processing else {
        warn!("no processing service available");
        return;
    };

    if let Err(e) = processing.process_screenshots().await {
        error!(?e, "error processing screenshots");
    }
}

/// Cancel in-flight work and clear the queues before switching the view,
/// so the renderer never shows the queue view with stale items.
pub fn cancel_and_reset(ctx: &Context) {
    info!("canceling requests and resetting queues");

    if let Some(processing) = &ctx.processing {
        processing.cancel_ongoing_requests();
    }
    ctx.queues.clear_queues();
    ctx.views.set_view(View::Queue);

    if let Some(window) = ctx.window.get().filter(|w| !w.is_destroyed()) {
        window.send_to_renderer(RendererEvent::ResetView);
        window.send_to_renderer(RendererEvent::Reset);
    }
}

pub fn move_window(ctx: &Context, direction: Direction) {
    debug!(?direction, "moving window");
    ctx.mover.move_window(direction);
}

/// Shift the zoom level by `delta`
pub fn zoom_by(ctx: &Context, delta: f64) {
    if let Some(window) = ctx.window.get() {
        let level = window.zoom_level() + delta;
        debug!(level, "zooming");
        window.set_zoom_level(level);
    }
}

pub fn reset_zoom(ctx: &Context) {
    if let Some(window) = ctx.window.get() {
        window.set_zoom_level(DEFAULT_ZOOM);
    }
}

pub fn delete_last_screenshot(ctx: &Context) {
    if let Some(window) = ctx.window.get() {
        window.send_to_renderer(RendererEvent::DeleteLastScreenshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, Call, Collaborators};

    #[tokio::test]
    async fn test_capture_sends_preview() {
        let c = Collaborators::new();
        capture_screenshot(context(&c)).await;

        let events = c.log.renderer_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            RendererEvent::ScreenshotTaken { preview, .. } if preview == "preview"
        ));
    }

    #[tokio::test]
    async fn test_capture_failure_sends_nothing() {
        let c = Collaborators::new();
        c.capture.fail_capture();
        capture_screenshot(context(&c)).await;

        assert!(c.log.renderer_events().is_empty());
        assert!(!c.log.contains(&Call::Preview));
    }

    #[tokio::test]
    async fn test_preview_failure_sends_nothing() {
        let c = Collaborators::new();
        c.capture.fail_preview();
        capture_screenshot(context(&c)).await;

        assert!(c.log.contains(&Call::Capture));
        assert!(c.log.renderer_events().is_empty());
    }

    #[tokio::test]
    async fn test_capture_without_window_is_skipped() {
        let c = Collaborators::new();
        let ctx = context(&c);
        ctx.window.clear();

        capture_screenshot(ctx).await;
        assert!(!c.log.contains(&Call::Capture));
    }

    #[tokio::test]
    async fn test_process_without_service() {
        let c = Collaborators::new();
        let mut ctx = context(&c);
        ctx.processing = None;

        process_screenshots(ctx).await;
        assert!(!c.log.contains(&Call::Process));
    }

    #[tokio::test]
    async fn test_process_failure_is_contained() {
        let c = Collaborators::new();
        c.processing.fail();
        process_screenshots(context(&c)).await;
        assert!(c.log.contains(&Call::Process));
    }

    #[test]
    fn test_cancel_and_reset_order() {
        let c = Collaborators::new();
        cancel_and_reset(&context(&c));

        assert_eq!(
            c.log.calls(),
            vec![
                Call::CancelRequests,
                Call::ClearQueues,
                Call::SetView(View::Queue),
                Call::Renderer(RendererEvent::ResetView),
                Call::Renderer(RendererEvent::Reset),
            ]
        );
    }

    #[test]
    fn test_cancel_and_reset_skips_destroyed_window() {
        let c = Collaborators::new();
        c.window.destroy();
        cancel_and_reset(&context(&c));

        assert!(c.log.contains(&Call::ClearQueues));
        assert!(c.log.renderer_events().is_empty());
    }

    #[test]
    fn test_zoom() {
        let c = Collaborators::new();
        let ctx = context(&c);

        zoom_by(&ctx, ZOOM_STEP);
        zoom_by(&ctx, ZOOM_STEP);
        zoom_by(&ctx, -ZOOM_STEP);
        assert!((c.window.current_zoom() - 0.5).abs() < f64::EPSILON);

        reset_zoom(&ctx);
        assert!((c.window.current_zoom() - DEFAULT_ZOOM).abs() < f64::EPSILON);
    }

    #[test]
    fn test_delete_last_screenshot_only_notifies() {
        let c = Collaborators::new();
        delete_last_screenshot(&context(&c));
        assert_eq!(
            c.log.calls(),
            vec![Call::Renderer(RendererEvent::DeleteLastScreenshot)]
        );
    }
}
