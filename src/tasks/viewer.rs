use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Window, WindowAttributes, WindowId},
};

use crate::{
    assets::{FileImageLoader, ImageStore},
    config::Configuration,
    processing::text::TextRenderer,
    render::{compositor::CanvasCompositor, presenter::GpuPresenter},
    render_loop::RenderLoop,
    timing::TimerConfig,
};

#[derive(Debug)]
enum ViewerEvent {
    Cancelled,
}

type TimerLoop = RenderLoop<FileImageLoader, GpuPresenter>;

struct TimerApp {
    cfg: Configuration,
    timer: Option<TimerConfig>,
    cancel: CancellationToken,
    window: Option<Arc<Window>>,
    render_loop: Option<TimerLoop>,
    frame_interval: std::time::Duration,
    next_frame: Instant,
    failure: Option<anyhow::Error>,
}

impl TimerApp {
    fn new(cfg: Configuration, timer: TimerConfig, cancel: CancellationToken) -> Self {
        let frame_interval = cfg.frame_interval();
        Self {
            cfg,
            timer: Some(timer),
            cancel,
            window: None,
            render_loop: None,
            frame_interval,
            next_frame: Instant::now(),
            failure: None,
        }
    }

    fn ensure_window(&mut self, event_loop: &ActiveEventLoop) -> Option<Arc<Window>> {
        if let Some(window) = self.window.as_ref() {
            return Some(window.clone());
        }

        let size = self.cfg.canvas_size;
        let mut attrs = WindowAttributes::default()
            .with_title("Pizza Timer")
            .with_inner_size(PhysicalSize::new(size, size))
            .with_resizable(true);
        if self.cfg.fullscreen {
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }
        match event_loop.create_window(attrs) {
            Ok(window) => {
                let window = Arc::new(window);
                self.window = Some(window.clone());
                Some(window)
            }
            Err(err) => {
                error!(error = %err, "failed to create timer window");
                None
            }
        }
    }

    fn init_render_loop(&mut self, window: Arc<Window>) -> Result<()> {
        let Some(timer) = self.timer.take() else {
            return Ok(());
        };
        let style = self.cfg.canvas_style();
        let presenter = GpuPresenter::new(window.clone(), style.canvas_size, style.background_color)
            .context("failed to initialize GPU presenter")?;

        let text = TextRenderer::from_system_font(&self.cfg.font_family, self.cfg.font_size);
        if text.is_none() {
            warn!(
                family = %self.cfg.font_family,
                "no usable font found; labels and clock disabled"
            );
        }
        let images = ImageStore::new(
            FileImageLoader::new(self.cfg.image_root.clone()),
            style.pizza_diameter(),
            self.cfg.fallback_image.clone(),
        );
        let compositor = CanvasCompositor::new(style, &timer, text);
        let size = window.inner_size();
        let render_loop = RenderLoop::start(
            timer,
            compositor,
            images,
            presenter,
            (size.width, size.height),
        )?;
        self.render_loop = Some(render_loop);
        Ok(())
    }

    fn quit(&mut self, event_loop: &ActiveEventLoop, reason: &str) {
        info!(reason, "timer shutting down");
        if let Some(render_loop) = self.render_loop.as_mut() {
            render_loop.request_quit();
        }
        self.cancel.cancel();
        event_loop.exit();
    }

    fn draw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(render_loop) = self.render_loop.as_mut() else {
            return;
        };
        match render_loop.pump_frame() {
            Ok(true) => {}
            Ok(false) => event_loop.exit(),
            Err(err) => {
                error!(error = %err, "timer stopped");
                self.failure = Some(anyhow::Error::new(err));
                self.cancel.cancel();
                event_loop.exit();
            }
        }
    }
}

fn is_quit_key(event: &KeyEvent) -> bool {
    event.state == ElementState::Pressed
        && matches!(
            event.physical_key,
            PhysicalKey::Code(KeyCode::Escape | KeyCode::KeyQ)
        )
}

impl ApplicationHandler<ViewerEvent> for TimerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.cancel.is_cancelled() {
            event_loop.exit();
            return;
        }

        let Some(window) = self.ensure_window(event_loop) else {
            event_loop.exit();
            return;
        };

        if self.render_loop.is_none() {
            if let Err(err) = self.init_render_loop(window.clone()) {
                error!(error = ?err, "failed to start timer");
                self.failure = Some(err);
                event_loop.exit();
                return;
            }
        }

        window.request_redraw();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.clone() else {
            return;
        };
        if window.id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => self.quit(event_loop, "window close requested"),
            WindowEvent::KeyboardInput { event, .. } if is_quit_key(&event) => {
                self.quit(event_loop, "quit key pressed");
            }
            WindowEvent::Resized(size) => {
                debug!(width = size.width, height = size.height, "window resized");
                if let Some(render_loop) = self.render_loop.as_mut() {
                    render_loop.on_resize(size.width, size.height);
                }
                window.request_redraw();
            }
            WindowEvent::ScaleFactorChanged {
                mut inner_size_writer,
                ..
            } => {
                let size = window.inner_size();
                let _ = inner_size_writer.request_inner_size(size);
                if let Some(render_loop) = self.render_loop.as_mut() {
                    render_loop.on_resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                self.draw(event_loop);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        let now = Instant::now();
        if now >= self.next_frame {
            window.request_redraw();
            self.next_frame = now + self.frame_interval;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame));
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: ViewerEvent) {
        match event {
            ViewerEvent::Cancelled => self.quit(event_loop, "cancellation requested"),
        }
    }
}

/// Open the timer window and drive it until it is closed or `cancel` fires.
///
/// Blocks the calling thread; winit requires this to be the main thread.
pub fn run_windowed(cfg: Configuration, timer: TimerConfig, cancel: CancellationToken) -> Result<()> {
    let event_loop = EventLoop::<ViewerEvent>::with_user_event()
        .build()
        .context("failed to build timer event loop")?;
    let proxy = event_loop.create_proxy();

    let cancel_task = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            cancel.cancelled().await;
            let _ = proxy.send_event(ViewerEvent::Cancelled);
        })
    };

    let mut app = TimerApp::new(cfg, timer, cancel);
    let run_result = event_loop.run_app(&mut app);
    cancel_task.abort();

    run_result.context("timer event loop failed")?;
    match app.failure.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
