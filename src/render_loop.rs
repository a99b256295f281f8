use std::collections::VecDeque;
use std::time::Instant;

use image::RgbaImage;
use tracing::{error, info, trace};

use crate::assets::{ImageLoader, ImageStore};
use crate::error::{Error, Result};
use crate::events::{LoopState, TimerEvent};
use crate::policy::ImagePolicy;
use crate::render::Presenter;
use crate::render::compositor::CanvasCompositor;
use crate::render::viewport::ViewportManager;
use crate::timing::TimerConfig;
use crate::timing::clock::ClockSource;
use crate::timing::slices::{SliceCalculator, TimerSnapshot};

/// Owns every piece of timer state and turns one clock reading into one presented frame.
///
/// The window shell feeds it events with [`on_resize`](Self::on_resize) and
/// [`request_quit`](Self::request_quit) and calls [`pump_frame`](Self::pump_frame)
/// at its frame cadence.
pub struct RenderLoop<L, P> {
    config: TimerConfig,
    clock: ClockSource,
    slices: SliceCalculator,
    policy: ImagePolicy,
    compositor: CanvasCompositor,
    viewport: ViewportManager,
    images: ImageStore<L>,
    presenter: P,
    events: VecDeque<TimerEvent>,
    state: LoopState,
    last_snapshot: Option<TimerSnapshot>,
    frames: u64,
}

impl<L: ImageLoader, P: Presenter> RenderLoop<L, P> {
    pub fn start(
        config: TimerConfig,
        compositor: CanvasCompositor,
        images: ImageStore<L>,
        presenter: P,
        window_size: (u32, u32),
    ) -> Result<Self> {
        Self::start_at(
            Instant::now(),
            config,
            compositor,
            images,
            presenter,
            window_size,
        )
    }

    /// Start with the exam clock anchored at `now`.
    pub fn start_at(
        now: Instant,
        config: TimerConfig,
        compositor: CanvasCompositor,
        images: ImageStore<L>,
        presenter: P,
        window_size: (u32, u32),
    ) -> Result<Self> {
        let clock = ClockSource::start_at(now, config.start_offset());
        let slices = SliceCalculator::new(&config);
        let initial_change_index = slices.change_index(clock.elapsed_at(now));
        let policy = ImagePolicy::from_config(&config, initial_change_index)?;
        let viewport = ViewportManager::new(
            compositor.style().canvas_size,
            window_size.0,
            window_size.1,
        );
        info!(
            total_secs = config.total_duration(),
            slice_secs = config.slice_duration(),
            change_interval_secs = config.image_change_interval(),
            start_remaining_secs = config.start_remaining(),
            slices = slices.total_slices(),
            images = config.image_list().len(),
            policy = %config.image_change_policy(),
            initial_image = policy.active_index(),
            "timer started"
        );
        Ok(Self {
            config,
            clock,
            slices,
            policy,
            compositor,
            viewport,
            images,
            presenter,
            events: VecDeque::new(),
            state: LoopState::Running,
            last_snapshot: None,
            frames: 0,
        })
    }

    pub fn pump_frame(&mut self) -> Result<bool> {
        self.pump_frame_at(Instant::now())
    }

    /// Run one iteration for the clock reading at `now`; `Ok(true)` while still running.
    ///
    /// Any error moves the loop to [`LoopState::Terminating`] before it is returned.
    pub fn pump_frame_at(&mut self, now: Instant) -> Result<bool> {
        if self.state == LoopState::Terminating {
            return Ok(false);
        }
        match self.step(now) {
            Ok(()) => Ok(self.state == LoopState::Running),
            Err(err) => {
                error!(error = %err, "render loop stopped on fatal error");
                self.state = LoopState::Terminating;
                self.events.clear();
                Err(err)
            }
        }
    }

    fn step(&mut self, now: Instant) -> Result<()> {
        while let Some(event) = self.events.pop_front() {
            match event {
                TimerEvent::Quit => {
                    self.terminate();
                    return Ok(());
                }
                TimerEvent::Resized { width, height } => {
                    self.viewport.resize(width, height);
                    self.presenter
                        .resize(width, height)
                        .map_err(Error::Render)?;
                }
            }
        }

        let snapshot = self.slices.snapshot(self.clock.elapsed_at(now));
        self.policy.update(snapshot.change_index);

        let pizza = self
            .images
            .get(self.policy.active_index(), self.config.image_list())?;
        let canvas = self.compositor.compose(&snapshot, pizza);
        self.presenter
            .present(canvas, self.viewport.destination())
            .map_err(Error::Render)?;

        self.frames += 1;
        self.last_snapshot = Some(snapshot);
        trace!(
            elapsed = snapshot.elapsed,
            fraction = snapshot.fraction_complete,
            slice = snapshot.slice_index,
            image = self.policy.active_index(),
            "frame presented"
        );
        Ok(())
    }

    /// Queue a window resize for the next frame.
    pub fn on_resize(&mut self, width: u32, height: u32) {
        self.enqueue(TimerEvent::Resized { width, height });
    }

    /// Stop immediately: no frame is produced after this call.
    pub fn request_quit(&mut self) {
        if self.state == LoopState::Running {
            self.terminate();
        }
    }

    pub fn enqueue(&mut self, event: TimerEvent) {
        if self.state == LoopState::Running {
            self.events.push_back(event);
        }
    }

    fn terminate(&mut self) {
        info!(frames = self.frames, "render loop terminating");
        self.state = LoopState::Terminating;
        self.events.clear();
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn active_image_index(&self) -> usize {
        self.policy.active_index()
    }

    pub fn last_snapshot(&self) -> Option<TimerSnapshot> {
        self.last_snapshot
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames
    }

    pub fn viewport(&self) -> &ViewportManager {
        &self.viewport
    }

    pub fn canvas(&self) -> &RgbaImage {
        self.compositor.canvas()
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub fn started_at(&self) -> Instant {
        self.clock.started_at()
    }
}
