//! Engine — the frame-sequence controller.
//!
//! Preloads a numbered run of still frames, maps the host's scroll offset to
//! a frame index and paints that frame contain-fit onto the canvas.
//!
//! The engine owns its frames and playback state. It reaches the outside
//! world only through a `RenderSurface` and a `Notifier`, so the same code
//! drives a terminal, a test double or anything else that can draw.

pub mod fit;
pub mod frames;
pub mod preload;
pub mod track;

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::SequenceConfig;
use crate::error::{EngineError, FrameError};
use crate::surface::{
    CLASS_FINISHED, CLASS_HIDDEN, CLASS_LOADING, CLASS_VISIBLE, LogNotifier, Mount, Notifier,
    RenderSurface,
};
use crate::types::{Bitmap, Severity};
use frames::FrameSet;
use preload::{FrameSource, LoadResult};
use track::TrackSpan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Ready,
    /// Terminal. Scroll-driven rendering is detached.
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Loading, or already finished. Nothing was read or drawn.
    Idle,
    /// The target frame is already on the canvas.
    Unchanged(usize),
    Painted(usize),
    /// Progress reached 1 on this tick; playback is now frozen.
    Finished(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreloadReport {
    pub total: usize,
    pub loaded: usize,
    pub failed: usize,
    /// Load tasks that died without reporting.
    pub interrupted: usize,
}

pub struct Engine<S: RenderSurface> {
    config: SequenceConfig,
    surface: S,
    notifier: Box<dyn Notifier>,
    frames: FrameSet,
    attempted: usize,
    phase: Phase,
    drawn: Option<usize>,
    tick_pending: bool,
    scroll_attached: bool,
    scale: f64,
    track_height: f64,
}

impl<S: RenderSurface> Engine<S> {
    /// Attach to `surface`.
    ///
    /// Fails without touching the surface when a mount point is missing. When
    /// no drawing context is available the loading class is cleared first so
    /// the host does not stay stuck in its loading state.
    pub fn new(mut surface: S, config: SequenceConfig) -> Result<Self, EngineError> {
        config.validate()?;

        if let Some(missing) = Mount::REQUIRED.into_iter().find(|m| !surface.has_mount(*m)) {
            debug!(?missing, "intro mount point missing, not attaching");
            return Err(EngineError::MissingMount(missing));
        }

        if !surface.acquire_context() {
            surface.set_class(Mount::Document, CLASS_LOADING, false);
            warn!("no 2D drawing context, intro disabled");
            return Err(EngineError::NoDrawingContext);
        }

        surface.set_class(Mount::Document, CLASS_LOADING, true);
        surface.set_bar_width(0.0);
        surface.set_counter_text("0");

        let frames = FrameSet::new(config.frame_count);
        let mut engine = Engine {
            config,
            surface,
            notifier: Box::new(LogNotifier),
            frames,
            attempted: 0,
            phase: Phase::Loading,
            drawn: None,
            tick_pending: false,
            scroll_attached: false,
            scale: 1.0,
            track_height: 0.0,
        };
        engine.resize();
        Ok(engine)
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    // -----------------------------------------------------------------------
    // Preload
    // -----------------------------------------------------------------------

    /// Load every frame, then become `Ready`.
    ///
    /// Frame 1 is loaded and painted before anything else starts. The rest go
    /// through a pool of `concurrency` in-flight loads. Individual failures
    /// are recorded and counted; they never stop the batch.
    pub async fn preload(&mut self, source: Arc<dyn FrameSource>) -> PreloadReport {
        let total = self.frames.len();
        info!(total, concurrency = self.config.concurrency, "preloading frames");

        let mut interrupted = 0;

        let first = vec![(0, self.config.frame_path(0))];
        let mut tasks = preload::spawn_pool(Arc::clone(&source), first, 1);
        interrupted += self.drain(&mut tasks).await;

        let jobs = (1..total)
            .map(|index| (index, self.config.frame_path(index)))
            .collect();
        let mut tasks = preload::spawn_pool(source, jobs, self.config.concurrency);
        interrupted += self.drain(&mut tasks).await;

        if interrupted > 0 {
            let err = EngineError::PreloadInterrupted(interrupted);
            error!("{err}");
            let abandoned = self.frames.fail_pending();
            self.advance(abandoned);
            self.notifier.show(
                "The intro animation could not finish loading.",
                Severity::Warning,
                Some(self.config.warning_duration()),
            );
        }

        let report = PreloadReport {
            total,
            loaded: self.frames.loaded_count(),
            failed: self.frames.failed_count(),
            interrupted,
        };

        if interrupted == 0 && report.failed > 0 {
            self.notifier.show(
                &format!("{} of {} intro frames failed to load", report.failed, total),
                Severity::Warning,
                Some(self.config.warning_duration()),
            );
        }

        info!(
            loaded = report.loaded,
            failed = report.failed,
            "preload complete"
        );
        self.mark_ready();
        report
    }

    /// Record every result in `tasks`. Returns how many tasks died.
    async fn drain(&mut self, tasks: &mut JoinSet<LoadResult>) -> usize {
        let mut interrupted = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => self.record(index, result),
                Err(e) => {
                    interrupted += 1;
                    error!(error = %e, "frame load task did not complete");
                }
            }
        }
        interrupted
    }

    fn record(&mut self, index: usize, result: Result<Bitmap, FrameError>) {
        match result {
            Ok(bitmap) => {
                debug!(index, "frame loaded");
                self.frames.set_loaded(index, bitmap);
            }
            Err(e) => {
                warn!(index, error = %e, "frame failed to load");
                self.frames.set_failed(index);
            }
        }
        self.advance(1);

        // First paint happens as soon as anything is drawable.
        if self.drawn.is_none() {
            self.paint(0);
        }
    }

    fn advance(&mut self, attempts: usize) {
        let total = self.frames.len();
        self.attempted = (self.attempted + attempts).min(total);
        self.surface
            .set_bar_width(self.attempted as f64 / total as f64 * 100.0);
        self.surface.set_counter_text(&self.attempted.to_string());
    }

    fn mark_ready(&mut self) {
        self.phase = Phase::Ready;
        self.surface.set_class(Mount::Loader, CLASS_HIDDEN, true);
        self.surface.set_class(Mount::Document, CLASS_LOADING, false);
        self.surface.set_class(Mount::Hint, CLASS_VISIBLE, true);
        self.scroll_attached = true;
        self.render_tick();
    }

    // -----------------------------------------------------------------------
    // Host events
    // -----------------------------------------------------------------------

    /// Scroll listener. Schedules at most one tick per animation frame.
    ///
    /// Returns `false` once the listener has been detached.
    pub fn on_scroll(&mut self) -> bool {
        if !self.scroll_attached {
            return false;
        }
        self.tick_pending = true;
        true
    }

    /// Run the pending tick, if any.
    pub fn on_animation_frame(&mut self) -> Option<TickOutcome> {
        if !self.tick_pending {
            return None;
        }
        Some(self.render_tick())
    }

    /// Resize listener. Stays attached for the engine's lifetime.
    pub fn on_resize(&mut self) {
        self.resize();
        if self.scroll_attached {
            self.tick_pending = true;
        }
    }

    pub fn is_listening(&self) -> bool {
        self.scroll_attached
    }

    // -----------------------------------------------------------------------
    // Playback
    // -----------------------------------------------------------------------

    pub fn compute_progress(&self) -> f64 {
        let viewport = self.surface.viewport();
        TrackSpan::new(self.surface.track_top(), self.track_height, viewport.height)
            .progress(self.surface.scroll_y())
    }

    pub fn render_tick(&mut self) -> TickOutcome {
        self.tick_pending = false;
        if self.phase != Phase::Ready {
            return TickOutcome::Idle;
        }

        let progress = self.compute_progress();
        self.surface
            .set_class(Mount::Hint, CLASS_VISIBLE, progress <= 0.0);

        let target = track::frame_for_progress(progress, self.frames.len());
        let painted = self.drawn != Some(target) && self.paint(target);

        if progress >= 1.0 {
            self.finish();
            return TickOutcome::Finished(target);
        }
        if painted {
            TickOutcome::Painted(target)
        } else {
            TickOutcome::Unchanged(target)
        }
    }

    fn finish(&mut self) {
        self.phase = Phase::Finished;
        self.scroll_attached = false;
        self.tick_pending = false;
        self.surface.set_class(Mount::Hint, CLASS_VISIBLE, false);
        self.surface.set_class(Mount::Overlay, CLASS_FINISHED, true);
        info!(frame = ?self.drawn, "intro finished");
    }

    pub fn resolve_renderable_frame(&self, index: usize) -> Option<&Bitmap> {
        self.frames.resolve(index, self.config.max_fallback_radius)
    }

    /// Draw the frame for `index` (or its nearest loaded neighbor).
    fn paint(&mut self, index: usize) -> bool {
        let Some(bitmap) = self.resolve_renderable_frame(index).cloned() else {
            return false;
        };
        self.draw(&bitmap);
        self.drawn = Some(index);
        true
    }

    /// Clear the canvas and contain-fit `bitmap` into the viewport.
    pub fn draw(&mut self, bitmap: &Bitmap) {
        let viewport = self.surface.viewport();
        let rect = fit::contain(
            bitmap.width() as f64,
            bitmap.height() as f64,
            viewport.width,
            viewport.height,
        );
        self.surface.clear();
        self.surface.draw_image(bitmap, rect);
    }

    /// Resize the backing store and track to the current viewport.
    ///
    /// Resetting the backing store wipes the canvas, so the current frame is
    /// painted again.
    pub fn resize(&mut self) {
        let viewport = self.surface.viewport();
        self.scale = track::effective_scale(
            self.surface.device_pixel_ratio(),
            self.config.max_pixel_ratio,
        );

        self.surface.set_backing_store(
            (viewport.width * self.scale).round() as u32,
            (viewport.height * self.scale).round() as u32,
        );
        self.surface.set_transform(self.scale);

        let per_frame = self.config.pixels_per_frame.for_width(viewport.width);
        self.track_height = track::track_height(viewport.height, self.frames.len(), per_frame);
        self.surface.set_track_height(self.track_height);
        debug!(
            width = viewport.width,
            height = viewport.height,
            scale = self.scale,
            track_height = self.track_height,
            "resized"
        );

        if let Some(index) = self.drawn {
            self.paint(index);
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn drawn_index(&self) -> Option<usize> {
        self.drawn
    }

    pub fn frames(&self) -> &FrameSet {
        &self.frames
    }

    pub fn attempted(&self) -> usize {
        self.attempted
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn track_height(&self) -> f64 {
        self.track_height
    }

    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}
