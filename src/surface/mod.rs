//! Surface — the host the engine draws into.
//!
//! The engine never touches a window, document or terminal directly. It reads
//! scroll and viewport state through `RenderSurface` and writes canvas pixels,
//! element classes and loader text back through it.

pub mod headless;

use std::time::Duration;

use tracing::{error, info, warn};

use crate::types::{Bitmap, DrawRect, Severity, Viewport};

pub use headless::HeadlessSurface;

/// Elements the engine needs from its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mount {
    /// The document root; carries the loading-state class.
    Document,
    Overlay,
    Track,
    Canvas,
    Loader,
    LoaderBar,
    LoaderCount,
    Hint,
}

impl Mount {
    /// Mounts that must exist before the engine attaches.
    pub const REQUIRED: [Mount; 7] = [
        Mount::Overlay,
        Mount::Track,
        Mount::Canvas,
        Mount::Loader,
        Mount::LoaderBar,
        Mount::LoaderCount,
        Mount::Hint,
    ];
}

pub const CLASS_LOADING: &str = "is-loading";
pub const CLASS_HIDDEN: &str = "is-hidden";
pub const CLASS_VISIBLE: &str = "is-visible";
pub const CLASS_FINISHED: &str = "is-finished";

pub trait RenderSurface {
    fn has_mount(&self, mount: Mount) -> bool;

    /// Acquire the 2D drawing context. `false` disables the engine.
    fn acquire_context(&mut self) -> bool;

    fn viewport(&self) -> Viewport;

    fn device_pixel_ratio(&self) -> f64;

    /// Vertical document scroll offset in CSS pixels.
    fn scroll_y(&self) -> f64;

    /// Document-relative top of the track element.
    fn track_top(&self) -> f64;

    fn set_track_height(&mut self, height: f64);

    fn set_backing_store(&mut self, width: u32, height: u32);

    /// Reset the drawing transform to a uniform `scale`.
    fn set_transform(&mut self, scale: f64);

    fn clear(&mut self);

    fn draw_image(&mut self, bitmap: &Bitmap, rect: DrawRect);

    fn set_class(&mut self, mount: Mount, class: &'static str, enabled: bool);

    fn set_bar_width(&mut self, percent: f64);

    fn set_counter_text(&mut self, text: &str);
}

impl<S: RenderSurface + ?Sized> RenderSurface for &mut S {
    fn has_mount(&self, mount: Mount) -> bool {
        (**self).has_mount(mount)
    }

    fn acquire_context(&mut self) -> bool {
        (**self).acquire_context()
    }

    fn viewport(&self) -> Viewport {
        (**self).viewport()
    }

    fn device_pixel_ratio(&self) -> f64 {
        (**self).device_pixel_ratio()
    }

    fn scroll_y(&self) -> f64 {
        (**self).scroll_y()
    }

    fn track_top(&self) -> f64 {
        (**self).track_top()
    }

    fn set_track_height(&mut self, height: f64) {
        (**self).set_track_height(height)
    }

    fn set_backing_store(&mut self, width: u32, height: u32) {
        (**self).set_backing_store(width, height)
    }

    fn set_transform(&mut self, scale: f64) {
        (**self).set_transform(scale)
    }

    fn clear(&mut self) {
        (**self).clear()
    }

    fn draw_image(&mut self, bitmap: &Bitmap, rect: DrawRect) {
        (**self).draw_image(bitmap, rect)
    }

    fn set_class(&mut self, mount: Mount, class: &'static str, enabled: bool) {
        (**self).set_class(mount, class, enabled)
    }

    fn set_bar_width(&mut self, percent: f64) {
        (**self).set_bar_width(percent)
    }

    fn set_counter_text(&mut self, text: &str) {
        (**self).set_counter_text(text)
    }
}

/// Transient user-facing messages.
pub trait Notifier {
    fn show(&mut self, message: &str, severity: Severity, duration: Option<Duration>);
}

/// Notifier that only logs.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show(&mut self, message: &str, severity: Severity, _duration: Option<Duration>) {
        match severity {
            Severity::Info => info!("{message}"),
            Severity::Warning => warn!("{message}"),
            Severity::Error => error!("{message}"),
        }
    }
}
