//! A surface with no display. Every mutation is recorded for inspection.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::time::Duration;

use super::{Mount, Notifier, RenderSurface};
use crate::types::{Bitmap, DrawRect, Severity, Viewport};

#[derive(Debug, Clone)]
pub struct Paint {
    pub bitmap: Bitmap,
    pub rect: DrawRect,
}

#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    pub viewport: Viewport,
    pub device_pixel_ratio: f64,
    pub scroll_y: f64,
    pub track_top: f64,
    pub context_available: bool,
    pub missing: HashSet<Mount>,

    pub track_height: f64,
    pub backing_store: (u32, u32),
    pub transform: f64,
    pub paints: Vec<Paint>,
    pub clears: usize,
    pub classes: HashSet<(Mount, &'static str)>,
    pub bar_width: f64,
    pub counter_text: String,
}

impl HeadlessSurface {
    pub fn new(width: f64, height: f64) -> Self {
        HeadlessSurface {
            viewport: Viewport { width, height },
            device_pixel_ratio: 1.0,
            scroll_y: 0.0,
            track_top: 0.0,
            context_available: true,
            missing: HashSet::new(),
            track_height: 0.0,
            backing_store: (0, 0),
            transform: 1.0,
            paints: Vec::new(),
            clears: 0,
            classes: HashSet::new(),
            bar_width: 0.0,
            counter_text: String::new(),
        }
    }

    pub fn has_class(&self, mount: Mount, class: &'static str) -> bool {
        self.classes.contains(&(mount, class))
    }

    pub fn last_paint(&self) -> Option<&Paint> {
        self.paints.last()
    }

    /// Largest offset the document can scroll to with the current track.
    pub fn max_scroll(&self) -> f64 {
        (self.track_top + self.track_height - self.viewport.height).max(0.0)
    }
}

impl RenderSurface for HeadlessSurface {
    fn has_mount(&self, mount: Mount) -> bool {
        !self.missing.contains(&mount)
    }

    fn acquire_context(&mut self) -> bool {
        self.context_available
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    fn track_top(&self) -> f64 {
        self.track_top
    }

    fn set_track_height(&mut self, height: f64) {
        self.track_height = height;
    }

    fn set_backing_store(&mut self, width: u32, height: u32) {
        self.backing_store = (width, height);
    }

    fn set_transform(&mut self, scale: f64) {
        self.transform = scale;
    }

    fn clear(&mut self) {
        self.clears += 1;
    }

    fn draw_image(&mut self, bitmap: &Bitmap, rect: DrawRect) {
        self.paints.push(Paint {
            bitmap: bitmap.clone(),
            rect,
        });
    }

    fn set_class(&mut self, mount: Mount, class: &'static str, enabled: bool) {
        if enabled {
            self.classes.insert((mount, class));
        } else {
            self.classes.remove(&(mount, class));
        }
    }

    fn set_bar_width(&mut self, percent: f64) {
        self.bar_width = percent;
    }

    fn set_counter_text(&mut self, text: &str) {
        self.counter_text = text.to_string();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub text: String,
    pub severity: Severity,
    pub duration: Option<Duration>,
}

/// Notifier whose messages can be read back through any clone.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    messages: Rc<RefCell<Vec<Message>>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<Message> {
        self.messages.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn show(&mut self, message: &str, severity: Severity, duration: Option<Duration>) {
        self.messages.borrow_mut().push(Message {
            text: message.to_string(),
            severity,
            duration,
        });
    }
}
