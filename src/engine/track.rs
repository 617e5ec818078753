//! Scroll-to-frame mapping.
//!
//! The track is a tall invisible region. Scrolling from its top until its
//! bottom meets the viewport bottom sweeps progress from 0 to 1.

/// Scroll span of a track, in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackSpan {
    pub start: f64,
    pub end: f64,
}

impl TrackSpan {
    pub fn new(track_top: f64, track_height: f64, viewport_height: f64) -> Self {
        TrackSpan {
            start: track_top,
            end: track_top + track_height - viewport_height,
        }
    }

    /// Fraction of the span scrolled, clamped to [0, 1].
    ///
    /// A degenerate span (end <= start) counts as fully scrolled.
    pub fn progress(&self, scroll_y: f64) -> f64 {
        let span = self.end - self.start;
        if !(span > 0.0) {
            return 1.0;
        }
        let progress = (scroll_y - self.start) / span;
        if progress.is_nan() {
            return 0.0;
        }
        progress.clamp(0.0, 1.0)
    }
}

/// Height of the track for `frame_count` frames.
pub fn track_height(viewport_height: f64, frame_count: usize, pixels_per_frame: f64) -> f64 {
    viewport_height + frame_count as f64 * pixels_per_frame
}

/// Frame index for a progress fraction, in [0, frame_count - 1].
pub fn frame_for_progress(progress: f64, frame_count: usize) -> usize {
    let last = frame_count.saturating_sub(1);
    let progress = if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    };
    ((progress * last as f64).round() as usize).min(last)
}

/// Effective backing-store scale for a device pixel ratio.
pub fn effective_scale(device_pixel_ratio: f64, max_pixel_ratio: f64) -> f64 {
    if !(device_pixel_ratio > 0.0) {
        return 1.0_f64.min(max_pixel_ratio);
    }
    device_pixel_ratio.min(max_pixel_ratio)
}
