use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{Rgba, RgbaImage};

use scrollreel::config::SequenceConfig;
use scrollreel::engine::preload::FrameSource;
use scrollreel::engine::{Engine, Phase};
use scrollreel::error::FrameError;
use scrollreel::surface::headless::RecordingNotifier;
use scrollreel::surface::{CLASS_HIDDEN, HeadlessSurface, Mount};
use scrollreel::types::{Bitmap, Severity};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Start(usize),
    End(usize),
}

/// Source that tracks load order and how many loads overlap.
#[derive(Default)]
struct InstrumentedSource {
    failing: HashSet<usize>,
    panicking: HashSet<usize>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    events: Mutex<Vec<Event>>,
}

impl InstrumentedSource {
    fn index_of(path: &str) -> usize {
        let digits: String = path.chars().filter(char::is_ascii_digit).collect();
        digits.parse::<usize>().unwrap() - 1
    }
}

#[async_trait]
impl FrameSource for InstrumentedSource {
    async fn load(&self, path: &str) -> Result<Bitmap, FrameError> {
        let index = Self::index_of(path);
        self.events.lock().unwrap().push(Event::Start(index));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(2)).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.events.lock().unwrap().push(Event::End(index));

        if self.panicking.contains(&index) {
            panic!("decoder crashed on frame {index}");
        }
        if self.failing.contains(&index) {
            return Err(FrameError::Unavailable(path.to_string()));
        }
        Ok(Bitmap::new(RgbaImage::from_pixel(
            8,
            8,
            Rgba([index as u8, 0, 0, 255]),
        )))
    }
}

fn config() -> SequenceConfig {
    SequenceConfig {
        path_prefix: "f".into(),
        ..SequenceConfig::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pool_never_exceeds_concurrency() {
    let source = Arc::new(InstrumentedSource::default());
    let mut surface = HeadlessSurface::new(1280.0, 720.0);
    let mut engine = Engine::new(&mut surface, config()).unwrap();

    let report = engine.preload(source.clone()).await;

    assert_eq!(report.loaded, 240);
    let peak = source.peak.load(Ordering::SeqCst);
    assert!(peak <= 12, "peak in-flight loads was {peak}");
    assert!(peak > 1, "loads never overlapped");
}

#[tokio::test]
async fn frame_one_completes_before_the_pool_starts() {
    let source = Arc::new(InstrumentedSource::default());
    let mut surface = HeadlessSurface::new(1280.0, 720.0);
    let mut engine = Engine::new(&mut surface, config()).unwrap();

    engine.preload(source.clone()).await;

    let events = source.events.lock().unwrap().clone();
    assert_eq!(events[0], Event::Start(0));
    assert_eq!(events[1], Event::End(0));
    assert_eq!(events.len(), 480);
    drop(engine);

    let first = &surface.paints[0];
    assert_eq!(first.bitmap.pixels().get_pixel(0, 0)[0], 0);
}

#[tokio::test]
async fn failed_frame_five_falls_back_to_a_neighbor() {
    let source = Arc::new(InstrumentedSource {
        failing: HashSet::from([4]),
        ..Default::default()
    });
    let notifier = RecordingNotifier::default();
    let mut surface = HeadlessSurface::new(1280.0, 720.0);
    let mut engine = Engine::new(&mut surface, config())
        .unwrap()
        .with_notifier(notifier.clone());

    let report = engine.preload(source).await;
    assert_eq!((report.loaded, report.failed), (239, 1));

    let tag = engine.resolve_renderable_frame(4).unwrap().pixels().get_pixel(0, 0)[0];
    assert!(tag == 3 || tag == 5, "resolved to {tag}");

    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "1 of 240 intro frames failed to load");
    drop(engine);

    assert_eq!(surface.bar_width, 100.0);
    assert_eq!(surface.counter_text, "240");
}

#[tokio::test]
async fn crashed_tasks_still_leave_the_engine_ready() {
    let source = Arc::new(InstrumentedSource {
        panicking: HashSet::from([10, 11]),
        ..Default::default()
    });
    let notifier = RecordingNotifier::default();
    let mut surface = HeadlessSurface::new(1280.0, 720.0);
    let mut engine = Engine::new(&mut surface, config())
        .unwrap()
        .with_notifier(notifier.clone());

    let report = engine.preload(source).await;
    assert_eq!(report.interrupted, 2);
    assert_eq!(report.failed, 2);
    assert_eq!(engine.phase(), Phase::Ready);
    assert_eq!(engine.attempted(), 240);
    assert!(engine.resolve_renderable_frame(10).is_some());

    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].severity, Severity::Warning);
    drop(engine);

    assert_eq!(surface.bar_width, 100.0);
    assert_eq!(surface.counter_text, "240");
    assert!(surface.has_class(Mount::Loader, CLASS_HIDDEN));
}

#[tokio::test]
async fn every_frame_failing_still_completes() {
    let source = Arc::new(InstrumentedSource {
        failing: (0..240).collect(),
        ..Default::default()
    });
    let mut surface = HeadlessSurface::new(1280.0, 720.0);
    let mut engine = Engine::new(&mut surface, config()).unwrap();

    let report = engine.preload(source).await;
    assert_eq!(report.failed, 240);
    assert_eq!(engine.phase(), Phase::Ready);
    assert!(engine.resolve_renderable_frame(0).is_none());
    assert_eq!(engine.drawn_index(), None);
    drop(engine);

    assert!(surface.paints.is_empty());
    assert_eq!(surface.counter_text, "240");
}

#[tokio::test]
async fn crash_on_frame_one_still_leaves_the_engine_ready() {
    let source = Arc::new(InstrumentedSource {
        panicking: HashSet::from([0]),
        ..Default::default()
    });
    let notifier = RecordingNotifier::default();
    let mut surface = HeadlessSurface::new(1280.0, 720.0);
    let mut engine = Engine::new(&mut surface, config())
        .unwrap()
        .with_notifier(notifier.clone());

    let report = engine.preload(source).await;
    assert_eq!(report.interrupted, 1);
    assert_eq!((report.loaded, report.failed), (239, 1));
    assert_eq!(engine.phase(), Phase::Ready);
    assert_eq!(engine.attempted(), 240);

    // Index 0 falls back to frame 2.
    let tag = engine.resolve_renderable_frame(0).unwrap().pixels().get_pixel(0, 0)[0];
    assert_eq!(tag, 1);

    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].severity, Severity::Warning);
    drop(engine);

    assert_eq!(surface.bar_width, 100.0);
    assert_eq!(surface.counter_text, "240");
    assert!(surface.has_class(Mount::Loader, CLASS_HIDDEN));
}
