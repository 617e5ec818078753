//! Terminal-backed `RenderSurface`.
//!
//! The canvas is shown with half-block cells, two CSS pixels per cell
//! vertically. The row above the canvas holds the menu bar and the row below
//! holds the loader, the scroll hint and notifications.

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::io::{self, Write};
use std::rc::Rc;
use std::time::{Duration, Instant};

use crossterm::{cursor, queue, style, terminal};
use tracing::{info, warn};

use super::{to_content_style, to_ct_color};
use crate::config::TerminalConfig;
use crate::menubar;
use crate::renderer::{Canvas, Renderer};
use crate::surface::{
    CLASS_FINISHED, CLASS_HIDDEN, CLASS_VISIBLE, Mount, Notifier, RenderSurface,
};
use crate::types::{Bitmap, Cell, Color, DrawRect, NamedColor, Severity, Viewport};

/// Rows reserved above the canvas for the menu bar.
const CANVAS_OFFSET: u16 = 1;

/// Width of the loader bar, in cells.
const BAR_CELLS: usize = 24;

/// How long a message without its own duration stays up.
const DEFAULT_NOTICE: Duration = Duration::from_secs(4);

#[derive(Debug, Clone)]
struct Notice {
    text: String,
    severity: Severity,
    expires: Instant,
}

/// Notifier that queues messages for the status row.
#[derive(Debug, Clone, Default)]
pub struct StatusNotifier {
    queue: Rc<RefCell<VecDeque<Notice>>>,
}

impl Notifier for StatusNotifier {
    fn show(&mut self, message: &str, severity: Severity, duration: Option<Duration>) {
        match severity {
            Severity::Info => info!("{message}"),
            Severity::Warning | Severity::Error => warn!("{message}"),
        }
        self.queue.borrow_mut().push_back(Notice {
            text: message.to_string(),
            severity,
            expires: Instant::now() + duration.unwrap_or(DEFAULT_NOTICE),
        });
    }
}

pub struct TerminalSurface {
    stdout: io::Stdout,
    cols: u16,
    rows: u16,
    pixel_ratio: f64,
    scroll_y: f64,
    track_height: f64,
    canvas: Canvas,
    grid: Vec<Vec<Cell>>,
    full_redraw: bool,
    classes: HashSet<(Mount, &'static str)>,
    bar_width: f64,
    counter: String,
    notices: StatusNotifier,
    error: Option<io::Error>,
}

impl TerminalSurface {
    pub fn new(cols: u16, rows: u16, config: &TerminalConfig, notices: StatusNotifier) -> Self {
        TerminalSurface {
            stdout: io::stdout(),
            cols,
            rows,
            pixel_ratio: config.pixel_ratio,
            scroll_y: 0.0,
            track_height: 0.0,
            canvas: Canvas::new(0, 0),
            grid: Vec::new(),
            full_redraw: true,
            classes: HashSet::new(),
            bar_width: 0.0,
            counter: String::new(),
            notices,
            error: None,
        }
    }

    fn canvas_rows(&self) -> u16 {
        self.rows.saturating_sub(CANVAS_OFFSET + 1)
    }

    /// Largest scroll offset: the track plus one page of content below it.
    pub fn max_scroll(&self) -> f64 {
        self.track_height.max(0.0)
    }

    pub fn scroll_by(&mut self, delta: f64) -> bool {
        self.scroll_to(self.scroll_y + delta)
    }

    /// Returns whether the offset moved.
    pub fn scroll_to(&mut self, offset: f64) -> bool {
        let clamped = offset.clamp(0.0, self.max_scroll());
        let moved = clamped != self.scroll_y;
        self.scroll_y = clamped;
        moved
    }

    pub fn page_height(&self) -> f64 {
        self.viewport().height
    }

    pub fn set_terminal_size(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        self.full_redraw = true;
    }

    /// Surface the first I/O error hit inside a trait call.
    pub fn take_error(&mut self) -> io::Result<()> {
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn keep_error(&mut self, result: io::Result<()>) {
        if let Err(e) = result {
            if self.error.is_none() {
                self.error = Some(e);
            }
        }
    }

    /// Drop expired notices; redraw the status row if any went away.
    pub fn expire_notices(&mut self) {
        let now = Instant::now();
        let expired = {
            let mut queue = self.notices.queue.borrow_mut();
            let before = queue.len();
            queue.retain(|n| n.expires > now);
            before != queue.len()
        };
        if expired {
            let result = self.render_status();
            self.keep_error(result);
        }
    }

    // -----------------------------------------------------------------------
    // Terminal output
    // -----------------------------------------------------------------------

    pub fn render_chrome(&mut self) -> io::Result<()> {
        self.render_menubar()?;
        self.render_status()
    }

    fn render_menubar(&mut self) -> io::Result<()> {
        queue!(
            self.stdout,
            cursor::MoveTo(0, 0),
            terminal::Clear(terminal::ClearType::CurrentLine),
            style::Print(" "),
        )?;
        menubar::print_hints(&mut self.stdout, menubar::PLAYBACK)?;
        self.stdout.flush()
    }

    fn render_canvas(&mut self) -> io::Result<()> {
        let next = Renderer::rasterize(&self.canvas, self.cols, self.canvas_rows());

        if self.full_redraw || self.grid.len() != next.len() {
            for (y, row) in next.iter().enumerate() {
                queue!(self.stdout, cursor::MoveTo(0, y as u16 + CANVAS_OFFSET))?;
                for cell in row {
                    let cs = to_content_style(&cell.style);
                    queue!(
                        self.stdout,
                        style::PrintStyledContent(style::StyledContent::new(cs, cell.ch))
                    )?;
                }
            }
            self.full_redraw = false;
        } else {
            for change in Renderer::diff(&self.grid, &next) {
                let cs = to_content_style(&change.cell.style);
                queue!(
                    self.stdout,
                    cursor::MoveTo(change.x, change.y + CANVAS_OFFSET),
                    style::PrintStyledContent(style::StyledContent::new(cs, change.cell.ch)),
                )?;
            }
        }

        self.grid = next;
        self.stdout.flush()
    }

    pub fn render_status(&mut self) -> io::Result<()> {
        let status_y = self.rows.saturating_sub(1);
        if status_y < CANVAS_OFFSET {
            return Ok(()); // No room for a status bar.
        }

        let loading = !self.classes.contains(&(Mount::Loader, CLASS_HIDDEN));
        let status = if loading {
            let filled = ((self.bar_width / 100.0) * BAR_CELLS as f64).round() as usize;
            let filled = filled.min(BAR_CELLS);
            format!(
                " Loading frames {}{} {}",
                "\u{2588}".repeat(filled),
                "\u{2591}".repeat(BAR_CELLS - filled),
                self.counter,
            )
        } else if self.classes.contains(&(Mount::Overlay, CLASS_FINISHED)) {
            " Intro complete".to_string()
        } else if self.classes.contains(&(Mount::Hint, CLASS_VISIBLE)) {
            " Scroll \u{2193} to play the intro".to_string()
        } else {
            let pct = if self.max_scroll() > 0.0 {
                self.scroll_y / self.max_scroll() * 100.0
            } else {
                100.0
            };
            format!(" Scrolled {pct:>3.0}%")
        };

        let mut cs = style::ContentStyle::default();
        cs.attributes.set(style::Attribute::Dim);

        queue!(
            self.stdout,
            cursor::MoveTo(0, status_y),
            terminal::Clear(terminal::ClearType::CurrentLine),
            style::PrintStyledContent(style::StyledContent::new(cs, status)),
        )?;
        if loading {
            queue!(self.stdout, style::Print("  "))?;
            menubar::print_hints(&mut self.stdout, menubar::LOADING)?;
        }

        if let Some(notice) = self.notices.queue.borrow().back() {
            let color = match notice.severity {
                Severity::Info => Color::Named(NamedColor::Cyan),
                Severity::Warning => Color::Named(NamedColor::Yellow),
                Severity::Error => Color::Rgb { r: 220, g: 60, b: 60 },
            };
            let mut ns = style::ContentStyle::default();
            ns.foreground_color = Some(to_ct_color(&color));
            queue!(
                self.stdout,
                style::Print("  "),
                style::PrintStyledContent(style::StyledContent::new(ns, notice.text.as_str())),
            )?;
        }

        self.stdout.flush()
    }

    /// Static fallback shown when the intro cannot run.
    pub fn render_fallback(&mut self, message: &str) -> io::Result<()> {
        queue!(
            self.stdout,
            terminal::Clear(terminal::ClearType::All),
            cursor::MoveTo(1, CANVAS_OFFSET + 1),
            style::Print(message),
        )?;
        self.render_menubar()
    }
}

impl RenderSurface for TerminalSurface {
    fn has_mount(&self, _mount: Mount) -> bool {
        self.cols > 0 && self.canvas_rows() > 0
    }

    fn acquire_context(&mut self) -> bool {
        // Half-block frames need at least 256 colors to be legible.
        style::available_color_count() >= 256
    }

    fn viewport(&self) -> Viewport {
        Viewport {
            width: self.cols as f64,
            height: self.canvas_rows() as f64 * 2.0,
        }
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    fn track_top(&self) -> f64 {
        0.0
    }

    fn set_track_height(&mut self, height: f64) {
        self.track_height = height;
        self.scroll_y = self.scroll_y.clamp(0.0, self.max_scroll());
    }

    fn set_backing_store(&mut self, width: u32, height: u32) {
        self.canvas.resize(width, height);
        self.full_redraw = true;
        let result = queue!(self.stdout, terminal::Clear(terminal::ClearType::All))
            .and_then(|_| self.render_chrome());
        self.keep_error(result);
    }

    fn set_transform(&mut self, scale: f64) {
        self.canvas.set_transform(scale);
    }

    fn clear(&mut self) {
        self.canvas.clear();
    }

    fn draw_image(&mut self, bitmap: &Bitmap, rect: DrawRect) {
        self.canvas.draw_image(bitmap, rect);
        let result = self.render_canvas();
        self.keep_error(result);
    }

    fn set_class(&mut self, mount: Mount, class: &'static str, enabled: bool) {
        let changed = if enabled {
            self.classes.insert((mount, class))
        } else {
            self.classes.remove(&(mount, class))
        };
        if changed {
            let result = self.render_status();
            self.keep_error(result);
        }
    }

    fn set_bar_width(&mut self, percent: f64) {
        self.bar_width = percent;
    }

    fn set_counter_text(&mut self, text: &str) {
        self.counter = text.to_string();
        let result = self.render_status();
        self.keep_error(result);
    }
}
