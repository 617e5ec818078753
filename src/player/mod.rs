//! Player — the terminal host for the engine.
//!
//! Sets up the terminal, preloads the frames from disk and then turns
//! wheel and key input into scroll offsets. Input is drained once per tick
//! interval, so a burst of scroll events costs a single engine tick.
//! Quitting also works during the preload; dropping it aborts the
//! outstanding loads.

mod surface;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use crossterm::event::{self, Event, KeyCode, MouseEventKind};
use crossterm::{cursor, execute, style, terminal};
use tracing::info;

use crate::config::SequenceConfig;
use crate::engine::Engine;
use crate::engine::preload::FsFrameSource;
use crate::error::EngineError;
use crate::types::{Color, NamedColor, Style};

pub use surface::{StatusNotifier, TerminalSurface};

pub struct Player {
    config: SequenceConfig,
}

enum Input {
    Quit,
    Scroll(f64),
    Jump(f64),
    Resize(u16, u16),
    Ignore,
}

impl Player {
    pub fn new(config: SequenceConfig) -> Self {
        Self { config }
    }

    /// Play the intro in the terminal.
    ///
    /// Sets up the terminal, enters the event loop, and restores the terminal
    /// on exit (even on error).
    pub async fn play(&mut self) -> Result<()> {
        let (cols, rows) = terminal::size()?;
        if cols < 10 || rows < 4 {
            bail!("Terminal too small: need at least 10x4, have {cols}x{rows}");
        }

        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(
            stdout,
            terminal::EnterAlternateScreen,
            event::EnableMouseCapture,
            cursor::Hide,
            terminal::Clear(terminal::ClearType::All),
        )?;

        let result = self.run(cols, rows).await;

        // Always restore terminal state.
        let _ = execute!(
            stdout,
            event::DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen,
        );
        let _ = terminal::disable_raw_mode();

        result
    }

    async fn run(&mut self, cols: u16, rows: u16) -> Result<()> {
        let notices = StatusNotifier::default();
        let mut surface = TerminalSurface::new(cols, rows, &self.config.terminal, notices.clone());

        let mut engine = match Engine::new(&mut surface, self.config.clone()) {
            Ok(engine) => engine.with_notifier(notices),
            Err(e @ (EngineError::NoDrawingContext | EngineError::MissingMount(_))) => {
                info!(error = %e, "intro disabled");
                return Self::fallback_loop(&mut surface, &e.to_string());
            }
            Err(e) => return Err(e).context("Failed to start the intro engine"),
        };

        let tick = Duration::from_millis(self.config.terminal.tick_ms.max(1));
        let step = self.config.terminal.scroll_step;

        // Only quit is honored while loading; the last resize is applied after.
        let source = Arc::new(FsFrameSource::new(&self.config.asset_root));
        let mut resized = None;
        {
            let preload = engine.preload(source);
            tokio::pin!(preload);
            let mut ticker = tokio::time::interval(tick);
            loop {
                tokio::select! {
                    report = &mut preload => {
                        info!(?report, "intro ready");
                        break;
                    }
                    _ = ticker.tick() => {
                        while event::poll(Duration::ZERO)? {
                            match Self::classify(event::read()?, step, 0.0) {
                                Input::Quit => {
                                    info!("quit while loading");
                                    return Ok(());
                                }
                                Input::Resize(cols, rows) => resized = Some((cols, rows)),
                                _ => {}
                            }
                        }
                    }
                }
            }
        }
        if let Some((cols, rows)) = resized {
            engine.surface_mut().set_terminal_size(cols, rows);
            engine.on_resize();
        }
        engine.surface_mut().take_error()?;

        loop {
            if event::poll(tick)? {
                let mut scrolled = false;
                loop {
                    let page = engine.surface().page_height();
                    match Self::classify(event::read()?, step, page) {
                        Input::Quit => return Ok(()),
                        Input::Scroll(delta) => {
                            scrolled |= engine.surface_mut().scroll_by(delta);
                        }
                        Input::Jump(offset) => {
                            scrolled |= engine.surface_mut().scroll_to(offset);
                        }
                        Input::Resize(cols, rows) => {
                            engine.surface_mut().set_terminal_size(cols, rows);
                            engine.on_resize();
                        }
                        Input::Ignore => {}
                    }
                    if !event::poll(Duration::ZERO)? {
                        break;
                    }
                }
                // Once detached, scrolling only moves the page.
                if scrolled && engine.is_listening() {
                    engine.on_scroll();
                }
                if scrolled {
                    engine.surface_mut().render_status()?;
                }
            }

            engine.on_animation_frame();
            engine.surface_mut().expire_notices();
            engine.surface_mut().take_error()?;
        }
    }

    fn fallback_loop(surface: &mut TerminalSurface, reason: &str) -> Result<()> {
        surface.render_fallback(&format!("Intro unavailable ({reason}). Press q to quit."))?;
        loop {
            if let Input::Quit = Self::classify(event::read()?, 0.0, 0.0) {
                return Ok(());
            }
        }
    }

    fn classify(event: Event, step: f64, page: f64) -> Input {
        match event {
            Event::Key(key) => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => Input::Quit,
                KeyCode::Down | KeyCode::Char('j') => Input::Scroll(step),
                KeyCode::Up | KeyCode::Char('k') => Input::Scroll(-step),
                KeyCode::PageDown | KeyCode::Char(' ') => Input::Scroll(page),
                KeyCode::PageUp => Input::Scroll(-page),
                KeyCode::Home => Input::Jump(0.0),
                KeyCode::End => Input::Jump(f64::MAX),
                _ => Input::Ignore,
            },
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollDown => Input::Scroll(step),
                MouseEventKind::ScrollUp => Input::Scroll(-step),
                _ => Input::Ignore,
            },
            Event::Resize(cols, rows) => Input::Resize(cols, rows),
            _ => Input::Ignore,
        }
    }
}

// ---------------------------------------------------------------------------
// Style conversion
// ---------------------------------------------------------------------------

pub fn to_content_style(s: &Style) -> style::ContentStyle {
    let mut cs = style::ContentStyle::default();
    if let Some(fg) = &s.fg {
        cs.foreground_color = Some(to_ct_color(fg));
    }
    if let Some(bg) = &s.bg {
        cs.background_color = Some(to_ct_color(bg));
    }
    if s.bold {
        cs.attributes.set(style::Attribute::Bold);
    }
    if s.dim {
        cs.attributes.set(style::Attribute::Dim);
    }
    cs
}

pub fn to_ct_color(c: &Color) -> style::Color {
    match c {
        Color::Named(n) => match n {
            NamedColor::Yellow => style::Color::Yellow,
            NamedColor::Cyan => style::Color::Cyan,
        },
        Color::Rgb { r, g, b } => style::Color::Rgb {
            r: *r,
            g: *g,
            b: *b,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyModifiers, MouseEvent};

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn wheel_and_keys_scroll() {
        assert!(matches!(Player::classify(key(KeyCode::Down), 24.0, 80.0), Input::Scroll(d) if d == 24.0));
        assert!(matches!(Player::classify(key(KeyCode::PageUp), 24.0, 80.0), Input::Scroll(d) if d == -80.0));
        let wheel = Event::Mouse(MouseEvent {
            kind: MouseEventKind::ScrollUp,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        });
        assert!(matches!(Player::classify(wheel, 24.0, 80.0), Input::Scroll(d) if d == -24.0));
    }

    #[test]
    fn quit_and_resize_are_recognized() {
        assert!(matches!(Player::classify(key(KeyCode::Esc), 1.0, 1.0), Input::Quit));
        assert!(matches!(
            Player::classify(Event::Resize(120, 40), 1.0, 1.0),
            Input::Resize(120, 40)
        ));
    }

    #[test]
    fn rgb_colors_pass_through() {
        let style = Style {
            fg: Some(Color::Rgb { r: 1, g: 2, b: 3 }),
            dim: true,
            ..Default::default()
        };
        let cs = to_content_style(&style);
        assert_eq!(
            cs.foreground_color,
            Some(style::Color::Rgb { r: 1, g: 2, b: 3 })
        );
        assert!(cs.attributes.has(style::Attribute::Dim));
    }
}
