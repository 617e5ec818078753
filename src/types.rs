//! Shared boundary types for the frame-sequence engine.
//!
//! This module defines the two key data contracts:
//! - Loader → Engine (in-memory): `Bitmap`s stored in `FrameSlot`s
//! - Canvas → Terminal (in-memory): `Cell` grids and `CellChange` diffs

use std::sync::Arc;

use image::RgbaImage;

// ---------------------------------------------------------------------------
// Shared style primitives
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Color {
    Named(NamedColor),
    Rgb { r: u8, g: u8, b: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamedColor {
    Yellow,
    Cyan,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Style {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
    pub dim: bool,
}

// ---------------------------------------------------------------------------
// Loader → Engine boundary
// ---------------------------------------------------------------------------

/// A decoded frame. Clones share the same pixel buffer.
#[derive(Debug, Clone)]
pub struct Bitmap {
    pixels: Arc<RgbaImage>,
}

impl Bitmap {
    pub fn new(pixels: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(pixels),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// State of one frame in the sequence.
#[derive(Debug, Clone, Default)]
pub enum FrameSlot {
    /// Not attempted yet.
    #[default]
    Pending,
    /// Attempted and failed; never retried.
    Failed,
    Loaded(Bitmap),
}

impl FrameSlot {
    pub fn bitmap(&self) -> Option<&Bitmap> {
        match self {
            FrameSlot::Loaded(bitmap) => Some(bitmap),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine → Surface boundary
// ---------------------------------------------------------------------------

/// Viewport size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Destination rectangle in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Canvas → Terminal boundary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub style: Style,
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            ch: ' ',
            style: Style::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellChange {
    pub x: u16,
    pub y: u16,
    pub cell: Cell,
}
