//! Renderer — the canvas and its terminal rasterizer.
//!
//! `Canvas` is the backing store the engine draws into: an RGBA buffer with
//! a uniform scale transform from CSS pixels to device pixels.
//!
//! `Renderer` turns a canvas into a grid of half-block cells and diffs grids
//! so only changed cells are written. It is pure and stateless.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::types::{Bitmap, Cell, CellChange, Color, DrawRect, Style};

/// Upper half block: foreground paints the top pixel, background the bottom.
const HALF_BLOCK: char = '\u{2580}';

const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

#[derive(Debug, Clone)]
pub struct Canvas {
    pixels: RgbaImage,
    scale: f64,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Canvas {
            pixels: RgbaImage::from_pixel(width, height, BACKGROUND),
            scale: 1.0,
        }
    }

    /// Reallocate the backing store. The contents are lost.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.pixels = RgbaImage::from_pixel(width, height, BACKGROUND);
    }

    pub fn set_transform(&mut self, scale: f64) {
        self.scale = scale;
    }

    pub fn clear(&mut self) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = BACKGROUND;
        }
    }

    /// Composite `bitmap` into `rect`, given in CSS pixels.
    pub fn draw_image(&mut self, bitmap: &Bitmap, rect: DrawRect) {
        let x = (rect.x * self.scale).round() as i64;
        let y = (rect.y * self.scale).round() as i64;
        let width = (rect.width * self.scale).round() as u32;
        let height = (rect.height * self.scale).round() as u32;
        if width == 0 || height == 0 || bitmap.width() == 0 || bitmap.height() == 0 {
            return;
        }

        if (width, height) == (bitmap.width(), bitmap.height()) {
            imageops::overlay(&mut self.pixels, bitmap.pixels(), x, y);
        } else {
            let scaled = imageops::resize(bitmap.pixels(), width, height, FilterType::Triangle);
            imageops::overlay(&mut self.pixels, &scaled, x, y);
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

pub struct Renderer;

impl Renderer {
    /// Rasterize a canvas onto a `cols` x `rows` half-block grid.
    ///
    /// Each cell covers two CSS pixels vertically. Samples are taken at
    /// pixel centers through the canvas transform.
    pub fn rasterize(canvas: &Canvas, cols: u16, rows: u16) -> Vec<Vec<Cell>> {
        let mut grid = vec![vec![Cell::default(); cols as usize]; rows as usize];
        if canvas.width() == 0 || canvas.height() == 0 {
            return grid;
        }

        for (y, row) in grid.iter_mut().enumerate() {
            for (x, cell) in row.iter_mut().enumerate() {
                let top = Self::sample(canvas, x as f64 + 0.5, (2 * y) as f64 + 0.5);
                let bottom = Self::sample(canvas, x as f64 + 0.5, (2 * y + 1) as f64 + 0.5);
                *cell = Cell {
                    ch: HALF_BLOCK,
                    style: Style {
                        fg: Some(top),
                        bg: Some(bottom),
                        ..Default::default()
                    },
                };
            }
        }

        grid
    }

    fn sample(canvas: &Canvas, css_x: f64, css_y: f64) -> Color {
        let px = ((css_x * canvas.scale()) as u32).min(canvas.width() - 1);
        let py = ((css_y * canvas.scale()) as u32).min(canvas.height() - 1);
        let Rgba([r, g, b, _]) = *canvas.pixels().get_pixel(px, py);
        Color::Rgb { r, g, b }
    }

    /// Compute a cell-level diff between two grids.
    pub fn diff(prev: &[Vec<Cell>], next: &[Vec<Cell>]) -> Vec<CellChange> {
        let mut changes = Vec::new();
        for (y, (prev_row, next_row)) in prev.iter().zip(next.iter()).enumerate() {
            for (x, (prev_cell, next_cell)) in prev_row.iter().zip(next_row.iter()).enumerate() {
                if prev_cell != next_cell {
                    changes.push(CellChange {
                        x: x as u16,
                        y: y as u16,
                        cell: next_cell.clone(),
                    });
                }
            }
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Bitmap {
        Bitmap::new(RgbaImage::from_pixel(
            width,
            height,
            Rgba([rgb[0], rgb[1], rgb[2], 255]),
        ))
    }

    #[test]
    fn draw_respects_transform() {
        let mut canvas = Canvas::new(40, 20);
        canvas.set_transform(2.0);
        let rect = DrawRect {
            x: 5.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        };
        canvas.draw_image(&solid(20, 20, [200, 10, 10]), rect);

        assert_eq!(canvas.pixels().get_pixel(9, 5).0, [0, 0, 0, 255]);
        assert_eq!(canvas.pixels().get_pixel(10, 5).0, [200, 10, 10, 255]);
        assert_eq!(canvas.pixels().get_pixel(29, 19).0, [200, 10, 10, 255]);
        assert_eq!(canvas.pixels().get_pixel(30, 5).0, [0, 0, 0, 255]);
    }

    #[test]
    fn clear_resets_to_background() {
        let mut canvas = Canvas::new(4, 4);
        canvas.draw_image(
            &solid(4, 4, [9, 9, 9]),
            DrawRect {
                x: 0.0,
                y: 0.0,
                width: 4.0,
                height: 4.0,
            },
        );
        canvas.clear();
        assert!(canvas.pixels().pixels().all(|p| *p == BACKGROUND));
    }

    #[test]
    fn rasterize_uses_half_blocks() {
        let mut canvas = Canvas::new(2, 2);
        canvas.draw_image(
            &solid(2, 1, [255, 0, 0]),
            DrawRect {
                x: 0.0,
                y: 0.0,
                width: 2.0,
                height: 1.0,
            },
        );
        let grid = Renderer::rasterize(&canvas, 2, 1);
        assert_eq!(grid.len(), 1);
        assert_eq!(grid[0][0].ch, HALF_BLOCK);
        assert_eq!(grid[0][0].style.fg, Some(Color::Rgb { r: 255, g: 0, b: 0 }));
        assert_eq!(grid[0][0].style.bg, Some(Color::Rgb { r: 0, g: 0, b: 0 }));
    }

    #[test]
    fn rasterize_samples_through_scale() {
        let mut canvas = Canvas::new(8, 8);
        canvas.set_transform(2.0);
        canvas.draw_image(
            &solid(4, 4, [0, 0, 255]),
            DrawRect {
                x: 2.0,
                y: 2.0,
                width: 2.0,
                height: 2.0,
            },
        );
        let grid = Renderer::rasterize(&canvas, 4, 2);
        let blue = Some(Color::Rgb { r: 0, g: 0, b: 255 });
        assert_eq!(grid[1][2].style.fg, blue);
        assert_eq!(grid[1][3].style.bg, blue);
        assert_ne!(grid[0][2].style.fg, blue);
    }

    #[test]
    fn diff_reports_only_changed_cells() {
        let prev = vec![vec![Cell::default(); 3]; 2];
        let mut next = prev.clone();
        next[1][2].ch = 'x';
        let changes = Renderer::diff(&prev, &next);
        assert_eq!(changes.len(), 1);
        assert_eq!((changes[0].x, changes[0].y), (2, 1));
    }
}
