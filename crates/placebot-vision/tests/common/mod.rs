//! Synthetic canvas and palette screenshots with known geometry.
//!
//! Shared by the integration tests and, through `#[path]`, by the unit
//! tests inside the crate, so it only uses the public API.
//!
//! Layout of one cell of size `S` at origin `(ox, oy)`:
//!
//! - grid lines (the background color) on row/column `ox` and `ox + S`;
//! - the actual color filling `ox+1 .. ox+S`;
//! - an optional `p`-wide preview icon centered in the fill: a
//!   one-pixel outline with the intended color inside.

#![allow(dead_code, clippy::unwrap_used)]

use placebot_vision::{ChannelOrder, ColorRgb, Coordinate, RgbImage, Screenshot};

pub const GRID: ColorRgb = ColorRgb::new(40, 40, 40);
pub const OUTLINE: ColorRgb = ColorRgb::new(0, 0, 0);
pub const WHITE: ColorRgb = ColorRgb::new(255, 255, 255);
pub const RED: ColorRgb = ColorRgb::new(255, 0, 24);
pub const BLUE: ColorRgb = ColorRgb::new(0, 70, 255);
pub const GOLD: ColorRgb = ColorRgb::new(255, 215, 0);

/// `(intended, actual)`; `None` means the cell has no preview icon.
pub type CellSpec = (Option<ColorRgb>, ColorRgb);

pub struct CanvasFixture {
    cell: u32,
    preview: u32,
    origin: u32,
    size: Option<(u32, u32)>,
    cells: Vec<Vec<CellSpec>>,
    order: ChannelOrder,
}

impl CanvasFixture {
    pub fn new(cell: u32, preview: u32) -> Self {
        assert!(preview >= 5 && preview + 2 < cell);
        Self {
            cell,
            preview,
            origin: 10,
            size: None,
            cells: Vec::new(),
            order: ChannelOrder::Rgb,
        }
    }

    pub fn with_cells(mut self, rows: Vec<Vec<CellSpec>>) -> Self {
        self.cells = rows;
        self
    }

    /// Rows of `(intended, actual)` cells, every one with a preview.
    pub fn with_colors(self, rows: &[&[(ColorRgb, ColorRgb)]]) -> Self {
        self.with_cells(
            rows.iter()
                .map(|row| row.iter().map(|&(i, a)| (Some(i), a)).collect())
                .collect(),
        )
    }

    pub fn with_uniform_cells(
        self,
        cols: usize,
        rows: usize,
        intended: ColorRgb,
        actual: ColorRgb,
    ) -> Self {
        self.with_cells(vec![vec![(Some(intended), actual); cols]; rows])
    }

    pub const fn with_origin(mut self, origin: u32) -> Self {
        self.origin = origin;
        self
    }

    /// Fixed screenshot size; defaults to the cells plus `origin` on
    /// every side.
    pub const fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Some((width, height));
        self
    }

    pub const fn with_order(mut self, order: ChannelOrder) -> Self {
        self.order = order;
        self
    }

    fn cols(&self) -> u32 {
        u32::try_from(self.cells.iter().map(Vec::len).max().unwrap_or(0)).unwrap()
    }

    fn rows(&self) -> u32 {
        u32::try_from(self.cells.len()).unwrap()
    }

    fn cell_origin(&self, col: u32, row: u32) -> (u32, u32) {
        (self.origin + col * self.cell, self.origin + row * self.cell)
    }

    fn preview_origin(&self, col: u32, row: u32) -> (u32, u32) {
        let inset = 1 + (self.cell - 1 - self.preview) / 2;
        let (ox, oy) = self.cell_origin(col, row);
        (ox + inset, oy + inset)
    }

    /// Center of the preview icon, where the estimator places the anchor.
    pub fn anchor(&self, col: u32, row: u32) -> Coordinate {
        let (px, py) = self.preview_origin(col, row);
        let half = (self.preview + 1) / 2;
        Coordinate::new(
            i32::try_from(px + half).unwrap(),
            i32::try_from(py + half).unwrap(),
        )
    }

    pub fn image(&self) -> RgbImage {
        let (width, height) = self.size.unwrap_or((
            self.origin * 2 + self.cols() * self.cell + 1,
            self.origin * 2 + self.rows() * self.cell + 1,
        ));
        let native = |c: ColorRgb| image::Rgb(c.to_native(self.order));
        let mut img = RgbImage::from_pixel(width, height, native(GRID));
        for (row, specs) in (0u32..).zip(&self.cells) {
            for (col, &(intended, actual)) in (0u32..).zip(specs) {
                let (ox, oy) = self.cell_origin(col, row);
                fill(&mut img, ox + 1, oy + 1, self.cell - 1, native(actual));
                if let Some(intended) = intended {
                    let (px, py) = self.preview_origin(col, row);
                    fill(&mut img, px, py, self.preview, native(OUTLINE));
                    fill(&mut img, px + 1, py + 1, self.preview - 2, native(intended));
                }
            }
        }
        img
    }

    pub fn screenshot(&self) -> Screenshot {
        Screenshot::new(self.image(), self.order).unwrap()
    }
}

/// A palette strip: square swatches on a light background.
pub fn palette(width: u32, height: u32, swatches: &[(u32, u32, u32, ColorRgb)]) -> Screenshot {
    let background = ColorRgb::new(230, 230, 230);
    let img = RgbImage::from_fn(width, height, |x, y| {
        let color = swatches
            .iter()
            .find(|&&(sx, sy, size, _)| {
                (sx..sx + size).contains(&x) && (sy..sy + size).contains(&y)
            })
            .map_or(background, |s| s.3);
        image::Rgb(color.into())
    });
    Screenshot::new(img, ChannelOrder::Rgb).unwrap()
}

fn fill(img: &mut RgbImage, x0: u32, y0: u32, size: u32, color: image::Rgb<u8>) {
    for y in y0..y0 + size {
        for x in x0..x0 + size {
            img.put_pixel(x, y, color);
        }
    }
}
