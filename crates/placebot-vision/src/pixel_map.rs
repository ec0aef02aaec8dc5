//! Pixel map construction: sample intended and actual colors per anchor.
//!
//! The anchor sits on the preview icon, so the sample there is the
//! color the user intends. The actual painted color is read near the
//! cell's top-left corner, `cell_size / 2` back from the anchor and
//! `sample_inset` pixels in, which lands on the cell fill outside the
//! icon.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::grid::GridGeometry;
use crate::types::{AnalysisConfig, ChannelOrder, ColorRgb, Coordinate, Screenshot};

/// Intended and actual color of one cell.
///
/// Samples are stored in the screenshot's native channel order; use
/// [`Self::intended_color`] and [`Self::actual_color`] for RGB values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelCellState {
    /// Image-relative anchor of the cell.
    pub anchor: Coordinate,
    /// Native-order sample at the anchor.
    pub intended: [u8; 3],
    /// Native-order sample at the cell's inset corner.
    pub actual: [u8; 3],
    /// Channel order of both samples.
    pub order: ChannelOrder,
}

impl PixelCellState {
    /// The intended color in RGB.
    #[must_use]
    pub const fn intended_color(&self) -> ColorRgb {
        self.order.to_rgb(self.intended)
    }

    /// The actual color in RGB.
    #[must_use]
    pub const fn actual_color(&self) -> ColorRgb {
        self.order.to_rgb(self.actual)
    }
}

/// Immutable snapshot of every sampled cell, keyed by anchor.
///
/// Iteration is in anchor order (by `x`, then `y`), so repeated runs on
/// the same input iterate identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelMap {
    cells: BTreeMap<Coordinate, PixelCellState>,
    order: ChannelOrder,
    cell_size: u32,
}

impl PixelMap {
    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// `true` if no anchor could be sampled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The cell at `anchor`, if it was sampled.
    #[must_use]
    pub fn get(&self, anchor: Coordinate) -> Option<&PixelCellState> {
        self.cells.get(&anchor)
    }

    /// All cells in anchor order.
    pub fn iter(&self) -> impl Iterator<Item = &PixelCellState> {
        self.cells.values()
    }

    /// All anchors in order.
    pub fn anchors(&self) -> impl Iterator<Item = Coordinate> + '_ {
        self.cells.keys().copied()
    }

    /// Channel order of the stored samples.
    #[must_use]
    pub const fn order(&self) -> ChannelOrder {
        self.order
    }

    /// Cell size the map was sampled with.
    #[must_use]
    pub const fn cell_size(&self) -> u32 {
        self.cell_size
    }
}

impl<'a> IntoIterator for &'a PixelMap {
    type Item = &'a PixelCellState;
    type IntoIter = std::collections::btree_map::Values<'a, Coordinate, PixelCellState>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.values()
    }
}

/// Sample every anchor of `geometry` in `screenshot`.
///
/// An anchor whose intended or actual sample falls outside the image is
/// left out of the map.
#[must_use]
pub fn build_pixel_map(
    screenshot: &Screenshot,
    geometry: &GridGeometry,
    config: &AnalysisConfig,
) -> PixelMap {
    let back = i32::try_from(geometry.cell_size / 2).unwrap_or(i32::MAX);
    let corner = config.sample_inset.saturating_sub(back);
    let order = screenshot.order();

    let cells: BTreeMap<Coordinate, PixelCellState> = geometry
        .anchors
        .iter()
        .filter_map(|&anchor| {
            let intended = screenshot.sample(anchor)?;
            let actual = screenshot.sample(anchor.offset(corner, corner))?;
            Some((
                anchor,
                PixelCellState {
                    anchor,
                    intended,
                    actual,
                    order,
                },
            ))
        })
        .collect();

    let dropped = geometry.anchors.len().saturating_sub(cells.len());
    if dropped > 0 {
        tracing::debug!(dropped, "anchors sampled out of bounds");
    }

    PixelMap {
        cells,
        order,
        cell_size: geometry.cell_size,
    }
}
