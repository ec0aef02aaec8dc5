//! Paint target resolution: which cells still need a click for a color.

use crate::pixel_map::PixelMap;
use crate::types::{ColorRgb, Coordinate};

/// Per-channel color tolerance for the intended and actual checks.
///
/// A plain `u8` converts into a uniform tolerance, so callers can pass
/// a number and switch to [`Tolerance::split`] later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Tolerance {
    /// Tolerance when checking the intended (preview) color.
    pub intended: u8,
    /// Tolerance when checking the actual (painted) color.
    pub actual: u8,
}

impl Tolerance {
    /// Default tolerance for paint target resolution.
    pub const DEFAULT: Self = Self::uniform(5);

    /// The same tolerance for both checks.
    #[must_use]
    pub const fn uniform(tolerance: u8) -> Self {
        Self {
            intended: tolerance,
            actual: tolerance,
        }
    }

    /// Separate tolerances for the intended and actual checks.
    #[must_use]
    pub const fn split(intended: u8, actual: u8) -> Self {
        Self { intended, actual }
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u8> for Tolerance {
    fn from(tolerance: u8) -> Self {
        Self::uniform(tolerance)
    }
}

fn matches(sample: [u8; 3], target: [u8; 3], tolerance: u8) -> bool {
    sample
        .iter()
        .zip(target)
        .all(|(&s, t)| s.abs_diff(t) <= tolerance)
}

/// Anchors whose intended color matches `target` and whose actual color
/// does not, in pixel map order.
///
/// A cell that is already painted the target color is never returned,
/// so re-running after painting yields only the remaining work.
#[must_use]
pub fn resolve_paint_targets(
    map: &PixelMap,
    target: ColorRgb,
    tolerance: impl Into<Tolerance>,
) -> Vec<Coordinate> {
    let tolerance = tolerance.into();
    let native = target.to_native(map.order());
    map.iter()
        .filter(|cell| {
            matches(cell.intended, native, tolerance.intended)
                && !matches(cell.actual, native, tolerance.actual)
        })
        .map(|cell| cell.anchor)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::grid::GridGeometry;
    use crate::pixel_map::build_pixel_map;
    use crate::test_fixtures::{BLUE, CanvasFixture, RED, WHITE};
    use crate::types::{AnalysisConfig, ChannelOrder};

    fn map_for(fixture: &CanvasFixture, cols: u32, rows: u32) -> PixelMap {
        let anchors = (0..rows)
            .flat_map(|row| (0..cols).map(move |col| (col, row)))
            .map(|(col, row)| fixture.anchor(col, row))
            .collect();
        build_pixel_map(
            &fixture.screenshot(),
            &GridGeometry {
                cell_size: 20,
                anchors,
            },
            &AnalysisConfig::default(),
        )
    }

    #[test]
    fn three_diff_cases() {
        // intended red / actual white: needs paint
        // intended red / actual red: done
        // intended blue / actual white: other color
        let fixture = CanvasFixture::new(20, 7).with_cells(vec![vec![
            (Some(RED), WHITE),
            (Some(RED), RED),
            (Some(BLUE), WHITE),
        ]]);
        let map = map_for(&fixture, 3, 1);
        assert_eq!(
            resolve_paint_targets(&map, RED, 5),
            vec![fixture.anchor(0, 0)]
        );
        assert_eq!(
            resolve_paint_targets(&map, BLUE, 5),
            vec![fixture.anchor(2, 0)]
        );
    }

    #[test]
    fn other_intended_color_is_excluded_even_when_actual_matches() {
        // Painted red where blue is wanted: not red's work, only blue's.
        let fixture = CanvasFixture::new(20, 7).with_cells(vec![vec![
            (Some(RED), WHITE),
            (Some(BLUE), RED),
        ]]);
        let map = map_for(&fixture, 2, 1);
        assert_eq!(
            resolve_paint_targets(&map, RED, 5),
            vec![fixture.anchor(0, 0)]
        );
        assert_eq!(
            resolve_paint_targets(&map, BLUE, 5),
            vec![fixture.anchor(1, 0)]
        );
    }

    #[test]
    fn tolerance_bounds_are_inclusive() {
        let near_red = ColorRgb::new(250, 5, 29);
        let fixture = CanvasFixture::new(20, 7).with_cells(vec![vec![(Some(near_red), WHITE)]]);
        let map = map_for(&fixture, 1, 1);
        assert_eq!(resolve_paint_targets(&map, RED, 5).len(), 1);
        assert!(resolve_paint_targets(&map, RED, 4).is_empty());
    }

    #[test]
    fn split_tolerance_checks_independently() {
        // Actual differs by 3 on red: painted under tolerance 3, not under 2.
        let fixture = CanvasFixture::new(20, 7).with_cells(vec![vec![(Some(RED), ColorRgb::new(252, 0, 24))]]);
        let map = map_for(&fixture, 1, 1);
        assert!(resolve_paint_targets(&map, RED, Tolerance::split(0, 3)).is_empty());
        assert_eq!(resolve_paint_targets(&map, RED, Tolerance::split(0, 2)).len(), 1);
    }

    #[test]
    fn bgr_map_resolves_rgb_target() {
        let fixture = CanvasFixture::new(20, 7)
            .with_cells(vec![vec![(Some(RED), WHITE), (Some(BLUE), WHITE)]])
            .with_order(ChannelOrder::Bgr);
        let map = map_for(&fixture, 2, 1);
        assert_eq!(
            resolve_paint_targets(&map, RED, 5),
            vec![fixture.anchor(0, 0)]
        );
    }

    #[test]
    fn repainting_removes_targets() {
        let before = CanvasFixture::new(20, 7).with_uniform_cells(2, 1, RED, WHITE);
        let after = CanvasFixture::new(20, 7).with_uniform_cells(2, 1, RED, RED);
        assert_eq!(resolve_paint_targets(&map_for(&before, 2, 1), RED, 5).len(), 2);
        assert!(resolve_paint_targets(&map_for(&after, 2, 1), RED, 5).is_empty());
    }

    #[test]
    fn u8_converts_to_uniform() {
        assert_eq!(Tolerance::from(7), Tolerance::split(7, 7));
        assert_eq!(Tolerance::default(), Tolerance::uniform(5));
    }
}
