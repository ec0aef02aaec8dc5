//! Contour extraction: bounding boxes from edge maps, external shapes
//! from color masks.
//!
//! Both use Suzuki-Abe border following via
//! [`imageproc::contours::find_contours`]. Grid estimation looks at
//! every border (outer and hole) because a cell outline shows up as the
//! hole of the grid-line network while a preview icon shows up as its
//! own small component. Palette location only wants the top-level
//! outer borders of a mask, the equivalent of an external-only
//! retrieval mode.

use geo::{Area, Centroid, Coord, LineString, Polygon};
use image::GrayImage;
use imageproc::contours::{BorderType, Contour};
use serde::{Deserialize, Serialize};

use crate::types::Coordinate;

/// Axis-aligned bounding box of a traced border, in image pixels.
///
/// `width` and `height` are inclusive pixel extents (`max - min + 1`),
/// so a border made of a single pixel is 1x1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Inclusive width in pixels.
    pub width: u32,
    /// Inclusive height in pixels.
    pub height: u32,
}

impl BoundingBox {
    /// Create a new bounding box.
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest box containing every point, or `None` for no points.
    #[must_use]
    pub fn enclosing(points: &[imageproc::point::Point<u32>]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }

    /// Integer center `(x + width/2, y + height/2)`.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn center(&self) -> Coordinate {
        // Image dimensions never approach i32::MAX.
        Coordinate::new(
            (self.x + self.width / 2) as i32,
            (self.y + self.height / 2) as i32,
        )
    }

    /// Width divided by height.
    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

/// Trace every border (outer and hole) in a binary image and return
/// their bounding boxes, in tracing order.
#[must_use]
pub fn bounding_boxes(edges: &GrayImage) -> Vec<BoundingBox> {
    let contours: Vec<Contour<u32>> = imageproc::contours::find_contours(edges);
    contours
        .iter()
        .filter_map(|c| BoundingBox::enclosing(&c.points))
        .collect()
}

/// A top-level outer border of a binary mask, as a closed polygon
/// through the border pixel centers.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalContour {
    polygon: Polygon<f64>,
}

impl ExternalContour {
    fn from_points(points: &[imageproc::point::Point<u32>]) -> Self {
        let ring: Vec<Coord<f64>> = points
            .iter()
            .map(|p| Coord {
                x: f64::from(p.x),
                y: f64::from(p.y),
            })
            .collect();
        Self {
            polygon: Polygon::new(LineString::from(ring), vec![]),
        }
    }

    /// Enclosed area in px² (shoelace formula over the border pixels).
    ///
    /// Single-pixel and line-shaped blobs have zero area.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.polygon.unsigned_area()
    }

    /// Area-weighted centroid `(m10/m00, m01/m00)`, or `None` for an
    /// empty contour.
    #[must_use]
    pub fn centroid(&self) -> Option<(f64, f64)> {
        self.polygon.centroid().map(|p| (p.x(), p.y()))
    }
}

/// Trace the top-level outer borders of a binary mask.
///
/// Borders nested inside another component's hole are skipped, as are
/// all hole borders.
#[must_use]
pub fn external_contours(mask: &GrayImage) -> Vec<ExternalContour> {
    let contours: Vec<Contour<u32>> = imageproc::contours::find_contours(mask);
    contours
        .iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter(|c| !c.points.is_empty())
        .map(|c| ExternalContour::from_points(&c.points))
        .collect()
}
