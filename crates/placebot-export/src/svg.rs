//! SVG debug overlays.
//!
//! Both documents use the screenshot's pixel grid as their coordinate
//! space (`viewBox="0 0 width height"`), so they can be laid over the
//! captured image in any viewer.
//!
//! - [`to_grid_svg`] draws every grid candidate, colored by how the
//!   estimator classified it: preview icons green, cells red, noise
//!   grey.
//! - [`to_palette_svg`] draws a 10 px box around each located swatch.
//!
//! Optional [`SvgMetadata`] embeds `<title>`, `<desc>`, and the analysis
//! configuration as JSON.

use svg::Document;
use svg::node::element::{Description, Element, Group, Rectangle, Title};
use svg::node::{Node, Text};

use placebot_vision::{
    BoxClass, ColorLocation, Coordinate, Dimensions, GridClassification, ScreenRegion,
};

/// Edge length of the marker drawn around a located swatch.
pub const SWATCH_MARKER_SIZE: u32 = 10;
#[allow(clippy::cast_possible_wrap)]
pub(crate) const MARKER_HALF: i32 = (SWATCH_MARKER_SIZE / 2) as i32;

/// Metadata to embed in the SVG document.
///
/// All fields are optional. Text values are XML-escaped automatically by
/// the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,

    /// Serialized `AnalysisConfig`, emitted inside
    /// `<metadata><placebot:analysis>`.
    pub config_json: Option<&'a str>,
}

/// Stroke color for each classification.
const fn class_stroke(class: BoxClass) -> &'static str {
    match class {
        BoxClass::Preview => "lime",
        BoxClass::Cell => "red",
        BoxClass::Noise => "grey",
    }
}

const fn class_id(class: BoxClass) -> &'static str {
    match class {
        BoxClass::Preview => "preview",
        BoxClass::Cell => "cells",
        BoxClass::Noise => "noise",
    }
}

fn document(dimensions: Dimensions, metadata: &SvgMetadata<'_>) -> Document {
    let (w, h) = (dimensions.width, dimensions.height);
    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }
    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }
    if let Some(config_json) = metadata.config_json {
        let mut analysis_el = Element::new("placebot:analysis");
        analysis_el.assign("xmlns:placebot", "https://github.com/placebot/placebot/ns/1");
        analysis_el.append(Text::new(config_json));
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(analysis_el);
        doc = doc.add(metadata_el);
    }
    doc
}

fn finish(doc: &Document) -> String {
    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

/// Serialize the grid classification as an SVG overlay.
///
/// One `<g>` per class (`preview`, `cells`, `noise`), each holding a
/// hollow `<rect>` per candidate box. Empty classes are omitted.
#[must_use]
pub fn to_grid_svg(
    classification: &GridClassification,
    dimensions: Dimensions,
    metadata: &SvgMetadata<'_>,
) -> String {
    let mut doc = document(dimensions, metadata);

    for class in [BoxClass::Noise, BoxClass::Cell, BoxClass::Preview] {
        let mut group = Group::new()
            .set("id", class_id(class))
            .set("fill", "none")
            .set("stroke", class_stroke(class))
            .set("stroke-width", 1);
        let mut empty = true;
        for b in classification.boxes.iter().filter(|b| b.class == class) {
            group = group.add(
                Rectangle::new()
                    .set("x", b.bounds.x)
                    .set("y", b.bounds.y)
                    .set("width", b.bounds.width)
                    .set("height", b.bounds.height),
            );
            empty = false;
        }
        if !empty {
            doc = doc.add(group);
        }
    }

    finish(&doc)
}

/// Serialize located swatches as an SVG overlay of the palette
/// screenshot.
///
/// `locations` are absolute screen coordinates; `region` is where the
/// palette screenshot was captured and is subtracted to get back to
/// image space. Each marker carries the color in a `data-color`
/// attribute.
#[must_use]
pub fn to_palette_svg(
    locations: &ColorLocation,
    region: &ScreenRegion,
    dimensions: Dimensions,
    metadata: &SvgMetadata<'_>,
) -> String {
    let mut doc = document(dimensions, metadata);
    let mut group = Group::new()
        .set("id", "swatches")
        .set("fill", "none")
        .set("stroke", "lime")
        .set("stroke-width", 2);

    for (color, &screen) in locations {
        let local = to_local(screen, region);
        let half = MARKER_HALF;
        group = group.add(
            Rectangle::new()
                .set("x", local.x.saturating_sub(half))
                .set("y", local.y.saturating_sub(half))
                .set("width", SWATCH_MARKER_SIZE)
                .set("height", SWATCH_MARKER_SIZE)
                .set("data-color", color.to_string()),
        );
    }
    if !locations.is_empty() {
        doc = doc.add(group);
    }

    finish(&doc)
}

/// Screen coordinate back to image space of `region`.
pub(crate) const fn to_local(screen: Coordinate, region: &ScreenRegion) -> Coordinate {
    Coordinate::new(
        screen.x.saturating_sub(region.x),
        screen.y.saturating_sub(region.y),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use placebot_vision::contour::BoundingBox;
    use placebot_vision::{ClassifiedBox, ColorRgb};

    use super::*;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    fn classification(boxes: Vec<ClassifiedBox>) -> GridClassification {
        GridClassification {
            contour_count: boxes.len(),
            fallback: false,
            preview_median: Some(6.0),
            expected_cell_size: Some(18.0),
            boxes,
        }
    }

    fn classified(x: u32, size: u32, class: BoxClass) -> ClassifiedBox {
        ClassifiedBox {
            bounds: BoundingBox::new(x, x, size, size),
            class,
        }
    }

    #[test]
    fn empty_classification_is_valid_svg() {
        let svg = to_grid_svg(&classification(Vec::new()), dims(100, 50), &SvgMetadata::default());
        assert!(svg.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(svg.contains(r#"viewBox="0 0 100 50""#));
        assert!(!svg.contains("<rect"));
        assert!(!svg.contains("<g"));
    }

    #[test]
    fn boxes_are_grouped_and_colored_by_class() {
        let svg = to_grid_svg(
            &classification(vec![
                classified(37, 8, BoxClass::Preview),
                classified(31, 20, BoxClass::Cell),
                classified(31, 40, BoxClass::Noise),
            ]),
            dims(100, 100),
            &SvgMetadata::default(),
        );
        assert!(svg.contains(r#"id="preview""#));
        assert!(svg.contains(r#"stroke="lime""#));
        assert!(svg.contains(r#"id="cells""#));
        assert!(svg.contains(r#"stroke="red""#));
        assert!(svg.contains(r#"id="noise""#));
        assert!(svg.contains(r#"stroke="grey""#));
        assert!(svg.contains(r#"width="40""#));
        assert_eq!(svg.matches("<rect").count(), 3);
    }

    #[test]
    fn preview_boxes_are_drawn_last() {
        let svg = to_grid_svg(
            &classification(vec![
                classified(37, 8, BoxClass::Preview),
                classified(31, 20, BoxClass::Cell),
            ]),
            dims(100, 100),
            &SvgMetadata::default(),
        );
        assert!(svg.find(r#"id="cells""#).unwrap() < svg.find(r#"id="preview""#).unwrap());
    }

    #[test]
    fn palette_markers_are_image_relative() {
        let mut locations = ColorLocation::new();
        locations.insert(ColorRgb::new(255, 0, 24), Coordinate::new(1065, 565));
        let region = ScreenRegion::new(1000, 500, 200, 200).unwrap();
        let svg = to_palette_svg(&locations, &region, dims(200, 200), &SvgMetadata::default());
        assert!(svg.contains(r#"x="60""#));
        assert!(svg.contains(r#"y="60""#));
        assert!(svg.contains(r#"width="10""#));
        assert!(svg.contains(r#"data-color="(255, 0, 24)""#));
    }

    #[test]
    fn no_locations_means_no_markers() {
        let region = ScreenRegion::new(0, 0, 10, 10).unwrap();
        let svg = to_palette_svg(&ColorLocation::new(), &region, dims(10, 10), &SvgMetadata::default());
        assert!(!svg.contains("<rect"));
    }

    #[test]
    fn metadata_is_embedded_and_escaped() {
        let meta = SvgMetadata {
            title: Some("canvas"),
            description: Some("cells < 5 & noise > 0"),
            config_json: Some(r#"{"fallback_cell_size":22}"#),
        };
        let svg = to_grid_svg(&classification(Vec::new()), dims(10, 10), &meta);
        assert!(svg.contains("<title>canvas</title>"));
        assert!(svg.contains("&lt;"));
        assert!(svg.contains("&amp;"));
        assert!(svg.contains("<metadata>"));
        assert!(svg.contains("placebot:analysis"));
        assert!(svg.contains("fallback_cell_size"));
    }

    #[test]
    fn to_local_subtracts_region_origin() {
        let region = ScreenRegion::new(-1920, 40, 10, 10).unwrap();
        assert_eq!(
            to_local(Coordinate::new(-1900, 50), &region),
            Coordinate::new(20, 10)
        );
    }
}
