//! Raster debug overlays: the captured screenshot with the analysis
//! drawn on top, ready to save as PNG.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use placebot_vision::{
    BoxClass, ChannelOrder, ColorLocation, GridClassification, ScreenRegion, Screenshot,
};

use crate::ExportError;
use crate::svg::{MARKER_HALF, SWATCH_MARKER_SIZE, to_local};

const PREVIEW: Rgb<u8> = Rgb([0, 255, 0]);
const CELL: Rgb<u8> = Rgb([255, 0, 0]);
const NOISE: Rgb<u8> = Rgb([128, 128, 128]);

/// Copy of the screenshot in RGB order.
fn rgb_copy(screenshot: &Screenshot) -> RgbImage {
    let mut img = screenshot.pixels().clone();
    if screenshot.order() == ChannelOrder::Bgr {
        for pixel in img.pixels_mut() {
            pixel.0.swap(0, 2);
        }
    }
    img
}

/// Draw every grid candidate onto a copy of the canvas screenshot:
/// preview icons green, cells red, noise grey.
#[must_use = "returns the rendered overlay"]
pub fn render_grid_overlay(canvas: &Screenshot, classification: &GridClassification) -> RgbImage {
    let mut img = rgb_copy(canvas);
    for class in [BoxClass::Noise, BoxClass::Cell, BoxClass::Preview] {
        let color = match class {
            BoxClass::Preview => PREVIEW,
            BoxClass::Cell => CELL,
            BoxClass::Noise => NOISE,
        };
        for b in classification.boxes.iter().filter(|b| b.class == class) {
            let (Ok(x), Ok(y)) = (i32::try_from(b.bounds.x), i32::try_from(b.bounds.y)) else {
                continue;
            };
            let rect = Rect::at(x, y).of_size(b.bounds.width.max(1), b.bounds.height.max(1));
            draw_hollow_rect_mut(&mut img, rect, color);
        }
    }
    img
}

/// Draw a two-pixel green box around each located swatch on a copy of
/// the palette screenshot.
#[must_use = "returns the rendered overlay"]
pub fn render_palette_overlay(
    palette: &Screenshot,
    locations: &ColorLocation,
    region: &ScreenRegion,
) -> RgbImage {
    let mut img = rgb_copy(palette);
    for &screen in locations.values() {
        let local = to_local(screen, region);
        let outer = Rect::at(local.x - MARKER_HALF, local.y - MARKER_HALF)
            .of_size(SWATCH_MARKER_SIZE + 1, SWATCH_MARKER_SIZE + 1);
        let inner = Rect::at(local.x - MARKER_HALF + 1, local.y - MARKER_HALF + 1)
            .of_size(SWATCH_MARKER_SIZE - 1, SWATCH_MARKER_SIZE - 1);
        draw_hollow_rect_mut(&mut img, outer, PREVIEW);
        draw_hollow_rect_mut(&mut img, inner, PREVIEW);
    }
    img
}

/// Encode an overlay as PNG bytes.
///
/// # Errors
///
/// Returns [`ExportError::Encode`] if the PNG encoder fails.
pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(
        encoder,
        img.as_raw(),
        img.width(),
        img.height(),
        image::ExtendedColorType::Rgb8,
    )?;
    Ok(buf)
}
