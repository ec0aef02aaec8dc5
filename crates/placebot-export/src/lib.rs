//! placebot-export: Debug artifact renderers (sans-IO)
//!
//! Turns analysis results into things a person can look at: SVG
//! overlays that line up with the captured screenshots, and copies of
//! the screenshots with the same markings drawn in. Nothing here
//! touches the filesystem; callers decide where artifacts go.

pub mod overlay;
pub mod svg;

pub use overlay::{encode_png, render_grid_overlay, render_palette_overlay};
pub use svg::{SvgMetadata, to_grid_svg, to_palette_svg};

/// Errors that can occur while producing an artifact.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// PNG encoding of a rendered overlay failed.
    #[error("failed to encode overlay image: {0}")]
    Encode(#[from] image::ImageError),
}
