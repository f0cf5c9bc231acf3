//! Image writers for the supported output formats

mod fits;
mod tiff;

use std::path::Path;

use crate::error::Result;
use crate::models::{ExportFormat, FrameMetadata, ImageFrame};

pub use fits::write_fits;
pub use tiff::write_tiff;

/// Write one frame in the requested format
pub fn write_frame(
    frame: &ImageFrame,
    metadata: &FrameMetadata,
    path: &Path,
    format: ExportFormat,
) -> Result<()> {
    match format {
        ExportFormat::Tiff => write_tiff(frame, metadata, path),
        ExportFormat::Fits => write_fits(frame, metadata, path),
    }
}
