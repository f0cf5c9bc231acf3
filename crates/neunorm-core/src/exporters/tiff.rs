//! TIFF writer, 32-bit float grayscale
//!
//! The working precision is written out unchanged so normalized
//! transmission values survive the round trip exactly.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use tiff::encoder::{colortype, TiffEncoder};

use crate::error::{NormalizationError, Result};
use crate::models::{FrameMetadata, ImageFrame};

/// Write one frame as a 32-bit float grayscale TIFF
pub fn write_tiff(frame: &ImageFrame, _metadata: &FrameMetadata, path: &Path) -> Result<()> {
    let file = File::create(path)
        .map_err(|e| NormalizationError::encode(path, format!("failed to create file: {}", e)))?;
    let writer = BufWriter::new(file);

    let mut encoder = TiffEncoder::new(writer)
        .map_err(|e| NormalizationError::encode(path, format!("failed to create encoder: {}", e)))?;

    encoder
        .write_image::<colortype::Gray32Float>(
            frame.width as u32,
            frame.height as u32,
            &frame.data,
        )
        .map_err(|e| NormalizationError::encode(path, format!("failed to write image: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceDepth;
    use tempfile::tempdir;

    #[test]
    fn test_write_creates_nonempty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.tif");
        let frame = ImageFrame::new(4, 2, vec![0.5; 8], SourceDepth::F32);

        write_tiff(&frame, &FrameMetadata::default(), &path).unwrap();

        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_write_invalid_path() {
        let frame = ImageFrame::new(2, 2, vec![0.5; 4], SourceDepth::F32);
        let result = write_tiff(
            &frame,
            &FrameMetadata::default(),
            Path::new("/nonexistent/directory/out.tif"),
        );
        assert!(matches!(result, Err(NormalizationError::Encode { .. })));
    }
}
