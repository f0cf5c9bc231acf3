//! Image decoders for the supported format family
//!
//! TIFF and FITS are mandatory; HDF-family extensions are recognized but
//! explicitly unsupported. Decoded data keeps native counts in f32 and
//! records the source numeric type for the gamma filter.

mod fits;
mod tiff;

use std::path::Path;

use crate::error::{NormalizationError, Result};
use crate::models::{FrameMetadata, ImageFrame};

pub use fits::decode_fits;
pub use tiff::decode_tiff;

/// Decode one image from a file path
///
/// Fails with `FileNotFound` when the path is not a regular file and
/// `UnsupportedFormat` for extensions outside the format family.
pub fn decode_image(path: &Path) -> Result<(ImageFrame, FrameMetadata)> {
    if !path.is_file() {
        return Err(NormalizationError::FileNotFound(path.to_path_buf()));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .ok_or_else(|| {
            NormalizationError::UnsupportedFormat(format!(
                "no file extension on {}",
                path.display()
            ))
        })?;

    match extension.as_str() {
        "tif" | "tiff" => decode_tiff(path),
        "fits" | "fit" => decode_fits(path),
        "hdf" | "h4" | "hdf4" | "he2" | "h5" | "hdf5" | "he5" => Err(
            NormalizationError::UnsupportedFormat(format!("HDF is not supported: {}", extension)),
        ),
        other => Err(NormalizationError::UnsupportedFormat(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let err = decode_image(Path::new("/nonexistent/image.tif")).unwrap_err();
        assert!(matches!(err, NormalizationError::FileNotFound(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.jpg");
        std::fs::write(&path, b"not an image").unwrap();
        let err = decode_image(&path).unwrap_err();
        assert!(matches!(err, NormalizationError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_hdf_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stack.h5");
        std::fs::write(&path, b"\x89HDF").unwrap();
        let err = decode_image(&path).unwrap_err();
        assert!(matches!(err, NormalizationError::UnsupportedFormat(msg) if msg.contains("HDF")));
    }
}
