//! Grayscale TIFF decoding via the `tiff` crate

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult, Limits};

use crate::error::{NormalizationError, Result};
use crate::models::{FrameMetadata, ImageFrame, SourceDepth};

/// Decode a grayscale TIFF file into native counts
pub fn decode_tiff(path: &Path) -> Result<(ImageFrame, FrameMetadata)> {
    let file = File::open(path)
        .map_err(|e| NormalizationError::decode(path, format!("failed to open: {}", e)))?;

    // Radiographs from modern detectors can be large; lift the default caps
    let mut limits = Limits::default();
    limits.decoding_buffer_size = 1024 * 1024 * 1024;
    limits.ifd_value_size = 1024 * 1024 * 1024;
    limits.intermediate_buffer_size = 1024 * 1024 * 1024;

    let mut decoder = Decoder::new(BufReader::new(file))
        .map_err(|e| NormalizationError::decode(path, format!("not a TIFF file: {}", e)))?
        .with_limits(limits);

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| NormalizationError::decode(path, format!("failed to read dimensions: {}", e)))?;

    let color_type = decoder
        .colortype()
        .map_err(|e| NormalizationError::decode(path, format!("failed to read color type: {}", e)))?;

    let bit_depth = match color_type {
        tiff::ColorType::Gray(bits) => bits,
        other => {
            return Err(NormalizationError::UnsupportedFormat(format!(
                "only grayscale TIFF is supported, got {:?}",
                other
            )))
        }
    };

    let image_data = decoder
        .read_image()
        .map_err(|e| NormalizationError::decode(path, format!("failed to read image data: {}", e)))?;

    let (data, depth) = match image_data {
        DecodingResult::U8(buf) => (buf.iter().map(|&v| v as f32).collect(), SourceDepth::U8),
        DecodingResult::U16(buf) => (buf.iter().map(|&v| v as f32).collect(), SourceDepth::U16),
        DecodingResult::U32(buf) => (buf.iter().map(|&v| v as f32).collect(), SourceDepth::U32),
        DecodingResult::F32(buf) => (buf, SourceDepth::F32),
        DecodingResult::F64(buf) => (
            buf.iter().map(|&v| v as f32).collect::<Vec<f32>>(),
            SourceDepth::F32,
        ),
        _ => {
            return Err(NormalizationError::UnsupportedFormat(
                "unsupported TIFF sample format".to_string(),
            ))
        }
    };

    let expected = (width as usize) * (height as usize);
    if data.len() != expected {
        return Err(NormalizationError::decode(
            path,
            format!("buffer size mismatch: expected {}, got {}", expected, data.len()),
        ));
    }

    let mut metadata = FrameMetadata::default();
    metadata
        .entries
        .insert("bit_depth".to_string(), bit_depth.to_string());
    metadata
        .entries
        .insert("source_format".to_string(), "tiff".to_string());

    Ok((
        ImageFrame::new(width as usize, height as usize, data, depth),
        metadata,
    ))
}
