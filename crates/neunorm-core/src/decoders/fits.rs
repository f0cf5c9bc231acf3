//! Minimal FITS reader
//!
//! Reads single-HDU primary images: 2880-byte header records of 80-byte
//! cards, big-endian data, BITPIX 8/16/32/-32/-64, with BZERO/BSCALE
//! applied. Higher axes are accepted only when degenerate (length 1).

use std::fs;
use std::path::Path;

use crate::error::{NormalizationError, Result};
use crate::models::{FrameMetadata, ImageFrame, SourceDepth};

const RECORD_SIZE: usize = 2880;
const CARD_SIZE: usize = 80;

/// Decode the primary image of a FITS file into native counts
pub fn decode_fits(path: &Path) -> Result<(ImageFrame, FrameMetadata)> {
    let bytes = fs::read(path)
        .map_err(|e| NormalizationError::decode(path, format!("failed to open: {}", e)))?;

    if !bytes.starts_with(b"SIMPLE") {
        return Err(NormalizationError::decode(path, "not a FITS file"));
    }

    let (metadata, data_offset) = parse_header(path, &bytes)?;

    let bitpix = header_i64(path, &metadata, "BITPIX")?;
    let naxis = header_i64(path, &metadata, "NAXIS")?;
    if naxis < 2 {
        return Err(NormalizationError::decode(
            path,
            format!("expected a 2D image, got NAXIS = {}", naxis),
        ));
    }
    let width = header_i64(path, &metadata, "NAXIS1")?;
    let height = header_i64(path, &metadata, "NAXIS2")?;
    if width <= 0 || height <= 0 {
        return Err(NormalizationError::decode(
            path,
            format!("invalid image dimensions: {}x{}", width, height),
        ));
    }
    let width = width as usize;
    let height = height as usize;
    for axis in 3..=naxis {
        let len = header_i64(path, &metadata, &format!("NAXIS{}", axis))?;
        if len != 1 {
            return Err(NormalizationError::decode(
                path,
                format!("axis {} has length {}; only degenerate higher axes are supported", axis, len),
            ));
        }
    }

    let bzero = header_f64(&metadata, "BZERO").unwrap_or(0.0);
    let bscale = header_f64(&metadata, "BSCALE").unwrap_or(1.0);

    let bytes_per_value = (bitpix.unsigned_abs() / 8) as usize;
    let pixel_count = width * height;
    let needed = data_offset + pixel_count * bytes_per_value;
    if bytes.len() < needed {
        return Err(NormalizationError::decode(
            path,
            format!("truncated data: expected {} bytes, got {}", needed, bytes.len()),
        ));
    }

    let raw = &bytes[data_offset..needed];
    let scale = |v: f64| (bzero + bscale * v) as f32;
    let (data, depth): (Vec<f32>, SourceDepth) = match bitpix {
        8 => (raw.iter().map(|&v| scale(v as f64)).collect(), SourceDepth::U8),
        16 => {
            let data = raw
                .chunks_exact(2)
                .map(|c| scale(i16::from_be_bytes([c[0], c[1]]) as f64))
                .collect();
            // BZERO 32768 is the unsigned-16 convention
            let depth = if bzero == 32768.0 { SourceDepth::U16 } else { SourceDepth::I16 };
            (data, depth)
        }
        32 => {
            let data = raw
                .chunks_exact(4)
                .map(|c| scale(i32::from_be_bytes([c[0], c[1], c[2], c[3]]) as f64))
                .collect();
            let depth = if bzero == 2147483648.0 { SourceDepth::U32 } else { SourceDepth::I32 };
            (data, depth)
        }
        -32 => (
            raw.chunks_exact(4)
                .map(|c| scale(f32::from_be_bytes([c[0], c[1], c[2], c[3]]) as f64))
                .collect(),
            SourceDepth::F32,
        ),
        -64 => (
            raw.chunks_exact(8)
                .map(|c| {
                    scale(f64::from_be_bytes([
                        c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7],
                    ]))
                })
                .collect(),
            SourceDepth::F32,
        ),
        other => {
            return Err(NormalizationError::UnsupportedFormat(format!(
                "FITS BITPIX {} is not supported",
                other
            )))
        }
    };

    Ok((ImageFrame::new(width, height, data, depth), metadata))
}

/// Scan header cards up to END; returns all keyword records and the
/// record-aligned offset of the data block.
fn parse_header(path: &Path, bytes: &[u8]) -> Result<(FrameMetadata, usize)> {
    let mut metadata = FrameMetadata::default();
    let mut pos = 0;

    while pos + CARD_SIZE <= bytes.len() {
        let card = &bytes[pos..pos + CARD_SIZE];
        pos += CARD_SIZE;

        let keyword = String::from_utf8_lossy(&card[..8]).trim().to_string();
        if keyword == "END" {
            let data_offset = pos.div_ceil(RECORD_SIZE) * RECORD_SIZE;
            return Ok((metadata, data_offset));
        }
        if keyword.is_empty() || keyword == "COMMENT" || keyword == "HISTORY" {
            continue;
        }
        if card[8] == b'=' {
            let value_field = String::from_utf8_lossy(&card[10..]);
            // strip the trailing comment, then quotes around string values
            let value = value_field
                .split('/')
                .next()
                .unwrap_or("")
                .trim()
                .trim_matches('\'')
                .trim()
                .to_string();
            metadata.entries.insert(keyword, value);
        }
    }

    Err(NormalizationError::decode(path, "header has no END card"))
}

fn header_i64(path: &Path, metadata: &FrameMetadata, keyword: &str) -> Result<i64> {
    metadata
        .entries
        .get(keyword)
        .and_then(|v| v.parse::<i64>().ok())
        .ok_or_else(|| {
            NormalizationError::decode(path, format!("missing or invalid {} card", keyword))
        })
}

fn header_f64(metadata: &FrameMetadata, keyword: &str) -> Option<f64> {
    metadata.entries.get(keyword).and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(text: &str) -> Vec<u8> {
        let mut card = text.as_bytes().to_vec();
        card.resize(CARD_SIZE, b' ');
        card
    }

    fn build_fits(cards: &[&str], data: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for c in cards {
            bytes.extend(card(c));
        }
        bytes.extend(card("END"));
        bytes.resize(bytes.len().div_ceil(RECORD_SIZE) * RECORD_SIZE, b' ');
        bytes.extend_from_slice(data);
        bytes.resize(bytes.len().div_ceil(RECORD_SIZE) * RECORD_SIZE, 0);
        bytes
    }

    #[test]
    fn test_decode_i16_with_bzero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.fits");

        // unsigned-16 convention: raw i16 plus BZERO 32768
        let values: [i16; 4] = [-32768, -32767, 0, 32767];
        let mut data = Vec::new();
        for v in values {
            data.extend(v.to_be_bytes());
        }
        let bytes = build_fits(
            &[
                "SIMPLE  =                    T",
                "BITPIX  =                   16",
                "NAXIS   =                    2",
                "NAXIS1  =                    2",
                "NAXIS2  =                    2",
                "BZERO   =                32768",
                "BSCALE  =                    1",
            ],
            &data,
        );
        fs::write(&path, bytes).unwrap();

        let (frame, metadata) = decode_fits(&path).unwrap();
        assert_eq!(frame.width, 2);
        assert_eq!(frame.height, 2);
        assert_eq!(frame.depth, SourceDepth::U16);
        assert_eq!(frame.data, vec![0.0, 1.0, 32768.0, 65535.0]);
        assert_eq!(metadata.entries.get("BITPIX").unwrap(), "16");
    }

    #[test]
    fn test_decode_f32() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.fits");

        let mut data = Vec::new();
        for v in [1.5f32, 2.5, 3.5, 4.5, 5.5, 6.5] {
            data.extend(v.to_be_bytes());
        }
        let bytes = build_fits(
            &[
                "SIMPLE  =                    T",
                "BITPIX  =                  -32",
                "NAXIS   =                    2",
                "NAXIS1  =                    3",
                "NAXIS2  =                    2",
            ],
            &data,
        );
        fs::write(&path, bytes).unwrap();

        let (frame, _) = decode_fits(&path).unwrap();
        assert_eq!(frame.depth, SourceDepth::F32);
        assert_eq!(frame.get(1, 0), 4.5);
    }

    #[test]
    fn test_unsupported_bitpix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.fits");
        let bytes = build_fits(
            &[
                "SIMPLE  =                    T",
                "BITPIX  =                   64",
                "NAXIS   =                    2",
                "NAXIS1  =                    1",
                "NAXIS2  =                    1",
            ],
            &[0; 8],
        );
        fs::write(&path, bytes).unwrap();
        let err = decode_fits(&path).unwrap_err();
        assert!(matches!(err, NormalizationError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_negative_axis_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.fits");
        let bytes = build_fits(
            &[
                "SIMPLE  =                    T",
                "BITPIX  =                  -32",
                "NAXIS   =                    2",
                "NAXIS1  =                   -4",
                "NAXIS2  =                    4",
            ],
            &[0; 16],
        );
        fs::write(&path, bytes).unwrap();
        let err = decode_fits(&path).unwrap_err();
        assert!(matches!(err, NormalizationError::Decode { .. }));
    }

    #[test]
    fn test_truncated_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.fits");
        let mut bytes = build_fits(
            &[
                "SIMPLE  =                    T",
                "BITPIX  =                  -32",
                "NAXIS   =                    2",
                "NAXIS1  =                 4000",
                "NAXIS2  =                 4000",
            ],
            &[0; 16],
        );
        bytes.truncate(RECORD_SIZE + 16);
        fs::write(&path, bytes).unwrap();
        let err = decode_fits(&path).unwrap_err();
        assert!(matches!(err, NormalizationError::Decode { .. }));
    }
}
