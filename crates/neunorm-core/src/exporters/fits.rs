//! Minimal FITS writer, BITPIX -32
//!
//! Writes a single primary HDU: a padded 2880-byte header record
//! followed by big-endian f32 data padded to a record boundary.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{NormalizationError, Result};
use crate::models::{FrameMetadata, ImageFrame};

const RECORD_SIZE: usize = 2880;
const CARD_SIZE: usize = 80;

fn push_card(header: &mut Vec<u8>, text: String) {
    let mut card = text.into_bytes();
    debug_assert!(card.len() <= CARD_SIZE);
    card.resize(CARD_SIZE, b' ');
    header.extend(card);
}

/// Write one frame as a 32-bit float FITS primary image
pub fn write_fits(frame: &ImageFrame, _metadata: &FrameMetadata, path: &Path) -> Result<()> {
    let file = File::create(path)
        .map_err(|e| NormalizationError::encode(path, format!("failed to create file: {}", e)))?;
    let mut writer = BufWriter::new(file);

    let mut header = Vec::with_capacity(RECORD_SIZE);
    push_card(
        &mut header,
        format!("{:<8}= {:>20} / file conforms to FITS standard", "SIMPLE", "T"),
    );
    push_card(
        &mut header,
        format!("{:<8}= {:>20} / IEEE 32-bit float", "BITPIX", -32),
    );
    push_card(&mut header, format!("{:<8}= {:>20}", "NAXIS", 2));
    push_card(&mut header, format!("{:<8}= {:>20}", "NAXIS1", frame.width));
    push_card(&mut header, format!("{:<8}= {:>20}", "NAXIS2", frame.height));
    push_card(&mut header, "END".to_string());
    header.resize(header.len().div_ceil(RECORD_SIZE) * RECORD_SIZE, b' ');

    writer
        .write_all(&header)
        .map_err(|e| NormalizationError::encode(path, format!("failed to write header: {}", e)))?;

    let mut data = Vec::with_capacity(frame.data.len() * 4);
    for &value in &frame.data {
        data.extend(value.to_be_bytes());
    }
    data.resize(data.len().div_ceil(RECORD_SIZE) * RECORD_SIZE, 0);

    writer
        .write_all(&data)
        .map_err(|e| NormalizationError::encode(path, format!("failed to write data: {}", e)))?;
    writer
        .flush()
        .map_err(|e| NormalizationError::encode(path, format!("failed to flush: {}", e)))?;

    Ok(())
}
