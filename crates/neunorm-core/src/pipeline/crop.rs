//! Region cropping
//!
//! Crops every stored sequence (sample, OB, DF if present, normalized
//! if present) to one inclusive rectangle. All sequences are cropped
//! first and committed together, so a failure leaves everything at the
//! original size. The cached DF average and OB aggregate keep their
//! pre-crop dimensions.

use crate::error::{NormalizationError, Result};
use crate::models::{ImageFrame, Roi, Shape};

use super::{roi, Normalization};

impl Normalization {
    /// Crop all stored sequences to `roi`
    ///
    /// Requires sample and OB data. Sticky like the other stages:
    /// returns `false` without touching anything when a crop already
    /// committed and `force` is not set.
    pub fn crop(&mut self, roi: &Roi, force: bool) -> Result<bool> {
        if self.sample.is_empty() || self.ob.is_empty() {
            return Err(NormalizationError::MissingData(
                "sample and ob data must be loaded before cropping".to_string(),
            ));
        }
        if !force && self.status.crop {
            return Ok(false);
        }

        let shape = self.sample.frames()[0].shape();
        roi::validate_single(roi, shape)?;

        let cropped_sample = crop_frames(self.sample.frames(), roi)?;
        let cropped_ob = crop_frames(self.ob.frames(), roi)?;
        let cropped_df = if self.df.is_empty() {
            None
        } else {
            Some(crop_frames(self.df.frames(), roi)?)
        };
        let cropped_normalized = match &self.normalized {
            Some(frames) => Some(crop_frames(frames, roi)?),
            None => None,
        };

        let new_shape = Shape {
            width: roi.width(),
            height: roi.height(),
        };
        self.sample.replace_frames(cropped_sample);
        self.sample.set_shape(new_shape);
        self.ob.replace_frames(cropped_ob);
        self.ob.set_shape(new_shape);
        if let Some(frames) = cropped_df {
            self.df.replace_frames(frames);
            self.df.set_shape(new_shape);
        }
        if let Some(frames) = cropped_normalized {
            self.normalized = Some(frames);
        }
        self.status.crop = true;
        Ok(true)
    }
}

/// Crop each frame to the inclusive rectangle, keeping the source depth
fn crop_frames(frames: &[ImageFrame], roi: &Roi) -> Result<Vec<ImageFrame>> {
    let mut cropped = Vec::with_capacity(frames.len());
    for frame in frames {
        if roi.x1 >= frame.width || roi.y1 >= frame.height {
            return Err(NormalizationError::InvalidRoi(format!(
                "crop region ({}, {}, {}, {}) exceeds the {} frame",
                roi.x0,
                roi.y0,
                roi.x1,
                roi.y1,
                frame.shape()
            )));
        }
        let mut data = Vec::with_capacity(roi.pixel_count());
        for y in roi.y0..=roi.y1 {
            let start = y * frame.width + roi.x0;
            data.extend_from_slice(&frame.data[start..start + roi.width()]);
        }
        cropped.push(ImageFrame::new(roi.width(), roi.height(), data, frame.depth));
    }
    Ok(cropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceDepth;

    #[test]
    fn test_crop_frames_extracts_inclusive_window() {
        let frame = ImageFrame::from_rows(
            vec![
                vec![1.0, 2.0, 3.0, 4.0],
                vec![5.0, 6.0, 7.0, 8.0],
                vec![9.0, 10.0, 11.0, 12.0],
            ],
            SourceDepth::U16,
        );
        let roi = Roi::new(1, 0, 2, 1).unwrap();
        let cropped = crop_frames(&[frame], &roi).unwrap();
        assert_eq!(cropped[0].shape(), Shape { width: 2, height: 2 });
        assert_eq!(cropped[0].data, vec![2.0, 3.0, 6.0, 7.0]);
        assert_eq!(cropped[0].depth, SourceDepth::U16);
    }

    #[test]
    fn test_crop_frames_rejects_out_of_bounds() {
        let frame = ImageFrame::from_rows(vec![vec![1.0, 2.0]], SourceDepth::U16);
        let roi = Roi::new(0, 0, 2, 0).unwrap();
        assert!(crop_frames(&[frame], &roi).is_err());
    }
}
