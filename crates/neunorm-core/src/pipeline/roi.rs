//! ROI validation and intensity correction factors
//!
//! A correction factor is the pooled mean over the selected regions:
//! total counts divided by total pixel count. For a list of regions the
//! sums pool across all members before dividing; this is not the same
//! as averaging per-region means.

use crate::error::{NormalizationError, Result};
use crate::models::{ImageFrame, Roi, RoiSelection, Shape};

/// Check that every member of the selection fits into `shape`
pub fn validate(selection: &RoiSelection, shape: Shape) -> Result<()> {
    for roi in selection.as_slice() {
        validate_single(roi, shape)?;
    }
    Ok(())
}

/// Check that one ROI fits into `shape` (inclusive bounds)
pub fn validate_single(roi: &Roi, shape: Shape) -> Result<()> {
    if roi.x1 >= shape.width || roi.y1 >= shape.height {
        return Err(NormalizationError::InvalidRoi(format!(
            "roi ({}, {}, {}, {}) does not fit into the {} sample image",
            roi.x0, roi.y0, roi.x1, roi.y1, shape
        )));
    }
    Ok(())
}

/// Pooled mean over the selected regions of one frame
///
/// Fails with `InvalidRoi` when a region exceeds the frame and
/// `DegenerateRoi` when the selection covers zero pixels (an empty
/// list).
pub fn region_correction_factor(frame: &ImageFrame, selection: &RoiSelection) -> Result<f32> {
    validate(selection, frame.shape())?;

    let mut total_counts = 0.0f64;
    let mut total_pixels = 0usize;

    for roi in selection.as_slice() {
        total_pixels += roi.pixel_count();
        for y in roi.y0..=roi.y1 {
            for x in roi.x0..=roi.x1 {
                total_counts += frame.get(y, x) as f64;
            }
        }
    }

    if total_pixels == 0 {
        return Err(NormalizationError::DegenerateRoi);
    }

    Ok((total_counts / total_pixels as f64) as f32)
}

/// Divide each frame by its own pooled correction factor
pub fn apply_correction(frames: &[ImageFrame], selection: &RoiSelection) -> Result<Vec<ImageFrame>> {
    let mut corrected = Vec::with_capacity(frames.len());
    for frame in frames {
        let factor = region_correction_factor(frame, selection)?;
        let data = frame.data.iter().map(|&v| v / factor).collect();
        corrected.push(ImageFrame::new(frame.width, frame.height, data, frame.depth));
    }
    Ok(corrected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceDepth;

    fn frame_4x4() -> ImageFrame {
        ImageFrame::from_rows(
            vec![
                vec![1.0, 2.0, 3.0, 4.0],
                vec![5.0, 6.0, 7.0, 8.0],
                vec![9.0, 10.0, 11.0, 12.0],
                vec![13.0, 14.0, 15.0, 16.0],
            ],
            SourceDepth::F32,
        )
    }

    #[test]
    fn test_single_pixel_roi_factor_is_pixel_value() {
        let roi = Roi::new(2, 1, 2, 1).unwrap();
        let factor = region_correction_factor(&frame_4x4(), &roi.into()).unwrap();
        assert_eq!(factor, 7.0);
    }

    #[test]
    fn test_factor_is_pooled_sum_over_pooled_count() {
        let roi = Roi::new(0, 0, 1, 1).unwrap();
        let factor = region_correction_factor(&frame_4x4(), &roi.into()).unwrap();
        assert_eq!(factor, (1.0 + 2.0 + 5.0 + 6.0) / 4.0);
    }

    #[test]
    fn test_list_factor_pools_not_averages() {
        // region a: single pixel 1.0; region b: 2x2 of {11, 12, 15, 16}
        let a = Roi::new(0, 0, 0, 0).unwrap();
        let b = Roi::new(2, 2, 3, 3).unwrap();
        let selection: RoiSelection = vec![a, b].into();
        let factor = region_correction_factor(&frame_4x4(), &selection).unwrap();

        let pooled = (1.0 + 11.0 + 12.0 + 15.0 + 16.0) / 5.0;
        let mean_of_means = (1.0 + (11.0 + 12.0 + 15.0 + 16.0) / 4.0) / 2.0;
        assert_eq!(factor, pooled);
        assert_ne!(factor, mean_of_means);
    }

    #[test]
    fn test_factor_rejects_out_of_bounds_roi() {
        let roi = Roi::new(0, 0, 4, 1).unwrap();
        let err = region_correction_factor(&frame_4x4(), &roi.into()).unwrap_err();
        assert!(matches!(err, NormalizationError::InvalidRoi(_)));
    }

    #[test]
    fn test_empty_list_is_degenerate() {
        let selection: RoiSelection = Vec::new().into();
        let err = region_correction_factor(&frame_4x4(), &selection).unwrap_err();
        assert!(matches!(err, NormalizationError::DegenerateRoi));
    }

    #[test]
    fn test_validate_rejects_out_of_bounds() {
        let shape = Shape { width: 4, height: 4 };
        let roi = Roi::new(0, 0, 4, 1).unwrap();
        assert!(validate(&roi.into(), shape).is_err());

        let inside = Roi::new(0, 0, 3, 3).unwrap();
        let outside = Roi::new(1, 1, 3, 4).unwrap();
        assert!(validate(&vec![inside, outside].into(), shape).is_err());
        assert!(validate(&RoiSelection::from(inside), shape).is_ok());
    }

    #[test]
    fn test_apply_correction_divides_each_frame_by_own_factor() {
        let bright = ImageFrame::from_rows(vec![vec![10.0, 10.0]], SourceDepth::F32);
        let dim = ImageFrame::from_rows(vec![vec![2.0, 4.0]], SourceDepth::F32);
        let roi = Roi::new(0, 0, 1, 0).unwrap();

        let corrected = apply_correction(&[bright, dim], &roi.into()).unwrap();
        assert_eq!(corrected[0].data, vec![1.0, 1.0]);
        assert_eq!(corrected[1].data, vec![2.0 / 3.0, 4.0 / 3.0]);
    }
}
