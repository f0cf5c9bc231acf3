//! Gamma pixel filtering
//!
//! A gamma pixel is a sensor pixel corrupted by a high-energy event,
//! appearing saturated. Both filters replace it with the mean of its
//! 8-neighborhood computed by a zero-padded 3x3 convolution: center
//! weight 0, the eight neighbors 1/8 each. Out-of-bounds neighbors
//! contribute 0 while the divisor stays 8, which biases edge and corner
//! replacements downward; existing pipelines depend on exactly this.

use crate::error::{NormalizationError, Result};
use crate::models::ImageFrame;
use crate::verbose_println;

/// Saturation margin below the source type maximum
const SATURATION_MARGIN: f32 = 5.0;

/// Repair pixels within 5 counts of the source type maximum
///
/// When the source numeric type is unknown the frame is returned
/// unchanged; that is a soft fallback, not an error. Returns a new
/// frame, never mutates the input.
pub fn auto_filter(frame: &ImageFrame) -> Result<ImageFrame> {
    if frame.data.is_empty() {
        return Err(NormalizationError::EmptyInput);
    }

    let Some(type_max) = frame.depth.max_value() else {
        verbose_println!("[neunorm] unknown source type, skipping auto gamma filter");
        return Ok(frame.clone());
    };
    let threshold = type_max - SATURATION_MARGIN;

    let convolved = neighbor_mean(frame);
    let data = frame
        .data
        .iter()
        .zip(&convolved)
        .map(|(&value, &repaired)| if value > threshold { repaired } else { value })
        .collect();

    Ok(ImageFrame::new(frame.width, frame.height, data, frame.depth))
}

/// Repair pixels whose value times `threshold` exceeds the frame mean
///
/// `threshold` is a caller-supplied coefficient between 0 and 1; the
/// replacement rule is the same 8-neighborhood mean as `auto_filter`.
pub fn manual_filter(frame: &ImageFrame, threshold: f32) -> Result<ImageFrame> {
    if frame.data.is_empty() {
        return Err(NormalizationError::EmptyInput);
    }

    let mean_counts = frame.mean();
    let convolved = neighbor_mean(frame);
    let data = frame
        .data
        .iter()
        .zip(&convolved)
        .map(|(&value, &repaired)| {
            if threshold * value > mean_counts {
                repaired
            } else {
                value
            }
        })
        .collect();

    Ok(ImageFrame::new(frame.width, frame.height, data, frame.depth))
}

/// Zero-padded 3x3 convolution with center weight 0 and 1/8 neighbors
fn neighbor_mean(frame: &ImageFrame) -> Vec<f32> {
    let width = frame.width as isize;
    let height = frame.height as isize;
    let mut out = vec![0.0f32; frame.data.len()];

    for y in 0..height {
        for x in 0..width {
            let mut sum = 0.0f32;
            for dy in -1..=1 {
                for dx in -1..=1 {
                    if dy == 0 && dx == 0 {
                        continue;
                    }
                    let ny = y + dy;
                    let nx = x + dx;
                    if ny >= 0 && ny < height && nx >= 0 && nx < width {
                        sum += frame.data[(ny * width + nx) as usize];
                    }
                }
            }
            out[(y * width + x) as usize] = sum / 8.0;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceDepth;

    #[test]
    fn test_auto_filter_idempotent_below_ceiling() {
        let frame = ImageFrame::from_rows(
            vec![
                vec![100.0, 200.0, 300.0],
                vec![400.0, 500.0, 600.0],
                vec![700.0, 800.0, 900.0],
            ],
            SourceDepth::U16,
        );
        let filtered = auto_filter(&frame).unwrap();
        assert_eq!(filtered.data, frame.data);
    }

    #[test]
    fn test_auto_filter_repairs_saturated_center() {
        let frame = ImageFrame::from_rows(
            vec![
                vec![8.0, 8.0, 8.0],
                vec![8.0, 65535.0, 8.0],
                vec![8.0, 8.0, 8.0],
            ],
            SourceDepth::U16,
        );
        let filtered = auto_filter(&frame).unwrap();
        // eight in-bounds neighbors of 8.0 each
        assert_eq!(filtered.get(1, 1), 8.0);
        assert_eq!(filtered.get(0, 0), 8.0);
    }

    #[test]
    fn test_auto_filter_corner_bias() {
        // a saturated corner has only three in-bounds neighbors but the
        // divisor stays 8, so the replacement is biased downward
        let frame = ImageFrame::from_rows(
            vec![vec![65535.0, 8.0], vec![8.0, 8.0]],
            SourceDepth::U16,
        );
        let filtered = auto_filter(&frame).unwrap();
        assert_eq!(filtered.get(0, 0), 3.0); // (8 + 8 + 8) / 8
    }

    #[test]
    fn test_auto_filter_never_mutates_input() {
        let frame = ImageFrame::from_rows(vec![vec![65535.0, 1.0]], SourceDepth::U16);
        let _ = auto_filter(&frame).unwrap();
        assert_eq!(frame.get(0, 0), 65535.0);
    }

    #[test]
    fn test_auto_filter_skips_unknown_depth() {
        let frame = ImageFrame::from_rows(vec![vec![1e30, 2.0]], SourceDepth::Unknown);
        let filtered = auto_filter(&frame).unwrap();
        assert_eq!(filtered.data, frame.data);
    }

    #[test]
    fn test_auto_filter_float_frames_pass_through() {
        // f32 max minus 5 is still f32 max, so nothing qualifies
        let frame = ImageFrame::from_rows(vec![vec![1e30, 2.0]], SourceDepth::F32);
        let filtered = auto_filter(&frame).unwrap();
        assert_eq!(filtered.data, frame.data);
    }

    #[test]
    fn test_auto_filter_empty_frame() {
        let frame = ImageFrame::new(0, 0, Vec::new(), SourceDepth::U16);
        assert!(matches!(
            auto_filter(&frame),
            Err(NormalizationError::EmptyInput)
        ));
    }

    #[test]
    fn test_manual_filter_uses_threshold_against_mean() {
        // mean = (1*8 + 100) / 9 = 12; 0.5 * 100 > 12, nothing else qualifies
        let frame = ImageFrame::from_rows(
            vec![
                vec![1.0, 1.0, 1.0],
                vec![1.0, 100.0, 1.0],
                vec![1.0, 1.0, 1.0],
            ],
            SourceDepth::U16,
        );
        let filtered = manual_filter(&frame, 0.5).unwrap();
        assert_eq!(filtered.get(1, 1), 1.0);
        assert_eq!(filtered.get(0, 1), 1.0);
    }

    #[test]
    fn test_manual_filter_zero_threshold_is_noop() {
        let frame = ImageFrame::from_rows(vec![vec![5.0, 50.0, 500.0]], SourceDepth::U16);
        let filtered = manual_filter(&frame, 0.0).unwrap();
        assert_eq!(filtered.data, frame.data);
    }
}
