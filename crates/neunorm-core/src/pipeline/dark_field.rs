//! Dark field correction
//!
//! Subtracts the averaged dark field from every sample and OB frame.
//! The DF average is computed once and cached: each DF frame is auto
//! gamma filtered, then the frames are averaged element-wise into a
//! single reference.

use crate::error::{NormalizationError, Result};
use crate::models::{ImageFrame, SourceDepth};

use super::{gamma, Normalization};

impl Normalization {
    /// Subtract the dark field average from sample and OB data
    ///
    /// Runs once per instance unless `force` is set; returns whether it
    /// ran. A missing dark field is a no-op, not an error. Both
    /// categories are corrected before either is committed, so a
    /// failure leaves the stored data untouched and the stage flag
    /// clear.
    pub fn df_correction(&mut self, force: bool) -> Result<bool> {
        if !force && self.status.df_correction {
            return Ok(false);
        }

        if self.df.is_empty() {
            self.status.df_correction = true;
            return Ok(true);
        }

        let reference = match &self.df_average {
            Some(average) => average.clone(),
            None => {
                // a lone df frame is used as-is; a stack is gamma
                // filtered and averaged into one reference
                let average = if self.df.len() > 1 {
                    let filtered = self
                        .df
                        .frames()
                        .iter()
                        .map(gamma::auto_filter)
                        .collect::<Result<Vec<_>>>()?;
                    mean_stack(&filtered)
                } else {
                    self.df.frames()[0].clone()
                };
                self.df_average = Some(average.clone());
                average
            }
        };
        let df_shape = self.df.frames()[0].shape();

        let corrected_sample = if self.sample.is_empty() {
            None
        } else {
            let shape = self.sample.frames()[0].shape();
            if shape != df_shape {
                return Err(NormalizationError::shape_mismatch("dark field", shape, df_shape));
            }
            Some(subtract_all(self.sample.frames(), &reference))
        };

        let corrected_ob = if self.ob.is_empty() {
            None
        } else {
            let shape = self.ob.frames()[0].shape();
            if shape != df_shape {
                return Err(NormalizationError::shape_mismatch("dark field", shape, df_shape));
            }
            Some(subtract_all(self.ob.frames(), &reference))
        };

        if let Some(frames) = corrected_sample {
            self.sample.replace_frames(frames);
        }
        if let Some(frames) = corrected_ob {
            self.ob.replace_frames(frames);
        }
        self.status.df_correction = true;
        Ok(true)
    }
}

/// Element-wise mean across a stack of same-shaped frames
pub(super) fn mean_stack(frames: &[ImageFrame]) -> ImageFrame {
    let first = &frames[0];
    let mut data = vec![0.0f64; first.data.len()];
    for frame in frames {
        for (acc, &value) in data.iter_mut().zip(&frame.data) {
            *acc += value as f64;
        }
    }
    let count = frames.len() as f64;
    let data = data.iter().map(|&sum| (sum / count) as f32).collect();
    ImageFrame::new(first.width, first.height, data, SourceDepth::F32)
}

fn subtract_all(frames: &[ImageFrame], reference: &ImageFrame) -> Vec<ImageFrame> {
    frames
        .iter()
        .map(|frame| {
            let data = frame
                .data
                .iter()
                .zip(&reference.data)
                .map(|(&value, &dark)| value - dark)
                .collect();
            ImageFrame::new(frame.width, frame.height, data, SourceDepth::F32)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DataType;

    fn frame(values: Vec<Vec<f32>>) -> ImageFrame {
        ImageFrame::from_rows(values, SourceDepth::U16)
    }

    #[test]
    fn test_subtracts_df_from_sample_and_ob() {
        let mut pipeline = Normalization::new();
        pipeline
            .load_frame(frame(vec![vec![5.0, 5.0]]), DataType::Sample)
            .unwrap();
        pipeline
            .load_frame(frame(vec![vec![9.0, 9.0]]), DataType::Ob)
            .unwrap();
        pipeline
            .load_frame(frame(vec![vec![2.0, 2.0]]), DataType::Df)
            .unwrap();

        assert!(pipeline.df_correction(false).unwrap());
        assert_eq!(pipeline.sample_data()[0].data, vec![3.0, 3.0]);
        assert_eq!(pipeline.ob_data()[0].data, vec![7.0, 7.0]);
    }

    #[test]
    fn test_second_run_does_not_double_subtract() {
        let mut pipeline = Normalization::new();
        pipeline
            .load_frame(frame(vec![vec![5.0, 5.0]]), DataType::Sample)
            .unwrap();
        pipeline
            .load_frame(frame(vec![vec![2.0, 2.0]]), DataType::Df)
            .unwrap();

        assert!(pipeline.df_correction(false).unwrap());
        assert!(!pipeline.df_correction(false).unwrap());
        assert_eq!(pipeline.sample_data()[0].data, vec![3.0, 3.0]);
    }

    #[test]
    fn test_force_subtracts_again() {
        let mut pipeline = Normalization::new();
        pipeline
            .load_frame(frame(vec![vec![5.0, 5.0]]), DataType::Sample)
            .unwrap();
        pipeline
            .load_frame(frame(vec![vec![2.0, 2.0]]), DataType::Df)
            .unwrap();

        pipeline.df_correction(false).unwrap();
        assert!(pipeline.df_correction(true).unwrap());
        assert_eq!(pipeline.sample_data()[0].data, vec![1.0, 1.0]);
    }

    #[test]
    fn test_multi_frame_df_average() {
        let mut pipeline = Normalization::new();
        pipeline
            .load_frame(frame(vec![vec![10.0, 10.0]]), DataType::Sample)
            .unwrap();
        pipeline
            .load_frames(
                vec![frame(vec![vec![1.0, 2.0]]), frame(vec![vec![3.0, 6.0]])],
                DataType::Df,
            )
            .unwrap();

        pipeline.df_correction(false).unwrap();
        assert_eq!(pipeline.df_average().unwrap().data, vec![2.0, 4.0]);
        assert_eq!(pipeline.sample_data()[0].data, vec![8.0, 6.0]);
    }

    #[test]
    fn test_absent_df_is_a_noop() {
        let mut pipeline = Normalization::new();
        pipeline
            .load_frame(frame(vec![vec![5.0, 5.0]]), DataType::Sample)
            .unwrap();

        assert!(pipeline.df_correction(false).unwrap());
        assert_eq!(pipeline.sample_data()[0].data, vec![5.0, 5.0]);
        assert!(pipeline.status().df_correction);
    }

    #[test]
    fn test_shape_mismatch_leaves_data_and_flag_untouched() {
        let mut pipeline = Normalization::new();
        pipeline
            .load_frame(frame(vec![vec![5.0, 5.0]]), DataType::Sample)
            .unwrap();
        pipeline
            .load_frame(frame(vec![vec![2.0], vec![2.0]]), DataType::Df)
            .unwrap();

        let err = pipeline.df_correction(false).unwrap_err();
        assert!(matches!(err, NormalizationError::ShapeMismatch { .. }));
        assert_eq!(pipeline.sample_data()[0].data, vec![5.0, 5.0]);
        assert!(!pipeline.status().df_correction);
    }

    #[test]
    fn test_df_stack_average_gamma_filters_frames() {
        // the saturated u16 pixel has a single in-bounds neighbor, so
        // the repaired value is 4.0 / 8 = 0.5 before averaging
        let mut pipeline = Normalization::new();
        pipeline
            .load_frame(frame(vec![vec![10.0, 10.0]]), DataType::Sample)
            .unwrap();
        pipeline
            .load_frames(
                vec![frame(vec![vec![65535.0, 4.0]]), frame(vec![vec![1.5, 2.0]])],
                DataType::Df,
            )
            .unwrap();

        pipeline.df_correction(false).unwrap();
        assert_eq!(pipeline.df_average().unwrap().data, vec![1.0, 3.0]);
    }

    #[test]
    fn test_single_df_frame_used_as_is() {
        let mut pipeline = Normalization::new();
        pipeline
            .load_frame(frame(vec![vec![10.0, 10.0]]), DataType::Sample)
            .unwrap();
        pipeline
            .load_frame(frame(vec![vec![65535.0, 4.0]]), DataType::Df)
            .unwrap();

        pipeline.df_correction(false).unwrap();
        assert_eq!(pipeline.df_average().unwrap().data, vec![65535.0, 4.0]);
    }
}
