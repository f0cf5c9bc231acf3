//! Sample / open beam normalization
//!
//! Divides every sample frame by its open beam counterpart (or by an
//! aggregated OB reference) after optional ROI intensity correction.
//! Zero-valued OB pixels are treated as undefined: they are mapped to
//! NaN before the division so they cannot produce artificial
//! infinities, and the output is then sanitized with NaN/Inf -> 0.
//! Both conventions are deliberate numerical policies, not error
//! suppression.

use crate::error::{NormalizationError, Result};
use crate::models::{ImageFrame, NormalizeOptions, SourceDepth};

use super::{roi, Normalization};

impl Normalization {
    /// Produce normalized transmission data
    ///
    /// Sticky: once run, later calls without `force` are no-ops
    /// returning `false`. The stage flag is set only after the output
    /// is committed, so a failed call leaves the instance unchanged.
    pub fn normalization(&mut self, options: &NormalizeOptions) -> Result<bool> {
        if !options.force && self.status.normalization {
            return Ok(false);
        }

        if self.sample.is_empty() {
            return Err(NormalizationError::MissingData(
                "no sample data have been loaded".to_string(),
            ));
        }

        if options.use_only_sample {
            return self.normalize_without_ob(options);
        }

        if self.ob.is_empty() {
            return Err(NormalizationError::MissingData(
                "no open beam data have been loaded".to_string(),
            ));
        }
        self.check_matching_shapes()?;

        // ROI intensity correction, applied independently to sample and
        // OB; without a ROI the sequences pass through as deep copies
        let (sample_frames, ob_frames) = match &options.roi {
            Some(selection) => {
                let shape = self.sample.frames()[0].shape();
                roi::validate(selection, shape)?;
                (
                    roi::apply_correction(self.sample.frames(), selection)?,
                    roi::apply_correction(self.ob.frames(), selection)?,
                )
            }
            None => (self.sample.frames().to_vec(), self.ob.frames().to_vec()),
        };

        let total = sample_frames.len();
        let mut normalized = Vec::with_capacity(total);
        let mut ob_aggregate = None;

        if sample_frames.len() != ob_frames.len() || options.force_mean_ob || options.force_median_ob
        {
            // aggregate the OB stack into one reference frame; median is
            // the default and also wins when both force flags are set
            let reference = if options.force_median_ob {
                nan_median_stack(&ob_frames)
            } else if options.force_mean_ob {
                nan_mean_stack(&ob_frames)
            } else {
                nan_median_stack(&ob_frames)
            };
            let working = mask_zeros(&reference);

            for (index, sample) in sample_frames.iter().enumerate() {
                normalized.push(sanitized_division(sample, &working));
                self.progress.update("Normalization", index + 1, total);
            }
            ob_aggregate = Some(reference);
        } else {
            // equal counts: pair sample[i] with ob[i] by index
            for (index, (sample, ob)) in sample_frames.iter().zip(&ob_frames).enumerate() {
                let working = mask_zeros(ob);
                normalized.push(sanitized_division(sample, &working));
                self.progress.update("Normalization", index + 1, total);
            }
        }

        self.sample.replace_frames(sample_frames);
        self.ob.replace_frames(ob_frames);
        if let Some(reference) = ob_aggregate {
            self.ob_aggregate = Some(reference);
        }
        self.normalized = Some(normalized);
        self.status.normalization = true;
        Ok(true)
    }

    /// Normalize each sample frame by its own pooled ROI mean
    fn normalize_without_ob(&mut self, options: &NormalizeOptions) -> Result<bool> {
        let selection = options.roi.as_ref().ok_or(NormalizationError::MissingRoi)?;
        let shape = self.sample.frames()[0].shape();
        roi::validate(selection, shape)?;

        let total = self.sample.len();
        let mut normalized = Vec::with_capacity(total);
        for index in 0..total {
            let frame = &self.sample.frames()[index];
            let factor = roi::region_correction_factor(frame, selection)?;
            let data = frame.data.iter().map(|&v| v / factor).collect();
            normalized.push(ImageFrame::new(frame.width, frame.height, data, SourceDepth::F32));
            self.progress.update("Normalization", index + 1, total);
        }

        self.normalized = Some(normalized);
        self.status.normalization = true;
        Ok(true)
    }

    /// Sample, OB and (if loaded) DF must share one frame shape
    fn check_matching_shapes(&self) -> Result<()> {
        let (Some(sample_shape), Some(ob_shape)) = (self.sample.shape(), self.ob.shape()) else {
            return Ok(());
        };
        if sample_shape != ob_shape {
            return Err(NormalizationError::shape_mismatch("ob", sample_shape, ob_shape));
        }
        if let Some(df_shape) = self.df.shape() {
            if sample_shape != df_shape {
                return Err(NormalizationError::shape_mismatch("df", sample_shape, df_shape));
            }
        }
        Ok(())
    }
}

/// Copy of `frame` with zero pixels replaced by the NaN sentinel
fn mask_zeros(frame: &ImageFrame) -> ImageFrame {
    let data = frame
        .data
        .iter()
        .map(|&v| if v == 0.0 { f32::NAN } else { v })
        .collect();
    ImageFrame::new(frame.width, frame.height, data, SourceDepth::F32)
}

/// Element-wise division with NaN/Inf rewritten to 0
fn sanitized_division(sample: &ImageFrame, ob: &ImageFrame) -> ImageFrame {
    let data = sample
        .data
        .iter()
        .zip(&ob.data)
        .map(|(&s, &o)| {
            let v = s / o;
            if v.is_finite() {
                v
            } else {
                0.0
            }
        })
        .collect();
    ImageFrame::new(sample.width, sample.height, data, SourceDepth::F32)
}

/// Per-pixel mean across frames, ignoring NaN values
fn nan_mean_stack(frames: &[ImageFrame]) -> ImageFrame {
    let first = &frames[0];
    let mut data = Vec::with_capacity(first.data.len());
    for index in 0..first.data.len() {
        let mut sum = 0.0f64;
        let mut count = 0usize;
        for frame in frames {
            let v = frame.data[index];
            if !v.is_nan() {
                sum += v as f64;
                count += 1;
            }
        }
        data.push(if count > 0 {
            (sum / count as f64) as f32
        } else {
            f32::NAN
        });
    }
    ImageFrame::new(first.width, first.height, data, SourceDepth::F32)
}

/// Per-pixel median across frames, ignoring NaN values
///
/// An even number of valid values yields the midpoint of the two
/// central ones.
fn nan_median_stack(frames: &[ImageFrame]) -> ImageFrame {
    let first = &frames[0];
    let mut data = Vec::with_capacity(first.data.len());
    let mut values = Vec::with_capacity(frames.len());
    for index in 0..first.data.len() {
        values.clear();
        for frame in frames {
            let v = frame.data[index];
            if !v.is_nan() {
                values.push(v);
            }
        }
        if values.is_empty() {
            data.push(f32::NAN);
            continue;
        }
        values.sort_by(|a, b| a.total_cmp(b));
        let mid = values.len() / 2;
        let median = if values.len() % 2 == 1 {
            values[mid]
        } else {
            (values[mid - 1] + values[mid]) / 2.0
        };
        data.push(median);
    }
    ImageFrame::new(first.width, first.height, data, SourceDepth::F32)
}
