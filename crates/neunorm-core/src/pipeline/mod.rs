//! Normalization pipeline
//!
//! `Normalization` owns the three raw data categories (sample, open
//! beam, dark field) plus the normalized output and drives the
//! processing stages: gamma filtering at load time, dark field
//! correction, normalization, cropping and export. Stages record their
//! completion in a `ProcessStatus`; loading raw data is refused once
//! any stage has committed output.

mod crop;
mod dark_field;
mod export;
pub mod gamma;
mod normalize;
pub mod roi;


use std::path::Path;

use crate::decoders;
use crate::error::{NormalizationError, Result};
use crate::models::{DataType, ImageFrame, LoadOptions, ProcessStatus};
use crate::progress::{NoProgress, ProgressSink};
use crate::store::ImageSet;

/// One normalization run over a set of radiographs
///
/// Load raw data first, then run the stages in order. Each stage
/// commits its output back into the instance, so the accessors always
/// reflect the latest processing state.
pub struct Normalization {
    sample: ImageSet,
    ob: ImageSet,
    df: ImageSet,
    normalized: Option<Vec<ImageFrame>>,
    df_average: Option<ImageFrame>,
    ob_aggregate: Option<ImageFrame>,
    status: ProcessStatus,
    progress: Box<dyn ProgressSink>,
}

impl Default for Normalization {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalization {
    /// Create an empty pipeline with no progress reporting
    pub fn new() -> Self {
        Self::with_progress(Box::new(NoProgress))
    }

    /// Create an empty pipeline reporting progress to `sink`
    pub fn with_progress(sink: Box<dyn ProgressSink>) -> Self {
        Self {
            sample: ImageSet::default(),
            ob: ImageSet::default(),
            df: ImageSet::default(),
            normalized: None,
            df_average: None,
            ob_aggregate: None,
            status: ProcessStatus::default(),
            progress: sink,
        }
    }

    /// Replace the progress sink
    pub fn set_progress(&mut self, sink: Box<dyn ProgressSink>) {
        self.progress = sink;
    }

    /// Load one image file into the given category
    pub fn load_file(&mut self, path: &Path, kind: DataType, options: &LoadOptions) -> Result<()> {
        self.ensure_not_processed()?;

        let (decoded, metadata) = decoders::decode_image(path)?;
        let frame = self.filtered(decoded, options)?;
        let name = path.to_string_lossy().into_owned();
        let check_shape = options.check_shape;
        self.set_mut(kind)?
            .insert(frame, name, metadata, check_shape, kind.label())
    }

    /// Load a list of image files into the given category
    pub fn load_files<P: AsRef<Path>>(
        &mut self,
        paths: &[P],
        kind: DataType,
        options: &LoadOptions,
    ) -> Result<()> {
        let total = paths.len();
        let label = format!("Loading {}", kind);
        for (index, path) in paths.iter().enumerate() {
            self.load_file(path.as_ref(), kind, options)?;
            self.progress.update(&label, index + 1, total);
        }
        Ok(())
    }

    /// Load one in-memory frame into the given category
    ///
    /// Frames loaded this way skip the gamma filters; they are assumed
    /// to be already clean.
    pub fn load_frame(&mut self, frame: ImageFrame, kind: DataType) -> Result<()> {
        self.ensure_not_processed()?;

        let set = self.set_mut(kind)?;
        let name = format!("image_{:04}", set.len() + 1);
        set.insert(frame, name, Default::default(), true, kind.label())
    }

    /// Load a list of in-memory frames into the given category
    pub fn load_frames(&mut self, frames: Vec<ImageFrame>, kind: DataType) -> Result<()> {
        let total = frames.len();
        let label = format!("Loading {}", kind);
        for (index, frame) in frames.into_iter().enumerate() {
            self.load_frame(frame, kind)?;
            self.progress.update(&label, index + 1, total);
        }
        Ok(())
    }

    /// Sample frames in load order, reflecting any committed corrections
    pub fn sample_data(&self) -> &[ImageFrame] {
        self.sample.frames()
    }

    /// Open beam frames in load order
    pub fn ob_data(&self) -> &[ImageFrame] {
        self.ob.frames()
    }

    /// Dark field frames in load order
    pub fn df_data(&self) -> &[ImageFrame] {
        self.df.frames()
    }

    /// Normalized output, `None` until the normalization stage ran
    pub fn normalized_data(&self) -> Option<&[ImageFrame]> {
        self.normalized.as_deref()
    }

    /// Cached dark field average, `None` until df correction ran
    pub fn df_average(&self) -> Option<&ImageFrame> {
        self.df_average.as_ref()
    }

    /// Cached OB aggregate, `None` unless normalization aggregated
    pub fn ob_aggregate(&self) -> Option<&ImageFrame> {
        self.ob_aggregate.as_ref()
    }

    /// Stage completion record
    pub fn status(&self) -> ProcessStatus {
        self.status
    }

    /// Full storage of one raw category
    pub fn data(&self, kind: DataType) -> Result<&ImageSet> {
        match kind {
            DataType::Sample => Ok(&self.sample),
            DataType::Ob => Ok(&self.ob),
            DataType::Df => Ok(&self.df),
            DataType::Normalized => Err(NormalizationError::InvalidCategory(
                "normalized output is not stored as a raw category".to_string(),
            )),
        }
    }

    fn ensure_not_processed(&self) -> Result<()> {
        if self.status.any_set() {
            return Err(NormalizationError::AlreadyProcessed);
        }
        Ok(())
    }

    fn set_mut(&mut self, kind: DataType) -> Result<&mut ImageSet> {
        match kind {
            DataType::Sample => Ok(&mut self.sample),
            DataType::Ob => Ok(&mut self.ob),
            DataType::Df => Ok(&mut self.df),
            DataType::Normalized => Err(NormalizationError::InvalidCategory(
                "normalized output cannot be loaded".to_string(),
            )),
        }
    }

    fn filtered(&self, frame: ImageFrame, options: &LoadOptions) -> Result<ImageFrame> {
        if options.auto_gamma_filter {
            gamma::auto_filter(&frame)
        } else if options.manual_gamma_filter {
            gamma::manual_filter(&frame, options.manual_gamma_threshold)
        } else {
            Ok(frame)
        }
    }
}
