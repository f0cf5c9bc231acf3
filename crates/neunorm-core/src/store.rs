//! Per-category image storage
//!
//! One `ImageSet` holds the ordered frames of a single category (sample,
//! OB or DF) together with their source identifiers and metadata, and
//! enforces the shared-shape invariant.

use crate::error::{NormalizationError, Result};
use crate::models::{FrameMetadata, ImageFrame, Shape};

/// Ordered frames of one data category
///
/// The three vectors run parallel: `frames[i]`, `file_names[i]` and
/// `metadata[i]` describe the same image. The shape is unset until the
/// first insert and fixed afterwards.
#[derive(Debug, Clone, Default)]
pub struct ImageSet {
    frames: Vec<ImageFrame>,
    file_names: Vec<String>,
    metadata: Vec<FrameMetadata>,
    shape: Option<Shape>,
}

impl ImageSet {
    /// Append one frame, recording or checking the category shape
    ///
    /// `context` names the category in the `ShapeMismatch` message.
    /// `check_shape: false` skips the invariant, matching the loader's
    /// opt-out, but still records the first shape seen.
    pub fn insert(
        &mut self,
        frame: ImageFrame,
        file_name: String,
        metadata: FrameMetadata,
        check_shape: bool,
        context: &str,
    ) -> Result<()> {
        match self.shape {
            None => self.shape = Some(frame.shape()),
            Some(expected) => {
                if check_shape && expected != frame.shape() {
                    return Err(NormalizationError::shape_mismatch(
                        context,
                        expected,
                        frame.shape(),
                    ));
                }
            }
        }
        self.frames.push(frame);
        self.file_names.push(file_name);
        self.metadata.push(metadata);
        Ok(())
    }

    /// Loaded frames in insertion order
    pub fn frames(&self) -> &[ImageFrame] {
        &self.frames
    }

    /// Source identifiers, one per frame
    pub fn file_names(&self) -> &[String] {
        &self.file_names
    }

    /// Per-frame metadata records
    pub fn metadata(&self) -> &[FrameMetadata] {
        &self.metadata
    }

    /// Number of loaded frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True when no frame has been loaded
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Shared shape, `None` until the first insert
    pub fn shape(&self) -> Option<Shape> {
        self.shape
    }

    /// Swap in corrected frames, keeping identifiers and metadata
    pub(crate) fn replace_frames(&mut self, frames: Vec<ImageFrame>) {
        debug_assert_eq!(frames.len(), self.frames.len());
        self.frames = frames;
    }

    /// Update the recorded shape after a crop
    pub(crate) fn set_shape(&mut self, shape: Shape) {
        self.shape = Some(shape);
    }
}
