//! Data models for neunorm
//!
//! Core data structures for image frames, regions of interest, and
//! processing options.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{NormalizationError, Result};

/// Data category addressed by loading and export operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    /// Projection images of the sample
    Sample,
    /// Open beam reference images (beam without the sample)
    Ob,
    /// Dark field reference images (detector dark current)
    Df,
    /// Normalized transmission output (export target only)
    Normalized,
}

impl DataType {
    /// Lowercase label used in file names and messages
    pub fn label(self) -> &'static str {
        match self {
            DataType::Sample => "sample",
            DataType::Ob => "ob",
            DataType::Df => "df",
            DataType::Normalized => "normalized",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DataType {
    type Err = NormalizationError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sample" => Ok(DataType::Sample),
            "ob" => Ok(DataType::Ob),
            "df" => Ok(DataType::Df),
            "normalized" => Ok(DataType::Normalized),
            other => Err(NormalizationError::InvalidCategory(other.to_string())),
        }
    }
}

/// Frame dimensions, fixed per category on first insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    /// Width in pixels
    pub width: usize,

    /// Height in pixels
    pub height: usize,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Native numeric type of a decoded image
///
/// The working precision is always f32, but the auto gamma filter needs the
/// source type to compute the saturation ceiling. `Unknown` disables the
/// filter (soft fallback, not an error).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceDepth {
    U8,
    U16,
    I16,
    U32,
    I32,
    F32,
    Unknown,
}

impl SourceDepth {
    /// Maximum representable value of the source type, if known
    pub fn max_value(self) -> Option<f32> {
        match self {
            SourceDepth::U8 => Some(u8::MAX as f32),
            SourceDepth::U16 => Some(u16::MAX as f32),
            SourceDepth::I16 => Some(i16::MAX as f32),
            SourceDepth::U32 => Some(u32::MAX as f32),
            SourceDepth::I32 => Some(i32::MAX as f32),
            SourceDepth::F32 => Some(f32::MAX),
            SourceDepth::Unknown => None,
        }
    }
}

/// One 2D image in row-major order, working precision f32
///
/// Pixel values are kept in native counts, never rescaled to 0.0-1.0;
/// the saturation ceiling of the gamma filter only makes sense in
/// native units.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFrame {
    /// Width in pixels
    pub width: usize,

    /// Height in pixels
    pub height: usize,

    /// Row-major pixel data, `height * width` values
    pub data: Vec<f32>,

    /// Native numeric type of the source
    pub depth: SourceDepth,
}

impl ImageFrame {
    /// Create a frame from raw row-major data
    pub fn new(width: usize, height: usize, data: Vec<f32>, depth: SourceDepth) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            width,
            height,
            data,
            depth,
        }
    }

    /// Create a frame from nested rows; convenient for in-memory loading
    pub fn from_rows(rows: Vec<Vec<f32>>, depth: SourceDepth) -> Self {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(width * height);
        for row in rows {
            debug_assert_eq!(row.len(), width);
            data.extend(row);
        }
        Self {
            width,
            height,
            data,
            depth,
        }
    }

    /// Frame dimensions
    pub fn shape(&self) -> Shape {
        Shape {
            width: self.width,
            height: self.height,
        }
    }

    /// Pixel value at (row, column)
    #[inline]
    pub fn get(&self, y: usize, x: usize) -> f32 {
        self.data[y * self.width + x]
    }

    /// Mean over all pixels
    pub fn mean(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.data.iter().map(|&v| v as f64).sum();
        (sum / self.data.len() as f64) as f32
    }
}

/// Opaque per-frame metadata carried from the source file to the writer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameMetadata {
    /// Key/value records extracted from the source header
    pub entries: BTreeMap<String, String>,
}

/// Axis-aligned rectangle with inclusive integer bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roi {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl Roi {
    /// Create a ROI; fails when the bounds are not ordered
    pub fn new(x0: usize, y0: usize, x1: usize, y1: usize) -> Result<Self> {
        if x1 < x0 || y1 < y0 {
            return Err(NormalizationError::InvalidRoi(format!(
                "bounds must satisfy x0 <= x1 and y0 <= y1, got ({}, {}, {}, {})",
                x0, y0, x1, y1
            )));
        }
        Ok(Self { x0, y0, x1, y1 })
    }

    /// Width in pixels (inclusive bounds)
    pub fn width(&self) -> usize {
        self.x1 - self.x0 + 1
    }

    /// Height in pixels (inclusive bounds)
    pub fn height(&self) -> usize {
        self.y1 - self.y0 + 1
    }

    /// Number of pixels covered
    pub fn pixel_count(&self) -> usize {
        self.width() * self.height()
    }
}

/// A single ROI or an ordered collection used jointly
///
/// A `Many` selection pools pixel counts and sums across regions; the
/// correction factor is a pooled mean, not an average of per-region means.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoiSelection {
    Single(Roi),
    Many(Vec<Roi>),
}

impl RoiSelection {
    /// Member regions in order
    pub fn as_slice(&self) -> &[Roi] {
        match self {
            RoiSelection::Single(roi) => std::slice::from_ref(roi),
            RoiSelection::Many(rois) => rois,
        }
    }
}

impl From<Roi> for RoiSelection {
    fn from(roi: Roi) -> Self {
        RoiSelection::Single(roi)
    }
}

impl From<Vec<Roi>> for RoiSelection {
    fn from(rois: Vec<Roi>) -> Self {
        RoiSelection::Many(rois)
    }
}

/// Stage completion record for one pipeline instance
///
/// Each flag transitions false -> true on the first successful run of its
/// stage and is never cleared. Loading raw data is refused once any flag
/// is set. The `oscillation` and `bin` flags are reserved for stages that
/// share the same guard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessStatus {
    pub df_correction: bool,
    pub normalization: bool,
    pub crop: bool,
    pub oscillation: bool,
    pub bin: bool,
}

impl ProcessStatus {
    /// True once any stage has committed output
    pub fn any_set(&self) -> bool {
        self.df_correction || self.normalization || self.crop || self.oscillation || self.bin
    }
}

/// Options for the normalization stage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    /// Region(s) whose intensity has to match between sample and OB
    pub roi: Option<RoiSelection>,

    /// Re-run even if normalization already committed output
    pub force: bool,

    /// Aggregate OB frames with a per-pixel mean before dividing
    pub force_mean_ob: bool,

    /// Aggregate OB frames with a per-pixel median before dividing.
    /// Median is also the fallback whenever sample and OB counts differ,
    /// and it wins when both force flags are set.
    pub force_median_ob: bool,

    /// Normalize each sample frame by its own pooled ROI mean, no OB
    pub use_only_sample: bool,
}

/// Options applied while loading raw data
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Repair pixels within 5 counts of the source type maximum
    pub auto_gamma_filter: bool,

    /// Apply the threshold-based manual gamma filter instead
    pub manual_gamma_filter: bool,

    /// Manual gamma coefficient, between 0 and 1
    pub manual_gamma_threshold: f32,

    /// Enforce the per-category shape invariant on insert
    pub check_shape: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            auto_gamma_filter: true,
            manual_gamma_filter: false,
            manual_gamma_threshold: 0.1,
            check_shape: true,
        }
    }
}

/// Output file format for export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExportFormat {
    /// 32-bit float grayscale TIFF
    #[default]
    Tiff,

    /// FITS, BITPIX -32
    Fits,
}

impl ExportFormat {
    /// File extension appended to exported names
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Tiff => "tif",
            ExportFormat::Fits => "fits",
        }
    }
}
