//! neunorm-core: neutron radiograph normalization
//!
//! Turns raw detector counts into transmission values by dividing
//! sample images by open beam references, with optional dark field
//! subtraction, gamma pixel repair, ROI intensity matching, cropping
//! and export to TIFF or FITS.
//!
//! The entry point is [`Normalization`]: load raw data per category,
//! then run the stages in order.

pub mod config;
pub mod decoders;
pub mod error;
pub mod exporters;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod store;

pub use config::{is_verbose, load_norm_config, log_config_usage, norm_config_handle, set_verbose};
pub use error::{NormalizationError, Result};
pub use models::{
    DataType, ExportFormat, FrameMetadata, ImageFrame, LoadOptions, NormalizeOptions,
    ProcessStatus, Roi, RoiSelection, Shape, SourceDepth,
};
pub use pipeline::Normalization;
pub use progress::{NoProgress, ProgressSink};
pub use store::ImageSet;
