//! Export of stored sequences
//!
//! Writes one file per frame into an existing folder. Normalized
//! output borrows the sample file names with a `normalized_` prefix;
//! the raw categories keep their own names. The extension is always
//! replaced by the target format's.

use std::path::{Path, PathBuf};

use crate::error::{NormalizationError, Result};
use crate::exporters;
use crate::models::{DataType, ExportFormat, FrameMetadata, ImageFrame};

use super::Normalization;

impl Normalization {
    /// Write one category to `folder`, one file per frame
    ///
    /// The folder must already exist. Exporting a category that holds
    /// no data is a quiet no-op.
    pub fn export(&self, folder: &Path, target: DataType, format: ExportFormat) -> Result<()> {
        if !folder.is_dir() {
            return Err(NormalizationError::DirectoryNotFound(folder.to_path_buf()));
        }

        let (frames, file_names, metadata, prefix) = match target {
            DataType::Normalized => {
                let Some(frames) = self.normalized.as_deref() else {
                    return Ok(());
                };
                (
                    frames,
                    self.sample.file_names(),
                    self.sample.metadata(),
                    "normalized_",
                )
            }
            DataType::Sample => (
                self.sample.frames(),
                self.sample.file_names(),
                self.sample.metadata(),
                "",
            ),
            DataType::Ob => (self.ob.frames(), self.ob.file_names(), self.ob.metadata(), ""),
            DataType::Df => (self.df.frames(), self.df.file_names(), self.df.metadata(), ""),
        };

        for (index, frame) in frames.iter().enumerate() {
            let name = output_file_name(&file_names[index], prefix, format.extension());
            let metadata = metadata.get(index).cloned().unwrap_or_default();
            write_one(frame, &metadata, &folder.join(name), format)?;
        }
        Ok(())
    }
}

/// Base name of `source` with `prefix` prepended and `extension` swapped in
fn output_file_name(source: &str, prefix: &str, extension: &str) -> String {
    let base = Path::new(source)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.to_string());
    format!("{}{}.{}", prefix, base, extension)
}

fn write_one(
    frame: &ImageFrame,
    metadata: &FrameMetadata,
    path: &PathBuf,
    format: ExportFormat,
) -> Result<()> {
    exporters::write_frame(frame, metadata, path, format)
}
