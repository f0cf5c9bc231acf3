//! Input file handling.

use std::path::{Path, PathBuf};

/// Supported image extensions when scanning a directory
pub const SUPPORTED_EXTENSIONS: &[&str] = &["tif", "tiff", "fits", "fit"];

/// Expand a list of inputs (files and directories) into a list of image files.
///
/// Directories are scanned one level deep for supported image files and
/// the result is sorted for a stable frame order.
pub fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, String> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            collect_images_from_dir(input, &mut files)?;
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            return Err(format!("Path not found: {}", input.display()));
        }
    }

    files.sort();
    Ok(files)
}

fn collect_images_from_dir(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), String> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| format!("Failed to read directory {}: {}", dir.display(), e))?;

    for entry in entries {
        let entry = entry.map_err(|e| format!("Failed to read directory entry: {}", e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            if SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
                files.push(path);
            }
        }
    }
    Ok(())
}
