//! Parsing functions for ROI coordinates and export formats.

use neunorm_core::{ExportFormat, Roi};

/// Parse a ROI string in format "x0,y0,x1,y1" (inclusive bounds)
pub fn parse_roi(roi_str: &str) -> Result<Roi, String> {
    let parts: Vec<&str> = roi_str.split(',').collect();
    if parts.len() != 4 {
        return Err(format!(
            "ROI must be in format x0,y0,x1,y1 (e.g., 10,10,200,200), got: {}",
            roi_str
        ));
    }

    let x0 = parts[0]
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("Invalid x0 coordinate: {}", parts[0]))?;
    let y0 = parts[1]
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("Invalid y0 coordinate: {}", parts[1]))?;
    let x1 = parts[2]
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("Invalid x1 coordinate: {}", parts[2]))?;
    let y1 = parts[3]
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("Invalid y1 coordinate: {}", parts[3]))?;

    Roi::new(x0, y0, x1, y1).map_err(|e| e.to_string())
}

/// Parse an export format name ("tif", "tiff" or "fits")
pub fn parse_export_format(format_str: &str) -> Result<ExportFormat, String> {
    match format_str.to_lowercase().as_str() {
        "tif" | "tiff" => Ok(ExportFormat::Tiff),
        "fits" | "fit" => Ok(ExportFormat::Fits),
        other => Err(format!(
            "Unknown export format: {} (expected tif or fits)",
            other
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roi_valid() {
        let roi = parse_roi("10, 20, 30, 40").unwrap();
        assert_eq!((roi.x0, roi.y0, roi.x1, roi.y1), (10, 20, 30, 40));
    }

    #[test]
    fn test_parse_roi_wrong_arity() {
        assert!(parse_roi("10,20,30").is_err());
        assert!(parse_roi("").is_err());
    }

    #[test]
    fn test_parse_roi_reversed_bounds() {
        assert!(parse_roi("30,0,10,5").is_err());
    }

    #[test]
    fn test_parse_roi_non_numeric() {
        assert!(parse_roi("a,0,10,5").is_err());
    }

    #[test]
    fn test_parse_export_format() {
        assert_eq!(parse_export_format("tif").unwrap(), ExportFormat::Tiff);
        assert_eq!(parse_export_format("TIFF").unwrap(), ExportFormat::Tiff);
        assert_eq!(parse_export_format("fits").unwrap(), ExportFormat::Fits);
        assert!(parse_export_format("jpeg").is_err());
    }
}
