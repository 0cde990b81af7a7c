//! Export configuration

use crate::{CaptureError, Result};
use pdf_core::PageSize;
use serde::{Deserialize, Serialize};

/// Default device-pixel scale factor used when rasterizing
pub const DEFAULT_RASTER_SCALE: f32 = 2.0;

/// CSS pixels per inch
pub const CSS_PX_PER_INCH: f64 = 96.0;

const MM_PER_INCH: f64 = 25.4;

/// Target paper size of the exported PDF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    A4,
    #[default]
    Letter,
}

impl PaperSize {
    /// Paper dimensions in millimetres (width, height)
    pub fn dimensions_mm(self) -> (f64, f64) {
        match self {
            PaperSize::A4 => (210.0, 297.0),
            PaperSize::Letter => (215.9, 279.4),
        }
    }

    /// Page size in PDF points
    pub fn page_size(self) -> PageSize {
        match self {
            PaperSize::A4 => PageSize::A4,
            PaperSize::Letter => PageSize::LETTER,
        }
    }

    /// Paper width in CSS pixels, used to lock the captured subtree's width
    pub fn capture_width_px(self) -> f64 {
        let (width_mm, _) = self.dimensions_mm();
        (width_mm / MM_PER_INCH * CSS_PX_PER_INCH).round()
    }
}

/// How the captured bitmap is embedded in the PDF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageEncoding {
    /// Lossless zlib-compressed RGB
    #[default]
    Flate,
    /// Baseline JPEG
    Jpeg,
}

/// Settings of the export pipeline
///
/// Every field has a default, so a partial JSON object is enough:
///
/// ```
/// use capture::{ExportConfig, PaperSize};
///
/// let config = ExportConfig::from_json(r#"{ "paper": "a4", "scale": 1.5 }"#).unwrap();
/// assert_eq!(config.paper, PaperSize::A4);
/// assert_eq!(config.scale, 1.5);
/// assert!(config.lock_width);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportConfig {
    pub paper: PaperSize,
    /// Device-pixel scale factor (sharpness vs memory)
    pub scale: f32,
    /// Force the subtree to the paper width while capturing
    pub lock_width: bool,
    pub encoding: ImageEncoding,
    pub jpeg_quality: u8,
    /// Appended to the tenant-derived file name
    pub filename_suffix: String,
    /// Busy-flag safety window in milliseconds
    pub safety_timeout_ms: u64,
    /// PDF document title
    pub title: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            paper: PaperSize::default(),
            scale: DEFAULT_RASTER_SCALE,
            lock_width: true,
            encoding: ImageEncoding::default(),
            jpeg_quality: 92,
            filename_suffix: "Lease Addendum".to_string(),
            safety_timeout_ms: 30_000,
            title: "Lease Addendum".to_string(),
        }
    }
}

impl ExportConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ExportConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot honor
    pub fn validate(&self) -> Result<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(CaptureError::Config(format!(
                "scale must be a positive number, got {}",
                self.scale
            )));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(CaptureError::Config(format!(
                "jpegQuality must be within 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }
}
