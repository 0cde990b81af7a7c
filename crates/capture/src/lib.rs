//! Capture - render, rasterize and paginate the lease addendum
//!
//! This crate provides:
//! - The view tree of the addendum with inline controls in edit or capture mode
//! - A greedy layout engine producing a display list at a given width
//! - Capture surfaces with scoped print-mode and width-lock guards
//! - A tiny-skia rasterizer for display lists
//! - Sliding-window pagination of a tall bitmap into fixed-size pages
//! - The export pipeline with its re-entrancy gate
//!
//! # Example
//!
//! ```no_run
//! use capture::{ExportConfig, Exporter, GlyphFonts, SkiaRasterizer, Surface};
//! use lease_form::DocumentDraft;
//!
//! # fn main() -> capture::Result<()> {
//! let fonts = GlyphFonts::from_regular(std::fs::read("font.ttf").map_err(|e| {
//!     capture::CaptureError::Font(e.to_string())
//! })?)?;
//! let rasterizer = SkiaRasterizer::new(fonts);
//!
//! let mut draft = DocumentDraft::new();
//! draft.set_tenant_name("Corner Coffee LLC");
//!
//! let mut surface = Surface::new(1024.0);
//! let mut exporter = Exporter::new(ExportConfig::default(), rasterizer);
//! let outcome = exporter.export(&draft, Some(&mut surface))?;
//! # Ok(())
//! # }
//! ```

mod config;
mod export;
mod layout;
mod paginate;
mod raster;
mod surface;
mod view;

pub use config::{ExportConfig, ImageEncoding, PaperSize, CSS_PX_PER_INCH, DEFAULT_RASTER_SCALE};
pub use export::{
    assemble_pdf, export_filename, Clock, ExportGate, ExportOutcome, ExportTicket, ExportedFile,
    Exporter, MonotonicClock, SkipReason,
};
pub use layout::{layout, Color, DisplayList, DrawOp, FixedAdvance, TextMetrics, TextStyle};
pub use paginate::{page_count, paginate, PageSlice};
pub use raster::{FontWeight, GlyphFonts, Rasterizer, SkiaRasterizer};
pub use surface::{CaptureTarget, Mode, PrintMode, Surface, WidthLock};
pub use view::{build_control, build_view, Action, Block, Control, ControlKind, Inline, ViewState};

use thiserror::Error;

/// Capture and export errors
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Rasterization failed: {0}")]
    Raster(String),

    #[error("Bitmap of {width}x{height} pixels could not be allocated")]
    ResourceExhausted { width: u32, height: u32 },

    #[error("Font error: {0}")]
    Font(String),

    #[error("Invalid export configuration: {0}")]
    Config(String),

    #[error("PDF error: {0}")]
    Pdf(#[from] pdf_core::PdfError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for capture operations
pub type Result<T> = std::result::Result<T, CaptureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CaptureError::ResourceExhausted {
            width: 2048,
            height: 90000,
        };
        assert_eq!(
            err.to_string(),
            "Bitmap of 2048x90000 pixels could not be allocated"
        );

        let err: CaptureError = pdf_core::PdfError::InvalidPage(3, 2).into();
        assert!(err.to_string().starts_with("PDF error:"));
    }
}
