//! PDF Core - Low-level PDF assembly
//!
//! This crate provides functionality for:
//! - Creating new multi-page PDF documents of a fixed paper size
//! - Embedding raster images (raw RGB with FlateDecode, or JPEG with DCTDecode)
//! - Placing one embedded image on many pages, clipped to each page box
//! - Saving documents to a file or to bytes
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{ImageXObject, PageSize, PdfDocument};
//!
//! let mut doc = PdfDocument::new(PageSize::LETTER);
//! let image = doc.embed_image(ImageXObject::from_rgb8(&bitmap)?)?;
//! let page = doc.add_blank_page()?;
//! doc.place_image(image, page, 0.0, 0.0, 612.0, 400.0)?;
//! let bytes = doc.to_bytes()?;
//! ```

mod document;
mod image;
mod page;

pub use document::{ImageHandle, PdfDocument};
pub use image::{generate_image_operators, ImageXObject};
pub use page::PageSize;

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("Unknown image handle: {0}")]
    UnknownImage(usize),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("PDF parsing error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_page_message() {
        let err = PdfError::InvalidPage(3, 2);
        assert_eq!(
            err.to_string(),
            "Invalid page number: 3 (document has 2 pages)"
        );
    }
}
