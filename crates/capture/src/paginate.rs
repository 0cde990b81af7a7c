//! Sliding-window pagination
//!
//! The whole bitmap is scaled to the page width and placed on every page,
//! shifted up by one page height per page and clipped to the page box. No
//! pixels are copied or cropped.

use log::debug;
use pdf_core::PageSize;

/// Overflow (in points) below which a trailing page is not started
const PAGE_EPSILON: f64 = 1e-6;

/// Placement of the captured image on one page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSlice {
    /// Zero-based page index
    pub index: usize,
    /// Distance from the page top to the image top, in points (zero or negative)
    pub offset_y: f64,
    /// Image width on the page, equal to the page width
    pub image_width: f64,
    /// Full scaled image height
    pub image_height: f64,
}

/// Scaled height of a `bitmap_width` x `bitmap_height` bitmap on a page
fn scaled_height(bitmap_width: u32, bitmap_height: u32, page: PageSize) -> f64 {
    if bitmap_width == 0 {
        return 0.0;
    }
    bitmap_height as f64 * page.width / bitmap_width as f64
}

/// Number of pages needed: `ceil(image height / page height)`, at least one
///
/// ```
/// use capture::page_count;
/// use pdf_core::PageSize;
///
/// // a bitmap exactly two page heights tall at page-width scale
/// assert_eq!(page_count(612, 1584, PageSize::LETTER), 2);
/// assert_eq!(page_count(612, 1585, PageSize::LETTER), 3);
/// assert_eq!(page_count(612, 0, PageSize::LETTER), 1);
/// ```
pub fn page_count(bitmap_width: u32, bitmap_height: u32, page: PageSize) -> usize {
    let image_height = scaled_height(bitmap_width, bitmap_height, page);
    if image_height <= 0.0 || page.height <= 0.0 {
        return 1;
    }
    let pages = ((image_height - PAGE_EPSILON) / page.height).ceil();
    (pages as usize).max(1)
}

/// Plan the page slices for a bitmap
pub fn paginate(bitmap_width: u32, bitmap_height: u32, page: PageSize) -> Vec<PageSlice> {
    let image_height = scaled_height(bitmap_width, bitmap_height, page);
    let count = page_count(bitmap_width, bitmap_height, page);
    debug!(
        "paginating {bitmap_width}x{bitmap_height}px bitmap: {image_height:.2}pt tall on {:.2}pt pages -> {count} page(s)",
        page.height
    );

    (0..count)
        .map(|index| PageSlice {
            index,
            offset_y: -(index as f64) * page.height,
            image_width: page.width,
            image_height,
        })
        .collect()
}
