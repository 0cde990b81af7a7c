//! Image XObjects for PDF documents

use crate::{PdfError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use lopdf::{Dictionary, Stream};

impl From<image::ImageError> for PdfError {
    fn from(err: image::ImageError) -> Self {
        PdfError::ImageError(err.to_string())
    }
}

/// JPEG info including dimensions and color components
#[derive(Debug, Clone, Copy)]
struct JpegInfo {
    width: u32,
    height: u32,
    num_components: u8,
}

/// Image XObject for PDF embedding
#[derive(Debug, Clone)]
pub struct ImageXObject {
    /// Image width
    pub width: u32,
    /// Image height
    pub height: u32,
    /// Color space ("DeviceRGB", "DeviceGray")
    pub color_space: String,
    /// Bits per component
    pub bits_per_component: u8,
    /// PDF filter ("DCTDecode" for JPEG, "FlateDecode" for raw samples)
    pub filter: String,
    /// Raw image data (compressed)
    pub data: Vec<u8>,
}

/// Check the JPEG SOI marker
fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 3 && data[0] == 0xFF && data[1] == 0xD8 && data[2] == 0xFF
}

/// Get JPEG info including dimensions and color components
fn get_jpeg_info(data: &[u8]) -> Result<JpegInfo> {
    // SOF segment: marker (2), length (2), precision (1), height (2), width (2), components (1)
    let mut i = 2;
    while i + 10 < data.len() {
        if data[i] != 0xFF {
            i += 1;
            continue;
        }

        let marker = data[i + 1];

        // SOF markers (baseline, progressive, etc.)
        if (0xC0..=0xCF).contains(&marker) && marker != 0xC4 && marker != 0xC8 && marker != 0xCC {
            let height = u16::from_be_bytes([data[i + 5], data[i + 6]]) as u32;
            let width = u16::from_be_bytes([data[i + 7], data[i + 8]]) as u32;
            let num_components = data[i + 9];
            return Ok(JpegInfo {
                width,
                height,
                num_components,
            });
        }

        if i + 4 < data.len() {
            let length = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
            if length < 2 {
                break;
            }
            i += 2 + length;
        } else {
            break;
        }
    }

    Err(PdfError::ImageError(
        "Could not parse JPEG info".to_string(),
    ))
}

impl ImageXObject {
    /// Create XObject from JPEG data
    ///
    /// JPEG images can be embedded directly with DCTDecode filter.
    pub fn from_jpeg(data: &[u8]) -> Result<Self> {
        if !is_jpeg(data) {
            return Err(PdfError::ImageError("Not a JPEG image".to_string()));
        }
        let info = get_jpeg_info(data)?;

        let color_space = if info.num_components == 1 {
            "DeviceGray".to_string()
        } else {
            "DeviceRGB".to_string()
        };

        Ok(Self {
            width: info.width,
            height: info.height,
            color_space,
            bits_per_component: 8,
            filter: "DCTDecode".to_string(),
            data: data.to_vec(),
        })
    }

    /// Create XObject from an opaque RGB bitmap
    ///
    /// Samples are stored losslessly with FlateDecode (zlib).
    pub fn from_rgb8(image: &RgbImage) -> Result<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(PdfError::ImageError("Image has no pixels".to_string()));
        }

        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        std::io::Write::write_all(&mut encoder, image.as_raw())?;
        let data = encoder.finish()?;

        Ok(Self {
            width: image.width(),
            height: image.height(),
            color_space: "DeviceRGB".to_string(),
            bits_per_component: 8,
            filter: "FlateDecode".to_string(),
            data,
        })
    }

    /// Create XObject by encoding an opaque RGB bitmap as JPEG
    ///
    /// `quality` is clamped to 1..=100.
    pub fn from_rgb8_jpeg(image: &RgbImage, quality: u8) -> Result<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(PdfError::ImageError("Image has no pixels".to_string()));
        }

        let mut encoded = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut encoded, quality.clamp(1, 100));
        encoder.encode_image(image)?;

        Self::from_jpeg(&encoded)
    }

    /// Convert to lopdf Stream object
    pub fn to_pdf_stream(&self) -> Stream {
        let mut dict = Dictionary::new();

        dict.set("Type", lopdf::Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", lopdf::Object::Name(b"Image".to_vec()));
        dict.set("Width", self.width as i64);
        dict.set("Height", self.height as i64);
        dict.set(
            "ColorSpace",
            lopdf::Object::Name(self.color_space.as_bytes().to_vec()),
        );
        dict.set("BitsPerComponent", self.bits_per_component as i64);
        dict.set(
            "Filter",
            lopdf::Object::Name(self.filter.as_bytes().to_vec()),
        );
        dict.set("Length", self.data.len() as i64);

        // Already compressed with the filter above; lopdf must not compress again
        Stream::new(dict, self.data.clone()).with_compression(false)
    }
}

/// Generate operators to draw an image, clipped to a rectangle
///
/// # Arguments
/// * `image_name` - Image resource name (e.g., "Im1")
/// * `x`, `y` - Lower-left corner of the image in points (PDF coordinates)
/// * `width`, `height` - Image size in points
/// * `clip` - Clip rectangle `(x, y, width, height)` in points, usually the page box
///
/// # Returns
/// PDF content stream operators as bytes
pub fn generate_image_operators(
    image_name: &str,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    clip: (f64, f64, f64, f64),
) -> Vec<u8> {
    // q                          - Save graphics state
    // cx cy cw ch re W n         - Clip to rectangle
    // width 0 0 height x y cm    - Concatenate transformation matrix
    // /Im1 Do                    - Draw image
    // Q                          - Restore graphics state
    let (cx, cy, cw, ch) = clip;
    format!(
        "q\n{cx} {cy} {cw} {ch} re W n\n{width} 0 0 {height} {x} {y} cm\n/{image_name} Do\nQ\n"
    )
    .into_bytes()
}
