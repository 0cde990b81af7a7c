//! Rasterization of display lists

use crate::layout::{Color, DisplayList, DrawOp, FixedAdvance, TextMetrics, TextStyle};
use crate::{CaptureError, Result};
use ab_glyph::{point, Font, FontVec, PxScale, ScaleFont};
use image::RgbImage;
use log::debug;
use tiny_skia::{Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

/// Largest bitmap allocated for one capture
const MAX_BITMAP_PIXELS: u64 = 268_435_456;

/// Turns a laid-out document into an opaque bitmap
pub trait Rasterizer {
    /// Metrics the layout must use so text fits what gets drawn
    fn metrics(&self) -> &dyn TextMetrics;

    /// Render at `scale` device pixels per CSS pixel over a white background
    fn rasterize(&mut self, list: &DisplayList, scale: f32) -> Result<RgbImage>;
}

/// Font weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

impl From<TextStyle> for FontWeight {
    fn from(style: TextStyle) -> Self {
        if style.bold {
            FontWeight::Bold
        } else {
            FontWeight::Regular
        }
    }
}

/// Regular and optional bold TrueType faces
pub struct GlyphFonts {
    regular: FontVec,
    bold: Option<FontVec>,
}

impl GlyphFonts {
    /// Load the regular face from TTF/OTF data
    pub fn from_regular(data: Vec<u8>) -> Result<Self> {
        Ok(Self {
            regular: parse_font(data)?,
            bold: None,
        })
    }

    /// Add a bold face
    pub fn with_bold(mut self, data: Vec<u8>) -> Result<Self> {
        self.set_bold(data)?;
        Ok(self)
    }

    pub fn set_bold(&mut self, data: Vec<u8>) -> Result<()> {
        self.bold = Some(parse_font(data)?);
        Ok(())
    }

    /// Face for a weight; bold falls back to regular
    pub fn get(&self, weight: FontWeight) -> &FontVec {
        match weight {
            FontWeight::Bold => self.bold.as_ref().unwrap_or(&self.regular),
            FontWeight::Regular => &self.regular,
        }
    }
}

fn parse_font(data: Vec<u8>) -> Result<FontVec> {
    FontVec::try_from_vec(data).map_err(|e| CaptureError::Font(e.to_string()))
}

/// Scale at which one em is `size` pixels
fn px_scale(font: &FontVec, size: f32) -> PxScale {
    match font.units_per_em() {
        Some(units) if units > 0.0 => PxScale::from(size * font.height_unscaled() / units),
        _ => PxScale::from(size),
    }
}

impl TextMetrics for GlyphFonts {
    fn text_width(&self, text: &str, style: TextStyle) -> f32 {
        let font = self.get(style.into());
        let scaled = font.as_scaled(px_scale(font, style.size));

        let mut width = 0.0;
        let mut previous = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            previous = Some(id);
        }
        width
    }

    fn ascent(&self, style: TextStyle) -> f32 {
        let font = self.get(style.into());
        font.as_scaled(px_scale(font, style.size)).ascent()
    }
}

/// CPU rasterizer built on tiny-skia and ab_glyph
///
/// Without fonts, layout falls back to fixed-advance metrics and any text
/// in the display list fails rasterization.
#[derive(Default)]
pub struct SkiaRasterizer {
    fonts: Option<GlyphFonts>,
    fallback: FixedAdvance,
}

impl SkiaRasterizer {
    pub fn new(fonts: GlyphFonts) -> Self {
        Self {
            fonts: Some(fonts),
            fallback: FixedAdvance::default(),
        }
    }

    /// Rasterizer with no fonts loaded yet
    pub fn without_fonts() -> Self {
        Self::default()
    }

    pub fn set_fonts(&mut self, fonts: GlyphFonts) {
        self.fonts = Some(fonts);
    }

    pub fn fonts_mut(&mut self) -> Option<&mut GlyphFonts> {
        self.fonts.as_mut()
    }
}

impl Rasterizer for SkiaRasterizer {
    fn metrics(&self) -> &dyn TextMetrics {
        match &self.fonts {
            Some(fonts) => fonts as &dyn TextMetrics,
            None => &self.fallback,
        }
    }

    fn rasterize(&mut self, list: &DisplayList, scale: f32) -> Result<RgbImage> {
        let fonts = self.fonts.as_ref();
        if fonts.is_none() && list.has_text() {
            return Err(CaptureError::Font(
                "no font loaded for text rendering".to_string(),
            ));
        }

        let width = (list.width * scale).ceil().max(1.0) as u32;
        let height = (list.height * scale).ceil().max(1.0) as u32;

        let exhausted = CaptureError::ResourceExhausted { width, height };
        if width as u64 * height as u64 > MAX_BITMAP_PIXELS {
            return Err(exhausted);
        }
        let mut pixmap = Pixmap::new(width, height).ok_or(exhausted)?;
        pixmap.fill(tiny_skia::Color::WHITE);

        let transform = Transform::from_scale(scale, scale);
        for op in &list.ops {
            match op {
                DrawOp::FillRect {
                    x,
                    y,
                    width,
                    height,
                    color,
                } => {
                    if let Some(rect) = Rect::from_xywh(*x, *y, *width, *height) {
                        pixmap.fill_rect(rect, &paint(*color), transform, None);
                    }
                }
                DrawOp::StrokeRect {
                    x,
                    y,
                    width,
                    height,
                    color,
                } => {
                    if let Some(rect) = Rect::from_xywh(*x, *y, *width, *height) {
                        let path = PathBuilder::from_rect(rect);
                        let stroke = Stroke {
                            width: 1.0,
                            ..Stroke::default()
                        };
                        pixmap.stroke_path(&path, &paint(*color), &stroke, transform, None);
                    }
                }
                DrawOp::Rule { x, y, width, color } => {
                    if let Some(rect) = Rect::from_xywh(*x, *y, *width, 1.0) {
                        pixmap.fill_rect(rect, &paint(*color), transform, None);
                    }
                }
                DrawOp::Text {
                    x,
                    y,
                    text,
                    style,
                    color,
                } => {
                    if let Some(fonts) = fonts {
                        draw_text(
                            &mut pixmap,
                            fonts,
                            text,
                            *style,
                            *color,
                            *x * scale,
                            *y * scale,
                            scale,
                        );
                    }
                }
            }
        }

        debug!("rasterized {} ops into {width}x{height}px", list.ops.len());
        flatten(&pixmap)
    }
}

fn paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.0, color.1, color.2, 255);
    paint.anti_alias = true;
    paint
}

/// Draw glyph coverage straight into the opaque pixmap
#[allow(clippy::too_many_arguments)]
fn draw_text(
    pixmap: &mut Pixmap,
    fonts: &GlyphFonts,
    text: &str,
    style: TextStyle,
    color: Color,
    x: f32,
    baseline: f32,
    scale: f32,
) {
    let font = fonts.get(style.into());
    let scaled = font.as_scaled(px_scale(font, style.size * scale));
    let pixmap_width = pixmap.width() as i32;
    let pixmap_height = pixmap.height() as i32;
    let data = pixmap.data_mut();

    let mut caret = x;
    let mut previous = None;
    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = previous {
            caret += scaled.kern(prev, id);
        }
        let glyph = id.with_scale_and_position(scaled.scale(), point(caret, baseline));
        caret += scaled.h_advance(id);
        previous = Some(id);

        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|gx, gy, coverage| {
            let px = bounds.min.x as i32 + gx as i32;
            let py = bounds.min.y as i32 + gy as i32;
            if px < 0 || py < 0 || px >= pixmap_width || py >= pixmap_height {
                return;
            }
            let offset = (py as usize * pixmap_width as usize + px as usize) * 4;
            let alpha = coverage.clamp(0.0, 1.0);
            for (channel, value) in [color.0, color.1, color.2].into_iter().enumerate() {
                let current = data[offset + channel] as f32;
                data[offset + channel] = (current + (value as f32 - current) * alpha).round() as u8;
            }
        });
    }
}

/// Composite premultiplied RGBA over white into an RGB bitmap
fn flatten(pixmap: &Pixmap) -> Result<RgbImage> {
    let mut rgb = Vec::with_capacity(pixmap.width() as usize * pixmap.height() as usize * 3);
    for pixel in pixmap.data().chunks_exact(4) {
        let inverse = 255 - pixel[3];
        rgb.extend_from_slice(&[
            pixel[0].saturating_add(inverse),
            pixel[1].saturating_add(inverse),
            pixel[2].saturating_add(inverse),
        ]);
    }
    RgbImage::from_raw(pixmap.width(), pixmap.height(), rgb)
        .ok_or_else(|| CaptureError::Raster("bitmap buffer size mismatch".to_string()))
}
