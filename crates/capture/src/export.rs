//! Export pipeline: capture, paginate, assemble
//!
//! One export runs these steps in order:
//! 1. switch the target to capture mode
//! 2. lock its width to the paper width (optional)
//! 3. lay out and rasterize the document
//! 4. restore width, then mode (also on failure)
//! 5. paginate the bitmap into a PDF and derive the file name

use crate::config::{ExportConfig, ImageEncoding};
use crate::layout::layout;
use crate::paginate::{page_count, paginate};
use crate::raster::Rasterizer;
use crate::surface::{CaptureTarget, PrintMode, WidthLock};
use crate::view::{build_view, ViewState};
use crate::Result;
use image::RgbImage;
use lease_form::DocumentDraft;
use log::{debug, info, warn};
use pdf_core::{ImageXObject, PdfDocument};
use std::time::Instant;

/// Characters removed from file names
const ILLEGAL_FILENAME_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Name used when the tenant name is empty after sanitizing
const FALLBACK_FILENAME: &str = "Lease";

/// Millisecond time source for the busy-flag safety window
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Proof that an export holds the gate
#[derive(Debug, PartialEq, Eq)]
pub struct ExportTicket {
    generation: u64,
}

/// Busy flag refusing overlapping exports
///
/// The flag clears when its ticket is released, or on its own once the
/// safety timeout has elapsed. A ticket from an expired export cannot clear
/// the flag of a newer one.
#[derive(Debug, Clone)]
pub struct ExportGate {
    busy_since: Option<u64>,
    generation: u64,
    timeout_ms: u64,
}

impl ExportGate {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            busy_since: None,
            generation: 0,
            timeout_ms,
        }
    }

    pub fn is_busy(&self, now_ms: u64) -> bool {
        self.busy_since
            .is_some_and(|since| now_ms.saturating_sub(since) < self.timeout_ms)
    }

    /// Mark an export as started, unless one is already in flight
    pub fn try_acquire(&mut self, now_ms: u64) -> Option<ExportTicket> {
        if self.is_busy(now_ms) {
            return None;
        }
        if self.busy_since.is_some() {
            warn!("previous export did not settle within {}ms", self.timeout_ms);
        }
        self.generation += 1;
        self.busy_since = Some(now_ms);
        Some(ExportTicket {
            generation: self.generation,
        })
    }

    /// Mark an export as settled; returns false for a stale ticket
    pub fn release(&mut self, ticket: ExportTicket) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        self.busy_since = None;
        true
    }

    pub fn set_timeout(&mut self, timeout_ms: u64) {
        self.timeout_ms = timeout_ms;
    }
}

/// A finished PDF ready to be saved
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// Why an export produced nothing without failing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The document subtree is not mounted
    NotMounted,
    /// Another export is in flight
    Busy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    Saved(ExportedFile),
    Skipped(SkipReason),
}

/// Runs exports of a draft against a capture target
pub struct Exporter<R, C = MonotonicClock> {
    config: ExportConfig,
    rasterizer: R,
    clock: C,
    gate: ExportGate,
}

impl<R: Rasterizer> Exporter<R, MonotonicClock> {
    pub fn new(config: ExportConfig, rasterizer: R) -> Self {
        Self::with_clock(config, rasterizer, MonotonicClock::default())
    }
}

impl<R: Rasterizer, C: Clock> Exporter<R, C> {
    pub fn with_clock(config: ExportConfig, rasterizer: R, clock: C) -> Self {
        let gate = ExportGate::new(config.safety_timeout_ms);
        Self {
            config,
            rasterizer,
            clock,
            gate,
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Replace the configuration after validating it
    pub fn set_config(&mut self, config: ExportConfig) -> Result<()> {
        config.validate()?;
        self.gate.set_timeout(config.safety_timeout_ms);
        self.config = config;
        Ok(())
    }

    pub fn rasterizer_mut(&mut self) -> &mut R {
        &mut self.rasterizer
    }

    pub fn is_busy(&self) -> bool {
        self.gate.is_busy(self.clock.now_ms())
    }

    /// Claim the gate for an export that will settle later
    pub fn begin(&mut self) -> Option<ExportTicket> {
        let ticket = self.gate.try_acquire(self.clock.now_ms());
        if ticket.is_none() {
            warn!("export already in progress, ignoring request");
        }
        ticket
    }

    /// Release the gate claimed by [`Exporter::begin`]
    pub fn finish(&mut self, ticket: ExportTicket) -> bool {
        let released = self.gate.release(ticket);
        if !released {
            debug!("stale export ticket released after the safety timeout");
        }
        released
    }

    /// Full export: gate, capture, paginate and name the file
    ///
    /// `None` means the document is not mounted; that skips silently without
    /// touching any presentation state.
    pub fn export<T: CaptureTarget + ?Sized>(
        &mut self,
        draft: &DocumentDraft,
        target: Option<&mut T>,
    ) -> Result<ExportOutcome> {
        let Some(target) = target else {
            warn!("document is not mounted, nothing to export");
            return Ok(ExportOutcome::Skipped(SkipReason::NotMounted));
        };
        let Some(ticket) = self.begin() else {
            return Ok(ExportOutcome::Skipped(SkipReason::Busy));
        };

        let result = self.render(draft, target);
        self.finish(ticket);
        result.map(ExportOutcome::Saved)
    }

    /// Capture and assemble without touching the gate
    pub fn render<T: CaptureTarget + ?Sized>(
        &mut self,
        draft: &DocumentDraft,
        target: &mut T,
    ) -> Result<ExportedFile> {
        let bitmap = self.capture(draft, target)?;
        self.package(draft, &bitmap)
    }

    /// Rasterize the target in capture mode, restoring its presentation afterwards
    pub fn capture<T: CaptureTarget + ?Sized>(
        &mut self,
        draft: &DocumentDraft,
        target: &mut T,
    ) -> Result<RgbImage> {
        let mut print = PrintMode::enter(target);
        let bitmap = if self.config.lock_width {
            let width = self.config.paper.capture_width_px();
            let lock = WidthLock::acquire(&mut *print, width);
            self.snapshot(draft, &*lock)
        } else {
            self.snapshot(draft, &*print)
        };
        drop(print);

        if let Err(e) = &bitmap {
            warn!("capture failed, presentation restored: {e}");
        }
        bitmap
    }

    /// Rasterize the target as currently presented
    ///
    /// Callers that hold their own [`PrintMode`] and [`WidthLock`] guards
    /// (for example across a rendering pass) use this directly.
    pub fn snapshot<T: CaptureTarget + ?Sized>(
        &mut self,
        draft: &DocumentDraft,
        target: &T,
    ) -> Result<RgbImage> {
        let state = ViewState {
            mode: target.mode(),
            focused: None,
        };
        let blocks = build_view(draft, &state);
        let list = layout(&blocks, target.layout_width(), self.rasterizer.metrics());
        self.rasterizer.rasterize(&list, self.config.scale)
    }

    /// Paginate a captured bitmap into a named PDF
    pub fn package(&self, draft: &DocumentDraft, bitmap: &RgbImage) -> Result<ExportedFile> {
        let page_size = self.config.paper.page_size();
        let page_count = page_count(bitmap.width(), bitmap.height(), page_size);
        let bytes = assemble_pdf(bitmap, &self.config)?;
        let filename = export_filename(draft.tenant_name(), &self.config.filename_suffix);

        info!(
            "exported {filename}: {page_count} page(s), {} bytes",
            bytes.len()
        );
        Ok(ExportedFile {
            filename,
            bytes,
            page_count,
        })
    }
}

/// Build the PDF: one embedded image shown on every page at a sliding offset
pub fn assemble_pdf(bitmap: &RgbImage, config: &ExportConfig) -> Result<Vec<u8>> {
    let page_size = config.paper.page_size();
    let mut doc = PdfDocument::new(page_size);
    doc.set_title(&config.title);

    if bitmap.width() == 0 || bitmap.height() == 0 {
        doc.add_blank_page()?;
        return Ok(doc.to_bytes()?);
    }

    let xobject = match config.encoding {
        ImageEncoding::Flate => ImageXObject::from_rgb8(bitmap)?,
        ImageEncoding::Jpeg => ImageXObject::from_rgb8_jpeg(bitmap, config.jpeg_quality)?,
    };
    let image = doc.embed_image(xobject)?;

    for slice in paginate(bitmap.width(), bitmap.height(), page_size) {
        let page = doc.add_blank_page()?;
        doc.place_image(
            image,
            page,
            0.0,
            slice.offset_y,
            slice.image_width,
            slice.image_height,
        )?;
    }

    Ok(doc.to_bytes()?)
}

/// File name derived from the tenant name plus a fixed suffix
///
/// ```
/// use capture::export_filename;
///
/// assert_eq!(export_filename("Acme / Co", "Lease Addendum"), "Acme Co Lease Addendum.pdf");
/// assert_eq!(export_filename("  ", "Lease Addendum"), "Lease Lease Addendum.pdf");
/// ```
pub fn export_filename(tenant_name: &str, suffix: &str) -> String {
    let cleaned: String = tenant_name
        .chars()
        .filter(|c| !ILLEGAL_FILENAME_CHARS.contains(c) && !c.is_control())
        .collect();
    let name = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    let name = if name.is_empty() {
        FALLBACK_FILENAME
    } else {
        name.as_str()
    };

    let suffix = suffix.trim();
    if suffix.is_empty() {
        format!("{name}.pdf")
    } else {
        format!("{name} {suffix}.pdf")
    }
}
