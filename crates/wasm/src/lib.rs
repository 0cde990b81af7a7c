//! WASM bindings for the lease addendum form
//!
//! This crate provides a JavaScript-friendly controller for:
//! - Editing the addendum fields, custom lines and lessee blocks
//! - Reading the view model to render the form
//! - Exporting the document as a paginated PDF download
//!
//! # Example (JavaScript)
//!
//! ```javascript
//! import init, { LeaseAddendum } from 'addendum-wasm';
//!
//! await init();
//!
//! const form = new LeaseAddendum();
//! form.loadFont(regularTtf);
//! form.loadBoldFont(boldTtf);
//!
//! form.setField('tenantName', 'Corner Coffee LLC');
//! form.setField('baseRent', '$4,500');
//! console.log(form.totalDisplay()); // "$4,500.00"
//!
//! const line = form.addLine();
//! form.setLineText(line, 'Tenant may install signage.');
//!
//! // Resolves to the saved file summary, or null when skipped
//! const saved = await form.exportPdf('addendum');
//! ```

mod dom;
mod logger;

use capture::{
    build_control, build_view, CaptureTarget, ExportConfig, Exporter, GlyphFonts, Mode,
    PrintMode, SkiaRasterizer, ViewState, WidthLock,
};
use dom::{DomSurface, JsClock};
use image::RgbImage;
use lease_form::{format_currency, DocumentDraft, FieldId, LineId};
use log::{error, warn, LevelFilter};
use serde::Serialize;
use std::cell::RefCell;
use std::fmt::Display;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

// Initialize panic hook and console logging
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    logger::install(LevelFilter::Info);
}

fn js_error(e: impl Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Summary of a saved export, returned to JavaScript
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SavedExport {
    filename: String,
    page_count: usize,
    size: usize,
}

struct FormState {
    draft: DocumentDraft,
    view: ViewState,
    exporter: Exporter<SkiaRasterizer, JsClock>,
    bold_font: Option<Vec<u8>>,
}

/// Lease addendum form controller
#[wasm_bindgen]
pub struct LeaseAddendum {
    state: Rc<RefCell<FormState>>,
}

#[wasm_bindgen]
impl LeaseAddendum {
    /// Create an empty form
    #[wasm_bindgen(constructor)]
    pub fn new() -> LeaseAddendum {
        Self::from_draft(DocumentDraft::new())
    }

    /// Create an empty form with a fixed lessor name
    ///
    /// @param name - Lessor name printed in the document
    #[wasm_bindgen(js_name = withLessor)]
    pub fn with_lessor(name: &str) -> LeaseAddendum {
        Self::from_draft(DocumentDraft::with_lessor(name))
    }

    /// Apply an edit to a field
    ///
    /// @param name - Field name (e.g. "tenantName", "baseRent", "lessee2Company")
    /// @param value - Raw input value
    #[wasm_bindgen(js_name = setField)]
    pub fn set_field(&self, name: &str, value: &str) -> Result<(), JsValue> {
        let field: FieldId = name.parse().map_err(js_error)?;
        self.state.borrow_mut().draft.set_field(field, value);
        Ok(())
    }

    /// Stored text of a field (raw keystrokes for currency fields)
    #[wasm_bindgen(js_name = fieldText)]
    pub fn field_text(&self, name: &str) -> Result<String, JsValue> {
        let field: FieldId = name.parse().map_err(js_error)?;
        Ok(self.state.borrow().draft.field_text(field).to_string())
    }

    /// Text a control should show right now (formatted unless focused)
    #[wasm_bindgen(js_name = displayValue)]
    pub fn display_value(&self, name: &str) -> Result<String, JsValue> {
        let field: FieldId = name.parse().map_err(js_error)?;
        let state = self.state.borrow();
        Ok(build_control(&state.draft, &state.view, field).value)
    }

    /// Soft validation of a date field: "empty", "valid" or "invalid"
    #[wasm_bindgen(js_name = dateStatus)]
    pub fn date_status(&self, name: &str) -> Result<JsValue, JsValue> {
        let field: FieldId = name.parse().map_err(js_error)?;
        let status = self.state.borrow().draft.date_status(field);
        Ok(serde_wasm_bindgen::to_value(&status)?)
    }

    /// Mark a field as focused
    #[wasm_bindgen(js_name = focusField)]
    pub fn focus_field(&self, name: &str) -> Result<(), JsValue> {
        let field: FieldId = name.parse().map_err(js_error)?;
        self.state.borrow_mut().view.focus(field);
        Ok(())
    }

    /// Clear focus; a blurred currency field is rewritten in canonical form
    #[wasm_bindgen(js_name = blurField)]
    pub fn blur_field(&self) {
        let mut state = self.state.borrow_mut();
        if let Some(field) = state.view.blur() {
            state.draft.canonicalize_amount(field);
        }
    }

    /// Monthly total (sum of the four rent items)
    pub fn total(&self) -> f64 {
        self.state.borrow().draft.total()
    }

    /// Monthly total formatted as currency
    #[wasm_bindgen(js_name = totalDisplay)]
    pub fn total_display(&self) -> String {
        format_currency(self.state.borrow().draft.total())
    }

    /// Append a custom line
    ///
    /// @returns Line id
    #[wasm_bindgen(js_name = addLine)]
    pub fn add_line(&self) -> String {
        self.state.borrow_mut().draft.add_line().to_string()
    }

    /// Remove a custom line
    ///
    /// @returns false if the line does not exist
    #[wasm_bindgen(js_name = removeLine)]
    pub fn remove_line(&self, id: &str) -> Result<bool, JsValue> {
        let id: LineId = id.parse().map_err(js_error)?;
        Ok(self.state.borrow_mut().draft.remove_line(id))
    }

    /// Replace a custom line's text
    ///
    /// @returns false if the line does not exist
    #[wasm_bindgen(js_name = setLineText)]
    pub fn set_line_text(&self, id: &str, text: &str) -> Result<bool, JsValue> {
        let id: LineId = id.parse().map_err(js_error)?;
        Ok(self.state.borrow_mut().draft.set_line_text(id, text))
    }

    /// Switch between one and two lessee blocks
    ///
    /// @returns New lessee count
    #[wasm_bindgen(js_name = toggleLessees)]
    pub fn toggle_lessees(&self) -> u32 {
        self.state.borrow_mut().draft.toggle_lessees().get() as u32
    }

    #[wasm_bindgen(js_name = lesseeCount)]
    pub fn lessee_count(&self) -> u32 {
        self.state.borrow().draft.lessee_count().get() as u32
    }

    /// Current view tree (blocks of text and controls)
    #[wasm_bindgen(js_name = viewModel)]
    pub fn view_model(&self) -> Result<JsValue, JsValue> {
        let state = self.state.borrow();
        let blocks = build_view(&state.draft, &state.view);
        Ok(serde_wasm_bindgen::to_value(&blocks)?)
    }

    /// All draft values as a plain object
    pub fn draft(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.state.borrow().draft)?)
    }

    /// Load the regular text font
    ///
    /// @param data - TTF file bytes (Uint8Array)
    #[wasm_bindgen(js_name = loadFont)]
    pub fn load_font(&self, data: &[u8]) -> Result<(), JsValue> {
        let mut state = self.state.borrow_mut();
        let mut fonts = GlyphFonts::from_regular(data.to_vec()).map_err(js_error)?;
        if let Some(bold) = &state.bold_font {
            fonts.set_bold(bold.clone()).map_err(js_error)?;
        }
        state.exporter.rasterizer_mut().set_fonts(fonts);
        Ok(())
    }

    /// Load the bold text font (used for headings and totals)
    ///
    /// @param data - TTF file bytes (Uint8Array)
    #[wasm_bindgen(js_name = loadBoldFont)]
    pub fn load_bold_font(&self, data: &[u8]) -> Result<(), JsValue> {
        let mut state = self.state.borrow_mut();
        if let Some(fonts) = state.exporter.rasterizer_mut().fonts_mut() {
            fonts.set_bold(data.to_vec()).map_err(js_error)?;
        }
        state.bold_font = Some(data.to_vec());
        Ok(())
    }

    /// Replace the export settings
    ///
    /// @param json - Export configuration JSON (partial objects allowed)
    #[wasm_bindgen(js_name = setExportConfig)]
    pub fn set_export_config(&self, json: &str) -> Result<(), JsValue> {
        let config = ExportConfig::from_json(json).map_err(js_error)?;
        self.state
            .borrow_mut()
            .exporter
            .set_config(config)
            .map_err(js_error)
    }

    /// Whether an export is in flight
    #[wasm_bindgen(js_name = isExporting)]
    pub fn is_exporting(&self) -> bool {
        self.state.borrow().exporter.is_busy()
    }

    /// Presentation mode: "edit" or "capture"
    pub fn mode(&self) -> String {
        match self.state.borrow().view.mode {
            Mode::Edit => "edit".to_string(),
            Mode::Capture => "capture".to_string(),
        }
    }

    /// Export the document mounted in `containerId` as a PDF download
    ///
    /// Resolves to `{ filename, pageCount, size }`, or `null` when the
    /// container is not mounted or another export is running. Failures are
    /// shown to the user and reject the promise.
    ///
    /// @param containerId - Id of the element the form is rendered into
    #[wasm_bindgen(js_name = exportPdf)]
    pub fn export_pdf(&self, container_id: String) -> js_sys::Promise {
        let state = Rc::clone(&self.state);
        wasm_bindgen_futures::future_to_promise(async move {
            match run_export(&state, &container_id).await {
                Ok(Some(saved)) => Ok(serde_wasm_bindgen::to_value(&saved)?),
                Ok(None) => Ok(JsValue::NULL),
                Err(e) => {
                    error!("export failed: {e:?}");
                    if let Some(window) = web_sys::window() {
                        let message = e.as_string().unwrap_or_else(|| "unknown error".to_string());
                        let _ = window.alert_with_message(&format!("Could not export PDF: {message}"));
                    }
                    Err(e)
                }
            }
        })
    }
}

impl LeaseAddendum {
    fn from_draft(draft: DocumentDraft) -> Self {
        let state = FormState {
            draft,
            view: ViewState::default(),
            exporter: Exporter::with_clock(
                ExportConfig::default(),
                SkiaRasterizer::without_fonts(),
                JsClock,
            ),
            bold_font: None,
        };
        LeaseAddendum {
            state: Rc::new(RefCell::new(state)),
        }
    }
}

impl Default for LeaseAddendum {
    fn default() -> Self {
        Self::new()
    }
}

/// Export pipeline with browser waits between the layout change and capture
async fn run_export(
    state: &Rc<RefCell<FormState>>,
    container_id: &str,
) -> Result<Option<SavedExport>, JsValue> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let Some(mut surface) = DomSurface::find(&document, container_id) else {
        warn!("#{container_id} is not mounted, nothing to export");
        return Ok(None);
    };
    let Some(ticket) = state.borrow_mut().exporter.begin() else {
        return Ok(None);
    };

    let (lock_width, width) = {
        let state = state.borrow();
        let config = state.exporter.config();
        (config.lock_width, config.paper.capture_width_px())
    };

    state.borrow_mut().view.mode = Mode::Capture;
    let mut print = PrintMode::enter(&mut surface);
    let bitmap = if lock_width {
        let lock = WidthLock::acquire(&mut *print, width);
        snapshot_settled(state, &document, &*lock).await
    } else {
        snapshot_settled(state, &document, &*print).await
    };
    drop(print);
    state.borrow_mut().view.mode = Mode::Edit;

    let result = bitmap.and_then(|bitmap| {
        let state = state.borrow();
        state
            .exporter
            .package(&state.draft, &bitmap)
            .map_err(js_error)
    });
    state.borrow_mut().exporter.finish(ticket);

    let file = result?;
    dom::download(&document, &file.bytes, &file.filename, "application/pdf")?;
    Ok(Some(SavedExport {
        filename: file.filename,
        page_count: file.page_count,
        size: file.bytes.len(),
    }))
}

/// Wait for fonts and one rendering pass, then rasterize the target
async fn snapshot_settled<T: CaptureTarget + ?Sized>(
    state: &Rc<RefCell<FormState>>,
    document: &web_sys::Document,
    target: &T,
) -> Result<RgbImage, JsValue> {
    dom::fonts_ready(document).await?;
    dom::next_frame().await?;

    let mut state = state.borrow_mut();
    let FormState {
        draft, exporter, ..
    } = &mut *state;
    exporter.snapshot(draft, target).map_err(js_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_futures::JsFuture;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_total_follows_fields() {
        let form = LeaseAddendum::new();
        form.set_field("baseRent", "$1,000").unwrap();
        form.set_field("insurance", "50.25").unwrap();
        form.set_field("tax", "abc").unwrap();
        assert_eq!(form.total(), 1050.25);
        assert_eq!(form.total_display(), "$1,050.25");
    }

    #[wasm_bindgen_test]
    fn test_currency_display_follows_focus() {
        let form = LeaseAddendum::new();
        form.focus_field("cam").unwrap();
        form.set_field("cam", "1200.5").unwrap();
        assert_eq!(form.display_value("cam").unwrap(), "1200.5");

        form.blur_field();
        assert_eq!(form.field_text("cam").unwrap(), "1200.50");
        assert_eq!(form.display_value("cam").unwrap(), "$1,200.50");
    }

    #[wasm_bindgen_test]
    fn test_custom_lines() {
        let form = LeaseAddendum::new();
        let first = form.add_line();
        let second = form.add_line();
        assert!(form.set_line_text(&first, "Signage allowed").unwrap());
        assert!(form.remove_line(&second).unwrap());
        assert!(!form.remove_line(&second).unwrap());
    }

    #[wasm_bindgen_test]
    fn test_lessee_toggle() {
        let form = LeaseAddendum::new();
        assert_eq!(form.lessee_count(), 1);
        assert_eq!(form.toggle_lessees(), 2);
        form.set_field("lessee2Company", "Second Shop Inc").unwrap();
        assert_eq!(form.toggle_lessees(), 1);
        assert_eq!(form.toggle_lessees(), 2);
        assert_eq!(form.field_text("lessee2Company").unwrap(), "Second Shop Inc");
    }

    #[wasm_bindgen_test]
    fn test_not_exporting_initially() {
        let form = LeaseAddendum::new();
        assert!(!form.is_exporting());
        assert_eq!(form.mode(), "edit");
    }

    #[wasm_bindgen_test]
    async fn test_download_url_outlives_click() {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        let url = dom::download(&document, b"%PDF-1.4", "test.pdf", "application/pdf").unwrap();

        // still readable after the click; revocation happens on a timer
        let fetched = JsFuture::from(window.fetch_with_str(&url)).await;
        assert!(fetched.is_ok());
    }
}
