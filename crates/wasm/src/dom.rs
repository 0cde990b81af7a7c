//! DOM glue: capture surface, clock, render-pass waits and file download

use capture::{CaptureTarget, Clock, Mode};
use js_sys::{Array, Promise, Uint8Array};
use log::warn;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, BlobPropertyBag, Document, HtmlAnchorElement, HtmlElement, Url};

const MODE_ATTRIBUTE: &str = "data-mode";

/// How long a download's object URL stays alive after the click
const REVOKE_DELAY_MS: i32 = 40_000;

/// The mounted document container
///
/// Capture mode is exposed as a `data-mode` attribute for the host page's
/// stylesheet; the width lock is an inline `width` style.
pub struct DomSurface {
    element: HtmlElement,
}

impl DomSurface {
    /// Find the container by id; `None` when it is not mounted
    pub fn find(document: &Document, id: &str) -> Option<Self> {
        document
            .get_element_by_id(id)
            .and_then(|element| element.dyn_into::<HtmlElement>().ok())
            .map(|element| Self { element })
    }
}

impl CaptureTarget for DomSurface {
    fn mode(&self) -> Mode {
        match self.element.get_attribute(MODE_ATTRIBUTE).as_deref() {
            Some("capture") => Mode::Capture,
            _ => Mode::Edit,
        }
    }

    fn set_mode(&mut self, mode: Mode) {
        let value = match mode {
            Mode::Edit => "edit",
            Mode::Capture => "capture",
        };
        if let Err(e) = self.element.set_attribute(MODE_ATTRIBUTE, value) {
            warn!("could not set {MODE_ATTRIBUTE}: {e:?}");
        }
    }

    fn width_override(&self) -> Option<f64> {
        let width = self.element.style().get_property_value("width").ok()?;
        width.trim().strip_suffix("px")?.trim().parse().ok()
    }

    fn set_width_override(&mut self, width: Option<f64>) {
        let style = self.element.style();
        let result = match width {
            Some(px) => style.set_property("width", &format!("{px}px")),
            None => style.remove_property("width").map(|_| ()),
        };
        if let Err(e) = result {
            warn!("could not update capture width: {e:?}");
        }
    }

    fn layout_width(&self) -> f64 {
        self.width_override()
            .unwrap_or_else(|| self.element.client_width() as f64)
    }
}

/// Wall-clock milliseconds from `Date.now()`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsClock;

impl Clock for JsClock {
    fn now_ms(&self) -> u64 {
        js_sys::Date::now() as u64
    }
}

/// Resolve once web fonts have loaded
pub async fn fonts_ready(document: &Document) -> Result<(), JsValue> {
    JsFuture::from(document.fonts().ready()?).await?;
    Ok(())
}

/// Resolve on the next animation frame, after layout has caught up
pub async fn next_frame() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let mut scheduled = Ok(0);
    let promise = Promise::new(&mut |resolve, _reject| {
        scheduled = window.request_animation_frame(&resolve);
    });
    scheduled?;
    JsFuture::from(promise).await?;
    Ok(())
}

/// Save bytes as a local file through a temporary object URL
///
/// The URL is revoked on a timer, after the browser has started the save.
/// Returns the URL.
pub fn download(
    document: &Document,
    bytes: &[u8],
    filename: &str,
    mime: &str,
) -> Result<String, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let parts = Array::new();
    parts.push(&Uint8Array::from(bytes));

    let options = BlobPropertyBag::new();
    options.set_type(mime);
    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;
    let url = Url::create_object_url_with_blob(&blob)?;

    let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
    anchor.set_href(&url);
    anchor.set_download(filename);
    anchor.click();

    let pending = url.clone();
    let revoke = Closure::once_into_js(move || {
        if let Err(e) = Url::revoke_object_url(&pending) {
            warn!("could not revoke {pending}: {e:?}");
        }
    });
    window.set_timeout_with_callback_and_timeout_and_arguments_0(
        revoke.unchecked_ref(),
        REVOKE_DELAY_MS,
    )?;
    Ok(url)
}
