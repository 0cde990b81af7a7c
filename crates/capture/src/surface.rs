//! Capture surfaces and scoped presentation overrides

use log::debug;
use serde::Serialize;
use std::ops::{Deref, DerefMut};

/// Presentation mode of the rendered document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Inline inputs, focus rings and add/remove actions
    #[default]
    Edit,
    /// Static text only, as printed
    Capture,
}

/// The rendered subtree an export captures
///
/// Implemented by the in-memory [`Surface`] and by the browser bindings.
pub trait CaptureTarget {
    fn mode(&self) -> Mode;

    fn set_mode(&mut self, mode: Mode);

    /// Explicit width in CSS pixels, if one is forced
    fn width_override(&self) -> Option<f64>;

    fn set_width_override(&mut self, width: Option<f64>);

    /// Width the document is laid out at right now
    fn layout_width(&self) -> f64;
}

/// In-memory capture target with a natural (container) width
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    mode: Mode,
    natural_width: f64,
    width_override: Option<f64>,
}

impl Surface {
    pub fn new(natural_width: f64) -> Self {
        Self {
            mode: Mode::Edit,
            natural_width,
            width_override: None,
        }
    }
}

impl CaptureTarget for Surface {
    fn mode(&self) -> Mode {
        self.mode
    }

    fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    fn width_override(&self) -> Option<f64> {
        self.width_override
    }

    fn set_width_override(&mut self, width: Option<f64>) {
        self.width_override = width;
    }

    fn layout_width(&self) -> f64 {
        self.width_override.unwrap_or(self.natural_width)
    }
}

/// Keeps a target in capture mode until dropped
///
/// The previous mode is restored on drop, including early returns and
/// unwinding.
pub struct PrintMode<'a, T: CaptureTarget + ?Sized> {
    target: &'a mut T,
    previous: Mode,
}

impl<'a, T: CaptureTarget + ?Sized> PrintMode<'a, T> {
    pub fn enter(target: &'a mut T) -> Self {
        let previous = target.mode();
        target.set_mode(Mode::Capture);
        Self { target, previous }
    }
}

impl<T: CaptureTarget + ?Sized> Deref for PrintMode<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.target
    }
}

impl<T: CaptureTarget + ?Sized> DerefMut for PrintMode<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.target
    }
}

impl<T: CaptureTarget + ?Sized> Drop for PrintMode<'_, T> {
    fn drop(&mut self) {
        self.target.set_mode(self.previous);
    }
}

/// Forces a fixed layout width until dropped, then restores the original
pub struct WidthLock<'a, T: CaptureTarget + ?Sized> {
    target: &'a mut T,
    original: Option<f64>,
}

impl<'a, T: CaptureTarget + ?Sized> WidthLock<'a, T> {
    pub fn acquire(target: &'a mut T, width: f64) -> Self {
        let original = target.width_override();
        debug!("locking capture width to {width}px (was {original:?})");
        target.set_width_override(Some(width));
        Self { target, original }
    }
}

impl<T: CaptureTarget + ?Sized> Deref for WidthLock<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.target
    }
}

impl<T: CaptureTarget + ?Sized> DerefMut for WidthLock<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.target
    }
}

impl<T: CaptureTarget + ?Sized> Drop for WidthLock<'_, T> {
    fn drop(&mut self) {
        self.target.set_width_override(self.original);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_mode_restores() {
        let mut surface = Surface::new(1200.0);
        {
            let guard = PrintMode::enter(&mut surface);
            assert_eq!(guard.mode(), Mode::Capture);
        }
        assert_eq!(surface.mode(), Mode::Edit);
    }

    #[test]
    fn test_width_lock_restores_original() {
        let mut surface = Surface::new(1200.0);
        surface.set_width_override(Some(900.0));
        {
            let lock = WidthLock::acquire(&mut surface, 816.0);
            assert_eq!(lock.layout_width(), 816.0);
        }
        assert_eq!(surface.width_override(), Some(900.0));
        assert_eq!(surface.layout_width(), 900.0);
    }

    #[test]
    fn test_nested_guards_unwind_in_order() {
        let mut surface = Surface::new(640.0);
        {
            let mut print = PrintMode::enter(&mut surface);
            let lock = WidthLock::acquire(&mut *print, 794.0);
            assert_eq!(lock.mode(), Mode::Capture);
            assert_eq!(lock.layout_width(), 794.0);
        }
        assert_eq!(surface, Surface::new(640.0));
    }

    #[test]
    fn test_guards_restore_on_panic() {
        let mut surface = Surface::new(640.0);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut print = PrintMode::enter(&mut surface);
            let _lock = WidthLock::acquire(&mut *print, 794.0);
            panic!("raster crashed");
        }));
        assert!(result.is_err());
        assert_eq!(surface.mode(), Mode::Edit);
        assert_eq!(surface.width_override(), None);
    }
}
