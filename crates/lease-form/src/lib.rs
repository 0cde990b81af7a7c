//! Lease Form - editable state of a lease addendum
//!
//! This crate provides:
//! - The document draft (every editable field plus the derived rent total)
//! - Currency keystroke parsing and `$1,234.56` formatting
//! - Text sanitization (quote stripping, length clipping, upper-casing)
//! - Soft MM/DD/YYYY date checks
//! - Ordered custom addendum lines with random identifiers
//!
//! # Example
//!
//! ```
//! use lease_form::{DocumentDraft, FieldId};
//!
//! let mut draft = DocumentDraft::new();
//! draft.set_field(FieldId::BaseRent, "$1,200.00");
//! draft.set_field(FieldId::Cam, "150.5");
//! assert_eq!(draft.total(), 1350.5);
//!
//! let line = draft.add_line();
//! draft.set_line_text(line, "Tenant may install signage.");
//! assert_eq!(draft.custom_lines().len(), 1);
//! ```

mod currency;
mod draft;
mod field;
mod lines;
mod text;

pub use currency::{amount_text, format_currency, parse_currency};
pub use draft::{CurrencyField, DocumentDraft, Lessee, LesseeCount, RentSchedule, MAX_LESSEES};
pub use field::FieldId;
pub use lines::{CustomLine, CustomLines, LineId};
pub use text::{date_status, strip_quotes, DateStatus, TextRule};

use thiserror::Error;

/// Errors from string-keyed lookups (used by bindings)
///
/// Field edits themselves never fail: malformed input is sanitized silently.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Unknown custom line: {0}")]
    UnknownLine(String),

    #[error("Lessee {0} out of range (1-{max})", max = MAX_LESSEES)]
    LesseeOutOfRange(usize),
}
