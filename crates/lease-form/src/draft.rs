//! The document draft

use crate::currency::{amount_text, keep_numeric, parse_currency};
use crate::field::FieldId;
use crate::lines::{CustomLines, LineId};
use crate::text::{date_status, DateStatus};
use serde::Serialize;

/// Number of lessee signature blocks the form can show
pub const MAX_LESSEES: usize = 2;

/// Lessor name printed when none is configured
const DEFAULT_LESSOR: &str = "Lessor";

/// A currency cell: the keystrokes as typed plus their parsed amount
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CurrencyField {
    /// Digits and decimal points only
    raw: String,
    value: f64,
}

impl CurrencyField {
    fn set(&mut self, keystrokes: &str) {
        self.raw = keep_numeric(keystrokes);
        self.value = parse_currency(&self.raw);
    }

    /// Replace the raw text with the canonical text of the parsed amount
    ///
    /// Text without a digit clears the cell; a typed zero stays `0`.
    fn canonicalize(&mut self) {
        self.raw = if self.raw.bytes().any(|b| b.is_ascii_digit()) {
            amount_text(self.value)
        } else {
            String::new()
        };
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

/// The four monthly rent line items
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RentSchedule {
    pub base_rent: CurrencyField,
    pub insurance: CurrencyField,
    pub tax: CurrencyField,
    pub cam: CurrencyField,
}

impl RentSchedule {
    fn cell(&self, field: FieldId) -> Option<&CurrencyField> {
        match field {
            FieldId::BaseRent => Some(&self.base_rent),
            FieldId::Insurance => Some(&self.insurance),
            FieldId::Tax => Some(&self.tax),
            FieldId::Cam => Some(&self.cam),
            _ => None,
        }
    }

    fn cell_mut(&mut self, field: FieldId) -> Option<&mut CurrencyField> {
        match field {
            FieldId::BaseRent => Some(&mut self.base_rent),
            FieldId::Insurance => Some(&mut self.insurance),
            FieldId::Tax => Some(&mut self.tax),
            FieldId::Cam => Some(&mut self.cam),
            _ => None,
        }
    }

    /// Sum of the four line items
    pub fn sum(&self) -> f64 {
        self.base_rent.value + self.insurance.value + self.tax.value + self.cam.value
    }
}

/// One lessee signature block
///
/// Each block owns its company name; blocks never mirror each other.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lessee {
    pub company: String,
    pub signer_name: String,
    pub signer_title: String,
}

/// How many lessee blocks are shown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum LesseeCount {
    #[default]
    One,
    Two,
}

impl LesseeCount {
    pub fn toggled(self) -> Self {
        match self {
            LesseeCount::One => LesseeCount::Two,
            LesseeCount::Two => LesseeCount::One,
        }
    }

    pub fn get(self) -> usize {
        match self {
            LesseeCount::One => 1,
            LesseeCount::Two => 2,
        }
    }
}

/// Every editable value of the addendum plus the derived rent total
///
/// Fields start empty; all mutation goes through the setters, which sanitize
/// silently and keep `total` equal to the sum of the rent line items.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDraft {
    addendum_letter: String,
    initial_date: String,
    tenant_name: String,
    lease_start: String,
    lease_end: String,
    rent: RentSchedule,
    total: f64,
    custom_lines: CustomLines,
    lessee_count: LesseeCount,
    lessees: [Lessee; MAX_LESSEES],
    lessor_name: String,
}

impl Default for DocumentDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentDraft {
    /// Create an empty draft
    pub fn new() -> Self {
        Self::with_lessor(DEFAULT_LESSOR)
    }

    /// Create an empty draft with a fixed lessor name
    pub fn with_lessor(lessor_name: &str) -> Self {
        Self {
            addendum_letter: String::new(),
            initial_date: String::new(),
            tenant_name: String::new(),
            lease_start: String::new(),
            lease_end: String::new(),
            rent: RentSchedule::default(),
            total: 0.0,
            custom_lines: CustomLines::default(),
            lessee_count: LesseeCount::default(),
            lessees: Default::default(),
            lessor_name: lessor_name.to_string(),
        }
    }

    /// Apply an edit to any field
    ///
    /// Currency fields keep digits and decimal points and re-derive the total;
    /// text fields are sanitized by their [`crate::TextRule`]. Lessee indices
    /// outside the form are ignored.
    pub fn set_field(&mut self, field: FieldId, input: &str) {
        if let Some(cell) = self.rent.cell_mut(field) {
            cell.set(input);
            self.recompute_total();
            return;
        }

        let value = field.rule().apply(input);
        if let Some(slot) = self.text_slot_mut(field) {
            *slot = value;
        }
    }

    /// Current text of a field
    ///
    /// Currency fields return their raw keystroke text.
    pub fn field_text(&self, field: FieldId) -> &str {
        if let Some(cell) = self.rent.cell(field) {
            return cell.raw();
        }
        match field {
            FieldId::AddendumLetter => &self.addendum_letter,
            FieldId::InitialDate => &self.initial_date,
            FieldId::TenantName => &self.tenant_name,
            FieldId::LeaseStart => &self.lease_start,
            FieldId::LeaseEnd => &self.lease_end,
            FieldId::LesseeCompany(i) => self.lessees.get(i).map_or("", |l| &l.company),
            FieldId::LesseeSigner(i) => self.lessees.get(i).map_or("", |l| &l.signer_name),
            FieldId::LesseeTitle(i) => self.lessees.get(i).map_or("", |l| &l.signer_title),
            FieldId::BaseRent | FieldId::Insurance | FieldId::Tax | FieldId::Cam => "",
        }
    }

    /// Parsed amount of a currency field (None for text fields)
    pub fn amount(&self, field: FieldId) -> Option<f64> {
        self.rent.cell(field).map(CurrencyField::value)
    }

    /// Whether a field has no content (its placeholder would show)
    pub fn is_blank(&self, field: FieldId) -> bool {
        self.field_text(field).trim().is_empty()
    }

    /// Soft validation of a date field
    pub fn date_status(&self, field: FieldId) -> DateStatus {
        date_status(self.field_text(field))
    }

    /// Rewrite a currency field's raw text to its canonical form (on blur)
    pub fn canonicalize_amount(&mut self, field: FieldId) {
        if let Some(cell) = self.rent.cell_mut(field) {
            cell.canonicalize();
        }
    }

    pub fn set_addendum_letter(&mut self, value: &str) {
        self.set_field(FieldId::AddendumLetter, value);
    }

    pub fn set_initial_date(&mut self, value: &str) {
        self.set_field(FieldId::InitialDate, value);
    }

    pub fn set_tenant_name(&mut self, value: &str) {
        self.set_field(FieldId::TenantName, value);
    }

    pub fn set_lease_start(&mut self, value: &str) {
        self.set_field(FieldId::LeaseStart, value);
    }

    pub fn set_lease_end(&mut self, value: &str) {
        self.set_field(FieldId::LeaseEnd, value);
    }

    pub fn set_base_rent(&mut self, keystrokes: &str) {
        self.set_field(FieldId::BaseRent, keystrokes);
    }

    pub fn set_insurance(&mut self, keystrokes: &str) {
        self.set_field(FieldId::Insurance, keystrokes);
    }

    pub fn set_tax(&mut self, keystrokes: &str) {
        self.set_field(FieldId::Tax, keystrokes);
    }

    pub fn set_cam(&mut self, keystrokes: &str) {
        self.set_field(FieldId::Cam, keystrokes);
    }

    pub fn addendum_letter(&self) -> &str {
        &self.addendum_letter
    }

    pub fn initial_date(&self) -> &str {
        &self.initial_date
    }

    pub fn tenant_name(&self) -> &str {
        &self.tenant_name
    }

    pub fn lease_start(&self) -> &str {
        &self.lease_start
    }

    pub fn lease_end(&self) -> &str {
        &self.lease_end
    }

    pub fn rent(&self) -> &RentSchedule {
        &self.rent
    }

    pub fn lessor_name(&self) -> &str {
        &self.lessor_name
    }

    /// Monthly total; always the sum of the four rent line items
    pub fn total(&self) -> f64 {
        self.total
    }

    fn recompute_total(&mut self) {
        self.total = self.rent.sum();
    }

    pub fn custom_lines(&self) -> &CustomLines {
        &self.custom_lines
    }

    /// Append an empty custom line
    pub fn add_line(&mut self) -> LineId {
        self.custom_lines.add()
    }

    /// Remove a custom line; returns false if it does not exist
    pub fn remove_line(&mut self, id: LineId) -> bool {
        self.custom_lines.remove(id)
    }

    /// Edit a custom line; returns false if it does not exist
    pub fn set_line_text(&mut self, id: LineId, text: &str) -> bool {
        self.custom_lines.set_text(id, text)
    }

    pub fn lessee_count(&self) -> LesseeCount {
        self.lessee_count
    }

    /// Switch between one and two lessee blocks
    ///
    /// Hiding the second block keeps its values, so toggling back restores them.
    pub fn toggle_lessees(&mut self) -> LesseeCount {
        self.lessee_count = self.lessee_count.toggled();
        self.lessee_count
    }

    pub fn set_lessee_count(&mut self, count: LesseeCount) {
        self.lessee_count = count;
    }

    /// Lessee blocks currently shown
    pub fn active_lessees(&self) -> &[Lessee] {
        &self.lessees[..self.lessee_count.get()]
    }

    fn text_slot_mut(&mut self, field: FieldId) -> Option<&mut String> {
        match field {
            FieldId::AddendumLetter => Some(&mut self.addendum_letter),
            FieldId::InitialDate => Some(&mut self.initial_date),
            FieldId::TenantName => Some(&mut self.tenant_name),
            FieldId::LeaseStart => Some(&mut self.lease_start),
            FieldId::LeaseEnd => Some(&mut self.lease_end),
            FieldId::LesseeCompany(i) => self.lessees.get_mut(i).map(|l| &mut l.company),
            FieldId::LesseeSigner(i) => self.lessees.get_mut(i).map(|l| &mut l.signer_name),
            FieldId::LesseeTitle(i) => self.lessees.get_mut(i).map(|l| &mut l.signer_title),
            FieldId::BaseRent | FieldId::Insurance | FieldId::Tax | FieldId::Cam => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_draft_is_empty() {
        let draft = DocumentDraft::new();
        assert_eq!(draft.total(), 0.0);
        assert_eq!(draft.tenant_name(), "");
        assert_eq!(draft.lessee_count(), LesseeCount::One);
        assert!(draft.custom_lines().is_empty());
        assert_eq!(draft.lessor_name(), "Lessor");
    }

    #[test]
    fn test_total_tracks_every_edit() {
        let mut draft = DocumentDraft::new();
        let edits = [
            (FieldId::BaseRent, "2,000"),
            (FieldId::Insurance, "$125.25"),
            (FieldId::Tax, "310.10"),
            (FieldId::Cam, "95"),
            (FieldId::BaseRent, "2100"),
            (FieldId::Tax, ""),
            (FieldId::Insurance, "abc"),
        ];

        for (field, input) in edits {
            draft.set_field(field, input);
            let expected = draft.rent().base_rent.value()
                + draft.rent().insurance.value()
                + draft.rent().tax.value()
                + draft.rent().cam.value();
            assert_eq!(draft.total(), expected, "after editing {field}");
        }
        assert_eq!(draft.total(), 2195.0);
    }

    #[test]
    fn test_currency_keeps_numeric_raw() {
        let mut draft = DocumentDraft::new();
        draft.set_base_rent("$1,234.56abc");
        assert_eq!(draft.field_text(FieldId::BaseRent), "1234.56");
        assert_eq!(draft.amount(FieldId::BaseRent), Some(1234.56));
        assert_eq!(draft.amount(FieldId::TenantName), None);
    }

    #[test]
    fn test_canonicalize_amount() {
        let mut draft = DocumentDraft::new();
        draft.set_cam("1.2.3");
        draft.canonicalize_amount(FieldId::Cam);
        assert_eq!(draft.field_text(FieldId::Cam), "1.20");

        draft.set_cam("..");
        draft.canonicalize_amount(FieldId::Cam);
        assert_eq!(draft.field_text(FieldId::Cam), "");
        assert!(draft.is_blank(FieldId::Cam));
    }

    #[test]
    fn test_typed_zero_survives_blur() {
        let mut draft = DocumentDraft::new();
        draft.set_field(FieldId::Insurance, "0");
        draft.canonicalize_amount(FieldId::Insurance);
        assert_eq!(draft.field_text(FieldId::Insurance), "0");
        assert!(!draft.is_blank(FieldId::Insurance));

        draft.set_field(FieldId::Insurance, "$0.00");
        draft.canonicalize_amount(FieldId::Insurance);
        assert_eq!(draft.field_text(FieldId::Insurance), "0");
    }

    #[test]
    fn test_letter_is_clipped_and_uppercased() {
        let mut draft = DocumentDraft::new();
        draft.set_addendum_letter("bq");
        assert_eq!(draft.addendum_letter(), "B");
    }

    #[test]
    fn test_quotes_stripped_from_sentence_fields() {
        let mut draft = DocumentDraft::new();
        draft.set_tenant_name(r#"The "Best" Bakery"#);
        assert_eq!(draft.tenant_name(), "The Best Bakery");
    }

    #[test]
    fn test_lessee_companies_are_independent() {
        let mut draft = DocumentDraft::new();
        draft.toggle_lessees();
        draft.set_field(FieldId::LesseeCompany(0), "North LLC");
        draft.set_field(FieldId::LesseeCompany(1), "South Inc");

        let names: Vec<&str> = draft
            .active_lessees()
            .iter()
            .map(|l| l.company.as_str())
            .collect();
        assert_eq!(names, vec!["North LLC", "South Inc"]);
    }

    #[test]
    fn test_toggle_preserves_second_lessee() {
        let mut draft = DocumentDraft::new();
        assert_eq!(draft.toggle_lessees(), LesseeCount::Two);
        draft.set_field(FieldId::LesseeSigner(1), "Pat Doe");

        assert_eq!(draft.toggle_lessees(), LesseeCount::One);
        assert_eq!(draft.active_lessees().len(), 1);

        draft.toggle_lessees();
        assert_eq!(draft.active_lessees()[1].signer_name, "Pat Doe");
    }

    #[test]
    fn test_out_of_range_lessee_ignored() {
        let mut draft = DocumentDraft::new();
        draft.set_field(FieldId::LesseeCompany(5), "Nobody");
        assert_eq!(draft.field_text(FieldId::LesseeCompany(5)), "");
    }

    #[test]
    fn test_date_status_of_field() {
        let mut draft = DocumentDraft::new();
        assert_eq!(draft.date_status(FieldId::LeaseStart), DateStatus::Empty);
        draft.set_lease_start("02/30/2025");
        assert_eq!(draft.date_status(FieldId::LeaseStart), DateStatus::Invalid);
        draft.set_lease_start("03/01/2025");
        assert_eq!(draft.date_status(FieldId::LeaseStart), DateStatus::Valid);
    }
}
