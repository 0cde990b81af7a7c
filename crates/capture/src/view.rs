//! View tree of the addendum document
//!
//! [`build_view`] turns a draft into blocks of static text and inline controls.
//! Controls pick their render path from the [`Mode`]: editable inputs in edit
//! mode, plain text in capture mode. The incomplete highlight is computed the
//! same way in both modes.

use crate::surface::Mode;
use lease_form::{format_currency, DateStatus, DocumentDraft, FieldId, LesseeCount, LineId};
use serde::Serialize;

/// Presentation state owned by the view controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub mode: Mode,
    pub focused: Option<FieldId>,
}

impl ViewState {
    /// State used while capturing: no focus, static rendering
    pub fn capture() -> Self {
        Self {
            mode: Mode::Capture,
            focused: None,
        }
    }

    pub fn focus(&mut self, field: FieldId) {
        self.focused = Some(field);
    }

    /// Clear focus and return the field that had it
    pub fn blur(&mut self) -> Option<FieldId> {
        self.focused.take()
    }

    fn is_focused(&self, field: FieldId) -> bool {
        self.mode == Mode::Edit && self.focused == Some(field)
    }
}

/// How an inline control sizes and formats itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ControlKind {
    /// Free text sized to its content, at least `min_chars` wide
    #[serde(rename_all = "camelCase")]
    Text { min_chars: usize },
    /// Soft-validated MM/DD/YYYY date
    Date,
    /// Formatted currency amount (fixed width)
    Currency,
    /// Single upper-case letter
    Letter,
}

/// An inline control bound to one draft field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Control {
    pub field: FieldId,
    pub kind: ControlKind,
    /// Text shown in the control (empty when the placeholder shows)
    pub value: String,
    pub placeholder: String,
    /// Highlighted as needing attention
    pub incomplete: bool,
    /// Rendered as an input (edit mode) rather than static text
    pub editable: bool,
}

impl Control {
    /// Text that ends up on screen: the value, or the placeholder when empty
    pub fn shown_text(&self) -> &str {
        if self.value.is_empty() {
            &self.placeholder
        } else {
            &self.value
        }
    }

    /// Content width in characters, never less than one
    pub fn width_chars(&self) -> usize {
        let min = match self.kind {
            ControlKind::Text { min_chars } => min_chars,
            ControlKind::Date => 10,
            ControlKind::Currency => 10,
            ControlKind::Letter => 1,
        };
        self.shown_text().chars().count().max(min).max(1)
    }
}

/// A run of inline content inside a block
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Inline {
    Text(String),
    Bold(String),
    Field(Control),
}

/// Editing affordance, only present in edit mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "line", rename_all = "camelCase")]
pub enum Action {
    AddLine,
    RemoveLine(LineId),
    ToggleLessees,
}

/// One block of the document, top to bottom
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Block {
    Heading {
        content: Vec<Inline>,
    },
    Paragraph {
        content: Vec<Inline>,
    },
    #[serde(rename_all = "camelCase")]
    RentRow {
        label: String,
        amount: Inline,
        is_total: bool,
    },
    #[serde(rename_all = "camelCase")]
    LineItem {
        id: LineId,
        number: usize,
        text: String,
        incomplete: bool,
        editable: bool,
    },
    #[serde(rename_all = "camelCase")]
    Signature {
        heading: String,
        party: Inline,
        signer: Inline,
        title: Inline,
    },
    Action {
        label: String,
        action: Action,
    },
}

impl Block {
    /// Whether this block only exists for editing
    pub fn is_action(&self) -> bool {
        matches!(self, Block::Action { .. })
    }
}

const RENT_LABELS: [&str; 4] = [
    "Base Rent",
    "Insurance",
    "Real Estate Tax",
    "Common Area Maintenance",
];

/// Build the view tree for a draft
pub fn build_view(draft: &DocumentDraft, state: &ViewState) -> Vec<Block> {
    let editing = state.mode == Mode::Edit;
    let control = |field: FieldId| build_control(draft, state, field);
    let mut blocks = Vec::new();

    blocks.push(Block::Heading {
        content: vec![
            Inline::Bold("ADDENDUM \u{201C}".to_string()),
            Inline::Field(control(FieldId::AddendumLetter)),
            Inline::Bold("\u{201D} TO LEASE".to_string()),
        ],
    });

    blocks.push(Block::Paragraph {
        content: vec![
            Inline::Text("This Addendum, dated".to_string()),
            Inline::Field(control(FieldId::InitialDate)),
            Inline::Text(format!(
                ", is made part of the lease between {} (\u{201C}Lessor\u{201D}) and",
                draft.lessor_name()
            )),
            Inline::Field(control(FieldId::TenantName)),
            Inline::Text(
                "(\u{201C}Lessee\u{201D}) for the term commencing".to_string(),
            ),
            Inline::Field(control(FieldId::LeaseStart)),
            Inline::Text("and ending".to_string()),
            Inline::Field(control(FieldId::LeaseEnd)),
            Inline::Text(". Monthly rent is payable as follows:".to_string()),
        ],
    });

    for (field, label) in FieldId::CURRENCY.into_iter().zip(RENT_LABELS) {
        blocks.push(Block::RentRow {
            label: label.to_string(),
            amount: Inline::Field(control(field)),
            is_total: false,
        });
    }
    blocks.push(Block::RentRow {
        label: "Total Monthly Rent".to_string(),
        amount: Inline::Bold(format_currency(draft.total())),
        is_total: true,
    });

    if !draft.custom_lines().is_empty() || editing {
        blocks.push(Block::Paragraph {
            content: vec![Inline::Bold("Additional Terms".to_string())],
        });
    }
    for (index, line) in draft.custom_lines().iter().enumerate() {
        blocks.push(Block::LineItem {
            id: line.id,
            number: index + 1,
            text: line.text.clone(),
            incomplete: line.text.trim().is_empty(),
            editable: editing,
        });
        if editing {
            blocks.push(Block::Action {
                label: "Remove".to_string(),
                action: Action::RemoveLine(line.id),
            });
        }
    }
    if editing {
        blocks.push(Block::Action {
            label: "Add Line".to_string(),
            action: Action::AddLine,
        });
    }

    blocks.push(Block::Paragraph {
        content: vec![Inline::Text(
            "All other terms and conditions of the lease remain in full force and effect."
                .to_string(),
        )],
    });

    blocks.push(Block::Signature {
        heading: "LESSOR".to_string(),
        party: Inline::Bold(draft.lessor_name().to_string()),
        signer: Inline::Text("By: ______________________".to_string()),
        title: Inline::Text("Title: ___________________".to_string()),
    });

    for index in 0..draft.lessee_count().get() {
        blocks.push(Block::Signature {
            heading: "LESSEE".to_string(),
            party: Inline::Field(control(FieldId::LesseeCompany(index))),
            signer: Inline::Field(control(FieldId::LesseeSigner(index))),
            title: Inline::Field(control(FieldId::LesseeTitle(index))),
        });
    }

    if editing {
        let label = match draft.lessee_count() {
            LesseeCount::One => "Add Second Lessee",
            LesseeCount::Two => "Remove Second Lessee",
        };
        blocks.push(Block::Action {
            label: label.to_string(),
            action: Action::ToggleLessees,
        });
    }

    blocks
}

/// Build the control bound to one field
pub fn build_control(draft: &DocumentDraft, state: &ViewState, field: FieldId) -> Control {
    let editable = state.mode == Mode::Edit;

    if let Some(amount) = draft.amount(field) {
        let raw = draft.field_text(field);
        let value = if state.is_focused(field) {
            raw.to_string()
        } else if raw.is_empty() {
            String::new()
        } else {
            format_currency(amount)
        };
        return Control {
            field,
            kind: ControlKind::Currency,
            value,
            placeholder: "$0.00".to_string(),
            incomplete: raw.is_empty(),
            editable,
        };
    }

    let value = draft.field_text(field).to_string();
    let (kind, incomplete) = if field.is_date() {
        let status = draft.date_status(field);
        (ControlKind::Date, status != DateStatus::Valid)
    } else if field == FieldId::AddendumLetter {
        (ControlKind::Letter, draft.is_blank(field))
    } else {
        (ControlKind::Text { min_chars: 1 }, draft.is_blank(field))
    };

    Control {
        field,
        kind,
        value,
        placeholder: placeholder(field).to_string(),
        incomplete,
        editable,
    }
}

fn placeholder(field: FieldId) -> &'static str {
    match field {
        FieldId::AddendumLetter => "X",
        FieldId::InitialDate | FieldId::LeaseStart | FieldId::LeaseEnd => "MM/DD/YYYY",
        FieldId::TenantName => "Tenant Name",
        FieldId::LesseeCompany(_) => "Company Name",
        FieldId::LesseeSigner(_) => "Signer Name",
        FieldId::LesseeTitle(_) => "Title",
        FieldId::BaseRent | FieldId::Insurance | FieldId::Tax | FieldId::Cam => "$0.00",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn find_control(blocks: &[Block], field: FieldId) -> Option<Control> {
        let check = |inline: &Inline| match inline {
            Inline::Field(c) if c.field == field => Some(c.clone()),
            _ => None,
        };
        blocks.iter().find_map(|block| match block {
            Block::Heading { content } | Block::Paragraph { content } => {
                content.iter().find_map(check)
            }
            Block::RentRow { amount, .. } => check(amount),
            Block::Signature {
                party,
                signer,
                title,
                ..
            } => check(party).or_else(|| check(signer)).or_else(|| check(title)),
            _ => None,
        })
    }

    #[test]
    fn test_currency_raw_while_focused() {
        let mut draft = DocumentDraft::new();
        draft.set_base_rent("1234.5");
        let mut state = ViewState::default();

        let blurred = find_control(&build_view(&draft, &state), FieldId::BaseRent).unwrap();
        assert_eq!(blurred.value, "$1,234.50");

        state.focus(FieldId::BaseRent);
        let focused = find_control(&build_view(&draft, &state), FieldId::BaseRent).unwrap();
        assert_eq!(focused.value, "1234.5");
        assert!(focused.editable);
    }

    #[test]
    fn test_empty_fields_incomplete_in_both_modes() {
        let draft = DocumentDraft::new();
        for state in [ViewState::default(), ViewState::capture()] {
            let blocks = build_view(&draft, &state);
            let tenant = find_control(&blocks, FieldId::TenantName).unwrap();
            assert!(tenant.incomplete);
            assert_eq!(tenant.shown_text(), "Tenant Name");
            assert!(find_control(&blocks, FieldId::Cam).unwrap().incomplete);
        }
    }

    #[test]
    fn test_invalid_date_is_highlighted() {
        let mut draft = DocumentDraft::new();
        draft.set_lease_start("02/30/2025");
        draft.set_lease_end("02/28/2030");
        let blocks = build_view(&draft, &ViewState::capture());
        assert!(find_control(&blocks, FieldId::LeaseStart).unwrap().incomplete);
        assert!(!find_control(&blocks, FieldId::LeaseEnd).unwrap().incomplete);
    }

    #[test]
    fn test_capture_mode_has_no_actions() {
        let mut draft = DocumentDraft::new();
        draft.add_line();
        let edit = build_view(&draft, &ViewState::default());
        let capture = build_view(&draft, &ViewState::capture());

        assert_eq!(edit.iter().filter(|b| b.is_action()).count(), 3);
        assert!(!capture.iter().any(Block::is_action));
        assert!(find_control(&capture, FieldId::TenantName)
            .map(|c| !c.editable)
            .unwrap());
    }

    #[test]
    fn test_capture_ignores_focus() {
        let mut draft = DocumentDraft::new();
        draft.set_tax("99");
        let state = ViewState {
            mode: Mode::Capture,
            focused: Some(FieldId::Tax),
        };
        let tax = find_control(&build_view(&draft, &state), FieldId::Tax).unwrap();
        assert_eq!(tax.value, "$99.00");
    }

    #[test]
    fn test_lessee_blocks_follow_count() {
        let mut draft = DocumentDraft::new();
        let signatures = |d: &DocumentDraft| {
            build_view(d, &ViewState::capture())
                .iter()
                .filter(|b| matches!(b, Block::Signature { .. }))
                .count()
        };
        assert_eq!(signatures(&draft), 2);
        draft.toggle_lessees();
        assert_eq!(signatures(&draft), 3);
    }

    #[test]
    fn test_total_row_is_formatted() {
        let mut draft = DocumentDraft::new();
        draft.set_base_rent("1000");
        draft.set_cam("250.75");
        let total = build_view(&draft, &ViewState::capture())
            .into_iter()
            .find_map(|b| match b {
                Block::RentRow {
                    amount,
                    is_total: true,
                    ..
                } => Some(amount),
                _ => None,
            });
        assert_eq!(total, Some(Inline::Bold("$1,250.75".to_string())));
    }

    #[test]
    fn test_width_chars_minimum() {
        let control = Control {
            field: FieldId::TenantName,
            kind: ControlKind::Text { min_chars: 1 },
            value: String::new(),
            placeholder: String::new(),
            incomplete: true,
            editable: true,
        };
        assert_eq!(control.width_chars(), 1);
    }

    #[test]
    fn test_serializes_for_host_page() {
        let draft = DocumentDraft::new();
        let json = serde_json::to_value(build_view(&draft, &ViewState::default())).unwrap();
        assert_eq!(json[0]["type"], "heading");
        assert_eq!(json[0]["content"][1]["type"], "field");
        assert_eq!(json[0]["content"][1]["value"]["field"], "addendumLetter");
    }
}
