//! Layout of the view tree into a display list
//!
//! Coordinates are CSS pixels with the origin at the top-left of the document.
//! Inline content is broken greedily into lines. Controls are atomic boxes
//! unless a static value is wider than the content, which then wraps by word.

use crate::view::{Block, Control, Inline};
use log::debug;
use serde::Serialize;

/// Page margin around the document content
const PADDING: f32 = 48.0;
const BODY_SIZE: f32 = 14.0;
const HEADING_SIZE: f32 = 20.0;
const LINE_HEIGHT: f32 = 1.5;
const BLOCK_GAP: f32 = 12.0;
/// Horizontal padding inside a control box
const CONTROL_PAD: f32 = 4.0;
const SIGNATURE_RULE: f32 = 260.0;

/// RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    pub const BLACK: Color = Color(0, 0, 0);
    pub const PLACEHOLDER: Color = Color(150, 150, 150);
    pub const BORDER: Color = Color(190, 190, 190);
    pub const HIGHLIGHT: Color = Color(255, 243, 176);
    pub const ACTION: Color = Color(37, 99, 235);
}

/// Font size and weight of a text run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextStyle {
    pub size: f32,
    pub bold: bool,
}

impl TextStyle {
    pub const BODY: TextStyle = TextStyle {
        size: BODY_SIZE,
        bold: false,
    };

    pub fn bold(self) -> Self {
        Self { bold: true, ..self }
    }

    fn line_height(self) -> f32 {
        self.size * LINE_HEIGHT
    }
}

/// Font measurements needed by the layout
pub trait TextMetrics {
    /// Advance width of `text` in CSS pixels
    fn text_width(&self, text: &str, style: TextStyle) -> f32;

    /// Distance from the top of the em box to the baseline
    fn ascent(&self, style: TextStyle) -> f32;
}

/// Metrics assuming every character has the same advance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedAdvance {
    /// Advance of one character as a fraction of the font size
    pub em: f32,
}

impl Default for FixedAdvance {
    fn default() -> Self {
        Self { em: 0.55 }
    }
}

impl TextMetrics for FixedAdvance {
    fn text_width(&self, text: &str, style: TextStyle) -> f32 {
        text.chars().count() as f32 * style.size * self.em
    }

    fn ascent(&self, style: TextStyle) -> f32 {
        style.size * 0.8
    }
}

/// A drawing primitive
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawOp {
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    },
    StrokeRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    },
    Rule {
        x: f32,
        y: f32,
        width: f32,
        color: Color,
    },
    /// Text with its baseline at `y`
    Text {
        x: f32,
        y: f32,
        text: String,
        style: TextStyle,
        color: Color,
    },
}

/// Laid-out document, ready to rasterize
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayList {
    pub width: f32,
    pub height: f32,
    pub ops: Vec<DrawOp>,
}

impl DisplayList {
    pub fn has_text(&self) -> bool {
        self.ops.iter().any(|op| matches!(op, DrawOp::Text { .. }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Center,
}

/// An atomic piece of inline content
enum Piece<'a> {
    Word(String, TextStyle),
    Control(&'a Control, TextStyle),
    /// One word of a static control value that had to wrap
    ControlWord(String, TextStyle, &'a Control),
}

struct Placed<'a> {
    piece: Piece<'a>,
    x: f32,
    width: f32,
}

struct Cursor<'m> {
    metrics: &'m dyn TextMetrics,
    left: f32,
    right: f32,
    y: f32,
    ops: Vec<DrawOp>,
}

/// Lay out blocks at the given width
pub fn layout(blocks: &[Block], width: f64, metrics: &dyn TextMetrics) -> DisplayList {
    let width = width.max(1.0) as f32;
    let left = PADDING.min(width / 4.0);
    let right = (width - left).max(left + 1.0);

    let mut cursor = Cursor {
        metrics,
        left,
        right,
        y: left,
        ops: Vec::new(),
    };

    for (index, block) in blocks.iter().enumerate() {
        if index > 0 {
            cursor.y += BLOCK_GAP;
        }
        cursor.block(block);
    }

    let height = cursor.y + left;
    debug!(
        "laid out {} blocks at {width}px: {height:.1}px tall, {} ops",
        blocks.len(),
        cursor.ops.len()
    );

    DisplayList {
        width,
        height,
        ops: cursor.ops,
    }
}

impl<'m> Cursor<'m> {
    fn block(&mut self, block: &Block) {
        match block {
            Block::Heading { content } => {
                let style = TextStyle {
                    size: HEADING_SIZE,
                    bold: true,
                };
                self.flow(content, style, Align::Center);
            }
            Block::Paragraph { content } => self.flow(content, TextStyle::BODY, Align::Left),
            Block::RentRow {
                label,
                amount,
                is_total,
            } => self.rent_row(label, amount, *is_total),
            Block::LineItem {
                number,
                text,
                incomplete,
                editable,
                ..
            } => self.line_item(*number, text, *incomplete, *editable),
            Block::Signature {
                heading,
                party,
                signer,
                title,
            } => {
                self.flow(
                    &[Inline::Bold(heading.clone())],
                    TextStyle::BODY,
                    Align::Left,
                );
                self.flow(std::slice::from_ref(party), TextStyle::BODY, Align::Left);
                self.y += BLOCK_GAP;
                self.push_rule(self.left, SIGNATURE_RULE);
                self.flow(std::slice::from_ref(signer), TextStyle::BODY, Align::Left);
                self.flow(std::slice::from_ref(title), TextStyle::BODY, Align::Left);
            }
            Block::Action { label, .. } => self.action(label),
        }
    }

    fn content_width(&self) -> f32 {
        self.right - self.left
    }

    /// Break inline content into pieces and place them line by line
    fn flow(&mut self, content: &[Inline], style: TextStyle, align: Align) {
        let pieces = self.fit_pieces(split_pieces(content, style));
        let space = self.metrics.text_width(" ", style);

        let mut lines: Vec<Vec<Placed>> = vec![Vec::new()];
        let mut x = 0.0;
        for (piece, glue) in pieces {
            let width = self.piece_width(&piece);
            let line_len = lines.last().map_or(0, Vec::len);
            let gap = if line_len == 0 || glue { 0.0 } else { space };

            let start = if line_len > 0 && x + gap + width > self.content_width() {
                lines.push(Vec::new());
                0.0
            } else {
                x + gap
            };
            x = start + width;
            if let Some(line) = lines.last_mut() {
                line.push(Placed {
                    piece,
                    x: start,
                    width,
                });
            }
        }

        for line in lines {
            self.emit_line(line, style, align);
        }
    }

    fn piece_width(&self, piece: &Piece) -> f32 {
        match piece {
            Piece::Word(word, style) => self.metrics.text_width(word, *style),
            Piece::Control(control, style) => self.control_width(control, *style),
            Piece::ControlWord(word, style, _) => self.metrics.text_width(word, *style),
        }
    }

    /// Box width of a control, never wider than the content
    fn control_width(&self, control: &Control, style: TextStyle) -> f32 {
        let text = self.metrics.text_width(control.shown_text(), style);
        let min = self.metrics.text_width("0", style) * control.width_chars() as f32;
        (text.max(min) + CONTROL_PAD * 2.0).min(self.content_width())
    }

    /// Re-split pieces wider than the content so every line fits
    ///
    /// Static control values break into words, words break into character
    /// runs. Editable controls keep their (clamped) box.
    fn fit_pieces<'a>(&self, pieces: Vec<(Piece<'a>, bool)>) -> Vec<(Piece<'a>, bool)> {
        let max = self.content_width();
        let mut fitted = Vec::with_capacity(pieces.len());

        for (piece, glue) in pieces {
            match piece {
                Piece::Control(control, style)
                    if !control.editable && self.shown_width(control, style) > max =>
                {
                    let mut first = glue;
                    for word in control.shown_text().split_whitespace() {
                        for chunk in self.break_word(word, style, max) {
                            fitted.push((Piece::ControlWord(chunk, style, control), first));
                            first = false;
                        }
                    }
                }
                Piece::Word(word, style) if self.metrics.text_width(&word, style) > max => {
                    for (i, chunk) in self.break_word(&word, style, max).into_iter().enumerate() {
                        fitted.push((Piece::Word(chunk, style), glue && i == 0));
                    }
                }
                piece => fitted.push((piece, glue)),
            }
        }
        fitted
    }

    fn shown_width(&self, control: &Control, style: TextStyle) -> f32 {
        self.metrics.text_width(control.shown_text(), style) + CONTROL_PAD * 2.0
    }

    /// Split a word into runs no wider than `max` (at least one char each)
    fn break_word(&self, word: &str, style: TextStyle, max: f32) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        for c in word.chars() {
            current.push(c);
            if current.chars().count() > 1 && self.metrics.text_width(&current, style) > max {
                current.pop();
                chunks.push(std::mem::take(&mut current));
                current.push(c);
            }
        }
        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }

    /// Longest prefix of `text` that fits in `max`
    fn clip_text<'t>(&self, text: &'t str, style: TextStyle, max: f32) -> &'t str {
        if self.metrics.text_width(text, style) <= max {
            return text;
        }
        let mut end = 0;
        for (i, c) in text.char_indices() {
            let next = i + c.len_utf8();
            if self.metrics.text_width(&text[..next], style) > max {
                break;
            }
            end = next;
        }
        &text[..end]
    }

    fn emit_line(&mut self, line: Vec<Placed>, style: TextStyle, align: Align) {
        let line_height = style.line_height();
        let used = line.last().map_or(0.0, |p| p.x + p.width);
        let offset = match align {
            Align::Left => 0.0,
            Align::Center => ((self.content_width() - used) / 2.0).max(0.0),
        };
        let top = self.y;
        let baseline = top + (line_height - style.size) / 2.0 + self.metrics.ascent(style);

        for placed in line {
            let x = self.left + offset + placed.x;
            match placed.piece {
                Piece::Word(text, style) => self.ops.push(DrawOp::Text {
                    x,
                    y: baseline,
                    text,
                    style,
                    color: Color::BLACK,
                }),
                Piece::Control(control, style) => {
                    self.control(control, style, x, top, placed.width, line_height, baseline)
                }
                Piece::ControlWord(text, style, control) => {
                    if control.incomplete {
                        self.ops.push(DrawOp::FillRect {
                            x,
                            y: top,
                            width: placed.width,
                            height: line_height,
                            color: Color::HIGHLIGHT,
                        });
                    }
                    self.ops.push(DrawOp::Text {
                        x,
                        y: baseline,
                        text,
                        style,
                        color: value_color(control),
                    });
                }
            }
        }
        self.y += line_height;
    }

    #[allow(clippy::too_many_arguments)]
    fn control(
        &mut self,
        control: &Control,
        style: TextStyle,
        x: f32,
        top: f32,
        width: f32,
        height: f32,
        baseline: f32,
    ) {
        if control.incomplete {
            self.ops.push(DrawOp::FillRect {
                x,
                y: top,
                width,
                height,
                color: Color::HIGHLIGHT,
            });
        }
        if control.editable {
            self.ops.push(DrawOp::StrokeRect {
                x,
                y: top,
                width,
                height,
                color: Color::BORDER,
            });
        }

        let text = self.clip_text(control.shown_text(), style, width - CONTROL_PAD * 2.0);
        if text.is_empty() {
            return;
        }
        self.ops.push(DrawOp::Text {
            x: x + CONTROL_PAD,
            y: baseline,
            text: text.to_string(),
            style,
            color: value_color(control),
        });
    }

    fn rent_row(&mut self, label: &str, amount: &Inline, is_total: bool) {
        let style = if is_total {
            TextStyle::BODY.bold()
        } else {
            TextStyle::BODY
        };
        if is_total {
            self.push_rule(self.left, self.content_width());
        }

        let line_height = style.line_height();
        let mut top = self.y;
        let mut baseline = top + (line_height - style.size) / 2.0 + self.metrics.ascent(style);
        self.ops.push(DrawOp::Text {
            x: self.left,
            y: baseline,
            text: label.to_string(),
            style,
            color: Color::BLACK,
        });
        let label_width = self.metrics.text_width(label, style);

        match amount {
            Inline::Field(control) => {
                let width = self.control_width(control, style);
                if label_width + width > self.content_width() {
                    // amount drops below its label
                    self.y += line_height;
                    top += line_height;
                    baseline += line_height;
                }
                let x = self.right - width;
                self.control(control, style, x, top, width, line_height, baseline);
            }
            Inline::Text(text) | Inline::Bold(text) => {
                let style = if matches!(amount, Inline::Bold(_)) {
                    style.bold()
                } else {
                    style
                };
                let width = self.metrics.text_width(text, style);
                if label_width + width + CONTROL_PAD > self.content_width() {
                    self.y += line_height;
                    baseline += line_height;
                }
                self.ops.push(DrawOp::Text {
                    x: self.right - width - CONTROL_PAD,
                    y: baseline,
                    text: text.clone(),
                    style,
                    color: Color::BLACK,
                });
            }
        }
        self.y += line_height;
    }

    fn line_item(&mut self, number: usize, text: &str, incomplete: bool, editable: bool) {
        let start = self.ops.len();
        let top = self.y;
        let shown = if text.trim().is_empty() {
            "Additional term"
        } else {
            text
        };
        self.flow(
            &[Inline::Text(format!("{number}. {shown}"))],
            TextStyle::BODY,
            Align::Left,
        );

        if text.trim().is_empty() {
            for op in &mut self.ops[start..] {
                if let DrawOp::Text { color, .. } = op {
                    *color = Color::PLACEHOLDER;
                }
            }
        }

        let height = self.y - top;
        if incomplete {
            let highlight = DrawOp::FillRect {
                x: self.left,
                y: top,
                width: self.content_width(),
                height,
                color: Color::HIGHLIGHT,
            };
            self.ops.insert(start, highlight);
        }
        if editable {
            let outline = DrawOp::StrokeRect {
                x: self.left,
                y: top,
                width: self.content_width(),
                height,
                color: Color::BORDER,
            };
            self.ops.push(outline);
        }
    }

    fn action(&mut self, label: &str) {
        let style = TextStyle::BODY;
        let width = self.metrics.text_width(label, style) + CONTROL_PAD * 4.0;
        let height = style.line_height();
        let baseline = self.y + (height - style.size) / 2.0 + self.metrics.ascent(style);
        self.ops.push(DrawOp::StrokeRect {
            x: self.left,
            y: self.y,
            width,
            height,
            color: Color::ACTION,
        });
        self.ops.push(DrawOp::Text {
            x: self.left + CONTROL_PAD * 2.0,
            y: baseline,
            text: label.to_string(),
            style,
            color: Color::ACTION,
        });
        self.y += height;
    }

    fn push_rule(&mut self, x: f32, width: f32) {
        self.ops.push(DrawOp::Rule {
            x,
            y: self.y,
            width,
            color: Color::BLACK,
        });
    }
}

fn value_color(control: &Control) -> Color {
    if control.value.is_empty() {
        Color::PLACEHOLDER
    } else {
        Color::BLACK
    }
}

/// Split inline content into atomic pieces
///
/// The flag marks pieces that attach to the previous one without a space
/// (punctuation directly after a control).
fn split_pieces(content: &[Inline], style: TextStyle) -> Vec<(Piece<'_>, bool)> {
    let mut pieces = Vec::new();
    for inline in content {
        match inline {
            Inline::Text(text) | Inline::Bold(text) => {
                let style = if matches!(inline, Inline::Bold(_)) {
                    style.bold()
                } else {
                    style
                };
                let glue_first = text
                    .chars()
                    .next()
                    .is_some_and(|c| !c.is_whitespace() && c != '(' && !c.is_alphanumeric());
                for (i, word) in text.split_whitespace().enumerate() {
                    pieces.push((Piece::Word(word.to_string(), style), i == 0 && glue_first));
                }
            }
            Inline::Field(control) => {
                let glue = matches!(pieces.last(), Some((Piece::Word(w, _), _)) if w.ends_with('\u{201C}'));
                pieces.push((Piece::Control(control, style), glue));
            }
        }
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{build_view, ViewState};
    use lease_form::DocumentDraft;
    use pretty_assertions::assert_eq;

    fn texts(list: &DisplayList) -> Vec<&str> {
        list.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_paragraph_wraps_within_width() {
        let blocks = vec![Block::Paragraph {
            content: vec![Inline::Text("alpha beta gamma delta epsilon zeta".to_string())],
        }];
        let metrics = FixedAdvance { em: 0.5 };
        // 7px per char, content width = 300 - 2 * 48 = 204px
        let list = layout(&blocks, 300.0, &metrics);

        for op in &list.ops {
            if let DrawOp::Text { x, text, style, .. } = op {
                assert!(x + metrics.text_width(text, *style) <= 252.0 + 0.01);
            }
        }
        let lines: std::collections::BTreeSet<u32> = list
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { y, .. } => Some(*y as u32),
                _ => None,
            })
            .collect();
        assert!(lines.len() > 1);
    }

    #[test]
    fn test_height_grows_with_content() {
        let metrics = FixedAdvance::default();
        let mut draft = DocumentDraft::new();
        let short = layout(&build_view(&draft, &ViewState::capture()), 816.0, &metrics);

        for _ in 0..40 {
            let id = draft.add_line();
            draft.set_line_text(id, "Tenant shall maintain the premises in good repair.");
        }
        let long = layout(&build_view(&draft, &ViewState::capture()), 816.0, &metrics);

        assert_eq!(short.width, 816.0);
        assert!(long.height > short.height * 2.0);
    }

    #[test]
    fn test_capture_mode_draws_no_inputs() {
        let metrics = FixedAdvance::default();
        let mut draft = DocumentDraft::new();
        draft.set_tenant_name("Corner Coffee LLC");

        let edit = layout(&build_view(&draft, &ViewState::default()), 816.0, &metrics);
        let capture = layout(&build_view(&draft, &ViewState::capture()), 816.0, &metrics);

        let strokes = |list: &DisplayList| {
            list.ops
                .iter()
                .filter(|op| matches!(op, DrawOp::StrokeRect { .. }))
                .count()
        };
        assert!(strokes(&edit) > 0);
        assert_eq!(strokes(&capture), 0);
        assert!(texts(&capture).contains(&"Corner Coffee LLC"));
        assert!(!texts(&capture).contains(&"Add Line"));
    }

    #[test]
    fn test_incomplete_controls_highlighted() {
        let metrics = FixedAdvance::default();
        let draft = DocumentDraft::new();
        let list = layout(&build_view(&draft, &ViewState::capture()), 816.0, &metrics);
        assert!(list.ops.iter().any(|op| matches!(
            op,
            DrawOp::FillRect {
                color: Color::HIGHLIGHT,
                ..
            }
        )));
    }

    #[test]
    fn test_total_right_aligned() {
        let metrics = FixedAdvance::default();
        let mut draft = DocumentDraft::new();
        draft.set_base_rent("2500");
        let list = layout(&build_view(&draft, &ViewState::capture()), 816.0, &metrics);

        let total = list.ops.iter().find_map(|op| match op {
            DrawOp::Text { x, text, style, .. } if text == "$2,500.00" && style.bold => {
                Some(*x + metrics.text_width(text, *style))
            }
            _ => None,
        });
        let right_edge = total.unwrap();
        assert!((right_edge - (816.0 - 48.0 - CONTROL_PAD)).abs() < 0.01);
    }

    fn text_y(list: &DisplayList, wanted: &str) -> f32 {
        list.ops
            .iter()
            .find_map(|op| match op {
                DrawOp::Text { y, text, .. } if text == wanted => Some(*y),
                _ => None,
            })
            .unwrap()
    }

    const LONG_TENANT: &str = "Harborview Commercial Holdings and Associated Retail \
        Ventures of the Greater Metropolitan Waterfront District LLC";

    fn assert_text_inside(list: &DisplayList, metrics: &FixedAdvance) {
        for op in &list.ops {
            if let DrawOp::Text { x, text, style, .. } = op {
                let right = x + metrics.text_width(text, *style);
                assert!(*x >= PADDING - 0.01, "{text:?} starts at {x}");
                assert!(
                    right <= list.width - PADDING + 0.01,
                    "{text:?} ends at {right}, list is {} wide",
                    list.width
                );
            }
        }
    }

    #[test]
    fn test_long_tenant_name_wraps_in_capture() {
        let metrics = FixedAdvance::default();
        let mut draft = DocumentDraft::new();
        draft.set_tenant_name(LONG_TENANT);
        assert_eq!(draft.tenant_name(), LONG_TENANT);

        let list = layout(&build_view(&draft, &ViewState::capture()), 816.0, &metrics);

        assert_text_inside(&list, &metrics);
        let drawn = texts(&list);
        for word in LONG_TENANT.split_whitespace() {
            assert!(drawn.contains(&word), "{word} missing");
        }
    }

    #[test]
    fn test_unbroken_value_is_split_by_characters() {
        let metrics = FixedAdvance::default();
        let name = "X".repeat(120);
        let mut draft = DocumentDraft::new();
        draft.set_tenant_name(&name);

        let list = layout(&build_view(&draft, &ViewState::capture()), 816.0, &metrics);

        assert_text_inside(&list, &metrics);
        let xs: usize = texts(&list)
            .iter()
            .filter(|text| text.chars().all(|c| c == 'X'))
            .map(|text| text.len())
            .sum();
        assert_eq!(xs, 120);
    }

    #[test]
    fn test_long_value_stays_inside_edit_box() {
        let metrics = FixedAdvance::default();
        let mut draft = DocumentDraft::new();
        draft.set_tenant_name(LONG_TENANT);

        let list = layout(&build_view(&draft, &ViewState::default()), 816.0, &metrics);

        assert_text_inside(&list, &metrics);
        for op in &list.ops {
            if let DrawOp::StrokeRect { x, width, .. } = op {
                assert!(x + width <= list.width - PADDING + 0.01);
            }
        }
    }

    #[test]
    fn test_wide_amount_drops_below_label() {
        let metrics = FixedAdvance::default();
        let mut draft = DocumentDraft::new();
        draft.set_base_rent("1000000000000000000000");

        let list = layout(&build_view(&draft, &ViewState::capture()), 400.0, &metrics);

        assert_text_inside(&list, &metrics);
        let (label_y, amount_y) = (
            text_y(&list, "Base Rent"),
            text_y(&list, "$1,000,000,000,000,000,000,000.00"),
        );
        assert!(amount_y > label_y);
    }

    #[test]
    fn test_zero_width_is_clamped() {
        let list = layout(&[], 0.0, &FixedAdvance::default());
        assert_eq!(list.width, 1.0);
        assert!(list.height > 0.0);
        assert!(!list.has_text());
    }
}
