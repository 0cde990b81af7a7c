//! Text sanitization and soft date checks

use chrono::NaiveDate;
use serde::Serialize;

/// Quote characters that would break the quoted sentence of the addendum
const QUOTE_CHARS: [char; 6] = [
    '"', '\u{201C}', '\u{201D}', '\u{201E}', '\u{00AB}', '\u{00BB}',
];

/// Remove double-quote characters (straight and typographic)
pub fn strip_quotes(input: &str) -> String {
    input.chars().filter(|c| !QUOTE_CHARS.contains(c)).collect()
}

/// Sanitization applied to a text field on every edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRule {
    /// Remove double-quote characters
    pub strip_quotes: bool,
    /// Maximum length in characters
    pub max_len: Option<usize>,
    /// Upper-case the result
    pub uppercase: bool,
}

impl TextRule {
    /// No sanitization beyond a generous length cap
    pub const PLAIN: TextRule = TextRule {
        strip_quotes: false,
        max_len: Some(120),
        uppercase: false,
    };

    /// Text printed inside the quoted sentence
    pub const QUOTED: TextRule = TextRule {
        strip_quotes: true,
        max_len: Some(120),
        uppercase: false,
    };

    /// Free-form custom addendum line
    pub const LINE: TextRule = TextRule {
        strip_quotes: true,
        max_len: Some(500),
        uppercase: false,
    };

    /// A single upper-case letter
    pub const LETTER: TextRule = TextRule {
        strip_quotes: true,
        max_len: Some(1),
        uppercase: true,
    };

    /// Apply the rule to raw input
    pub fn apply(&self, input: &str) -> String {
        let mut text = if self.strip_quotes {
            strip_quotes(input)
        } else {
            input.to_string()
        };

        if let Some(max) = self.max_len {
            if let Some((byte_idx, _)) = text.char_indices().nth(max) {
                text.truncate(byte_idx);
            }
        }

        if self.uppercase {
            text = text.to_uppercase();
        }

        text
    }
}

/// Soft validation state of a date field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DateStatus {
    Empty,
    Valid,
    Invalid,
}

/// Check a date written as MM/DD/YYYY
///
/// The check is advisory: invalid dates are highlighted, never rejected.
///
/// # Examples
/// ```
/// use lease_form::{date_status, DateStatus};
/// assert_eq!(date_status("02/29/2024"), DateStatus::Valid);
/// assert_eq!(date_status("02/30/2024"), DateStatus::Invalid);
/// assert_eq!(date_status(""), DateStatus::Empty);
/// ```
pub fn date_status(input: &str) -> DateStatus {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return DateStatus::Empty;
    }

    let parts: Vec<&str> = trimmed.split('/').collect();
    let shaped = parts.len() == 3
        && parts[0].len() <= 2
        && parts[1].len() <= 2
        && parts[2].len() == 4
        && parts.iter().all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));

    if shaped && NaiveDate::parse_from_str(trimmed, "%m/%d/%Y").is_ok() {
        DateStatus::Valid
    } else {
        DateStatus::Invalid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes(r#"ACME "West" LLC"#), "ACME West LLC");
        assert_eq!(strip_quotes("\u{201C}Smart\u{201D} quotes"), "Smart quotes");
        assert_eq!(strip_quotes("O'Brien"), "O'Brien");
        assert_eq!(strip_quotes("\u{00AB}Maison\u{00BB} SARL"), "Maison SARL");
    }

    #[test]
    fn test_letter_rule() {
        assert_eq!(TextRule::LETTER.apply("b"), "B");
        assert_eq!(TextRule::LETTER.apply("cd"), "C");
        assert_eq!(TextRule::LETTER.apply("\"x"), "X");
        assert_eq!(TextRule::LETTER.apply(""), "");
    }

    #[test]
    fn test_max_len_counts_chars() {
        let rule = TextRule {
            strip_quotes: false,
            max_len: Some(3),
            uppercase: false,
        };
        assert_eq!(rule.apply("héllo"), "hél");
        assert_eq!(rule.apply("ab"), "ab");
    }

    #[test]
    fn test_plain_keeps_quotes() {
        assert_eq!(TextRule::PLAIN.apply(r#"a "b""#), r#"a "b""#);
        assert_eq!(TextRule::QUOTED.apply(r#"a "b""#), "a b");
    }

    #[test]
    fn test_date_status() {
        assert_eq!(date_status("01/15/2025"), DateStatus::Valid);
        assert_eq!(date_status("1/5/2025"), DateStatus::Valid);
        assert_eq!(date_status(" 12/31/2025 "), DateStatus::Valid);
        assert_eq!(date_status("13/01/2025"), DateStatus::Invalid);
        assert_eq!(date_status("01/15/25"), DateStatus::Invalid);
        assert_eq!(date_status("2025-01-15"), DateStatus::Invalid);
        assert_eq!(date_status("January 1"), DateStatus::Invalid);
        assert_eq!(date_status("   "), DateStatus::Empty);
    }
}
