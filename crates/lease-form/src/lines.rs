//! Custom addendum lines

use crate::text::TextRule;
use crate::FormError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Locally generated identifier of a custom line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LineId(Uuid);

impl LineId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for LineId {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(LineId)
            .map_err(|_| FormError::UnknownLine(s.to_string()))
    }
}

/// One free-text line printed in the additional terms section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomLine {
    pub id: LineId,
    pub text: String,
}

/// Custom lines in insertion order
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct CustomLines {
    lines: Vec<CustomLine>,
}

impl CustomLines {
    /// Append an empty line and return its identifier
    pub fn add(&mut self) -> LineId {
        let id = LineId::generate();
        self.lines.push(CustomLine {
            id,
            text: String::new(),
        });
        id
    }

    /// Remove a line; returns false if no line has this id
    pub fn remove(&mut self, id: LineId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.id != id);
        self.lines.len() != before
    }

    /// Replace a line's text (sanitized); returns false if no line has this id
    pub fn set_text(&mut self, id: LineId, text: &str) -> bool {
        match self.lines.iter_mut().find(|line| line.id == id) {
            Some(line) => {
                line.text = TextRule::LINE.apply(text);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: LineId) -> Option<&CustomLine> {
        self.lines.iter().find(|line| line.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CustomLine> {
        self.lines.iter()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_remove_middle_keeps_order() {
        let mut lines = CustomLines::default();
        let first = lines.add();
        let second = lines.add();
        let third = lines.add();
        lines.set_text(first, "one");
        lines.set_text(second, "two");
        lines.set_text(third, "three");

        assert!(lines.remove(second));

        let remaining: Vec<(LineId, &str)> =
            lines.iter().map(|l| (l.id, l.text.as_str())).collect();
        assert_eq!(remaining, vec![(first, "one"), (third, "three")]);
    }

    #[test]
    fn test_ids_are_unique() {
        let mut lines = CustomLines::default();
        let ids: Vec<LineId> = (0..50).map(|_| lines.add()).collect();
        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 50);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut lines = CustomLines::default();
        lines.add();
        let stranger = CustomLines::default().add();
        assert!(!lines.remove(stranger));
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn test_set_text_strips_quotes() {
        let mut lines = CustomLines::default();
        let id = lines.add();
        assert!(lines.set_text(id, r#"Use of "Premises""#));
        assert_eq!(lines.get(id).unwrap().text, "Use of Premises");
    }

    #[test]
    fn test_line_id_parse_roundtrip() {
        let mut lines = CustomLines::default();
        let id = lines.add();
        let parsed: LineId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-line".parse::<LineId>().is_err());
    }
}
