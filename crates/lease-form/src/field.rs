//! Field identifiers

use crate::draft::MAX_LESSEES;
use crate::text::TextRule;
use crate::FormError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Identifier of an editable field of the draft
///
/// Lessee fields carry a zero-based lessee index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    AddendumLetter,
    InitialDate,
    TenantName,
    LeaseStart,
    LeaseEnd,
    BaseRent,
    Insurance,
    Tax,
    Cam,
    LesseeCompany(usize),
    LesseeSigner(usize),
    LesseeTitle(usize),
}

impl FieldId {
    /// The four rent line items, in printed order
    pub const CURRENCY: [FieldId; 4] = [
        FieldId::BaseRent,
        FieldId::Insurance,
        FieldId::Tax,
        FieldId::Cam,
    ];

    pub fn is_currency(self) -> bool {
        Self::CURRENCY.contains(&self)
    }

    pub fn is_date(self) -> bool {
        matches!(
            self,
            FieldId::InitialDate | FieldId::LeaseStart | FieldId::LeaseEnd
        )
    }

    /// Sanitization applied to text edits of this field
    pub fn rule(self) -> TextRule {
        match self {
            FieldId::AddendumLetter => TextRule::LETTER,
            FieldId::InitialDate
            | FieldId::TenantName
            | FieldId::LeaseStart
            | FieldId::LeaseEnd => TextRule::QUOTED,
            _ => TextRule::PLAIN,
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldId::AddendumLetter => f.write_str("addendumLetter"),
            FieldId::InitialDate => f.write_str("initialDate"),
            FieldId::TenantName => f.write_str("tenantName"),
            FieldId::LeaseStart => f.write_str("leaseStart"),
            FieldId::LeaseEnd => f.write_str("leaseEnd"),
            FieldId::BaseRent => f.write_str("baseRent"),
            FieldId::Insurance => f.write_str("insurance"),
            FieldId::Tax => f.write_str("tax"),
            FieldId::Cam => f.write_str("cam"),
            FieldId::LesseeCompany(i) => write!(f, "lessee{}Company", i + 1),
            FieldId::LesseeSigner(i) => write!(f, "lessee{}Signer", i + 1),
            FieldId::LesseeTitle(i) => write!(f, "lessee{}Title", i + 1),
        }
    }
}

impl FromStr for FieldId {
    type Err = FormError;

    /// Parse the binding name used by the browser bindings (e.g. `lessee2Company`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field = match s {
            "addendumLetter" => FieldId::AddendumLetter,
            "initialDate" => FieldId::InitialDate,
            "tenantName" => FieldId::TenantName,
            "leaseStart" => FieldId::LeaseStart,
            "leaseEnd" => FieldId::LeaseEnd,
            "baseRent" => FieldId::BaseRent,
            "insurance" => FieldId::Insurance,
            "tax" => FieldId::Tax,
            "cam" => FieldId::Cam,
            _ => return parse_lessee_field(s),
        };
        Ok(field)
    }
}

fn parse_lessee_field(s: &str) -> Result<FieldId, FormError> {
    let unknown = || FormError::UnknownField(s.to_string());

    let rest = s.strip_prefix("lessee").ok_or_else(unknown)?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    let number: usize = digits.parse().map_err(|_| unknown())?;
    if number == 0 || number > MAX_LESSEES {
        return Err(FormError::LesseeOutOfRange(number));
    }
    let index = number - 1;

    match &rest[digits.len()..] {
        "Company" => Ok(FieldId::LesseeCompany(index)),
        "Signer" => Ok(FieldId::LesseeSigner(index)),
        "Title" => Ok(FieldId::LesseeTitle(index)),
        _ => Err(unknown()),
    }
}

impl Serialize for FieldId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("tenantName".parse::<FieldId>(), Ok(FieldId::TenantName));
        assert_eq!("cam".parse::<FieldId>(), Ok(FieldId::Cam));
        assert_eq!(
            "lessee2Company".parse::<FieldId>(),
            Ok(FieldId::LesseeCompany(1))
        );
        assert_eq!(
            "lessee1Signer".parse::<FieldId>(),
            Ok(FieldId::LesseeSigner(0))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "rent".parse::<FieldId>(),
            Err(FormError::UnknownField("rent".to_string()))
        );
        assert_eq!(
            "lessee3Company".parse::<FieldId>(),
            Err(FormError::LesseeOutOfRange(3))
        );
        assert_eq!(
            "lessee1Phone".parse::<FieldId>(),
            Err(FormError::UnknownField("lessee1Phone".to_string()))
        );
        assert!("lesseeCompany".parse::<FieldId>().is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        let fields = [
            FieldId::AddendumLetter,
            FieldId::InitialDate,
            FieldId::LeaseEnd,
            FieldId::Tax,
            FieldId::LesseeTitle(1),
        ];
        for field in fields {
            assert_eq!(field.to_string().parse::<FieldId>(), Ok(field));
        }
    }

    #[test]
    fn test_classification() {
        assert!(FieldId::Insurance.is_currency());
        assert!(!FieldId::TenantName.is_currency());
        assert!(FieldId::LeaseStart.is_date());
        assert_eq!(FieldId::AddendumLetter.rule(), TextRule::LETTER);
    }
}
