//! Currency parsing and formatting

/// Currency symbol used by the formatted display
const CURRENCY_SYMBOL: &str = "$";

/// Parse raw currency keystrokes into an amount
///
/// Every character that is not an ASCII digit or `.` is dropped, then the
/// longest numeric prefix (digits with at most one decimal point) is parsed.
/// Empty or unparseable input yields `0.0`; this never fails.
///
/// # Examples
/// ```
/// use lease_form::parse_currency;
/// assert_eq!(parse_currency("$1,234.56abc"), 1234.56);
/// assert_eq!(parse_currency(""), 0.0);
/// assert_eq!(parse_currency("--"), 0.0);
/// ```
pub fn parse_currency(raw: &str) -> f64 {
    let cleaned = keep_numeric(raw);

    let mut seen_point = false;
    let end = cleaned
        .char_indices()
        .find(|(_, c)| {
            if *c == '.' {
                if seen_point {
                    return true;
                }
                seen_point = true;
            }
            false
        })
        .map(|(i, _)| i)
        .unwrap_or(cleaned.len());

    cleaned[..end]
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Keep only ASCII digits and decimal points
pub(crate) fn keep_numeric(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect()
}

/// Format an amount as US currency (e.g., "$1,234.56")
///
/// # Examples
/// ```
/// use lease_form::format_currency;
/// assert_eq!(format_currency(1234.5), "$1,234.50");
/// assert_eq!(format_currency(0.0), "$0.00");
/// ```
pub fn format_currency(amount: f64) -> String {
    if !amount.is_finite() {
        return format!("{CURRENCY_SYMBOL}0.00");
    }

    // Decimal text keeps every integer digit, however large the amount
    let text = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let is_zero = int_part.bytes().chain(frac_part.bytes()).all(|b| b == b'0');
    let sign = if amount < 0.0 && !is_zero { "-" } else { "" };

    format!(
        "{sign}{CURRENCY_SYMBOL}{}.{frac_part}",
        format_with_thousands(int_part)
    )
}

/// Plain numeric text for an amount, as shown inside a focused input
///
/// Whole amounts drop their cents (`1200`, `0`); others keep two decimals.
pub fn amount_text(amount: f64) -> String {
    if !amount.is_finite() {
        return String::new();
    }
    let text = format!("{amount:.2}");
    text.strip_suffix(".00").map(str::to_string).unwrap_or(text)
}

/// Group a run of decimal digits with thousand separators
fn format_with_thousands(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + s.len() / 3);

    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result
}
