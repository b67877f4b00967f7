//! Cell-level parsing: numeric magnitude, leftover unit text, unit position.
//!
//! A cell is read as `[decorations/unit] number [unit]`. Only the first
//! number counts; anything after a range mark such as `~` is ignored.

use crate::model::Affix;
use once_cell::sync::Lazy;
use regex::Regex;

static NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-+]?(?:\d[\d,]*(?:\.\d*)?|\.\d+)(?:[eE][-+]?\d+)?")
        .expect("number pattern is valid")
});

fn is_numeric_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | ',')
}

/// Tolerance, approximation and bound marks that qualify a number.
fn is_decoration(c: char) -> bool {
    matches!(c, '±' | '~' | '≈' | '<' | '>' | '≤' | '≥' | '+')
}

/// A raw cell split around its first number.
#[derive(Debug, Clone, PartialEq)]
pub struct CellText {
    /// Parsed number, `None` when the cell has none or it is not finite.
    pub magnitude: Option<f64>,
    /// Unit text before the number, decorations removed.
    pub before: String,
    /// Unit text after the number, up to the next decoration.
    pub after: String,
}

impl CellText {
    pub fn parse(raw: &str) -> Self {
        let number = raw
            .find(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'))
            .and_then(|start| {
                NUMBER
                    .find(&raw[start..])
                    .map(|m| (start, start + m.end(), m.as_str()))
            });

        let Some((start, end, text)) = number else {
            return Self {
                magnitude: None,
                before: String::new(),
                after: strip(raw, |c| is_decoration(c) || is_numeric_char(c)),
            };
        };

        let magnitude = text
            .replace(',', "")
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite());
        let tail = &raw[end..];
        let tail = tail
            .find(|c: char| is_decoration(c) && c != '+')
            .map_or(tail, |i| &tail[..i]);
        Self {
            magnitude,
            before: strip(&raw[..start], is_decoration),
            after: strip(tail, |c| is_decoration(c) || is_numeric_char(c)),
        }
    }

    /// Unit text of the cell, before and after the number joined.
    pub fn leftover(&self) -> String {
        match (self.before.is_empty(), self.after.is_empty()) {
            (false, false) => format!("{} {}", self.before, self.after),
            (false, true) => self.before.clone(),
            _ => self.after.clone(),
        }
    }

    /// `Prefix` when unit text precedes the number, `Suffix` when it only
    /// follows it, `None` when the cell has no unit text.
    pub fn position(&self) -> Option<Affix> {
        if !self.before.is_empty() {
            Some(Affix::Prefix)
        } else if !self.after.is_empty() {
            Some(Affix::Suffix)
        } else {
            None
        }
    }
}

fn strip(text: &str, drop: impl Fn(char) -> bool) -> String {
    text.chars()
        .filter(|c| !drop(*c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Numeric magnitude of a raw cell.
///
/// The first number in the cell is parsed: optional sign, digits with `,`
/// separators, a fraction and an exponent. `None` when nothing parses or the
/// result is not finite.
pub fn parse_magnitude(raw: &str) -> Option<f64> {
    CellText::parse(raw).magnitude
}

/// Unit text of a raw cell, trimmed.
pub fn leftover_text(raw: &str) -> String {
    CellText::parse(raw).leftover()
}

/// Where the unit text sits relative to the number in the raw cell.
pub fn unit_position(raw: &str) -> Option<Affix> {
    CellText::parse(raw).position()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_magnitude() {
        assert_eq!(parse_magnitude("100 nF"), Some(100.0));
        assert_eq!(parse_magnitude("4.7 µF"), Some(4.7));
        assert_eq!(parse_magnitude("$3.50"), Some(3.5));
        assert_eq!(parse_magnitude("-55 °C"), Some(-55.0));
        assert_eq!(parse_magnitude("+85 °C"), Some(85.0));
        assert_eq!(parse_magnitude(".5 mm"), Some(0.5));
        assert_eq!(parse_magnitude("10."), Some(10.0));
        assert_eq!(parse_magnitude("1,000 pF"), Some(1000.0));
    }

    #[test]
    fn test_parse_magnitude_first_number() {
        // Ranges keep their first number. A gap or a second sign ends it.
        assert_eq!(parse_magnitude("5-10 V"), Some(5.0));
        assert_eq!(parse_magnitude("-55°C ~ 125°C"), Some(-55.0));
        assert_eq!(parse_magnitude("10 to 20 V"), Some(10.0));
        assert_eq!(parse_magnitude("1.2.3"), Some(1.2));
    }

    #[test]
    fn test_parse_magnitude_exponent() {
        assert_eq!(parse_magnitude("1.2e-9"), Some(1.2e-9));
        assert_eq!(parse_magnitude("3.4E+2"), Some(340.0));
        assert_eq!(parse_magnitude("5e"), Some(5.0));
        assert_eq!(parse_magnitude("2 each"), Some(2.0));
    }

    #[test]
    fn test_parse_magnitude_malformed() {
        assert_eq!(parse_magnitude("N/A"), None);
        assert_eq!(parse_magnitude(""), None);
        assert_eq!(parse_magnitude("-"), None);
        assert_eq!(parse_magnitude("--5"), None);
        assert_eq!(parse_magnitude("."), None);
        assert_eq!(parse_magnitude("1e999"), None);
    }

    #[test]
    fn test_leftover_text() {
        assert_eq!(leftover_text("100 nF"), "nF");
        assert_eq!(leftover_text("$3.50"), "$");
        assert_eq!(leftover_text("  25 V "), "V");
        assert_eq!(leftover_text("42"), "");
        assert_eq!(leftover_text("N/A"), "N/A");
        assert_eq!(leftover_text("1.2e-9"), "");
        assert_eq!(leftover_text("5e"), "e");
    }

    #[test]
    fn test_leftover_drops_decorations_and_ranges() {
        assert_eq!(leftover_text("±10%"), "%");
        assert_eq!(leftover_text("<1 µA"), "µA");
        assert_eq!(leftover_text("≥ 100 V"), "V");
        assert_eq!(leftover_text("-55°C ~ 125°C"), "°C");
        assert_eq!(leftover_text("5-10 V"), "V");
        assert_eq!(leftover_text("10 µF ±20%"), "µF");
    }

    #[test]
    fn test_unit_position() {
        assert_eq!(unit_position("$3.50"), Some(Affix::Prefix));
        assert_eq!(unit_position("100 nF"), Some(Affix::Suffix));
        assert_eq!(unit_position("-55 °C"), Some(Affix::Suffix));
        assert_eq!(unit_position("  42 "), None);
        assert_eq!(unit_position("N/A"), Some(Affix::Suffix));
    }

    #[test]
    fn test_unit_position_ignores_decorations() {
        assert_eq!(unit_position("±10%"), Some(Affix::Suffix));
        assert_eq!(unit_position("~5 V"), Some(Affix::Suffix));
        assert_eq!(unit_position("< 2"), None);
        assert_eq!(unit_position("≤ $4"), Some(Affix::Prefix));
    }
}
