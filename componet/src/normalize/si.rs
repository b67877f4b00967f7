//! SI prefix table and unit splitting.
//!
//! A unit text such as `"nF"` is split into an SI prefix (`n`, 1e-9) and a
//! base unit (`F`). The prefix is only looked for at the start of the text and
//! only when a base unit follows it, so a lone `"m"` is metres and never
//! milli. Matching is case-sensitive.

/// One SI prefix token and its power of ten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiPrefix {
    pub token: &'static str,
    pub exponent: i32,
}

impl SiPrefix {
    /// Multiplicative factor of the prefix.
    pub fn factor(&self) -> f64 {
        10f64.powi(self.exponent)
    }

    /// Scales a magnitude by this prefix.
    ///
    /// Negative exponents divide by the positive power so that values like
    /// `100 n` land on the nearest double to `1e-7`.
    pub fn apply(&self, value: f64) -> f64 {
        if self.exponent < 0 {
            value / 10f64.powi(-self.exponent)
        } else {
            value * 10f64.powi(self.exponent)
        }
    }

    /// Canonical display token (`µ` for every micro spelling).
    pub fn display_token(&self) -> &'static str {
        if self.exponent == -6 {
            "µ"
        } else {
            self.token
        }
    }
}

const fn prefix(token: &'static str, exponent: i32) -> SiPrefix {
    SiPrefix { token, exponent }
}

/// Recognized prefixes. `da` comes first so it is tried before `d`.
pub const SI_PREFIXES: &[SiPrefix] = &[
    prefix("da", 1),
    prefix("y", -24),
    prefix("z", -21),
    prefix("a", -18),
    prefix("f", -15),
    prefix("p", -12),
    prefix("n", -9),
    prefix("\u{00B5}", -6),
    prefix("\u{03BC}", -6),
    prefix("u", -6),
    prefix("m", -3),
    prefix("c", -2),
    prefix("d", -1),
    prefix("h", 2),
    prefix("k", 3),
    prefix("M", 6),
    prefix("G", 9),
    prefix("T", 12),
    prefix("P", 15),
    prefix("E", 18),
    prefix("Z", 21),
    prefix("Y", 24),
];

/// Units whose leading letter would otherwise read as a prefix.
pub const UNPREFIXED_UNITS: &[&str] = &["dB", "dBm", "dBc", "Pa", "ppm", "ppb", "cd", "mol", "min", "mil"];

/// Looks up a prefix by its exact token.
pub fn lookup(token: &str) -> Option<&'static SiPrefix> {
    SI_PREFIXES.iter().find(|p| p.token == token)
}

/// Display prefix for a power of ten that is a multiple of three, `None`
/// outside the table.
pub fn for_exponent(exponent: i32) -> Option<&'static SiPrefix> {
    if exponent == -6 {
        return lookup("\u{00B5}");
    }
    SI_PREFIXES
        .iter()
        .find(|p| p.exponent == exponent && p.exponent % 3 == 0)
}

/// Splits unit text into an optional prefix and the base unit.
///
/// `declared_unit` is the attribute's metadata unit, if any. Precedence:
/// 1. text equal to the declared unit, or listed in [`UNPREFIXED_UNITS`],
///    is never split;
/// 2. with a declared unit, `<token><declared unit>` resolves to that token;
/// 3. otherwise the first table token that leaves a non-empty remainder wins.
pub fn split_unit<'a>(
    text: &'a str,
    declared_unit: Option<&str>,
) -> (Option<&'static SiPrefix>, &'a str) {
    if text.is_empty() {
        return (None, text);
    }
    let declared = declared_unit.filter(|u| !u.is_empty());
    if declared == Some(text) || UNPREFIXED_UNITS.contains(&text) {
        return (None, text);
    }

    if let Some(unit) = declared {
        if let Some(head) = text.strip_suffix(unit) {
            if let Some(p) = lookup(head) {
                return (Some(p), &text[head.len()..]);
            }
        }
    }

    for p in SI_PREFIXES {
        if let Some(rest) = text.strip_prefix(p.token) {
            if !rest.is_empty() {
                return (Some(p), rest);
            }
        }
    }
    (None, text)
}
