//! Reference-range interpretation for lab values.
//!
//! A reference range is free text written by whoever produced the report. Three shapes are
//! recognized, tried in a fixed order: `lo-hi` (hyphen or en-dash), `< t` and `> t`. Anything
//! else is `Unrecognized` and never flags a value.

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReferenceRange {
    /// Inclusive on both ends.
    Interval { lo: f64, hi: f64 },
    /// Normal is strictly below `threshold`.
    UpperBound { threshold: f64 },
    /// Normal is strictly above `threshold`.
    LowerBound { threshold: f64 },
    Unrecognized,
}

type Matcher = fn(&str) -> Option<ReferenceRange>;

// Order matters: a string matching the interval shape is never tried as a bound.
const MATCHERS: [Matcher; 3] = [match_interval, match_upper_bound, match_lower_bound];

impl ReferenceRange {
    pub fn parse(text: &str) -> Self {
        MATCHERS
            .iter()
            .find_map(|matcher| matcher(text))
            .unwrap_or(ReferenceRange::Unrecognized)
    }

    pub fn is_abnormal(&self, value: f64) -> bool {
        match *self {
            ReferenceRange::Interval { lo, hi } => value < lo || value > hi,
            ReferenceRange::UpperBound { threshold } => value >= threshold,
            ReferenceRange::LowerBound { threshold } => value <= threshold,
            ReferenceRange::Unrecognized => false,
        }
    }
}

/// Returns true when `value` falls outside `range`.
///
/// Missing or non-numeric values and empty or unrecognized ranges are never abnormal.
pub fn is_abnormal(value: &str, range: &str) -> bool {
    if value.is_empty() || range.is_empty() {
        return false;
    }
    let Some(measured) = parse_measurement(value) else {
        return false;
    };
    ReferenceRange::parse(range).is_abnormal(measured)
}

/// Reads the leading decimal literal of a measured value, ignoring anything after it, so
/// `"12.5 g/dL"` reads as 12.5. Accepts a sign, a fraction, an exponent and `Infinity`.
pub fn parse_measurement(value: &str) -> Option<f64> {
    let text = value.trim_start();
    let bytes = text.as_bytes();

    let mut end = 0;
    let negative = match bytes.first() {
        Some(b'-') => {
            end = 1;
            true
        }
        Some(b'+') => {
            end = 1;
            false
        }
        _ => false,
    };

    if text[end..].starts_with("Infinity") {
        return Some(if negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    text[..end].parse::<f64>().ok().filter(|n| !n.is_nan())
}

fn match_interval(text: &str) -> Option<ReferenceRange> {
    let (lo, rest) = leading_decimal(text)?;
    let rest = rest.strip_prefix(|c: char| c == '-' || c == '\u{2013}')?;
    let (hi, _) = leading_decimal(rest)?;
    Some(ReferenceRange::Interval { lo, hi })
}

fn match_upper_bound(text: &str) -> Option<ReferenceRange> {
    let threshold = bound_after(text, '<')?;
    Some(ReferenceRange::UpperBound { threshold })
}

fn match_lower_bound(text: &str) -> Option<ReferenceRange> {
    let threshold = bound_after(text, '>')?;
    Some(ReferenceRange::LowerBound { threshold })
}

fn bound_after(text: &str, symbol: char) -> Option<f64> {
    let rest = text.strip_prefix(symbol)?.trim_start();
    leading_decimal(rest).map(|(threshold, _)| threshold)
}

/// Unsigned `digits[.digits]` at the start of `text`. A dot without digits after it is not
/// part of the number.
fn leading_decimal(text: &str) -> Option<(f64, &str)> {
    let bytes = text.as_bytes();
    let int_digits = count_digits(bytes);
    if int_digits == 0 {
        return None;
    }

    let mut end = int_digits;
    if bytes.get(end) == Some(&b'.') {
        let frac_digits = count_digits(&bytes[end + 1..]);
        if frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }

    let number = text[..end].parse::<f64>().ok()?;
    Some((number, &text[end..]))
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}
