// Utility helpers for parsing and basic statistics.
//
// This module centralizes the forgiving number handling so the rest of the
// code can assume clean, typed values.
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in CSV exports.
///
/// - Trims whitespace.
/// - Strips thousands separators and a leading `$`.
/// - Rejects values that contain alphabetic characters other than an
///   exponent marker.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let s = s.trim_start_matches('$').replace(',', "");
    if s.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn average(v: &[f64]) -> Option<f64> {
    // An empty group has no mean; callers drop it instead of inventing 0.
    if v.is_empty() {
        return None;
    }
    let sum: f64 = v.iter().copied().sum();
    Some(sum / v.len() as f64)
}

/// Title-case the way spreadsheet exports expect: a letter is uppercased
/// when it follows a non-letter, lowercased otherwise.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus locale-aware thousands separators (`1,234,567.89`).
    if !n.is_finite() {
        return n.to_string();
    }
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let mut res = match int_part.parse::<u64>() {
        Ok(v) => v.to_formatted_string(&Locale::en),
        Err(_) => int_part.to_string(),
    };
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg && res.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Counts in console messages (e.g., `9,855 rows loaded`).
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_forgiving_numbers() {
        assert_eq!(parse_f64_safe(Some(" 1,250.5 ")), Some(1250.5));
        assert_eq!(parse_f64_safe(Some("$42")), Some(42.0));
        assert_eq!(parse_f64_safe(Some("1e3")), Some(1000.0));
        assert_eq!(parse_f64_safe(Some("n/a")), None);
        assert_eq!(parse_f64_safe(Some("")), None);
        assert_eq!(parse_f64_safe(None), None);
    }

    #[test]
    fn average_of_empty_is_absent() {
        assert_eq!(average(&[]), None);
        assert_eq!(average(&[1.0, 2.0, 6.0]), Some(3.0));
    }

    #[test]
    fn title_case_capitalizes_after_non_letters() {
        assert_eq!(title_case("non-profit"), "Non-Profit");
        assert_eq!(title_case("government agency"), "Government Agency");
        assert_eq!(title_case("3m company"), "3M Company");
        assert_eq!(title_case("SOUTH BAY/san jose"), "South Bay/San Jose");
    }

    #[test]
    fn formats_with_separators() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-12.5, 1), "-12.5");
        assert_eq!(format_number(-0.001, 2), "0.00");
        assert_eq!(format_number(3.0, 0), "3");
        assert_eq!(format_number(1e20, 0), "100000000000000000000");
        assert_eq!(format_number(-1e20, 1), "-100000000000000000000.0");
        assert_eq!(format_int(9855usize), "9,855");
    }
}
